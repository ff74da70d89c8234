#![allow(dead_code)]

use std::fmt;

/// Size of the DNS header: id, flags and the four section counts.
pub const DNS_PACKET_HEADER_SIZE: usize = 12;

/// Offset to the transaction ID, from the beginning of a DNS packet.
pub const DNS_ID_OFFSET: usize = 0;

/// Offset to the flags (including rcode and opcode), from the beginning of the packet.
pub const DNS_FLAGS_OFFSET: usize = 2;

/// Largest packet we are ever willing to build or accept.
pub const DNS_PACKET_SIZE_MAX: usize = 0xffff;

/// Maximum size of a unicast UDP packet without EDNS(0).
pub const DNS_PACKET_UNICAST_SIZE_MAX: usize = 512;

/// Initial buffer size when the transport MTU is unknown.
pub const DNS_PACKET_SIZE_START: usize = 512;

/// Bytes of IPv4 and UDP headers preceding the DNS payload on the wire.
pub const UDP_PACKET_HEADER_SIZE: usize = 20 + 8;

/// Maximum length of a single label, in unescaped octets.
pub const DNS_LABEL_MAX: usize = 63;

/// Worst-case length of a single label in escaped (presentation) form.
pub const DNS_LABEL_ESCAPED_MAX: usize = DNS_LABEL_MAX * 4 + 1;

/// Compression pointers carry 14 bits; offsets at or past this can never be referenced.
pub const DNS_COMPRESSION_POINTER_MAX: usize = 0x4000;

/// Buffer growth granularity.
pub const PAGE_SIZE: usize = 4096;

/// mDNS reuses the top bit of the class field as the cache-flush marker (RFC 6762, section 10.2).
pub const MDNS_RR_CACHE_FLUSH: u16 = 0x8000;

/// The DNSSEC OK bit within the extended flags of an OPT record (RFC 3225).
pub const EDNS0_OPT_DO: u16 = 1 << 15;

// Header flag bits.
pub const DNS_FLAG_QR: u16 = 1 << 15;
pub const DNS_FLAG_AA: u16 = 1 << 10;
pub const DNS_FLAG_TC: u16 = 1 << 9;
pub const DNS_FLAG_RD: u16 = 1 << 8;
pub const DNS_FLAG_RA: u16 = 1 << 7;
pub const DNS_FLAG_AD: u16 = 1 << 5;
pub const DNS_FLAG_CD: u16 = 1 << 4;

/// Assembles the 16-bit flags field of the header.
#[allow(clippy::too_many_arguments)]
pub fn make_flags(
    qr: bool,
    opcode: u8,
    aa: bool,
    tc: bool,
    rd: bool,
    ra: bool,
    ad: bool,
    cd: bool,
    rcode: u8,
) -> u16 {
    (qr as u16) << 15
        | ((opcode & 15) as u16) << 11
        | (aa as u16) << 10
        | (tc as u16) << 9
        | (rd as u16) << 8
        | (ra as u16) << 7
        | (ad as u16) << 5
        | (cd as u16) << 4
        | (rcode & 15) as u16
}

// Record type numbers, as assigned by IANA.
pub const DNS_TYPE_A: u16 = 1;
pub const DNS_TYPE_NS: u16 = 2;
pub const DNS_TYPE_CNAME: u16 = 5;
pub const DNS_TYPE_SOA: u16 = 6;
pub const DNS_TYPE_PTR: u16 = 12;
pub const DNS_TYPE_HINFO: u16 = 13;
pub const DNS_TYPE_MX: u16 = 15;
pub const DNS_TYPE_TXT: u16 = 16;
pub const DNS_TYPE_AAAA: u16 = 28;
pub const DNS_TYPE_LOC: u16 = 29;
pub const DNS_TYPE_SRV: u16 = 33;
pub const DNS_TYPE_DNAME: u16 = 39;
pub const DNS_TYPE_OPT: u16 = 41;
pub const DNS_TYPE_DS: u16 = 43;
pub const DNS_TYPE_SSHFP: u16 = 44;
pub const DNS_TYPE_RRSIG: u16 = 46;
pub const DNS_TYPE_NSEC: u16 = 47;
pub const DNS_TYPE_DNSKEY: u16 = 48;
pub const DNS_TYPE_NSEC3: u16 = 50;
pub const DNS_TYPE_SPF: u16 = 99;
pub const DNS_TYPE_TKEY: u16 = 249;
pub const DNS_TYPE_TSIG: u16 = 250;
pub const DNS_TYPE_IXFR: u16 = 251;
pub const DNS_TYPE_AXFR: u16 = 252;
pub const DNS_TYPE_ANY: u16 = 255;

// Class numbers.
pub const DNS_CLASS_IN: u16 = 1;
pub const DNS_CLASS_ANY: u16 = 255;

/// Meta-types that only ever appear in queries or transport machinery,
/// never as actual records (RFC 4034, section 4.1.2).
pub fn dns_type_is_pseudo(ty: u16) -> bool {
    matches!(
        ty,
        DNS_TYPE_ANY | DNS_TYPE_AXFR | DNS_TYPE_IXFR | DNS_TYPE_OPT | DNS_TYPE_TSIG | DNS_TYPE_TKEY
    )
}

/// Types acceptable for a record in the answer, authority or additional sections.
pub fn dns_type_is_valid_rr(ty: u16) -> bool {
    !matches!(ty, DNS_TYPE_ANY | DNS_TYPE_AXFR | DNS_TYPE_IXFR)
}

/// Types acceptable for a question.
pub fn dns_type_is_valid_query(ty: u16) -> bool {
    !matches!(ty, DNS_TYPE_OPT | DNS_TYPE_TSIG | DNS_TYPE_TKEY)
}

/// Classes acceptable for a record.
pub fn dns_class_is_valid_rr(class: u16) -> bool {
    class != DNS_CLASS_ANY
}

/// The transport family a packet belongs to. The wire format is shared;
/// the validation rules are not.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DnsProtocol {
    Dns,
    Mdns,
    Llmnr,
}

impl DnsProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            DnsProtocol::Dns => "dns",
            DnsProtocol::Mdns => "mdns",
            DnsProtocol::Llmnr => "llmnr",
        }
    }
}

impl fmt::Display for DnsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DNS return codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rcode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NxDomain = 3,
    NotImpl = 4,
    Refused = 5,
    YxDomain = 6,
    YxRrSet = 7,
    NxRrSet = 8,
    NotAuth = 9,
    NotZone = 10,
}

impl From<Rcode> for u8 {
    fn from(v: Rcode) -> u8 {
        v as u8
    }
}

/// DNS opcodes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Opcode {
    Query = 0,
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,
}

impl From<Opcode> for u8 {
    fn from(v: Opcode) -> u8 {
        v as u8
    }
}

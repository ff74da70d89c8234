//! Resource keys, resource records and the per-type rdata codecs.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::bitmap::TypeBitmap;
use crate::constants::*;
use crate::errors::*;
use crate::packet::DnsPacket;

/// The owner name, type and class shared by questions and resource
/// records. Names compare case-insensitively.
#[derive(Debug, Clone, Eq)]
pub struct DnsResourceKey {
    /// Owner name in presentation format.
    pub name: String,
    pub rr_type: u16,
    pub rr_class: u16,
}

impl DnsResourceKey {
    pub fn new(name: impl Into<String>, rr_type: u16, rr_class: u16) -> Self {
        DnsResourceKey {
            name: name.into(),
            rr_type,
            rr_class,
        }
    }
}

impl PartialEq for DnsResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.rr_type == other.rr_type
            && self.rr_class == other.rr_class
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// One character-string of a TXT or SPF record, at most 255 octets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsTxtItem(pub Vec<u8>);

/// Typed rdata, one variant per supported record type. Everything else,
/// including OPT, is carried verbatim as `Generic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsRData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(String),
    Cname(String),
    Dname(String),
    Ptr(String),
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    Mx {
        priority: u16,
        exchange: String,
    },
    Srv {
        priority: u16,
        weight: u16,
        port: u16,
        name: String,
    },
    Hinfo {
        cpu: String,
        os: String,
    },
    Txt(Vec<DnsTxtItem>),
    Spf(Vec<DnsTxtItem>),
    Loc {
        version: u8,
        size: u8,
        horiz_pre: u8,
        vert_pre: u8,
        latitude: u32,
        longitude: u32,
        altitude: u32,
    },
    Ds {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Vec<u8>,
    },
    Sshfp {
        algorithm: u8,
        fptype: u8,
        fingerprint: Vec<u8>,
    },
    Dnskey {
        flags: u16,
        protocol: u8,
        algorithm: u8,
        key: Vec<u8>,
    },
    Rrsig {
        type_covered: u16,
        algorithm: u8,
        labels: u8,
        original_ttl: u32,
        expiration: u32,
        inception: u32,
        key_tag: u16,
        signer: String,
        signature: Vec<u8>,
    },
    Nsec {
        next_domain_name: String,
        types: TypeBitmap,
    },
    Nsec3 {
        algorithm: u8,
        flags: u8,
        iterations: u16,
        salt: Vec<u8>,
        next_hashed_name: Vec<u8>,
        types: TypeBitmap,
    },
    Generic(Vec<u8>),
}

/// A resource record. When `unparseable` is set the rdata could not be
/// interpreted and is preserved verbatim in `Generic`, so reserialization
/// is lossless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsResourceRecord {
    pub key: Arc<DnsResourceKey>,
    pub ttl: u32,
    pub unparseable: bool,
    pub rdata: DnsRData,
}

impl DnsResourceRecord {
    pub fn new(key: DnsResourceKey, ttl: u32, rdata: DnsRData) -> Self {
        DnsResourceRecord {
            key: Arc::new(key),
            ttl,
            unparseable: false,
            rdata,
        }
    }
}

/// LOC size/precision octets pack a decimal mantissa and exponent into
/// one byte; both nibbles top out at 9, and a zero mantissa only makes
/// sense with a zero exponent (RFC 1876).
fn loc_size_ok(size: u8) -> bool {
    let m = size >> 4;
    let e = size & 0xf;
    m <= 9 && e <= 9 && (m > 0 || e == 0)
}

impl DnsPacket {
    /// Appends a question or record key: owner name (compressible, a
    /// canonical-form candidate), type, class.
    pub fn append_key(&mut self, key: &DnsResourceKey) -> Result<usize> {
        let saved_size = self.size();
        match self.append_key_inner(key) {
            Ok(()) => Ok(saved_size),
            Err(e) => {
                self.truncate(saved_size);
                Err(e)
            }
        }
    }

    fn append_key_inner(&mut self, key: &DnsResourceKey) -> Result<()> {
        self.append_name(&key.name, true, true)?;
        self.append_u16(key.rr_type)?;
        self.append_u16(key.rr_class)?;
        Ok(())
    }

    /// Reads a key. For mDNS, a set cache-flush bit is stripped from the
    /// class of anything but OPT and reported separately (RFC 6762,
    /// section 10.2).
    pub fn read_key(&mut self) -> Result<(DnsResourceKey, bool)> {
        let saved_rindex = self.rindex;
        match self.read_key_inner() {
            Ok(v) => Ok(v),
            Err(e) => {
                self.rindex = saved_rindex;
                Err(e)
            }
        }
    }

    fn read_key_inner(&mut self) -> Result<(DnsResourceKey, bool)> {
        let name = self.read_name(true)?;
        let rr_type = self.read_u16()?;
        let mut rr_class = self.read_u16()?;

        let mut cache_flush = false;
        if self.protocol == DnsProtocol::Mdns
            && rr_type != DNS_TYPE_OPT
            && rr_class & MDNS_RR_CACHE_FLUSH != 0
        {
            rr_class &= !MDNS_RR_CACHE_FLUSH;
            cache_flush = true;
        }

        Ok((DnsResourceKey { name, rr_type, rr_class }, cache_flush))
    }

    /// Appends the minimal EDNS(0) OPT pseudo-record (RFC 6891): root
    /// owner, the advertised UDP payload size as the class, the DO bit in
    /// the extended flags, no options.
    pub fn append_opt(&mut self, max_udp_size: u16, edns0_do: bool) -> Result<usize> {
        // Never advertise less than the pre-EDNS maximum.
        assert!(max_udp_size as usize >= DNS_PACKET_UNICAST_SIZE_MAX);

        let saved_size = self.size();
        match self.append_opt_inner(max_udp_size, edns0_do) {
            Ok(()) => Ok(saved_size),
            Err(e) => {
                self.truncate(saved_size);
                Err(e)
            }
        }
    }

    fn append_opt_inner(&mut self, max_udp_size: u16, edns0_do: bool) -> Result<()> {
        // Root owner name.
        self.append_u8(0)?;
        self.append_u16(DNS_TYPE_OPT)?;
        // The class field advertises the receive buffer size.
        self.append_u16(max_udp_size)?;
        // Extended RCODE and version.
        self.append_u16(0)?;
        // Extended flags: DNSSEC OK (RFC 3225).
        self.append_u16(if edns0_do { EDNS0_OPT_DO } else { 0 })?;
        // RDLENGTH.
        self.append_u16(0)?;
        Ok(())
    }

    /// Appends a resource record and returns `(start, rdata_start)`. The
    /// RDLENGTH field is reserved up front and patched once the rdata
    /// encoder has run.
    pub fn append_rr(&mut self, rr: &DnsResourceRecord) -> Result<(usize, usize)> {
        let saved_size = self.size();
        match self.append_rr_inner(rr) {
            Ok(rdata_start) => Ok((saved_size, rdata_start)),
            Err(e) => {
                self.truncate(saved_size);
                Err(e)
            }
        }
    }

    fn append_rr_inner(&mut self, rr: &DnsResourceRecord) -> Result<usize> {
        self.append_key(&rr.key)?;
        self.append_u32(rr.ttl)?;
        let rdlength_offset = self.append_u16(0)?;
        let rdata_start = self.size();

        if rr.unparseable {
            match &rr.rdata {
                DnsRData::Generic(data) => {
                    self.append_blob(data)?;
                }
                _ => {
                    return Err(WireError::InvalidPacket(
                        "Unparseable record without verbatim rdata",
                    ))
                }
            }
        } else {
            self.append_rdata(&rr.rdata)?;
        }

        let rdlength = self.size() - rdata_start;
        if rdlength > 0xffff {
            return Err(WireError::PacketTooLarge);
        }
        BigEndian::write_u16(&mut self.data[rdlength_offset..], rdlength as u16);

        Ok(rdata_start)
    }

    fn append_rdata(&mut self, rdata: &DnsRData) -> Result<()> {
        match rdata {
            DnsRData::A(address) => {
                self.append_blob(&address.octets())?;
            }

            DnsRData::Aaaa(address) => {
                self.append_blob(&address.octets())?;
            }

            DnsRData::Ns(name)
            | DnsRData::Cname(name)
            | DnsRData::Dname(name)
            | DnsRData::Ptr(name) => {
                self.append_name(name, true, false)?;
            }

            DnsRData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                self.append_name(mname, true, false)?;
                self.append_name(rname, true, false)?;
                self.append_u32(*serial)?;
                self.append_u32(*refresh)?;
                self.append_u32(*retry)?;
                self.append_u32(*expire)?;
                self.append_u32(*minimum)?;
            }

            DnsRData::Mx { priority, exchange } => {
                self.append_u16(*priority)?;
                self.append_name(exchange, true, false)?;
            }

            DnsRData::Srv {
                priority,
                weight,
                port,
                name,
            } => {
                self.append_u16(*priority)?;
                self.append_u16(*weight)?;
                self.append_u16(*port)?;
                self.append_name(name, true, false)?;
            }

            DnsRData::Hinfo { cpu, os } => {
                self.append_string(cpu)?;
                self.append_string(os)?;
            }

            DnsRData::Txt(items) | DnsRData::Spf(items) => {
                if items.is_empty() {
                    // RFC 6763, section 6.1: an empty array is encoded as
                    // a single empty string.
                    self.append_raw_string(&[])?;
                } else {
                    for item in items {
                        self.append_raw_string(&item.0)?;
                    }
                }
            }

            DnsRData::Loc {
                version,
                size,
                horiz_pre,
                vert_pre,
                latitude,
                longitude,
                altitude,
            } => {
                self.append_u8(*version)?;
                self.append_u8(*size)?;
                self.append_u8(*horiz_pre)?;
                self.append_u8(*vert_pre)?;
                self.append_u32(*latitude)?;
                self.append_u32(*longitude)?;
                self.append_u32(*altitude)?;
            }

            DnsRData::Ds {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => {
                self.append_u16(*key_tag)?;
                self.append_u8(*algorithm)?;
                self.append_u8(*digest_type)?;
                self.append_blob(digest)?;
            }

            DnsRData::Sshfp {
                algorithm,
                fptype,
                fingerprint,
            } => {
                self.append_u8(*algorithm)?;
                self.append_u8(*fptype)?;
                self.append_blob(fingerprint)?;
            }

            DnsRData::Dnskey {
                flags,
                protocol,
                algorithm,
                key,
            } => {
                self.append_u16(*flags)?;
                self.append_u8(*protocol)?;
                self.append_u8(*algorithm)?;
                self.append_blob(key)?;
            }

            DnsRData::Rrsig {
                type_covered,
                algorithm,
                labels,
                original_ttl,
                expiration,
                inception,
                key_tag,
                signer,
                signature,
            } => {
                self.append_u16(*type_covered)?;
                self.append_u8(*algorithm)?;
                self.append_u8(*labels)?;
                self.append_u32(*original_ttl)?;
                self.append_u32(*expiration)?;
                self.append_u32(*inception)?;
                self.append_u16(*key_tag)?;
                // The signer is part of the signed data: never compressed,
                // lowercased in canonical form.
                self.append_name(signer, false, true)?;
                self.append_blob(signature)?;
            }

            DnsRData::Nsec {
                next_domain_name,
                types,
            } => {
                self.append_name(next_domain_name, false, false)?;
                self.append_types(types)?;
            }

            DnsRData::Nsec3 {
                algorithm,
                flags,
                iterations,
                salt,
                next_hashed_name,
                types,
            } => {
                if salt.len() > 0xff || next_hashed_name.len() > 0xff {
                    return Err(WireError::PacketTooLarge);
                }
                self.append_u8(*algorithm)?;
                self.append_u8(*flags)?;
                self.append_u16(*iterations)?;
                self.append_u8(salt.len() as u8)?;
                self.append_blob(salt)?;
                self.append_u8(next_hashed_name.len() as u8)?;
                self.append_blob(next_hashed_name)?;
                self.append_types(types)?;
            }

            DnsRData::Generic(data) => {
                self.append_blob(data)?;
            }
        }

        Ok(())
    }

    /// Reads a resource record, returning it together with the mDNS
    /// cache-flush flag of its key. The rdata decoder must consume the
    /// declared RDLENGTH exactly.
    pub fn read_rr(&mut self) -> Result<(DnsResourceRecord, bool)> {
        let saved_rindex = self.rindex;
        match self.read_rr_inner() {
            Ok(v) => Ok(v),
            Err(e) => {
                self.rindex = saved_rindex;
                Err(e)
            }
        }
    }

    fn read_rr_inner(&mut self) -> Result<(DnsResourceRecord, bool)> {
        let (key, cache_flush) = self.read_key()?;

        if !dns_class_is_valid_rr(key.rr_class) || !dns_type_is_valid_rr(key.rr_type) {
            return Err(WireError::InvalidPacket("Invalid class or type for a record"));
        }

        let ttl = self.read_u32()?;
        let rdlength = self.read_u16()? as usize;
        if self.rindex + rdlength > self.size() {
            return Err(WireError::InvalidPacket("Rdata extends past the packet"));
        }

        let offset = self.rindex;
        let mut unparseable = false;

        let rdata = match key.rr_type {
            DNS_TYPE_A => {
                let mut octets = [0u8; 4];
                octets.copy_from_slice(self.read_blob(4)?);
                DnsRData::A(Ipv4Addr::from(octets))
            }

            DNS_TYPE_AAAA => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(self.read_blob(16)?);
                DnsRData::Aaaa(Ipv6Addr::from(octets))
            }

            DNS_TYPE_NS => DnsRData::Ns(self.read_name(true)?),
            DNS_TYPE_CNAME => DnsRData::Cname(self.read_name(true)?),
            DNS_TYPE_DNAME => DnsRData::Dname(self.read_name(true)?),
            DNS_TYPE_PTR => DnsRData::Ptr(self.read_name(true)?),

            DNS_TYPE_SOA => {
                let mname = self.read_name(true)?;
                let rname = self.read_name(true)?;
                let serial = self.read_u32()?;
                let refresh = self.read_u32()?;
                let retry = self.read_u32()?;
                let expire = self.read_u32()?;
                let minimum = self.read_u32()?;
                DnsRData::Soa {
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                }
            }

            DNS_TYPE_MX => {
                let priority = self.read_u16()?;
                let exchange = self.read_name(true)?;
                DnsRData::Mx { priority, exchange }
            }

            DNS_TYPE_SRV => {
                let priority = self.read_u16()?;
                let weight = self.read_u16()?;
                let port = self.read_u16()?;
                let name = self.read_name(true)?;
                DnsRData::Srv {
                    priority,
                    weight,
                    port,
                    name,
                }
            }

            DNS_TYPE_HINFO => {
                let cpu = self.read_string()?;
                let os = self.read_string()?;
                DnsRData::Hinfo { cpu, os }
            }

            DNS_TYPE_TXT | DNS_TYPE_SPF => {
                let mut items = Vec::new();
                if rdlength == 0 {
                    // RFC 6763, section 6.1: an empty TXT record is
                    // equivalent to one with a single empty string.
                    items.push(DnsTxtItem::default());
                } else {
                    while self.rindex < offset + rdlength {
                        let data = self.read_raw_string()?.to_vec();
                        items.push(DnsTxtItem(data));
                    }
                }
                if key.rr_type == DNS_TYPE_TXT {
                    DnsRData::Txt(items)
                } else {
                    DnsRData::Spf(items)
                }
            }

            DNS_TYPE_LOC => {
                let pos = self.rindex;
                let version = self.read_u8()?;
                if version == 0 {
                    let size = self.read_u8()?;
                    if !loc_size_ok(size) {
                        return Err(WireError::InvalidPacket("Invalid LOC size"));
                    }
                    let horiz_pre = self.read_u8()?;
                    if !loc_size_ok(horiz_pre) {
                        return Err(WireError::InvalidPacket("Invalid LOC horizontal precision"));
                    }
                    let vert_pre = self.read_u8()?;
                    if !loc_size_ok(vert_pre) {
                        return Err(WireError::InvalidPacket("Invalid LOC vertical precision"));
                    }
                    let latitude = self.read_u32()?;
                    let longitude = self.read_u32()?;
                    let altitude = self.read_u32()?;
                    DnsRData::Loc {
                        version,
                        size,
                        horiz_pre,
                        vert_pre,
                        latitude,
                        longitude,
                        altitude,
                    }
                } else {
                    // Unknown LOC version: keep the rdata byte-for-byte so
                    // it can be reserialized unchanged.
                    debug!("unknown LOC version {}, keeping rdata verbatim", version);
                    self.rewind(pos);
                    unparseable = true;
                    DnsRData::Generic(self.read_memdup(rdlength)?)
                }
            }

            DNS_TYPE_DS => {
                let key_tag = self.read_u16()?;
                let algorithm = self.read_u8()?;
                let digest_type = self.read_u8()?;
                let digest = self.read_memdup(
                    rdlength
                        .checked_sub(4)
                        .ok_or(WireError::InvalidPacket("DS rdata too short"))?,
                )?;
                if digest.is_empty() {
                    // The accepted size depends on the digest type; for now
                    // just insist on a non-empty digest.
                    return Err(WireError::InvalidPacket("Empty DS digest"));
                }
                DnsRData::Ds {
                    key_tag,
                    algorithm,
                    digest_type,
                    digest,
                }
            }

            DNS_TYPE_SSHFP => {
                let algorithm = self.read_u8()?;
                let fptype = self.read_u8()?;
                let fingerprint = self.read_memdup(
                    rdlength
                        .checked_sub(2)
                        .ok_or(WireError::InvalidPacket("SSHFP rdata too short"))?,
                )?;
                if fingerprint.is_empty() {
                    return Err(WireError::InvalidPacket("Empty SSHFP fingerprint"));
                }
                DnsRData::Sshfp {
                    algorithm,
                    fptype,
                    fingerprint,
                }
            }

            DNS_TYPE_DNSKEY => {
                let flags = self.read_u16()?;
                let protocol = self.read_u8()?;
                let algorithm = self.read_u8()?;
                let dnskey = self.read_memdup(
                    rdlength
                        .checked_sub(4)
                        .ok_or(WireError::InvalidPacket("DNSKEY rdata too short"))?,
                )?;
                if dnskey.is_empty() {
                    return Err(WireError::InvalidPacket("Empty DNSKEY key"));
                }
                DnsRData::Dnskey {
                    flags,
                    protocol,
                    algorithm,
                    key: dnskey,
                }
            }

            DNS_TYPE_RRSIG => {
                let type_covered = self.read_u16()?;
                let algorithm = self.read_u8()?;
                let labels = self.read_u8()?;
                let original_ttl = self.read_u32()?;
                let expiration = self.read_u32()?;
                let inception = self.read_u32()?;
                let key_tag = self.read_u16()?;
                // The signer is covered by the signature and is never
                // compressed on the wire.
                let signer = self.read_name(false)?;
                let signature = self.read_memdup(
                    (offset + rdlength)
                        .checked_sub(self.rindex)
                        .ok_or(WireError::InvalidPacket("RRSIG rdata too short"))?,
                )?;
                if signature.is_empty() {
                    return Err(WireError::InvalidPacket("Empty RRSIG signature"));
                }
                DnsRData::Rrsig {
                    type_covered,
                    algorithm,
                    labels,
                    original_ttl,
                    expiration,
                    inception,
                    key_tag,
                    signer,
                    signature,
                }
            }

            DNS_TYPE_NSEC => {
                // RFC 6762, section 18.14 explicitly wants name compression
                // here for mDNS, contradicting RFC 3845, section 2.1.1.
                let allow_compression = self.protocol == DnsProtocol::Mdns;
                let next_domain_name = self.read_name(allow_compression)?;
                let types = self.read_type_windows(
                    (offset + rdlength)
                        .checked_sub(self.rindex)
                        .ok_or(WireError::InvalidPacket("NSEC rdata too short"))?,
                )?;
                // An empty bitmap is fine: the bit for the NSEC record
                // itself is redundant, and some uses omit it on purpose.
                DnsRData::Nsec {
                    next_domain_name,
                    types,
                }
            }

            DNS_TYPE_NSEC3 => {
                let algorithm = self.read_u8()?;
                let flags = self.read_u8()?;
                let iterations = self.read_u16()?;
                // The salt may be empty.
                let salt_size = self.read_u8()? as usize;
                let salt = self.read_memdup(salt_size)?;
                let hash_size = self.read_u8()? as usize;
                if hash_size == 0 {
                    return Err(WireError::InvalidPacket("Empty NSEC3 next hashed name"));
                }
                let next_hashed_name = self.read_memdup(hash_size)?;
                let types = self.read_type_windows(
                    (offset + rdlength)
                        .checked_sub(self.rindex)
                        .ok_or(WireError::InvalidPacket("NSEC3 rdata too short"))?,
                )?;
                // Empty non-terminals carry NSEC3 records with empty
                // bitmaps, so those stay legal.
                DnsRData::Nsec3 {
                    algorithm,
                    flags,
                    iterations,
                    salt,
                    next_hashed_name,
                    types,
                }
            }

            // OPT only matters for its header; unknown types are carried
            // verbatim.
            _ => DnsRData::Generic(self.read_memdup(rdlength)?),
        };

        if self.rindex != offset + rdlength {
            return Err(WireError::InvalidPacket("Unexpected rdata size"));
        }

        let rr = DnsResourceRecord {
            key: Arc::new(key),
            ttl,
            unparseable,
            rdata,
        };
        Ok((rr, cache_flush))
    }
}

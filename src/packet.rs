//! The packet container: a growable byte buffer with a read cursor, the
//! per-packet name-compression table and the protocol-specific header
//! validation rules.

use std::collections::HashMap;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use rand::Rng;

use crate::constants::*;
use crate::errors::*;
use crate::extract::DnsAnswerItem;
use crate::record::{DnsResourceKey, DnsResourceRecord};

fn page_align(n: usize) -> usize {
    (n + PAGE_SIZE - 1) & !(PAGE_SIZE - 1)
}

/// A single DNS, mDNS or LLMNR message.
///
/// On the send path the packet starts empty (a zeroed header) and grows by
/// appends; on the receive path it wraps the received buffer and is walked
/// with transactional reads. Every append that fails rolls the buffer back
/// to its pre-call size, every read that fails restores the read cursor.
#[derive(Debug, Clone)]
pub struct DnsPacket {
    pub protocol: DnsProtocol,
    pub(crate) data: Vec<u8>,
    pub(crate) allocated: usize,
    pub(crate) rindex: usize,
    /// Compression table: lowercased name suffix, in presentation format,
    /// to the absolute offset of its first occurrence.
    pub(crate) names: HashMap<String, usize>,
    /// Refuse to emit or store compression pointers, whatever callers ask for.
    pub refuse_compression: bool,
    /// Lowercase canonical-candidate labels on emission (RFC 4034, section 6.2).
    pub canonical_form: bool,
    /// Interface the packet was received on, 0 if unknown.
    pub ifindex: i32,
    pub(crate) extracted: bool,
    pub(crate) question: Vec<Arc<DnsResourceKey>>,
    pub(crate) answer: Vec<DnsAnswerItem>,
    pub(crate) opt: Option<Arc<DnsResourceRecord>>,
    /// Continuation packet for multi-packet replies. Appends only, so the
    /// chain is acyclic by construction.
    pub more: Option<Box<DnsPacket>>,
}

impl DnsPacket {
    /// Creates an empty packet sized for the given transport MTU.
    pub fn new(protocol: DnsProtocol, mtu: usize) -> Self {
        let mut a = if mtu <= UDP_PACKET_HEADER_SIZE {
            DNS_PACKET_SIZE_START
        } else {
            mtu - UDP_PACKET_HEADER_SIZE
        };
        if a < DNS_PACKET_HEADER_SIZE {
            a = DNS_PACKET_HEADER_SIZE;
        }
        let a = page_align(a).min(DNS_PACKET_SIZE_MAX);

        let mut data = Vec::with_capacity(a);
        data.resize(DNS_PACKET_HEADER_SIZE, 0);

        DnsPacket {
            protocol,
            data,
            allocated: a,
            rindex: DNS_PACKET_HEADER_SIZE,
            names: HashMap::new(),
            refuse_compression: false,
            canonical_form: false,
            ifindex: 0,
            extracted: false,
            question: Vec::new(),
            answer: Vec::new(),
            opt: None,
            more: None,
        }
    }

    /// Creates a query packet: protocol-appropriate flags and a fresh
    /// random transaction ID.
    pub fn new_query(protocol: DnsProtocol, mtu: usize, dnssec_checking_disabled: bool) -> Self {
        let mut p = Self::new(protocol, mtu);
        // The TC bit starts cleared; multi-packet senders update it right
        // before handing the buffer to the transport.
        p.set_flags(dnssec_checking_disabled, false);
        p.set_id(rand::thread_rng().gen());
        p
    }

    /// Wraps a buffer received from the transport.
    pub fn from_wire(protocol: DnsProtocol, data: Vec<u8>) -> Result<Self> {
        if data.len() < DNS_PACKET_HEADER_SIZE {
            return Err(WireError::PacketTooSmall);
        }
        let allocated = data.len();
        Ok(DnsPacket {
            protocol,
            data,
            allocated,
            rindex: DNS_PACKET_HEADER_SIZE,
            names: HashMap::new(),
            refuse_compression: false,
            canonical_form: false,
            ifindex: 0,
            extracted: false,
            question: Vec::new(),
            answer: Vec::new(),
            opt: None,
            more: None,
        })
    }

    /// The assembled message, ready for the transport.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Current logical size of the message.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Current buffer capacity.
    #[inline]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Current read cursor.
    #[inline]
    pub fn rindex(&self) -> usize {
        self.rindex
    }

    /// Sets the header flags for an outgoing packet. LLMNR never sets TC
    /// here; mDNS may; conventional DNS asks for recursion and carries the
    /// caller's CD bit.
    pub fn set_flags(&mut self, dnssec_checking_disabled: bool, truncated: bool) {
        let flags = match self.protocol {
            DnsProtocol::Llmnr => {
                assert!(!truncated);
                make_flags(false, 0, false, false, false, false, false, false, 0)
            }
            DnsProtocol::Mdns => {
                make_flags(false, 0, false, truncated, false, false, false, false, 0)
            }
            DnsProtocol::Dns => {
                assert!(!truncated);
                make_flags(
                    false,
                    0,
                    false,
                    false,
                    true,
                    false,
                    false,
                    dnssec_checking_disabled,
                    0,
                )
            }
        };
        BigEndian::write_u16(&mut self.data[DNS_FLAGS_OFFSET..], flags);
    }

    // Header field accessors. The header is always present, so these
    // index the buffer directly.

    #[inline]
    pub fn id(&self) -> u16 {
        BigEndian::read_u16(&self.data[DNS_ID_OFFSET..])
    }

    pub fn set_id(&mut self, id: u16) {
        BigEndian::write_u16(&mut self.data[DNS_ID_OFFSET..], id)
    }

    #[inline]
    pub fn flags(&self) -> u16 {
        BigEndian::read_u16(&self.data[DNS_FLAGS_OFFSET..])
    }

    #[inline]
    pub fn qr(&self) -> bool {
        self.flags() & DNS_FLAG_QR != 0
    }

    pub fn set_qr(&mut self, qr: bool) {
        let mut flags = self.flags();
        if qr {
            flags |= DNS_FLAG_QR;
        } else {
            flags &= !DNS_FLAG_QR;
        }
        BigEndian::write_u16(&mut self.data[DNS_FLAGS_OFFSET..], flags);
    }

    #[inline]
    pub fn opcode(&self) -> u8 {
        (self.data[DNS_FLAGS_OFFSET] & 0x78) >> 3
    }

    #[inline]
    pub fn aa(&self) -> bool {
        self.flags() & DNS_FLAG_AA != 0
    }

    #[inline]
    pub fn tc(&self) -> bool {
        self.flags() & DNS_FLAG_TC != 0
    }

    #[inline]
    pub fn rd(&self) -> bool {
        self.flags() & DNS_FLAG_RD != 0
    }

    #[inline]
    pub fn ra(&self) -> bool {
        self.flags() & DNS_FLAG_RA != 0
    }

    #[inline]
    pub fn ad(&self) -> bool {
        self.flags() & DNS_FLAG_AD != 0
    }

    #[inline]
    pub fn cd(&self) -> bool {
        self.flags() & DNS_FLAG_CD != 0
    }

    #[inline]
    pub fn rcode(&self) -> u8 {
        self.data[DNS_FLAGS_OFFSET + 1] & 0x0f
    }

    pub fn set_rcode(&mut self, rcode: u8) {
        let b = &mut self.data[DNS_FLAGS_OFFSET + 1];
        *b &= !0x0f;
        *b |= rcode & 0x0f;
    }

    #[inline]
    pub fn qdcount(&self) -> u16 {
        BigEndian::read_u16(&self.data[4..])
    }

    pub fn set_qdcount(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.data[4..], value)
    }

    #[inline]
    pub fn ancount(&self) -> u16 {
        BigEndian::read_u16(&self.data[6..])
    }

    pub fn set_ancount(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.data[6..], value)
    }

    #[inline]
    pub fn nscount(&self) -> u16 {
        BigEndian::read_u16(&self.data[8..])
    }

    pub fn set_nscount(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.data[8..], value)
    }

    #[inline]
    pub fn arcount(&self) -> u16 {
        BigEndian::read_u16(&self.data[10..])
    }

    pub fn set_arcount(&mut self, value: u16) {
        BigEndian::write_u16(&mut self.data[10..], value)
    }

    /// Total number of records outside the question section.
    #[inline]
    pub fn rrcount(&self) -> usize {
        self.ancount() as usize + self.nscount() as usize + self.arcount() as usize
    }

    // Growth and rollback.

    /// Makes room for `add` more bytes and returns the offset of the new
    /// region. The region is zero-filled; writers fill it in place through
    /// the buffer before the next append.
    pub(crate) fn extend(&mut self, add: usize) -> Result<usize> {
        if self.data.len() + add > self.allocated {
            let mut a = page_align((self.data.len() + add) * 2);
            if a > DNS_PACKET_SIZE_MAX {
                a = DNS_PACKET_SIZE_MAX;
            }
            if self.data.len() + add > a {
                return Err(WireError::PacketTooLarge);
            }
            self.data.reserve_exact(a - self.data.len());
            self.allocated = a;
        }

        let start = self.data.len();
        self.data.resize(start + add, 0);
        Ok(start)
    }

    /// Rolls the buffer back to `sz` bytes, dropping every compression
    /// table entry that points into the discarded tail.
    pub fn truncate(&mut self, sz: usize) {
        if self.data.len() <= sz {
            return;
        }
        self.names.retain(|_, offset| *offset < sz);
        self.data.truncate(sz);
    }

    // Append primitives.

    pub fn append_u8(&mut self, v: u8) -> Result<usize> {
        let start = self.extend(1)?;
        self.data[start] = v;
        Ok(start)
    }

    pub fn append_u16(&mut self, v: u16) -> Result<usize> {
        let start = self.extend(2)?;
        BigEndian::write_u16(&mut self.data[start..], v);
        Ok(start)
    }

    pub fn append_u32(&mut self, v: u32) -> Result<usize> {
        let start = self.extend(4)?;
        BigEndian::write_u32(&mut self.data[start..], v);
        Ok(start)
    }

    pub fn append_blob(&mut self, d: &[u8]) -> Result<usize> {
        let start = self.extend(d.len())?;
        self.data[start..start + d.len()].copy_from_slice(d);
        Ok(start)
    }

    /// Appends a length-prefixed character-string holding text.
    pub fn append_string(&mut self, s: &str) -> Result<usize> {
        self.append_raw_string(s.as_bytes())
    }

    /// Appends a length-prefixed character-string of raw octets (at most 255).
    pub fn append_raw_string(&mut self, s: &[u8]) -> Result<usize> {
        if s.len() > 255 {
            return Err(WireError::PacketTooLarge);
        }
        let start = self.extend(1 + s.len())?;
        self.data[start] = s.len() as u8;
        self.data[start + 1..start + 1 + s.len()].copy_from_slice(s);
        Ok(start)
    }

    // Read primitives. All of them restore the cursor on failure.

    /// Advances the read cursor over `sz` bytes, returning the offset the
    /// region starts at.
    pub(crate) fn read(&mut self, sz: usize) -> Result<usize> {
        if self.rindex + sz > self.data.len() {
            return Err(WireError::PacketTooSmall);
        }
        let start = self.rindex;
        self.rindex += sz;
        Ok(start)
    }

    /// Moves the read cursor to an absolute position within the packet.
    pub fn rewind(&mut self, idx: usize) {
        assert!(idx >= DNS_PACKET_HEADER_SIZE && idx <= self.data.len());
        self.rindex = idx;
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let o = self.read(1)?;
        Ok(self.data[o])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let o = self.read(2)?;
        Ok(BigEndian::read_u16(&self.data[o..]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let o = self.read(4)?;
        Ok(BigEndian::read_u32(&self.data[o..]))
    }

    pub fn read_blob(&mut self, sz: usize) -> Result<&[u8]> {
        let o = self.read(sz)?;
        Ok(&self.data[o..o + sz])
    }

    pub fn read_memdup(&mut self, sz: usize) -> Result<Vec<u8>> {
        self.read_blob(sz).map(|d| d.to_vec())
    }

    /// Reads a length-prefixed character-string as text: embedded NUL
    /// octets and invalid UTF-8 are rejected.
    pub fn read_string(&mut self) -> Result<String> {
        let saved_rindex = self.rindex;
        match self.read_string_inner() {
            Ok(s) => Ok(s),
            Err(e) => {
                self.rindex = saved_rindex;
                Err(e)
            }
        }
    }

    fn read_string_inner(&mut self) -> Result<String> {
        let c = self.read_u8()? as usize;
        let o = self.read(c)?;
        let d = &self.data[o..o + c];
        if d.contains(&0) {
            return Err(WireError::InvalidPacket("Embedded NUL in a string"));
        }
        String::from_utf8(d.to_vec())
            .map_err(|_| WireError::InvalidPacket("Invalid UTF-8 in a string"))
    }

    /// Reads a length-prefixed character-string as raw octets.
    pub fn read_raw_string(&mut self) -> Result<&[u8]> {
        let saved_rindex = self.rindex;
        let c = match self.read_u8() {
            Ok(c) => c as usize,
            Err(e) => {
                self.rindex = saved_rindex;
                return Err(e);
            }
        };
        match self.read(c) {
            Ok(o) => Ok(&self.data[o..o + c]),
            Err(e) => {
                self.rindex = saved_rindex;
                Err(e)
            }
        }
    }

    // Validators. `Ok(false)` means the packet is fine but not of the
    // asked kind, distinct from a malformed packet.

    /// Structural sanity of the header bounds.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() < DNS_PACKET_HEADER_SIZE {
            return Err(WireError::PacketTooSmall);
        }
        if self.data.len() > DNS_PACKET_SIZE_MAX {
            return Err(WireError::PacketTooLarge);
        }
        Ok(())
    }

    /// Checks whether the packet is a well-formed reply for its protocol.
    pub fn validate_reply(&self) -> Result<bool> {
        self.validate()?;

        if !self.qr() {
            return Ok(false);
        }
        if self.opcode() != 0 {
            return Err(WireError::InvalidPacket("Bad opcode in a reply"));
        }

        match self.protocol {
            // RFC 4795, section 2.1.1: discard all replies with QDCOUNT != 1.
            DnsProtocol::Llmnr => {
                if self.qdcount() != 1 {
                    return Err(WireError::InvalidPacket("LLMNR reply with QDCOUNT != 1"));
                }
            }
            // RFC 6762, section 18.
            DnsProtocol::Mdns => {
                if self.rcode() != 0 {
                    return Err(WireError::InvalidPacket("mDNS reply with non-zero RCODE"));
                }
            }
            DnsProtocol::Dns => {}
        }

        Ok(true)
    }

    /// Checks whether the packet is a well-formed query for its protocol.
    pub fn validate_query(&self) -> Result<bool> {
        self.validate()?;

        if self.qr() {
            return Ok(false);
        }
        if self.opcode() != 0 {
            return Err(WireError::InvalidPacket("Bad opcode in a query"));
        }
        if self.tc() {
            return Err(WireError::InvalidPacket("Truncated query"));
        }

        match self.protocol {
            // RFC 4795, section 2.1.1: discard all queries with
            // QDCOUNT != 1, ANCOUNT != 0 or NSCOUNT != 0.
            DnsProtocol::Llmnr => {
                if self.qdcount() != 1 {
                    return Err(WireError::InvalidPacket("LLMNR query with QDCOUNT != 1"));
                }
                if self.ancount() > 0 {
                    return Err(WireError::InvalidPacket("LLMNR query with answers"));
                }
                if self.nscount() > 0 {
                    return Err(WireError::InvalidPacket("LLMNR query with name servers"));
                }
            }
            // RFC 6762, section 18.
            DnsProtocol::Mdns => {
                if self.aa()
                    || self.rd()
                    || self.ra()
                    || self.ad()
                    || self.cd()
                    || self.rcode() != 0
                {
                    return Err(WireError::InvalidPacket("Invalid flags in an mDNS query"));
                }
            }
            DnsProtocol::Dns => {}
        }

        Ok(true)
    }
}

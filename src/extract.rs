//! Whole-message extraction: walks the question and record sections of a
//! received packet and materializes them as shared, immutable objects.

use std::sync::Arc;

use log::trace;

use crate::constants::*;
use crate::errors::*;
use crate::label::name_is_root;
use crate::packet::DnsPacket;
use crate::record::{DnsResourceKey, DnsResourceRecord};

/// A record pulled out of a packet, with the flags the resolver layers
/// act on. Only Answer-section records are cacheable (RFC 4795, section
/// 2.9); `shared_owner` marks mDNS records whose cache-flush bit was
/// clear.
#[derive(Debug, Clone)]
pub struct DnsAnswerItem {
    pub rr: Arc<DnsResourceRecord>,
    pub ifindex: i32,
    pub cacheable: bool,
    pub shared_owner: bool,
}

impl DnsPacket {
    /// Parses the entire message into the question list, the answer list
    /// and the OPT record. Idempotent: once extracted, the packet keeps
    /// the same objects and further calls succeed immediately. The read
    /// cursor is preserved either way.
    pub fn extract(&mut self) -> Result<()> {
        if self.extracted {
            return Ok(());
        }

        let saved_rindex = self.rindex;
        self.rewind(DNS_PACKET_HEADER_SIZE);

        let r = self.extract_inner();
        self.rindex = saved_rindex;
        if r.is_ok() {
            self.extracted = true;
        }
        r
    }

    fn extract_inner(&mut self) -> Result<()> {
        let qdcount = self.qdcount() as usize;
        let mut question = Vec::with_capacity(qdcount);
        for _ in 0..qdcount {
            let (key, cache_flush) = self.read_key()?;

            if cache_flush {
                return Err(WireError::InvalidPacket("Cache-flush bit on a question"));
            }
            if !dns_type_is_valid_query(key.rr_type) {
                return Err(WireError::InvalidPacket("Invalid type for a question"));
            }

            question.push(Arc::new(key));
        }

        let ancount = self.ancount() as usize;
        let nscount = self.nscount() as usize;
        let rrcount = self.rrcount();

        let mut answer = Vec::with_capacity(rrcount);
        let mut opt: Option<Arc<DnsResourceRecord>> = None;

        for i in 0..rrcount {
            let (rr, cache_flush) = self.read_rr()?;

            if rr.key.rr_type == DNS_TYPE_OPT {
                if !name_is_root(&rr.key.name) {
                    return Err(WireError::InvalidPacket("OPT owner is not the root"));
                }
                // The OPT record is only valid in the additional section.
                if i < ancount + nscount {
                    return Err(WireError::InvalidPacket(
                        "OPT record outside the additional section",
                    ));
                }
                if opt.is_some() {
                    return Err(WireError::InvalidPacket("Duplicate OPT record"));
                }
                opt = Some(Arc::new(rr));
            } else {
                answer.push(DnsAnswerItem {
                    cacheable: i < ancount,
                    shared_owner: self.protocol == DnsProtocol::Mdns && !cache_flush,
                    ifindex: self.ifindex,
                    rr: Arc::new(rr),
                });
            }
        }

        trace!(
            "extracted {} {} question(s), {} record(s), opt: {}",
            question.len(),
            self.protocol,
            answer.len(),
            opt.is_some()
        );

        self.question = question;
        self.answer = answer;
        self.opt = opt;
        Ok(())
    }

    /// The question section of an extracted packet.
    pub fn question(&self) -> &[Arc<DnsResourceKey>] {
        &self.question
    }

    /// All non-OPT records of an extracted packet, in wire order.
    pub fn answer(&self) -> &[DnsAnswerItem] {
        &self.answer
    }

    /// The OPT pseudo-record of an extracted packet, if any.
    pub fn opt(&self) -> Option<&Arc<DnsResourceRecord>> {
        self.opt.as_ref()
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted
    }

    /// Whether this packet is a reply carrying `key` as its only
    /// question. Extracts the packet if that hasn't happened yet.
    pub fn is_reply_for(&mut self, key: &DnsResourceKey) -> Result<bool> {
        if !self.qr() {
            return Ok(false);
        }

        self.extract()?;

        if self.question.len() != 1 {
            return Ok(false);
        }
        Ok(*self.question[0] == *key)
    }
}

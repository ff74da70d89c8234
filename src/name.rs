//! Domain-name encoding and decoding, including RFC 1035 section 4.1.4
//! compression. The decoder treats the packet as hostile: pointers may
//! only refer to prior occurrences, which rules out loops and forward
//! jumps by making every jump target strictly decreasing.

use crate::constants::*;
use crate::errors::*;
use crate::label::{apply_idna, escape_label, undo_idna, unescape_label};
use crate::packet::DnsPacket;

/// Compression-table key for a name suffix: case-insensitive, and a
/// trailing unescaped dot does not make a different name.
fn compression_key(name: &str) -> String {
    let stripped = match name.strip_suffix('.') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => name,
    };
    stripped.to_ascii_lowercase()
}

impl DnsPacket {
    /// Appends a name in wire format and returns the offset it starts at.
    ///
    /// With `allow_compression`, known suffixes are replaced by a 2-byte
    /// pointer and new suffixes are recorded for later appends. With
    /// `canonical_candidate`, labels are lowercased when the packet is in
    /// canonical form. Conventional DNS converts labels to A-label form,
    /// mDNS and LLMNR to U-label form. On failure the packet is rolled
    /// back to its previous size.
    pub fn append_name(
        &mut self,
        name: &str,
        allow_compression: bool,
        canonical_candidate: bool,
    ) -> Result<usize> {
        let allow_compression = allow_compression && !self.refuse_compression;
        let saved_size = self.size();

        match self.append_name_inner(name, allow_compression, canonical_candidate) {
            Ok(()) => Ok(saved_size),
            Err(e) => {
                self.truncate(saved_size);
                Err(e)
            }
        }
    }

    fn append_name_inner(
        &mut self,
        mut name: &str,
        allow_compression: bool,
        canonical_candidate: bool,
    ) -> Result<()> {
        let mut label = [0u8; DNS_LABEL_MAX];

        while !name.is_empty() {
            if allow_compression {
                if let Some(&n) = self.names.get(compression_key(name).as_str()) {
                    debug_assert!(n < self.size() && n < DNS_COMPRESSION_POINTER_MAX);
                    self.append_u16(0xc000 | n as u16)?;
                    return Ok(());
                }
            }

            let suffix = if allow_compression {
                Some(compression_key(name))
            } else {
                None
            };

            let len = unescape_label(&mut name, &mut label)?;
            if len == 0 {
                // Trailing dot: the root label below ends the name.
                break;
            }

            let transformed = match self.protocol {
                DnsProtocol::Dns => apply_idna(&label[..len])?,
                DnsProtocol::Mdns | DnsProtocol::Llmnr => undo_idna(&label[..len])?,
            };
            let n = match &transformed {
                Some(t) => self.append_label(t, canonical_candidate)?,
                None => self.append_label(&label[..len], canonical_candidate)?,
            };

            if let Some(suffix) = suffix {
                if n < DNS_COMPRESSION_POINTER_MAX {
                    self.names.insert(suffix, n);
                }
            }
        }

        self.append_u8(0)?;
        Ok(())
    }

    /// Appends one label, lowercasing it when the packet is generating the
    /// DNSSEC canonical form and this label is a candidate for it. Other
    /// labels keep their exact octets, which DNS-SD relies on.
    fn append_label(&mut self, label: &[u8], canonical_candidate: bool) -> Result<usize> {
        if label.len() > DNS_LABEL_MAX {
            return Err(WireError::PacketTooLarge);
        }

        let fold = self.canonical_form && canonical_candidate;
        let start = self.extend(1 + label.len())?;

        self.data[start] = label.len() as u8;
        let w = &mut self.data[start + 1..start + 1 + label.len()];
        if fold {
            for (d, &c) in w.iter_mut().zip(label) {
                *d = c.to_ascii_lowercase();
            }
        } else {
            w.copy_from_slice(label);
        }

        Ok(start)
    }

    /// Decodes a name at the read cursor into presentation format. The
    /// cursor ends up right after the name as it appears in the stream,
    /// not after any pointer target. Failure restores the cursor.
    pub fn read_name(&mut self, allow_compression: bool) -> Result<String> {
        let allow_compression = allow_compression && !self.refuse_compression;
        let saved_rindex = self.rindex;

        match self.read_name_inner(allow_compression) {
            Ok(name) => Ok(name),
            Err(e) => {
                self.rindex = saved_rindex;
                Err(e)
            }
        }
    }

    fn read_name_inner(&mut self, allow_compression: bool) -> Result<String> {
        let mut ret = String::new();
        let mut after_rindex = 0;
        let mut jump_barrier = self.rindex;
        let mut first = true;

        loop {
            let c = self.read_u8()?;

            if c == 0 {
                // End of name.
                break;
            } else if c <= 63 {
                // Literal label.
                let o = self.read(c as usize)?;
                if first {
                    first = false;
                } else {
                    ret.push('.');
                }
                escape_label(&self.data[o..o + c as usize], &mut ret);
            } else if allow_compression && c & 0xc0 == 0xc0 {
                let d = self.read_u8()?;
                let ptr = ((c & !0xc0) as usize) << 8 | d as usize;

                // Jumps are limited to a prior occurrence (RFC 1035,
                // section 4.1.4), so every jump lowers the barrier.
                if ptr < DNS_PACKET_HEADER_SIZE || ptr >= jump_barrier {
                    return Err(WireError::InvalidName("Pointer is not a prior occurrence"));
                }

                if after_rindex == 0 {
                    after_rindex = self.rindex;
                }
                jump_barrier = ptr;
                self.rindex = ptr;
            } else {
                return Err(WireError::InvalidName("Invalid label length"));
            }
        }

        if after_rindex != 0 {
            self.rindex = after_rindex;
        }

        Ok(ret)
    }
}

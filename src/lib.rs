//! A wire-format codec for DNS, mDNS and LLMNR messages.
//!
//! The central type is [`DnsPacket`]: a growable buffer built up by
//! appends on the send path, or wrapped around a received buffer and
//! walked with transactional reads on the receive path. Everything a
//! resolver needs from a message comes out of [`DnsPacket::extract`]:
//! the question keys, the typed resource records and the EDNS(0) OPT
//! pseudo-record.
//!
//! The parser assumes hostile input. Compression pointers may only point
//! backwards, every read is bounds-checked, and a failing operation
//! leaves the packet exactly as it found it.

pub mod bitmap;
pub mod constants;
pub mod errors;
pub mod extract;
pub mod label;
pub mod name;
pub mod packet;
pub mod record;

pub use crate::bitmap::*;
pub use crate::constants::*;
pub use crate::errors::*;
pub use crate::extract::*;
pub use crate::label::*;
pub use crate::packet::*;
pub use crate::record::*;

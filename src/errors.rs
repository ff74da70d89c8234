use thiserror::Error;

/// Errors returned by the codec. Malformed input from the network is
/// reported, never panicked on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Packet too small")]
    PacketTooSmall,
    #[error("Packet too large")]
    PacketTooLarge,
    #[error("Invalid name in a DNS record: {0}")]
    InvalidName(&'static str),
    #[error("Invalid DNS packet: {0}")]
    InvalidPacket(&'static str),
}

pub type Result<T> = std::result::Result<T, WireError>;

use std::io;

use super::protocol::PacketError;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("could not reach {target}: {source}")]
    ConnectionFailure {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("peer disconnected")]
    PeerDisconnected,
    #[error("peer stopped reading: {queued} bytes queued, limit {max}")]
    SlowPeer { queued: usize, max: usize },
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge { size: usize, max: usize },
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl NetError {
    pub(crate) fn connection(target: impl ToString, source: io::Error) -> Self {
        NetError::ConnectionFailure {
            target: target.to_string(),
            source,
        }
    }
}

mod connection;
mod error;
mod guest;
mod host;
mod protocol;
mod snapshot;
mod stats;
mod transport;

pub use connection::ConnectionState;
pub use error::NetError;
pub use guest::GuestEndpoint;
pub use host::HostEndpoint;
pub use protocol::{
    ArchivedPacket, InputMessage, Message, PROTOCOL_MAGIC, PROTOCOL_VERSION, Packet, PacketError,
    PacketHeader, SnapshotMessage,
};
pub use snapshot::{EnemyState, PlayerState, ProjectileState, SnapshotGate, WorldSnapshot};
pub use stats::NetworkStats;
pub use transport::{
    FRAME_HEADER_LEN, FrameDecoder, HostListener, StreamTransport, encode_frame, resolve_peer,
};

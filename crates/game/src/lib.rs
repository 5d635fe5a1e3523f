pub mod config;
pub mod geometry;
pub mod net;
pub mod session;
pub mod simulation;
pub mod world;

pub use config::{ConfigError, DEFAULT_PORT, DEFAULT_TICK_RATE, DifficultyConfig, GameConfig, NetConfig};
pub use geometry::{Aabb, Bounds};
pub use net::{
    ConnectionState, GuestEndpoint, HostEndpoint, InputMessage, Message, NetError, NetworkStats,
    Packet, PacketError, PacketHeader, SnapshotGate, SnapshotMessage, WorldSnapshot,
};
pub use session::{
    InputLatch, PlayerView, RenderView, Session, SessionEnd, SessionError, SessionMode,
    SessionStatus,
};
pub use simulation::{
    DifficultyScheduler, FixedTimestep, Intent, Kill, PlayerInput, Simulation, SimulationError,
    TickEvents,
};
pub use world::{Enemy, EntityId, GUEST_PLAYER, HOST_PLAYER, Player, PlayerId, Projectile, WorldState};

mod entity;
mod state;

pub use entity::{EntityId, Enemy, GUEST_PLAYER, HOST_PLAYER, Player, PlayerId, Projectile};
pub use state::WorldState;

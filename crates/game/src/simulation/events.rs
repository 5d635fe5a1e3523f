use crate::world::{EntityId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    pub projectile: EntityId,
    pub enemy: EntityId,
    pub owner: PlayerId,
}

/// What happened during one call to `Simulation::advance`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    pub tick: u64,
    pub fired: Vec<EntityId>,
    pub spawned: Vec<EntityId>,
    pub kills: Vec<Kill>,
    pub fallen: Vec<PlayerId>,
}

impl TickEvents {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
            && self.spawned.is_empty()
            && self.kills.is_empty()
            && self.fallen.is_empty()
    }
}

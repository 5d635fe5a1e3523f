use std::collections::BTreeMap;

use glam::Vec2;

use crate::net::InputMessage;
use crate::simulation::Intent;
use crate::world::PlayerId;

#[derive(Debug, Clone, Default)]
struct Latched {
    movement: Vec2,
    sprint: bool,
    fire: Option<Vec2>,
}

/// Remote input between host ticks. Movement and sprint are last-write-wins and persist
/// until replaced; a fire request is held until the next tick consumes it.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    players: BTreeMap<PlayerId, Latched>,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: &InputMessage) {
        let latched = self.players.entry(message.player_id).or_default();
        latched.movement = Vec2::from_array(message.movement);
        latched.sprint = message.sprinting;
        if let Some(direction) = message.fire_direction {
            latched.fire = Some(Vec2::from_array(direction));
        }
    }

    /// Intent to apply for `player` this tick, or `None` if nothing has arrived yet.
    pub fn take(&mut self, player: PlayerId) -> Option<Intent> {
        let latched = self.players.get_mut(&player)?;

        let mut intent = Intent::moving(latched.movement).with_sprint(latched.sprint);
        if let Some(direction) = latched.fire.take() {
            intent = intent.with_fire(direction);
        }
        Some(intent)
    }
}

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;

pub type PlayerId = u8;
pub type EntityId = u64;

pub const HOST_PLAYER: PlayerId = 0;
pub const GUEST_PLAYER: PlayerId = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub position: Vec2,
    /// Unit-length or zero.
    pub intent: Vec2,
    pub energy: f32,
    pub alive: bool,
    pub fire_cooldown: f32,
}

impl Player {
    pub fn new(id: PlayerId, position: Vec2, energy: f32) -> Self {
        Self {
            id,
            position,
            intent: Vec2::ZERO,
            energy,
            alive: true,
            fire_cooldown: 0.0,
        }
    }

    pub fn aabb(&self, size: f32) -> Aabb {
        Aabb::from_center(self.position, size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub position: Vec2,
    pub target: PlayerId,
}

impl Enemy {
    pub fn aabb(&self, size: f32) -> Aabb {
        Aabb::from_center(self.position, size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub position: Vec2,
    /// Unit vector, fixed for the projectile's life.
    pub direction: Vec2,
    pub owner: PlayerId,
    pub age: f32,
}

impl Projectile {
    pub fn aabb(&self, size: f32) -> Aabb {
        Aabb::from_center(self.position, size)
    }
}

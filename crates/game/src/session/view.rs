use glam::Vec2;

use crate::config::GameConfig;
use crate::geometry::Bounds;
use crate::world::{PlayerId, WorldState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The local player was caught.
    Fallen,
    /// The partner was caught while the local player was still standing.
    Survived,
    Quit,
    Disconnected,
}

impl SessionEnd {
    pub fn headline(self) -> &'static str {
        match self {
            SessionEnd::Fallen => "You died",
            SessionEnd::Survived => "Winner",
            SessionEnd::Quit => "Session ended",
            SessionEnd::Disconnected => "Connection lost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    WaitingForPeer,
    Running,
    Ended(SessionEnd),
}

impl SessionStatus {
    pub fn is_ended(self) -> bool {
        matches!(self, SessionStatus::Ended(_))
    }

    pub fn end(self) -> Option<SessionEnd> {
        match self {
            SessionStatus::Ended(end) => Some(end),
            _ => None,
        }
    }

    /// Status of a world as seen by `local`.
    pub fn of_world(world: &WorldState, local: PlayerId) -> Self {
        if !world.is_terminal() {
            return SessionStatus::Running;
        }
        let alive = world.player(local).is_some_and(|p| p.alive);
        SessionStatus::Ended(if alive {
            SessionEnd::Survived
        } else {
            SessionEnd::Fallen
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub position: Vec2,
    pub alive: bool,
    pub energy_fraction: f32,
    pub local: bool,
}

/// Everything a front-end needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    pub arena: Bounds,
    pub player_size: f32,
    pub enemy_size: f32,
    pub projectile_size: f32,
    pub tick: u64,
    pub elapsed: f32,
    pub score: u32,
    pub enemy_count: usize,
    pub players: Vec<PlayerView>,
    pub enemies: Vec<Vec2>,
    pub projectiles: Vec<Vec2>,
    pub terminal: bool,
    pub status: SessionStatus,
}

impl RenderView {
    pub fn empty(config: &GameConfig, status: SessionStatus) -> Self {
        Self {
            arena: Bounds::new(config.arena_width, config.arena_height),
            player_size: config.player_size,
            enemy_size: config.enemy_size,
            projectile_size: config.projectile_size,
            tick: 0,
            elapsed: 0.0,
            score: 0,
            enemy_count: 0,
            players: Vec::new(),
            enemies: Vec::new(),
            projectiles: Vec::new(),
            terminal: status.is_ended(),
            status,
        }
    }

    pub fn from_world(
        world: &WorldState,
        config: &GameConfig,
        local: PlayerId,
        status: SessionStatus,
    ) -> Self {
        let max_energy = config.max_energy.max(f32::EPSILON);

        Self {
            tick: world.tick,
            elapsed: world.elapsed,
            score: world.score,
            enemy_count: world.enemy_count(),
            players: world
                .players
                .values()
                .map(|p| PlayerView {
                    id: p.id,
                    position: p.position,
                    alive: p.alive,
                    energy_fraction: (p.energy / max_energy).clamp(0.0, 1.0),
                    local: p.id == local,
                })
                .collect(),
            enemies: world.enemies.values().map(|e| e.position).collect(),
            projectiles: world.projectiles.values().map(|p| p.position).collect(),
            terminal: world.is_terminal() || status.is_ended(),
            ..Self::empty(config, status)
        }
    }

    pub fn local_player(&self) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.local)
    }
}

use glam::Vec2;
use rkyv::{Archive, Deserialize, Serialize};

use crate::world::{Enemy, EntityId, Player, PlayerId, Projectile, WorldState};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerState {
    pub id: PlayerId,
    pub position: [f32; 2],
    pub intent: [f32; 2],
    pub energy: f32,
    pub alive: bool,
    pub fire_cooldown: f32,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EnemyState {
    pub id: EntityId,
    pub position: [f32; 2],
    pub target: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct ProjectileState {
    pub id: EntityId,
    pub position: [f32; 2],
    pub direction: [f32; 2],
    pub owner: PlayerId,
    pub age: f32,
}

/// Full copy of a `WorldState` in wire form. Snapshots are never deltas.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldSnapshot {
    pub tick: u64,
    pub elapsed: f32,
    pub score: u32,
    pub spawn_timer: f32,
    pub terminal: bool,
    pub next_enemy_id: EntityId,
    pub next_projectile_id: EntityId,
    pub players: Vec<PlayerState>,
    pub enemies: Vec<EnemyState>,
    pub projectiles: Vec<ProjectileState>,
}

impl WorldSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        Self {
            tick: world.tick,
            elapsed: world.elapsed,
            score: world.score,
            spawn_timer: world.spawn_timer,
            terminal: world.terminal,
            next_enemy_id: world.next_enemy_id,
            next_projectile_id: world.next_projectile_id,
            players: world
                .players
                .values()
                .map(|p| PlayerState {
                    id: p.id,
                    position: p.position.to_array(),
                    intent: p.intent.to_array(),
                    energy: p.energy,
                    alive: p.alive,
                    fire_cooldown: p.fire_cooldown,
                })
                .collect(),
            enemies: world
                .enemies
                .values()
                .map(|e| EnemyState {
                    id: e.id,
                    position: e.position.to_array(),
                    target: e.target,
                })
                .collect(),
            projectiles: world
                .projectiles
                .values()
                .map(|p| ProjectileState {
                    id: p.id,
                    position: p.position.to_array(),
                    direction: p.direction.to_array(),
                    owner: p.owner,
                    age: p.age,
                })
                .collect(),
        }
    }

    pub fn restore(&self) -> WorldState {
        let mut world = WorldState::empty();
        world.tick = self.tick;
        world.elapsed = self.elapsed;
        world.score = self.score;
        world.spawn_timer = self.spawn_timer;
        world.terminal = self.terminal;
        world.next_enemy_id = self.next_enemy_id;
        world.next_projectile_id = self.next_projectile_id;

        for p in &self.players {
            world.add_player(Player {
                id: p.id,
                position: Vec2::from_array(p.position),
                intent: Vec2::from_array(p.intent),
                energy: p.energy,
                alive: p.alive,
                fire_cooldown: p.fire_cooldown,
            });
        }
        for e in &self.enemies {
            world.enemies.insert(
                e.id,
                Enemy {
                    id: e.id,
                    position: Vec2::from_array(e.position),
                    target: e.target,
                },
            );
        }
        for p in &self.projectiles {
            world.projectiles.insert(
                p.id,
                Projectile {
                    id: p.id,
                    position: Vec2::from_array(p.position),
                    direction: Vec2::from_array(p.direction),
                    owner: p.owner,
                    age: p.age,
                },
            );
        }

        world
    }
}

impl From<&WorldState> for WorldSnapshot {
    fn from(world: &WorldState) -> Self {
        Self::capture(world)
    }
}

/// Admits snapshots in strictly increasing tick order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotGate {
    last_applied: Option<u64>,
}

impl SnapshotGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Returns `true` and records `tick` if it is newer than everything admitted so far.
    pub fn admit(&mut self, tick: u64) -> bool {
        match self.last_applied {
            Some(last) if tick <= last => false,
            _ => {
                self.last_applied = Some(tick);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::world::{GUEST_PLAYER, HOST_PLAYER};

    #[test]
    fn test_capture_restore_keeps_every_field() {
        let config = GameConfig::default();
        let mut world = WorldState::new(&config, &[HOST_PLAYER, GUEST_PLAYER]);
        world.spawn_enemy(Vec2::new(0.0, 77.0), HOST_PLAYER);
        let removed = world.spawn_enemy(Vec2::new(5.0, 5.0), GUEST_PLAYER);
        world.enemies.remove(&removed);
        world.spawn_projectile(Vec2::new(10.0, 20.0), Vec2::X, GUEST_PLAYER);
        world.player_mut(GUEST_PLAYER).unwrap().alive = false;
        world.tick = 300;
        world.elapsed = 5.0;
        world.score = 4;
        world.spawn_timer = 0.4;

        let restored = WorldSnapshot::capture(&world).restore();

        assert_eq!(restored, world);
        // Ids keep counting from where the host left off.
        assert_eq!(restored.next_enemy_id, removed + 1);
    }

    #[test]
    fn test_gate_applies_5_then_7_and_drops_3() {
        let mut gate = SnapshotGate::new();
        let applied: Vec<u64> = [5, 3, 7].into_iter().filter(|&t| gate.admit(t)).collect();

        assert_eq!(applied, vec![5, 7]);
        assert_eq!(gate.last_applied(), Some(7));
    }

    #[test]
    fn test_gate_drops_duplicates() {
        let mut gate = SnapshotGate::new();
        assert!(gate.admit(0));
        assert!(!gate.admit(0));
        assert!(gate.admit(1));
    }
}

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

use super::entity::{EntityId, Enemy, Player, PlayerId, Projectile};

const PLAYER_SPACING: f32 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub players: BTreeMap<PlayerId, Player>,
    pub enemies: BTreeMap<EntityId, Enemy>,
    pub projectiles: BTreeMap<EntityId, Projectile>,
    pub elapsed: f32,
    pub tick: u64,
    pub score: u32,
    pub spawn_timer: f32,
    pub terminal: bool,
    pub(crate) next_enemy_id: EntityId,
    pub(crate) next_projectile_id: EntityId,
}

impl WorldState {
    pub fn empty() -> Self {
        Self {
            players: BTreeMap::new(),
            enemies: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            elapsed: 0.0,
            tick: 0,
            score: 0,
            spawn_timer: 0.0,
            terminal: false,
            next_enemy_id: 1,
            next_projectile_id: 1,
        }
    }

    /// Fresh world with the given players lined up around the arena centre.
    pub fn new(config: &GameConfig, player_ids: &[PlayerId]) -> Self {
        let mut world = Self::empty();
        let center = Vec2::new(config.arena_width * 0.5, config.arena_height * 0.5);
        let offset = (player_ids.len().saturating_sub(1)) as f32 * 0.5;

        for (i, &id) in player_ids.iter().enumerate() {
            let x = center.x + (i as f32 - offset) * PLAYER_SPACING;
            world.add_player(Player::new(id, Vec2::new(x, center.y), config.max_energy));
        }

        world
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn living_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.alive)
    }

    pub fn any_alive(&self) -> bool {
        self.players.values().any(|p| p.alive)
    }

    /// Lowest id wins ties.
    pub fn nearest_living_player(&self, position: Vec2) -> Option<PlayerId> {
        let mut best: Option<(PlayerId, f32)> = None;
        for player in self.living_players() {
            let distance = player.position.distance_squared(position);
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((player.id, distance)),
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn spawn_enemy(&mut self, position: Vec2, target: PlayerId) -> EntityId {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        self.enemies.insert(
            id,
            Enemy {
                id,
                position,
                target,
            },
        );
        id
    }

    pub fn spawn_projectile(&mut self, position: Vec2, direction: Vec2, owner: PlayerId) -> EntityId {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        self.projectiles.insert(
            id,
            Projectile {
                id,
                position,
                direction,
                owner,
                age: 0.0,
            },
        );
        id
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{GUEST_PLAYER, HOST_PLAYER};

    #[test]
    fn test_players_start_inside_arena() {
        let config = GameConfig::default();
        let world = WorldState::new(&config, &[HOST_PLAYER, GUEST_PLAYER]);

        let host = world.player(HOST_PLAYER).unwrap();
        let guest = world.player(GUEST_PLAYER).unwrap();
        assert_eq!(host.position, Vec2::new(360.0, 300.0));
        assert_eq!(guest.position, Vec2::new(440.0, 300.0));
        assert_eq!(host.energy, config.max_energy);
        assert!(host.alive && guest.alive);
    }

    #[test]
    fn test_entity_ids_are_never_reused() {
        let mut world = WorldState::empty();
        let a = world.spawn_enemy(Vec2::ZERO, HOST_PLAYER);
        world.enemies.remove(&a);
        let b = world.spawn_enemy(Vec2::ZERO, HOST_PLAYER);
        assert!(b > a);

        let p = world.spawn_projectile(Vec2::ZERO, Vec2::X, HOST_PLAYER);
        world.projectiles.remove(&p);
        let q = world.spawn_projectile(Vec2::ZERO, Vec2::X, HOST_PLAYER);
        assert!(q > p);
    }

    #[test]
    fn test_nearest_player_skips_the_dead() {
        let config = GameConfig::default();
        let mut world = WorldState::new(&config, &[HOST_PLAYER, GUEST_PLAYER]);
        let near_guest = Vec2::new(790.0, 300.0);
        assert_eq!(world.nearest_living_player(near_guest), Some(GUEST_PLAYER));

        world.player_mut(GUEST_PLAYER).unwrap().alive = false;
        assert_eq!(world.nearest_living_player(near_guest), Some(HOST_PLAYER));

        world.player_mut(HOST_PLAYER).unwrap().alive = false;
        assert_eq!(world.nearest_living_player(near_guest), None);
    }
}

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameConfig;
use crate::geometry::{Bounds, step_toward};
use crate::world::{EntityId, PlayerId, WorldState};

use super::difficulty::DifficultyScheduler;
use super::events::{Kill, TickEvents};
use super::input::{Intent, PlayerInput};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("invalid timestep {0}: dt must be positive and finite")]
    InvalidTimestep(f32),
    #[error("world is terminal at tick {0}")]
    Terminated(u64),
}

/// Authoritative world stepper. Owns the seeded generator used for enemy placement, so
/// two simulations built from the same config replay identically.
pub struct Simulation {
    config: GameConfig,
    bounds: Bounds,
    difficulty: DifficultyScheduler,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: GameConfig) -> Self {
        Self {
            bounds: Bounds::new(config.arena_width, config.arena_height),
            difficulty: DifficultyScheduler::new(config.difficulty),
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn new_world(&self, player_ids: &[PlayerId]) -> WorldState {
        WorldState::new(&self.config, player_ids)
    }

    /// Advances `world` by one tick of `dt` seconds.
    pub fn advance(
        &mut self,
        world: &mut WorldState,
        inputs: &[PlayerInput],
        dt: f32,
    ) -> Result<TickEvents, SimulationError> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(SimulationError::InvalidTimestep(dt));
        }
        if world.terminal {
            return Err(SimulationError::Terminated(world.tick));
        }

        let intents = merge_inputs(world, inputs);
        let mut events = TickEvents::new(world.tick + 1);

        self.move_players(world, &intents, dt);
        self.fire(world, &intents, dt, &mut events);
        self.advance_projectiles(world, dt);
        self.spawn_enemies(world, dt, &mut events);
        self.advance_enemies(world, dt);
        self.resolve_projectile_hits(world, &mut events);
        self.resolve_player_hits(world, &mut events);

        world.tick += 1;
        world.elapsed += dt;

        if !events.fallen.is_empty() {
            world.terminal = true;
        }

        Ok(events)
    }

    fn move_players(&self, world: &mut WorldState, intents: &BTreeMap<PlayerId, Intent>, dt: f32) {
        let config = &self.config;

        for player in world.players.values_mut() {
            if !player.alive {
                continue;
            }

            let intent = intents.get(&player.id);
            let direction = intent.map_or(Vec2::ZERO, |i| i.movement.normalize_or_zero());
            let sprinting = direction != Vec2::ZERO && intent.is_some_and(|i| i.sprint);
            let boosted = sprinting && player.energy > 0.0;

            player.intent = direction;
            player.energy = if sprinting {
                (player.energy - config.energy_drain_rate * dt).max(0.0)
            } else {
                (player.energy + config.energy_regen_rate * dt).min(config.max_energy)
            };

            if direction != Vec2::ZERO {
                let speed = if boosted {
                    config.player_speed * config.sprint_multiplier
                } else {
                    config.player_speed
                };
                let candidate = player.position + direction * speed * dt;
                player.position = self.bounds.clamp_center(candidate, config.player_size);
            }
        }
    }

    fn fire(
        &self,
        world: &mut WorldState,
        intents: &BTreeMap<PlayerId, Intent>,
        dt: f32,
        events: &mut TickEvents,
    ) {
        let mut to_spawn: Vec<(Vec2, Vec2, PlayerId)> = Vec::new();

        for player in world.players.values_mut() {
            if !player.alive {
                continue;
            }

            player.fire_cooldown = (player.fire_cooldown - dt).max(0.0);

            let Some(intent) = intents.get(&player.id) else {
                continue;
            };

            for requested in &intent.fire {
                let direction = requested.normalize_or_zero();
                if direction == Vec2::ZERO {
                    continue;
                }
                if player.fire_cooldown > 0.0 {
                    break;
                }
                to_spawn.push((player.position, direction, player.id));
                player.fire_cooldown = self.config.fire_cooldown;
            }
        }

        for (position, direction, owner) in to_spawn {
            let id = world.spawn_projectile(position, direction, owner);
            events.fired.push(id);
        }
    }

    fn advance_projectiles(&self, world: &mut WorldState, dt: f32) {
        let config = &self.config;
        let bounds = self.bounds;

        world.projectiles.retain(|_, projectile| {
            projectile.position += projectile.direction * config.projectile_speed * dt;
            projectile.age += dt;
            projectile.age <= config.projectile_lifetime
                && bounds.contains_with_margin(projectile.position, config.projectile_margin)
        });
    }

    fn spawn_enemies(&mut self, world: &mut WorldState, dt: f32, events: &mut TickEvents) {
        world.spawn_timer += dt;

        let interval = self.difficulty.interval_at(world.elapsed);
        if world.spawn_timer < interval || world.enemies.len() >= self.config.max_enemies {
            return;
        }
        if !world.any_alive() {
            return;
        }

        let side = self.rng.random_range(0..4u8);
        let along: f32 = self.rng.random();
        let position = self.bounds.edge_point(side, along);

        if let Some(target) = world.nearest_living_player(position) {
            let id = world.spawn_enemy(position, target);
            world.spawn_timer = 0.0;
            log::debug!("enemy {} spawned at {:?} chasing player {}", id, position, target);
            events.spawned.push(id);
        }
    }

    fn advance_enemies(&self, world: &mut WorldState, dt: f32) {
        let living: Vec<(PlayerId, Vec2)> = world
            .living_players()
            .map(|p| (p.id, p.position))
            .collect();
        if living.is_empty() {
            return;
        }

        let max_step = self.config.enemy_speed * dt;
        for enemy in world.enemies.values_mut() {
            let target = living
                .iter()
                .find(|(id, _)| *id == enemy.target)
                .copied()
                .or_else(|| nearest(&living, enemy.position));

            if let Some((id, position)) = target {
                enemy.target = id;
                enemy.position = step_toward(enemy.position, position, max_step);
            }
        }
    }

    fn resolve_projectile_hits(&self, world: &mut WorldState, events: &mut TickEvents) {
        let projectile_size = self.config.projectile_size;
        let enemy_size = self.config.enemy_size;

        let mut downed: BTreeSet<EntityId> = BTreeSet::new();
        let mut kills = Vec::new();

        for projectile in world.projectiles.values() {
            let hitbox = projectile.aabb(projectile_size);
            let hit = world
                .enemies
                .values()
                .find(|e| !downed.contains(&e.id) && e.aabb(enemy_size).intersects(&hitbox));

            if let Some(enemy) = hit {
                downed.insert(enemy.id);
                kills.push(Kill {
                    projectile: projectile.id,
                    enemy: enemy.id,
                    owner: projectile.owner,
                });
            }
        }

        for kill in &kills {
            world.projectiles.remove(&kill.projectile);
            world.enemies.remove(&kill.enemy);
            log::debug!(
                "projectile {} from player {} downed enemy {}",
                kill.projectile,
                kill.owner,
                kill.enemy
            );
        }

        world.score += kills.len() as u32;
        events.kills.extend(kills);
    }

    fn resolve_player_hits(&self, world: &mut WorldState, events: &mut TickEvents) {
        let player_size = self.config.player_size;
        let enemy_size = self.config.enemy_size;

        for player in world.players.values_mut() {
            if !player.alive {
                continue;
            }

            let hitbox = player.aabb(player_size);
            let struck = world
                .enemies
                .values()
                .any(|e| e.aabb(enemy_size).intersects(&hitbox));

            if struck {
                player.alive = false;
                player.intent = Vec2::ZERO;
                log::debug!("player {} fell at tick {}", player.id, events.tick);
                events.fallen.push(player.id);
            }
        }
    }
}

/// Collapses the input list into one intent per known player. Movement and sprint come
/// from the last entry for a player, fire requests accumulate.
fn merge_inputs(world: &WorldState, inputs: &[PlayerInput]) -> BTreeMap<PlayerId, Intent> {
    let mut merged: BTreeMap<PlayerId, Intent> = BTreeMap::new();

    for input in inputs {
        if !world.players.contains_key(&input.player_id) {
            continue;
        }

        let entry = merged.entry(input.player_id).or_default();
        entry.movement = input.intent.movement;
        entry.sprint = input.intent.sprint;
        entry.fire.extend(input.intent.fire.iter().copied());
    }

    merged
}

fn nearest(living: &[(PlayerId, Vec2)], position: Vec2) -> Option<(PlayerId, Vec2)> {
    living.iter().copied().min_by(|a, b| {
        a.1.distance_squared(position)
            .total_cmp(&b.1.distance_squared(position))
    })
}

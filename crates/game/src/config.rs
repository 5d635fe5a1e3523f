use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_TICK_RATE: u32 = 60;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("min_interval ({min}) exceeds initial_interval ({initial})")]
    IntervalOrder { min: f32, initial: f32 },
    #[error("tick rate must be at least 1")]
    TickRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub initial_interval: f32,
    pub min_interval: f32,
    pub step: f32,
    pub step_period: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            initial_interval: 1.0,
            min_interval: 0.25,
            step: 0.05,
            step_period: 10.0,
        }
    }
}

/// Gameplay tuning. Speeds are in arena units per second, sizes are box edge lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub arena_width: f32,
    pub arena_height: f32,

    pub player_size: f32,
    pub player_speed: f32,
    pub sprint_multiplier: f32,
    pub max_energy: f32,
    pub energy_drain_rate: f32,
    pub energy_regen_rate: f32,

    pub projectile_size: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub projectile_margin: f32,
    pub fire_cooldown: f32,

    pub enemy_size: f32,
    pub enemy_speed: f32,
    pub max_enemies: usize,

    pub difficulty: DifficultyConfig,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,

            player_size: 30.0,
            player_speed: 300.0,
            sprint_multiplier: 2.0,
            max_energy: 100.0,
            energy_drain_rate: 40.0,
            energy_regen_rate: 20.0,

            projectile_size: 10.0,
            projectile_speed: 600.0,
            projectile_lifetime: 2.0,
            projectile_margin: 10.0,
            fire_cooldown: 0.15,

            enemy_size: 25.0,
            enemy_speed: 120.0,
            max_enemies: 10,

            difficulty: DifficultyConfig::default(),
            seed: 0x5eed,
        }
    }
}

impl GameConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("arena_width", self.arena_width),
            ("arena_height", self.arena_height),
            ("player_size", self.player_size),
            ("player_speed", self.player_speed),
            ("sprint_multiplier", self.sprint_multiplier),
            ("max_energy", self.max_energy),
            ("energy_drain_rate", self.energy_drain_rate),
            ("energy_regen_rate", self.energy_regen_rate),
            ("projectile_size", self.projectile_size),
            ("projectile_speed", self.projectile_speed),
            ("projectile_lifetime", self.projectile_lifetime),
            ("enemy_size", self.enemy_size),
            ("enemy_speed", self.enemy_speed),
            ("initial_interval", self.difficulty.initial_interval),
            ("min_interval", self.difficulty.min_interval),
            ("step_period", self.difficulty.step_period),
        ];
        for (field, value) in positive {
            // Also rejects NaN.
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.difficulty.min_interval > self.difficulty.initial_interval {
            return Err(ConfigError::IntervalOrder {
                min: self.difficulty.min_interval,
                initial: self.difficulty.initial_interval,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetConfig {
    pub port: u16,
    pub tick_rate: u32,
    pub connect_timeout_secs: u64,
    pub max_protocol_violations: u32,
    pub max_frame_size: usize,
    pub close_linger_ms: u64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick_rate: DEFAULT_TICK_RATE,
            connect_timeout_secs: 5,
            max_protocol_violations: 3,
            max_frame_size: 64 * 1024,
            close_linger_ms: 250,
        }
    }
}

impl NetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::TickRate);
        }
        Ok(())
    }
}

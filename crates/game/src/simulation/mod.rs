mod difficulty;
mod engine;
mod events;
mod input;
mod timestep;

pub use difficulty::DifficultyScheduler;
pub use engine::{Simulation, SimulationError};
pub use events::{Kill, TickEvents};
pub use input::{Intent, PlayerInput};
pub use timestep::FixedTimestep;

//! Core simulation module
//!
//! Contains the simulation driver, its configuration and tick timing

mod config;
mod events;
mod simulation;
mod snapshot;
mod time;

pub use config::{ConfigError, SimulationConfig};
pub use events::{EventQueue, SimEvent};
pub use simulation::{Simulation, TickReport};
pub use snapshot::{AgentView, Snapshot};
pub use time::TickTimer;

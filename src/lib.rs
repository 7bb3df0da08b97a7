//! Agents wandering a grid with A* pathfinding
//!
//! This crate provides:
//! - An occupancy grid with static obstacles and live agent positions
//! - 4-connected A* search with a Manhattan heuristic
//! - Agents that walk their paths one cell per tick and re-plan when blocked
//! - A headless simulation driver with configuration, events and snapshots

pub mod ai;
pub mod core;
pub mod error;
pub mod input;

// Re-exports for convenience
pub use rand;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        Agent, AgentId, AgentState, Cell, Grid, PathError, StepOutcome, find_path, manhattan,
    };
    pub use crate::core::{
        EventQueue, SimEvent, Simulation, SimulationConfig, Snapshot, TickReport, TickTimer,
    };
    pub use crate::error::SimError;
    pub use crate::input::{InputMapper, SimCommand};
}

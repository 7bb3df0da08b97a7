//! Grid navigation module
//!
//! Provides the occupancy grid, A* pathfinding and the agent state machine.

mod agent;
mod grid;
mod pathfinding;

pub use agent::{
    Agent, AgentState, BLUE, Color, PALETTE, PURPLE, RED, StepOutcome, YELLOW,
};
pub use grid::{AgentId, Cell, Grid, GridError};
pub use pathfinding::{PathError, find_path, manhattan};

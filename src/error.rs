//! Simulation error taxonomy
//!
//! None of these are fatal: every failure degrades to "no plan this tick"
//! and the driver tries again on the next one.

use std::fmt;

use crate::ai::{AgentId, Cell, GridError, PathError};
use crate::core::ConfigError;

/// Errors surfaced by agents and the simulation driver
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Requested goal is out of bounds, an obstacle, or occupied
    InvalidGoal { agent: AgentId, goal: Cell },
    /// Search exhausted before reaching the goal
    PathNotFound { agent: AgentId, goal: Cell },
    /// No candidate cell exists for random selection
    NoValidTarget { agent: AgentId },
    /// A planned step was taken by another agent
    BlockedStep { agent: AgentId, at: Cell },
    /// Occupant registration failed
    Grid(GridError),
    /// Configuration could not be loaded or is inconsistent
    Config(ConfigError),
}

impl SimError {
    /// Attach an agent identity to a pathfinding failure
    #[must_use]
    pub fn from_path(agent: AgentId, err: PathError) -> Self {
        match err {
            PathError::InvalidGoal { goal } => Self::InvalidGoal { agent, goal },
            PathError::NotFound { goal, .. } => Self::PathNotFound { agent, goal },
        }
    }

    /// Whether the error means the agent has no plan for its goal
    #[must_use]
    pub fn is_no_path(&self) -> bool {
        matches!(self, Self::InvalidGoal { .. } | Self::PathNotFound { .. })
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGoal { agent, goal } => write!(f, "{agent}: invalid goal {goal}"),
            Self::PathNotFound { agent, goal } => write!(f, "{agent}: no path to {goal}"),
            Self::NoValidTarget { agent } => write!(f, "{agent}: no valid target cell"),
            Self::BlockedStep { agent, at } => write!(f, "{agent}: step to {at} blocked"),
            Self::Grid(e) => write!(f, "Grid error: {e}"),
            Self::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for SimError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

//! Simulation configuration
//!
//! Loaded from RON or JSON, or built in code with the `with_*` methods.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::Cell;

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Obstacles placed before any random ones
    pub obstacles: Vec<Cell>,
    /// Number of random obstacle draws (duplicates collapse)
    pub random_obstacles: usize,
    /// Number of agents to spawn
    pub agent_count: usize,
    /// Milliseconds between simulation ticks
    pub tick_interval_ms: u64,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Stop after this many ticks (`None` runs until quit)
    pub max_ticks: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 10,
            obstacles: Vec::new(),
            random_obstacles: 20,
            agent_count: 3,
            tick_interval_ms: 500,
            seed: None,
            max_ticks: None,
        }
    }
}

impl SimulationConfig {
    /// Set grid dimensions
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set fixed obstacle cells
    pub fn with_obstacles(mut self, obstacles: impl IntoIterator<Item = Cell>) -> Self {
        self.obstacles = obstacles.into_iter().collect();
        self
    }

    /// Set number of random obstacle draws
    pub fn with_random_obstacles(mut self, count: usize) -> Self {
        self.random_obstacles = count;
        self
    }

    /// Set number of agents
    pub fn with_agents(mut self, count: usize) -> Self {
        self.agent_count = count;
        self
    }

    /// Set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set tick interval
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set tick limit
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check the configuration for values the simulation cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on an empty grid, a zero tick
    /// interval, or more agents than cells
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let area = self
            .width
            .checked_mul(self.height)
            .filter(|&area| i32::try_from(area).is_ok())
            .ok_or_else(|| {
                ConfigError::Invalid(format!("grid {}x{} is too large", self.width, self.height))
            })?;
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick interval must be positive".into()));
        }
        if self.agent_count > area {
            return Err(ConfigError::Invalid(format!(
                "{} agents do not fit on {area} cells",
                self.agent_count
            )));
        }
        Ok(())
    }

    /// Load a configuration from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Parse a configuration from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        ron::from_str(content).map_err(|e| ConfigError::DeserializeError(e.to_string()))
    }

    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::DeserializeError(e.to_string()))
    }

    /// Load by file extension: `.json` as JSON, anything else as RON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }
}

/// Errors that can occur while loading a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Deserialization error
    DeserializeError(String),
    /// Configuration values are inconsistent
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_demo_setup() {
        let config = SimulationConfig::default();

        assert_eq!((config.width, config.height), (15, 10));
        assert_eq!(config.random_obstacles, 20);
        assert_eq!(config.agent_count, 3);
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_ron_with_partial_fields() {
        let config = SimulationConfig::from_ron_str(
            "(width: 4, height: 4, obstacles: [(x: 1, y: 1)], seed: Some(7))",
        )
        .unwrap();

        assert_eq!(config.width, 4);
        assert_eq!(config.obstacles, vec![Cell::new(1, 1)]);
        assert_eq!(config.seed, Some(7));
        // Missing fields fall back to defaults
        assert_eq!(config.agent_count, 3);
    }

    #[test]
    fn test_config_json_roundtrip_through_file() {
        let config = SimulationConfig::default()
            .with_size(8, 6)
            .with_agents(2)
            .with_seed(42);
        let path = std::env::temp_dir().join("gridwalk_config_test.json");
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = SimulationConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SimulationConfig::load_ron("/nonexistent/gridwalk.ron");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SimulationConfig::default().with_size(0, 5).validate().is_err());
        assert!(SimulationConfig::default().with_agents(5).with_size(2, 2).validate().is_err());

        let mut config = SimulationConfig::default();
        config.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        // Area overflow is caught before any multiplication wraps
        let huge = SimulationConfig::default().with_size(usize::MAX, 2);
        assert!(matches!(huge.validate(), Err(ConfigError::Invalid(_))));
        let wide = SimulationConfig::default().with_size(1 << 16, 1 << 16);
        assert!(wide.validate().is_err());
    }
}

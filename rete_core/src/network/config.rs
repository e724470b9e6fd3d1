//! Network configuration.

use serde::{Deserialize, Serialize};

use super::NetworkError;

/// Configuration for a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Log a warning the first time a single node remembers this many
    /// payloads. Memories never shrink, so this is the early signal that an
    /// eviction policy is needed. `None` disables the warning.
    pub memory_warning_threshold: Option<usize>,

    /// Replay parent memories into nodes built after facts were asserted, so
    /// late rules see earlier facts.
    pub prime_new_nodes: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            memory_warning_threshold: Some(10_000),
            prime_new_nodes: true,
        }
    }
}

impl NetworkConfig {
    /// Load a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, NetworkError> {
        Ok(toml::from_str(source)?)
    }
}

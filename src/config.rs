//! Configuration helpers.
//!
//! Backend configuration is an arbitrary JSON object passed to
//! [`State::set_config`](crate::State::set_config). The state layer imposes no
//! schema on it; these helpers only make typed lookups uniform across
//! backends.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Check if `config` is an object containing `key`.
pub fn has_key(config: &serde_json::Value, key: &str) -> bool {
    config.get(key).is_some()
}

/// Read an optional typed value.
///
/// Returns `Ok(None)` if the key is absent or `null`, and a
/// `Configuration` error if it is present with the wrong type.
pub fn get_value<T: DeserializeOwned>(
    config: &serde_json::Value,
    key: &str,
) -> StateResult<Option<T>> {
    match config.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|e| StateError::Configuration(format!("key '{key}': {e}"))),
    }
}

/// Settings for the shot driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Memory limit in megabytes; `0` disables the check.
    pub max_memory_mb: usize,
    /// Parallelism hint forwarded to the state. Negative means unrestricted.
    pub max_parallel_threads: i32,
    /// Allow the measurement-sampling fast path.
    pub measure_sampling: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_memory_mb: 0,
            max_parallel_threads: 1,
            measure_sampling: true,
        }
    }
}

impl ControllerConfig {
    /// Load from a JSON object; missing keys keep their defaults.
    pub fn from_json(config: &serde_json::Value) -> StateResult<Self> {
        if config.is_null() {
            return Ok(Self::default());
        }
        Self::deserialize(config).map_err(|e| StateError::Configuration(e.to_string()))
    }
}

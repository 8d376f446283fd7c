//! Configuration types and defaults

use lenspipe_core::LensResult;
use serde::{Deserialize, Serialize};

/// Default capacity of the event broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Global lenspipe configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Install the tracing subscriber on init
    pub debug_logging: bool,
    /// Name prefix of the delivery threads, e.g. `lenspipe-photo-0`
    pub delivery_thread_prefix: String,
    /// Events buffered per [`crate::EventStream`] before the slowest one lags
    pub event_capacity: usize,
}

impl GlobalConfig {
    /// Parse a configuration from JSON, filling in defaults for missing fields
    pub fn from_json(json: &str) -> LensResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            delivery_thread_prefix: "lenspipe".to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GlobalConfig::from_json(r#"{ "delivery_thread_prefix": "cam" }"#).unwrap();
        assert_eq!(config.delivery_thread_prefix, "cam");
        assert!(!config.debug_logging);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn test_malformed_json() {
        assert!(GlobalConfig::from_json("{ debug_logging: yes").is_err());
    }
}

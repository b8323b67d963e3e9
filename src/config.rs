//! Coordinator configuration
//!
//! Timing constants and listener toggles. Persisted in LocalStorage on web so
//! a page can tune restoration without a rebuild.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::state::DEFAULT_HISTORY_CAPACITY;

/// Tunables for saving and restoring navigation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    // === Saving ===
    /// Quiescence window for scroll-driven saves (ms)
    pub debounce_ms: u64,
    /// Save (debounced) on viewport scroll events
    pub save_on_scroll: bool,
    /// Save immediately on unload
    pub save_on_unload: bool,
    /// Paths kept in the history map before the oldest is evicted
    pub history_capacity: usize,

    // === Restoring ===
    /// Restore saved state when a route mounts
    pub restore_on_mount: bool,
    /// Delays of the correction attempts after a restore starts (ms, ascending)
    pub attempt_delays_ms: Vec<u64>,
    /// Offsets closer than this to the target are left alone (px)
    pub deadband_px: u32,
    /// Saving resumes this long after the last attempt (ms)
    pub release_delay_ms: u64,
    /// Re-restore delay after an in-page view change (ms)
    pub internal_change_delay_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            save_on_scroll: true,
            save_on_unload: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,

            restore_on_mount: true,
            attempt_delays_ms: vec![0, 50, 150, 300, 500],
            deadband_px: 5,
            release_delay_ms: 100,
            internal_change_delay_ms: 100,
        }
    }
}

impl CoordinatorConfig {
    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attempt_delays_ms.is_empty() {
            return Err(ConfigError::NoAttempts);
        }
        for pair in self.attempt_delays_ms.windows(2) {
            if pair[1] < pair[0] {
                return Err(ConfigError::NotAscending {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        Ok(())
    }

    /// Time from the start of a restore until saving resumes
    pub fn restoration_window_ms(&self) -> u64 {
        self.attempt_delays_ms.last().copied().unwrap_or(0) + self.release_delay_ms
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "nav_restore_config";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded restore config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored restore config: {}", e),
                }
            }
        }

        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.debounce_ms, 100);
        assert_eq!(config.attempt_delays_ms, vec![0, 50, 150, 300, 500]);
        assert_eq!(config.deadband_px, 5);
        assert_eq!(config.restoration_window_ms(), 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = CoordinatorConfig::from_json(r#"{"debounce_ms": 250}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.deadband_px, 5);
        assert!(config.save_on_scroll);
    }

    #[test]
    fn test_rejects_unordered_delays() {
        let err = CoordinatorConfig::from_json(r#"{"attempt_delays_ms": [0, 300, 100]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotAscending { previous: 300, next: 100 }));
    }

    #[test]
    fn test_rejects_empty_delays_and_zero_capacity() {
        assert!(matches!(
            CoordinatorConfig::from_json(r#"{"attempt_delays_ms": []}"#),
            Err(ConfigError::NoAttempts)
        ));
        assert!(matches!(
            CoordinatorConfig::from_json(r#"{"history_capacity": 0}"#),
            Err(ConfigError::ZeroHistoryCapacity)
        ));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            CoordinatorConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }
}

//! # Router Configuration
//!
//! [`RouterConfig`] controls the few knobs the router exposes. It can be built
//! in code, loaded from a YAML file, and then overridden from the environment:
//!
//! ```rust,no_run
//! use ionrouter::config::RouterConfig;
//!
//! let config = RouterConfig::load("config/router.yaml")?.apply_env();
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## YAML
//!
//! ```yaml
//! duplicate_names: reject      # or "overwrite"
//! path_params_key: path
//! slow_match_threshold_us: 1000
//! state_ttl_secs: 300          # omit to disable expiry sweeps
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |----------|-------|
//! | `IONR_DUPLICATE_NAMES` | `duplicate_names` (`reject` / `overwrite`) |
//! | `IONR_PATH_PARAMS_KEY` | `path_params_key` |
//! | `IONR_SLOW_MATCH_US` | `slow_match_threshold_us` |
//! | `IONR_STATE_TTL_SECS` | `state_ttl_secs` |
//!
//! Unparseable values are ignored with a warning and the previous value is kept.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// What `register` does when a route name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateNamePolicy {
    /// Fail the registration with `RouterError::DuplicateRouteName`.
    #[default]
    Reject,
    /// Point the name at the newest route and log a warning.
    Overwrite,
}

impl DuplicateNamePolicy {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" | "error" => Some(DuplicateNamePolicy::Reject),
            "overwrite" | "last-wins" | "last_wins" => Some(DuplicateNamePolicy::Overwrite),
            _ => None,
        }
    }
}

fn default_path_params_key() -> String {
    "path".to_string()
}

fn default_slow_match_threshold_us() -> u64 {
    1_000
}

/// Router configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Route-name collision behaviour
    pub duplicate_names: DuplicateNamePolicy,
    /// Scoped-state key under which path bindings are stored
    #[serde(default = "default_path_params_key")]
    pub path_params_key: String,
    /// Matching slower than this (microseconds) is logged at WARN
    #[serde(default = "default_slow_match_threshold_us")]
    pub slow_match_threshold_us: u64,
    /// Maximum age of a scoped-state entry before `App::sweep_expired_state`
    /// reclaims it. `None` disables sweeping.
    pub state_ttl_secs: Option<u64>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            duplicate_names: DuplicateNamePolicy::default(),
            path_params_key: default_path_params_key(),
            slow_match_threshold_us: default_slow_match_threshold_us(),
            state_ttl_secs: None,
        }
    }
}

impl RouterConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read router config {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse router config {}", path.display()))
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults overridden by environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Override fields from `IONR_*` environment variables.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(val) = env::var("IONR_DUPLICATE_NAMES") {
            match DuplicateNamePolicy::parse(&val) {
                Some(policy) => self.duplicate_names = policy,
                None => warn!(value = %val, "Ignoring invalid IONR_DUPLICATE_NAMES"),
            }
        }
        if let Ok(val) = env::var("IONR_PATH_PARAMS_KEY") {
            if val.is_empty() {
                warn!("Ignoring empty IONR_PATH_PARAMS_KEY");
            } else {
                self.path_params_key = val;
            }
        }
        if let Ok(val) = env::var("IONR_SLOW_MATCH_US") {
            match val.parse() {
                Ok(us) => self.slow_match_threshold_us = us,
                Err(_) => warn!(value = %val, "Ignoring invalid IONR_SLOW_MATCH_US"),
            }
        }
        if let Ok(val) = env::var("IONR_STATE_TTL_SECS") {
            match val.parse() {
                Ok(0) => self.state_ttl_secs = None,
                Ok(secs) => self.state_ttl_secs = Some(secs),
                Err(_) => warn!(value = %val, "Ignoring invalid IONR_STATE_TTL_SECS"),
            }
        }
        self
    }

    #[must_use]
    pub fn slow_match_threshold(&self) -> Duration {
        Duration::from_micros(self.slow_match_threshold_us)
    }

    #[must_use]
    pub fn state_ttl(&self) -> Option<Duration> {
        self.state_ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.duplicate_names, DuplicateNamePolicy::Reject);
        assert_eq!(config.path_params_key, "path");
        assert_eq!(config.slow_match_threshold(), Duration::from_millis(1));
        assert_eq!(config.state_ttl(), None);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            DuplicateNamePolicy::parse("Overwrite"),
            Some(DuplicateNamePolicy::Overwrite)
        );
        assert_eq!(
            DuplicateNamePolicy::parse("reject"),
            Some(DuplicateNamePolicy::Reject)
        );
        assert_eq!(DuplicateNamePolicy::parse("sometimes"), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RouterConfig::from_yaml("duplicate_names: overwrite\n").unwrap();
        assert_eq!(config.duplicate_names, DuplicateNamePolicy::Overwrite);
        assert_eq!(config.path_params_key, "path");
        assert_eq!(config.slow_match_threshold_us, 1_000);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(RouterConfig::from_yaml("  \n").unwrap(), RouterConfig::default());
    }
}

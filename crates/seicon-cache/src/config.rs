use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the [`crate::IconHandler`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconCacheConfig {
    /// Name of the remote collection holding the icon records.
    pub collection: String,
    /// Seconds of user inactivity before pending icon updates are applied.
    pub idle_delay_secs: u64,
}

impl Default for IconCacheConfig {
    fn default() -> Self {
        Self {
            collection: "search-config-icons".into(),
            idle_delay_secs: 30,
        }
    }
}

impl IconCacheConfig {
    pub fn idle_delay(&self) -> Duration {
        Duration::from_secs(self.idle_delay_secs)
    }

    /// Parse a TOML document. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid icon cache configuration: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = IconCacheConfig::default();
        assert_eq!(c.collection, "search-config-icons");
        assert_eq!(c.idle_delay(), Duration::from_secs(30));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = IconCacheConfig::from_toml_str("idle_delay_secs = 5").unwrap();
        assert_eq!(c.idle_delay_secs, 5);
        assert_eq!(c.collection, "search-config-icons");
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let err = IconCacheConfig::from_toml_str("idle_delay_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

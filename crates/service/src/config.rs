use serde::{Deserialize, Serialize};

use scoopstock_catalog::LifecycleConfig;

/// Tunable knobs for the service layer. Deserializable so deployments can
/// load it from a config file; defaults match the shop's daily rhythm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How many days of counts and production feed the consumption and
    /// variance windows.
    pub history_days: i64,
    pub lifecycle: LifecycleConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            history_days: 7,
            lifecycle: LifecycleConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_files_fill_in_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"history_days": 14}"#).unwrap();
        assert_eq!(config.history_days, 14);
        assert_eq!(config.lifecycle, LifecycleConfig::default());
    }
}

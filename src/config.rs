use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub risk: RiskThresholds,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub endpoint_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

/// Probability cut-offs for the user-facing risk classification.
/// Tunable policy, not structure: probability < medium is LOW,
/// below high is MEDIUM, at or above high is HIGH.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            risk: RiskThresholds::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:5000/invocations".into(),
            token: None,
            timeout_secs: 10,
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: 0.33,
            high: 0.40,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "data/assessments.db".into(),
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Falls back to defaults if file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", path.display());
                Self::default()
            }
        }
    }
}

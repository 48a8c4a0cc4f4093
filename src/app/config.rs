//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis settings
    pub analysis: AnalysisSettings,
    /// Clarification settings
    pub clarification: ClarificationSettings,
    /// Output settings
    pub output: OutputSettings,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Chain id considered the default environment (1 = mainnet)
    pub default_chain_id: u64,
    /// Patterns below this confidence are dropped (0 keeps everything)
    pub min_pattern_confidence: f32,
}

/// Clarification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarificationSettings {
    /// Timestamp gap that triggers a wait question (ms)
    pub wait_gap_ms: u64,
    /// Wallet the generated test runs with
    pub test_wallet: String,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Pretty-print emitted JSON
    pub pretty_json: bool,
    /// Emit the clarification question file alongside the analysis
    pub emit_clarifications: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            default_chain_id: 1,
            min_pattern_confidence: 0.0,
        }
    }
}

impl Default for ClarificationSettings {
    fn default() -> Self {
        Self {
            wait_gap_ms: 5_000,
            test_wallet: "metamask".to_string(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            pretty_json: true,
            emit_clarifications: true,
        }
    }
}

impl Config {
    /// Default config file name, resolved against the working directory
    pub const DEFAULT_FILE: &'static str = "dapp-analyzer.json";

    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first
    /// invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(0.0..=1.0).contains(&self.analysis.min_pattern_confidence) {
            return Err(crate::Error::Config(format!(
                "min_pattern_confidence must be in [0, 1], got {}",
                self.analysis.min_pattern_confidence
            )));
        }
        if self.clarification.wait_gap_ms == 0 {
            return Err(crate::Error::Config(
                "wait_gap_ms must be > 0".to_string(),
            ));
        }
        if self.clarification.test_wallet.trim().is_empty() {
            return Err(crate::Error::Config(
                "test_wallet must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location, falling back to defaults when
    /// no file exists.
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = PathBuf::from(Self::DEFAULT_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), crate::Error> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.default_chain_id, 1);
        assert_eq!(config.clarification.wait_gap_ms, 5_000);
        assert_eq!(config.clarification.test_wallet, "metamask");
        assert!(config.output.pretty_json);
    }

    #[test]
    fn test_validate_rejects_bad_confidence() {
        let mut config = Config::default();
        config.analysis.min_pattern_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_gap() {
        let mut config = Config::default();
        config.clarification.wait_gap_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_wallet() {
        let mut config = Config::default();
        config.clarification.test_wallet = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.analysis.default_chain_id = 8453;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.analysis.default_chain_id, 8453);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"clarification": {"wait_gap_ms": 0}}"#,
        )
        .unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"analysis": {"default_chain_id": 10}}"#).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.analysis.default_chain_id, 10);
        assert_eq!(loaded.clarification.test_wallet, "metamask");
    }
}

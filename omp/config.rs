//! TOML configuration for greedy-selection experiments.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

fn default_remove() -> bool {
    true
}

/// Parameters of one experiment: target space, greedy budget and dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of sine modes spanning the target space `Vn`.
    pub n: u32,
    /// Number of measurements selected by the greedy algorithm.
    pub m: usize,
    /// Number of points on the uniform dictionary grid.
    pub dictionary_size: usize,
    #[serde(default = "default_remove")]
    pub remove: bool,
    #[serde(default)]
    pub verbose: bool,
    /// Sine coefficients of the function to reconstruct; entry `k - 1` belongs
    /// to frequency `k`.
    #[serde(default)]
    pub target: Vec<f64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n: 4,
            m: 8,
            dictionary_size: 99,
            remove: default_remove(),
            verbose: false,
            target: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize configuration to TOML: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ExperimentConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&toml_string)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects combinations the greedy construction or the basis pair would
    /// refuse later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n == 0 {
            return Err(ConfigError::Invalid("n must be at least 1".to_string()));
        }
        if self.m < self.n as usize {
            return Err(ConfigError::Invalid(format!(
                "m ({}) must not be smaller than n ({})",
                self.m, self.n
            )));
        }
        if self.remove && self.dictionary_size < self.m {
            return Err(ConfigError::Invalid(format!(
                "dictionary_size ({}) must be at least m ({}) when selected points are removed",
                self.dictionary_size, self.m
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_applies_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "n = 3\nm = 6\ndictionary_size = 49\ntarget = [1.0, 0.5]").unwrap();

        let config = ExperimentConfig::load(file.path()).unwrap();
        assert_eq!(config.n, 3);
        assert_eq!(config.m, 6);
        assert!(config.remove);
        assert!(!config.verbose);
        assert_eq!(config.target, vec![1.0, 0.5]);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = ExperimentConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed: ExperimentConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation() {
        let config = ExperimentConfig {
            m: 2,
            ..ExperimentConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ExperimentConfig {
            dictionary_size: 5,
            ..ExperimentConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ExperimentConfig {
            dictionary_size: 5,
            remove: false,
            ..ExperimentConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ExperimentConfig::load(Path::new("/nonexistent/h1omp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}

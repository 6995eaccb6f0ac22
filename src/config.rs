//! Configuration for building and training SOM networks.

use crate::error::{Result, SomkitError};
use crate::function::{FunctionInstance, FunctionKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Map construction.
    pub som: SomConfig,

    /// Training schedule.
    pub training: TrainingConfig,
}

impl Config {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SomkitError::FileNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Checks ranges and resolves every function name.
    pub fn validate(&self) -> Result<()> {
        self.som.validate()?;
        self.training.validate()
    }
}

/// A function class name plus parameters. Empty parameters mean defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Class name, exact or unique prefix.
    pub class: String,

    /// Parameter values; empty for the class defaults.
    #[serde(default)]
    pub params: Vec<f64>,
}

impl FunctionSpec {
    /// Creates a function spec.
    pub fn new(class: impl Into<String>, params: Vec<f64>) -> Self {
        Self {
            class: class.into(),
            params,
        }
    }

    /// Resolves the function spec into an instance of the given kind.
    pub fn instance(&self, kind: FunctionKind) -> Result<FunctionInstance> {
        if self.params.is_empty() {
            FunctionInstance::by_name(kind, &self.class)
        } else {
            FunctionInstance::with_params(kind, &self.class, &self.params)
        }
    }
}

/// Self-Organizing Map construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SomConfig {
    /// Network name.
    /// Default: "som".
    pub name: String,

    /// Grid rows.
    /// Default: 4.
    pub rows: usize,

    /// Grid columns.
    /// Default: 4.
    pub cols: usize,

    /// Input vector dimension.
    /// Default: 2.
    pub input_dimension: usize,

    /// Neighborhood function.
    /// Default: gaussian(time 0, radius 2, time constant 100).
    pub neighborhood: FunctionSpec,

    /// Learning-rate schedule.
    /// Default: exponential(initial 0.1, time constant 100).
    pub learning_rate: FunctionSpec,

    /// Weight initializer.
    /// Default: uniform(0, 1).
    pub weight_init: FunctionSpec,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            name: "som".to_string(),
            rows: 4,
            cols: 4,
            input_dimension: 2,
            neighborhood: FunctionSpec::new("gaussian", vec![0.0, 2.0, 100.0]),
            learning_rate: FunctionSpec::new("exponential", vec![0.1, 100.0]),
            weight_init: FunctionSpec::new("uniform", vec![0.0, 1.0]),
        }
    }
}

impl SomConfig {
    /// Returns the number of output units.
    #[inline]
    pub fn total_units(&self) -> usize {
        self.rows * self.cols
    }

    fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SomkitError::Config(format!("empty grid {}x{}", self.rows, self.cols)));
        }
        if self.input_dimension == 0 {
            return Err(SomkitError::Config("input dimension must be positive".to_string()));
        }
        for (spec, kind) in [
            (&self.neighborhood, FunctionKind::Neighborhood),
            (&self.learning_rate, FunctionKind::LearningRate),
            (&self.weight_init, FunctionKind::WeightInit),
        ] {
            spec.instance(kind)?
                .validate()
                .map_err(|e| SomkitError::Config(e.to_string()))?;
        }
        Ok(())
    }
}

/// Training schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the training set.
    /// Default: 100.
    pub epochs: usize,

    /// Shuffle the set before every epoch.
    /// Default: true.
    pub shuffle: bool,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,

    /// Report a checkpoint every this many epochs; 0 disables checkpoints.
    /// Default: 0.
    pub checkpoint_every: usize,

    /// Z-score normalize inputs before training.
    /// Default: false.
    pub regularize: bool,

    /// Stop once the epoch's mean quantization error falls below this.
    /// Default: None.
    pub tolerance: Option<f64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            shuffle: true,
            seed: None,
            checkpoint_every: 0,
            regularize: false,
            tolerance: None,
        }
    }
}

impl TrainingConfig {
    fn validate(&self) -> Result<()> {
        if let Some(tol) = self.tolerance {
            if tol.is_nan() || tol < 0.0 {
                return Err(SomkitError::Config(format!("invalid tolerance {}", tol)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.som.total_units(), 16);
        assert_eq!(config.training.epochs, 100);
        config.validate().unwrap();
    }

    #[test]
    fn test_function_spec_defaults() {
        let spec = FunctionSpec::new("rect", vec![]);
        let f = spec.instance(FunctionKind::Neighborhood).unwrap();
        assert_eq!(f.name(), "rectangular");
        assert_eq!(f.params(), &[0.0, 1.0, 1000.0]);
    }

    #[test]
    fn test_validate_rejects_bad_function() {
        let mut config = Config::default();
        config.som.learning_rate = FunctionSpec::new("cosine", vec![]);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.som.rows = 0;
        assert!(matches!(config.validate(), Err(SomkitError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_degenerate_params() {
        let mut config = Config::default();
        config.som.neighborhood = FunctionSpec::new("gaussian", vec![0.0, 2.0, 0.0]);
        assert!(matches!(config.validate(), Err(SomkitError::Config(_))));

        let mut config = Config::default();
        config.som.learning_rate = FunctionSpec::new("inverse", vec![0.1, -5.0]);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.som.weight_init = FunctionSpec::new("uniform", vec![0.0, f64::INFINITY]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: Config = serde_json::from_str(r#"{"training": {"epochs": 5}}"#).unwrap();
        assert_eq!(config.training.epochs, 5);
        assert!(config.training.shuffle);
        assert_eq!(config.som.rows, 4);
    }
}

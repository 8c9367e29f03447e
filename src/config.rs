//! Experiment Configuration Module
//!
//! Defines the immutable per-run configuration bundle: experiment identity,
//! training hyperparameters, loss and scheduler selection, and device
//! settings. Built once before training starts and never mutated by the loop.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ResultExt};
use crate::loss::{ClassifierLoss, FocalLossConfig};
use crate::training::scheduler::ScheduleSpec;
use crate::training::{
    DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE, DEFAULT_WEIGHT_DECAY,
};

/// Primary-loss selection carried by the config; `init` builds the live loss.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LossSpec {
    /// Softmax cross-entropy over class indices
    CrossEntropy,
    /// Binary focal loss with the given gamma
    Focal { gamma: f64 },
}

impl LossSpec {
    pub fn init(&self) -> ClassifierLoss {
        match *self {
            Self::CrossEntropy => ClassifierLoss::CategoricalCrossEntropy,
            Self::Focal { gamma } => {
                ClassifierLoss::Focal(FocalLossConfig::new().with_gamma(gamma).init())
            }
        }
    }
}

impl Default for LossSpec {
    fn default() -> Self {
        Self::CrossEntropy
    }
}

/// Configuration for a single training experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Root directory under which all experiments live
    pub experiments_root: String,

    /// Name of this experiment; also names its directory and log file
    pub experiment_name: String,

    /// Number of training epochs
    pub epochs: usize,

    /// Batch size for both training and validation
    pub batch_size: usize,

    /// Initial learning rate
    pub learning_rate: f64,

    /// Weight decay (L2 regularization) for the Adam optimizer
    pub weight_decay: f64,

    /// Primary classification loss
    pub loss: LossSpec,

    /// Learning rate schedule
    pub scheduler: ScheduleSpec,

    /// Train the auxiliary capture-quality head
    pub use_quality: bool,

    /// Random seed for epoch shuffling
    pub seed: u64,

    /// Number of data loading workers
    pub num_workers: usize,

    /// Value for CUDA_VISIBLE_DEVICES (GPU index string, e.g. "0")
    pub cuda_device: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiments_root: "experiments".to_string(),
            experiment_name: "baseline".to_string(),
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            weight_decay: DEFAULT_WEIGHT_DECAY,
            loss: LossSpec::CrossEntropy,
            scheduler: ScheduleSpec::default(),
            use_quality: false,
            seed: 42,
            num_workers: 4,
            cuda_device: "0".to_string(),
        }
    }
}

impl ExperimentConfig {
    /// Create a config with a custom experiment identity
    pub fn new(experiments_root: &str, experiment_name: &str) -> Self {
        Self {
            experiments_root: experiments_root.to_string(),
            experiment_name: experiment_name.to_string(),
            ..Default::default()
        }
    }

    /// Create a fast configuration for smoke runs and debugging
    pub fn debug() -> Self {
        Self {
            experiments_root: "experiments".to_string(),
            experiment_name: "debug".to_string(),
            epochs: 2,
            batch_size: 8,
            learning_rate: 1e-3,
            weight_decay: 0.0,
            loss: LossSpec::CrossEntropy,
            scheduler: ScheduleSpec::cosine(1e-6, 2),
            use_quality: false,
            seed: 42,
            num_workers: 1,
            cuda_device: "0".to_string(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.experiment_name.is_empty() {
            return Err("experiment_name must not be empty".to_string());
        }

        if self.experiment_name.contains(std::path::is_separator) {
            return Err("experiment_name must not contain path separators".to_string());
        }

        if self.epochs == 0 {
            return Err("epochs must be greater than 0".to_string());
        }

        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be a positive finite number".to_string());
        }

        if self.weight_decay < 0.0 {
            return Err("weight_decay must not be negative".to_string());
        }

        if let LossSpec::Focal { gamma } = self.loss {
            if gamma.is_nan() || gamma < 0.0 {
                return Err("focal gamma must be a non-negative number".to_string());
            }
        }

        match self.scheduler {
            ScheduleSpec::CosineAnnealing { min_lr, t_max } => {
                if t_max == 0 {
                    return Err("cosine t_max must be greater than 0".to_string());
                }
                if min_lr < 0.0 {
                    return Err("cosine min_lr must not be negative".to_string());
                }
            }
            ScheduleSpec::ReduceOnPlateau {
                factor, patience, ..
            } => {
                if !(factor > 0.0 && factor < 1.0) {
                    return Err("plateau factor must lie in (0, 1)".to_string());
                }
                if patience == 0 {
                    return Err("plateau patience must be greater than 0".to_string());
                }
            }
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .with_context(|| format!("serializing config for '{}'", self.experiment_name))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).with_context(|| format!("parsing config at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::LossKind;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExperimentConfig::default().validate().is_ok());
        assert!(ExperimentConfig::debug().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ExperimentConfig::default();
        config.epochs = 0;
        assert!(config.validate().is_err());

        config = ExperimentConfig::default();
        config.experiment_name = String::new();
        assert!(config.validate().is_err());

        config = ExperimentConfig::default();
        config.loss = LossSpec::Focal { gamma: -1.0 };
        assert!(config.validate().is_err());

        config = ExperimentConfig::default();
        config.scheduler = ScheduleSpec::ReduceOnPlateau {
            factor: 1.5,
            patience: 3,
            min_lr: 1e-6,
            mode: crate::training::scheduler::PlateauMode::Max,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_loss_spec_init_kinds() {
        assert_eq!(
            LossSpec::CrossEntropy.init().kind(),
            LossKind::CategoricalCrossEntropy
        );
        assert_eq!(
            LossSpec::Focal { gamma: 1.5 }.init().kind(),
            LossKind::Focal
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ExperimentConfig::new("runs", "unit");
        config.use_quality = true;
        config.loss = LossSpec::Focal { gamma: 2.0 };
        config.save(&path).unwrap();

        let loaded = ExperimentConfig::load(&path).unwrap();
        assert_eq!(loaded.experiment_name, "unit");
        assert!(loaded.use_quality);
        assert_eq!(loaded.loss, LossSpec::Focal { gamma: 2.0 });
    }
}

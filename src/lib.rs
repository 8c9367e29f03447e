//! # retscreen
//!
//! A Rust library for training retinal fundus screening models with the Burn
//! framework. The core task is referable-disease detection (a two-class
//! decision), optionally trained jointly with an auxiliary capture-quality
//! head so the model learns to recognize ungradable images.
//!
//! ## Features
//!
//! - **Custom Burn training loop** with Adam, cosine or plateau LR schedules
//! - **Focal loss** for the class imbalance typical of screening datasets
//! - **Experiment layout** with per-epoch checkpoints, a best-model
//!   checkpoint, and a plain-text run log per experiment
//! - **Pluggable validation metric** over per-image referability scores
//!
//! ## Modules
//!
//! - `data`: Items, batching with ImageNet normalization, epoch iteration
//! - `model`: Dual-head CNN architecture built with Burn
//! - `training`: Epoch passes, LR schedules, and the full training run
//! - `loss`: Focal loss and primary-loss selection
//! - `experiment`: On-disk experiment layout and run logs
//! - `utils`: Logging and metric helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retscreen::backend::{default_device, TrainingBackend};
//! use retscreen::config::ExperimentConfig;
//! use retscreen::model::{FundusClassifier, FundusClassifierConfig};
//!
//! let device = default_device();
//! let config = ExperimentConfig::new("experiments", "baseline");
//! let model = FundusClassifier::<TrainingBackend>::new(
//!     &FundusClassifierConfig::new(),
//!     &device,
//! );
//! // ... build loaders and call training::train
//! ```

pub mod backend;
pub mod config;
pub mod data;
pub mod env;
pub mod error;
pub mod experiment;
pub mod loss;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{ExperimentConfig, LossSpec};
pub use data::{
    FundusBatch, FundusBatcher, FundusItem, FundusLoader, SyntheticFundusDataset, CLASS_NAMES,
    NUM_CLASSES,
};
pub use error::{Result, ScreenError};
pub use experiment::ExperimentLayout;
pub use loss::{ClassifierLoss, FocalLoss, FocalLossConfig, LossKind, QUALITY_LOSS_WEIGHT};
pub use model::{FundusClassifier, FundusClassifierConfig};
pub use training::scheduler::{LrSchedule, PlateauMode, ScheduleSpec};
pub use training::trainer::{train, TrainingSummary};
pub use utils::metrics::score_accuracy;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Training module for the screening classifier
//!
//! This module provides:
//! - Per-epoch training and validation passes with a custom Burn loop
//! - Learning rate schedules (cosine annealing and reduce-on-plateau)
//! - A full training run with checkpointing and per-epoch run logs
//!
//! ## Training approach
//!
//! Training is a plain supervised loop: shuffled mini-batches, Adam with
//! optional weight decay, and a caller-supplied validation metric deciding
//! which checkpoint counts as best. The optional capture-quality head is
//! trained jointly through a weighted focal loss when enabled.

pub mod epoch;
pub mod scheduler;
pub mod trainer;

// Re-export main types for convenience
pub use epoch::{train_epoch, valid_epoch, validate};
pub use scheduler::{LrSchedule, PlateauMode, ScheduleSpec};
pub use trainer::{train, TrainingSummary};

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 50;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default learning rate for Adam
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;

/// Default weight decay
pub const DEFAULT_WEIGHT_DECAY: f64 = 1e-4;

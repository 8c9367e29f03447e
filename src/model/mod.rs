//! Model module for the fundus screening CNN
//!
//! This module provides:
//! - The dual-head CNN architecture (referability logits + capture quality)
//! - Model configuration and hyperparameters
//!
//! ## Architecture
//!
//! The classifier is a compact convolutional network: three conv blocks with
//! max pooling, global average pooling, and a shared fully-connected layer
//! feeding two output heads. The quality head is always present in the
//! module tree so checkpoints have one layout regardless of whether the
//! quality loss is enabled for a given run.

pub mod cnn;

// Re-export main types for convenience
pub use cnn::{FundusClassifier, FundusClassifierConfig};

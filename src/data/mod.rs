//! Dataset module for fundus screening data
//!
//! Items arrive as pre-shaped float vectors; decoding and preprocessing real
//! photographs happens upstream of this crate. The module provides:
//! - [`FundusItem`] / [`FundusBatch`] / [`FundusBatcher`]: Burn batching with
//!   one-hot labels and the optional capture-quality channel
//! - [`FundusLoader`]: seeded shuffled (train) or sequential (valid) batch
//!   iteration over any `Dataset<FundusItem>`
//! - [`SyntheticFundusDataset`]: deterministic stand-in data for smoke runs
//!   and tests

pub mod batch;
pub mod loader;
pub mod synthetic;

pub use batch::{FundusBatch, FundusBatcher, FundusItem};
pub use loader::FundusLoader;
pub use synthetic::SyntheticFundusDataset;

/// Number of screening classes: non-referable vs referable
pub const NUM_CLASSES: usize = 2;

/// Class names, indexed by label
pub const CLASS_NAMES: [&str; NUM_CLASSES] = ["non_referable", "referable"];

/// Get the class name for a given label index
pub fn class_name(label: usize) -> Option<&'static str> {
    CLASS_NAMES.get(label).copied()
}

/// Whether a label denotes a referable finding
pub fn is_referable(label: usize) -> bool {
    label == 1
}

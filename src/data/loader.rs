//! Index-based batch iteration over a dataset
//!
//! Batches are materialized lazily from shuffled (or sequential) index
//! chunks, so a full epoch never holds more than one batch of tensors at a
//! time. The shuffle RNG is seeded, which makes epoch order reproducible
//! for a given seed.

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{FundusBatch, FundusBatcher, FundusItem};

/// Lazily-batching loader over a [`Dataset`] of [`FundusItem`]s
pub struct FundusLoader<D: Dataset<FundusItem>> {
    dataset: D,
    batcher: FundusBatcher,
    batch_size: usize,
    rng: Option<ChaCha8Rng>,
}

impl<D: Dataset<FundusItem>> FundusLoader<D> {
    /// Loader that reshuffles item order every epoch
    pub fn shuffled(dataset: D, batcher: FundusBatcher, batch_size: usize, seed: u64) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self {
            dataset,
            batcher,
            batch_size,
            rng: Some(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Loader that visits items in dataset order
    pub fn sequential(dataset: D, batcher: FundusBatcher, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        Self {
            dataset,
            batcher,
            batch_size,
            rng: None,
        }
    }

    pub fn num_items(&self) -> usize {
        self.dataset.len()
    }

    pub fn num_batches(&self) -> usize {
        let len = self.dataset.len();
        (len + self.batch_size - 1) / self.batch_size
    }

    /// Start a new pass over the dataset, producing batches on `device`
    pub fn epoch<'a, B: Backend>(&'a mut self, device: &B::Device) -> Batches<'a, B, D> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(rng) = self.rng.as_mut() {
            indices.shuffle(rng);
        }
        Batches {
            loader: &*self,
            device: device.clone(),
            indices,
            cursor: 0,
        }
    }
}

/// Iterator over the batches of one epoch
pub struct Batches<'a, B: Backend, D: Dataset<FundusItem>> {
    loader: &'a FundusLoader<D>,
    device: B::Device,
    indices: Vec<usize>,
    cursor: usize,
}

impl<'a, B: Backend, D: Dataset<FundusItem>> Iterator for Batches<'a, B, D> {
    type Item = FundusBatch<B>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.indices.len() {
            let start = self.cursor;
            let end = (start + self.loader.batch_size).min(self.indices.len());
            self.cursor = end;

            let items: Vec<FundusItem> = self.indices[start..end]
                .iter()
                .filter_map(|&i| self.loader.dataset.get(i))
                .collect();
            if items.is_empty() {
                continue;
            }
            return Some(self.loader.batcher.batch(items, &self.device));
        }
        None
    }
}

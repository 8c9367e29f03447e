//! Deterministic synthetic fundus data
//!
//! Generates class-separable noise images: non-referable samples cluster
//! around a dark base intensity and referable samples around a bright one.
//! Every item is derived from the dataset seed and its own index, so `get`
//! returns identical data no matter the access order.

use burn::data::dataset::Dataset;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{FundusItem, NUM_CLASSES};

const CLASS_BASE_INTENSITY: [f32; NUM_CLASSES] = [0.3, 0.7];
const INTENSITY_JITTER: f32 = 0.15;
const GRADABLE_RATE: f64 = 0.8;

/// In-memory synthetic dataset for demos and tests
#[derive(Clone, Debug)]
pub struct SyntheticFundusDataset {
    num_samples: usize,
    image_size: usize,
    seed: u64,
}

impl SyntheticFundusDataset {
    pub fn new(num_samples: usize, image_size: usize, seed: u64) -> Self {
        Self {
            num_samples,
            image_size,
            seed,
        }
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }
}

impl Dataset<FundusItem> for SyntheticFundusDataset {
    fn get(&self, index: usize) -> Option<FundusItem> {
        if index >= self.num_samples {
            return None;
        }

        let label = index % NUM_CLASSES;
        let base = CLASS_BASE_INTENSITY[label];

        // Per-item stream so items are stable under random access
        let mut rng =
            ChaCha8Rng::seed_from_u64(self.seed ^ (index as u64).wrapping_mul(0x9E3779B97F4A7C15));

        let pixels = 3 * self.image_size * self.image_size;
        let image: Vec<f32> = (0..pixels)
            .map(|_| (base + rng.gen_range(-INTENSITY_JITTER..INTENSITY_JITTER)).clamp(0.0, 1.0))
            .collect();

        let quality = if rng.gen_bool(GRADABLE_RATE) { 1.0 } else { 0.0 };

        Some(FundusItem::new(image, label, quality))
    }

    fn len(&self) -> usize {
        self.num_samples
    }
}

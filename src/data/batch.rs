//! Burn batching for fundus screening items
//!
//! Labels are batched one-hot so both the cross-entropy and focal primary
//! losses can consume them; the capture-quality channel is only materialized
//! when the batcher is configured for it, which keeps validation batches to
//! the plain (images, targets) pair.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;

use super::NUM_CLASSES;

/// A single screening sample ready for batching
#[derive(Clone, Debug)]
pub struct FundusItem {
    /// Image data as flattened CHW float array [3 * H * W], values in [0, 1]
    pub image: Vec<f32>,
    /// Class label (0 = non-referable, 1 = referable)
    pub label: usize,
    /// Capture-quality target (1.0 = gradable, 0.0 = ungradable)
    pub quality: f32,
}

impl FundusItem {
    pub fn new(image: Vec<f32>, label: usize, quality: f32) -> Self {
        Self {
            image,
            label,
            quality,
        }
    }
}

/// A batch of screening samples
#[derive(Clone, Debug)]
pub struct FundusBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// One-hot labels with shape [batch_size, num_classes]
    pub targets: Tensor<B, 2>,
    /// Capture-quality targets with shape [batch_size, 1]; present only when
    /// the batcher includes the quality channel
    pub quality: Option<Tensor<B, 2>>,
}

/// Batcher producing [`FundusBatch`]es on the device handed to `batch`
#[derive(Clone, Debug)]
pub struct FundusBatcher {
    image_size: usize,
    num_classes: usize,
    include_quality: bool,
}

impl FundusBatcher {
    pub fn new(image_size: usize) -> Self {
        Self {
            image_size,
            num_classes: NUM_CLASSES,
            include_quality: false,
        }
    }

    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// Materialize the quality channel in produced batches
    pub fn with_quality(mut self, include_quality: bool) -> Self {
        self.include_quality = include_quality;
        self
    }

    pub fn image_size(&self) -> usize {
        self.image_size
    }
}

impl<B: Backend> Batcher<B, FundusItem, FundusBatch<B>> for FundusBatcher {
    fn batch(&self, items: Vec<FundusItem>, device: &B::Device) -> FundusBatch<B> {
        let batch_size = items.len();
        let channels = 3;
        let height = self.image_size;
        let width = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );

        // ImageNet normalization: (x - mean) / std, broadcast over channels
        let mean = Tensor::<B, 4>::from_floats(
            TensorData::new(vec![0.485f32, 0.456, 0.406], [1, 3, 1, 1]),
            device,
        );
        let std = Tensor::<B, 4>::from_floats(
            TensorData::new(vec![0.229f32, 0.224, 0.225], [1, 3, 1, 1]),
            device,
        );
        let images = (images - mean) / std;

        // One-hot targets; labels must already be < num_classes.
        let mut targets_data = vec![0.0f32; batch_size * self.num_classes];
        for (i, item) in items.iter().enumerate() {
            targets_data[i * self.num_classes + item.label] = 1.0;
        }
        let targets = Tensor::<B, 2>::from_floats(
            TensorData::new(targets_data, [batch_size, self.num_classes]),
            device,
        );

        let quality = if self.include_quality {
            let quality_data: Vec<f32> = items.iter().map(|item| item.quality).collect();
            Some(Tensor::<B, 2>::from_floats(
                TensorData::new(quality_data, [batch_size, 1]),
                device,
            ))
        } else {
            None
        };

        FundusBatch {
            images,
            targets,
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    type TB = DefaultBackend;

    fn items(image_size: usize) -> Vec<FundusItem> {
        let pixels = 3 * image_size * image_size;
        vec![
            FundusItem::new(vec![0.5; pixels], 0, 1.0),
            FundusItem::new(vec![0.5; pixels], 1, 0.0),
        ]
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = FundusBatcher::new(8);
        let batch: FundusBatch<TB> = batcher.batch(items(8), &device);

        assert_eq!(batch.images.dims(), [2, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [2, 2]);
        assert!(batch.quality.is_none());
    }

    #[test]
    fn test_one_hot_placement() {
        let device = Default::default();
        let batcher = FundusBatcher::new(4);
        let batch: FundusBatch<TB> = batcher.batch(items(4), &device);

        let targets = batch.targets.to_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_quality_channel_when_enabled() {
        let device = Default::default();
        let batcher = FundusBatcher::new(4).with_quality(true);
        let batch: FundusBatch<TB> = batcher.batch(items(4), &device);

        let quality = batch.quality.expect("quality tensor should be present");
        assert_eq!(quality.dims(), [2, 1]);
        assert_eq!(quality.to_data().to_vec::<f32>().unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_imagenet_normalization() {
        let device = Default::default();
        let batcher = FundusBatcher::new(2);
        let batch: FundusBatch<TB> = batcher.batch(items(2), &device);

        // First channel of a 0.5-valued pixel: (0.5 - 0.485) / 0.229
        let first = batch
            .images
            .slice([0..1, 0..1, 0..1, 0..1])
            .into_scalar();
        assert!((first - (0.5 - 0.485) / 0.229).abs() < 1e-5);
    }
}

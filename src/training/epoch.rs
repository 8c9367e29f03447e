//! Single-epoch training and validation passes
//!
//! The training pass runs the custom loop directly against Burn's optimizer
//! API rather than the high-level LearnerBuilder: forward, loss, backward,
//! step, with a running average of the batch losses for progress logging.
//!
//! The validation pass collapses model outputs to one referability score per
//! image and hands the collected scores and labels to a caller-supplied
//! metric function.

use burn::{
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    optim::{GradientsParams, Optimizer},
    tensor::{
        activation::softmax,
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use tracing::{debug, info};

use crate::data::{FundusItem, FundusLoader};
use crate::error::{Result, ScreenError};
use crate::loss::{ClassifierLoss, FocalLoss, LossKind, QUALITY_LOSS_WEIGHT};
use crate::model::FundusClassifier;
use crate::utils::metrics::RunningAverage;

/// Apply a metric function to collected scores and labels
///
/// Exists so the trainer depends on one fixed contract: scores and labels are
/// parallel slices, one entry per validation image, and the metric owns all
/// interpretation of them (including what an empty epoch means).
pub fn validate<F>(scores: &[f32], labels: &[f32], metric: F) -> f64
where
    F: Fn(&[f32], &[f32]) -> f64,
{
    metric(scores, labels)
}

/// Run one training epoch and return the updated model with its average loss
///
/// The primary loss is computed by `criterion` on the class logits. When
/// `use_quality` is set, the quality head is also driven: a focal loss on the
/// quality logits is scaled by [`QUALITY_LOSS_WEIGHT`] and added to the
/// primary loss before the backward pass.
#[allow(clippy::too_many_arguments)]
pub fn train_epoch<B, D, O>(
    model: FundusClassifier<B>,
    loader: &mut FundusLoader<D>,
    optimizer: &mut O,
    criterion: &ClassifierLoss,
    quality_criterion: &FocalLoss,
    lr: f64,
    device: &B::Device,
    use_quality: bool,
) -> Result<(FundusClassifier<B>, f64)>
where
    B: AutodiffBackend,
    D: Dataset<FundusItem>,
    O: Optimizer<FundusClassifier<B>, B>,
{
    let mut model = model.to_device(device);
    let num_batches = loader.num_batches();
    let mut running_loss = RunningAverage::new();

    for (batch_idx, batch) in loader.epoch::<B>(device).enumerate() {
        let loss = if use_quality {
            let (class_logits, quality_logits) = model.forward_with_quality(batch.images);
            let class_loss = criterion.forward(class_logits, batch.targets);

            let quality_targets = batch.quality.ok_or_else(|| {
                ScreenError::InvalidInput(
                    "quality loss enabled but batches carry no quality targets".to_string(),
                )
            })?;
            let quality_loss = quality_criterion.forward(quality_logits, quality_targets);

            class_loss + quality_loss.mul_scalar(QUALITY_LOSS_WEIGHT)
        } else {
            let class_logits = model.forward(batch.images);
            criterion.forward(class_logits, batch.targets)
        };

        let loss_value: f64 = loss.clone().into_scalar().elem();
        running_loss.add(loss_value);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optimizer.step(lr, model, grads);

        if (batch_idx + 1) % 10 == 0 || batch_idx + 1 == num_batches {
            debug!(
                "  Batch {}/{}: loss = {:.4}, running avg = {:.4}",
                batch_idx + 1,
                num_batches,
                loss_value,
                running_loss.average()
            );
        }
    }

    info!(
        "Training pass: avg loss = {:.4} over {} batches",
        running_loss.average(),
        running_loss.count()
    );

    Ok((model, running_loss.average()))
}

/// Run one validation epoch and return the metric over the whole set
///
/// The model is switched to its inference form on the inner backend, so no
/// gradients are tracked and normalization layers use their running
/// statistics. Per image the score is the complement of the first output
/// column: with `LossKind::CategoricalCrossEntropy` that column is the
/// softmax probability of the non-referable class, otherwise the raw model
/// output is used as-is. Labels are the complement of the first one-hot
/// column, so referable images map to 1.0.
pub fn valid_epoch<B, D, F>(
    model: &FundusClassifier<B>,
    loader: &mut FundusLoader<D>,
    kind: LossKind,
    device: &<B::InnerBackend as Backend>::Device,
    metric: F,
) -> Result<f64>
where
    B: AutodiffBackend,
    D: Dataset<FundusItem>,
    F: Fn(&[f32], &[f32]) -> f64,
{
    let inner_model = model.clone().valid();

    let mut scores: Vec<f32> = Vec::with_capacity(loader.num_items());
    let mut labels: Vec<f32> = Vec::with_capacity(loader.num_items());

    for batch in loader.epoch::<B::InnerBackend>(device) {
        let [batch_size, _] = batch.targets.dims();
        let logits = inner_model.forward(batch.images);

        let outputs = match kind {
            LossKind::CategoricalCrossEntropy => softmax(logits, 1),
            LossKind::Focal => logits,
        };

        // Column 0 rates the non-referable class; its complement is the
        // referability score.
        let non_referable = outputs
            .slice([0..batch_size, 0..1])
            .to_data()
            .to_vec::<f32>()
            .map_err(|e| ScreenError::Tensor(format!("{e:?}")))?;
        scores.extend(non_referable.iter().map(|v| 1.0 - v));

        let target_first = batch
            .targets
            .slice([0..batch_size, 0..1])
            .to_data()
            .to_vec::<f32>()
            .map_err(|e| ScreenError::Tensor(format!("{e:?}")))?;
        labels.extend(target_first.iter().map(|v| 1.0 - v));
    }

    Ok(validate(&scores, &labels, metric))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;
    use crate::data::{FundusBatcher, SyntheticFundusDataset};
    use crate::loss::FocalLossConfig;
    use crate::model::FundusClassifierConfig;
    use burn::optim::AdamConfig;

    type TB = TrainingBackend;

    const IMAGE_SIZE: usize = 8;

    fn small_model(device: &<TB as Backend>::Device) -> FundusClassifier<TB> {
        let config = FundusClassifierConfig::new().with_base_filters(4);
        FundusClassifier::new(&config, device)
    }

    fn sequential_loader(
        num_samples: usize,
        batch_size: usize,
        with_quality: bool,
    ) -> FundusLoader<SyntheticFundusDataset> {
        let dataset = SyntheticFundusDataset::new(num_samples, IMAGE_SIZE, 5);
        let batcher = FundusBatcher::new(IMAGE_SIZE).with_quality(with_quality);
        FundusLoader::sequential(dataset, batcher, batch_size)
    }

    #[test]
    fn test_validate_is_passthrough() {
        let scores = [0.2, 0.8];
        let labels = [0.0, 1.0];

        let value = validate(&scores, &labels, |s, l| {
            s.len() as f64 + l.iter().sum::<f32>() as f64
        });
        assert!((value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_valid_epoch_labels_mark_referable_images() {
        let device = Default::default();
        let model = small_model(&device);
        let mut loader = sequential_loader(6, 2, false);

        // Synthetic items alternate classes, so the referable labels must
        // come out as 0, 1, 0, 1, 0, 1 regardless of batching.
        let metric = |scores: &[f32], labels: &[f32]| {
            assert_eq!(scores.len(), 6);
            assert_eq!(labels, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
            labels.iter().sum::<f32>() as f64
        };

        let value = valid_epoch(
            &model,
            &mut loader,
            LossKind::CategoricalCrossEntropy,
            &device,
            metric,
        )
        .unwrap();
        assert!((value - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_valid_epoch_softmax_scores_stay_in_unit_interval() {
        let device = Default::default();
        let model = small_model(&device);
        let mut loader = sequential_loader(8, 4, false);

        let metric = |scores: &[f32], _: &[f32]| {
            assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
            scores.len() as f64
        };

        let value = valid_epoch(
            &model,
            &mut loader,
            LossKind::CategoricalCrossEntropy,
            &device,
            metric,
        )
        .unwrap();
        assert!((value - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_valid_epoch_focal_uses_raw_outputs() {
        let device = Default::default();
        let model = small_model(&device);
        let mut loader = sequential_loader(4, 2, false);

        let value = valid_epoch(&model, &mut loader, LossKind::Focal, &device, |s, _| {
            s.len() as f64
        })
        .unwrap();
        assert!((value - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_train_epoch_runs_and_reports_loss() {
        let device = Default::default();
        let model = small_model(&device);
        let mut loader = sequential_loader(8, 4, false);
        let mut optimizer = AdamConfig::new().init();
        let criterion = ClassifierLoss::CategoricalCrossEntropy;
        let quality_criterion = FocalLossConfig::new().init();

        let (model, avg_loss) = train_epoch(
            model,
            &mut loader,
            &mut optimizer,
            &criterion,
            &quality_criterion,
            1e-3,
            &device,
            false,
        )
        .unwrap();

        assert!(avg_loss.is_finite());
        assert!(avg_loss > 0.0);
        assert_eq!(model.num_classes(), 2);
    }

    #[test]
    fn test_train_epoch_with_quality_loss() {
        let device = Default::default();
        let model = small_model(&device);
        let mut loader = sequential_loader(8, 4, true);
        let mut optimizer = AdamConfig::new().init();
        let criterion = ClassifierLoss::CategoricalCrossEntropy;
        let quality_criterion = FocalLossConfig::new().init();

        let result = train_epoch(
            model,
            &mut loader,
            &mut optimizer,
            &criterion,
            &quality_criterion,
            1e-3,
            &device,
            true,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_train_epoch_rejects_missing_quality_targets() {
        let device = Default::default();
        let model = small_model(&device);
        // Batcher without the quality channel, but quality loss requested.
        let mut loader = sequential_loader(4, 2, false);
        let mut optimizer = AdamConfig::new().init();
        let criterion = ClassifierLoss::CategoricalCrossEntropy;
        let quality_criterion = FocalLossConfig::new().init();

        let result = train_epoch(
            model,
            &mut loader,
            &mut optimizer,
            &criterion,
            &quality_criterion,
            1e-3,
            &device,
            true,
        );
        assert!(matches!(result, Err(ScreenError::InvalidInput(_))));
    }
}

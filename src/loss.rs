//! Loss functions for screening models
//!
//! The primary classification loss is either Burn's categorical cross-entropy
//! or a binary focal loss; the auxiliary capture-quality head is always
//! trained with the focal loss. Which primary loss is active is carried as an
//! explicit [`LossKind`] so downstream code never inspects concrete types.

use burn::config::Config;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::tensor::activation::log_sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Weight of the auxiliary quality-loss term added to the primary loss.
pub const QUALITY_LOSS_WEIGHT: f64 = 0.2;

/// Configuration for [`FocalLoss`]
#[derive(Config, Debug)]
pub struct FocalLossConfig {
    /// Down-weighting strength for well-classified examples. Must be >= 0;
    /// 0 reduces the loss to plain binary cross-entropy with logits.
    #[config(default = "2.0")]
    pub gamma: f64,
}

impl FocalLossConfig {
    /// Initialize the loss function
    pub fn init(&self) -> FocalLoss {
        FocalLoss { gamma: self.gamma }
    }
}

/// Binary focal loss on raw (pre-sigmoid) logits.
///
/// Computes binary cross-entropy with logits in the log-sum-exp form, so
/// large-magnitude logits do not overflow, then scales each element by
/// `exp(gamma * logsigmoid(-logit * (2*target - 1)))`. With `gamma > 0` this
/// shrinks the contribution of examples the model already classifies well.
#[derive(Debug, Clone)]
pub struct FocalLoss {
    pub gamma: f64,
}

impl FocalLoss {
    /// Scalar loss over a logit/target pair of equal shape.
    ///
    /// For 2-D inputs the per-element loss is summed over the second
    /// dimension before the batch mean, so each row contributes its full
    /// multi-label loss.
    pub fn forward<B: Backend, const D: usize>(
        &self,
        logits: Tensor<B, D>,
        targets: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        // Stable BCE-with-logits: max(-x, 0) is the log-sum-exp pivot.
        let max_val = logits.clone().neg().clamp_min(0.0);
        let bce = logits.clone() - logits.clone() * targets.clone() + max_val.clone()
            + (max_val.clone().neg().exp() + (logits.clone().neg() - max_val).exp()).log();

        // Modulating factor: logsigmoid(-x * sign) is log(1 - p_correct).
        let signs = targets.mul_scalar(2.0).sub_scalar(1.0);
        let inv_probs = log_sigmoid(logits.neg() * signs);
        let loss = inv_probs.mul_scalar(self.gamma).exp() * bce;

        let loss = if D == 2 { loss.sum_dim(1) } else { loss };
        loss.mean()
    }
}

/// Identity of the primary classification loss, decided at configuration
/// time. Validation post-processing branches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    /// Softmax cross-entropy over class indices
    CategoricalCrossEntropy,
    /// Binary focal loss over one-hot targets
    Focal,
}

/// Primary classification loss with its target-format handling.
///
/// Labels always arrive one-hot. Categorical cross-entropy wants class
/// indices, so that variant converts before delegating to Burn's
/// `CrossEntropyLoss`; the focal variant consumes the one-hot floats as-is.
#[derive(Debug, Clone)]
pub enum ClassifierLoss {
    CategoricalCrossEntropy,
    Focal(FocalLoss),
}

impl ClassifierLoss {
    /// The capability tag used by validation post-processing
    pub fn kind(&self) -> LossKind {
        match self {
            Self::CategoricalCrossEntropy => LossKind::CategoricalCrossEntropy,
            Self::Focal(_) => LossKind::Focal,
        }
    }

    /// Scalar loss for a batch of class logits against one-hot targets
    pub fn forward<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        targets_one_hot: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        match self {
            Self::CategoricalCrossEntropy => {
                let [batch_size, _] = targets_one_hot.dims();
                let class_indices = targets_one_hot.argmax(1).reshape([batch_size]);
                CrossEntropyLossConfig::new()
                    .init(&logits.device())
                    .forward(logits, class_indices)
            }
            Self::Focal(focal) => focal.forward(logits, targets_one_hot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use burn::tensor::{ElementConversion, Int, TensorData};

    type TB = DefaultBackend;

    fn scalar(t: Tensor<TB, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    #[test]
    fn test_gamma_zero_reduces_to_bce() {
        let device = Default::default();
        let logits = Tensor::<TB, 1>::from_floats([0.0, 2.0, -2.0], &device);
        let targets = Tensor::<TB, 1>::from_floats([1.0, 1.0, 0.0], &device);

        let loss = FocalLossConfig::new().with_gamma(0.0).init();
        let value = scalar(loss.forward(logits, targets));

        // Closed-form stable BCE mean: (ln 2 + 2*softplus(-2)) / 3
        assert!((value - 0.315668).abs() < 1e-4);
    }

    #[test]
    fn test_sign_flip_symmetry() {
        let device = Default::default();
        let logits = Tensor::<TB, 1>::from_floats([1.5, -0.3, 0.2], &device);
        let targets = Tensor::<TB, 1>::from_floats([1.0, 0.0, 1.0], &device);
        let flipped_logits = Tensor::<TB, 1>::from_floats([-1.5, 0.3, -0.2], &device);
        let flipped_targets = Tensor::<TB, 1>::from_floats([0.0, 1.0, 0.0], &device);

        let loss = FocalLossConfig::new().init();
        let a = scalar(loss.forward(logits, targets));
        let b = scalar(loss.forward(flipped_logits, flipped_targets));

        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_non_negative_for_valid_gamma() {
        let device = Default::default();
        for gamma in [0.0, 1.0, 2.0, 5.0] {
            let logits = Tensor::<TB, 1>::from_floats([0.5, -1.2, 3.0, -0.1], &device);
            let targets = Tensor::<TB, 1>::from_floats([1.0, 0.0, 1.0, 0.0], &device);

            let loss = FocalLossConfig::new().with_gamma(gamma).init();
            let value = scalar(loss.forward(logits, targets));

            assert!(value >= 0.0, "gamma={gamma} produced negative loss {value}");
        }
    }

    #[test]
    fn test_two_dim_sums_rows_before_mean() {
        let device = Default::default();
        // All-zero logits make every element cost exactly ln 2 under gamma=0,
        // so the row-sum convention doubles the flat mean.
        let logits =
            Tensor::<TB, 2>::from_floats(TensorData::new(vec![0.0f32; 4], [2, 2]), &device);
        let targets = Tensor::<TB, 2>::from_floats(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 1.0], [2, 2]),
            &device,
        );

        let loss = FocalLossConfig::new().with_gamma(0.0).init();
        let value = scalar(loss.forward(logits, targets));

        let ln2 = std::f64::consts::LN_2;
        assert!((value - 2.0 * ln2).abs() < 1e-5);
    }

    #[test]
    fn test_classifier_loss_kind() {
        assert_eq!(
            ClassifierLoss::CategoricalCrossEntropy.kind(),
            LossKind::CategoricalCrossEntropy
        );
        assert_eq!(
            ClassifierLoss::Focal(FocalLossConfig::new().init()).kind(),
            LossKind::Focal
        );
    }

    #[test]
    fn test_cross_entropy_converts_one_hot_targets() {
        let device = Default::default();
        let logits = Tensor::<TB, 2>::from_floats(
            TensorData::new(vec![2.0f32, -1.0, 0.5, 1.5], [2, 2]),
            &device,
        );
        let one_hot = Tensor::<TB, 2>::from_floats(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 1.0], [2, 2]),
            &device,
        );

        let from_one_hot = scalar(
            ClassifierLoss::CategoricalCrossEntropy.forward(logits.clone(), one_hot),
        );

        let indices = Tensor::<TB, 1, Int>::from_ints([0, 1], &device);
        let reference = scalar(
            CrossEntropyLossConfig::new()
                .init(&device)
                .forward(logits, indices),
        );

        assert!((from_one_hot - reference).abs() < 1e-6);
    }

    #[test]
    fn test_focal_variant_consumes_one_hot_directly() {
        let device = Default::default();
        let logits = Tensor::<TB, 2>::from_floats(
            TensorData::new(vec![0.7f32, -0.7, -0.2, 0.9], [2, 2]),
            &device,
        );
        let one_hot = Tensor::<TB, 2>::from_floats(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 1.0], [2, 2]),
            &device,
        );

        let focal = FocalLossConfig::new().init();
        let via_enum = scalar(
            ClassifierLoss::Focal(focal.clone()).forward(logits.clone(), one_hot.clone()),
        );
        let direct = scalar(focal.forward(logits, one_hot));

        assert!((via_enum - direct).abs() < 1e-6);
    }
}

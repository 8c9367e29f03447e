//! Metric helpers for screening evaluation
//!
//! Validation produces two parallel slices per epoch: a referability score
//! in [0, 1] per image and the corresponding binary label. The helpers here
//! turn those slices into scalar metrics; the training loop itself stays
//! agnostic and accepts any `Fn(&[f32], &[f32]) -> f64`.

/// Fraction of samples whose thresholded score agrees with the label
///
/// A score at or above `threshold` counts as a referable call; labels are
/// expected to be 0.0 or 1.0. Empty input yields 0.0.
pub fn score_accuracy(scores: &[f32], labels: &[f32], threshold: f32) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }

    let correct = scores
        .iter()
        .zip(labels.iter())
        .filter(|(score, label)| (**score >= threshold) == (**label >= 0.5))
        .count();

    correct as f64 / scores.len() as f64
}

/// Running average for tracking metrics during training
#[derive(Debug, Clone, Default)]
pub struct RunningAverage {
    sum: f64,
    count: usize,
}

impl RunningAverage {
    /// Create a new running average
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    /// Get the current average
    pub fn average(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            0.0
        }
    }

    /// Get the count
    pub fn count(&self) -> usize {
        self.count
    }

    /// Reset the running average
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.count = 0;
    }
}

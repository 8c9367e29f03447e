//! Learning rate scheduling
//!
//! Two families of schedule exist: time-based schedules that advance on the
//! epoch clock alone, and metric-based schedules that react to the validation
//! metric. Both sit behind [`LrSchedule`] with a single `advance(metric)`
//! operation, so the training loop never branches on the schedule kind; a
//! time-based schedule simply ignores the metric it is handed.

use serde::{Deserialize, Serialize};

/// Uniform interface over the supported schedule kinds
#[derive(Debug, Clone)]
pub enum LrSchedule {
    /// Advances on epochs alone (cosine annealing)
    OnSchedule(CosineSchedule),
    /// Advances on the observed validation metric (reduce-on-plateau)
    OnMetric(PlateauSchedule),
}

impl LrSchedule {
    /// Learning rate in effect for the upcoming epoch
    pub fn lr(&self) -> f64 {
        match self {
            Self::OnSchedule(cosine) => cosine.lr(),
            Self::OnMetric(plateau) => plateau.lr(),
        }
    }

    /// Advance by one epoch. The metric argument is consumed by metric-based
    /// schedules and ignored by time-based ones.
    pub fn advance(&mut self, metric: f64) {
        match self {
            Self::OnSchedule(cosine) => cosine.advance(),
            Self::OnMetric(plateau) => plateau.advance(metric),
        }
    }

    /// Human-readable description for run logs
    pub fn description(&self) -> String {
        match self {
            Self::OnSchedule(c) => format!(
                "Cosine Annealing: base={:.6}, min={:.6}, t_max={}",
                c.base_lr, c.min_lr, c.t_max
            ),
            Self::OnMetric(p) => format!(
                "Reduce On Plateau: base={:.6}, factor={}, patience={}, mode={:?}",
                p.base_lr, p.factor, p.patience, p.mode
            ),
        }
    }
}

/// Cosine annealing over a fixed horizon
#[derive(Debug, Clone)]
pub struct CosineSchedule {
    base_lr: f64,
    min_lr: f64,
    t_max: usize,
    epoch: usize,
}

impl CosineSchedule {
    pub fn new(base_lr: f64, min_lr: f64, t_max: usize) -> Self {
        Self {
            base_lr,
            min_lr,
            t_max: t_max.max(1),
            epoch: 0,
        }
    }

    /// `min + (base - min) * (1 + cos(pi * t / t_max)) / 2`
    pub fn lr(&self) -> f64 {
        let progress = self.epoch as f64 / self.t_max as f64;
        let cosine_factor = (1.0 + (std::f64::consts::PI * progress).cos()) / 2.0;
        self.min_lr + (self.base_lr - self.min_lr) * cosine_factor
    }

    pub fn advance(&mut self) {
        self.epoch += 1;
    }
}

/// Mode for plateau detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlateauMode {
    /// Metric should decrease (e.g. loss)
    Min,
    /// Metric should increase (e.g. accuracy, AUC)
    Max,
}

/// Reduce-on-plateau schedule
///
/// Holds the learning rate until the metric has failed to strictly improve
/// for `patience` consecutive epochs, then multiplies it by `factor`, floored
/// at `min_lr`.
#[derive(Debug, Clone)]
pub struct PlateauSchedule {
    base_lr: f64,
    current_lr: f64,
    factor: f64,
    patience: usize,
    min_lr: f64,
    mode: PlateauMode,
    best_metric: f64,
    epochs_without_improvement: usize,
}

impl PlateauSchedule {
    pub fn new(base_lr: f64, factor: f64, patience: usize, min_lr: f64, mode: PlateauMode) -> Self {
        let best_metric = match mode {
            PlateauMode::Min => f64::INFINITY,
            PlateauMode::Max => f64::NEG_INFINITY,
        };

        Self {
            base_lr,
            current_lr: base_lr,
            factor,
            patience,
            min_lr,
            mode,
            best_metric,
            epochs_without_improvement: 0,
        }
    }

    pub fn lr(&self) -> f64 {
        self.current_lr
    }

    pub fn advance(&mut self, metric: f64) {
        let improved = match self.mode {
            PlateauMode::Min => metric < self.best_metric,
            PlateauMode::Max => metric > self.best_metric,
        };

        if improved {
            self.best_metric = metric;
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;

            if self.epochs_without_improvement >= self.patience {
                let new_lr = (self.current_lr * self.factor).max(self.min_lr);
                if new_lr < self.current_lr {
                    self.current_lr = new_lr;
                    self.epochs_without_improvement = 0;
                }
            }
        }
    }
}

/// Serializable schedule selection carried by the experiment config.
/// `init` turns it into a live [`LrSchedule`] for the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ScheduleSpec {
    CosineAnnealing {
        min_lr: f64,
        t_max: usize,
    },
    ReduceOnPlateau {
        factor: f64,
        patience: usize,
        min_lr: f64,
        mode: PlateauMode,
    },
}

impl ScheduleSpec {
    /// Cosine annealing over the full epoch budget
    pub fn cosine(min_lr: f64, t_max: usize) -> Self {
        Self::CosineAnnealing { min_lr, t_max }
    }

    /// Reduce-on-plateau for a score-style metric (higher is better)
    pub fn plateau_max(factor: f64, patience: usize, min_lr: f64) -> Self {
        Self::ReduceOnPlateau {
            factor,
            patience,
            min_lr,
            mode: PlateauMode::Max,
        }
    }

    pub fn init(&self, base_lr: f64) -> LrSchedule {
        match *self {
            Self::CosineAnnealing { min_lr, t_max } => {
                LrSchedule::OnSchedule(CosineSchedule::new(base_lr, min_lr, t_max))
            }
            Self::ReduceOnPlateau {
                factor,
                patience,
                min_lr,
                mode,
            } => LrSchedule::OnMetric(PlateauSchedule::new(base_lr, factor, patience, min_lr, mode)),
        }
    }
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self::CosineAnnealing {
            min_lr: 1e-6,
            t_max: 50,
        }
    }
}

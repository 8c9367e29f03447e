//! Full training run: epochs, LR scheduling, checkpointing, run logs
//!
//! Orchestrates the per-epoch passes from [`crate::training::epoch`] into a
//! complete experiment. Every epoch produces a numbered checkpoint under the
//! experiment's `models/` directory, the running best model is kept in
//! `best`, and one line per epoch is appended to the experiment's text log.

use burn::{
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    optim::{decay::WeightDecayConfig, AdamConfig},
    record::CompactRecorder,
    tensor::backend::{AutodiffBackend, Backend},
};
use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::data::{FundusItem, FundusLoader};
use crate::error::{Result, ScreenError};
use crate::experiment::ExperimentLayout;
use crate::loss::FocalLossConfig;
use crate::model::FundusClassifier;
use crate::training::epoch::{train_epoch, valid_epoch};
use crate::utils::logging::TrainingLogger;

/// Outcome of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Number of epochs that were run
    pub epochs_run: usize,
    /// Best validation metric seen across all epochs
    pub best_score: f64,
    /// Learning rate the schedule ended on
    pub final_lr: f64,
}

/// Train a model for the configured number of epochs
///
/// Per epoch: one training pass, one validation pass producing the metric,
/// then the schedule advances and the epoch checkpoint is written. The best
/// checkpoint is refreshed only on strict metric improvement and stores the
/// model in its inference form. The run log line carries the learning rate
/// the epoch was actually trained with, read before the schedule steps.
///
/// There is no early stopping: a run always covers `config.epochs` epochs,
/// and every epoch checkpoint is retained.
pub fn train<B, DT, DV, F>(
    model: FundusClassifier<B>,
    train_loader: &mut FundusLoader<DT>,
    valid_loader: &mut FundusLoader<DV>,
    config: &ExperimentConfig,
    metric: F,
    device: &B::Device,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    DT: Dataset<FundusItem>,
    DV: Dataset<FundusItem>,
    F: Fn(&[f32], &[f32]) -> f64,
{
    config.validate().map_err(ScreenError::Config)?;

    let layout = ExperimentLayout::new(&config.experiments_root, &config.experiment_name);
    layout.create_dirs()?;
    config.save(&layout.config_path())?;

    info!(
        "Experiment '{}' in {:?}: {} train / {} valid samples",
        config.experiment_name,
        layout.experiment_path(),
        train_loader.num_items(),
        valid_loader.num_items()
    );

    let weight_decay =
        (config.weight_decay > 0.0).then(|| WeightDecayConfig::new(config.weight_decay as f32));
    let mut optimizer = AdamConfig::new().with_weight_decay(weight_decay).init();

    let mut schedule = config.scheduler.init(config.learning_rate);
    info!("Schedule: {}", schedule.description());

    let criterion = config.loss.init();
    let quality_criterion = FocalLossConfig::new().init();
    let kind = criterion.kind();

    let recorder = CompactRecorder::new();
    // Validation runs on the inner backend; device selection rides on the
    // process environment, the same as training.
    let valid_device = <B::InnerBackend as Backend>::Device::default();

    let mut logger = TrainingLogger::new(config.epochs);
    let mut best_score = 0.0;
    let mut model = model;

    for epoch in 0..config.epochs {
        logger.start_epoch(epoch);

        let lr = schedule.lr();
        let (updated, train_loss) = train_epoch(
            model,
            train_loader,
            &mut optimizer,
            &criterion,
            &quality_criterion,
            lr,
            device,
            config.use_quality,
        )?;
        model = updated;

        let metric_value = valid_epoch(&model, valid_loader, kind, &valid_device, &metric)?;
        schedule.advance(metric_value);

        let checkpoint = layout.checkpoint_path(epoch);
        debug!("Saving checkpoint {:?}", checkpoint);
        model
            .clone()
            .save_file(&checkpoint, &recorder)
            .map_err(|e| ScreenError::Checkpoint(format!("{e:?}")))?;

        if metric_value > best_score {
            best_score = metric_value;
            model
                .clone()
                .valid()
                .save_file(&layout.best_checkpoint_path(), &recorder)
                .map_err(|e| ScreenError::Checkpoint(format!("{e:?}")))?;
            logger.log_new_best(metric_value);
        }

        layout.append_log_line(epoch, metric_value, lr)?;
        logger.end_epoch(train_loss, metric_value, lr);
    }

    logger.log_complete(best_score);

    Ok(TrainingSummary {
        epochs_run: config.epochs,
        best_score,
        final_lr: schedule.lr(),
    })
}

//! retscreen CLI
//!
//! Command-line entry point for training retinal fundus screening models
//! with the Burn framework. The train command runs the full experiment loop
//! against a synthetic dataset, producing the same on-disk layout a real
//! data pipeline would: per-epoch checkpoints, a best model, and a run log.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use retscreen::backend::{backend_name, default_device, TrainingBackend};
use retscreen::config::{ExperimentConfig, LossSpec};
use retscreen::data::{FundusBatcher, FundusLoader, SyntheticFundusDataset, CLASS_NAMES};
use retscreen::env::apply_process_env;
use retscreen::model::{FundusClassifier, FundusClassifierConfig};
use retscreen::training::scheduler::ScheduleSpec;
use retscreen::utils::logging::{init_logging, LogConfig};
use retscreen::utils::metrics::score_accuracy;

/// Retinal fundus screening model training
#[derive(Parser, Debug)]
#[command(name = "retscreen")]
#[command(version = "0.1.0")]
#[command(about = "Referable-disease screening training with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false")]
    quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a screening model on synthetic fundus data
    Train {
        /// Root directory for experiment outputs
        #[arg(short, long, default_value = "experiments")]
        root: String,

        /// Experiment name (directory and log file name)
        #[arg(short, long, default_value = "baseline")]
        name: String,

        /// Number of training epochs
        #[arg(short, long, default_value = "5")]
        epochs: usize,

        /// Batch size for training
        #[arg(short, long, default_value = "16")]
        batch_size: usize,

        /// Learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Weight decay for Adam
        #[arg(long, default_value = "0.0001")]
        weight_decay: f64,

        /// Primary loss (cross-entropy, focal)
        #[arg(long, default_value = "cross-entropy")]
        loss: String,

        /// Focusing parameter when the focal loss is selected
        #[arg(long, default_value = "2.0")]
        gamma: f64,

        /// Learning rate schedule (cosine, plateau)
        #[arg(long, default_value = "cosine")]
        scheduler: String,

        /// Train the auxiliary capture-quality head
        #[arg(long, default_value = "false")]
        use_quality: bool,

        /// Number of synthetic training samples
        #[arg(short, long, default_value = "64")]
        samples: usize,

        /// Image size (square)
        #[arg(long, default_value = "32")]
        image_size: usize,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Show backend and model configuration info
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else if cli.quiet {
        LogConfig::quiet()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            root,
            name,
            epochs,
            batch_size,
            learning_rate,
            weight_decay,
            loss,
            gamma,
            scheduler,
            use_quality,
            samples,
            image_size,
            seed,
        } => {
            let mut config = ExperimentConfig::new(&root, &name);
            config.epochs = epochs;
            config.batch_size = batch_size;
            config.learning_rate = learning_rate;
            config.weight_decay = weight_decay;
            config.use_quality = use_quality;
            config.seed = seed;

            config.loss = match loss.as_str() {
                "cross-entropy" | "ce" => LossSpec::CrossEntropy,
                "focal" => LossSpec::Focal { gamma },
                other => anyhow::bail!("unknown loss '{}' (use cross-entropy or focal)", other),
            };

            config.scheduler = match scheduler.as_str() {
                "cosine" => ScheduleSpec::cosine(1e-6, epochs),
                "plateau" => ScheduleSpec::plateau_max(0.5, 3, 1e-6),
                other => anyhow::bail!("unknown scheduler '{}' (use cosine or plateau)", other),
            };

            cmd_train(config, samples, image_size)?;
        }

        Commands::Info => {
            cmd_info();
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════════╗
 ║   retscreen - Retinal Fundus Screening           ║
 ║   Referable-Disease Training with Burn + Rust    ║
 ╚══════════════════════════════════════════════════╝
  "#
        .green()
    );
}

fn cmd_train(config: ExperimentConfig, samples: usize, image_size: usize) -> Result<()> {
    // Environment hints must land before the backend allocates a device.
    apply_process_env(&config);

    info!("Starting training run '{}'", config.experiment_name);

    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Experiment:    {}/{}", config.experiments_root, config.experiment_name);
    println!("  Epochs:        {}", config.epochs);
    println!("  Batch size:    {}", config.batch_size);
    println!("  Learning rate: {}", config.learning_rate);
    println!("  Loss:          {:?}", config.loss);
    println!("  Quality head:  {}", config.use_quality);
    println!("  Samples:       {} train (synthetic, {}x{})", samples, image_size, image_size);
    println!("  Backend:       {}", backend_name());
    println!();

    let device = default_device();

    let valid_samples = (samples / 4).max(4);
    let train_dataset = SyntheticFundusDataset::new(samples, image_size, config.seed);
    let valid_dataset = SyntheticFundusDataset::new(valid_samples, image_size, config.seed + 1);

    let train_batcher = FundusBatcher::new(image_size).with_quality(config.use_quality);
    let valid_batcher = FundusBatcher::new(image_size);

    let mut train_loader =
        FundusLoader::shuffled(train_dataset, train_batcher, config.batch_size, config.seed);
    let mut valid_loader = FundusLoader::sequential(valid_dataset, valid_batcher, config.batch_size);

    let model = FundusClassifier::<TrainingBackend>::new(&FundusClassifierConfig::new(), &device);

    println!("{}", "Starting Training...".green().bold());
    println!();

    let summary = retscreen::training::train(
        model,
        &mut train_loader,
        &mut valid_loader,
        &config,
        |scores, labels| score_accuracy(scores, labels, 0.5),
        &device,
    )?;

    println!();
    println!("{}", "Training Complete!".green().bold());
    println!("  Epochs run:    {}", summary.epochs_run);
    println!("  Best metric:   {:.4}", summary.best_score);
    println!("  Final LR:      {:.6}", summary.final_lr);
    println!(
        "  Artifacts:     {}/{}",
        config.experiments_root, config.experiment_name
    );

    Ok(())
}

fn cmd_info() {
    println!("{}", "retscreen".cyan().bold());
    println!("  Version:  {}", retscreen::VERSION);
    println!("  Backend:  {}", backend_name());
    println!("  Classes:  {}", CLASS_NAMES.join(", "));
    println!();
    println!("{}", "Experiment layout:".yellow());
    println!("  <root>/<name>/config.json     run configuration");
    println!("  <root>/<name>/models/<N>.mpk  per-epoch checkpoints");
    println!("  <root>/<name>/models/best.mpk best validation metric");
    println!("  <root>/<name>/<name>.txt      per-epoch metric / LR log");
}

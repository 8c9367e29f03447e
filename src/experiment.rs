//! Experiment directory layout
//!
//! Every run owns one directory under the experiments root:
//!
//! ```text
//! <experiments_root>/<experiment_name>/
//!     config.json            frozen copy of the run configuration
//!     <experiment_name>.txt  one appended line per epoch
//!     models/
//!         <epoch>.mpk        checkpoint written every epoch, never evicted
//!         best.mpk           weights of the best validation metric so far
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::{Result, ResultExt};

/// Resolved paths for one experiment
#[derive(Debug, Clone)]
pub struct ExperimentLayout {
    experiment_path: PathBuf,
    models_path: PathBuf,
    log_path: PathBuf,
}

impl ExperimentLayout {
    pub fn new(experiments_root: &str, experiment_name: &str) -> Self {
        let experiment_path = Path::new(experiments_root).join(experiment_name);
        let models_path = experiment_path.join("models");
        let log_path = experiment_path.join(format!("{experiment_name}.txt"));

        Self {
            experiment_path,
            models_path,
            log_path,
        }
    }

    /// Create the experiment and model directories if they do not exist yet
    pub fn create_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.models_path).context("creating experiment directories")?;
        Ok(())
    }

    pub fn experiment_path(&self) -> &Path {
        &self.experiment_path
    }

    pub fn models_path(&self) -> &Path {
        &self.models_path
    }

    /// Path of the per-epoch log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Where the frozen run configuration is written
    pub fn config_path(&self) -> PathBuf {
        self.experiment_path.join("config.json")
    }

    /// Checkpoint path for one epoch, without extension; the recorder
    /// appends its own (`.mpk`).
    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.models_path.join(epoch.to_string())
    }

    /// Path of the best-metric checkpoint, without extension
    pub fn best_checkpoint_path(&self) -> PathBuf {
        self.models_path.join("best")
    }

    /// Append one epoch line to the experiment log
    pub fn append_log_line(&self, epoch: usize, metric: f64, lr: f64) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{timestamp} | epoch {epoch} | metric {metric:.6} | lr {lr:.8}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = ExperimentLayout::new("runs", "trial");

        assert_eq!(layout.experiment_path(), Path::new("runs/trial"));
        assert_eq!(layout.models_path(), Path::new("runs/trial/models"));
        assert_eq!(layout.log_path(), Path::new("runs/trial/trial.txt"));
        assert_eq!(layout.checkpoint_path(7), PathBuf::from("runs/trial/models/7"));
        assert_eq!(
            layout.best_checkpoint_path(),
            PathBuf::from("runs/trial/models/best")
        );
    }

    #[test]
    fn test_create_dirs_and_append_log() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        let layout = ExperimentLayout::new(&root, "exp");

        layout.create_dirs().unwrap();
        assert!(layout.models_path().is_dir());

        layout.append_log_line(0, 0.5, 1e-3).unwrap();
        layout.append_log_line(1, 0.75, 9e-4).unwrap();
        layout.append_log_line(2, 0.75, 8e-4).unwrap();

        let content = std::fs::read_to_string(layout.log_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("epoch 1"));
        assert!(lines[1].contains("metric 0.750000"));
        assert!(lines[1].contains("lr 0.00090000"));
    }

    #[test]
    fn test_log_lines_are_well_formed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        let layout = ExperimentLayout::new(&root, "fmt");

        layout.create_dirs().unwrap();
        layout.append_log_line(4, 0.812345, 0.00012345).unwrap();

        let content = std::fs::read_to_string(layout.log_path()).unwrap();
        let line = content.lines().next().unwrap();
        let fields: Vec<&str> = line.split(" | ").collect();

        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1], "epoch 4");
        let metric: f64 = fields[2].strip_prefix("metric ").unwrap().parse().unwrap();
        assert!((metric - 0.812345).abs() < 1e-9);
        let lr: f64 = fields[3].strip_prefix("lr ").unwrap().parse().unwrap();
        assert!((lr - 0.00012345).abs() < 1e-12);
    }
}

//! Process-wide environment setup
//!
//! Device selection happens through environment variables that must be in
//! place before the compute backend initializes, so the binary applies these
//! once at startup, ahead of any tensor work.

use crate::config::ExperimentConfig;

/// Apply device-selection and threading environment variables.
///
/// `CUDA_VISIBLE_DEVICES` restricts the run to the configured GPU and
/// `CUDA_DEVICE_ORDER=PCI_BUS_ID` keeps index assignment stable across
/// drivers. `RAYON_NUM_THREADS` caps CPU-backend parallelism at the
/// configured worker count, but an explicit value already in the
/// environment wins.
pub fn apply_process_env(config: &ExperimentConfig) {
    std::env::set_var("CUDA_VISIBLE_DEVICES", &config.cuda_device);
    std::env::set_var("CUDA_DEVICE_ORDER", "PCI_BUS_ID");

    if std::env::var_os("RAYON_NUM_THREADS").is_none() {
        std::env::set_var("RAYON_NUM_THREADS", config.num_workers.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_process_env_sets_device_selection() {
        let mut config = ExperimentConfig::debug();
        config.cuda_device = "3".to_string();

        apply_process_env(&config);

        assert_eq!(std::env::var("CUDA_VISIBLE_DEVICES").unwrap(), "3");
        assert_eq!(std::env::var("CUDA_DEVICE_ORDER").unwrap(), "PCI_BUS_ID");
        assert!(std::env::var("RAYON_NUM_THREADS").is_ok());
    }
}

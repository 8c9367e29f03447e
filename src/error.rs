//! Error Handling Module
//!
//! Defines custom error types for the retscreen library.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Main error type for retscreen operations
#[derive(Error, Debug)]
pub enum ScreenError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error persisting or restoring a model checkpoint
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Error extracting data from a tensor
    #[error("Tensor error: {0}")]
    Tensor(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience Result type for retscreen operations
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, msg: &str) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| ScreenError::InvalidInput(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| ScreenError::InvalidInput(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| ScreenError::InvalidInput(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| ScreenError::InvalidInput(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScreenError::Config("missing experiment name".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: missing experiment name"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        fn touch_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/a/path.txt")?)
        }
        assert!(matches!(touch_missing(), Err(ScreenError::Io(_))));
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let with_context = result.context("Failed to read file");
        assert!(with_context.is_err());
    }

    #[test]
    fn test_option_context() {
        let opt: Option<i32> = None;
        let with_context = opt.with_context(|| "value was None".to_string());
        assert!(with_context.is_err());
    }
}

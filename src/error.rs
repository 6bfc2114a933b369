//! Error types for the pose gesture library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Detector has not been initialized yet; retry on the next tick
    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    /// The external model raised an error during inference
    #[error("Detection failed: {0}")]
    Detection(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Calibration thresholds are out of range or inconsistent
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// Filter initialization or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The detection worker thread is gone
    #[error("Detection worker disconnected")]
    WorkerDisconnected,
}

impl Error {
    /// Whether the caller should silently retry on the next scheduling tick.
    ///
    /// Only an uninitialized detector is retryable; every other failure is
    /// surfaced once through the error reporter.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DetectorUnavailable(_))
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

//! Crate-wide error types

use thiserror::Error;

/// Errors produced by monitoring, reporting, and plotting operations
#[derive(Debug, Error)]
pub enum Error {
    /// A concrete layer name was requested that no tensor source entry carries.
    /// Treated as a configuration error: fatal at setup, never retried.
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    /// Moving tensor data to host memory failed. Surfaced as-is, not retried.
    #[error("Device transfer failed: {0}")]
    DeviceTransfer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The persisted log did not match the expected flat key-to-number shape.
    #[error("Malformed log: {0}")]
    MalformedLog(String),

    /// A plot references a log key that was never recorded.
    #[error("Missing log key: {0}")]
    MissingKey(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Plot rendering failed: {0}")]
    Plot(String),
}

/// Result type for vigilar operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownLayer("conv9".to_string());
        assert!(format!("{err}").contains("Unknown layer"));
        assert!(format!("{err}").contains("conv9"));

        let err = Error::MissingKey("predictor/conv1/W/data/mean".to_string());
        assert!(format!("{err}").contains("Missing log key"));

        let err = Error::MalformedLog("expected array".to_string());
        assert!(format!("{err}").contains("Malformed log"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

//! Error types for the BlinkyStrip hardware library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the strip.
#[derive(Error, Debug)]
pub enum Error {
    /// LED strip device path does not exist.
    #[error("LED strip not found at {0}")]
    StripNotFound(String),

    /// Serial port communication error.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Serial I/O error.
    #[error("Serial I/O error: {0}")]
    SerialIo(#[from] std::io::Error),

    /// More pixels were sent than the strip holds.
    #[error("Attempting to set pixel outside range: {requested} pixels on a {capacity}-LED strip")]
    OutOfRange { requested: usize, capacity: usize },

    /// Requested strip length is beyond what a link can drive.
    #[error("Unsupported LED count {requested} (maximum {max})")]
    InvalidLedCount { requested: usize, max: usize },

    /// The link was closed and can no longer be used.
    #[error("LED strip connection is closed")]
    Closed,

    /// Color text could not be parsed.
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

impl Error {
    /// Returns true if the error came from opening or using the serial channel.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::StripNotFound(_) | Error::Serial(_) | Error::SerialIo(_)
        )
    }
}

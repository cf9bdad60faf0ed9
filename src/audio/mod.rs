pub mod capture;
pub mod devices;

pub use capture::InputCapture;

use thiserror::Error;

/// Errors raised while opening a capture device.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("No input device selected")]
    NoInputDevice,

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to enumerate devices: {0}")]
    EnumerationError(String),

    #[error("Failed to get input config: {0}")]
    ConfigError(String),

    #[error("Input device doesn't support F32 format (got {0})")]
    UnsupportedFormat(String),

    #[error("Failed to build input stream: {0}")]
    StreamError(String),

    #[error("Failed to start input stream: {0}")]
    PlayError(String),
}

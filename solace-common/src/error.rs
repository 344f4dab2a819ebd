//! Common error types for Solace

use thiserror::Error;

/// Common result type for Solace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Solace client core
///
/// Device and decode errors carry user-actionable messages: they are
/// surfaced directly as notifications when the capture pipeline resets.
#[derive(Error, Debug)]
pub enum Error {
    /// No capture hardware present
    #[error("No microphone or camera was found. Connect a device and try again.")]
    DeviceUnavailable,

    /// User or OS refused access to the capture hardware
    #[error("Access to the device was denied. Check your privacy settings and try again.")]
    PermissionDenied,

    /// Capture hardware already held by another session
    #[error("The device is in use by another application. Close it and try again.")]
    DeviceBusy,

    /// Captured audio could not be decoded
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Remote gateway unreachable or returned a non-success status
    #[error("Network error: {0}")]
    Network(String),

    /// Referenced remote record missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Required user-entered fields empty or malformed
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

//! # Error Types
//!
//! Custom error types for padview using `thiserror`.

use thiserror::Error;

/// Main error type for padview
#[derive(Debug, Error)]
pub enum PadViewError {
    /// Bad serial parameters or a bad configuration value.
    /// Fatal to the current session attempt; the caller decides retry policy.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Configuration file failed to deserialize
    #[error("configuration file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// Serial device could not be opened or re-opened.
    /// Retried with backoff, never fatal to the process.
    #[error("serial device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Frame too short for an assigned control's field.
    /// The frame is dropped; the session stays connected.
    #[error("malformed frame: got {got} bytes, need {needed}")]
    MalformedFrame { got: usize, needed: usize },

    /// Whole skin rejected: missing background, missing declaration,
    /// unknown or unresolved controller family
    #[error("invalid skin descriptor: {0}")]
    DescriptorInvalid(String),

    /// Single placement malformed or unresolved. Caught inside the parser;
    /// the element is skipped and parsing continues.
    #[error("invalid skin element: {0}")]
    ElementInvalid(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for padview
pub type Result<T> = std::result::Result<T, PadViewError>;

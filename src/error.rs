//! Error types

use thiserror::Error;

/// Rejected spy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Offset given as something other than a number
    #[error("option `{option}` must be a number, found {found}")]
    NotANumber { option: &'static str, found: String },

    /// Negative offset
    #[error("option `{option}` must not be negative, found {value}")]
    Negative { option: &'static str, value: f64 },

    /// Fractional offset
    #[error("option `{option}` must be a whole number of pixels, found {value}")]
    NotAnInteger { option: &'static str, value: f64 },

    /// Offset too large to represent
    #[error("option `{option}` is out of range: {value}")]
    OutOfRange { option: &'static str, value: f64 },

    /// Flag given as something other than a boolean
    #[error("option `{option}` must be a boolean, found {found}")]
    NotABoolean { option: &'static str, found: String },

    /// Options payload is not an object
    #[error("options must be an object, found {0}")]
    NotAnObject(String),

    /// Options text is not valid JSON
    #[error("invalid options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Spy error type
#[derive(Debug, Error)]
pub enum SpyError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Target discovery failed
    #[error("target discovery failed: {0}")]
    Discovery(String),

    /// Command name not recognised
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Document layout failed
    #[error("layout error: {0}")]
    Layout(String),
}

impl From<taffy::TaffyError> for SpyError {
    fn from(err: taffy::TaffyError) -> Self {
        SpyError::Layout(err.to_string())
    }
}

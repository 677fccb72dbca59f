//! Top-level error types shared across the crate.

use thiserror::Error;

/// Result type for crate-level operations.
pub type Result<T> = std::result::Result<T, GlimpseError>;

/// Errors raised before any engine statement is issued.
#[derive(Error, Debug)]
pub enum GlimpseError {
    /// A caller-supplied identifier or expression cannot be safely embedded
    /// in generated SQL text.
    #[error("security violation: {0}")]
    Security(String),

    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl GlimpseError {
    /// Creates a security error with the given message.
    pub fn security(msg: impl Into<String>) -> Self {
        Self::Security(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

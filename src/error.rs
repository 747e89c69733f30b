//! Error types for conversion and configuration

use thiserror::Error;

/// Errors raised by a markdown conversion.
///
/// A conversion fails at most once and never returns a partial request list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The markdown (or the call around it) is structurally unusable.
    #[error("Malformed markdown: {0}")]
    MalformedMarkdown(String),

    /// The converter broke one of its own invariants.
    #[error("Conversion failed: {0}")]
    Internal(String),
}

impl ConvertError {
    /// True when the caller supplied bad input, false when the converter itself failed.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, ConvertError::MalformedMarkdown(_))
    }
}

/// Errors raised while loading a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_distinguished() {
        assert!(ConvertError::MalformedMarkdown("x".into()).is_caller_error());
        assert!(!ConvertError::Internal("x".into()).is_caller_error());
    }

    #[test]
    fn messages_carry_the_cause() {
        let err = ConvertError::Internal("formatting stack not empty".into());
        assert_eq!(err.to_string(), "Conversion failed: formatting stack not empty");
    }
}

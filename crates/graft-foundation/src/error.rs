//! Error handling for graft-foundation and the broader graft system

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type shared by every graft crate
///
/// Expected outcomes (an edit that does not fit the target file) are never
/// errors; they travel as [`crate::PatchResult::NotApplicable`]. Everything in
/// here aborts the current artifact.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GraftError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Lookup error: {message}")]
    Lookup { message: String },

    #[error("Could not find a free alias for `{name}` after {attempts} attempts")]
    AliasExhausted { name: String, attempts: usize },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GraftError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new lookup error
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup {
            message: message.into(),
        }
    }

    /// Create a new alias exhaustion error
    pub fn alias_exhausted(name: impl Into<String>, attempts: usize) -> Self {
        Self::AliasExhausted {
            name: name.into(),
            attempts,
        }
    }

    /// Create a new invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Machine-readable error code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => error_codes::E2001_CONFIG,
            Self::Io(_) => error_codes::E2002_IO,
            Self::Json(_) | Self::InvalidData { .. } => error_codes::E2003_INVALID_DATA,
            Self::Parse { .. } => error_codes::E2004_PARSE,
            Self::Lookup { .. } | Self::NotFound { .. } => error_codes::E2005_LOOKUP,
            Self::AliasExhausted { .. } => error_codes::E2006_ALIAS_EXHAUSTED,
            Self::Internal { .. } => error_codes::E2000_INTERNAL,
        }
    }
}

/// Result type alias for convenience
pub type GraftResult<T> = Result<T, GraftError>;

/// Standardized error codes reported by the CLI
pub mod error_codes {
    /// Internal error
    pub const E2000_INTERNAL: &str = "E2000";
    /// Configuration could not be loaded or validated
    pub const E2001_CONFIG: &str = "E2001";
    /// File system error
    pub const E2002_IO: &str = "E2002";
    /// Malformed descriptor, selection or other input data
    pub const E2003_INVALID_DATA: &str = "E2003";
    /// Source file is not valid PHP
    pub const E2004_PARSE: &str = "E2004";
    /// Requested member or type does not exist
    pub const E2005_LOOKUP: &str = "E2005";
    /// Alias disambiguation gave up
    pub const E2006_ALIAS_EXHAUSTED: &str = "E2006";
}

/// Serializable error report, printed by the CLI in `--json` mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorReport {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&GraftError> for ErrorReport {
    fn from(err: &GraftError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(GraftError::parse("bad").code(), "E2004");
        assert_eq!(GraftError::alias_exhausted("Plugin", 32).code(), "E2006");
        assert_eq!(GraftError::lookup("missing").code(), "E2005");
    }

    #[test]
    fn test_error_report_from_error() {
        let err = GraftError::alias_exhausted("Plugin", 32);
        let report = ErrorReport::from(&err);
        assert_eq!(report.code, "E2006");
        assert_eq!(
            report.message,
            "Could not find a free alias for `Plugin` after 32 attempts"
        );
    }
}

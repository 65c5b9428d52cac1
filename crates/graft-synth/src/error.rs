//! Synthesis error types

use graft_ast::AstError;
use graft_foundation::GraftError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SynthError {
    /// A selected member does not exist on the base type
    #[error("{kind} `{name}` not found on `{class}`")]
    Lookup {
        kind: &'static str,
        name: String,
        class: String,
    },

    #[error("Invalid type descriptor: {message}")]
    InvalidDescriptor { message: String },

    #[error("Invalid member selection: {message}")]
    InvalidSelection { message: String },

    #[error(transparent)]
    Ast(#[from] AstError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SynthError {
    pub fn lookup(kind: &'static str, name: impl Into<String>, class: impl Into<String>) -> Self {
        Self::Lookup {
            kind,
            name: name.into(),
            class: class.into(),
        }
    }

    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            message: message.into(),
        }
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: message.into(),
        }
    }

    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<SynthError> for GraftError {
    fn from(err: SynthError) -> Self {
        match err {
            SynthError::Lookup { .. } => GraftError::lookup(err.to_string()),
            SynthError::Ast(ast) => ast.into(),
            SynthError::Json(json) => GraftError::Json(json),
            SynthError::Io { source, .. } => GraftError::Io(source),
            other => GraftError::invalid_data(other.to_string()),
        }
    }
}

pub type SynthResult<T> = Result<T, SynthError>;

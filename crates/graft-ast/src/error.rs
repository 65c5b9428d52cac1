//! AST error types

use graft_foundation::GraftError;
use thiserror::Error;

/// AST operation errors
///
/// A target file whose shape does not fit an edit is *not* an error; edits
/// report that through [`graft_foundation::EditOutcome::NotApplicable`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AstError {
    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        message: String,
        offset: usize,
        line: usize,
        column: usize,
    },

    #[error("Transformation error: {message}")]
    Transformation { message: String },

    #[error("Could not find a free alias for `{name}` after {attempts} attempts")]
    AliasExhausted { name: String, attempts: usize },

    #[error("Invalid class name: {name}")]
    InvalidName { name: String },

    #[error("Workspace is {state}, cannot {operation}")]
    InvalidState {
        state: &'static str,
        operation: &'static str,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AstError {
    /// Parse error located by byte offset into `source`
    pub fn parse(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, offset);
        Self::Parse {
            message: message.into(),
            offset,
            line,
            column,
        }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        Self::Transformation {
            message: message.into(),
        }
    }

    pub fn alias_exhausted(name: impl Into<String>, attempts: usize) -> Self {
        Self::AliasExhausted {
            name: name.into(),
            attempts,
        }
    }

    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// 1-based line and column of a byte offset
fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..floor_char_boundary(source, offset)];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map(|nl| before[nl + 1..].chars().count())
        .unwrap_or_else(|| before.chars().count())
        + 1;
    (line, column)
}

fn floor_char_boundary(source: &str, mut offset: usize) -> usize {
    while offset > 0 && !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

impl From<AstError> for GraftError {
    fn from(err: AstError) -> Self {
        match err {
            AstError::Parse { .. } => GraftError::parse(err.to_string()),
            AstError::AliasExhausted { name, attempts } => {
                GraftError::alias_exhausted(name, attempts)
            }
            AstError::InvalidName { .. } => GraftError::invalid_data(err.to_string()),
            AstError::Io { source, .. } => GraftError::Io(source),
            _ => GraftError::internal(format!("AST error: {}", err)),
        }
    }
}

/// Result type alias for AST operations
pub type AstResult<T> = Result<T, AstError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        let err = AstError::parse("<?php\nclass {", 12, "expected class name");
        match err {
            AstError::Parse { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_alias_exhausted_converts_to_graft_error() {
        let err: GraftError = AstError::alias_exhausted("Plugin", 4).into();
        assert_eq!(err.code(), "E2006");
    }
}

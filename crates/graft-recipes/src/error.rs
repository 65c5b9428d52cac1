//! Recipe error types

use graft_ast::AstError;
use graft_foundation::GraftError;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecipeError {
    /// A recipe input failed validation before any file was touched
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error(transparent)]
    Ast(#[from] AstError),
}

impl RecipeError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

impl From<RecipeError> for GraftError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::Ast(ast) => ast.into(),
            other => GraftError::invalid_data(other.to_string()),
        }
    }
}

pub type RecipeResult<T> = Result<T, RecipeError>;

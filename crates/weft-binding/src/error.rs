//! Binding-level errors.

use std::fmt;

use weft_expression::ExprError;

/// Errors surfaced by binding operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The underlying expression failed to evaluate or assign.
    Expression(ExprError),
    /// `call_source` was invoked on an unbound call binding.
    NotBound,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(e) => write!(f, "expression error: {e}"),
            Self::NotBound => write!(f, "binding is not bound"),
        }
    }
}

impl std::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Expression(e) => Some(e),
            Self::NotBound => None,
        }
    }
}

impl From<ExprError> for BindingError {
    fn from(e: ExprError) -> Self {
        Self::Expression(e)
    }
}

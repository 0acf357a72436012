//! Expression evaluation and assignment errors.

use std::fmt;

/// Errors raised by [`Expr::evaluate`](crate::ast::Expr::evaluate) and
/// [`Expr::assign`](crate::ast::Expr::assign).
///
/// These propagate synchronously to whoever called `bind`/`handle_change`;
/// the binding core never swallows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// `$parent` hops walked past the top of the override-context chain.
    UndefinedContext {
        /// The requested number of ancestor hops.
        ancestor: usize,
    },
    /// Member or keyed access through a null value.
    NullAccess {
        /// The member name (or `"[key]"` for keyed access).
        name: String,
    },
    /// The expression shape cannot be written to.
    NotAssignable {
        /// Node kind name, e.g. `"binary"`.
        kind: &'static str,
    },
    /// A call target did not resolve to a function.
    NotCallable {
        /// The property name that was called.
        name: String,
    },
    /// An operator was applied to operands it does not support.
    TypeMismatch {
        /// Operator or operation name.
        op: &'static str,
        /// Type name of the left (or only) operand.
        left: &'static str,
        /// Type name of the right operand (`"-"` for unary).
        right: &'static str,
    },
    /// Integer division or remainder by zero.
    DivisionByZero,
    /// Integer arithmetic exceeded the representable range.
    Overflow {
        /// The operator that overflowed.
        op: &'static str,
    },
    /// Keyed assignment outside the list's bounds.
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The list length at the time of the write.
        len: usize,
    },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedContext { ancestor } => {
                write!(f, "no ancestor context at depth {ancestor}")
            }
            Self::NullAccess { name } => write!(f, "cannot access '{name}' on null"),
            Self::NotAssignable { kind } => {
                write!(f, "expression kind '{kind}' is not assignable")
            }
            Self::NotCallable { name } => write!(f, "'{name}' is not a function"),
            Self::TypeMismatch { op, left, right } => {
                write!(f, "operator '{op}' not defined for {left} and {right}")
            }
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::Overflow { op } => write!(f, "integer overflow in '{op}'"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for list of length {len}")
            }
        }
    }
}

impl std::error::Error for ExprError {}

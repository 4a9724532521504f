//! Error handling for the row-expression core

use thiserror::Error;

/// Main error type for row-expression operations
#[derive(Error, Debug)]
pub enum RexError {
    /// A call was built with an operand count outside the operator's arity
    #[error("Arity error: {operator} expects {expected} operand(s), got {actual}")]
    Arity {
        operator: String,
        expected: String,
        actual: usize,
    },

    /// A literal value does not match its declared type family
    #[error("Type consistency error: {0}")]
    TypeConsistency(String),

    /// An upstream programming contract was violated
    #[error("Contract violation: {0}")]
    Contract(String),

    /// A specialized traversal met a node kind it does not handle
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The interpreter cannot produce a value for a node
    #[error("Unbound: {0}")]
    Unbound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl RexError {
    /// True when the interpreter gave up on a node. Constant folding treats
    /// this as "leave the expression alone".
    pub fn is_unbound(&self) -> bool {
        matches!(self, RexError::Unbound(_))
    }

    /// True when a specialized shuttle refused a node kind.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, RexError::UnsupportedOperation(_))
    }

    /// True for programmer errors that must never be coerced.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            RexError::Arity { .. } | RexError::TypeConsistency(_) | RexError::Contract(_)
        )
    }
}

/// Result type alias for row-expression operations
pub type RexResult<T> = std::result::Result<T, RexError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_err {
    ($msg:expr) => {
        $crate::common::error::RexError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::RexError::Internal(format!($fmt, $($arg)*))
    };
}

/// Macro for creating not implemented errors
#[macro_export]
macro_rules! not_implemented_err {
    ($msg:expr) => {
        $crate::common::error::RexError::NotImplemented($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::RexError::NotImplemented(format!($fmt, $($arg)*))
    };
}

/// Macro for creating contract violations
#[macro_export]
macro_rules! contract_err {
    ($msg:expr) => {
        $crate::common::error::RexError::Contract($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::RexError::Contract(format!($fmt, $($arg)*))
    };
}

/// Macro for creating unbound interpreter errors
#[macro_export]
macro_rules! unbound_err {
    ($msg:expr) => {
        $crate::common::error::RexError::Unbound($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::common::error::RexError::Unbound(format!($fmt, $($arg)*))
    };
}

//! Prism Rex - row expressions for the PrismDB planner
//!
//! The expression core of the query engine: an immutable expression tree with
//! canonical digests, a builder that types and simplifies nodes as it creates
//! them, a constant interpreter, a null-semantics rewriter, a structural
//! checker and a traversal framework the planner's passes are built on.
//!
pub mod common;
pub mod operator;
pub mod rex;
pub mod types;

// Re-export common types for convenience
pub use common::{RexConfig, RexError, RexResult};

// Re-export operator table for convenience
pub use operator::{std_operators, Kind, Operator, OperatorRef};

// Re-export expression system for convenience
pub use rex::{
    Datum, Environment, Litmus, RexBuilder, RexChecker, RexInterpreter, RexNode, RexShuttle,
    RexTransformer, RexVisitor,
};

// Re-export type system for convenience
pub use types::{DataType, DefaultTypeFactory, SqlTypeName, TypeFactory};

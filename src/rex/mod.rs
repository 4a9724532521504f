//! Row expressions
//!
//! This module contains the expression tree and the passes over it:
//! - RexNode and its variants: literals, references, calls, windows, sub-queries
//! - RexBuilder: the only way to create nodes
//! - Traversal: visitors, bi-visitors and shuttles
//! - RexInterpreter, RexTransformer, RexChecker: evaluation, null-semantics
//!   rewriting and structural validation

pub mod aggregate;
pub mod builder;
pub mod call;
pub mod checker;
pub mod copier;
pub mod datum;
pub mod digest;
pub mod interpreter;
pub mod literal;
pub mod node;
pub mod over;
pub mod permute;
pub mod sub_query;
pub mod transformer;
pub mod util;
pub mod variable;
pub mod visitor;

// Re-export main types for convenience
pub use aggregate::AggregateCall;
pub use builder::RexBuilder;
pub use call::RexCall;
pub use checker::{CheckFailure, Litmus, RexChecker};
pub use copier::RexCopier;
pub use datum::Datum;
pub use digest::DigestIncludeType;
pub use interpreter::{Environment, RexInterpreter};
pub use literal::{LiteralValue, RexLiteral};
pub use node::{RexFieldAccess, RexNode};
pub use over::{RexFieldCollation, RexOver, RexWindow, RexWindowBound};
pub use permute::{Mapping, RexPermuteInputsShuttle};
pub use sub_query::{RelPlan, RexSubQuery};
pub use transformer::RexTransformer;
pub use variable::{
    CorrelationId, RelTableRef, RexCorrelVariable, RexDynamicParam, RexInputRef, RexLocalRef,
    RexNameRef, RexPatternFieldRef, RexRangeRef, RexTableInputRef,
};
pub use visitor::{RexBiVisitor, RexShuttle, RexVisitor};

//! Operator records and the standard operator table
//!
//! - Kind: tags for fast dispatch and category tests
//! - Operator: name, kind, arity and return-type strategy
//! - StdOperatorTable: the shared catalog of standard operators

pub mod kind;
#[allow(clippy::module_inception)]
pub mod operator;
pub mod std_table;

pub use kind::Kind;
pub use operator::{Arity, Operator, OperatorRef, ReturnTypeInference, Syntax};
pub use std_table::{std_operators, StdOperatorTable};

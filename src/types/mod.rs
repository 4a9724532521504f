//! Type capability for the expression core
//!
//! This module contains the type system components expressions depend on:
//! - SqlTypeName / TimeUnit / TimeUnitRange: type names and time units
//! - DataType: immutable type descriptors
//! - TypeFactory: creation of descriptors and common-type inference
//! - Value shapes held by literals (strings, binaries, datetimes, symbols)

pub mod data_type;
pub mod datetime;
pub mod factory;
pub mod type_name;
pub mod value;

// Re-export main types for convenience
pub use data_type::{DataType, DataTypeField, IntervalQualifier};
pub use datetime::{DateString, TimeString, TimestampString};
pub use factory::{DefaultTypeFactory, TypeFactory, TypeSystem};
pub use type_name::{SqlTypeName, TimeUnit, TimeUnitRange};
pub use value::{ByteString, GraphValue, NlsString, Symbol};

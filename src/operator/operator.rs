//! Operator records
//!
//! Operators are plain data: a name, a kind tag, an arity range and a
//! return-type strategy. Behavior specific to one function is expressed by
//! choosing a strategy, never by a type per function.

use crate::common::error::{RexError, RexResult};
use crate::operator::kind::Kind;
use crate::types::{DataType, SqlTypeName, TypeFactory};
use std::fmt;
use std::sync::Arc;

/// Shared handle to an operator record
pub type OperatorRef = Arc<Operator>;

/// How a call to the operator is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `f(a, b)`
    Function,
    /// `a + b`
    Binary,
    /// `-a`, `NOT a`
    Prefix,
    /// `a IS NULL`
    Postfix,
    /// `CASE`, `CAST` and other special forms
    Special,
}

/// Accepted operand counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map(|max| count <= max).unwrap_or(true)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// Strategy that derives the result type of a call from its operand types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnTypeInference {
    /// BOOLEAN, nullable if any operand is nullable
    BooleanNullable,
    /// BOOLEAN NOT NULL
    BooleanNotNull,
    /// Type of the operand at this position
    Arg(usize),
    /// Type of the first operand, nullable if any operand is
    Arg0Nullable,
    /// Type of the first operand, forced nullable
    Arg0ForceNullable,
    /// Type of the first operand, forced NOT NULL
    Arg0NotNull,
    /// Least restrictive operand type, nullable if any operand is
    LeastRestrictive,
    /// Least restrictive operand type, nullable only if all operands are
    LeastRestrictiveLeastNullable,
    /// Least restrictive type of the THEN and ELSE branches of a CASE
    CaseResult,
    /// BIGINT NOT NULL
    BigIntNotNull,
    /// BIGINT, nullable if any operand is nullable
    BigIntNullable,
    /// DOUBLE for AVG of integers, else the operand type, forced nullable
    Average,
    /// ARRAY of the least restrictive operand type
    ArrayOfOperands,
    /// MULTISET of the least restrictive operand type
    MultisetOfOperands,
    /// MAP of alternating key and value operands
    MapOfOperands,
    /// The caller must supply the type
    Explicit,
}

impl ReturnTypeInference {
    pub fn infer(
        &self,
        factory: &dyn TypeFactory,
        operator: &str,
        operand_types: &[DataType],
    ) -> RexResult<DataType> {
        let any_nullable = operand_types.iter().any(|t| t.is_nullable());
        let all_nullable =
            !operand_types.is_empty() && operand_types.iter().all(|t| t.is_nullable());
        let arg = |i: usize| {
            operand_types.get(i).cloned().ok_or_else(|| {
                RexError::Contract(format!(
                    "{} has no operand {} to take its type from",
                    operator, i
                ))
            })
        };
        let least = |types: &[DataType]| {
            factory.least_restrictive(types).ok_or_else(|| {
                RexError::InvalidType(format!(
                    "No common type for operands of {}: [{}]",
                    operator,
                    types
                        .iter()
                        .map(|t| t.full_type_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
        };

        match self {
            ReturnTypeInference::BooleanNullable => {
                let t = factory.create_type(SqlTypeName::Boolean)?;
                Ok(factory.create_type_with_nullability(&t, any_nullable))
            }
            ReturnTypeInference::BooleanNotNull => factory.create_type(SqlTypeName::Boolean),
            ReturnTypeInference::Arg(i) => arg(*i),
            ReturnTypeInference::Arg0Nullable => {
                let t = arg(0)?;
                Ok(factory.create_type_with_nullability(&t, any_nullable))
            }
            ReturnTypeInference::Arg0ForceNullable => {
                let t = arg(0)?;
                Ok(factory.create_type_with_nullability(&t, true))
            }
            ReturnTypeInference::Arg0NotNull => {
                let t = arg(0)?;
                Ok(factory.create_type_with_nullability(&t, false))
            }
            ReturnTypeInference::LeastRestrictive => {
                let t = least(operand_types)?;
                Ok(factory.create_type_with_nullability(&t, any_nullable))
            }
            ReturnTypeInference::LeastRestrictiveLeastNullable => {
                let t = least(operand_types)?;
                Ok(factory.create_type_with_nullability(&t, all_nullable))
            }
            ReturnTypeInference::CaseResult => {
                // WHEN c1 THEN v1 ... [ELSE e]
                let mut branches: Vec<DataType> = operand_types
                    .iter()
                    .skip(1)
                    .step_by(2)
                    .cloned()
                    .collect();
                let has_else = operand_types.len() % 2 == 1;
                if has_else {
                    if let Some(last) = operand_types.last() {
                        branches.push(last.clone());
                    }
                }
                let t = least(&branches)?;
                let nullable = !has_else || branches.iter().any(|b| b.is_nullable());
                Ok(factory.create_type_with_nullability(&t, nullable))
            }
            ReturnTypeInference::BigIntNotNull => factory.create_type(SqlTypeName::BigInt),
            ReturnTypeInference::BigIntNullable => {
                let t = factory.create_type(SqlTypeName::BigInt)?;
                Ok(factory.create_type_with_nullability(&t, any_nullable))
            }
            ReturnTypeInference::Average => {
                let t = arg(0)?;
                let t = if t.type_name().is_integral() {
                    factory.create_type(SqlTypeName::Double)?
                } else {
                    t
                };
                Ok(factory.create_type_with_nullability(&t, true))
            }
            ReturnTypeInference::ArrayOfOperands => {
                let element = least(operand_types)?;
                Ok(factory.create_array_type(element))
            }
            ReturnTypeInference::MultisetOfOperands => {
                let element = least(operand_types)?;
                Ok(factory.create_multiset_type(element))
            }
            ReturnTypeInference::MapOfOperands => {
                let keys: Vec<DataType> = operand_types.iter().step_by(2).cloned().collect();
                let values: Vec<DataType> =
                    operand_types.iter().skip(1).step_by(2).cloned().collect();
                Ok(factory.create_map_type(least(&keys)?, least(&values)?))
            }
            ReturnTypeInference::Explicit => Err(RexError::Contract(format!(
                "{} requires an explicit return type",
                operator
            ))),
        }
    }
}

/// An operator: the data that describes a SQL operator or function
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Operator {
    name: String,
    kind: Kind,
    syntax: Syntax,
    arity: Arity,
    return_type: ReturnTypeInference,
}

impl Operator {
    pub fn new(
        name: impl Into<String>,
        kind: Kind,
        syntax: Syntax,
        arity: Arity,
        return_type: ReturnTypeInference,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            syntax,
            arity,
            return_type,
        }
    }

    /// Name used in digests
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn return_type_inference(&self) -> ReturnTypeInference {
        self.return_type
    }

    pub fn is_aggregate(&self) -> bool {
        self.kind.is_aggregate()
    }

    /// Fail with an arity error unless `count` operands are accepted
    pub fn check_arity(&self, count: usize) -> RexResult<()> {
        if self.arity.accepts(count) {
            Ok(())
        } else {
            Err(RexError::Arity {
                operator: self.name.clone(),
                expected: self.arity.to_string(),
                actual: count,
            })
        }
    }

    pub fn infer_return_type(
        &self,
        factory: &dyn TypeFactory,
        operand_types: &[DataType],
    ) -> RexResult<DataType> {
        self.return_type.infer(factory, &self.name, operand_types)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DefaultTypeFactory;

    #[test]
    fn test_arity() {
        let op = Operator::new(
            "NOT",
            Kind::Not,
            Syntax::Prefix,
            Arity::exactly(1),
            ReturnTypeInference::Arg0Nullable,
        );
        assert!(op.check_arity(1).is_ok());
        let err = op.check_arity(2).unwrap_err();
        assert!(matches!(err, RexError::Arity { actual: 2, .. }));
        assert!(Arity::at_least(2).accepts(10));
        assert_eq!(Arity::between(1, 3).to_string(), "1..3");
    }

    #[test]
    fn test_case_result_inference() {
        let factory = DefaultTypeFactory::default();
        let boolean = factory.create_type(SqlTypeName::Boolean).unwrap();
        let int = factory.create_type(SqlTypeName::Integer).unwrap();

        let with_else = ReturnTypeInference::CaseResult
            .infer(&factory, "CASE", &[boolean.clone(), int.clone(), int.clone()])
            .unwrap();
        assert_eq!(with_else.full_type_string(), "INTEGER NOT NULL");

        let without_else = ReturnTypeInference::CaseResult
            .infer(&factory, "CASE", &[boolean, int])
            .unwrap();
        assert!(without_else.is_nullable());
    }

    #[test]
    fn test_boolean_nullable_inference() {
        let factory = DefaultTypeFactory::default();
        let int = factory.create_type(SqlTypeName::Integer).unwrap();
        let nullable = factory.create_type_with_nullability(&int, true);
        let t = ReturnTypeInference::BooleanNullable
            .infer(&factory, "=", &[int.clone(), nullable])
            .unwrap();
        assert_eq!(t.full_type_string(), "BOOLEAN");
        assert!(ReturnTypeInference::Explicit
            .infer(&factory, "CAST", &[int])
            .is_err());
    }
}

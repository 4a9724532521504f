//! Aggregate calls as they appear in an aggregation

use crate::operator::{Kind, OperatorRef};
use crate::types::DataType;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One aggregate function applied to input fields
///
/// Two calls are equal when they apply the same aggregate to the same
/// arguments with the same DISTINCT flag and filter. The result type and
/// the alias do not take part.
#[derive(Debug, Clone)]
pub struct AggregateCall {
    op: OperatorRef,
    distinct: bool,
    args: Vec<usize>,
    filter_arg: Option<usize>,
    data_type: DataType,
    name: Option<String>,
}

impl AggregateCall {
    pub fn new(
        op: OperatorRef,
        distinct: bool,
        args: Vec<usize>,
        filter_arg: Option<usize>,
        data_type: DataType,
        name: Option<String>,
    ) -> Self {
        Self {
            op,
            distinct,
            args,
            filter_arg,
            data_type,
            name,
        }
    }

    pub fn op(&self) -> &OperatorRef {
        &self.op
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Ordinals of the input fields the aggregate reads
    pub fn args(&self) -> &[usize] {
        &self.args
    }

    /// Ordinal of a BOOLEAN input field that filters rows, if any
    pub fn filter_arg(&self) -> Option<usize> {
        self.filter_arg
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_count(&self) -> bool {
        self.op.kind() == Kind::Count
    }

    /// Same call over different arguments
    pub fn copy_with_args(&self, args: Vec<usize>) -> Self {
        Self {
            args,
            ..self.clone()
        }
    }
}

impl PartialEq for AggregateCall {
    fn eq(&self, other: &Self) -> bool {
        self.op.name() == other.op.name()
            && self.op.kind() == other.op.kind()
            && self.distinct == other.distinct
            && self.args == other.args
            && self.filter_arg == other.filter_arg
    }
}

impl Eq for AggregateCall {}

impl Hash for AggregateCall {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.op.name().hash(state);
        self.distinct.hash(state);
        self.args.hash(state);
        self.filter_arg.hash(state);
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.op.name())?;
        if self.distinct {
            f.write_str(if self.args.is_empty() { "DISTINCT" } else { "DISTINCT " })?;
        }
        let args: Vec<String> = self.args.iter().map(|a| format!("${}", a)).collect();
        f.write_str(&args.join(", "))?;
        f.write_str(")")?;
        if let Some(filter) = self.filter_arg {
            write!(f, " FILTER ${}", filter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::std_operators;
    use crate::types::{DefaultTypeFactory, SqlTypeName, TypeFactory};
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_type_and_name() {
        let factory = DefaultTypeFactory::default();
        let bigint = factory.create_type(SqlTypeName::BigInt).unwrap();
        let int = factory.create_type(SqlTypeName::Integer).unwrap();
        let count = &std_operators().count;

        let a = AggregateCall::new(count.clone(), false, vec![0], None, bigint, Some("c".into()));
        let b = AggregateCall::new(count.clone(), false, vec![0], None, int, None);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&b));
        assert_ne!(a, a.copy_with_args(vec![1]));
    }

    #[test]
    fn test_display() {
        let factory = DefaultTypeFactory::default();
        let bigint = factory.create_type(SqlTypeName::BigInt).unwrap();
        let call = AggregateCall::new(
            std_operators().count.clone(),
            true,
            vec![0, 2],
            Some(3),
            bigint,
            None,
        );
        assert_eq!(call.to_string(), "COUNT(DISTINCT $0, $2) FILTER $3");
    }
}

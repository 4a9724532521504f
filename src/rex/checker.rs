//! Structural validation of expressions against an input row

use crate::common::error::{RexError, RexResult};
use crate::rex::call::RexCall;
use crate::rex::node::{RexFieldAccess, RexNode};
use crate::rex::over::RexOver;
use crate::rex::sub_query::RexSubQuery;
use crate::rex::variable::{CorrelationId, RexCorrelVariable, RexInputRef, RexLocalRef};
use crate::rex::visitor::{window_children, RexVisitor};
use crate::types::DataType;
use ahash::AHashSet;
use std::fmt;
use tracing::debug;

/// What a checker does with a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Litmus {
    /// Record it and report the expression as invalid
    #[default]
    Return,
    /// Turn the first failure into a contract error
    Throw,
}

/// One problem found by [`RexChecker`]
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFailure {
    pub node: String,
    pub message: String,
    pub field: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl CheckFailure {
    fn new(node: &str, message: impl Into<String>) -> Self {
        Self {
            node: node.to_string(),
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
        }
    }

    fn mismatch(node: &str, field: &str, expected: &DataType, actual: &DataType) -> Self {
        Self {
            node: node.to_string(),
            message: "type mismatch".to_string(),
            field: Some(field.to_string()),
            expected: Some(expected.full_type_string()),
            actual: Some(actual.full_type_string()),
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node, self.message)?;
        if let Some(field) = &self.field {
            write!(f, " (field {})", field)?;
        }
        if let (Some(expected), Some(actual)) = (&self.expected, &self.actual) {
            write!(f, ": expected {}, actual {}", expected, actual)?;
        }
        Ok(())
    }
}

/// Checks that input references and field accesses agree with the input
/// row types, that no local references occur, and that correlation
/// variables refer to known ids.
///
/// ```text
/// let mut checker = RexChecker::new(input_types, None, Litmus::Return);
/// if !checker.is_valid(&condition)? {
///     for failure in checker.failures() { ... }
/// }
/// ```
pub struct RexChecker {
    input_types: Vec<DataType>,
    correlation_ids: Option<AHashSet<CorrelationId>>,
    litmus: Litmus,
    failures: Vec<CheckFailure>,
}

impl RexChecker {
    /// `correlation_ids` of `None` accepts every correlation variable
    pub fn new(
        input_types: Vec<DataType>,
        correlation_ids: Option<AHashSet<CorrelationId>>,
        litmus: Litmus,
    ) -> Self {
        Self {
            input_types,
            correlation_ids,
            litmus,
            failures: Vec::new(),
        }
    }

    /// Checker for the fields of a row type
    pub fn for_row_type(row_type: &DataType, litmus: Litmus) -> Self {
        let input_types = row_type
            .fields()
            .iter()
            .map(|f| f.data_type().clone())
            .collect();
        Self::new(input_types, None, litmus)
    }

    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Checks `node`, keeping failures of earlier calls
    pub fn is_valid(&mut self, node: &RexNode) -> RexResult<bool> {
        let before = self.failures.len();
        let valid = node.accept(self) && self.failures.len() == before;
        match (self.litmus, self.failures.get(before)) {
            (Litmus::Throw, Some(first)) => Err(RexError::Contract(first.to_string())),
            _ => Ok(valid),
        }
    }

    /// Checks every node, so that all failures are recorded
    fn check_all<'n>(&mut self, nodes: impl Iterator<Item = &'n RexNode>) -> bool {
        nodes.fold(true, |valid, node| node.accept(self) && valid)
    }

    fn fail(&mut self, failure: CheckFailure) -> bool {
        debug!(failure = %failure, "expression check failed");
        self.failures.push(failure);
        false
    }
}

impl RexVisitor for RexChecker {
    type Output = bool;

    fn neutral(&mut self) -> bool {
        true
    }

    fn deep(&self) -> bool {
        true
    }

    fn visit_input_ref(&mut self, input_ref: &RexInputRef) -> bool {
        let index = input_ref.index();
        let digest = input_ref.name().to_string();
        match self.input_types.get(index) {
            None => {
                let count = self.input_types.len();
                self.fail(CheckFailure::new(
                    &digest,
                    format!("index {} out of range [0, {})", index, count),
                ))
            }
            Some(expected) if expected != input_ref.data_type() => {
                let actual = input_ref.data_type();
                self.fail(CheckFailure::mismatch(&digest, "input", expected, actual))
            }
            Some(_) => true,
        }
    }

    fn visit_local_ref(&mut self, local_ref: &RexLocalRef) -> bool {
        self.fail(CheckFailure::new(local_ref.name(), "local reference is not allowed"))
    }

    fn visit_call(&mut self, call: &RexCall) -> bool {
        self.check_all(call.operands().iter())
    }

    fn visit_over(&mut self, over: &RexOver) -> bool {
        let operands = self.check_all(over.operands().iter());
        let window = self.check_all(window_children(over.window()).into_iter());
        operands && window
    }

    fn visit_sub_query(&mut self, sub_query: &RexSubQuery) -> bool {
        self.check_all(sub_query.operands().iter())
    }

    fn visit_field_access(&mut self, field_access: &RexFieldAccess) -> bool {
        let reference = field_access.reference_expr();
        if !reference.accept(self) {
            return false;
        }
        let digest = field_access.digest().to_string();
        let field = field_access.field();
        let record = reference.data_type();
        if !record.is_struct() {
            return self.fail(CheckFailure::new(&digest, "field access on a non-record"));
        }
        let index = match field.index() {
            Some(index) => index,
            None => match record.field(field.name(), true).and_then(|f| f.index()) {
                Some(index) => index,
                None => {
                    let mut failure = CheckFailure::new(&digest, "unknown field");
                    failure.field = Some(field.name().to_string());
                    return self.fail(failure);
                }
            },
        };
        match record.fields().get(index) {
            None => {
                let count = record.field_count();
                let mut failure = CheckFailure::new(
                    &digest,
                    format!("field index {} out of range [0, {})", index, count),
                );
                failure.field = Some(field.name().to_string());
                self.fail(failure)
            }
            Some(declared) if declared.data_type() != field.data_type() => {
                let (expected, actual) = (declared.data_type(), field.data_type());
                self.fail(CheckFailure::mismatch(&digest, field.name(), expected, actual))
            }
            Some(_) => true,
        }
    }

    fn visit_correl_variable(&mut self, correl: &RexCorrelVariable) -> bool {
        match &self.correlation_ids {
            Some(ids) if !ids.contains(&correl.id()) => self.fail(CheckFailure::new(
                correl.name(),
                format!("correlation id {} not found", correl.id()),
            )),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::std_operators;
    use crate::rex::over::{RexFieldCollation, RexWindowBound};
    use crate::rex::sub_query::RelPlan;
    use crate::types::{DataTypeField, SqlTypeName, TypeFactory};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Scan {
        row_type: DataType,
    }

    impl RelPlan for Scan {
        fn row_type(&self) -> &DataType {
            &self.row_type
        }

        fn explain(&self) -> String {
            "Scan(table=[[t]])\n".to_string()
        }
    }

    fn int(b: &crate::rex::builder::RexBuilder) -> DataType {
        b.type_factory().create_type(SqlTypeName::Integer).unwrap()
    }

    #[test]
    fn test_input_refs_are_checked() {
        let b = crate::rex::builder::RexBuilder::default();
        let varchar = b
            .type_factory()
            .create_type_with_precision(SqlTypeName::Varchar, 10)
            .unwrap();
        let ok = b.make_input_ref(int(&b), 0);
        let out_of_range = b.make_input_ref(int(&b), 2);
        let wrong_type = b.make_input_ref(int(&b), 1);
        let call = b
            .make_call(&std_operators().plus, vec![ok.clone(), out_of_range])
            .unwrap();

        let mut checker = RexChecker::new(vec![int(&b), varchar], None, Litmus::Return);
        assert!(checker.is_valid(&ok).unwrap());
        assert!(!checker.is_valid(&call).unwrap());
        assert_eq!(checker.failures()[0].node, "$2");
        assert!(checker.failures()[0].message.contains("out of range"));

        assert!(!checker.is_valid(&wrong_type).unwrap());
        let failure = &checker.failures()[1];
        assert_eq!(failure.expected.as_deref(), Some("VARCHAR(10) NOT NULL"));
        assert_eq!(failure.actual.as_deref(), Some("INTEGER NOT NULL"));
        assert_eq!(checker.failure_count(), 2);
    }

    #[test]
    fn test_throw_escalates() {
        let b = crate::rex::builder::RexBuilder::default();
        let mut checker = RexChecker::new(vec![], None, Litmus::Throw);
        let err = checker.is_valid(&b.make_input_ref(int(&b), 0)).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_unknown_correlation_id() {
        let b = crate::rex::builder::RexBuilder::default();
        let row = b
            .type_factory()
            .create_struct_type(vec![("a".to_string(), int(&b))]);
        let correl = b.make_correl(row, CorrelationId(3));
        let access = b.make_field_access(correl.clone(), "a", true).unwrap();

        let mut known = AHashSet::new();
        known.insert(CorrelationId(3));
        let mut checker = RexChecker::new(vec![], Some(known), Litmus::Return);
        assert!(checker.is_valid(&access).unwrap());

        let mut checker = RexChecker::new(vec![], Some(AHashSet::new()), Litmus::Return);
        assert!(!checker.is_valid(&correl).unwrap());
    }

    #[test]
    fn test_window_expressions_are_checked() {
        let b = crate::rex::builder::RexBuilder::default();
        let nullable = b.type_factory().create_type_with_nullability(&int(&b), true);
        let ok = b.make_input_ref(int(&b), 0);
        let bad = b.make_input_ref(int(&b), 5);
        let over = b
            .make_over(
                nullable.clone(),
                &std_operators().sum,
                vec![ok.clone()],
                vec![],
                vec![RexFieldCollation::new(bad)],
                Some(RexWindowBound::UnboundedPreceding),
                Some(RexWindowBound::CurrentRow),
                true,
                true,
                false,
                false,
            )
            .unwrap();

        let mut checker = RexChecker::new(vec![int(&b)], None, Litmus::Return);
        assert!(!checker.is_valid(&over).unwrap());
        assert_eq!(checker.failure_count(), 1);
        assert_eq!(checker.failures()[0].node, "$5");

        let partitioned = b
            .make_over(
                nullable,
                &std_operators().sum,
                vec![b.make_input_ref(int(&b), 3)],
                vec![b.make_input_ref(int(&b), 4)],
                vec![RexFieldCollation::new(ok)],
                Some(RexWindowBound::UnboundedPreceding),
                Some(RexWindowBound::CurrentRow),
                true,
                true,
                false,
                false,
            )
            .unwrap();
        let mut checker = RexChecker::new(vec![int(&b)], None, Litmus::Return);
        assert!(!checker.is_valid(&partitioned).unwrap());
        assert_eq!(checker.failure_count(), 2);

        let mut checker = RexChecker::new(vec![int(&b)], None, Litmus::Throw);
        assert!(checker.is_valid(&partitioned).unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_sub_query_operands_are_checked() {
        let b = crate::rex::builder::RexBuilder::default();
        let row_type = b
            .type_factory()
            .create_struct_type(vec![("x".to_string(), int(&b))]);
        let plan: Arc<dyn RelPlan> = Arc::new(Scan { row_type });

        let in_range = b
            .make_in(plan.clone(), vec![b.make_input_ref(int(&b), 0)])
            .unwrap();
        let out_of_range = b.make_in(plan, vec![b.make_input_ref(int(&b), 1)]).unwrap();

        let mut checker = RexChecker::new(vec![int(&b)], None, Litmus::Return);
        assert!(checker.is_valid(&in_range).unwrap());
        assert!(!checker.is_valid(&out_of_range).unwrap());
        assert_eq!(checker.failures()[0].node, "$1");
    }

    #[test]
    fn test_field_access_is_checked_against_record() {
        let b = crate::rex::builder::RexBuilder::default();
        let bigint = b.type_factory().create_type(SqlTypeName::BigInt).unwrap();
        let row = b
            .type_factory()
            .create_struct_type(vec![("a".to_string(), int(&b))]);
        let correl = b.make_correl(row, CorrelationId(0));

        let retyped: RexNode =
            RexFieldAccess::new(correl.clone(), DataTypeField::new("a", 0, bigint.clone())).into();
        let mut checker = RexChecker::new(vec![], None, Litmus::Return);
        assert!(!checker.is_valid(&retyped).unwrap());
        let failure = &checker.failures()[0];
        assert_eq!(failure.field.as_deref(), Some("a"));
        assert_eq!(failure.expected.as_deref(), Some("INTEGER NOT NULL"));
        assert_eq!(failure.actual.as_deref(), Some("BIGINT NOT NULL"));

        let past_end: RexNode =
            RexFieldAccess::new(correl, DataTypeField::new("b", 3, bigint)).into();
        assert!(!checker.is_valid(&past_end).unwrap());
        assert!(checker.failures()[1].message.contains("out of range"));
        assert_eq!(checker.failure_count(), 2);
    }
}

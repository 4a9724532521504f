mod common;

use common::{builder, nullable, sql_type};
use pretty_assertions::assert_eq;
use prism_rex::rex::{util, Mapping, RexPermuteInputsShuttle, RexVisitor};
use prism_rex::rex::variable::RexInputRef;
use prism_rex::types::{SqlTypeName, TypeFactory};
use prism_rex::{std_operators, Litmus, RexChecker, RexResult, RexShuttle, RexTransformer};
use rust_decimal::Decimal;

#[test]
fn test_is_true_of_nullable_boolean() -> RexResult<()> {
    let b = builder();
    let field = b.make_input_ref(nullable(&b, SqlTypeName::Boolean), 0);
    let is_true = b.make_call(&std_operators().is_true, vec![field])?;

    let out = RexTransformer::new(is_true, &b).transform_null_semantics()?;
    assert_eq!(out.digest(), "AND(IS NOT NULL($0), =($0, true))");
    Ok(())
}

#[test]
fn test_copy_round_trip() -> RexResult<()> {
    let b = builder();
    let ops = std_operators();
    let x = b.make_input_ref(nullable(&b, SqlTypeName::Double), 2);
    let tree = b.make_call(
        &ops.and,
        vec![
            b.make_call(&ops.greater_than, vec![x.clone(), b.make_approx_literal(1.5)?])?,
            b.make_call(&ops.is_not_null, vec![x])?,
        ],
    )?;
    let copy = b.copy(&tree)?;
    assert_eq!(copy.digest(), tree.digest());
    assert_eq!(copy, tree);
    Ok(())
}

#[test]
fn test_checker_reports_type_mismatch() -> RexResult<()> {
    let b = builder();
    let row = b.type_factory().create_struct_type(vec![
        ("id".to_string(), sql_type(&b, SqlTypeName::BigInt)),
        ("name".to_string(), nullable(&b, SqlTypeName::Varchar)),
    ]);
    let mut checker = RexChecker::for_row_type(&row, Litmus::Return);

    let good = b.make_input_ref_of(&row, 1)?;
    assert!(checker.is_valid(&good)?);

    let bad = b.make_input_ref(sql_type(&b, SqlTypeName::Integer), 0);
    assert!(!checker.is_valid(&bad)?);
    let failure = &checker.failures()[0];
    assert_eq!(failure.node, "$0");
    assert_eq!(failure.expected.as_deref(), Some("BIGINT NOT NULL"));
    assert_eq!(failure.actual.as_deref(), Some("INTEGER NOT NULL"));
    Ok(())
}

#[test]
fn test_permute_and_utilities() -> RexResult<()> {
    let b = builder();
    let int = sql_type(&b, SqlTypeName::Integer);
    let ops = std_operators();
    let e = b.make_call(
        &ops.plus,
        vec![b.make_input_ref(int.clone(), 0), b.make_input_ref(int.clone(), 2)],
    )?;

    let mapping = Mapping::from_targets(&[2, 1, 0], 3)?;
    let permuted = RexPermuteInputsShuttle::new(mapping, vec![]).apply(&e)?;
    assert_eq!(permuted.digest(), "+($2, $0)");
    assert_eq!(util::input_refs([&permuted]).into_iter().collect::<Vec<_>>(), vec![0, 2]);
    assert!(util::refs_below(&permuted, 3));
    assert!(!util::is_constant(&permuted));

    let shifted = util::shift_inputs(&permuted, 1)?;
    assert_eq!(shifted.digest(), "+($3, $1)");
    Ok(())
}

/// Counts the calls in a tree
struct CallCounter(usize);

impl RexVisitor for CallCounter {
    type Output = ();

    fn neutral(&mut self) {}

    fn deep(&self) -> bool {
        true
    }

    fn visit_call(&mut self, call: &prism_rex::rex::RexCall) {
        self.0 += 1;
        for operand in call.operands() {
            operand.accept(self);
        }
    }

    fn visit_input_ref(&mut self, _input_ref: &RexInputRef) {}
}

#[test]
fn test_deep_visitor_reaches_nested_calls() -> RexResult<()> {
    let b = builder();
    let ops = std_operators();
    let one = b.make_exact_literal(Decimal::ONE)?;
    let inner = b.make_call(&ops.plus, vec![one.clone(), one.clone()])?;
    let outer = b.make_call(&ops.multiply, vec![inner, one])?;

    let mut counter = CallCounter(0);
    outer.accept(&mut counter);
    assert_eq!(counter.0, 2);
    Ok(())
}

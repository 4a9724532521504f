mod common;

use common::{builder, nullable, sql_type};
use pretty_assertions::assert_eq;
use prism_rex::types::SqlTypeName;
use prism_rex::{std_operators, Datum, Environment, RexInterpreter, RexNode, RexResult};
use rust_decimal::Decimal;

fn eval(node: &RexNode) -> RexResult<Datum> {
    RexInterpreter::evaluate(node, &Environment::new())
}

#[test]
fn test_case_branches() -> RexResult<()> {
    let b = builder();
    let case = &std_operators().case;
    let lit = |v: i64| b.make_exact_literal(Decimal::from(v));

    let e = b.make_call(
        case,
        vec![b.make_bool_literal(false), lit(1)?, b.make_bool_literal(true), lit(2)?, lit(3)?],
    )?;
    assert_eq!(eval(&e)?, Datum::from(2i64));

    let e = b.make_call(
        case,
        vec![b.make_bool_literal(false), lit(1)?, b.make_bool_literal(false), lit(2)?, lit(3)?],
    )?;
    assert_eq!(eval(&e)?, Datum::from(3i64));
    Ok(())
}

#[test]
fn test_three_valued_and_or() -> RexResult<()> {
    let b = builder();
    let ops = std_operators();
    let unknown = b.make_null_literal(&sql_type(&b, SqlTypeName::Boolean))?;
    let values = [
        (b.make_bool_literal(false), Datum::Boolean(false)),
        (unknown, Datum::Null),
        (b.make_bool_literal(true), Datum::Boolean(true)),
    ];
    // FALSE < UNKNOWN < TRUE: AND is the minimum, OR the maximum
    for (i, (x, _)) in values.iter().enumerate() {
        for (j, (y, _)) in values.iter().enumerate() {
            let and = b.make_call(&ops.and, vec![x.clone(), y.clone()])?;
            let or = b.make_call(&ops.or, vec![x.clone(), y.clone()])?;
            assert_eq!(eval(&and)?, values[i.min(j)].1, "{}", and);
            assert_eq!(eval(&or)?, values[i.max(j)].1, "{}", or);
        }
    }

    let not_unknown = b.make_call(&ops.not, vec![values[1].0.clone()])?;
    assert_eq!(eval(&not_unknown)?, Datum::Null);
    let is_true = b.make_call(&ops.is_true, vec![values[1].0.clone()])?;
    assert_eq!(eval(&is_true)?, Datum::Boolean(false));
    Ok(())
}

#[test]
fn test_null_propagates_through_arithmetic() -> RexResult<()> {
    let b = builder();
    let ops = std_operators();
    let x = b.make_input_ref(nullable(&b, SqlTypeName::Integer), 0);
    let one = b.make_exact_literal(Decimal::ONE)?;

    let mut env = Environment::new();
    env.insert(x.clone(), Datum::Null);
    for op in [&ops.plus, &ops.minus, &ops.multiply, &ops.divide, &ops.modulo] {
        let e = b.make_call(op, vec![x.clone(), one.clone()])?;
        assert_eq!(RexInterpreter::evaluate(&e, &env)?, Datum::Null, "{}", e);
    }

    let lt = b.make_call(&ops.less_than, vec![x.clone(), one.clone()])?;
    assert_eq!(RexInterpreter::evaluate(&lt, &env)?, Datum::Null);

    let distinct = b.make_call(&ops.is_distinct_from, vec![x.clone(), one])?;
    assert_eq!(RexInterpreter::evaluate(&distinct, &env)?, Datum::Boolean(true));

    let coalesce = b.make_call(
        &ops.coalesce,
        vec![x, b.make_exact_literal(Decimal::from(9))?],
    )?;
    assert_eq!(RexInterpreter::evaluate(&coalesce, &env)?, Datum::from(9i64));
    Ok(())
}

#[test]
fn test_unbound_input_is_reported() {
    let b = builder();
    let x = b.make_input_ref(sql_type(&b, SqlTypeName::Integer), 0);
    let err = eval(&x).unwrap_err();
    assert!(err.is_unbound());
}

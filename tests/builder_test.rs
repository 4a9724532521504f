mod common;

use common::{builder, nullable, sql_type};
use pretty_assertions::assert_eq;
use prism_rex::rex::LiteralValue;
use prism_rex::types::{DateString, SqlTypeName, TypeFactory};
use prism_rex::{std_operators, Kind, RexBuilder, RexConfig, RexResult};
use rust_decimal::Decimal;
use std::io::Write;

#[test]
fn test_exact_literal_picks_narrowest_integer() -> RexResult<()> {
    let b = builder();

    let five = b.make_exact_literal(Decimal::from(5))?;
    assert_eq!(five.data_type().type_name(), SqlTypeName::Integer);

    let big = b.make_exact_literal(Decimal::from(5_000_000_000i64))?;
    assert_eq!(big.data_type().type_name(), SqlTypeName::BigInt);
    Ok(())
}

#[test]
fn test_boolean_casts() -> RexResult<()> {
    let b = builder();

    let zero = b.make_exact_literal(Decimal::ZERO)?;
    let cast = b.make_cast(&sql_type(&b, SqlTypeName::Boolean), zero)?;
    assert!(cast.is_literal());
    assert!(cast.is_always_false());
    assert_eq!(cast.data_type().type_name(), SqlTypeName::Boolean);

    let cast = b.make_cast(&sql_type(&b, SqlTypeName::Integer), b.make_bool_literal(true))?;
    assert_eq!(cast.kind(), Kind::Case);
    Ok(())
}

#[test]
fn test_digest_distinguishes_literal_types() -> RexResult<()> {
    let b = builder();
    let int_one = b.make_exact_literal(Decimal::ONE)?;
    let bigint_one = b.make_bigint_literal(Decimal::ONE)?;

    assert_eq!(int_one.digest(), "1");
    assert_eq!(bigint_one.digest(), "1L");
    assert_ne!(int_one, bigint_one);
    assert_eq!(int_one, b.make_exact_literal(Decimal::ONE)?);
    Ok(())
}

#[test]
fn test_digest_is_stable() -> RexResult<()> {
    let b = builder();
    let ops = std_operators();
    let x = b.make_input_ref(nullable(&b, SqlTypeName::Integer), 0);
    let call = b.make_call(&ops.plus, vec![x, b.make_exact_literal(Decimal::TEN)?])?;

    let first = call.digest().to_string();
    assert_eq!(call.digest(), first);
    assert_eq!(call.to_string(), "+($0, 10)");
    Ok(())
}

#[test]
fn test_cast_elision_is_idempotent() -> RexResult<()> {
    let b = builder();
    let targets = [
        sql_type(&b, SqlTypeName::BigInt),
        sql_type(&b, SqlTypeName::Double),
        b.type_factory()
            .create_type_with_precision_scale(SqlTypeName::Decimal, 10, 2)?,
        nullable(&b, SqlTypeName::Integer),
    ];
    let literal = b.make_exact_literal(Decimal::from(42))?;
    for target in &targets {
        let once = b.make_cast(target, literal.clone())?;
        let twice = b.make_cast(target, once.clone())?;
        assert_eq!(once.digest(), twice.digest(), "cast to {}", target);
    }
    Ok(())
}

#[test]
fn test_literal_of_type_pads_char() -> RexResult<()> {
    let b = builder();
    let char5 = b
        .type_factory()
        .create_type_with_precision(SqlTypeName::Char, 5)?;
    let lit = b.make_literal_of_type(Some(LiteralValue::from("ab")), &char5, false)?;
    assert_eq!(lit.digest(), "'ab   '");
    Ok(())
}

#[test]
fn test_date_literal_validation() {
    let err = DateString::new(2024, 2, 30).unwrap_err();
    assert!(!err.to_string().is_empty());
    assert!(DateString::parse("2024-13-01").is_err());
}

#[test]
fn test_config_from_file_drives_builder() -> RexResult<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, r#"{{"max_numeric_scale": 2, "default_charset": "UTF-16"}}"#)?;

    let config = RexConfig::from_json_file(file.path())?;
    assert_eq!(config.max_numeric_scale, 2);

    let b = RexBuilder::with_config(config);
    assert!(b.make_exact_literal(Decimal::new(12345, 3)).is_err());
    assert!(b.make_exact_literal(Decimal::new(1234, 2)).is_ok());

    let s = b.make_string_literal("x")?;
    assert_eq!(s.data_type().charset(), Some("UTF-16"));
    Ok(())
}

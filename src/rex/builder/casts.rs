//! Cast construction
//!
//! `make_cast` tries to avoid a `CAST` call: literals are retyped in place
//! when their value fits the target, and a few conversions between exact
//! numbers, booleans and intervals are expanded into plain arithmetic.

use super::RexBuilder;
use crate::common::error::RexResult;
use crate::contract_err;
use crate::operator::{std_operators, Kind};
use crate::rex::call::RexCall;
use crate::rex::literal::{value_matches_type, LiteralValue, RexLiteral};
use crate::rex::node::RexNode;
use crate::types::{DataType, SqlTypeName};
use num_traits::ToPrimitive;
use ordered_float::OrderedFloat;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

impl RexBuilder {
    /// `CAST(exp AS data_type)`, expanded where possible
    pub fn make_cast(&self, data_type: &DataType, exp: RexNode) -> RexResult<RexNode> {
        self.make_cast_match_nullability(data_type, exp, false)
    }

    /// Like [`make_cast`](Self::make_cast). With `match_nullability` a
    /// retyped literal is wrapped in a cast when the target is nullable, so
    /// the result has exactly the target type.
    pub fn make_cast_match_nullability(
        &self,
        data_type: &DataType,
        exp: RexNode,
        match_nullability: bool,
    ) -> RexResult<RexNode> {
        // Arrays are passed through
        if exp.data_type().type_name() == SqlTypeName::Array {
            return Ok(exp);
        }
        let source_type = exp.data_type().type_name();
        let target = data_type.type_name();

        if let Some(literal) = exp.as_literal() {
            if self.can_remove_cast_from_literal(data_type, literal.value(), literal.type_name()) {
                let (value, type_name) = cast_literal_value(literal, target)?;
                let retyped = self.make_literal(value, data_type.clone(), type_name)?;
                debug!(from = %exp, to = %retyped, "cast removed from literal");
                if match_nullability
                    && data_type.is_nullable()
                    && !retyped.data_type().is_nullable()
                {
                    return Ok(self.make_abstract_cast(data_type, retyped));
                }
                return Ok(retyped);
            }
        }
        if target.is_exact_numeric() && source_type.is_interval() {
            return self.make_cast_interval_to_exact(data_type, exp);
        }
        if target == SqlTypeName::Boolean && source_type.is_exact_numeric() {
            return self.make_cast_exact_to_boolean(data_type, exp);
        }
        if source_type == SqlTypeName::Boolean && target.is_exact_numeric() {
            return self.make_cast_boolean_to_exact(data_type, exp);
        }
        Ok(self.make_abstract_cast(data_type, exp))
    }

    /// Whether a literal of category `from_type_name` holding `value` can be
    /// retyped to `to_type` without a cast
    pub fn can_remove_cast_from_literal(
        &self,
        to_type: &DataType,
        value: Option<&LiteralValue>,
        from_type_name: SqlTypeName,
    ) -> bool {
        let value = match value {
            None => return true,
            Some(v) => v,
        };
        let target = to_type.type_name();
        if !value_matches_type(Some(value), target, false).unwrap_or(false) {
            return false;
        }
        if target != from_type_name && from_type_name.is_datetime() {
            return false;
        }
        let length = match value {
            LiteralValue::String(s) => s.len() as u32,
            LiteralValue::Binary(b) => b.len() as u32,
            _ => return true,
        };
        match (target, to_type.precision()) {
            (SqlTypeName::Char | SqlTypeName::Binary, Some(p)) => p == length,
            (SqlTypeName::Varchar | SqlTypeName::Json | SqlTypeName::Varbinary, Some(p)) => {
                p >= length
            }
            // Unbounded
            (_, None) => true,
            _ => false,
        }
    }

    fn make_cast_exact_to_boolean(&self, data_type: &DataType, exp: RexNode) -> RexResult<RexNode> {
        if let Some(value) = exp.as_literal().and_then(|l| l.decimal_value()) {
            return Ok(self.make_bool_literal(!value.is_zero()));
        }
        let zero = self.make_zero_literal(exp.data_type())?;
        self.make_call_with_type(data_type.clone(), &std_operators().not_equals, vec![exp, zero])
    }

    fn make_cast_boolean_to_exact(&self, data_type: &DataType, exp: RexNode) -> RexResult<RexNode> {
        let ops = std_operators();
        let target = self
            .type_factory
            .create_type_with_nullability(data_type, false);
        let casted = self.make_call(
            &ops.case,
            vec![
                exp.clone(),
                self.make_exact_literal_typed(Decimal::ONE, target.clone())?,
                self.make_zero_literal(&target)?,
            ],
        )?;
        if !exp.data_type().is_nullable() {
            return Ok(casted);
        }
        let guard = self.make_call(&ops.is_not_null, vec![exp])?;
        self.make_call_with_type(
            data_type.clone(),
            &ops.case,
            vec![guard, casted, self.make_null_literal(data_type)?],
        )
    }

    fn make_cast_interval_to_exact(
        &self,
        data_type: &DataType,
        exp: RexNode,
    ) -> RexResult<RexNode> {
        let source = exp.data_type().type_name();
        let (multiplier, divider) = interval_scale(source)?;
        let decoded = self.decode_interval_or_decimal(exp)?;
        let value = self.multiply_divide(decoded, multiplier, divider)?;
        self.ensure_type(data_type, value, false)
    }

    /// `e * (multiplier / divider)` or `e /INT (divider / multiplier)`,
    /// whichever keeps the factor integral
    pub fn multiply_divide(
        &self,
        e: RexNode,
        multiplier: Decimal,
        divider: Decimal,
    ) -> RexResult<RexNode> {
        if multiplier <= Decimal::ZERO || divider <= Decimal::ZERO {
            return Err(contract_err!(
                "multiply_divide needs positive factors, got {}/{}",
                multiplier,
                divider
            ));
        }
        let ops = std_operators();
        match multiplier.cmp(&divider) {
            std::cmp::Ordering::Equal => Ok(e),
            std::cmp::Ordering::Greater => {
                let factor = exact_ratio(multiplier, divider)?;
                self.make_call(&ops.multiply, vec![e, self.make_exact_literal(factor)?])
            }
            std::cmp::Ordering::Less => {
                let factor = exact_ratio(divider, multiplier)?;
                self.make_call(&ops.divide_integer, vec![e, self.make_exact_literal(factor)?])
            }
        }
    }

    /// Reinterpret the integer representation `value` as the decimal or
    /// interval `data_type`
    pub fn encode_interval_or_decimal(
        &self,
        value: RexNode,
        data_type: &DataType,
        check_overflow: bool,
    ) -> RexResult<RexNode> {
        let bigint = self.type_factory.create_type(SqlTypeName::BigInt)?;
        let cast = self.ensure_type(&bigint, value, true)?;
        let check = self.make_bool_literal(check_overflow);
        Ok(self.make_reinterpret_cast(data_type, cast, Some(check)))
    }

    /// Integer representation of a decimal or interval value
    pub fn decode_interval_or_decimal(&self, node: RexNode) -> RexResult<RexNode> {
        let type_name = node.data_type().type_name();
        if type_name != SqlTypeName::Decimal && !type_name.is_interval() {
            return Err(contract_err!(
                "Only decimals and intervals can be decoded, got {}",
                node.data_type()
            ));
        }
        let bigint = self.type_factory.create_type(SqlTypeName::BigInt)?;
        let bigint = self.match_nullability(&bigint, &node);
        Ok(self.make_reinterpret_cast(&bigint, node, Some(self.make_bool_literal(false))))
    }

    /// `Reinterpret(exp)`; the overflow flag is kept only when it is TRUE
    pub fn make_reinterpret_cast(
        &self,
        data_type: &DataType,
        exp: RexNode,
        check_overflow: Option<RexNode>,
    ) -> RexNode {
        let operands = match check_overflow {
            Some(flag) if flag.is_always_true() => vec![exp, flag],
            _ => vec![exp],
        };
        RexCall::new(data_type.clone(), std_operators().reinterpret.clone(), operands).into()
    }

    /// `CAST(exp AS data_type)` without any expansion
    pub fn make_abstract_cast(&self, data_type: &DataType, exp: RexNode) -> RexNode {
        RexCall::new(data_type.clone(), std_operators().cast.clone(), vec![exp]).into()
    }

    /// Cast to the NOT NULL variant of the expression's type
    pub fn make_not_null(&self, exp: RexNode) -> RexNode {
        if !exp.data_type().is_nullable() {
            return exp;
        }
        let not_null = self
            .type_factory
            .create_type_with_nullability(exp.data_type(), false);
        self.make_abstract_cast(&not_null, exp)
    }

    /// `node` as an expression of `data_type`, cast only if the types differ
    ///
    /// With `match_nullability` the target takes the node's nullability.
    /// ARRAY constructors cast each element to the component type instead.
    pub fn ensure_type(
        &self,
        data_type: &DataType,
        node: RexNode,
        match_nullability: bool,
    ) -> RexResult<RexNode> {
        let target = if match_nullability {
            self.match_nullability(data_type, &node)
        } else {
            data_type.clone()
        };
        if target.type_name() == SqlTypeName::Any
            && (!match_nullability || target.is_nullable() == node.data_type().is_nullable())
        {
            return Ok(node);
        }
        if let Some(call) = node.as_call() {
            if call.kind() == Kind::ArrayValueConstructor {
                let component = target.component_type().ok_or_else(|| {
                    contract_err!("Array constructor cannot be converted to {}", target)
                })?;
                let operands = call
                    .operands()
                    .iter()
                    .map(|o| self.make_cast(component, o.clone()))
                    .collect::<RexResult<Vec<_>>>()?;
                let data_type = call.data_type().clone();
                return Ok(RexCall::new(data_type, call.op().clone(), operands).into());
            }
        }
        if node.data_type() != &target {
            return self.make_cast(&target, node);
        }
        Ok(node)
    }

    /// `data_type` with the nullability of `value`
    pub fn match_nullability(&self, data_type: &DataType, value: &RexNode) -> DataType {
        let nullable = value.data_type().is_nullable();
        if data_type.is_nullable() == nullable {
            return data_type.clone();
        }
        self.type_factory
            .create_type_with_nullability(data_type, nullable)
    }
}

/// Multiplier and divider that convert an interval's stored value into a
/// count of its end unit
fn interval_scale(interval: SqlTypeName) -> RexResult<(Decimal, Decimal)> {
    let (start, end) = match (interval.start_unit(), interval.end_unit()) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(contract_err!("{} is not an interval type", interval)),
    };
    let base = start.base_unit();
    match (base.multiplier(), end.multiplier()) {
        (Some(multiplier), Some(divider)) => Ok((multiplier, divider)),
        _ => Err(contract_err!("{} has no fixed size", interval)),
    }
}

fn exact_ratio(numerator: Decimal, denominator: Decimal) -> RexResult<Decimal> {
    let ratio = numerator / denominator;
    if ratio * denominator != numerator || !ratio.fract().is_zero() {
        return Err(contract_err!(
            "{}/{} is not an exact integer",
            numerator,
            denominator
        ));
    }
    Ok(ratio.normalize())
}

/// Value and storage category of a literal retyped to `target`
fn cast_literal_value(
    literal: &RexLiteral,
    target: SqlTypeName,
) -> RexResult<(Option<LiteralValue>, SqlTypeName)> {
    let value = match literal.value() {
        None => return Ok((None, literal.type_name())),
        Some(v) => v.clone(),
    };
    let source = literal.type_name();
    let value = match (source, value) {
        (SqlTypeName::Interval(_), LiteralValue::Decimal(d))
            if target.is_numeric() && target != SqlTypeName::Double =>
        {
            let (multiplier, divider) = interval_scale(source)?;
            let rescaled = (d * multiplier / divider)
                .round_dp_with_strategy(0, RoundingStrategy::MidpointTowardZero);
            LiteralValue::Decimal(rescaled)
        }
        (_, value) => value,
    };
    let converted = match (target, value) {
        (t, LiteralValue::Decimal(d)) if t.is_approximate_numeric() => {
            let f = d.to_f64().ok_or_else(|| {
                contract_err!("{} cannot be represented as a double", d)
            })?;
            (LiteralValue::Double(OrderedFloat(f)), SqlTypeName::Double)
        }
        (t, LiteralValue::Double(f)) if t.is_exact_numeric() => {
            let d = Decimal::from_f64_retain(f.0)
                .ok_or_else(|| contract_err!("{} cannot be represented exactly", f.0))?;
            (LiteralValue::Decimal(d), SqlTypeName::Decimal)
        }
        (t, value @ LiteralValue::Decimal(_)) if source.is_interval() && t.is_integral() => {
            (value, SqlTypeName::BigInt)
        }
        (t, value @ LiteralValue::Decimal(_)) if source.is_interval() && t.is_exact_numeric() => {
            (value, SqlTypeName::Decimal)
        }
        (_, value) => (value, source),
    };
    Ok((Some(converted.0), converted.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IntervalQualifier, TimeUnitRange, TypeFactory};
    use pretty_assertions::assert_eq;

    fn builder() -> RexBuilder {
        RexBuilder::default()
    }

    fn nullable(b: &RexBuilder, t: &DataType) -> DataType {
        b.type_factory().create_type_with_nullability(t, true)
    }

    #[test]
    fn test_cast_of_literal_is_elided() {
        let b = builder();
        let f = b.type_factory();
        let bigint = f.create_type(SqlTypeName::BigInt).unwrap();
        let five = b.make_exact_literal(Decimal::from(5)).unwrap();
        let cast = b.make_cast(&bigint, five.clone()).unwrap();
        assert!(cast.is_literal());
        assert_eq!(cast.digest(), "5L");
        assert_ne!(cast, five);

        // Idempotent
        let again = b.make_cast(&bigint, cast.clone()).unwrap();
        assert_eq!(again, cast);

        let double = f.create_type(SqlTypeName::Double).unwrap();
        let approx = b.make_cast(&double, five).unwrap();
        assert_eq!(approx.digest(), "5E0:DOUBLE");
    }

    #[test]
    fn test_cast_of_literal_respects_string_length() {
        let b = builder();
        let f = b.type_factory();
        let bob = b.make_string_literal("Bob").unwrap();

        let char3 = f.create_type_with_precision(SqlTypeName::Char, 3).unwrap();
        assert!(b.make_cast(&char3, bob.clone()).unwrap().is_literal());

        let char5 = f.create_type_with_precision(SqlTypeName::Char, 5).unwrap();
        let cast = b.make_cast(&char5, bob.clone()).unwrap();
        assert_eq!(cast.kind(), Kind::Cast);

        let varchar10 = f.create_type_with_precision(SqlTypeName::Varchar, 10).unwrap();
        let widened = b.make_cast(&varchar10, bob.clone()).unwrap();
        assert!(widened.is_literal());
        assert_eq!(widened.digest(), "'Bob':VARCHAR(10)");

        let varchar2 = f.create_type_with_precision(SqlTypeName::Varchar, 2).unwrap();
        assert_eq!(b.make_cast(&varchar2, bob).unwrap().kind(), Kind::Cast);
    }

    #[test]
    fn test_cast_keeps_datetime_type_name() {
        let b = builder();
        let f = b.type_factory();
        let date = b
            .make_date_literal(crate::types::DateString::new(2020, 1, 1).unwrap())
            .unwrap();
        let timestamp = f.create_type(SqlTypeName::Timestamp).unwrap();
        assert_eq!(b.make_cast(&timestamp, date).unwrap().kind(), Kind::Cast);
    }

    #[test]
    fn test_match_nullability_wraps_literal() {
        let b = builder();
        let int = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let nullable_int = nullable(&b, &int);
        let one = b.make_exact_literal(Decimal::ONE).unwrap();

        let plain = b.make_cast(&nullable_int, one.clone()).unwrap();
        assert!(plain.is_literal());
        assert!(!plain.data_type().is_nullable());

        let matched = b
            .make_cast_match_nullability(&nullable_int, one, true)
            .unwrap();
        assert_eq!(matched.digest(), "CAST(1):INTEGER");
        assert_eq!(matched.data_type(), &nullable_int);
    }

    #[test]
    fn test_interval_literal_to_exact() {
        let b = builder();
        let bigint = b.type_factory().create_type(SqlTypeName::BigInt).unwrap();
        let two_days = b
            .make_interval_literal(
                Some(Decimal::from(2 * 86_400_000i64 + 43_200_000)),
                IntervalQualifier::new(TimeUnitRange::Day),
            )
            .unwrap();
        let days = b.make_cast(&bigint, two_days).unwrap();
        // 2.5 days rounds half down
        assert_eq!(days.digest(), "2L");
    }

    #[test]
    fn test_interval_literal_value_keeps_millis_for_double() {
        let b = builder();
        let two_and_a_half_days = b
            .make_interval_literal(
                Some(Decimal::from(216_000_000i64)),
                IntervalQualifier::new(TimeUnitRange::Day),
            )
            .unwrap();
        let literal = two_and_a_half_days.as_literal().unwrap();

        let (value, type_name) = cast_literal_value(literal, SqlTypeName::Double).unwrap();
        assert_eq!(value, Some(LiteralValue::Double(OrderedFloat(216_000_000.0))));
        assert_eq!(type_name, SqlTypeName::Double);

        let (value, type_name) = cast_literal_value(literal, SqlTypeName::BigInt).unwrap();
        assert_eq!(value, Some(LiteralValue::Decimal(Decimal::from(2))));
        assert_eq!(type_name, SqlTypeName::BigInt);
    }

    #[test]
    fn test_interval_expression_to_exact() {
        let b = builder();
        let f = b.type_factory();
        let interval = f
            .create_interval_type(IntervalQualifier::new(TimeUnitRange::Hour))
            .unwrap();
        let x = b.make_input_ref(interval, 0);
        let bigint = f.create_type(SqlTypeName::BigInt).unwrap();
        let hours = b.make_cast(&bigint, x).unwrap();
        assert_eq!(hours.digest(), "/INT(Reinterpret($0), 3600000)");
    }

    #[test]
    fn test_boolean_exact_casts() {
        let b = builder();
        let f = b.type_factory();
        let boolean = f.create_type(SqlTypeName::Boolean).unwrap();
        let int = f.create_type(SqlTypeName::Integer).unwrap();

        let x = b.make_input_ref(int.clone(), 0);
        assert_eq!(b.make_cast(&boolean, x).unwrap().digest(), "<>($0, 0)");

        let seven = b.make_exact_literal(Decimal::from(7)).unwrap();
        assert!(b.make_cast(&boolean, seven).unwrap().is_always_true());

        let flag = b.make_input_ref(boolean.clone(), 1);
        assert_eq!(b.make_cast(&int, flag).unwrap().digest(), "CASE($1, 1, 0)");

        let nullable_flag = b.make_input_ref(nullable(&b, &boolean), 2);
        let guarded = b.make_cast(&nullable(&b, &int), nullable_flag).unwrap();
        assert_eq!(
            guarded.digest(),
            "CASE(IS NOT NULL($2), CASE($2, 1, 0), null:INTEGER)"
        );
    }

    #[test]
    fn test_multiply_divide() {
        let b = builder();
        let bigint = b.type_factory().create_type(SqlTypeName::BigInt).unwrap();
        let x = b.make_input_ref(bigint, 0);
        let same = b
            .multiply_divide(x.clone(), Decimal::from(10), Decimal::from(10))
            .unwrap();
        assert!(same.ptr_eq(&x));
        assert_eq!(
            b.multiply_divide(x.clone(), Decimal::from(1000), Decimal::from(10))
                .unwrap()
                .digest(),
            "*($0, 100)"
        );
        assert_eq!(
            b.multiply_divide(x.clone(), Decimal::from(10), Decimal::from(1000))
                .unwrap()
                .digest(),
            "/INT($0, 100)"
        );
        let err = b
            .multiply_divide(x, Decimal::from(10), Decimal::from(3))
            .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_reinterpret_keeps_only_true_overflow_flag() {
        let b = builder();
        let f = b.type_factory();
        let decimal = f
            .create_type_with_precision_scale(SqlTypeName::Decimal, 10, 2)
            .unwrap();
        let x = b.make_input_ref(decimal.clone(), 0);
        let decoded = b.decode_interval_or_decimal(x).unwrap();
        assert_eq!(decoded.operands().len(), 1);
        let encoded = b.encode_interval_or_decimal(decoded, &decimal, true).unwrap();
        assert_eq!(encoded.digest(), "Reinterpret(Reinterpret($0), true)");

        let int = f.create_type(SqlTypeName::Integer).unwrap();
        let y = b.make_input_ref(int, 1);
        assert!(b.decode_interval_or_decimal(y).unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_ensure_type() {
        let b = builder();
        let f = b.type_factory();
        let int = f.create_type(SqlTypeName::Integer).unwrap();
        let bigint = f.create_type(SqlTypeName::BigInt).unwrap();
        let x = b.make_input_ref(int.clone(), 0);

        assert!(b.ensure_type(&int, x.clone(), true).unwrap().ptr_eq(&x));
        let nullable_int = nullable(&b, &int);
        assert!(b.ensure_type(&nullable_int, x.clone(), true).unwrap().ptr_eq(&x));
        assert_eq!(
            b.ensure_type(&bigint, x.clone(), true).unwrap().digest(),
            "CAST($0):BIGINT NOT NULL"
        );

        let any = f.create_type(SqlTypeName::Any).unwrap();
        assert!(b.ensure_type(&any, x.clone(), false).unwrap().ptr_eq(&x));

        let array = b
            .make_call(&std_operators().array_value_constructor, vec![x])
            .unwrap();
        let double_array = f.create_array_type(f.create_type(SqlTypeName::Double).unwrap());
        let converted = b.ensure_type(&double_array, array, false).unwrap();
        assert_eq!(converted.digest(), "ARRAY(CAST($0):DOUBLE NOT NULL)");
    }

    #[test]
    fn test_make_not_null() {
        let b = builder();
        let int = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let x = b.make_input_ref(int.clone(), 0);
        assert!(b.make_not_null(x.clone()).ptr_eq(&x));
        let y = b.make_input_ref(nullable(&b, &int), 1);
        assert_eq!(b.make_not_null(y).digest(), "CAST($1):INTEGER NOT NULL");
    }
}

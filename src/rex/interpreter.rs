//! Constant interpreter for row expressions
//!
//! Evaluates literals, nodes bound in an environment and calls to a fixed
//! set of operators, with SQL three-valued logic. Anything else is
//! [`RexError::Unbound`]: constant folding should leave such an expression
//! as it is.

use crate::common::error::{RexError, RexResult};
use crate::operator::Kind;
use crate::rex::call::RexCall;
use crate::rex::datum::Datum;
use crate::rex::node::RexNode;
use crate::types::{SqlTypeName, Symbol, TimeUnit};
use crate::unbound_err;
use ahash::AHashMap;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Values of nodes the interpreter cannot compute itself, such as input refs
pub type Environment = AHashMap<RexNode, Datum>;

/// SQL truth value, ordered so that AND is the minimum and OR the maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Truth {
    False,
    Unknown,
    True,
}

impl Truth {
    fn of(datum: &Datum) -> RexResult<Truth> {
        match datum {
            Datum::Null => Ok(Truth::Unknown),
            Datum::Boolean(true) => Ok(Truth::True),
            Datum::Boolean(false) => Ok(Truth::False),
            other => Err(unbound_err!("{} is not a truth value", other)),
        }
    }

    fn to_datum(self) -> Datum {
        match self {
            Truth::True => Datum::Boolean(true),
            Truth::False => Datum::Boolean(false),
            Truth::Unknown => Datum::Null,
        }
    }
}

/// Evaluates expressions against an [`Environment`]
pub struct RexInterpreter<'a> {
    environment: &'a Environment,
}

impl<'a> RexInterpreter<'a> {
    pub fn new(environment: &'a Environment) -> Self {
        Self { environment }
    }

    /// Value of `node`, or an unbound error when it cannot be computed
    pub fn evaluate(node: &RexNode, environment: &Environment) -> RexResult<Datum> {
        RexInterpreter::new(environment).eval(node)
    }

    pub fn eval(&self, node: &RexNode) -> RexResult<Datum> {
        if let Some(value) = self.environment.get(node) {
            return Ok(value.clone());
        }
        let result = match node {
            RexNode::Literal(literal) => {
                Ok(literal.value().map(Datum::from).unwrap_or(Datum::Null))
            }
            RexNode::Call(call) => self.eval_call(call),
            other => Err(unbound_err!("No value for {}", other)),
        };
        if let Err(err) = &result {
            if err.is_unbound() {
                debug!(node = %node, error = %err, "expression is not interpretable");
            }
        }
        result
    }

    fn eval_all(&self, operands: &[RexNode]) -> RexResult<Vec<Datum>> {
        operands.iter().map(|o| self.eval(o)).collect()
    }

    fn eval_call(&self, call: &RexCall) -> RexResult<Datum> {
        let kind = call.kind();
        match kind {
            Kind::And | Kind::Or => {
                let mut result = if kind == Kind::And {
                    Truth::True
                } else {
                    Truth::False
                };
                for operand in call.operands() {
                    let truth = Truth::of(&self.eval(operand)?)?;
                    result = if kind == Kind::And {
                        result.min(truth)
                    } else {
                        result.max(truth)
                    };
                }
                Ok(result.to_datum())
            }
            Kind::Not => {
                let truth = Truth::of(&self.eval(operand(call, 0)?)?)?;
                Ok(match truth {
                    Truth::True => Datum::Boolean(false),
                    Truth::False => Datum::Boolean(true),
                    Truth::Unknown => Datum::Null,
                })
            }
            Kind::IsNull | Kind::IsNotNull => {
                let is_null = self.eval(operand(call, 0)?)?.is_null();
                Ok(Datum::Boolean(is_null == (kind == Kind::IsNull)))
            }
            Kind::IsTrue | Kind::IsNotTrue | Kind::IsFalse | Kind::IsNotFalse => {
                let value = self.eval(operand(call, 0)?)?;
                let result = match kind {
                    Kind::IsTrue => value == Datum::Boolean(true),
                    Kind::IsNotTrue => value != Datum::Boolean(true),
                    Kind::IsFalse => value == Datum::Boolean(false),
                    _ => value != Datum::Boolean(false),
                };
                Ok(Datum::Boolean(result))
            }
            Kind::Equals => self.compare(call, |o| o == Ordering::Equal),
            Kind::NotEquals => self.compare(call, |o| o != Ordering::Equal),
            Kind::GreaterThan => self.compare(call, |o| o == Ordering::Greater),
            Kind::GreaterThanOrEqual => self.compare(call, |o| o != Ordering::Less),
            Kind::LessThan => self.compare(call, |o| o == Ordering::Less),
            Kind::LessThanOrEqual => self.compare(call, |o| o != Ordering::Greater),
            Kind::IsDistinctFrom | Kind::IsNotDistinctFrom => {
                let values = self.eval_all(call.operands())?;
                let distinct = match &values[..] {
                    [Datum::Null, Datum::Null] => false,
                    [Datum::Null, _] | [_, Datum::Null] => true,
                    [a, b] => match coerce(a, b) {
                        Some((a, b)) => a.compare(&b) != Some(Ordering::Equal),
                        None => true,
                    },
                    _ => return Err(unbound_err!("{} expects two operands", call.op().name())),
                };
                Ok(Datum::Boolean(distinct == (kind == Kind::IsDistinctFrom)))
            }
            Kind::PlusPrefix => self.eval(operand(call, 0)?),
            Kind::MinusPrefix => match self.eval(operand(call, 0)?)? {
                Datum::Null => Ok(Datum::Null),
                Datum::Decimal(d) => Ok(Datum::Decimal(-d)),
                Datum::Double(f) => Ok(Datum::Double(-f)),
                other => Err(unbound_err!("Cannot negate {}", other)),
            },
            Kind::Plus
            | Kind::Minus
            | Kind::Times
            | Kind::Divide
            | Kind::DivideInteger
            | Kind::Mod => {
                let values = self.eval_all(call.operands())?;
                arithmetic(kind, &values)
            }
            Kind::Case => self.case(call),
            Kind::Coalesce => {
                for operand in call.operands() {
                    let value = self.eval(operand)?;
                    if !value.is_null() {
                        return Ok(value);
                    }
                }
                Ok(Datum::Null)
            }
            // The type-level conversion was checked when the cast was built
            Kind::Cast => self.eval(operand(call, 0)?),
            Kind::Ceil | Kind::Floor => self.ceil_floor(call, kind == Kind::Ceil),
            Kind::Extract => self.extract(call),
            _ => Err(unbound_err!("Operator {} is not interpretable", call.op().name())),
        }
    }

    fn compare(&self, call: &RexCall, test: impl Fn(Ordering) -> bool) -> RexResult<Datum> {
        let values = self.eval_all(call.operands())?;
        let (a, b) = match &values[..] {
            [a, b] => (a, b),
            _ => return Err(unbound_err!("{} expects two operands", call.op().name())),
        };
        if a.is_null() || b.is_null() {
            return Ok(Datum::Null);
        }
        // A string that is not a number never compares to a number
        let (a, b) = match coerce(a, b) {
            Some(pair) => pair,
            None => return Ok(Datum::Boolean(false)),
        };
        match a.compare(&b) {
            Some(ordering) => Ok(Datum::Boolean(test(ordering))),
            None => Err(unbound_err!("Cannot compare {} with {}", a, b)),
        }
    }

    fn case(&self, call: &RexCall) -> RexResult<Datum> {
        let operands = call.operands();
        let (pairs, otherwise) = if operands.len() % 2 == 0 {
            (operands, None)
        } else {
            (&operands[..operands.len() - 1], operands.last())
        };
        for pair in pairs.chunks(2) {
            if self.eval(&pair[0])? == Datum::Boolean(true) {
                return self.eval(&pair[1]);
            }
        }
        match otherwise {
            Some(node) => self.eval(node),
            None => Ok(Datum::Null),
        }
    }

    fn ceil_floor(&self, call: &RexCall, ceil: bool) -> RexResult<Datum> {
        let value = self.eval(operand(call, 0)?)?;
        if call.operands().len() == 1 {
            return match value {
                Datum::Null => Ok(Datum::Null),
                Datum::Decimal(d) => Ok(Datum::Decimal(if ceil { d.ceil() } else { d.floor() })),
                Datum::Double(f) => Ok(Datum::Double(if ceil { f.ceil() } else { f.floor() })),
                other => Err(unbound_err!("Cannot round {}", other)),
            };
        }
        let unit = time_unit(&self.eval(operand(call, 1)?)?)?;
        let v = match value.as_i64() {
            Some(v) => v,
            None if value.is_null() => return Ok(Datum::Null),
            None => return Err(unbound_err!("Cannot truncate {}", value)),
        };
        let type_name = operand(call, 0)?.data_type().type_name();
        let result = match type_name {
            SqlTypeName::Date => {
                if !is_calendar_unit(unit) && unit != TimeUnit::Day {
                    v
                } else {
                    round_millis(days_to_millis(v)?, unit, ceil)? / MILLIS_PER_DAY
                }
            }
            SqlTypeName::Time | SqlTypeName::TimeWithLocalTimeZone => {
                if is_calendar_unit(unit) {
                    v
                } else {
                    round_millis(v, unit, ceil)?
                }
            }
            _ => round_millis(v, unit, ceil)?,
        };
        Ok(Datum::from(result))
    }

    fn extract(&self, call: &RexCall) -> RexResult<Datum> {
        let unit = time_unit(&self.eval(operand(call, 0)?)?)?;
        let value = self.eval(operand(call, 1)?)?;
        let v = match value.as_i64() {
            Some(v) => v,
            None if value.is_null() => return Ok(Datum::Null),
            None => return Err(unbound_err!("Cannot extract from {}", value)),
        };
        let millis = match operand(call, 1)?.data_type().type_name() {
            SqlTypeName::Date => days_to_millis(v)?,
            SqlTypeName::Time | SqlTypeName::TimeWithLocalTimeZone if is_calendar_unit(unit) => {
                return Err(unbound_err!("Cannot extract {} from a time", unit))
            }
            _ => v,
        };
        let dt = to_datetime(millis)?;
        let field = match unit {
            TimeUnit::Year => dt.year() as i64,
            TimeUnit::Quarter => ((dt.month() - 1) / 3 + 1) as i64,
            TimeUnit::Month => dt.month() as i64,
            TimeUnit::Week => dt.iso_week().week() as i64,
            TimeUnit::Day => dt.day() as i64,
            TimeUnit::Dow => dt.weekday().num_days_from_sunday() as i64 + 1,
            TimeUnit::Doy => dt.ordinal() as i64,
            TimeUnit::Hour => dt.hour() as i64,
            TimeUnit::Minute => dt.minute() as i64,
            TimeUnit::Second => dt.second() as i64,
            other => return Err(unbound_err!("Cannot extract {}", other)),
        };
        Ok(Datum::from(field))
    }
}

fn operand(call: &RexCall, i: usize) -> RexResult<&RexNode> {
    call.operand(i)
        .ok_or_else(|| unbound_err!("{} has no operand {}", call.op().name(), i))
}

/// Numeric-looking strings are compared as numbers. `None` when one side is
/// a number and the other a string that does not parse.
fn coerce(a: &Datum, b: &Datum) -> Option<(Datum, Datum)> {
    match (a, b) {
        (Datum::String(s), n) if n.is_numeric() => {
            Some((Datum::Decimal(Decimal::from_str(s.trim()).ok()?), n.clone()))
        }
        (n, Datum::String(s)) if n.is_numeric() => {
            Some((n.clone(), Datum::Decimal(Decimal::from_str(s.trim()).ok()?)))
        }
        _ => Some((a.clone(), b.clone())),
    }
}

fn arithmetic(kind: Kind, values: &[Datum]) -> RexResult<Datum> {
    let (a, b) = match values {
        [a, b] => (a, b),
        _ => return Err(unbound_err!("{:?} expects two operands", kind)),
    };
    if a.is_null() || b.is_null() {
        return Ok(Datum::Null);
    }
    if let (Datum::Decimal(x), Datum::Decimal(y)) = (a, b) {
        let (x, y) = (*x, *y);
        let result = match kind {
            Kind::Plus => x.checked_add(y),
            Kind::Minus => x.checked_sub(y),
            Kind::Times => x.checked_mul(y),
            _ if y.is_zero() => return Ok(Datum::Null),
            Kind::Divide => x.checked_div(y),
            Kind::DivideInteger => x.checked_div(y).map(|q| q.trunc()),
            _ => x.checked_rem(y),
        };
        return result
            .map(Datum::Decimal)
            .ok_or_else(|| RexError::InvalidArgument(format!("Numeric overflow in {:?}", kind)));
    }
    let (x, y) = match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(unbound_err!("Cannot apply {:?} to {} and {}", kind, a, b)),
    };
    let result = match kind {
        Kind::Plus => x + y,
        Kind::Minus => x - y,
        Kind::Times => x * y,
        _ if y == 0.0 => return Ok(Datum::Null),
        Kind::Divide => x / y,
        Kind::DivideInteger => (x / y).trunc(),
        _ => x % y,
    };
    Ok(Datum::Double(result))
}

fn time_unit(flag: &Datum) -> RexResult<TimeUnit> {
    match flag {
        Datum::Symbol(Symbol::TimeUnit(range)) => Ok(range.start_unit()),
        other => Err(unbound_err!("{} is not a time unit", other)),
    }
}

fn is_calendar_unit(unit: TimeUnit) -> bool {
    matches!(
        unit,
        TimeUnit::Year | TimeUnit::Quarter | TimeUnit::Month | TimeUnit::Week
    )
}

fn days_to_millis(days: i64) -> RexResult<i64> {
    days.checked_mul(MILLIS_PER_DAY)
        .ok_or_else(|| unbound_err!("Date out of range: {} days", days))
}

fn to_datetime(millis: i64) -> RexResult<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| unbound_err!("Timestamp out of range: {}", millis))
}

fn start_of_day(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

fn calendar_months(unit: TimeUnit) -> Option<u32> {
    match unit {
        TimeUnit::Year => Some(12),
        TimeUnit::Quarter => Some(3),
        TimeUnit::Month => Some(1),
        _ => None,
    }
}

fn unit_millis(unit: TimeUnit) -> Option<i64> {
    match unit {
        TimeUnit::Week => Some(Duration::days(7).num_milliseconds()),
        TimeUnit::Day
        | TimeUnit::Hour
        | TimeUnit::Minute
        | TimeUnit::Second
        | TimeUnit::Millisecond => {
            unit.multiplier().and_then(|m| m.to_i64())
        }
        _ => None,
    }
}

fn floor_millis(millis: i64, unit: TimeUnit) -> RexResult<i64> {
    let dt = to_datetime(millis)?;
    let out_of_range = || unbound_err!("Cannot round {} to {}", millis, unit);
    if let Some(months) = calendar_months(unit) {
        let month = (dt.month() - 1) / months * months + 1;
        let first = NaiveDate::from_ymd_opt(dt.year(), month, 1).ok_or_else(out_of_range)?;
        return Ok(start_of_day(first));
    }
    if unit == TimeUnit::Week {
        // Weeks start on Sunday
        let back = dt.weekday().num_days_from_sunday() as i64;
        let day = dt
            .date()
            .checked_sub_signed(Duration::days(back))
            .ok_or_else(out_of_range)?;
        return Ok(start_of_day(day));
    }
    let size = unit_millis(unit).ok_or_else(|| unbound_err!("Cannot round to {}", unit))?;
    Ok(millis - millis.rem_euclid(size))
}

/// Truncate a timestamp to `unit`, or round it up when `ceil` is set
fn round_millis(millis: i64, unit: TimeUnit, ceil: bool) -> RexResult<i64> {
    let floor = floor_millis(millis, unit)?;
    if !ceil || floor == millis {
        return Ok(floor);
    }
    let next = match calendar_months(unit) {
        Some(months) => to_datetime(floor)?
            .date()
            .checked_add_months(Months::new(months))
            .map(start_of_day),
        None => unit_millis(unit).and_then(|size| floor.checked_add(size)),
    };
    next.ok_or_else(|| unbound_err!("Cannot round {} up to {}", millis, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::std_operators;
    use crate::rex::builder::RexBuilder;
    use crate::types::{DateString, TimeUnitRange, TimestampString, TypeFactory};

    fn eval(node: &RexNode) -> RexResult<Datum> {
        RexInterpreter::evaluate(node, &Environment::new())
    }

    fn int(b: &RexBuilder, v: i64) -> RexNode {
        b.make_exact_literal(Decimal::from(v)).unwrap()
    }

    #[test]
    fn test_case_takes_first_true_branch() {
        let b = RexBuilder::default();
        let case = &std_operators().case;
        let f = b.make_bool_literal(false);
        let t = b.make_bool_literal(true);

        let e = b
            .make_call(case, vec![f.clone(), int(&b, 1), t, int(&b, 2), int(&b, 3)])
            .unwrap();
        assert_eq!(eval(&e).unwrap(), Datum::from(2i64));

        let e = b
            .make_call(case, vec![f.clone(), int(&b, 1), f, int(&b, 2), int(&b, 3)])
            .unwrap();
        assert_eq!(eval(&e).unwrap(), Datum::from(3i64));
    }

    #[test]
    fn test_environment_binds_inputs() {
        let b = RexBuilder::default();
        let int_type = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let x = b.make_input_ref(int_type, 0);
        let sum = b
            .make_call(&std_operators().plus, vec![x.clone(), int(&b, 2)])
            .unwrap();

        let mut env = Environment::new();
        env.insert(x.clone(), Datum::from(40i64));
        assert_eq!(RexInterpreter::evaluate(&sum, &env).unwrap(), Datum::from(42i64));

        let err = eval(&sum).unwrap_err();
        assert!(err.is_unbound());
    }

    #[test]
    fn test_division_by_zero_is_null() {
        let b = RexBuilder::default();
        let ops = std_operators();
        for op in [&ops.divide, &ops.divide_integer, &ops.modulo] {
            let e = b.make_call(op, vec![int(&b, 7), int(&b, 0)]).unwrap();
            assert_eq!(eval(&e).unwrap(), Datum::Null);
        }
        let e = b
            .make_call(&ops.divide_integer, vec![int(&b, 7), int(&b, 2)])
            .unwrap();
        assert_eq!(eval(&e).unwrap(), Datum::from(3i64));
    }

    #[test]
    fn test_string_number_comparison() {
        let b = RexBuilder::default();
        let ops = std_operators();
        let five = b.make_string_literal("5").unwrap();
        let abc = b.make_string_literal("abc").unwrap();
        let e = b
            .make_call_with_type(
                b.type_factory().create_type(SqlTypeName::Boolean).unwrap(),
                &ops.equals,
                vec![five, int(&b, 5)],
            )
            .unwrap();
        assert_eq!(eval(&e).unwrap(), Datum::Boolean(true));
        let e = b
            .make_call_with_type(
                b.type_factory().create_type(SqlTypeName::Boolean).unwrap(),
                &ops.less_than,
                vec![abc, int(&b, 5)],
            )
            .unwrap();
        assert_eq!(eval(&e).unwrap(), Datum::Boolean(false));
    }

    #[test]
    fn test_unsupported_operator_is_unbound() {
        let b = RexBuilder::default();
        let e = b
            .make_call(&std_operators().array_value_constructor, vec![int(&b, 1)])
            .unwrap();
        assert!(eval(&e).unwrap_err().is_unbound());
    }

    #[test]
    fn test_floor_and_ceil_timestamps() {
        let b = RexBuilder::default();
        let ops = std_operators();
        let ts = b
            .make_timestamp_literal(TimestampString::parse("2024-05-17 13:45:10").unwrap(), 0)
            .unwrap();
        let expect = |s: &str| {
            Datum::from(TimestampString::parse(s).unwrap().millis_since_epoch())
        };
        let cases = [
            (TimeUnitRange::Year, false, "2024-01-01 00:00:00"),
            (TimeUnitRange::Year, true, "2025-01-01 00:00:00"),
            (TimeUnitRange::Quarter, false, "2024-04-01 00:00:00"),
            (TimeUnitRange::Month, true, "2024-06-01 00:00:00"),
            (TimeUnitRange::Week, false, "2024-05-12 00:00:00"),
            (TimeUnitRange::Day, false, "2024-05-17 00:00:00"),
            (TimeUnitRange::Hour, true, "2024-05-17 14:00:00"),
            (TimeUnitRange::Minute, false, "2024-05-17 13:45:00"),
        ];
        for (unit, ceil, expected) in cases {
            let op = if ceil { &ops.ceil } else { &ops.floor };
            let e = b
                .make_call(op, vec![ts.clone(), b.make_interval_flag(unit).unwrap()])
                .unwrap();
            assert_eq!(eval(&e).unwrap(), expect(expected), "{} {:?}", e, unit);
        }
    }

    #[test]
    fn test_ceil_of_exact_boundary_is_unchanged() {
        let b = RexBuilder::default();
        let ts = b
            .make_timestamp_literal(TimestampString::parse("2024-01-01 00:00:00").unwrap(), 0)
            .unwrap();
        let e = b
            .make_call(
                &std_operators().ceil,
                vec![ts, b.make_interval_flag(TimeUnitRange::Year).unwrap()],
            )
            .unwrap();
        assert_eq!(
            eval(&e).unwrap(),
            Datum::from(TimestampString::parse("2024-01-01 00:00:00").unwrap().millis_since_epoch())
        );
    }

    #[test]
    fn test_extract_from_date() {
        let b = RexBuilder::default();
        let date = b
            .make_date_literal(DateString::new(2024, 5, 17).unwrap())
            .unwrap();
        let extract = |unit| {
            let e = b
                .make_call(
                    &std_operators().extract,
                    vec![b.make_interval_flag(unit).unwrap(), date.clone()],
                )
                .unwrap();
            eval(&e).unwrap()
        };
        assert_eq!(extract(TimeUnitRange::Year), Datum::from(2024i64));
        assert_eq!(extract(TimeUnitRange::Quarter), Datum::from(2i64));
        assert_eq!(extract(TimeUnitRange::Month), Datum::from(5i64));
        assert_eq!(extract(TimeUnitRange::Day), Datum::from(17i64));
        // A Friday
        assert_eq!(extract(TimeUnitRange::Dow), Datum::from(6i64));
        assert_eq!(extract(TimeUnitRange::Doy), Datum::from(138i64));
    }

    #[test]
    fn test_date_far_out_of_range_is_an_error() {
        let b = RexBuilder::default();
        let ops = std_operators();
        let date_type = b.type_factory().create_type(SqlTypeName::Date).unwrap();
        let day = b.make_input_ref(date_type, 0);
        let mut env = Environment::new();
        env.insert(day.clone(), Datum::from(i64::MAX));

        let year = || b.make_interval_flag(TimeUnitRange::Year).unwrap();
        let extract = b.make_call(&ops.extract, vec![year(), day.clone()]).unwrap();
        let floor = b.make_call(&ops.floor, vec![day, year()]).unwrap();
        for e in [extract, floor] {
            let err = RexInterpreter::evaluate(&e, &env).unwrap_err();
            assert!(err.is_unbound(), "{}", e);
        }
    }
}

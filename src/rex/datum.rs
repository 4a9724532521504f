//! Runtime values produced by the interpreter

use crate::rex::literal::LiteralValue;
use crate::types::{ByteString, Symbol};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;

/// A value of the interpreter
///
/// Dates are days since the epoch, times milliseconds of the day and
/// timestamps milliseconds since the epoch, all held as `Decimal`.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Boolean(bool),
    Decimal(Decimal),
    Double(f64),
    String(String),
    Binary(ByteString),
    Symbol(Symbol),
    List(Vec<Datum>),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Datum::Decimal(_) | Datum::Double(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Datum::Decimal(d) => Some(*d),
            Datum::Double(f) => Decimal::from_f64_retain(*f),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Decimal(d) => d.to_f64(),
            Datum::Double(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Decimal(d) => d.to_i64(),
            Datum::Double(f) => f.to_i64(),
            _ => None,
        }
    }

    /// Ordering between two non-null values of the same family
    pub fn compare(&self, other: &Datum) -> Option<Ordering> {
        match (self, other) {
            (Datum::Decimal(a), Datum::Decimal(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Datum::Boolean(a), Datum::Boolean(b)) => Some(a.cmp(b)),
            (Datum::String(a), Datum::String(b)) => Some(a.cmp(b)),
            (Datum::Binary(a), Datum::Binary(b)) => Some(a.cmp(b)),
            (Datum::Symbol(a), Datum::Symbol(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&LiteralValue> for Datum {
    fn from(value: &LiteralValue) -> Self {
        match value {
            LiteralValue::Boolean(b) => Datum::Boolean(*b),
            LiteralValue::Decimal(d) => Datum::Decimal(*d),
            LiteralValue::Double(f) => Datum::Double(f.0),
            LiteralValue::String(s) => Datum::String(s.value().to_string()),
            LiteralValue::Binary(b) => Datum::Binary(b.clone()),
            LiteralValue::Date(d) => Datum::Decimal(Decimal::from(d.days_since_epoch())),
            LiteralValue::Time(t) => Datum::Decimal(Decimal::from(t.millis_of_day())),
            LiteralValue::Timestamp(ts) => Datum::Decimal(Decimal::from(ts.millis_since_epoch())),
            LiteralValue::Symbol(s) => Datum::Symbol(s.clone()),
            LiteralValue::List(items) => Datum::List(
                items
                    .iter()
                    .map(|item| item.value().map(Datum::from).unwrap_or(Datum::Null))
                    .collect(),
            ),
            LiteralValue::Map(entries) => Datum::List(
                entries
                    .iter()
                    .map(|(k, v)| {
                        Datum::List(vec![
                            k.value().map(Datum::from).unwrap_or(Datum::Null),
                            v.value().map(Datum::from).unwrap_or(Datum::Null),
                        ])
                    })
                    .collect(),
            ),
            LiteralValue::Graph(g) => Datum::String(g.to_string()),
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Boolean(b)
    }
}

impl From<Decimal> for Datum {
    fn from(d: Decimal) -> Self {
        Datum::Decimal(d)
    }
}

impl From<i64> for Datum {
    fn from(i: i64) -> Self {
        Datum::Decimal(Decimal::from(i))
    }
}

impl From<f64> for Datum {
    fn from(f: f64) -> Self {
        Datum::Double(f)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("NULL"),
            Datum::Boolean(b) => write!(f, "{}", b),
            Datum::Decimal(d) => write!(f, "{}", d),
            Datum::Double(d) => write!(f, "{}", d),
            Datum::String(s) => write!(f, "'{}'", s),
            Datum::Binary(b) => write!(f, "X'{}'", b),
            Datum::Symbol(s) => write!(f, "{}", s),
            Datum::List(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateString, TimestampString};

    #[test]
    fn test_datetime_literals_become_numbers() {
        let date = DateString::new(1970, 1, 11).unwrap();
        assert_eq!(Datum::from(&LiteralValue::Date(date)), Datum::from(10i64));

        let ts = TimestampString::parse("1970-01-01 00:00:01.5").unwrap();
        assert_eq!(
            Datum::from(&LiteralValue::Timestamp(ts)),
            Datum::from(1500i64)
        );
    }

    #[test]
    fn test_compare_mixes_exact_and_approximate() {
        let one = Datum::from(Decimal::ONE);
        let half = Datum::from(0.5);
        assert_eq!(one.compare(&half), Some(Ordering::Greater));
        assert_eq!(one.compare(&Datum::from("1")), None);
    }
}

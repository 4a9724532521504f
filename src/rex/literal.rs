//! Literals and their digests
//!
//! A literal holds an optional value (absent means SQL NULL), its data type
//! and a storage category (`type_name`). The category decides which value
//! shape is legal: exact numbers are always stored as DECIMAL, strings as
//! CHAR and binaries as BINARY, whatever the declared type is.

use crate::common::error::{RexError, RexResult};
use crate::rex::digest::{self, DigestIncludeType};
use crate::types::{
    ByteString, DataType, DateString, GraphValue, NlsString, SqlTypeName, Symbol, TimeString,
    TimeUnitRange, TimestampString,
};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// The value of a non-null literal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Boolean(bool),
    /// Exact numbers and intervals (months or milliseconds)
    Decimal(Decimal),
    Double(OrderedFloat<f64>),
    String(NlsString),
    Binary(ByteString),
    Date(DateString),
    Time(TimeString),
    Timestamp(TimestampString),
    Symbol(Symbol),
    /// ARRAY, MULTISET and ROW values
    List(Vec<RexLiteral>),
    Map(Vec<(RexLiteral, RexLiteral)>),
    Graph(GraphValue),
}

impl LiteralValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, LiteralValue::Decimal(_) | LiteralValue::Double(_))
    }

    /// Numeric value as a decimal, if it has one
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            LiteralValue::Decimal(d) => Some(*d),
            LiteralValue::Double(f) => Decimal::from_f64_retain(f.0),
            _ => None,
        }
    }

    /// Numeric value as a double, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        use num_traits::ToPrimitive;
        match self {
            LiteralValue::Decimal(d) => d.to_f64(),
            LiteralValue::Double(f) => Some(f.0),
            _ => None,
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl From<Decimal> for LiteralValue {
    fn from(d: Decimal) -> Self {
        LiteralValue::Decimal(d)
    }
}

impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self {
        LiteralValue::Decimal(Decimal::from(i))
    }
}

impl From<f64> for LiteralValue {
    fn from(f: f64) -> Self {
        LiteralValue::Double(OrderedFloat(f))
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(NlsString::new(s))
    }
}

impl From<NlsString> for LiteralValue {
    fn from(s: NlsString) -> Self {
        LiteralValue::String(s)
    }
}

impl From<ByteString> for LiteralValue {
    fn from(b: ByteString) -> Self {
        LiteralValue::Binary(b)
    }
}

impl From<DateString> for LiteralValue {
    fn from(d: DateString) -> Self {
        LiteralValue::Date(d)
    }
}

impl From<TimeString> for LiteralValue {
    fn from(t: TimeString) -> Self {
        LiteralValue::Time(t)
    }
}

impl From<TimestampString> for LiteralValue {
    fn from(ts: TimestampString) -> Self {
        LiteralValue::Timestamp(ts)
    }
}

impl From<Symbol> for LiteralValue {
    fn from(s: Symbol) -> Self {
        LiteralValue::Symbol(s)
    }
}

impl From<TimeUnitRange> for LiteralValue {
    fn from(range: TimeUnitRange) -> Self {
        LiteralValue::Symbol(Symbol::TimeUnit(range))
    }
}

/// Whether `value` is a legal value for the storage category `type_name`
///
/// In strict mode the categories INTEGER, SMALLINT, TINYINT, VARCHAR and
/// VARBINARY are errors: literals store those values as DECIMAL, CHAR and
/// BINARY. The lenient mode answers for cast targets.
pub fn value_matches_type(
    value: Option<&LiteralValue>,
    type_name: SqlTypeName,
    strict: bool,
) -> RexResult<bool> {
    let value = match value {
        None => return Ok(true),
        Some(v) => v,
    };
    let reject = || {
        Err(RexError::TypeConsistency(format!(
            "{} is not a valid literal category",
            type_name
        )))
    };
    let matches = match type_name {
        SqlTypeName::Boolean => matches!(value, LiteralValue::Boolean(_)),
        // A NULL literal never carries a value
        SqlTypeName::Null => false,
        SqlTypeName::Integer | SqlTypeName::TinyInt | SqlTypeName::SmallInt => {
            if strict {
                return reject();
            }
            value.is_numeric()
        }
        SqlTypeName::Decimal | SqlTypeName::BigInt => {
            if strict {
                matches!(value, LiteralValue::Decimal(_))
            } else {
                value.is_numeric()
            }
        }
        SqlTypeName::Double | SqlTypeName::Float | SqlTypeName::Real => {
            if strict {
                matches!(value, LiteralValue::Double(_))
            } else {
                value.is_numeric()
            }
        }
        SqlTypeName::Date => matches!(value, LiteralValue::Date(_)),
        SqlTypeName::Time | SqlTypeName::TimeWithLocalTimeZone => {
            matches!(value, LiteralValue::Time(_))
        }
        SqlTypeName::Timestamp | SqlTypeName::TimestampWithLocalTimeZone => {
            matches!(value, LiteralValue::Timestamp(_))
        }
        SqlTypeName::Interval(_) => matches!(value, LiteralValue::Decimal(_)),
        SqlTypeName::Varbinary | SqlTypeName::Binary => {
            if strict && type_name == SqlTypeName::Varbinary {
                return reject();
            }
            matches!(value, LiteralValue::Binary(_))
        }
        SqlTypeName::Varchar | SqlTypeName::Json | SqlTypeName::Char => {
            if strict && type_name != SqlTypeName::Char {
                return reject();
            }
            match value {
                LiteralValue::String(s) => s.charset().is_some() && s.collation().is_some(),
                _ => false,
            }
        }
        SqlTypeName::Symbol => matches!(value, LiteralValue::Symbol(_)),
        SqlTypeName::Row | SqlTypeName::Multiset | SqlTypeName::Array => {
            matches!(value, LiteralValue::List(_))
        }
        SqlTypeName::Map => matches!(value, LiteralValue::Map(_)),
        // CAST(2 AS ANY) stays a cast around an integer literal
        SqlTypeName::Any => false,
        SqlTypeName::Node | SqlTypeName::Edge | SqlTypeName::Path | SqlTypeName::Graph => {
            matches!(value, LiteralValue::Graph(_))
        }
    };
    Ok(matches)
}

/// A constant value
#[derive(Debug, Clone)]
pub struct RexLiteral {
    value: Option<LiteralValue>,
    data_type: DataType,
    type_name: SqlTypeName,
    /// Whether a string value uses the configured default character set
    default_charset: bool,
    digest: OnceLock<String>,
}

impl RexLiteral {
    /// Creates a literal, checking the value against the storage category.
    /// Use the builder instead; it also stamps nullability and rounds
    /// datetime values to their precision.
    pub(crate) fn new(
        value: Option<LiteralValue>,
        data_type: DataType,
        type_name: SqlTypeName,
        default_charset: &str,
    ) -> RexResult<Self> {
        if type_name == SqlTypeName::Any {
            return Err(RexError::TypeConsistency(
                "Literal of type ANY is not valid".to_string(),
            ));
        }
        if !value_matches_type(value.as_ref(), type_name, true)? {
            return Err(RexError::TypeConsistency(format!(
                "Literal value {:?} does not match type name {}",
                value, type_name
            )));
        }
        if value.is_none() && !data_type.is_nullable() {
            return Err(RexError::TypeConsistency(format!(
                "NULL literal must have a nullable type, got {}",
                data_type
            )));
        }
        let default_charset = match &value {
            Some(LiteralValue::String(s)) => s.charset() == Some(default_charset),
            _ => true,
        };
        Ok(Self {
            value,
            data_type,
            type_name,
            default_charset,
            digest: OnceLock::new(),
        })
    }

    /// Literal whose value is known to match its category
    pub(crate) fn from_parts(
        value: Option<LiteralValue>,
        data_type: DataType,
        type_name: SqlTypeName,
    ) -> Self {
        Self {
            value,
            data_type,
            type_name,
            default_charset: true,
            digest: OnceLock::new(),
        }
    }

    pub fn value(&self) -> Option<&LiteralValue> {
        self.value.as_ref()
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Storage category of the value
    pub fn type_name(&self) -> SqlTypeName {
        self.type_name
    }

    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    pub fn boolean_value(&self) -> Option<bool> {
        match &self.value {
            Some(LiteralValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn decimal_value(&self) -> Option<Decimal> {
        self.value.as_ref().and_then(|v| v.as_decimal())
    }

    pub fn string_value(&self) -> Option<&str> {
        match &self.value {
            Some(LiteralValue::String(s)) => Some(s.value()),
            _ => None,
        }
    }

    pub fn symbol_value(&self) -> Option<&Symbol> {
        match &self.value {
            Some(LiteralValue::Symbol(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_always_true(&self) -> bool {
        self.type_name == SqlTypeName::Boolean && self.boolean_value() == Some(true)
    }

    pub fn is_always_false(&self) -> bool {
        self.type_name == SqlTypeName::Boolean && self.boolean_value() == Some(false)
    }

    /// The include-type mode [`DigestIncludeType::Optional`] resolves to
    pub fn digest_include_type(&self) -> DigestIncludeType {
        if self.data_type.is_nullable() {
            return DigestIncludeType::Always;
        }
        match self.data_type.type_name() {
            SqlTypeName::Boolean
            | SqlTypeName::Integer
            | SqlTypeName::BigInt
            | SqlTypeName::Symbol => DigestIncludeType::NoType,
            SqlTypeName::Char => match &self.value {
                // 'Bob' rather than 'Bob':CHAR(3)
                Some(LiteralValue::String(s))
                    if s.charset() == self.data_type.charset()
                        && s.collation() == self.data_type.collation()
                        && Some(s.len() as u32) == self.data_type.precision() =>
                {
                    DigestIncludeType::NoType
                }
                _ => DigestIncludeType::Always,
            },
            SqlTypeName::Date => DigestIncludeType::NoType,
            SqlTypeName::Time | SqlTypeName::Timestamp
                if self.data_type.precision().unwrap_or(0) == 0 =>
            {
                DigestIncludeType::NoType
            }
            _ => DigestIncludeType::Always,
        }
    }

    /// Canonical text of the literal, cached on first use
    pub fn digest(&self) -> &str {
        self.digest
            .get_or_init(|| self.render(self.digest_include_type()))
    }

    /// Text of the literal under an explicit include-type mode
    pub fn compute_digest(&self, include_type: DigestIncludeType) -> String {
        if include_type == DigestIncludeType::Optional
            || include_type == self.digest_include_type()
        {
            return self.digest().to_string();
        }
        self.render(include_type)
    }

    fn render(&self, include_type: DigestIncludeType) -> String {
        let mut s = match &self.value {
            None => "null".to_string(),
            Some(value) => self.render_value(value, include_type),
        };
        if include_type != DigestIncludeType::NoType {
            s.push(':');
            s.push_str(&self.data_type.type_string());
        }
        s
    }

    fn render_value(&self, value: &LiteralValue, include_type: DigestIncludeType) -> String {
        match value {
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::Decimal(d) => {
                if self.type_name == SqlTypeName::BigInt
                    || self.data_type.type_name() == SqlTypeName::BigInt
                {
                    format!("{}L", d.trunc())
                } else {
                    d.to_string()
                }
            }
            LiteralValue::Double(f) => digest::to_scientific_notation(f.0),
            LiteralValue::String(s) => s.as_sql(!self.default_charset),
            LiteralValue::Binary(b) => format!("X'{}'", b.to_hex()),
            LiteralValue::Date(d) => d.to_string(),
            LiteralValue::Time(t) => {
                t.to_string_with_precision(self.data_type.precision().unwrap_or(0))
            }
            LiteralValue::Timestamp(ts) => {
                ts.to_string_with_precision(self.data_type.precision().unwrap_or(0))
            }
            LiteralValue::Symbol(s) => format!("FLAG({})", s),
            LiteralValue::List(items) => digest::literal_list(items, include_type),
            LiteralValue::Map(entries) => digest::literal_map(entries, include_type),
            LiteralValue::Graph(g) => g.to_string(),
        }
    }
}

impl PartialEq for RexLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.digest() == other.digest()
    }
}

impl Eq for RexLiteral {}

impl Hash for RexLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest().hash(state);
    }
}

impl fmt::Display for RexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.digest())
    }
}

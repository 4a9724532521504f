//! SQL type names, time units and time-unit ranges

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The SQL-level name of a data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlTypeName {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Float,
    Real,
    Double,
    Date,
    Time,
    TimeWithLocalTimeZone,
    Timestamp,
    TimestampWithLocalTimeZone,
    /// Interval whose fields are given by the range
    Interval(TimeUnitRange),
    Char,
    Varchar,
    Json,
    Binary,
    Varbinary,
    /// Type of the untyped NULL literal
    Null,
    Any,
    /// Enumerated flag values (time units, named flags)
    Symbol,
    Multiset,
    Array,
    Map,
    Row,
    Node,
    Edge,
    Path,
    Graph,
}

impl SqlTypeName {
    /// Name as it appears in type strings
    pub fn name(&self) -> String {
        match self {
            SqlTypeName::Boolean => "BOOLEAN".to_string(),
            SqlTypeName::TinyInt => "TINYINT".to_string(),
            SqlTypeName::SmallInt => "SMALLINT".to_string(),
            SqlTypeName::Integer => "INTEGER".to_string(),
            SqlTypeName::BigInt => "BIGINT".to_string(),
            SqlTypeName::Decimal => "DECIMAL".to_string(),
            SqlTypeName::Float => "FLOAT".to_string(),
            SqlTypeName::Real => "REAL".to_string(),
            SqlTypeName::Double => "DOUBLE".to_string(),
            SqlTypeName::Date => "DATE".to_string(),
            SqlTypeName::Time => "TIME".to_string(),
            SqlTypeName::TimeWithLocalTimeZone => "TIME_WITH_LOCAL_TIME_ZONE".to_string(),
            SqlTypeName::Timestamp => "TIMESTAMP".to_string(),
            SqlTypeName::TimestampWithLocalTimeZone => {
                "TIMESTAMP_WITH_LOCAL_TIME_ZONE".to_string()
            }
            SqlTypeName::Interval(range) => format!("INTERVAL {}", range.sql_name()),
            SqlTypeName::Char => "CHAR".to_string(),
            SqlTypeName::Varchar => "VARCHAR".to_string(),
            SqlTypeName::Json => "JSON".to_string(),
            SqlTypeName::Binary => "BINARY".to_string(),
            SqlTypeName::Varbinary => "VARBINARY".to_string(),
            SqlTypeName::Null => "NULL".to_string(),
            SqlTypeName::Any => "ANY".to_string(),
            SqlTypeName::Symbol => "SYMBOL".to_string(),
            SqlTypeName::Multiset => "MULTISET".to_string(),
            SqlTypeName::Array => "ARRAY".to_string(),
            SqlTypeName::Map => "MAP".to_string(),
            SqlTypeName::Row => "ROW".to_string(),
            SqlTypeName::Node => "NODE".to_string(),
            SqlTypeName::Edge => "EDGE".to_string(),
            SqlTypeName::Path => "PATH".to_string(),
            SqlTypeName::Graph => "GRAPH".to_string(),
        }
    }

    /// Check if this is an exact numeric type
    pub fn is_exact_numeric(&self) -> bool {
        matches!(
            self,
            SqlTypeName::TinyInt
                | SqlTypeName::SmallInt
                | SqlTypeName::Integer
                | SqlTypeName::BigInt
                | SqlTypeName::Decimal
        )
    }

    /// Check if this type is integral (no fractional part)
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            SqlTypeName::TinyInt
                | SqlTypeName::SmallInt
                | SqlTypeName::Integer
                | SqlTypeName::BigInt
        )
    }

    /// Check if this is an approximate numeric type
    pub fn is_approximate_numeric(&self) -> bool {
        matches!(self, SqlTypeName::Float | SqlTypeName::Real | SqlTypeName::Double)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_exact_numeric() || self.is_approximate_numeric()
    }

    /// Check if this is a character string type
    pub fn is_character(&self) -> bool {
        matches!(self, SqlTypeName::Char | SqlTypeName::Varchar | SqlTypeName::Json)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, SqlTypeName::Binary | SqlTypeName::Varbinary)
    }

    /// DATE, TIME and TIMESTAMP with or without local time zone
    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            SqlTypeName::Date
                | SqlTypeName::Time
                | SqlTypeName::TimeWithLocalTimeZone
                | SqlTypeName::Timestamp
                | SqlTypeName::TimestampWithLocalTimeZone
        )
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, SqlTypeName::Interval(_))
    }

    /// Interval whose value is stored in months
    pub fn is_year_month_interval(&self) -> bool {
        match self {
            SqlTypeName::Interval(range) => range.is_year_month(),
            _ => false,
        }
    }

    /// Collection types whose values are lists of literals
    pub fn is_collection(&self) -> bool {
        matches!(self, SqlTypeName::Array | SqlTypeName::Multiset)
    }

    pub fn is_graph(&self) -> bool {
        matches!(
            self,
            SqlTypeName::Node | SqlTypeName::Edge | SqlTypeName::Path | SqlTypeName::Graph
        )
    }

    /// Whether a precision is printed in the type string without a scale
    pub fn allows_precision_no_scale(&self) -> bool {
        matches!(
            self,
            SqlTypeName::Decimal
                | SqlTypeName::Char
                | SqlTypeName::Varchar
                | SqlTypeName::Binary
                | SqlTypeName::Varbinary
                | SqlTypeName::Time
                | SqlTypeName::TimeWithLocalTimeZone
                | SqlTypeName::Timestamp
                | SqlTypeName::TimestampWithLocalTimeZone
        )
    }

    /// Whether a scale is printed in the type string
    pub fn allows_scale(&self) -> bool {
        matches!(self, SqlTypeName::Decimal)
    }

    /// Start unit of an interval type
    pub fn start_unit(&self) -> Option<TimeUnit> {
        match self {
            SqlTypeName::Interval(range) => Some(range.start_unit()),
            _ => None,
        }
    }

    /// End unit of an interval type; equals the start unit for single-field intervals
    pub fn end_unit(&self) -> Option<TimeUnit> {
        match self {
            SqlTypeName::Interval(range) => Some(range.end_unit().unwrap_or(range.start_unit())),
            _ => None,
        }
    }
}

impl fmt::Display for SqlTypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A unit of time, used by intervals, EXTRACT, CEIL and FLOOR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Quarter,
    Week,
    Millisecond,
    Microsecond,
    /// Day of week (1 = Sunday)
    Dow,
    /// Day of year (1 = January 1st)
    Doy,
}

impl TimeUnit {
    /// Whether values of this unit are counted in months
    pub fn is_year_month(&self) -> bool {
        matches!(self, TimeUnit::Year | TimeUnit::Month | TimeUnit::Quarter)
    }

    /// Size of the unit in its base unit: months for year-month units,
    /// milliseconds for the rest. DOW and DOY have no fixed size.
    pub fn multiplier(&self) -> Option<Decimal> {
        match self {
            TimeUnit::Year => Some(Decimal::from(12)),
            TimeUnit::Quarter => Some(Decimal::from(3)),
            TimeUnit::Month => Some(Decimal::ONE),
            TimeUnit::Week => Some(Decimal::from(7 * 86_400_000i64)),
            TimeUnit::Day => Some(Decimal::from(86_400_000i64)),
            TimeUnit::Hour => Some(Decimal::from(3_600_000i64)),
            TimeUnit::Minute => Some(Decimal::from(60_000i64)),
            TimeUnit::Second => Some(Decimal::from(1_000i64)),
            TimeUnit::Millisecond => Some(Decimal::ONE),
            TimeUnit::Microsecond => Some(Decimal::new(1, 3)),
            TimeUnit::Dow | TimeUnit::Doy => None,
        }
    }

    /// The unit interval values are stored in
    pub fn base_unit(&self) -> TimeUnit {
        if self.is_year_month() {
            TimeUnit::Month
        } else {
            TimeUnit::Millisecond
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TimeUnit::Year => "YEAR",
            TimeUnit::Month => "MONTH",
            TimeUnit::Day => "DAY",
            TimeUnit::Hour => "HOUR",
            TimeUnit::Minute => "MINUTE",
            TimeUnit::Second => "SECOND",
            TimeUnit::Quarter => "QUARTER",
            TimeUnit::Week => "WEEK",
            TimeUnit::Millisecond => "MILLISECOND",
            TimeUnit::Microsecond => "MICROSECOND",
            TimeUnit::Dow => "DOW",
            TimeUnit::Doy => "DOY",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A range of time units, such as DAY TO SECOND
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeUnitRange {
    Year,
    YearToMonth,
    Month,
    Day,
    DayToHour,
    DayToMinute,
    DayToSecond,
    Hour,
    HourToMinute,
    HourToSecond,
    Minute,
    MinuteToSecond,
    Second,
    Quarter,
    Week,
    Millisecond,
    Microsecond,
    Dow,
    Doy,
}

impl TimeUnitRange {
    /// Look up the range spanning two units
    pub fn of(start: TimeUnit, end: Option<TimeUnit>) -> Option<TimeUnitRange> {
        use TimeUnit as U;
        let range = match (start, end) {
            (U::Year, None) => TimeUnitRange::Year,
            (U::Year, Some(U::Month)) => TimeUnitRange::YearToMonth,
            (U::Month, None) => TimeUnitRange::Month,
            (U::Day, None) => TimeUnitRange::Day,
            (U::Day, Some(U::Hour)) => TimeUnitRange::DayToHour,
            (U::Day, Some(U::Minute)) => TimeUnitRange::DayToMinute,
            (U::Day, Some(U::Second)) => TimeUnitRange::DayToSecond,
            (U::Hour, None) => TimeUnitRange::Hour,
            (U::Hour, Some(U::Minute)) => TimeUnitRange::HourToMinute,
            (U::Hour, Some(U::Second)) => TimeUnitRange::HourToSecond,
            (U::Minute, None) => TimeUnitRange::Minute,
            (U::Minute, Some(U::Second)) => TimeUnitRange::MinuteToSecond,
            (U::Second, None) => TimeUnitRange::Second,
            (U::Quarter, None) => TimeUnitRange::Quarter,
            (U::Week, None) => TimeUnitRange::Week,
            (U::Millisecond, None) => TimeUnitRange::Millisecond,
            (U::Microsecond, None) => TimeUnitRange::Microsecond,
            (U::Dow, None) => TimeUnitRange::Dow,
            (U::Doy, None) => TimeUnitRange::Doy,
            _ => return None,
        };
        Some(range)
    }

    pub fn start_unit(&self) -> TimeUnit {
        match self {
            TimeUnitRange::Year | TimeUnitRange::YearToMonth => TimeUnit::Year,
            TimeUnitRange::Month => TimeUnit::Month,
            TimeUnitRange::Day
            | TimeUnitRange::DayToHour
            | TimeUnitRange::DayToMinute
            | TimeUnitRange::DayToSecond => TimeUnit::Day,
            TimeUnitRange::Hour | TimeUnitRange::HourToMinute | TimeUnitRange::HourToSecond => {
                TimeUnit::Hour
            }
            TimeUnitRange::Minute | TimeUnitRange::MinuteToSecond => TimeUnit::Minute,
            TimeUnitRange::Second => TimeUnit::Second,
            TimeUnitRange::Quarter => TimeUnit::Quarter,
            TimeUnitRange::Week => TimeUnit::Week,
            TimeUnitRange::Millisecond => TimeUnit::Millisecond,
            TimeUnitRange::Microsecond => TimeUnit::Microsecond,
            TimeUnitRange::Dow => TimeUnit::Dow,
            TimeUnitRange::Doy => TimeUnit::Doy,
        }
    }

    /// End unit, or `None` for single-unit ranges
    pub fn end_unit(&self) -> Option<TimeUnit> {
        match self {
            TimeUnitRange::YearToMonth => Some(TimeUnit::Month),
            TimeUnitRange::DayToHour => Some(TimeUnit::Hour),
            TimeUnitRange::DayToMinute | TimeUnitRange::HourToMinute => Some(TimeUnit::Minute),
            TimeUnitRange::DayToSecond
            | TimeUnitRange::HourToSecond
            | TimeUnitRange::MinuteToSecond => Some(TimeUnit::Second),
            _ => None,
        }
    }

    pub fn is_year_month(&self) -> bool {
        self.start_unit().is_year_month()
    }

    /// Whether an interval type may be declared over this range
    pub fn is_interval_range(&self) -> bool {
        !matches!(
            self,
            TimeUnitRange::Quarter
                | TimeUnitRange::Week
                | TimeUnitRange::Millisecond
                | TimeUnitRange::Microsecond
                | TimeUnitRange::Dow
                | TimeUnitRange::Doy
        )
    }

    /// Name used in flag digests, e.g. `DAY_TO_SECOND`
    pub fn name(&self) -> String {
        match self.end_unit() {
            Some(end) => format!("{}_TO_{}", self.start_unit(), end),
            None => self.start_unit().to_string(),
        }
    }

    /// Name used in SQL type strings, e.g. `DAY TO SECOND`
    pub fn sql_name(&self) -> String {
        match self.end_unit() {
            Some(end) => format!("{} TO {}", self.start_unit(), end),
            None => self.start_unit().to_string(),
        }
    }
}

impl fmt::Display for TimeUnitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_families() {
        assert!(SqlTypeName::Integer.is_exact_numeric());
        assert!(SqlTypeName::Integer.is_integral());
        assert!(!SqlTypeName::Decimal.is_integral());
        assert!(SqlTypeName::Real.is_approximate_numeric());
        assert!(SqlTypeName::Timestamp.is_datetime());
        assert!(!SqlTypeName::Interval(TimeUnitRange::Day).is_datetime());
        assert!(SqlTypeName::Interval(TimeUnitRange::YearToMonth).is_year_month_interval());
        assert!(!SqlTypeName::Interval(TimeUnitRange::HourToSecond).is_year_month_interval());
    }

    #[test]
    fn test_interval_units() {
        let name = SqlTypeName::Interval(TimeUnitRange::DayToSecond);
        assert_eq!(name.start_unit(), Some(TimeUnit::Day));
        assert_eq!(name.end_unit(), Some(TimeUnit::Second));
        assert_eq!(name.to_string(), "INTERVAL DAY TO SECOND");

        let single = SqlTypeName::Interval(TimeUnitRange::Month);
        assert_eq!(single.end_unit(), Some(TimeUnit::Month));
    }

    #[test]
    fn test_time_unit_multipliers() {
        assert_eq!(TimeUnit::Year.multiplier(), Some(Decimal::from(12)));
        assert_eq!(TimeUnit::Day.multiplier(), Some(Decimal::from(86_400_000)));
        assert_eq!(TimeUnit::Dow.multiplier(), None);
        assert_eq!(TimeUnit::Quarter.base_unit(), TimeUnit::Month);
        assert_eq!(TimeUnit::Minute.base_unit(), TimeUnit::Millisecond);
    }

    #[test]
    fn test_time_unit_range_lookup() {
        assert_eq!(
            TimeUnitRange::of(TimeUnit::Hour, Some(TimeUnit::Second)),
            Some(TimeUnitRange::HourToSecond)
        );
        assert_eq!(TimeUnitRange::of(TimeUnit::Second, Some(TimeUnit::Hour)), None);
        assert_eq!(TimeUnitRange::DayToSecond.name(), "DAY_TO_SECOND");
        assert!(!TimeUnitRange::Week.is_interval_range());
    }
}

//! Date, time and timestamp values held in their textual form
//!
//! Literals keep the digits of fractional seconds exactly as given, so a
//! `TIMESTAMP(9)` literal does not lose precision before it is rounded to
//! its type. Values are validated on construction.

use crate::common::error::{RexError, RexResult};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use std::fmt;

const MILLIS_PER_DAY: i64 = 86_400_000;

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn invalid(msg: String) -> RexError {
    RexError::InvalidArgument(msg)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Trim trailing zeros from fractional-second digits
fn trim_fraction(fraction: &str) -> String {
    fraction.trim_end_matches('0').to_string()
}

/// Exactly `precision` fractional digits, truncating or zero-padding
fn fixed_fraction(fraction: &str, precision: usize) -> String {
    let mut s: String = fraction.chars().take(precision).collect();
    while s.len() < precision {
        s.push('0');
    }
    s
}

/// A date such as `1969-07-21`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateString(NaiveDate);

impl DateString {
    pub fn new(year: i32, month: i32, day: i32) -> RexResult<Self> {
        if !(0..=9999).contains(&year) {
            return Err(invalid(format!("Year out of range: [{}]", year)));
        }
        if !(1..=12).contains(&month) {
            return Err(invalid(format!("Month out of range: [{}]", month)));
        }
        if !(1..=31).contains(&day) {
            return Err(invalid(format!("Day out of range: [{}]", day)));
        }
        NaiveDate::from_ymd_opt(year, month as u32, day as u32)
            .map(DateString)
            .ok_or_else(|| {
                invalid(format!(
                    "Invalid date: [{:04}-{:02}-{:02}]",
                    year, month, day
                ))
            })
    }

    /// Parse `YYYY-MM-DD`
    pub fn parse(s: &str) -> RexResult<Self> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3
            || parts[0].len() != 4
            || parts[1].len() != 2
            || parts[2].len() != 2
            || !parts.iter().all(|p| all_digits(p))
        {
            return Err(invalid(format!("Invalid date format: [{}]", s)));
        }
        let field = |p: &str| {
            p.parse::<i32>()
                .map_err(|_| invalid(format!("Invalid date format: [{}]", s)))
        };
        Self::new(field(parts[0])?, field(parts[1])?, field(parts[2])?)
    }

    pub fn from_days_since_epoch(days: i32) -> RexResult<Self> {
        let date = epoch()
            .checked_add_signed(chrono::Duration::days(days as i64))
            .ok_or_else(|| invalid(format!("Day count out of range: [{}]", days)))?;
        Self::new(date.year(), date.month() as i32, date.day() as i32)
    }

    pub fn from_naive_date(date: NaiveDate) -> RexResult<Self> {
        Self::new(date.year(), date.month() as i32, date.day() as i32)
    }

    pub fn days_since_epoch(&self) -> i32 {
        (self.0 - epoch()).num_days() as i32
    }

    pub fn naive_date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A time of day such as `02:56:15.056`, with arbitrary fractional digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeString {
    time: NaiveTime,
    /// Fractional-second digits without trailing zeros
    fraction: String,
}

impl TimeString {
    pub fn new(hour: i32, minute: i32, second: i32) -> RexResult<Self> {
        if !(0..=23).contains(&hour) {
            return Err(invalid(format!("Hour out of range: [{}]", hour)));
        }
        if !(0..=59).contains(&minute) {
            return Err(invalid(format!("Minute out of range: [{}]", minute)));
        }
        if !(0..=59).contains(&second) {
            return Err(invalid(format!("Second out of range: [{}]", second)));
        }
        let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)
            .ok_or_else(|| invalid(format!("Invalid time: [{}:{}:{}]", hour, minute, second)))?;
        Ok(Self {
            time,
            fraction: String::new(),
        })
    }

    /// Parse `HH:MM:SS[.fffffffff]`
    pub fn parse(s: &str) -> RexResult<Self> {
        let (hms, fraction) = match s.split_once('.') {
            Some((hms, fraction)) => (hms, Some(fraction)),
            None => (s, None),
        };
        let parts: Vec<&str> = hms.split(':').collect();
        if parts.len() != 3
            || parts.iter().any(|p| p.len() != 2 || !all_digits(p))
            || fraction.map(|f| !all_digits(f)).unwrap_or(false)
        {
            return Err(invalid(format!("Invalid time format: [{}]", s)));
        }
        let field = |p: &str| {
            p.parse::<i32>()
                .map_err(|_| invalid(format!("Invalid time format: [{}]", s)))
        };
        let time = Self::new(field(parts[0])?, field(parts[1])?, field(parts[2])?)?;
        match fraction {
            Some(f) => time.with_fraction(f),
            None => Ok(time),
        }
    }

    pub fn from_millis_of_day(millis: i64) -> RexResult<Self> {
        if !(0..MILLIS_PER_DAY).contains(&millis) {
            return Err(invalid(format!("Millisecond of day out of range: [{}]", millis)));
        }
        let seconds = millis / 1000;
        let time = Self::new(
            (seconds / 3600) as i32,
            ((seconds / 60) % 60) as i32,
            (seconds % 60) as i32,
        )?;
        time.with_millis((millis % 1000) as u32)
    }

    pub fn with_millis(&self, millis: u32) -> RexResult<Self> {
        if millis >= 1000 {
            return Err(invalid(format!("Millisecond out of range: [{}]", millis)));
        }
        self.with_fraction(&format!("{:03}", millis))
    }

    pub fn with_nanos(&self, nanos: u32) -> RexResult<Self> {
        if nanos >= 1_000_000_000 {
            return Err(invalid(format!("Nanosecond out of range: [{}]", nanos)));
        }
        self.with_fraction(&format!("{:09}", nanos))
    }

    /// Replace the fractional-second digits
    pub fn with_fraction(&self, fraction: &str) -> RexResult<Self> {
        if !fraction.is_empty() && !all_digits(fraction) {
            return Err(invalid(format!("Invalid fraction: [{}]", fraction)));
        }
        Ok(Self {
            time: self.time,
            fraction: trim_fraction(fraction),
        })
    }

    /// Keep at most `precision` fractional digits (truncating)
    pub fn round(&self, precision: u32) -> Self {
        let kept = fixed_fraction(&self.fraction, precision as usize);
        Self {
            time: self.time,
            fraction: trim_fraction(&kept),
        }
    }

    pub fn millis_of_day(&self) -> i64 {
        let millis: i64 = fixed_fraction(&self.fraction, 3).parse().unwrap_or(0);
        self.time.num_seconds_from_midnight() as i64 * 1000 + millis
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    pub fn second(&self) -> u32 {
        self.time.second()
    }

    /// Render with exactly `precision` fractional digits
    pub fn to_string_with_precision(&self, precision: u32) -> String {
        let base = self.time.format("%H:%M:%S").to_string();
        if precision == 0 {
            base
        } else {
            format!("{}.{}", base, fixed_fraction(&self.fraction, precision as usize))
        }
    }
}

impl fmt::Display for TimeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M:%S"))?;
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

/// A timestamp such as `1969-07-21 02:56:15.056`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampString {
    date: DateString,
    time: TimeString,
}

impl TimestampString {
    pub fn new(
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
        minute: i32,
        second: i32,
    ) -> RexResult<Self> {
        Ok(Self {
            date: DateString::new(year, month, day)?,
            time: TimeString::new(hour, minute, second)?,
        })
    }

    pub fn from_parts(date: DateString, time: TimeString) -> Self {
        Self { date, time }
    }

    /// Parse `YYYY-MM-DD HH:MM:SS[.fffffffff]`
    pub fn parse(s: &str) -> RexResult<Self> {
        let (date, time) = s
            .split_once(' ')
            .ok_or_else(|| invalid(format!("Invalid timestamp format: [{}]", s)))?;
        Ok(Self {
            date: DateString::parse(date)?,
            time: TimeString::parse(time)?,
        })
    }

    pub fn from_millis_since_epoch(millis: i64) -> RexResult<Self> {
        let days = millis.div_euclid(MILLIS_PER_DAY);
        let of_day = millis.rem_euclid(MILLIS_PER_DAY);
        let days = i32::try_from(days)
            .map_err(|_| invalid(format!("Timestamp out of range: [{}]", millis)))?;
        Ok(Self {
            date: DateString::from_days_since_epoch(days)?,
            time: TimeString::from_millis_of_day(of_day)?,
        })
    }

    pub fn with_millis(&self, millis: u32) -> RexResult<Self> {
        Ok(Self {
            date: self.date,
            time: self.time.with_millis(millis)?,
        })
    }

    pub fn with_nanos(&self, nanos: u32) -> RexResult<Self> {
        Ok(Self {
            date: self.date,
            time: self.time.with_nanos(nanos)?,
        })
    }

    pub fn with_fraction(&self, fraction: &str) -> RexResult<Self> {
        Ok(Self {
            date: self.date,
            time: self.time.with_fraction(fraction)?,
        })
    }

    pub fn round(&self, precision: u32) -> Self {
        Self {
            date: self.date,
            time: self.time.round(precision),
        }
    }

    pub fn date(&self) -> DateString {
        self.date
    }

    pub fn time(&self) -> &TimeString {
        &self.time
    }

    pub fn millis_since_epoch(&self) -> i64 {
        self.date.days_since_epoch() as i64 * MILLIS_PER_DAY + self.time.millis_of_day()
    }

    pub fn to_string_with_precision(&self, precision: u32) -> String {
        format!(
            "{} {}",
            self.date,
            self.time.to_string_with_precision(precision)
        )
    }
}

impl fmt::Display for TimestampString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err_message<T: fmt::Debug>(r: RexResult<T>) -> String {
        r.unwrap_err().to_string()
    }

    #[test]
    fn test_date_string_validation() {
        assert!(err_message(DateString::new(11969, 7, 21)).contains("Year out of range: [11969]"));
        assert!(err_message(DateString::parse("12345-01-23"))
            .contains("Invalid date format: [12345-01-23]"));
        assert!(err_message(DateString::new(1969, 27, 21)).contains("Month out of range: [27]"));
        assert!(err_message(DateString::parse("1969-13-21")).contains("Month out of range: [13]"));
        assert!(err_message(DateString::new(1969, 7, 41)).contains("Day out of range: [41]"));
        assert!(err_message(DateString::parse("1969-07-32")).contains("Day out of range: [32]"));
        assert!(DateString::parse("2019-02-29").is_err());
    }

    #[test]
    fn test_time_string_validation() {
        assert!(err_message(TimeString::new(111, 56, 15)).contains("Hour out of range: [111]"));
        assert!(err_message(TimeString::parse("24:00:00")).contains("Hour out of range: [24]"));
        assert!(err_message(TimeString::parse("24:00")).contains("Invalid time format: [24:00]"));
        assert!(err_message(TimeString::new(2, 334, 15)).contains("Minute out of range: [334]"));
        assert!(err_message(TimeString::parse("02:60:15")).contains("Minute out of range: [60]"));
        assert!(err_message(TimeString::new(2, 56, 567)).contains("Second out of range: [567]"));
        assert!(err_message(TimeString::new(2, 56, -4)).contains("Second out of range: [-4]"));
        assert!(err_message(TimeString::parse("02:56:60")).contains("Second out of range: [60]"));
    }

    #[test]
    fn test_date_epoch_conversion() {
        let moon = DateString::new(1969, 7, 21).unwrap();
        assert_eq!(moon.days_since_epoch(), -164);
        assert_eq!(DateString::from_days_since_epoch(-164).unwrap(), moon);
        assert_eq!(moon.to_string(), "1969-07-21");
    }

    #[test]
    fn test_time_fractions() {
        let t = TimeString::new(2, 56, 15).unwrap();
        assert_eq!(t.millis_of_day(), 10_575_000);

        let t2 = t.with_millis(56).unwrap();
        assert_eq!(t2.millis_of_day(), 10_575_056);
        assert_eq!(t2.to_string(), "02:56:15.056");

        let t3 = t.with_nanos(2_345_678).unwrap();
        assert_eq!(t3.millis_of_day(), 10_575_002);

        let t4 = t.with_fraction("102030405060708090102").unwrap();
        assert_eq!(t4.millis_of_day(), 10_575_102);

        assert_eq!(t2.round(1).to_string(), "02:56:15");
        assert_eq!(t2.round(2).to_string(), "02:56:15.05");
        assert_eq!(t2.round(3).to_string(), "02:56:15.056");
        assert_eq!(t2.round(4).to_string(), "02:56:15.056");

        assert_eq!(t2.to_string_with_precision(6), "02:56:15.056000");
        assert_eq!(t2.to_string_with_precision(1), "02:56:15.0");
        assert_eq!(t2.to_string_with_precision(0), "02:56:15");
        assert_eq!(t2.round(0).to_string_with_precision(2), "02:56:15.00");

        assert_eq!(
            TimeString::from_millis_of_day(53_560_123).unwrap().to_string(),
            "14:52:40.123"
        );
    }

    #[test]
    fn test_timestamp_string() {
        let ts = TimestampString::new(1969, 7, 21, 2, 56, 15).unwrap();
        assert_eq!(ts.millis_since_epoch(), -14_159_025_000);

        let ts2 = ts.with_millis(56).unwrap();
        assert_eq!(ts2.to_string(), "1969-07-21 02:56:15.056");
        assert_eq!(ts2.round(2).to_string(), "1969-07-21 02:56:15.05");
        assert_eq!(ts2.to_string_with_precision(6), "1969-07-21 02:56:15.056000");

        assert_eq!(
            TimestampString::from_millis_since_epoch(1_456_513_560_123)
                .unwrap()
                .to_string(),
            "2016-02-26 19:06:00.123"
        );
        assert_eq!(
            TimestampString::parse("2016-02-26 19:06:00.123").unwrap(),
            TimestampString::from_millis_since_epoch(1_456_513_560_123).unwrap()
        );
        assert!(err_message(TimestampString::new(11969, 7, 21, 1, 23, 45))
            .contains("Year out of range: [11969]"));
    }
}

//! Value shapes carried by literals besides numbers and datetimes

use crate::types::type_name::{TimeUnit, TimeUnitRange};
use std::fmt;

/// A character string with its character set and collation
///
/// Literals require both to be present; a string built by a caller without
/// them gets the type's values when the literal is made.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NlsString {
    value: String,
    charset: Option<String>,
    collation: Option<String>,
}

impl NlsString {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            charset: None,
            collation: None,
        }
    }

    pub fn with_charset(
        value: impl Into<String>,
        charset: impl Into<String>,
        collation: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            charset: Some(charset.into()),
            collation: Some(collation.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Same charset and collation, different text
    pub fn copy_with(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            charset: self.charset.clone(),
            collation: self.collation.clone(),
        }
    }

    /// Fill in a missing charset or collation
    pub fn resolve(self, charset: &str, collation: &str) -> Self {
        Self {
            charset: self.charset.or_else(|| Some(charset.to_string())),
            collation: self.collation.or_else(|| Some(collation.to_string())),
            value: self.value,
        }
    }

    /// SQL form: `'it''s'`, prefixed with `_CHARSET` when requested
    pub fn as_sql(&self, include_charset: bool) -> String {
        let mut s = String::new();
        if include_charset {
            if let Some(charset) = &self.charset {
                s.push('_');
                s.push_str(charset);
            }
        }
        s.push('\'');
        s.push_str(&self.value.replace('\'', "''"));
        s.push('\'');
        s
    }
}

impl fmt::Display for NlsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_sql(true))
    }
}

/// An immutable sequence of bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ByteString(Vec<u8>);

impl ByteString {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        hex::decode(s).ok().map(Self)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lower-case hexadecimal digits
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Zero-pad on the right to `length` bytes
    pub fn pad_right(&self, length: usize) -> Self {
        if self.0.len() >= length {
            return self.clone();
        }
        let mut bytes = self.0.clone();
        bytes.resize(length, 0);
        Self(bytes)
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An enumerated flag carried by a SYMBOL literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    /// Unit argument of EXTRACT, CEIL, FLOOR and interval qualifiers
    TimeUnit(TimeUnitRange),
    /// Any other named flag, such as `BOTH` for TRIM
    Named(String),
}

impl Symbol {
    pub fn named(name: impl Into<String>) -> Self {
        Symbol::Named(name.into())
    }

    /// The single time unit a range flag stands for, if any
    pub fn as_time_unit(&self) -> Option<TimeUnit> {
        match self {
            Symbol::TimeUnit(range) if range.end_unit().is_none() => Some(range.start_unit()),
            _ => None,
        }
    }
}

impl From<TimeUnitRange> for Symbol {
    fn from(range: TimeUnitRange) -> Self {
        Symbol::TimeUnit(range)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::TimeUnit(range) => write!(f, "{}", range),
            Symbol::Named(name) => f.write_str(name),
        }
    }
}

/// Graph entities that can appear as literal values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphValue {
    Node {
        id: String,
        labels: Vec<String>,
    },
    Edge {
        id: String,
        labels: Vec<String>,
        source: String,
        target: String,
    },
    /// Alternating nodes and edges
    Path(Vec<GraphValue>),
    Graph {
        id: String,
    },
}

impl fmt::Display for GraphValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValue::Node { id, labels } => write!(f, "({}:{})", id, labels.join(":")),
            GraphValue::Edge {
                id,
                labels,
                source,
                target,
            } => write!(f, "({})-[{}:{}]->({})", source, id, labels.join(":"), target),
            GraphValue::Path(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "PATH[{}]", parts.join(", "))
            }
            GraphValue::Graph { id } => write!(f, "GRAPH({})", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nls_string_sql() {
        let s = NlsString::with_charset("it's", "UTF-16", "UTF-16$en_US");
        assert_eq!(s.as_sql(false), "'it''s'");
        assert_eq!(s.as_sql(true), "_UTF-16'it''s'");
        assert_eq!(s.len(), 4);

        let resolved = NlsString::new("x").resolve("ISO-8859-1", "ISO-8859-1$en_US$primary");
        assert_eq!(resolved.charset(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_byte_string() {
        let b = ByteString::new(vec![0xca, 0xfe]);
        assert_eq!(b.to_hex(), "cafe");
        assert_eq!(b.pad_right(4).bytes(), &[0xca, 0xfe, 0, 0]);
        assert_eq!(ByteString::from_hex("cafe"), Some(b));
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::from(TimeUnitRange::DayToSecond).to_string(), "DAY_TO_SECOND");
        assert_eq!(Symbol::named("BOTH").to_string(), "BOTH");
        assert_eq!(
            Symbol::from(TimeUnitRange::Month).as_time_unit(),
            Some(TimeUnit::Month)
        );
    }

    #[test]
    fn test_symbol_ordering() {
        let mut flags = vec![
            Symbol::named("BOTH"),
            Symbol::from(TimeUnitRange::Month),
            Symbol::from(TimeUnitRange::Year),
        ];
        flags.sort();
        assert_eq!(
            flags,
            vec![
                Symbol::from(TimeUnitRange::Year),
                Symbol::from(TimeUnitRange::Month),
                Symbol::named("BOTH"),
            ]
        );
        assert!(TimeUnitRange::Year < TimeUnitRange::YearToMonth);
    }
}

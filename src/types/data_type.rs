//! Data type descriptors
//!
//! A `DataType` is an immutable description of a SQL type: its name,
//! nullability and the attributes relevant to that name (precision and
//! scale, charset and collation, interval qualifier, element types or
//! record fields). Types are created through a [`TypeFactory`].
//!
//! [`TypeFactory`]: crate::types::TypeFactory

use crate::types::type_name::{SqlTypeName, TimeUnit, TimeUnitRange};
use std::fmt;

/// Interval qualifier such as `DAY(2) TO SECOND(6)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalQualifier {
    range: TimeUnitRange,
    start_precision: Option<u32>,
    fraction_precision: Option<u32>,
}

impl IntervalQualifier {
    pub fn new(range: TimeUnitRange) -> Self {
        Self {
            range,
            start_precision: None,
            fraction_precision: None,
        }
    }

    pub fn with_precision(
        range: TimeUnitRange,
        start_precision: Option<u32>,
        fraction_precision: Option<u32>,
    ) -> Self {
        Self {
            range,
            start_precision,
            fraction_precision,
        }
    }

    pub fn range(&self) -> TimeUnitRange {
        self.range
    }

    pub fn start_unit(&self) -> TimeUnit {
        self.range.start_unit()
    }

    /// End unit; the start unit for single-field qualifiers
    pub fn end_unit(&self) -> TimeUnit {
        self.range.end_unit().unwrap_or(self.range.start_unit())
    }

    pub fn start_precision(&self) -> Option<u32> {
        self.start_precision
    }

    pub fn fraction_precision(&self) -> Option<u32> {
        self.fraction_precision
    }

    pub fn is_year_month(&self) -> bool {
        self.range.is_year_month()
    }

    pub fn type_name(&self) -> SqlTypeName {
        SqlTypeName::Interval(self.range)
    }
}

impl fmt::Display for IntervalQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.range.sql_name())
    }
}

/// A named field of a record type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataTypeField {
    name: String,
    /// Position inside the record; `None` for fields of dynamic records
    /// that are looked up by name at run time
    index: Option<usize>,
    data_type: DataType,
}

impl DataTypeField {
    pub fn new(name: impl Into<String>, index: usize, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
            data_type,
        }
    }

    /// A field without a fixed position
    pub fn dynamic(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            index: None,
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// Immutable SQL data type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    type_name: SqlTypeName,
    nullable: bool,
    precision: Option<u32>,
    scale: Option<u32>,
    charset: Option<String>,
    collation: Option<String>,
    interval: Option<IntervalQualifier>,
    /// Element type of ARRAY and MULTISET, value type of MAP
    component: Option<Box<DataType>>,
    /// Key type of MAP
    key: Option<Box<DataType>>,
    fields: Vec<DataTypeField>,
}

impl DataType {
    /// A NOT NULL type with no attributes. Factories fill in the rest.
    pub(crate) fn basic(type_name: SqlTypeName) -> Self {
        Self {
            type_name,
            nullable: false,
            precision: None,
            scale: None,
            charset: None,
            collation: None,
            interval: None,
            component: None,
            key: None,
            fields: Vec::new(),
        }
    }

    pub(crate) fn set_precision(mut self, precision: Option<u32>, scale: Option<u32>) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub(crate) fn set_charset(
        mut self,
        charset: Option<String>,
        collation: Option<String>,
    ) -> Self {
        self.charset = charset;
        self.collation = collation;
        self
    }

    pub(crate) fn set_interval(mut self, interval: IntervalQualifier) -> Self {
        self.interval = Some(interval);
        self
    }

    pub(crate) fn set_component(mut self, component: DataType) -> Self {
        self.component = Some(Box::new(component));
        self
    }

    pub(crate) fn set_key(mut self, key: DataType) -> Self {
        self.key = Some(Box::new(key));
        self
    }

    pub(crate) fn set_fields(mut self, fields: Vec<DataTypeField>) -> Self {
        self.fields = fields;
        self
    }

    pub(crate) fn set_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn type_name(&self) -> SqlTypeName {
        self.type_name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn collation(&self) -> Option<&str> {
        self.collation.as_deref()
    }

    pub fn interval_qualifier(&self) -> Option<&IntervalQualifier> {
        self.interval.as_ref()
    }

    /// Element type of a collection, or value type of a map
    pub fn component_type(&self) -> Option<&DataType> {
        self.component.as_deref()
    }

    pub fn key_type(&self) -> Option<&DataType> {
        self.key.as_deref()
    }

    pub fn value_type(&self) -> Option<&DataType> {
        self.component_type()
    }

    pub fn fields(&self) -> &[DataTypeField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_struct(&self) -> bool {
        self.type_name == SqlTypeName::Row
    }

    /// Find a field by name
    pub fn field(&self, name: &str, case_sensitive: bool) -> Option<&DataTypeField> {
        self.fields.iter().find(|f| {
            if case_sensitive {
                f.name == name
            } else {
                f.name.eq_ignore_ascii_case(name)
            }
        })
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Equality that ignores top-level nullability
    pub fn equals_sans_nullability(&self, other: &DataType) -> bool {
        self.type_name == other.type_name
            && self.precision == other.precision
            && self.scale == other.scale
            && self.charset == other.charset
            && self.collation == other.collation
            && self.interval == other.interval
            && self.component == other.component
            && self.key == other.key
            && self.fields == other.fields
    }

    /// Type string without the nullability marker
    pub fn type_string(&self) -> String {
        match self.type_name {
            SqlTypeName::Interval(_) => match &self.interval {
                Some(q) => format!("INTERVAL {}", q),
                None => self.type_name.name(),
            },
            SqlTypeName::Array | SqlTypeName::Multiset => {
                let element = self
                    .component
                    .as_ref()
                    .map(|c| c.full_type_string())
                    .unwrap_or_else(|| "ANY".to_string());
                format!("{} {}", element, self.type_name.name())
            }
            SqlTypeName::Map => {
                let key = self
                    .key
                    .as_ref()
                    .map(|k| k.full_type_string())
                    .unwrap_or_else(|| "ANY".to_string());
                let value = self
                    .component
                    .as_ref()
                    .map(|v| v.full_type_string())
                    .unwrap_or_else(|| "ANY".to_string());
                format!("({}, {}) MAP", key, value)
            }
            SqlTypeName::Row => {
                let fields: Vec<String> = self
                    .fields
                    .iter()
                    .map(|f| format!("{} {}", f.data_type.full_type_string(), f.name))
                    .collect();
                format!("RecordType({})", fields.join(", "))
            }
            name => {
                let mut s = name.name();
                match (self.precision, self.scale) {
                    (Some(p), Some(sc)) if name.allows_scale() => {
                        s.push_str(&format!("({}, {})", p, sc));
                    }
                    (Some(p), _) if name.allows_precision_no_scale() => {
                        s.push_str(&format!("({})", p));
                    }
                    _ => {}
                }
                s
            }
        }
    }

    /// Type string including ` NOT NULL` for non-nullable types
    pub fn full_type_string(&self) -> String {
        if self.nullable {
            self.type_string()
        } else {
            format!("{} NOT NULL", self.type_string())
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_type_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_strings() {
        let int = DataType::basic(SqlTypeName::Integer);
        assert_eq!(int.full_type_string(), "INTEGER NOT NULL");
        assert_eq!(int.clone().set_nullable(true).full_type_string(), "INTEGER");

        let dec = DataType::basic(SqlTypeName::Decimal).set_precision(Some(5), Some(2));
        assert_eq!(dec.type_string(), "DECIMAL(5, 2)");

        let varchar = DataType::basic(SqlTypeName::Varchar);
        assert_eq!(varchar.type_string(), "VARCHAR");

        let ts = DataType::basic(SqlTypeName::Timestamp).set_precision(Some(0), None);
        assert_eq!(ts.type_string(), "TIMESTAMP(0)");

        let array = DataType::basic(SqlTypeName::Array).set_component(int.clone());
        assert_eq!(array.type_string(), "INTEGER NOT NULL ARRAY");
    }

    #[test]
    fn test_record_fields() {
        let int = DataType::basic(SqlTypeName::Integer);
        let row = DataType::basic(SqlTypeName::Row).set_fields(vec![
            DataTypeField::new("ID", 0, int.clone()),
            DataTypeField::new("Name", 1, DataType::basic(SqlTypeName::Varchar)),
        ]);
        assert_eq!(row.field_count(), 2);
        assert!(row.field("name", false).is_some());
        assert!(row.field("name", true).is_none());
        assert_eq!(
            row.type_string(),
            "RecordType(INTEGER NOT NULL ID, VARCHAR NOT NULL Name)"
        );
    }

    #[test]
    fn test_equals_sans_nullability() {
        let a = DataType::basic(SqlTypeName::Integer);
        let b = a.clone().set_nullable(true);
        assert_ne!(a, b);
        assert!(a.equals_sans_nullability(&b));
    }
}

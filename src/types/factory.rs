//! Type factory and type system
//!
//! The expression core does not own a catalog. It asks a [`TypeFactory`] for
//! type descriptors and for the least restrictive common type of a list of
//! types. [`DefaultTypeFactory`] is a self-contained implementation driven by
//! a [`TypeSystem`].

use crate::common::config::RexConfig;
use crate::common::error::{RexError, RexResult};
use crate::types::data_type::{DataType, DataTypeField, IntervalQualifier};
use crate::types::type_name::SqlTypeName;
use std::fmt;

/// Default and maximum precisions per type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSystem {
    config: RexConfig,
}

impl TypeSystem {
    pub fn new(config: RexConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RexConfig {
        &self.config
    }

    pub fn max_numeric_precision(&self) -> u32 {
        self.config.max_numeric_precision
    }

    pub fn max_numeric_scale(&self) -> u32 {
        self.config.max_numeric_scale
    }

    pub fn default_charset(&self) -> &str {
        &self.config.default_charset
    }

    pub fn default_collation(&self) -> &str {
        &self.config.default_collation
    }

    /// Precision given to a type created without one
    pub fn default_precision(&self, type_name: SqlTypeName) -> Option<u32> {
        match type_name {
            SqlTypeName::Char | SqlTypeName::Binary => Some(1),
            SqlTypeName::Decimal => Some(self.config.max_numeric_precision),
            SqlTypeName::Time
            | SqlTypeName::TimeWithLocalTimeZone
            | SqlTypeName::Timestamp
            | SqlTypeName::TimestampWithLocalTimeZone => Some(0),
            SqlTypeName::Interval(_) => Some(self.config.default_interval_precision),
            _ => None,
        }
    }

    /// Largest precision a type may declare; larger requests are capped
    pub fn max_precision(&self, type_name: SqlTypeName) -> Option<u32> {
        match type_name {
            SqlTypeName::Decimal => Some(self.config.max_numeric_precision),
            SqlTypeName::Char
            | SqlTypeName::Varchar
            | SqlTypeName::Binary
            | SqlTypeName::Varbinary => Some(65_536),
            SqlTypeName::Time
            | SqlTypeName::TimeWithLocalTimeZone
            | SqlTypeName::Timestamp
            | SqlTypeName::TimestampWithLocalTimeZone => Some(self.config.max_datetime_precision),
            _ => None,
        }
    }

    /// Number of decimal digits an integral type can hold
    pub fn integral_digits(&self, type_name: SqlTypeName) -> Option<u32> {
        match type_name {
            SqlTypeName::TinyInt => Some(3),
            SqlTypeName::SmallInt => Some(5),
            SqlTypeName::Integer => Some(10),
            SqlTypeName::BigInt => Some(19),
            _ => None,
        }
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new(RexConfig::default())
    }
}

/// Capability that creates data type descriptors
pub trait TypeFactory: fmt::Debug + Send + Sync {
    fn type_system(&self) -> &TypeSystem;

    /// A NOT NULL type with default attributes
    fn create_type(&self, type_name: SqlTypeName) -> RexResult<DataType>;

    fn create_type_with_precision(&self, type_name: SqlTypeName, precision: u32)
        -> RexResult<DataType>;

    fn create_type_with_precision_scale(
        &self,
        type_name: SqlTypeName,
        precision: u32,
        scale: u32,
    ) -> RexResult<DataType>;

    /// Same type with the given nullability; collections keep their element types
    fn create_type_with_nullability(&self, data_type: &DataType, nullable: bool) -> DataType;

    fn create_type_with_charset(
        &self,
        data_type: &DataType,
        charset: &str,
        collation: &str,
    ) -> RexResult<DataType>;

    fn create_interval_type(&self, qualifier: IntervalQualifier) -> RexResult<DataType>;

    fn create_array_type(&self, element: DataType) -> DataType;

    fn create_multiset_type(&self, element: DataType) -> DataType;

    fn create_map_type(&self, key: DataType, value: DataType) -> DataType;

    fn create_struct_type(&self, fields: Vec<(String, DataType)>) -> DataType;

    /// Common type all arguments can be converted to, if one exists
    fn least_restrictive(&self, types: &[DataType]) -> Option<DataType>;

    /// Re-create a type from another factory in this one
    fn copy_type(&self, data_type: &DataType) -> DataType {
        data_type.clone()
    }
}

/// Self-contained type factory
#[derive(Debug, Clone, Default)]
pub struct DefaultTypeFactory {
    type_system: TypeSystem,
}

impl DefaultTypeFactory {
    pub fn new(type_system: TypeSystem) -> Self {
        Self { type_system }
    }

    pub fn with_config(config: RexConfig) -> Self {
        Self::new(TypeSystem::new(config))
    }

    fn check_simple(&self, type_name: SqlTypeName) -> RexResult<()> {
        match type_name {
            SqlTypeName::Interval(_)
            | SqlTypeName::Array
            | SqlTypeName::Multiset
            | SqlTypeName::Map
            | SqlTypeName::Row => Err(RexError::InvalidType(format!(
                "{} requires a dedicated constructor",
                type_name
            ))),
            _ => Ok(()),
        }
    }

    fn cap_precision(&self, type_name: SqlTypeName, precision: u32) -> u32 {
        match self.type_system.max_precision(type_name) {
            Some(max) if precision > max => max,
            _ => precision,
        }
    }

    fn with_default_charset(&self, data_type: DataType) -> DataType {
        if data_type.type_name().is_character() && data_type.charset().is_none() {
            data_type.set_charset(
                Some(self.type_system.default_charset().to_string()),
                Some(self.type_system.default_collation().to_string()),
            )
        } else {
            data_type
        }
    }

    fn least_restrictive_numeric(&self, types: &[&DataType]) -> Option<DataType> {
        if types.iter().any(|t| t.type_name().is_approximate_numeric()) {
            return self.create_type(SqlTypeName::Double).ok();
        }
        if types.iter().all(|t| t.type_name().is_integral()) {
            let widest = types
                .iter()
                .map(|t| t.type_name())
                .max_by_key(|n| self.type_system.integral_digits(*n).unwrap_or(0))?;
            return self.create_type(widest).ok();
        }
        // DECIMAL(max integer digits + max scale, max scale)
        let mut int_digits = 0;
        let mut scale = 0;
        for t in types {
            let (p, s) = match t.type_name() {
                SqlTypeName::Decimal => (
                    t.precision().unwrap_or(self.type_system.max_numeric_precision()),
                    t.scale().unwrap_or(0),
                ),
                n => (self.type_system.integral_digits(n).unwrap_or(19), 0),
            };
            int_digits = int_digits.max(p.saturating_sub(s));
            scale = scale.max(s);
        }
        let precision = (int_digits + scale).min(self.type_system.max_numeric_precision());
        self.create_type_with_precision_scale(SqlTypeName::Decimal, precision, scale.min(precision))
            .ok()
    }
}

impl TypeFactory for DefaultTypeFactory {
    fn type_system(&self) -> &TypeSystem {
        &self.type_system
    }

    fn create_type(&self, type_name: SqlTypeName) -> RexResult<DataType> {
        self.check_simple(type_name)?;
        let precision = self.type_system.default_precision(type_name);
        let scale = if type_name == SqlTypeName::Decimal {
            Some(0)
        } else {
            None
        };
        let data_type = DataType::basic(type_name).set_precision(precision, scale);
        // NULL is always nullable
        let data_type = if type_name == SqlTypeName::Null {
            data_type.set_nullable(true)
        } else {
            data_type
        };
        Ok(self.with_default_charset(data_type))
    }

    fn create_type_with_precision(
        &self,
        type_name: SqlTypeName,
        precision: u32,
    ) -> RexResult<DataType> {
        self.check_simple(type_name)?;
        if !type_name.allows_precision_no_scale() {
            return Err(RexError::InvalidType(format!(
                "{} does not take a precision",
                type_name
            )));
        }
        let precision = self.cap_precision(type_name, precision);
        let scale = if type_name == SqlTypeName::Decimal {
            Some(0)
        } else {
            None
        };
        let data_type = DataType::basic(type_name).set_precision(Some(precision), scale);
        Ok(self.with_default_charset(data_type))
    }

    fn create_type_with_precision_scale(
        &self,
        type_name: SqlTypeName,
        precision: u32,
        scale: u32,
    ) -> RexResult<DataType> {
        if !type_name.allows_scale() {
            return Err(RexError::InvalidType(format!(
                "{} does not take a scale",
                type_name
            )));
        }
        if scale > self.type_system.max_numeric_scale() {
            return Err(RexError::InvalidType(format!(
                "Decimal scale {} exceeds maximum {}",
                scale,
                self.type_system.max_numeric_scale()
            )));
        }
        let precision = self.cap_precision(type_name, precision);
        if scale > precision {
            return Err(RexError::InvalidType(format!(
                "Decimal scale ({}) cannot be greater than precision ({})",
                scale, precision
            )));
        }
        Ok(DataType::basic(type_name).set_precision(Some(precision), Some(scale)))
    }

    fn create_type_with_nullability(&self, data_type: &DataType, nullable: bool) -> DataType {
        if data_type.is_nullable() == nullable || data_type.type_name() == SqlTypeName::Null {
            return data_type.clone();
        }
        data_type.clone().set_nullable(nullable)
    }

    fn create_type_with_charset(
        &self,
        data_type: &DataType,
        charset: &str,
        collation: &str,
    ) -> RexResult<DataType> {
        if !data_type.type_name().is_character() {
            return Err(RexError::InvalidType(format!(
                "{} has no character set",
                data_type
            )));
        }
        Ok(data_type
            .clone()
            .set_charset(Some(charset.to_string()), Some(collation.to_string())))
    }

    fn create_interval_type(&self, qualifier: IntervalQualifier) -> RexResult<DataType> {
        if !qualifier.range().is_interval_range() {
            return Err(RexError::InvalidType(format!(
                "{} is not a valid interval qualifier",
                qualifier.range()
            )));
        }
        let config = self.type_system.config();
        let qualifier = IntervalQualifier::with_precision(
            qualifier.range(),
            Some(
                qualifier
                    .start_precision()
                    .unwrap_or(config.default_interval_precision),
            ),
            Some(
                qualifier
                    .fraction_precision()
                    .unwrap_or(config.default_interval_fraction_precision),
            ),
        );
        Ok(DataType::basic(qualifier.type_name()).set_interval(qualifier))
    }

    fn create_array_type(&self, element: DataType) -> DataType {
        DataType::basic(SqlTypeName::Array).set_component(element)
    }

    fn create_multiset_type(&self, element: DataType) -> DataType {
        DataType::basic(SqlTypeName::Multiset).set_component(element)
    }

    fn create_map_type(&self, key: DataType, value: DataType) -> DataType {
        DataType::basic(SqlTypeName::Map)
            .set_key(key)
            .set_component(value)
    }

    fn create_struct_type(&self, fields: Vec<(String, DataType)>) -> DataType {
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(i, (name, t))| DataTypeField::new(name, i, t))
            .collect();
        DataType::basic(SqlTypeName::Row).set_fields(fields)
    }

    fn least_restrictive(&self, types: &[DataType]) -> Option<DataType> {
        if types.is_empty() {
            return None;
        }
        let any_nullable = types.iter().any(|t| t.is_nullable());
        let non_null: Vec<&DataType> = types
            .iter()
            .filter(|t| t.type_name() != SqlTypeName::Null)
            .collect();
        if non_null.is_empty() {
            return Some(types[0].clone());
        }
        let first = non_null[0];

        let result = if non_null.iter().all(|t| t.equals_sans_nullability(first)) {
            first.clone()
        } else if non_null.iter().all(|t| t.type_name().is_numeric()) {
            self.least_restrictive_numeric(&non_null)?
        } else if non_null.iter().all(|t| t.type_name().is_character()) {
            let all_char = non_null.iter().all(|t| t.type_name() == SqlTypeName::Char);
            let lengths: Vec<Option<u32>> = non_null.iter().map(|t| t.precision()).collect();
            let same_length = lengths.windows(2).all(|w| w[0] == w[1]);
            let max_len = lengths.iter().copied().max().flatten();
            let base = if all_char && same_length {
                first.clone()
            } else {
                match max_len {
                    // VARCHAR without precision absorbs everything
                    Some(len) if lengths.iter().all(|l| l.is_some()) => {
                        self.create_type_with_precision(SqlTypeName::Varchar, len).ok()?
                    }
                    _ => self.create_type(SqlTypeName::Varchar).ok()?,
                }
            };
            match (first.charset(), first.collation()) {
                (Some(cs), Some(co)) => self.create_type_with_charset(&base, cs, co).ok()?,
                _ => base,
            }
        } else if non_null
            .iter()
            .all(|t| t.type_name() == first.type_name() && t.type_name().is_datetime())
        {
            let precision = non_null.iter().filter_map(|t| t.precision()).max();
            match precision {
                Some(p) => self.create_type_with_precision(first.type_name(), p).ok()?,
                None => self.create_type(first.type_name()).ok()?,
            }
        } else if non_null.iter().all(|t| t.type_name() == first.type_name()) {
            // Same family with different attributes (e.g. interval precisions)
            first.clone()
        } else {
            return None;
        };
        Some(self.create_type_with_nullability(&result, any_nullable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::type_name::TimeUnitRange;

    #[test]
    fn test_default_precisions() {
        let factory = DefaultTypeFactory::default();
        let char_type = factory.create_type(SqlTypeName::Char).unwrap();
        assert_eq!(char_type.type_string(), "CHAR(1)");
        assert_eq!(char_type.charset(), Some("ISO-8859-1"));

        let ts = factory.create_type(SqlTypeName::Timestamp).unwrap();
        assert_eq!(ts.full_type_string(), "TIMESTAMP(0) NOT NULL");

        let dec = factory.create_type(SqlTypeName::Decimal).unwrap();
        assert_eq!(dec.type_string(), "DECIMAL(19, 0)");

        let null = factory.create_type(SqlTypeName::Null).unwrap();
        assert!(null.is_nullable());
    }

    #[test]
    fn test_datetime_precision_is_capped() {
        let factory = DefaultTypeFactory::default();
        let ts = factory
            .create_type_with_precision(SqlTypeName::Timestamp, 9)
            .unwrap();
        assert_eq!(ts.type_string(), "TIMESTAMP(3)");
        assert!(factory
            .create_type_with_precision(SqlTypeName::Integer, 3)
            .is_err());
    }

    #[test]
    fn test_interval_type() {
        let factory = DefaultTypeFactory::default();
        let t = factory
            .create_interval_type(IntervalQualifier::new(TimeUnitRange::DayToSecond))
            .unwrap();
        assert_eq!(t.type_string(), "INTERVAL DAY TO SECOND");
        assert!(factory
            .create_interval_type(IntervalQualifier::new(TimeUnitRange::Week))
            .is_err());
    }

    #[test]
    fn test_least_restrictive() {
        let factory = DefaultTypeFactory::default();
        let int = factory.create_type(SqlTypeName::Integer).unwrap();
        let bigint = factory.create_type(SqlTypeName::BigInt).unwrap();
        let double = factory.create_type(SqlTypeName::Double).unwrap();
        let null = factory.create_type(SqlTypeName::Null).unwrap();
        let dec = factory
            .create_type_with_precision_scale(SqlTypeName::Decimal, 5, 2)
            .unwrap();

        let t = factory.least_restrictive(&[int.clone(), bigint.clone()]).unwrap();
        assert_eq!(t, bigint);

        let t = factory.least_restrictive(&[int.clone(), double.clone()]).unwrap();
        assert_eq!(t.type_name(), SqlTypeName::Double);

        let t = factory.least_restrictive(&[int.clone(), dec]).unwrap();
        assert_eq!(t.type_string(), "DECIMAL(12, 2)");

        let t = factory.least_restrictive(&[int.clone(), null]).unwrap();
        assert_eq!(t.full_type_string(), "INTEGER");

        let boolean = factory.create_type(SqlTypeName::Boolean).unwrap();
        assert!(factory.least_restrictive(&[int, boolean]).is_none());
    }

    #[test]
    fn test_least_restrictive_strings() {
        let factory = DefaultTypeFactory::default();
        let c3 = factory.create_type_with_precision(SqlTypeName::Char, 3).unwrap();
        let c5 = factory.create_type_with_precision(SqlTypeName::Char, 5).unwrap();
        let t = factory.least_restrictive(&[c3.clone(), c5]).unwrap();
        assert_eq!(t.type_string(), "VARCHAR(5)");
        assert_eq!(factory.least_restrictive(&[c3.clone(), c3.clone()]), Some(c3));
    }
}

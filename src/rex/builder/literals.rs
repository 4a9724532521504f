//! Literal factories

use super::RexBuilder;
use crate::common::error::{RexError, RexResult};
use crate::contract_err;
use crate::operator::std_operators;
use crate::rex::literal::{LiteralValue, RexLiteral};
use crate::rex::node::RexNode;
use crate::types::{
    ByteString, DataType, DateString, IntervalQualifier, NlsString, SqlTypeName, Symbol,
    TimeString, TimeUnitRange, TimestampString,
};
use ordered_float::OrderedFloat;
use rust_decimal::Decimal;

impl RexBuilder {
    /// Literal of a storage category. The type's nullability is set from
    /// whether a value is present, strings pick up the type's character set
    /// and times are rounded to the type's precision.
    pub(crate) fn make_literal(
        &self,
        value: Option<LiteralValue>,
        data_type: DataType,
        type_name: SqlTypeName,
    ) -> RexResult<RexNode> {
        let data_type = self
            .type_factory
            .create_type_with_nullability(&data_type, value.is_none());
        let precision = data_type.precision().unwrap_or(0);
        let value = match value {
            Some(LiteralValue::String(s))
                if type_name == SqlTypeName::Char
                    && (s.charset().is_none() || s.collation().is_none()) =>
            {
                let config = self.config();
                let charset = data_type.charset().unwrap_or(&config.default_charset);
                let collation = data_type.collation().unwrap_or(&config.default_collation);
                Some(LiteralValue::String(s.resolve(charset, collation)))
            }
            Some(LiteralValue::Time(t))
                if matches!(
                    type_name,
                    SqlTypeName::Time | SqlTypeName::TimeWithLocalTimeZone
                ) =>
            {
                Some(LiteralValue::Time(t.round(precision)))
            }
            Some(LiteralValue::Timestamp(ts))
                if matches!(
                    type_name,
                    SqlTypeName::Timestamp | SqlTypeName::TimestampWithLocalTimeZone
                ) =>
            {
                Some(LiteralValue::Timestamp(ts.round(precision)))
            }
            other => other,
        };
        let literal = RexLiteral::new(value, data_type, type_name, &self.config().default_charset)?;
        Ok(literal.into())
    }

    pub fn make_bool_literal(&self, b: bool) -> RexNode {
        if b {
            self.boolean_true.clone()
        } else {
            self.boolean_false.clone()
        }
    }

    /// Exact numeric literal typed from its value: INTEGER when the value is
    /// integral and fits 32 bits, BIGINT when integral, DECIMAL otherwise
    pub fn make_exact_literal(&self, value: Decimal) -> RexResult<RexNode> {
        let scale = value.scale();
        let max_scale = self.type_factory.type_system().max_numeric_scale();
        if scale > max_scale {
            return Err(contract_err!(
                "Scale {} of {} exceeds maximum scale {}",
                scale,
                value,
                max_scale
            ));
        }
        let data_type = if scale == 0 {
            if value >= Decimal::from(i32::MIN) && value <= Decimal::from(i32::MAX) {
                self.type_factory.create_type(SqlTypeName::Integer)?
            } else {
                self.type_factory.create_type(SqlTypeName::BigInt)?
            }
        } else {
            let digits = value.mantissa().unsigned_abs().to_string().len() as u32;
            let precision = if digits > scale { digits } else { scale + 1 };
            self.type_factory.create_type_with_precision_scale(
                SqlTypeName::Decimal,
                precision,
                scale,
            )?
        };
        self.make_exact_literal_typed(value, data_type)
    }

    pub fn make_exact_literal_typed(
        &self,
        value: Decimal,
        data_type: DataType,
    ) -> RexResult<RexNode> {
        self.make_literal(Some(LiteralValue::Decimal(value)), data_type, SqlTypeName::Decimal)
    }

    pub fn make_bigint_literal(&self, value: Decimal) -> RexResult<RexNode> {
        let bigint = self.type_factory.create_type(SqlTypeName::BigInt)?;
        self.make_exact_literal_typed(value, bigint)
    }

    /// DOUBLE literal; negative zero becomes zero
    pub fn make_approx_literal(&self, value: f64) -> RexResult<RexNode> {
        let double = self.type_factory.create_type(SqlTypeName::Double)?;
        self.make_approx_literal_typed(value, double)
    }

    pub fn make_approx_literal_typed(&self, value: f64, data_type: DataType) -> RexResult<RexNode> {
        if !data_type.type_name().is_approximate_numeric() {
            return Err(contract_err!(
                "Approximate literal cannot have type {}",
                data_type
            ));
        }
        let value = if value == 0.0 { 0.0 } else { value };
        self.make_literal(
            Some(LiteralValue::Double(OrderedFloat(value))),
            data_type,
            SqlTypeName::Double,
        )
    }

    /// Character literal in the default character set
    pub fn make_string_literal(&self, value: &str) -> RexResult<RexNode> {
        if value.is_empty() {
            return Ok(self.char_empty.clone());
        }
        self.make_char_literal(NlsString::new(value))
    }

    /// `CHAR(n)` literal, `n` being the string's length
    pub fn make_char_literal(&self, value: NlsString) -> RexResult<RexNode> {
        let config = self.config();
        let charset = value
            .charset()
            .unwrap_or(&config.default_charset)
            .to_string();
        let collation = value
            .collation()
            .unwrap_or(&config.default_collation)
            .to_string();
        let char_type = self
            .type_factory
            .create_type_with_precision(SqlTypeName::Char, value.len() as u32)?;
        let char_type = self
            .type_factory
            .create_type_with_charset(&char_type, &charset, &collation)?;
        self.make_literal(Some(LiteralValue::String(value)), char_type, SqlTypeName::Char)
    }

    /// `BINARY(n)` literal, `n` being the byte count
    pub fn make_binary_literal(&self, value: ByteString) -> RexResult<RexNode> {
        let binary = self
            .type_factory
            .create_type_with_precision(SqlTypeName::Binary, value.len() as u32)?;
        self.make_literal(Some(LiteralValue::Binary(value)), binary, SqlTypeName::Binary)
    }

    pub fn make_date_literal(&self, value: DateString) -> RexResult<RexNode> {
        let date = self.type_factory.create_type(SqlTypeName::Date)?;
        self.make_literal(Some(LiteralValue::Date(value)), date, SqlTypeName::Date)
    }

    pub fn make_time_literal(&self, value: TimeString, precision: u32) -> RexResult<RexNode> {
        self.make_time_literal_of(value, precision, SqlTypeName::Time)
    }

    pub fn make_time_with_local_time_zone_literal(
        &self,
        value: TimeString,
        precision: u32,
    ) -> RexResult<RexNode> {
        self.make_time_literal_of(value, precision, SqlTypeName::TimeWithLocalTimeZone)
    }

    fn make_time_literal_of(
        &self,
        value: TimeString,
        precision: u32,
        type_name: SqlTypeName,
    ) -> RexResult<RexNode> {
        let time = self
            .type_factory
            .create_type_with_precision(type_name, precision)?;
        self.make_literal(Some(LiteralValue::Time(value)), time, type_name)
    }

    pub fn make_timestamp_literal(
        &self,
        value: TimestampString,
        precision: u32,
    ) -> RexResult<RexNode> {
        self.make_timestamp_literal_of(value, precision, SqlTypeName::Timestamp)
    }

    pub fn make_timestamp_with_local_time_zone_literal(
        &self,
        value: TimestampString,
        precision: u32,
    ) -> RexResult<RexNode> {
        self.make_timestamp_literal_of(value, precision, SqlTypeName::TimestampWithLocalTimeZone)
    }

    fn make_timestamp_literal_of(
        &self,
        value: TimestampString,
        precision: u32,
        type_name: SqlTypeName,
    ) -> RexResult<RexNode> {
        let timestamp = self
            .type_factory
            .create_type_with_precision(type_name, precision)?;
        self.make_literal(Some(LiteralValue::Timestamp(value)), timestamp, type_name)
    }

    /// Interval literal; the value is in months for year-month intervals and
    /// in milliseconds otherwise. `None` makes a NULL interval.
    pub fn make_interval_literal(
        &self,
        value: Option<Decimal>,
        qualifier: IntervalQualifier,
    ) -> RexResult<RexNode> {
        let type_name = qualifier.type_name();
        let interval = self.type_factory.create_interval_type(qualifier)?;
        self.make_literal(value.map(LiteralValue::Decimal), interval, type_name)
    }

    /// Flag naming an interval's units, as used by EXTRACT, CEIL and FLOOR
    pub fn make_interval_flag(&self, range: TimeUnitRange) -> RexResult<RexNode> {
        self.make_flag(range)
    }

    /// SYMBOL literal
    pub fn make_flag(&self, flag: impl Into<Symbol>) -> RexResult<RexNode> {
        let symbol = self.type_factory.create_type(SqlTypeName::Symbol)?;
        self.make_literal(
            Some(LiteralValue::Symbol(flag.into())),
            symbol,
            SqlTypeName::Symbol,
        )
    }

    /// NULL literal of a type; the type is made nullable
    pub fn make_null_literal(&self, data_type: &DataType) -> RexResult<RexNode> {
        let data_type = self
            .type_factory
            .create_type_with_nullability(data_type, true);
        self.make_cast(&data_type, self.constant_null())
    }

    /// Zero, FALSE, the empty string or the epoch, as fits the type
    pub fn make_zero_literal(&self, data_type: &DataType) -> RexResult<RexNode> {
        let zero = self.zero_value(data_type)?;
        self.make_literal_of_type(Some(zero), data_type, false)
    }

    fn zero_value(&self, data_type: &DataType) -> RexResult<LiteralValue> {
        let precision = data_type.precision().unwrap_or(0) as usize;
        let value = match data_type.type_name() {
            SqlTypeName::Char => LiteralValue::String(NlsString::new(" ".repeat(precision))),
            SqlTypeName::Varchar | SqlTypeName::Json => LiteralValue::String(NlsString::new("")),
            SqlTypeName::Binary => LiteralValue::Binary(ByteString::new(vec![0u8; precision])),
            SqlTypeName::Varbinary => LiteralValue::Binary(ByteString::new(Vec::new())),
            SqlTypeName::TinyInt
            | SqlTypeName::SmallInt
            | SqlTypeName::Integer
            | SqlTypeName::BigInt
            | SqlTypeName::Decimal
            | SqlTypeName::Interval(_) => LiteralValue::Decimal(Decimal::ZERO),
            SqlTypeName::Float | SqlTypeName::Real | SqlTypeName::Double => {
                LiteralValue::Double(OrderedFloat(0.0))
            }
            SqlTypeName::Boolean => LiteralValue::Boolean(false),
            SqlTypeName::Date => LiteralValue::Date(DateString::from_days_since_epoch(0)?),
            SqlTypeName::Time | SqlTypeName::TimeWithLocalTimeZone => {
                LiteralValue::Time(TimeString::new(0, 0, 0)?)
            }
            SqlTypeName::Timestamp | SqlTypeName::TimestampWithLocalTimeZone => {
                LiteralValue::Timestamp(TimestampString::from_millis_since_epoch(0)?)
            }
            other => {
                return Err(RexError::InvalidType(format!(
                    "Type {} has no zero value",
                    other
                )))
            }
        };
        Ok(value)
    }

    /// Literal of an arbitrary type
    ///
    /// Values are converted to the type's representation first: strings
    /// take the type's character set, CHAR and BINARY values are padded to
    /// the type's length, numbers switch between exact and approximate
    /// form. ARRAY and MAP values become constructor calls. With
    /// `allow_cast`, a nullable type, a VARCHAR or a VARBINARY wraps the
    /// literal in a cast so the result has exactly the requested type.
    pub fn make_literal_of_type(
        &self,
        value: Option<LiteralValue>,
        data_type: &DataType,
        allow_cast: bool,
    ) -> RexResult<RexNode> {
        let value = match value {
            None => return self.make_cast(data_type, self.constant_null()),
            Some(v) => v,
        };
        let mut data_type = data_type.clone();
        if data_type.is_nullable() {
            let not_null = self
                .type_factory
                .create_type_with_nullability(&data_type, false);
            if allow_cast {
                let literal = self.make_literal_of_type(Some(value), &not_null, allow_cast)?;
                return Ok(self.make_abstract_cast(&data_type, literal));
            }
            data_type = not_null;
        }
        let value = self.clean(value, &data_type)?;
        let ops = std_operators();
        match (data_type.type_name(), value) {
            (SqlTypeName::Char, LiteralValue::String(s)) => {
                let padded = match data_type.precision() {
                    Some(p) if (p as usize) > s.len() => {
                        let pad = " ".repeat(p as usize - s.len());
                        s.copy_with(format!("{}{}", s.value(), pad))
                    }
                    _ => s,
                };
                self.make_char_literal(padded)
            }
            (SqlTypeName::Varchar | SqlTypeName::Json, LiteralValue::String(s)) => {
                let literal = self.make_char_literal(s)?;
                if allow_cast {
                    self.make_cast(&data_type, literal)
                } else {
                    Ok(literal)
                }
            }
            (SqlTypeName::Binary, LiteralValue::Binary(b)) => {
                let padded = match data_type.precision() {
                    Some(p) => b.pad_right(p as usize),
                    None => b,
                };
                self.make_binary_literal(padded)
            }
            (SqlTypeName::Varbinary, LiteralValue::Binary(b)) => {
                let literal = self.make_binary_literal(b)?;
                if allow_cast {
                    self.make_cast(&data_type, literal)
                } else {
                    Ok(literal)
                }
            }
            (name, LiteralValue::Decimal(d)) if name.is_exact_numeric() => {
                self.make_exact_literal_typed(d, data_type)
            }
            (name, LiteralValue::Double(f)) if name.is_approximate_numeric() => {
                self.make_approx_literal_typed(f.0, data_type)
            }
            (SqlTypeName::Boolean, LiteralValue::Boolean(b)) => Ok(self.make_bool_literal(b)),
            (SqlTypeName::Time, LiteralValue::Time(t)) => {
                self.make_time_literal(t, data_type.precision().unwrap_or(0))
            }
            (SqlTypeName::TimeWithLocalTimeZone, LiteralValue::Time(t)) => {
                self.make_time_with_local_time_zone_literal(t, data_type.precision().unwrap_or(0))
            }
            (SqlTypeName::Date, LiteralValue::Date(d)) => self.make_date_literal(d),
            (SqlTypeName::Timestamp, LiteralValue::Timestamp(ts)) => {
                self.make_timestamp_literal(ts, data_type.precision().unwrap_or(0))
            }
            (SqlTypeName::TimestampWithLocalTimeZone, LiteralValue::Timestamp(ts)) => self
                .make_timestamp_with_local_time_zone_literal(
                    ts,
                    data_type.precision().unwrap_or(0),
                ),
            (SqlTypeName::Interval(_), LiteralValue::Decimal(d)) => {
                let qualifier = data_type.interval_qualifier().cloned().ok_or_else(|| {
                    contract_err!("Interval type {} has no qualifier", data_type)
                })?;
                self.make_interval_literal(Some(d), qualifier)
            }
            (SqlTypeName::Symbol, LiteralValue::Symbol(s)) => self.make_flag(s),
            (SqlTypeName::Map, LiteralValue::Map(entries)) => {
                let (key_type, value_type) = match (data_type.key_type(), data_type.value_type()) {
                    (Some(k), Some(v)) => (k.clone(), v.clone()),
                    _ => {
                        return Err(contract_err!(
                            "Map type {} has no key or value type",
                            data_type
                        ))
                    }
                };
                let mut operands = Vec::with_capacity(entries.len() * 2);
                for (k, v) in entries {
                    let (k, v) = (k.value().cloned(), v.value().cloned());
                    operands.push(self.make_literal_of_type(k, &key_type, allow_cast)?);
                    operands.push(self.make_literal_of_type(v, &value_type, allow_cast)?);
                }
                self.make_call(&ops.map_value_constructor, operands)
            }
            (SqlTypeName::Array, LiteralValue::List(items)) => {
                let operands = self.component_literals(&items, &data_type, allow_cast)?;
                self.make_call(&ops.array_value_constructor, operands)
            }
            (SqlTypeName::Multiset, LiteralValue::List(items)) => {
                let operands = self.component_literals(&items, &data_type, allow_cast)?;
                if allow_cast {
                    self.make_call(&ops.multiset_value, operands)
                } else {
                    self.make_list_literal(operands, data_type)
                }
            }
            (SqlTypeName::Row, LiteralValue::List(items)) => {
                if items.len() != data_type.field_count() {
                    return Err(contract_err!(
                        "Row value has {} fields, type {} has {}",
                        items.len(),
                        data_type,
                        data_type.field_count()
                    ));
                }
                let mut operands = Vec::with_capacity(items.len());
                for (item, field) in items.iter().zip(data_type.fields()) {
                    operands.push(self.make_literal_of_type(
                        item.value().cloned(),
                        field.data_type(),
                        false,
                    )?);
                }
                self.make_list_literal(operands, data_type)
            }
            (SqlTypeName::Any, value) => {
                let guessed = self.guess_type(&value)?;
                self.make_literal_of_type(Some(value), &guessed, allow_cast)
            }
            (name, value) => Err(RexError::InvalidArgument(format!(
                "Value {:?} is not valid for type {}",
                value, name
            ))),
        }
    }

    fn component_literals(
        &self,
        items: &[RexLiteral],
        data_type: &DataType,
        allow_cast: bool,
    ) -> RexResult<Vec<RexNode>> {
        let component = data_type
            .component_type()
            .ok_or_else(|| contract_err!("Collection type {} has no component type", data_type))?;
        items
            .iter()
            .map(|item| self.make_literal_of_type(item.value().cloned(), component, allow_cast))
            .collect()
    }

    fn make_list_literal(&self, operands: Vec<RexNode>, data_type: DataType) -> RexResult<RexNode> {
        let mut items = Vec::with_capacity(operands.len());
        for operand in operands {
            match operand.as_literal() {
                Some(literal) => items.push(literal.clone()),
                None => {
                    return Err(contract_err!(
                        "Element {} of a {} literal is not a literal",
                        operand,
                        data_type
                    ))
                }
            }
        }
        let type_name = data_type.type_name();
        self.make_literal(Some(LiteralValue::List(items)), data_type, type_name)
    }

    /// Convert a value to the representation a type expects
    fn clean(&self, value: LiteralValue, data_type: &DataType) -> RexResult<LiteralValue> {
        let name = data_type.type_name();
        let cleaned = match value {
            LiteralValue::String(s)
                if name.is_character() && (s.charset().is_none() || s.collation().is_none()) =>
            {
                let config = self.config();
                let charset = data_type.charset().unwrap_or(&config.default_charset);
                let collation = data_type.collation().unwrap_or(&config.default_collation);
                LiteralValue::String(s.resolve(charset, collation))
            }
            LiteralValue::Double(f) if name.is_exact_numeric() || name.is_interval() => {
                LiteralValue::Decimal(Decimal::from_f64_retain(f.0).ok_or_else(|| {
                    RexError::InvalidArgument(format!("{} has no exact representation", f.0))
                })?)
            }
            LiteralValue::Decimal(d) if name.is_approximate_numeric() => {
                use num_traits::ToPrimitive;
                LiteralValue::Double(OrderedFloat(d.to_f64().ok_or_else(|| {
                    RexError::InvalidArgument(format!("{} has no approximate representation", d))
                })?))
            }
            other => other,
        };
        Ok(cleaned)
    }

    /// Type of a value whose declared type is ANY
    fn guess_type(&self, value: &LiteralValue) -> RexResult<DataType> {
        let factory = &self.type_factory;
        match value {
            LiteralValue::Double(_) => factory.create_type(SqlTypeName::Double),
            LiteralValue::Decimal(_) => factory.create_type(SqlTypeName::BigInt),
            LiteralValue::Boolean(_) => factory.create_type(SqlTypeName::Boolean),
            LiteralValue::String(s) => {
                factory.create_type_with_precision(SqlTypeName::Char, s.len() as u32)
            }
            LiteralValue::Binary(b) => {
                factory.create_type_with_precision(SqlTypeName::Binary, b.len() as u32)
            }
            LiteralValue::Date(_) => factory.create_type(SqlTypeName::Date),
            LiteralValue::Time(_) => factory.create_type(SqlTypeName::Time),
            LiteralValue::Timestamp(_) => factory.create_type(SqlTypeName::Timestamp),
            other => Err(RexError::InvalidArgument(format!(
                "Cannot guess the type of {:?}",
                other
            ))),
        }
    }
}

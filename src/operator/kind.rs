//! Kind tags for expression nodes and operators

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of node and operator kinds, used for fast dispatch and
/// category tests such as "is this a comparison"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    // Leaves
    Literal,
    InputRef,
    LocalRef,
    Correlation,
    DynamicParam,
    FieldAccess,
    NameRef,
    PatternInputRef,
    TableInputRef,
    RangeRef,

    // Comparison
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    IsDistinctFrom,
    IsNotDistinctFrom,

    // Logical
    And,
    Or,
    Not,

    // Null and truth tests
    IsNull,
    IsNotNull,
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,

    // Arithmetic
    Plus,
    Minus,
    Times,
    Divide,
    DivideInteger,
    Mod,
    PlusPrefix,
    MinusPrefix,

    // Conditional
    Case,
    Coalesce,

    // Conversion
    Cast,
    Reinterpret,

    // Datetime
    Ceil,
    Floor,
    Extract,

    // Aggregates
    Count,
    Sum,
    Sum0,
    Min,
    Max,
    Avg,

    // Constructors and access
    ArrayValueConstructor,
    MapValueConstructor,
    MultisetValueConstructor,
    NewSpecification,
    Item,

    // Sub-queries
    In,
    Exists,
    ScalarQuery,
    Some,
    All,

    // Windowed aggregate
    Over,

    OtherFunction,
    Other,
}

impl Kind {
    /// `=`, `<>`, `<`, `<=`, `>`, `>=`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Kind::Equals
                | Kind::NotEquals
                | Kind::GreaterThan
                | Kind::GreaterThanOrEqual
                | Kind::LessThan
                | Kind::LessThanOrEqual
        )
    }

    /// Comparisons plus the null-safe distinctness tests
    pub fn is_binary_comparison(&self) -> bool {
        self.is_comparison() || matches!(self, Kind::IsDistinctFrom | Kind::IsNotDistinctFrom)
    }

    /// `+`, `-`, `*`, `/`, `MOD`
    pub fn is_binary_arithmetic(&self) -> bool {
        matches!(
            self,
            Kind::Plus | Kind::Minus | Kind::Times | Kind::Divide | Kind::Mod
        )
    }

    /// Binary operators whose literal operands can drop their type suffix
    /// when the other operand pins the type
    pub fn is_simple_binary(&self) -> bool {
        self.is_binary_arithmetic() || self.is_binary_comparison()
    }

    pub fn is_arithmetic(&self) -> bool {
        self.is_binary_arithmetic()
            || matches!(self, Kind::DivideInteger | Kind::PlusPrefix | Kind::MinusPrefix)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Kind::And | Kind::Or | Kind::Not)
    }

    /// `IS [NOT] NULL`, `IS [NOT] TRUE`, `IS [NOT] FALSE`
    pub fn is_predicate_test(&self) -> bool {
        matches!(
            self,
            Kind::IsNull
                | Kind::IsNotNull
                | Kind::IsTrue
                | Kind::IsNotTrue
                | Kind::IsFalse
                | Kind::IsNotFalse
        )
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Kind::Count | Kind::Sum | Kind::Sum0 | Kind::Min | Kind::Max | Kind::Avg
        )
    }

    pub fn is_sub_query(&self) -> bool {
        matches!(
            self,
            Kind::In | Kind::Exists | Kind::ScalarQuery | Kind::Some | Kind::All
        )
    }

    pub fn is_constructor(&self) -> bool {
        matches!(
            self,
            Kind::ArrayValueConstructor
                | Kind::MapValueConstructor
                | Kind::MultisetValueConstructor
                | Kind::NewSpecification
        )
    }

    /// Comparison with its operands swapped: `a < b` is `b > a`
    pub fn reverse(&self) -> Kind {
        match self {
            Kind::GreaterThan => Kind::LessThan,
            Kind::GreaterThanOrEqual => Kind::LessThanOrEqual,
            Kind::LessThan => Kind::GreaterThan,
            Kind::LessThanOrEqual => Kind::GreaterThanOrEqual,
            other => *other,
        }
    }

    /// Logical negation of a comparison or test, where one exists
    pub fn negate(&self) -> Option<Kind> {
        let kind = match self {
            Kind::Equals => Kind::NotEquals,
            Kind::NotEquals => Kind::Equals,
            Kind::GreaterThan => Kind::LessThanOrEqual,
            Kind::GreaterThanOrEqual => Kind::LessThan,
            Kind::LessThan => Kind::GreaterThanOrEqual,
            Kind::LessThanOrEqual => Kind::GreaterThan,
            Kind::IsDistinctFrom => Kind::IsNotDistinctFrom,
            Kind::IsNotDistinctFrom => Kind::IsDistinctFrom,
            Kind::IsNull => Kind::IsNotNull,
            Kind::IsNotNull => Kind::IsNull,
            Kind::IsTrue => Kind::IsNotTrue,
            Kind::IsNotTrue => Kind::IsTrue,
            Kind::IsFalse => Kind::IsNotFalse,
            Kind::IsNotFalse => Kind::IsFalse,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_categories() {
        assert!(Kind::LessThan.is_comparison());
        assert!(!Kind::IsDistinctFrom.is_comparison());
        assert!(Kind::IsDistinctFrom.is_simple_binary());
        assert!(Kind::Mod.is_simple_binary());
        assert!(!Kind::DivideInteger.is_simple_binary());
        assert!(Kind::Sum0.is_aggregate());
        assert!(Kind::ScalarQuery.is_sub_query());
    }

    #[test]
    fn test_kind_negate_and_reverse() {
        assert_eq!(Kind::LessThan.reverse(), Kind::GreaterThan);
        assert_eq!(Kind::Equals.reverse(), Kind::Equals);
        assert_eq!(Kind::IsTrue.negate(), Some(Kind::IsNotTrue));
        assert_eq!(Kind::Plus.negate(), None);
    }
}

//! Leaf references: slots, locals, correlation variables, parameters and ranges
//!
//! Each leaf carries its own name, which is also its digest.

use crate::types::DataType;
use std::fmt;

/// Reference to a field of the input row, by ordinal
#[derive(Debug, Clone)]
pub struct RexInputRef {
    index: usize,
    data_type: DataType,
    name: String,
}

impl RexInputRef {
    pub(crate) fn new(index: usize, data_type: DataType) -> Self {
        Self {
            index,
            data_type,
            name: format!("${}", index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Reference to an expression of an enclosing local program
#[derive(Debug, Clone)]
pub struct RexLocalRef {
    index: usize,
    data_type: DataType,
    name: String,
}

impl RexLocalRef {
    pub fn new(index: usize, data_type: DataType) -> Self {
        Self {
            index,
            data_type,
            name: format!("$t{}", index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Identifier of a correlation slot shared between a correlate and its right input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(pub u32);

impl CorrelationId {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$cor{}", self.0)
    }
}

/// Correlation variable: the current row of an enclosing relation
#[derive(Debug, Clone)]
pub struct RexCorrelVariable {
    id: CorrelationId,
    data_type: DataType,
    name: String,
}

impl RexCorrelVariable {
    pub(crate) fn new(id: CorrelationId, data_type: DataType) -> Self {
        Self {
            name: id.to_string(),
            id,
            data_type,
        }
    }

    pub fn id(&self) -> CorrelationId {
        self.id
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Dynamic parameter `?n`, bound at execution time
#[derive(Debug, Clone)]
pub struct RexDynamicParam {
    index: usize,
    param_name: Option<String>,
    data_type: DataType,
    name: String,
}

impl RexDynamicParam {
    pub(crate) fn new(index: usize, param_name: Option<String>, data_type: DataType) -> Self {
        Self {
            index,
            param_name,
            data_type,
            name: format!("?{}", index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Name given to the parameter by the statement, if any
    pub fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Unresolved dotted-path reference, used before names are bound to slots
#[derive(Debug, Clone)]
pub struct RexNameRef {
    names: Vec<String>,
    index: Option<usize>,
    data_type: DataType,
    name: String,
}

impl RexNameRef {
    pub(crate) fn new(names: Vec<String>, index: Option<usize>, data_type: DataType) -> Self {
        Self {
            name: names.join("."),
            names,
            index,
            data_type,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolved slot, once known
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Field of a row-pattern variable, e.g. `A.$0` in MATCH_RECOGNIZE
#[derive(Debug, Clone)]
pub struct RexPatternFieldRef {
    alpha: String,
    index: usize,
    data_type: DataType,
    name: String,
}

impl RexPatternFieldRef {
    pub(crate) fn new(alpha: impl Into<String>, index: usize, data_type: DataType) -> Self {
        let alpha = alpha.into();
        Self {
            name: format!("{}.${}", alpha, index),
            alpha,
            index,
            data_type,
        }
    }

    pub fn alpha(&self) -> &str {
        &self.alpha
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One occurrence of a table in a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelTableRef {
    qualified_name: Vec<String>,
    entity_number: usize,
}

impl RelTableRef {
    pub fn new(qualified_name: Vec<String>, entity_number: usize) -> Self {
        Self {
            qualified_name,
            entity_number,
        }
    }

    pub fn qualified_name(&self) -> &[String] {
        &self.qualified_name
    }

    pub fn entity_number(&self) -> usize {
        self.entity_number
    }
}

impl fmt::Display for RelTableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}.#{}]", self.qualified_name.join("."), self.entity_number)
    }
}

/// Slot reference qualified by the table occurrence it comes from, for lineage
#[derive(Debug, Clone)]
pub struct RexTableInputRef {
    table: RelTableRef,
    index: usize,
    data_type: DataType,
    name: String,
}

impl RexTableInputRef {
    pub(crate) fn new(table: RelTableRef, index: usize, data_type: DataType) -> Self {
        Self {
            name: format!("{}.${}", table, index),
            table,
            index,
            data_type,
        }
    }

    pub fn table(&self) -> &RelTableRef {
        &self.table
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A contiguous span of input fields starting at `offset`
///
/// Only exists while a tree is being built; field accesses on a range are
/// resolved to input references.
#[derive(Debug, Clone)]
pub struct RexRangeRef {
    offset: usize,
    data_type: DataType,
    name: String,
}

impl RexRangeRef {
    pub(crate) fn new(data_type: DataType, offset: usize) -> Self {
        Self {
            offset,
            data_type,
            name: format!("offset({})", offset),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

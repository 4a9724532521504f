//! Renumbering of input references

use crate::common::error::{RexError, RexResult};
use crate::operator::Kind;
use crate::rex::call::RexCall;
use crate::rex::node::RexNode;
use crate::rex::variable::RexInputRef;
use crate::rex::visitor::{visit_operands, RexShuttle};
use crate::types::{DataType, DataTypeField};
use std::fmt;
use std::sync::Arc;

/// Partial function from source ordinals to target ordinals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    targets: Vec<Option<usize>>,
    target_count: usize,
}

impl Mapping {
    /// Mapping with no source mapped
    pub fn new(source_count: usize, target_count: usize) -> Self {
        Self {
            targets: vec![None; source_count],
            target_count,
        }
    }

    pub fn identity(count: usize) -> Self {
        Self {
            targets: (0..count).map(Some).collect(),
            target_count: count,
        }
    }

    /// Mapping that moves every source `offset` places to the right
    pub fn shift(source_count: usize, offset: usize) -> Self {
        Self {
            targets: (0..source_count).map(|i| Some(i + offset)).collect(),
            target_count: source_count + offset,
        }
    }

    /// Mapping whose source `i` goes to `targets[i]`
    pub fn from_targets(targets: &[usize], target_count: usize) -> RexResult<Self> {
        let mut mapping = Self::new(targets.len(), target_count);
        for (source, &target) in targets.iter().enumerate() {
            mapping.set(source, target)?;
        }
        Ok(mapping)
    }

    pub fn set(&mut self, source: usize, target: usize) -> RexResult<()> {
        if source >= self.targets.len() || target >= self.target_count {
            return Err(RexError::InvalidArgument(format!(
                "Cannot map {} -> {} in a mapping of {} sources and {} targets",
                source,
                target,
                self.targets.len(),
                self.target_count
            )));
        }
        self.targets[source] = Some(target);
        Ok(())
    }

    pub fn get_target_opt(&self, source: usize) -> Option<usize> {
        self.targets.get(source).copied().flatten()
    }

    pub fn get_target(&self, source: usize) -> RexResult<usize> {
        self.get_target_opt(source).ok_or_else(|| {
            RexError::InvalidArgument(format!("Source {} is not mapped", source))
        })
    }

    pub fn source_count(&self) -> usize {
        self.targets.len()
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn is_identity(&self) -> bool {
        self.targets.len() == self.target_count
            && self
                .targets
                .iter()
                .enumerate()
                .all(|(i, t)| *t == Some(i))
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .targets
            .iter()
            .enumerate()
            .filter_map(|(s, t)| t.map(|t| format!("{}:{}", s, t)))
            .collect();
        write!(f, "[{}]", pairs.join(", "))
    }
}

/// Shuttle that moves input references to their mapped ordinals.
///
/// `fields` are the fields of the target row. A `_get(expr, 'name')` call
/// whose name is one of them becomes a reference to that field.
pub struct RexPermuteInputsShuttle {
    mapping: Mapping,
    fields: Vec<DataTypeField>,
}

impl RexPermuteInputsShuttle {
    pub fn new(mapping: Mapping, fields: Vec<DataTypeField>) -> Self {
        Self { mapping, fields }
    }

    /// Shuttle whose known fields are the concatenated fields of `inputs`
    pub fn of(mapping: Mapping, inputs: &[&DataType]) -> Self {
        let fields = inputs
            .iter()
            .flat_map(|row| row.fields().iter().cloned())
            .collect();
        Self::new(mapping, fields)
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }
}

impl RexShuttle for RexPermuteInputsShuttle {
    fn visit_input_ref(&mut self, input_ref: &Arc<RexInputRef>) -> RexResult<RexNode> {
        let target = self.mapping.get_target(input_ref.index())?;
        if target == input_ref.index() {
            return Ok(RexNode::InputRef(input_ref.clone()));
        }
        Ok(RexInputRef::new(target, input_ref.data_type().clone()).into())
    }

    fn visit_call(&mut self, call: &Arc<RexCall>) -> RexResult<RexNode> {
        if call.kind() == Kind::Item && call.op().name() == "_get" {
            let name = call
                .operand(1)
                .and_then(|o| o.as_literal())
                .and_then(|l| l.string_value());
            if let Some(i) = name.and_then(|n| self.lookup(n)) {
                let data_type = self.fields[i].data_type().clone();
                return Ok(RexInputRef::new(i, data_type).into());
            }
        }
        match visit_operands(self, call.operands())? {
            Some(operands) => Ok(RexNode::Call(Arc::new(call.clone_with(operands)))),
            None => Ok(RexNode::Call(call.clone())),
        }
    }
}

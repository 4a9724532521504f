//! Operator applications

use crate::operator::{Kind, OperatorRef};
use crate::rex::digest;
use crate::rex::node::RexNode;
use crate::types::DataType;
use std::sync::OnceLock;

/// An operator applied to operands
///
/// Calls are created through the builder, which checks arity and derives
/// the result type.
#[derive(Debug, Clone)]
pub struct RexCall {
    op: OperatorRef,
    operands: Vec<RexNode>,
    data_type: DataType,
    digest: OnceLock<String>,
}

impl RexCall {
    pub(crate) fn new(data_type: DataType, op: OperatorRef, operands: Vec<RexNode>) -> Self {
        Self {
            op,
            operands,
            data_type,
            digest: OnceLock::new(),
        }
    }

    pub fn op(&self) -> &OperatorRef {
        &self.op
    }

    pub fn kind(&self) -> Kind {
        self.op.kind()
    }

    pub fn operands(&self) -> &[RexNode] {
        &self.operands
    }

    pub fn operand(&self, i: usize) -> Option<&RexNode> {
        self.operands.get(i)
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Same operator and type over new operands
    pub fn clone_with(&self, operands: Vec<RexNode>) -> Self {
        Self::new(self.data_type.clone(), self.op.clone(), operands)
    }

    pub fn digest(&self) -> &str {
        self.digest.get_or_init(|| {
            let mut s = format!(
                "{}({})",
                self.op.name(),
                digest::operand_list(self.kind(), &self.operands)
            );
            if matches!(self.kind(), Kind::Cast | Kind::NewSpecification) {
                s.push(':');
                s.push_str(&self.data_type.full_type_string());
            }
            s
        })
    }

    pub fn is_always_true(&self) -> bool {
        match self.kind() {
            Kind::IsNotNull => self.first_not_nullable(),
            Kind::IsNotTrue | Kind::IsFalse | Kind::Not => {
                self.operands.first().is_some_and(|o| o.is_always_false())
            }
            Kind::IsNotFalse | Kind::IsTrue | Kind::Cast => {
                self.operands.first().is_some_and(|o| o.is_always_true())
            }
            _ => false,
        }
    }

    pub fn is_always_false(&self) -> bool {
        match self.kind() {
            Kind::IsNull => self.first_not_nullable(),
            Kind::IsNotTrue | Kind::IsFalse | Kind::Not => {
                self.operands.first().is_some_and(|o| o.is_always_true())
            }
            Kind::IsNotFalse | Kind::IsTrue | Kind::Cast => {
                self.operands.first().is_some_and(|o| o.is_always_false())
            }
            _ => false,
        }
    }

    fn first_not_nullable(&self) -> bool {
        self.operands
            .first()
            .is_some_and(|o| !o.data_type().is_nullable())
    }
}

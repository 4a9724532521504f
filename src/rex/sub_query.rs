//! Sub-query expressions: `IN`, `EXISTS`, scalar and quantified comparisons

use crate::operator::{Kind, OperatorRef};
use crate::rex::digest;
use crate::rex::node::RexNode;
use crate::types::DataType;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A relational sub-plan as seen from an expression
pub trait RelPlan: fmt::Debug + Send + Sync {
    /// Row type the plan produces
    fn row_type(&self) -> &DataType;

    /// Printable form of the plan, embedded in sub-query digests
    fn explain(&self) -> String;
}

/// Expression over the result of a sub-plan
#[derive(Debug, Clone)]
pub struct RexSubQuery {
    op: OperatorRef,
    operands: Vec<RexNode>,
    plan: Arc<dyn RelPlan>,
    data_type: DataType,
    digest: OnceLock<String>,
}

impl RexSubQuery {
    pub(crate) fn new(
        data_type: DataType,
        op: OperatorRef,
        operands: Vec<RexNode>,
        plan: Arc<dyn RelPlan>,
    ) -> Self {
        Self {
            op,
            operands,
            plan,
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

    pub fn plan(&self) -> &Arc<dyn RelPlan> {
        &self.plan
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn clone_with(&self, operands: Vec<RexNode>) -> Self {
        Self::new(
            self.data_type.clone(),
            self.op.clone(),
            operands,
            self.plan.clone(),
        )
    }

    pub fn clone_with_plan(&self, plan: Arc<dyn RelPlan>) -> Self {
        Self::new(
            self.data_type.clone(),
            self.op.clone(),
            self.operands.clone(),
            plan,
        )
    }

    pub fn digest(&self) -> &str {
        self.digest.get_or_init(|| {
            let mut s = format!("{}(", self.op.name());
            if !self.operands.is_empty() {
                s.push_str(&digest::operand_list(self.kind(), &self.operands));
                s.push_str(", ");
            }
            s.push_str("{\n");
            s.push_str(&self.plan.explain());
            s.push_str("})");
            s
        })
    }
}

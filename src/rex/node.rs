//! The row-expression node type
//!
//! `RexNode` is a closed sum over every expression variant. Each variant sits
//! behind an `Arc`, so cloning a node is cheap and a traversal can tell
//! whether a child was replaced with a pointer test.
//!
//! Node identity is the digest: two nodes are equal exactly when their
//! digests are equal. Input references also compare their types.

use crate::common::error::RexResult;
use crate::operator::Kind;
use crate::rex::call::RexCall;
use crate::rex::literal::RexLiteral;
use crate::rex::over::RexOver;
use crate::rex::sub_query::RexSubQuery;
use crate::rex::variable::{
    RexCorrelVariable, RexDynamicParam, RexInputRef, RexLocalRef, RexNameRef, RexPatternFieldRef,
    RexRangeRef, RexTableInputRef,
};
use crate::rex::visitor::{RexBiVisitor, RexShuttle, RexVisitor};
use crate::types::{DataType, DataTypeField};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Access to a field of a row-typed expression: `expr.field`
#[derive(Debug, Clone)]
pub struct RexFieldAccess {
    expr: RexNode,
    field: DataTypeField,
    digest: OnceLock<String>,
}

impl RexFieldAccess {
    pub(crate) fn new(expr: RexNode, field: DataTypeField) -> Self {
        Self {
            expr,
            field,
            digest: OnceLock::new(),
        }
    }

    /// The row-typed expression whose field is read
    pub fn reference_expr(&self) -> &RexNode {
        &self.expr
    }

    pub fn field(&self) -> &DataTypeField {
        &self.field
    }

    pub fn data_type(&self) -> &DataType {
        self.field.data_type()
    }

    pub fn clone_with(&self, expr: RexNode) -> Self {
        Self::new(expr, self.field.clone())
    }

    pub fn digest(&self) -> &str {
        self.digest
            .get_or_init(|| format!("{}.{}", self.expr.digest(), self.field.name()))
    }
}

/// A row expression
#[derive(Clone)]
pub enum RexNode {
    Literal(Arc<RexLiteral>),
    InputRef(Arc<RexInputRef>),
    LocalRef(Arc<RexLocalRef>),
    Call(Arc<RexCall>),
    FieldAccess(Arc<RexFieldAccess>),
    CorrelVariable(Arc<RexCorrelVariable>),
    DynamicParam(Arc<RexDynamicParam>),
    NameRef(Arc<RexNameRef>),
    PatternFieldRef(Arc<RexPatternFieldRef>),
    TableInputRef(Arc<RexTableInputRef>),
    RangeRef(Arc<RexRangeRef>),
    SubQuery(Arc<RexSubQuery>),
    Over(Arc<RexOver>),
}

impl RexNode {
    pub fn data_type(&self) -> &DataType {
        match self {
            RexNode::Literal(n) => n.data_type(),
            RexNode::InputRef(n) => n.data_type(),
            RexNode::LocalRef(n) => n.data_type(),
            RexNode::Call(n) => n.data_type(),
            RexNode::FieldAccess(n) => n.data_type(),
            RexNode::CorrelVariable(n) => n.data_type(),
            RexNode::DynamicParam(n) => n.data_type(),
            RexNode::NameRef(n) => n.data_type(),
            RexNode::PatternFieldRef(n) => n.data_type(),
            RexNode::TableInputRef(n) => n.data_type(),
            RexNode::RangeRef(n) => n.data_type(),
            RexNode::SubQuery(n) => n.data_type(),
            RexNode::Over(n) => n.data_type(),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            RexNode::Literal(_) => Kind::Literal,
            RexNode::InputRef(_) => Kind::InputRef,
            RexNode::LocalRef(_) => Kind::LocalRef,
            RexNode::Call(n) => n.kind(),
            RexNode::FieldAccess(_) => Kind::FieldAccess,
            RexNode::CorrelVariable(_) => Kind::Correlation,
            RexNode::DynamicParam(_) => Kind::DynamicParam,
            RexNode::NameRef(_) => Kind::NameRef,
            RexNode::PatternFieldRef(_) => Kind::PatternInputRef,
            RexNode::TableInputRef(_) => Kind::TableInputRef,
            RexNode::RangeRef(_) => Kind::RangeRef,
            RexNode::SubQuery(n) => n.kind(),
            RexNode::Over(_) => Kind::Over,
        }
    }

    pub fn is_a(&self, kind: Kind) -> bool {
        self.kind() == kind
    }

    /// Canonical text of the node
    pub fn digest(&self) -> &str {
        match self {
            RexNode::Literal(n) => n.digest(),
            RexNode::InputRef(n) => n.name(),
            RexNode::LocalRef(n) => n.name(),
            RexNode::Call(n) => n.digest(),
            RexNode::FieldAccess(n) => n.digest(),
            RexNode::CorrelVariable(n) => n.name(),
            RexNode::DynamicParam(n) => n.name(),
            RexNode::NameRef(n) => n.name(),
            RexNode::PatternFieldRef(n) => n.name(),
            RexNode::TableInputRef(n) => n.name(),
            RexNode::RangeRef(n) => n.name(),
            RexNode::SubQuery(n) => n.digest(),
            RexNode::Over(n) => n.digest(),
        }
    }

    /// Operands of calls, windowed aggregates and sub-queries; empty otherwise
    pub fn operands(&self) -> &[RexNode] {
        match self {
            RexNode::Call(n) => n.operands(),
            RexNode::Over(n) => n.operands(),
            RexNode::SubQuery(n) => n.operands(),
            _ => &[],
        }
    }

    /// Whether the expression is TRUE for every row. Conservative: `false`
    /// means "not known".
    pub fn is_always_true(&self) -> bool {
        match self {
            RexNode::Literal(l) => l.is_always_true(),
            RexNode::Call(c) => c.is_always_true(),
            _ => false,
        }
    }

    /// Whether the expression is FALSE for every row. Conservative.
    pub fn is_always_false(&self) -> bool {
        match self {
            RexNode::Literal(l) => l.is_always_false(),
            RexNode::Call(c) => c.is_always_false(),
            _ => false,
        }
    }

    /// Same variant and same allocation
    pub fn ptr_eq(&self, other: &RexNode) -> bool {
        match (self, other) {
            (RexNode::Literal(a), RexNode::Literal(b)) => Arc::ptr_eq(a, b),
            (RexNode::InputRef(a), RexNode::InputRef(b)) => Arc::ptr_eq(a, b),
            (RexNode::LocalRef(a), RexNode::LocalRef(b)) => Arc::ptr_eq(a, b),
            (RexNode::Call(a), RexNode::Call(b)) => Arc::ptr_eq(a, b),
            (RexNode::FieldAccess(a), RexNode::FieldAccess(b)) => Arc::ptr_eq(a, b),
            (RexNode::CorrelVariable(a), RexNode::CorrelVariable(b)) => Arc::ptr_eq(a, b),
            (RexNode::DynamicParam(a), RexNode::DynamicParam(b)) => Arc::ptr_eq(a, b),
            (RexNode::NameRef(a), RexNode::NameRef(b)) => Arc::ptr_eq(a, b),
            (RexNode::PatternFieldRef(a), RexNode::PatternFieldRef(b)) => Arc::ptr_eq(a, b),
            (RexNode::TableInputRef(a), RexNode::TableInputRef(b)) => Arc::ptr_eq(a, b),
            (RexNode::RangeRef(a), RexNode::RangeRef(b)) => Arc::ptr_eq(a, b),
            (RexNode::SubQuery(a), RexNode::SubQuery(b)) => Arc::ptr_eq(a, b),
            (RexNode::Over(a), RexNode::Over(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn as_literal(&self) -> Option<&RexLiteral> {
        match self {
            RexNode::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&RexCall> {
        match self {
            RexNode::Call(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_input_ref(&self) -> Option<&RexInputRef> {
        match self {
            RexNode::InputRef(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, RexNode::Literal(_))
    }

    pub fn accept<V: RexVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            RexNode::Literal(n) => visitor.visit_literal(n),
            RexNode::InputRef(n) => visitor.visit_input_ref(n),
            RexNode::LocalRef(n) => visitor.visit_local_ref(n),
            RexNode::Call(n) => visitor.visit_call(n),
            RexNode::FieldAccess(n) => visitor.visit_field_access(n),
            RexNode::CorrelVariable(n) => visitor.visit_correl_variable(n),
            RexNode::DynamicParam(n) => visitor.visit_dynamic_param(n),
            RexNode::NameRef(n) => visitor.visit_name_ref(n),
            RexNode::PatternFieldRef(n) => visitor.visit_pattern_field_ref(n),
            RexNode::TableInputRef(n) => visitor.visit_table_input_ref(n),
            RexNode::RangeRef(n) => visitor.visit_range_ref(n),
            RexNode::SubQuery(n) => visitor.visit_sub_query(n),
            RexNode::Over(n) => visitor.visit_over(n),
        }
    }

    pub fn accept_bi<P, V: RexBiVisitor<P> + ?Sized>(&self, visitor: &mut V, arg: &P) -> V::Output {
        match self {
            RexNode::Literal(n) => visitor.visit_literal(n, arg),
            RexNode::InputRef(n) => visitor.visit_input_ref(n, arg),
            RexNode::LocalRef(n) => visitor.visit_local_ref(n, arg),
            RexNode::Call(n) => visitor.visit_call(n, arg),
            RexNode::FieldAccess(n) => visitor.visit_field_access(n, arg),
            RexNode::CorrelVariable(n) => visitor.visit_correl_variable(n, arg),
            RexNode::DynamicParam(n) => visitor.visit_dynamic_param(n, arg),
            RexNode::NameRef(n) => visitor.visit_name_ref(n, arg),
            RexNode::PatternFieldRef(n) => visitor.visit_pattern_field_ref(n, arg),
            RexNode::TableInputRef(n) => visitor.visit_table_input_ref(n, arg),
            RexNode::RangeRef(n) => visitor.visit_range_ref(n, arg),
            RexNode::SubQuery(n) => visitor.visit_sub_query(n, arg),
            RexNode::Over(n) => visitor.visit_over(n, arg),
        }
    }

    pub fn accept_shuttle<S: RexShuttle + ?Sized>(&self, shuttle: &mut S) -> RexResult<RexNode> {
        match self {
            RexNode::Literal(n) => shuttle.visit_literal(n),
            RexNode::InputRef(n) => shuttle.visit_input_ref(n),
            RexNode::LocalRef(n) => shuttle.visit_local_ref(n),
            RexNode::Call(n) => shuttle.visit_call(n),
            RexNode::FieldAccess(n) => shuttle.visit_field_access(n),
            RexNode::CorrelVariable(n) => shuttle.visit_correl_variable(n),
            RexNode::DynamicParam(n) => shuttle.visit_dynamic_param(n),
            RexNode::NameRef(n) => shuttle.visit_name_ref(n),
            RexNode::PatternFieldRef(n) => shuttle.visit_pattern_field_ref(n),
            RexNode::TableInputRef(n) => shuttle.visit_table_input_ref(n),
            RexNode::RangeRef(n) => shuttle.visit_range_ref(n),
            RexNode::SubQuery(n) => shuttle.visit_sub_query(n),
            RexNode::Over(n) => shuttle.visit_over(n),
        }
    }
}

impl PartialEq for RexNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RexNode::InputRef(a), RexNode::InputRef(b)) => {
                a.index() == b.index() && a.data_type() == b.data_type()
            }
            _ => self.digest() == other.digest(),
        }
    }
}

impl Eq for RexNode {}

impl Hash for RexNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest().hash(state);
    }
}

impl fmt::Display for RexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.digest())
    }
}

impl fmt::Debug for RexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.digest())
    }
}

macro_rules! impl_from_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RexNode {
                fn from(node: $ty) -> Self {
                    RexNode::$variant(Arc::new(node))
                }
            }
        )*
    };
}

impl_from_variant! {
    RexLiteral => Literal,
    RexInputRef => InputRef,
    RexLocalRef => LocalRef,
    RexCall => Call,
    RexFieldAccess => FieldAccess,
    RexCorrelVariable => CorrelVariable,
    RexDynamicParam => DynamicParam,
    RexNameRef => NameRef,
    RexPatternFieldRef => PatternFieldRef,
    RexTableInputRef => TableInputRef,
    RexRangeRef => RangeRef,
    RexSubQuery => SubQuery,
    RexOver => Over,
}

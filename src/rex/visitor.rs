//! Traversal over row expressions
//!
//! - [`RexVisitor`]: read-only traversal producing a value per node
//! - [`RexBiVisitor`]: the same with an extra argument threaded through
//! - [`RexShuttle`]: rewriting traversal producing a replacement per node
//!
//! Visitors are shallow unless [`RexVisitor::deep`] says otherwise: a shallow
//! visitor sees only the node it is applied to. Shuttle defaults rebuild a
//! node only when one of its children came back as a different allocation,
//! so an identity shuttle returns the very same tree.

use crate::common::error::RexResult;
use crate::rex::call::RexCall;
use crate::rex::literal::RexLiteral;
use crate::rex::node::{RexFieldAccess, RexNode};
use crate::rex::over::{RexFieldCollation, RexOver, RexWindow, RexWindowBound};
use crate::rex::sub_query::RexSubQuery;
use crate::rex::variable::{
    RexCorrelVariable, RexDynamicParam, RexInputRef, RexLocalRef, RexNameRef, RexPatternFieldRef,
    RexRangeRef, RexTableInputRef,
};
use std::sync::Arc;

/// Read-only traversal with one method per node variant
pub trait RexVisitor {
    type Output;

    /// Result for nodes the visitor has nothing to say about
    fn neutral(&mut self) -> Self::Output;

    /// Whether the default methods descend into children
    fn deep(&self) -> bool {
        false
    }

    fn visit_literal(&mut self, _literal: &RexLiteral) -> Self::Output {
        self.neutral()
    }

    fn visit_input_ref(&mut self, _input_ref: &RexInputRef) -> Self::Output {
        self.neutral()
    }

    fn visit_local_ref(&mut self, _local_ref: &RexLocalRef) -> Self::Output {
        self.neutral()
    }

    fn visit_call(&mut self, call: &RexCall) -> Self::Output {
        if self.deep() {
            for operand in call.operands() {
                operand.accept(self);
            }
        }
        self.neutral()
    }

    fn visit_over(&mut self, over: &RexOver) -> Self::Output {
        if self.deep() {
            for operand in over.operands() {
                operand.accept(self);
            }
            for child in window_children(over.window()) {
                child.accept(self);
            }
        }
        self.neutral()
    }

    fn visit_field_access(&mut self, field_access: &RexFieldAccess) -> Self::Output {
        if self.deep() {
            field_access.reference_expr().accept(self);
        }
        self.neutral()
    }

    fn visit_correl_variable(&mut self, _correl: &RexCorrelVariable) -> Self::Output {
        self.neutral()
    }

    fn visit_dynamic_param(&mut self, _param: &RexDynamicParam) -> Self::Output {
        self.neutral()
    }

    fn visit_name_ref(&mut self, _name_ref: &RexNameRef) -> Self::Output {
        self.neutral()
    }

    fn visit_pattern_field_ref(&mut self, _field_ref: &RexPatternFieldRef) -> Self::Output {
        self.neutral()
    }

    fn visit_table_input_ref(&mut self, _input_ref: &RexTableInputRef) -> Self::Output {
        self.neutral()
    }

    fn visit_range_ref(&mut self, _range_ref: &RexRangeRef) -> Self::Output {
        self.neutral()
    }

    fn visit_sub_query(&mut self, sub_query: &RexSubQuery) -> Self::Output {
        if self.deep() {
            for operand in sub_query.operands() {
                operand.accept(self);
            }
        }
        self.neutral()
    }
}

/// Read-only traversal with an extra argument of type `P`
pub trait RexBiVisitor<P> {
    type Output;

    fn neutral(&mut self, arg: &P) -> Self::Output;

    fn deep(&self) -> bool {
        false
    }

    fn visit_literal(&mut self, _literal: &RexLiteral, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_input_ref(&mut self, _input_ref: &RexInputRef, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_local_ref(&mut self, _local_ref: &RexLocalRef, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_call(&mut self, call: &RexCall, arg: &P) -> Self::Output {
        if self.deep() {
            for operand in call.operands() {
                operand.accept_bi(self, arg);
            }
        }
        self.neutral(arg)
    }

    fn visit_over(&mut self, over: &RexOver, arg: &P) -> Self::Output {
        if self.deep() {
            for operand in over.operands() {
                operand.accept_bi(self, arg);
            }
            for child in window_children(over.window()) {
                child.accept_bi(self, arg);
            }
        }
        self.neutral(arg)
    }

    fn visit_field_access(&mut self, field_access: &RexFieldAccess, arg: &P) -> Self::Output {
        if self.deep() {
            field_access.reference_expr().accept_bi(self, arg);
        }
        self.neutral(arg)
    }

    fn visit_correl_variable(&mut self, _correl: &RexCorrelVariable, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_dynamic_param(&mut self, _param: &RexDynamicParam, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_name_ref(&mut self, _name_ref: &RexNameRef, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_pattern_field_ref(
        &mut self,
        _field_ref: &RexPatternFieldRef,
        arg: &P,
    ) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_table_input_ref(&mut self, _input_ref: &RexTableInputRef, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_range_ref(&mut self, _range_ref: &RexRangeRef, arg: &P) -> Self::Output {
        self.neutral(arg)
    }

    fn visit_sub_query(&mut self, sub_query: &RexSubQuery, arg: &P) -> Self::Output {
        if self.deep() {
            for operand in sub_query.operands() {
                operand.accept_bi(self, arg);
            }
        }
        self.neutral(arg)
    }
}

/// Rewriting traversal: each method returns the replacement for its node
pub trait RexShuttle {
    fn apply(&mut self, node: &RexNode) -> RexResult<RexNode> {
        node.accept_shuttle(self)
    }

    fn apply_all(&mut self, nodes: &[RexNode]) -> RexResult<Vec<RexNode>> {
        nodes.iter().map(|n| n.accept_shuttle(self)).collect()
    }

    fn visit_literal(&mut self, literal: &Arc<RexLiteral>) -> RexResult<RexNode> {
        Ok(RexNode::Literal(literal.clone()))
    }

    fn visit_input_ref(&mut self, input_ref: &Arc<RexInputRef>) -> RexResult<RexNode> {
        Ok(RexNode::InputRef(input_ref.clone()))
    }

    fn visit_local_ref(&mut self, local_ref: &Arc<RexLocalRef>) -> RexResult<RexNode> {
        Ok(RexNode::LocalRef(local_ref.clone()))
    }

    fn visit_call(&mut self, call: &Arc<RexCall>) -> RexResult<RexNode> {
        match visit_operands(self, call.operands())? {
            Some(operands) => Ok(RexNode::Call(Arc::new(call.clone_with(operands)))),
            None => Ok(RexNode::Call(call.clone())),
        }
    }

    fn visit_over(&mut self, over: &Arc<RexOver>) -> RexResult<RexNode> {
        let operands = visit_operands(self, over.operands())?;
        let window = visit_window(self, over.window())?;
        if operands.is_none() && window.is_none() {
            return Ok(RexNode::Over(over.clone()));
        }
        let operands = operands.unwrap_or_else(|| over.operands().to_vec());
        let window = window.unwrap_or_else(|| over.window().clone());
        Ok(RexNode::Over(Arc::new(over.clone_with(operands, window))))
    }

    fn visit_field_access(&mut self, field_access: &Arc<RexFieldAccess>) -> RexResult<RexNode> {
        let before = field_access.reference_expr();
        let after = before.accept_shuttle(self)?;
        if after.ptr_eq(before) {
            Ok(RexNode::FieldAccess(field_access.clone()))
        } else {
            Ok(RexNode::FieldAccess(Arc::new(field_access.clone_with(after))))
        }
    }

    fn visit_correl_variable(&mut self, correl: &Arc<RexCorrelVariable>) -> RexResult<RexNode> {
        Ok(RexNode::CorrelVariable(correl.clone()))
    }

    fn visit_dynamic_param(&mut self, param: &Arc<RexDynamicParam>) -> RexResult<RexNode> {
        Ok(RexNode::DynamicParam(param.clone()))
    }

    fn visit_name_ref(&mut self, name_ref: &Arc<RexNameRef>) -> RexResult<RexNode> {
        Ok(RexNode::NameRef(name_ref.clone()))
    }

    fn visit_pattern_field_ref(
        &mut self,
        field_ref: &Arc<RexPatternFieldRef>,
    ) -> RexResult<RexNode> {
        Ok(RexNode::PatternFieldRef(field_ref.clone()))
    }

    fn visit_table_input_ref(&mut self, input_ref: &Arc<RexTableInputRef>) -> RexResult<RexNode> {
        Ok(RexNode::TableInputRef(input_ref.clone()))
    }

    fn visit_range_ref(&mut self, range_ref: &Arc<RexRangeRef>) -> RexResult<RexNode> {
        Ok(RexNode::RangeRef(range_ref.clone()))
    }

    fn visit_sub_query(&mut self, sub_query: &Arc<RexSubQuery>) -> RexResult<RexNode> {
        match visit_operands(self, sub_query.operands())? {
            Some(operands) => Ok(RexNode::SubQuery(Arc::new(sub_query.clone_with(operands)))),
            None => Ok(RexNode::SubQuery(sub_query.clone())),
        }
    }
}

/// Apply a shuttle to every operand. Returns `None` when every operand came
/// back unchanged.
pub fn visit_operands<S: RexShuttle + ?Sized>(
    shuttle: &mut S,
    operands: &[RexNode],
) -> RexResult<Option<Vec<RexNode>>> {
    let mut changed = false;
    let mut result = Vec::with_capacity(operands.len());
    for operand in operands {
        let visited = operand.accept_shuttle(shuttle)?;
        changed |= !visited.ptr_eq(operand);
        result.push(visited);
    }
    Ok(if changed { Some(result) } else { None })
}

/// Apply a shuttle to the keys and bound offsets of a window. Returns `None`
/// when nothing changed.
pub fn visit_window<S: RexShuttle + ?Sized>(
    shuttle: &mut S,
    window: &RexWindow,
) -> RexResult<Option<RexWindow>> {
    let partition_keys = visit_operands(shuttle, window.partition_keys())?;

    let mut order_changed = false;
    let mut order_keys: Vec<RexFieldCollation> = Vec::with_capacity(window.order_keys().len());
    for key in window.order_keys() {
        let expr = key.expr.accept_shuttle(shuttle)?;
        if expr.ptr_eq(&key.expr) {
            order_keys.push(key.clone());
        } else {
            order_changed = true;
            order_keys.push(key.with_expr(expr));
        }
    }

    let lower = visit_bound(shuttle, window.lower_bound())?;
    let upper = visit_bound(shuttle, window.upper_bound())?;

    if partition_keys.is_none() && !order_changed && lower.is_none() && upper.is_none() {
        return Ok(None);
    }
    Ok(Some(window.clone_with(
        partition_keys.unwrap_or_else(|| window.partition_keys().to_vec()),
        order_keys,
        lower.unwrap_or_else(|| window.lower_bound().cloned()),
        upper.unwrap_or_else(|| window.upper_bound().cloned()),
    )))
}

fn visit_bound<S: RexShuttle + ?Sized>(
    shuttle: &mut S,
    bound: Option<&RexWindowBound>,
) -> RexResult<Option<Option<RexWindowBound>>> {
    let bound = match bound {
        Some(b) => b,
        None => return Ok(None),
    };
    match bound.offset() {
        Some(offset) => {
            let visited = offset.accept_shuttle(shuttle)?;
            if visited.ptr_eq(offset) {
                Ok(None)
            } else {
                Ok(Some(Some(bound.with_offset(visited))))
            }
        }
        None => Ok(None),
    }
}

/// Partition keys, order key expressions and bound offsets of a window
pub(crate) fn window_children(window: &RexWindow) -> Vec<&RexNode> {
    let mut children: Vec<&RexNode> = window.partition_keys().iter().collect();
    children.extend(window.order_keys().iter().map(|k| &k.expr));
    children.extend(window.lower_bound().and_then(|b| b.offset()));
    children.extend(window.upper_bound().and_then(|b| b.offset()));
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rex::builder::RexBuilder;
    use crate::types::SqlTypeName;
    use rust_decimal::Decimal;

    struct Identity;

    impl RexShuttle for Identity {}

    struct LiteralCounter {
        count: usize,
    }

    impl RexVisitor for LiteralCounter {
        type Output = ();

        fn neutral(&mut self) {}

        fn deep(&self) -> bool {
            true
        }

        fn visit_literal(&mut self, _literal: &RexLiteral) {
            self.count += 1;
        }
    }

    #[test]
    fn test_identity_shuttle_preserves_allocation() {
        let builder = RexBuilder::default();
        let int = builder.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let x = builder.make_input_ref(int, 0);
        let one = builder.make_exact_literal(Decimal::from(1)).unwrap();
        let ops = crate::operator::std_operators();
        let sum = builder.make_call(&ops.plus, vec![x, one]).unwrap();

        let result = Identity.apply(&sum).unwrap();
        assert!(result.ptr_eq(&sum));
    }

    #[test]
    fn test_deep_visitor_reaches_nested_literals() {
        let builder = RexBuilder::default();
        let int = builder.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let x = builder.make_input_ref(int, 0);
        let ops = crate::operator::std_operators();
        let sum = builder
            .make_call(
                &ops.plus,
                vec![x, builder.make_exact_literal(Decimal::from(1)).unwrap()],
            )
            .unwrap();
        let cmp = builder
            .make_call(
                &ops.greater_than,
                vec![sum, builder.make_exact_literal(Decimal::from(2)).unwrap()],
            )
            .unwrap();

        let mut counter = LiteralCounter { count: 0 };
        cmp.accept(&mut counter);
        assert_eq!(counter.count, 2);
    }
}

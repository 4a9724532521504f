//! Small analyses over expression trees

use crate::common::error::{RexError, RexResult};
use crate::rex::call::RexCall;
use crate::rex::node::{RexFieldAccess, RexNode};
use crate::rex::over::RexOver;
use crate::rex::sub_query::RexSubQuery;
use crate::rex::variable::{RexCorrelVariable, RexInputRef, RexLocalRef};
use crate::rex::visitor::{RexBiVisitor, RexShuttle, RexVisitor};
use std::collections::BTreeSet;
use std::sync::Arc;

struct InputFinder {
    ordinals: BTreeSet<usize>,
}

impl RexVisitor for InputFinder {
    type Output = ();

    fn neutral(&mut self) {}

    fn deep(&self) -> bool {
        true
    }

    fn visit_input_ref(&mut self, input_ref: &RexInputRef) {
        self.ordinals.insert(input_ref.index());
    }
}

/// Ordinals of all input references in `nodes`
pub fn input_refs<'a>(nodes: impl IntoIterator<Item = &'a RexNode>) -> BTreeSet<usize> {
    let mut finder = InputFinder {
        ordinals: BTreeSet::new(),
    };
    for node in nodes {
        node.accept(&mut finder);
    }
    finder.ordinals
}

/// Bi-visitor that is `true` while every input ref is below the bound
struct BelowBound;

impl RexBiVisitor<usize> for BelowBound {
    type Output = bool;

    fn neutral(&mut self, _bound: &usize) -> bool {
        true
    }

    fn visit_input_ref(&mut self, input_ref: &RexInputRef, bound: &usize) -> bool {
        input_ref.index() < *bound
    }

    fn visit_call(&mut self, call: &RexCall, bound: &usize) -> bool {
        call.operands().iter().all(|o| o.accept_bi(self, bound))
    }

    fn visit_over(&mut self, over: &RexOver, bound: &usize) -> bool {
        over.operands().iter().all(|o| o.accept_bi(self, bound))
            && over
                .window()
                .partition_keys()
                .iter()
                .all(|k| k.accept_bi(self, bound))
    }

    fn visit_field_access(&mut self, field_access: &RexFieldAccess, bound: &usize) -> bool {
        field_access.reference_expr().accept_bi(self, bound)
    }

    fn visit_sub_query(&mut self, sub_query: &RexSubQuery, bound: &usize) -> bool {
        sub_query.operands().iter().all(|o| o.accept_bi(self, bound))
    }
}

/// Whether every input reference in `node` has an ordinal below `count`
pub fn refs_below(node: &RexNode, count: usize) -> bool {
    node.accept_bi(&mut BelowBound, &count)
}

struct ConstantFinder;

impl RexVisitor for ConstantFinder {
    type Output = bool;

    fn neutral(&mut self) -> bool {
        true
    }

    fn visit_input_ref(&mut self, _input_ref: &RexInputRef) -> bool {
        false
    }

    fn visit_local_ref(&mut self, _local_ref: &RexLocalRef) -> bool {
        false
    }

    fn visit_correl_variable(&mut self, _correl: &RexCorrelVariable) -> bool {
        false
    }

    fn visit_over(&mut self, _over: &RexOver) -> bool {
        false
    }

    fn visit_sub_query(&mut self, _sub_query: &RexSubQuery) -> bool {
        false
    }

    fn visit_call(&mut self, call: &RexCall) -> bool {
        !call.kind().is_aggregate() && call.operands().iter().all(|o| o.accept(self))
    }

    fn visit_field_access(&mut self, field_access: &RexFieldAccess) -> bool {
        field_access.reference_expr().accept(self)
    }
}

/// Whether `node` has the same value for every row: no references to the
/// input row, no correlation, no aggregation and no sub-query
pub fn is_constant(node: &RexNode) -> bool {
    node.accept(&mut ConstantFinder)
}

struct InputShifter {
    offset: isize,
}

impl RexShuttle for InputShifter {
    fn visit_input_ref(&mut self, input_ref: &Arc<RexInputRef>) -> RexResult<RexNode> {
        let index = input_ref.index() as isize + self.offset;
        if index < 0 {
            return Err(RexError::InvalidArgument(format!(
                "Shifting {} by {} gives a negative ordinal",
                input_ref.name(),
                self.offset
            )));
        }
        if self.offset == 0 {
            return Ok(RexNode::InputRef(input_ref.clone()));
        }
        Ok(RexInputRef::new(index as usize, input_ref.data_type().clone()).into())
    }
}

/// Move every input reference `offset` places; negative offsets move left
pub fn shift_inputs(node: &RexNode, offset: isize) -> RexResult<RexNode> {
    InputShifter { offset }.apply(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::std_operators;
    use crate::rex::builder::RexBuilder;
    use crate::types::{SqlTypeName, TypeFactory};
    use rust_decimal::Decimal;

    fn sample(b: &RexBuilder) -> RexNode {
        let int = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let ops = std_operators();
        let sum = b
            .make_call(
                &ops.plus,
                vec![b.make_input_ref(int.clone(), 3), b.make_input_ref(int, 1)],
            )
            .unwrap();
        b.make_call(&ops.multiply, vec![sum, b.make_exact_literal(Decimal::TWO).unwrap()])
            .unwrap()
    }

    #[test]
    fn test_input_refs_and_bounds() {
        let b = RexBuilder::default();
        let e = sample(&b);
        assert_eq!(input_refs([&e]).into_iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(refs_below(&e, 4));
        assert!(!refs_below(&e, 3));
    }

    #[test]
    fn test_is_constant() {
        let b = RexBuilder::default();
        assert!(!is_constant(&sample(&b)));
        let folded = b
            .make_call(
                &std_operators().plus,
                vec![
                    b.make_exact_literal(Decimal::ONE).unwrap(),
                    b.make_exact_literal(Decimal::TWO).unwrap(),
                ],
            )
            .unwrap();
        assert!(is_constant(&folded));
    }

    #[test]
    fn test_shift_inputs() {
        let b = RexBuilder::default();
        let e = sample(&b);
        assert_eq!(shift_inputs(&e, 2).unwrap().digest(), "*(+($5, $3), 2)");
        assert_eq!(shift_inputs(&e, -1).unwrap().digest(), "*(+($2, $0), 2)");
        assert!(shift_inputs(&e, -2).is_err());
        assert!(shift_inputs(&e, 0).unwrap().ptr_eq(&e));
    }
}

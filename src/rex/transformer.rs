//! Rewrite of three-valued boolean expressions into two-valued form
//!
//! Below an `IS TRUE` or `IS FALSE`, UNKNOWN and FALSE are indistinguishable,
//! so nullable operands of `AND` and the comparison operators can be guarded
//! with `IS NOT NULL` and the wrapper dropped. `OR` is left as it is.

use crate::common::error::RexResult;
use crate::operator::{std_operators, Kind};
use crate::rex::builder::RexBuilder;
use crate::rex::node::RexNode;
use crate::types::SqlTypeName;
use std::sync::Arc;
use tracing::trace;

pub struct RexTransformer<'a> {
    root: RexNode,
    builder: &'a RexBuilder,
    /// Number of enclosing IS TRUE / IS FALSE calls
    is_parents_count: usize,
}

impl<'a> RexTransformer<'a> {
    pub fn new(root: RexNode, builder: &'a RexBuilder) -> Self {
        Self {
            root,
            builder,
            is_parents_count: 0,
        }
    }

    pub fn transform_null_semantics(&mut self) -> RexResult<RexNode> {
        let root = self.root.clone();
        let transformed = self.transform(&root)?;
        self.root = transformed.clone();
        Ok(transformed)
    }

    fn is_transformable_operator(kind: Kind) -> bool {
        kind == Kind::And || kind.is_comparison()
    }

    fn is_transformable(&self, node: &RexNode) -> bool {
        if self.is_parents_count == 0 {
            return false;
        }
        if let RexNode::Call(call) = node {
            if Self::is_transformable_operator(call.kind()) {
                return false;
            }
        }
        node.data_type().is_nullable()
    }

    fn transform(&mut self, node: &RexNode) -> RexResult<RexNode> {
        if node.data_type().type_name() != SqlTypeName::Boolean {
            return Ok(node.clone());
        }
        let ops = std_operators();

        let directly_under_is = match node.kind() {
            Kind::IsTrue => Some(true),
            Kind::IsFalse => Some(false),
            _ => None,
        };

        if let Some(flag) = directly_under_is {
            let operand = &node.operands()[0];
            if matches!(
                operand,
                RexNode::Literal(_) | RexNode::InputRef(_) | RexNode::DynamicParam(_)
            ) {
                let flag_literal = self.builder.make_bool_literal(flag);
                let eq = self
                    .builder
                    .make_call(&ops.equals, vec![operand.clone(), flag_literal])?;
                let rewritten = if operand.data_type().is_nullable() {
                    let not_null = self.builder.make_call(&ops.is_not_null, vec![operand.clone()])?;
                    self.builder.make_call(&ops.and, vec![not_null, eq])?
                } else {
                    eq
                };
                trace!(from = %node, to = %rewritten, "null test rewritten");
                return Ok(rewritten);
            }
            self.is_parents_count += 1;
        }

        let call = match node {
            RexNode::Call(call) => call,
            _ => return Ok(node.clone()),
        };

        let operands = call
            .operands()
            .iter()
            .map(|operand| self.transform(operand))
            .collect::<RexResult<Vec<_>>>()?;

        if directly_under_is.is_some() {
            self.is_parents_count -= 1;
            return Ok(operands[0].clone());
        }

        if Self::is_transformable_operator(call.kind()) {
            let mut guards = Vec::new();
            for operand in &operands {
                if self.is_transformable(operand) {
                    guards.push(self.builder.make_call(&ops.is_not_null, vec![operand.clone()])?);
                }
            }
            if !guards.is_empty() {
                let guard = if guards.len() == 1 {
                    guards.remove(0)
                } else {
                    self.builder.make_call(&ops.and, guards)?
                };
                let rebuilt: RexNode = call.clone_with(operands).into();
                let rewritten = self.builder.make_call(&ops.and, vec![guard, rebuilt])?;
                trace!(from = %node, to = %rewritten, "nullable operands guarded");
                return Ok(rewritten);
            }
        }

        let changed = operands
            .iter()
            .zip(call.operands())
            .any(|(after, before)| !after.ptr_eq(before));
        if changed {
            Ok(RexNode::Call(Arc::new(call.clone_with(operands))))
        } else {
            Ok(node.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeFactory;

    fn nullable_bool(b: &RexBuilder) -> crate::types::DataType {
        let t = b.type_factory().create_type(SqlTypeName::Boolean).unwrap();
        b.type_factory().create_type_with_nullability(&t, true)
    }

    fn nullable_int(b: &RexBuilder) -> crate::types::DataType {
        let t = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        b.type_factory().create_type_with_nullability(&t, true)
    }

    fn transform(b: &RexBuilder, node: RexNode) -> RexNode {
        RexTransformer::new(node, b).transform_null_semantics().unwrap()
    }

    #[test]
    fn test_is_true_of_nullable_field() {
        let b = RexBuilder::default();
        let field = b.make_input_ref(nullable_bool(&b), 0);
        let is_true = b.make_call(&std_operators().is_true, vec![field]).unwrap();
        assert_eq!(
            transform(&b, is_true).digest(),
            "AND(IS NOT NULL($0), =($0, true))"
        );
    }

    #[test]
    fn test_is_false_of_not_null_field() {
        let b = RexBuilder::default();
        let t = b.type_factory().create_type(SqlTypeName::Boolean).unwrap();
        let field = b.make_input_ref(t, 1);
        let is_false = b.make_call(&std_operators().is_false, vec![field]).unwrap();
        assert_eq!(transform(&b, is_false).digest(), "=($1, false)");
    }

    #[test]
    fn test_comparison_under_is_true_is_guarded() {
        let b = RexBuilder::default();
        let ops = std_operators();
        let x = b.make_input_ref(nullable_int(&b), 0);
        let one = b.make_exact_literal(1.into()).unwrap();
        let gt = b.make_call(&ops.greater_than, vec![x, one]).unwrap();
        let is_true = b.make_call(&ops.is_true, vec![gt]).unwrap();
        assert_eq!(
            transform(&b, is_true).digest(),
            "AND(IS NOT NULL($0), >($0, 1))"
        );
    }

    #[test]
    fn test_or_is_not_rewritten() {
        // AND and the comparisons are guarded; OR keeps its operands as they are
        let b = RexBuilder::default();
        let ops = std_operators();
        let p = b.make_input_ref(nullable_bool(&b), 0);
        let q = b.make_input_ref(nullable_bool(&b), 1);
        let or = b.make_call(&ops.or, vec![p.clone(), q.clone()]).unwrap();
        let is_true = b.make_call(&ops.is_true, vec![or]).unwrap();
        assert_eq!(transform(&b, is_true).digest(), "OR($0, $1)");

        let and = b.make_call(&ops.and, vec![p, q]).unwrap();
        let is_true = b.make_call(&ops.is_true, vec![and]).unwrap();
        assert_eq!(
            transform(&b, is_true).digest(),
            "AND(AND(IS NOT NULL($0), IS NOT NULL($1)), AND($0, $1))"
        );
    }

    #[test]
    fn test_outside_null_test_nothing_changes() {
        let b = RexBuilder::default();
        let ops = std_operators();
        let x = b.make_input_ref(nullable_int(&b), 0);
        let eq = b
            .make_call(&ops.equals, vec![x, b.make_exact_literal(1.into()).unwrap()])
            .unwrap();
        let out = transform(&b, eq.clone());
        assert!(out.ptr_eq(&eq));

        let int = b.make_exact_literal(7.into()).unwrap();
        assert!(transform(&b, int.clone()).ptr_eq(&int));
    }
}

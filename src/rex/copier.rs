//! Deep copy of expression trees

use crate::common::error::{RexError, RexResult};
use crate::rex::builder::RexBuilder;
use crate::rex::call::RexCall;
use crate::rex::literal::RexLiteral;
use crate::rex::node::{RexFieldAccess, RexNode};
use crate::rex::over::RexOver;
use crate::rex::sub_query::RexSubQuery;
use crate::rex::variable::{
    RexCorrelVariable, RexDynamicParam, RexInputRef, RexLocalRef, RexNameRef, RexPatternFieldRef,
    RexRangeRef, RexTableInputRef,
};
use crate::rex::visitor::RexShuttle;
use crate::types::{DataType, DataTypeField};
use std::sync::Arc;

/// Shuttle that rebuilds every node through a builder, re-creating each
/// type in the builder's type factory
///
/// Windowed aggregates, correlation variables, local references, dynamic
/// parameters and range references are not copied; meeting one is an
/// [`RexError::UnsupportedOperation`].
pub struct RexCopier<'a> {
    builder: &'a RexBuilder,
}

impl<'a> RexCopier<'a> {
    pub fn new(builder: &'a RexBuilder) -> Self {
        Self { builder }
    }

    fn copy_type(&self, data_type: &DataType) -> DataType {
        self.builder.type_factory().copy_type(data_type)
    }

    fn unsupported(what: &str) -> RexError {
        RexError::UnsupportedOperation(format!("Cannot copy {}", what))
    }
}

impl RexShuttle for RexCopier<'_> {
    fn visit_literal(&mut self, literal: &Arc<RexLiteral>) -> RexResult<RexNode> {
        self.builder.make_literal(
            literal.value().cloned(),
            self.copy_type(literal.data_type()),
            literal.type_name(),
        )
    }

    fn visit_input_ref(&mut self, input_ref: &Arc<RexInputRef>) -> RexResult<RexNode> {
        Ok(self
            .builder
            .make_input_ref(self.copy_type(input_ref.data_type()), input_ref.index()))
    }

    fn visit_local_ref(&mut self, _local_ref: &Arc<RexLocalRef>) -> RexResult<RexNode> {
        Err(Self::unsupported("a local reference"))
    }

    fn visit_call(&mut self, call: &Arc<RexCall>) -> RexResult<RexNode> {
        let operands = self.apply_all(call.operands())?;
        self.builder
            .make_call_with_type(self.copy_type(call.data_type()), call.op(), operands)
    }

    fn visit_over(&mut self, _over: &Arc<RexOver>) -> RexResult<RexNode> {
        Err(Self::unsupported("a windowed aggregate"))
    }

    fn visit_field_access(&mut self, field_access: &Arc<RexFieldAccess>) -> RexResult<RexNode> {
        let expr = self.apply(field_access.reference_expr())?;
        let field = field_access.field();
        let data_type = self.copy_type(field.data_type());
        let field = match field.index() {
            Some(index) => DataTypeField::new(field.name(), index, data_type),
            None => DataTypeField::dynamic(field.name(), data_type),
        };
        Ok(RexFieldAccess::new(expr, field).into())
    }

    fn visit_correl_variable(&mut self, _correl: &Arc<RexCorrelVariable>) -> RexResult<RexNode> {
        Err(Self::unsupported("a correlation variable"))
    }

    fn visit_dynamic_param(&mut self, _param: &Arc<RexDynamicParam>) -> RexResult<RexNode> {
        Err(Self::unsupported("a dynamic parameter"))
    }

    fn visit_name_ref(&mut self, name_ref: &Arc<RexNameRef>) -> RexResult<RexNode> {
        Ok(self.builder.make_name_ref(
            name_ref.names().to_vec(),
            name_ref.index(),
            self.copy_type(name_ref.data_type()),
        ))
    }

    fn visit_pattern_field_ref(
        &mut self,
        field_ref: &Arc<RexPatternFieldRef>,
    ) -> RexResult<RexNode> {
        Ok(self.builder.make_pattern_field_ref(
            field_ref.alpha(),
            self.copy_type(field_ref.data_type()),
            field_ref.index(),
        ))
    }

    fn visit_table_input_ref(&mut self, input_ref: &Arc<RexTableInputRef>) -> RexResult<RexNode> {
        Ok(self.builder.make_table_input_ref(
            input_ref.table().clone(),
            input_ref.index(),
            self.copy_type(input_ref.data_type()),
        ))
    }

    fn visit_range_ref(&mut self, _range_ref: &Arc<RexRangeRef>) -> RexResult<RexNode> {
        Err(Self::unsupported("a range reference"))
    }

    fn visit_sub_query(&mut self, sub_query: &Arc<RexSubQuery>) -> RexResult<RexNode> {
        let operands = self.apply_all(sub_query.operands())?;
        Ok(RexSubQuery::new(
            self.copy_type(sub_query.data_type()),
            sub_query.op().clone(),
            operands,
            sub_query.plan().clone(),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::std_operators;
    use crate::rex::variable::CorrelationId;
    use crate::types::{SqlTypeName, TypeFactory};
    use rust_decimal::Decimal;

    #[test]
    fn test_copy_rebuilds_tree() {
        let b = RexBuilder::default();
        let int = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let x = b.make_input_ref(int, 0);
        let one = b.make_exact_literal(Decimal::ONE).unwrap();
        let sum = b.make_call(&std_operators().plus, vec![x, one]).unwrap();

        let copy = b.copy(&sum).unwrap();
        assert_eq!(copy, sum);
        assert!(!copy.ptr_eq(&sum));
        assert_eq!(b.copy(&copy).unwrap().digest(), copy.digest());
    }

    #[test]
    fn test_copy_refuses_correlation_variables() {
        let b = RexBuilder::default();
        let int = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
        let row = b
            .type_factory()
            .create_struct_type(vec![("a".to_string(), int.clone())]);
        let correl = b.make_correl(row, CorrelationId(0));
        let err = b.copy(&correl).unwrap_err();
        assert!(err.is_unsupported());

        let param = b.make_dynamic_param(int, 0);
        assert!(b.copy(&param).unwrap_err().is_unsupported());
    }
}

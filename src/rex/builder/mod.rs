//! Factory for row expressions
//!
//! `RexBuilder` is the only way to create nodes. It checks arity, derives
//! call types through the operator's return-type strategy, and keeps a few
//! literals that are needed everywhere (`TRUE`, `FALSE`, the empty string
//! and an untyped `NULL`).
//!
//! Literal factories live in `literals`, cast construction in `casts`.

mod casts;
mod literals;

use crate::common::config::RexConfig;
use crate::common::error::{RexError, RexResult};
use crate::contract_err;
use crate::operator::{std_operators, Kind, OperatorRef};
use crate::rex::aggregate::AggregateCall;
use crate::rex::call::RexCall;
use crate::rex::copier::RexCopier;
use crate::rex::literal::{LiteralValue, RexLiteral};
use crate::rex::node::{RexFieldAccess, RexNode};
use crate::rex::over::{RexFieldCollation, RexOver, RexWindow, RexWindowBound};
use crate::rex::sub_query::{RelPlan, RexSubQuery};
use crate::rex::variable::{
    CorrelationId, RelTableRef, RexCorrelVariable, RexDynamicParam, RexInputRef, RexNameRef,
    RexPatternFieldRef, RexRangeRef, RexTableInputRef,
};
use crate::rex::visitor::RexShuttle;
use crate::types::{
    DataType, DataTypeField, DefaultTypeFactory, NlsString, SqlTypeName, TypeFactory,
};
use ahash::AHashMap;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

/// Factory for row expressions
#[derive(Debug, Clone)]
pub struct RexBuilder {
    type_factory: Arc<dyn TypeFactory>,
    boolean_true: RexNode,
    boolean_false: RexNode,
    char_empty: RexNode,
    constant_null: RexNode,
}

impl RexBuilder {
    pub fn new(type_factory: Arc<dyn TypeFactory>) -> Self {
        let system = type_factory.type_system();
        let boolean = DataType::basic(SqlTypeName::Boolean);
        let boolean_true = RexLiteral::from_parts(
            Some(LiteralValue::Boolean(true)),
            boolean.clone(),
            SqlTypeName::Boolean,
        );
        let boolean_false = RexLiteral::from_parts(
            Some(LiteralValue::Boolean(false)),
            boolean,
            SqlTypeName::Boolean,
        );
        let char_empty = RexLiteral::from_parts(
            Some(LiteralValue::String(NlsString::with_charset(
                "",
                system.default_charset(),
                system.default_collation(),
            ))),
            DataType::basic(SqlTypeName::Char)
                .set_precision(Some(0), None)
                .set_charset(
                    Some(system.default_charset().to_string()),
                    Some(system.default_collation().to_string()),
                ),
            SqlTypeName::Char,
        );
        let constant_null = RexLiteral::from_parts(
            None,
            DataType::basic(SqlTypeName::Null).set_nullable(true),
            SqlTypeName::Null,
        );
        Self {
            type_factory,
            boolean_true: boolean_true.into(),
            boolean_false: boolean_false.into(),
            char_empty: char_empty.into(),
            constant_null: constant_null.into(),
        }
    }

    /// Builder over a [`DefaultTypeFactory`] configured from `config`
    pub fn with_config(config: RexConfig) -> Self {
        Self::new(Arc::new(DefaultTypeFactory::with_config(config)))
    }

    pub fn type_factory(&self) -> &dyn TypeFactory {
        self.type_factory.as_ref()
    }

    pub fn config(&self) -> &RexConfig {
        self.type_factory.type_system().config()
    }

    /// The untyped `NULL` literal
    pub fn constant_null(&self) -> RexNode {
        self.constant_null.clone()
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    /// An input reference for every field of a row type
    pub fn identity_projects(&self, row_type: &DataType) -> Vec<RexNode> {
        row_type
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| self.make_input_ref(field.data_type().clone(), i))
            .collect()
    }

    /// Reference to input field `index`. Character types without a
    /// character set get the configured default.
    pub fn make_input_ref(&self, data_type: DataType, index: usize) -> RexNode {
        let data_type = self.add_charset_and_collation(data_type);
        RexInputRef::new(index, data_type).into()
    }

    /// Reference to field `index` of `row_type`
    pub fn make_input_ref_of(&self, row_type: &DataType, index: usize) -> RexResult<RexNode> {
        let field = row_type.fields().get(index).ok_or_else(|| {
            contract_err!(
                "Field ordinal {} is invalid for type '{}'",
                index,
                row_type
            )
        })?;
        Ok(self.make_input_ref(field.data_type().clone(), index))
    }

    /// Reference to the span of input fields described by `row_type`,
    /// starting at `offset`
    pub fn make_range_reference(
        &self,
        row_type: DataType,
        offset: usize,
        nullable: bool,
    ) -> RexNode {
        let row_type = if nullable && !row_type.is_nullable() {
            self.type_factory
                .create_type_with_nullability(&row_type, true)
        } else {
            row_type
        };
        RexRangeRef::new(row_type, offset).into()
    }

    pub fn make_pattern_field_ref(
        &self,
        alpha: impl Into<String>,
        data_type: DataType,
        index: usize,
    ) -> RexNode {
        RexPatternFieldRef::new(alpha, index, data_type).into()
    }

    pub fn make_correl(&self, data_type: DataType, id: CorrelationId) -> RexNode {
        RexCorrelVariable::new(id, data_type).into()
    }

    pub fn make_dynamic_param(&self, data_type: DataType, index: usize) -> RexNode {
        RexDynamicParam::new(index, None, data_type).into()
    }

    pub fn make_named_dynamic_param(
        &self,
        data_type: DataType,
        index: usize,
        name: impl Into<String>,
    ) -> RexNode {
        RexDynamicParam::new(index, Some(name.into()), data_type).into()
    }

    pub fn make_name_ref(
        &self,
        names: Vec<String>,
        index: Option<usize>,
        data_type: DataType,
    ) -> RexNode {
        RexNameRef::new(names, index, data_type).into()
    }

    pub fn make_table_input_ref(
        &self,
        table: RelTableRef,
        index: usize,
        data_type: DataType,
    ) -> RexNode {
        RexTableInputRef::new(table, index, data_type).into()
    }

    /// Access to field `name` of a row-typed expression
    pub fn make_field_access(
        &self,
        expr: RexNode,
        name: &str,
        case_sensitive: bool,
    ) -> RexResult<RexNode> {
        let field = expr
            .data_type()
            .field(name, case_sensitive)
            .cloned()
            .ok_or_else(|| {
                contract_err!("Type '{}' has no field '{}'", expr.data_type(), name)
            })?;
        self.make_field_access_internal(expr, field)
    }

    /// Access to field `index` of a row-typed expression
    pub fn make_field_access_ordinal(&self, expr: RexNode, index: usize) -> RexResult<RexNode> {
        let field = expr.data_type().fields().get(index).cloned().ok_or_else(|| {
            contract_err!(
                "Field ordinal {} is invalid for type '{}'",
                index,
                expr.data_type()
            )
        })?;
        self.make_field_access_internal(expr, field)
    }

    fn make_field_access_internal(
        &self,
        expr: RexNode,
        field: DataTypeField,
    ) -> RexResult<RexNode> {
        if let RexNode::RangeRef(range) = &expr {
            return match field.index() {
                Some(index) => Ok(RexInputRef::new(
                    range.offset() + index,
                    field.data_type().clone(),
                )
                .into()),
                // Dynamic fields are looked up by name at run time
                None => {
                    let name = self.make_string_literal(field.name())?;
                    self.make_call_with_type(
                        field.data_type().clone(),
                        &std_operators().get,
                        vec![expr.clone(), name],
                    )
                }
            };
        }
        Ok(RexFieldAccess::new(expr, field).into())
    }

    fn add_charset_and_collation(&self, data_type: DataType) -> DataType {
        if !data_type.type_name().is_character() || data_type.charset().is_some() {
            return data_type;
        }
        let config = self.config();
        match self.type_factory.create_type_with_charset(
            &data_type,
            &config.default_charset,
            &config.default_collation,
        ) {
            Ok(with_charset) => with_charset,
            Err(_) => data_type,
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    /// Call whose type is derived from the operator and the operand types
    pub fn make_call(&self, op: &OperatorRef, operands: Vec<RexNode>) -> RexResult<RexNode> {
        op.check_arity(operands.len())?;
        let data_type = self.derive_return_type(op, &operands)?;
        Ok(RexCall::new(data_type, op.clone(), operands).into())
    }

    /// Call with an explicit result type
    pub fn make_call_with_type(
        &self,
        data_type: DataType,
        op: &OperatorRef,
        operands: Vec<RexNode>,
    ) -> RexResult<RexNode> {
        op.check_arity(operands.len())?;
        Ok(RexCall::new(data_type, op.clone(), operands).into())
    }

    /// Result type of `op` applied to `operands`
    pub fn derive_return_type(
        &self,
        op: &OperatorRef,
        operands: &[RexNode],
    ) -> RexResult<DataType> {
        let types: Vec<DataType> = operands.iter().map(|o| o.data_type().clone()).collect();
        op.infer_return_type(self.type_factory.as_ref(), &types)
    }

    /// `NEW type(args)`
    pub fn make_new_invocation(
        &self,
        data_type: DataType,
        exprs: Vec<RexNode>,
    ) -> RexResult<RexNode> {
        self.make_call_with_type(data_type, &std_operators().new_instance, exprs)
    }

    // ------------------------------------------------------------------
    // Aggregates and windows
    // ------------------------------------------------------------------

    /// Register an aggregate call and return a reference to its output
    ///
    /// Outputs follow the group keys (and their indicators, if any). An
    /// aggregate identical to a registered one reuses its slot. A
    /// non-distinct COUNT drops the arguments that can never be NULL first,
    /// so `COUNT(x)` over a NOT NULL `x` is shared with `COUNT()`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_agg_call(
        &self,
        agg_call: AggregateCall,
        group_count: usize,
        indicator: bool,
        agg_calls: &mut Vec<AggregateCall>,
        mapping: &mut AHashMap<AggregateCall, RexNode>,
        arg_types: &[DataType],
    ) -> RexNode {
        let mut agg_call = agg_call;
        if agg_call.is_count() && !agg_call.is_distinct() {
            let nullable_args: Vec<usize> = agg_call
                .args()
                .iter()
                .zip(arg_types)
                .filter(|(_, t)| t.is_nullable())
                .map(|(arg, _)| *arg)
                .collect();
            if nullable_args != agg_call.args() {
                agg_call = agg_call.copy_with_args(nullable_args);
            }
        }
        if let Some(existing) = mapping.get(&agg_call) {
            debug!(agg_call = %agg_call, slot = %existing, "reusing aggregate call");
            return existing.clone();
        }
        let index = agg_calls.len() + group_count * if indicator { 2 } else { 1 };
        let rex = self.make_input_ref(agg_call.data_type().clone(), index);
        agg_calls.push(agg_call.clone());
        mapping.insert(agg_call, rex.clone());
        rex
    }

    pub fn make_window(
        &self,
        partition_keys: Vec<RexNode>,
        order_keys: Vec<RexFieldCollation>,
        lower_bound: Option<RexWindowBound>,
        upper_bound: Option<RexWindowBound>,
        is_rows: bool,
    ) -> RexWindow {
        RexWindow::new(partition_keys, order_keys, lower_bound, upper_bound, is_rows)
    }

    /// Windowed aggregate
    ///
    /// With `null_when_count_zero` the result is NULL over an empty window:
    /// `CASE(COUNT(..) OVER w > 0, agg OVER w, NULL)`. Without
    /// `allow_partial` the result is NULL until the ROWS frame is full:
    /// `CASE(COUNT() OVER w >= 2, result, NULL)`.
    #[allow(clippy::too_many_arguments)]
    pub fn make_over(
        &self,
        data_type: DataType,
        op: &OperatorRef,
        operands: Vec<RexNode>,
        partition_keys: Vec<RexNode>,
        order_keys: Vec<RexFieldCollation>,
        lower_bound: Option<RexWindowBound>,
        upper_bound: Option<RexWindowBound>,
        is_rows: bool,
        allow_partial: bool,
        null_when_count_zero: bool,
        distinct: bool,
    ) -> RexResult<RexNode> {
        if !allow_partial && !is_rows {
            return Err(contract_err!("DISALLOW PARTIAL over RANGE"));
        }
        let ops = std_operators();
        let window =
            self.make_window(partition_keys, order_keys, lower_bound, upper_bound, is_rows);
        let mut result: RexNode = RexOver::new(
            data_type.clone(),
            op.clone(),
            operands.clone(),
            window.clone(),
            distinct,
        )
        .into();

        if null_when_count_zero {
            let bigint = self.type_factory.create_type(SqlTypeName::BigInt)?;
            let count: RexNode = RexOver::new(
                bigint.clone(),
                ops.count.clone(),
                operands.clone(),
                window.clone(),
                distinct,
            )
            .into();
            let zero = self.make_literal(
                Some(LiteralValue::Decimal(Decimal::ZERO)),
                bigint,
                SqlTypeName::Decimal,
            )?;
            let not_null = self
                .type_factory
                .create_type_with_nullability(&data_type, false);
            // Aggregates such as $SUM0 are never NULL, so the branch needs a cast
            let agg: RexNode =
                RexOver::new(not_null, op.clone(), operands, window.clone(), distinct).into();
            result = self.make_call(
                &ops.case,
                vec![
                    self.make_call(&ops.greater_than, vec![count, zero])?,
                    self.ensure_type(&data_type, agg, false)?,
                    self.make_cast(&data_type, self.constant_null())?,
                ],
            )?;
            debug!(result = %result, "windowed aggregate is NULL over empty windows");
        }
        if !allow_partial {
            let bigint = self.type_factory.create_type(SqlTypeName::BigInt)?;
            let count: RexNode =
                RexOver::new(bigint.clone(), ops.count.clone(), vec![], window, distinct).into();
            let two = self.make_literal(
                Some(LiteralValue::Decimal(Decimal::TWO)),
                bigint,
                SqlTypeName::Decimal,
            )?;
            result = self.make_call(
                &ops.case,
                vec![
                    self.make_call(&ops.greater_than_or_equal, vec![count, two])?,
                    result,
                    self.constant_null(),
                ],
            )?;
            debug!(result = %result, "windowed aggregate is NULL over partial windows");
        }
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Sub-queries
    // ------------------------------------------------------------------

    /// `operands IN (plan)`
    pub fn make_in(&self, plan: Arc<dyn RelPlan>, operands: Vec<RexNode>) -> RexResult<RexNode> {
        let data_type = self.quantified_type(plan.as_ref(), &operands)?;
        Ok(RexSubQuery::new(data_type, std_operators().in_.clone(), operands, plan).into())
    }

    /// `EXISTS (plan)`
    pub fn make_exists(&self, plan: Arc<dyn RelPlan>) -> RexResult<RexNode> {
        let data_type = self.type_factory.create_type(SqlTypeName::Boolean)?;
        Ok(RexSubQuery::new(data_type, std_operators().exists.clone(), vec![], plan).into())
    }

    /// `(plan)` used as a value; the plan must produce exactly one column
    pub fn make_scalar_query(&self, plan: Arc<dyn RelPlan>) -> RexResult<RexNode> {
        let fields = plan.row_type().fields();
        if fields.len() != 1 {
            return Err(contract_err!(
                "Scalar sub-query must return one column, got {}",
                fields.len()
            ));
        }
        let data_type = self
            .type_factory
            .create_type_with_nullability(fields[0].data_type(), true);
        Ok(RexSubQuery::new(data_type, std_operators().scalar_query.clone(), vec![], plan).into())
    }

    /// `operands <comparison> SOME (plan)`
    pub fn make_some(
        &self,
        comparison: Kind,
        plan: Arc<dyn RelPlan>,
        operands: Vec<RexNode>,
    ) -> RexResult<RexNode> {
        self.make_quantified(Kind::Some, comparison, plan, operands)
    }

    /// `operands <comparison> ALL (plan)`
    pub fn make_all(
        &self,
        comparison: Kind,
        plan: Arc<dyn RelPlan>,
        operands: Vec<RexNode>,
    ) -> RexResult<RexNode> {
        self.make_quantified(Kind::All, comparison, plan, operands)
    }

    fn make_quantified(
        &self,
        quantifier: Kind,
        comparison: Kind,
        plan: Arc<dyn RelPlan>,
        operands: Vec<RexNode>,
    ) -> RexResult<RexNode> {
        let op = std_operators()
            .quantified(quantifier, comparison)
            .ok_or_else(|| {
                RexError::InvalidArgument(format!(
                    "{} is not a comparison that can be quantified",
                    comparison
                ))
            })?;
        let data_type = self.quantified_type(plan.as_ref(), &operands)?;
        Ok(RexSubQuery::new(data_type, op, operands, plan).into())
    }

    /// BOOLEAN, nullable when an operand or a column of the plan is
    fn quantified_type(&self, plan: &dyn RelPlan, operands: &[RexNode]) -> RexResult<DataType> {
        let nullable = operands.iter().any(|o| o.data_type().is_nullable())
            || plan
                .row_type()
                .fields()
                .iter()
                .any(|f| f.data_type().is_nullable());
        let boolean = self.type_factory.create_type(SqlTypeName::Boolean)?;
        Ok(self
            .type_factory
            .create_type_with_nullability(&boolean, nullable))
    }

    // ------------------------------------------------------------------
    // Copying
    // ------------------------------------------------------------------

    /// Deep copy of an expression, re-creating types in this builder's factory
    pub fn copy(&self, expr: &RexNode) -> RexResult<RexNode> {
        RexCopier::new(self).apply(expr)
    }
}

impl Default for RexBuilder {
    fn default() -> Self {
        Self::new(Arc::new(DefaultTypeFactory::default()))
    }
}

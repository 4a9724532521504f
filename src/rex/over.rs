//! Windowed aggregates: `agg(...) OVER (window)`

use crate::operator::{Kind, OperatorRef};
use crate::rex::digest;
use crate::rex::node::RexNode;
use crate::types::DataType;
use std::fmt;
use std::sync::OnceLock;

/// One bound of a window frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RexWindowBound {
    UnboundedPreceding,
    UnboundedFollowing,
    CurrentRow,
    /// `<offset> PRECEDING`
    Preceding(RexNode),
    /// `<offset> FOLLOWING`
    Following(RexNode),
}

impl RexWindowBound {
    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            RexWindowBound::UnboundedPreceding | RexWindowBound::UnboundedFollowing
        )
    }

    pub fn is_current_row(&self) -> bool {
        matches!(self, RexWindowBound::CurrentRow)
    }

    /// Offset expression of a bounded frame edge
    pub fn offset(&self) -> Option<&RexNode> {
        match self {
            RexWindowBound::Preceding(offset) | RexWindowBound::Following(offset) => Some(offset),
            _ => None,
        }
    }

    /// Same bound with a new offset expression
    pub fn with_offset(&self, offset: RexNode) -> Self {
        match self {
            RexWindowBound::Preceding(_) => RexWindowBound::Preceding(offset),
            RexWindowBound::Following(_) => RexWindowBound::Following(offset),
            other => other.clone(),
        }
    }
}

impl fmt::Display for RexWindowBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RexWindowBound::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            RexWindowBound::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
            RexWindowBound::CurrentRow => f.write_str("CURRENT ROW"),
            RexWindowBound::Preceding(offset) => write!(f, "{} PRECEDING", offset.digest()),
            RexWindowBound::Following(offset) => write!(f, "{} FOLLOWING", offset.digest()),
        }
    }
}

/// An ORDER BY key of a window
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RexFieldCollation {
    pub expr: RexNode,
    pub descending: bool,
    pub nulls_first: bool,
    pub nulls_last: bool,
}

impl RexFieldCollation {
    pub fn new(expr: RexNode) -> Self {
        Self {
            expr,
            descending: false,
            nulls_first: false,
            nulls_last: false,
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls_first = true;
        self.nulls_last = false;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self.nulls_first = false;
        self
    }

    /// Same flags over a new expression
    pub fn with_expr(&self, expr: RexNode) -> Self {
        Self {
            expr,
            ..self.clone()
        }
    }
}

impl fmt::Display for RexFieldCollation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expr.digest())?;
        if self.descending {
            f.write_str(" DESC")?;
        }
        if self.nulls_first {
            f.write_str(" NULLS FIRST")?;
        }
        if self.nulls_last {
            f.write_str(" NULLS LAST")?;
        }
        Ok(())
    }
}

/// Window specification: partitioning, ordering and frame
#[derive(Debug, Clone)]
pub struct RexWindow {
    partition_keys: Vec<RexNode>,
    order_keys: Vec<RexFieldCollation>,
    lower_bound: Option<RexWindowBound>,
    upper_bound: Option<RexWindowBound>,
    is_rows: bool,
    digest: OnceLock<String>,
}

impl RexWindow {
    pub(crate) fn new(
        partition_keys: Vec<RexNode>,
        order_keys: Vec<RexFieldCollation>,
        lower_bound: Option<RexWindowBound>,
        upper_bound: Option<RexWindowBound>,
        is_rows: bool,
    ) -> Self {
        Self {
            partition_keys,
            order_keys,
            lower_bound,
            upper_bound,
            is_rows,
            digest: OnceLock::new(),
        }
    }

    pub fn partition_keys(&self) -> &[RexNode] {
        &self.partition_keys
    }

    pub fn order_keys(&self) -> &[RexFieldCollation] {
        &self.order_keys
    }

    pub fn lower_bound(&self) -> Option<&RexWindowBound> {
        self.lower_bound.as_ref()
    }

    pub fn upper_bound(&self) -> Option<&RexWindowBound> {
        self.upper_bound.as_ref()
    }

    /// ROWS frame rather than RANGE
    pub fn is_rows(&self) -> bool {
        self.is_rows
    }

    /// Same frame flavour over new keys and bounds
    pub fn clone_with(
        &self,
        partition_keys: Vec<RexNode>,
        order_keys: Vec<RexFieldCollation>,
        lower_bound: Option<RexWindowBound>,
        upper_bound: Option<RexWindowBound>,
    ) -> Self {
        Self::new(
            partition_keys,
            order_keys,
            lower_bound,
            upper_bound,
            self.is_rows,
        )
    }

    pub fn digest(&self) -> &str {
        self.digest.get_or_init(|| {
            let mut s = String::new();
            if !self.partition_keys.is_empty() {
                let keys: Vec<&str> = self.partition_keys.iter().map(|k| k.digest()).collect();
                s.push_str("PARTITION BY ");
                s.push_str(&keys.join(", "));
            }
            if !self.order_keys.is_empty() {
                if !s.is_empty() {
                    s.push(' ');
                }
                let keys: Vec<String> = self.order_keys.iter().map(|k| k.to_string()).collect();
                s.push_str("ORDER BY ");
                s.push_str(&keys.join(", "));
            }
            if let Some(lower) = &self.lower_bound {
                if !s.is_empty() {
                    s.push(' ');
                }
                s.push_str(if self.is_rows { "ROWS " } else { "RANGE " });
                match &self.upper_bound {
                    Some(upper) => s.push_str(&format!("BETWEEN {} AND {}", lower, upper)),
                    None => s.push_str(&lower.to_string()),
                }
            }
            s
        })
    }
}

impl PartialEq for RexWindow {
    fn eq(&self, other: &Self) -> bool {
        self.digest() == other.digest()
    }
}

impl Eq for RexWindow {}

impl fmt::Display for RexWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.digest())
    }
}

/// Aggregate evaluated over a window
#[derive(Debug, Clone)]
pub struct RexOver {
    op: OperatorRef,
    operands: Vec<RexNode>,
    window: RexWindow,
    distinct: bool,
    data_type: DataType,
    digest: OnceLock<String>,
}

impl RexOver {
    pub(crate) fn new(
        data_type: DataType,
        op: OperatorRef,
        operands: Vec<RexNode>,
        window: RexWindow,
        distinct: bool,
    ) -> Self {
        Self {
            op,
            operands,
            window,
            distinct,
            data_type,
            digest: OnceLock::new(),
        }
    }

    /// The aggregate being windowed
    pub fn op(&self) -> &OperatorRef {
        &self.op
    }

    pub fn operands(&self) -> &[RexNode] {
        &self.operands
    }

    pub fn window(&self) -> &RexWindow {
        &self.window
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn clone_with(&self, operands: Vec<RexNode>, window: RexWindow) -> Self {
        Self::new(
            self.data_type.clone(),
            self.op.clone(),
            operands,
            window,
            self.distinct,
        )
    }

    pub fn digest(&self) -> &str {
        self.digest.get_or_init(|| {
            format!(
                "{}({}{}) OVER ({})",
                self.op.name(),
                if self.distinct { "DISTINCT " } else { "" },
                digest::operand_list(Kind::Over, &self.operands),
                self.window.digest()
            )
        })
    }
}

//! Digest rendering helpers
//!
//! A digest is the canonical text of a node. Two nodes are equal exactly when
//! their digests are equal, so every rule here decides node identity.

use crate::operator::Kind;
use crate::rex::literal::RexLiteral;
use crate::rex::node::RexNode;

/// Whether a literal's digest carries a `:TYPE` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestIncludeType {
    /// Always append the type
    Always,
    /// Never append the type
    NoType,
    /// Decide from the literal's own type; see [`RexLiteral::digest_include_type`]
    Optional,
}

/// Render a double in scientific notation: `1.5E0`, `1E2`, `-2.5E-3`
pub fn to_scientific_notation(value: f64) -> String {
    if value == 0.0 {
        return "0E0".to_string();
    }
    format!("{:e}", value).replace('e', "E")
}

/// Digest of operand `i` of a call
///
/// Literal operands drop their type suffix where the call pins the type:
/// boolean operands of AND/OR, and literals in simple binary operators whose
/// other operand has the same type and is not itself a typed literal.
pub(crate) fn operand_digest(kind: Kind, operands: &[RexNode], i: usize) -> String {
    let operand = &operands[i];
    let literal = match operand {
        RexNode::Literal(literal) => literal,
        other => return other.digest().to_string(),
    };
    let mut include_type = DigestIncludeType::Optional;
    if matches!(kind, Kind::And | Kind::Or)
        && literal.data_type().type_name() == crate::types::SqlTypeName::Boolean
    {
        include_type = DigestIncludeType::NoType;
    }
    if kind.is_simple_binary() && operands.len() == 2 {
        let other = &operands[1 - i];
        let other_untyped = match other {
            RexNode::Literal(l) => l.digest_include_type() == DigestIncludeType::NoType,
            _ => true,
        };
        if other_untyped
            && literal
                .data_type()
                .equals_sans_nullability(other.data_type())
        {
            include_type = DigestIncludeType::NoType;
        }
    }
    literal.compute_digest(include_type)
}

/// `a, b, c` from the operand digests of a call
pub(crate) fn operand_list(kind: Kind, operands: &[RexNode]) -> String {
    (0..operands.len())
        .map(|i| operand_digest(kind, operands, i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Literal list rendering used by ARRAY, MULTISET and ROW values
pub(crate) fn literal_list(items: &[RexLiteral], include_type: DigestIncludeType) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| item.compute_digest(include_type))
        .collect();
    format!("[{}]", parts.join(", "))
}

/// Literal map rendering: `{k=v, k2=v2}`
pub(crate) fn literal_map(
    entries: &[(RexLiteral, RexLiteral)],
    include_type: DigestIncludeType,
) -> String {
    let parts: Vec<String> = entries
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                k.compute_digest(include_type),
                v.compute_digest(include_type)
            )
        })
        .collect();
    format!("{{{}}}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scientific_notation() {
        assert_eq!(to_scientific_notation(1.5), "1.5E0");
        assert_eq!(to_scientific_notation(100.0), "1E2");
        assert_eq!(to_scientific_notation(-0.0025), "-2.5E-3");
        assert_eq!(to_scientific_notation(0.0), "0E0");
    }
}

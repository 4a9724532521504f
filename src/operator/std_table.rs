//! The standard operator table

use crate::operator::kind::Kind;
use crate::operator::operator::{Arity, Operator, OperatorRef, ReturnTypeInference as R, Syntax};
use ahash::AHashMap;
use std::sync::{Arc, OnceLock};

/// Operators the expression core constructs or interprets
#[derive(Debug)]
pub struct StdOperatorTable {
    pub equals: OperatorRef,
    pub not_equals: OperatorRef,
    pub greater_than: OperatorRef,
    pub greater_than_or_equal: OperatorRef,
    pub less_than: OperatorRef,
    pub less_than_or_equal: OperatorRef,
    pub is_distinct_from: OperatorRef,
    pub is_not_distinct_from: OperatorRef,
    pub and: OperatorRef,
    pub or: OperatorRef,
    pub not: OperatorRef,
    pub is_null: OperatorRef,
    pub is_not_null: OperatorRef,
    pub is_true: OperatorRef,
    pub is_not_true: OperatorRef,
    pub is_false: OperatorRef,
    pub is_not_false: OperatorRef,
    pub plus: OperatorRef,
    pub minus: OperatorRef,
    pub multiply: OperatorRef,
    pub divide: OperatorRef,
    pub divide_integer: OperatorRef,
    pub modulo: OperatorRef,
    pub unary_plus: OperatorRef,
    pub unary_minus: OperatorRef,
    pub case: OperatorRef,
    pub coalesce: OperatorRef,
    pub cast: OperatorRef,
    pub reinterpret: OperatorRef,
    pub ceil: OperatorRef,
    pub floor: OperatorRef,
    pub extract: OperatorRef,
    pub count: OperatorRef,
    pub sum: OperatorRef,
    pub sum0: OperatorRef,
    pub min: OperatorRef,
    pub max: OperatorRef,
    pub avg: OperatorRef,
    pub array_value_constructor: OperatorRef,
    pub map_value_constructor: OperatorRef,
    pub multiset_value: OperatorRef,
    pub new_instance: OperatorRef,
    /// Looks up a record field by name at run time
    pub get: OperatorRef,
    pub in_: OperatorRef,
    pub exists: OperatorRef,
    pub scalar_query: OperatorRef,
    by_name: AHashMap<String, OperatorRef>,
    quantified: AHashMap<(Kind, Kind), OperatorRef>,
}

fn op(name: &str, kind: Kind, syntax: Syntax, arity: Arity, return_type: R) -> OperatorRef {
    Arc::new(Operator::new(name, kind, syntax, arity, return_type))
}

fn binary(name: &str, kind: Kind, return_type: R) -> OperatorRef {
    op(name, kind, Syntax::Binary, Arity::exactly(2), return_type)
}

fn postfix(name: &str, kind: Kind) -> OperatorRef {
    op(name, kind, Syntax::Postfix, Arity::exactly(1), R::BooleanNotNull)
}

fn function(name: &str, kind: Kind, arity: Arity, return_type: R) -> OperatorRef {
    op(name, kind, Syntax::Function, arity, return_type)
}

const COMPARISONS: [Kind; 6] = [
    Kind::Equals,
    Kind::NotEquals,
    Kind::GreaterThan,
    Kind::GreaterThanOrEqual,
    Kind::LessThan,
    Kind::LessThanOrEqual,
];

fn comparison_symbol(kind: Kind) -> &'static str {
    match kind {
        Kind::Equals => "=",
        Kind::NotEquals => "<>",
        Kind::GreaterThan => ">",
        Kind::GreaterThanOrEqual => ">=",
        Kind::LessThan => "<",
        _ => "<=",
    }
}

impl StdOperatorTable {
    fn build() -> Self {
        let mut table = StdOperatorTable {
            equals: binary("=", Kind::Equals, R::BooleanNullable),
            not_equals: binary("<>", Kind::NotEquals, R::BooleanNullable),
            greater_than: binary(">", Kind::GreaterThan, R::BooleanNullable),
            greater_than_or_equal: binary(">=", Kind::GreaterThanOrEqual, R::BooleanNullable),
            less_than: binary("<", Kind::LessThan, R::BooleanNullable),
            less_than_or_equal: binary("<=", Kind::LessThanOrEqual, R::BooleanNullable),
            is_distinct_from: binary("IS DISTINCT FROM", Kind::IsDistinctFrom, R::BooleanNotNull),
            is_not_distinct_from: binary(
                "IS NOT DISTINCT FROM",
                Kind::IsNotDistinctFrom,
                R::BooleanNotNull,
            ),
            and: op("AND", Kind::And, Syntax::Binary, Arity::at_least(2), R::BooleanNullable),
            or: op("OR", Kind::Or, Syntax::Binary, Arity::at_least(2), R::BooleanNullable),
            not: op("NOT", Kind::Not, Syntax::Prefix, Arity::exactly(1), R::Arg0Nullable),
            is_null: postfix("IS NULL", Kind::IsNull),
            is_not_null: postfix("IS NOT NULL", Kind::IsNotNull),
            is_true: postfix("IS TRUE", Kind::IsTrue),
            is_not_true: postfix("IS NOT TRUE", Kind::IsNotTrue),
            is_false: postfix("IS FALSE", Kind::IsFalse),
            is_not_false: postfix("IS NOT FALSE", Kind::IsNotFalse),
            plus: binary("+", Kind::Plus, R::LeastRestrictive),
            minus: binary("-", Kind::Minus, R::LeastRestrictive),
            multiply: binary("*", Kind::Times, R::LeastRestrictive),
            divide: binary("/", Kind::Divide, R::LeastRestrictive),
            divide_integer: binary("/INT", Kind::DivideInteger, R::Arg0Nullable),
            modulo: function("MOD", Kind::Mod, Arity::exactly(2), R::LeastRestrictive),
            unary_plus: op("+", Kind::PlusPrefix, Syntax::Prefix, Arity::exactly(1), R::Arg(0)),
            unary_minus: op("-", Kind::MinusPrefix, Syntax::Prefix, Arity::exactly(1), R::Arg(0)),
            case: op("CASE", Kind::Case, Syntax::Special, Arity::at_least(2), R::CaseResult),
            coalesce: function(
                "COALESCE",
                Kind::Coalesce,
                Arity::at_least(1),
                R::LeastRestrictiveLeastNullable,
            ),
            cast: op("CAST", Kind::Cast, Syntax::Special, Arity::exactly(1), R::Explicit),
            reinterpret: op(
                "Reinterpret",
                Kind::Reinterpret,
                Syntax::Special,
                Arity::between(1, 2),
                R::Explicit,
            ),
            ceil: function("CEIL", Kind::Ceil, Arity::between(1, 2), R::Arg0Nullable),
            floor: function("FLOOR", Kind::Floor, Arity::between(1, 2), R::Arg0Nullable),
            extract: function("EXTRACT", Kind::Extract, Arity::exactly(2), R::BigIntNullable),
            count: function("COUNT", Kind::Count, Arity::at_least(0), R::BigIntNotNull),
            sum: function("SUM", Kind::Sum, Arity::exactly(1), R::Arg0ForceNullable),
            sum0: function("$SUM0", Kind::Sum0, Arity::exactly(1), R::Arg0NotNull),
            min: function("MIN", Kind::Min, Arity::exactly(1), R::Arg0ForceNullable),
            max: function("MAX", Kind::Max, Arity::exactly(1), R::Arg0ForceNullable),
            avg: function("AVG", Kind::Avg, Arity::exactly(1), R::Average),
            array_value_constructor: op(
                "ARRAY",
                Kind::ArrayValueConstructor,
                Syntax::Special,
                Arity::at_least(1),
                R::ArrayOfOperands,
            ),
            map_value_constructor: op(
                "MAP",
                Kind::MapValueConstructor,
                Syntax::Special,
                Arity::at_least(2),
                R::MapOfOperands,
            ),
            multiset_value: op(
                "MULTISET",
                Kind::MultisetValueConstructor,
                Syntax::Special,
                Arity::at_least(1),
                R::MultisetOfOperands,
            ),
            new_instance: op(
                "NEW",
                Kind::NewSpecification,
                Syntax::Special,
                Arity::at_least(0),
                R::Explicit,
            ),
            get: function("_get", Kind::Item, Arity::exactly(2), R::Explicit),
            in_: op("IN", Kind::In, Syntax::Special, Arity::at_least(0), R::BooleanNullable),
            exists: op(
                "EXISTS",
                Kind::Exists,
                Syntax::Prefix,
                Arity::exactly(0),
                R::BooleanNotNull,
            ),
            scalar_query: op(
                "$SCALAR_QUERY",
                Kind::ScalarQuery,
                Syntax::Special,
                Arity::exactly(0),
                R::Explicit,
            ),
            by_name: AHashMap::new(),
            quantified: AHashMap::new(),
        };

        for quantifier in [Kind::Some, Kind::All] {
            let prefix = if quantifier == Kind::Some { "SOME" } else { "ALL" };
            for comparison in COMPARISONS {
                let name = format!("{} {}", prefix, comparison_symbol(comparison));
                table.quantified.insert(
                    (quantifier, comparison),
                    op(&name, quantifier, Syntax::Special, Arity::at_least(0), R::BooleanNullable),
                );
            }
        }

        // Binary forms win over prefix forms for shared names
        let all = [
            &table.equals,
            &table.not_equals,
            &table.greater_than,
            &table.greater_than_or_equal,
            &table.less_than,
            &table.less_than_or_equal,
            &table.is_distinct_from,
            &table.is_not_distinct_from,
            &table.and,
            &table.or,
            &table.not,
            &table.is_null,
            &table.is_not_null,
            &table.is_true,
            &table.is_not_true,
            &table.is_false,
            &table.is_not_false,
            &table.plus,
            &table.minus,
            &table.multiply,
            &table.divide,
            &table.divide_integer,
            &table.modulo,
            &table.unary_plus,
            &table.unary_minus,
            &table.case,
            &table.coalesce,
            &table.cast,
            &table.reinterpret,
            &table.ceil,
            &table.floor,
            &table.extract,
            &table.count,
            &table.sum,
            &table.sum0,
            &table.min,
            &table.max,
            &table.avg,
            &table.array_value_constructor,
            &table.map_value_constructor,
            &table.multiset_value,
            &table.new_instance,
            &table.get,
            &table.in_,
            &table.exists,
            &table.scalar_query,
        ]
        .into_iter()
        .cloned()
        .collect::<Vec<_>>();
        let quantified: Vec<OperatorRef> = table.quantified.values().cloned().collect();
        for operator in all.into_iter().chain(quantified) {
            table
                .by_name
                .entry(operator.name().to_string())
                .or_insert(operator);
        }
        table
    }

    /// Look up an operator by its digest name
    pub fn lookup(&self, name: &str) -> Option<OperatorRef> {
        self.by_name.get(name).cloned()
    }

    /// `SOME` or `ALL` combined with a comparison
    pub fn quantified(&self, quantifier: Kind, comparison: Kind) -> Option<OperatorRef> {
        self.quantified.get(&(quantifier, comparison)).cloned()
    }

    /// The comparison operator of a kind
    pub fn comparison(&self, kind: Kind) -> Option<OperatorRef> {
        let operator = match kind {
            Kind::Equals => &self.equals,
            Kind::NotEquals => &self.not_equals,
            Kind::GreaterThan => &self.greater_than,
            Kind::GreaterThanOrEqual => &self.greater_than_or_equal,
            Kind::LessThan => &self.less_than,
            Kind::LessThanOrEqual => &self.less_than_or_equal,
            Kind::IsDistinctFrom => &self.is_distinct_from,
            Kind::IsNotDistinctFrom => &self.is_not_distinct_from,
            _ => return None,
        };
        Some(operator.clone())
    }
}

/// Shared standard operator table
pub fn std_operators() -> &'static StdOperatorTable {
    static TABLE: OnceLock<StdOperatorTable> = OnceLock::new();
    TABLE.get_or_init(StdOperatorTable::build)
}

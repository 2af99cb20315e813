//! The boolean predicate AST.
//!
//! `Predicate` is a closed set of boolean nodes. `Composite` and `Not`
//! always parenthesize their operands when rendered, so arbitrary AND/OR/NOT
//! trees compose correctly without an operator precedence table.

use crate::correlate::RelationSql;
use crate::dialect::SqlDialect;
use crate::expr::Expr;
use crate::params::{Binding, ParameterContext};
use crate::select::SelectBuilder;
use suprim_core::{Error, Relation, Result, Value};

/// Boolean connective of a composite predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            BoolOp::And => "AND",
            BoolOp::Or => "OR",
        }
    }
}

/// Comparison operator of a simple predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
    /// Array containment (`@>`); requires array support.
    ArrayContains,
    /// Array containment (`<@`); requires array support.
    ArrayContainedBy,
    /// JSONB document containment (`@>`); requires JSONB support.
    JsonContains,
}

impl CompareOp {
    /// The SQL token for plain binary operators; containment and the
    /// multi-token operators are rendered specially.
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
            CompareOp::ILike => "ILIKE",
            CompareOp::NotILike => "NOT ILIKE",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
            CompareOp::Between => "BETWEEN",
            CompareOp::NotBetween => "NOT BETWEEN",
            CompareOp::IsNull => "IS NULL",
            CompareOp::IsNotNull => "IS NOT NULL",
            CompareOp::ArrayContains => "@>",
            CompareOp::ArrayContainedBy => "<@",
            CompareOp::JsonContains => "@>",
        }
    }
}

/// A boolean SQL predicate.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Binary comparison. `right` is `None` only for the IS (NOT) NULL
    /// operators, which take no right operand.
    Simple {
        left: Expr,
        op: CompareOp,
        right: Option<Expr>,
    },

    /// `(left AND|OR right)` — always parenthesized.
    Composite {
        left: Box<Predicate>,
        op: BoolOp,
        right: Box<Predicate>,
    },

    /// `(NOT inner)` — always parenthesized.
    Not(Box<Predicate>),

    /// Raw SQL fragment (escape hatch).
    Raw(String),

    /// Raw SQL with named parameters (`:name`), bound through the build's
    /// parameter context.
    ParameterizedRaw {
        sql: String,
        params: Vec<(String, Value)>,
    },

    /// `[NOT] EXISTS (SELECT 1 ...)` correlating a relation to an owner row.
    RelationExists {
        relation: Box<Relation>,
        constraint: Option<Box<Predicate>>,
        negated: bool,
        owner_alias: String,
    },

    /// `(SELECT COUNT(*) ...) op n` over a relation's correlated rows.
    RelationCount {
        relation: Box<Relation>,
        op: CompareOp,
        count: i64,
        constraint: Option<Box<Predicate>>,
        owner_alias: String,
    },

    /// `[NOT] EXISTS (subquery)`.
    ExistsSubquery {
        query: Box<SelectBuilder>,
        negated: bool,
    },
}

impl Predicate {
    /// A binary comparison between two expressions.
    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Predicate::Simple {
            left,
            op,
            right: Some(right),
        }
    }

    /// An IS NULL / IS NOT NULL test.
    pub fn null_check(left: Expr, negated: bool) -> Self {
        Predicate::Simple {
            left,
            op: if negated {
                CompareOp::IsNotNull
            } else {
                CompareOp::IsNull
            },
            right: None,
        }
    }

    /// A raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Predicate::Raw(sql.into())
    }

    /// A raw SQL fragment with named parameters.
    pub fn raw_bound(sql: impl Into<String>, params: Vec<(String, Value)>) -> Self {
        Predicate::ParameterizedRaw {
            sql: sql.into(),
            params,
        }
    }

    /// An EXISTS test over a relation, correlated to `owner_alias`.
    pub fn relation_exists(relation: Relation, owner_alias: impl Into<String>) -> Self {
        Predicate::RelationExists {
            relation: Box::new(relation),
            constraint: None,
            negated: false,
            owner_alias: owner_alias.into(),
        }
    }

    /// A NOT EXISTS test over a relation.
    pub fn relation_missing(relation: Relation, owner_alias: impl Into<String>) -> Self {
        Predicate::RelationExists {
            relation: Box::new(relation),
            constraint: None,
            negated: true,
            owner_alias: owner_alias.into(),
        }
    }

    /// A correlated COUNT comparison over a relation.
    pub fn relation_count(
        relation: Relation,
        op: CompareOp,
        count: i64,
        owner_alias: impl Into<String>,
    ) -> Self {
        Predicate::RelationCount {
            relation: Box::new(relation),
            op,
            count,
            constraint: None,
            owner_alias: owner_alias.into(),
        }
    }

    /// Constrain the related rows of a relation predicate. No effect on
    /// other node kinds.
    pub fn constrain(self, predicate: Predicate) -> Self {
        match self {
            Predicate::RelationExists {
                relation,
                negated,
                owner_alias,
                ..
            } => Predicate::RelationExists {
                relation,
                constraint: Some(Box::new(predicate)),
                negated,
                owner_alias,
            },
            Predicate::RelationCount {
                relation,
                op,
                count,
                owner_alias,
                ..
            } => Predicate::RelationCount {
                relation,
                op,
                count,
                constraint: Some(Box::new(predicate)),
                owner_alias,
            },
            other => other,
        }
    }

    /// An EXISTS test over an arbitrary subquery.
    pub fn exists(query: SelectBuilder) -> Self {
        Predicate::ExistsSubquery {
            query: Box::new(query),
            negated: false,
        }
    }

    /// A NOT EXISTS test over an arbitrary subquery.
    pub fn not_exists(query: SelectBuilder) -> Self {
        Predicate::ExistsSubquery {
            query: Box::new(query),
            negated: true,
        }
    }

    /// `(self AND other)`.
    pub fn and(self, other: Predicate) -> Self {
        Predicate::Composite {
            left: Box::new(self),
            op: BoolOp::And,
            right: Box::new(other),
        }
    }

    /// `(self OR other)`.
    pub fn or(self, other: Predicate) -> Self {
        Predicate::Composite {
            left: Box::new(self),
            op: BoolOp::Or,
            right: Box::new(other),
        }
    }

    /// `(NOT self)`.
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Fold predicates with AND; `None` when the input is empty.
    pub fn all(predicates: Vec<Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }

    /// Fold predicates with OR; `None` when the input is empty.
    pub fn any(predicates: Vec<Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::or)
    }

    /// Render with inline literal values.
    pub fn to_sql(&self, dialect: &SqlDialect) -> Result<String> {
        self.render(dialect, &mut Binding::Inline)
    }

    /// Render with named placeholders registered in `params`.
    pub fn to_sql_bound(
        &self,
        dialect: &SqlDialect,
        params: &mut ParameterContext,
    ) -> Result<String> {
        self.render(dialect, &mut Binding::Bound(params))
    }

    pub(crate) fn render(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        match self {
            Predicate::Simple { left, op, right } => {
                render_simple(dialect, binding, left, *op, right.as_ref())
            }

            Predicate::Composite { left, op, right } => Ok(format!(
                "({} {} {})",
                left.render(dialect, binding)?,
                op.as_str(),
                right.render(dialect, binding)?
            )),

            Predicate::Not(inner) => Ok(format!("(NOT {})", inner.render(dialect, binding)?)),

            Predicate::Raw(sql) => Ok(sql.clone()),

            Predicate::ParameterizedRaw { sql, params } => {
                // Replace longer names first so `:id` never clobbers `:id2`.
                let mut ordered: Vec<_> = params.iter().collect();
                ordered.sort_by_key(|(name, _)| std::cmp::Reverse(name.len()));
                let mut out = sql.clone();
                for (name, value) in ordered {
                    let rendered = binding.literal(dialect, value)?;
                    out = out.replace(&format!(":{name}"), &rendered);
                }
                Ok(out)
            }

            Predicate::RelationExists {
                relation,
                constraint,
                negated,
                owner_alias,
            } => {
                let query = relation.exists_query(owner_alias, constraint.as_deref().cloned());
                let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!(
                    "{keyword} ({})",
                    query.render_into(dialect, binding)?
                ))
            }

            Predicate::RelationCount {
                relation,
                op,
                count,
                constraint,
                owner_alias,
            } => {
                let query = relation.count_query(owner_alias, constraint.as_deref().cloned());
                let count_sql = binding.literal(dialect, &Value::BigInt(*count))?;
                Ok(format!(
                    "({}) {} {count_sql}",
                    query.render_into(dialect, binding)?,
                    op.as_str()
                ))
            }

            Predicate::ExistsSubquery { query, negated } => {
                let keyword = if *negated { "NOT EXISTS" } else { "EXISTS" };
                Ok(format!(
                    "{keyword} ({})",
                    query.render_into(dialect, binding)?
                ))
            }
        }
    }
}

fn render_simple(
    dialect: &SqlDialect,
    binding: &mut Binding<'_>,
    left: &Expr,
    op: CompareOp,
    right: Option<&Expr>,
) -> Result<String> {
    let left_sql = left.render(dialect, binding)?;

    match op {
        CompareOp::IsNull => return Ok(format!("{left_sql} IS NULL")),
        CompareOp::IsNotNull => return Ok(format!("{left_sql} IS NOT NULL")),
        _ => {}
    }

    let Some(right) = right else {
        return Err(Error::builder(
            "predicate",
            format!("the {} operator requires a right operand", op.as_str()),
        ));
    };

    match op {
        CompareOp::In | CompareOp::NotIn => {
            let keyword = op.as_str();
            // Scalar subqueries arrive pre-parenthesized.
            if matches!(right, Expr::SubqueryScalar { .. }) {
                Ok(format!("{left_sql} {keyword} {}", right.render(dialect, binding)?))
            } else {
                Ok(format!(
                    "{left_sql} {keyword} ({})",
                    right.render(dialect, binding)?
                ))
            }
        }

        CompareOp::Between | CompareOp::NotBetween => {
            let Expr::List { values, .. } = right else {
                return Err(Error::builder(
                    "predicate",
                    "BETWEEN requires a two-element list literal",
                ));
            };
            let [low, high] = values.as_slice() else {
                return Err(Error::builder(
                    "predicate",
                    format!("BETWEEN requires exactly 2 bounds, got {}", values.len()),
                ));
            };
            let keyword = op.as_str();
            Ok(format!(
                "{left_sql} {keyword} {} AND {}",
                binding.literal(dialect, low)?,
                binding.literal(dialect, high)?
            ))
        }

        CompareOp::ILike | CompareOp::NotILike => {
            let right_sql = right.render(dialect, binding)?;
            if dialect.supports_ilike() {
                Ok(format!("{left_sql} {} {right_sql}", op.as_str()))
            } else {
                // Always-correct rewrite, so this degrades silently.
                let not = if op == CompareOp::NotILike { "NOT " } else { "" };
                Ok(format!("LOWER({left_sql}) {not}LIKE LOWER({right_sql})"))
            }
        }

        CompareOp::ArrayContains | CompareOp::ArrayContainedBy => {
            if !dialect.supports_arrays() {
                return Err(Error::unsupported(
                    "array containment operators",
                    dialect.name(),
                    "normalize the array into a join table and use EXISTS",
                ));
            }
            Ok(format!(
                "{left_sql} {} {}",
                op.as_str(),
                right.render(dialect, binding)?
            ))
        }

        CompareOp::JsonContains => {
            if !dialect.supports_jsonb() {
                return Err(Error::unsupported(
                    "JSONB containment",
                    dialect.name(),
                    "compare individual extracted paths instead",
                ));
            }
            Ok(format!(
                "{left_sql} @> {}",
                right.render(dialect, binding)?
            ))
        }

        _ => Ok(format!(
            "{left_sql} {} {}",
            op.as_str(),
            right.render(dialect, binding)?
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suprim_core::SqlType;

    fn pg() -> SqlDialect {
        SqlDialect::postgres()
    }

    fn age() -> Expr {
        Expr::name("age", SqlType::Integer)
    }

    #[test]
    fn parenthesization_is_total() {
        let a = Predicate::compare(age(), CompareOp::Gt, Expr::lit(1));
        let b = Predicate::compare(age(), CompareOp::Lt, Expr::lit(2));
        let c = Predicate::compare(age(), CompareOp::Eq, Expr::lit(3));

        let sql = a.and(b).or(c).to_sql(&pg()).unwrap();
        assert_eq!(sql, "((\"age\" > 1 AND \"age\" < 2) OR \"age\" = 3)");
    }

    #[test]
    fn not_parenthesizes_its_operand() {
        let a = Predicate::compare(age(), CompareOp::Ge, Expr::lit(18));
        assert_eq!(a.not().to_sql(&pg()).unwrap(), "(NOT \"age\" >= 18)");
    }

    #[test]
    fn deep_nesting_stays_unambiguous() {
        let p = |n: i32| Predicate::compare(age(), CompareOp::Eq, Expr::lit(n));
        let sql = p(1).or(p(2)).and(p(3).or(p(4))).to_sql(&pg()).unwrap();
        assert_eq!(
            sql,
            "((\"age\" = 1 OR \"age\" = 2) AND (\"age\" = 3 OR \"age\" = 4))"
        );
    }

    #[test]
    fn is_null_ignores_right_operand() {
        let sql = Predicate::null_check(age(), false).to_sql(&pg()).unwrap();
        assert_eq!(sql, "\"age\" IS NULL");
        let sql = Predicate::null_check(age(), true).to_sql(&pg()).unwrap();
        assert_eq!(sql, "\"age\" IS NOT NULL");
    }

    #[test]
    fn empty_in_list_renders_literally() {
        // `IN ()` matches no rows on every supported dialect.
        let p = Predicate::compare(age(), CompareOp::In, Expr::list(vec![]));
        assert_eq!(p.to_sql(&pg()).unwrap(), "\"age\" IN ()");
    }

    #[test]
    fn in_list_parenthesizes_values() {
        let p = Predicate::compare(
            age(),
            CompareOp::In,
            Expr::list(vec![Value::Int(1), Value::Int(2)]),
        );
        assert_eq!(p.to_sql(&pg()).unwrap(), "\"age\" IN (1, 2)");

        let mut ctx = ParameterContext::new();
        assert_eq!(p.to_sql_bound(&pg(), &mut ctx).unwrap(), "\"age\" IN (:p1, :p2)");
    }

    #[test]
    fn between_renders_bounds() {
        let p = Predicate::compare(
            age(),
            CompareOp::Between,
            Expr::list(vec![Value::Int(18), Value::Int(65)]),
        );
        assert_eq!(p.to_sql(&pg()).unwrap(), "\"age\" BETWEEN 18 AND 65");
    }

    #[test]
    fn between_requires_two_bounds() {
        let p = Predicate::compare(age(), CompareOp::Between, Expr::list(vec![Value::Int(1)]));
        let err = p.to_sql(&pg()).unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn ilike_degrades_without_native_support() {
        let p = Predicate::compare(
            Expr::name("name", SqlType::Text),
            CompareOp::ILike,
            Expr::lit("a%"),
        );
        assert_eq!(p.to_sql(&pg()).unwrap(), "\"name\" ILIKE 'a%'");
        assert_eq!(
            p.to_sql(&SqlDialect::mysql()).unwrap(),
            "LOWER(`name`) LIKE LOWER('a%')"
        );
    }

    #[test]
    fn containment_operators_require_capabilities() {
        let tags = Expr::name("tags", SqlType::Array(Box::new(SqlType::Text)));
        let p = Predicate::compare(
            tags,
            CompareOp::ArrayContains,
            Expr::lit(Value::Array(vec![Value::Text("a".into())])),
        );
        assert_eq!(p.to_sql(&pg()).unwrap(), "\"tags\" @> ARRAY['a']");

        let err = p.to_sql(&SqlDialect::mysql()).unwrap_err();
        match err {
            Error::UnsupportedFeature(inner) => {
                assert_eq!(inner.feature, "array containment operators");
                assert_eq!(inner.dialect, "mysql");
            }
            other => panic!("expected unsupported-feature error, got {other}"),
        }
    }

    #[test]
    fn parameterized_raw_binds_named_values() {
        let p = Predicate::raw_bound(
            "\"age\" > :min AND \"age\" < :min2",
            vec![
                ("min".to_string(), Value::Int(18)),
                ("min2".to_string(), Value::Int(65)),
            ],
        );
        // Longer names replaced first: :min must not clobber :min2.
        let mut ctx = ParameterContext::new();
        let sql = p.to_sql_bound(&pg(), &mut ctx).unwrap();
        assert_eq!(sql, "\"age\" > :p2 AND \"age\" < :p1");
        assert_eq!(ctx.get("p1"), Some(&Value::Int(65)));
        assert_eq!(ctx.get("p2"), Some(&Value::Int(18)));
    }

    #[test]
    fn all_and_any_fold() {
        let p = |n: i32| Predicate::compare(age(), CompareOp::Eq, Expr::lit(n));
        let folded = Predicate::all(vec![p(1), p(2), p(3)]).unwrap();
        assert_eq!(
            folded.to_sql(&pg()).unwrap(),
            "((\"age\" = 1 AND \"age\" = 2) AND \"age\" = 3)"
        );
        assert!(Predicate::all(vec![]).is_none());
    }
}

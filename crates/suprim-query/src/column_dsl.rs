//! Predicate and ordering factories on [`Column`].
//!
//! `Column` itself is pure metadata in `suprim-core`; this extension trait
//! is the seam where columns meet the expression layer. Literal operands are
//! typed with the column's declared SQL type, so dialect value casts apply.

use crate::clause::OrderSpec;
use crate::expr::Expr;
use crate::predicate::{CompareOp, Predicate};
use suprim_core::{Column, SqlType, Value};

pub trait ColumnDsl {
    /// An unqualified reference to this column.
    fn expr(&self) -> Expr;

    /// A reference qualified by the owning table's alias or name.
    fn qualified_expr(&self) -> Expr;

    fn eq(&self, value: impl Into<Value>) -> Predicate;
    fn ne(&self, value: impl Into<Value>) -> Predicate;
    fn gt(&self, value: impl Into<Value>) -> Predicate;
    fn ge(&self, value: impl Into<Value>) -> Predicate;
    fn lt(&self, value: impl Into<Value>) -> Predicate;
    fn le(&self, value: impl Into<Value>) -> Predicate;

    /// Compare against another column.
    fn eq_column(&self, other: &Column) -> Predicate;

    fn like(&self, pattern: impl Into<String>) -> Predicate;
    fn not_like(&self, pattern: impl Into<String>) -> Predicate;
    /// Case-insensitive LIKE; degrades to `LOWER(x) LIKE LOWER(y)` on
    /// dialects without native support.
    fn ilike(&self, pattern: impl Into<String>) -> Predicate;
    fn not_ilike(&self, pattern: impl Into<String>) -> Predicate;

    /// `IN (...)`. An empty list renders `IN ()`, which matches no rows.
    fn in_list(&self, values: Vec<Value>) -> Predicate;
    fn not_in(&self, values: Vec<Value>) -> Predicate;

    fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Predicate;

    fn is_null(&self) -> Predicate;
    fn is_not_null(&self) -> Predicate;

    /// Array containment (`@>`); requires array support on the dialect.
    fn contains_array(&self, values: Vec<Value>) -> Predicate;
    /// JSONB document containment (`@>`); requires JSONB support.
    fn contains_json(&self, document: serde_json::Value) -> Predicate;

    fn asc(&self) -> OrderSpec;
    fn desc(&self) -> OrderSpec;
}

impl ColumnDsl for Column {
    fn expr(&self) -> Expr {
        Expr::name(self.name(), self.sql_type().clone())
    }

    fn qualified_expr(&self) -> Expr {
        Expr::qualified(self.qualifier(), self.name(), self.sql_type().clone())
    }

    fn eq(&self, value: impl Into<Value>) -> Predicate {
        compare(self, CompareOp::Eq, value)
    }

    fn ne(&self, value: impl Into<Value>) -> Predicate {
        compare(self, CompareOp::Ne, value)
    }

    fn gt(&self, value: impl Into<Value>) -> Predicate {
        compare(self, CompareOp::Gt, value)
    }

    fn ge(&self, value: impl Into<Value>) -> Predicate {
        compare(self, CompareOp::Ge, value)
    }

    fn lt(&self, value: impl Into<Value>) -> Predicate {
        compare(self, CompareOp::Lt, value)
    }

    fn le(&self, value: impl Into<Value>) -> Predicate {
        compare(self, CompareOp::Le, value)
    }

    fn eq_column(&self, other: &Column) -> Predicate {
        Predicate::compare(self.expr(), CompareOp::Eq, other.expr())
    }

    fn like(&self, pattern: impl Into<String>) -> Predicate {
        pattern_match(self, CompareOp::Like, pattern)
    }

    fn not_like(&self, pattern: impl Into<String>) -> Predicate {
        pattern_match(self, CompareOp::NotLike, pattern)
    }

    fn ilike(&self, pattern: impl Into<String>) -> Predicate {
        pattern_match(self, CompareOp::ILike, pattern)
    }

    fn not_ilike(&self, pattern: impl Into<String>) -> Predicate {
        pattern_match(self, CompareOp::NotILike, pattern)
    }

    fn in_list(&self, values: Vec<Value>) -> Predicate {
        Predicate::compare(self.expr(), CompareOp::In, typed_list(self, values))
    }

    fn not_in(&self, values: Vec<Value>) -> Predicate {
        Predicate::compare(self.expr(), CompareOp::NotIn, typed_list(self, values))
    }

    fn between(&self, low: impl Into<Value>, high: impl Into<Value>) -> Predicate {
        Predicate::compare(
            self.expr(),
            CompareOp::Between,
            typed_list(self, vec![low.into(), high.into()]),
        )
    }

    fn is_null(&self) -> Predicate {
        Predicate::null_check(self.expr(), false)
    }

    fn is_not_null(&self) -> Predicate {
        Predicate::null_check(self.expr(), true)
    }

    fn contains_array(&self, values: Vec<Value>) -> Predicate {
        Predicate::compare(
            self.expr(),
            CompareOp::ArrayContains,
            Expr::typed_lit(Value::Array(values), self.sql_type().clone()),
        )
    }

    fn contains_json(&self, document: serde_json::Value) -> Predicate {
        Predicate::compare(
            self.expr(),
            CompareOp::JsonContains,
            Expr::typed_lit(Value::Json(document), SqlType::JsonB),
        )
    }

    fn asc(&self) -> OrderSpec {
        OrderSpec::asc(self.expr())
    }

    fn desc(&self) -> OrderSpec {
        OrderSpec::desc(self.expr())
    }
}

fn compare(column: &Column, op: CompareOp, value: impl Into<Value>) -> Predicate {
    Predicate::compare(
        column.expr(),
        op,
        Expr::typed_lit(value.into(), column.sql_type().clone()),
    )
}

fn pattern_match(column: &Column, op: CompareOp, pattern: impl Into<String>) -> Predicate {
    Predicate::compare(
        column.expr(),
        op,
        Expr::typed_lit(Value::Text(pattern.into()), SqlType::Text),
    )
}

fn typed_list(column: &Column, values: Vec<Value>) -> Expr {
    Expr::List {
        values,
        element_type: column.sql_type().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqlDialect;
    use crate::params::ParameterContext;
    use suprim_core::Table;

    fn age() -> Column {
        Column::new(&Table::new("users").entity("User"), "age", SqlType::Integer)
    }

    #[test]
    fn between_renders_inline_bounds() {
        let sql = age().between(18, 65).to_sql(&SqlDialect::postgres()).unwrap();
        assert_eq!(sql, "\"age\" BETWEEN 18 AND 65");
    }

    #[test]
    fn comparison_binds_typed_literal() {
        let table = Table::new("users");
        let id = Column::new(&table, "id", SqlType::Uuid);
        let nil = uuid::Uuid::nil();

        let mut ctx = ParameterContext::new();
        let sql = id
            .eq(nil)
            .to_sql_bound(&SqlDialect::postgres(), &mut ctx)
            .unwrap();
        assert_eq!(sql, "\"id\" = CAST(:p1 AS uuid)");
        assert_eq!(ctx.get("p1"), Some(&Value::Uuid(nil)));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let sql = age().in_list(vec![]).to_sql(&SqlDialect::postgres()).unwrap();
        assert_eq!(sql, "\"age\" IN ()");
    }

    #[test]
    fn qualified_expr_uses_table_reference() {
        let aliased = age().for_alias("u");
        let sql = aliased
            .qualified_expr()
            .to_sql(&SqlDialect::postgres())
            .unwrap();
        assert_eq!(sql, "\"u\".\"age\"");
    }

    #[test]
    fn order_factories() {
        let dialect = SqlDialect::postgres();
        let mut binding = crate::params::Binding::Inline;
        assert_eq!(
            age().desc().render(&dialect, &mut binding).unwrap(),
            "\"age\" DESC"
        );
    }
}

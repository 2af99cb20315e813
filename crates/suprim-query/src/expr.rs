//! The value-producing expression AST.
//!
//! `Expr` is a closed set of side-effect-free nodes. Rendering is
//! dialect-parametric: identical inputs and dialect always produce identical
//! SQL. Inline rendering (`to_sql`) embeds literal values; bound rendering
//! (`to_sql_bound`) replaces every literal with a named `:pN` placeholder
//! registered in a [`ParameterContext`], applying dialect value casts.

use crate::dialect::SqlDialect;
use crate::params::{Binding, ParameterContext};
use crate::predicate::Predicate;
use crate::select::SelectBuilder;
use suprim_core::{Column, Error, Result, SqlType, Value};

/// Built-in scalar function selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlFunctionKind {
    Lower,
    Upper,
    Length,
    Abs,
    Round,
    Custom(String),
}

impl SqlFunctionKind {
    pub fn sql_name(&self) -> &str {
        match self {
            SqlFunctionKind::Lower => "LOWER",
            SqlFunctionKind::Upper => "UPPER",
            SqlFunctionKind::Length => "LENGTH",
            SqlFunctionKind::Abs => "ABS",
            SqlFunctionKind::Round => "ROUND",
            SqlFunctionKind::Custom(name) => name,
        }
    }
}

/// Aggregate function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    pub const fn sql_name(self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Avg => "AVG",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
        }
    }
}

/// A value-producing SQL expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column reference, optionally qualified by a table name or alias.
    Column {
        qualifier: Option<String>,
        name: String,
        sql_type: SqlType,
    },

    /// Literal value.
    Literal { value: Value, sql_type: SqlType },

    /// Comma-joined list of literal values. An empty list renders as the
    /// empty string; callers wrapping it in `IN ()` get a match-nothing
    /// predicate on every supported dialect.
    List {
        values: Vec<Value>,
        element_type: SqlType,
    },

    /// Scalar function call.
    Function {
        kind: SqlFunctionKind,
        args: Vec<Expr>,
        alias: Option<String>,
    },

    /// Aggregate call: `FN(arg|*) [FILTER (WHERE ...)] [AS alias]`.
    Aggregate {
        kind: AggregateKind,
        arg: Option<Box<Expr>>,
        filter: Option<Box<Predicate>>,
        alias: Option<String>,
    },

    /// `COALESCE(...)`; the value type is taken from the first argument.
    Coalesce { args: Vec<Expr>, alias: Option<String> },

    /// JSON path navigation over a document expression.
    JsonPath {
        base: Box<Expr>,
        keys: Vec<String>,
        /// Extract the final step as text rather than a JSON fragment.
        last_as_text: bool,
    },

    /// An expression under an output alias.
    Aliased { expr: Box<Expr>, alias: String },

    /// A scalar subquery.
    SubqueryScalar {
        query: Box<SelectBuilder>,
        sql_type: SqlType,
    },
}

impl Expr {
    /// An unqualified column reference by name.
    pub fn name(name: impl Into<String>, sql_type: SqlType) -> Self {
        Expr::Column {
            qualifier: None,
            name: name.into(),
            sql_type,
        }
    }

    /// A qualified column reference.
    pub fn qualified(
        qualifier: impl Into<String>,
        name: impl Into<String>,
        sql_type: SqlType,
    ) -> Self {
        Expr::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
            sql_type,
        }
    }

    /// A literal value; the SQL type is inferred from the value.
    pub fn lit(value: impl Into<Value>) -> Self {
        let value = value.into();
        let sql_type = value.sql_type();
        Expr::Literal { value, sql_type }
    }

    /// A literal value with an explicit SQL type.
    pub fn typed_lit(value: impl Into<Value>, sql_type: SqlType) -> Self {
        Expr::Literal {
            value: value.into(),
            sql_type,
        }
    }

    /// A list literal; the element type is inferred from the first value.
    pub fn list(values: Vec<Value>) -> Self {
        let element_type = values.first().map_or(SqlType::Unspecified, Value::sql_type);
        Expr::List {
            values,
            element_type,
        }
    }

    /// A scalar function call.
    pub fn function(kind: SqlFunctionKind, args: Vec<Expr>) -> Self {
        Expr::Function {
            kind,
            args,
            alias: None,
        }
    }

    /// `COUNT(*)`.
    pub fn count_star() -> Self {
        Expr::Aggregate {
            kind: AggregateKind::Count,
            arg: None,
            filter: None,
            alias: None,
        }
    }

    /// An aggregate over an argument expression.
    pub fn aggregate(kind: AggregateKind, arg: Expr) -> Self {
        Expr::Aggregate {
            kind,
            arg: Some(Box::new(arg)),
            filter: None,
            alias: None,
        }
    }

    /// `COALESCE` over the given arguments.
    pub fn coalesce(args: Vec<Expr>) -> Self {
        Expr::Coalesce { args, alias: None }
    }

    /// Navigate into a JSON document.
    pub fn json_path(base: Expr, keys: Vec<String>, last_as_text: bool) -> Self {
        Expr::JsonPath {
            base: Box::new(base),
            keys,
            last_as_text,
        }
    }

    /// A scalar subquery with a declared value type.
    pub fn subquery(query: SelectBuilder, sql_type: SqlType) -> Self {
        Expr::SubqueryScalar {
            query: Box::new(query),
            sql_type,
        }
    }

    /// Attach a FILTER predicate; only meaningful on aggregate nodes, where
    /// it replaces any previous filter. Other nodes are returned unchanged.
    pub fn filter_where(self, predicate: Predicate) -> Self {
        match self {
            Expr::Aggregate {
                kind, arg, alias, ..
            } => Expr::Aggregate {
                kind,
                arg,
                filter: Some(Box::new(predicate)),
                alias,
            },
            other => other,
        }
    }

    /// Wrap this expression under an output alias.
    pub fn alias(self, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        match self {
            Expr::Function { kind, args, .. } => Expr::Function {
                kind,
                args,
                alias: Some(alias),
            },
            Expr::Aggregate {
                kind, arg, filter, ..
            } => Expr::Aggregate {
                kind,
                arg,
                filter,
                alias: Some(alias),
            },
            Expr::Coalesce { args, .. } => Expr::Coalesce {
                args,
                alias: Some(alias),
            },
            other => Expr::Aliased {
                expr: Box::new(other),
                alias,
            },
        }
    }

    /// The SQL type this expression produces.
    pub fn value_type(&self) -> SqlType {
        match self {
            Expr::Column { sql_type, .. }
            | Expr::Literal { sql_type, .. }
            | Expr::SubqueryScalar { sql_type, .. } => sql_type.clone(),
            Expr::List { element_type, .. } => element_type.clone(),
            Expr::Function { kind, args, .. } => match kind {
                SqlFunctionKind::Lower | SqlFunctionKind::Upper => SqlType::Text,
                SqlFunctionKind::Length => SqlType::BigInt,
                SqlFunctionKind::Abs | SqlFunctionKind::Round => args
                    .first()
                    .map_or(SqlType::Unspecified, Expr::value_type),
                SqlFunctionKind::Custom(_) => SqlType::Unspecified,
            },
            Expr::Aggregate { kind, arg, .. } => match kind {
                AggregateKind::Count => SqlType::BigInt,
                AggregateKind::Avg => SqlType::Double,
                AggregateKind::Sum | AggregateKind::Min | AggregateKind::Max => arg
                    .as_deref()
                    .map_or(SqlType::Unspecified, Expr::value_type),
            },
            Expr::Coalesce { args, .. } => args
                .first()
                .map_or(SqlType::Unspecified, Expr::value_type),
            Expr::JsonPath { last_as_text, .. } => {
                if *last_as_text {
                    SqlType::Text
                } else {
                    SqlType::Json
                }
            }
            Expr::Aliased { expr, .. } => expr.value_type(),
        }
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
            Expr::Column {
                qualifier, name, ..
            } => Ok(dialect.quote_qualified(qualifier.as_deref(), name)),

            Expr::Literal { value, sql_type } => match binding {
                Binding::Inline => dialect.format_value(value),
                Binding::Bound(ctx) => {
                    let name = ctx.register(value.clone());
                    Ok(dialect.cast_placeholder(&format!(":{name}"), sql_type))
                }
            },

            Expr::List { values, .. } => {
                let rendered: Result<Vec<_>> = values
                    .iter()
                    .map(|v| binding.literal(dialect, v))
                    .collect();
                Ok(rendered?.join(", "))
            }

            Expr::Function { kind, args, alias } => {
                let rendered: Result<Vec<_>> =
                    args.iter().map(|a| a.render(dialect, binding)).collect();
                let mut sql = format!("{}({})", kind.sql_name(), rendered?.join(", "));
                if let Some(alias) = alias {
                    sql.push_str(&format!(" AS {}", dialect.quote_ident(alias)));
                }
                Ok(sql)
            }

            Expr::Aggregate {
                kind,
                arg,
                filter,
                alias,
            } => {
                let arg_sql = match arg {
                    Some(arg) => arg.render(dialect, binding)?,
                    None => "*".to_string(),
                };
                let mut sql = format!("{}({})", kind.sql_name(), arg_sql);
                if let Some(filter) = filter {
                    if !dialect.supports_filter_clause() {
                        return Err(Error::unsupported(
                            "FILTER clause",
                            dialect.name(),
                            "move the condition into a CASE WHEN inside the aggregate argument",
                        ));
                    }
                    sql.push_str(&format!(" FILTER (WHERE {})", filter.render(dialect, binding)?));
                }
                if let Some(alias) = alias {
                    sql.push_str(&format!(" AS {}", dialect.quote_ident(alias)));
                }
                Ok(sql)
            }

            Expr::Coalesce { args, alias } => {
                let rendered: Result<Vec<_>> =
                    args.iter().map(|a| a.render(dialect, binding)).collect();
                let mut sql = format!("COALESCE({})", rendered?.join(", "));
                if let Some(alias) = alias {
                    sql.push_str(&format!(" AS {}", dialect.quote_ident(alias)));
                }
                Ok(sql)
            }

            Expr::JsonPath {
                base,
                keys,
                last_as_text,
            } => {
                let base_sql = base.render(dialect, binding)?;
                Ok(dialect.json_path_sql(&base_sql, keys, *last_as_text))
            }

            Expr::Aliased { expr, alias } => Ok(format!(
                "{} AS {}",
                expr.render(dialect, binding)?,
                dialect.quote_ident(alias)
            )),

            Expr::SubqueryScalar { query, .. } => {
                Ok(format!("({})", query.render_into(dialect, binding)?))
            }
        }
    }
}

impl From<&Column> for Expr {
    /// An unqualified reference to the column. Use [`Expr::qualified`] or
    /// `ColumnDsl::qualified_expr` when the statement joins several tables.
    fn from(column: &Column) -> Self {
        Expr::name(column.name(), column.sql_type().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pg() -> SqlDialect {
        SqlDialect::postgres()
    }

    #[test]
    fn column_rendering() {
        assert_eq!(
            Expr::name("age", SqlType::Integer).to_sql(&pg()).unwrap(),
            "\"age\""
        );
        assert_eq!(
            Expr::qualified("u", "age", SqlType::Integer)
                .to_sql(&pg())
                .unwrap(),
            "\"u\".\"age\""
        );
    }

    #[test]
    fn literal_inline_and_bound_render_same_shape() {
        let expr = Expr::lit(42);
        assert_eq!(expr.to_sql(&pg()).unwrap(), "42");

        let mut ctx = ParameterContext::new();
        assert_eq!(expr.to_sql_bound(&pg(), &mut ctx).unwrap(), ":p1");
        assert_eq!(ctx.values(), &[("p1".to_string(), Value::Int(42))]);
    }

    #[test]
    fn bound_rendering_twice_with_fresh_contexts_is_identical() {
        let expr = Expr::lit("hello");
        let mut first = ParameterContext::new();
        let mut second = ParameterContext::new();
        let a = expr.to_sql_bound(&pg(), &mut first).unwrap();
        let b = expr.to_sql_bound(&pg(), &mut second).unwrap();
        assert_eq!(a, b);
        assert_eq!(first.values(), second.values());
    }

    #[test]
    fn uuid_literal_binds_with_cast() {
        let id = uuid::Uuid::nil();
        let expr = Expr::lit(id);
        let mut ctx = ParameterContext::new();
        assert_eq!(
            expr.to_sql_bound(&pg(), &mut ctx).unwrap(),
            "CAST(:p1 AS uuid)"
        );
        // No native uuid type on MySQL: the bare placeholder is used.
        let mut ctx = ParameterContext::new();
        assert_eq!(
            expr.to_sql_bound(&SqlDialect::mysql(), &mut ctx).unwrap(),
            ":p1"
        );
    }

    #[test]
    fn empty_list_renders_empty_string() {
        let expr = Expr::list(vec![]);
        assert_eq!(expr.to_sql(&pg()).unwrap(), "");
    }

    #[test]
    fn list_renders_comma_joined() {
        let expr = Expr::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(expr.to_sql(&pg()).unwrap(), "1, 2, 3");

        let mut ctx = ParameterContext::new();
        assert_eq!(expr.to_sql_bound(&pg(), &mut ctx).unwrap(), ":p1, :p2, :p3");
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn aggregate_with_filter_renders_on_postgres() {
        let expr = Expr::aggregate(
            AggregateKind::Count,
            Expr::name("id", SqlType::BigInt),
        )
        .filter_where(Predicate::raw("\"active\""))
        .alias("active_count");
        assert_eq!(
            expr.to_sql(&pg()).unwrap(),
            "COUNT(\"id\") FILTER (WHERE \"active\") AS \"active_count\""
        );
    }

    #[test]
    fn aggregate_filter_unsupported_on_mysql() {
        let expr = Expr::count_star().filter_where(Predicate::raw("1 = 1"));
        let err = expr.to_sql(&SqlDialect::mysql()).unwrap_err();
        match err {
            Error::UnsupportedFeature(inner) => {
                assert_eq!(inner.feature, "FILTER clause");
                assert_eq!(inner.dialect, "mysql");
                assert!(inner.hint.contains("CASE WHEN"));
            }
            other => panic!("expected unsupported-feature error, got {other}"),
        }
    }

    #[test]
    fn coalesce_value_type_from_first_argument() {
        let expr = Expr::coalesce(vec![
            Expr::name("nickname", SqlType::Text),
            Expr::lit("anon"),
        ]);
        assert_eq!(expr.value_type(), SqlType::Text);
        assert_eq!(
            expr.to_sql(&pg()).unwrap(),
            "COALESCE(\"nickname\", 'anon')"
        );
        assert_eq!(Expr::coalesce(vec![]).value_type(), SqlType::Unspecified);
    }

    #[test]
    fn json_path_value_type_follows_text_flag() {
        let doc = Expr::name("meta", SqlType::JsonB);
        let as_json = Expr::json_path(doc.clone(), vec!["a".into()], false);
        let as_text = Expr::json_path(doc, vec!["a".into()], true);
        assert_eq!(as_json.value_type(), SqlType::Json);
        assert_eq!(as_text.value_type(), SqlType::Text);
        assert_eq!(as_text.to_sql(&pg()).unwrap(), "\"meta\" ->> 'a'");
    }

    #[test]
    fn aliased_expression_renders_as_clause() {
        let expr = Expr::name("total", SqlType::BigInt).alias("t");
        assert_eq!(expr.to_sql(&pg()).unwrap(), "\"total\" AS \"t\"");
    }

    #[test]
    fn count_value_type_is_bigint() {
        assert_eq!(Expr::count_star().value_type(), SqlType::BigInt);
        assert_eq!(
            Expr::aggregate(AggregateKind::Sum, Expr::name("n", SqlType::Integer)).value_type(),
            SqlType::Integer
        );
    }
}

//! INSERT, UPDATE, DELETE, and UPSERT statement builders.

use crate::clause::TrashedScope;
use crate::dialect::{SqlDialect, UpsertSyntax};
use crate::expr::Expr;
use crate::params::{Binding, ParameterContext};
use crate::predicate::Predicate;
use crate::query::QueryResult;
use suprim_core::{Error, Result, Table, Value};

/// INSERT statement builder.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: Table,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    returning: Vec<Expr>,
}

impl InsertBuilder {
    pub fn into_table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Declare the column list.
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Append one row of values, in column order.
    pub fn values(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Request a RETURNING clause (capability-checked at build).
    pub fn returning(mut self, expr: Expr) -> Self {
        self.returning.push(expr);
        self
    }

    pub fn to_sql(&self, dialect: &SqlDialect) -> Result<String> {
        self.render_into(dialect, &mut Binding::Inline)
    }

    pub fn build(&self, dialect: &SqlDialect) -> Result<QueryResult> {
        let mut params = ParameterContext::new();
        let sql = self.render_into(dialect, &mut Binding::Bound(&mut params))?;
        Ok(QueryResult::new(
            sql,
            params.into_values(),
            Vec::new(),
            TrashedScope::Default,
        ))
    }

    fn render_into(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        let mut sql = render_insert_body(
            "INSERT",
            &self.table,
            &self.columns,
            &self.rows,
            dialect,
            binding,
        )?;
        sql.push_str(&render_returning(&self.returning, dialect, binding)?);
        Ok(sql)
    }
}

/// UPDATE statement builder.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: Table,
    sets: Vec<(String, Expr)>,
    wheres: Option<Predicate>,
    returning: Vec<Expr>,
}

impl UpdateBuilder {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            sets: Vec::new(),
            wheres: None,
            returning: Vec::new(),
        }
    }

    /// Assign an expression to a column.
    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.sets.push((column.into(), value));
        self
    }

    /// AND a predicate into the WHERE clause.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.wheres = Some(match self.wheres {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn returning(mut self, expr: Expr) -> Self {
        self.returning.push(expr);
        self
    }

    pub fn to_sql(&self, dialect: &SqlDialect) -> Result<String> {
        self.render_into(dialect, &mut Binding::Inline)
    }

    pub fn build(&self, dialect: &SqlDialect) -> Result<QueryResult> {
        let mut params = ParameterContext::new();
        let sql = self.render_into(dialect, &mut Binding::Bound(&mut params))?;
        Ok(QueryResult::new(
            sql,
            params.into_values(),
            Vec::new(),
            TrashedScope::Default,
        ))
    }

    fn render_into(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        if self.sets.is_empty() {
            return Err(Error::builder(
                "UPDATE",
                "at least one SET assignment is required",
            ));
        }

        let mut sql = format!("UPDATE {} SET ", dialect.table_sql(&self.table));
        let assignments: Result<Vec<_>> = self
            .sets
            .iter()
            .map(|(column, value)| {
                Ok(format!(
                    "{} = {}",
                    dialect.quote_ident(column),
                    value.render(dialect, binding)?
                ))
            })
            .collect();
        sql.push_str(&assignments?.join(", "));

        if let Some(wheres) = &self.wheres {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.render(dialect, binding)?);
        }

        sql.push_str(&render_returning(&self.returning, dialect, binding)?);
        Ok(sql)
    }
}

/// DELETE statement builder.
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: Table,
    wheres: Option<Predicate>,
    returning: Vec<Expr>,
}

impl DeleteBuilder {
    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            wheres: None,
            returning: Vec::new(),
        }
    }

    /// AND a predicate into the WHERE clause.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.wheres = Some(match self.wheres {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn returning(mut self, expr: Expr) -> Self {
        self.returning.push(expr);
        self
    }

    pub fn to_sql(&self, dialect: &SqlDialect) -> Result<String> {
        self.render_into(dialect, &mut Binding::Inline)
    }

    pub fn build(&self, dialect: &SqlDialect) -> Result<QueryResult> {
        let mut params = ParameterContext::new();
        let sql = self.render_into(dialect, &mut Binding::Bound(&mut params))?;
        Ok(QueryResult::new(
            sql,
            params.into_values(),
            Vec::new(),
            TrashedScope::Default,
        ))
    }

    fn render_into(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        let mut sql = format!("DELETE FROM {}", dialect.table_sql(&self.table));
        if let Some(wheres) = &self.wheres {
            sql.push_str(" WHERE ");
            sql.push_str(&wheres.render(dialect, binding)?);
        }
        sql.push_str(&render_returning(&self.returning, dialect, binding)?);
        Ok(sql)
    }
}

/// Conflict resolution of an UPSERT.
#[derive(Debug, Clone)]
pub enum UpsertAction {
    DoNothing,
    /// `DO UPDATE SET column = expr, ...`
    DoUpdate(Vec<(String, Expr)>),
}

/// INSERT ... ON CONFLICT / ON DUPLICATE KEY statement builder.
#[derive(Debug, Clone)]
pub struct UpsertBuilder {
    table: Table,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    conflict_columns: Vec<String>,
    action: Option<UpsertAction>,
    returning: Vec<Expr>,
}

impl UpsertBuilder {
    pub fn into_table(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
            conflict_columns: Vec::new(),
            action: None,
            returning: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn values(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// The conflict target columns (the unique key).
    pub fn on_conflict(mut self, columns: Vec<String>) -> Self {
        self.conflict_columns = columns;
        self
    }

    /// Resolve conflicts by updating the given assignments.
    pub fn do_update(mut self, sets: Vec<(String, Expr)>) -> Self {
        self.action = Some(UpsertAction::DoUpdate(sets));
        self
    }

    /// Resolve conflicts by ignoring the conflicting row.
    pub fn do_nothing(mut self) -> Self {
        self.action = Some(UpsertAction::DoNothing);
        self
    }

    pub fn returning(mut self, expr: Expr) -> Self {
        self.returning.push(expr);
        self
    }

    pub fn to_sql(&self, dialect: &SqlDialect) -> Result<String> {
        self.render_into(dialect, &mut Binding::Inline)
    }

    pub fn build(&self, dialect: &SqlDialect) -> Result<QueryResult> {
        let mut params = ParameterContext::new();
        let sql = self.render_into(dialect, &mut Binding::Bound(&mut params))?;
        Ok(QueryResult::new(
            sql,
            params.into_values(),
            Vec::new(),
            TrashedScope::Default,
        ))
    }

    fn render_into(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        if self.conflict_columns.is_empty() {
            return Err(Error::builder(
                "UPSERT",
                "conflict target columns are required",
            ));
        }
        let Some(action) = &self.action else {
            return Err(Error::builder(
                "UPSERT",
                "choose do_update or do_nothing before building",
            ));
        };

        let verb = match (dialect.upsert_syntax(), action) {
            (UpsertSyntax::OnDuplicateKey, UpsertAction::DoNothing) => "INSERT IGNORE",
            _ => "INSERT",
        };
        let mut sql = render_insert_body(
            verb,
            &self.table,
            &self.columns,
            &self.rows,
            dialect,
            binding,
        )?;

        match dialect.upsert_syntax() {
            UpsertSyntax::OnConflict => {
                let targets: Vec<_> = self
                    .conflict_columns
                    .iter()
                    .map(|c| dialect.quote_ident(c))
                    .collect();
                sql.push_str(&format!(" ON CONFLICT ({})", targets.join(", ")));
                match action {
                    UpsertAction::DoNothing => sql.push_str(" DO NOTHING"),
                    UpsertAction::DoUpdate(sets) => {
                        let assignments: Result<Vec<_>> = sets
                            .iter()
                            .map(|(column, value)| {
                                Ok(format!(
                                    "{} = {}",
                                    dialect.quote_ident(column),
                                    value.render(dialect, binding)?
                                ))
                            })
                            .collect();
                        sql.push_str(&format!(" DO UPDATE SET {}", assignments?.join(", ")));
                    }
                }
            }
            UpsertSyntax::OnDuplicateKey => {
                if let UpsertAction::DoUpdate(sets) = action {
                    let assignments: Result<Vec<_>> = sets
                        .iter()
                        .map(|(column, value)| {
                            Ok(format!(
                                "{} = {}",
                                dialect.quote_ident(column),
                                value.render(dialect, binding)?
                            ))
                        })
                        .collect();
                    sql.push_str(&format!(
                        " ON DUPLICATE KEY UPDATE {}",
                        assignments?.join(", ")
                    ));
                }
            }
        }

        sql.push_str(&render_returning(&self.returning, dialect, binding)?);
        Ok(sql)
    }
}

fn render_insert_body(
    verb: &str,
    table: &Table,
    columns: &[String],
    rows: &[Vec<Value>],
    dialect: &SqlDialect,
    binding: &mut Binding<'_>,
) -> Result<String> {
    if columns.is_empty() {
        return Err(Error::builder(
            "INSERT",
            "at least one column is required",
        ));
    }
    if rows.is_empty() {
        return Err(Error::builder("INSERT", "no rows to insert"));
    }
    for row in rows {
        if row.len() != columns.len() {
            return Err(Error::builder(
                "INSERT",
                format!(
                    "row has {} values but {} columns were declared",
                    row.len(),
                    columns.len()
                ),
            ));
        }
    }

    let quoted: Vec<_> = columns.iter().map(|c| dialect.quote_ident(c)).collect();
    let mut sql = format!(
        "{verb} INTO {} ({}) VALUES ",
        dialect.table_sql(table),
        quoted.join(", ")
    );

    let mut rendered_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let values: Result<Vec<_>> = row.iter().map(|v| binding.literal(dialect, v)).collect();
        rendered_rows.push(format!("({})", values?.join(", ")));
    }
    sql.push_str(&rendered_rows.join(", "));
    Ok(sql)
}

fn render_returning(
    returning: &[Expr],
    dialect: &SqlDialect,
    binding: &mut Binding<'_>,
) -> Result<String> {
    if returning.is_empty() {
        return Ok(String::new());
    }
    if !dialect.supports_returning() {
        return Err(Error::unsupported(
            "RETURNING clause",
            dialect.name(),
            "issue a follow-up SELECT after the write",
        ));
    }
    let rendered: Result<Vec<_>> = returning
        .iter()
        .map(|expr| expr.render(dialect, binding))
        .collect();
    Ok(format!(" RETURNING {}", rendered?.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::CompareOp;
    use suprim_core::SqlType;

    fn pg() -> SqlDialect {
        SqlDialect::postgres()
    }

    fn users() -> Table {
        Table::new("users").entity("User")
    }

    #[test]
    fn insert_renders_columns_and_rows() {
        let builder = InsertBuilder::into_table(users())
            .columns(vec!["name".to_string(), "age".to_string()])
            .values(vec![Value::Text("Ada".into()), Value::Int(36)]);

        assert_eq!(
            builder.to_sql(&pg()).unwrap(),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES ('Ada', 36)"
        );

        let query = builder.build(&pg()).unwrap();
        assert_eq!(
            query.sql(),
            "INSERT INTO \"users\" (\"name\", \"age\") VALUES (:p1, :p2)"
        );
        assert_eq!(query.parameter("p1"), Some(&Value::Text("Ada".into())));
    }

    #[test]
    fn multi_row_insert_numbers_parameters_in_order() {
        let query = InsertBuilder::into_table(users())
            .columns(vec!["name".to_string()])
            .values(vec![Value::Text("a".into())])
            .values(vec![Value::Text("b".into())])
            .build(&pg())
            .unwrap();
        assert_eq!(
            query.sql(),
            "INSERT INTO \"users\" (\"name\") VALUES (:p1), (:p2)"
        );
    }

    #[test]
    fn insert_without_columns_is_a_builder_error() {
        let err = InsertBuilder::into_table(users())
            .values(vec![Value::Int(1)])
            .build(&pg())
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn insert_without_rows_is_a_builder_error() {
        let err = InsertBuilder::into_table(users())
            .columns(vec!["name".to_string()])
            .build(&pg())
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn insert_row_arity_is_checked() {
        let err = InsertBuilder::into_table(users())
            .columns(vec!["name".to_string(), "age".to_string()])
            .values(vec![Value::Text("Ada".into())])
            .build(&pg())
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn update_renders_set_and_where() {
        let sql = UpdateBuilder::table(users())
            .set("name", Expr::lit("Ada"))
            .and_where(Predicate::compare(
                Expr::name("id", SqlType::BigInt),
                CompareOp::Eq,
                Expr::lit(1i64),
            ))
            .to_sql(&pg())
            .unwrap();
        assert_eq!(sql, "UPDATE \"users\" SET \"name\" = 'Ada' WHERE \"id\" = 1");
    }

    #[test]
    fn update_without_sets_is_a_builder_error() {
        let err = UpdateBuilder::table(users()).build(&pg()).unwrap_err();
        match err {
            Error::Builder(inner) => assert_eq!(inner.statement, "UPDATE"),
            other => panic!("expected builder error, got {other}"),
        }
    }

    #[test]
    fn delete_quoting_follows_dialect() {
        let condition = Predicate::compare(
            Expr::name("id", SqlType::BigInt),
            CompareOp::Eq,
            Expr::lit(1),
        );
        let builder = DeleteBuilder::from_table(Table::new("table")).and_where(condition);

        assert_eq!(
            builder.to_sql(&SqlDialect::mysql()).unwrap(),
            "DELETE FROM `table` WHERE `id` = 1"
        );
        assert_eq!(
            builder.to_sql(&pg()).unwrap(),
            "DELETE FROM \"table\" WHERE \"id\" = 1"
        );
    }

    #[test]
    fn returning_requires_capability() {
        let builder = DeleteBuilder::from_table(users())
            .returning(Expr::name("id", SqlType::BigInt));
        assert_eq!(
            builder.to_sql(&pg()).unwrap(),
            "DELETE FROM \"users\" RETURNING \"id\""
        );
        let err = builder.to_sql(&SqlDialect::mysql()).unwrap_err();
        match err {
            Error::UnsupportedFeature(inner) => assert_eq!(inner.feature, "RETURNING clause"),
            other => panic!("expected unsupported-feature error, got {other}"),
        }
    }

    #[test]
    fn upsert_on_conflict_do_update() {
        let sql = UpsertBuilder::into_table(users())
            .columns(vec!["email".to_string(), "name".to_string()])
            .values(vec![Value::Text("a@x".into()), Value::Text("Ada".into())])
            .on_conflict(vec!["email".to_string()])
            .do_update(vec![("name".to_string(), Expr::lit("Ada"))])
            .to_sql(&pg())
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (\"email\", \"name\") VALUES ('a@x', 'Ada') \
             ON CONFLICT (\"email\") DO UPDATE SET \"name\" = 'Ada'"
        );
    }

    #[test]
    fn upsert_do_nothing_lowers_per_dialect() {
        let builder = UpsertBuilder::into_table(users())
            .columns(vec!["email".to_string()])
            .values(vec![Value::Text("a@x".into())])
            .on_conflict(vec!["email".to_string()])
            .do_nothing();

        assert_eq!(
            builder.to_sql(&pg()).unwrap(),
            "INSERT INTO \"users\" (\"email\") VALUES ('a@x') ON CONFLICT (\"email\") DO NOTHING"
        );
        assert_eq!(
            builder.to_sql(&SqlDialect::mysql()).unwrap(),
            "INSERT IGNORE INTO `users` (`email`) VALUES ('a@x')"
        );
    }

    #[test]
    fn upsert_on_duplicate_key_update() {
        let sql = UpsertBuilder::into_table(users())
            .columns(vec!["email".to_string(), "name".to_string()])
            .values(vec![Value::Text("a@x".into()), Value::Text("Ada".into())])
            .on_conflict(vec!["email".to_string()])
            .do_update(vec![("name".to_string(), Expr::lit("Ada"))])
            .to_sql(&SqlDialect::mysql())
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `users` (`email`, `name`) VALUES ('a@x', 'Ada') \
             ON DUPLICATE KEY UPDATE `name` = 'Ada'"
        );
    }

    #[test]
    fn upsert_state_errors() {
        let missing_conflict = UpsertBuilder::into_table(users())
            .columns(vec!["email".to_string()])
            .values(vec![Value::Text("a@x".into())])
            .do_nothing();
        assert!(matches!(
            missing_conflict.build(&pg()).unwrap_err(),
            Error::Builder(_)
        ));

        let missing_action = UpsertBuilder::into_table(users())
            .columns(vec!["email".to_string()])
            .values(vec![Value::Text("a@x".into())])
            .on_conflict(vec!["email".to_string()]);
        assert!(matches!(
            missing_action.build(&pg()).unwrap_err(),
            Error::Builder(_)
        ));
    }
}

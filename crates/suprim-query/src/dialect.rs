//! SQL dialect capability and syntax tables.
//!
//! A dialect is a pure value: identifier quoting, literal formatting, JSON
//! operator syntax, and a capability set. Renderers never branch on a
//! dialect's name; they query capabilities, so adding a dialect means
//! providing one value here and touching nothing else.

use suprim_core::{Error, Result, SqlType, Table, Value};

/// Identifier quoting style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// ANSI double quotes (`"name"`).
    DoubleQuote,
    /// MySQL backticks (`` `name` ``).
    Backtick,
}

/// How JSON path navigation is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSyntax {
    /// `->` / `->>` operators (PostgreSQL).
    Arrows,
    /// `JSON_EXTRACT(doc, '$.path')`, optionally wrapped in an unquoting
    /// function for text extraction.
    Extract {
        unquote: Option<&'static str>,
    },
}

/// How INSERT conflict handling is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertSyntax {
    /// `ON CONFLICT (cols) DO UPDATE SET ... / DO NOTHING`.
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE ...` / `INSERT IGNORE`.
    OnDuplicateKey,
}

/// Capability and syntax table for one database family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlDialect {
    name: &'static str,
    quote: QuoteStyle,
    json: JsonSyntax,
    upsert: UpsertSyntax,
    /// TRUE/FALSE keywords vs 1/0 literals.
    boolean_keywords: bool,
    /// Native UUID column type (enables `CAST(:p AS uuid)`).
    uuid_type: bool,
    supports_returning: bool,
    supports_filter_clause: bool,
    supports_nowait: bool,
    supports_skip_locked: bool,
    supports_jsonb: bool,
    supports_arrays: bool,
    supports_ilike: bool,
}

impl SqlDialect {
    /// The PostgreSQL dialect.
    pub fn postgres() -> Self {
        Self {
            name: "postgres",
            quote: QuoteStyle::DoubleQuote,
            json: JsonSyntax::Arrows,
            upsert: UpsertSyntax::OnConflict,
            boolean_keywords: true,
            uuid_type: true,
            supports_returning: true,
            supports_filter_clause: true,
            supports_nowait: true,
            supports_skip_locked: true,
            supports_jsonb: true,
            supports_arrays: true,
            supports_ilike: true,
        }
    }

    /// The MySQL dialect.
    pub fn mysql() -> Self {
        Self {
            name: "mysql",
            quote: QuoteStyle::Backtick,
            json: JsonSyntax::Extract {
                unquote: Some("JSON_UNQUOTE"),
            },
            upsert: UpsertSyntax::OnDuplicateKey,
            boolean_keywords: true,
            uuid_type: false,
            supports_returning: false,
            supports_filter_clause: false,
            supports_nowait: true,
            supports_skip_locked: true,
            supports_jsonb: false,
            supports_arrays: false,
            supports_ilike: false,
        }
    }

    /// The SQLite dialect.
    pub fn sqlite() -> Self {
        Self {
            name: "sqlite",
            quote: QuoteStyle::DoubleQuote,
            json: JsonSyntax::Extract { unquote: None },
            upsert: UpsertSyntax::OnConflict,
            boolean_keywords: false,
            uuid_type: false,
            supports_returning: true,
            supports_filter_clause: true,
            supports_nowait: false,
            supports_skip_locked: false,
            supports_jsonb: false,
            supports_arrays: false,
            supports_ilike: false,
        }
    }

    /// The dialect name, used in error context.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn upsert_syntax(&self) -> UpsertSyntax {
        self.upsert
    }

    pub const fn supports_returning(&self) -> bool {
        self.supports_returning
    }

    pub const fn supports_filter_clause(&self) -> bool {
        self.supports_filter_clause
    }

    pub const fn supports_nowait(&self) -> bool {
        self.supports_nowait
    }

    pub const fn supports_skip_locked(&self) -> bool {
        self.supports_skip_locked
    }

    pub const fn supports_jsonb(&self) -> bool {
        self.supports_jsonb
    }

    pub const fn supports_arrays(&self) -> bool {
        self.supports_arrays
    }

    pub const fn supports_ilike(&self) -> bool {
        self.supports_ilike
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_ident(&self, name: &str) -> String {
        match self.quote {
            QuoteStyle::DoubleQuote => format!("\"{}\"", name.replace('"', "\"\"")),
            QuoteStyle::Backtick => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Quote a possibly-qualified column reference.
    pub fn quote_qualified(&self, qualifier: Option<&str>, name: &str) -> String {
        match qualifier {
            Some(q) => format!("{}.{}", self.quote_ident(q), self.quote_ident(name)),
            None => self.quote_ident(name),
        }
    }

    /// Render a table reference: `schema.name` plus alias when set.
    pub fn table_sql(&self, table: &Table) -> String {
        let mut sql = match table.schema_name() {
            Some(schema) => format!("{}.{}", self.quote_ident(schema), self.quote_ident(table.name())),
            None => self.quote_ident(table.name()),
        };
        if let Some(alias) = table.alias() {
            sql.push_str(" AS ");
            sql.push_str(&self.quote_ident(alias));
        }
        sql
    }

    /// Format a value as an inline SQL literal.
    pub fn format_value(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => {
                let keyword = match (self.boolean_keywords, *v) {
                    (true, true) => "TRUE",
                    (true, false) => "FALSE",
                    (false, true) => "1",
                    (false, false) => "0",
                };
                keyword.to_string()
            }
            Value::Int(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Decimal(s) => s.clone(),
            Value::Text(s) => self.quote_string(s),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Value::Uuid(u) => self.quote_string(&u.to_string()),
            Value::Json(doc) => self.quote_string(&doc.to_string()),
            Value::Array(items) => {
                if !self.supports_arrays {
                    return Err(Error::unsupported(
                        "array literals",
                        self.name,
                        "expand the values into individual parameters",
                    ));
                }
                let rendered: Result<Vec<_>> = items.iter().map(|v| self.format_value(v)).collect();
                format!("ARRAY[{}]", rendered?.join(", "))
            }
        })
    }

    /// Wrap a bound placeholder in the cast the value type requires, when the
    /// dialect advertises the capability.
    pub fn cast_placeholder(&self, placeholder: &str, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Uuid if self.uuid_type => format!("CAST({placeholder} AS uuid)"),
            SqlType::Json | SqlType::JsonB if self.supports_jsonb => {
                format!("{placeholder}::jsonb")
            }
            _ => placeholder.to_string(),
        }
    }

    /// Render JSON path navigation over an already-rendered base expression.
    pub fn json_path_sql(&self, base: &str, keys: &[String], last_as_text: bool) -> String {
        match self.json {
            JsonSyntax::Arrows => {
                let mut sql = base.to_string();
                for (i, key) in keys.iter().enumerate() {
                    let last = i + 1 == keys.len();
                    let op = if last && last_as_text { "->>" } else { "->" };
                    sql = format!("{sql} {op} {}", self.quote_string(key));
                }
                sql
            }
            JsonSyntax::Extract { unquote } => {
                let path = format!("$.{}", keys.join("."));
                let extracted = format!("JSON_EXTRACT({base}, {})", self.quote_string(&path));
                match (last_as_text, unquote) {
                    (true, Some(wrapper)) => format!("{wrapper}({extracted})"),
                    _ => extracted,
                }
            }
        }
    }

    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }
}

impl Default for SqlDialect {
    fn default() -> Self {
        Self::postgres()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_quoting_per_dialect() {
        assert_eq!(SqlDialect::postgres().quote_ident("users"), "\"users\"");
        assert_eq!(SqlDialect::mysql().quote_ident("users"), "`users`");
        assert_eq!(SqlDialect::postgres().quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(SqlDialect::mysql().quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn string_literals_escape_quotes() {
        let pg = SqlDialect::postgres();
        assert_eq!(
            pg.format_value(&Value::Text("O'Brien".into())).unwrap(),
            "'O''Brien'"
        );
    }

    #[test]
    fn boolean_literals_follow_dialect() {
        assert_eq!(
            SqlDialect::postgres().format_value(&Value::Bool(true)).unwrap(),
            "TRUE"
        );
        assert_eq!(
            SqlDialect::sqlite().format_value(&Value::Bool(true)).unwrap(),
            "1"
        );
    }

    #[test]
    fn array_literals_require_capability() {
        let array = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(
            SqlDialect::postgres().format_value(&array).unwrap(),
            "ARRAY[1, 2]"
        );
        let err = SqlDialect::mysql().format_value(&array).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
    }

    #[test]
    fn uuid_placeholder_cast_only_with_native_type() {
        let pg = SqlDialect::postgres();
        assert_eq!(
            pg.cast_placeholder(":p1", &SqlType::Uuid),
            "CAST(:p1 AS uuid)"
        );
        assert_eq!(pg.cast_placeholder(":p1", &SqlType::Json), ":p1::jsonb");
        let mysql = SqlDialect::mysql();
        assert_eq!(mysql.cast_placeholder(":p1", &SqlType::Uuid), ":p1");
    }

    #[test]
    fn json_path_syntax() {
        let keys = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            SqlDialect::postgres().json_path_sql("\"doc\"", &keys, true),
            "\"doc\" -> 'a' ->> 'b'"
        );
        assert_eq!(
            SqlDialect::mysql().json_path_sql("`doc`", &keys, true),
            "JSON_UNQUOTE(JSON_EXTRACT(`doc`, '$.a.b'))"
        );
        assert_eq!(
            SqlDialect::sqlite().json_path_sql("\"doc\"", &keys, false),
            "JSON_EXTRACT(\"doc\", '$.a.b')"
        );
    }

    #[test]
    fn table_sql_includes_schema_and_alias() {
        let table = Table::new("users").schema("app").with_alias("u");
        assert_eq!(
            SqlDialect::postgres().table_sql(&table),
            "\"app\".\"users\" AS \"u\""
        );
    }
}

//! Common table expressions.

use crate::dialect::SqlDialect;
use crate::params::Binding;
use crate::select::SelectBuilder;
use suprim_core::Result;

/// One `WITH name [(columns)] AS (query)` entry.
#[derive(Debug, Clone)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Box<SelectBuilder>,
}

impl Cte {
    pub fn new(name: impl Into<String>, query: SelectBuilder) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            query: Box::new(query),
        }
    }

    /// Name the CTE's output columns.
    pub fn columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub(crate) fn render(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        let mut sql = dialect.quote_ident(&self.name);
        if !self.columns.is_empty() {
            let cols: Vec<_> = self.columns.iter().map(|c| dialect.quote_ident(c)).collect();
            sql.push_str(&format!(" ({})", cols.join(", ")));
        }
        sql.push_str(&format!(" AS ({})", self.query.render_into(dialect, binding)?));
        Ok(sql)
    }
}

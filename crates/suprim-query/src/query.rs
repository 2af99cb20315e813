//! The terminal output of a statement build.

use crate::clause::TrashedScope;
use crate::eager::EagerLoadSpec;
use suprim_core::Value;

/// The immutable result of `build(dialect)`: SQL text with named `:pN`
/// placeholders, the ordered parameter map, the eager-load tree, and the
/// soft-delete scope the statement was built under.
///
/// Callers translate the named placeholders to their driver's native
/// convention before execution.
#[derive(Debug, Clone)]
pub struct QueryResult {
    sql: String,
    parameters: Vec<(String, Value)>,
    eager_loads: Vec<EagerLoadSpec>,
    scope: TrashedScope,
}

impl QueryResult {
    pub(crate) fn new(
        sql: String,
        parameters: Vec<(String, Value)>,
        eager_loads: Vec<EagerLoadSpec>,
        scope: TrashedScope,
    ) -> Self {
        Self {
            sql,
            parameters,
            eager_loads,
            scope,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder name/value pairs in registration order.
    pub fn parameters(&self) -> &[(String, Value)] {
        &self.parameters
    }

    /// Look up a bound value by placeholder name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn eager_loads(&self) -> &[EagerLoadSpec] {
        &self.eager_loads
    }

    pub fn scope(&self) -> TrashedScope {
        self.scope
    }
}

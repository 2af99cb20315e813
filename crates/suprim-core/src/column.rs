//! Typed column references.

use crate::table::Table;
use crate::types::SqlType;

/// A typed reference to a column of a [`Table`].
///
/// Columns are immutable value objects, created once (conceptually as a
/// generated metamodel) and reused. Many columns share one table definition.
/// The predicate and ordering factory methods live in the query layer's
/// `ColumnDsl` extension trait. Column deliberately does not implement
/// `PartialEq`: the DSL's `eq`/`ne` would otherwise be ambiguous with the
/// comparison trait methods at call sites.
#[derive(Debug, Clone)]
pub struct Column {
    table: Table,
    name: String,
    sql_type: SqlType,
}

impl Column {
    /// Create a column reference on a table.
    pub fn new(table: &Table, name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            table: table.clone(),
            name: name.into(),
            sql_type,
        }
    }

    /// The owning table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared SQL type.
    pub fn sql_type(&self) -> &SqlType {
        &self.sql_type
    }

    /// The qualifier other SQL fragments should use for this column: the
    /// owning table's alias when set, its name otherwise.
    pub fn qualifier(&self) -> &str {
        self.table.reference_name()
    }

    /// Rebind this column onto an aliased copy of its table.
    pub fn for_alias(&self, alias: impl Into<String>) -> Self {
        Self {
            table: self.table.with_alias(alias),
            name: self.name.clone(),
            sql_type: self.sql_type.clone(),
        }
    }
}

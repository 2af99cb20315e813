//! Physical table references.

/// Identifies a physical relation by name, with optional schema, alias, and
/// the logical entity type it materializes into.
///
/// Tables are immutable values; `with_alias` produces a new value. Columns
/// and relations hold their own copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    schema: Option<String>,
    alias: Option<String>,
    entity: Option<String>,
    soft_delete_column: Option<String>,
}

impl Table {
    /// Create a table reference by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            alias: None,
            entity: None,
            soft_delete_column: None,
        }
    }

    /// Set the schema the table lives in.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the logical entity type this table materializes into.
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Declare a soft-delete marker column (e.g. `deleted_at`).
    ///
    /// Select builds consult this when applying a [`TrashedScope`] filter.
    ///
    /// [`TrashedScope`]: https://docs.rs/suprim-query
    pub fn soft_deletes(mut self, column: impl Into<String>) -> Self {
        self.soft_delete_column = Some(column.into());
        self
    }

    /// Produce a copy of this table under an alias.
    pub fn with_alias(&self, alias: impl Into<String>) -> Self {
        let mut table = self.clone();
        table.alias = Some(alias.into());
        table
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The schema, if any.
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// The alias, if any.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The logical entity type name, if declared.
    pub fn entity_name(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    /// The soft-delete column, if declared.
    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete_column.as_deref()
    }

    /// The name other SQL fragments should use to reference rows of this
    /// table: the alias when one is set, the bare name otherwise.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_alias_produces_new_value() {
        let users = Table::new("users").entity("User");
        let aliased = users.with_alias("u");

        assert_eq!(users.alias(), None);
        assert_eq!(aliased.alias(), Some("u"));
        assert_eq!(aliased.name(), "users");
        assert_eq!(aliased.entity_name(), Some("User"));
    }

    #[test]
    fn reference_name_prefers_alias() {
        let table = Table::new("posts");
        assert_eq!(table.reference_name(), "posts");
        assert_eq!(table.with_alias("p").reference_name(), "p");
    }

    #[test]
    fn soft_delete_metadata() {
        let table = Table::new("users").soft_deletes("deleted_at");
        assert_eq!(table.soft_delete_column(), Some("deleted_at"));
    }
}

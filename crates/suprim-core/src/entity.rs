//! Entity traits and the metadata registry.
//!
//! The engine never reflects over structs. An entity exposes its table and a
//! by-column value lookup; an [`EntityGraph`] maps `(entity, field)` pairs to
//! declared relations and columns. Both are pure lookups populated by a
//! code-generation step or explicit registration calls.

use crate::column::Column;
use crate::relation::Relation;
use crate::table::Table;
use crate::types::SqlType;
use crate::value::Value;
use std::collections::HashMap;

/// A struct that materializes rows of a table.
pub trait Entity: Sized + Send + Sync {
    /// The logical entity type name (e.g. `"User"`).
    const ENTITY: &'static str;

    /// The table name the entity maps to.
    const TABLE_NAME: &'static str;

    /// The primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// The table value for this entity.
    fn table() -> Table {
        Table::new(Self::TABLE_NAME).entity(Self::ENTITY)
    }

    /// Read a column value off this instance.
    ///
    /// Correlation keys projected by batch queries (pivot aliases, the
    /// through key) are also read through this method, so mapped entities
    /// should surface them when present.
    fn get(&self, column: &str) -> Option<Value>;

    /// Write a column value onto this instance. Returns false when the
    /// column has no writable counterpart.
    fn set(&mut self, _column: &str, _value: Value) -> bool {
        false
    }

    /// A default-built instance, used for relations declaring a fallback.
    /// Entities that do not support fallbacks return `None`.
    fn fallback_instance() -> Option<Self> {
        None
    }
}

/// Pure lookup of declared relations and column metadata per entity type.
pub trait EntityGraph {
    /// The relation declared under `field` on `entity`.
    fn relation(&self, entity: &str, field: &str) -> Option<Relation>;

    /// The column name and SQL type of `field` on `entity`.
    fn column(&self, entity: &str, field: &str) -> Option<(String, SqlType)>;
}

/// An [`EntityGraph`] backed by explicit registration calls.
#[derive(Debug, Default)]
pub struct MapGraph {
    relations: HashMap<(String, String), Relation>,
    columns: HashMap<(String, String), (String, SqlType)>,
}

impl MapGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation under `(entity, field)`.
    pub fn register_relation(
        &mut self,
        entity: impl Into<String>,
        field: impl Into<String>,
        relation: Relation,
    ) -> &mut Self {
        self.relations
            .insert((entity.into(), field.into()), relation);
        self
    }

    /// Register a column under `(entity, field)`.
    pub fn register_column(
        &mut self,
        entity: impl Into<String>,
        field: impl Into<String>,
        column: impl Into<String>,
        sql_type: SqlType,
    ) -> &mut Self {
        self.columns
            .insert((entity.into(), field.into()), (column.into(), sql_type));
        self
    }

    /// Register every column of a table's metamodel at once.
    pub fn register_columns(&mut self, entity: impl Into<String>, columns: &[Column]) -> &mut Self {
        let entity = entity.into();
        for column in columns {
            self.columns.insert(
                (entity.clone(), column.name().to_string()),
                (column.name().to_string(), column.sql_type().clone()),
            );
        }
        self
    }
}

impl EntityGraph for MapGraph {
    fn relation(&self, entity: &str, field: &str) -> Option<Relation> {
        self.relations
            .get(&(entity.to_string(), field.to_string()))
            .cloned()
    }

    fn column(&self, entity: &str, field: &str) -> Option<(String, SqlType)> {
        self.columns
            .get(&(entity.to_string(), field.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_graph_round_trip() {
        let mut graph = MapGraph::new();
        graph.register_relation(
            "User",
            "posts",
            Relation::has_many(Table::new("posts").entity("Post"), "user_id", "id"),
        );
        graph.register_column("User", "name", "name", SqlType::Text);

        let rel = graph.relation("User", "posts").unwrap();
        assert_eq!(rel.related_entity(), Some("Post"));
        assert!(graph.relation("User", "missing").is_none());

        let (column, sql_type) = graph.column("User", "name").unwrap();
        assert_eq!(column, "name");
        assert_eq!(sql_type, SqlType::Text);
    }
}

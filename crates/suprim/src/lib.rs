//! Suprim - type-safe SQL construction and relation engine.
//!
//! Suprim lets application code build SELECT/INSERT/UPDATE/DELETE/UPSERT
//! statements as composable in-memory expressions, lowers them to
//! dialect-specific SQL with parameter binding, and resolves declared entity
//! relationships into batched queries that avoid N+1 access patterns.
//!
//! # Quick Start
//!
//! ```
//! use suprim::prelude::*;
//!
//! let users = Table::new("users").entity("User");
//! let age = Column::new(&users, "age", SqlType::Integer);
//!
//! let query = suprim::select(users.clone())
//!     .and_where(age.between(18, 65))
//!     .order_by(age.desc())
//!     .build(&SqlDialect::postgres())
//!     .unwrap();
//! assert_eq!(
//!     query.sql(),
//!     "SELECT * FROM \"users\" WHERE \"age\" BETWEEN :p1 AND :p2 ORDER BY \"age\" DESC"
//! );
//! ```
//!
//! # Relations
//!
//! Entity relationships (fourteen kinds, from plain `HasMany` through
//! polymorphic many-to-many and "latest-of-many") are declared as immutable
//! [`Relation`] values. From one value the engine derives EXISTS/COUNT
//! filter predicates and the batched eager-load query for a whole parent
//! batch; [`EagerLoader`] fetches once per relation and splices the rows
//! back onto the parents.

pub use suprim_core::{
    // asupersync re-exports
    Cx,
    Outcome,
    // Core types
    Column,
    DirectRelation,
    Entity,
    EntityGraph,
    Error,
    Loaded,
    MapGraph,
    MorphPivotRelation,
    MorphRelation,
    MorphToRelation,
    OfManyAggregate,
    OfManyRelation,
    PivotRelation,
    Relation,
    RelationFallback,
    RelationKind,
    Result,
    SqlType,
    Table,
    ThroughRelation,
    Value,
};

pub use suprim_query::{
    AggregateKind, BoolOp, ColumnDsl, CompareOp, Cte, DeleteBuilder, EagerLoadSpec, EagerLoader,
    EntitySource, Expr, GroupByItem, InsertBuilder, Join, JoinType, OrderSpec, ParameterContext,
    PathResolver, PopulateMode, Predicate, QueryResult, RelationField, RelationSql, SelectBuilder,
    SetOpType, SqlDialect, SqlFunctionKind, TrashedScope, UpdateBuilder, UpsertAction,
    UpsertBuilder, populate,
};

/// Start a SELECT over a table.
pub fn select(table: Table) -> SelectBuilder {
    SelectBuilder::from_table(table)
}

/// Start an INSERT into a table.
pub fn insert_into(table: Table) -> InsertBuilder {
    InsertBuilder::into_table(table)
}

/// Start an UPDATE of a table.
pub fn update(table: Table) -> UpdateBuilder {
    UpdateBuilder::table(table)
}

/// Start a DELETE from a table.
pub fn delete_from(table: Table) -> DeleteBuilder {
    DeleteBuilder::from_table(table)
}

/// Start an UPSERT into a table.
pub fn upsert_into(table: Table) -> UpsertBuilder {
    UpsertBuilder::into_table(table)
}

/// Commonly used types, in one import.
pub mod prelude {
    pub use crate::{
        Column, ColumnDsl, CompareOp, Cx, EagerLoadSpec, EagerLoader, Entity, EntityGraph,
        EntitySource, Error, Expr, Loaded, MapGraph, OrderSpec, Outcome, PathResolver, Predicate,
        QueryResult, Relation, RelationField, RelationSql, Result, SelectBuilder, SqlDialect,
        SqlType, Table, TrashedScope, Value,
    };
}

//! Statement construction layer for Suprim.
//!
//! `suprim-query` turns `suprim-core` metadata into executable SQL plus
//! parameters:
//!
//! - **Dialects**: `SqlDialect` capability/syntax values for Postgres,
//!   MySQL, and SQLite.
//! - **Expression DSL**: the `Expr`/`Predicate` ASTs and the `ColumnDsl`
//!   factories build projections and WHERE/HAVING clauses safely.
//! - **Builders**: `SelectBuilder`, `InsertBuilder`, `UpdateBuilder`,
//!   `DeleteBuilder`, `UpsertBuilder` accumulate state and lower it with a
//!   terminal `build(dialect)`.
//! - **Relations**: `RelationSql` synthesizes correlation predicates and
//!   batched eager queries; `EagerLoader`/`populate` splice fetched rows
//!   back onto parent batches.
//!
//! Most users access this crate through the `suprim` facade.

pub mod builder;
pub mod clause;
pub mod column_dsl;
pub mod correlate;
pub mod cte;
pub mod dialect;
pub mod eager;
pub mod expr;
pub mod join;
pub mod params;
pub mod populate;
pub mod predicate;
pub mod query;
pub mod select;
pub mod set_ops;

pub use builder::{DeleteBuilder, InsertBuilder, UpdateBuilder, UpsertAction, UpsertBuilder};
pub use clause::{
    GroupByItem, LockMode, LockWait, NullsOrder, OrderDirection, OrderSpec, RowLock, SelectItem,
    TrashedScope,
};
pub use column_dsl::ColumnDsl;
pub use correlate::RelationSql;
pub use cte::Cte;
pub use dialect::{JsonSyntax, QuoteStyle, SqlDialect, UpsertSyntax};
pub use eager::{EagerLoadSpec, PathResolver};
pub use expr::{AggregateKind, Expr, SqlFunctionKind};
pub use join::{Join, JoinType};
pub use params::{Binding, ParameterContext};
pub use populate::{EagerLoader, EntitySource, PopulateMode, RelationField, populate};
pub use predicate::{BoolOp, CompareOp, Predicate};
pub use query::QueryResult;
pub use select::SelectBuilder;
pub use set_ops::SetOpType;

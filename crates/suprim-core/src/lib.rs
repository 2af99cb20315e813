//! Core types and metadata for the Suprim SQL engine.
//!
//! This crate provides the foundational abstractions shared by the query
//! construction layer:
//!
//! - `Value` and `SqlType` for dynamically-typed SQL values
//! - `Table` and `Column` physical references
//! - `Entity` trait and `EntityGraph` registry for metadata lookup
//! - `Relation` metadata for the fourteen relationship kinds
//! - `Loaded` population wrapper for singular relations
//! - the error taxonomy (`Error`, `Result`)

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod column;
pub mod entity;
pub mod error;
pub mod loaded;
pub mod relation;
pub mod table;
pub mod types;
pub mod value;

pub use column::Column;
pub use entity::{Entity, EntityGraph, MapGraph};
pub use error::{
    BuilderError, Error, MappingError, PathError, PathErrorKind, Result, UnsupportedFeatureError,
};
pub use loaded::Loaded;
pub use relation::{
    DirectRelation, MorphPivotRelation, MorphRelation, MorphToRelation, OfManyAggregate,
    OfManyRelation, PivotRelation, Relation, RelationFallback, RelationKind, ThroughRelation,
};
pub use table::Table;
pub use types::SqlType;
pub use value::Value;

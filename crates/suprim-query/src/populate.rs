//! Relation population and the batched eager-load driver.
//!
//! `populate` is a pure, synchronous, in-memory batch transform: given a
//! batch of parents and a batch of already-fetched related rows (one
//! correlated query per relation, never per parent), it groups the related
//! rows by correlation key and assigns them onto each parent through an
//! explicit field binding. `EagerLoader` wraps it with the async row-fetch
//! collaborator.

use crate::correlate::RelationSql;
use crate::dialect::SqlDialect;
use crate::eager::EagerLoadSpec;
use crate::query::QueryResult;
use asupersync::{Cx, Outcome};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use suprim_core::{Entity, Error, Loaded, MappingError, Relation, Result, Value};

/// Whether population mismatches abort or are swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopulateMode {
    /// Mismatches raise a mapping error.
    #[default]
    Strict,
    /// Mismatches are logged and swallowed, tolerating partially-mapped
    /// projections.
    Lenient,
}

/// Explicit binding of a relation to a field on the parent type.
///
/// Population never infers field access: a binding carries the setter for
/// its cardinality, or is declared [`query_only`](Self::query_only) — a
/// named mode for relations that exist solely to drive EXISTS/COUNT
/// subqueries and populate nothing.
#[derive(Debug, Clone, Copy)]
pub struct RelationField<P, R> {
    name: &'static str,
    assign_one: Option<fn(&mut P, Loaded<R>)>,
    assign_many: Option<fn(&mut P, Vec<R>)>,
    distinct: bool,
    query_only: bool,
}

impl<P, R> RelationField<P, R> {
    /// A binding for a singular relation field.
    pub fn singular(name: &'static str, assign: fn(&mut P, Loaded<R>)) -> Self {
        Self {
            name,
            assign_one: Some(assign),
            assign_many: None,
            distinct: false,
            query_only: false,
        }
    }

    /// A binding for a collection relation field.
    pub fn collection(name: &'static str, assign: fn(&mut P, Vec<R>)) -> Self {
        Self {
            name,
            assign_one: None,
            assign_many: Some(assign),
            distinct: false,
            query_only: false,
        }
    }

    /// A collection binding with set semantics: matched rows are
    /// deduplicated by equality, preserving first occurrence.
    pub fn collection_distinct(name: &'static str, assign: fn(&mut P, Vec<R>)) -> Self {
        let mut field = Self::collection(name, assign);
        field.distinct = true;
        field
    }

    /// A binding that populates nothing. The relation exists only to drive
    /// correlated EXISTS/COUNT subqueries.
    pub fn query_only(name: &'static str) -> Self {
        Self {
            name,
            assign_one: None,
            assign_many: None,
            distinct: false,
            query_only: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_query_only(&self) -> bool {
        self.query_only
    }
}

/// Canonical form of a correlation key value. `None` for NULL and for types
/// that cannot key a correlation (floats, documents, arrays).
fn correlation_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(v) => Some(v.to_string()),
        Value::Int(v) => Some(v.to_string()),
        Value::BigInt(v) => Some(v.to_string()),
        Value::Decimal(s) => Some(s.clone()),
        Value::Text(s) => Some(s.clone()),
        Value::Uuid(u) => Some(u.to_string()),
        Value::Bytes(b) => Some(b.iter().map(|byte| format!("{byte:02x}")).collect()),
        Value::Double(_) | Value::Json(_) | Value::Array(_) => None,
    }
}

fn parent_key<P: Entity>(parent: &P, column: &str) -> Option<String> {
    parent.get(column).as_ref().and_then(correlation_key)
}

fn dedupe<R: PartialEq>(rows: Vec<R>) -> Vec<R> {
    let mut out: Vec<R> = Vec::with_capacity(rows.len());
    for row in rows {
        if !out.contains(&row) {
            out.push(row);
        }
    }
    out
}

fn cardinality_mismatch<P: Entity, R>(
    field: &RelationField<P, R>,
    relation: &Relation,
    mode: PopulateMode,
    message: &str,
) -> Result<()> {
    let err = MappingError {
        entity: P::ENTITY.to_string(),
        field: field.name.to_string(),
        relation: relation.kind().name().to_string(),
        message: message.to_string(),
    };
    match mode {
        PopulateMode::Strict => Err(Error::Mapping(err)),
        PopulateMode::Lenient => {
            tracing::warn!(error = %err, "population mismatch swallowed in lenient mode");
            Ok(())
        }
    }
}

/// Splice a batch of fetched related rows onto a batch of parents.
///
/// Grouping keys are read off the related rows via the relation's grouping
/// column (a projected alias for pivot/through kinds); rows or parents with
/// NULL keys never match and never raise. Singular kinds receive the first
/// match (batch queries for of-many kinds are pre-ordered, so the first
/// match is the winner), the declared fallback, or `Loaded::Absent`;
/// collection kinds receive the full matched sublist in fetch order — an
/// empty match is an empty collection, never a missing value.
///
/// Population is pure and idempotent: repeating it with the same inputs on
/// fresh parent copies yields identical field values.
pub fn populate<P, R>(
    parents: &mut [P],
    related: Vec<R>,
    relation: &Relation,
    field: &RelationField<P, R>,
    mode: PopulateMode,
) -> Result<()>
where
    P: Entity,
    R: Entity + Clone + PartialEq,
{
    if parents.is_empty() {
        return Ok(());
    }
    if field.query_only {
        tracing::trace!(field = field.name, "query-only binding; population skipped");
        return Ok(());
    }

    let group_column = relation.related_group_column();
    let mut groups: HashMap<String, Vec<R>> = HashMap::new();
    for row in related {
        let Some(key) = row.get(&group_column).as_ref().and_then(correlation_key) else {
            continue;
        };
        groups.entry(key).or_default().push(row);
    }

    let owner_column = relation.owner_key_column();

    if relation.is_collection() {
        let Some(assign) = field.assign_many else {
            return cardinality_mismatch(
                field,
                relation,
                mode,
                "relation populates a collection but the binding has no collection setter",
            );
        };
        for parent in parents.iter_mut() {
            let matches = parent_key(parent, owner_column)
                .and_then(|key| groups.get(&key).cloned())
                .unwrap_or_default();
            let matches = if field.distinct { dedupe(matches) } else { matches };
            assign(parent, matches);
        }
    } else {
        let Some(assign) = field.assign_one else {
            return cardinality_mismatch(
                field,
                relation,
                mode,
                "relation populates a single instance but the binding has no singular setter",
            );
        };
        for parent in parents.iter_mut() {
            let hit = parent_key(parent, owner_column)
                .and_then(|key| groups.get(&key))
                .and_then(|rows| rows.first())
                .cloned();
            let loaded = match hit {
                Some(row) => Loaded::Found(row),
                None => fallback_for(relation, field),
            };
            assign(parent, loaded);
        }
    }

    Ok(())
}

fn fallback_for<P, R>(relation: &Relation, field: &RelationField<P, R>) -> Loaded<R>
where
    R: Entity,
{
    let Some(fallback) = relation.fallback() else {
        return Loaded::Absent;
    };
    let Some(mut instance) = R::fallback_instance() else {
        tracing::warn!(
            field = field.name,
            related = R::ENTITY,
            "relation declares a default but the related entity has no fallback instance"
        );
        return Loaded::Absent;
    };
    for (column, value) in &fallback.attributes {
        instance.set(column, value.clone());
    }
    Loaded::Fallback(instance)
}

/// Row-fetch collaborator: executes a built query and returns the mapped
/// related entities, in result order.
pub trait EntitySource<E: Entity> {
    fn fetch(
        &mut self,
        cx: &Cx,
        query: QueryResult,
    ) -> impl Future<Output = Outcome<Vec<E>, Error>> + Send;
}

/// Drives batched eager loading: one correlated fetch per relation per
/// level, spliced onto the parent batch by [`populate`].
#[derive(Debug, Clone)]
pub struct EagerLoader {
    dialect: SqlDialect,
    mode: PopulateMode,
}

impl EagerLoader {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            mode: PopulateMode::Strict,
        }
    }

    /// Swallow population mismatches instead of aborting.
    pub fn lenient(mut self) -> Self {
        self.mode = PopulateMode::Lenient;
        self
    }

    /// Load one relation level onto a parent batch.
    pub async fn load<P, R, S>(
        &self,
        cx: &Cx,
        source: &mut S,
        parents: &mut [P],
        spec: &EagerLoadSpec,
        field: &RelationField<P, R>,
    ) -> Outcome<(), Error>
    where
        P: Entity,
        R: Entity + Clone + PartialEq,
        S: EntitySource<R>,
    {
        self.load_with(cx, source, parents, spec, field, async |_: &Cx, _: &mut Vec<R>| {
            Outcome::Ok(())
        })
        .await
    }

    /// Load one relation level, letting `hydrate` fill nested levels onto
    /// the fetched batch before it is spliced onto the parents. The load is
    /// depth-first: nested relations see the fully-fetched batch, and
    /// parents receive fully-hydrated related rows.
    #[tracing::instrument(level = "debug", skip_all, fields(relation = %spec.name))]
    pub async fn load_with<P, R, S, H>(
        &self,
        cx: &Cx,
        source: &mut S,
        parents: &mut [P],
        spec: &EagerLoadSpec,
        field: &RelationField<P, R>,
        mut hydrate: H,
    ) -> Outcome<(), Error>
    where
        P: Entity,
        R: Entity + Clone + PartialEq,
        S: EntitySource<R>,
        H: AsyncFnMut(&Cx, &mut Vec<R>) -> Outcome<(), Error>,
    {
        if parents.is_empty() {
            return Outcome::Ok(());
        }

        let owner_column = spec.relation.owner_key_column();
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for parent in parents.iter() {
            if let Some(value) = parent.get(owner_column) {
                if let Some(canonical) = correlation_key(&value) {
                    if seen.insert(canonical) {
                        keys.push(value);
                    }
                }
            }
        }

        let mut batch: Vec<R> = if keys.is_empty() {
            Vec::new()
        } else {
            let query = match spec
                .relation
                .batch_query(keys, spec.constraint.clone())
                .build(&self.dialect)
            {
                Ok(query) => query,
                Err(e) => return Outcome::Err(e),
            };
            tracing::trace!(sql = query.sql(), "eager batch query");
            match source.fetch(cx, query).await {
                Outcome::Ok(rows) => rows,
                Outcome::Err(e) => return Outcome::Err(e),
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        };

        match hydrate(cx, &mut batch).await {
            Outcome::Ok(()) => {}
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        tracing::debug!(
            rows = batch.len(),
            parents = parents.len(),
            "populating relation"
        );
        match populate(parents, batch, &spec.relation, field, self.mode) {
            Ok(()) => Outcome::Ok(()),
            Err(e) => Outcome::Err(e),
        }
    }
}

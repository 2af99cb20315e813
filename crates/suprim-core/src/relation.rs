//! Relation metadata.
//!
//! Relations are declared once per entity (conceptually generated from
//! entity declarations) and represented as immutable values. Higher layers
//! use them to synthesize correlation predicates, pivot joins, and batched
//! eager-load queries without runtime reflection.
//!
//! Each of the fourteen kinds carries exactly one metadata group (simple FK,
//! pivot, through, or morph) by construction: the payload structs below are
//! grouped so a kind cannot hold fields it has no use for.

use crate::table::Table;
use crate::value::Value;

/// Aggregate used by an "of-many" relation to pick its single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfManyAggregate {
    Max,
    Min,
}

/// Fallback behavior for singular relations with no matching row.
///
/// When present, population assigns `Loaded::Fallback` with a default-built
/// related instance carrying these attribute assignments, instead of
/// `Loaded::Absent`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationFallback {
    /// Column/value pairs applied to the default instance.
    pub attributes: Vec<(String, Value)>,
}

/// Simple foreign-key relation metadata (HasOne, HasMany, BelongsTo, and the
/// base of the "of-many" kinds).
///
/// Key meaning follows the kind: for HasOne/HasMany, `foreign_key` sits on
/// the related table and `local_key` on the owner; for BelongsTo it is the
/// reverse (`foreign_key` on the owner, `local_key` the owner key on the
/// related table).
#[derive(Debug, Clone, PartialEq)]
pub struct DirectRelation {
    pub related: Table,
    pub foreign_key: String,
    pub local_key: String,
    pub fallback: Option<RelationFallback>,
    /// Whether writes through this relation bump the parent's timestamps.
    pub touches_parent: bool,
}

impl DirectRelation {
    pub fn new(related: Table, foreign_key: impl Into<String>, local_key: impl Into<String>) -> Self {
        Self {
            related,
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
            fallback: None,
            touches_parent: false,
        }
    }

    /// Assign a default instance when no row matches.
    pub fn with_default(mut self) -> Self {
        self.fallback = Some(RelationFallback::default());
        self
    }

    /// Assign a default instance with attribute overrides when no row matches.
    pub fn with_default_attributes(mut self, attributes: Vec<(String, Value)>) -> Self {
        self.fallback = Some(RelationFallback { attributes });
        self
    }

    /// Bump the parent's timestamps on writes through this relation.
    pub fn touches(mut self) -> Self {
        self.touches_parent = true;
        self
    }
}

/// Many-to-many relation metadata backed by a pivot table.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRelation {
    pub related: Table,
    pub pivot: Table,
    /// Pivot column referencing the owner.
    pub foreign_pivot_key: String,
    /// Pivot column referencing the related table.
    pub related_pivot_key: String,
    /// Owner key the pivot points at (usually the primary key).
    pub parent_key: String,
    /// Related key the pivot points at (usually the primary key).
    pub related_key: String,
    /// Extra pivot columns to project alongside the related rows.
    pub pivot_columns: Vec<String>,
    /// Whether the pivot table maintains created/updated timestamps.
    pub with_timestamps: bool,
}

impl PivotRelation {
    pub fn new(
        related: Table,
        pivot: Table,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            related,
            pivot,
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            parent_key: parent_key.into(),
            related_key: related_key.into(),
            pivot_columns: Vec::new(),
            with_timestamps: false,
        }
    }

    /// Project extra pivot columns alongside the related rows.
    pub fn with_pivot_columns(mut self, columns: Vec<String>) -> Self {
        self.pivot_columns = columns;
        self
    }

    /// Maintain created/updated timestamps on the pivot table.
    pub fn with_timestamps(mut self) -> Self {
        self.with_timestamps = true;
        self
    }
}

/// Relation reached through an intermediate table's foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughRelation {
    pub related: Table,
    pub through: Table,
    /// Column on the through table referencing the owner.
    pub first_key: String,
    /// Column on the related table referencing the through table.
    pub second_key: String,
    /// Owner key the through table points at.
    pub local_key: String,
    /// Through-table key the related table points at.
    pub second_local_key: String,
}

impl ThroughRelation {
    pub fn new(
        related: Table,
        through: Table,
        first_key: impl Into<String>,
        second_key: impl Into<String>,
        local_key: impl Into<String>,
        second_local_key: impl Into<String>,
    ) -> Self {
        Self {
            related,
            through,
            first_key: first_key.into(),
            second_key: second_key.into(),
            local_key: local_key.into(),
            second_local_key: second_local_key.into(),
        }
    }
}

/// Polymorphic relation where the related table stores a type discriminator
/// plus an id column (MorphOne, MorphMany).
#[derive(Debug, Clone, PartialEq)]
pub struct MorphRelation {
    pub related: Table,
    /// Type discriminator column on the related table.
    pub morph_type: String,
    /// Owner id column on the related table.
    pub morph_id: String,
    /// The owner's class literal stored in the type column.
    pub morph_class: String,
    /// Owner key the morph id points at.
    pub local_key: String,
    pub fallback: Option<RelationFallback>,
}

impl MorphRelation {
    pub fn new(
        related: Table,
        morph_type: impl Into<String>,
        morph_id: impl Into<String>,
        morph_class: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            related,
            morph_type: morph_type.into(),
            morph_id: morph_id.into(),
            morph_class: morph_class.into(),
            local_key: local_key.into(),
            fallback: None,
        }
    }

    pub fn with_default(mut self) -> Self {
        self.fallback = Some(RelationFallback::default());
        self
    }
}

/// Inverse polymorphic relation: the owner stores the discriminator and id.
///
/// Population needs homogeneous related batches, so a `MorphTo` value is
/// resolved against one candidate target type; `related` and `morph_class`
/// describe that candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphToRelation {
    pub related: Table,
    /// Type discriminator column on the owner.
    pub type_column: String,
    /// Id column on the owner.
    pub id_column: String,
    /// The candidate target's class literal.
    pub morph_class: String,
    /// Key on the candidate table the id column points at.
    pub owner_key: String,
    pub fallback: Option<RelationFallback>,
}

impl MorphToRelation {
    pub fn new(
        related: Table,
        type_column: impl Into<String>,
        id_column: impl Into<String>,
        morph_class: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Self {
            related,
            type_column: type_column.into(),
            id_column: id_column.into(),
            morph_class: morph_class.into(),
            owner_key: owner_key.into(),
            fallback: None,
        }
    }

    pub fn with_default(mut self) -> Self {
        self.fallback = Some(RelationFallback::default());
        self
    }
}

/// Polymorphic many-to-many metadata (MorphToMany, MorphedByMany): a pivot
/// table with a morph type column next to its foreign keys.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphPivotRelation {
    pub related: Table,
    pub pivot: Table,
    /// Type discriminator column on the pivot table.
    pub morph_type: String,
    /// The class literal the pivot type column is matched against: the
    /// owner's class for MorphToMany, the related class for MorphedByMany.
    pub morph_class: String,
    /// Pivot column referencing the owner.
    pub foreign_pivot_key: String,
    /// Pivot column referencing the related table.
    pub related_pivot_key: String,
    pub parent_key: String,
    pub related_key: String,
    pub pivot_columns: Vec<String>,
    pub with_timestamps: bool,
}

impl MorphPivotRelation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        related: Table,
        pivot: Table,
        morph_type: impl Into<String>,
        morph_class: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
        parent_key: impl Into<String>,
        related_key: impl Into<String>,
    ) -> Self {
        Self {
            related,
            pivot,
            morph_type: morph_type.into(),
            morph_class: morph_class.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            parent_key: parent_key.into(),
            related_key: related_key.into(),
            pivot_columns: Vec::new(),
            with_timestamps: false,
        }
    }

    pub fn with_pivot_columns(mut self, columns: Vec<String>) -> Self {
        self.pivot_columns = columns;
        self
    }
}

/// A HasOne-shaped relation selecting a single "best" row out of a logical
/// HasMany set.
#[derive(Debug, Clone, PartialEq)]
pub struct OfManyRelation {
    pub base: DirectRelation,
    /// Column the winner is chosen by.
    pub column: String,
    pub aggregate: OfManyAggregate,
}

impl OfManyRelation {
    pub fn new(base: DirectRelation, column: impl Into<String>, aggregate: OfManyAggregate) -> Self {
        Self {
            base,
            column: column.into(),
            aggregate,
        }
    }
}

/// The relation kind, used for dispatch, diagnostics, and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
    BelongsToMany,
    HasOneThrough,
    HasManyThrough,
    MorphOne,
    MorphMany,
    MorphTo,
    MorphToMany,
    MorphedByMany,
    LatestOfMany,
    OldestOfMany,
    OfMany,
}

impl RelationKind {
    pub const fn name(self) -> &'static str {
        match self {
            RelationKind::HasOne => "HasOne",
            RelationKind::HasMany => "HasMany",
            RelationKind::BelongsTo => "BelongsTo",
            RelationKind::BelongsToMany => "BelongsToMany",
            RelationKind::HasOneThrough => "HasOneThrough",
            RelationKind::HasManyThrough => "HasManyThrough",
            RelationKind::MorphOne => "MorphOne",
            RelationKind::MorphMany => "MorphMany",
            RelationKind::MorphTo => "MorphTo",
            RelationKind::MorphToMany => "MorphToMany",
            RelationKind::MorphedByMany => "MorphedByMany",
            RelationKind::LatestOfMany => "LatestOfMany",
            RelationKind::OldestOfMany => "OldestOfMany",
            RelationKind::OfMany => "OfMany",
        }
    }
}

/// A declared relationship between an owner entity and a related entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation {
    HasOne(DirectRelation),
    HasMany(DirectRelation),
    BelongsTo(DirectRelation),
    BelongsToMany(PivotRelation),
    HasOneThrough(ThroughRelation),
    HasManyThrough(ThroughRelation),
    MorphOne(MorphRelation),
    MorphMany(MorphRelation),
    MorphTo(MorphToRelation),
    MorphToMany(MorphPivotRelation),
    MorphedByMany(MorphPivotRelation),
    LatestOfMany(OfManyRelation),
    OldestOfMany(OfManyRelation),
    OfMany(OfManyRelation),
}

impl Relation {
    /// Alias under which through-relation batch queries project the
    /// correlating through-table key.
    pub const THROUGH_KEY: &'static str = "through_key";

    /// Prefix under which pivot-backed batch queries project pivot columns.
    pub const PIVOT_PREFIX: &'static str = "pivot_";

    pub fn has_one(
        related: Table,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Relation::HasOne(DirectRelation::new(related, foreign_key, local_key))
    }

    pub fn has_many(
        related: Table,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Relation::HasMany(DirectRelation::new(related, foreign_key, local_key))
    }

    pub fn belongs_to(
        related: Table,
        foreign_key: impl Into<String>,
        owner_key: impl Into<String>,
    ) -> Self {
        Relation::BelongsTo(DirectRelation::new(related, foreign_key, owner_key))
    }

    pub fn latest_of_many(
        related: Table,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Relation::LatestOfMany(OfManyRelation::new(
            DirectRelation::new(related, foreign_key, local_key),
            column,
            OfManyAggregate::Max,
        ))
    }

    pub fn oldest_of_many(
        related: Table,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Relation::OldestOfMany(OfManyRelation::new(
            DirectRelation::new(related, foreign_key, local_key),
            column,
            OfManyAggregate::Min,
        ))
    }

    /// The relation kind.
    pub const fn kind(&self) -> RelationKind {
        match self {
            Relation::HasOne(_) => RelationKind::HasOne,
            Relation::HasMany(_) => RelationKind::HasMany,
            Relation::BelongsTo(_) => RelationKind::BelongsTo,
            Relation::BelongsToMany(_) => RelationKind::BelongsToMany,
            Relation::HasOneThrough(_) => RelationKind::HasOneThrough,
            Relation::HasManyThrough(_) => RelationKind::HasManyThrough,
            Relation::MorphOne(_) => RelationKind::MorphOne,
            Relation::MorphMany(_) => RelationKind::MorphMany,
            Relation::MorphTo(_) => RelationKind::MorphTo,
            Relation::MorphToMany(_) => RelationKind::MorphToMany,
            Relation::MorphedByMany(_) => RelationKind::MorphedByMany,
            Relation::LatestOfMany(_) => RelationKind::LatestOfMany,
            Relation::OldestOfMany(_) => RelationKind::OldestOfMany,
            Relation::OfMany(_) => RelationKind::OfMany,
        }
    }

    /// The table related rows come from.
    pub fn related_table(&self) -> &Table {
        match self {
            Relation::HasOne(d) | Relation::HasMany(d) | Relation::BelongsTo(d) => &d.related,
            Relation::BelongsToMany(p) => &p.related,
            Relation::HasOneThrough(t) | Relation::HasManyThrough(t) => &t.related,
            Relation::MorphOne(m) | Relation::MorphMany(m) => &m.related,
            Relation::MorphTo(m) => &m.related,
            Relation::MorphToMany(p) | Relation::MorphedByMany(p) => &p.related,
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                &o.base.related
            }
        }
    }

    /// The logical entity the related table materializes into, if declared.
    pub fn related_entity(&self) -> Option<&str> {
        self.related_table().entity_name()
    }

    /// Whether this relation populates a collection field (vs a single
    /// related instance).
    pub const fn is_collection(&self) -> bool {
        matches!(
            self,
            Relation::HasMany(_)
                | Relation::BelongsToMany(_)
                | Relation::HasManyThrough(_)
                | Relation::MorphMany(_)
                | Relation::MorphToMany(_)
                | Relation::MorphedByMany(_)
        )
    }

    /// True iff the relation is one of the three "of-many" kinds; eager
    /// loading and EXISTS synthesis must cap these to one row per owner.
    pub const fn requires_limit_one(&self) -> bool {
        matches!(
            self,
            Relation::LatestOfMany(_) | Relation::OldestOfMany(_) | Relation::OfMany(_)
        )
    }

    /// The of-many selection column and aggregate, for the three "of-many"
    /// kinds only.
    pub fn of_many(&self) -> Option<(&str, OfManyAggregate)> {
        match self {
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                Some((o.column.as_str(), o.aggregate))
            }
            _ => None,
        }
    }

    /// The column on the owner whose values correlate parents to related
    /// rows (and form the key batch for eager loading).
    pub fn owner_key_column(&self) -> &str {
        match self {
            Relation::HasOne(d) | Relation::HasMany(d) => &d.local_key,
            Relation::BelongsTo(d) => &d.foreign_key,
            Relation::BelongsToMany(p) => &p.parent_key,
            Relation::HasOneThrough(t) | Relation::HasManyThrough(t) => &t.local_key,
            Relation::MorphOne(m) | Relation::MorphMany(m) => &m.local_key,
            Relation::MorphTo(m) => &m.id_column,
            Relation::MorphToMany(p) | Relation::MorphedByMany(p) => &p.parent_key,
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                &o.base.local_key
            }
        }
    }

    /// The column on fetched related rows that carries the correlation key.
    ///
    /// For pivot and through kinds this is a projected alias
    /// (`pivot_<fk>` / [`Relation::THROUGH_KEY`]) rather than a physical
    /// column of the related table.
    pub fn related_group_column(&self) -> String {
        match self {
            Relation::HasOne(d) | Relation::HasMany(d) => d.foreign_key.clone(),
            Relation::BelongsTo(d) => d.local_key.clone(),
            Relation::BelongsToMany(p) => {
                format!("{}{}", Self::PIVOT_PREFIX, p.foreign_pivot_key)
            }
            Relation::HasOneThrough(_) | Relation::HasManyThrough(_) => {
                Self::THROUGH_KEY.to_string()
            }
            Relation::MorphOne(m) | Relation::MorphMany(m) => m.morph_id.clone(),
            Relation::MorphTo(m) => m.owner_key.clone(),
            Relation::MorphToMany(p) | Relation::MorphedByMany(p) => {
                format!("{}{}", Self::PIVOT_PREFIX, p.foreign_pivot_key)
            }
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                o.base.foreign_key.clone()
            }
        }
    }

    /// The fallback configuration for singular kinds that declare one.
    pub fn fallback(&self) -> Option<&RelationFallback> {
        match self {
            Relation::HasOne(d) | Relation::BelongsTo(d) => d.fallback.as_ref(),
            Relation::MorphOne(m) => m.fallback.as_ref(),
            Relation::MorphTo(m) => m.fallback.as_ref(),
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                o.base.fallback.as_ref()
            }
            _ => None,
        }
    }
}

//! Correlation synthesis for relations.
//!
//! For any relation value, three primitives are derivable from an owner-row
//! alias alone: the correlation predicate, the pivot/through join needed
//! before that predicate is usable, and the single-row ordering for the
//! "of-many" kinds. They are sufficient to build `EXISTS`/`COUNT` predicates
//! for relation filtering and the batched eager-load queries.

use crate::clause::OrderSpec;
use crate::expr::Expr;
use crate::join::Join;
use crate::predicate::{CompareOp, Predicate};
use crate::select::SelectBuilder;
use suprim_core::{OfManyAggregate, Relation, SqlType, Value};

/// SQL synthesis over [`Relation`] values.
pub trait RelationSql {
    /// The WHERE predicate correlating one related-table row to the owner
    /// row referenced by `owner_alias`.
    fn exists_condition(&self, owner_alias: &str) -> Predicate;

    /// The JOIN needed before [`exists_condition`](Self::exists_condition)
    /// is usable: pivot→related for pivot-backed kinds, through→related for
    /// through kinds, `None` otherwise.
    fn pivot_join(&self) -> Option<Join>;

    /// The single-row-selecting ORDER BY for the three "of-many" kinds.
    fn of_many_order_by(&self) -> Option<OrderSpec>;

    /// `SELECT 1` subquery for EXISTS-style filtering against an owner row.
    fn exists_query(&self, owner_alias: &str, constraint: Option<Predicate>) -> SelectBuilder;

    /// `SELECT COUNT(*)` subquery for relation-count filtering.
    fn count_query(&self, owner_alias: &str, constraint: Option<Predicate>) -> SelectBuilder;

    /// The batched eager-load query: one query for a whole parent batch,
    /// keyed by `IN (...)` over the collected owner keys. Pivot and through
    /// kinds project the correlating key under its grouping alias.
    fn batch_query(&self, parent_keys: Vec<Value>, constraint: Option<Predicate>) -> SelectBuilder;
}

fn col(qualifier: &str, name: &str) -> Expr {
    Expr::qualified(qualifier, name, SqlType::Unspecified)
}

fn eq(left: Expr, right: Expr) -> Predicate {
    Predicate::compare(left, CompareOp::Eq, right)
}

fn in_keys(column: Expr, keys: Vec<Value>) -> Predicate {
    Predicate::compare(column, CompareOp::In, Expr::list(keys))
}

impl RelationSql for Relation {
    fn exists_condition(&self, owner_alias: &str) -> Predicate {
        let related = self.related_table().reference_name();
        let owner = |name: &str| col(owner_alias, name);

        match self {
            Relation::HasOne(d) | Relation::HasMany(d) => {
                eq(col(related, &d.foreign_key), owner(&d.local_key))
            }
            Relation::BelongsTo(d) => eq(col(related, &d.local_key), owner(&d.foreign_key)),
            Relation::BelongsToMany(p) => {
                eq(col(p.pivot.reference_name(), &p.foreign_pivot_key), owner(&p.parent_key))
            }
            Relation::HasOneThrough(t) | Relation::HasManyThrough(t) => {
                eq(col(t.through.reference_name(), &t.first_key), owner(&t.local_key))
            }
            Relation::MorphOne(m) | Relation::MorphMany(m) => {
                eq(col(related, &m.morph_id), owner(&m.local_key)).and(eq(
                    col(related, &m.morph_type),
                    Expr::lit(m.morph_class.as_str()),
                ))
            }
            Relation::MorphTo(m) => eq(col(related, &m.owner_key), owner(&m.id_column)).and(eq(
                owner(&m.type_column),
                Expr::lit(m.morph_class.as_str()),
            )),
            Relation::MorphToMany(p) | Relation::MorphedByMany(p) => {
                let pivot = p.pivot.reference_name();
                eq(col(pivot, &p.foreign_pivot_key), owner(&p.parent_key)).and(eq(
                    col(pivot, &p.morph_type),
                    Expr::lit(p.morph_class.as_str()),
                ))
            }
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                eq(col(related, &o.base.foreign_key), owner(&o.base.local_key))
            }
        }
    }

    fn pivot_join(&self) -> Option<Join> {
        let related = self.related_table().reference_name();
        match self {
            Relation::BelongsToMany(p) => Some(Join::inner(
                p.pivot.clone(),
                eq(
                    col(p.pivot.reference_name(), &p.related_pivot_key),
                    col(related, &p.related_key),
                ),
            )),
            Relation::MorphToMany(p) | Relation::MorphedByMany(p) => Some(Join::inner(
                p.pivot.clone(),
                eq(
                    col(p.pivot.reference_name(), &p.related_pivot_key),
                    col(related, &p.related_key),
                ),
            )),
            Relation::HasOneThrough(t) | Relation::HasManyThrough(t) => Some(Join::inner(
                t.through.clone(),
                eq(
                    col(t.through.reference_name(), &t.second_local_key),
                    col(related, &t.second_key),
                ),
            )),
            _ => None,
        }
    }

    fn of_many_order_by(&self) -> Option<OrderSpec> {
        let (column, aggregate) = self.of_many()?;
        let expr = col(self.related_table().reference_name(), column);
        Some(match aggregate {
            OfManyAggregate::Max => OrderSpec::desc(expr),
            OfManyAggregate::Min => OrderSpec::asc(expr),
        })
    }

    fn exists_query(&self, owner_alias: &str, constraint: Option<Predicate>) -> SelectBuilder {
        let mut condition = self.exists_condition(owner_alias);
        if let Some(extra) = constraint {
            condition = condition.and(extra);
        }
        let mut query = SelectBuilder::from_table(self.related_table().clone()).select_raw("1");
        if let Some(join) = self.pivot_join() {
            query = query.join(join);
        }
        query = query.and_where(condition);
        if let Some(order) = self.of_many_order_by() {
            query = query.order_by(order).limit(1);
        }
        query
    }

    fn count_query(&self, owner_alias: &str, constraint: Option<Predicate>) -> SelectBuilder {
        let mut condition = self.exists_condition(owner_alias);
        if let Some(extra) = constraint {
            condition = condition.and(extra);
        }
        let mut query = SelectBuilder::from_table(self.related_table().clone())
            .select(Expr::count_star());
        if let Some(join) = self.pivot_join() {
            query = query.join(join);
        }
        query.and_where(condition)
    }

    fn batch_query(&self, parent_keys: Vec<Value>, constraint: Option<Predicate>) -> SelectBuilder {
        let related = self.related_table().clone();
        let related_ref = related.reference_name().to_string();
        let mut query = SelectBuilder::from_table(related);

        match self {
            Relation::HasOne(d) | Relation::HasMany(d) => {
                query = query.and_where(in_keys(col(&related_ref, &d.foreign_key), parent_keys));
            }
            Relation::BelongsTo(d) => {
                query = query.and_where(in_keys(col(&related_ref, &d.local_key), parent_keys));
            }
            Relation::LatestOfMany(o) | Relation::OldestOfMany(o) | Relation::OfMany(o) => {
                query = query
                    .and_where(in_keys(col(&related_ref, &o.base.foreign_key), parent_keys));
                if let Some(order) = self.of_many_order_by() {
                    query = query.order_by(order);
                }
            }
            Relation::MorphOne(m) | Relation::MorphMany(m) => {
                query = query.and_where(
                    in_keys(col(&related_ref, &m.morph_id), parent_keys).and(eq(
                        col(&related_ref, &m.morph_type),
                        Expr::lit(m.morph_class.as_str()),
                    )),
                );
            }
            Relation::MorphTo(m) => {
                query = query.and_where(in_keys(col(&related_ref, &m.owner_key), parent_keys));
            }
            Relation::BelongsToMany(p) => {
                let pivot_ref = p.pivot.reference_name().to_string();
                query = query
                    .select_table_star(&related_ref)
                    .select(
                        col(&pivot_ref, &p.foreign_pivot_key)
                            .alias(format!("{}{}", Relation::PIVOT_PREFIX, p.foreign_pivot_key)),
                    );
                for column in &p.pivot_columns {
                    query = query.select(
                        col(&pivot_ref, column)
                            .alias(format!("{}{}", Relation::PIVOT_PREFIX, column)),
                    );
                }
                if let Some(join) = self.pivot_join() {
                    query = query.join(join);
                }
                query = query
                    .and_where(in_keys(col(&pivot_ref, &p.foreign_pivot_key), parent_keys));
            }
            Relation::MorphToMany(p) | Relation::MorphedByMany(p) => {
                let pivot_ref = p.pivot.reference_name().to_string();
                query = query
                    .select_table_star(&related_ref)
                    .select(
                        col(&pivot_ref, &p.foreign_pivot_key)
                            .alias(format!("{}{}", Relation::PIVOT_PREFIX, p.foreign_pivot_key)),
                    );
                for column in &p.pivot_columns {
                    query = query.select(
                        col(&pivot_ref, column)
                            .alias(format!("{}{}", Relation::PIVOT_PREFIX, column)),
                    );
                }
                if let Some(join) = self.pivot_join() {
                    query = query.join(join);
                }
                query = query.and_where(
                    in_keys(col(&pivot_ref, &p.foreign_pivot_key), parent_keys).and(eq(
                        col(&pivot_ref, &p.morph_type),
                        Expr::lit(p.morph_class.as_str()),
                    )),
                );
            }
            Relation::HasOneThrough(t) | Relation::HasManyThrough(t) => {
                let through_ref = t.through.reference_name().to_string();
                query = query
                    .select_table_star(&related_ref)
                    .select(col(&through_ref, &t.first_key).alias(Relation::THROUGH_KEY));
                if let Some(join) = self.pivot_join() {
                    query = query.join(join);
                }
                query = query.and_where(in_keys(col(&through_ref, &t.first_key), parent_keys));
            }
        }

        if let Some(extra) = constraint {
            query = query.and_where(extra);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqlDialect;
    use suprim_core::{DirectRelation, MorphRelation, PivotRelation, Table, ThroughRelation};

    fn pg() -> SqlDialect {
        SqlDialect::postgres()
    }

    fn posts() -> Table {
        Table::new("posts").entity("Post")
    }

    #[test]
    fn has_many_exists_condition() {
        let rel = Relation::has_many(posts(), "user_id", "id");
        let sql = rel.exists_condition("users").to_sql(&pg()).unwrap();
        assert_eq!(sql, "\"posts\".\"user_id\" = \"users\".\"id\"");
        assert!(rel.pivot_join().is_none());
    }

    #[test]
    fn belongs_to_exists_condition_reverses_keys() {
        let rel = Relation::belongs_to(Table::new("users").entity("User"), "user_id", "id");
        let sql = rel.exists_condition("posts").to_sql(&pg()).unwrap();
        assert_eq!(sql, "\"users\".\"id\" = \"posts\".\"user_id\"");
    }

    #[test]
    fn pivot_kind_correlates_through_pivot() {
        let rel = Relation::BelongsToMany(PivotRelation::new(
            Table::new("roles").entity("Role"),
            Table::new("role_user"),
            "user_id",
            "role_id",
            "id",
            "id",
        ));
        let condition = rel.exists_condition("users").to_sql(&pg()).unwrap();
        assert_eq!(condition, "\"role_user\".\"user_id\" = \"users\".\"id\"");

        let join = rel.pivot_join().unwrap();
        let mut binding = crate::params::Binding::Inline;
        assert_eq!(
            join.render(&pg(), &mut binding).unwrap(),
            " INNER JOIN \"role_user\" ON \"role_user\".\"role_id\" = \"roles\".\"id\""
        );
    }

    #[test]
    fn through_kind_correlates_through_intermediate() {
        let rel = Relation::HasManyThrough(ThroughRelation::new(
            posts(),
            Table::new("users"),
            "country_id",
            "user_id",
            "id",
            "id",
        ));
        let condition = rel.exists_condition("countries").to_sql(&pg()).unwrap();
        assert_eq!(condition, "\"users\".\"country_id\" = \"countries\".\"id\"");

        let join = rel.pivot_join().unwrap();
        let mut binding = crate::params::Binding::Inline;
        assert_eq!(
            join.render(&pg(), &mut binding).unwrap(),
            " INNER JOIN \"users\" ON \"users\".\"id\" = \"posts\".\"user_id\""
        );
    }

    #[test]
    fn morph_kind_pairs_type_and_id() {
        let rel = Relation::MorphOne(MorphRelation::new(
            Table::new("images").entity("Image"),
            "imageable_type",
            "imageable_id",
            "Post",
            "id",
        ));
        let sql = rel.exists_condition("posts").to_sql(&pg()).unwrap();
        assert_eq!(
            sql,
            "(\"images\".\"imageable_id\" = \"posts\".\"id\" AND \"images\".\"imageable_type\" = 'Post')"
        );
    }

    #[test]
    fn of_many_order_by_direction() {
        let latest = Relation::latest_of_many(posts(), "user_id", "id", "created_at");
        let oldest = Relation::oldest_of_many(posts(), "user_id", "id", "created_at");
        let mut binding = crate::params::Binding::Inline;
        assert_eq!(
            latest
                .of_many_order_by()
                .unwrap()
                .render(&pg(), &mut binding)
                .unwrap(),
            "\"posts\".\"created_at\" DESC"
        );
        assert_eq!(
            oldest
                .of_many_order_by()
                .unwrap()
                .render(&pg(), &mut binding)
                .unwrap(),
            "\"posts\".\"created_at\" ASC"
        );
        assert!(
            Relation::has_one(posts(), "user_id", "id")
                .of_many_order_by()
                .is_none()
        );
    }

    #[test]
    fn exists_query_caps_of_many_to_one_row() {
        let rel = Relation::latest_of_many(posts(), "user_id", "id", "created_at");
        let sql = rel.exists_query("users", None).to_sql(&pg()).unwrap();
        assert_eq!(
            sql,
            "SELECT 1 FROM \"posts\" WHERE \"posts\".\"user_id\" = \"users\".\"id\" \
             ORDER BY \"posts\".\"created_at\" DESC LIMIT 1"
        );
    }

    #[test]
    fn relation_exists_predicate_renders_subquery() {
        let rel = Relation::has_many(posts(), "user_id", "id");
        let sql = Predicate::relation_exists(rel, "users").to_sql(&pg()).unwrap();
        assert_eq!(
            sql,
            "EXISTS (SELECT 1 FROM \"posts\" WHERE \"posts\".\"user_id\" = \"users\".\"id\")"
        );
    }

    #[test]
    fn relation_count_predicate_renders_comparison() {
        let rel = Relation::has_many(posts(), "user_id", "id");
        let sql = Predicate::relation_count(rel, CompareOp::Ge, 3, "users")
            .to_sql(&pg())
            .unwrap();
        assert_eq!(
            sql,
            "(SELECT COUNT(*) FROM \"posts\" WHERE \"posts\".\"user_id\" = \"users\".\"id\") >= 3"
        );
    }

    #[test]
    fn direct_batch_query_uses_in_over_keys() {
        let rel = Relation::has_many(posts(), "user_id", "id");
        let sql = rel
            .batch_query(vec![Value::BigInt(1), Value::BigInt(2)], None)
            .to_sql(&pg())
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"posts\" WHERE \"posts\".\"user_id\" IN (1, 2)"
        );
    }

    #[test]
    fn pivot_batch_query_projects_correlation_alias() {
        let rel = Relation::BelongsToMany(PivotRelation::new(
            Table::new("roles").entity("Role"),
            Table::new("role_user"),
            "user_id",
            "role_id",
            "id",
            "id",
        ));
        let sql = rel.batch_query(vec![Value::BigInt(7)], None).to_sql(&pg()).unwrap();
        assert_eq!(
            sql,
            "SELECT \"roles\".*, \"role_user\".\"user_id\" AS \"pivot_user_id\" FROM \"roles\" \
             INNER JOIN \"role_user\" ON \"role_user\".\"role_id\" = \"roles\".\"id\" \
             WHERE \"role_user\".\"user_id\" IN (7)"
        );
    }

    #[test]
    fn through_batch_query_projects_through_key() {
        let rel = Relation::HasManyThrough(ThroughRelation::new(
            posts(),
            Table::new("users"),
            "country_id",
            "user_id",
            "id",
            "id",
        ));
        let sql = rel.batch_query(vec![Value::BigInt(1)], None).to_sql(&pg()).unwrap();
        assert_eq!(
            sql,
            "SELECT \"posts\".*, \"users\".\"country_id\" AS \"through_key\" FROM \"posts\" \
             INNER JOIN \"users\" ON \"users\".\"id\" = \"posts\".\"user_id\" \
             WHERE \"users\".\"country_id\" IN (1)"
        );
    }

    #[test]
    fn batch_query_appends_constraint() {
        let rel = Relation::has_many(posts(), "user_id", "id");
        let sql = rel
            .batch_query(
                vec![Value::BigInt(1)],
                Some(Predicate::raw("\"published\" = TRUE")),
            )
            .to_sql(&pg())
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM \"posts\" WHERE (\"posts\".\"user_id\" IN (1) AND \"published\" = TRUE)"
        );
    }

    #[test]
    fn belongs_to_with_default_round_trip() {
        let rel = Relation::BelongsTo(
            DirectRelation::new(Table::new("users").entity("User"), "user_id", "id").with_default(),
        );
        let sql = rel.batch_query(vec![Value::BigInt(5)], None).to_sql(&pg()).unwrap();
        assert_eq!(sql, "SELECT * FROM \"users\" WHERE \"users\".\"id\" IN (5)");
    }
}

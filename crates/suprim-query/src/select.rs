//! SELECT statement builder.

use crate::clause::{
    GroupByItem, LockMode, LockWait, OrderSpec, RowLock, SelectItem, TrashedScope,
};
use crate::cte::Cte;
use crate::dialect::SqlDialect;
use crate::eager::{EagerLoadSpec, PathResolver, merge_spec};
use crate::expr::Expr;
use crate::join::Join;
use crate::params::{Binding, ParameterContext};
use crate::predicate::Predicate;
use crate::query::QueryResult;
use crate::set_ops::SetOpType;
use suprim_core::{EntityGraph, Error, PathError, PathErrorKind, Result, SqlType, Table};

/// A SELECT query builder.
///
/// A mutable, single-writer accumulator; `build(dialect)` is pure given the
/// accumulated state and produces an immutable [`QueryResult`].
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: Table,
    items: Vec<SelectItem>,
    joins: Vec<Join>,
    wheres: Option<Predicate>,
    group_by: Vec<GroupByItem>,
    having: Option<Predicate>,
    order_by: Vec<OrderSpec>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
    lock: Option<RowLock>,
    ctes: Vec<Cte>,
    set_ops: Vec<(SetOpType, SelectBuilder)>,
    eager: Vec<EagerLoadSpec>,
    scope: TrashedScope,
}

impl SelectBuilder {
    /// Start a SELECT over the given table.
    pub fn from_table(table: Table) -> Self {
        Self {
            table,
            items: Vec::new(),
            joins: Vec::new(),
            wheres: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            lock: None,
            ctes: Vec::new(),
            set_ops: Vec::new(),
            eager: Vec::new(),
            scope: TrashedScope::Default,
        }
    }

    /// The table this statement selects from.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Project an expression. With no projections the statement selects `*`.
    pub fn select(mut self, expr: Expr) -> Self {
        self.items.push(SelectItem::Expression(expr));
        self
    }

    /// Project `*`.
    pub fn select_star(mut self) -> Self {
        self.items.push(SelectItem::Star);
        self
    }

    /// Project `qualifier.*`.
    pub fn select_table_star(mut self, qualifier: impl Into<String>) -> Self {
        self.items.push(SelectItem::TableStar(qualifier.into()));
        self
    }

    /// Project a verbatim fragment.
    pub fn select_raw(mut self, fragment: impl Into<String>) -> Self {
        self.items.push(SelectItem::Raw(fragment.into()));
        self
    }

    /// AND a predicate into the WHERE clause.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.wheres = Some(match self.wheres {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// OR a predicate into the WHERE clause.
    pub fn or_where(mut self, predicate: Predicate) -> Self {
        self.wheres = Some(match self.wheres {
            Some(existing) => existing.or(predicate),
            None => predicate,
        });
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn group_by(mut self, item: GroupByItem) -> Self {
        self.group_by.push(item);
        self
    }

    /// AND a predicate into the HAVING clause.
    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having = Some(match self.having {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by(mut self, spec: OrderSpec) -> Self {
        self.order_by.push(spec);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Lock matched rows FOR UPDATE.
    pub fn for_update(mut self) -> Self {
        self.lock = Some(RowLock {
            mode: LockMode::Update,
            wait: self.lock.map_or(LockWait::Wait, |l| l.wait),
        });
        self
    }

    /// Lock matched rows FOR SHARE.
    pub fn for_share(mut self) -> Self {
        self.lock = Some(RowLock {
            mode: LockMode::Share,
            wait: self.lock.map_or(LockWait::Wait, |l| l.wait),
        });
        self
    }

    /// Fail immediately instead of waiting on locked rows.
    pub fn nowait(mut self) -> Self {
        if let Some(lock) = &mut self.lock {
            lock.wait = LockWait::Nowait;
        }
        self
    }

    /// Skip locked rows instead of waiting on them.
    pub fn skip_locked(mut self) -> Self {
        if let Some(lock) = &mut self.lock {
            lock.wait = LockWait::SkipLocked;
        }
        self
    }

    /// Prepend a common table expression.
    pub fn with_cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    pub fn union(self, other: SelectBuilder) -> Self {
        self.set_op(SetOpType::Union, other)
    }

    pub fn union_all(self, other: SelectBuilder) -> Self {
        self.set_op(SetOpType::UnionAll, other)
    }

    pub fn intersect(self, other: SelectBuilder) -> Self {
        self.set_op(SetOpType::Intersect, other)
    }

    pub fn except(self, other: SelectBuilder) -> Self {
        self.set_op(SetOpType::Except, other)
    }

    fn set_op(mut self, op: SetOpType, other: SelectBuilder) -> Self {
        self.set_ops.push((op, other));
        self
    }

    /// Attach an eager-load spec, merging with an existing spec of the same
    /// relation name.
    pub fn with_relation(mut self, spec: EagerLoadSpec) -> Self {
        merge_spec(&mut self.eager, spec);
        self
    }

    /// Resolve a dot-notation path against the target entity and attach the
    /// resulting spec chain. The table must declare its entity type.
    pub fn with_path<G: EntityGraph + ?Sized>(self, graph: &G, path: &str) -> Result<Self> {
        self.with_path_constrained(graph, path, None)
    }

    /// Like [`with_path`](Self::with_path), attaching a constraint to the
    /// deepest spec of the chain.
    pub fn with_path_constrained<G: EntityGraph + ?Sized>(
        self,
        graph: &G,
        path: &str,
        constraint: Option<Predicate>,
    ) -> Result<Self> {
        let Some(entity) = self.table.entity_name() else {
            return Err(Error::Path(PathError {
                kind: PathErrorKind::MissingEntity,
                segment: path.to_string(),
                entity: self.table.name().to_string(),
            }));
        };
        let spec = PathResolver::new(graph).resolve_with(entity, path, constraint)?;
        Ok(self.with_relation(spec))
    }

    /// Set the soft-delete visibility of this build.
    pub fn scope(mut self, scope: TrashedScope) -> Self {
        self.scope = scope;
        self
    }

    /// Render to SQL with inline literal values.
    pub fn to_sql(&self, dialect: &SqlDialect) -> Result<String> {
        self.render_into(dialect, &mut Binding::Inline)
    }

    /// Build the statement: SQL with named placeholders plus the ordered
    /// parameter map, eager-load tree, and scope.
    pub fn build(&self, dialect: &SqlDialect) -> Result<QueryResult> {
        let mut params = ParameterContext::new();
        let sql = self.render_into(dialect, &mut Binding::Bound(&mut params))?;
        Ok(QueryResult::new(
            sql,
            params.into_values(),
            self.eager.clone(),
            self.scope,
        ))
    }

    pub(crate) fn render_into(
        &self,
        dialect: &SqlDialect,
        binding: &mut Binding<'_>,
    ) -> Result<String> {
        let mut sql = String::new();

        if !self.ctes.is_empty() {
            let rendered: Result<Vec<_>> = self
                .ctes
                .iter()
                .map(|cte| cte.render(dialect, binding))
                .collect();
            sql.push_str(&format!("WITH {} ", rendered?.join(", ")));
        }

        sql.push_str("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.items.is_empty() {
            sql.push('*');
        } else {
            let rendered: Result<Vec<_>> = self
                .items
                .iter()
                .map(|item| item.render(dialect, binding))
                .collect();
            sql.push_str(&rendered?.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&dialect.table_sql(&self.table));

        for join in &self.joins {
            sql.push_str(&join.render(dialect, binding)?);
        }

        if let Some(where_sql) = self.render_where(dialect, binding)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !self.group_by.is_empty() {
            let rendered: Result<Vec<_>> = self
                .group_by
                .iter()
                .map(|item| item.render(dialect, binding))
                .collect();
            sql.push_str(&format!(" GROUP BY {}", rendered?.join(", ")));
        }

        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&having.render(dialect, binding)?);
        }

        for (op, query) in &self.set_ops {
            sql.push_str(&format!(
                " {} ({})",
                op.as_sql(),
                query.render_into(dialect, binding)?
            ));
        }

        if !self.order_by.is_empty() {
            let rendered: Result<Vec<_>> = self
                .order_by
                .iter()
                .map(|spec| spec.render(dialect, binding))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", rendered?.join(", ")));
        }

        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        if let Some(n) = self.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        if let Some(lock) = self.lock {
            sql.push_str(&lock.render(dialect)?);
        }

        Ok(sql)
    }

    /// Combine explicit WHERE predicates with the soft-delete scope filter.
    fn render_where(
        &self,
        dialect: &SqlDialect,
        binding: &mut Binding<'_>,
    ) -> Result<Option<String>> {
        let scope_filter = self.table.soft_delete_column().and_then(|column| {
            let marker = Expr::qualified(self.table.reference_name(), column, SqlType::Timestamp);
            match self.scope {
                TrashedScope::Default => Some(Predicate::null_check(marker, false)),
                TrashedScope::WithTrashed => None,
                TrashedScope::OnlyTrashed => Some(Predicate::null_check(marker, true)),
            }
        });

        let combined = match (self.wheres.clone(), scope_filter) {
            (Some(wheres), Some(filter)) => Some(wheres.and(filter)),
            (Some(wheres), None) => Some(wheres),
            (None, Some(filter)) => Some(filter),
            (None, None) => None,
        };

        combined
            .map(|predicate| predicate.render(dialect, binding))
            .transpose()
    }
}

//! Clause types shared by the statement builders.

use crate::dialect::SqlDialect;
use crate::expr::Expr;
use crate::params::Binding;
use suprim_core::{Column, Error, Result};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// NULLS FIRST/LAST ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// One ORDER BY term.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: OrderDirection,
    pub nulls: Option<NullsOrder>,
}

impl OrderSpec {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
            nulls: None,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
            nulls: None,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = Some(NullsOrder::First);
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    pub(crate) fn render(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        let mut sql = self.expr.render(dialect, binding)?;
        sql.push_str(match self.direction {
            OrderDirection::Asc => " ASC",
            OrderDirection::Desc => " DESC",
        });
        if let Some(nulls) = self.nulls {
            sql.push_str(match nulls {
                NullsOrder::First => " NULLS FIRST",
                NullsOrder::Last => " NULLS LAST",
            });
        }
        Ok(sql)
    }
}

/// One GROUP BY term.
#[derive(Debug, Clone)]
pub enum GroupByItem {
    Column(Column),
    Expression(Expr),
}

impl GroupByItem {
    pub(crate) fn render(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        match self {
            GroupByItem::Column(column) => Ok(dialect.quote_ident(column.name())),
            GroupByItem::Expression(expr) => expr.render(dialect, binding),
        }
    }
}

/// One projected item of a SELECT.
#[derive(Debug, Clone)]
pub enum SelectItem {
    /// `*`
    Star,
    /// `qualifier.*`
    TableStar(String),
    Expression(Expr),
    /// A verbatim fragment, e.g. the `1` of an EXISTS probe. Never
    /// parameterized.
    Raw(String),
}

impl SelectItem {
    pub(crate) fn render(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        match self {
            SelectItem::Star => Ok("*".to_string()),
            SelectItem::TableStar(qualifier) => Ok(format!("{}.*", dialect.quote_ident(qualifier))),
            SelectItem::Expression(expr) => expr.render(dialect, binding),
            SelectItem::Raw(sql) => Ok(sql.clone()),
        }
    }
}

/// Row locking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Update,
    Share,
}

/// What to do when a locked row is encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockWait {
    #[default]
    Wait,
    Nowait,
    SkipLocked,
}

/// A FOR UPDATE / FOR SHARE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLock {
    pub mode: LockMode,
    pub wait: LockWait,
}

impl RowLock {
    pub(crate) fn render(&self, dialect: &SqlDialect) -> Result<String> {
        let mut sql = match self.mode {
            LockMode::Update => " FOR UPDATE".to_string(),
            LockMode::Share => " FOR SHARE".to_string(),
        };
        match self.wait {
            LockWait::Wait => {}
            LockWait::Nowait => {
                if !dialect.supports_nowait() {
                    return Err(Error::unsupported(
                        "NOWAIT",
                        dialect.name(),
                        "omit NOWAIT and rely on the lock wait timeout",
                    ));
                }
                sql.push_str(" NOWAIT");
            }
            LockWait::SkipLocked => {
                if !dialect.supports_skip_locked() {
                    return Err(Error::unsupported(
                        "SKIP LOCKED",
                        dialect.name(),
                        "filter out contended rows in application code",
                    ));
                }
                sql.push_str(" SKIP LOCKED");
            }
        }
        Ok(sql)
    }
}

/// Soft-delete visibility of a select build.
///
/// Only takes effect when the target table declares a soft-delete column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrashedScope {
    /// Exclude soft-deleted rows (`deleted_at IS NULL`).
    #[default]
    Default,
    /// No soft-delete filter.
    WithTrashed,
    /// Only soft-deleted rows (`deleted_at IS NOT NULL`).
    OnlyTrashed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use suprim_core::SqlType;

    #[test]
    fn order_spec_renders_direction_and_nulls() {
        let dialect = SqlDialect::postgres();
        let mut binding = Binding::Inline;
        let spec = OrderSpec::desc(Expr::name("created_at", SqlType::Timestamp)).nulls_last();
        assert_eq!(
            spec.render(&dialect, &mut binding).unwrap(),
            "\"created_at\" DESC NULLS LAST"
        );
    }

    #[test]
    fn nowait_requires_capability() {
        let lock = RowLock {
            mode: LockMode::Update,
            wait: LockWait::Nowait,
        };
        assert_eq!(
            lock.render(&SqlDialect::postgres()).unwrap(),
            " FOR UPDATE NOWAIT"
        );
        let err = lock.render(&SqlDialect::sqlite()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
    }

    #[test]
    fn skip_locked_requires_capability() {
        let lock = RowLock {
            mode: LockMode::Share,
            wait: LockWait::SkipLocked,
        };
        assert_eq!(
            lock.render(&SqlDialect::mysql()).unwrap(),
            " FOR SHARE SKIP LOCKED"
        );
        assert!(lock.render(&SqlDialect::sqlite()).is_err());
    }
}

//! JOIN clause types.

use crate::dialect::SqlDialect;
use crate::params::Binding;
use crate::predicate::Predicate;
use suprim_core::{Result, Table};

/// Types of SQL joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// A JOIN clause.
#[derive(Debug, Clone)]
pub struct Join {
    pub join_type: JoinType,
    pub table: Table,
    /// ON condition; absent for CROSS joins.
    pub on: Option<Predicate>,
}

impl Join {
    pub fn inner(table: Table, on: Predicate) -> Self {
        Self {
            join_type: JoinType::Inner,
            table,
            on: Some(on),
        }
    }

    pub fn left(table: Table, on: Predicate) -> Self {
        Self {
            join_type: JoinType::Left,
            table,
            on: Some(on),
        }
    }

    pub fn right(table: Table, on: Predicate) -> Self {
        Self {
            join_type: JoinType::Right,
            table,
            on: Some(on),
        }
    }

    pub fn cross(table: Table) -> Self {
        Self {
            join_type: JoinType::Cross,
            table,
            on: None,
        }
    }

    pub(crate) fn render(&self, dialect: &SqlDialect, binding: &mut Binding<'_>) -> Result<String> {
        let mut sql = format!(" {} {}", self.join_type.as_str(), dialect.table_sql(&self.table));
        if let Some(on) = &self.on {
            sql.push_str(" ON ");
            sql.push_str(&on.render(dialect, binding)?);
        }
        Ok(sql)
    }
}

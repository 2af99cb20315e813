//! Set operations for combining SELECT results.

/// Type of set operation between two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpType {
    /// UNION - combines results, removes duplicates
    Union,
    /// UNION ALL - combines results, keeps duplicates
    UnionAll,
    /// INTERSECT - returns common rows, removes duplicates
    Intersect,
    /// INTERSECT ALL - returns common rows, keeps duplicates
    IntersectAll,
    /// EXCEPT - returns rows in first query not in second, removes duplicates
    Except,
    /// EXCEPT ALL - returns rows in first query not in second, keeps duplicates
    ExceptAll,
}

impl SetOpType {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SetOpType::Union => "UNION",
            SetOpType::UnionAll => "UNION ALL",
            SetOpType::Intersect => "INTERSECT",
            SetOpType::IntersectAll => "INTERSECT ALL",
            SetOpType::Except => "EXCEPT",
            SetOpType::ExceptAll => "EXCEPT ALL",
        }
    }
}

//! Eager-load specifications and dot-notation path resolution.

use crate::predicate::Predicate;
use suprim_core::{EntityGraph, Error, PathError, PathErrorKind, Relation, Result};

/// A recursive specification of which relations to load alongside a query,
/// with an optional per-level constraint on the related rows.
#[derive(Debug, Clone)]
pub struct EagerLoadSpec {
    /// The relation's field name on its owner entity.
    pub name: String,
    pub relation: Relation,
    pub constraint: Option<Predicate>,
    pub nested: Vec<EagerLoadSpec>,
}

impl EagerLoadSpec {
    pub fn new(name: impl Into<String>, relation: Relation) -> Self {
        Self {
            name: name.into(),
            relation,
            constraint: None,
            nested: Vec::new(),
        }
    }

    /// Constrain the related rows fetched at this level.
    pub fn constrain(mut self, predicate: Predicate) -> Self {
        self.constraint = Some(predicate);
        self
    }

    /// Attach a nested spec, merging with an existing child of the same
    /// relation name.
    pub fn nest(mut self, child: EagerLoadSpec) -> Self {
        merge_spec(&mut self.nested, child);
        self
    }

    /// The deepest spec of a single-child chain.
    pub fn leaf(&self) -> &EagerLoadSpec {
        match self.nested.as_slice() {
            [only] => only.leaf(),
            _ => self,
        }
    }
}

/// Merge `spec` into `list`: specs sharing a relation name are combined
/// (children merged recursively, first constraint wins), others appended.
pub(crate) fn merge_spec(list: &mut Vec<EagerLoadSpec>, spec: EagerLoadSpec) {
    match list.iter_mut().find(|existing| existing.name == spec.name) {
        Some(existing) => {
            if existing.constraint.is_none() {
                existing.constraint = spec.constraint;
            }
            for child in spec.nested {
                merge_spec(&mut existing.nested, child);
            }
        }
        None => list.push(spec),
    }
}

/// Resolves dot-notation paths (`"posts.comments.author"`) into nested
/// [`EagerLoadSpec`] chains against an [`EntityGraph`].
#[derive(Debug)]
pub struct PathResolver<'g, G: EntityGraph + ?Sized> {
    graph: &'g G,
}

impl<'g, G: EntityGraph + ?Sized> PathResolver<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self { graph }
    }

    /// Resolve a path rooted at `entity` into a single-child spec chain.
    ///
    /// Each segment is looked up against the current entity type; the entity
    /// then advances to the relation's related type before the next segment
    /// is resolved. Unknown relation names are hard errors identifying the
    /// segment and the entity.
    pub fn resolve(&self, entity: &str, path: &str) -> Result<EagerLoadSpec> {
        self.resolve_with(entity, path, None)
    }

    /// Like [`resolve`](Self::resolve), attaching a constraint to the
    /// deepest spec of the chain.
    pub fn resolve_with(
        &self,
        entity: &str,
        path: &str,
        constraint: Option<Predicate>,
    ) -> Result<EagerLoadSpec> {
        let segments: Vec<&str> = path.trim().split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::Path(PathError {
                kind: PathErrorKind::EmptyPath,
                segment: String::new(),
                entity: entity.to_string(),
            }));
        }

        let mut current = entity.to_string();
        let mut chain: Vec<(String, Relation)> = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let relation = self.graph.relation(&current, segment).ok_or_else(|| {
                Error::Path(PathError {
                    kind: PathErrorKind::UnknownRelation,
                    segment: (*segment).to_string(),
                    entity: current.clone(),
                })
            })?;
            if i + 1 < segments.len() {
                current = relation
                    .related_entity()
                    .ok_or_else(|| {
                        Error::Path(PathError {
                            kind: PathErrorKind::MissingEntity,
                            segment: (*segment).to_string(),
                            entity: current.clone(),
                        })
                    })?
                    .to_string();
            }
            chain.push(((*segment).to_string(), relation));
        }

        // Build the chain right-to-left so the constraint lands on the leaf.
        let Some((leaf_name, leaf_relation)) = chain.pop() else {
            return Err(Error::Path(PathError {
                kind: PathErrorKind::EmptyPath,
                segment: String::new(),
                entity: entity.to_string(),
            }));
        };
        let mut spec = EagerLoadSpec::new(leaf_name, leaf_relation);
        spec.constraint = constraint;
        for (name, relation) in chain.into_iter().rev() {
            let mut node = EagerLoadSpec::new(name, relation);
            node.nested.push(spec);
            spec = node;
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::predicate::CompareOp;
    use suprim_core::{MapGraph, SqlType, Table};

    fn graph() -> MapGraph {
        let mut graph = MapGraph::new();
        graph.register_relation(
            "User",
            "posts",
            Relation::has_many(Table::new("posts").entity("Post"), "user_id", "id"),
        );
        graph.register_relation(
            "Post",
            "comments",
            Relation::has_many(Table::new("comments").entity("Comment"), "post_id", "id"),
        );
        graph.register_relation(
            "Comment",
            "author",
            Relation::belongs_to(Table::new("users").entity("User"), "author_id", "id"),
        );
        graph
    }

    fn published() -> Predicate {
        Predicate::compare(
            Expr::name("published", SqlType::Boolean),
            CompareOp::Eq,
            Expr::lit(true),
        )
    }

    #[test]
    fn three_level_path_resolves_to_chain() {
        let graph = graph();
        let spec = PathResolver::new(&graph)
            .resolve("User", "posts.comments.author")
            .unwrap();

        assert_eq!(spec.name, "posts");
        assert_eq!(spec.nested.len(), 1);
        assert_eq!(spec.nested[0].name, "comments");
        assert_eq!(spec.nested[0].nested.len(), 1);
        assert_eq!(spec.nested[0].nested[0].name, "author");
        assert!(spec.nested[0].nested[0].nested.is_empty());
    }

    #[test]
    fn constraint_attaches_to_deepest_spec_only() {
        let graph = graph();
        let spec = PathResolver::new(&graph)
            .resolve_with("User", "posts.comments.author", Some(published()))
            .unwrap();

        assert!(spec.constraint.is_none());
        assert!(spec.nested[0].constraint.is_none());
        assert!(spec.nested[0].nested[0].constraint.is_some());
        assert_eq!(spec.leaf().name, "author");
    }

    #[test]
    fn unknown_relation_names_segment_and_entity() {
        let graph = graph();
        let err = PathResolver::new(&graph)
            .resolve("User", "posts.likes")
            .unwrap_err();
        match err {
            Error::Path(inner) => {
                assert_eq!(inner.kind, PathErrorKind::UnknownRelation);
                assert_eq!(inner.segment, "likes");
                assert_eq!(inner.entity, "Post");
            }
            other => panic!("expected path error, got {other}"),
        }
    }

    #[test]
    fn blank_path_is_an_error() {
        let graph = graph();
        for path in ["", "   ", ".", ".."] {
            let err = PathResolver::new(&graph).resolve("User", path).unwrap_err();
            match err {
                Error::Path(inner) => assert_eq!(inner.kind, PathErrorKind::EmptyPath),
                other => panic!("expected path error, got {other}"),
            }
        }
    }

    #[test]
    fn entity_without_related_type_stops_resolution() {
        let mut graph = graph();
        // A relation to a table with no declared entity cannot anchor
        // further segments.
        graph.register_relation(
            "User",
            "raw_logs",
            Relation::has_many(Table::new("logs"), "user_id", "id"),
        );
        let err = PathResolver::new(&graph)
            .resolve("User", "raw_logs.entries")
            .unwrap_err();
        match err {
            Error::Path(inner) => assert_eq!(inner.kind, PathErrorKind::MissingEntity),
            other => panic!("expected path error, got {other}"),
        }
    }

    #[test]
    fn overlapping_paths_merge() {
        let graph = graph();
        let resolver = PathResolver::new(&graph);
        let mut specs = Vec::new();
        merge_spec(
            &mut specs,
            resolver.resolve("User", "posts.comments").unwrap(),
        );
        merge_spec(
            &mut specs,
            resolver.resolve("User", "posts.comments.author").unwrap(),
        );

        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].nested.len(), 1);
        assert_eq!(specs[0].nested[0].nested.len(), 1);
        assert_eq!(specs[0].nested[0].nested[0].name, "author");
    }
}

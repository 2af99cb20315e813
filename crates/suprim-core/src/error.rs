//! Error types for Suprim operations.

use std::fmt;

/// The primary error type for all Suprim operations.
#[derive(Debug)]
pub enum Error {
    /// A dialect lacks a capability the AST requires (FILTER, NOWAIT,
    /// SKIP LOCKED, arrays, JSONB containment).
    UnsupportedFeature(UnsupportedFeatureError),
    /// Dot-notation or relation-name resolution failed.
    Path(PathError),
    /// A statement builder is missing required clauses.
    Builder(BuilderError),
    /// Relation population could not assign a matched value onto a parent
    /// field in strict mode.
    Mapping(MappingError),
    /// Custom error with message.
    Custom(String),
}

/// A capability the target dialect does not advertise.
///
/// Raised at render time, never at composition time, so a builder can be
/// freely reconfigured before `build()`.
#[derive(Debug, Clone)]
pub struct UnsupportedFeatureError {
    /// Name of the missing feature (e.g. `"FILTER clause"`).
    pub feature: &'static str,
    /// Name of the dialect that lacks it.
    pub dialect: String,
    /// Suggested workaround.
    pub hint: String,
}

#[derive(Debug, Clone)]
pub struct PathError {
    pub kind: PathErrorKind,
    /// The offending path segment (empty for blank-path errors).
    pub segment: String,
    /// The entity type the segment was resolved against.
    pub entity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathErrorKind {
    /// The relation name does not exist on the entity.
    UnknownRelation,
    /// The path was empty or contained only separators.
    EmptyPath,
    /// A segment resolved to a relation whose related entity is unknown,
    /// so the next segment has nothing to resolve against.
    MissingEntity,
}

#[derive(Debug, Clone)]
pub struct BuilderError {
    /// The statement family the builder produces (e.g. `"INSERT"`).
    pub statement: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct MappingError {
    /// The parent entity type.
    pub entity: String,
    /// The relation field that could not be populated.
    pub field: String,
    /// The relation kind involved.
    pub relation: String,
    pub message: String,
}

impl Error {
    /// Shorthand for an unsupported-feature error.
    pub fn unsupported(feature: &'static str, dialect: impl Into<String>, hint: impl Into<String>) -> Self {
        Error::UnsupportedFeature(UnsupportedFeatureError {
            feature,
            dialect: dialect.into(),
            hint: hint.into(),
        })
    }

    /// Shorthand for a builder-state error.
    pub fn builder(statement: &'static str, message: impl Into<String>) -> Self {
        Error::Builder(BuilderError {
            statement,
            message: message.into(),
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedFeature(e) => write!(f, "Unsupported feature: {}", e),
            Error::Path(e) => write!(f, "Invalid path: {}", e),
            Error::Builder(e) => write!(f, "Invalid {} statement: {}", e.statement, e.message),
            Error::Mapping(e) => write!(f, "Mapping error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for UnsupportedFeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not supported by the {} dialect ({})",
            self.feature, self.dialect, self.hint
        )
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PathErrorKind::UnknownRelation => write!(
                f,
                "unknown relation '{}' on entity '{}'",
                self.segment, self.entity
            ),
            PathErrorKind::EmptyPath => write!(f, "eager-load path is empty"),
            PathErrorKind::MissingEntity => write!(
                f,
                "relation '{}' on entity '{}' does not name a related entity",
                self.segment, self.entity
            ),
        }
    }
}

impl fmt::Display for BuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.statement, self.message)
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot populate field '{}' ({} relation) on entity '{}': {}",
            self.field, self.relation, self.entity, self.message
        )
    }
}

impl From<UnsupportedFeatureError> for Error {
    fn from(err: UnsupportedFeatureError) -> Self {
        Error::UnsupportedFeature(err)
    }
}

impl From<PathError> for Error {
    fn from(err: PathError) -> Self {
        Error::Path(err)
    }
}

impl From<BuilderError> for Error {
    fn from(err: BuilderError) -> Self {
        Error::Builder(err)
    }
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Self {
        Error::Mapping(err)
    }
}

/// Result type alias for Suprim operations.
pub type Result<T> = std::result::Result<T, Error>;

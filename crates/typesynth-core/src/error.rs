use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

/// Failures looking up a schema by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("undefined reference: {0}")]
    UndefinedReference(String),

    #[error("referenced schema `{0}` failed to resolve")]
    DependencyFailed(String),
}

/// Failures combining the members of an `allOf` / `oneOf` / `anyOf`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("allOf members disagree on the shape of field `{field}`")]
    FieldConflict { field: String },

    #[error("allOf members disagree on additionalProperties")]
    AdditionalPropertiesConflict,

    #[error("allOf member {member} is not an object and cannot be merged")]
    NonObjectMember { member: String },

    #[error("oneOf/anyOf nested inside allOf (member {member}) is not supported")]
    NestedUnionInIntersection { member: String },

    #[error("allOf member {member} includes itself")]
    CyclicIntersection { member: String },

    #[error("union has no members")]
    EmptyUnion,
}

/// Which array guard tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLimit {
    Depth { depth: usize, max: usize },
    Items { max_items: u64, max: u64 },
}

impl std::fmt::Display for ArrayLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayLimit::Depth { depth, max } => {
                write!(f, "array nesting depth {depth} exceeds the limit of {max}")
            }
            ArrayLimit::Items { max_items, max } => {
                write!(f, "maxItems {max_items} exceeds the limit of {max}")
            }
        }
    }
}

/// A failure that is fatal to the schema (or operation) being synthesized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    #[error("undefined reference `{name}`")]
    UndefinedReference { path: String, name: String },

    #[error("depends on `{dependency}`, which failed")]
    DependencyFailed { path: String, dependency: String },

    #[error("`{name}` is an alias of itself through a reference cycle")]
    CircularAlias { path: String, name: String },

    #[error("{source}")]
    Composition {
        path: String,
        #[source]
        source: CompositionError,
    },

    #[error("{limit}")]
    MaxItemsExceeded { path: String, limit: ArrayLimit },
}

impl SynthError {
    /// Document path where the failure was detected.
    pub fn path(&self) -> &str {
        match self {
            SynthError::UndefinedReference { path, .. }
            | SynthError::DependencyFailed { path, .. }
            | SynthError::CircularAlias { path, .. }
            | SynthError::Composition { path, .. }
            | SynthError::MaxItemsExceeded { path, .. } => path,
        }
    }

    pub(crate) fn from_resolve(path: &str, err: ResolveError) -> Self {
        match err {
            ResolveError::UndefinedReference(name) => SynthError::UndefinedReference {
                path: path.to_string(),
                name,
            },
            ResolveError::DependencyFailed(dependency) => SynthError::DependencyFailed {
                path: path.to_string(),
                dependency,
            },
        }
    }

    pub(crate) fn composition(path: &str, source: CompositionError) -> Self {
        SynthError::Composition {
            path: path.to_string(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::components::Components;
use super::operation::PathItem;

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub version: String,
}

/// Top-level OpenAPI 3.x document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,

    pub info: Info,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

/// Which keyword semantics a document uses for nullability and exclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OasVersion {
    /// `nullable: true`, boolean `exclusiveMinimum`/`exclusiveMaximum`.
    V3_0,
    /// `type: [T, "null"]`, numeric `exclusiveMinimum`/`exclusiveMaximum`. Also used for 3.2.
    V3_1,
}

impl OasVersion {
    /// Derive the version from the document's `openapi` field.
    pub fn from_openapi(version: &str) -> Self {
        if version.starts_with("3.0") {
            OasVersion::V3_0
        } else {
            OasVersion::V3_1
        }
    }
}

impl OpenApiSpec {
    pub fn version(&self) -> OasVersion {
        OasVersion::from_openapi(&self.openapi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_detection() {
        assert_eq!(OasVersion::from_openapi("3.0.3"), OasVersion::V3_0);
        assert_eq!(OasVersion::from_openapi("3.1.0"), OasVersion::V3_1);
        assert_eq!(OasVersion::from_openapi("3.2.0"), OasVersion::V3_1);
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ComponentRef;
use super::media_type::{MediaType, preferred_media};
use super::schema::SchemaOrRef;
use crate::diagnostics::escape_pointer;

/// Where a parameter travels. Together with the name it identifies the parameter
/// when operation-level entries override path-level ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

/// A parameter. Serialization details (`style`, `explode`) do not affect its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    /// The alternative to `schema` for complex parameters; holds one entry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

impl Parameter {
    /// The schema that types this parameter and its pointer relative to the
    /// parameter, read from `schema` or else from the `content` entry.
    pub fn typed_schema(&self) -> Option<(String, &SchemaOrRef)> {
        if let Some(ref schema) = self.schema {
            return Some(("schema".to_string(), schema));
        }
        let (content_type, media) = preferred_media(&self.content)?;
        let schema = media.schema.as_ref()?;
        Some((format!("content/{}/schema", escape_pointer(content_type)), schema))
    }
}

/// An inline parameter or a `$ref` into `#/components/parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(Parameter),
}

impl ComponentRef for ParameterOrRef {
    type Target = Parameter;
    const SECTION: &'static str = "parameters";

    fn split(&self) -> Result<&Parameter, &str> {
        match self {
            Self::Parameter(param) => Ok(param),
            Self::Ref { ref_path } => Err(ref_path),
        }
    }
}

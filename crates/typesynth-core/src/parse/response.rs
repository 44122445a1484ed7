use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ComponentRef;
use super::media_type::{MediaType, preferred_media};

/// A response. Headers and links never reach a declaration and are not read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Required by OpenAPI, but a missing one is tolerated as empty.
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

impl Response {
    /// The media entry the response type is synthesized from, if any.
    /// `None` means the response carries no body (e.g. a 204).
    pub fn media(&self) -> Option<(&String, &MediaType)> {
        preferred_media(&self.content)
    }
}

/// Whether a status key (`200`, `2XX`, `default`) denotes success.
pub fn is_success_status(status: &str) -> bool {
    status.starts_with('2')
}

/// An inline response or a `$ref` into `#/components/responses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Response(Response),
}

impl ComponentRef for ResponseOrRef {
    type Target = Response;
    const SECTION: &'static str = "responses";

    fn split(&self) -> Result<&Response, &str> {
        match self {
            Self::Response(response) => Ok(response),
            Self::Ref { ref_path } => Err(ref_path),
        }
    }
}

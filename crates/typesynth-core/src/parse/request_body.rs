use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ComponentRef;
use super::media_type::{MediaType, preferred_media};

/// A request body. One media entry becomes the operation's body binding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    /// Carried onto the binding as-is; the body's type stays non-null.
    #[serde(default)]
    pub required: bool,
}

impl RequestBody {
    /// The media entry the body type is synthesized from.
    pub fn media(&self) -> Option<(&String, &MediaType)> {
        preferred_media(&self.content)
    }
}

/// An inline request body or a `$ref` into `#/components/requestBodies`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBodyOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    RequestBody(RequestBody),
}

impl ComponentRef for RequestBodyOrRef {
    type Target = RequestBody;
    const SECTION: &'static str = "requestBodies";

    fn split(&self) -> Result<&RequestBody, &str> {
        match self {
            Self::RequestBody(body) => Ok(body),
            Self::Ref { ref_path } => Err(ref_path),
        }
    }
}

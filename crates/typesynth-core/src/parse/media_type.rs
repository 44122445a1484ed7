use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::SchemaOrRef;

/// A media type object. Only the schema matters for type synthesis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,
}

/// Prefer `application/json`, then any `+json` type, then the first entry.
pub fn preferred_media(content: &IndexMap<String, MediaType>) -> Option<(&String, &MediaType)> {
    content
        .get_key_value("application/json")
        .or_else(|| content.iter().find(|(k, _)| k.ends_with("+json")))
        .or_else(|| content.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(types: &[&str]) -> IndexMap<String, MediaType> {
        types
            .iter()
            .map(|t| (t.to_string(), MediaType::default()))
            .collect()
    }

    #[test]
    fn test_json_is_preferred() {
        let map0 = content(&["text/xml", "application/hal+json", "application/json"]);
        let picked = preferred_media(&map0);
        assert_eq!(picked.unwrap().0, "application/json");

        let map1 = content(&["text/xml", "application/hal+json"]);
        let picked = preferred_media(&map1);
        assert_eq!(picked.unwrap().0, "application/hal+json");

        let map2 = content(&["text/xml", "text/csv"]);
        let picked = preferred_media(&map2);
        assert_eq!(picked.unwrap().0, "text/xml");

        assert!(preferred_media(&IndexMap::new()).is_none());
    }
}

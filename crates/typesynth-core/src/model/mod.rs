//! The normalized schema model: one [`SchemaNode`] per `components.schemas` entry.

pub mod constraints;
pub mod lower;
pub mod node;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, escape_pointer};
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::{OasVersion, OpenApiSpec};

pub use lower::{Lowerer, schema_ref_name};
pub use node::*;

/// All component schemas of one document, lowered and keyed by name.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    version: OasVersion,
    schemas: IndexMap<String, SchemaNode>,
}

impl SchemaModel {
    /// Lower every `components.schemas` entry of `spec`.
    pub fn from_spec(spec: &OpenApiSpec) -> (Self, Vec<Diagnostic>) {
        let empty = IndexMap::new();
        let raw = spec
            .components
            .as_ref()
            .map(|c| &c.schemas)
            .unwrap_or(&empty);
        Self::from_schemas(spec.version(), raw)
    }

    pub fn from_schemas(
        version: OasVersion,
        raw: &IndexMap<String, SchemaOrRef>,
    ) -> (Self, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let mut lowerer = Lowerer::new(version, &mut diagnostics);
        let schemas = raw
            .iter()
            .map(|(name, schema)| (name.clone(), lowerer.lower(schema, &Self::pointer(name))))
            .collect();
        (Self { version, schemas }, diagnostics)
    }

    /// JSON pointer of a component schema.
    pub fn pointer(name: &str) -> String {
        format!("#/components/schemas/{}", escape_pointer(name))
    }

    pub fn version(&self) -> OasVersion {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Schema names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.schemas.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

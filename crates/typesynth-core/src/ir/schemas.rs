use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{CompositionKind, PrimitiveBase};

use super::types::{NormalizedName, TypeExpr};

/// A named type produced by synthesis. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub shape: DeclShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    pub origin: DeclOrigin,
}

impl TypeDeclaration {
    /// Names of every other declaration this one mentions.
    pub fn referenced_names(&self) -> Vec<&str> {
        self.shape.referenced_names()
    }
}

/// Where a declaration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclOrigin {
    /// A `components.schemas` entry, by original name.
    Component(String),
    /// An inline schema promoted to a named type, by document path.
    Inline(String),
}

/// The fully flattened shape of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DeclShape {
    Record(RecordShape),
    Enum(EnumShape),
    Union(UnionShape),
    Alias(TypeExpr),
}

impl DeclShape {
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            DeclShape::Record(record) => {
                for field in &record.fields {
                    field.ty.collect_names(&mut out);
                }
                if let Some(ref additional) = record.additional {
                    additional.collect_names(&mut out);
                }
            }
            DeclShape::Enum(_) => {}
            DeclShape::Union(union) => {
                out.extend(union.members.iter().map(String::as_str));
                if let Some(ref d) = union.discriminator {
                    out.extend(d.mapping.values().map(String::as_str));
                }
            }
            DeclShape::Alias(target) => target.collect_names(&mut out),
        }
        out
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            DeclShape::Record(_) => "record",
            DeclShape::Enum(_) => "enum",
            DeclShape::Union(_) => "union",
            DeclShape::Alias(_) => "alias",
        }
    }
}

/// An object type with ordered fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RecordShape {
    pub fields: Vec<RecordField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<TypeExpr>,
}

impl RecordShape {
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name.original == name)
    }
}

/// A field on a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordField {
    pub name: NormalizedName,
    pub ty: TypeExpr,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
}

/// A closed set of literal values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumShape {
    pub base: PrimitiveBase,
    pub values: Vec<serde_json::Value>,
}

/// A choice between named types (oneOf / anyOf).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionShape {
    pub kind: CompositionKind,
    /// Member type names in declaration order, without duplicates.
    pub members: Vec<String>,
    /// The union also admits null.
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<UnionDiscriminator>,
}

/// Discriminator of a union with mapping values as emitted type names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionDiscriminator {
    pub property_name: String,
    pub mapping: IndexMap<String, String>,
}

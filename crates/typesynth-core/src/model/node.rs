use indexmap::IndexMap;
use serde::Serialize;

/// Scalar base types a primitive or enum schema can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveBase {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveBase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveBase::String => "string",
            PrimitiveBase::Integer => "integer",
            PrimitiveBase::Number => "number",
            PrimitiveBase::Boolean => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveBase::Integer | PrimitiveBase::Number)
    }
}

/// `allOf`, `oneOf` or `anyOf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    AllOf,
    OneOf,
    AnyOf,
}

impl CompositionKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CompositionKind::AllOf => "allOf",
            CompositionKind::OneOf => "oneOf",
            CompositionKind::AnyOf => "anyOf",
        }
    }

    pub fn is_union(&self) -> bool {
        !matches!(self, CompositionKind::AllOf)
    }
}

/// A numeric bound. `bound: 0.0` is a real bound, never "absent".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bound {
    pub bound: f64,
    pub exclusive: bool,
}

impl Bound {
    pub fn inclusive(bound: f64) -> Self {
        Self {
            bound,
            exclusive: false,
        }
    }

    pub fn exclusive(bound: f64) -> Self {
        Self {
            bound,
            exclusive: true,
        }
    }
}

/// Validation metadata attached to a schema node.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    pub fn has_numeric(&self) -> bool {
        self.minimum.is_some() || self.maximum.is_some() || self.multiple_of.is_some()
    }

    pub fn has_string(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some() || self.pattern.is_some()
    }

    pub fn has_array(&self) -> bool {
        self.min_items.is_some() || self.max_items.is_some() || self.unique_items
    }

    /// Keep only the constraints that apply to `target`.
    pub fn restricted_to(&self, target: ConstraintTarget) -> Constraints {
        let mut out = Constraints::default();
        if target.numeric {
            out.minimum = self.minimum;
            out.maximum = self.maximum;
            out.multiple_of = self.multiple_of;
        }
        if target.string {
            out.min_length = self.min_length;
            out.max_length = self.max_length;
            out.pattern = self.pattern.clone();
        }
        if target.array {
            out.min_items = self.min_items;
            out.max_items = self.max_items;
            out.unique_items = self.unique_items;
        }
        out
    }
}

/// The constraint families a schema kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstraintTarget {
    pub numeric: bool,
    pub string: bool,
    pub array: bool,
}

impl ConstraintTarget {
    pub const NONE: Self = Self {
        numeric: false,
        string: false,
        array: false,
    };
    pub const NUMERIC: Self = Self {
        numeric: true,
        string: false,
        array: false,
    };
    pub const STRING: Self = Self {
        numeric: false,
        string: true,
        array: false,
    };
    pub const ARRAY: Self = Self {
        numeric: false,
        string: false,
        array: true,
    };

    pub fn union(self, other: Self) -> Self {
        Self {
            numeric: self.numeric || other.numeric,
            string: self.string || other.string,
            array: self.array || other.array,
        }
    }

    pub fn for_base(base: PrimitiveBase) -> Self {
        match base {
            PrimitiveBase::String => Self::STRING,
            PrimitiveBase::Integer | PrimitiveBase::Number => Self::NUMERIC,
            PrimitiveBase::Boolean => Self::NONE,
        }
    }

    pub fn for_kind(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Primitive { base, .. } | NodeKind::Enum { base, .. } => Self::for_base(*base),
            NodeKind::Array { .. } => Self::ARRAY,
            _ => Self::NONE,
        }
    }
}

/// A child schema: either still inline or a resolved pointer to a named type.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaRef {
    Inline(Box<SchemaNode>),
    Named(String),
}

impl SchemaRef {
    pub fn inline(node: SchemaNode) -> Self {
        SchemaRef::Inline(Box::new(node))
    }
}

/// An object property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub schema: SchemaRef,
    pub required: bool,
}

/// Discriminator of a union, with mapping targets as schema names.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorSpec {
    pub property_name: String,
    pub mapping: IndexMap<String, String>,
}

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Primitive {
        base: PrimitiveBase,
        format: Option<String>,
    },
    Enum {
        base: PrimitiveBase,
        values: Vec<serde_json::Value>,
    },
    /// Item-count bounds are carried in the node's constraints.
    Array {
        items: SchemaRef,
    },
    Map {
        value: SchemaRef,
    },
    Object {
        properties: IndexMap<String, Property>,
        additional: Option<SchemaRef>,
    },
    Composed {
        kind: CompositionKind,
        members: Vec<SchemaRef>,
        discriminator: Option<DiscriminatorSpec>,
    },
    Reference {
        target_name: String,
    },
    /// No type information at all (`{}`).
    Any,
    /// `type: "null"`.
    Null,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Primitive { base, .. } => base.as_str(),
            NodeKind::Enum { .. } => "enum",
            NodeKind::Array { .. } => "array",
            NodeKind::Map { .. } => "map",
            NodeKind::Object { .. } => "object",
            NodeKind::Composed { kind, .. } => kind.keyword(),
            NodeKind::Reference { .. } => "reference",
            NodeKind::Any => "untyped",
            NodeKind::Null => "null",
        }
    }
}

/// One normalized OpenAPI schema node. Built once per document and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub nullable: bool,
    pub constraints: Constraints,
    /// Names listed in `required` that no own property declares. Only an
    /// `allOf` member gives them meaning.
    pub required: Vec<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub deprecated: bool,
    pub read_only: bool,
    pub write_only: bool,
}

impl SchemaNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            nullable: false,
            constraints: Constraints::default(),
            required: Vec::new(),
            description: None,
            title: None,
            deprecated: false,
            read_only: false,
            write_only: false,
        }
    }

    pub fn any() -> Self {
        Self::new(NodeKind::Any)
    }

    pub fn reference(target_name: impl Into<String>) -> Self {
        Self::new(NodeKind::Reference {
            target_name: target_name.into(),
        })
    }

    /// A `{ required: [...] }` schema: no type information beyond required names.
    pub fn is_required_only(&self) -> bool {
        self.kind == NodeKind::Any && self.constraints.is_empty() && !self.required.is_empty()
    }

    /// Whether the node is an object with neither properties nor additional properties.
    pub fn is_empty_object(&self) -> bool {
        matches!(&self.kind, NodeKind::Object { properties, additional: None } if properties.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restricted_to_keeps_only_matching_family() {
        let c = Constraints {
            minimum: Some(Bound::inclusive(0.0)),
            pattern: Some("^a".to_string()),
            min_items: Some(1),
            ..Default::default()
        };
        let numeric = c.restricted_to(ConstraintTarget::NUMERIC);
        assert_eq!(numeric.minimum, Some(Bound::inclusive(0.0)));
        assert!(numeric.pattern.is_none());
        assert!(numeric.min_items.is_none());
        assert!(c.restricted_to(ConstraintTarget::NONE).is_empty());
    }

    #[test]
    fn target_for_kinds() {
        let s = NodeKind::Primitive {
            base: PrimitiveBase::String,
            format: None,
        };
        assert_eq!(ConstraintTarget::for_kind(&s), ConstraintTarget::STRING);
        assert_eq!(ConstraintTarget::for_kind(&NodeKind::Any), ConstraintTarget::NONE);
        assert_eq!(
            ConstraintTarget::NUMERIC.union(ConstraintTarget::STRING),
            ConstraintTarget {
                numeric: true,
                string: true,
                array: false
            }
        );
    }
}

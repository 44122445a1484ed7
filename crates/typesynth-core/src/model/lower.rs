use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, DiagnosticCode, escape_pointer, unescape_pointer};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};
use crate::parse::spec::OasVersion;

use super::constraints::normalize;
use super::node::{
    CompositionKind, ConstraintTarget, Constraints, DiscriminatorSpec, NodeKind, PrimitiveBase,
    Property, SchemaNode, SchemaRef,
};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Extract the schema name from a local `#/components/schemas/<name>` reference.
pub fn schema_ref_name(ref_path: &str) -> Option<String> {
    let token = ref_path.strip_prefix(SCHEMA_REF_PREFIX)?;
    if token.is_empty() || token.contains('/') {
        return None;
    }
    Some(unescape_pointer(token))
}

/// Converts raw document schemas into [`SchemaNode`]s, collecting diagnostics.
pub struct Lowerer<'d> {
    version: OasVersion,
    diagnostics: &'d mut Vec<Diagnostic>,
}

impl<'d> Lowerer<'d> {
    pub fn new(version: OasVersion, diagnostics: &'d mut Vec<Diagnostic>) -> Self {
        Self {
            version,
            diagnostics,
        }
    }

    pub fn lower(&mut self, raw: &SchemaOrRef, path: &str) -> SchemaNode {
        match raw {
            // Anything other than a local schema reference stays as the raw
            // path and fails later as an undefined reference.
            SchemaOrRef::Ref { ref_path } => SchemaNode::reference(
                schema_ref_name(ref_path).unwrap_or_else(|| ref_path.clone()),
            ),
            SchemaOrRef::Schema(schema) => self.lower_schema(schema, path),
        }
    }

    fn lower_ref(&mut self, raw: &SchemaOrRef, path: &str) -> SchemaRef {
        SchemaRef::inline(self.lower(raw, path))
    }

    fn lower_schema(&mut self, schema: &Schema, path: &str) -> SchemaNode {
        let (kind, null_enum_value) = self.lower_kind(schema, path);

        let target = match &schema.schema_type {
            // Multi-type schemas spread their constraints over the anyOf
            // members, so the outer node only validates the union of targets.
            Some(types) if types.non_null().len() > 1 => types
                .non_null()
                .into_iter()
                .map(target_for_type)
                .fold(ConstraintTarget::NONE, ConstraintTarget::union),
            _ => ConstraintTarget::for_kind(&kind),
        };
        let attrs = normalize(schema, target, self.version, path);
        self.diagnostics.extend(attrs.diagnostics);

        let constraints = match &kind {
            NodeKind::Composed { .. } => Constraints::default(),
            _ => attrs.constraints,
        };

        let required = match &kind {
            NodeKind::Any | NodeKind::Object { .. } => undeclared_required(schema),
            _ => Vec::new(),
        };

        SchemaNode {
            kind,
            nullable: attrs.nullable || null_enum_value,
            constraints,
            required,
            description: schema.description.clone(),
            title: schema.title.clone(),
            deprecated: schema.deprecated.unwrap_or(false),
            read_only: schema.read_only.unwrap_or(false),
            write_only: schema.write_only.unwrap_or(false),
        }
    }

    /// Returns the node kind and whether an enum listed `null` among its values.
    fn lower_kind(&mut self, schema: &Schema, path: &str) -> (NodeKind, bool) {
        if !schema.all_of.is_empty() {
            return (self.lower_all_of(schema, path), false);
        }
        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            return (self.lower_union(schema, path), false);
        }
        if !schema.enum_values.is_empty() || schema.const_value.is_some() {
            return self.lower_enum(schema, path);
        }

        match &schema.schema_type {
            Some(types) => {
                let non_null = types.non_null();
                match non_null.as_slice() {
                    [] => (NodeKind::Null, false),
                    [single] => (self.lower_single(*single, schema, path), false),
                    _ => (self.lower_multi_type(&non_null, schema, path), false),
                }
            }
            None if !schema.properties.is_empty() || schema.additional_properties.is_some() => {
                (self.lower_object(schema, path), false)
            }
            None if schema.items.is_some() => (self.lower_array(schema, path), false),
            None => (NodeKind::Any, false),
        }
    }

    fn lower_single(&mut self, t: SchemaType, schema: &Schema, path: &str) -> NodeKind {
        match t {
            SchemaType::String => primitive(PrimitiveBase::String, schema),
            SchemaType::Integer => primitive(PrimitiveBase::Integer, schema),
            SchemaType::Number => primitive(PrimitiveBase::Number, schema),
            SchemaType::Boolean => primitive(PrimitiveBase::Boolean, schema),
            SchemaType::Array => self.lower_array(schema, path),
            SchemaType::Object => self.lower_object(schema, path),
            SchemaType::Null => NodeKind::Null,
        }
    }

    /// `type: [string, integer]` becomes an anyOf of single-type members.
    fn lower_multi_type(&mut self, types: &[SchemaType], schema: &Schema, path: &str) -> NodeKind {
        let every = ConstraintTarget {
            numeric: true,
            string: true,
            array: true,
        };
        // Diagnostics were already reported against the outer node.
        let whole = normalize(schema, every, self.version, path).constraints;

        let members = types
            .iter()
            .map(|t| {
                let kind = self.lower_single(*t, schema, path);
                let mut node = SchemaNode::new(kind);
                node.constraints = whole.restricted_to(target_for_type(*t));
                SchemaRef::inline(node)
            })
            .collect();
        NodeKind::Composed {
            kind: CompositionKind::AnyOf,
            members,
            discriminator: None,
        }
    }

    fn lower_array(&mut self, schema: &Schema, path: &str) -> NodeKind {
        let items = match &schema.items {
            Some(items) => self.lower_ref(items, &format!("{path}/items")),
            None => SchemaRef::inline(SchemaNode::any()),
        };
        NodeKind::Array { items }
    }

    fn lower_object(&mut self, schema: &Schema, path: &str) -> NodeKind {
        let additional_path = format!("{path}/additionalProperties");
        if schema.properties.is_empty() {
            return match &schema.additional_properties {
                Some(AdditionalProperties::Schema(value)) => NodeKind::Map {
                    value: self.lower_ref(value, &additional_path),
                },
                Some(AdditionalProperties::Bool(true)) => NodeKind::Map {
                    value: SchemaRef::inline(SchemaNode::any()),
                },
                Some(AdditionalProperties::Bool(false)) | None => NodeKind::Object {
                    properties: IndexMap::new(),
                    additional: None,
                },
            };
        }

        let properties = schema
            .properties
            .iter()
            .map(|(name, prop)| {
                let prop_path = format!("{path}/properties/{}", escape_pointer(name));
                let property = Property {
                    schema: self.lower_ref(prop, &prop_path),
                    required: schema.required.contains(name),
                };
                (name.clone(), property)
            })
            .collect();

        let additional = match &schema.additional_properties {
            Some(AdditionalProperties::Schema(value)) => Some(self.lower_ref(value, &additional_path)),
            Some(AdditionalProperties::Bool(true)) => Some(SchemaRef::inline(SchemaNode::any())),
            Some(AdditionalProperties::Bool(false)) | None => None,
        };

        NodeKind::Object {
            properties,
            additional,
        }
    }

    fn lower_all_of(&mut self, schema: &Schema, path: &str) -> NodeKind {
        let mut members: Vec<SchemaRef> = schema
            .all_of
            .iter()
            .enumerate()
            .map(|(i, member)| self.lower_ref(member, &format!("{path}/allOf/{i}")))
            .collect();

        // Sibling properties and required names act as one more inline member.
        if !schema.properties.is_empty()
            || schema.additional_properties.is_some()
            || !schema.required.is_empty()
        {
            let local = Schema {
                properties: schema.properties.clone(),
                required: schema.required.clone(),
                additional_properties: schema.additional_properties.clone(),
                ..Default::default()
            };
            let kind = if schema.properties.is_empty() && schema.additional_properties.is_none() {
                NodeKind::Any
            } else {
                self.lower_object(&local, path)
            };
            let mut member = SchemaNode::new(kind);
            member.required = undeclared_required(&local);
            members.push(SchemaRef::inline(member));
        }

        // A sibling oneOf/anyOf becomes a union member, which the merge rejects.
        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            let union = Schema {
                one_of: schema.one_of.clone(),
                any_of: schema.any_of.clone(),
                discriminator: schema.discriminator.clone(),
                ..Default::default()
            };
            members.push(SchemaRef::inline(SchemaNode::new(self.lower_union(&union, path))));
        }

        NodeKind::Composed {
            kind: CompositionKind::AllOf,
            members,
            discriminator: None,
        }
    }

    fn lower_union(&mut self, schema: &Schema, path: &str) -> NodeKind {
        let (kind, raw_members) = if !schema.one_of.is_empty() {
            if !schema.any_of.is_empty() {
                self.diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::IgnoredKeyword,
                    format!("{path}/anyOf"),
                    "`anyOf` next to `oneOf` is ignored",
                ));
            }
            (CompositionKind::OneOf, &schema.one_of)
        } else {
            (CompositionKind::AnyOf, &schema.any_of)
        };

        if !schema.properties.is_empty() {
            self.diagnostics.push(Diagnostic::warning(
                DiagnosticCode::IgnoredKeyword,
                format!("{path}/properties"),
                format!("`properties` next to `{}` are ignored", kind.keyword()),
            ));
        }

        let members = raw_members
            .iter()
            .enumerate()
            .map(|(i, member)| {
                self.lower_ref(member, &format!("{path}/{}/{i}", kind.keyword()))
            })
            .collect();

        let discriminator = schema.discriminator.as_ref().map(|d| DiscriminatorSpec {
            property_name: d.property_name.clone(),
            mapping: d
                .mapping
                .iter()
                .map(|(value, target)| {
                    let name = schema_ref_name(target).unwrap_or_else(|| target.clone());
                    (value.clone(), name)
                })
                .collect(),
        });

        NodeKind::Composed {
            kind,
            members,
            discriminator,
        }
    }

    fn lower_enum(&mut self, schema: &Schema, path: &str) -> (NodeKind, bool) {
        let raw_values: Vec<serde_json::Value> = if schema.enum_values.is_empty() {
            schema.const_value.iter().cloned().collect()
        } else {
            schema.enum_values.clone()
        };
        let has_null = raw_values.iter().any(|v| v.is_null());
        let values: Vec<serde_json::Value> = raw_values.into_iter().filter(|v| !v.is_null()).collect();

        let declared = schema
            .schema_type
            .as_ref()
            .map(TypeSet::non_null)
            .and_then(|types| types.first().copied())
            .and_then(base_for_type);
        let base = declared.or_else(|| values.first().and_then(base_for_value));

        match base {
            Some(base) if !values.is_empty() => (NodeKind::Enum { base, values }, has_null),
            _ if values.is_empty() => (NodeKind::Null, false),
            _ => {
                self.diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::IgnoredKeyword,
                    format!("{path}/enum"),
                    "enum values are not scalars; treating the schema as untyped",
                ));
                (NodeKind::Any, has_null)
            }
        }
    }
}

fn undeclared_required(schema: &Schema) -> Vec<String> {
    schema
        .required
        .iter()
        .filter(|name| !schema.properties.contains_key(*name))
        .cloned()
        .collect()
}

fn primitive(base: PrimitiveBase, schema: &Schema) -> NodeKind {
    NodeKind::Primitive {
        base,
        format: schema.format.clone(),
    }
}

fn base_for_type(t: SchemaType) -> Option<PrimitiveBase> {
    match t {
        SchemaType::String => Some(PrimitiveBase::String),
        SchemaType::Integer => Some(PrimitiveBase::Integer),
        SchemaType::Number => Some(PrimitiveBase::Number),
        SchemaType::Boolean => Some(PrimitiveBase::Boolean),
        SchemaType::Array | SchemaType::Object | SchemaType::Null => None,
    }
}

fn base_for_value(value: &serde_json::Value) -> Option<PrimitiveBase> {
    match value {
        serde_json::Value::String(_) => Some(PrimitiveBase::String),
        serde_json::Value::Bool(_) => Some(PrimitiveBase::Boolean),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => Some(PrimitiveBase::Integer),
        serde_json::Value::Number(_) => Some(PrimitiveBase::Number),
        _ => None,
    }
}

fn target_for_type(t: SchemaType) -> ConstraintTarget {
    match t {
        SchemaType::Array => ConstraintTarget::ARRAY,
        other => base_for_type(other)
            .map(ConstraintTarget::for_base)
            .unwrap_or(ConstraintTarget::NONE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(yaml: &str, version: OasVersion) -> (SchemaNode, Vec<Diagnostic>) {
        let raw: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        let mut diagnostics = Vec::new();
        let node = Lowerer::new(version, &mut diagnostics).lower(&raw, "#/components/schemas/T");
        (node, diagnostics)
    }

    #[test]
    fn ref_name_extraction() {
        assert_eq!(schema_ref_name("#/components/schemas/Pet"), Some("Pet".to_string()));
        assert_eq!(schema_ref_name("#/components/schemas/a~1b"), Some("a/b".to_string()));
        assert_eq!(schema_ref_name("other.yaml#/Pet"), None);
        assert_eq!(schema_ref_name("#/components/schemas/Pet/properties/id"), None);
    }

    #[test]
    fn object_properties_keep_order_and_required() {
        let (node, diags) = lower(
            "type: object\nrequired: [id]\nproperties:\n  id: {type: integer}\n  name: {type: string}\n",
            OasVersion::V3_0,
        );
        assert!(diags.is_empty());
        let NodeKind::Object { properties, additional } = node.kind else {
            panic!("expected object");
        };
        assert!(additional.is_none());
        let names: Vec<_> = properties.keys().cloned().collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(properties["id"].required);
        assert!(!properties["name"].required);
    }

    #[test]
    fn additional_properties_only_is_a_map() {
        let (node, _) = lower(
            "type: object\nadditionalProperties:\n  type: integer\n",
            OasVersion::V3_0,
        );
        assert!(matches!(node.kind, NodeKind::Map { .. }));
    }

    #[test]
    fn multi_type_becomes_any_of_with_split_constraints() {
        let (node, diags) = lower(
            "type: [string, integer, 'null']\nmaxLength: 4\nmaximum: 9\n",
            OasVersion::V3_1,
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert!(node.nullable);
        let NodeKind::Composed { kind, members, .. } = node.kind else {
            panic!("expected anyOf");
        };
        assert_eq!(kind, CompositionKind::AnyOf);
        assert_eq!(members.len(), 2);
        let SchemaRef::Inline(string) = &members[0] else { panic!() };
        assert_eq!(string.constraints.max_length, Some(4));
        assert!(string.constraints.maximum.is_none());
        let SchemaRef::Inline(integer) = &members[1] else { panic!() };
        assert_eq!(integer.constraints.maximum.map(|b| b.bound), Some(9.0));
        assert!(integer.constraints.max_length.is_none());
    }

    #[test]
    fn all_of_with_sibling_properties_adds_member() {
        let (node, _) = lower(
            "allOf:\n  - $ref: '#/components/schemas/Base'\nproperties:\n  extra: {type: string}\n",
            OasVersion::V3_0,
        );
        let NodeKind::Composed { kind, members, .. } = node.kind else {
            panic!("expected allOf");
        };
        assert_eq!(kind, CompositionKind::AllOf);
        assert_eq!(members.len(), 2);
        let SchemaRef::Inline(first) = &members[0] else { panic!() };
        assert_eq!(
            first.kind,
            NodeKind::Reference {
                target_name: "Base".to_string()
            }
        );
    }

    #[test]
    fn enum_with_null_value_is_nullable() {
        let (node, _) = lower("enum: [a, b, null]\n", OasVersion::V3_1);
        assert!(node.nullable);
        let NodeKind::Enum { base, values } = node.kind else {
            panic!("expected enum");
        };
        assert_eq!(base, PrimitiveBase::String);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn const_is_single_value_enum() {
        let (node, _) = lower("const: 3\n", OasVersion::V3_1);
        assert!(matches!(
            node.kind,
            NodeKind::Enum { base: PrimitiveBase::Integer, ref values } if values.len() == 1
        ));
    }

    #[test]
    fn discriminator_mapping_targets_are_names() {
        let (node, _) = lower(
            "oneOf:\n  - $ref: '#/components/schemas/Cat'\ndiscriminator:\n  propertyName: kind\n  mapping:\n    cat: '#/components/schemas/Cat'\n",
            OasVersion::V3_0,
        );
        let NodeKind::Composed { discriminator: Some(d), .. } = node.kind else {
            panic!("expected discriminator");
        };
        assert_eq!(d.property_name, "kind");
        assert_eq!(d.mapping["cat"], "Cat");
    }

    #[test]
    fn undeclared_required_names_stay_on_the_node() {
        let (node, diags) = lower(
            "type: object\nrequired: [id, ghost]\nproperties:\n  id: {type: integer}\n",
            OasVersion::V3_0,
        );
        assert!(diags.is_empty());
        assert_eq!(node.required, ["ghost"]);

        let (node, _) = lower("required: [name]\n", OasVersion::V3_1);
        assert!(node.is_required_only());
    }

    #[test]
    fn all_of_sibling_required_becomes_member() {
        let (node, _) = lower(
            "allOf:\n  - $ref: '#/components/schemas/Base'\nrequired: [name]\n",
            OasVersion::V3_1,
        );
        let NodeKind::Composed { members, .. } = node.kind else {
            panic!("expected allOf");
        };
        assert_eq!(members.len(), 2);
        let SchemaRef::Inline(local) = &members[1] else { panic!() };
        assert!(local.is_required_only());
        assert_eq!(local.required, ["name"]);
    }
}

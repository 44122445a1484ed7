use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::config::SynthConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Severity, escape_pointer};
use crate::error::{ArrayLimit, CompositionError, SynthError};
use crate::ir::{
    DeclOrigin, DeclShape, EnumShape, OperationBinding, RecordField, RecordShape,
    SynthesisOutput, TypeExpr, TypeKind, UnionDiscriminator,
};
use crate::model::{
    CompositionKind, DiscriminatorSpec, NodeKind, Property, SchemaModel, SchemaNode, SchemaRef,
};

use super::composition::{
    AllOfMember, MergeNote, MemberShape, ResolvedComposition, merge_all_of, union_of,
};
use super::name_normalizer::normalize_name;
use super::ref_resolver::{EntryState, Lookup, ReferenceResolver};
use super::registry::TypeRegistry;

/// Naming and location context while walking a schema.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    /// Candidate name for inline types promoted at this position.
    pub name: String,
    /// JSON pointer of the schema being walked.
    pub path: String,
}

impl Scope {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    fn child(&self, name_suffix: &str, path_suffix: &str) -> Self {
        Self {
            name: format!("{}{name_suffix}", self.name),
            path: format!("{}{path_suffix}", self.path),
        }
    }

    fn at(&self, path_suffix: &str) -> Self {
        Self {
            name: self.name.clone(),
            path: format!("{}{path_suffix}", self.path),
        }
    }
}

/// Drives synthesis of every component schema of one document.
///
/// Each schema moves `Pending → Resolving → Registered | Failed`. A failure
/// is recorded as a diagnostic and never aborts the run; schemas that depend
/// on a failed one fail in turn.
pub struct TypeSynthesizer<'a> {
    config: &'a SynthConfig,
    model: &'a SchemaModel,
    resolver: ReferenceResolver<'a>,
    registry: TypeRegistry,
    diagnostics: Vec<Diagnostic>,
    /// Component schemas whose shape is being expanded into an `allOf`.
    expanding: Vec<String>,
}

impl<'a> TypeSynthesizer<'a> {
    /// Reserve a type name for every component schema, in document order.
    pub fn new(model: &'a SchemaModel, config: &'a SynthConfig) -> Self {
        let mut registry = TypeRegistry::new(config);
        let mut resolver = ReferenceResolver::new(model);
        for name in model.names() {
            let emitted = registry.reserve(name);
            resolver.bind_name(name, &emitted);
        }
        Self {
            config,
            model,
            resolver,
            registry,
            diagnostics: Vec::new(),
            expanding: Vec::new(),
        }
    }

    /// Synthesize every component schema in document order.
    pub fn run(&mut self) {
        let model = self.model;
        for name in model.names() {
            self.synthesize_entry(name);
        }
    }

    pub fn state(&self, name: &str) -> EntryState {
        self.resolver.state(name)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Synthesize one component schema if it has not been visited yet.
    pub fn synthesize_entry(&mut self, name: &str) {
        let Ok(node) = self.resolver.node(name) else {
            return;
        };
        if !self.resolver.begin(name) {
            return;
        }
        let emitted = self
            .resolver
            .emitted_name(name)
            .map(str::to_string)
            .unwrap_or_else(|| self.registry.sanitize(name));
        let scope = Scope::new(emitted.clone(), SchemaModel::pointer(name));
        debug!("synthesizing `{name}` as `{emitted}`");

        match self.declare_component(node, &scope) {
            Ok(shape) => {
                debug!("registered `{emitted}` ({})", shape.kind_label());
                self.registry.fill(
                    &emitted,
                    name,
                    shape,
                    node.description.clone(),
                    node.deprecated,
                );
                self.resolver.finish(name, EntryState::Registered);
            }
            Err(err) => {
                warn!("schema `{name}` not emitted: {err}");
                self.diagnostics.push(Diagnostic::from(&err));
                self.resolver.finish(name, EntryState::Failed);
            }
        }
    }

    fn declare_component(&mut self, node: &SchemaNode, scope: &Scope) -> Result<DeclShape, SynthError> {
        let shape = self.declare_shape(node, scope, 0)?;
        // Nullability does not help: `A = B?` and `B = A?` still never reach a type.
        if let DeclShape::Alias(ref target) = shape
            && let Some(name) = target.named_target()
            && let Some(original) = self.resolver.original_name(name)
            && self.resolver.is_visiting(original)
            && self.resolver.node(original).is_ok_and(declares_alias)
        {
            return Err(SynthError::CircularAlias {
                path: scope.path.clone(),
                name: original.to_string(),
            });
        }
        Ok(shape)
    }

    /// Build the declaration shape of a node named by `scope`.
    fn declare_shape(
        &mut self,
        node: &SchemaNode,
        scope: &Scope,
        depth: usize,
    ) -> Result<DeclShape, SynthError> {
        if self.expanding.is_empty() {
            for name in &node.required {
                self.diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::IgnoredKeyword,
                    format!("{}/required", scope.path),
                    format!("required property `{name}` is not defined in `properties`"),
                ));
            }
        }
        match &node.kind {
            NodeKind::Object {
                properties,
                additional,
            } if !node.is_empty_object() => Ok(DeclShape::Record(
                self.record_shape(properties, additional.as_ref(), scope)?,
            )),
            NodeKind::Enum { base, values } => Ok(DeclShape::Enum(EnumShape {
                base: *base,
                values: values.clone(),
            })),
            NodeKind::Composed {
                kind: CompositionKind::AllOf,
                members,
                ..
            } => {
                let mut shape = self.all_of_shape(members, scope, depth)?;
                if let DeclShape::Alias(ref mut target) = shape {
                    target.nullable |= node.nullable;
                }
                Ok(shape)
            }
            NodeKind::Composed {
                kind,
                members,
                discriminator,
            } => self.union_shape(*kind, members, discriminator.as_ref(), node.nullable, scope, depth),
            _ => Ok(DeclShape::Alias(self.type_expr(node, scope, depth)?)),
        }
    }

    fn record_shape(
        &mut self,
        properties: &IndexMap<String, Property>,
        additional: Option<&SchemaRef>,
        scope: &Scope,
    ) -> Result<RecordShape, SynthError> {
        let mut fields = Vec::with_capacity(properties.len());
        for (prop_name, prop) in properties {
            let name = normalize_name(prop_name);
            let prop_scope = scope.child(
                &name.pascal_case,
                &format!("/properties/{}", escape_pointer(prop_name)),
            );
            let ty = self.ref_expr(&prop.schema, &prop_scope, 0)?;
            let (description, deprecated, read_only, write_only) = match &prop.schema {
                SchemaRef::Inline(node) => (
                    node.description.clone(),
                    node.deprecated,
                    node.read_only,
                    node.write_only,
                ),
                SchemaRef::Named(_) => (None, false, false, false),
            };
            fields.push(RecordField {
                name,
                ty,
                required: prop.required,
                description,
                deprecated,
                read_only,
                write_only,
            });
        }

        let additional = match additional {
            Some(value) => Some(self.ref_expr(value, &scope.child("Value", "/additionalProperties"), 0)?),
            None => None,
        };

        Ok(RecordShape { fields, additional })
    }

    fn ref_expr(&mut self, schema: &SchemaRef, scope: &Scope, depth: usize) -> Result<TypeExpr, SynthError> {
        match schema {
            SchemaRef::Inline(node) => self.type_expr(node, scope, depth),
            SchemaRef::Named(name) => Ok(TypeExpr::named(name.clone())),
        }
    }

    /// Resolve an inline node to a type expression, promoting objects, enums
    /// and compositions to named declarations.
    ///
    /// `depth` counts the arrays enclosing this node, through map values,
    /// union members and `allOf` members, up to the nearest named record.
    pub(crate) fn type_expr(
        &mut self,
        node: &SchemaNode,
        scope: &Scope,
        depth: usize,
    ) -> Result<TypeExpr, SynthError> {
        let expr = match &node.kind {
            NodeKind::Primitive { base, format } => TypeExpr {
                kind: TypeKind::Primitive {
                    base: *base,
                    format: format.clone(),
                },
                nullable: node.nullable,
                constraints: node.constraints.clone(),
            },
            NodeKind::Any => TypeExpr::any().with_nullable(node.nullable),
            NodeKind::Null => TypeExpr::new(TypeKind::Null),
            NodeKind::Reference { target_name } => {
                let target = self.reference_expr(target_name, scope)?;
                let nullable = target.nullable || node.nullable;
                target.with_nullable(nullable)
            }
            NodeKind::Array { items } => {
                let depth = depth + 1;
                self.check_array(node, scope, depth)?;
                let items = self.ref_expr(items, &scope.child("Item", "/items"), depth)?;
                TypeExpr {
                    kind: TypeKind::Array {
                        items: Box::new(items),
                    },
                    nullable: node.nullable,
                    constraints: node.constraints.clone(),
                }
            }
            NodeKind::Map { value } => {
                let value = self.ref_expr(value, &scope.child("Value", "/additionalProperties"), depth)?;
                TypeExpr::new(TypeKind::Map {
                    value: Box::new(value),
                })
                .with_nullable(node.nullable)
            }
            NodeKind::Object { .. } if node.is_empty_object() => TypeExpr::new(TypeKind::Map {
                value: Box::new(TypeExpr::any()),
            })
            .with_nullable(node.nullable),
            NodeKind::Object { .. } | NodeKind::Enum { .. } | NodeKind::Composed { .. } => {
                self.promote(node, scope, depth)?
            }
        };
        Ok(expr)
    }

    fn check_array(&self, node: &SchemaNode, scope: &Scope, depth: usize) -> Result<(), SynthError> {
        if depth > self.config.max_array_depth {
            return Err(SynthError::MaxItemsExceeded {
                path: scope.path.clone(),
                limit: ArrayLimit::Depth {
                    depth,
                    max: self.config.max_array_depth,
                },
            });
        }
        if let (Some(max), Some(max_items)) = (self.config.max_items, node.constraints.max_items)
            && max_items > max
        {
            return Err(SynthError::MaxItemsExceeded {
                path: scope.path.clone(),
                limit: ArrayLimit::Items { max_items, max },
            });
        }
        Ok(())
    }

    /// Register an inline object, enum or composition as its own declaration.
    fn promote(&mut self, node: &SchemaNode, scope: &Scope, depth: usize) -> Result<TypeExpr, SynthError> {
        let candidate = node
            .title
            .as_deref()
            .map(|t| normalize_name(t).pascal_case)
            .unwrap_or_else(|| scope.name.clone());
        let named_scope = Scope::new(candidate.clone(), scope.path.clone());

        let shape = self.declare_shape(node, &named_scope, depth)?;
        if let DeclShape::Alias(target) = shape {
            // Compositions that reduce to a single type need no declaration.
            let nullable = target.nullable || node.nullable;
            return Ok(target.with_nullable(nullable));
        }

        let carries_null = matches!(shape, DeclShape::Union(_));
        let name = self.registry.register_declaration(
            &candidate,
            shape,
            node.description.clone(),
            node.deprecated,
            DeclOrigin::Inline(scope.path.clone()),
        );
        trace!("promoted {} to `{name}`", scope.path);
        Ok(TypeExpr::named(name).with_nullable(node.nullable && !carries_null))
    }

    /// A use of a component schema, synthesizing it first when unvisited.
    fn reference_expr(&mut self, target: &str, scope: &Scope) -> Result<TypeExpr, SynthError> {
        let lookup = self
            .resolver
            .resolve(target)
            .map_err(|e| SynthError::from_resolve(&scope.path, e))?;
        let lookup = match lookup {
            Lookup::Unvisited(_) => {
                self.synthesize_entry(target);
                self.resolver
                    .resolve(target)
                    .map_err(|e| SynthError::from_resolve(&scope.path, e))?
            }
            ready => ready,
        };

        let target_node = self
            .resolver
            .node(target)
            .map_err(|e| SynthError::from_resolve(&scope.path, e))?;
        // Records and enums cannot carry nullability on the declaration itself.
        let inherits_null = target_node.nullable
            && matches!(target_node.kind, NodeKind::Object { .. } | NodeKind::Enum { .. });

        match lookup {
            Lookup::Ready(SchemaRef::Named(name)) => {
                Ok(TypeExpr::named(name).with_nullable(inherits_null))
            }
            Lookup::Ready(SchemaRef::Inline(node)) => self.type_expr(&node, scope, 0),
            Lookup::Unvisited(_) => Err(SynthError::DependencyFailed {
                path: scope.path.clone(),
                dependency: target.to_string(),
            }),
        }
    }

    fn union_shape(
        &mut self,
        kind: CompositionKind,
        members: &[SchemaRef],
        discriminator: Option<&DiscriminatorSpec>,
        nullable: bool,
        scope: &Scope,
        depth: usize,
    ) -> Result<DeclShape, SynthError> {
        let mut nullable = nullable;
        let mut names = Vec::with_capacity(members.len());

        for (i, member) in members.iter().enumerate() {
            let member_scope = scope.child(
                &format!("Variant{}", i + 1),
                &format!("/{}/{i}", kind.keyword()),
            );
            match member {
                SchemaRef::Named(name) => names.push(name.clone()),
                SchemaRef::Inline(node) if node.kind == NodeKind::Null => nullable = true,
                SchemaRef::Inline(node) => {
                    let expr = self.type_expr(node, &member_scope, depth)?;
                    nullable |= expr.nullable;
                    names.push(self.name_member(expr, scope, &member_scope));
                }
            }
        }

        let discriminator = match discriminator {
            Some(spec) => Some(self.union_discriminator(spec, scope)?),
            None => None,
        };

        match union_of(kind, names, nullable, discriminator) {
            Ok(ResolvedComposition::Union(union)) => Ok(DeclShape::Union(union)),
            Ok(ResolvedComposition::Alias(target)) => Ok(DeclShape::Alias(target)),
            Ok(ResolvedComposition::Record(record)) => Ok(DeclShape::Record(record)),
            Err(err) => Err(SynthError::composition(&scope.path, err)),
        }
    }

    /// Name of a union member, registering an alias for unnamed types.
    fn name_member(&mut self, expr: TypeExpr, parent: &Scope, member: &Scope) -> String {
        let candidate = match &expr.kind {
            TypeKind::Named { name } => return name.clone(),
            TypeKind::Array { items } => {
                let item_name = match &items.kind {
                    TypeKind::Named { name } => name.clone(),
                    TypeKind::Primitive { base, .. } => normalize_name(base.as_str()).pascal_case,
                    _ => format!("{}Item", parent.name),
                };
                self.registry.array_name(&item_name)
            }
            TypeKind::Primitive { base, .. } => {
                format!("{}{}", parent.name, normalize_name(base.as_str()).pascal_case)
            }
            TypeKind::Map { .. } => format!("{}Map", parent.name),
            TypeKind::Any | TypeKind::Null => format!("{}Any", parent.name),
        };
        self.registry.register_declaration(
            &candidate,
            DeclShape::Alias(expr.with_nullable(false)),
            None,
            false,
            DeclOrigin::Inline(member.path.clone()),
        )
    }

    fn union_discriminator(
        &mut self,
        spec: &DiscriminatorSpec,
        scope: &Scope,
    ) -> Result<UnionDiscriminator, SynthError> {
        let disc_scope = scope.at("/discriminator");
        let mut mapping = IndexMap::new();
        for (value, target) in &spec.mapping {
            let expr = self.reference_expr(target, &disc_scope)?;
            if let Some(name) = expr.named_target() {
                mapping.insert(value.clone(), name.to_string());
            }
        }
        Ok(UnionDiscriminator {
            property_name: spec.property_name.clone(),
            mapping,
        })
    }

    fn all_of_shape(
        &mut self,
        members: &[SchemaRef],
        scope: &Scope,
        depth: usize,
    ) -> Result<DeclShape, SynthError> {
        let significant: Vec<&SchemaRef> = members.iter().filter(|m| !is_unconstrained(m)).collect();
        if let [only] = significant.as_slice()
            && let Some(target) = reference_target(only)
        {
            let member_scope = scope.at("/allOf/0");
            if self.resolver.node(target).is_ok_and(|n| self.is_union_node(n)) {
                return Err(SynthError::composition(
                    &member_scope.path,
                    CompositionError::NestedUnionInIntersection {
                        member: target.to_string(),
                    },
                ));
            }
            return Ok(DeclShape::Alias(self.reference_expr(target, &member_scope)?));
        }

        let mut inputs = Vec::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            let member_scope = scope.at(&format!("/allOf/{i}"));
            inputs.push(self.all_of_member(member, i, &member_scope, depth)?);
            if let SchemaRef::Inline(node) = member
                && matches!(node.kind, NodeKind::Object { .. })
                && !node.required.is_empty()
            {
                inputs.push(AllOfMember {
                    label: i.to_string(),
                    reference: None,
                    shape: MemberShape::Required(node.required.clone()),
                });
            }
        }

        let merged = merge_all_of(inputs, |a, b| self.same_values(a, b))
            .map_err(|err| SynthError::composition(&scope.path, err))?;
        // An expanded component reports its own notes when it is synthesized.
        if self.expanding.is_empty() {
            for note in merged.notes {
                self.diagnostics.push(merge_diagnostic(&scope.path, note));
            }
        }
        Ok(match merged.composition {
            ResolvedComposition::Record(record) => DeclShape::Record(record),
            ResolvedComposition::Alias(target) => DeclShape::Alias(target),
            ResolvedComposition::Union(union) => DeclShape::Union(union),
        })
    }

    fn all_of_member(
        &mut self,
        member: &SchemaRef,
        index: usize,
        scope: &Scope,
        depth: usize,
    ) -> Result<AllOfMember, SynthError> {
        let label = index.to_string();
        let node = match member {
            SchemaRef::Named(name) => {
                return Ok(AllOfMember {
                    label,
                    reference: Some(name.clone()),
                    shape: MemberShape::Scalar(TypeExpr::named(name.clone())),
                });
            }
            SchemaRef::Inline(node) => node,
        };

        let shape = match &node.kind {
            NodeKind::Any if node.is_required_only() => MemberShape::Required(node.required.clone()),
            NodeKind::Any if node.constraints.is_empty() => MemberShape::Unconstrained,
            NodeKind::Reference { target_name } => {
                let expr = self.reference_expr(target_name, scope)?;
                let shape = self.expand_component(target_name, scope)?;
                return Ok(AllOfMember {
                    label: target_name.clone(),
                    reference: expr.named_target().map(str::to_string),
                    shape,
                });
            }
            NodeKind::Composed { kind, .. } if kind.is_union() => MemberShape::Union,
            NodeKind::Composed {
                kind: CompositionKind::AllOf,
                members,
                ..
            } => {
                let shape = self.all_of_shape(members, scope, depth)?;
                self.member_from_shape(shape, scope)?
            }
            NodeKind::Object {
                properties,
                additional,
            } => MemberShape::Record(self.record_shape(properties, additional.as_ref(), scope)?),
            NodeKind::Map { value } => MemberShape::Record(RecordShape {
                fields: Vec::new(),
                additional: Some(self.ref_expr(
                    value,
                    &scope.child("Value", "/additionalProperties"),
                    depth,
                )?),
            }),
            _ => MemberShape::Scalar(self.type_expr(node, scope, depth)?),
        };
        Ok(AllOfMember {
            label,
            reference: None,
            shape,
        })
    }

    /// The record a component schema contributes when used as an `allOf` member.
    fn expand_component(&mut self, original: &str, scope: &Scope) -> Result<MemberShape, SynthError> {
        if self.expanding.iter().any(|e| e == original) {
            return Err(SynthError::composition(
                &scope.path,
                CompositionError::CyclicIntersection {
                    member: original.to_string(),
                },
            ));
        }
        let node = self
            .resolver
            .node(original)
            .map_err(|e| SynthError::from_resolve(&scope.path, e))?;
        if self.is_union_node(node) {
            return Ok(MemberShape::Union);
        }

        self.expanding.push(original.to_string());
        let result = self.expand_node(original, node);
        self.expanding.pop();
        result
    }

    fn expand_node(&mut self, original: &str, node: &SchemaNode) -> Result<MemberShape, SynthError> {
        let emitted = self
            .resolver
            .emitted_name(original)
            .map(str::to_string)
            .unwrap_or_else(|| original.to_string());
        let scope = Scope::new(emitted.clone(), SchemaModel::pointer(original));

        match &node.kind {
            NodeKind::Any if node.is_required_only() => Ok(MemberShape::Required(node.required.clone())),
            NodeKind::Any if node.constraints.is_empty() => Ok(MemberShape::Unconstrained),
            NodeKind::Reference { target_name } => {
                self.reference_expr(target_name, &scope)?;
                self.expand_component(target_name, &scope)
            }
            NodeKind::Object {
                properties,
                additional,
            } => Ok(MemberShape::Record(self.record_shape(
                properties,
                additional.as_ref(),
                &scope,
            )?)),
            NodeKind::Composed {
                kind: CompositionKind::AllOf,
                members,
                ..
            } => {
                let shape = self.all_of_shape(members, &scope, 0)?;
                self.member_from_shape(shape, &scope)
            }
            _ => Ok(MemberShape::Scalar(TypeExpr::named(emitted))),
        }
    }

    fn member_from_shape(&mut self, shape: DeclShape, scope: &Scope) -> Result<MemberShape, SynthError> {
        Ok(match shape {
            DeclShape::Record(record) => MemberShape::Record(record),
            DeclShape::Union(_) => MemberShape::Union,
            DeclShape::Alias(target) => {
                let original = target
                    .named_target()
                    .and_then(|name| self.resolver.original_name(name))
                    .map(str::to_string);
                match original {
                    Some(original) if !target.nullable => self.expand_component(&original, scope)?,
                    _ if target.kind == TypeKind::Any => MemberShape::Unconstrained,
                    _ => MemberShape::Scalar(target),
                }
            }
            DeclShape::Enum(_) => MemberShape::Scalar(TypeExpr::any()),
        })
    }

    /// Whether a node is a `oneOf` / `anyOf`, following plain references.
    fn is_union_node(&self, node: &SchemaNode) -> bool {
        let mut current = node;
        let mut seen = HashSet::new();
        loop {
            match &current.kind {
                NodeKind::Composed { kind, .. } => return kind.is_union(),
                NodeKind::Reference { target_name } => {
                    if !seen.insert(target_name.clone()) {
                        return false;
                    }
                    match self.resolver.node(target_name) {
                        Ok(next) => current = next,
                        Err(_) => return false,
                    }
                }
                _ => return false,
            }
        }
    }

    /// Whether two field types admit the same values, looking through
    /// declared names. Identically shaped inline types promoted under
    /// different names compare equal.
    fn same_values(&self, a: &TypeKind, b: &TypeKind) -> bool {
        self.kinds_match(a, b, &mut Vec::new())
    }

    fn kinds_match(&self, a: &TypeKind, b: &TypeKind, assumed: &mut Vec<(String, String)>) -> bool {
        match (a, b) {
            (TypeKind::Named { name: x }, TypeKind::Named { name: y }) => {
                if x == y || assumed.iter().any(|(p, q)| p == x && q == y) {
                    return true;
                }
                let (Some(left), Some(right)) = (self.registry.get(x), self.registry.get(y)) else {
                    return false;
                };
                assumed.push((x.clone(), y.clone()));
                self.shapes_match(&left.shape, &right.shape, assumed)
            }
            (TypeKind::Array { items: x }, TypeKind::Array { items: y }) => self.exprs_match(x, y, assumed),
            (TypeKind::Map { value: x }, TypeKind::Map { value: y }) => self.exprs_match(x, y, assumed),
            _ => a == b,
        }
    }

    fn exprs_match(&self, a: &TypeExpr, b: &TypeExpr, assumed: &mut Vec<(String, String)>) -> bool {
        a.nullable == b.nullable
            && a.constraints == b.constraints
            && self.kinds_match(&a.kind, &b.kind, assumed)
    }

    fn shapes_match(&self, a: &DeclShape, b: &DeclShape, assumed: &mut Vec<(String, String)>) -> bool {
        match (a, b) {
            (DeclShape::Record(x), DeclShape::Record(y)) => {
                let additional = match (&x.additional, &y.additional) {
                    (Some(p), Some(q)) => self.exprs_match(p, q, assumed),
                    (p, q) => p.is_none() && q.is_none(),
                };
                additional
                    && x.fields.len() == y.fields.len()
                    && x.fields.iter().zip(&y.fields).all(|(f, g)| {
                        f.name == g.name && f.required == g.required && self.exprs_match(&f.ty, &g.ty, assumed)
                    })
            }
            (DeclShape::Alias(x), DeclShape::Alias(y)) => self.exprs_match(x, y, assumed),
            (DeclShape::Union(x), DeclShape::Union(y)) => {
                x.kind == y.kind
                    && x.nullable == y.nullable
                    && x.discriminator == y.discriminator
                    && x.members.len() == y.members.len()
                    && x.members.iter().zip(&y.members).all(|(p, q)| {
                        let (p, q) = (TypeKind::Named { name: p.clone() }, TypeKind::Named { name: q.clone() });
                        self.kinds_match(&p, &q, assumed)
                    })
            }
            _ => a == b,
        }
    }

    /// Withdraw declarations that mention names which were never emitted,
    /// then drop inline declarations no component or operation reaches.
    pub fn finish(
        mut self,
        mut operations: Vec<OperationBinding>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> SynthesisOutput {
        self.prune_dangling(&mut operations);
        self.collect_unreachable(&operations);

        diagnostics.append(&mut self.diagnostics);
        let version = self.model.version();
        let (declarations, names) = self.registry.into_parts();
        debug!(
            "synthesis finished: {} declarations, {} operations, {} diagnostics",
            declarations.len(),
            operations.len(),
            diagnostics.len()
        );
        SynthesisOutput {
            version,
            declarations,
            names,
            operations,
            diagnostics,
        }
    }

    fn prune_dangling(&mut self, operations: &mut Vec<OperationBinding>) {
        loop {
            let mut withdrawn = Vec::new();
            for decl in self.registry.declarations() {
                if let Some(missing) = decl
                    .referenced_names()
                    .into_iter()
                    .find(|n| !self.registry.is_declared(n))
                {
                    let path = match &decl.origin {
                        DeclOrigin::Component(original) => SchemaModel::pointer(original),
                        DeclOrigin::Inline(path) => path.clone(),
                    };
                    withdrawn.push((decl.name.clone(), decl.origin.clone(), path, missing.to_string()));
                }
            }
            if withdrawn.is_empty() {
                break;
            }
            for (name, origin, path, missing) in withdrawn {
                warn!("withdrawing `{name}`: `{missing}` was not emitted");
                self.registry.remove(&name);
                if let DeclOrigin::Component(original) = origin {
                    self.resolver.mark_failed(&original);
                    self.diagnostics.push(Diagnostic::new(
                        Severity::Error,
                        DiagnosticCode::DependencyFailed,
                        path,
                        format!("depends on `{missing}`, which failed"),
                    ));
                }
            }
        }

        let registry = &self.registry;
        let diagnostics = &mut self.diagnostics;
        operations.retain(|op| {
            let missing = op
                .referenced_names()
                .into_iter()
                .find(|n| !registry.is_declared(n));
            match missing {
                Some(missing) => {
                    warn!("dropping operation `{}`: `{missing}` was not emitted", op.name);
                    diagnostics.push(Diagnostic::new(
                        Severity::Error,
                        DiagnosticCode::DependencyFailed,
                        format!("#/paths/{}", escape_pointer(&op.path)),
                        format!("operation `{}` depends on `{missing}`, which failed", op.name),
                    ));
                    false
                }
                None => true,
            }
        });
    }

    fn collect_unreachable(&mut self, operations: &[OperationBinding]) {
        let mut reachable: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for decl in self.registry.declarations() {
            if matches!(decl.origin, DeclOrigin::Component(_)) {
                queue.push_back(decl.name.clone());
            }
        }
        for op in operations {
            queue.extend(op.referenced_names().into_iter().map(str::to_string));
        }

        while let Some(name) = queue.pop_front() {
            if !reachable.insert(name.clone()) {
                continue;
            }
            if let Some(decl) = self.registry.get(&name) {
                queue.extend(decl.referenced_names().into_iter().map(str::to_string));
            }
        }

        let orphans: Vec<String> = self
            .registry
            .declarations()
            .filter(|d| !reachable.contains(&d.name))
            .map(|d| d.name.clone())
            .collect();
        for name in orphans {
            trace!("dropping unreachable `{name}`");
            self.registry.remove(&name);
        }
    }
}

fn is_unconstrained(member: &SchemaRef) -> bool {
    matches!(
        member,
        SchemaRef::Inline(node)
            if node.kind == NodeKind::Any && node.constraints.is_empty() && node.required.is_empty()
    )
}

/// Whether a component's declaration is nothing but another name.
fn declares_alias(node: &SchemaNode) -> bool {
    match &node.kind {
        NodeKind::Reference { .. } => true,
        NodeKind::Composed {
            kind: CompositionKind::AllOf,
            members,
            ..
        } => {
            let significant: Vec<&SchemaRef> = members.iter().filter(|m| !is_unconstrained(m)).collect();
            matches!(significant.as_slice(), [only] if reference_target(only).is_some())
        }
        NodeKind::Composed {
            members,
            discriminator: None,
            ..
        } => {
            let mut cases: Vec<&SchemaRef> = Vec::new();
            for member in members {
                let is_null = matches!(member, SchemaRef::Inline(n) if n.kind == NodeKind::Null);
                if !is_null && !cases.contains(&member) {
                    cases.push(member);
                }
            }
            cases.len() == 1
        }
        _ => false,
    }
}

fn merge_diagnostic(path: &str, note: MergeNote) -> Diagnostic {
    match note {
        MergeNote::PatternDropped { field, kept, dropped } => Diagnostic::warning(
            DiagnosticCode::IgnoredKeyword,
            path,
            format!("field `{field}` has patterns `{kept}` and `{dropped}`; only the first is kept"),
        ),
        MergeNote::MultipleOfDropped { field, kept, dropped } => Diagnostic::warning(
            DiagnosticCode::IgnoredKeyword,
            path,
            format!("field `{field}` has multipleOf {kept} and {dropped}; only {kept} is kept"),
        ),
        MergeNote::EmptyRange { field } => Diagnostic::warning(
            DiagnosticCode::InvertedRange,
            path,
            format!("allOf members leave no valid value for field `{field}`"),
        ),
        MergeNote::UnknownRequired { field } => Diagnostic::warning(
            DiagnosticCode::IgnoredKeyword,
            path,
            format!("required property `{field}` is not defined by any allOf member"),
        ),
    }
}

fn reference_target(member: &SchemaRef) -> Option<&str> {
    match member {
        SchemaRef::Inline(node) => match &node.kind {
            NodeKind::Reference { target_name } => Some(target_name),
            _ => None,
        },
        SchemaRef::Named(_) => None,
    }
}

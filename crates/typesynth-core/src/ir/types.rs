use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::diagnostics::{Diagnostic, Severity};
use crate::model::{Constraints, PrimitiveBase};
use crate::parse::spec::OasVersion;

use super::operations::OperationBinding;
use super::schemas::TypeDeclaration;

/// Everything one synthesis run produces for downstream emitters.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisOutput {
    pub version: OasVersion,
    /// Declarations in registration order; dependencies precede their users.
    pub declarations: Vec<TypeDeclaration>,
    /// Original component schema name → emitted type name.
    pub names: IndexMap<String, String>,
    pub operations: Vec<OperationBinding>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SynthesisOutput {
    pub fn declaration(&self, name: &str) -> Option<&TypeDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Emitted type name for a component schema, if it was emitted.
    pub fn emitted_name(&self, original: &str) -> Option<&str> {
        self.names.get(original).map(String::as_str)
    }

    pub fn declaration_names(&self) -> Vec<&str> {
        self.declarations.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}

/// A resolved, reference-free type used for fields, items, aliases and bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeExpr {
    pub kind: TypeKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeKind {
    Primitive {
        base: PrimitiveBase,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    Array {
        items: Box<TypeExpr>,
    },
    Map {
        value: Box<TypeExpr>,
    },
    /// A declared type, referenced by its emitted name.
    Named {
        name: String,
    },
    Any,
    Null,
}

impl TypeExpr {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
            constraints: Constraints::default(),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(TypeKind::Named { name: name.into() })
    }

    pub fn any() -> Self {
        Self::new(TypeKind::Any)
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn named_target(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Named { name } => Some(name),
            _ => None,
        }
    }

    /// Every declared type name this expression mentions.
    pub fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            TypeKind::Named { name } => out.push(name),
            TypeKind::Array { items } => items.collect_names(out),
            TypeKind::Map { value } => value.collect_names(out),
            TypeKind::Primitive { .. } | TypeKind::Any | TypeKind::Null => {}
        }
    }
}

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

use std::collections::HashMap;

use indexmap::IndexMap;
use log::trace;

use crate::config::SynthConfig;
use crate::ir::{DeclOrigin, DeclShape, TypeDeclaration};

use super::name_normalizer::sanitize_type_name;

enum Slot {
    /// Name held for a component schema that has not been declared yet.
    Reserved,
    Declared(TypeDeclaration),
}

/// Owns every emitted type name and the declaration behind it.
///
/// Names are unique. Collisions get a numeric suffix (`Error`, `Error2`, ...),
/// except that registering a structurally identical shape under the same
/// candidate returns the existing name.
pub struct TypeRegistry {
    reserved_words: Vec<String>,
    array_suffix: String,
    slots: HashMap<String, Slot>,
    order: Vec<String>,
    components: IndexMap<String, String>,
}

impl TypeRegistry {
    pub fn new(config: &SynthConfig) -> Self {
        Self {
            reserved_words: config.reserved_words.clone(),
            array_suffix: config.array_suffix.clone(),
            slots: HashMap::new(),
            order: Vec::new(),
            components: IndexMap::new(),
        }
    }

    pub fn sanitize(&self, candidate: &str) -> String {
        sanitize_type_name(candidate, &self.reserved_words)
    }

    /// Candidate name for an array promoted to a declaration (`PetArr`).
    pub fn array_name(&self, item_name: &str) -> String {
        format!("{item_name}{}", self.array_suffix)
    }

    /// Hold a unique name for a component schema before it is synthesized.
    pub fn reserve(&mut self, original: &str) -> String {
        if let Some(name) = self.components.get(original) {
            return name.clone();
        }
        let base = self.sanitize(original);
        let name = self.free_name(&base);
        self.slots.insert(name.clone(), Slot::Reserved);
        self.components.insert(original.to_string(), name.clone());
        name
    }

    /// Declare the shape of a previously reserved component schema.
    pub fn fill(
        &mut self,
        name: &str,
        original: &str,
        shape: DeclShape,
        doc: Option<String>,
        deprecated: bool,
    ) {
        let declaration = TypeDeclaration {
            name: name.to_string(),
            shape,
            doc,
            deprecated,
            origin: DeclOrigin::Component(original.to_string()),
        };
        if !matches!(self.slots.get(name), Some(Slot::Declared(_))) {
            self.order.push(name.to_string());
        }
        self.slots
            .insert(name.to_string(), Slot::Declared(declaration));
    }

    /// Register an inline shape under `candidate` and return the emitted name.
    pub fn register(&mut self, candidate: &str, shape: DeclShape) -> String {
        self.register_declaration(candidate, shape, None, false, DeclOrigin::Inline(candidate.to_string()))
    }

    pub fn register_declaration(
        &mut self,
        candidate: &str,
        shape: DeclShape,
        doc: Option<String>,
        deprecated: bool,
        origin: DeclOrigin,
    ) -> String {
        let base = self.sanitize(candidate);
        let mut suffix = 1;
        loop {
            let name = suffixed(&base, suffix);
            match self.slots.get(&name) {
                None => {
                    trace!("registered `{name}` ({})", shape.kind_label());
                    self.slots.insert(
                        name.clone(),
                        Slot::Declared(TypeDeclaration {
                            name: name.clone(),
                            shape,
                            doc,
                            deprecated,
                            origin,
                        }),
                    );
                    self.order.push(name.clone());
                    return name;
                }
                Some(Slot::Declared(existing)) if existing.shape == shape => {
                    trace!("reusing `{name}` for identical shape");
                    return name;
                }
                Some(_) => suffix += 1,
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDeclaration> {
        match self.slots.get(name) {
            Some(Slot::Declared(declaration)) => Some(declaration),
            _ => None,
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declarations in registration order.
    pub fn declarations(&self) -> impl Iterator<Item = &TypeDeclaration> {
        self.order.iter().filter_map(|name| self.get(name))
    }

    /// Withdraw a declaration. Its name stays taken so later names remain stable.
    pub fn remove(&mut self, name: &str) -> Option<TypeDeclaration> {
        self.order.retain(|n| n != name);
        match self.slots.insert(name.to_string(), Slot::Reserved) {
            Some(Slot::Declared(declaration)) => Some(declaration),
            _ => None,
        }
    }

    /// Declarations in order, plus original → emitted names of declared components.
    pub fn into_parts(self) -> (Vec<TypeDeclaration>, IndexMap<String, String>) {
        let Self {
            mut slots,
            order,
            components,
            ..
        } = self;
        let names = components
            .into_iter()
            .filter(|(_, emitted)| matches!(slots.get(emitted), Some(Slot::Declared(_))))
            .collect();
        let declarations = order
            .iter()
            .filter_map(|name| match slots.remove(name) {
                Some(Slot::Declared(declaration)) => Some(declaration),
                _ => None,
            })
            .collect();
        (declarations, names)
    }

    /// First of `base`, `base2`, `base3`, ... that no slot holds.
    fn free_name(&self, base: &str) -> String {
        let mut n = 1;
        loop {
            let name = suffixed(base, n);
            if !self.slots.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }
}

fn suffixed(base: &str, n: usize) -> String {
    if n == 1 {
        base.to_string()
    } else {
        format!("{base}{n}")
    }
}

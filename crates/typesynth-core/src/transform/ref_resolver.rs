use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::model::{SchemaModel, SchemaNode, SchemaRef};

/// Synthesis state of one component schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Resolving,
    Registered,
    Failed,
}

/// Outcome of looking up a component schema by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    /// The schema is being or has been synthesized; refer to it by emitted name.
    Ready(SchemaRef),
    /// The schema has not been visited yet and must be synthesized first.
    Unvisited(&'a SchemaNode),
}

/// Tracks which component schemas are pending, in progress, done or failed,
/// and maps component names to the type names reserved for them.
///
/// A reference to a schema that is still `Resolving` is a cycle; it resolves
/// to the reserved name instead of recursing.
pub struct ReferenceResolver<'a> {
    model: &'a SchemaModel,
    emitted: IndexMap<String, String>,
    originals: HashMap<String, String>,
    states: HashMap<String, EntryState>,
    visiting: Vec<String>,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(model: &'a SchemaModel) -> Self {
        Self {
            model,
            emitted: IndexMap::new(),
            originals: HashMap::new(),
            states: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    /// Record the type name reserved for a component schema.
    pub fn bind_name(&mut self, original: &str, emitted: &str) {
        self.emitted.insert(original.to_string(), emitted.to_string());
        self.originals
            .insert(emitted.to_string(), original.to_string());
    }

    pub fn emitted_name(&self, original: &str) -> Option<&str> {
        self.emitted.get(original).map(String::as_str)
    }

    /// Component schema name behind an emitted type name, if any.
    pub fn original_name(&self, emitted: &str) -> Option<&str> {
        self.originals.get(emitted).map(String::as_str)
    }

    pub fn state(&self, name: &str) -> EntryState {
        self.states
            .get(name)
            .copied()
            .unwrap_or(EntryState::Pending)
    }

    pub fn is_visiting(&self, name: &str) -> bool {
        self.state(name) == EntryState::Resolving
    }

    /// Component schemas currently being synthesized, outermost first.
    pub fn visiting(&self) -> &[String] {
        &self.visiting
    }

    /// The lowered node of a component schema.
    pub fn node(&self, name: &str) -> Result<&'a SchemaNode, ResolveError> {
        let model: &'a SchemaModel = self.model;
        model
            .get(name)
            .ok_or_else(|| ResolveError::UndefinedReference(name.to_string()))
    }

    pub fn resolve(&self, name: &str) -> Result<Lookup<'a>, ResolveError> {
        let node = self.node(name)?;
        match self.state(name) {
            EntryState::Pending => Ok(Lookup::Unvisited(node)),
            EntryState::Resolving | EntryState::Registered => {
                let emitted = self
                    .emitted_name(name)
                    .map(str::to_string)
                    .unwrap_or_else(|| name.to_string());
                Ok(Lookup::Ready(SchemaRef::Named(emitted)))
            }
            EntryState::Failed => Err(ResolveError::DependencyFailed(name.to_string())),
        }
    }

    /// Mark `name` as in progress. Returns `false` if it was not pending.
    pub fn begin(&mut self, name: &str) -> bool {
        if self.state(name) != EntryState::Pending {
            return false;
        }
        self.states.insert(name.to_string(), EntryState::Resolving);
        self.visiting.push(name.to_string());
        true
    }

    /// Leave the in-progress state with `outcome` (`Registered` or `Failed`).
    pub fn finish(&mut self, name: &str, outcome: EntryState) {
        self.states.insert(name.to_string(), outcome);
        if let Some(pos) = self.visiting.iter().rposition(|v| v == name) {
            self.visiting.remove(pos);
        }
    }

    /// Demote a registered schema whose declaration was later withdrawn.
    pub fn mark_failed(&mut self, name: &str) {
        self.states.insert(name.to_string(), EntryState::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::SchemaOrRef;
    use crate::parse::spec::OasVersion;

    fn model(yaml: &str) -> SchemaModel {
        let raw: IndexMap<String, SchemaOrRef> = serde_yaml_ng::from_str(yaml).unwrap();
        SchemaModel::from_schemas(OasVersion::V3_0, &raw).0
    }

    #[test]
    fn test_state_transitions() {
        let model = model("Pet:\n  type: object\n");
        let mut resolver = ReferenceResolver::new(&model);
        resolver.bind_name("Pet", "Pet");

        assert!(matches!(resolver.resolve("Pet"), Ok(Lookup::Unvisited(_))));
        assert!(resolver.begin("Pet"));
        assert!(!resolver.begin("Pet"));
        assert_eq!(resolver.visiting(), ["Pet".to_string()]);
        assert_eq!(
            resolver.resolve("Pet").unwrap(),
            Lookup::Ready(SchemaRef::Named("Pet".to_string()))
        );

        resolver.finish("Pet", EntryState::Registered);
        assert!(resolver.visiting().is_empty());
        assert_eq!(resolver.state("Pet"), EntryState::Registered);
    }

    #[test]
    fn test_undefined_and_failed() {
        let model = model("Pet:\n  type: string\n");
        let mut resolver = ReferenceResolver::new(&model);
        resolver.bind_name("Pet", "Pet");

        assert_eq!(
            resolver.resolve("Missing"),
            Err(ResolveError::UndefinedReference("Missing".to_string()))
        );

        resolver.begin("Pet");
        resolver.finish("Pet", EntryState::Failed);
        assert_eq!(
            resolver.resolve("Pet"),
            Err(ResolveError::DependencyFailed("Pet".to_string()))
        );
    }

    #[test]
    fn test_resolves_to_reserved_name() {
        let model = model("pet-record:\n  type: object\n");
        let mut resolver = ReferenceResolver::new(&model);
        resolver.bind_name("pet-record", "PetRecord");
        resolver.begin("pet-record");

        assert_eq!(
            resolver.resolve("pet-record").unwrap(),
            Lookup::Ready(SchemaRef::Named("PetRecord".to_string()))
        );
        assert_eq!(resolver.original_name("PetRecord"), Some("pet-record"));
    }
}

#![deny(missing_docs)]

//! # Definition Registry
//!
//! Names and stores the structural shapes that become `definitions`.
//!
//! Identity is the declaration (`SchemaId`), never structural equality: two
//! declarations with identical bodies get two keys. A declaration is marked
//! in progress as soon as it is registered, so a reference back to it while
//! its body is still being walked resolves to a forward reference by key.
//!
//! Slots are reserved in registration order, which makes the `definitions`
//! section read parent-first regardless of how deep the walk went.

use crate::node::SchemaId;
use crate::swagger::models::{SchemaObject, SchemaRef};
use crate::swagger::ref_utils::definition_key;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Outcome of registering a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Already known (finished or still in progress). Use the key as-is.
    Existing(String),
    /// Newly reserved. The caller must walk the body and call
    /// [`DefinitionRegistry::complete`].
    Reserved(String),
}

impl Registration {
    /// The definition key, whichever the outcome.
    pub fn key(&self) -> &str {
        match self {
            Registration::Existing(key) | Registration::Reserved(key) => key,
        }
    }
}

/// Per-build store of named definitions.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    slots: IndexMap<String, Option<SchemaObject>>,
    by_declaration: HashMap<SchemaId, String>,
    in_progress: HashSet<SchemaId>,
    next_model: usize,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reusable declaration, reserving a key on first sight.
    pub fn register(&mut self, id: SchemaId, label: Option<&str>) -> Registration {
        if let Some(key) = self.by_declaration.get(&id) {
            if self.in_progress.contains(&id) {
                debug!(declaration = %id, key = %key, "forward reference to definition in progress");
            }
            return Registration::Existing(key.clone());
        }

        let key = self.reserve_key(label);
        debug!(declaration = %id, key = %key, "registered definition");
        self.by_declaration.insert(id, key.clone());
        self.in_progress.insert(id);
        Registration::Reserved(key)
    }

    /// Stores the walked body of a reserved declaration and returns its reference.
    pub fn complete(&mut self, id: SchemaId, schema: SchemaObject) -> Option<SchemaRef> {
        let key = self.by_declaration.get(&id)?.clone();
        self.in_progress.remove(&id);
        self.slots.insert(key.clone(), Some(schema));
        Some(SchemaRef::to_definition(&key))
    }

    /// Registers an anonymous shape under a fresh key.
    ///
    /// Anonymous shapes have no declaration identity, so every call creates a
    /// new definition.
    pub fn register_anonymous(&mut self, label: Option<&str>, schema: SchemaObject) -> SchemaRef {
        let key = self.reserve_key(label);
        debug!(key = %key, "registered anonymous definition");
        self.slots.insert(key.clone(), Some(schema));
        SchemaRef::to_definition(&key)
    }

    /// Whether the declaration's body is currently being walked.
    pub fn is_in_progress(&self, id: SchemaId) -> bool {
        self.in_progress.contains(&id)
    }

    /// Looks up a finished definition by `$ref` pointer.
    pub fn resolve(&self, reference: &str) -> Option<&SchemaObject> {
        let key = definition_key(reference)?;
        self.slots.get(&key).and_then(Option::as_ref)
    }

    /// Number of reserved keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consumes the registry, yielding finished definitions in reservation order.
    pub fn into_definitions(self) -> IndexMap<String, SchemaObject> {
        self.slots
            .into_iter()
            .filter_map(|(key, slot)| slot.map(|schema| (key, schema)))
            .collect()
    }

    fn reserve_key(&mut self, label: Option<&str>) -> String {
        let key = match label.map(str::trim).filter(|l| !l.is_empty()) {
            Some(label) => {
                let mut candidate = label.to_string();
                let mut suffix = 2;
                while self.slots.contains_key(&candidate) {
                    candidate = format!("{}{}", label, suffix);
                    suffix += 1;
                }
                candidate
            }
            None => loop {
                self.next_model += 1;
                let candidate = format!("Model{}", self.next_model);
                if !self.slots.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        self.slots.insert(key.clone(), None);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{SchemaSet, ValidationNode};
    use crate::swagger::models::DataType;

    fn ids(n: usize) -> Vec<SchemaId> {
        let mut set = SchemaSet::new();
        (0..n)
            .map(|_| set.declare(ValidationNode::object([("x", ValidationNode::string())])))
            .collect()
    }

    #[test]
    fn test_same_declaration_same_key() {
        let id = ids(1)[0];
        let mut registry = DefinitionRegistry::new();
        let first = registry.register(id, Some("Pet"));
        assert_eq!(first, Registration::Reserved("Pet".into()));
        registry.complete(id, SchemaObject::of_type(DataType::Object));

        let second = registry.register(id, Some("Pet"));
        assert_eq!(second, Registration::Existing("Pet".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_declarations_distinct_keys() {
        let all = ids(2);
        let mut registry = DefinitionRegistry::new();
        let a = registry.register(all[0], Some("Pet"));
        let b = registry.register(all[1], Some("Pet"));
        assert_eq!(a.key(), "Pet");
        assert_eq!(b.key(), "Pet2");
    }

    #[test]
    fn test_generated_names_are_sequential_and_unique() {
        let all = ids(3);
        let mut registry = DefinitionRegistry::new();
        // A user label that collides with the generated scheme.
        assert_eq!(registry.register(all[0], Some("Model1")).key(), "Model1");
        assert_eq!(registry.register(all[1], None).key(), "Model2");
        assert_eq!(registry.register(all[2], None).key(), "Model3");
    }

    #[test]
    fn test_in_progress_yields_forward_reference() {
        let id = ids(1)[0];
        let mut registry = DefinitionRegistry::new();
        registry.register(id, Some("Node"));
        assert!(registry.is_in_progress(id));
        assert_eq!(
            registry.register(id, Some("Node")),
            Registration::Existing("Node".into())
        );
        let reference = registry
            .complete(id, SchemaObject::of_type(DataType::Object))
            .unwrap();
        assert!(!registry.is_in_progress(id));
        assert_eq!(reference.as_reference(), Some("#/definitions/Node"));
    }

    #[test]
    fn test_resolve_and_order() {
        let all = ids(2);
        let mut registry = DefinitionRegistry::new();
        registry.register(all[0], Some("Outer"));
        registry.register(all[1], Some("Inner"));
        registry.complete(all[1], SchemaObject::of_type(DataType::String));
        registry.complete(all[0], SchemaObject::of_type(DataType::Object));

        assert_eq!(
            registry
                .resolve("#/definitions/Inner")
                .and_then(|s| s.data_type),
            Some(DataType::String)
        );
        let keys: Vec<_> = registry.into_definitions().into_keys().collect();
        assert_eq!(keys, vec!["Outer", "Inner"]);
    }

    #[test]
    fn test_anonymous_always_new() {
        let mut registry = DefinitionRegistry::new();
        let a = registry.register_anonymous(None, SchemaObject::of_type(DataType::Object));
        let b = registry.register_anonymous(None, SchemaObject::of_type(DataType::Object));
        assert_ne!(a, b);
        assert_eq!(a.as_reference(), Some("#/definitions/Model1"));
    }

    #[test]
    fn test_unfinished_slots_are_dropped() {
        let id = ids(1)[0];
        let mut registry = DefinitionRegistry::new();
        registry.register(id, None);
        assert!(registry.into_definitions().is_empty());
    }
}

use crate::engine::components::factory::{Args, Factory};
use crate::engine::components::module::Module;
use crate::engine::error::PatchError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Name -> factory lookup that hosts populate before building patches
pub struct Registry {
    /// Factories by short kind name
    factories: HashMap<String, Arc<Factory>>,
    /// Counter for automatic instance naming
    id_counter: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            id_counter: AtomicU64::new(0),
        }
    }

    /// Registry holding every built-in kind
    pub fn with_core() -> Result<Self, PatchError> {
        let mut registry = Self::new();
        crate::kinds::register_core(&mut registry)?;
        Ok(registry)
    }

    /// Register a factory under its own name
    pub fn register(&mut self, factory: Factory) -> Result<(), PatchError> {
        if self.factories.contains_key(factory.name()) {
            return Err(PatchError::DuplicateKind(factory.name().to_string()));
        }
        self.factories.insert(factory.name().to_string(), Arc::new(factory));
        Ok(())
    }

    /// Get a factory by kind name
    pub fn get(&self, kind: &str) -> Result<Arc<Factory>, PatchError> {
        self.factories
            .get(kind)
            .cloned()
            .ok_or_else(|| PatchError::UnknownKind(kind.to_string()))
    }

    /// Check if a kind is registered
    pub fn has_kind(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Get the names of all registered kinds, sorted
    pub fn kind_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Construct a module of `kind`; it is named after the kind until renamed
    pub fn construct(&self, kind: &str, args: Args) -> Result<Module, PatchError> {
        self.get(kind)?.construct(args)
    }

    /// Construct a module with a specific instance name
    ///
    /// # Arguments
    /// * `name` - Instance name of the new module
    /// * `kind` - Registered kind name
    /// * `args` - Values for the kind's base template fields
    pub fn construct_named(&self, name: &str, kind: &str, args: Args) -> Result<Module, PatchError> {
        Ok(self.construct(kind, args)?.named(name))
    }

    /// Construct a module with an automatically generated instance name
    pub fn construct_auto(&self, kind: &str, args: Args) -> Result<Module, PatchError> {
        let counter = self.id_counter.fetch_add(1, Ordering::SeqCst);
        self.construct_named(&format!("{}_{}", kind, counter), kind, args)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

use crate::engine::components::module::Module;
use crate::engine::error::PatchError;
use crate::engine::types::FieldRef;
use crate::engine::values::port::{PortHandle, PortId};
use std::collections::HashMap;

/// Resolution of a named field reference to a concrete port
pub trait Resolve {
    /// Resolve `target` on behalf of the module named `from`
    fn resolve(&self, from: &str, target: &FieldRef) -> Result<PortHandle, PatchError>;
}

/// Flat lookup table, mostly useful for wiring single modules by hand
impl Resolve for HashMap<FieldRef, PortHandle> {
    fn resolve(&self, from: &str, target: &FieldRef) -> Result<PortHandle, PatchError> {
        self.get(target)
            .cloned()
            .ok_or_else(|| PatchError::UnresolvedReference {
                module: from.to_string(),
                target: target.clone(),
                reason: "no such port".to_string(),
            })
    }
}

/// Snapshot of every owned output port across a set of modules
///
/// Built once per bind phase. Resolution against it is a pure lookup, so the
/// modules themselves can be bound mutably while the index is borrowed.
#[derive(Debug, Default)]
pub struct ExportIndex {
    /// instance name -> (field name -> port)
    exports: HashMap<String, HashMap<String, PortHandle>>,
    /// port identity -> owning instance name
    owners: HashMap<PortId, String>,
}

impl ExportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index all owned ports of `modules`
    pub fn build<'a>(modules: impl IntoIterator<Item = &'a Module>) -> Self {
        let mut index = Self::new();
        for module in modules {
            index.insert_module(module);
        }
        index
    }

    fn insert_module(&mut self, module: &Module) {
        let mut ports = HashMap::new();
        for (field, port) in module.outputs() {
            self.owners.insert(port.id(), module.name().to_string());
            ports.insert(field.to_string(), port.clone());
        }
        self.exports.insert(module.name().to_string(), ports);
    }

    /// Check if an instance is present
    pub fn has_module(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    /// Get the instance owning a port, if any module in the index does
    pub fn owner_of(&self, id: PortId) -> Option<&str> {
        self.owners.get(&id).map(String::as_str)
    }

    /// Get the exported field names of an instance
    pub fn exported_fields(&self, name: &str) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .exports
            .get(name)
            .map(|ports| ports.keys().map(String::as_str).collect())
            .unwrap_or_default();
        fields.sort();
        fields
    }
}

impl Resolve for ExportIndex {
    fn resolve(&self, from: &str, target: &FieldRef) -> Result<PortHandle, PatchError> {
        let ports = self
            .exports
            .get(target.module())
            .ok_or_else(|| PatchError::UnresolvedReference {
                module: from.to_string(),
                target: target.clone(),
                reason: format!("no module named '{}'", target.module()),
            })?;

        ports
            .get(target.field())
            .cloned()
            .ok_or_else(|| PatchError::UnresolvedReference {
                module: from.to_string(),
                target: target.clone(),
                reason: format!(
                    "module '{}' does not export '{}'. Valid outputs: {:?}",
                    target.module(),
                    target.field(),
                    self.exported_fields(target.module())
                ),
            })
    }
}

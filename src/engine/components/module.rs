use crate::engine::components::factory::Factory;
use crate::engine::components::fields::{Field, FieldTable};
use crate::engine::components::template::Template;
use crate::engine::connections::resolver::Resolve;
use crate::engine::error::PatchError;
use crate::engine::types::FieldType;
use crate::engine::values::port::{Port, PortHandle, PortValue};
use crate::engine::values::reference::Reference;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Kind-specific behaviour of a module
///
/// A kind caches typed handles to its own output ports at construction and to
/// its resolved inputs in `bind1`. `reset1` must drop every input handle so a
/// later bind starts from nothing.
pub trait ModuleKind: Send {
    /// Cache handles to the freshly resolved inputs
    fn bind1(&mut self, fields: &FieldTable, inputs: &BoundInputs) -> Result<(), PatchError>;

    /// Clear every cached input handle
    fn reset1(&mut self);

    /// Read inputs, compute, write outputs
    fn tick(&mut self) -> Result<(), PatchError>;
}

/// Kind constructor: runs after the field table is allocated
pub type Constructor = fn(&Factory, &mut FieldTable) -> Result<Box<dyn ModuleKind>, PatchError>;

/// Lifecycle state of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    Constructed,
    Bound,
    Reset,
}

/// Ports resolved for one module during a bind phase
#[derive(Debug, Clone, Default)]
pub struct BoundInputs {
    owner: String,
    ports: HashMap<String, PortHandle>,
}

impl BoundInputs {
    pub fn new(owner: impl Into<String>, ports: HashMap<String, PortHandle>) -> Self {
        Self {
            owner: owner.into(),
            ports,
        }
    }

    /// Get a typed handle to a resolved input
    pub fn get<T: PortValue>(&self, name: &str) -> Result<Arc<Port<T>>, PatchError> {
        let handle = self
            .ports
            .get(name)
            .ok_or_else(|| PatchError::unknown_field(&self.owner, name))?;
        handle
            .typed::<T>()
            .ok_or_else(|| PatchError::mismatch(name, FieldType::reference(T::KIND), FieldType::Port(handle.kind())))
    }

    pub fn handle(&self, name: &str) -> Option<&PortHandle> {
        self.ports.get(name)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// Borrow a cached input, failing if the kind was never bound
pub fn cached<'a, T: PortValue>(
    slot: &'a Option<Arc<Port<T>>>,
    field: &str,
) -> Result<&'a Arc<Port<T>>, PatchError> {
    slot.as_ref().ok_or_else(|| PatchError::NotBound(field.to_string()))
}

/// Executable unit of a patch
pub struct Module {
    name: String,
    kind_name: String,
    fields: FieldTable,
    state: ModuleState,
    resolved: BoundInputs,
    behavior: Box<dyn ModuleKind>,
}

impl Module {
    pub(crate) fn new(kind_name: &str, fields: FieldTable, behavior: Box<dyn ModuleKind>) -> Self {
        Self {
            name: kind_name.to_string(),
            kind_name: kind_name.to_string(),
            fields,
            state: ModuleState::Constructed,
            resolved: BoundInputs::default(),
            behavior,
        }
    }

    /// Give the module its instance name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.fields.set_owner(self.name.clone());
        self.resolved.owner = self.name.clone();
    }

    /// Get the instance name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the factory name this module was built by
    pub fn kind(&self) -> &str {
        &self.kind_name
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn is_bound(&self) -> bool {
        self.state == ModuleState::Bound
    }

    /// Get the full template this module was laid out from
    pub fn template(&self) -> &Arc<Template> {
        self.fields.template()
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Result<&Field, PatchError> {
        self.fields.get(name)
    }

    /// Replace a field; a bound module drops back to the unbound state
    pub fn set_field(&mut self, name: &str, value: impl Into<Field>) -> Result<(), PatchError> {
        self.fields.set(name, value.into())?;
        if self.is_bound() {
            self.reset();
        }
        Ok(())
    }

    /// Owned output ports in template order
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &PortHandle)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.as_port().map(|port| (name, port)))
    }

    /// Input references in template order
    pub fn references(&self) -> impl Iterator<Item = (&str, &Reference)> {
        self.fields
            .iter()
            .filter_map(|(name, field)| field.as_reference().map(|reference| (name, reference)))
    }

    /// Port an input resolved to during the last successful bind
    pub fn resolved(&self, name: &str) -> Option<&PortHandle> {
        self.resolved.handle(name)
    }

    pub(crate) fn resolved_ports(&self) -> impl Iterator<Item = &PortHandle> {
        self.resolved.ports.values()
    }

    /// Typed handle to one of this module's own outputs
    pub fn output<T: PortValue>(&self, name: &str) -> Result<Arc<Port<T>>, PatchError> {
        self.fields.output(name)
    }

    /// Current value of an owned output or a resolved input
    pub fn read<T: PortValue>(&self, name: &str) -> Result<T, PatchError> {
        match self.fields.get(name)? {
            Field::Port(_) => Ok(self.fields.output::<T>(name)?.get()),
            Field::Reference(_) => {
                let handle = self
                    .resolved
                    .handle(name)
                    .ok_or_else(|| PatchError::NotBound(self.name.clone()))?;
                handle
                    .typed::<T>()
                    .map(|port| port.get())
                    .ok_or_else(|| PatchError::mismatch(name, FieldType::Port(T::KIND), FieldType::Port(handle.kind())))
            }
            other => Err(PatchError::mismatch(name, FieldType::Port(T::KIND), other.describe())),
        }
    }

    /// Resolve every reference field and hand the results to the kind
    ///
    /// Stale handles are discarded first, so calling this again on an
    /// unchanged graph resolves to the same ports.
    pub fn bind(&mut self, resolver: &dyn Resolve) -> Result<(), PatchError> {
        self.reset();

        let mut ports = HashMap::new();
        for (field, reference) in self.references() {
            let port = reference.resolve(&self.name, field, resolver)?;
            debug!("[{}] {} -> port {} ({})", self.name, field, port.id(), port.kind());
            ports.insert(field.to_string(), port);
        }

        let inputs = BoundInputs::new(self.name.clone(), ports);
        if let Err(err) = self.behavior.bind1(&self.fields, &inputs) {
            self.behavior.reset1();
            return Err(err);
        }

        self.resolved = inputs;
        self.state = ModuleState::Bound;
        Ok(())
    }

    /// Drop resolved input handles; owned outputs keep their values
    pub fn reset(&mut self) {
        self.behavior.reset1();
        self.resolved.ports.clear();
        if self.state == ModuleState::Bound {
            self.state = ModuleState::Reset;
        }
    }

    /// Run one time step
    pub fn tick(&mut self) -> Result<(), PatchError> {
        if !self.is_bound() {
            return Err(PatchError::NotBound(self.name.clone()));
        }
        self.behavior.tick()
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("kind", &self.kind_name)
            .field("state", &self.state)
            .field("fields", &self.fields)
            .finish()
    }
}

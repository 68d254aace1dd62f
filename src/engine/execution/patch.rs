use crate::engine::components::fields::Field;
use crate::engine::components::module::Module;
use crate::engine::error::PatchError;
use crate::engine::execution::binder::{self, Schedule};
use crate::engine::execution::config::{ConcurrencyMode, EngineConfig};
use crate::engine::types::FieldRef;
use crate::engine::values::port::PortId;
use crate::engine::values::reference::Target;
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::HashMap;

/// Live graph of named modules plus its current schedule
///
/// Every structural or field edit takes `&mut self`, so edits can only land
/// between tick cycles. Each edit resets all modules and drops the schedule;
/// `bind_all` must run again before the next cycle.
#[derive(Debug)]
pub struct Patch {
    /// Modules, kept in schedule order while bound
    modules: Vec<Module>,
    /// Instance name -> position in `modules`
    index: HashMap<String, usize>,
    /// Tick order from the last successful bind
    schedule: Option<Schedule>,
    config: EngineConfig,
    /// Dedicated pool when the config asks for a fixed thread count
    pool: Option<rayon::ThreadPool>,
    /// Outputs of removed modules, for catching direct references to them
    detached: HashMap<PortId, FieldRef>,
    /// Current cycle number
    current_cycle: u64,
}

impl Patch {
    /// Create an empty patch with the default configuration
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            index: HashMap::new(),
            schedule: None,
            config: EngineConfig::default(),
            pool: None,
            detached: HashMap::new(),
            current_cycle: 0,
        }
    }

    /// Create an empty patch with a specific configuration
    ///
    /// # Arguments
    /// * `config` - Concurrency settings for tick cycles
    ///
    /// # Returns
    /// The patch, or a `Config` error if the worker pool cannot be built
    pub fn with_config(config: EngineConfig) -> Result<Self, PatchError> {
        let pool = config.build_pool()?;
        Ok(Self {
            config,
            pool,
            ..Self::new()
        })
    }

    /// Create a patch from modules that already carry their instance names
    pub fn from_modules(modules: impl IntoIterator<Item = Module>) -> Result<Self, PatchError> {
        let mut patch = Self::new();
        for module in modules {
            patch.insert(module)?;
        }
        Ok(patch)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add a module under `name`
    ///
    /// # Arguments
    /// * `name` - Instance name other modules reference it by
    /// * `module` - Module built by a registry; its current name is replaced
    pub fn add_module(&mut self, name: &str, mut module: Module) -> Result<(), PatchError> {
        module.set_name(name);
        self.insert(module)
    }

    /// Add a module under its current name
    pub fn insert(&mut self, module: Module) -> Result<(), PatchError> {
        if self.index.contains_key(module.name()) {
            return Err(PatchError::DuplicateModule(module.name().to_string()));
        }
        debug!("Adding module '{}' ({})", module.name(), module.kind());
        for (_, port) in module.outputs() {
            self.detached.remove(&port.id());
        }
        self.index.insert(module.name().to_string(), self.modules.len());
        self.modules.push(module);
        self.invalidate();
        Ok(())
    }

    /// Remove a module; references to it dangle until the patch is rebound
    ///
    /// # Returns
    /// The removed module, reset, or `UnknownModule` if no module has `name`
    pub fn remove_module(&mut self, name: &str) -> Result<Module, PatchError> {
        let position = self
            .index
            .get(name)
            .copied()
            .ok_or_else(|| PatchError::UnknownModule(name.to_string()))?;

        let outputs: HashMap<PortId, FieldRef> = self.modules[position]
            .outputs()
            .map(|(field, port)| (port.id(), FieldRef::new(name, field)))
            .collect();

        for module in &self.modules {
            for (field, reference) in module.references() {
                let dangling = match reference.target() {
                    Target::Field(target) => target.module() == name,
                    Target::Direct(port) => outputs.contains_key(&port.id()),
                };
                if dangling {
                    warn!(
                        "Removing module '{}' still referenced by {}.{}",
                        name,
                        module.name(),
                        field
                    );
                }
            }
        }

        self.detached.extend(outputs);
        let mut module = self.modules.remove(position);
        module.reset();
        self.reindex();
        self.invalidate();
        Ok(module)
    }

    /// Get a module by instance name
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.index.get(name).map(|&position| &self.modules[position])
    }

    fn module_or_err(&self, name: &str) -> Result<&Module, PatchError> {
        self.module(name)
            .ok_or_else(|| PatchError::UnknownModule(name.to_string()))
    }

    /// Get all instance names, in tick order while bound
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(Module::name).collect()
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Inspect a field of a live module
    pub fn get_field(&self, module: &str, field: &str) -> Result<&Field, PatchError> {
        self.module_or_err(module)?.field(field)
    }

    /// Edit a field of a live module; the patch must be rebound afterwards
    pub fn set_field(&mut self, module: &str, field: &str, value: impl Into<Field>) -> Result<(), PatchError> {
        let position = self
            .index
            .get(module)
            .copied()
            .ok_or_else(|| PatchError::UnknownModule(module.to_string()))?;
        self.modules[position].set_field(field, value)?;
        self.invalidate();
        Ok(())
    }

    /// Current value of a numeric output or input
    pub fn read(&self, module: &str, field: &str) -> Result<f64, PatchError> {
        self.module_or_err(module)?.read::<f64>(field)
    }

    /// Current value of a gate output or input
    pub fn read_gate(&self, module: &str, field: &str) -> Result<bool, PatchError> {
        self.module_or_err(module)?.read::<bool>(field)
    }

    pub fn is_bound(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Dependency stages of the current schedule; empty while unbound
    pub fn stages(&self) -> &[Vec<String>] {
        self.schedule.as_ref().map(Schedule::stages).unwrap_or(&[])
    }

    /// Get the current cycle number
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Resolve every reference and fix the tick order
    ///
    /// # Returns
    /// * `Ok(())` once every module is bound and the schedule is in place
    /// * `Err(PatchError)` if any reference cannot be resolved or the graph
    ///   has a cycle; every module is left unbound
    pub fn bind_all(&mut self) -> Result<(), PatchError> {
        self.invalidate();
        self.check_detached()?;
        let mut schedule = binder::bind_all(&mut self.modules)?;
        self.modules = schedule.arrange(std::mem::take(&mut self.modules));
        self.reindex();
        self.schedule = Some(schedule);
        Ok(())
    }

    /// Return every module to the unbound state
    pub fn reset(&mut self) {
        self.invalidate();
    }

    /// Execute one tick cycle
    pub fn tick_cycle(&mut self) -> Result<(), PatchError> {
        let Some(schedule) = self.schedule.as_ref() else {
            return Err(PatchError::PatchNotBound);
        };

        self.current_cycle += 1;
        debug!("=== Tick Cycle {} ===", self.current_cycle);

        let parallel = self.config.concurrency_mode == ConcurrencyMode::Rayon;
        let mut start = 0;
        for stage in schedule.stages() {
            let end = start + stage.len();
            let modules = &mut self.modules[start..end];

            if parallel && modules.len() > 1 {
                match &self.pool {
                    Some(pool) => pool.install(|| modules.par_iter_mut().try_for_each(Module::tick))?,
                    None => modules.par_iter_mut().try_for_each(Module::tick)?,
                }
            } else {
                for module in modules.iter_mut() {
                    module.tick()?;
                }
            }

            start = end;
        }

        Ok(())
    }

    /// Run `cycles` tick cycles, returns the final cycle count
    pub fn run(&mut self, cycles: u64) -> Result<u64, PatchError> {
        for _ in 0..cycles {
            self.tick_cycle()?;
        }
        Ok(self.current_cycle)
    }

    /// Fail on direct references to ports whose module has been removed
    fn check_detached(&self) -> Result<(), PatchError> {
        for module in &self.modules {
            for (_, reference) in module.references() {
                if let Target::Direct(port) = reference.target() {
                    if let Some(target) = self.detached.get(&port.id()) {
                        return Err(PatchError::UnresolvedReference {
                            module: module.name().to_string(),
                            target: target.clone(),
                            reason: format!("module '{}' was removed from the patch", target.module()),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.schedule = None;
        for module in &mut self.modules {
            module.reset();
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .modules
            .iter()
            .enumerate()
            .map(|(position, module)| (module.name().to_string(), position))
            .collect();
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self::new()
    }
}

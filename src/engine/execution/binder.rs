use crate::engine::components::module::Module;
use crate::engine::connections::resolver::ExportIndex;
use crate::engine::error::PatchError;
use crate::engine::execution::execution_order::ExecutionOrderBuilder;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Evaluation plan computed by a successful bind
///
/// Stages form the dependency partial order: every producer sits in an
/// earlier stage than its consumers, and modules sharing a stage are
/// independent of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    stages: Vec<Vec<String>>,
    /// Slice positions of each stage's modules at bind time
    positions: Vec<Vec<usize>>,
}

impl Schedule {
    /// Module names grouped by stage
    pub fn stages(&self) -> &[Vec<String>] {
        &self.stages
    }

    /// Module names in tick order
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().flatten().map(String::as_str)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of scheduled modules
    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Reorder `modules` so every stage occupies a contiguous run
    pub(crate) fn arrange(&mut self, modules: Vec<Module>) -> Vec<Module> {
        let mut slots: Vec<Option<Module>> = modules.into_iter().map(Some).collect();
        let mut arranged = Vec::with_capacity(slots.len());
        for stage in &mut self.positions {
            for position in stage.iter_mut() {
                if let Some(module) = slots.get_mut(*position).and_then(Option::take) {
                    *position = arranged.len();
                    arranged.push(module);
                }
            }
        }
        arranged
    }
}

fn reset_all(modules: &mut [Module]) {
    for module in modules.iter_mut() {
        module.reset();
    }
}

/// Bind every module against the others and compute the tick order
///
/// Any failure leaves every module unbound.
pub fn bind_all(modules: &mut [Module]) -> Result<Schedule, PatchError> {
    let mut seen = HashSet::new();
    for module in modules.iter() {
        if !seen.insert(module.name()) {
            return Err(PatchError::DuplicateModule(module.name().to_string()));
        }
    }

    let exports = ExportIndex::build(modules.iter());
    for index in 0..modules.len() {
        if let Err(err) = modules[index].bind(&exports) {
            reset_all(modules);
            return Err(err);
        }
    }

    // Edge from the owner of every resolved port to the module reading it
    let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
    for module in modules.iter() {
        for port in module.resolved_ports() {
            if let Some(owner) = exports.owner_of(port.id()) {
                dependencies
                    .entry(owner.to_string())
                    .or_default()
                    .push(module.name().to_string());
            }
        }
    }

    let names: Vec<String> = modules.iter().map(|module| module.name().to_string()).collect();
    let stages = match ExecutionOrderBuilder::build_execution_order_stages(&names, &dependencies) {
        Ok(stages) => stages,
        Err(err) => {
            reset_all(modules);
            return Err(err);
        }
    };

    let position_of: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(position, name)| (name.as_str(), position))
        .collect();
    let positions = stages
        .iter()
        .map(|stage| stage.iter().map(|name| position_of[name.as_str()]).collect())
        .collect();

    info!("Bound {} modules into {} stages", names.len(), stages.len());
    debug!("Tick order: {:?}", stages);

    Ok(Schedule { stages, positions })
}

/// Tick every module once, in schedule order
///
/// `modules` must be the slice the schedule was computed from.
pub fn tick_cycle(modules: &mut [Module], schedule: &Schedule) -> Result<(), PatchError> {
    for (names, positions) in schedule.stages.iter().zip(&schedule.positions) {
        for (name, &position) in names.iter().zip(positions) {
            let module = modules
                .get_mut(position)
                .filter(|module| module.name() == name.as_str())
                .ok_or_else(|| PatchError::NotBound(name.clone()))?;
            module.tick()?;
        }
    }
    Ok(())
}

use crate::engine::error::PatchError;
use std::collections::HashMap;

/// Manages topological sorting and execution order calculation for modules
pub struct ExecutionOrderBuilder;

impl ExecutionOrderBuilder {
    /// Analyzes the module dependency graph to build a topologically sorted execution order
    /// organized into stages. Modules within a stage do not depend on each other.
    /// Uses modified Kahn's algorithm to detect cycles and ensure deterministic execution.
    ///
    /// `dependencies` maps a producer to every module reading one of its ports.
    pub fn build_execution_order_stages(
        modules: &[String],
        dependencies: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<Vec<String>>, PatchError> {
        let mut adj_list: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut in_degree: HashMap<&str, usize> = HashMap::new();

        // Initialize graph data structures for all modules
        for name in modules {
            in_degree.insert(name.as_str(), 0);
            adj_list.insert(name.as_str(), Vec::new());
        }

        // Build adjacency list and in-degrees, ignoring modules we're not tracking
        for (producer, consumers) in dependencies {
            let Some(neighbors) = adj_list.get_mut(producer.as_str()) else {
                continue;
            };
            for consumer in consumers {
                if let Some(degree) = in_degree.get_mut(consumer.as_str()) {
                    neighbors.push(consumer.as_str());
                    *degree += 1;
                }
            }
        }

        let mut stages = Vec::new();
        let mut processed_count = 0;

        while processed_count < modules.len() {
            // Find all modules with zero in-degree (current stage)
            let mut current_stage: Vec<&str> = in_degree
                .iter()
                .filter(|(_, &degree)| degree == 0)
                .map(|(&name, _)| name)
                .collect();

            if current_stage.is_empty() {
                let mut remaining: Vec<String> = in_degree.keys().map(|name| name.to_string()).collect();
                remaining.sort();
                return Err(PatchError::CyclicGraph(remaining));
            }

            // Sort stage for deterministic results
            current_stage.sort();

            for name in &current_stage {
                in_degree.remove(name);
                processed_count += 1;

                if let Some(neighbors) = adj_list.get(name) {
                    for neighbor in neighbors {
                        if let Some(degree) = in_degree.get_mut(neighbor) {
                            *degree -= 1;
                        }
                    }
                }
            }

            stages.push(current_stage.into_iter().map(str::to_string).collect());
        }

        Ok(stages)
    }

    /// Flattened execution order
    pub fn build_execution_order(
        modules: &[String],
        dependencies: &HashMap<String, Vec<String>>,
    ) -> Result<Vec<String>, PatchError> {
        let stages = Self::build_execution_order_stages(modules, dependencies)?;
        Ok(stages.into_iter().flatten().collect())
    }
}

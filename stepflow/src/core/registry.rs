//! Lookups and flow traversal over a loaded [`StepRegistry`].

use crate::core::types::{StepDefinition, StepRegistry};
use crate::error::RegistryError;

impl StepRegistry {
    pub fn get_step_definition(&self, step_id: &str) -> Option<&StepDefinition> {
        self.steps.get(step_id)
    }

    pub fn get_flow(&self, flow_name: &str) -> Option<&[String]> {
        self.flows.get(flow_name).map(Vec::as_slice)
    }

    /// Steps of `flow_name` in flow order.
    ///
    /// Ids with no registered definition are skipped, so partially authored
    /// registries stay traversable. An unknown flow yields an empty list.
    pub fn get_flow_steps(&self, flow_name: &str) -> Vec<&StepDefinition> {
        self.get_flow(flow_name)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.steps.get(id))
            .collect()
    }

    pub fn entry_step(&self) -> Option<&StepDefinition> {
        self.entry_step
            .as_deref()
            .and_then(|id| self.get_step_definition(id))
    }

    /// Where execution begins: the first registered step of `flow`, or the entry step.
    pub fn first_step(&self, flow: Option<&str>) -> Option<&StepDefinition> {
        match flow {
            Some(name) => self.get_flow_steps(name).into_iter().next(),
            None => self.entry_step(),
        }
    }

    /// Register a new step. Existing ids are never replaced.
    pub fn add_step_definition(&mut self, step: StepDefinition) -> Result<(), RegistryError> {
        if self.steps.contains_key(&step.step_id) {
            return Err(RegistryError::DuplicateStep {
                step_id: step.step_id,
            });
        }
        self.steps.insert(step.step_id.clone(), step);
        Ok(())
    }
}

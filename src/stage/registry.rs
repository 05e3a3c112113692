//! The stage registry: stage name → execution metadata, built
//! once and walked in order by the DAG executor. Adding a stage means
//! adding one entry to [`crate::stage::catalog::all_stages`] — no runtime
//! class hierarchy.

use std::sync::Arc;

use crate::stage::agent::{StageAgent, StageCategory};
use crate::stage::catalog;

/// A resolved view of one stage's registry metadata, without the trait
/// object itself — useful for logging and for building the DAG's
/// topological order independent of `dyn` dispatch.
#[derive(Debug, Clone)]
pub struct StageDefinition {
    pub name: &'static str,
    pub category: StageCategory,
    pub dependencies: &'static [&'static str],
    pub execution_order: u32,
}

/// The full catalog, sorted by `execution_order`.
pub struct StageRegistry {
    stages: Vec<Arc<dyn StageAgent>>,
}

impl StageRegistry {
    /// Build the registry from the built-in catalog, asserting it is
    /// internally consistent: every declared dependency names a stage that
    /// exists and that comes earlier in execution order.
    pub fn build() -> Self {
        let mut stages = catalog::all_stages();
        stages.sort_by_key(|s| s.execution_order());
        let registry = Self { stages };
        registry.assert_acyclic();
        registry
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Arc<dyn StageAgent>] {
        &self.stages
    }

    pub fn definitions(&self) -> Vec<StageDefinition> {
        self.stages
            .iter()
            .map(|s| StageDefinition {
                name: s.name(),
                category: s.category(),
                dependencies: s.dependencies(),
                execution_order: s.execution_order(),
            })
            .collect()
    }

    fn assert_acyclic(&self) {
        for (index, stage) in self.stages.iter().enumerate() {
            for dependency in stage.dependencies() {
                let dep_index = self
                    .stages
                    .iter()
                    .position(|s| s.name() == *dependency)
                    .unwrap_or_else(|| panic!("stage `{}` depends on unregistered stage `{}`", stage.name(), dependency));
                assert!(
                    dep_index < index,
                    "stage `{}` depends on `{}`, which does not precede it in execution order",
                    stage.name(),
                    dependency
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_with_seventeen_stages_in_dependency_order() {
        let registry = StageRegistry::build();
        assert_eq!(registry.len(), 17);
        let names: Vec<&str> = registry.stages().iter().map(|s| s.name()).collect();
        assert_eq!(names[0], "intake");
        assert_eq!(names[names.len() - 1], "internal_briefing");
    }
}

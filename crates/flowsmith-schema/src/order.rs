//! Execution ordering.
//!
//! Steps are layered into waves with an iterative variant of Kahn's
//! algorithm: each pass collects every unplaced step whose dependencies are
//! already satisfied.  Input order is kept inside a wave so the result is
//! deterministic for a given graph.

use std::collections::HashSet;

use serde::Serialize;
use tracing::trace;

use crate::error::{Result, SchemaError};
use crate::step::StepDefinition;

/// Ordered sequence of waves.  Every step of wave `n` depends only on steps
/// in waves `0..n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionBatch {
    waves: Vec<Vec<String>>,
}

impl ExecutionBatch {
    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    pub fn into_waves(self) -> Vec<Vec<String>> {
        self.waves
    }

    /// Number of waves.
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Total number of placed steps across all waves.
    pub fn step_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Index of the wave containing `step_id`.
    pub fn wave_of(&self, step_id: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|id| id == step_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &[String]> {
        self.waves.iter().map(Vec::as_slice)
    }
}

/// Layer `steps` into waves.
///
/// Fails with [`SchemaError::CyclicDependency`] naming every step that could
/// not be placed.  A dependency on an id that is not in `steps` can never be
/// satisfied and is reported the same way; graph construction rejects those
/// earlier with a more precise error.
pub fn layer(steps: &[StepDefinition]) -> Result<ExecutionBatch> {
    let mut satisfied: HashSet<&str> = HashSet::with_capacity(steps.len());
    let mut placed = vec![false; steps.len()];
    let mut remaining = steps.len();
    let mut waves = Vec::new();

    while remaining > 0 {
        let ready: Vec<usize> = steps
            .iter()
            .enumerate()
            .filter(|(i, step)| {
                !placed[*i]
                    && step
                        .depends_on
                        .iter()
                        .all(|dep| satisfied.contains(dep.as_str()))
            })
            .map(|(i, _)| i)
            .collect();

        if ready.is_empty() {
            let unresolved: Vec<String> = steps
                .iter()
                .zip(&placed)
                .filter(|(_, done)| !**done)
                .map(|(step, _)| step.id.clone())
                .collect();
            return Err(SchemaError::CyclicDependency {
                remaining: unresolved,
            });
        }

        // Mark after collecting so a wave never satisfies its own members.
        for &i in &ready {
            placed[i] = true;
            satisfied.insert(steps[i].id.as_str());
        }
        remaining -= ready.len();

        let wave: Vec<String> = ready.into_iter().map(|i| steps[i].id.clone()).collect();
        trace!(wave = waves.len(), size = wave.len(), "wave computed");
        waves.push(wave);
    }

    Ok(ExecutionBatch { waves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepCategory;

    fn step(id: &str, deps: &[&str]) -> StepDefinition {
        StepDefinition::new(id, id, StepCategory::DataTransformation).with_depends_on(deps.iter().copied())
    }

    #[test]
    fn diamond_is_three_waves() {
        let steps = vec![
            step("a", &[]),
            step("b", &["a"]),
            step("c", &["a"]),
            step("d", &["b", "c"]),
        ];
        let batch = layer(&steps).unwrap();
        assert_eq!(
            batch.waves(),
            &[
                vec!["a".to_string()],
                vec!["b".to_string(), "c".to_string()],
                vec!["d".to_string()],
            ]
        );
        assert_eq!(batch.step_count(), 4);
        assert_eq!(batch.wave_of("d"), Some(2));
    }

    #[test]
    fn input_order_breaks_ties() {
        let steps = vec![step("z", &[]), step("m", &[]), step("a", &[])];
        let batch = layer(&steps).unwrap();
        assert_eq!(batch.waves()[0], vec!["z", "m", "a"]);
    }

    #[test]
    fn cycle_names_every_unplaced_step() {
        let steps = vec![
            step("root", &[]),
            step("x", &["root", "z"]),
            step("y", &["x"]),
            step("z", &["y"]),
            step("tail", &["z"]),
        ];
        match layer(&steps) {
            Err(SchemaError::CyclicDependency { remaining }) => {
                assert_eq!(remaining, vec!["x", "y", "z", "tail"]);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let steps = vec![step("loop", &["loop"])];
        assert!(matches!(
            layer(&steps),
            Err(SchemaError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn empty_input_has_no_waves() {
        let batch = layer(&[]).unwrap();
        assert!(batch.is_empty());
    }
}

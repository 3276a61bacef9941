//! Ordered collection of change steps.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ChangeError, Result};

use super::action::ActionType;
use super::change::{ChangeStep, ChangeStepFilterFunc};

/// Change steps of one planning run, in application order.
///
/// Every key in `step_keys` has exactly one step and every step appears
/// exactly once in `step_keys`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeOrder<S = Value> {
    step_keys: Vec<String>,
    change_steps: HashMap<String, ChangeStep<S>>,
}

impl<S> Default for ChangeOrder<S> {
    fn default() -> Self {
        Self {
            step_keys: Vec::new(),
            change_steps: HashMap::new(),
        }
    }
}

impl<S> ChangeOrder<S> {
    /// Creates an empty change order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a change order from its key sequence and step map.
    ///
    /// # Errors
    ///
    /// Returns an inconsistency error unless keys and steps cover each other
    /// exactly and every step is stored under its own id.
    pub fn from_parts(
        step_keys: Vec<String>,
        change_steps: HashMap<String, ChangeStep<S>>,
    ) -> Result<Self> {
        if step_keys.len() != change_steps.len() {
            return Err(inconsistent(format!(
                "{} step keys for {} steps",
                step_keys.len(),
                change_steps.len()
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for key in &step_keys {
            if !seen.insert(key.as_str()) {
                return Err(inconsistent(format!("step key '{key}' listed twice")));
            }
            match change_steps.get(key) {
                None => return Err(inconsistent(format!("no step for key '{key}'"))),
                Some(step) if step.id != *key => {
                    return Err(inconsistent(format!(
                        "step '{}' stored under key '{key}'",
                        step.id
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(Self {
            step_keys,
            change_steps,
        })
    }

    /// Appends a step at the end of the order.
    ///
    /// # Errors
    ///
    /// Returns an inconsistency error if a step with the same id exists.
    pub fn push(&mut self, step: ChangeStep<S>) -> Result<()> {
        if self.change_steps.contains_key(&step.id) {
            return Err(inconsistent(format!("step '{}' added twice", step.id)));
        }
        self.step_keys.push(step.id.clone());
        self.change_steps.insert(step.id.clone(), step);
        Ok(())
    }

    /// Returns the step for a key; `None` means no change is planned for it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ChangeStep<S>> {
        self.change_steps.get(key)
    }

    /// Returns the step keys in order.
    #[must_use]
    pub fn step_keys(&self) -> &[String] {
        &self.step_keys
    }

    /// Iterates over steps in order.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeStep<S>> {
        self.step_keys
            .iter()
            .filter_map(|key| self.change_steps.get(key))
    }

    /// Returns, in order, every step matching all filters.
    ///
    /// With no filters every step is returned.
    #[must_use]
    pub fn values(&self, filters: &[ChangeStepFilterFunc<S>]) -> Vec<&ChangeStep<S>> {
        self.iter()
            .filter(|step| filters.iter().all(|filter| filter(step)))
            .collect()
    }

    /// Returns the number of steps with the given action.
    #[must_use]
    pub fn count(&self, action: ActionType) -> usize {
        self.iter().filter(|step| step.action == action).count()
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.step_keys.len()
    }

    /// Returns true if no step is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.step_keys.is_empty()
    }
}

impl<S: Serialize> ChangeOrder<S> {
    /// Concatenates the diff of every step in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that cannot be rendered.
    pub fn diffs(&self) -> Result<String> {
        let mut out = String::new();
        for step in self.iter() {
            out.push_str(&step.diff()?);
        }
        Ok(out)
    }
}

fn inconsistent(message: String) -> crate::error::PlanwrightError {
    ChangeError::Inconsistent { message }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::change::tests::Unserializable;
    use crate::planner::{
        create_change_step_filter, delete_change_step_filter, un_change_change_step_filter,
        update_change_step_filter,
    };

    fn step(id: &str, action: ActionType) -> ChangeStep {
        ChangeStep::new(id, action, None, None)
    }

    fn sample_order() -> ChangeOrder {
        let mut order = ChangeOrder::new();
        order.push(step("test-key-1", ActionType::Create)).unwrap();
        order.push(step("test-key-2", ActionType::Delete)).unwrap();
        order.push(step("test-key-3", ActionType::Update)).unwrap();
        order.push(step("test-key-4", ActionType::UnChange)).unwrap();
        order
    }

    #[test]
    fn test_values_without_filters_keeps_order() {
        let order = sample_order();
        let ids: Vec<_> = order.values(&[]).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["test-key-1", "test-key-2", "test-key-3", "test-key-4"]);
    }

    #[test]
    fn test_values_with_single_filter() {
        let order = sample_order();
        let cases: [(ChangeStepFilterFunc, &str); 4] = [
            (create_change_step_filter, "test-key-1"),
            (delete_change_step_filter, "test-key-2"),
            (update_change_step_filter, "test-key-3"),
            (un_change_change_step_filter, "test-key-4"),
        ];
        for (filter, expected) in cases {
            let values = order.values(&[filter]);
            assert_eq!(values.len(), 1);
            assert_eq!(values[0].id, expected);
        }
    }

    #[test]
    fn test_values_filters_are_conjunctive() {
        let order = sample_order();
        assert!(order
            .values(&[create_change_step_filter, delete_change_step_filter])
            .is_empty());
    }

    #[test]
    fn test_values_keep_relative_order() {
        let mut order = ChangeOrder::new();
        order.push(step("z", ActionType::Create)).unwrap();
        order.push(step("a", ActionType::Update)).unwrap();
        order.push(step("m", ActionType::Create)).unwrap();
        let ids: Vec<_> = order
            .values(&[create_change_step_filter])
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["z", "m"]);
    }

    #[test]
    fn test_single_step_round_trip() {
        colored::control::set_override(false);
        let created = step("k", ActionType::Create);
        let order = ChangeOrder::from_parts(
            vec!["k".to_string()],
            HashMap::from([("k".to_string(), created.clone())]),
        )
        .unwrap();

        assert_eq!(order.get("k"), Some(&created));
        assert_eq!(order.diffs().unwrap(), created.diff().unwrap());
    }

    #[test]
    fn test_get_absent_key() {
        assert!(sample_order().get("missing").is_none());
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let missing = ChangeOrder::from_parts(
            vec!["a".to_string()],
            HashMap::from([("b".to_string(), step("b", ActionType::Create))]),
        );
        assert!(missing.is_err());

        let extra = ChangeOrder::from_parts(
            vec![],
            HashMap::from([("b".to_string(), step("b", ActionType::Create))]),
        );
        assert!(extra.is_err());

        let misfiled = ChangeOrder::from_parts(
            vec!["a".to_string()],
            HashMap::from([("a".to_string(), step("b", ActionType::Create))]),
        );
        assert!(misfiled.is_err());
    }

    #[test]
    fn test_push_rejects_duplicates() {
        let mut order = sample_order();
        assert!(order.push(step("test-key-1", ActionType::Update)).is_err());
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_diffs_abort_on_failing_step() {
        colored::control::set_override(false);
        let mut order = ChangeOrder::new();
        order
            .push(ChangeStep::new("fine", ActionType::Create, None, None))
            .unwrap();
        order
            .push(ChangeStep::new("broken", ActionType::Update, Some(Unserializable), None))
            .unwrap();

        let err = order.diffs().unwrap_err();
        assert!(err.to_string().contains("broken"));
        // the order itself stays usable
        assert_eq!(order.len(), 2);
        assert!(order.get("fine").unwrap().diff().is_ok());
    }

    #[test]
    fn test_count() {
        let order = sample_order();
        for action in ActionType::ALL {
            assert_eq!(order.count(action), 1);
        }
    }
}

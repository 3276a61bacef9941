//! Read-only change set with project and stack context.

use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PlanwrightError, Result};
use crate::project::{Project, Stack};

use super::action::ActionType;
use super::change::{ChangeStep, ChangeStepFilterFunc};
use super::order::ChangeOrder;

/// The change order of one stack, ready for presentation and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Changes<S = Value> {
    order: ChangeOrder<S>,
    project: Project,
    stack: Stack,
}

impl<S> Changes<S> {
    /// Wraps a change order with its context.
    #[must_use]
    pub const fn new(order: ChangeOrder<S>, project: Project, stack: Stack) -> Self {
        Self {
            order,
            project,
            stack,
        }
    }

    /// Returns the project.
    #[must_use]
    pub const fn project(&self) -> &Project {
        &self.project
    }

    /// Returns the stack.
    #[must_use]
    pub const fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Returns the underlying change order.
    #[must_use]
    pub const fn order(&self) -> &ChangeOrder<S> {
        &self.order
    }

    /// Returns the step for a key, if one is planned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ChangeStep<S>> {
        self.order.get(key)
    }

    /// Returns, in order, every step matching all filters.
    #[must_use]
    pub fn values(&self, filters: &[ChangeStepFilterFunc<S>]) -> Vec<&ChangeStep<S>> {
        self.order.values(filters)
    }

    /// Renders a one-line summary of planned actions.
    #[must_use]
    pub fn summary(&self) -> String {
        let count = |action: ActionType| {
            self.order
                .count(action)
                .to_string()
                .color(action.color())
                .bold()
        };
        format!(
            "Stack: {}  Plan: {} to create, {} to update, {} to delete, {} unchanged",
            self.stack.name.bold(),
            count(ActionType::Create),
            count(ActionType::Update),
            count(ActionType::Delete),
            count(ActionType::UnChange),
        )
    }
}

impl<S: Serialize> Changes<S> {
    /// Concatenates the diff of every step in order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that cannot be rendered.
    pub fn diffs(&self) -> Result<String> {
        self.order.diffs()
    }
}

/// Serialized form of a change set, as read by the `diff` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeDocument<S = Value> {
    /// Project context.
    pub project: Project,
    /// Stack context.
    pub stack: Stack,
    /// Steps in application order.
    #[serde(default = "Vec::new")]
    pub steps: Vec<ChangeStep<S>>,
}

impl<S> TryFrom<ChangeDocument<S>> for Changes<S> {
    type Error = PlanwrightError;

    fn try_from(doc: ChangeDocument<S>) -> Result<Self> {
        let mut order = ChangeOrder::new();
        for step in doc.steps {
            order.push(step)?;
        }
        Ok(Self::new(order, doc.project, doc.stack))
    }
}

impl<S: Clone> From<&Changes<S>> for ChangeDocument<S> {
    fn from(changes: &Changes<S>) -> Self {
        Self {
            project: changes.project.clone(),
            stack: changes.stack.clone(),
            steps: changes.order.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{create_change_step_filter, update_change_step_filter};
    use serde_json::json;

    fn sample() -> Changes {
        let doc: ChangeDocument = serde_json::from_value(json!({
            "project": { "name": "shop" },
            "stack": { "name": "dev" },
            "steps": [
                { "id": "ns", "action": "create", "modified": { "kind": "Namespace" } },
                { "id": "svc", "action": "update",
                  "original": { "port": 80 }, "modified": { "port": 8080 } },
                { "id": "old", "action": "delete", "original": { "kind": "Job" } },
                { "id": "cm", "action": "unchanged" }
            ]
        }))
        .unwrap();
        Changes::try_from(doc).unwrap()
    }

    #[test]
    fn test_context_accessors() {
        let changes = sample();
        assert_eq!(changes.project().name, "shop");
        assert_eq!(changes.stack().name, "dev");
        assert_eq!(changes.order().len(), 4);
    }

    #[test]
    fn test_get_and_values() {
        let changes = sample();
        assert_eq!(changes.get("svc").unwrap().action, ActionType::Update);
        assert!(changes.get("nope").is_none());

        let created = changes.values(&[create_change_step_filter]);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, "ns");
        assert!(changes
            .values(&[create_change_step_filter, update_change_step_filter])
            .is_empty());
    }

    #[test]
    fn test_summary_counts() {
        colored::control::set_override(false);
        assert_eq!(
            sample().summary(),
            "Stack: dev  Plan: 1 to create, 1 to update, 1 to delete, 1 unchanged"
        );
    }

    #[test]
    fn test_diffs_follow_order() {
        colored::control::set_override(false);
        let diffs = sample().diffs().unwrap();
        let ns = diffs.find("ID: ns").unwrap();
        let svc = diffs.find("ID: svc").unwrap();
        let old = diffs.find("ID: old").unwrap();
        assert!(ns < svc && svc < old);
        assert!(diffs.contains("- port: 80"));
        assert!(diffs.contains("+ port: 8080"));
    }

    #[test]
    fn test_duplicate_steps_rejected() {
        let doc: ChangeDocument = serde_json::from_value(json!({
            "project": { "name": "shop" },
            "stack": { "name": "dev" },
            "steps": [
                { "id": "a", "action": "create" },
                { "id": "a", "action": "delete" }
            ]
        }))
        .unwrap();
        assert!(Changes::try_from(doc).is_err());
    }

    #[test]
    fn test_yaml_document_without_states() {
        let doc: ChangeDocument = serde_yaml::from_str(
            "project:\n  name: shop\nstack:\n  name: dev\nsteps:\n  - id: cm\n    action: unchanged\n  - id: ns\n    action: create\n    modified:\n      kind: Namespace\n",
        )
        .unwrap();
        let changes = Changes::try_from(doc).unwrap();

        let cm = changes.get("cm").unwrap();
        assert!(cm.original.is_none() && cm.modified.is_none());
        assert_eq!(changes.get("ns").unwrap().modified, Some(json!({ "kind": "Namespace" })));
    }

    #[test]
    fn test_document_round_trip() {
        let changes = sample();
        let doc = ChangeDocument::from(&changes);
        assert_eq!(doc.steps.len(), 4);
        assert_eq!(Changes::try_from(doc).unwrap(), changes);
    }
}

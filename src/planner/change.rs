//! Change steps and their textual diff.

use std::fmt::Write;

use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};

use crate::error::{ChangeError, Result};

use super::action::ActionType;

/// The computed delta of one resource.
///
/// `original` is the prior state and `modified` the desired one; either may
/// be absent depending on the action (a create has no original).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStep<S = Value> {
    /// Resource key.
    pub id: String,
    /// Planned action.
    pub action: ActionType,
    /// State before the change.
    pub original: Option<S>,
    /// State after the change.
    pub modified: Option<S>,
}

/// Predicate selecting change steps by their action.
pub type ChangeStepFilterFunc<S = Value> = fn(&ChangeStep<S>) -> bool;

/// Selects create steps.
pub fn create_change_step_filter<S>(step: &ChangeStep<S>) -> bool {
    step.action == ActionType::Create
}

/// Selects update steps.
pub fn update_change_step_filter<S>(step: &ChangeStep<S>) -> bool {
    step.action == ActionType::Update
}

/// Selects delete steps.
pub fn delete_change_step_filter<S>(step: &ChangeStep<S>) -> bool {
    step.action == ActionType::Delete
}

/// Selects unchanged steps.
pub fn un_change_change_step_filter<S>(step: &ChangeStep<S>) -> bool {
    step.action == ActionType::UnChange
}

impl<S> ChangeStep<S> {
    /// Creates a change step.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        action: ActionType,
        original: Option<S>,
        modified: Option<S>,
    ) -> Self {
        Self {
            id: id.into(),
            action,
            original,
            modified,
        }
    }
}

impl<S: Serialize> ChangeStep<S> {
    /// Renders the step as an `ID`/`Plan`/`Diff` block ending in a blank line.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if either state cannot be serialized.
    pub fn diff(&self) -> Result<String> {
        let original = self.canonical(self.original.as_ref())?;
        let modified = self.canonical(self.modified.as_ref())?;
        let body = line_diff(&original, &modified);

        let color = self.action.color();
        let mut out = String::new();
        let _ = writeln!(out, "{}{}", "ID: ".color(color).bold(), self.id.color(color));
        let _ = writeln!(out, "{}{}", "Plan: ".color(color).bold(), self.action.pretty_string());
        let _ = writeln!(out, "{}{body}", "Diff: ".color(color).bold());
        out.push('\n');
        Ok(out)
    }

    /// Serializes one side to YAML; an absent side is empty.
    fn canonical(&self, state: Option<&S>) -> Result<String> {
        let Some(state) = state else {
            return Ok(String::new());
        };
        serde_yaml::to_string(state)
            .map_err(|e| ChangeError::serialization(&self.id, e.to_string()).into())
    }
}

/// Renders a line diff, one `-`/`+`/` ` prefixed line per source line.
fn line_diff(original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }

    let mut body = String::new();
    for change in TextDiff::from_lines(original, modified).iter_all_changes() {
        let line = change.value().trim_end_matches('\n');
        let rendered = match change.tag() {
            ChangeTag::Delete => format!("- {line}").red().to_string(),
            ChangeTag::Insert => format!("+ {line}").green().to_string(),
            ChangeTag::Equal => format!("  {line}"),
        };
        body.push('\n');
        body.push_str(&rendered);
    }
    body
}

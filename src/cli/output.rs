//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::error::{ChangeError, Result, Status};
use crate::graph::{ResourceGraph, VisitOutcome, WalkReport};
use crate::planner::{ActionType, ChangeStep, ChangeStepFilterFunc, Changes};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Resource row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Type")]
    resource_type: String,
    #[tabled(rename = "Depends on")]
    depends_on: String,
}

/// Walk outcome row for table display.
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Resource")]
    key: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result of validating an intent.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON rendering fails or the graph has a cycle.
    pub fn format_validation(&self, status: &Status, graph: &ResourceGraph) -> Result<String> {
        let resources = graph.vertex_count().saturating_sub(1);
        match self.format {
            OutputFormat::Json => to_json(&ValidationJson {
                status,
                resources,
                edges: graph.edge_count(),
                waves: graph.waves()?.len(),
            }),
            OutputFormat::Text => {
                let mut output = String::new();
                if status.is_warning() {
                    let _ = writeln!(output, "{} {}", "⚠".yellow(), status.message);
                } else {
                    let _ = writeln!(output, "{} Intent is valid", "✓".green());
                }
                let _ = writeln!(output, "\nGraph summary:");
                let _ = writeln!(output, "  Resources: {resources}");
                let _ = writeln!(output, "  Edges: {}", graph.edge_count());
                let _ = writeln!(output, "  Waves: {}", graph.waves()?.len());
                Ok(output)
            }
        }
    }

    /// Formats a reduced resource graph.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON rendering fails or the graph has a cycle.
    pub fn format_graph(&self, graph: &ResourceGraph, show_waves: bool) -> Result<String> {
        let order = graph.topological_keys()?;
        match self.format {
            OutputFormat::Json => {
                let vertices = order
                    .iter()
                    .filter_map(|key| graph.vertex(key))
                    .map(|node| VertexJson {
                        key: &node.key,
                        resource_type: &node.resource.resource_type,
                        action: node.action,
                        dependencies: graph.dependencies(&node.key),
                    })
                    .collect();
                to_json(&GraphJson {
                    vertices,
                    edges: graph.edges(),
                    waves: if show_waves { Some(graph.waves()?) } else { None },
                })
            }
            OutputFormat::Text => {
                let rows: Vec<ResourceRow> = order
                    .iter()
                    .filter_map(|key| graph.vertex(key))
                    .map(|node| ResourceRow {
                        key: node.key.clone(),
                        resource_type: node.resource.resource_type.clone(),
                        depends_on: graph.dependencies(&node.key).join(", "),
                    })
                    .collect();

                let mut output = String::new();
                if rows.is_empty() {
                    output.push_str("No resources in intent.\n");
                    return Ok(output);
                }
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');

                if show_waves {
                    let _ = writeln!(output, "\nExecution waves:");
                    for (i, wave) in graph.waves()?.iter().enumerate() {
                        let _ = writeln!(output, "  {}: {}", i + 1, wave.join(", "));
                    }
                }
                Ok(output)
            }
        }
    }

    /// Formats a walk report.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON rendering fails.
    pub fn format_walk(&self, report: &WalkReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => {
                let rows: Vec<OutcomeRow> = report
                    .outcomes()
                    .iter()
                    .map(|(key, outcome)| OutcomeRow {
                        key: key.clone(),
                        outcome: Self::format_outcome(outcome),
                    })
                    .collect();

                let mut output = String::new();
                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }
                let _ = writeln!(
                    output,
                    "\nCompletion order: {}",
                    report.completion_order().join(" → ")
                );
                Ok(output)
            }
        }
    }

    /// Formats a change set, optionally restricted to one action.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that cannot be rendered.
    pub fn format_changes(&self, changes: &Changes, action: Option<ActionType>) -> Result<String> {
        let filters: Vec<ChangeStepFilterFunc> = action.map(ActionType::filter).into_iter().collect();
        let steps = changes.values(&filters);

        match self.format {
            OutputFormat::Json => to_json(&ChangesJson {
                project: &changes.project().name,
                stack: &changes.stack().name,
                steps,
            }),
            OutputFormat::Text => {
                if changes.order().is_empty() {
                    return Ok(format!("{} No changes planned.\n", "✓".green()));
                }
                let mut output = String::new();
                for step in steps {
                    output.push_str(&step.diff()?);
                }
                output.push_str(&changes.summary());
                output.push('\n');
                Ok(output)
            }
        }
    }

    /// Formats a walk outcome with color.
    fn format_outcome(outcome: &VisitOutcome) -> String {
        match outcome {
            VisitOutcome::Succeeded => "succeeded".green().to_string(),
            VisitOutcome::Failed(message) => {
                format!("{} ({})", "failed".red(), Self::truncate(message, 60))
            }
            VisitOutcome::Skipped => "skipped".yellow().to_string(),
            VisitOutcome::Cancelled => "cancelled".dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ChangeError::serialization("output", e.to_string()).into())
}

// JSON serialization helpers

#[derive(Serialize)]
struct ValidationJson<'a> {
    status: &'a Status,
    resources: usize,
    edges: usize,
    waves: usize,
}

#[derive(Serialize)]
struct GraphJson<'a> {
    vertices: Vec<VertexJson<'a>>,
    edges: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    waves: Option<Vec<Vec<String>>>,
}

#[derive(Serialize)]
struct VertexJson<'a> {
    key: &'a str,
    #[serde(rename = "type")]
    resource_type: &'a str,
    action: ActionType,
    dependencies: Vec<String>,
}

#[derive(Serialize)]
struct ChangesJson<'a> {
    project: &'a str,
    stack: &'a str,
    steps: Vec<&'a ChangeStep>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::IntentParser;
    use crate::intent::{Intent, Resource};
    use crate::planner::{ChangeOrder, ChangeStep};
    use crate::project::{Project, Stack};
    use serde_json::{Value, json};

    fn parsed() -> ResourceGraph {
        let intent = Intent::new(vec![
            Resource::new("ns", "Kubernetes"),
            Resource::new("svc", "Kubernetes").depends_on("ns"),
        ]);
        let mut graph = ResourceGraph::with_root();
        IntentParser::new(&intent).parse(&mut graph).unwrap();
        graph
    }

    fn changes() -> Changes {
        let mut order = ChangeOrder::new();
        order
            .push(ChangeStep::new("ns", ActionType::Create, None, Some(json!({ "a": 1 }))))
            .unwrap();
        order
            .push(ChangeStep::new("svc", ActionType::Delete, Some(json!({ "b": 2 })), None))
            .unwrap();
        Changes::new(order, Project::new("shop"), Stack::new("dev"))
    }

    #[test]
    fn test_graph_json() {
        let out = OutputFormatter::new(OutputFormat::Json)
            .format_graph(&parsed(), true)
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["vertices"][0]["key"], "ns");
        assert_eq!(value["vertices"][1]["dependencies"], json!(["ns"]));
        assert_eq!(value["waves"], json!([["ns"], ["svc"]]));
    }

    #[test]
    fn test_graph_text_lists_waves() {
        colored::control::set_override(false);
        let out = OutputFormatter::new(OutputFormat::Text)
            .format_graph(&parsed(), true)
            .unwrap();
        assert!(out.contains("Execution waves:"));
        assert!(out.contains("  2: svc"));
    }

    #[test]
    fn test_changes_filtered_by_action() {
        colored::control::set_override(false);
        let out = OutputFormatter::new(OutputFormat::Text)
            .format_changes(&changes(), Some(ActionType::Delete))
            .unwrap();

        assert!(out.contains("ID: svc"));
        assert!(!out.contains("ID: ns"));
        assert!(out.ends_with("1 to create, 0 to update, 1 to delete, 0 unchanged\n"));
    }

    #[test]
    fn test_changes_json() {
        let out = OutputFormatter::new(OutputFormat::Json)
            .format_changes(&changes(), None)
            .unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["stack"], "dev");
        assert_eq!(value["steps"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_validation_warning_text() {
        colored::control::set_override(false);
        let status = Status::warning(crate::error::StatusKind::NotFound, "intent contains no resources");
        let out = OutputFormatter::new(OutputFormat::Text)
            .format_validation(&status, &ResourceGraph::with_root())
            .unwrap();
        assert!(out.contains("intent contains no resources"));
        assert!(out.contains("Resources: 0"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 10), "short");
        assert_eq!(OutputFormatter::truncate("a long message", 8), "a lon...");
    }
}

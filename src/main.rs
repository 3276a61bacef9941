//! Planwright CLI entrypoint.
//!
//! This is the main entrypoint for the planwright command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use planwright::cli::{Cli, Commands, OutputFormatter, failure_policy};
use planwright::error::{IntentError, Result, Status};
use planwright::graph::{IntentParser, ResourceGraph, ResourceNode, WalkConfig, Walker};
use planwright::intent::{IntentLoader, find_intent_file};
use planwright::planner::{ChangeDocument, Changes};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", Status::from(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate => cmd_validate(cli.intent.as_ref(), &formatter),
        Commands::Graph { waves } => cmd_graph(cli.intent.as_ref(), waves, &formatter),
        Commands::Walk {
            parallelism,
            continue_on_error,
            timeout,
        } => {
            let mut config = WalkConfig::new(failure_policy(continue_on_error))
                .with_parallelism(parallelism);
            if let Some(secs) = timeout {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            cmd_walk(cli.intent.as_ref(), config, &formatter).await
        }
        Commands::Diff { changes, action } => {
            cmd_diff(&changes, action.map(Into::into), &formatter)
        }
    }
}

/// Validate an intent.
fn cmd_validate(intent_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let (status, graph) = build_graph(intent_path)?;
    emit(&formatter.format_validation(&status, &graph)?)
}

/// Show the reduced graph.
fn cmd_graph(
    intent_path: Option<&PathBuf>,
    show_waves: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (_, graph) = build_graph(intent_path)?;
    emit(&formatter.format_graph(&graph, show_waves)?)
}

/// Dry-run walk of the graph.
async fn cmd_walk(
    intent_path: Option<&PathBuf>,
    config: WalkConfig,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (_, graph) = build_graph(intent_path)?;

    let walker = Walker::new(config);
    let cancel = walker.cancellation_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing running visits");
            cancel.cancel();
        }
    });

    let report = walker
        .walk(&graph, |node: ResourceNode| async move {
            debug!("Dry run: {} {}", node.action, node.key);
            tokio::task::yield_now().await;
            Ok::<(), std::convert::Infallible>(())
        })
        .await;
    ctrl_c.abort();

    let report = report?;
    emit(&formatter.format_walk(&report)?)?;
    report.into_result().map(|_| ())
}

/// Render a change document.
fn cmd_diff(
    path: &Path,
    action: Option<planwright::planner::ActionType>,
    formatter: &OutputFormatter,
) -> Result<()> {
    info!("Loading changes from: {}", path.display());
    if !path.exists() {
        return Err(IntentError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let document: ChangeDocument = if is_json {
        serde_json::from_str(&content).map_err(|e| parse_error(path, &e))?
    } else {
        serde_yaml::from_str(&content).map_err(|e| parse_error(path, &e))?
    };
    let changes = Changes::try_from(document)?;

    emit(&formatter.format_changes(&changes, action)?)
}

fn parse_error(path: &Path, err: &dyn std::fmt::Display) -> IntentError {
    IntentError::ParseError {
        message: format!("Invalid change document: {err}"),
        location: Some(path.display().to_string()),
    }
}

/// Loads the intent and builds its graph.
fn build_graph(intent_path: Option<&PathBuf>) -> Result<(Status, ResourceGraph)> {
    let intent_file = resolve_intent_path(intent_path)?;
    info!("Planning intent: {}", intent_file.display());

    // Load .env next to the intent
    let loader = IntentLoader::new().with_base_path(
        intent_file
            .parent()
            .unwrap_or_else(|| Path::new(".")),
    );
    loader.load_dotenv()?;

    let file_name = intent_file
        .file_name()
        .map_or_else(|| intent_file.clone(), PathBuf::from);
    let intent = loader.load_file(file_name)?;
    let mut graph = ResourceGraph::with_root();
    let status = IntentParser::new(&intent).parse(&mut graph)?;
    Ok((status, graph))
}

fn resolve_intent_path(intent_path: Option<&PathBuf>) -> Result<PathBuf> {
    intent_path.map_or_else(|| find_intent_file("."), |path| Ok(path.clone()))
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

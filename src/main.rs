mod builtin;
mod loader;

use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use strata_engine::{EngineError, WorkflowEngine};
use strata_task::{DataMap, TaskExecutionContext};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::loader::Overrides;

/// Strata - run workflow graphs with the cheapest strategy that fits them
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.strata)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the strategy a workflow would run with
  Detect {
    /// Workflow file, or the name of a workflow in <data-dir>/workflows
    workflow: String,

    #[command(flatten)]
    settings: SettingsArgs,
  },

  /// Run a workflow, reading the input payload from stdin
  Run {
    /// Workflow file, or the name of a workflow in <data-dir>/workflows
    workflow: String,

    #[command(flatten)]
    settings: SettingsArgs,
  },
}

#[derive(Args)]
struct SettingsArgs {
  /// Override the maximum number of concurrently running tasks
  #[arg(long)]
  max_parallelism: Option<NonZeroUsize>,

  /// Stop the run at the first failed task
  #[arg(long)]
  stop_on_error: bool,

  /// Set a workflow variable (value parsed as JSON, else taken as a string)
  #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
  variables: Vec<(String, serde_json::Value)>,
}

impl From<SettingsArgs> for Overrides {
  fn from(args: SettingsArgs) -> Self {
    Self {
      max_parallelism: args.max_parallelism,
      stop_on_error: args.stop_on_error,
      variables: args.variables,
    }
  }
}

fn parse_var(raw: &str) -> Result<(String, serde_json::Value), String> {
  let (key, value) = raw
    .split_once('=')
    .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
  if key.is_empty() {
    return Err(format!("empty variable name in '{}'", raw));
  }
  let value = serde_json::from_str(value)
    .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
  Ok((key.to_string(), value))
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".strata"),
  };

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Detect { workflow, settings }) => {
      rt.block_on(detect_workflow(workflow, settings.into(), data_dir))?;
      Ok(ExitCode::SUCCESS)
    }
    Some(Commands::Run { workflow, settings }) => {
      rt.block_on(run_workflow(workflow, settings.into(), data_dir))
    }
    None => {
      println!("strata - use --help to see available commands");
      Ok(ExitCode::SUCCESS)
    }
  }
}

async fn detect_workflow(workflow: String, overrides: Overrides, data_dir: PathBuf) -> Result<()> {
  let path = loader::resolve_path(&workflow, &data_dir)?;
  let def = loader::read_definition(&path).await?;
  let graph = loader::build_graph(def, &overrides)?;

  let detected = WorkflowEngine::new().detect(&graph);
  println!("{}", serde_json::to_string_pretty(&detected)?);
  Ok(())
}

async fn run_workflow(workflow: String, overrides: Overrides, data_dir: PathBuf) -> Result<ExitCode> {
  let path = loader::resolve_path(&workflow, &data_dir)?;
  let def = loader::read_definition(&path).await?;
  eprintln!("Loaded workflow: {}", def.name);

  let mut graph = loader::build_graph(def, &overrides)?;
  let payload = read_payload_from_stdin()?;
  let base = TaskExecutionContext::default().with_input(payload);

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt received, cancelling run");
      on_interrupt.cancel();
    }
  });

  let engine = WorkflowEngine::new();
  let run = match engine.execute(&mut graph, base, cancel).await {
    Ok(run) => run,
    Err(EngineError::Cancelled) => {
      eprintln!("Run cancelled");
      return Ok(ExitCode::from(130));
    }
    Err(e) => return Err(anyhow::Error::new(e).context("workflow execution failed")),
  };

  eprintln!(
    "Execution {} finished using {} strategy: {}",
    run.execution_id, run.strategy.strategy_type, run.result.message
  );
  println!("{}", serde_json::to_string_pretty(&run.result)?);

  if run.result.success() {
    Ok(ExitCode::SUCCESS)
  } else {
    Ok(ExitCode::FAILURE)
  }
}

fn read_payload_from_stdin() -> Result<DataMap> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(DataMap::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read payload from stdin")?;

  if input.trim().is_empty() {
    Ok(DataMap::new())
  } else {
    serde_json::from_str(&input).context("stdin payload must be a JSON object")
  }
}

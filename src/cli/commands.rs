//! CLI command definitions for repro-forge.
//!
//! `run` drives a paper through the whole pipeline, `evaluate` executes and
//! scores an existing demonstration, and `scan` prints a repository summary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::acquisition::PaperAcquirer;
use crate::config::ForgeConfig;
use crate::execution::{ExecutionConfig, ExecutionEngine};
use crate::inspector::{Inspector, RepositoryScanner};
use crate::llm::{LiteLlmClient, LlmProvider};
use crate::oracle::LlmOracle;
use crate::pipeline::{PipelineOrchestrator, PipelineRun, RunStatus};
use crate::scoring::ScoringEngine;
use crate::synthesis::DemoSynthesizer;

/// Reproduce research papers: find their code, run a demo, score it.
#[derive(Parser)]
#[command(name = "repro-forge")]
#[command(about = "Locate a paper's repository, generate a runnable demo, execute and score it")]
#[command(version)]
#[command(
    long_about = "repro-forge turns a paper into an audited demonstration run.\n\nIt extracts GitHub links from the paper, clones the most relevant repository, scans it, obtains a demonstration script, runs it under a deadline and scores the result.\n\nExample usage:\n  repro-forge run https://arxiv.org/pdf/2401.00001 --json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full pipeline for a paper URL or local file.
    Run(RunArgs),

    /// Execute and score an existing demonstration inside a repository.
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Print the structured summary of a local repository as JSON.
    Scan(ScanArgs),
}

/// Settings shared by the commands that execute demonstrations.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExecutionOverrides {
    /// Wall-clock deadline for the demonstration, in seconds.
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Interpreter used to check and run the demonstration.
    #[arg(long)]
    pub interpreter: Option<String>,

    /// Print the run record as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `repro-forge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Paper URL (http/https) or local path (PDF or text).
    pub paper_ref: String,

    /// Directory repositories are cloned into.
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Directory run records are written to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub execution: ExecutionOverrides,
}

/// Arguments for `repro-forge evaluate`.
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Demonstration file to execute.
    #[arg(long)]
    pub demo: PathBuf,

    /// Repository root the demonstration runs from.
    #[arg(long)]
    pub repo: PathBuf,

    /// Directory run records are written to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub execution: ExecutionOverrides,
}

/// Arguments for `repro-forge scan`.
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Repository directory to scan.
    pub path: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// A pipeline run that ends `Failed` is reported as an error after the
/// record has been printed, so the process exits non-zero.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_pipeline_command(args).await,
        Commands::Evaluate(args) => run_evaluate_command(args).await,
        Commands::Scan(args) => run_scan_command(args),
    }
}

async fn run_pipeline_command(args: RunArgs) -> anyhow::Result<()> {
    let mut config = apply_overrides(ForgeConfig::from_env()?, &args.execution);
    if let Some(ref workspace) = args.workspace {
        config.workspace_dir = workspace.clone();
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    config.validate()?;

    let orchestrator = build_orchestrator(&config);
    let run = orchestrator.run(&args.paper_ref).await;
    report(&run, args.execution.json)
}

async fn run_evaluate_command(args: EvaluateArgs) -> anyhow::Result<()> {
    let mut config = apply_overrides(ForgeConfig::from_env()?, &args.execution);
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }
    config.validate()?;

    let orchestrator = build_orchestrator(&config);
    let run = orchestrator.evaluate(&args.demo, &args.repo).await;
    report(&run, args.execution.json)
}

fn run_scan_command(args: ScanArgs) -> anyhow::Result<()> {
    let summary = RepositoryScanner::new().scan(&args.path)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Applies the execution flags on top of the environment configuration.
fn apply_overrides(mut config: ForgeConfig, overrides: &ExecutionOverrides) -> ForgeConfig {
    if let Some(secs) = overrides.timeout {
        config.execution_timeout = Duration::from_secs(secs);
    }
    if let Some(ref interpreter) = overrides.interpreter {
        config.interpreter = interpreter.clone();
    }
    config
}

/// Wires the default collaborators together.
fn build_orchestrator(config: &ForgeConfig) -> PipelineOrchestrator {
    if config.llm_api_key.is_none() {
        warn!("No LLM API key configured; synthesis will fail and judgments will score the minimum");
    }

    let llm: Arc<dyn LlmProvider> = Arc::new(LiteLlmClient::from_config(config));
    let oracle = Arc::new(LlmOracle::new(llm, config));
    let execution = ExecutionEngine::new(ExecutionConfig::from(config));
    let scoring = ScoringEngine::new(oracle.clone(), execution.time_budget());
    let scanner = RepositoryScanner::new().ignoring(config.demo_file_name.clone());

    PipelineOrchestrator::new(
        config,
        Arc::new(PaperAcquirer::from_config(config)),
        Arc::new(scanner),
        Arc::new(DemoSynthesizer::from_config(oracle, config)),
        execution,
        scoring,
    )
}

fn report(run: &PipelineRun, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(run)?);
    } else {
        print_summary(run);
    }

    info!(run_id = %run.run_id, exit_code = run.exit_code(), "Done");
    if run.status != RunStatus::Success {
        anyhow::bail!("Run {} failed: {}", run.run_id, run.errors.join("; "));
    }
    Ok(())
}

fn print_summary(run: &PipelineRun) {
    println!("\n=== repro-forge run {} ===", run.run_id);
    println!("Input:       {}", run.input_ref);
    println!("Status:      {}", run.status);
    if let Some(ref repo) = run.repository {
        println!("Repository:  {}", repo);
    }
    if let Some(ref path) = run.demo_file_path {
        println!("Demo:        {}", path.display());
    }
    if let Some(ref outcome) = run.execution {
        println!(
            "Execution:   {} (exit {}, {:.2}s)",
            outcome.status, outcome.exit_code, outcome.elapsed_seconds
        );
    }
    if let Some(ref score) = run.score {
        let b = &score.breakdown;
        println!("Score:       {}", score);
        println!("  no syntax error  {}", b.no_syntax_error);
        println!("  clean exit       {}", b.clean_exit);
        println!("  within time      {}", b.within_time);
        println!("  produced output  {}", b.produced_output);
        println!("  no stderr        {}", b.no_stderr);
        println!("  judgment         {}", b.judgment);
    }
    for err in &run.errors {
        println!("Error:       {}", err);
    }
}

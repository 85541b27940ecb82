//! Pipeline orchestrator.
//!
//! Sequences acquisition, inspection, synthesis, execution and scoring for
//! one paper, recording each stage's output in the [`PipelineRun`] before the
//! next stage starts. Every call to [`PipelineOrchestrator::run`] returns a
//! record in a terminal state.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::acquisition::SourceAcquisition;
use crate::config::ForgeConfig;
use crate::error::{AcquisitionError, InspectionError, SynthesisError};
use crate::execution::ExecutionEngine;
use crate::inspector::{Inspector, Summary};
use crate::scoring::ScoringEngine;
use crate::synthesis::DemoProvider;

use super::run::PipelineRun;

/// File the run record is written to, inside `<output_dir>/<run_id>/`.
pub const RUN_RESULT_FILE: &str = "run_result.json";

/// Errors that end a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Acquisition failed.
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Repository inspection failed.
    #[error(transparent)]
    Inspection(#[from] InspectionError),

    /// No demonstration could be obtained.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// The demonstration could not be written into the repository.
    #[error("Failed to write demonstration to '{path}': {source}")]
    PersistDemo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blocking stage task panicked or was cancelled.
    #[error("Stage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A stage panicked on the orchestrator's own task.
    #[error("Stage panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    /// Returns true for recognized domain failures, which are recorded with
    /// their message alone. Everything else is recorded as unexpected.
    pub fn is_domain(&self) -> bool {
        match self {
            PipelineError::Acquisition(e) => !matches!(e, AcquisitionError::Io(_)),
            PipelineError::Inspection(e) => matches!(e, InspectionError::NotADirectory(_)),
            PipelineError::Synthesis(_) => true,
            PipelineError::PersistDemo { .. }
            | PipelineError::Join(_)
            | PipelineError::Panicked(_) => false,
        }
    }

    /// Message stored in the run's error list.
    pub fn record_message(&self) -> String {
        if self.is_domain() {
            self.to_string()
        } else {
            format!("Unexpected error: {}", self)
        }
    }
}

/// Drives one paper through every stage.
pub struct PipelineOrchestrator {
    acquisition: Arc<dyn SourceAcquisition>,
    inspector: Arc<dyn Inspector>,
    demos: Arc<dyn DemoProvider>,
    execution: ExecutionEngine,
    scoring: ScoringEngine,
    demo_file_name: String,
    output_dir: Option<PathBuf>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator from its collaborators.
    pub fn new(
        config: &ForgeConfig,
        acquisition: Arc<dyn SourceAcquisition>,
        inspector: Arc<dyn Inspector>,
        demos: Arc<dyn DemoProvider>,
        execution: ExecutionEngine,
        scoring: ScoringEngine,
    ) -> Self {
        Self {
            acquisition,
            inspector,
            demos,
            execution,
            scoring,
            demo_file_name: config.demo_file_name.clone(),
            output_dir: Some(config.output_dir.clone()),
        }
    }

    /// Disables writing `run_result.json`.
    pub fn without_persistence(mut self) -> Self {
        self.output_dir = None;
        self
    }

    /// Runs the full pipeline for `paper_ref`. Never fails.
    pub async fn run(&self, paper_ref: &str) -> PipelineRun {
        let mut run = PipelineRun::new(paper_ref);
        info!(run_id = %run.run_id, paper = %paper_ref, "Starting pipeline run");

        match contain_panics(self.run_stages(&mut run)).await {
            Ok(()) => run.succeed(),
            Err(e) => self.record_failure(&mut run, e),
        }

        self.finish(&run).await;
        run
    }

    /// Scans `repo_path`, then executes and scores an existing demonstration.
    pub async fn evaluate(&self, demo_path: &Path, repo_path: &Path) -> PipelineRun {
        let mut run = PipelineRun::new(demo_path.display().to_string());
        info!(run_id = %run.run_id, demo = %demo_path.display(), "Starting evaluation run");

        match contain_panics(self.evaluate_stages(&mut run, demo_path, repo_path)).await {
            Ok(()) => run.succeed(),
            Err(e) => self.record_failure(&mut run, e),
        }

        self.finish(&run).await;
        run
    }

    async fn run_stages(&self, run: &mut PipelineRun) -> Result<(), PipelineError> {
        let paper_ref = run.input_ref.clone();

        let paper = self.acquisition.resolve(&paper_ref).await?;
        run.repo_refs = Some(paper.repo_refs.clone());
        if paper.repo_refs.is_empty() {
            return Err(AcquisitionError::NoRepositoryLinks.into());
        }

        let repository = self
            .acquisition
            .select_best(&paper.repo_refs, &paper.text)
            .await?;
        run.repository = Some(repository.clone());

        let local_path = self.acquisition.clone_repo(&repository).await?;
        run.local_path = Some(local_path.clone());
        info!(path = %local_path.display(), "Repository ready");

        let summary = self.scan(&local_path).await?;
        run.summary = Some(summary.clone());

        let source = self.demos.obtain_demo(&summary, &local_path).await?;
        run.demo_source = Some(source.clone());

        let demo_path = local_path.join(&self.demo_file_name);
        persist_demo(&demo_path, &source).await?;
        run.demo_file_path = Some(demo_path.clone());
        run.demo_sha256 = Some(sha256_hex(source.as_bytes()));

        self.execute_and_score(run, &source, &summary, &demo_path, &local_path)
            .await;
        Ok(())
    }

    async fn evaluate_stages(
        &self,
        run: &mut PipelineRun,
        demo_path: &Path,
        repo_path: &Path,
    ) -> Result<(), PipelineError> {
        // Absolute paths keep the demo resolvable from the repository root.
        let repo_path = &absolute(repo_path).await;
        let demo_path = &absolute(demo_path).await;
        run.local_path = Some(repo_path.clone());

        let summary = self.scan(repo_path).await?;
        run.summary = Some(summary.clone());

        // A missing demo is a FileNotFound outcome, not a pipeline failure.
        let source = tokio::fs::read_to_string(demo_path).await.unwrap_or_default();
        run.demo_source = Some(source.clone());
        run.demo_file_path = Some(demo_path.to_path_buf());
        run.demo_sha256 = Some(sha256_hex(source.as_bytes()));

        self.execute_and_score(run, &source, &summary, demo_path, repo_path)
            .await;
        Ok(())
    }

    async fn scan(&self, repo_path: &Path) -> Result<Summary, PipelineError> {
        let inspector = Arc::clone(&self.inspector);
        let path = repo_path.to_path_buf();
        let summary = tokio::task::spawn_blocking(move || inspector.scan(&path)).await??;
        info!(
            files = summary.num_files,
            languages = summary.languages.len(),
            demos = summary.demos.len(),
            "Repository scanned"
        );
        Ok(summary)
    }

    async fn execute_and_score(
        &self,
        run: &mut PipelineRun,
        source: &str,
        summary: &Summary,
        demo_path: &Path,
        repo_path: &Path,
    ) {
        let outcome = self.execution.execute(demo_path, repo_path).await;
        run.execution = Some(outcome.clone());

        let report = self.scoring.score(source, summary, &outcome).await;
        info!(score = %report, "Evaluation complete");
        run.score = Some(report);
    }

    fn record_failure(&self, run: &mut PipelineRun, e: PipelineError) {
        if e.is_domain() {
            warn!(run_id = %run.run_id, error = %e, "Pipeline failed");
        } else {
            error!(run_id = %run.run_id, error = ?e, "Pipeline failed unexpectedly");
        }
        run.fail(e.record_message());
    }

    async fn finish(&self, run: &PipelineRun) {
        info!(
            run_id = %run.run_id,
            status = %run.status,
            errors = run.errors.len(),
            "Pipeline run finished"
        );
        if let Some(ref output_dir) = self.output_dir {
            if let Err(e) = save_run(run, output_dir).await {
                warn!(run_id = %run.run_id, error = %e, "Failed to save run record");
            }
        }
    }
}

/// Turns a panic inside `stages` into [`PipelineError::Panicked`].
async fn contain_panics<F>(stages: F) -> Result<(), PipelineError>
where
    F: Future<Output = Result<(), PipelineError>>,
{
    AssertUnwindSafe(stages)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(PipelineError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

async fn absolute(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

async fn persist_demo(path: &Path, source: &str) -> Result<(), PipelineError> {
    tokio::fs::write(path, source)
        .await
        .map_err(|source| PipelineError::PersistDemo {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), bytes = source.len(), "Demonstration written");
    Ok(())
}

/// Writes `run` to `<output_dir>/<run_id>/run_result.json` and returns the path.
pub async fn save_run(run: &PipelineRun, output_dir: &Path) -> std::io::Result<PathBuf> {
    let run_dir = output_dir.join(&run.run_id);
    tokio::fs::create_dir_all(&run_dir).await?;

    let path = run_dir.join(RUN_RESULT_FILE);
    let json = serde_json::to_string_pretty(run)?;
    tokio::fs::write(&path, json).await?;
    debug!(path = %path.display(), "Saved run record");
    Ok(path)
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

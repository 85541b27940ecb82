//! repro_forge: automated research-artifact reproduction.
//!
//! Given a paper, this library locates its primary code repository, clones
//! and inspects it, obtains a runnable demonstration, executes it under a
//! hard deadline and scores the result with five deterministic checks plus
//! a bounded qualitative judgment.

// Core modules
pub mod execution;
pub mod pipeline;
pub mod scoring;

// Collaborators
pub mod acquisition;
pub mod inspector;
pub mod llm;
pub mod oracle;
pub mod synthesis;

// Ambient
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::ForgeConfig;
pub use error::{AcquisitionError, InspectionError, LlmError, SynthesisError};
pub use execution::{ExecutionEngine, ExecutionOutcome, ExecutionStatus};
pub use pipeline::{PipelineOrchestrator, PipelineRun, RunStatus};
pub use scoring::{ScoreReport, ScoringEngine};

//! Pipeline orchestration.
//!
//! # Stages
//!
//! 1. Resolve the paper and discover repository references
//! 2. Select the best reference
//! 3. Clone it
//! 4. Scan the clone
//! 5. Obtain a demonstration and write it into the clone
//! 6. Execute the demonstration
//! 7. Score the outcome
//!
//! A domain failure in stages 1-5 ends the run as `Failed` with one recorded
//! error. Execution problems are outcomes, not failures: they flow into
//! scoring and the run still ends as `Success`.

mod orchestrator;
mod run;

pub use orchestrator::{save_run, PipelineError, PipelineOrchestrator, RUN_RESULT_FILE};
pub use run::{PipelineRun, RunStatus};

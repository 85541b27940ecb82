//! Execution engine for generated demonstrations.
//!
//! Runs untrusted, best-effort demonstration code in a child process with a
//! hard wall-clock deadline and classifies what happened.
//!
//! # Flow
//!
//! ```text
//! demo file ─► exists? ─no─► FileNotFound
//!                 │
//!                 ▼
//!          syntax check ─fail─► SyntaxError   (nothing spawned, elapsed = 0)
//!                 │
//!                 ▼
//!       spawn in repo root ─spawn error─► SetupError
//!                 │
//!                 ▼
//!        wait ≤ deadline ─expired─► kill ─► TimedOut (partial stdout kept)
//!                 │
//!                 ▼
//!             Completed (exit code, stdout, stderr, elapsed)
//! ```
//!
//! This is not a security sandbox. The demonstration runs with the forge's
//! own privileges; only time and captured output are bounded.

mod engine;
mod interpreter;
mod outcome;

pub use engine::{ExecutionConfig, ExecutionEngine};
pub use interpreter::Interpreter;
pub use outcome::{ExecutionOutcome, ExecutionStatus, FILE_NOT_FOUND_MESSAGE};

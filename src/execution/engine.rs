//! Bounded execution of a demonstration file.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::interpreter::Interpreter;
use super::outcome::ExecutionOutcome;
use crate::config::{ForgeConfig, MAX_EXECUTION_TIME};

/// Deadline for the static syntax check.
const CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// How long output pipes may stay open after the demonstration exits.
/// Background grandchildren can hold them indefinitely.
const EXIT_GRACE: Duration = Duration::from_millis(500);

const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Interpreter used to check and run the demonstration.
    pub interpreter: Interpreter,
    /// Hard wall-clock deadline for the demonstration process.
    pub timeout: Duration,
    /// Maximum bytes retained per captured stream.
    pub max_output_bytes: usize,
}

impl ExecutionConfig {
    /// Creates a configuration with the default timeout and output cap.
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            timeout: MAX_EXECUTION_TIME,
            max_output_bytes: 64 * 1024,
        }
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the per-stream output cap.
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::new(Interpreter::default())
    }
}

impl From<&ForgeConfig> for ExecutionConfig {
    fn from(config: &ForgeConfig) -> Self {
        Self::new(Interpreter::python(config.interpreter.clone()))
            .with_timeout(config.execution_timeout)
            .with_max_output_bytes(config.max_output_bytes)
    }
}

/// Runs one demonstration attempt and classifies it.
///
/// Every call produces exactly one [`ExecutionOutcome`]; failures are
/// classified, never returned as errors. No retries.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    config: ExecutionConfig,
}

/// Why the static check rejected the file.
enum CheckFailure {
    Syntax(String),
    Setup(String),
}

impl ExecutionEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// Returns the wall-clock budget enforced on the demonstration.
    pub fn time_budget(&self) -> Duration {
        self.config.timeout
    }

    /// Checks and runs the demonstration at `demo_path` from `repo_root`.
    ///
    /// The syntax check runs in its own short-lived, compile-only interpreter
    /// process; the demonstration is the only process that executes user code.
    pub async fn execute(&self, demo_path: &Path, repo_root: &Path) -> ExecutionOutcome {
        info!(demo = %demo_path.display(), "Executing demonstration");

        if !demo_path.is_file() {
            warn!(demo = %demo_path.display(), "Demonstration file missing");
            return ExecutionOutcome::file_not_found();
        }

        match self.check_syntax(demo_path).await {
            Ok(()) => {}
            Err(CheckFailure::Syntax(message)) => {
                info!(demo = %demo_path.display(), "Syntax check failed, not executing");
                return ExecutionOutcome::syntax_error(message);
            }
            Err(CheckFailure::Setup(message)) => {
                return ExecutionOutcome::setup_error(message);
            }
        }

        let outcome = self.run_bounded(demo_path, repo_root).await;
        info!(
            status = %outcome.status,
            exit_code = outcome.exit_code,
            elapsed_secs = outcome.elapsed_seconds,
            "Demonstration finished"
        );
        outcome
    }

    /// Compile-only check through the interpreter. The demonstration itself is not run.
    async fn check_syntax(&self, demo_path: &Path) -> Result<(), CheckFailure> {
        let interp = &self.config.interpreter;
        let args = interp.check_command(demo_path);
        debug!(program = %interp.program, "Running syntax check");

        let child = Command::new(&interp.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CheckFailure::Setup(format!("Subprocess setup error: {}", e)))?;

        let output = match tokio::time::timeout(CHECK_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(CheckFailure::Setup(format!("Syntax check failed to run: {}", e)));
            }
            Err(_) => {
                return Err(CheckFailure::Setup(format!(
                    "Syntax check timed out after {} seconds.",
                    CHECK_TIMEOUT.as_secs()
                )));
            }
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                format!(
                    "SyntaxError: check exited with code {}",
                    output.status.code().unwrap_or(-1)
                )
            } else {
                stdout
            }
        } else {
            stderr
        };
        Err(CheckFailure::Syntax(message))
    }

    /// Spawns the demonstration and waits for it under the deadline.
    async fn run_bounded(&self, demo_path: &Path, repo_root: &Path) -> ExecutionOutcome {
        let interp = &self.config.interpreter;
        let target = demo_path
            .strip_prefix(repo_root)
            .unwrap_or(demo_path)
            .to_string_lossy()
            .to_string();

        let mut cmd = Command::new(&interp.program);
        cmd.args(interp.run_command(&target))
            .current_dir(repo_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &interp.env {
            cmd.env(key, value);
        }

        debug!(program = %interp.program, target = %target, cwd = %repo_root.display(), "Spawning demonstration");
        let start = Instant::now();
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return ExecutionOutcome::setup_error(format!("Subprocess setup error: {}", e)),
        };

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = CapturedStream::new(self.config.max_output_bytes);
        let mut stderr = CapturedStream::new(self.config.max_output_bytes);

        let (waited, elapsed) = {
            let drains = async {
                let (out, err) = tokio::join!(
                    drain(stdout_pipe.as_mut(), &mut stdout),
                    drain(stderr_pipe.as_mut(), &mut stderr),
                );
                if let Err(e) = out.and(err) {
                    warn!("Error reading demonstration output: {}", e);
                }
            };
            tokio::pin!(drains);
            let mut drained = false;

            let waited = tokio::time::timeout(self.config.timeout, async {
                tokio::select! {
                    status = child.wait() => status,
                    () = &mut drains => {
                        drained = true;
                        child.wait().await
                    }
                }
            })
            .await;
            let elapsed = start.elapsed().as_secs_f64();

            // Exit status decides completion; open pipes only get a grace period.
            if matches!(waited, Ok(Ok(_)))
                && !drained
                && tokio::time::timeout(EXIT_GRACE, &mut drains).await.is_err()
            {
                debug!("Output pipes still open after exit, keeping what was read");
            }
            (waited, elapsed)
        };

        match waited {
            Ok(Ok(status)) => ExecutionOutcome::completed(
                status.code().unwrap_or(-1),
                stdout.into_string(),
                stderr.into_string(),
                elapsed,
            ),
            Ok(Err(e)) => ExecutionOutcome::setup_error(format!("Subprocess wait error: {}", e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out demonstration: {}", e);
                }
                warn!(timeout_secs = self.config.timeout.as_secs(), "Demonstration timed out");
                ExecutionOutcome::timed_out(
                    stdout.into_string(),
                    format!(
                        "Execution timed out after {} seconds.",
                        self.config.timeout.as_secs_f64()
                    ),
                    elapsed,
                )
            }
        }
    }
}

/// Output buffer that keeps at most `cap` bytes and remembers truncation.
struct CapturedStream {
    buf: Vec<u8>,
    cap: usize,
    truncated: bool,
}

impl CapturedStream {
    fn new(cap: usize) -> Self {
        Self {
            buf: Vec::new(),
            cap,
            truncated: false,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        let room = self.cap.saturating_sub(self.buf.len());
        if bytes.len() > room {
            self.truncated = true;
        }
        self.buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn into_string(self) -> String {
        let mut text = String::from_utf8_lossy(&self.buf).to_string();
        if self.truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

/// Reads `reader` to EOF into `sink`. Partial content stays in `sink` if the
/// future is dropped.
async fn drain<R>(reader: Option<&mut R>, sink: &mut CapturedStream) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        sink.push(&chunk[..n]);
    }
}

//! Interpreter description for the single execution language.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Compiles the file named in `argv[1]` without executing it or writing bytecode.
const PYTHON_CHECK_SNIPPET: &str = r#"import sys
p = sys.argv[1]
try:
    src = open(p, encoding='utf-8').read()
    compile(src, p, 'exec')
except (SyntaxError, ValueError) as e:
    sys.stderr.write('%s: %s\n' % (type(e).__name__, e))
    sys.exit(1)
"#;

/// How to statically check and run a demonstration file.
///
/// The check is invoked as `program check_args... <absolute file>`, the run as
/// `program run_args... <file name>` from the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpreter {
    /// Interpreter binary.
    pub program: String,
    /// Arguments placed before the file path for the syntax check.
    pub check_args: Vec<String>,
    /// Arguments placed before the file name for the run.
    pub run_args: Vec<String>,
    /// Extra environment for the demonstration process.
    pub env: Vec<(String, String)>,
}

impl Interpreter {
    /// Python interpreter using `compile()` as the syntax check.
    pub fn python(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            check_args: vec!["-c".to_string(), PYTHON_CHECK_SNIPPET.to_string()],
            run_args: Vec::new(),
            env: vec![("PYTHONUNBUFFERED".to_string(), "1".to_string())],
        }
    }

    /// POSIX shell using `sh -n` as the syntax check.
    pub fn posix_shell() -> Self {
        Self {
            program: "sh".to_string(),
            check_args: vec!["-n".to_string()],
            run_args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable to the demonstration process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Full argument list for the syntax check.
    pub fn check_command(&self, file: &Path) -> Vec<String> {
        let mut args = self.check_args.clone();
        args.push(file.to_string_lossy().to_string());
        args
    }

    /// Full argument list for the run.
    pub fn run_command(&self, file_name: &str) -> Vec<String> {
        let mut args = self.run_args.clone();
        args.push(file_name.to_string());
        args
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::python("python3")
    }
}

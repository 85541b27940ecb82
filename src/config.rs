//! Runtime configuration for the forge.
//!
//! All tunables and credentials live in one [`ForgeConfig`] value that is
//! built once at startup and handed to each collaborator's constructor.
//! Nothing below this module reads the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Hard wall-clock budget for a single demonstration run.
pub const MAX_EXECUTION_TIME: Duration = Duration::from_secs(30);

/// File name the demonstration is persisted under, inside the repository root.
pub const DEFAULT_DEMO_FILE_NAME: &str = "demo_generated.py";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for a forge run.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    // LLM settings
    /// Base URL of the OpenAI-compatible API.
    pub llm_api_base: String,
    /// API key for the LLM endpoint.
    pub llm_api_key: Option<String>,
    /// Model used for the qualitative judgment.
    pub judge_model: String,
    /// Model used to validate and generate demonstrations.
    pub generator_model: String,

    // Acquisition settings
    /// Optional GitHub token for repository metadata lookups.
    pub github_token: Option<String>,
    /// Directory repositories are cloned into.
    pub workspace_dir: PathBuf,
    /// Directory run records are written to.
    pub output_dir: PathBuf,

    // Execution settings
    /// Wall-clock deadline for the demonstration process.
    pub execution_timeout: Duration,
    /// Interpreter binary used to check and run demonstrations.
    pub interpreter: String,
    /// Maximum bytes retained per captured stream.
    pub max_output_bytes: usize,
    /// Demonstration file name inside the cloned repository.
    pub demo_file_name: String,

    // Synthesis settings
    /// Upper bound on existing demo files offered for validation.
    pub max_demo_candidates: usize,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            llm_api_base: "https://api.openai.com/v1".to_string(),
            llm_api_key: None,
            judge_model: "gpt-4o-mini".to_string(),
            generator_model: "gpt-4o-mini".to_string(),

            github_token: None,
            workspace_dir: PathBuf::from("./ImportedProjects"),
            output_dir: PathBuf::from("./runs"),

            execution_timeout: MAX_EXECUTION_TIME,
            interpreter: "python3".to_string(),
            max_output_bytes: 64 * 1024,
            demo_file_name: DEFAULT_DEMO_FILE_NAME.to_string(),

            max_demo_candidates: 5,
        }
    }
}

impl ForgeConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REPRO_LLM_API_BASE`: LLM API base URL (default: https://api.openai.com/v1)
    /// - `REPRO_LLM_API_KEY`: LLM API key, falls back to `OPENAI_API_KEY`
    /// - `REPRO_JUDGE_MODEL`: judgment model (default: gpt-4o-mini)
    /// - `REPRO_GENERATOR_MODEL`: generation model (default: gpt-4o-mini)
    /// - `GITHUB_TOKEN`: GitHub API token (optional)
    /// - `REPRO_WORKSPACE_DIR`: clone directory (default: ./ImportedProjects)
    /// - `REPRO_OUTPUT_DIR`: run record directory (default: ./runs)
    /// - `REPRO_EXECUTION_TIMEOUT_SECS`: demonstration deadline (default: 30)
    /// - `REPRO_INTERPRETER`: interpreter binary (default: python3)
    /// - `REPRO_MAX_OUTPUT_BYTES`: per-stream capture cap (default: 65536)
    /// - `REPRO_DEMO_FILE_NAME`: demonstration file name (default: demo_generated.py)
    /// - `REPRO_MAX_DEMO_CANDIDATES`: existing demos offered for validation (default: 5)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("REPRO_LLM_API_BASE") {
            config.llm_api_base = val.trim_end_matches('/').to_string();
        }
        config.llm_api_key = lookup("REPRO_LLM_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .filter(|k| !k.trim().is_empty());
        if let Some(val) = lookup("REPRO_JUDGE_MODEL") {
            config.judge_model = val;
        }
        if let Some(val) = lookup("REPRO_GENERATOR_MODEL") {
            config.generator_model = val;
        }

        config.github_token = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty());
        if let Some(val) = lookup("REPRO_WORKSPACE_DIR") {
            config.workspace_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("REPRO_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(val);
        }

        if let Some(val) = lookup("REPRO_EXECUTION_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "REPRO_EXECUTION_TIMEOUT_SECS")?;
            config.execution_timeout = Duration::from_secs(secs);
        }
        if let Some(val) = lookup("REPRO_INTERPRETER") {
            config.interpreter = val;
        }
        if let Some(val) = lookup("REPRO_MAX_OUTPUT_BYTES") {
            config.max_output_bytes = parse_env_value(&val, "REPRO_MAX_OUTPUT_BYTES")?;
        }
        if let Some(val) = lookup("REPRO_DEMO_FILE_NAME") {
            config.demo_file_name = val;
        }
        if let Some(val) = lookup("REPRO_MAX_DEMO_CANDIDATES") {
            config.max_demo_candidates = parse_env_value(&val, "REPRO_MAX_DEMO_CANDIDATES")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.llm_api_base.starts_with("http://") || self.llm_api_base.starts_with("https://"))
        {
            return Err(ConfigError::ValidationFailed(format!(
                "llm_api_base must be an http(s) URL, got '{}'",
                self.llm_api_base
            )));
        }

        if self.execution_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "execution_timeout must be greater than 0".to_string(),
            ));
        }

        if self.interpreter.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "interpreter cannot be empty".to_string(),
            ));
        }

        if self.max_output_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_output_bytes must be greater than 0".to_string(),
            ));
        }

        let bare_name = Path::new(&self.demo_file_name)
            .file_name()
            .map(|n| n == self.demo_file_name.as_str())
            .unwrap_or(false);
        if !bare_name {
            return Err(ConfigError::ValidationFailed(format!(
                "demo_file_name must be a bare file name, got '{}'",
                self.demo_file_name
            )));
        }

        Ok(())
    }

    /// Builder method to set the execution timeout.
    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Builder method to set the interpreter binary.
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Builder method to set the clone directory.
    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = dir.into();
        self
    }

    /// Builder method to set the run record directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to set the LLM API key.
    pub fn with_llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.llm_api_key = Some(key.into());
        self
    }

    /// Builder method to set the demonstration file name.
    pub fn with_demo_file_name(mut self, name: impl Into<String>) -> Self {
        self.demo_file_name = name.into();
        self
    }
}

/// Parses an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(val: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    val.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ForgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.execution_timeout, Duration::from_secs(30));
        assert_eq!(config.demo_file_name, "demo_generated.py");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ForgeConfig::from_lookup(lookup_from(&[
            ("REPRO_EXECUTION_TIMEOUT_SECS", "5"),
            ("REPRO_INTERPRETER", "python3.11"),
            ("OPENAI_API_KEY", "sk-test"),
            ("REPRO_LLM_API_BASE", "http://localhost:4000/"),
        ]))
        .unwrap();

        assert_eq!(config.execution_timeout, Duration::from_secs(5));
        assert_eq!(config.interpreter, "python3.11");
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm_api_base, "http://localhost:4000");
    }

    #[test]
    fn test_repro_key_takes_precedence() {
        let config = ForgeConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-openai"),
            ("REPRO_LLM_API_KEY", "sk-repro"),
        ]))
        .unwrap();
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-repro"));
    }

    #[test]
    fn test_invalid_numeric_value() {
        let err = ForgeConfig::from_lookup(lookup_from(&[(
            "REPRO_EXECUTION_TIMEOUT_SECS",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "REPRO_EXECUTION_TIMEOUT_SECS"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ForgeConfig::default().with_execution_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_demo_file_name_must_be_bare() {
        let config = ForgeConfig::default().with_demo_file_name("../escape.py");
        assert!(config.validate().is_err());

        let config = ForgeConfig::default().with_demo_file_name("");
        assert!(config.validate().is_err());

        let config = ForgeConfig::default().with_demo_file_name("run_me.py");
        assert!(config.validate().is_ok());
    }
}

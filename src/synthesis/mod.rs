//! Demonstration synthesizer.
//!
//! Prefers an existing demo file that the generation oracle accepts as a
//! runnable demonstration; otherwise asks the oracle to write one. Candidate
//! iteration is bounded by `max_demo_candidates`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ForgeConfig;
use crate::error::SynthesisError;
use crate::inspector::Summary;
use crate::oracle::{strip_code_fences, DemoOracle};

/// Existing files larger than this are never offered for validation.
const MAX_CANDIDATE_BYTES: u64 = 64 * 1024;
/// Characters of README text passed to generation.
const README_EXCERPT_CHARS: usize = 4000;

/// Obtains demonstration source text for a scanned repository.
#[async_trait]
pub trait DemoProvider: Send + Sync {
    async fn obtain_demo(&self, summary: &Summary, repo_path: &Path) -> Result<String, SynthesisError>;
}

/// Oracle-backed [`DemoProvider`].
pub struct DemoSynthesizer {
    oracle: Arc<dyn DemoOracle>,
    max_candidates: usize,
}

impl DemoSynthesizer {
    /// Creates a synthesizer offering at most `max_candidates` existing files.
    pub fn new(oracle: Arc<dyn DemoOracle>, max_candidates: usize) -> Self {
        Self {
            oracle,
            max_candidates,
        }
    }

    /// Creates a synthesizer using the candidate bound from `config`.
    pub fn from_config(oracle: Arc<dyn DemoOracle>, config: &ForgeConfig) -> Self {
        Self::new(oracle, config.max_demo_candidates)
    }

    /// Returns the first existing demo accepted by the oracle.
    async fn validate_existing(&self, summary: &Summary, repo_path: &Path) -> Option<String> {
        let candidates = summary
            .demos
            .iter()
            .filter(|path| path.ends_with(".py"))
            .take(self.max_candidates);

        for candidate in candidates {
            let Some(source) = read_candidate(&repo_path.join(candidate)).await else {
                tracing::debug!(candidate = %candidate, "Skipping unreadable or oversized candidate");
                continue;
            };

            match self.oracle.validate(summary, candidate, &source).await {
                Ok(true) => {
                    tracing::info!(candidate = %candidate, "Existing demo accepted");
                    return Some(source);
                }
                Ok(false) => {
                    tracing::debug!(candidate = %candidate, "Existing demo rejected");
                }
                Err(e) => {
                    tracing::warn!(candidate = %candidate, error = %e, "Validation failed, skipping candidate");
                }
            }
        }
        None
    }
}

#[async_trait]
impl DemoProvider for DemoSynthesizer {
    async fn obtain_demo(&self, summary: &Summary, repo_path: &Path) -> Result<String, SynthesisError> {
        if let Some(source) = self.validate_existing(summary, repo_path).await {
            return Ok(source);
        }

        let readme = read_readme_excerpt(repo_path).await;
        tracing::info!(has_readme = readme.is_some(), "Generating a new demonstration");

        let raw = self.oracle.generate(summary, readme.as_deref()).await?;
        let source = strip_code_fences(&raw);
        if source.trim().is_empty() {
            return Err(SynthesisError::EmptyDemo);
        }
        tracing::debug!(bytes = source.len(), "Generated demonstration");
        Ok(source)
    }
}

async fn read_candidate(path: &Path) -> Option<String> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() || metadata.len() > MAX_CANDIDATE_BYTES {
        return None;
    }
    tokio::fs::read_to_string(path).await.ok()
}

/// Reads the start of the first `README*` file in the repository root.
async fn read_readme_excerpt(repo_path: &Path) -> Option<String> {
    let mut entries = tokio::fs::read_dir(repo_path).await.ok()?;
    let mut readmes = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.to_ascii_lowercase().starts_with("readme") {
            readmes.push(entry.path());
        }
    }
    readmes.sort();

    for path in readmes {
        if let Ok(bytes) = tokio::fs::read(&path).await {
            let text = String::from_utf8_lossy(&bytes);
            let excerpt: String = text.chars().take(README_EXCERPT_CHARS).collect();
            if !excerpt.trim().is_empty() {
                return Some(excerpt);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;
    use crate::error::LlmError;

    /// Accepts only files whose source contains `accept_marker`.
    struct ScriptedOracle {
        accept_marker: Option<&'static str>,
        generated: Result<&'static str, ()>,
        validated: Mutex<Vec<String>>,
        readme_seen: Mutex<Option<String>>,
    }

    impl ScriptedOracle {
        fn new(accept_marker: Option<&'static str>, generated: Result<&'static str, ()>) -> Arc<Self> {
            Arc::new(Self {
                accept_marker,
                generated,
                validated: Mutex::new(Vec::new()),
                readme_seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl DemoOracle for ScriptedOracle {
        async fn validate(&self, _summary: &Summary, path: &str, source: &str) -> Result<bool, LlmError> {
            self.validated.lock().unwrap().push(path.to_string());
            Ok(self.accept_marker.map(|m| source.contains(m)).unwrap_or(false))
        }

        async fn generate(&self, _summary: &Summary, readme: Option<&str>) -> Result<String, LlmError> {
            *self.readme_seen.lock().unwrap() = readme.map(str::to_string);
            self.generated
                .map(str::to_string)
                .map_err(|_| LlmError::RequestFailed("connection refused".to_string()))
        }
    }

    fn repo_with_demos(demos: &[(&str, &str)]) -> (TempDir, Summary) {
        let dir = TempDir::new().unwrap();
        let mut summary = Summary::default();
        for (path, content) in demos {
            let full = dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(&full, content).unwrap();
            summary.demos.push(path.to_string());
        }
        (dir, summary)
    }

    #[tokio::test]
    async fn test_accepts_first_valid_candidate() {
        let (dir, summary) = repo_with_demos(&[
            ("examples/a_demo.py", "print('draft')"),
            ("examples/b_demo.py", "print('RUNNABLE')"),
            ("examples/c_demo.py", "print('RUNNABLE too')"),
        ]);
        let oracle = ScriptedOracle::new(Some("RUNNABLE"), Err(()));
        let synth = DemoSynthesizer::new(oracle.clone(), 5);

        let source = synth.obtain_demo(&summary, dir.path()).await.unwrap();
        assert_eq!(source, "print('RUNNABLE')");
        assert_eq!(oracle.validated.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_candidate_iteration_is_bounded() {
        let (dir, summary) = repo_with_demos(&[
            ("demo1.py", "x = 1"),
            ("demo2.py", "x = 2"),
            ("demo3.py", "x = 3"),
            ("demo_notes.md", "not python"),
        ]);
        let oracle = ScriptedOracle::new(None, Ok("print('generated')"));
        let synth = DemoSynthesizer::new(oracle.clone(), 2);

        let source = synth.obtain_demo(&summary, dir.path()).await.unwrap();
        assert_eq!(source, "print('generated')");
        assert_eq!(
            *oracle.validated.lock().unwrap(),
            vec!["demo1.py".to_string(), "demo2.py".to_string()]
        );
    }

    #[tokio::test]
    async fn test_generation_gets_readme_and_strips_fences() {
        let (dir, summary) = repo_with_demos(&[]);
        std::fs::write(dir.path().join("README.md"), "# Tiny model\nUsage: run it").unwrap();
        let oracle = ScriptedOracle::new(None, Ok("```python\nprint('hi')\n```"));
        let synth = DemoSynthesizer::new(oracle.clone(), 5);

        let source = synth.obtain_demo(&summary, dir.path()).await.unwrap();
        assert_eq!(source, "print('hi')");
        let readme = oracle.readme_seen.lock().unwrap().clone().unwrap();
        assert!(readme.starts_with("# Tiny model"));
    }

    #[tokio::test]
    async fn test_empty_generation_is_an_error() {
        let (dir, summary) = repo_with_demos(&[]);
        let synth = DemoSynthesizer::new(ScriptedOracle::new(None, Ok("```\n```")), 5);
        let err = synth.obtain_demo(&summary, dir.path()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::EmptyDemo));
    }

    #[tokio::test]
    async fn test_oracle_outage_surfaces_as_synthesis_error() {
        let (dir, summary) = repo_with_demos(&[]);
        let synth = DemoSynthesizer::new(ScriptedOracle::new(None, Err(())), 5);
        let err = synth.obtain_demo(&summary, dir.path()).await.unwrap_err();
        assert!(matches!(err, SynthesisError::Oracle(LlmError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_oversized_candidate_is_skipped() {
        let big = "#".repeat((MAX_CANDIDATE_BYTES + 1) as usize);
        let (dir, summary) = repo_with_demos(&[("demo.py", big.as_str())]);
        let oracle = ScriptedOracle::new(Some("#"), Ok("print(1)"));
        let synth = DemoSynthesizer::new(oracle.clone(), 5);

        assert_eq!(synth.obtain_demo(&summary, dir.path()).await.unwrap(), "print(1)");
        assert!(oracle.validated.lock().unwrap().is_empty());
    }
}

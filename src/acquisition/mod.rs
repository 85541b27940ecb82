//! Source acquisition: paper reference to cloned repository.
//!
//! ```text
//! paper ref ─► bytes (download or disk) ─► text (pdftotext / utf-8)
//!           ─► repo refs (link regex) ─► best ref (mentions + GitHub metadata)
//!           ─► local clone (git clone --depth 1)
//! ```

mod clone;
pub mod github;
pub mod links;
pub mod paper;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ForgeConfig;
use crate::error::AcquisitionError;

pub use clone::clone_repo;
pub use github::{candidate_score, GitHubClient, MetadataLookup, RepoMetadata};
pub use links::{extract_repo_refs, RepoRef};

/// Paper text plus the repositories it mentions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperSource {
    pub text: String,
    pub repo_refs: Vec<RepoRef>,
}

/// Resolves papers, picks their repository and clones it.
#[async_trait]
pub trait SourceAcquisition: Send + Sync {
    /// Fetches the paper and discovers candidate repositories.
    async fn resolve(&self, paper_ref: &str) -> Result<PaperSource, AcquisitionError>;

    /// Picks the repository most likely to be the paper's primary code.
    async fn select_best(
        &self,
        candidates: &[RepoRef],
        paper_text: &str,
    ) -> Result<RepoRef, AcquisitionError>;

    /// Clones the repository and returns its local path.
    async fn clone_repo(&self, repo: &RepoRef) -> Result<PathBuf, AcquisitionError>;
}

/// Default [`SourceAcquisition`] over HTTP, GitHub and `git`.
pub struct PaperAcquirer {
    http: Client,
    github: GitHubClient,
    workspace_dir: PathBuf,
}

impl PaperAcquirer {
    /// Creates an acquirer from the forge configuration.
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            github: GitHubClient::new(config.github_token.clone()),
            workspace_dir: config.workspace_dir.clone(),
        }
    }

    /// Replaces the GitHub client.
    pub fn with_github(mut self, github: GitHubClient) -> Self {
        self.github = github;
        self
    }

    /// Directory repositories are cloned into.
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }
}

#[async_trait]
impl SourceAcquisition for PaperAcquirer {
    async fn resolve(&self, paper_ref: &str) -> Result<PaperSource, AcquisitionError> {
        let bytes = if paper::is_remote(paper_ref) {
            paper::download(&self.http, paper_ref).await?
        } else {
            paper::read_local(Path::new(paper_ref)).await?
        };

        let text = paper::extract_text(&bytes, paper_ref).await?;
        let repo_refs = extract_repo_refs(&text);
        tracing::info!(
            chars = text.len(),
            repositories = repo_refs.len(),
            "Resolved paper"
        );
        Ok(PaperSource { text, repo_refs })
    }

    async fn select_best(
        &self,
        candidates: &[RepoRef],
        paper_text: &str,
    ) -> Result<RepoRef, AcquisitionError> {
        match candidates {
            [] => return Err(AcquisitionError::NoRepositoryLinks),
            [only] => return Ok(only.clone()),
            _ => {}
        }

        let mut best: Option<(f64, &RepoRef)> = None;
        for candidate in candidates {
            let metadata = match self.github.lookup(candidate).await {
                MetadataLookup::Found(metadata) => Some(metadata),
                MetadataLookup::Missing => {
                    tracing::info!(repo = %candidate.slug(), "Repository does not exist, discarding");
                    continue;
                }
                MetadataLookup::Unavailable => None,
            };

            let score = candidate_score(candidate, paper_text, metadata.as_ref());
            tracing::debug!(repo = %candidate.slug(), score, "Scored repository candidate");
            if best.map(|(top, _)| score > top).unwrap_or(true) {
                best = Some((score, candidate));
            }
        }

        let selected = match best {
            Some((_, repo)) => repo.clone(),
            None => {
                tracing::warn!("Every candidate was reported missing, falling back to the first");
                candidates[0].clone()
            }
        };
        tracing::info!(repo = %selected.slug(), "Selected repository");
        Ok(selected)
    }

    async fn clone_repo(&self, repo: &RepoRef) -> Result<PathBuf, AcquisitionError> {
        clone_repo(repo, &self.workspace_dir).await
    }
}

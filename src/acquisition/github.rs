//! GitHub REST metadata and repository selection scoring.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::links::RepoRef;

/// Weight of each mention of the repository name in the paper text.
const NAME_MENTION_WEIGHT: f64 = 2.0;
/// Weight of each mention of the owner in the paper text.
const OWNER_MENTION_WEIGHT: f64 = 1.0;
/// Subtracted from forks, which are rarely the paper's primary code.
const FORK_PENALTY: f64 = 3.0;
/// Mentions beyond this count add nothing.
const MAX_COUNTED_MENTIONS: usize = 10;

/// The subset of `GET /repos/{owner}/{repo}` used for selection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RepoMetadata {
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub fork: bool,
}

/// What the GitHub API said about a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataLookup {
    Found(RepoMetadata),
    /// The API answered 404: the repository does not exist (or is private).
    Missing,
    /// The API could not be asked; selection proceeds without metadata.
    Unavailable,
}

/// Minimal GitHub REST client.
pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    api_base: String,
}

impl GitHubClient {
    /// Creates a client with an optional token.
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| Client::new()),
            token,
            api_base: "https://api.github.com".to_string(),
        }
    }

    /// Points the client at a different API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Looks up repository metadata. Never fails; problems become `Unavailable`.
    pub async fn lookup(&self, repo: &RepoRef) -> MetadataLookup {
        let url = format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name);

        let mut request = self
            .client
            .get(&url)
            .header("User-Agent", "repro_forge/0.1")
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(repo = %repo.slug(), error = %e, "GitHub metadata request failed");
                return MetadataLookup::Unavailable;
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return MetadataLookup::Missing;
        }
        if !status.is_success() {
            tracing::warn!(repo = %repo.slug(), status = %status, "GitHub API returned error");
            return MetadataLookup::Unavailable;
        }

        match response.json::<RepoMetadata>().await {
            Ok(metadata) => MetadataLookup::Found(metadata),
            Err(e) => {
                tracing::warn!(repo = %repo.slug(), error = %e, "Failed to parse GitHub metadata");
                MetadataLookup::Unavailable
            }
        }
    }
}

/// Relevance of a candidate to the paper. Higher is better.
pub fn candidate_score(repo: &RepoRef, paper_text: &str, metadata: Option<&RepoMetadata>) -> f64 {
    let text = paper_text.to_lowercase();
    let name_mentions = count_mentions(&text, &repo.name.to_lowercase());
    let owner_mentions = count_mentions(&text, &repo.owner.to_lowercase());

    let mut score = name_mentions as f64 * NAME_MENTION_WEIGHT + owner_mentions as f64 * OWNER_MENTION_WEIGHT;
    if let Some(metadata) = metadata {
        score += (1.0 + metadata.stargazers_count as f64).ln();
        if metadata.fork {
            score -= FORK_PENALTY;
        }
    }
    score
}

fn count_mentions(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).take(MAX_COUNTED_MENTIONS).count()
}

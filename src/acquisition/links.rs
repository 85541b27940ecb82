//! GitHub repository reference discovery in free text.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AcquisitionError;

/// First path segments on github.com that are not user or organization names.
const NON_REPO_OWNERS: &[&str] = &[
    "about",
    "apps",
    "collections",
    "contact",
    "customer-stories",
    "enterprise",
    "events",
    "explore",
    "features",
    "login",
    "marketplace",
    "orgs",
    "pricing",
    "security",
    "settings",
    "site",
    "sponsors",
    "topics",
    "trending",
];

/// A GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Creates a reference, rejecting names unsafe for paths or commands.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, AcquisitionError> {
        let repo = Self {
            owner: owner.into(),
            name: name.into(),
        };
        if is_safe_segment(&repo.owner) && is_safe_segment(&repo.name) {
            Ok(repo)
        } else {
            Err(AcquisitionError::InvalidRepository(repo.slug()))
        }
    }

    /// HTTPS clone URL.
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }

    /// `owner/name`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Directory name used for the local clone.
    pub fn dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && !segment.starts_with('-')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/([A-Za-z0-9][A-Za-z0-9-]*)/([A-Za-z0-9._-]+)")
            .expect("Invalid regex for GitHub links")
    })
}

/// Finds every distinct GitHub repository mentioned in `text`, in first-seen order.
///
/// Sub-paths (`/tree/main/...`, `/blob/...`), a `.git` suffix and trailing
/// sentence punctuation are dropped; comparison is case-insensitive.
pub fn extract_repo_refs(text: &str) -> Vec<RepoRef> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for caps in link_pattern().captures_iter(text) {
        let owner = &caps[1];
        if NON_REPO_OWNERS.contains(&owner.to_ascii_lowercase().as_str()) {
            continue;
        }

        let name = normalize_name(&caps[2]);
        let Ok(repo) = RepoRef::new(owner, name) else {
            continue;
        };
        if seen.insert(repo.slug().to_ascii_lowercase()) {
            refs.push(repo);
        }
    }

    tracing::debug!(count = refs.len(), "Extracted repository references");
    refs
}

fn normalize_name(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches('.');
    let without_git = if trimmed.len() > 4 && trimmed.to_ascii_lowercase().ends_with(".git") {
        &trimmed[..trimmed.len() - 4]
    } else {
        trimmed
    };
    without_git.trim_end_matches('.')
}

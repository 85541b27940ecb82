//! Structured repository summary produced by the inspector.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Immutable snapshot of a cloned repository's layout.
///
/// Created once per run by [`super::RepositoryScanner`] and only ever read
/// afterwards, by the demonstration synthesizer and as judgment context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of files seen (after directory pruning).
    pub num_files: usize,
    /// Languages detected from file extensions.
    pub languages: BTreeSet<String>,
    /// Relative folder paths; the repository root is `""`.
    pub folders: BTreeSet<String>,
    /// Configuration and dependency manifest files.
    pub configs: Vec<String>,
    /// Files that look like model definitions or weights.
    pub models: Vec<String>,
    /// Existing demo, example or tutorial files.
    pub demos: Vec<String>,
    /// Runnable entrypoints.
    pub entrypoints: Vec<String>,
}

impl Summary {
    /// Returns true if the repository contains code in `language`.
    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains(language)
    }

    /// Pretty JSON rendering used in oracle prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

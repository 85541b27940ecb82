//! Shallow repository cloning with `git`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use super::links::RepoRef;
use crate::error::AcquisitionError;

/// Upper bound on a single `git clone`.
const CLONE_TIMEOUT: Duration = Duration::from_secs(300);

/// Clones `repo` into `<workspace>/<owner>__<name>` and returns that path.
///
/// An existing checkout (a directory containing `.git`) is reused as-is.
pub async fn clone_repo(repo: &RepoRef, workspace: &Path) -> Result<PathBuf, AcquisitionError> {
    let target = workspace.join(repo.dir_name());

    if target.join(".git").is_dir() {
        tracing::info!(path = %target.display(), "Repository already cloned, reusing");
        return Ok(target);
    }
    if target.exists() {
        tracing::warn!(path = %target.display(), "Removing incomplete clone directory");
        tokio::fs::remove_dir_all(&target).await?;
    }
    tokio::fs::create_dir_all(workspace).await?;

    let url = repo.url();
    tracing::info!(url = %url, path = %target.display(), "Cloning repository");

    let mut command = Command::new("git");
    command
        .args(["clone", "--depth", "1", "--quiet", &url])
        .arg(&target)
        .env("GIT_TERMINAL_PROMPT", "0")
        .kill_on_drop(true);

    let output = match tokio::time::timeout(CLONE_TIMEOUT, command.output()).await {
        Ok(result) => result.map_err(|e| AcquisitionError::CloneFailed {
            url: url.clone(),
            stderr: format!("failed to run git: {e}"),
        })?,
        Err(_) => {
            return Err(AcquisitionError::CloneFailed {
                url,
                stderr: format!("git clone timed out after {}s", CLONE_TIMEOUT.as_secs()),
            })
        }
    };

    if !output.status.success() {
        return Err(AcquisitionError::CloneFailed {
            url,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(target)
}

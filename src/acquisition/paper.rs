//! Paper download and plain-text extraction.

use std::path::Path;

use reqwest::Client;
use tokio::process::Command;

use crate::error::AcquisitionError;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Returns true if `paper_ref` should be downloaded rather than read from disk.
pub fn is_remote(paper_ref: &str) -> bool {
    let lower = paper_ref.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Returns true if `bytes` start with the PDF header.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}

/// Downloads a paper.
pub async fn download(client: &Client, url: &str) -> Result<Vec<u8>, AcquisitionError> {
    tracing::info!(url = %url, "Downloading paper");
    let download_error = |reason: String| AcquisitionError::Download {
        url: url.to_string(),
        reason,
    };

    let response = client
        .get(url)
        .header("User-Agent", "repro_forge/0.1")
        .send()
        .await
        .map_err(|e| download_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(download_error(format!("HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_error(e.to_string()))?;
    tracing::debug!(bytes = bytes.len(), "Paper downloaded");
    Ok(bytes.to_vec())
}

/// Reads a paper from a local path.
pub async fn read_local(path: &Path) -> Result<Vec<u8>, AcquisitionError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| AcquisitionError::PaperUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Turns paper bytes into plain text.
///
/// PDFs go through `pdftotext -layout`; anything else is decoded as UTF-8.
pub async fn extract_text(bytes: &[u8], label: &str) -> Result<String, AcquisitionError> {
    if !is_pdf(bytes) {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let extraction_error = |reason: String| AcquisitionError::TextExtraction {
        path: label.to_string(),
        reason,
    };

    let scratch = tempfile::Builder::new()
        .prefix("repro-forge-paper-")
        .suffix(".pdf")
        .tempfile()?;
    tokio::fs::write(scratch.path(), bytes).await?;

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(scratch.path())
        .arg("-")
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| extraction_error(format!("failed to run pdftotext: {e}")))?;

    if !output.status.success() {
        return Err(extraction_error(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    tracing::debug!(chars = text.len(), "Extracted paper text");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_kinds() {
        assert!(is_remote("https://arxiv.org/pdf/2401.00001"));
        assert!(is_remote("HTTP://example.org/paper.pdf"));
        assert!(!is_remote("./papers/paper.pdf"));
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"plain text"));
    }

    #[tokio::test]
    async fn test_plain_text_passes_through() {
        let text = extract_text(b"Code at github.com/alice/tinynet", "paper.txt")
            .await
            .unwrap();
        assert_eq!(text, "Code at github.com/alice/tinynet");
    }

    #[tokio::test]
    async fn test_read_local_missing_file() {
        let err = read_local(Path::new("/nonexistent/paper.pdf")).await.unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::PaperUnreadable { ref path, .. } if path == "/nonexistent/paper.pdf"
        ));
    }
}

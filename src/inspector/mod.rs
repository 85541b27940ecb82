//! Repository inspection.
//!
//! Walks a cloned repository and produces a [`Summary`]: languages, folders,
//! config files, model files, existing demos and entrypoints. Nothing here
//! executes repository code.

mod summary;

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

use crate::error::InspectionError;

pub use summary::Summary;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    "target",
    "dist",
    "build",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".eggs",
];

const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "json", "toml", "cfg", "ini"];
const CONFIG_FILES: &[&str] = &["setup.py", "pyproject.toml", "environment.yml", "Makefile"];
const MODEL_KEYWORDS: &[&str] = &["model", "net", "network", "checkpoint"];
const WEIGHT_EXTENSIONS: &[&str] = &["pt", "pth", "ckpt", "h5", "onnx", "safetensors"];
const DEMO_KEYWORDS: &[&str] = &["demo", "example", "tutorial", "quickstart", "notebook"];
const ENTRYPOINT_FILES: &[&str] = &["main.py", "run.py", "app.py", "cli.py", "__main__.py"];

/// Entrypoint marker scanning is skipped for files larger than this.
const MAX_SCAN_BYTES: u64 = 512 * 1024;

/// Inspector capability used by the pipeline.
pub trait Inspector: Send + Sync {
    /// Produce a summary of the repository rooted at `repo_path`.
    fn scan(&self, repo_path: &Path) -> Result<Summary, InspectionError>;
}

/// Filesystem walker implementing [`Inspector`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryScanner {
    /// File names excluded from demos and entrypoints (the forge's own output).
    ignored_files: Vec<String>,
}

impl RepositoryScanner {
    /// Creates a scanner with no ignored files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes a file name from demo and entrypoint detection.
    pub fn ignoring(mut self, file_name: impl Into<String>) -> Self {
        self.ignored_files.push(file_name.into());
        self
    }

    fn is_ignored(&self, rel: &str) -> bool {
        let name = file_name(rel);
        self.ignored_files.iter().any(|f| f == name)
    }
}

impl Inspector for RepositoryScanner {
    fn scan(&self, repo_path: &Path) -> Result<Summary, InspectionError> {
        if !repo_path.is_dir() {
            return Err(InspectionError::NotADirectory(
                repo_path.display().to_string(),
            ));
        }

        let mut summary = Summary::default();
        summary.folders.insert(String::new());
        let mut languages = BTreeSet::new();

        let walker = WalkDir::new(repo_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e));

        for entry in walker {
            let entry = entry?;
            let rel = match entry.path().strip_prefix(repo_path) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
                _ => continue,
            };

            if entry.file_type().is_dir() {
                summary.folders.insert(rel);
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            summary.num_files += 1;
            let ext = extension(&rel);

            if let Some(language) = language_for(&ext) {
                languages.insert(language.to_string());
            }
            if is_config(&rel, &ext) {
                summary.configs.push(rel.clone());
            }
            if is_model(&rel, &ext) {
                summary.models.push(rel.clone());
            }
            if self.is_ignored(&rel) {
                continue;
            }
            if is_demo(&rel, &ext) {
                summary.demos.push(rel.clone());
            }
            if is_entrypoint(entry.path(), &rel, &ext) {
                summary.entrypoints.push(rel);
            }
        }

        summary.languages = languages;
        summary.configs.sort();
        summary.models.sort();
        summary.demos.sort();
        summary.entrypoints.sort();

        tracing::debug!(
            files = summary.num_files,
            languages = ?summary.languages,
            demos = summary.demos.len(),
            entrypoints = summary.entrypoints.len(),
            "Repository scan complete"
        );

        Ok(summary)
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
}

fn file_name(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

fn extension(rel: &str) -> String {
    let name = file_name(rel);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

fn language_for(ext: &str) -> Option<&'static str> {
    match ext {
        "py" => Some("python"),
        "ipynb" => Some("jupyter"),
        "js" | "jsx" | "mjs" => Some("javascript"),
        "ts" | "tsx" => Some("typescript"),
        "c" | "h" => Some("c"),
        "cc" | "cpp" | "cxx" | "hpp" | "cu" => Some("cpp"),
        "rs" => Some("rust"),
        "go" => Some("go"),
        "java" => Some("java"),
        "jl" => Some("julia"),
        "r" => Some("r"),
        "sh" | "bash" => Some("shell"),
        _ => None,
    }
}

fn is_source(ext: &str) -> bool {
    language_for(ext).is_some()
}

fn is_config(rel: &str, ext: &str) -> bool {
    let name = file_name(rel);
    CONFIG_EXTENSIONS.contains(&ext)
        || CONFIG_FILES.contains(&name)
        || (name.starts_with("requirements") && ext == "txt")
}

fn is_model(rel: &str, ext: &str) -> bool {
    if WEIGHT_EXTENSIONS.contains(&ext) {
        return true;
    }
    if !is_source(ext) {
        return false;
    }
    let lower = rel.to_ascii_lowercase();
    MODEL_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_demo(rel: &str, ext: &str) -> bool {
    if !is_source(ext) {
        return false;
    }
    let lower = rel.to_ascii_lowercase();
    DEMO_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_entrypoint(path: &Path, rel: &str, ext: &str) -> bool {
    if ENTRYPOINT_FILES.contains(&file_name(rel)) {
        return true;
    }
    if ext != "py" {
        return false;
    }
    let small = fs::metadata(path)
        .map(|m| m.len() <= MAX_SCAN_BYTES)
        .unwrap_or(false);
    small
        && fs::read_to_string(path)
            .map(|content| has_main_guard(&content))
            .unwrap_or(false)
}

fn has_main_guard(content: &str) -> bool {
    content.lines().any(|line| {
        let line = line.trim();
        line.starts_with("if __name__")
            && (line.contains("\"__main__\"") || line.contains("'__main__'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "README.md", "# Radon\n");
        write(root, "requirements.txt", "numpy\n");
        write(root, "configs/train.yaml", "lr: 0.1\n");
        write(root, "radon/model.py", "class Net: pass\n");
        write(root, "radon/utils.py", "def f(): return 1\n");
        write(root, "examples/quick_demo.py", "print('hi')\n");
        write(
            root,
            "scripts/train.py",
            "def main():\n    pass\n\nif __name__ == \"__main__\":\n    main()\n",
        );
        write(root, "main.py", "print('main')\n");
        write(root, "weights/best.pth", "binary");
        write(root, ".git/HEAD", "ref: refs/heads/main\n");
        write(root, "radon/__pycache__/model.cpython-311.pyc", "x");
        write(root, "demo_generated.py", "print('stale')\n");
        temp
    }

    #[test]
    fn test_scan_detects_layout() {
        let temp = fixture();
        let summary = RepositoryScanner::new()
            .ignoring("demo_generated.py")
            .scan(temp.path())
            .unwrap();

        assert!(summary.has_language("python"));
        assert!(summary.folders.contains(""));
        assert!(summary.folders.contains("radon"));
        assert!(!summary.folders.iter().any(|f| f.contains(".git")));
        assert!(!summary.folders.iter().any(|f| f.contains("__pycache__")));

        assert!(summary.configs.contains(&"requirements.txt".to_string()));
        assert!(summary.configs.contains(&"configs/train.yaml".to_string()));
        assert!(summary.models.contains(&"radon/model.py".to_string()));
        assert!(summary.models.contains(&"weights/best.pth".to_string()));
        assert!(!summary.models.contains(&"radon/utils.py".to_string()));

        assert_eq!(summary.demos, vec!["examples/quick_demo.py".to_string()]);
        assert!(summary.entrypoints.contains(&"main.py".to_string()));
        assert!(summary.entrypoints.contains(&"scripts/train.py".to_string()));
        assert!(!summary.entrypoints.contains(&"radon/utils.py".to_string()));
        assert!(!summary.entrypoints.contains(&"demo_generated.py".to_string()));
    }

    #[test]
    fn test_scan_counts_files_outside_skipped_dirs() {
        let temp = fixture();
        let summary = RepositoryScanner::new().scan(temp.path()).unwrap();
        // README, requirements, train.yaml, model.py, utils.py, quick_demo.py,
        // train.py, main.py, best.pth, demo_generated.py
        assert_eq!(summary.num_files, 10);
        assert!(summary.demos.contains(&"demo_generated.py".to_string()));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let temp = fixture();
        let scanner = RepositoryScanner::new();
        assert_eq!(scanner.scan(temp.path()).unwrap(), scanner.scan(temp.path()).unwrap());
    }

    #[test]
    fn test_scan_rejects_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = RepositoryScanner::new().scan(&missing).unwrap_err();
        assert!(matches!(err, InspectionError::NotADirectory(_)));
    }

    #[test]
    fn test_extension_and_main_guard() {
        assert_eq!(extension("a/b/c.PY"), "py");
        assert_eq!(extension(".bashrc"), "");
        assert_eq!(extension("Makefile"), "");
        assert!(has_main_guard("if __name__ == '__main__':\n    run()"));
        assert!(!has_main_guard("print('__main__')"));
    }
}

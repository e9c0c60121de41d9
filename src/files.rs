//! Input file discovery.
//!
//! Paths named on the command line are taken as given, whatever their
//! extension. Directories are walked for `.py` files, skipping hidden
//! directories, `__pycache__`, virtualenvs and build output.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// File Collection
// ============================================================================

const SKIPPED_DIRS: &[&str] = &[
    "__pycache__",
    "node_modules",
    "venv",
    "env",
    "site-packages",
    "target",
];

fn is_skipped_dir(name: &str) -> bool {
    (name.starts_with('.') && name != "." && name != "..") || SKIPPED_DIRS.contains(&name)
}

/// Expand `inputs` into the list of files to annotate.
///
/// Files are returned in the order given; each directory contributes its
/// Python files sorted by path. Duplicates are dropped.
pub fn collect_input_files(inputs: &[PathBuf]) -> FileResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if input.is_file() {
            push_unique(&mut files, input.clone());
        } else if input.is_dir() {
            for path in collect_python_files(input)? {
                push_unique(&mut files, path);
            }
        } else {
            return Err(FileError::NotFound {
                path: input.display().to_string(),
            });
        }
    }
    Ok(files)
}

fn push_unique(files: &mut Vec<PathBuf>, path: PathBuf) {
    if !files.contains(&path) {
        files.push(path);
    }
}

/// Walk `root` for Python files, sorted by path.
pub fn collect_python_files(root: &Path) -> FileResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !is_skipped_dir(&entry.file_name().to_string_lossy())
        });
    for entry in walker {
        let entry = entry.map_err(|e| FileError::Io(io::Error::other(e.to_string())))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "py") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

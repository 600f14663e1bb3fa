//! Locating a documentation root on startup.
//!
//! A doc root is a directory containing `implementors/`, normally
//! `<workspace>/target/doc`. Discovery walks up from the working directory,
//! staying inside the enclosing Git repository (or at most two levels up
//! outside one).

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory under a doc root holding the fragments.
pub const IMPLEMENTORS_DIR: &str = "implementors";

/// Detect a doc root starting from the current working directory.
///
/// `$CARGO_TARGET_DIR/doc` takes precedence when it holds fragments.
pub async fn auto_detect_doc_root() -> Option<PathBuf> {
    if let Some(target) = std::env::var_os("CARGO_TARGET_DIR") {
        let doc = PathBuf::from(target).join("doc");
        if is_doc_root(&doc) {
            return canonicalize(doc).await;
        }
    }

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            debug!("Failed to get current working directory: {}", e);
            return None;
        }
    };

    debug!("Starting doc root detection from: {}", cwd.display());
    let found = find_doc_root(&cwd)?;
    canonicalize(found).await
}

async fn canonicalize(path: PathBuf) -> Option<PathBuf> {
    match tokio::fs::canonicalize(&path).await {
        Ok(canonical) => {
            info!("Detected doc root: {}", canonical.display());
            Some(canonical)
        }
        Err(e) => {
            warn!(
                "Found doc root at {} but canonicalization failed: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Whether `path` directly contains an `implementors/` directory.
pub fn is_doc_root(path: &Path) -> bool {
    path.join(IMPLEMENTORS_DIR).is_dir()
}

/// Walk up from `start` looking for a doc root.
///
/// At each level both the directory itself and its `target/doc` are checked.
/// The walk stops at the Git repository root, at system directories, or
/// after two levels when not inside a repository.
pub fn find_doc_root(start: &Path) -> Option<PathBuf> {
    let git_root = find_git_root(start);
    let max_depth = if git_root.is_some() { None } else { Some(2) };

    let mut current = start.to_path_buf();
    let mut depth = 0;

    loop {
        if is_doc_root(&current) {
            return Some(current);
        }
        let target_doc = current.join("target").join("doc");
        if is_doc_root(&target_doc) {
            return Some(target_doc);
        }

        if is_boundary_directory(&current) {
            debug!("Hit boundary directory: {}", current.display());
            break;
        }

        if let Some(ref git_root) = git_root
            && current == git_root.as_path()
        {
            debug!("Reached Git repository root, stopping search");
            break;
        }

        if let Some(max) = max_depth
            && depth >= max
        {
            debug!("Reached maximum search depth of {} directories", max);
            break;
        }

        match current.parent() {
            Some(parent) => {
                current = parent.to_path_buf();
                depth += 1;
            }
            None => break,
        }
    }

    debug!("No doc root found within constraints");
    None
}

/// Find the directory containing `.git`, walking up from `start`.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

/// Filesystem roots and well-known system directories end the walk.
pub fn is_boundary_directory(path: &Path) -> bool {
    if path.parent().is_none() {
        return true;
    }

    let path_str = path.to_string_lossy().to_lowercase();
    let unix_system_dirs = [
        "/usr", "/etc", "/var", "/opt", "/srv", "/bin", "/sbin", "/lib", "/lib64", "/boot", "/dev",
        "/proc", "/sys", "/run",
    ];
    if unix_system_dirs.contains(&path_str.as_str()) {
        return true;
    }

    let windows_system_suffixes = [":\\windows", ":\\program files", ":\\program files (x86)"];
    windows_system_suffixes
        .iter()
        .any(|suffix| path_str.ends_with(suffix))
}

//! Loading an `implementors/` tree into an [`ImplementorIndex`].
//!
//! Every fragment is parsed and submitted through its trait page's gate
//! before any page is initialized, so the whole tree travels through the
//! pending slots and is flushed by [`ImplementorIndex::initialize_all`].

use crate::cache::{self, CacheEntry, Fingerprint};
use crate::config::Config;
use crate::discovery::IMPLEMENTORS_DIR;
use crate::error::Result;
use crate::fragment::{parse_fragment, trait_path_from_fragment};
use crate::registry::ImplementorIndex;
use crate::types::{MergePolicy, TraitPath};
use anyhow::{Context, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A fragment file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFile {
    pub path: PathBuf,
    /// Path relative to the `implementors/` directory.
    pub relative: PathBuf,
    pub trait_path: TraitPath,
}

/// Outcome of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Fragments parsed and submitted.
    pub fragments: usize,
    /// Fragments that could not be read or parsed, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Mappings delivered from pending slots when pages were initialized.
    pub flushed: usize,
    /// Whether the index came from the cache instead of the fragments.
    pub from_cache: bool,
}

/// Find every `trait.*.js` fragment under `dir`, sorted by path.
pub fn discover_fragments(dir: &Path) -> Vec<FragmentFile> {
    let mut files: Vec<FragmentFile> = WalkBuilder::new(dir)
        .standard_filters(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter_map(|entry| {
            let path = entry.into_path();
            let relative = path.strip_prefix(dir).ok()?.to_path_buf();
            let trait_path = trait_path_from_fragment(&relative)?;
            Some(FragmentFile {
                path,
                relative,
                trait_path,
            })
        })
        .collect();

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    files
}

/// Parse and register every fragment under an `implementors/` directory.
///
/// Unreadable or malformed fragments are logged and reported, never fatal.
pub async fn load_implementors(
    dir: &Path,
    policy: MergePolicy,
) -> Result<(ImplementorIndex, LoadReport)> {
    if !dir.is_dir() {
        bail!("Implementors directory not found: {}", dir.display());
    }

    let started = Instant::now();
    let walk_dir = dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || discover_fragments(&walk_dir))
        .await
        .context("Fragment discovery task panicked")?;

    let mut index = ImplementorIndex::new();
    let mut report = LoadReport::default();

    for file in files {
        let source = match tokio::fs::read_to_string(&file.path).await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file.path.display(), e);
                report.skipped.push((file.relative, e.to_string()));
                continue;
            }
        };

        match parse_fragment(&source) {
            Ok(implementors) => {
                tracing::trace!(
                    trait_path = %file.trait_path,
                    groups = implementors.len(),
                    "submitting fragment"
                );
                index.submit(file.trait_path, implementors);
                report.fragments += 1;
            }
            Err(e) => {
                tracing::warn!("Skipping malformed fragment {}: {}", file.path.display(), e);
                report.skipped.push((file.relative, e.to_string()));
            }
        }
    }

    report.flushed = index.initialize_all(policy);

    tracing::info!(
        "Loaded {} fragments ({} skipped) from {} in {:?}",
        report.fragments,
        report.skipped.len(),
        dir.display(),
        started.elapsed()
    );

    Ok((index, report))
}

/// Load the fragments of a doc root, going through the cache when enabled.
pub async fn load_doc_root(
    doc_root: &Path,
    config: &Config,
) -> Result<(ImplementorIndex, LoadReport)> {
    let dir = doc_root.join(IMPLEMENTORS_DIR);
    let policy = config.merge_policy;

    if !config.use_cache {
        return load_implementors(&dir, policy).await;
    }

    let fingerprint: Fingerprint = cache::fingerprint_tree(&dir).await?;
    let cache_path = cache::cache_file(&config.cache_dir_for(doc_root));

    if let Some(entry) = cache::load_cached(&cache_path, fingerprint, policy).await {
        tracing::info!("Using cached implementors index from {}", cache_path.display());
        let index = ImplementorIndex::from_snapshot(entry.snapshot);
        let report = LoadReport {
            fragments: entry.fragments,
            skipped: entry.skipped,
            flushed: 0,
            from_cache: true,
        };
        return Ok((index, report));
    }

    let (index, report) = load_implementors(&dir, policy).await?;
    let entry = CacheEntry {
        snapshot: index.to_snapshot(),
        fragments: report.fragments,
        skipped: report.skipped.clone(),
    };
    if let Err(e) = cache::save_cached(&cache_path, fingerprint, policy, &entry).await {
        tracing::warn!("Failed to write implementors cache: {:#}", e);
    }
    Ok((index, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_only_trait_fragments() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "core/hash/trait.Hash.js", "");
        write(temp.path(), "core/fmt/trait.Debug.js", "");
        write(temp.path(), "core/fmt/struct.Formatter.js", "");
        write(temp.path(), "README.md", "");

        let files = discover_fragments(temp.path());
        let traits: Vec<_> = files.iter().map(|f| f.trait_path.as_str()).collect();
        check!(traits == ["core::fmt::Debug", "core::hash::Hash"]);
        check!(files[0].relative == Path::new("core/fmt/trait.Debug.js"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let temp = TempDir::new().unwrap();
        let result = load_implementors(&temp.path().join("nope"), MergePolicy::Replace).await;
        let_assert!(Err(e) = result);
        check!(e.to_string().contains("Implementors directory not found"));
    }
}

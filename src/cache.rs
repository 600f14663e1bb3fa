//! Persisting loaded indexes keyed by a fingerprint of the fragment tree.
//!
//! The fingerprint covers every fragment's relative path and contents, so any
//! added, removed or edited fragment invalidates the cache. A stale, corrupt
//! or missing cache file is a miss, never an error.

use crate::error::Result;
use crate::loader::discover_fragments;
use crate::registry::IndexSnapshot;
use crate::types::MergePolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

/// 64-bit xxh3 digest of a fragment tree.
pub type Fingerprint = u64;

/// Bumped whenever the on-disk layout of [`CachedIndex`] changes.
const CACHE_FORMAT_VERSION: u32 = 2;

const CACHE_FILE_NAME: &str = "implementors.idx";

/// What a load produced, as stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub snapshot: IndexSnapshot,
    /// Fragments parsed by the load that produced the snapshot.
    pub fragments: usize,
    /// Fragments that load skipped, relative to `implementors/`, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedIndex {
    format_version: u32,
    fingerprint: Fingerprint,
    policy: MergePolicy,
    entry: CacheEntry,
}

/// The cache file inside a cache directory.
pub fn cache_file(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CACHE_FILE_NAME)
}

/// Fingerprint the fragments under `dir` in deterministic order.
pub async fn fingerprint_tree(dir: &Path) -> Result<Fingerprint> {
    let dir = dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let mut hasher = Xxh3::new();
        for file in discover_fragments(&dir) {
            // Relative path so the digest survives moving the doc root.
            hasher.update(file.relative.to_string_lossy().as_bytes());
            hasher.update(&[0]);
            match std::fs::read(&file.path) {
                Ok(content) => {
                    hasher.update(&(content.len() as u64).to_le_bytes());
                    hasher.update(&content);
                }
                Err(e) => {
                    tracing::debug!("Fingerprinting {} without contents: {}", file.path.display(), e);
                    hasher.update(&u64::MAX.to_le_bytes());
                }
            }
        }
        hasher.digest()
    })
    .await
    .context("Fingerprint task panicked")
}

/// Load a cached entry if it matches `fingerprint` and `policy`.
pub async fn load_cached(
    path: &Path,
    fingerprint: Fingerprint,
    policy: MergePolicy,
) -> Option<CacheEntry> {
    let bytes = tokio::fs::read(path).await.ok()?;
    let cached: CachedIndex = match postcard::from_bytes(&bytes) {
        Ok(cached) => cached,
        Err(e) => {
            tracing::debug!("Ignoring unreadable cache {}: {}", path.display(), e);
            return None;
        }
    };

    if cached.format_version != CACHE_FORMAT_VERSION
        || cached.fingerprint != fingerprint
        || cached.policy != policy
    {
        tracing::debug!("Cache at {} is stale", path.display());
        return None;
    }

    Some(cached.entry)
}

/// Save an entry, creating parent directories if needed.
pub async fn save_cached(
    path: &Path,
    fingerprint: Fingerprint,
    policy: MergePolicy,
    entry: &CacheEntry,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let cached = CachedIndex {
        format_version: CACHE_FORMAT_VERSION,
        fingerprint,
        policy,
        entry: entry.clone(),
    };
    let bytes = postcard::to_stdvec(&cached).context("Failed to encode index cache")?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write index cache to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RegisterImplementors, Snapshot};
    use crate::types::{TraitPath, implementor_map};
    use assert2::{check, let_assert};
    use std::fs;
    use tempfile::TempDir;

    fn entry() -> CacheEntry {
        let mut page = Snapshot::new(MergePolicy::Replace);
        page.register(implementor_map([("url", vec!["impl Hash for Url"])]));
        CacheEntry {
            snapshot: IndexSnapshot {
                pages: vec![(TraitPath::new("core::hash::Hash"), page)],
            },
            fragments: 2,
            skipped: vec![(PathBuf::from("core/fmt/trait.Debug.js"), "bad escape".to_string())],
        }
    }

    fn tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("core/hash");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("trait.Hash.js"), "var implementors = {};").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_fingerprint_changes_with_contents() {
        let temp = tree();
        let before = fingerprint_tree(temp.path()).await.unwrap();
        check!(fingerprint_tree(temp.path()).await.unwrap() == before);

        fs::write(temp.path().join("core/hash/trait.Hash.js"), "var implementors = {\"a\":[]};").unwrap();
        check!(fingerprint_tree(temp.path()).await.unwrap() != before);
    }

    #[tokio::test]
    async fn test_fingerprint_ignores_non_fragments() {
        let temp = tree();
        let before = fingerprint_tree(temp.path()).await.unwrap();
        fs::write(temp.path().join("notes.txt"), "irrelevant").unwrap();
        check!(fingerprint_tree(temp.path()).await.unwrap() == before);
    }

    #[tokio::test]
    async fn test_cache_hit_and_misses() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(&temp.path().join("nested/cache"));

        check!(load_cached(&path, 7, MergePolicy::Replace).await.is_none());

        save_cached(&path, 7, MergePolicy::Replace, &entry()).await.unwrap();

        let_assert!(Some(loaded) = load_cached(&path, 7, MergePolicy::Replace).await);
        check!(loaded == entry());
        check!(load_cached(&path, 8, MergePolicy::Replace).await.is_none());
        check!(load_cached(&path, 7, MergePolicy::Append).await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let path = cache_file(temp.path());
        fs::write(&path, b"\xff\xff\xff").unwrap();
        check!(load_cached(&path, 1, MergePolicy::Replace).await.is_none());
    }
}

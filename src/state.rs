//! Shared server state: the configuration, the active doc root and its index.

use crate::config::Config;
use crate::discovery::{IMPLEMENTORS_DIR, auto_detect_doc_root, is_doc_root};
use crate::error::Result;
use crate::fragment::parse_fragment;
use crate::loader::{LoadReport, load_doc_root};
use crate::registry::{Delivery, ImplementorIndex, Registry, Snapshot};
use crate::types::{ImplementorMap, MergePolicy, TraitPath};
use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};

/// The index together with where it came from. Always replaced as a whole.
#[derive(Debug, Default)]
struct Loaded {
    /// Doc root the current index was loaded from.
    doc_root: Option<PathBuf>,
    index: ImplementorIndex,
    report: Option<LoadReport>,
    /// Number of completed loads.
    generation: u64,
    /// Fragments registered through the server, replayed into every reloaded index.
    registered: Vec<(TraitPath, ImplementorMap)>,
}

/// State shared by every tool handler.
pub struct IndexState {
    config: Config,
    loaded: RwLock<Loaded>,
    /// Held for the whole of a load so loads never interleave.
    load_guard: Mutex<()>,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexState")
            .field("config", &self.config)
            .field(
                "doc_root",
                &self.loaded.try_read().ok().and_then(|l| l.doc_root.clone()),
            )
            .finish_non_exhaustive()
    }
}

impl IndexState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            loaded: RwLock::new(Loaded::default()),
            load_guard: Mutex::new(()),
        }
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub async fn doc_root(&self) -> Option<PathBuf> {
        self.loaded.read().await.doc_root.clone()
    }

    /// Read access to the current index.
    pub async fn index(&self) -> RwLockReadGuard<'_, ImplementorIndex> {
        RwLockReadGuard::map(self.loaded.read().await, |loaded| &loaded.index)
    }

    pub async fn last_report(&self) -> Option<LoadReport> {
        self.loaded.read().await.report.clone()
    }

    /// Number of loads completed so far.
    pub async fn generation(&self) -> u64 {
        self.loaded.read().await.generation
    }

    /// Resolve which doc root to load: the explicit path, the configured one, or a discovered one.
    pub async fn resolve_doc_root(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        let candidate = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => match self.config.doc_root() {
                Some(path) => Some(path),
                None => auto_detect_doc_root().await,
            },
        };

        let Some(candidate) = candidate else {
            bail!("No documentation root found. Run `cargo doc` or pass a path to load_docs.");
        };

        // Accept the implementors directory itself as well as its parent.
        let root = if !is_doc_root(&candidate) && candidate.ends_with(IMPLEMENTORS_DIR) {
            candidate
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or(candidate)
        } else {
            candidate
        };

        if !is_doc_root(&root) {
            bail!("{} does not contain an implementors directory", root.display());
        }

        tokio::fs::canonicalize(&root)
            .await
            .with_context(|| format!("Failed to canonicalize {}", root.display()))
    }

    /// Load (or reload) the index from a doc root.
    ///
    /// Loads run one at a time; the last one to start wins.
    pub async fn load(&self, explicit: Option<&Path>) -> Result<(PathBuf, LoadReport)> {
        let _guard = self.load_guard.lock().await;
        self.load_locked(explicit).await
    }

    /// Load the configured or discovered doc root unless a load already completed.
    ///
    /// Returns `None` when an explicit load got there first.
    pub async fn load_initial(&self) -> Result<Option<(PathBuf, LoadReport)>> {
        let _guard = self.load_guard.lock().await;
        if self.generation().await > 0 {
            return Ok(None);
        }
        self.load_locked(None).await.map(Some)
    }

    async fn load_locked(&self, explicit: Option<&Path>) -> Result<(PathBuf, LoadReport)> {
        let root = self.resolve_doc_root(explicit).await?;
        let (mut index, report) = load_doc_root(&root, &self.config).await?;

        let mut loaded = self.loaded.write().await;
        replay_registered(&loaded, &mut index, self.config.merge_policy);
        if !loaded.registered.is_empty() {
            tracing::debug!(
                "Replayed {} registered fragments into the new index",
                loaded.registered.len()
            );
        }
        loaded.index = index;
        loaded.doc_root = Some(root.clone());
        loaded.report = Some(report.clone());
        loaded.generation += 1;

        Ok((root, report))
    }

    /// Parse a fragment script and submit it through the gate of `trait_path`'s page.
    pub async fn register_fragment(&self, trait_path: TraitPath, source: &str) -> Result<Delivery> {
        let implementors = parse_fragment(source)
            .with_context(|| format!("Failed to parse fragment for {}", trait_path))?;
        let mut loaded = self.loaded.write().await;
        loaded
            .registered
            .push((trait_path.clone(), implementors.clone()));
        Ok(loaded.index.submit(trait_path, implementors))
    }

    /// Initialize any page still waiting for its capability.
    pub async fn initialize_pending(&self) -> usize {
        self.loaded
            .write()
            .await
            .index
            .initialize_all(self.config.merge_policy)
    }
}

/// Submit the fragments registered so far into a freshly loaded index.
///
/// Pages that were initialized in the outgoing index are initialized in the
/// new one before the fragment arrives, so a fragment that was delivered
/// stays delivered.
fn replay_registered(loaded: &Loaded, index: &mut ImplementorIndex, policy: MergePolicy) {
    for (trait_path, implementors) in &loaded.registered {
        let was_initialized = loaded
            .index
            .page(trait_path)
            .is_some_and(Registry::is_initialized);
        let page = index.page_mut(trait_path.clone());
        if was_initialized && !page.is_initialized() {
            let _ = page.initialize(Snapshot::new(policy));
        }
        page.submit(implementors.clone());
    }
}

/// Load whatever doc root can be found at startup, without failing the server.
pub fn spawn_initial_load(state: Arc<IndexState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match state.load_initial().await {
            Ok(None) => tracing::debug!("Skipping initial load: documentation already loaded"),
            Ok(Some((root, report))) => tracing::info!(
                "Initial load of {}: {} fragments, {} skipped{}",
                root.display(),
                report.fragments,
                report.skipped.len(),
                if report.from_cache { " (cached)" } else { "" }
            ),
            Err(e) => tracing::info!("No implementors loaded at startup: {:#}", e),
        }
    })
}

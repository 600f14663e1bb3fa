//! One registry per trait page, keyed by trait path.

use super::gate::{Delivery, Registry};
use super::snapshot::Snapshot;
use crate::types::{ImplementorMap, MergePolicy, TraitPath};
use ahash::RandomState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// All trait pages of a documentation tree.
#[derive(Debug, Default)]
pub struct ImplementorIndex {
    pages: IndexMap<TraitPath, Registry<Snapshot>, RandomState>,
}

/// Counts describing an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub traits: usize,
    pub initialized: usize,
    pub groups: usize,
    pub implementors: usize,
    pub pending: usize,
}

/// Serializable form of the initialized pages of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub pages: Vec<(TraitPath, Snapshot)>,
}

impl ImplementorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry for `trait_path`, created uninitialized on first access.
    pub fn page_mut(&mut self, trait_path: TraitPath) -> &mut Registry<Snapshot> {
        self.pages.entry(trait_path).or_default()
    }

    pub fn page(&self, trait_path: &TraitPath) -> Option<&Registry<Snapshot>> {
        self.pages.get(trait_path)
    }

    /// Submit a fragment's mapping through the gate of its trait page.
    pub fn submit(&mut self, trait_path: TraitPath, implementors: ImplementorMap) -> Delivery {
        self.page_mut(trait_path).submit(implementors)
    }

    /// Initialize every page that has no capability yet with an empty snapshot.
    ///
    /// Returns the number of pending mappings flushed across all pages.
    pub fn initialize_all(&mut self, policy: MergePolicy) -> usize {
        let mut flushed = 0;
        for (trait_path, page) in &mut self.pages {
            if page.is_initialized() {
                continue;
            }
            match page.initialize(Snapshot::new(policy)) {
                Ok(count) => flushed += count,
                Err(e) => tracing::warn!("Skipping page {}: {}", trait_path, e),
            }
        }
        flushed
    }

    /// Trait paths in sorted order.
    pub fn traits(&self) -> Vec<&TraitPath> {
        let mut traits: Vec<_> = self.pages.keys().collect();
        traits.sort();
        traits
    }

    /// The snapshot of an initialized page.
    pub fn implementors(&self, trait_path: &TraitPath) -> Option<&Snapshot> {
        self.pages.get(trait_path)?.capability()
    }

    /// Initialized pages with their snapshots, sorted by trait path.
    pub fn snapshots(&self) -> Vec<(&TraitPath, &Snapshot)> {
        let mut pages: Vec<_> = self
            .pages
            .iter()
            .filter_map(|(path, page)| page.capability().map(|snapshot| (path, snapshot)))
            .collect();
        pages.sort_by(|a, b| a.0.cmp(b.0));
        pages
    }

    pub fn pending_count(&self) -> usize {
        self.pages.values().map(|page| page.pending().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let mut groups = BTreeSet::new();
        let mut stats = IndexStats {
            traits: self.pages.len(),
            pending: self.pending_count(),
            ..IndexStats::default()
        };
        for page in self.pages.values() {
            if let Some(snapshot) = page.capability() {
                stats.initialized += 1;
                stats.implementors += snapshot.implementor_count();
                groups.extend(snapshot.groups().map(|(name, _)| name));
            }
        }
        stats.groups = groups.len();
        stats
    }

    /// Capture the initialized pages. Pending mappings are not part of a snapshot.
    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            pages: self
                .snapshots()
                .into_iter()
                .map(|(path, snapshot)| (path.clone(), snapshot.clone()))
                .collect(),
        }
    }

    /// Rebuild an index whose pages are initialized with the captured snapshots.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Self {
        let mut index = Self::new();
        for (trait_path, page_snapshot) in snapshot.pages {
            let page = index.page_mut(trait_path);
            if let Err(e) = page.initialize(page_snapshot) {
                tracing::warn!("Duplicate page in index snapshot: {}", e);
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::implementor_map;
    use assert2::{check, let_assert};

    fn hash_trait() -> TraitPath {
        TraitPath::new("core::hash::Hash")
    }

    #[test]
    fn test_submit_before_initialize_is_flushed() {
        let mut index = ImplementorIndex::new();
        let map = implementor_map([("unicase", vec!["impl Hash for UniCase"])]);

        check!(index.submit(hash_trait(), map.clone()) == Delivery::Deferred);
        check!(index.implementors(&hash_trait()).is_none());
        check!(index.pending_count() == 1);

        check!(index.initialize_all(MergePolicy::Replace) == 1);
        let_assert!(Some(snapshot) = index.implementors(&hash_trait()));
        check!(snapshot.to_map() == map);
        check!(index.pending_count() == 0);
    }

    #[test]
    fn test_submit_after_initialize_registers_directly() {
        let mut index = ImplementorIndex::new();
        index.page_mut(hash_trait());
        index.initialize_all(MergePolicy::Append);

        let delivery = index.submit(hash_trait(), implementor_map([("url", vec!["impl Hash for Url"])]));

        check!(delivery == Delivery::Registered);
        check!(index.implementors(&hash_trait()).unwrap().len() == 1);
    }

    #[test]
    fn test_stats_and_sorted_traits() {
        let mut index = ImplementorIndex::new();
        index.submit(TraitPath::new("core::fmt::Debug"), implementor_map([("url", vec!["a", "b"])]));
        index.submit(hash_trait(), implementor_map([("url", vec!["c"]), ("iron", vec!["d"])]));
        index.initialize_all(MergePolicy::Replace);

        let traits: Vec<_> = index.traits().into_iter().map(TraitPath::as_str).collect();
        check!(traits == ["core::fmt::Debug", "core::hash::Hash"]);

        let stats = index.stats();
        check!(stats.traits == 2);
        check!(stats.initialized == 2);
        check!(stats.groups == 2);
        check!(stats.implementors == 4);
        check!(stats.pending == 0);
    }

    #[test]
    fn test_snapshot_restores_pages() {
        let mut index = ImplementorIndex::new();
        index.submit(hash_trait(), implementor_map([("hyper", vec!["h"])]));
        // Pages left uninitialized stay out of the snapshot.
        index.submit(TraitPath::new("core::clone::Clone"), implementor_map([("x", vec!["y"])]));
        index.page_mut(hash_trait()).initialize(Snapshot::default()).unwrap();

        let restored = ImplementorIndex::from_snapshot(index.to_snapshot());

        check!(restored.traits().len() == 1);
        check!(restored.implementors(&hash_trait()) == index.implementors(&hash_trait()));
    }
}

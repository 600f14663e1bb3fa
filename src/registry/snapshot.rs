//! The accumulating side of the registry: group name to descriptions.

use super::gate::RegisterImplementors;
use crate::types::{ImplementorMap, MergePolicy};
use serde::{Deserialize, Serialize};

/// Everything registered for one trait so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    groups: ImplementorMap,
    policy: MergePolicy,
}

impl Snapshot {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            groups: ImplementorMap::new(),
            policy,
        }
    }

    pub const fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Descriptions registered for `group`.
    pub fn get(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Groups in first-registration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, descriptions)| (name.as_str(), descriptions.as_slice()))
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of descriptions across all groups.
    pub fn implementor_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn to_map(&self) -> ImplementorMap {
        self.groups.clone()
    }
}

impl RegisterImplementors for Snapshot {
    fn register(&mut self, implementors: ImplementorMap) {
        for (group, descriptions) in implementors {
            match self.policy {
                MergePolicy::Replace => {
                    self.groups.insert(group, descriptions);
                }
                MergePolicy::Append => {
                    let existing = self.groups.entry(group).or_default();
                    for description in descriptions {
                        if !existing.contains(&description) {
                            existing.push(description);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::implementor_map;
    use assert2::check;

    #[test]
    fn test_replace_keeps_last_writer() {
        let mut snapshot = Snapshot::new(MergePolicy::Replace);
        snapshot.register(implementor_map([("url", vec!["old"]), ("iron", vec!["i"])]));
        snapshot.register(implementor_map([("url", vec!["new"])]));

        check!(snapshot.get("url") == Some(&["new".to_string()][..]));
        check!(snapshot.len() == 2);
        // Replacing keeps the group's original position.
        let order: Vec<_> = snapshot.groups().map(|(name, _)| name).collect();
        check!(order == ["url", "iron"]);
    }

    #[test]
    fn test_append_deduplicates() {
        let mut snapshot = Snapshot::new(MergePolicy::Append);
        snapshot.register(implementor_map([("hyper", vec!["a", "b"])]));
        snapshot.register(implementor_map([("hyper", vec!["b", "c"])]));

        let hyper: Vec<_> = snapshot.get("hyper").unwrap().to_vec();
        check!(hyper == ["a", "b", "c"]);
        check!(snapshot.implementor_count() == 3);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::default();
        check!(snapshot.is_empty());
        check!(snapshot.policy() == MergePolicy::Replace);
        check!(snapshot.get("anything").is_none());
    }
}

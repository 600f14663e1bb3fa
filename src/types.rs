//! Core data types shared by the registry, the fragment codec and the server.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fragment's payload: group (crate) name to implementation descriptions.
///
/// Insertion order follows the order in which the fragment lists its groups,
/// and each description list keeps its authored order.
pub type ImplementorMap = IndexMap<String, Vec<String>>;

/// Builds an [`ImplementorMap`] from `(group, descriptions)` pairs.
pub fn implementor_map<G, D, I>(entries: impl IntoIterator<Item = (G, I)>) -> ImplementorMap
where
    G: Into<String>,
    D: Into<String>,
    I: IntoIterator<Item = D>,
{
    entries
        .into_iter()
        .map(|(group, descriptions)| {
            (
                group.into(),
                descriptions.into_iter().map(Into::into).collect(),
            )
        })
        .collect()
}

/// Path of the trait a fragment belongs to, e.g. `core::hash::Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraitPath(String);

impl TraitPath {
    /// Create a trait path from `::`-separated segments, trimming empty ones.
    pub fn new(path: impl AsRef<str>) -> Self {
        let joined = path
            .as_ref()
            .split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("::");
        Self(joined)
    }

    /// Build from already-split segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::new(
            segments
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join("::"),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trait's own name (last segment).
    pub fn name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// The crate that defines the trait (first segment).
    pub fn defining_crate(&self) -> &str {
        self.0.split("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TraitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TraitPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How a snapshot combines a group it already holds with a newly registered one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Last writer wins per group name.
    #[default]
    Replace,
    /// Extend the group with descriptions it does not hold yet.
    Append,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => f.write_str("replace"),
            Self::Append => f.write_str("append"),
        }
    }
}

/// Relevance of `text` against `query`; both are expected to be lowercase.
pub fn calculate_relevance(text: &str, query: &str) -> Option<u32> {
    if text == query {
        Some(100)
    } else if text.starts_with(query) {
        Some(50)
    } else if text.contains(query) {
        Some(10)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("core::hash::Hash", "Hash", "core")]
    #[case(" serde :: ser :: Serialize ", "Serialize", "serde")]
    #[case("Display", "Display", "Display")]
    fn test_trait_path_segments(#[case] raw: &str, #[case] name: &str, #[case] krate: &str) {
        let path = TraitPath::new(raw);
        check!(path.name() == name);
        check!(path.defining_crate() == krate);
    }

    #[test]
    fn test_trait_path_normalizes_empty_segments() {
        check!(TraitPath::new("::core::::fmt::Debug").as_str() == "core::fmt::Debug");
        check!(TraitPath::from_segments(&["core", "fmt", "Debug"]).as_str() == "core::fmt::Debug");
    }

    #[test]
    fn test_implementor_map_keeps_insertion_order() {
        let map = implementor_map([("zeta", vec!["z"]), ("alpha", vec!["a", "b"])]);
        let groups: Vec<_> = map.keys().map(String::as_str).collect();
        check!(groups == ["zeta", "alpha"]);
        check!(map["alpha"] == ["a", "b"]);
    }

    #[rstest]
    #[case("unicase", "unicase", Some(100))]
    #[case("unicase", "uni", Some(50))]
    #[case("unicase", "case", Some(10))]
    #[case("unicase", "hyper", None)]
    fn test_calculate_relevance(#[case] text: &str, #[case] query: &str, #[case] expected: Option<u32>) {
        check!(calculate_relevance(text, query) == expected);
    }

    #[test]
    fn test_merge_policy_serde() {
        check!(serde_json::to_string(&MergePolicy::Append).unwrap() == "\"append\"");
        let parsed: MergePolicy = serde_json::from_str("\"replace\"").unwrap();
        check!(parsed == MergePolicy::Replace);
    }
}

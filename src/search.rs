//! Relevance-ranked lookup over a loaded index.

use crate::describe::Implementor;
use crate::registry::ImplementorIndex;
use crate::types::{TraitPath, calculate_relevance};
use rapidfuzz::distance::jaro_winkler;

/// What a search hit points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    /// The trait itself matched.
    Trait,
    /// One implementor of the trait matched.
    Implementor {
        group: String,
        implementor: Implementor,
    },
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub trait_path: TraitPath,
    pub kind: MatchKind,
    pub relevance: u32,
}

impl SearchHit {
    /// Path used for tie-breaking and display.
    fn sort_key(&self) -> String {
        match &self.kind {
            MatchKind::Trait => self.trait_path.to_string(),
            MatchKind::Implementor { implementor, .. } => implementor
                .self_type
                .clone()
                .unwrap_or_else(|| implementor.signature.clone()),
        }
    }
}

/// Search trait paths and implementors for `query`.
///
/// Traits match on their full path and their name; implementors match on
/// their implementing type and then their signature. Results are ordered by
/// relevance, then by path.
pub fn search_implementors(index: &ImplementorIndex, query: &str, limit: usize) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for (trait_path, snapshot) in index.snapshots() {
        let trait_score = calculate_relevance(&trait_path.name().to_lowercase(), &query)
            .max(calculate_relevance(&trait_path.as_str().to_lowercase(), &query));
        if let Some(relevance) = trait_score {
            hits.push(SearchHit {
                trait_path: trait_path.clone(),
                kind: MatchKind::Trait,
                relevance,
            });
        }

        for (group, descriptions) in snapshot.groups() {
            for description in descriptions {
                let implementor = Implementor::parse(description);
                let type_score = implementor
                    .self_type_name()
                    .and_then(|name| calculate_relevance(&name.to_lowercase(), &query));
                // Signature matches rank below any type-name match.
                let signature_score = calculate_relevance(&implementor.signature.to_lowercase(), &query)
                    .map(|_| 5);
                if let Some(relevance) = type_score.or(signature_score) {
                    hits.push(SearchHit {
                        trait_path: trait_path.clone(),
                        kind: MatchKind::Implementor {
                            group: group.to_string(),
                            implementor,
                        },
                        relevance,
                    });
                }
            }
        }
    }

    hits.sort_by(|a, b| {
        b.relevance
            .cmp(&a.relevance)
            .then_with(|| a.sort_key().cmp(&b.sort_key()))
            .then_with(|| a.trait_path.cmp(&b.trait_path))
    });
    hits.truncate(limit);
    hits
}

/// Suggest known trait paths similar to `query`, best first.
pub fn suggest_traits<'a>(index: &'a ImplementorIndex, query: &str, limit: usize) -> Vec<(&'a TraitPath, f64)> {
    let query = query.trim();
    let mut suggestions: Vec<_> = index
        .traits()
        .into_iter()
        .map(|path| {
            let full = jaro_winkler::similarity(query.chars(), path.as_str().chars());
            let name = jaro_winkler::similarity(query.chars(), path.name().chars());
            (path, full.max(name))
        })
        .collect();
    suggestions.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    suggestions.truncate(limit);
    suggestions
}

//! Plain-text rendering of tool responses.

use crate::describe::Implementor;
use crate::loader::LoadReport;
use crate::registry::{ImplementorIndex, IndexStats, Snapshot};
use crate::search::{MatchKind, SearchHit};
use crate::types::TraitPath;
use std::fmt::Write as _;
use std::path::Path;

/// How many skipped fragments a load report lists before summarizing.
const MAX_SKIPPED_SHOWN: usize = 10;

pub fn format_load_report(root: &Path, report: &LoadReport, stats: IndexStats) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Loaded implementors from {}", root.display());
    if report.from_cache {
        output.push_str("  (restored from cache)\n");
    } else {
        let _ = writeln!(output, "  Fragments: {}", report.fragments);
    }
    let _ = writeln!(output, "  Traits: {}", stats.traits);
    let _ = writeln!(output, "  Crates: {}", stats.groups);
    let _ = writeln!(output, "  Implementations: {}", stats.implementors);

    if !report.skipped.is_empty() {
        let _ = writeln!(output, "\nSkipped ({}):", report.skipped.len());
        for (path, reason) in report.skipped.iter().take(MAX_SKIPPED_SHOWN) {
            let _ = writeln!(output, "  • {}: {}", path.display(), reason);
        }
        if report.skipped.len() > MAX_SKIPPED_SHOWN {
            let _ = writeln!(
                output,
                "  ... and {} more",
                report.skipped.len() - MAX_SKIPPED_SHOWN
            );
        }
    }
    output
}

/// List traits with their implementor counts, optionally limited to one defining crate.
pub fn format_traits(index: &ImplementorIndex, crate_filter: Option<&str>) -> String {
    let pages: Vec<_> = index
        .snapshots()
        .into_iter()
        .filter(|(path, _)| crate_filter.is_none_or(|krate| path.defining_crate() == krate))
        .collect();

    if pages.is_empty() {
        return match crate_filter {
            Some(krate) => format!("No traits from '{}' have implementors.\n", krate),
            None => "No traits loaded. Use load_docs first.\n".to_string(),
        };
    }

    let mut output = format!("Traits ({}):\n", pages.len());
    for (path, snapshot) in pages {
        let _ = writeln!(
            output,
            "  • {} ({} impls in {} crates)",
            path,
            snapshot.implementor_count(),
            snapshot.len()
        );
    }
    output
}

/// Render one trait's implementors grouped by crate.
pub fn format_implementors(trait_path: &TraitPath, snapshot: &Snapshot, group: Option<&str>) -> String {
    let mut output = format!("Implementors of {}:\n", trait_path);
    let mut shown = 0;

    for (name, descriptions) in snapshot.groups() {
        if group.is_some_and(|g| g != name) {
            continue;
        }
        let _ = writeln!(output, "\n{} ({}):", name, descriptions.len());
        for description in descriptions {
            output.push_str(&format_implementor_line(&Implementor::parse(description)));
            shown += 1;
        }
    }

    if shown == 0 {
        return match group {
            Some(g) => format!("No implementors of {} in crate '{}'.\n", trait_path, g),
            None => format!("No implementors of {} registered.\n", trait_path),
        };
    }
    output
}

fn format_implementor_line(implementor: &Implementor) -> String {
    match &implementor.stability {
        Some(stability) => format!("  • {} [{}]\n", implementor.signature, stability.level),
        None => format!("  • {}\n", implementor.signature),
    }
}

pub fn format_search_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{}'.\n", query);
    }

    let mut output = format!("Results for '{}' ({}):\n", query, hits.len());
    for hit in hits {
        match &hit.kind {
            MatchKind::Trait => {
                let _ = writeln!(output, "  • trait {} [{}]", hit.trait_path, hit.relevance);
            }
            MatchKind::Implementor { group, implementor } => {
                let _ = writeln!(
                    output,
                    "  • {} ({} → {}) [{}]",
                    implementor.signature, group, hit.trait_path, hit.relevance
                );
            }
        }
    }
    output
}

/// Message for an unknown trait, with suggestions when there are any.
pub fn format_unknown_trait(trait_path: &TraitPath, suggestions: &[(&TraitPath, f64)]) -> String {
    let mut output = format!("Trait '{}' has no implementors page.\n", trait_path);
    if !suggestions.is_empty() {
        output.push_str("Did you mean:\n");
        for (path, _) in suggestions {
            let _ = writeln!(output, "  • {}", path);
        }
    }
    output
}

//! Mapping fragment locations to trait paths.

use crate::types::TraitPath;
use std::path::{Component, Path, PathBuf};

/// Derive the trait path from a fragment's location relative to `implementors/`.
///
/// Examples:
/// - `core/hash/trait.Hash.js` → `core::hash::Hash`
/// - `serde/ser/trait.Serialize.js` → `serde::ser::Serialize`
///
/// Anything that is not a `trait.<Name>.js` file yields `None`.
pub fn trait_path_from_fragment(relative: &Path) -> Option<TraitPath> {
    let file_name = relative.file_name()?.to_str()?;
    let name = file_name.strip_prefix("trait.")?.strip_suffix(".js")?;
    if name.is_empty() || name.contains('.') {
        return None;
    }

    let mut segments = Vec::new();
    for component in relative.parent()?.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    segments.push(name.to_string());

    Some(TraitPath::from_segments(&segments))
}

/// The location of a trait's fragment relative to `implementors/`.
pub fn fragment_path_for_trait(trait_path: &TraitPath) -> PathBuf {
    let mut segments: Vec<&str> = trait_path.as_str().split("::").collect();
    let name = segments.pop().unwrap_or_default();
    let mut path: PathBuf = segments.iter().collect();
    path.push(format!("trait.{}.js", name));
    path
}

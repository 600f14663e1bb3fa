//! Writing implementor fragments.

use crate::error::Result;
use crate::types::ImplementorMap;
use anyhow::Context;
use std::fmt::Write as _;

/// Which of the two fragment layouts to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FragmentLayout {
    /// Everything inside the `var implementors = {...}` declaration.
    #[default]
    Object,
    /// An empty declaration followed by one `implementors[...] = [...]` per group.
    Assignments,
}

const REGISTRATION: &str = "if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}";

/// Render a mapping as a self-registering fragment script.
///
/// The script hands the mapping to `window.register_implementors` when the
/// viewer has installed it, and parks it in `window.pending_implementors`
/// otherwise.
pub fn render_fragment(implementors: &ImplementorMap, layout: FragmentLayout) -> Result<String> {
    let mut out = String::from("(function() {var implementors = ");

    match layout {
        FragmentLayout::Object => {
            let object =
                serde_json::to_string(implementors).context("Failed to encode implementors")?;
            out.push_str(&object);
            out.push_str(";\n");
        }
        FragmentLayout::Assignments => {
            out.push_str("{};\n");
            for (group, descriptions) in implementors {
                let key = serde_json::to_string(group).context("Failed to encode group name")?;
                let values = serde_json::to_string(descriptions)
                    .with_context(|| format!("Failed to encode descriptions for {}", group))?;
                let _ = writeln!(out, "implementors[{}] = {};", key, values);
            }
        }
    }

    out.push_str(REGISTRATION);
    out.push_str("\n})()\n");
    Ok(out)
}

//! The implementor fragment script format.
//!
//! rustdoc writes one fragment per trait under `implementors/`, mirroring the
//! trait's module path. Each fragment carries a mapping from crate name to the
//! HTML lines describing that crate's impls, followed by a register-or-stash
//! call into the viewer.

mod parse;
mod path;
mod render;

pub use parse::parse_fragment;
pub use path::{fragment_path_for_trait, trait_path_from_fragment};
pub use render::{FragmentLayout, render_fragment};

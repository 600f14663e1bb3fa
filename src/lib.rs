//! Trait implementor indexes for generated Rust documentation.
//!
//! rustdoc emits one fragment per trait under `implementors/`, each handing a
//! mapping from crate name to `impl` lines to the viewer's registry. This
//! crate models that hand-off as a [`Registry`] with an explicit lifecycle,
//! reads and writes the fragment format, and serves the resulting index over
//! MCP.

pub mod cache;
pub mod config;
pub mod describe;
pub mod discovery;
pub mod error;
pub mod format;
pub mod fragment;
pub mod loader;
pub mod registry;
pub mod search;
pub mod server;
pub mod state;
pub mod tracing;
pub mod types;

pub use describe::Implementor;
pub use error::{FragmentError, RegistryError, Result};
pub use fragment::{FragmentLayout, parse_fragment, render_fragment};
pub use registry::{
    Delivery, ImplementorIndex, IndexSnapshot, RegisterImplementors, Registry, Snapshot,
};
pub use types::{ImplementorMap, MergePolicy, TraitPath, implementor_map};

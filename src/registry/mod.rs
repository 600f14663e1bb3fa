//! Implementor registration: the deferred gate, the snapshot it feeds, and
//! the per-trait index built from both.

pub mod gate;
pub mod index;
pub mod snapshot;

pub use gate::{Delivery, RegisterImplementors, Registry};
pub use index::{ImplementorIndex, IndexSnapshot, IndexStats};
pub use snapshot::Snapshot;

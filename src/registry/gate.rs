//! Deferred registration gate.
//!
//! Fragments hand their mapping to [`Registry::submit`] without knowing whether
//! the consumer is ready. Until a registration capability is installed with
//! [`Registry::initialize`], mappings wait in the pending slot; installation
//! flushes them in submission order. Every mapping is delivered exactly once.

use crate::error::RegistryError;
use crate::types::ImplementorMap;

/// The capability a registry delivers mappings to.
pub trait RegisterImplementors {
    /// Receive one fragment's mapping.
    fn register(&mut self, implementors: ImplementorMap);
}

impl<F> RegisterImplementors for F
where
    F: FnMut(ImplementorMap),
{
    fn register(&mut self, implementors: ImplementorMap) {
        self(implementors);
    }
}

/// Which path [`Registry::submit`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the installed capability immediately.
    Registered,
    /// Stored in the pending slot for a later flush.
    Deferred,
}

#[derive(Debug)]
enum Lifecycle<S> {
    Uninitialized,
    Initialized(S),
}

/// A registration gate with an explicit `Uninitialized -> Initialized` lifecycle.
#[derive(Debug)]
pub struct Registry<S> {
    state: Lifecycle<S>,
    pending: Vec<ImplementorMap>,
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Registry<S> {
    /// Create an uninitialized registry with an empty pending slot.
    pub const fn new() -> Self {
        Self {
            state: Lifecycle::Uninitialized,
            pending: Vec::new(),
        }
    }

    pub const fn is_initialized(&self) -> bool {
        matches!(self.state, Lifecycle::Initialized(_))
    }

    /// Mappings waiting for a capability, oldest first.
    pub fn pending(&self) -> &[ImplementorMap] {
        &self.pending
    }

    /// The installed capability, if any.
    pub const fn capability(&self) -> Option<&S> {
        match &self.state {
            Lifecycle::Initialized(sink) => Some(sink),
            Lifecycle::Uninitialized => None,
        }
    }

    /// Remove the installed capability and return it along with anything still pending.
    pub fn into_parts(self) -> (Option<S>, Vec<ImplementorMap>) {
        let sink = match self.state {
            Lifecycle::Initialized(sink) => Some(sink),
            Lifecycle::Uninitialized => None,
        };
        (sink, self.pending)
    }
}

impl<S: RegisterImplementors> Registry<S> {
    /// Deliver a mapping now, or park it until [`initialize`](Self::initialize).
    pub fn submit(&mut self, implementors: ImplementorMap) -> Delivery {
        match &mut self.state {
            Lifecycle::Initialized(sink) => {
                sink.register(implementors);
                Delivery::Registered
            }
            Lifecycle::Uninitialized => {
                tracing::trace!(
                    groups = implementors.len(),
                    pending = self.pending.len() + 1,
                    "registration capability not installed, deferring"
                );
                self.pending.push(implementors);
                Delivery::Deferred
            }
        }
    }

    /// Install the capability and flush the pending slot into it.
    ///
    /// Returns the number of mappings flushed. A second call fails, keeps the
    /// capability installed by the first, and drops `sink`.
    pub fn initialize(&mut self, sink: S) -> Result<usize, RegistryError> {
        if self.is_initialized() {
            return Err(RegistryError::AlreadyInitialized);
        }
        self.state = Lifecycle::Initialized(sink);
        Ok(self.flush_pending())
    }

    /// Deliver every pending mapping to the installed capability.
    ///
    /// Does nothing while uninitialized. Returns the number delivered.
    pub fn flush_pending(&mut self) -> usize {
        let Lifecycle::Initialized(sink) = &mut self.state else {
            return 0;
        };
        let flushed = self.pending.len();
        for implementors in self.pending.drain(..) {
            sink.register(implementors);
        }
        if flushed > 0 {
            tracing::debug!(flushed, "flushed pending implementors");
        }
        flushed
    }
}

//! # Subscription registry - the bus's one shared mutable resource.
//!
//! An ordered collection of live subscription entries. Insertion order is
//! notification order; removal happens exactly once, at disposal.
//!
//! ## Rules
//! - `add` appends; `publish` iterates a snapshot in append order.
//! - `snapshot` clones the membership under the lock, so an in-flight
//!   publish is never corrupted by concurrent subscribe/dispose calls.
//! - The lock is held only for add/remove/snapshot; never while a
//!   subscriber runs. Disposing or subscribing from inside a handler is
//!   therefore safe.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::subscriptions::Subscription;

/// Ordered collection of live subscriptions.
pub(crate) struct Registry {
    entries: Mutex<Vec<Arc<Subscription>>>,
}

impl Registry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Appends an entry; it will be seen by publishes that snapshot later.
    pub(crate) fn add(&self, entry: Arc<Subscription>) {
        self.entries.lock().push(entry);
    }

    /// Removes the entry with the given id, if still present.
    pub(crate) fn remove(&self, id: u64) {
        self.entries.lock().retain(|entry| entry.id() != id);
    }

    /// Copies the current membership, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<Subscription>> {
        self.entries.lock().clone()
    }

    /// Number of live entries.
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

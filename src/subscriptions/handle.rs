//! # Disposal handle returned by the subscribe calls.
//!
//! [`SubscriptionHandle`] carries a direct back-reference into the
//! registry, so disposing removes the entry in one step: flip the entry's
//! disposed flag, then detach it from the registry, synchronously. No
//! publish call that snapshots afterward can ever select the entry, and a
//! handler already running for it is left to finish on its own.
//!
//! Dropping a handle does **not** dispose; the subscription stays
//! registered for the life of the bus until [`dispose`] is called.
//!
//! [`dispose`]: SubscriptionHandle::dispose

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::bus::registry::Registry;
use crate::subscriptions::Subscription;

/// Handle to one registered subscription.
///
/// Cheap to clone; clones refer to the same registration, and disposal
/// through any of them detaches it for all.
#[derive(Clone)]
pub struct SubscriptionHandle {
    subscription: Arc<Subscription>,
    registry: Weak<Registry>,
}

impl SubscriptionHandle {
    pub(crate) fn new(subscription: Arc<Subscription>, registry: &Arc<Registry>) -> Self {
        Self {
            subscription,
            registry: Arc::downgrade(registry),
        }
    }

    /// Detaches the subscription from future dispatch.
    ///
    /// Idempotent: only the first call has any effect. Safe to invoke from
    /// within the subscription's own handler; the in-flight invocation
    /// runs to completion and nothing is delivered afterward.
    pub fn dispose(&self) {
        if !self.subscription.dispose() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.subscription.id());
        }
        debug!(
            id = self.subscription.id(),
            message_type = self.subscription.declared_type(),
            "subscription disposed"
        );
    }

    /// True once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.subscription.is_disposed()
    }

    /// Unique id of the underlying subscription, for log correlation.
    pub fn id(&self) -> u64 {
        self.subscription.id()
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.subscription.id())
            .field("message_type", &self.subscription.declared_type())
            .field("disposed", &self.subscription.is_disposed())
            .finish()
    }
}

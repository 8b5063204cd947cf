//! # The bus: ordered, type-routed, cancellable dispatch.
//!
//! [`Bus`] owns the subscription registry and implements the publish loop.
//!
//! ## Architecture
//! ```text
//! subscribe / subscribe_async / subscribe_sync ──► registry (append)
//! observe ────────────────────────────────────────► registry (append)
//!
//! publish(message, ctx):
//!     snapshot registry
//!     for each entry, in registration order:
//!         ├─ ctx cancelled?      ──► Err(Canceled), stop
//!         ├─ entry.matches(msg)? ──► no: skip
//!         └─ await entry.process(msg, ctx)
//!                └─ Err(e)       ──► Err(e), stop
//! ```
//!
//! ## Rules
//! - **Strictly sequential**: one subscriber in flight at a time per
//!   publish call; each completes before the next is invoked.
//! - **Snapshot isolation**: subscriptions added mid-publish wait for the
//!   next publish; subscriptions disposed mid-publish stop matching.
//! - **Boundary cancellation**: the token is checked before each
//!   subscriber, never injected into one that is already running.
//! - **Fail-fast**: the first subscriber error ends the publish with that
//!   error, verbatim; later subscribers are never invoked.
//!
//! Independent publish calls interleave freely; only the dispatch chain
//! for a single message is serialized.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::bus::registry::Registry;
use crate::error::BusError;
use crate::message::Message;
use crate::subscriptions::{Observable, Subscription, SubscriptionHandle};

/// In-process publish/subscribe dispatcher.
///
/// Cheap to clone: clones share one registry, so a bus handle can be
/// captured by subscribers that need to register or publish themselves.
/// The registry itself is never exposed.
#[derive(Clone)]
pub struct Bus {
    registry: Arc<Registry>,
}

impl Bus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Publishes a message without cancellation support.
    ///
    /// Equivalent to [`publish_with`](Self::publish_with) with a token
    /// that is never canceled.
    pub async fn publish<M: Message>(&self, message: M) -> Result<(), BusError> {
        self.publish_with(message, CancellationToken::new()).await
    }

    /// Broadcasts `message` to every subscription registered for its
    /// runtime type or an ancestor of it, in registration order.
    ///
    /// Subscribers run strictly one after another; each completes before
    /// the next starts. `ctx` is checked before each subscriber: once
    /// cancellation is requested, dispatch stops with
    /// [`BusError::Canceled`] and remaining subscribers are skipped. A
    /// subscriber failure stops dispatch the same way, and the handler's
    /// error value becomes the publish outcome unchanged.
    pub async fn publish_with<M: Message>(
        &self,
        message: M,
        ctx: CancellationToken,
    ) -> Result<(), BusError> {
        let message: Arc<dyn Message> = Arc::new(message);
        let snapshot = self.registry.snapshot();
        trace!(
            message_type = type_name::<M>(),
            subscriptions = snapshot.len(),
            "publishing"
        );

        for entry in snapshot {
            if ctx.is_cancelled() {
                return Err(BusError::Canceled);
            }
            if !entry.matches(&message) {
                continue;
            }
            entry.process(Arc::clone(&message), ctx.clone()).await?;
        }
        Ok(())
    }

    /// Registers a cancellation-aware asynchronous subscriber for
    /// messages of type `T`.
    ///
    /// The handler receives the message and the publishing call's
    /// cancellation token; it may query the token mid-flight but is never
    /// preempted by the dispatcher.
    ///
    /// Matching is covariant: a subscriber for a base type also receives
    /// messages of types that declare it as an ancestor (see
    /// [`Message::parent`]).
    pub fn subscribe<T, F, Fut>(&self, handler: F) -> SubscriptionHandle
    where
        T: Message,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        let entry = Subscription::callback::<T, _, _>(handler);
        debug!(
            id = entry.id(),
            message_type = entry.declared_type(),
            "callback subscription registered"
        );
        self.registry.add(Arc::clone(&entry));
        SubscriptionHandle::new(entry, &self.registry)
    }

    /// Registers an asynchronous subscriber that does not care about
    /// cancellation. Sugar over [`subscribe`](Self::subscribe).
    pub fn subscribe_async<T, F, Fut>(&self, handler: F) -> SubscriptionHandle
    where
        T: Message,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        self.subscribe(move |message, _ctx| handler(message))
    }

    /// Registers a synchronous subscriber.
    ///
    /// The handler runs on the tokio blocking pool so the dispatch flow is
    /// not blocked while it executes, but the dispatcher still awaits its
    /// completion before invoking the next subscriber. A panic in the
    /// handler surfaces as [`BusError::Subscriber`].
    pub fn subscribe_sync<T, F>(&self, handler: F) -> SubscriptionHandle
    where
        T: Message,
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.subscribe(move |message: Arc<T>, _ctx| {
            let handler = Arc::clone(&handler);
            async move {
                tokio::task::spawn_blocking(move || handler(message))
                    .await
                    .map_err(|join| BusError::Subscriber {
                        error: join.to_string(),
                    })
            }
        })
    }

    /// Registers a stream subscription and returns its producer.
    ///
    /// Each call yields a fresh, not-yet-bound producer; producers never
    /// share a consumer. See [`Observable`].
    pub fn observe<T: Message>(&self) -> Observable<T> {
        let (entry, slot) = Subscription::observable::<T>();
        debug!(
            id = entry.id(),
            message_type = entry.declared_type(),
            "stream subscription registered"
        );
        self.registry.add(Arc::clone(&entry));
        Observable::new(SubscriptionHandle::new(entry, &self.registry), slot)
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("subscriptions", &self.registry.len())
            .finish()
    }
}

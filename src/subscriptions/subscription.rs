//! # Subscription entries: the dispatcher's uniform dispatch unit.
//!
//! A [`Subscription`] is one registered interest in messages of a declared
//! type. The two shapes a subscriber can take are a tagged variant:
//!
//! - **Callback** — an erased async handler, awaited to completion by the
//!   dispatcher before it moves on.
//! - **Observable** — a single-consumer push slot; values are handed to
//!   the bound consumer synchronously and the dispatcher never suspends.
//!
//! Both shapes sit behind the same `{matches, process, dispose}` surface,
//! so the publish loop is written once and stays oblivious to which
//! variant it holds.
//!
//! ## Rules
//! - `matches` is re-evaluated right before `process`; a disposed entry
//!   matches nothing, which is how mid-publish disposal skips delivery.
//! - `process` on a disposed entry returns [`BusError::Disposed`]. The
//!   dispatcher's re-check makes this unreachable from the outside.
//! - Disposal is a one-way atomic flip; only the first call reports having
//!   done anything.

use std::any::type_name;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::BusError;
use crate::message::{self, Message};

/// Global sequence for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Type-erased callback handler: receives the erased message and the
/// publication's cancellation token, returns the handler's completion.
pub(crate) type ErasedHandler = Box<
    dyn Fn(Arc<dyn Message>, CancellationToken) -> BoxFuture<'static, Result<(), BusError>>
        + Send
        + Sync,
>;

/// Type-erased observable consumer: a synchronous push target.
pub(crate) type ErasedConsumer = Arc<dyn Fn(Arc<dyn Message>) + Send + Sync>;

/// The at-most-one consumer slot of an observable subscription.
///
/// Shared between the registry entry and the [`Observable`] producer handle
/// so binding never has to reach back through the entry.
///
/// [`Observable`]: crate::Observable
pub(crate) type ConsumerSlot = Arc<Mutex<Option<ErasedConsumer>>>;

/// The two subscriber shapes behind one dispatch surface.
pub(crate) enum SubscriptionKind {
    /// Awaited async handler.
    Callback { handler: ErasedHandler },
    /// Single-consumer synchronous push.
    Observable { consumer: ConsumerSlot },
}

/// One live registration: declared type, disposal state, and the variant
/// that does the actual processing.
pub(crate) struct Subscription {
    id: u64,
    declared_type: &'static str,
    disposed: AtomicBool,
    accepts: Box<dyn Fn(&Arc<dyn Message>) -> bool + Send + Sync>,
    kind: SubscriptionKind,
}

impl Subscription {
    /// Creates a callback entry for messages of type `T`.
    ///
    /// The typed handler is erased here: the stored closure re-runs the
    /// ancestor-chain cast and invokes the handler with the typed value.
    pub(crate) fn callback<T, F, Fut>(handler: F) -> Arc<Self>
    where
        T: Message,
        F: Fn(Arc<T>, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        let handler: ErasedHandler = Box::new(move |message, ctx| {
            match message::cast::<T>(&message) {
                Some(typed) => handler(typed, ctx).boxed(),
                // Unreachable: the dispatcher only processes entries whose
                // matching check passed for this very message.
                None => future::ready(Ok(())).boxed(),
            }
        });

        Arc::new(Self {
            id: SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed),
            declared_type: type_name::<T>(),
            disposed: AtomicBool::new(false),
            accepts: Box::new(message::is_instance::<T>),
            kind: SubscriptionKind::Callback { handler },
        })
    }

    /// Creates an observable entry for messages of type `T`, returning the
    /// entry together with its (initially empty) consumer slot.
    pub(crate) fn observable<T: Message>() -> (Arc<Self>, ConsumerSlot) {
        let slot: ConsumerSlot = Arc::new(Mutex::new(None));

        let entry = Arc::new(Self {
            id: SUBSCRIPTION_SEQ.fetch_add(1, Ordering::Relaxed),
            declared_type: type_name::<T>(),
            disposed: AtomicBool::new(false),
            accepts: Box::new(message::is_instance::<T>),
            kind: SubscriptionKind::Observable {
                consumer: Arc::clone(&slot),
            },
        });

        (entry, slot)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Declared message type, for diagnostics.
    pub(crate) fn declared_type(&self) -> &'static str {
        self.declared_type
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// True iff not disposed and the message's runtime type, or one of its
    /// ancestors, is the declared type.
    pub(crate) fn matches(&self, message: &Arc<dyn Message>) -> bool {
        !self.is_disposed() && (self.accepts)(message)
    }

    /// Processes one matching message.
    ///
    /// Callback entries return the handler's own future; the dispatcher
    /// awaits it before touching the next entry. Observable entries push
    /// synchronously and return an already-completed future.
    ///
    /// The consumer is cloned out of its slot before the push, so a
    /// consumer may dispose its own subscription from inside the push
    /// without deadlocking.
    pub(crate) fn process(
        &self,
        message: Arc<dyn Message>,
        ctx: CancellationToken,
    ) -> BoxFuture<'static, Result<(), BusError>> {
        if self.is_disposed() {
            return future::ready(Err(BusError::Disposed)).boxed();
        }

        match &self.kind {
            SubscriptionKind::Callback { handler } => handler(message, ctx),
            SubscriptionKind::Observable { consumer } => {
                let bound = consumer.lock().clone();
                if let Some(push) = bound {
                    push(message);
                }
                future::ready(Ok(())).boxed()
            }
        }
    }

    /// Marks the entry disposed and clears the consumer binding, if any.
    ///
    /// Returns `true` only for the call that actually performed the
    /// disposal; repeated calls are no-ops.
    pub(crate) fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let SubscriptionKind::Observable { consumer } = &self.kind {
            consumer.lock().take();
        }
        true
    }
}

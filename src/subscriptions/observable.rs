//! # Observable subscriptions: single-consumer push streams.
//!
//! [`Bus::observe`](crate::Bus::observe) registers a stream-shaped
//! subscription and returns an [`Observable`] producer. Each call yields a
//! fresh producer; there is no implicit sharing between them.
//!
//! ## Architecture
//! ```text
//! bus.observe::<T>() ──► Observable<T> (producer, also the disposal handle)
//!        │                     │
//!        │                     ├─ bind(consumer)   at most once
//!        │                     └─ into_stream()    sugar: binds a channel
//!        ▼                     ▼
//!    registry entry ──► publish pushes Arc<T> synchronously, in publish order
//! ```
//!
//! ## Rules
//! - One consumer for the producer's whole lifetime; a second `bind`
//!   fails with [`BusError::AlreadyBound`] and the first binding stands.
//! - Pushes never suspend the dispatcher; the dispatcher does not await
//!   consumer-side work.
//! - After `dispose()` the consumer receives nothing further, while other
//!   independently created observables for the same type keep receiving.

use std::fmt;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::BusError;
use crate::message::{self, Message};
use crate::subscriptions::handle::SubscriptionHandle;
use crate::subscriptions::subscription::{ConsumerSlot, ErasedConsumer};

/// Producer side of a stream subscription, and its disposal handle.
pub struct Observable<T> {
    handle: SubscriptionHandle,
    slot: ConsumerSlot,
    _marker: PhantomData<fn(Arc<T>)>,
}

impl<T: Message> Observable<T> {
    pub(crate) fn new(handle: SubscriptionHandle, slot: ConsumerSlot) -> Self {
        Self {
            handle,
            slot,
            _marker: PhantomData,
        }
    }

    /// Binds the single consumer for this producer.
    ///
    /// Values of the declared type published afterward are pushed to the
    /// consumer synchronously, in publish order. Fails with
    /// [`BusError::AlreadyBound`] if a consumer is already bound; the
    /// existing binding is left untouched.
    pub fn bind<C>(&self, consumer: C) -> Result<(), BusError>
    where
        C: Fn(Arc<T>) + Send + Sync + 'static,
    {
        let erased: ErasedConsumer = Arc::new(move |message| {
            if let Some(typed) = message::cast::<T>(&message) {
                consumer(typed);
            }
        });

        let mut slot = self.slot.lock();
        if slot.is_some() {
            return Err(BusError::AlreadyBound);
        }
        *slot = Some(erased);
        drop(slot);

        debug!(id = self.handle.id(), "observable consumer bound");
        Ok(())
    }

    /// Consumes the producer and exposes it as a [`futures::Stream`].
    ///
    /// Sugar over [`bind`](Self::bind): the bound consumer forwards into
    /// an unbounded channel drained by the returned stream. The stream
    /// yields values already pushed, then ends once the subscription is
    /// disposed.
    pub fn into_stream(self) -> Result<ObservableStream<T>, BusError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.bind(move |value| {
            let _ = tx.send(value);
        })?;
        Ok(ObservableStream {
            observable: self,
            rx,
        })
    }

    /// Detaches this subscription; the bound consumer receives nothing
    /// further. Idempotent.
    pub fn dispose(&self) {
        self.handle.dispose();
    }

    /// True once [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Stream adapter over an [`Observable`], produced by
/// [`Observable::into_stream`].
///
/// Ends after [`dispose`](ObservableStream::dispose) once buffered values
/// are drained.
pub struct ObservableStream<T> {
    observable: Observable<T>,
    rx: mpsc::UnboundedReceiver<Arc<T>>,
}

impl<T: Message> ObservableStream<T> {
    /// Detaches the underlying subscription. Values already pushed remain
    /// readable; afterward the stream ends.
    pub fn dispose(&self) {
        self.observable.dispose();
    }

    /// True once the underlying subscription is disposed.
    pub fn is_disposed(&self) -> bool {
        self.observable.is_disposed()
    }
}

impl<T: Message> Stream for ObservableStream<T> {
    type Item = Arc<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> fmt::Debug for ObservableStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableStream")
            .field("observable", &self.observable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::{future, StreamExt};
    use parking_lot::Mutex;

    use super::*;
    use crate::bus::Bus;

    #[derive(Debug, PartialEq)]
    struct Num(i32);

    impl Message for Num {}

    #[tokio::test]
    async fn test_bound_consumer_receives_in_publish_order() {
        let bus = Bus::new();
        let observable = bus.observe::<Num>();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        observable
            .bind(move |value| sink.lock().push(value.0))
            .expect("first bind must succeed");

        for v in [10, 20, 30] {
            bus.publish(Num(v)).await.expect("publish should succeed");
        }
        assert_eq!(*seen.lock(), vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_second_bind_fails_and_first_stands() {
        let bus = Bus::new();
        let observable = bus.observe::<Num>();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        observable
            .bind(move |value| sink.lock().push(value.0))
            .expect("first bind must succeed");

        let err = observable
            .bind(|_| {})
            .expect_err("second bind must be rejected");
        assert_eq!(err, BusError::AlreadyBound);

        bus.publish(Num(7)).await.expect("publish should succeed");
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[tokio::test]
    async fn test_disposed_observable_goes_silent_while_others_receive() {
        let bus = Bus::new();
        let first = bus.observe::<Num>();
        let second = bus.observe::<Num>();

        let first_seen = Arc::new(Mutex::new(Vec::new()));
        let second_seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&first_seen);
        first.bind(move |v| sink.lock().push(v.0)).expect("bind");
        let sink = Arc::clone(&second_seen);
        second.bind(move |v| sink.lock().push(v.0)).expect("bind");

        bus.publish(Num(1)).await.expect("publish");
        first.dispose();
        first.dispose(); // repeated disposal is a no-op
        bus.publish(Num(2)).await.expect("publish");

        assert_eq!(*first_seen.lock(), vec![1]);
        assert_eq!(*second_seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stream_identity_transform() {
        let bus = Bus::new();
        let stream = bus
            .observe::<Num>()
            .into_stream()
            .expect("fresh observable must accept a consumer");

        for v in [1, 2, 3, 4, 5, 6] {
            bus.publish(Num(v)).await.expect("publish");
        }
        stream.dispose();

        let values: Vec<i32> = stream.map(|m| m.0).collect().await;
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn test_stream_suppress_consecutive_duplicates() {
        let bus = Bus::new();
        let stream = bus
            .observe::<Num>()
            .into_stream()
            .expect("fresh observable must accept a consumer");

        for v in [1, 2, 2, 2, 3, 2, 2, 4] {
            bus.publish(Num(v)).await.expect("publish");
        }
        stream.dispose();

        let deduped: Vec<i32> = stream
            .scan(None::<i32>, |last, m| {
                let value = m.0;
                let fresh = last.map_or(true, |prev| prev != value);
                *last = Some(value);
                future::ready(Some(if fresh { Some(value) } else { None }))
            })
            .filter_map(future::ready)
            .collect()
            .await;
        assert_eq!(deduped, vec![1, 2, 3, 2, 4]);
    }

    #[tokio::test]
    async fn test_into_stream_after_bind_is_rejected() {
        let bus = Bus::new();
        let observable = bus.observe::<Num>();
        observable.bind(|_| {}).expect("first bind must succeed");

        let err = observable
            .into_stream()
            .expect_err("stream cannot attach to a bound observable");
        assert_eq!(err, BusError::AlreadyBound);
    }
}

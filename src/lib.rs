//! # courier
//!
//! **Courier** is an in-process publish/subscribe bus for Rust.
//!
//! Messages are routed by their runtime type: a subscription declares the
//! message type it wants, and every published value whose type — or one of
//! whose declared ancestors — matches is delivered to it, in registration
//! order, strictly one subscriber at a time. Publications can be canceled
//! cooperatively between subscribers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   subscribe::<T>(handler)     observe::<T>()
//!   subscribe_async / _sync          │
//!            │                       ▼
//!            │               Observable<T> ── bind(consumer) / into_stream()
//!            ▼                       │
//! ┌──────────────────────────────────┴────────────────────────────┐
//! │  Bus                                                          │
//! │  - Registry (ordered live subscriptions, snapshot on publish) │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ publish(message, ctx)
//!                                ▼
//!                  for each matching subscription, in order:
//!                     ├─ Callback:   await handler(Arc<T>, ctx)
//!                     └─ Observable: push Arc<T> to the consumer
//! ```
//!
//! ### Dispatch guarantees
//! - **Ordered and sequential**: one subscriber in flight per publish;
//!   each completes before the next starts. No ordering exists between
//!   independent publish calls.
//! - **Covariant matching**: a subscriber for a base type also receives
//!   messages whose [`Message::parent`] chain reaches that type.
//! - **Snapshot isolation**: a publish call notifies the subscriptions
//!   registered when it started; later additions wait for the next
//!   publish, and disposals take effect immediately.
//! - **Cooperative cancellation**: the caller's `CancellationToken` is
//!   checked before each subscriber; a running subscriber is never
//!   preempted, and cancellation surfaces as [`BusError::Canceled`],
//!   distinct from a subscriber's own failure.
//!
//! ## Features
//! | Area              | Description                                               | Key types                          |
//! |-------------------|-----------------------------------------------------------|------------------------------------|
//! | **Messages**      | Route by runtime type, with explicit supertype views.     | [`Message`]                        |
//! | **Callbacks**     | Async, cancellation-aware handlers, awaited in order.     | [`Bus::subscribe`], [`SubscriptionHandle`] |
//! | **Observables**   | Single-consumer push streams over matching messages.      | [`Bus::observe`], [`Observable`], [`ObservableStream`] |
//! | **Errors**        | One outcome per publish: success, fault, or cancellation. | [`BusError`]                       |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use courier::{Bus, BusError, Message};
//!
//! struct Deployed {
//!     service: &'static str,
//! }
//!
//! impl Message for Deployed {}
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), BusError> {
//!     let bus = Bus::new();
//!
//!     let audit = bus.subscribe(|message: Arc<Deployed>, _ctx| async move {
//!         println!("deployed: {}", message.service);
//!         Ok(())
//!     });
//!
//!     bus.publish(Deployed { service: "billing" }).await?;
//!
//!     audit.dispose();
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod message;
mod subscriptions;

// ---- Public re-exports ----

pub use bus::Bus;
pub use error::BusError;
pub use message::Message;
pub use subscriptions::{Observable, ObservableStream, SubscriptionHandle};

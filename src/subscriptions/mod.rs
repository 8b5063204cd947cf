//! # Subscription shapes and their handles.
//!
//! A registration comes in one of two shapes, modeled as a tagged variant
//! behind a single `{matches, process, dispose}` surface:
//!
//! ```text
//! Subscription
//!   ├─ Callback    awaited async handler     (subscribe / subscribe_async / subscribe_sync)
//!   └─ Observable  single-consumer push slot (observe)
//! ```
//!
//! What callers hold:
//! - [`SubscriptionHandle`] — disposal handle for callback subscriptions;
//! - [`Observable`] — producer *and* disposal handle for stream
//!   subscriptions, convertible into a [`futures::Stream`] via
//!   [`ObservableStream`].
//!
//! Disposal is explicit and idempotent; dropping a handle does not
//! unsubscribe.

mod handle;
mod observable;
mod subscription;

pub use handle::SubscriptionHandle;
pub use observable::{Observable, ObservableStream};
pub(crate) use subscription::Subscription;

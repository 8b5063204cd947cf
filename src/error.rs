//! Error types used by the bus and by subscriber handlers.
//!
//! The single [`BusError`] enum covers every failure a publication can
//! surface:
//!
//! - [`BusError::Canceled`] — the publish caller requested cancellation.
//! - [`BusError::Subscriber`] — a subscriber's own handler failed.
//! - [`BusError::AlreadyBound`] — a second consumer was bound to an observable.
//! - [`BusError::Disposed`] — processing was attempted on a disposed subscription.
//!
//! Handlers return `Result<(), BusError>`; whatever error value a handler
//! returns is propagated as the outcome of the publish call unchanged, so
//! callers see the subscriber's failure with its kind and message intact.
//! The helper methods (`as_label`, `as_message`) exist for logs/metrics.

use thiserror::Error;

/// # Errors surfaced by the bus.
///
/// A publish call resolves to exactly one outcome: success, a subscriber
/// failure, or cancellation. [`BusError::AlreadyBound`] and
/// [`BusError::Disposed`] come from subscription management rather than
/// dispatch; they never terminate a publish on their own.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Publication observed a requested cancellation at a dispatch boundary.
    ///
    /// Subscribers already invoked have run to completion; subscribers not
    /// yet reached were never invoked.
    #[error("publication canceled")]
    Canceled,

    /// A subscriber's handler failed while processing a message.
    ///
    /// Dispatch stops at the failing subscriber and the error becomes the
    /// publish call's own result.
    #[error("subscriber failed: {error}")]
    Subscriber {
        /// The underlying failure message.
        error: String,
    },

    /// An observable already has a consumer and does not support a second one.
    ///
    /// The existing binding is unaffected by the rejected attempt.
    #[error("observable already bound to a consumer")]
    AlreadyBound,

    /// Processing was attempted on an already-disposed subscription.
    ///
    /// The dispatcher re-checks matching right before processing, so this
    /// indicates a broken internal invariant rather than a caller mistake.
    #[error("subscription already disposed")]
    Disposed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use courier::BusError;
    ///
    /// assert_eq!(BusError::Canceled.as_label(), "publish_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Canceled => "publish_canceled",
            BusError::Subscriber { .. } => "subscriber_failed",
            BusError::AlreadyBound => "consumer_already_bound",
            BusError::Disposed => "subscription_disposed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::Canceled => "publication canceled".to_string(),
            BusError::Subscriber { error } => format!("subscriber error: {error}"),
            BusError::AlreadyBound => "observable already has a consumer".to_string(),
            BusError::Disposed => "subscription disposed".to_string(),
        }
    }

    /// Indicates whether this outcome was a caller-initiated abort rather
    /// than a genuine fault.
    ///
    /// # Example
    /// ```
    /// use courier::BusError;
    ///
    /// assert!(BusError::Canceled.is_cancellation());
    /// assert!(!BusError::Subscriber { error: "boom".into() }.is_cancellation());
    /// ```
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BusError::Canceled)
    }
}

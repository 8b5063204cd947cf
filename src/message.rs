//! # Message model and covariant type matching.
//!
//! Anything `'static + Send + Sync` can travel on the bus by implementing
//! [`Message`]. A subscription declares the message type it wants at
//! registration time; routing happens at publish time against the
//! *runtime* type of the published value.
//!
//! ## Covariance
//! A message may expose a supertype view through [`Message::parent`].
//! Matching walks the chain `message → parent → grandparent → …` and a
//! subscription for any type on that chain receives the message, converted
//! to its declared type. A subscription for a more derived type never
//! matches a base-type message.
//!
//! ## Rules
//! - `parent()` defaults to `None`: plain message types need an empty impl.
//! - The parent view is built by the message itself, so a base-type
//!   subscriber receives a real value of its declared type carrying the
//!   fields the message chose to project into it.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use courier::Message;
//!
//! struct Connected {
//!     session: u64,
//! }
//!
//! impl Message for Connected {}
//!
//! struct TlsConnected {
//!     session: u64,
//! }
//!
//! // Subscribers for `Connected` also receive `TlsConnected` messages.
//! impl Message for TlsConnected {
//!     fn parent(&self) -> Option<Arc<dyn Message>> {
//!         Some(Arc::new(Connected { session: self.session }))
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

/// A value that can be published on the bus.
///
/// Implementors are routed by their concrete type. Override
/// [`parent`](Message::parent) to make subscriptions for a base type
/// receive this message as well.
pub trait Message: Any + Send + Sync {
    /// Returns this message viewed as its supertype, if it has one.
    ///
    /// The default is `None` (no ancestors). Chains of any depth are
    /// allowed; matching walks them until a subscription's declared type
    /// is found or the chain ends.
    fn parent(&self) -> Option<Arc<dyn Message>> {
        None
    }
}

/// Converts a published message into a subscription's declared type `T`.
///
/// Walks the ancestor chain starting at the message's own type. Returns
/// `None` when neither the message nor any ancestor is a `T`.
pub(crate) fn cast<T: Message>(message: &Arc<dyn Message>) -> Option<Arc<T>> {
    let mut current = Arc::clone(message);
    loop {
        let cloned: Arc<dyn Message> = Arc::clone(&current);
        let any: Arc<dyn Any + Send + Sync> = cloned;
        match any.downcast::<T>() {
            Ok(typed) => return Some(typed),
            Err(_) => current = current.parent()?,
        }
    }
}

/// True iff the message's runtime type, or one of its ancestors, is `T`.
pub(crate) fn is_instance<T: Message>(message: &Arc<dyn Message>) -> bool {
    cast::<T>(message).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Grandparent {
        tag: &'static str,
    }

    impl Message for Grandparent {}

    struct Parent {
        tag: &'static str,
    }

    impl Message for Parent {
        fn parent(&self) -> Option<Arc<dyn Message>> {
            Some(Arc::new(Grandparent { tag: self.tag }))
        }
    }

    struct Child {
        tag: &'static str,
    }

    impl Message for Child {
        fn parent(&self) -> Option<Arc<dyn Message>> {
            Some(Arc::new(Parent { tag: self.tag }))
        }
    }

    struct Unrelated;

    impl Message for Unrelated {}

    fn erase<M: Message>(message: M) -> Arc<dyn Message> {
        Arc::new(message)
    }

    #[test]
    fn test_cast_to_own_type() {
        let message = erase(Child { tag: "x" });
        let child = cast::<Child>(&message).expect("child should cast to itself");
        assert_eq!(child.tag, "x");
    }

    #[test]
    fn test_cast_walks_one_level_up() {
        let message = erase(Child { tag: "p" });
        let parent = cast::<Parent>(&message).expect("child should cast to parent");
        assert_eq!(parent.tag, "p");
    }

    #[test]
    fn test_cast_walks_whole_chain() {
        let message = erase(Child { tag: "g" });
        let grand = cast::<Grandparent>(&message).expect("child should cast to grandparent");
        assert_eq!(grand.tag, "g");
    }

    #[test]
    fn test_cast_rejects_unrelated_type() {
        let message = erase(Child { tag: "x" });
        assert!(cast::<Unrelated>(&message).is_none());
    }

    #[test]
    fn test_cast_never_walks_downward() {
        // A base-type message is not an instance of its derived type.
        let message = erase(Parent { tag: "x" });
        assert!(cast::<Child>(&message).is_none());
        assert!(is_instance::<Grandparent>(&message));
    }

    #[test]
    fn test_is_instance_matches_cast() {
        let message = erase(Parent { tag: "x" });
        assert!(is_instance::<Parent>(&message));
        assert!(is_instance::<Grandparent>(&message));
        assert!(!is_instance::<Unrelated>(&message));
    }
}

use crate::{Result, Topic};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A unit of payload exchanged between messaging participants
///
/// The set of message types is open: independent components define their own
/// concrete messages and implement this trait. A message must pass
/// [`validate`](Message::validate) immediately before it is sent and
/// immediately after it is received, so structural integrity holds on both
/// ends of a boundary crossing. Consumers must not mutate a message after it
/// has been published.
pub trait Message: Any + Send + Sync + fmt::Debug {
    /// Check the message's structural integrity
    ///
    /// The default contract accepts everything; concrete messages override
    /// this with their own rules.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Return the canonical form of the message
    ///
    /// `None` means the message is already canonical (the identity case).
    /// Implementations may return a transformed copy to make messages
    /// comparable and serializable deterministically.
    fn normalize(&self) -> Option<AnyMessage> {
        None
    }

    /// Routing metadata attached to the message, if any
    ///
    /// Subscribers match this against their [`TopicPattern`](crate::TopicPattern)s
    /// to decide applicability; the exchange itself performs no routing on it.
    fn topic(&self) -> Option<&Topic> {
        None
    }

    /// Upcast for runtime-type dispatch
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a message of any concrete type
pub type AnyMessage = Arc<dyn Message>;

/// Canonicalization helper for shared messages
pub trait Normalized {
    /// Resolve the canonical form, returning the message itself when it is
    /// already canonical
    fn normalized(self) -> AnyMessage;
}

impl Normalized for AnyMessage {
    fn normalized(self) -> AnyMessage {
        match self.normalize() {
            Some(canonical) => canonical,
            None => self,
        }
    }
}

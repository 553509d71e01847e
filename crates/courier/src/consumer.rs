use crate::{AnyMessage, Message, MessageSink, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

type Attempt = Arc<dyn Fn(&AnyMessage) -> bool + Send + Sync>;

/// One link of the persistent handler chain
struct HandlerNode {
    /// Declared type of the handler, for logging
    accepts: &'static str,
    attempt: Attempt,
    previous: Option<Arc<HandlerNode>>,
}

/// A type-ordered chain of handlers dispatching on a message's runtime type
///
/// The chain is persistent: [`handle`](MessageConsumer::handle) and
/// [`otherwise`](MessageConsumer::otherwise) return a new consumer sharing
/// the existing chain, and the original stays usable unmodified. Dispatch is
/// newest-first (LIFO): the most recently added handler whose declared type
/// matches the message's runtime type consumes it, and no other handler runs.
///
/// A consumer carries no interior state, so concurrent
/// [`consume`](MessageConsumer::consume) calls are safe as long as the
/// handler actions themselves are.
#[derive(Clone)]
pub struct MessageConsumer {
    head: Option<Arc<HandlerNode>>,
    len: usize,
}

impl MessageConsumer {
    /// Create an empty consumer
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Return a new consumer with a handler for the concrete type `T`
    ///
    /// The new handler is tried before every handler already in the chain.
    pub fn handle<T, F>(&self, action: F) -> Self
    where
        T: Message,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let attempt: Attempt = Arc::new(move |message: &AnyMessage| {
            match message.as_any().downcast_ref::<T>() {
                Some(typed) => {
                    action(typed);
                    true
                }
                None => false,
            }
        });
        self.extend(std::any::type_name::<T>(), attempt)
    }

    /// Return a new consumer with a catch-all handler
    ///
    /// The catch-all matches every message, so a consumer extended this way
    /// never drops anything added before it gets a chance to miss.
    pub fn otherwise<F>(&self, action: F) -> Self
    where
        F: Fn(&AnyMessage) + Send + Sync + 'static,
    {
        let attempt: Attempt = Arc::new(move |message: &AnyMessage| {
            action(message);
            true
        });
        self.extend("any message", attempt)
    }

    /// Dispatch a message to the first matching handler
    ///
    /// Returns true when a handler consumed the message; false is a routing
    /// miss, not an error — the message is dropped.
    pub fn consume(&self, message: &AnyMessage) -> bool {
        let mut node = self.head.as_deref();
        while let Some(handler) = node {
            if (handler.attempt)(message) {
                trace!(handler = handler.accepts, "message consumed");
                return true;
            }
            node = handler.previous.as_deref();
        }
        trace!("no handler matched, message dropped");
        false
    }

    /// Number of handlers in the chain
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the chain has no handlers
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn extend(&self, accepts: &'static str, attempt: Attempt) -> Self {
        Self {
            head: Some(Arc::new(HandlerNode {
                accepts,
                attempt,
                previous: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }
}

impl Default for MessageConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MessageConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageConsumer")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSink for MessageConsumer {
    /// Dispatch the message, discarding the consumed/dropped outcome
    async fn publish(&self, message: AnyMessage) -> Result<()> {
        self.consume(&message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::any::Any;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct AlphaMessage {
        label: String,
    }

    impl Message for AlphaMessage {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct BetaMessage;

    impl Message for BetaMessage {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn record(log: &Arc<Mutex<Vec<String>>>, entry: impl Into<String>) {
        log.lock().unwrap().push(entry.into());
    }

    #[test]
    fn test_dispatches_by_runtime_type() {
        let seen = log();
        let alpha_seen = seen.clone();
        let beta_seen = seen.clone();
        let fixture = MessageConsumer::new()
            .handle::<AlphaMessage, _>(move |m| record(&alpha_seen, format!("alpha:{}", m.label)))
            .handle::<BetaMessage, _>(move |_| record(&beta_seen, "beta"));

        let alpha: AnyMessage = Arc::new(AlphaMessage {
            label: "one".to_string(),
        });
        let beta: AnyMessage = Arc::new(BetaMessage);

        assert!(fixture.consume(&alpha));
        assert!(fixture.consume(&beta));

        let actual = seen.lock().unwrap().clone();
        assert_eq!(actual, vec!["alpha:one".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_dispatch_precedence_is_lifo() {
        // A catch-all added first and a typed handler added after both match;
        // the most recently added handler must win.
        let seen = log();
        let catch_all_seen = seen.clone();
        let typed_seen = seen.clone();
        let fixture = MessageConsumer::new()
            .otherwise(move |_| record(&catch_all_seen, "catch-all"))
            .handle::<AlphaMessage, _>(move |_| record(&typed_seen, "typed"));

        let message: AnyMessage = Arc::new(AlphaMessage {
            label: "one".to_string(),
        });
        assert!(fixture.consume(&message));

        let actual = seen.lock().unwrap().clone();
        assert_eq!(actual, vec!["typed".to_string()]);
    }

    #[test]
    fn test_first_match_wins_without_fanout() {
        let seen = log();
        let newer = seen.clone();
        let older = seen.clone();
        let fixture = MessageConsumer::new()
            .handle::<AlphaMessage, _>(move |_| record(&older, "older"))
            .handle::<AlphaMessage, _>(move |_| record(&newer, "newer"));

        let message: AnyMessage = Arc::new(AlphaMessage {
            label: "one".to_string(),
        });
        assert!(fixture.consume(&message));

        let actual = seen.lock().unwrap().clone();
        assert_eq!(actual, vec!["newer".to_string()]);
    }

    #[test]
    fn test_unmatched_message_is_dropped() {
        let fixture = MessageConsumer::new().handle::<AlphaMessage, _>(|_| {});

        let message: AnyMessage = Arc::new(BetaMessage);
        let actual = fixture.consume(&message);

        assert!(!actual);
    }

    #[test]
    fn test_empty_consumer_matches_nothing() {
        let fixture = MessageConsumer::new();
        let message: AnyMessage = Arc::new(BetaMessage);

        assert!(!fixture.consume(&message));
        assert!(fixture.is_empty());
        assert_eq!(fixture.len(), 0);
    }

    #[test]
    fn test_extension_is_persistent() {
        let seen = log();
        let typed_seen = seen.clone();
        let original = MessageConsumer::new();
        let extended =
            original.handle::<AlphaMessage, _>(move |_| record(&typed_seen, "typed"));

        // The original chain is unchanged and still usable.
        let message: AnyMessage = Arc::new(AlphaMessage {
            label: "one".to_string(),
        });
        assert!(!original.consume(&message));
        assert!(extended.consume(&message));

        assert_eq!(original.len(), 0);
        assert_eq!(extended.len(), 1);
    }

    #[test]
    fn test_otherwise_catches_everything() {
        let seen = log();
        let catch_all_seen = seen.clone();
        let fixture = MessageConsumer::new().otherwise(move |_| record(&catch_all_seen, "any"));

        let alpha: AnyMessage = Arc::new(AlphaMessage {
            label: "one".to_string(),
        });
        let beta: AnyMessage = Arc::new(BetaMessage);

        assert!(fixture.consume(&alpha));
        assert!(fixture.consume(&beta));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_publish_discards_dispatch_outcome() {
        let fixture = MessageConsumer::new().handle::<AlphaMessage, _>(|_| {});

        // An unmatched publish is not an error.
        let unmatched: AnyMessage = Arc::new(BetaMessage);
        let actual = fixture.publish(unmatched).await;
        assert!(actual.is_ok());

        let matched: AnyMessage = Arc::new(AlphaMessage {
            label: "one".to_string(),
        });
        let actual = fixture.publish(matched).await;
        assert!(actual.is_ok());
    }
}

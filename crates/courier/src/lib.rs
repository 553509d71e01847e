//! # courier
//!
//! Topic-routed message exchange and dispatch primitives.
//!
//! This crate provides the in-process/cross-process messaging core for a
//! session bridging a local publisher with a remote receiver: a validated
//! message contract, topic keys with wildcard pattern matching, type-driven
//! handler dispatch, and a thread-safe blocking mailbox with bounded waiting.
//!
//! ## Key Components
//!
//! - **Message**: validated, normalizable payload contract over an open set
//!   of concrete types
//! - **Topic/TopicPattern**: dot-delimited routing keys and wildcard matching
//!   rules (`*` = one word, `#` = zero or more words)
//! - **MessageConsumer**: persistent LIFO chain of type-dispatched handlers
//! - **MessageExchange**: two-party FIFO mailbox with timeout-bounded receive
//!   and a drain barrier
//! - **MessageSink**: the publish-side boundary trait, with null and remoting
//!   endpoints
//!
//! ## Usage
//!
//! ```rust
//! use courier::{MessageExchange, Topic, TopicPattern};
//!
//! # fn example() -> courier::Result<()> {
//! let pattern = TopicPattern::new("agents.*.status")?;
//! let topic = Topic::new("agents.worker.status")?;
//! assert!(pattern.is_match(&topic));
//!
//! let exchange = MessageExchange::default();
//! let link = exchange.client_link();
//! # let _ = link;
//! # Ok(())
//! # }
//! ```

pub mod consumer;
pub mod error;
pub mod exchange;
pub mod formatter;
pub mod message;
pub mod sink;
pub mod topic;

// Re-export public API
pub use consumer::MessageConsumer;
pub use error::{CourierError, Result};
pub use exchange::{ExchangeLink, MessageExchange, MessageExchangeLink};
pub use formatter::MessageFormatter;
pub use message::{AnyMessage, Message, Normalized};
pub use sink::{MessageSink, NullMessageSink, RemoteMessageSink};
pub use topic::{Topic, TopicPattern};

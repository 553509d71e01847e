use crate::{AnyMessage, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Publish endpoint for messages
///
/// Implemented by [`MessageExchange`](crate::MessageExchange),
/// [`MessageConsumer`](crate::MessageConsumer), [`NullMessageSink`] and
/// [`RemoteMessageSink`].
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Publish a message to the sink
    async fn publish(&self, message: AnyMessage) -> Result<()>;
}

/// A sink that discards every message
///
/// Used as the default endpoint where no consumer has been installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMessageSink;

#[async_trait]
impl MessageSink for NullMessageSink {
    async fn publish(&self, _message: AnyMessage) -> Result<()> {
        trace!("message discarded by null sink");
        Ok(())
    }
}

/// Proxy that carries publishes across a remoting boundary
///
/// Wraps the far side's sink behind a strong reference, so the remote-facing
/// surface stays reachable for as long as the owning session holds this
/// proxy. Messages are re-validated here: the proxy sits exactly on the
/// boundary crossing.
#[derive(Clone)]
pub struct RemoteMessageSink {
    inner: Arc<dyn MessageSink>,
}

impl RemoteMessageSink {
    /// Create a new remote proxy around a sink
    pub fn new(inner: Arc<dyn MessageSink>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for RemoteMessageSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMessageSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSink for RemoteMessageSink {
    async fn publish(&self, message: AnyMessage) -> Result<()> {
        message.validate()?;
        self.inner.publish(message).await
    }
}

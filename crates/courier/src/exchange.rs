use crate::{AnyMessage, MessageSink, NullMessageSink, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, trace};

/// Remote-facing half of an exchange
///
/// This is the only surface exposed across the process boundary to the peer:
/// it can pull published messages and push replies, and nothing else.
#[async_trait]
pub trait MessageExchangeLink: Send + Sync {
    /// Pull the next published message, waiting up to `timeout`
    ///
    /// `None` means the timeout elapsed with an empty queue — an expected
    /// outcome, not an error.
    async fn receive(&self, timeout: Duration) -> Option<AnyMessage>;

    /// Push a reply back toward the locally installed sink
    async fn send(&self, message: AnyMessage) -> Result<()>;
}

/// Queue state shared between the exchange and its client links
struct Shared {
    queue: Mutex<VecDeque<AnyMessage>>,
    /// Single condition for both waiter kinds ("queue non-empty" for
    /// receivers, "queue empty" for drain watchers), broadcast on every
    /// enqueue and dequeue.
    state_changed: Notify,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            state_changed: Notify::new(),
        }
    }
}

/// Two-party blocking mailbox between a local publisher and a remote receiver
///
/// One exchange mediates exactly one publish direction and one receive
/// direction: [`publish`](MessageExchange::publish) enqueues toward the
/// remote peer, the peer pulls with [`receive`](MessageExchange::receive)
/// and replies with [`send`](MessageExchange::send), which forwards to the
/// locally installed [`MessageSink`]. This is not a multi-subscriber broker;
/// messages are delivered exactly once, in FIFO order.
///
/// Any number of tasks may publish and receive concurrently; all queue access
/// is serialized through one internal lock. Messages still queued when the
/// exchange is dropped are discarded.
pub struct MessageExchange {
    shared: Arc<Shared>,
    sink: Arc<dyn MessageSink>,
}

impl MessageExchange {
    /// Create an exchange forwarding replies to `sink`
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            sink,
        }
    }

    /// Create a capability-narrowed handle for the remote peer
    ///
    /// The link holds strong references to the exchange's state, keeping the
    /// remote-facing surface alive for as long as the owning session holds
    /// the link.
    pub fn client_link(&self) -> ExchangeLink {
        ExchangeLink {
            shared: self.shared.clone(),
            sink: self.sink.clone(),
        }
    }

    /// Validate and enqueue a message toward the remote peer
    ///
    /// Validation happens before any queue mutation: an invalid message
    /// propagates its error and leaves the queue untouched. On success every
    /// waiter is woken (broadcast, not single-wake, so no waiter kind can
    /// miss a state change it cares about).
    pub async fn publish(&self, message: AnyMessage) -> Result<()> {
        message.validate()?;
        let mut queue = self.shared.queue.lock().await;
        queue.push_back(message);
        let pending = queue.len();
        drop(queue);
        self.shared.state_changed.notify_waiters();
        trace!(pending, "message enqueued");
        Ok(())
    }

    /// Pull the next message, waiting up to `timeout`
    ///
    /// `Duration::ZERO` checks the queue once without waiting.
    pub async fn receive(&self, timeout: Duration) -> Option<AnyMessage> {
        receive_from(&self.shared, timeout).await
    }

    /// Pull the next message without waiting
    pub async fn try_receive(&self) -> Option<AnyMessage> {
        receive_from(&self.shared, Duration::ZERO).await
    }

    /// Validate and forward a reply to the locally installed sink
    ///
    /// The reverse channel: this never touches the receive queue.
    pub async fn send(&self, message: AnyMessage) -> Result<()> {
        send_through(&self.sink, message).await
    }

    /// Wait until every published message has been pulled off the queue
    ///
    /// Returns true once the queue becomes empty within `timeout`, false if
    /// the timeout elapses first. This is a flush barrier, not an
    /// acknowledgment of downstream processing: "removed from the queue" is
    /// all it guarantees.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = deadline_after(timeout);
        loop {
            let notified = self.shared.state_changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.queue.lock().await.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                debug!("drain barrier timed out with messages still queued");
                return false;
            }
            let _ = tokio::time::timeout_at(deadline, notified).await;
        }
    }

    /// Number of messages currently queued
    pub async fn pending(&self) -> usize {
        self.shared.queue.lock().await.len()
    }
}

impl Default for MessageExchange {
    fn default() -> Self {
        Self::new(Arc::new(NullMessageSink))
    }
}

impl fmt::Debug for MessageExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageExchange").finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSink for MessageExchange {
    async fn publish(&self, message: AnyMessage) -> Result<()> {
        MessageExchange::publish(self, message).await
    }
}

/// Client-side handle exposing only `receive` and `send`
#[derive(Clone)]
pub struct ExchangeLink {
    shared: Arc<Shared>,
    sink: Arc<dyn MessageSink>,
}

impl fmt::Debug for ExchangeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeLink").finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageExchangeLink for ExchangeLink {
    async fn receive(&self, timeout: Duration) -> Option<AnyMessage> {
        receive_from(&self.shared, timeout).await
    }

    async fn send(&self, message: AnyMessage) -> Result<()> {
        send_through(&self.sink, message).await
    }
}

fn deadline_after(timeout: Duration) -> Instant {
    // tokio's `Instant::far_future` (now + 30 years) is pub(crate); inline it.
    Instant::now()
        .checked_add(timeout)
        .unwrap_or_else(|| Instant::now() + Duration::from_secs(86400 * 365 * 30))
}

/// Dequeue loop shared by the exchange and its links
///
/// The wakeup registration is armed before each queue check, so an enqueue
/// between the check and the wait cannot be lost. Remaining time is
/// recomputed from the monotonic clock on every pass; a wakeup that finds
/// the queue still empty goes back to waiting for the remainder, and the
/// total wait never exceeds the caller's timeout.
async fn receive_from(shared: &Shared, timeout: Duration) -> Option<AnyMessage> {
    let deadline = deadline_after(timeout);
    loop {
        let notified = shared.state_changed.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        {
            let mut queue = shared.queue.lock().await;
            if let Some(message) = queue.pop_front() {
                let pending = queue.len();
                drop(queue);
                // Dequeues also broadcast: drain watchers wait on the same
                // condition as receivers.
                shared.state_changed.notify_waiters();
                trace!(pending, "message dequeued");
                return Some(message);
            }
        }
        if Instant::now() >= deadline {
            trace!("receive timed out with an empty queue");
            return None;
        }
        let _ = tokio::time::timeout_at(deadline, notified).await;
    }
}

async fn send_through(sink: &Arc<dyn MessageSink>, message: AnyMessage) -> Result<()> {
    message.validate()?;
    sink.publish(message).await
}

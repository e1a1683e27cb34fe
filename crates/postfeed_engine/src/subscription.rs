//! Scoped notification subscription.

use crate::error::{FeedError, FeedResult};
use postfeed_protocol::PostEvent;
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

/// Sending half handed to the notification source.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<PostEvent>,
}

impl EventSink {
    /// Delivers a notification. Returns false once the subscriber is gone.
    pub fn send(&self, event: PostEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Returns true once the subscriber has been released.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A live subscription to the `posts` notification channel.
///
/// Notifications are yielded in delivery order. Dropping the subscription
/// closes the channel and runs the source's release hook exactly once.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<PostEvent>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Creates a connected sink / subscription pair.
    pub fn channel() -> (EventSink, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            EventSink { sender },
            Subscription {
                receiver,
                release: None,
            },
        )
    }

    /// Registers the hook that tears the subscription down at the source.
    pub fn on_release(mut self, release: impl FnOnce() + Send + 'static) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    /// Returns the next queued notification without waiting.
    ///
    /// `Ok(None)` means nothing is queued right now.
    pub fn try_next(&mut self) -> FeedResult<Option<PostEvent>> {
        match self.receiver.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(FeedError::SubscriptionClosed),
        }
    }

    /// Waits for the next notification. `None` once the source is gone.
    pub async fn next(&mut self) -> Option<PostEvent> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("has_release_hook", &self.release.is_some())
            .finish()
    }
}

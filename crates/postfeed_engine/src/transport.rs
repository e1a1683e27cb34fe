//! Collaborator abstractions: the request transport and the notification source.

use crate::error::{FeedError, FeedResult};
use crate::subscription::{EventSink, Subscription};
use parking_lot::Mutex;
use postfeed_protocol::{PostEvent, PostForm, PostId, PostPage, RawPost, StatusUpdate, SubmitTarget};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A feed transport handles request/response communication with the backend.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory, mock for testing, etc.).
pub trait FeedTransport: Send + Sync {
    /// Fetches one page of posts.
    fn fetch_posts(&self, page: u32) -> FeedResult<PostPage>;

    /// Creates or updates a post.
    ///
    /// Returns the stored post when the backend echoes it back.
    fn submit_post(&self, target: &SubmitTarget, form: &PostForm) -> FeedResult<Option<RawPost>>;

    /// Deletes a post.
    fn delete_post(&self, id: &PostId) -> FeedResult<()>;

    /// Updates the viewer's status text.
    fn update_status(&self, update: &StatusUpdate) -> FeedResult<()>;
}

/// Source of push notifications about remote mutations.
pub trait NotificationSource: Send + Sync {
    /// Opens a subscription to the `posts` channel.
    fn subscribe(&self) -> FeedResult<Subscription>;
}

impl<T: FeedTransport + ?Sized> FeedTransport for Arc<T> {
    fn fetch_posts(&self, page: u32) -> FeedResult<PostPage> {
        (**self).fetch_posts(page)
    }

    fn submit_post(&self, target: &SubmitTarget, form: &PostForm) -> FeedResult<Option<RawPost>> {
        (**self).submit_post(target, form)
    }

    fn delete_post(&self, id: &PostId) -> FeedResult<()> {
        (**self).delete_post(id)
    }

    fn update_status(&self, update: &StatusUpdate) -> FeedResult<()> {
        (**self).update_status(update)
    }
}

impl<N: NotificationSource + ?Sized> NotificationSource for Arc<N> {
    fn subscribe(&self) -> FeedResult<Subscription> {
        (**self).subscribe()
    }
}

/// A request recorded by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `fetch_posts(page)`.
    Fetch(u32),
    /// `submit_post(target, form)`.
    Submit(SubmitTarget, PostForm),
    /// `delete_post(id)`.
    Delete(PostId),
    /// `update_status(text)`.
    Status(String),
    /// `subscribe()`.
    Subscribe,
}

/// A mock transport and notification source for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    pages: Mutex<HashMap<u32, FeedResult<PostPage>>>,
    submit_response: Mutex<Option<FeedResult<Option<RawPost>>>>,
    delete_response: Mutex<Option<FeedResult<()>>>,
    status_response: Mutex<Option<FeedResult<()>>>,
    calls: Mutex<Vec<MockCall>>,
    sinks: Mutex<Vec<EventSink>>,
    released: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the response for a page.
    pub fn set_page(&self, page: u32, response: FeedResult<PostPage>) {
        self.pages.lock().insert(page, response);
    }

    /// Sets the submit response.
    pub fn set_submit_response(&self, response: FeedResult<Option<RawPost>>) {
        *self.submit_response.lock() = Some(response);
    }

    /// Sets the delete response.
    pub fn set_delete_response(&self, response: FeedResult<()>) {
        *self.delete_response.lock() = Some(response);
    }

    /// Sets the status response.
    pub fn set_status_response(&self, response: FeedResult<()>) {
        *self.status_response.lock() = Some(response);
    }

    /// Delivers a notification to every live subscriber.
    pub fn emit(&self, event: PostEvent) {
        self.sinks.lock().retain(|sink| sink.send(event.clone()));
    }

    /// Returns every recorded request, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of subscriptions released so far.
    pub fn released_subscriptions(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().push(call);
    }

    fn canned<R: Clone>(slot: &Mutex<Option<FeedResult<R>>>, what: &str) -> FeedResult<R> {
        slot.lock()
            .clone()
            .unwrap_or_else(|| Err(FeedError::Protocol(format!("No mock {} response set", what))))
    }
}

impl FeedTransport for MockTransport {
    fn fetch_posts(&self, page: u32) -> FeedResult<PostPage> {
        self.record(MockCall::Fetch(page));
        self.pages
            .lock()
            .get(&page)
            .cloned()
            .unwrap_or_else(|| Err(FeedError::Protocol(format!("No mock page {} set", page))))
    }

    fn submit_post(&self, target: &SubmitTarget, form: &PostForm) -> FeedResult<Option<RawPost>> {
        self.record(MockCall::Submit(target.clone(), form.clone()));
        Self::canned(&self.submit_response, "submit")
    }

    fn delete_post(&self, id: &PostId) -> FeedResult<()> {
        self.record(MockCall::Delete(id.clone()));
        Self::canned(&self.delete_response, "delete")
    }

    fn update_status(&self, update: &StatusUpdate) -> FeedResult<()> {
        self.record(MockCall::Status(update.status.clone()));
        Self::canned(&self.status_response, "status")
    }
}

impl NotificationSource for MockTransport {
    fn subscribe(&self) -> FeedResult<Subscription> {
        self.record(MockCall::Subscribe);
        let (sink, subscription) = Subscription::channel();
        self.sinks.lock().push(sink);

        let released = Arc::clone(&self.released);
        Ok(subscription.on_release(move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_transport_records_calls() {
        let transport = MockTransport::new();
        transport.set_page(1, Ok(PostPage::default()));

        assert_eq!(transport.fetch_posts(1), Ok(PostPage::default()));
        assert!(transport.subscribe().is_ok());
        assert_eq!(transport.calls(), vec![MockCall::Fetch(1), MockCall::Subscribe]);
    }

    #[test]
    fn mock_transport_missing_response() {
        let transport = MockTransport::new();
        assert!(matches!(transport.fetch_posts(3), Err(FeedError::Protocol(_))));
        assert!(matches!(
            transport.delete_post(&PostId::new("1")),
            Err(FeedError::Protocol(_))
        ));
    }

    #[test]
    fn mock_transport_emits_to_live_subscribers() {
        let transport = MockTransport::new();
        let mut subscription = transport.subscribe().unwrap();

        transport.emit(PostEvent::delete(PostId::new("1")));
        assert!(subscription.try_next().unwrap().is_some());

        drop(subscription);
        assert_eq!(transport.released_subscriptions(), 1);
        transport.emit(PostEvent::delete(PostId::new("2")));
        assert!(transport.sinks.lock().is_empty());
    }

    #[test]
    fn shared_mock_through_arc() {
        let transport = Arc::new(MockTransport::new());
        transport.set_status_response(Ok(()));

        let update = StatusUpdate {
            status: "away".into(),
        };
        assert!(FeedTransport::update_status(&transport, &update).is_ok());
        assert_eq!(transport.calls(), vec![MockCall::Status("away".into())]);
    }
}

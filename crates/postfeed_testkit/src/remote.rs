//! In-memory post backend.
//!
//! `RemoteFeed` plays the role of the real server: it holds the whole
//! collection newest first, serves fixed-size pages, applies mutations and
//! pushes a notification for every change to each live subscriber.

use chrono::Utc;
use parking_lot::RwLock;
use postfeed_engine::{
    EventSink, FeedError, FeedResult, FeedTransport, NotificationSource, Subscription,
};
use postfeed_protocol::{
    AuthorRef, CreatorRef, ImageField, PostEvent, PostForm, PostId, PostPage, RawPost,
    StatusUpdate, SubmitTarget,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Author name given to posts created through the transport.
pub const LOCAL_AUTHOR: &str = "Local";

/// Author name given to posts created with [`RemoteFeed::remote_create`].
pub const REMOTE_AUTHOR: &str = "Remote";

#[derive(Debug)]
struct RemoteState {
    posts: Vec<RawPost>,
    page_size: u32,
    sinks: Vec<EventSink>,
    echo_mutations: bool,
    fetch_failure: Option<FeedError>,
    mutation_failure: Option<FeedError>,
    status: Option<String>,
    fetches: usize,
}

/// Shared in-memory backend.
///
/// Cloning yields another handle to the same collection, so one value can
/// serve as both the transport and the notification source of a session.
#[derive(Debug, Clone)]
pub struct RemoteFeed {
    state: Arc<RwLock<RemoteState>>,
    released: Arc<AtomicUsize>,
}

impl RemoteFeed {
    /// Creates an empty backend serving pages of `page_size` posts.
    pub fn new(page_size: u32) -> Self {
        Self {
            state: Arc::new(RwLock::new(RemoteState {
                posts: Vec::new(),
                page_size: page_size.max(1),
                sinks: Vec::new(),
                echo_mutations: true,
                fetch_failure: None,
                mutation_failure: None,
                status: None,
                fetches: 0,
            })),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds a post as the newest one without notifying anybody.
    pub fn seed(&self, post: RawPost) {
        self.state.write().posts.insert(0, post);
    }

    /// Simulates another user creating a post.
    pub fn remote_create(&self, title: &str, content: &str) -> RawPost {
        self.remote_create_with_id(PostId::new(Uuid::new_v4().to_string()), title, content)
    }

    /// Simulates another user creating a post with a known ID.
    pub fn remote_create_with_id(&self, id: PostId, title: &str, content: &str) -> RawPost {
        let post = new_post(id, title, content, None, REMOTE_AUTHOR);
        let mut state = self.state.write();
        state.posts.insert(0, post.clone());
        broadcast(&mut state, PostEvent::create(post.clone()));
        post
    }

    /// Simulates another user editing a post. Returns `None` if it does not exist.
    pub fn remote_update(&self, id: &PostId, title: &str, content: &str) -> Option<RawPost> {
        let mut state = self.state.write();
        let post = state.posts.iter_mut().find(|p| &p.id == id)?;
        post.title = title.to_string();
        post.content = content.to_string();
        let post = post.clone();
        broadcast(&mut state, PostEvent::update(post.clone()));
        Some(post)
    }

    /// Simulates another user deleting a post. Returns false if it does not exist.
    pub fn remote_delete(&self, id: &PostId) -> bool {
        let mut state = self.state.write();
        let before = state.posts.len();
        state.posts.retain(|p| &p.id != id);
        if state.posts.len() == before {
            return false;
        }
        broadcast(&mut state, PostEvent::delete(id.clone()));
        true
    }

    /// Delivers a notification without changing the collection.
    pub fn emit_raw(&self, event: PostEvent) {
        broadcast(&mut self.state.write(), event);
    }

    /// Controls whether mutations made through the transport are notified.
    pub fn set_echo_mutations(&self, echo: bool) {
        self.state.write().echo_mutations = echo;
    }

    /// Makes every fetch fail with `error` until cleared with `None`.
    pub fn fail_fetches(&self, error: Option<FeedError>) {
        self.state.write().fetch_failure = error;
    }

    /// Makes every submit, delete and status update fail until cleared.
    pub fn fail_mutations(&self, error: Option<FeedError>) {
        self.state.write().mutation_failure = error;
    }

    /// Returns a page as the backend would serve it.
    pub fn page(&self, page: u32) -> PostPage {
        let state = self.state.read();
        page_of(&state, page)
    }

    /// Returns the whole collection, newest first.
    pub fn posts(&self) -> Vec<RawPost> {
        self.state.read().posts.clone()
    }

    /// Returns a post by ID.
    pub fn get(&self, id: &PostId) -> Option<RawPost> {
        self.state.read().posts.iter().find(|p| &p.id == id).cloned()
    }

    /// Returns the size of the collection.
    pub fn total(&self) -> u64 {
        self.state.read().posts.len() as u64
    }

    /// Returns the page size.
    pub fn page_size(&self) -> u32 {
        self.state.read().page_size
    }

    /// Returns the last status text received.
    pub fn status(&self) -> Option<String> {
        self.state.read().status.clone()
    }

    /// Returns the number of fetches served or refused.
    pub fn fetch_count(&self) -> usize {
        self.state.read().fetches
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state.write();
        state.sinks.retain(|sink| !sink.is_closed());
        state.sinks.len()
    }

    /// Returns the number of subscriptions released so far.
    pub fn released_subscriptions(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn check_mutation(&self) -> FeedResult<()> {
        match &self.state.read().mutation_failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl FeedTransport for RemoteFeed {
    fn fetch_posts(&self, page: u32) -> FeedResult<PostPage> {
        let mut state = self.state.write();
        state.fetches += 1;
        if let Some(err) = &state.fetch_failure {
            return Err(err.clone());
        }
        Ok(page_of(&state, page))
    }

    fn submit_post(&self, target: &SubmitTarget, form: &PostForm) -> FeedResult<Option<RawPost>> {
        self.check_mutation()?;
        let image = image_reference(&form.image);
        let mut state = self.state.write();

        let (post, event) = match target {
            SubmitTarget::Create => {
                let id = PostId::new(Uuid::new_v4().to_string());
                let post = new_post(id, &form.title, &form.content, image, LOCAL_AUTHOR);
                state.posts.insert(0, post.clone());
                (post.clone(), PostEvent::create(post))
            }
            SubmitTarget::Update(id) => {
                let post = state
                    .posts
                    .iter_mut()
                    .find(|p| &p.id == id)
                    .ok_or_else(|| FeedError::status(404, "Could not find post."))?;
                post.title = form.title.clone();
                post.content = form.content.clone();
                post.image_url = image;
                (post.clone(), PostEvent::update(post.clone()))
            }
        };

        debug!(id = %post.id, "remote applied submission");
        if state.echo_mutations {
            broadcast(&mut state, event);
        }
        Ok(Some(post))
    }

    fn delete_post(&self, id: &PostId) -> FeedResult<()> {
        self.check_mutation()?;
        let mut state = self.state.write();
        let before = state.posts.len();
        state.posts.retain(|p| &p.id != id);
        if state.posts.len() == before {
            return Err(FeedError::status(404, "Could not find post."));
        }

        debug!(%id, "remote deleted post");
        if state.echo_mutations {
            broadcast(&mut state, PostEvent::delete(id.clone()));
        }
        Ok(())
    }

    fn update_status(&self, update: &StatusUpdate) -> FeedResult<()> {
        self.check_mutation()?;
        self.state.write().status = Some(update.status.clone());
        Ok(())
    }
}

impl NotificationSource for RemoteFeed {
    fn subscribe(&self) -> FeedResult<Subscription> {
        let (sink, subscription) = Subscription::channel();
        self.state.write().sinks.push(sink);

        let released = Arc::clone(&self.released);
        Ok(subscription.on_release(move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// Builds a post as the backend would store it.
pub fn new_post(
    id: PostId,
    title: &str,
    content: &str,
    image_url: Option<String>,
    author: &str,
) -> RawPost {
    RawPost {
        creator: Some(CreatorRef::Id(format!("user-{}", author.to_lowercase()))),
        id,
        title: title.to_string(),
        content: content.to_string(),
        image_url,
        created_at: Utc::now(),
        user: Some(AuthorRef {
            name: Some(author.to_string()),
        }),
    }
}

fn image_reference(field: &ImageField) -> Option<String> {
    match field {
        ImageField::Upload(upload) => Some(format!("images/{}", upload.file_name)),
        ImageField::Reference(reference) if reference.is_empty() => None,
        ImageField::Reference(reference) => Some(reference.clone()),
    }
}

fn page_of(state: &RemoteState, page: u32) -> PostPage {
    let size = state.page_size as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(size);
    let posts = state.posts.iter().skip(start).take(size).cloned().collect();
    PostPage::new(posts, state.posts.len() as u64)
}

fn broadcast(state: &mut RemoteState, event: PostEvent) {
    state.sinks.retain(|sink| sink.send(event.clone()));
}

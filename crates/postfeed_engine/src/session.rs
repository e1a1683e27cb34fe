//! The synchronization facade.

use crate::config::FeedConfig;
use crate::cursor::{Direction, PageCursor, PageTicket};
use crate::editor::{EditController, EditOutcome, EditState, PostDraft, PostSubmission};
use crate::error::{FeedError, FeedResult};
use crate::reconciler::{reconcile, Reconciliation};
use crate::record::{ImageResolver, PostRecord};
use crate::store::PostStore;
use crate::subscription::Subscription;
use crate::transport::{FeedTransport, NotificationSource};
use postfeed_protocol::{PostEvent, PostId, PostPage, RawPost, StatusUpdate};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Result of a page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The store now holds this page.
    Loaded {
        /// Page that was loaded.
        page: u32,
        /// Number of posts on it.
        count: usize,
    },
    /// A newer request was issued; this response was dropped.
    Superseded,
    /// The latest request failed; the page error is set.
    Failed(FeedError),
}

impl LoadOutcome {
    /// Returns true if the store was replaced.
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The post was deleted and the current page reloaded.
    Reloaded(LoadOutcome),
    /// The delete failed; the store is untouched.
    Failed(FeedError),
}

/// Statistics about a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Page loads applied to the store.
    pub pages_loaded: u64,
    /// Notifications that changed the store.
    pub events_applied: u64,
    /// Notifications that left the store unchanged.
    pub events_ignored: u64,
    /// Reloads triggered by deletions.
    pub reloads_triggered: u64,
    /// Create / update submissions sent.
    pub submissions: u64,
    /// Failed requests of any kind.
    pub failures: u64,
}

/// Single entry point for a feed view.
///
/// Owns the post store, the page cursor, the edit controller and the
/// notification subscription. Navigation, notifications and local edits
/// all go through here; nothing else mutates the store or the cursor.
///
/// Network failures are recorded, not returned: a failed page load sets
/// [`page_error`](Self::page_error), a failed mutation sets
/// [`notice`](Self::notice). Only caller mistakes (out-of-range navigation,
/// invalid edit transitions, unknown post IDs) come back as `Err`.
pub struct FeedSession<T: FeedTransport, N: NotificationSource> {
    config: FeedConfig,
    transport: T,
    notifications: N,
    resolver: ImageResolver,
    store: PostStore,
    cursor: PageCursor,
    editor: EditController,
    subscription: Option<Subscription>,
    // Set once a subscription has been opened; never cleared.
    subscribed_once: bool,
    posts_loading: bool,
    page_error: Option<FeedError>,
    notice: Option<FeedError>,
    stats: FeedStats,
}

impl<T: FeedTransport, N: NotificationSource> FeedSession<T, N> {
    /// Creates a session. Nothing is fetched until [`load_initial`](Self::load_initial).
    pub fn new(config: FeedConfig, transport: T, notifications: N) -> FeedResult<Self> {
        let resolver = ImageResolver::new(config.base_directory()?);
        let cursor = PageCursor::new(config.page_size);

        Ok(Self {
            config,
            transport,
            notifications,
            resolver,
            store: PostStore::new(),
            cursor,
            editor: EditController::new(),
            subscription: None,
            subscribed_once: false,
            posts_loading: true,
            page_error: None,
            notice: None,
            stats: FeedStats::default(),
        })
    }

    /// Loads page 1 and, the first time it succeeds, subscribes to notifications.
    ///
    /// A session subscribes at most once. After [`close`](Self::close) or a
    /// lost notification source, later loads only fetch.
    pub fn load_initial(&mut self) -> LoadOutcome {
        let ticket = self.cursor.restart();
        self.posts_loading = true;
        debug!(generation = ticket.generation, "initial load");

        let result = self.transport.fetch_posts(ticket.page);
        let outcome = self.complete_page_load(ticket, result);

        if outcome.is_loaded() && !self.subscribed_once {
            match self.notifications.subscribe() {
                Ok(subscription) => {
                    info!("subscribed to post notifications");
                    self.subscription = Some(subscription);
                    self.subscribed_once = true;
                }
                Err(err) => {
                    warn!(error = %err, "notification subscription failed");
                    self.stats.failures += 1;
                    self.notice = Some(err);
                }
            }
        }
        outcome
    }

    /// Navigates and replaces the store with the fetched page.
    pub fn load_page(&mut self, direction: Direction) -> FeedResult<LoadOutcome> {
        let ticket = self.begin_page_load(direction)?;
        let result = self.transport.fetch_posts(ticket.page);
        Ok(self.complete_page_load(ticket, result))
    }

    /// Fetches the current page again.
    pub fn reload(&mut self) -> LoadOutcome {
        match self.load_page(Direction::Current) {
            Ok(outcome) => outcome,
            Err(err) => LoadOutcome::Failed(err),
        }
    }

    /// Issues a page request without fetching it.
    ///
    /// Pair with [`complete_page_load`](Self::complete_page_load) when the
    /// fetch runs elsewhere. Issuing a request supersedes all earlier ones.
    pub fn begin_page_load(&mut self, direction: Direction) -> FeedResult<PageTicket> {
        let ticket = self.cursor.begin(direction, self.store.total_count())?;
        self.posts_loading = true;
        debug!(%direction, page = ticket.page, generation = ticket.generation, "page load issued");
        Ok(ticket)
    }

    /// Applies the response to a page request, unless it was superseded.
    pub fn complete_page_load(
        &mut self,
        ticket: PageTicket,
        result: FeedResult<PostPage>,
    ) -> LoadOutcome {
        match result {
            Ok(page) => {
                if !self.cursor.complete(&ticket) {
                    debug!(page = ticket.page, generation = ticket.generation, "dropping superseded page");
                    return LoadOutcome::Superseded;
                }
                let records: Vec<PostRecord> = page
                    .posts
                    .into_iter()
                    .map(|raw| PostRecord::from_raw(raw, &self.resolver))
                    .collect();
                let count = records.len();
                self.store.replace_all(records, page.total_items);
                self.posts_loading = false;
                self.page_error = None;
                self.stats.pages_loaded += 1;
                debug!(page = ticket.page, count, total = page.total_items, "page loaded");
                LoadOutcome::Loaded {
                    page: ticket.page,
                    count,
                }
            }
            Err(err) => {
                if !self.cursor.fail(&ticket) {
                    debug!(page = ticket.page, generation = ticket.generation, "dropping superseded failure");
                    return LoadOutcome::Superseded;
                }
                warn!(page = ticket.page, error = %err, "page load failed");
                self.posts_loading = false;
                self.stats.failures += 1;
                self.page_error = Some(err.clone());
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Applies one notification.
    ///
    /// Deletions reload the current page before returning.
    pub fn handle_event(&mut self, event: PostEvent) -> Reconciliation {
        let outcome = reconcile(&mut self.store, event, &self.resolver);
        if outcome.changed_store() {
            self.stats.events_applied += 1;
        } else if !outcome.requires_reload() {
            self.stats.events_ignored += 1;
        }

        if outcome.requires_reload() {
            self.stats.reloads_triggered += 1;
            debug!(page = self.cursor.current_page(), "deletion notified, reloading page");
            self.reload();
        }
        outcome
    }

    /// Applies every notification queued so far. Returns how many were handled.
    pub fn poll_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = match self.subscription.as_mut() {
                Some(subscription) => subscription.try_next(),
                None => break,
            };
            match next {
                Ok(Some(event)) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "notification source went away");
                    self.subscription = None;
                    break;
                }
            }
        }
        handled
    }

    /// Waits for the next notification and applies it.
    ///
    /// Returns `None` when there is no subscription or the source has closed.
    pub async fn next_event(&mut self) -> Option<Reconciliation> {
        let event = self.subscription.as_mut()?.next().await;
        match event {
            Some(event) => Some(self.handle_event(event)),
            None => {
                warn!("notification source went away");
                self.subscription = None;
                None
            }
        }
    }

    /// Opens the edit form for a new post.
    pub fn start_create(&mut self) -> FeedResult<()> {
        self.editor.start_create()
    }

    /// Opens the edit form for a loaded post.
    pub fn start_edit(&mut self, id: &PostId) -> FeedResult<()> {
        let record = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| FeedError::PostNotFound(id.clone()))?;
        self.editor.start_edit(record)
    }

    /// Closes the edit form without sending anything.
    pub fn cancel_edit(&mut self) -> FeedResult<()> {
        self.editor.cancel()
    }

    /// Sends the draft and settles the edit session.
    ///
    /// The store is not patched; the echoed notification does that.
    pub fn submit_edit(&mut self, draft: PostDraft) -> FeedResult<EditOutcome> {
        let submission = self.begin_submit(draft)?;
        let result = self
            .transport
            .submit_post(&submission.target, &submission.form);
        self.complete_submit(result)
    }

    /// Shapes the submission and marks the edit as loading.
    pub fn begin_submit(&mut self, draft: PostDraft) -> FeedResult<PostSubmission> {
        let submission = self.editor.begin_submit(draft)?;
        self.stats.submissions += 1;
        debug!(submit_target = ?submission.target, "submitting post");
        Ok(submission)
    }

    /// Settles the in-flight submission.
    pub fn complete_submit(
        &mut self,
        result: FeedResult<Option<RawPost>>,
    ) -> FeedResult<EditOutcome> {
        let outcome = self.editor.complete(result)?;
        match &outcome {
            EditOutcome::Saved(Some(post)) => debug!(id = %post.id, "post saved"),
            EditOutcome::Saved(None) => debug!("post saved without echo"),
            EditOutcome::Failed(err) => {
                warn!(error = %err, "post submission failed");
                self.stats.failures += 1;
                self.notice = Some(err.clone());
            }
        }
        Ok(outcome)
    }

    /// Deletes a post and reloads the current page.
    pub fn delete_post(&mut self, id: &PostId) -> DeleteOutcome {
        self.posts_loading = true;
        debug!(%id, "deleting post");

        match self.transport.delete_post(id) {
            Ok(()) => DeleteOutcome::Reloaded(self.reload()),
            Err(err) => {
                warn!(%id, error = %err, "delete failed");
                self.posts_loading = self.cursor.is_loading();
                self.stats.failures += 1;
                self.notice = Some(err.clone());
                DeleteOutcome::Failed(err)
            }
        }
    }

    /// Updates the viewer's status text. Returns false if the update failed.
    pub fn update_status(&mut self, status: impl Into<String>) -> bool {
        let update = StatusUpdate {
            status: status.into(),
        };
        match self.transport.update_status(&update) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "status update failed");
                self.stats.failures += 1;
                self.notice = Some(err);
                false
            }
        }
    }

    /// Clears the page error and the mutation notice.
    pub fn dismiss_error(&mut self) {
        self.page_error = None;
        self.notice = None;
    }

    /// Releases the notification subscription.
    pub fn close(&mut self) {
        if self.subscription.take().is_some() {
            info!("released post notifications");
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Returns the loaded posts in display order.
    pub fn posts(&self) -> &[PostRecord] {
        self.store.records()
    }

    /// Returns the posts to render, or `None` while loading or on a page error.
    pub fn visible_posts(&self) -> Option<&[PostRecord]> {
        if self.posts_loading || self.page_error.is_some() {
            None
        } else {
            Some(self.store.records())
        }
    }

    /// Returns the current page.
    pub fn current_page(&self) -> u32 {
        self.cursor.current_page()
    }

    /// Returns the last page of the remote collection.
    pub fn last_page(&self) -> u32 {
        self.cursor.last_page(self.store.total_count())
    }

    /// Returns the last known size of the remote collection.
    pub fn total_count(&self) -> u64 {
        self.store.total_count()
    }

    /// Returns the page cursor.
    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    /// Returns true while the page list is loading.
    pub fn is_loading(&self) -> bool {
        self.posts_loading
    }

    /// Returns the edit session state.
    pub fn edit_state(&self) -> &EditState {
        self.editor.state()
    }

    /// Returns true while a submission is in flight.
    pub fn is_edit_loading(&self) -> bool {
        self.editor.is_loading()
    }

    /// Returns the full-page error, if any.
    pub fn page_error(&self) -> Option<&FeedError> {
        self.page_error.as_ref()
    }

    /// Returns the mutation error shown alongside the list, if any.
    pub fn notice(&self) -> Option<&FeedError> {
        self.notice.as_ref()
    }

    /// Returns true while subscribed to notifications.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Returns session statistics.
    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }
}

//! # Postfeed Engine
//!
//! Client-side view of a paginated, mutable collection of posts.
//!
//! This crate provides:
//! - An ordered, keyed post store for the currently loaded page
//! - A page cursor with superseding request tickets
//! - A reconciler for create / update / delete notifications
//! - An optimistic edit controller (create, edit, rollback on failure)
//! - `FeedSession`, the facade that owns all of the above
//! - Transport abstractions (HTTP and notification source)
//!
//! ## Architecture
//!
//! Two channels mutate the view: navigation requests issued by the viewer
//! and push notifications from other actors. Both flow through
//! `FeedSession`, which is the only mutator of the store and the cursor.
//!
//! ## Key Invariants
//!
//! - Post IDs are unique within the store
//! - Creations are idempotent under duplicate delivery
//! - Updates for posts outside the loaded page are ignored
//! - Deletions reload the current page instead of removing locally
//! - Only the latest page request may replace the store
//! - Failed mutations never corrupt the store

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cursor;
mod editor;
mod error;
mod http;
mod reconciler;
mod record;
mod session;
mod store;
mod subscription;
mod transport;

pub use config::{FeedConfig, DEFAULT_PAGE_SIZE};
pub use cursor::{Direction, PageCursor, PageTicket};
pub use editor::{EditController, EditOutcome, EditState, PostDraft, PostSubmission};
pub use error::{FeedError, FeedResult};
pub use http::{HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use reconciler::{reconcile, Reconciliation};
pub use record::{ImageResolver, PostRecord, UNKNOWN_AUTHOR};
pub use session::{DeleteOutcome, FeedSession, FeedStats, LoadOutcome};
pub use store::PostStore;
pub use subscription::{EventSink, Subscription};
pub use transport::{FeedTransport, MockCall, MockTransport, NotificationSource};

pub use postfeed_protocol as protocol;

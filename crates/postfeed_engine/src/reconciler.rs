//! Applies remote notifications to the store.

use crate::record::{ImageResolver, PostRecord};
use crate::store::PostStore;
use postfeed_protocol::{EventAction, EventPayload, PostEvent, PostId};
use tracing::debug;

/// What a notification did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A created post was inserted at the front.
    Inserted(PostId),
    /// A created post was already present.
    Duplicate(PostId),
    /// An updated post was replaced in place.
    Replaced(PostId),
    /// An updated post is not on the loaded page.
    NotOnPage(PostId),
    /// A deletion; the current page must be fetched again.
    ReloadRequired(Option<PostId>),
    /// The notification was not applicable.
    Ignored,
}

impl Reconciliation {
    /// Returns true if the store content changed.
    pub fn changed_store(&self) -> bool {
        matches!(self, Reconciliation::Inserted(_) | Reconciliation::Replaced(_))
    }

    /// Returns true if the caller must reload the current page.
    pub fn requires_reload(&self) -> bool {
        matches!(self, Reconciliation::ReloadRequired(_))
    }
}

/// Translates one notification into a store mutation.
///
/// Deletions never touch the store: removing one post shifts the page
/// membership of every later post, so only a fetch yields a correct page.
pub fn reconcile(store: &mut PostStore, event: PostEvent, resolver: &ImageResolver) -> Reconciliation {
    let PostEvent { action, post } = event;

    let outcome = match (action, post) {
        (EventAction::Create, Some(EventPayload::Post(raw))) => {
            let record = PostRecord::from_raw(*raw, resolver);
            let id = record.id.clone();
            if store.insert_front(record) {
                Reconciliation::Inserted(id)
            } else {
                Reconciliation::Duplicate(id)
            }
        }
        (EventAction::Update, Some(EventPayload::Post(raw))) => {
            let record = PostRecord::from_raw(*raw, resolver);
            let id = record.id.clone();
            if store.replace_by_id(record) {
                Reconciliation::Replaced(id)
            } else {
                Reconciliation::NotOnPage(id)
            }
        }
        (EventAction::Delete, payload) => {
            let id = payload.map(|p| match p {
                EventPayload::Post(raw) => raw.id,
                EventPayload::Id(id) => id,
            });
            Reconciliation::ReloadRequired(id)
        }
        (action, _) => {
            debug!(?action, "ignoring inapplicable notification");
            Reconciliation::Ignored
        }
    };

    debug!(?outcome, "reconciled notification");
    outcome
}

//! Push notifications describing remote mutations.

use crate::error::ProtocolResult;
use crate::post::{PostId, RawPost};
use serde::{Deserialize, Serialize};

/// Kind of remote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    /// A post was created.
    Create,
    /// A post was updated.
    Update,
    /// A post was deleted.
    Delete,
    /// Any action this client does not understand.
    #[serde(other)]
    Unknown,
}

/// What a notification carries about the affected post.
///
/// Deletions are usually announced with the bare ID only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// The full post.
    Post(Box<RawPost>),
    /// Only the post ID.
    Id(PostId),
}

/// A single notification from the `posts` channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostEvent {
    /// What happened.
    pub action: EventAction,
    /// The affected post.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<EventPayload>,
}

impl PostEvent {
    /// Creates a create notification.
    pub fn create(post: RawPost) -> Self {
        Self {
            action: EventAction::Create,
            post: Some(EventPayload::Post(Box::new(post))),
        }
    }

    /// Creates an update notification.
    pub fn update(post: RawPost) -> Self {
        Self {
            action: EventAction::Update,
            post: Some(EventPayload::Post(Box::new(post))),
        }
    }

    /// Creates a delete notification carrying only the ID.
    pub fn delete(id: PostId) -> Self {
        Self {
            action: EventAction::Delete,
            post: Some(EventPayload::Id(id)),
        }
    }

    /// Returns the full post, if the notification carries one.
    pub fn post(&self) -> Option<&RawPost> {
        match &self.post {
            Some(EventPayload::Post(post)) => Some(post),
            _ => None,
        }
    }

    /// Returns the affected post ID, whichever form the payload takes.
    pub fn post_id(&self) -> Option<&PostId> {
        match &self.post {
            Some(EventPayload::Post(post)) => Some(&post.id),
            Some(EventPayload::Id(id)) => Some(id),
            None => None,
        }
    }

    /// Decodes a notification from JSON.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encodes the notification to JSON.
    pub fn to_json(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_create_with_full_post() {
        let body = br#"{
            "action": "create",
            "post": {"_id": "9", "title": "t", "content": "c", "createdAt": "2024-02-01T08:30:00Z",
                     "user": {"name": "Ana"}}
        }"#;
        let event = PostEvent::from_json(body).unwrap();

        assert_eq!(event.action, EventAction::Create);
        assert_eq!(event.post().map(|p| p.title.as_str()), Some("t"));
        assert_eq!(event.post_id(), Some(&PostId::new("9")));
    }

    #[test]
    fn decodes_delete_with_bare_id() {
        let event = PostEvent::from_json(br#"{"action": "delete", "post": "65a1"}"#).unwrap();

        assert_eq!(event.action, EventAction::Delete);
        assert!(event.post().is_none());
        assert_eq!(event.post_id(), Some(&PostId::new("65a1")));
    }

    #[test]
    fn unknown_action_still_decodes() {
        let event = PostEvent::from_json(br#"{"action": "archive", "post": "1"}"#).unwrap();
        assert_eq!(event.action, EventAction::Unknown);
    }

    #[test]
    fn delete_survives_encoding() {
        let event = PostEvent::delete(PostId::new("4"));
        let bytes = event.to_json().unwrap();
        assert_eq!(PostEvent::from_json(&bytes).unwrap(), event);
    }
}

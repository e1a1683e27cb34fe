//! Posts as the backend sends them.

use crate::error::ProtocolResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of a post.
///
/// Stable across updates. The backend may send it as a string or a number;
/// both decode to the same textual form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Creates a post ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the textual form of the ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(text) => PostId(text),
            Repr::Number(n) => PostId(n.to_string()),
        })
    }
}

impl From<&str> for PostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PostId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Embedded reference to the post's author.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Display name, if the backend populated it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Reference to the user that created the post.
///
/// Either a bare identifier or a populated user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatorRef {
    /// Bare user identifier.
    Id(String),
    /// Populated user object.
    User {
        /// User identifier.
        #[serde(alias = "_id")]
        id: String,
    },
}

impl CreatorRef {
    /// Returns the creator's identifier.
    pub fn id(&self) -> &str {
        match self {
            CreatorRef::Id(id) => id,
            CreatorRef::User { id } => id,
        }
    }
}

/// A post exactly as the backend serializes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPost {
    /// Post ID.
    #[serde(alias = "_id")]
    pub id: PostId,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Image reference, possibly relative to the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Embedded author reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthorRef>,
    /// Originating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<CreatorRef>,
}

impl RawPost {
    /// Returns the author's display name, if one is embedded.
    pub fn author_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|user| user.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Returns the creator's identifier, if present.
    pub fn creator_id(&self) -> Option<&str> {
        self.creator.as_ref().map(CreatorRef::id)
    }

    /// Decodes a single post from JSON.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// One page of the remote collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    /// Posts on this page, in display order.
    pub posts: Vec<RawPost>,
    /// Total number of posts in the whole collection.
    pub total_items: u64,
}

impl PostPage {
    /// Creates a page.
    pub fn new(posts: Vec<RawPost>, total_items: u64) -> Self {
        Self { posts, total_items }
    }

    /// Decodes a page from a JSON response body.
    pub fn from_json(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

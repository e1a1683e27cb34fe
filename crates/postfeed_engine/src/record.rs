//! Post records as the store holds them.

use crate::config::as_directory;
use crate::error::{FeedError, FeedResult};
use chrono::{DateTime, Utc};
use postfeed_protocol::{PostId, RawPost};
use serde::Serialize;
use url::Url;

/// Author name used when a post carries no usable author reference.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Resolves image references to fully-qualified URLs.
///
/// Every record passes through the same resolver, whether it came from a
/// page fetch, a notification or an edit response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResolver {
    base: Url,
}

impl ImageResolver {
    /// Creates a resolver rooted at `base`.
    ///
    /// References are resolved relative to the base path, so the path is
    /// treated as a directory even without a trailing slash.
    pub fn new(base: Url) -> Self {
        Self {
            base: as_directory(base),
        }
    }

    /// Creates a resolver from a textual base URL.
    pub fn parse(base: &str) -> FeedResult<Self> {
        let base = Url::parse(base)
            .map_err(|e| FeedError::InvalidConfig(format!("base url {:?}: {}", base, e)))?;
        Ok(Self::new(base))
    }

    /// Returns the base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves a reference.
    ///
    /// Empty references mean "no image". Absolute `http`/`https` URLs are
    /// kept as they are. Anything else is a path relative to the base; a
    /// Windows drive prefix is dropped.
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Ok(absolute) = Url::parse(reference) {
            if matches!(absolute.scheme(), "http" | "https") {
                return Some(absolute);
            }
        }
        // Backends running on Windows hand out `images\name.png`.
        let relative = reference.replace('\\', "/");
        let relative = strip_drive(&relative).trim_start_matches('/');
        self.base.join(&format!("./{}", relative)).ok()
    }
}

/// Drops a leading `C:` drive prefix.
fn strip_drive(path: &str) -> &str {
    let bytes = path.as_bytes();
    let has_drive = bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || bytes[2] == b'/');
    if has_drive {
        &path[2..]
    } else {
        path
    }
}

/// A post held by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    /// Post ID, unique within the store.
    pub id: PostId,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Image reference as the backend knows it.
    pub image_ref: Option<String>,
    /// Resolved display URL of the image.
    pub image_url: Option<Url>,
    /// Author display name, never empty.
    pub author_name: String,
    /// Originating user.
    pub creator_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl PostRecord {
    /// Derives a record from a backend post.
    pub fn from_raw(raw: RawPost, resolver: &ImageResolver) -> Self {
        let author_name = raw.author_name().unwrap_or(UNKNOWN_AUTHOR).to_string();
        let creator_id = raw.creator_id().map(str::to_string);
        let image_ref = raw.image_url.filter(|r| !r.trim().is_empty());
        let image_url = image_ref.as_deref().and_then(|r| resolver.resolve(r));

        Self {
            id: raw.id,
            title: raw.title,
            content: raw.content,
            image_ref,
            image_url,
            author_name,
            creator_id,
            created_at: raw.created_at,
        }
    }

    /// Returns the value sent in the `image` field when the image is kept.
    pub fn image_fallback(&self) -> String {
        self.image_ref.clone().unwrap_or_default()
    }
}

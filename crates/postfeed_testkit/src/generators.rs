//! Property-based test generators using proptest.
//!
//! IDs are drawn from a small pool so that generated event streams hit
//! duplicates, known posts and unknown posts alike.

use chrono::{DateTime, TimeZone, Utc};
use postfeed_protocol::{AuthorRef, CreatorRef, PostEvent, PostId, RawPost};
use proptest::prelude::*;

/// Strategy for post IDs from a pool of twelve.
pub fn post_id_strategy() -> impl Strategy<Value = PostId> {
    (0u8..12).prop_map(|n| PostId::new(format!("p{}", n)))
}

/// Strategy for image references as a backend might send them.
pub fn image_ref_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-z]{1,8}".prop_map(|name| Some(format!("images/{}.png", name))),
        "[a-z]{1,8}".prop_map(|name| Some(format!("/images/{}.jpg", name))),
        "[a-z]{1,8}".prop_map(|name| Some(format!("https://cdn.example.com/{}.png", name))),
    ]
}

/// Strategy for author references, including missing and empty names.
pub fn author_strategy() -> impl Strategy<Value = Option<AuthorRef>> {
    prop_oneof![
        Just(None),
        Just(Some(AuthorRef { name: None })),
        Just(Some(AuthorRef {
            name: Some(String::new())
        })),
        "[A-Z][a-z]{2,8}".prop_map(|name| Some(AuthorRef { name: Some(name) })),
    ]
}

/// Strategy for creation timestamps in 2024.
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..31_536_000).prop_map(|offset| {
        Utc.timestamp_opt(1_704_067_200 + offset, 0)
            .single()
            .unwrap_or_default()
    })
}

/// Strategy for backend posts.
pub fn raw_post_strategy() -> impl Strategy<Value = RawPost> {
    (
        post_id_strategy(),
        "[a-zA-Z ]{0,24}",
        "[a-zA-Z .]{0,64}",
        image_ref_strategy(),
        timestamp_strategy(),
        author_strategy(),
        prop::option::of("[a-f0-9]{8}"),
    )
        .prop_map(|(id, title, content, image_url, created_at, user, creator)| RawPost {
            id,
            title,
            content,
            image_url,
            created_at,
            user,
            creator: creator.map(CreatorRef::Id),
        })
}

/// Strategy for notifications of every kind.
pub fn post_event_strategy() -> impl Strategy<Value = PostEvent> {
    prop_oneof![
        3 => raw_post_strategy().prop_map(PostEvent::create),
        3 => raw_post_strategy().prop_map(PostEvent::update),
        1 => post_id_strategy().prop_map(PostEvent::delete),
    ]
}

/// Strategy for notifications that never require a reload.
pub fn upsert_event_strategy() -> impl Strategy<Value = PostEvent> {
    prop_oneof![
        raw_post_strategy().prop_map(PostEvent::create),
        raw_post_strategy().prop_map(PostEvent::update),
    ]
}

/// Strategy for a page of posts with distinct IDs.
pub fn distinct_posts_strategy(max: usize) -> impl Strategy<Value = Vec<RawPost>> {
    prop::collection::vec(raw_post_strategy(), 0..=max).prop_map(|mut posts| {
        let mut seen = std::collections::HashSet::new();
        posts.retain(|p| seen.insert(p.id.clone()));
        posts
    })
}

//! Test fixtures and session helpers.

use crate::remote::{new_post, RemoteFeed};
use postfeed_engine::{FeedConfig, FeedSession};
use postfeed_protocol::{AuthorRef, PostId, PostPage, RawPost};

/// Base URL used by fixture sessions.
pub const FIXTURE_BASE_URL: &str = "https://feed.example.com";

/// A session wired to a [`RemoteFeed`] for both requests and notifications.
pub type RemoteSession = FeedSession<RemoteFeed, RemoteFeed>;

/// Builds a post with a fixed creation time.
pub fn sample_post(id: &str, title: &str) -> RawPost {
    RawPost {
        id: PostId::new(id),
        title: title.to_string(),
        content: format!("content of {}", title),
        image_url: Some(format!("images/{}.png", id)),
        created_at: "2024-01-12T10:00:00Z".parse().expect("valid timestamp"),
        user: Some(AuthorRef {
            name: Some("Fixture".into()),
        }),
        creator: None,
    }
}

/// Builds a page of sample posts.
pub fn sample_page(ids: &[&str], total_items: u64) -> PostPage {
    let posts = ids.iter().map(|id| sample_post(id, &format!("post {}", id))).collect();
    PostPage::new(posts, total_items)
}

/// Returns the configuration used by fixture sessions.
pub fn feed_config(page_size: u32) -> FeedConfig {
    FeedConfig::new(FIXTURE_BASE_URL).with_page_size(page_size)
}

/// Creates a backend holding posts `"1"..="count"`, newest (highest) first.
pub fn seeded_feed(count: usize, page_size: u32) -> RemoteFeed {
    let remote = RemoteFeed::new(page_size);
    for i in 1..=count {
        remote.seed(new_post(
            PostId::new(i.to_string()),
            &format!("post {}", i),
            "seeded",
            Some(format!("images/{}.png", i)),
            "Seed",
        ));
    }
    remote
}

/// Creates a session on `remote` and performs the initial load.
///
/// Panics if the initial load fails.
pub fn connected_session(remote: &RemoteFeed) -> RemoteSession {
    let mut session = FeedSession::new(feed_config(remote.page_size()), remote.clone(), remote.clone())
        .expect("fixture config is valid");
    let outcome = session.load_initial();
    assert!(outcome.is_loaded(), "initial load failed: {:?}", outcome);
    session
}

/// Returns the IDs of the loaded posts, in display order.
pub fn loaded_ids(session: &RemoteSession) -> Vec<String> {
    session
        .posts()
        .iter()
        .map(|r| r.id.as_str().to_string())
        .collect()
}

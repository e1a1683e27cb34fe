//! Integration tests for the feed session against an in-memory backend.

use postfeed_engine::{
    DeleteOutcome, Direction, EditOutcome, EditState, FeedError, FeedSession, FeedTransport,
    HttpBody, HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpTransport, LoadOutcome,
    PostDraft, PostStore, Reconciliation,
};
use postfeed_protocol::{PostEvent, PostId, StatusUpdate, SubmitTarget};
use postfeed_testkit::prelude::*;
use proptest::prelude::*;
use url::Url;

fn ids(session: &RemoteSession) -> Vec<String> {
    loaded_ids(session)
}

#[test]
fn create_then_delete_walkthrough() {
    let remote = seeded_feed(2, 2);
    let mut session = connected_session(&remote);
    assert_eq!(ids(&session), ["2", "1"]);

    remote.remote_create_with_id(PostId::new("3"), "C", "body");
    session.poll_events();
    assert_eq!(ids(&session), ["3", "2", "1"]);
    assert_eq!(session.total_count(), 3);

    remote.remote_delete(&PostId::new("1"));
    session.poll_events();
    assert_eq!(ids(&session), ["3", "2"]);
    assert_eq!(session.total_count(), 2);
}

#[test]
fn duplicate_create_is_idempotent() {
    let remote = seeded_feed(2, 2);
    let mut session = connected_session(&remote);
    let event = PostEvent::create(sample_post("9", "dup"));

    remote.emit_raw(event.clone());
    remote.emit_raw(event);
    assert_eq!(session.poll_events(), 2);

    assert_eq!(ids(&session), ["9", "2", "1"]);
    assert_eq!(session.total_count(), 3);
    assert_eq!(session.stats().events_applied, 1);
    assert_eq!(session.stats().events_ignored, 1);
}

#[test]
fn update_off_page_is_ignored() {
    let remote = seeded_feed(4, 2);
    let mut session = connected_session(&remote);
    let before = session.store().clone();

    remote.remote_update(&PostId::new("1"), "elsewhere", "body");
    session.poll_events();

    assert_eq!(session.store(), &before);
}

#[test]
fn update_on_page_replaces_in_place() {
    let remote = seeded_feed(4, 2);
    let mut session = connected_session(&remote);

    remote.remote_update(&PostId::new("3"), "renamed", "body");
    session.poll_events();

    assert_eq!(ids(&session), ["4", "3"]);
    assert_eq!(session.posts()[1].title, "renamed");
    assert_eq!(session.posts()[1].author_name, "Seed");
}

#[test]
fn delete_reload_pulls_in_next_post() {
    let remote = seeded_feed(5, 2);
    let mut session = connected_session(&remote);
    assert_eq!(ids(&session), ["5", "4"]);

    remote.remote_delete(&PostId::new("5"));
    session.poll_events();

    assert_eq!(ids(&session), ["4", "3"]);
    assert_eq!(session.total_count(), 4);
    assert_eq!(session.stats().reloads_triggered, 1);
}

#[test]
fn delete_of_unknown_post_still_reloads() {
    let remote = seeded_feed(3, 2);
    let mut session = connected_session(&remote);
    let fetches = remote.fetch_count();

    remote.emit_raw(PostEvent::delete(PostId::new("nope")));
    session.poll_events();

    assert_eq!(remote.fetch_count(), fetches + 1);
    assert_eq!(ids(&session), ["3", "2"]);
}

#[test]
fn navigation_replaces_store_wholesale() {
    let remote = seeded_feed(5, 2);
    let mut session = connected_session(&remote);

    session.load_page(Direction::Next).unwrap();
    assert_eq!(ids(&session), ["3", "2"]);
    session.load_page(Direction::Next).unwrap();
    assert_eq!(ids(&session), ["1"]);
    assert_eq!(session.current_page(), 3);
    assert_eq!(session.last_page(), 3);

    assert!(matches!(
        session.load_page(Direction::Next),
        Err(FeedError::PageOutOfRange { .. })
    ));

    session.load_page(Direction::Previous).unwrap();
    assert_eq!(ids(&session), ["3", "2"]);
}

#[test]
fn create_on_later_page_is_prepended_locally() {
    let remote = seeded_feed(4, 2);
    let mut session = connected_session(&remote);
    session.load_page(Direction::Next).unwrap();

    remote.remote_create_with_id(PostId::new("new"), "fresh", "body");
    session.poll_events();

    assert_eq!(ids(&session), ["new", "2", "1"]);
    assert_eq!(session.total_count(), 5);
}

#[test]
fn failed_navigation_reverts_page() {
    let remote = seeded_feed(4, 2);
    let mut session = connected_session(&remote);

    remote.fail_fetches(Some(FeedError::transport_retryable("connection reset")));
    let outcome = session.load_page(Direction::Next).unwrap();

    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert_eq!(session.current_page(), 1);
    assert_eq!(ids(&session), ["4", "3"]);
    assert!(session.page_error().is_some());
    assert!(session.visible_posts().is_none());

    remote.fail_fetches(None);
    session.load_page(Direction::Next).unwrap();
    assert_eq!(session.current_page(), 2);
    assert!(session.page_error().is_none());
}

#[test]
fn only_latest_page_request_applies() {
    let remote = seeded_feed(6, 2);
    let mut session = connected_session(&remote);

    let to_two = session.begin_page_load(Direction::Next).unwrap();
    let to_three = session.begin_page_load(Direction::Next).unwrap();
    assert_eq!(to_three.page, 3);

    let applied = session.complete_page_load(to_three, remote.fetch_posts(to_three.page));
    let stale = session.complete_page_load(to_two, remote.fetch_posts(to_two.page));

    assert_eq!(applied, LoadOutcome::Loaded { page: 3, count: 2 });
    assert_eq!(stale, LoadOutcome::Superseded);
    assert_eq!(ids(&session), ["2", "1"]);
    assert_eq!(session.current_page(), 3);
    assert!(!session.is_loading());
}

#[test]
fn stale_failure_does_not_revert_newer_page() {
    let remote = seeded_feed(6, 2);
    let mut session = connected_session(&remote);

    let first = session.begin_page_load(Direction::Next).unwrap();
    let second = session.begin_page_load(Direction::Next).unwrap();

    session.complete_page_load(second, remote.fetch_posts(second.page));
    let stale = session.complete_page_load(first, Err(FeedError::transport_retryable("late")));

    assert_eq!(stale, LoadOutcome::Superseded);
    assert_eq!(session.current_page(), 3);
    assert!(session.page_error().is_none());
}

#[test]
fn local_edit_arrives_through_notification() {
    let remote = seeded_feed(2, 2);
    let mut session = connected_session(&remote);

    session.start_edit(&PostId::new("2")).unwrap();
    let submission = session.begin_submit(PostDraft::new("edited", "new body")).unwrap();
    assert_eq!(submission.target, SubmitTarget::Update(PostId::new("2")));
    assert!(session.is_edit_loading());

    let result = remote.submit_post(&submission.target, &submission.form);
    let outcome = session.complete_submit(result).unwrap();
    assert!(matches!(outcome, EditOutcome::Saved(_)));
    assert_eq!(session.posts()[0].title, "post 2");

    session.poll_events();
    assert_eq!(session.posts()[0].title, "edited");
    // The untouched image reference survives the edit.
    assert_eq!(
        remote.get(&PostId::new("2")).unwrap().image_url.as_deref(),
        Some("images/2.png")
    );
}

#[test]
fn failed_edit_rolls_back() {
    let remote = seeded_feed(2, 2);
    let mut session = connected_session(&remote);
    let before = session.store().clone();
    remote.fail_mutations(Some(FeedError::status(500, "Creating or editing a post failed!")));

    session.start_create().unwrap();
    let outcome = session.submit_edit(PostDraft::new("t", "c")).unwrap();

    assert!(matches!(outcome, EditOutcome::Failed(_)));
    assert_eq!(session.edit_state(), &EditState::Idle);
    assert_eq!(session.store(), &before);
    assert!(session.notice().is_some());
    assert_eq!(remote.total(), 2);
}

#[test]
fn local_delete_reloads_from_server() {
    let remote = seeded_feed(3, 2);
    let mut session = connected_session(&remote);

    let outcome = session.delete_post(&PostId::new("3"));
    assert_eq!(
        outcome,
        DeleteOutcome::Reloaded(LoadOutcome::Loaded { page: 1, count: 2 })
    );
    assert_eq!(ids(&session), ["2", "1"]);

    // The echoed notification reloads once more and converges.
    session.poll_events();
    assert_eq!(ids(&session), ["2", "1"]);
    assert_eq!(session.total_count(), 2);
}

#[test]
fn failed_delete_keeps_store() {
    let remote = seeded_feed(3, 2);
    let mut session = connected_session(&remote);
    let before = session.store().clone();
    remote.fail_mutations(Some(FeedError::status(500, "Deleting a post failed!")));

    let outcome = session.delete_post(&PostId::new("3"));

    assert!(matches!(outcome, DeleteOutcome::Failed(_)));
    assert_eq!(session.store(), &before);
    assert!(!session.is_loading());
}

#[test]
fn status_updates_reach_backend() {
    let remote = seeded_feed(1, 2);
    let mut session = connected_session(&remote);

    assert!(session.update_status("writing"));
    assert_eq!(remote.status().as_deref(), Some("writing"));
}

#[test]
fn subscription_is_released_on_close_and_drop() {
    let remote = seeded_feed(2, 2);
    let mut first = connected_session(&remote);
    let second = connected_session(&remote);
    assert_eq!(remote.subscriber_count(), 2);

    first.close();
    assert!(!first.is_subscribed());
    assert_eq!(remote.released_subscriptions(), 1);

    drop(second);
    assert_eq!(remote.released_subscriptions(), 2);
    assert_eq!(remote.subscriber_count(), 0);
}

#[test]
fn closed_session_ignores_later_notifications() {
    let remote = seeded_feed(2, 2);
    let mut session = connected_session(&remote);
    session.close();

    remote.remote_create("late", "body");
    assert_eq!(session.poll_events(), 0);
    assert_eq!(ids(&session), ["2", "1"]);

    session.load_initial();
    assert!(!session.is_subscribed());
    assert_eq!(remote.subscriber_count(), 0);
}

#[tokio::test]
async fn next_event_waits_for_notification() {
    let remote = seeded_feed(2, 2);
    let mut session = connected_session(&remote);

    let producer = remote.clone();
    let handle = tokio::spawn(async move {
        tokio::task::yield_now().await;
        producer.remote_create_with_id(PostId::new("7"), "async", "body");
    });

    let outcome = session.next_event().await;
    handle.await.unwrap();

    assert_eq!(outcome, Some(Reconciliation::Inserted(PostId::new("7"))));
    assert_eq!(ids(&session), ["7", "2", "1"]);
}

/// An HTTP client that serves requests from a `RemoteFeed`.
struct InMemoryHttp {
    remote: RemoteFeed,
    token: Option<String>,
}

impl InMemoryHttp {
    fn respond(status: u16, body: Vec<u8>) -> Result<HttpResponse, String> {
        Ok(HttpResponse { status, body })
    }

    fn error(err: FeedError) -> Result<HttpResponse, String> {
        match err {
            FeedError::Status { status, message } => Self::respond(status, message.into_bytes()),
            other => Err(other.to_string()),
        }
    }
}

fn envelope(post: &postfeed_protocol::RawPost) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "post": post })).unwrap()
}

impl HttpClient for InMemoryHttp {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        if request.bearer_token != self.token {
            return Self::respond(401, Vec::new());
        }
        let url = Url::parse(&request.url).map_err(|e| e.to_string())?;
        let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

        match (request.method, segments.as_slice(), &request.body) {
            (HttpMethod::Get, ["api", "feed", "posts"], HttpBody::Empty) => {
                let page = url
                    .query_pairs()
                    .find(|(k, _)| k == "page")
                    .and_then(|(_, v)| v.parse().ok())
                    .unwrap_or(1);
                match self.remote.fetch_posts(page) {
                    Ok(page) => Self::respond(200, serde_json::to_vec(&page).unwrap()),
                    Err(err) => Self::error(err),
                }
            }
            (HttpMethod::Post, ["api", "feed", "post"], HttpBody::Multipart(form)) => {
                match self.remote.submit_post(&SubmitTarget::Create, form) {
                    Ok(post) => Self::respond(201, post.map(|p| envelope(&p)).unwrap_or_default()),
                    Err(err) => Self::error(err),
                }
            }
            (HttpMethod::Put, ["api", "feed", "post", id], HttpBody::Multipart(form)) => {
                let target = SubmitTarget::Update(PostId::new(*id));
                match self.remote.submit_post(&target, form) {
                    Ok(post) => Self::respond(200, post.map(|p| envelope(&p)).unwrap_or_default()),
                    Err(err) => Self::error(err),
                }
            }
            (HttpMethod::Delete, ["api", "feed", "post", id], HttpBody::Empty) => {
                match self.remote.delete_post(&PostId::new(*id)) {
                    Ok(()) => Self::respond(200, b"{}".to_vec()),
                    Err(err) => Self::error(err),
                }
            }
            (HttpMethod::Put, ["api", "feed", "status"], HttpBody::Json(body)) => {
                let update: StatusUpdate = serde_json::from_slice(body).map_err(|e| e.to_string())?;
                match self.remote.update_status(&update) {
                    Ok(()) => Self::respond(200, b"{}".to_vec()),
                    Err(err) => Self::error(err),
                }
            }
            _ => Self::respond(404, Vec::new()),
        }
    }
}

type HttpSession = FeedSession<HttpTransport<InMemoryHttp>, RemoteFeed>;

fn http_session(remote: &RemoteFeed, token: Option<&str>) -> HttpSession {
    let mut config = feed_config(remote.page_size());
    config.base_url = "https://feed.example.com/api".into();
    if let Some(token) = token {
        config = config.with_auth_token(token);
    }
    let client = InMemoryHttp {
        remote: remote.clone(),
        token: Some("secret".into()),
    };
    let transport = HttpTransport::new(&config, client).unwrap();
    FeedSession::new(config, transport, remote.clone()).unwrap()
}

#[test]
fn session_over_http_transport() {
    let remote = seeded_feed(3, 2);
    let mut session = http_session(&remote, Some("secret"));

    assert!(session.load_initial().is_loaded());
    let first = &session.posts()[0];
    assert_eq!(first.id, PostId::new("3"));
    assert_eq!(
        first.image_url.as_ref().map(Url::as_str),
        Some("https://feed.example.com/api/images/3.png")
    );

    session.start_create().unwrap();
    let outcome = session.submit_edit(PostDraft::new("over http", "body")).unwrap();
    assert!(matches!(outcome, EditOutcome::Saved(_)));
    session.poll_events();
    assert_eq!(session.posts()[0].title, "over http");
    assert_eq!(session.total_count(), 4);

    let outcome = session.delete_post(&PostId::new("1"));
    assert!(matches!(outcome, DeleteOutcome::Reloaded(LoadOutcome::Loaded { .. })));
    assert!(session.update_status("done"));
    assert_eq!(remote.status().as_deref(), Some("done"));
}

#[test]
fn http_rejects_missing_token() {
    let remote = seeded_feed(1, 2);
    let mut session = http_session(&remote, None);

    let outcome = session.load_initial();
    assert!(matches!(
        outcome,
        LoadOutcome::Failed(FeedError::AuthenticationFailed(_))
    ));
    assert!(!session.is_subscribed());
}

#[test]
fn http_maps_missing_post_to_status() {
    let remote = seeded_feed(1, 2);
    let mut session = http_session(&remote, Some("secret"));
    session.load_initial();

    let outcome = session.delete_post(&PostId::new("missing"));
    assert_eq!(
        outcome,
        DeleteOutcome::Failed(FeedError::status(404, "Deleting a post failed!"))
    );
}

fn session_with_ids(count: u8) -> RemoteSession {
    let remote = RemoteFeed::new(6);
    for n in 0..count {
        remote.seed(sample_post(&format!("p{}", n), "seed"));
    }
    connected_session(&remote)
}

fn apply_all(session: &mut RemoteSession, events: &[PostEvent]) -> PostStore {
    for event in events {
        session.handle_event(event.clone());
    }
    session.store().clone()
}

proptest! {
    #[test]
    fn store_ids_stay_unique(events in prop::collection::vec(post_event_strategy(), 0..40)) {
        let mut session = session_with_ids(4);
        let store = apply_all(&mut session, &events);

        let mut ids = store.ids();
        let len = ids.len();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), len);
    }

    #[test]
    fn redelivery_is_harmless(events in prop::collection::vec(upsert_event_strategy(), 0..30)) {
        let mut once = session_with_ids(4);
        let mut twice = session_with_ids(4);

        let doubled: Vec<PostEvent> = events
            .iter()
            .flat_map(|e| [e.clone(), e.clone()])
            .collect();

        prop_assert_eq!(apply_all(&mut once, &events), apply_all(&mut twice, &doubled));
    }

    #[test]
    fn updates_off_page_change_nothing(post in raw_post_strategy()) {
        let mut session = session_with_ids(0);
        let before = session.store().clone();

        let outcome = session.handle_event(PostEvent::update(post));
        prop_assert!(!outcome.changed_store());
        prop_assert_eq!(session.store(), &before);
    }
}

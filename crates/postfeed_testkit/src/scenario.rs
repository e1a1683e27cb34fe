//! Scripted scenarios.
//!
//! A scenario seeds a [`RemoteFeed`], connects a session to it and applies
//! a list of steps, recording the session's view after each one. Scripts are
//! JSON so they can be shared between tests and the `postfeed replay` command.
//!
//! ```json
//! {
//!   "page_size": 2,
//!   "seed": [{"id": "1", "title": "first"}, {"id": "2", "title": "second"}],
//!   "steps": [
//!     {"op": "remote_create", "id": "3", "title": "third"},
//!     {"op": "remote_delete", "id": "1"}
//!   ]
//! }
//! ```

use crate::remote::{new_post, RemoteFeed};
use postfeed_engine::{
    DeleteOutcome, Direction, EditOutcome, FeedConfig, FeedError, FeedSession, FeedStats,
    LoadOutcome, PostDraft, DEFAULT_PAGE_SIZE,
};
use postfeed_protocol::{PostEvent, PostId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// The concrete create-then-delete walk-through, as a script.
pub const CREATE_THEN_DELETE: &str = r#"{
  "description": "remote create is prepended, remote delete reloads the page",
  "page_size": 2,
  "seed": [{"id": "1", "title": "B"}, {"id": "2", "title": "A"}],
  "steps": [
    {"op": "remote_create", "id": "3", "title": "C"},
    {"op": "remote_delete", "id": "1"}
  ]
}"#;

/// Errors that stop a scenario from running.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// The script could not be read.
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The script is not valid JSON or has an unknown step.
    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// The session could not be created.
    #[error("session setup failed: {0}")]
    Setup(#[from] FeedError),
}

/// A post present on the backend before the scenario starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPost {
    /// ID; a random one is assigned when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Title.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub content: String,
    /// Image reference.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Author display name.
    #[serde(default)]
    pub author: Option<String>,
}

/// Navigation direction in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDirection {
    /// One page forward.
    Next,
    /// One page back.
    Previous,
    /// The current page again.
    Current,
}

impl From<NavDirection> for Direction {
    fn from(direction: NavDirection) -> Self {
        match direction {
            NavDirection::Next => Direction::Next,
            NavDirection::Previous => Direction::Previous,
            NavDirection::Current => Direction::Current,
        }
    }
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Another user creates a post.
    RemoteCreate {
        /// ID; a random one is assigned when absent.
        #[serde(default)]
        id: Option<String>,
        /// Title.
        title: String,
        /// Body text.
        #[serde(default)]
        content: String,
    },
    /// Another user edits a post.
    RemoteUpdate {
        /// Post to edit.
        id: String,
        /// New title.
        title: String,
        /// New body text.
        #[serde(default)]
        content: String,
    },
    /// Another user deletes a post.
    RemoteDelete {
        /// Post to delete.
        id: String,
    },
    /// A notification is delivered as is, without touching the backend.
    Deliver {
        /// The notification.
        event: PostEvent,
    },
    /// The viewer navigates.
    Navigate {
        /// Where to.
        direction: NavDirection,
    },
    /// The viewer deletes a post.
    Delete {
        /// Post to delete.
        id: String,
    },
    /// The viewer creates a post.
    Create {
        /// Title.
        title: String,
        /// Body text.
        #[serde(default)]
        content: String,
    },
    /// The viewer edits a loaded post.
    Edit {
        /// Post to edit.
        id: String,
        /// New title.
        title: String,
        /// New body text.
        #[serde(default)]
        content: String,
    },
    /// The viewer updates their status.
    Status {
        /// Status text.
        text: String,
    },
    /// Backend fetches start or stop failing.
    FailFetches {
        /// Whether fetches fail from now on.
        enabled: bool,
    },
    /// Backend mutations start or stop failing.
    FailMutations {
        /// Whether mutations fail from now on.
        enabled: bool,
    },
    /// The viewer closes the error display.
    DismissError,
}

impl Step {
    /// Returns the step's `op` name.
    pub fn name(&self) -> &'static str {
        match self {
            Step::RemoteCreate { .. } => "remote_create",
            Step::RemoteUpdate { .. } => "remote_update",
            Step::RemoteDelete { .. } => "remote_delete",
            Step::Deliver { .. } => "deliver",
            Step::Navigate { .. } => "navigate",
            Step::Delete { .. } => "delete",
            Step::Create { .. } => "create",
            Step::Edit { .. } => "edit",
            Step::Status { .. } => "status",
            Step::FailFetches { .. } => "fail_fetches",
            Step::FailMutations { .. } => "fail_mutations",
            Step::DismissError => "dismiss_error",
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

/// A scripted scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Backend page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Base URL that image references resolve against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Initial backend content, oldest first.
    #[serde(default)]
    pub seed: Vec<SeedPost>,
    /// Steps to apply after the initial load.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A loaded post as the viewer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewPost {
    /// Post ID.
    pub id: String,
    /// Title.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Resolved image URL.
    pub image_url: Option<String>,
}

/// The session's view at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    /// Current page.
    pub page: u32,
    /// Last page of the collection.
    pub last_page: u32,
    /// Last known collection size.
    pub total: u64,
    /// Whether the page list is loading.
    pub loading: bool,
    /// Full-page error.
    pub page_error: Option<String>,
    /// Mutation error.
    pub notice: Option<String>,
    /// Loaded posts in display order.
    pub posts: Vec<ViewPost>,
}

impl ViewSnapshot {
    /// Returns the loaded post IDs in display order.
    pub fn ids(&self) -> Vec<&str> {
        self.posts.iter().map(|p| p.id.as_str()).collect()
    }
}

/// What happened in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Position in the script, from zero.
    pub index: usize,
    /// The step's `op` name.
    pub op: String,
    /// Short description of the result.
    pub outcome: String,
    /// Error, if the step failed.
    pub error: Option<String>,
    /// Notifications applied after the step.
    pub events: usize,
    /// View after the step.
    pub view: ViewSnapshot,
}

/// The result of running a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// The scenario's description.
    pub description: String,
    /// View after the initial load.
    pub initial: ViewSnapshot,
    /// One report per step.
    pub steps: Vec<StepReport>,
    /// Session statistics at the end.
    pub stats: FeedStats,
}

impl ScenarioReport {
    /// Returns the view after the last step, or after the initial load.
    pub fn final_view(&self) -> &ViewSnapshot {
        self.steps.last().map(|s| &s.view).unwrap_or(&self.initial)
    }
}

type ScenarioSession = FeedSession<RemoteFeed, RemoteFeed>;

impl Scenario {
    /// Parses a scenario from JSON.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a scenario from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Runs the scenario against a fresh in-memory backend.
    ///
    /// Step failures are recorded in the report; only setup problems abort.
    pub fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        let remote = RemoteFeed::new(self.page_size);
        for seed in &self.seed {
            remote.seed(new_post(
                seed_id(seed.id.as_deref()),
                &seed.title,
                &seed.content,
                seed.image_url.clone(),
                seed.author.as_deref().unwrap_or(""),
            ));
        }

        let config = FeedConfig::new(self.base_url.clone()).with_page_size(self.page_size);
        let mut session = FeedSession::new(config, remote.clone(), remote.clone())?;
        session.load_initial();
        let initial = snapshot(&session);

        let mut steps = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let result = apply(&remote, &mut session, step);
            let events = session.poll_events();
            debug!(index, op = step.name(), events, "scenario step applied");

            let (outcome, error) = match result {
                Ok(outcome) => (outcome, None),
                Err(err) => ("failed".to_string(), Some(err.to_string())),
            };
            steps.push(StepReport {
                index,
                op: step.name().to_string(),
                outcome,
                error,
                events,
                view: snapshot(&session),
            });
        }

        let stats = session.stats().clone();
        session.close();
        Ok(ScenarioReport {
            description: self.description.clone(),
            initial,
            steps,
            stats,
        })
    }
}

fn seed_id(id: Option<&str>) -> PostId {
    match id {
        Some(id) => PostId::new(id),
        None => PostId::new(Uuid::new_v4().to_string()),
    }
}

fn apply(remote: &RemoteFeed, session: &mut ScenarioSession, step: &Step) -> Result<String, FeedError> {
    match step {
        Step::RemoteCreate { id, title, content } => {
            let post = remote.remote_create_with_id(seed_id(id.as_deref()), title, content);
            Ok(format!("created {}", post.id))
        }
        Step::RemoteUpdate { id, title, content } => {
            let id = PostId::new(id.as_str());
            remote
                .remote_update(&id, title, content)
                .map(|post| format!("updated {}", post.id))
                .ok_or(FeedError::PostNotFound(id))
        }
        Step::RemoteDelete { id } => {
            let id = PostId::new(id.as_str());
            if remote.remote_delete(&id) {
                Ok(format!("deleted {}", id))
            } else {
                Err(FeedError::PostNotFound(id))
            }
        }
        Step::Deliver { event } => {
            remote.emit_raw(event.clone());
            Ok("delivered".to_string())
        }
        Step::Navigate { direction } => describe_load(session.load_page((*direction).into())?),
        Step::Delete { id } => match session.delete_post(&PostId::new(id.as_str())) {
            DeleteOutcome::Reloaded(outcome) => describe_load(outcome),
            DeleteOutcome::Failed(err) => Err(err),
        },
        Step::Create { title, content } => {
            session.start_create()?;
            describe_edit(session.submit_edit(PostDraft::new(title.as_str(), content.as_str()))?)
        }
        Step::Edit { id, title, content } => {
            session.start_edit(&PostId::new(id.as_str()))?;
            describe_edit(session.submit_edit(PostDraft::new(title.as_str(), content.as_str()))?)
        }
        Step::Status { text } => {
            if session.update_status(text.as_str()) {
                Ok(format!("status set to {:?}", text))
            } else {
                Err(session
                    .notice()
                    .cloned()
                    .unwrap_or_else(|| FeedError::Protocol("status update failed".into())))
            }
        }
        Step::FailFetches { enabled } => {
            remote.fail_fetches(enabled.then(|| FeedError::status(500, "Failed to fetch posts.")));
            Ok(toggle(*enabled))
        }
        Step::FailMutations { enabled } => {
            remote.fail_mutations(enabled.then(|| FeedError::status(500, "Mutation failed.")));
            Ok(toggle(*enabled))
        }
        Step::DismissError => {
            session.dismiss_error();
            Ok("dismissed".to_string())
        }
    }
}

fn toggle(enabled: bool) -> String {
    let state = if enabled { "enabled" } else { "disabled" };
    state.to_string()
}

fn describe_load(outcome: LoadOutcome) -> Result<String, FeedError> {
    match outcome {
        LoadOutcome::Loaded { page, count } => Ok(format!("loaded page {} ({} posts)", page, count)),
        LoadOutcome::Superseded => Ok("superseded".to_string()),
        LoadOutcome::Failed(err) => Err(err),
    }
}

fn describe_edit(outcome: EditOutcome) -> Result<String, FeedError> {
    match outcome {
        EditOutcome::Saved(Some(post)) => Ok(format!("saved {}", post.id)),
        EditOutcome::Saved(None) => Ok("saved".to_string()),
        EditOutcome::Failed(err) => Err(err),
    }
}

fn snapshot(session: &ScenarioSession) -> ViewSnapshot {
    ViewSnapshot {
        page: session.current_page(),
        last_page: session.last_page(),
        total: session.total_count(),
        loading: session.is_loading(),
        page_error: session.page_error().map(ToString::to_string),
        notice: session.notice().map(ToString::to_string),
        posts: session
            .posts()
            .iter()
            .map(|r| ViewPost {
                id: r.id.to_string(),
                title: r.title.clone(),
                author: r.author_name.clone(),
                image_url: r.image_url.as_ref().map(ToString::to_string),
            })
            .collect(),
    }
}

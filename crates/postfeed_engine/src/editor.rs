//! Optimistic create / edit workflow.

use crate::error::{FeedError, FeedResult};
use crate::record::PostRecord;
use postfeed_protocol::{ImageField, ImageUpload, PostForm, RawPost, SubmitTarget};

/// Values the viewer entered in the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// New or replacement image; `None` keeps the current one.
    pub image: Option<ImageUpload>,
}

impl PostDraft {
    /// Creates a draft without a new image.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image: None,
        }
    }

    /// Attaches a new image.
    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }
}

/// State of the edit session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    /// No edit in progress.
    #[default]
    Idle,
    /// The form is open; `seed` is the post being edited, if any.
    Editing {
        /// Snapshot of the edited post.
        seed: Option<PostRecord>,
    },
    /// A submission is in flight.
    Submitting {
        /// Snapshot of the edited post.
        seed: Option<PostRecord>,
    },
}

impl EditState {
    /// Returns a short name for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            EditState::Idle => "idle",
            EditState::Editing { .. } => "editing",
            EditState::Submitting { .. } => "submitting",
        }
    }

    /// Returns the snapshot of the edited post.
    pub fn seed(&self) -> Option<&PostRecord> {
        match self {
            EditState::Idle => None,
            EditState::Editing { seed } | EditState::Submitting { seed } => seed.as_ref(),
        }
    }
}

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSubmission {
    /// Create or update.
    pub target: SubmitTarget,
    /// Multipart payload.
    pub form: PostForm,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The backend accepted the post, echoing it back if it did so.
    Saved(Option<RawPost>),
    /// The backend rejected the post or was unreachable.
    Failed(FeedError),
}

/// Drives one edit session at a time.
///
/// The controller never patches the store. A successful save is reflected
/// by the echoed notification; a failure discards the session.
#[derive(Debug, Clone, Default)]
pub struct EditController {
    state: EditState,
}

impl EditController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Returns true while the form is open or submitting.
    pub fn is_editing(&self) -> bool {
        !matches!(self.state, EditState::Idle)
    }

    /// Returns true while a submission is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, EditState::Submitting { .. })
    }

    /// Opens the form for a new post.
    pub fn start_create(&mut self) -> FeedResult<()> {
        self.open(None)
    }

    /// Opens the form for an existing post.
    pub fn start_edit(&mut self, record: PostRecord) -> FeedResult<()> {
        self.open(Some(record))
    }

    fn open(&mut self, seed: Option<PostRecord>) -> FeedResult<()> {
        if self.is_loading() {
            return Err(self.invalid("editing"));
        }
        self.state = EditState::Editing { seed };
        Ok(())
    }

    /// Closes the form without sending anything.
    pub fn cancel(&mut self) -> FeedResult<()> {
        match self.state {
            EditState::Editing { .. } => {
                self.state = EditState::Idle;
                Ok(())
            }
            _ => Err(self.invalid("idle")),
        }
    }

    /// Moves to `Submitting` and shapes the request.
    ///
    /// Without a new image, the `image` field carries the edited post's
    /// current reference, or the empty string.
    pub fn begin_submit(&mut self, draft: PostDraft) -> FeedResult<PostSubmission> {
        if !matches!(self.state, EditState::Editing { .. }) {
            return Err(self.invalid("submitting"));
        }
        let seed = match std::mem::take(&mut self.state) {
            EditState::Editing { seed } => seed,
            _ => None,
        };

        let image = match draft.image {
            Some(upload) => ImageField::Upload(upload),
            None => ImageField::Reference(
                seed.as_ref().map(PostRecord::image_fallback).unwrap_or_default(),
            ),
        };
        let target = match &seed {
            Some(record) => SubmitTarget::Update(record.id.clone()),
            None => SubmitTarget::Create,
        };

        self.state = EditState::Submitting { seed };
        Ok(PostSubmission {
            target,
            form: PostForm::new(draft.title, draft.content, image),
        })
    }

    /// Settles the in-flight submission. Always returns to `Idle`.
    pub fn complete(&mut self, result: FeedResult<Option<RawPost>>) -> FeedResult<EditOutcome> {
        if !self.is_loading() {
            return Err(self.invalid("idle"));
        }
        self.state = EditState::Idle;
        Ok(match result {
            Ok(post) => EditOutcome::Saved(post),
            Err(err) => EditOutcome::Failed(err),
        })
    }

    fn invalid(&self, to: &str) -> FeedError {
        FeedError::InvalidStateTransition {
            from: self.state.name().into(),
            to: to.into(),
        }
    }
}

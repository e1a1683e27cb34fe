//! # Postfeed Protocol
//!
//! Wire types exchanged between a post feed client and its backend.
//!
//! This crate provides:
//! - `RawPost` and `PostPage` for paginated fetches
//! - `PostEvent` for push notifications (create / update / delete)
//! - `PostForm` for the three-field multipart submission
//! - `StatusUpdate` for the status side-channel
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod event;
mod form;
mod post;

pub use error::{ProtocolError, ProtocolResult};
pub use event::{EventAction, EventPayload, PostEvent};
pub use form::{FormValue, ImageField, ImageUpload, PostForm, StatusUpdate, SubmitTarget};
pub use post::{AuthorRef, CreatorRef, PostId, PostPage, RawPost};

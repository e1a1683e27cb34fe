//! # Postfeed Testkit
//!
//! Test utilities for postfeed.
//!
//! This crate provides:
//! - `RemoteFeed`, an in-memory backend that serves pages and pushes notifications
//! - Fixtures for posts, pages and connected sessions
//! - Property-based test generators using proptest
//! - A scenario runner that replays JSON scripts against a session
//!
//! ## Usage
//!
//! ```rust,ignore
//! use postfeed_testkit::prelude::*;
//!
//! #[test]
//! fn sees_remote_create() {
//!     let remote = seeded_feed(2, 2);
//!     let mut session = connected_session(&remote);
//!     remote.remote_create("hello", "world");
//!     session.poll_events();
//!     assert_eq!(session.posts()[0].title, "hello");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod remote;
pub mod scenario;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::remote::*;
    pub use crate::scenario::*;
}

pub use fixtures::*;
pub use generators::*;
pub use remote::*;
pub use scenario::*;

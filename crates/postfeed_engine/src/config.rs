//! Configuration for the feed engine.

use crate::error::{FeedError, FeedResult};
use std::time::Duration;
use url::Url;

/// Page size the backend paginates with.
pub const DEFAULT_PAGE_SIZE: u32 = 2;

/// Configuration for a feed session.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Backend base URL. Also the base for resolving image references.
    pub base_url: String,
    /// Number of posts per page, fixed by the backend.
    pub page_size: u32,
    /// Bearer token attached to every request.
    pub auth_token: Option<String>,
    /// Request timeout for concrete HTTP clients.
    pub request_timeout: Duration,
}

impl FeedConfig {
    /// Creates a new feed configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            auth_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Parses the base URL.
    pub fn parsed_base_url(&self) -> FeedResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| FeedError::InvalidConfig(format!("base url {:?}: {}", self.base_url, e)))
    }

    /// Parses the base URL as a directory that paths are joined onto.
    pub fn base_directory(&self) -> FeedResult<Url> {
        self.validate()?;
        Ok(as_directory(self.parsed_base_url()?))
    }

    /// Checks that the configuration is usable.
    pub fn validate(&self) -> FeedResult<()> {
        if self.page_size == 0 {
            return Err(FeedError::InvalidConfig("page size must be at least 1".into()));
        }
        let base = self.parsed_base_url()?;
        if base.cannot_be_a_base() {
            return Err(FeedError::InvalidConfig(format!(
                "base url {:?} cannot be a base",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Makes `url` end with a slash so joins append to its path.
pub(crate) fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

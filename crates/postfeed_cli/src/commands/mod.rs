//! CLI command implementations.

pub mod client;
pub mod delete;
pub mod page;
pub mod post;
pub mod replay;
pub mod status;

use client::UreqClient;
use postfeed_engine::{FeedConfig, FeedResult, HttpTransport};
use std::time::Duration;

/// Connection settings shared by the networked commands.
pub struct Remote {
    /// Backend base URL.
    pub base_url: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
}

impl Remote {
    /// Builds the feed configuration.
    pub fn config(&self) -> FeedConfig {
        let config = FeedConfig::new(self.base_url.clone()).with_request_timeout(self.timeout);
        match &self.token {
            Some(token) => config.with_auth_token(token.clone()),
            None => config,
        }
    }

    /// Opens an HTTP transport to the backend.
    pub fn connect(&self) -> FeedResult<HttpTransport<UreqClient>> {
        let config = self.config();
        HttpTransport::new(&config, UreqClient::new(&config))
    }
}

//! HTTP transport implementation.
//!
//! This module maps feed operations onto the backend's REST endpoints.
//! The actual HTTP client is abstracted via a trait to allow different
//! implementations (ureq, reqwest, hyper, etc.).

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::transport::FeedTransport;
use postfeed_protocol::{PostForm, PostId, PostPage, RawPost, StatusUpdate, SubmitTarget};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};
use url::Url;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpBody {
    /// No body.
    Empty,
    /// JSON-encoded body.
    Json(Vec<u8>),
    /// Multipart form; the client chooses the boundary.
    Multipart(PostForm),
}

/// A request handed to the [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Fully-qualified URL.
    pub url: String,
    /// Token for the `Authorization: Bearer` header.
    pub bearer_token: Option<String>,
    /// Body.
    pub body: HttpBody,
}

/// A response returned by the [`HttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Raw body.
    pub body: Vec<u8>,
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Non-2xx
/// statuses are returned as responses, not errors; `Err` is reserved for
/// requests that never produced a response.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, String>;
}

#[derive(Deserialize)]
struct PostEnvelope {
    post: RawPost,
}

const OK: &[u16] = &[200];
const OK_OR_CREATED: &[u16] = &[200, 201];

/// HTTP-based feed transport.
///
/// Endpoints, relative to the base URL:
/// - `GET feed/posts?page=N`
/// - `POST feed/post`, `PUT feed/post/{id}` (multipart)
/// - `DELETE feed/post/{id}`
/// - `PUT feed/status` (JSON)
pub struct HttpTransport<C: HttpClient> {
    base_url: Url,
    auth_token: Option<String>,
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(config: &FeedConfig, client: C) -> FeedResult<Self> {
        Ok(Self {
            base_url: config.base_directory()?,
            auth_token: config.auth_token.clone(),
            client,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> FeedResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| FeedError::InvalidConfig(format!("endpoint {:?}: {}", path, e)))
    }

    fn execute(
        &self,
        method: HttpMethod,
        url: Url,
        body: HttpBody,
        accepted: &[u16],
        failure: &str,
    ) -> FeedResult<Vec<u8>> {
        let request = HttpRequest {
            method,
            url: url.into(),
            bearer_token: self.auth_token.clone(),
            body,
        };
        debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.client.send(&request).map_err(|e| {
            warn!(url = %request.url, error = %e, "request failed");
            FeedError::transport_retryable(e)
        })?;

        match response.status {
            status if accepted.contains(&status) => Ok(response.body),
            401 => Err(FeedError::AuthenticationFailed(failure.into())),
            status => Err(FeedError::status(status, failure)),
        }
    }
}

impl<C: HttpClient> FeedTransport for HttpTransport<C> {
    fn fetch_posts(&self, page: u32) -> FeedResult<PostPage> {
        let mut url = self.url("feed/posts")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let body = self.execute(HttpMethod::Get, url, HttpBody::Empty, OK, "Failed to fetch posts.")?;
        Ok(PostPage::from_json(&body)?)
    }

    fn submit_post(&self, target: &SubmitTarget, form: &PostForm) -> FeedResult<Option<RawPost>> {
        let (method, url) = match target {
            SubmitTarget::Create => (HttpMethod::Post, self.url("feed/post")?),
            SubmitTarget::Update(id) => (HttpMethod::Put, self.post_url(id)?),
        };

        let body = self.execute(
            method,
            url,
            HttpBody::Multipart(form.clone()),
            OK_OR_CREATED,
            "Creating or editing a post failed!",
        )?;
        // Any accepted answer is a save; the `{post}` body is optional.
        match serde_json::from_slice::<PostEnvelope>(&body) {
            Ok(envelope) => Ok(Some(envelope.post)),
            Err(e) => {
                debug!(error = %e, "submission accepted without a post body");
                Ok(None)
            }
        }
    }

    fn delete_post(&self, id: &PostId) -> FeedResult<()> {
        self.execute(
            HttpMethod::Delete,
            self.post_url(id)?,
            HttpBody::Empty,
            OK_OR_CREATED,
            "Deleting a post failed!",
        )?;
        Ok(())
    }

    fn update_status(&self, update: &StatusUpdate) -> FeedResult<()> {
        let body = serde_json::to_vec(update)
            .map_err(|e| FeedError::Protocol(format!("Failed to encode status: {}", e)))?;
        self.execute(
            HttpMethod::Put,
            self.url("feed/status")?,
            HttpBody::Json(body),
            OK_OR_CREATED,
            "Can't update status!",
        )?;
        Ok(())
    }
}

impl<C: HttpClient> HttpTransport<C> {
    fn post_url(&self, id: &PostId) -> FeedResult<Url> {
        let mut url = self.url("feed/post")?;
        url.path_segments_mut()
            .map_err(|_| FeedError::InvalidConfig("base url cannot be a base".into()))?
            .push(id.as_str());
        Ok(url)
    }
}

//! HTTP client for the blog REST API.
//!
//! The public endpoints need no credentials; the admin endpoints take the
//! session token explicitly so the caller decides which session a request
//! belongs to.
//!
//! ```no_run
//! # async fn example() -> Result<(), blogfront::api::Error> {
//! use blogfront::api::ApiClient;
//!
//! let client = ApiClient::new("http://localhost:5000")?;
//! for blog in client.search_blogs("headphones").await? {
//!     println!("{}: {}", blog.slug, blog.title);
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::Error;

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::editor::Submission;
use crate::model::{BlogRecord, DashboardStats};

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Envelope shared by every endpoint: `{ success, blog(s)/stats/token, message? }`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub blog: Option<BlogRecord>,
    #[serde(default)]
    pub blogs: Option<Vec<BlogRecord>>,
    #[serde(default)]
    pub stats: Option<DashboardStats>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Read side used by the listing, search and detail views.
#[async_trait]
pub trait BlogSource: Send + Sync {
    async fn list_blogs(&self) -> Result<Vec<BlogRecord>, Error>;
    async fn blogs_by_category(&self, category_slug: &str) -> Result<Vec<BlogRecord>, Error>;
    async fn search_blogs(&self, query: &str) -> Result<Vec<BlogRecord>, Error>;
    async fn blog_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, Error>;
}

/// Checks a session token against the server.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<(), Error>;
}

/// Write side used by the record editor.
#[async_trait]
pub trait BlogWriter: Send + Sync {
    async fn create_blog(&self, token: &str, submission: &Submission) -> Result<Option<BlogRecord>, Error>;
    async fn update_blog(&self, token: &str, id: &str, submission: &Submission) -> Result<Option<BlogRecord>, Error>;
}

/// Builder for configuring an [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl ApiClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            client: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom reqwest Client.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<ApiClient, Error> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Configuration(format!("API base URL must be http(s): {}", self.base_url)));
        }

        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };

        Ok(ApiClient {
            client,
            base_url: self.base_url,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        ApiClientBuilder::new(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_token(req: RequestBuilder, token: &str) -> RequestBuilder {
        req.header("Authorization", format!("Bearer {token}"))
    }

    /// Sends the request and unwraps the envelope. Non-2xx and
    /// `success: false` both become errors carrying the server message.
    async fn send(&self, req: RequestBuilder) -> Result<ApiResponse, Error> {
        let response = req.send().await.map_err(|e| Error::Connection(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Connection(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse>(&body)
                .ok()
                .and_then(|r| r.message);
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ApiResponse = if body.trim().is_empty() {
            ApiResponse::default()
        } else {
            serde_json::from_str(&body).map_err(|e| Error::Deserialization(e.to_string()))?
        };

        if parsed.success == Some(false) {
            return Err(Error::Api {
                message: parsed.message.unwrap_or_else(|| "request rejected".to_string()),
            });
        }

        Ok(parsed)
    }

    async fn get_blogs(&self, req: RequestBuilder) -> Result<Vec<BlogRecord>, Error> {
        Ok(self.send(req).await?.blogs.unwrap_or_default())
    }

    // =========================================================================
    // Public endpoints
    // =========================================================================

    pub async fn list_blogs(&self) -> Result<Vec<BlogRecord>, Error> {
        self.get_blogs(self.client.get(self.url("/api/blogs"))).await
    }

    pub async fn blogs_by_category(&self, category_slug: &str) -> Result<Vec<BlogRecord>, Error> {
        let url = self.url(&format!("/api/blogs/category/{}", encode_segment(category_slug)));
        self.get_blogs(self.client.get(url)).await
    }

    pub async fn search_blogs(&self, query: &str) -> Result<Vec<BlogRecord>, Error> {
        let req = self.client.get(self.url("/api/blogs/search")).query(&[("q", query)]);
        self.get_blogs(req).await
    }

    /// Looks up a record by slug. A 404 is not an error here.
    pub async fn blog_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, Error> {
        let url = self.url(&format!("/api/blogs/slug/{}", encode_segment(slug)));
        match self.send(self.client.get(url)).await {
            Ok(response) => Ok(response.blog),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchanges credentials for a session token.
    pub async fn login(&self, credentials: &Credentials) -> Result<String, Error> {
        let req = self.client.post(self.url("/api/auth/login")).json(credentials);
        let response = self.send(req).await?;
        response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Deserialization("login response carries no token".to_string()))
    }

    pub async fn verify(&self, token: &str) -> Result<(), Error> {
        let req = Self::with_token(self.client.get(self.url("/api/auth/verify")), token);
        let response = self.send(req).await?;
        match response.success {
            Some(true) => Ok(()),
            _ => Err(Error::Api {
                message: response.message.unwrap_or_else(|| "session not verified".to_string()),
            }),
        }
    }

    // =========================================================================
    // Admin endpoints
    // =========================================================================

    pub async fn admin_blogs(&self, token: &str) -> Result<Vec<BlogRecord>, Error> {
        let req = Self::with_token(self.client.get(self.url("/api/admin/blogs")), token);
        self.get_blogs(req).await
    }

    pub async fn admin_blog(&self, token: &str, id: &str) -> Result<BlogRecord, Error> {
        let url = self.url(&format!("/api/admin/blogs/{}", encode_segment(id)));
        let response = self.send(Self::with_token(self.client.get(url), token)).await?;
        response.blog.ok_or_else(|| Error::Http {
            status: 404,
            message: Some(format!("Blog {} not found", id)),
        })
    }

    pub async fn create_blog(&self, token: &str, submission: &Submission) -> Result<Option<BlogRecord>, Error> {
        let form = submission.to_form();
        let req = Self::with_token(self.client.post(self.url("/api/admin/blogs")), token).multipart(form);
        Ok(self.send(req).await?.blog)
    }

    pub async fn update_blog(&self, token: &str, id: &str, submission: &Submission) -> Result<Option<BlogRecord>, Error> {
        let form = submission.to_form();
        let url = self.url(&format!("/api/admin/blogs/{}", encode_segment(id)));
        let req = Self::with_token(self.client.put(url), token).multipart(form);
        Ok(self.send(req).await?.blog)
    }

    /// Deletes a record and returns the server's message, if any.
    pub async fn delete_blog(&self, token: &str, id: &str) -> Result<Option<String>, Error> {
        let url = self.url(&format!("/api/admin/blogs/{}", encode_segment(id)));
        let response = self.send(Self::with_token(self.client.delete(url), token)).await?;
        Ok(response.message)
    }

    pub async fn admin_stats(&self, token: &str) -> Result<DashboardStats, Error> {
        let req = Self::with_token(self.client.get(self.url("/api/admin/stats")), token);
        Ok(self.send(req).await?.stats.unwrap_or_default())
    }
}

#[async_trait]
impl BlogSource for ApiClient {
    async fn list_blogs(&self) -> Result<Vec<BlogRecord>, Error> {
        ApiClient::list_blogs(self).await
    }

    async fn blogs_by_category(&self, category_slug: &str) -> Result<Vec<BlogRecord>, Error> {
        ApiClient::blogs_by_category(self, category_slug).await
    }

    async fn search_blogs(&self, query: &str) -> Result<Vec<BlogRecord>, Error> {
        ApiClient::search_blogs(self, query).await
    }

    async fn blog_by_slug(&self, slug: &str) -> Result<Option<BlogRecord>, Error> {
        ApiClient::blog_by_slug(self, slug).await
    }
}

#[async_trait]
impl SessionVerifier for ApiClient {
    async fn verify(&self, token: &str) -> Result<(), Error> {
        ApiClient::verify(self, token).await
    }
}

#[async_trait]
impl BlogWriter for ApiClient {
    async fn create_blog(&self, token: &str, submission: &Submission) -> Result<Option<BlogRecord>, Error> {
        ApiClient::create_blog(self, token, submission).await
    }

    async fn update_blog(&self, token: &str, id: &str, submission: &Submission) -> Result<Option<BlogRecord>, Error> {
        ApiClient::update_blog(self, token, id, submission).await
    }
}

pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

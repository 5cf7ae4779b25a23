//! Ferry HTTP Client
//!
//! A small HTTP client for the SharePoint site endpoints the copy job watcher
//! needs. Token acquisition is left to the caller: hand an already issued
//! bearer token to [`SiteClient::with_bearer_token`].
//!
//! # Example
//!
//! ```no_run
//! use ferry_client::{SiteClient, StatusSource};
//! use ferry_core::domain::JobDescriptor;
//!
//! # async fn example(descriptor: JobDescriptor) -> ferry_client::Result<()> {
//! let client = SiteClient::new().with_bearer_token("eyJ0eXAi...");
//! let body = client
//!     .copy_job_progress("https://contoso.sharepoint.com/sites/marketing", &descriptor)
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

pub mod error;
mod progress;

pub use error::{ClientError, Result};
pub use progress::{COPY_JOB_PROGRESS_PATH, StatusSource, progress_url};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// `accept` header value for SharePoint's metadata-free JSON responses
pub const ODATA_NOMETADATA: &str = "application/json;odata=nometadata";

/// HTTP client for SharePoint site REST endpoints
#[derive(Debug, Clone)]
pub struct SiteClient {
    /// HTTP client instance, owns the connection pool
    client: Client,
    /// Bearer token sent with every request, if any
    bearer_token: Option<String>,
}

impl SiteClient {
    /// Create a new site client with a default HTTP client
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new site client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use ferry_client::SiteClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = SiteClient::with_client(http_client);
    /// ```
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            bearer_token: None,
        }
    }

    /// Attach a bearer token to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.bearer_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn has_bearer_token(&self) -> bool {
        self.bearer_token.is_some()
    }

    /// Builds a POST request with the headers every site call needs
    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, ODATA_NOMETADATA);

        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error::odata_error_message(&error_text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl Default for SiteClient {
    fn default() -> Self {
        Self::new()
    }
}

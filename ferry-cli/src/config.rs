//! Configuration module
//!
//! Settings shared by every command: credentials and output verbosity.

use anyhow::{Context, Result};
use ferry_client::SiteClient;
use std::time::Duration;

/// Seconds allowed to establish a connection to the site
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// CLI configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Bearer token sent to the site, if any
    pub access_token: Option<String>,

    pub verbose: bool,

    pub debug: bool,
}

impl Config {
    /// Default tracing filter for the chosen verbosity
    /// `ferry` prefixes every workspace crate target, so one directive covers them all
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "ferry=debug"
        } else if self.verbose {
            "ferry=info"
        } else {
            "ferry=warn"
        }
    }

    /// Builds the site client used for status checks
    pub fn client(&self) -> Result<SiteClient> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let client = SiteClient::with_client(http);

        Ok(match &self.access_token {
            Some(token) => client.with_bearer_token(token.clone()),
            None => client,
        })
    }
}

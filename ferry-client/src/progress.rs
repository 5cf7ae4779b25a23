//! Copy job progress endpoint

use async_trait::async_trait;
use ferry_core::domain::JobDescriptor;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::SiteClient;
use crate::error::{ClientError, Result};

/// Path of the status-check endpoint, relative to the site URL
pub const COPY_JOB_PROGRESS_PATH: &str = "/_api/site/GetCopyJobProgress";

/// Source of copy job status reports
///
/// This is the seam between the watcher and the network. The watcher only
/// needs the raw JSON body; decoding and classification happen on its side.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Asks the server for the current progress of a submitted job
    ///
    /// # Arguments
    /// * `site_url` - The site the job was submitted against
    /// * `descriptor` - The job descriptor, sent back verbatim
    async fn copy_job_progress(&self, site_url: &str, descriptor: &JobDescriptor) -> Result<Value>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CopyJobProgressRequest<'a> {
    copy_job_info: &'a JobDescriptor,
}

/// Builds the status-check URL for a site
pub fn progress_url(site_url: &str) -> Result<String> {
    let site_url = site_url.trim_end_matches('/');

    if !site_url.starts_with("http://") && !site_url.starts_with("https://") {
        return Err(ClientError::InvalidRequest(format!(
            "site URL must start with http:// or https://, got '{}'",
            site_url
        )));
    }

    Ok(format!("{}{}", site_url, COPY_JOB_PROGRESS_PATH))
}

#[async_trait]
impl StatusSource for SiteClient {
    async fn copy_job_progress(&self, site_url: &str, descriptor: &JobDescriptor) -> Result<Value> {
        let url = progress_url(site_url)?;

        debug!("Checking copy job progress at {}", url);

        let response = self
            .post(&url)
            .json(&CopyJobProgressRequest {
                copy_job_info: descriptor,
            })
            .send()
            .await?;

        self.handle_response(response).await
    }
}

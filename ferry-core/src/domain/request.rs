//! Poll request
//!
//! Everything one wait operation needs to address a submitted job.

use std::time::Duration;
use thiserror::Error;

use super::descriptor::JobDescriptor;

/// Reasons a poll request cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Polling interval must be a positive number of seconds, got {0}")]
    InvalidInterval(i64),

    #[error("Site URL cannot be empty")]
    MissingSiteUrl,

    #[error("Site URL must start with http:// or https://, got '{0}'")]
    InvalidSiteUrl(String),

    #[error("Job descriptor cannot be empty")]
    EmptyDescriptor,
}

/// A request to wait for one copy job
#[derive(Debug, Clone, PartialEq)]
pub struct PollRequest {
    /// Site the job was submitted against, without a trailing slash
    pub site_url: String,
    pub descriptor: JobDescriptor,
    pub polling_interval_seconds: i64,
}

impl PollRequest {
    pub fn new(
        site_url: impl Into<String>,
        descriptor: JobDescriptor,
        polling_interval_seconds: i64,
    ) -> Self {
        let site_url = site_url.into();
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
            descriptor,
            polling_interval_seconds,
        }
    }

    /// Checks the request and returns the polling interval
    pub fn validate(&self) -> Result<Duration, RequestError> {
        if self.polling_interval_seconds <= 0 {
            return Err(RequestError::InvalidInterval(self.polling_interval_seconds));
        }

        if self.site_url.is_empty() {
            return Err(RequestError::MissingSiteUrl);
        }

        if !self.site_url.starts_with("http://") && !self.site_url.starts_with("https://") {
            return Err(RequestError::InvalidSiteUrl(self.site_url.clone()));
        }

        if self.descriptor.is_empty() {
            return Err(RequestError::EmptyDescriptor);
        }

        Ok(Duration::from_secs(self.polling_interval_seconds as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> JobDescriptor {
        JobDescriptor::from_value(json!({ "JobId": "job" })).unwrap()
    }

    #[test]
    fn test_request_trims_trailing_slash() {
        let request = PollRequest::new("https://contoso.sharepoint.com/sites/a/", descriptor(), 5);
        assert_eq!(request.site_url, "https://contoso.sharepoint.com/sites/a");
        assert_eq!(request.validate(), Ok(Duration::from_secs(5)));
    }

    #[test]
    fn test_request_rejects_non_positive_interval() {
        for interval in [0, -1, i64::MIN] {
            let request = PollRequest::new("https://contoso.sharepoint.com", descriptor(), interval);
            assert_eq!(
                request.validate(),
                Err(RequestError::InvalidInterval(interval))
            );
        }
    }

    #[test]
    fn test_request_rejects_bad_site_url() {
        let request = PollRequest::new("", descriptor(), 5);
        assert_eq!(request.validate(), Err(RequestError::MissingSiteUrl));

        let request = PollRequest::new("contoso.sharepoint.com", descriptor(), 5);
        assert!(matches!(
            request.validate(),
            Err(RequestError::InvalidSiteUrl(_))
        ));
    }

    #[test]
    fn test_request_rejects_empty_descriptor() {
        let empty = JobDescriptor::from(serde_json::Map::new());
        let request = PollRequest::new("https://contoso.sharepoint.com", empty, 5);
        assert_eq!(request.validate(), Err(RequestError::EmptyDescriptor));
    }
}

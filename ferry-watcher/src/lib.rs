//! Ferry Watcher
//!
//! Waits for server-side copy jobs to finish.
//!
//! A copy request returns immediately with a job descriptor while the data
//! moves in the background. [`JobWatcher`] polls the job's status endpoint
//! at a fixed interval until the job succeeds or fails, and resolves the
//! wait exactly once.
//!
//! # Example
//!
//! ```no_run
//! use ferry_client::SiteClient;
//! use ferry_core::domain::{JobDescriptor, PollRequest};
//! use ferry_watcher::{ConsoleSink, JobWatcher, WaitOptions};
//! use std::sync::Arc;
//!
//! # async fn example(descriptor: JobDescriptor) -> Result<(), ferry_watcher::WaitFailure> {
//! let watcher = JobWatcher::new(Arc::new(SiteClient::new().with_bearer_token("eyJ0eXAi...")));
//! let request = PollRequest::new("https://contoso.sharepoint.com/sites/marketing", descriptor, 5);
//!
//! watcher
//!     .wait(&request, &mut ConsoleSink::stdio(), &WaitOptions::new().with_progress(true))
//!     .await
//! # }
//! ```

pub mod error;
pub mod options;
pub mod poller;
pub mod sink;

pub use error::{FailureKind, MALFORMED_RESPONSE, WaitFailure};
pub use options::WaitOptions;
pub use poller::{JobWatcher, WatchState};
pub use sink::{ConsoleSink, NoopSink, ProgressSink, RecordingSink, SinkEvent};

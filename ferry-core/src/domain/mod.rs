//! Core domain types
//!
//! This module contains the structures exchanged with the copy job endpoints.
//! The watcher owns a `PollRequest` for the lifetime of one wait and receives
//! a fresh `ProgressReport` on every status check.

pub mod descriptor;
pub mod progress;
pub mod request;

pub use descriptor::{DescriptorError, JobDescriptor};
pub use progress::{DecodeError, LogEvent, ProgressReport};
pub use request::{PollRequest, RequestError};

//! Ferry Core
//!
//! Core types and abstractions for watching SharePoint copy jobs.
//!
//! This crate contains:
//! - Domain types: job descriptors, poll requests and progress reports
//! - Classification: the pure decision of whether a job is running, done or failed

pub mod classify;
pub mod domain;

pub use classify::{
    AllObjectsProcessed, AnyCompletion, Classification, CompletionPredicate, DefaultCompletion,
    JobEnded, JobStateIdle, UNKNOWN_COPY_ERROR, classify,
};

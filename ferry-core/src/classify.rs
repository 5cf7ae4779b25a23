//! Response classification
//!
//! Turns one `ProgressReport` into a decision: keep polling, succeeded or
//! failed. Classification is a pure function of the report and the
//! completion predicate, so the same input always yields the same answer.

use crate::domain::progress::ProgressReport;

/// Message used when a failed job does not say why
pub const UNKNOWN_COPY_ERROR: &str = "An unknown error occurred while copying the item";

/// Outcome of classifying one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Running,
    Succeeded,
    Failed {
        message: String,
        code: Option<String>,
    },
}

impl Classification {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Classification::Running)
    }
}

/// Decides whether an error-free report means the job is finished
///
/// The service does not document a single authoritative completion signal,
/// so the check is pluggable. Closures taking a `&ProgressReport` work too.
pub trait CompletionPredicate: Send + Sync {
    fn is_complete(&self, report: &ProgressReport) -> bool;
}

impl<F> CompletionPredicate for F
where
    F: Fn(&ProgressReport) -> bool + Send + Sync,
{
    fn is_complete(&self, report: &ProgressReport) -> bool {
        self(report)
    }
}

/// Complete once `JobState` drops to `0`
#[derive(Debug, Clone, Copy, Default)]
pub struct JobStateIdle;

impl CompletionPredicate for JobStateIdle {
    fn is_complete(&self, report: &ProgressReport) -> bool {
        report.job_state == Some(0)
    }
}

/// Complete once the log contains a `JobEnd` event
#[derive(Debug, Clone, Copy, Default)]
pub struct JobEnded;

impl CompletionPredicate for JobEnded {
    fn is_complete(&self, report: &ProgressReport) -> bool {
        report.logs.iter().any(|event| event.is_end())
    }
}

/// Complete once every expected object has been processed
#[derive(Debug, Clone, Copy, Default)]
pub struct AllObjectsProcessed;

impl CompletionPredicate for AllObjectsProcessed {
    fn is_complete(&self, report: &ProgressReport) -> bool {
        report
            .latest_counts()
            .is_some_and(|(processed, total)| total > 0 && processed >= total)
    }
}

/// Complete as soon as any one of `JobStateIdle`, `JobEnded` or
/// `AllObjectsProcessed` says so
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyCompletion;

impl CompletionPredicate for AnyCompletion {
    fn is_complete(&self, report: &ProgressReport) -> bool {
        JobStateIdle.is_complete(report)
            || JobEnded.is_complete(report)
            || AllObjectsProcessed.is_complete(report)
    }
}

/// Trusts `JobState` when the server sends one, otherwise falls back to the
/// `JobEnd` event or the object counts
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCompletion;

impl CompletionPredicate for DefaultCompletion {
    fn is_complete(&self, report: &ProgressReport) -> bool {
        match report.job_state {
            Some(_) => JobStateIdle.is_complete(report),
            None => JobEnded.is_complete(report) || AllObjectsProcessed.is_complete(report),
        }
    }
}

/// Classifies a report
///
/// An error entry anywhere in the log fails the job, using the first one in
/// log order. Without errors the completion predicate decides between
/// `Succeeded` and `Running`.
pub fn classify(report: &ProgressReport, completion: &dyn CompletionPredicate) -> Classification {
    if let Some(entry) = report.logs.iter().find(|event| event.is_error()) {
        return Classification::Failed {
            message: entry
                .failure_message()
                .unwrap_or(UNKNOWN_COPY_ERROR)
                .to_string(),
            code: entry.error_code.clone().or_else(|| report.error_code.clone()),
        };
    }

    if completion.is_complete(report) {
        Classification::Succeeded
    } else {
        Classification::Running
    }
}

//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod inspect;
mod wait;

pub use inspect::InspectArgs;
pub use wait::WaitArgs;

use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use ferry_core::classify::{
    AllObjectsProcessed, AnyCompletion, CompletionPredicate, DefaultCompletion, JobEnded,
    JobStateIdle,
};
use std::sync::Arc;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Wait for a submitted copy job to finish
    Wait(WaitArgs),
    /// Classify a saved copy job progress response
    Inspect(InspectArgs),
}

/// How an error-free progress report is judged finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Completion {
    /// JobState when present, otherwise a JobEnd event or matching object counts
    Default,
    /// Any of JobState 0, a JobEnd event or matching object counts
    Any,
    /// JobState is 0
    JobState,
    /// The log contains a JobEnd event
    JobEnd,
    /// Every expected object has been processed
    Objects,
}

impl Completion {
    pub fn predicate(self) -> Arc<dyn CompletionPredicate> {
        match self {
            Completion::Default => Arc::new(DefaultCompletion),
            Completion::Any => Arc::new(AnyCompletion),
            Completion::JobState => Arc::new(JobStateIdle),
            Completion::JobEnd => Arc::new(JobEnded),
            Completion::Objects => Arc::new(AllObjectsProcessed),
        }
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Wait(args) => wait::handle_wait_command(args, config).await,
        Commands::Inspect(args) => inspect::handle_inspect_command(args, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::domain::ProgressReport;
    use serde_json::json;

    #[test]
    fn test_completion_predicates() {
        let report = ProgressReport::latest(&json!({
            "JobState": 4,
            "Logs": ["{\"Event\":\"JobEnd\",\"TotalExpectedSPObjects\":2,\"ObjectsProcessed\":2}"]
        }))
        .unwrap();

        assert!(!Completion::Default.predicate().is_complete(&report));
        assert!(Completion::Any.predicate().is_complete(&report));
        assert!(!Completion::JobState.predicate().is_complete(&report));
        assert!(Completion::JobEnd.predicate().is_complete(&report));
        assert!(Completion::Objects.predicate().is_complete(&report));
    }

    #[test]
    fn test_completion_value_names() {
        assert_eq!(
            Completion::from_str("job-state", false).unwrap(),
            Completion::JobState
        );
        assert_eq!(Completion::from_str("any", false).unwrap(), Completion::Any);
        assert_eq!(
            Completion::from_str("objects", false).unwrap(),
            Completion::Objects
        );
    }
}

//! Inspect command handler
//!
//! Decodes and classifies a saved `GetCopyJobProgress` response without
//! talking to any server. Handy for checking why a wait ended the way it did.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use ferry_core::classify::{Classification, classify};
use ferry_core::domain::{LogEvent, ProgressReport};

use super::Completion;
use crate::config::Config;
use crate::input::read_json;

/// Arguments of `ferry inspect`
#[derive(Args)]
pub struct InspectArgs {
    /// File holding a progress response, `-` for stdin
    #[arg(short, long, default_value = "-")]
    file: String,

    /// How to decide that an error-free job is finished
    #[arg(long, value_enum, default_value = "default")]
    completion: Completion,
}

/// Handle `ferry inspect`
pub async fn handle_inspect_command(args: InspectArgs, config: &Config) -> Result<()> {
    let body = read_json(&args.file)?;

    if config.verbose || config.debug {
        println!("{}", serde_json::to_string_pretty(&body)?);
        println!();
    }

    let report = ProgressReport::latest(&body).context("not a copy job progress response")?;
    let classification = classify(&report, args.completion.predicate().as_ref());

    print_report(&report);
    println!();
    print_classification(&classification);

    Ok(())
}

/// Print the job state and its log
fn print_report(report: &ProgressReport) {
    let state = report
        .job_state
        .map(|state| state.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("{}", "Progress Report:".bold());
    println!("  Job State: {}", state);

    if let Some((processed, total)) = report.latest_counts() {
        println!("  Objects:   {}/{}", processed, total);
    }

    if report.logs.is_empty() {
        println!("  {}", "No log entries.".dimmed());
        return;
    }

    println!("\n{}", "Log:".bold());
    for event in &report.logs {
        print_log_event(event);
    }
}

/// Print a log event
fn print_log_event(event: &LogEvent) {
    let tag = if event.is_error() {
        event.event.red()
    } else if event.is_warning() {
        event.event.yellow()
    } else if event.is_end() {
        event.event.green()
    } else {
        event.event.cyan()
    };

    println!(
        "  {} [{}] {}",
        event.time.as_deref().unwrap_or("-").dimmed(),
        tag,
        event.message.as_deref().unwrap_or("")
    );
}

/// Print the classification outcome
fn print_classification(classification: &Classification) {
    match classification {
        Classification::Running => println!("Result: {}", "Running".cyan()),
        Classification::Succeeded => println!("Result: {}", "Succeeded".green()),
        Classification::Failed { message, code } => {
            println!("Result: {}", "Failed".red());
            println!("  Message: {}", message.red());
            if let Some(code) = code {
                println!("  Code:    {}", code);
            }
        }
    }
}

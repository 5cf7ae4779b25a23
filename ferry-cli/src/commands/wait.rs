//! Wait command handler
//!
//! Polls a submitted copy job until it finishes, fails, times out or the
//! operator hits Ctrl-C.

use anyhow::{Result, anyhow};
use clap::Args;
use ferry_core::domain::PollRequest;
use ferry_watcher::{ConsoleSink, JobWatcher, WaitOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Completion;
use crate::config::Config;
use crate::input::read_descriptor;

/// Arguments of `ferry wait`
#[derive(Args)]
pub struct WaitArgs {
    /// Site the copy job was submitted against
    #[arg(short = 'u', long, env = "FERRY_SITE_URL")]
    site_url: String,

    /// File holding the job descriptor (or the CreateCopyJobs response), `-` for stdin
    #[arg(short, long, default_value = "-")]
    job_info: String,

    /// Seconds between status checks
    #[arg(
        short,
        long,
        env = "FERRY_POLL_INTERVAL",
        default_value_t = 5,
        allow_negative_numbers = true
    )]
    interval: i64,

    /// Give up after this many seconds
    #[arg(long, env = "FERRY_TIMEOUT")]
    timeout: Option<u64>,

    /// Print a marker per status check while the job is running
    #[arg(short, long)]
    progress: bool,

    /// How to decide that an error-free job is finished
    #[arg(long, value_enum, default_value = "default")]
    completion: Completion,
}

impl WaitArgs {
    fn options(&self, config: &Config) -> WaitOptions {
        let options = WaitOptions::new()
            .with_progress(self.progress)
            .with_verbose(config.verbose)
            .with_debug(config.debug);

        match self.timeout {
            Some(seconds) => options.with_timeout(Duration::from_secs(seconds)),
            None => options,
        }
    }
}

/// Handle `ferry wait`
pub async fn handle_wait_command(args: WaitArgs, config: &Config) -> Result<()> {
    let descriptor = read_descriptor(&args.job_info)?;
    let options = args.options(config);
    let watcher =
        JobWatcher::new(Arc::new(config.client()?)).with_completion(args.completion.predicate());
    let request = PollRequest::new(args.site_url, descriptor, args.interval);

    let token = CancellationToken::new();
    let interrupted = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received");
            interrupted.cancel();
        }
    });

    let mut sink = ConsoleSink::stdio();
    let outcome = watcher
        .wait_with_cancel(&request, &mut sink, &options, token)
        .await;

    outcome.map_err(|failure| match failure.code() {
        Some(code) => anyhow!("{} (code {})", failure.message(), code),
        None => anyhow!("{}", failure.message()),
    })
}

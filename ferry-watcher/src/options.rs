//! Wait options
//!
//! Per-wait output and deadline settings. The polling interval itself lives
//! on the `PollRequest`.

use std::time::Duration;

use crate::error::{FailureKind, WaitFailure};

/// Marker written once per unfinished poll in progress mode
pub const DEFAULT_PROGRESS_MARKER: char = '.';

/// Options for a single wait operation
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOptions {
    /// Write a marker per unfinished poll and a newline at the end
    pub progress: bool,

    /// Dump every raw status response to the diagnostic stream
    pub verbose: bool,

    /// Same dump as `verbose`, for callers that only expose a debug switch
    pub debug: bool,

    pub progress_marker: char,

    /// Give up after this long; `None` waits until the job finishes
    pub timeout: Option<Duration>,
}

impl WaitOptions {
    pub fn new() -> Self {
        Self {
            progress: false,
            verbose: false,
            debug: false,
            progress_marker: DEFAULT_PROGRESS_MARKER,
            timeout: None,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_marker(mut self, marker: char) -> Self {
        self.progress_marker = marker;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn dumps_responses(&self) -> bool {
        self.verbose || self.debug
    }

    /// Validates the options
    pub fn validate(&self) -> Result<(), WaitFailure> {
        if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(WaitFailure::new(
                FailureKind::Configuration,
                "Timeout must be greater than 0",
            ));
        }

        if self.progress_marker.is_control() {
            return Err(WaitFailure::new(
                FailureKind::Configuration,
                "Progress marker must be a printable character",
            ));
        }

        Ok(())
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new()
    }
}

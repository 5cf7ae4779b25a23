//! Copy job poller
//!
//! Drives one submitted copy job from "in progress" to a terminal outcome.
//! Each wait is a single task: it sleeps for the polling interval, checks the
//! job status, classifies the latest report and either finishes or re-arms
//! its timer for exactly one more interval. Polls never overlap.

use ferry_client::StatusSource;
use ferry_core::classify::{Classification, CompletionPredicate, DefaultCompletion, classify};
use ferry_core::domain::{PollRequest, ProgressReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::WaitFailure;
use crate::options::WaitOptions;
use crate::sink::ProgressSink;

/// Where a wait currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Waiting for the interval to elapse
    Scheduled,
    /// Status check in flight
    Polling,
    /// Latest report says the job is still going
    Running,
    Succeeded,
    Failed,
}

impl WatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, WatchState::Succeeded | WatchState::Failed)
    }
}

/// Waits for copy jobs to finish
///
/// A watcher is cheap to share: concurrent waits only have the status source
/// (and its connection pool) in common.
#[derive(Clone)]
pub struct JobWatcher {
    source: Arc<dyn StatusSource>,
    completion: Arc<dyn CompletionPredicate>,
}

impl JobWatcher {
    /// Creates a watcher using the default completion check
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self {
            source,
            completion: Arc::new(DefaultCompletion),
        }
    }

    /// Replaces the completion check
    pub fn with_completion(mut self, completion: Arc<dyn CompletionPredicate>) -> Self {
        self.completion = completion;
        self
    }

    /// Waits until the job succeeds or fails
    ///
    /// Resolves exactly once. Without a timeout in `options` this waits for
    /// as long as the server keeps reporting the job as running.
    pub async fn wait(
        &self,
        request: &PollRequest,
        sink: &mut dyn ProgressSink,
        options: &WaitOptions,
    ) -> Result<(), WaitFailure> {
        self.wait_with_cancel(request, sink, options, CancellationToken::new())
            .await
    }

    /// Same as [`wait`](Self::wait), abandoned when `token` is cancelled
    ///
    /// Abandoning drops the in-flight status check, which aborts its request.
    pub async fn wait_with_cancel(
        &self,
        request: &PollRequest,
        sink: &mut dyn ProgressSink,
        options: &WaitOptions,
        token: CancellationToken,
    ) -> Result<(), WaitFailure> {
        let interval = request.validate().map_err(WaitFailure::configuration)?;
        options.validate()?;

        let job = request
            .descriptor
            .job_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        info!(
            "Waiting for copy job {} on {} (interval: {:?})",
            job, request.site_url, interval
        );

        let outcome = tokio::select! {
            outcome = self.poll_until_terminal(request, interval, sink, options, &job) => outcome,
            _ = token.cancelled() => {
                debug!("Wait for copy job {} cancelled", job);
                Err(WaitFailure::cancelled())
            }
            _ = expire(options.timeout) => {
                debug!("Wait for copy job {} timed out", job);
                Err(WaitFailure::timed_out(options.timeout.unwrap_or_default()))
            }
        };

        if options.progress {
            sink.write_line("");
        }

        match &outcome {
            Ok(()) => info!("Copy job {} finished", job),
            Err(failure) => info!("Copy job {} failed: {}", job, failure),
        }

        outcome
    }

    /// The polling loop proper
    async fn poll_until_terminal(
        &self,
        request: &PollRequest,
        interval: Duration,
        sink: &mut dyn ProgressSink,
        options: &WaitOptions,
        job: &str,
    ) -> Result<(), WaitFailure> {
        let mut state = WatchState::Scheduled;
        let mut attempt: u64 = 0;

        // The first check is not immediate: the server needs time before a
        // status is meaningful
        let timer = time::sleep(interval);
        tokio::pin!(timer);

        loop {
            timer.as_mut().await;
            attempt += 1;
            transition(&mut state, WatchState::Polling, job, attempt);

            let body = match self
                .source
                .copy_job_progress(&request.site_url, &request.descriptor)
                .await
            {
                Ok(body) => body,
                Err(e) => {
                    warn!("Status check for copy job {} failed: {}", job, e);
                    transition(&mut state, WatchState::Failed, job, attempt);
                    return Err(WaitFailure::transport(&e));
                }
            };

            if options.dumps_responses() {
                sink.write_verbose(&body);
            }

            let report = match ProgressReport::latest(&body) {
                Ok(report) => report,
                Err(e) => {
                    debug!(
                        "Unexpected progress response for copy job {}: {} ({})",
                        job, e, body
                    );
                    transition(&mut state, WatchState::Failed, job, attempt);
                    return Err(WaitFailure::malformed());
                }
            };

            for warning in report.warnings() {
                warn!(
                    "Copy job {} reported a warning: {}",
                    job,
                    warning.message.as_deref().unwrap_or("(no message)")
                );
            }

            match classify(&report, self.completion.as_ref()) {
                Classification::Running => {
                    transition(&mut state, WatchState::Running, job, attempt);
                    if options.progress {
                        sink.write_progress(options.progress_marker);
                    }
                    timer.as_mut().reset(next_tick(interval));
                    transition(&mut state, WatchState::Scheduled, job, attempt);
                }
                Classification::Succeeded => {
                    transition(&mut state, WatchState::Succeeded, job, attempt);
                    return Ok(());
                }
                Classification::Failed { message, code } => {
                    transition(&mut state, WatchState::Failed, job, attempt);
                    return Err(WaitFailure::job_reported(message, code));
                }
            }
        }
    }
}

fn transition(state: &mut WatchState, next: WatchState, job: &str, attempt: u64) {
    debug_assert!(!state.is_terminal(), "no transition leaves a terminal state");
    debug!(
        "Copy job {} poll #{}: {:?} -> {:?}",
        job, attempt, *state, next
    );
    *state = next;
}

/// Deadline one interval from now, clamped for intervals that overflow `Instant`
fn next_tick(interval: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(interval)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

/// Resolves when the optional deadline passes, never without one
async fn expire(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FailureKind, MALFORMED_RESPONSE};
    use crate::sink::{RecordingSink, SinkEvent};
    use async_trait::async_trait;
    use ferry_client::ClientError;
    use ferry_core::classify::{JobEnded, UNKNOWN_COPY_ERROR};
    use ferry_core::domain::JobDescriptor;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    const INTERVAL: i64 = 5;

    /// Answers status checks from a script, then reports "still running"
    #[derive(Default)]
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Value, ClientError>>>,
        calls: Mutex<Vec<(Instant, JobDescriptor)>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<Value, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
        }

        fn remaining(&self) -> usize {
            self.replies.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn copy_job_progress(
            &self,
            _site_url: &str,
            descriptor: &JobDescriptor,
        ) -> ferry_client::Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), descriptor.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(running()))
        }
    }

    /// Never answers; flags when the pending call is dropped
    #[derive(Default)]
    struct HangingSource {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl StatusSource for HangingSource {
        async fn copy_job_progress(
            &self,
            _site_url: &str,
            _descriptor: &JobDescriptor,
        ) -> ferry_client::Result<Value> {
            let _flag = DropFlag(Arc::clone(&self.dropped));
            std::future::pending::<()>().await;
            Ok(running())
        }
    }

    fn running() -> Value {
        json!({
            "JobState": 4,
            "Logs": ["{\"Event\":\"JobProgress\",\"TotalExpectedSPObjects\":10,\"ObjectsProcessed\":3}"]
        })
    }

    fn finished() -> Value {
        json!({
            "JobState": 0,
            "Logs": ["{\"Event\":\"JobEnd\",\"TotalExpectedSPObjects\":10,\"ObjectsProcessed\":10}"]
        })
    }

    fn failed(message: Option<&str>) -> Value {
        let entry = match message {
            Some(message) => json!({ "Event": "JobError", "Message": message }).to_string(),
            None => json!({ "Event": "JobError" }).to_string(),
        };
        json!({ "JobState": 0, "Logs": [entry] })
    }

    fn request(interval: i64) -> PollRequest {
        let descriptor = JobDescriptor::from_value(json!({
            "JobId": "6c1c3a3e-9a4e-4f0e-8b1c-4d1f2e3a4b5c",
            "JobQueueUri": "https://queue.example/copy?sig=abc",
            "EncryptionKey": "2by8+2oizihYOFqk02Tlokj8lWUShePAEE+WMuA9lzA=",
            "SourceListItemUniqueIds": ["a1b2"]
        }))
        .unwrap();

        PollRequest::new("https://contoso.sharepoint.com/sites/marketing", descriptor, interval)
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_interval_fails_without_polling() {
        for interval in [0, -30] {
            let source = ScriptedSource::new(vec![Ok(finished())]);
            let watcher = JobWatcher::new(source.clone());
            let mut sink = RecordingSink::new();

            let failure = watcher
                .wait(&request(interval), &mut sink, &WaitOptions::new().with_progress(true))
                .await
                .unwrap_err();

            assert_eq!(failure.kind(), FailureKind::Configuration);
            assert_eq!(source.call_count(), 0);
            assert!(sink.events.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_once_per_interval() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(running()), Ok(finished())]);
        let watcher = JobWatcher::new(source.clone());
        let start = Instant::now();

        watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap();

        let interval = Duration::from_secs(INTERVAL as u64);
        assert_eq!(
            source.call_times(),
            vec![start + interval, start + interval * 2, start + interval * 3]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_polling() {
        let source = ScriptedSource::new(vec![Ok(finished()), Ok(running())]);
        let watcher = JobWatcher::new(source.clone());

        let outcome = watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await;

        assert!(outcome.is_ok());
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_keeps_polling() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(finished())]);
        let watcher = JobWatcher::new(source.clone());

        let outcome = watcher
            .wait(&request(i64::MAX), &mut RecordingSink::new(), &WaitOptions::new())
            .await;

        assert!(outcome.is_ok());
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_error_message_is_surfaced() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(failed(Some("Quota exceeded")))]);
        let watcher = JobWatcher::new(source.clone());

        let failure = watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::JobReported);
        assert_eq!(failure.message(), "Quota exceeded");
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_error_without_message_uses_fallback() {
        let source = ScriptedSource::new(vec![Ok(failed(None))]);
        let watcher = JobWatcher::new(source.clone());

        let failure = watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap_err();

        assert_eq!(failure.message(), UNKNOWN_COPY_ERROR);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_markers_then_one_newline() {
        let source = ScriptedSource::new(vec![
            Ok(running()),
            Ok(running()),
            Ok(running()),
            Ok(finished()),
        ]);
        let watcher = JobWatcher::new(source.clone());
        let mut sink = RecordingSink::new();

        watcher
            .wait(&request(INTERVAL), &mut sink, &WaitOptions::new().with_progress(true))
            .await
            .unwrap();

        assert_eq!(
            sink.events,
            vec![
                SinkEvent::Progress('.'),
                SinkEvent::Progress('.'),
                SinkEvent::Progress('.'),
                SinkEvent::Line(String::new()),
            ]
        );
        assert_eq!(sink.progress_count(), 3);
        assert_eq!(sink.line_count(), 1);
        assert_eq!(sink.rendered(), "...\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_output_without_progress_mode() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(running()), Ok(finished())]);
        let watcher = JobWatcher::new(source.clone());
        let mut sink = RecordingSink::new();

        watcher
            .wait(&request(INTERVAL), &mut sink, &WaitOptions::new())
            .await
            .unwrap();

        assert!(sink.events.is_empty());
        assert_eq!(sink.progress_count(), 0);
        assert_eq!(sink.line_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_marker_and_newline_on_failure() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(failed(Some("Access denied")))]);
        let watcher = JobWatcher::new(source.clone());
        let mut sink = RecordingSink::new();
        let options = WaitOptions::new().with_progress(true).with_marker('#');

        let failure = watcher
            .wait(&request(INTERVAL), &mut sink, &options)
            .await
            .unwrap_err();

        assert_eq!(failure.message(), "Access denied");
        assert_eq!(sink.rendered(), "#\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_verbose_dumps_every_response_before_marker() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(finished())]);
        let watcher = JobWatcher::new(source.clone());
        let mut sink = RecordingSink::new();
        let options = WaitOptions::new().with_progress(true).with_verbose(true);

        watcher
            .wait(&request(INTERVAL), &mut sink, &options)
            .await
            .unwrap();

        assert_eq!(
            sink.events,
            vec![
                SinkEvent::Verbose(running()),
                SinkEvent::Progress('.'),
                SinkEvent::Verbose(finished()),
                SinkEvent::Line(String::new()),
            ]
        );
        assert_eq!(sink.verbose_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_fails_immediately() {
        let source = ScriptedSource::new(vec![
            Ok(running()),
            Err(ClientError::api_error(503, "Service Unavailable")),
            Ok(finished()),
        ]);
        let watcher = JobWatcher::new(source.clone());
        let mut sink = RecordingSink::new();

        let failure = watcher
            .wait(&request(INTERVAL), &mut sink, &WaitOptions::new().with_progress(true))
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::Transport);
        assert!(failure.message().contains("Failed to check copy job progress"));
        assert!(failure.message().contains("Service Unavailable"));
        assert_eq!(failure.code(), Some("503"));
        assert_eq!(source.call_count(), 2);
        assert_eq!(source.remaining(), 1);
        assert_eq!(sink.rendered(), ".\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_fails_with_generic_message() {
        let source = ScriptedSource::new(vec![Ok(json!({ "unexpected": true }))]);
        let watcher = JobWatcher::new(source.clone());

        let failure = watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::MalformedResponse);
        assert_eq!(failure.message(), MALFORMED_RESPONSE);

        let source = ScriptedSource::new(vec![Ok(json!([]))]);
        let failure = JobWatcher::new(source)
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::MalformedResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn test_descriptor_is_echoed_verbatim() {
        let source = ScriptedSource::new(vec![Ok(running()), Ok(finished())]);
        let watcher = JobWatcher::new(source.clone());
        let request = request(INTERVAL);

        watcher
            .wait(&request, &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap();

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, sent)| *sent == request.descriptor));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_abandons_polling() {
        let source = ScriptedSource::new(vec![]);
        let watcher = JobWatcher::new(source.clone());
        let mut sink = RecordingSink::new();
        let options = WaitOptions::new()
            .with_progress(true)
            .with_timeout(Duration::from_secs(12));

        let failure = watcher
            .wait(&request(INTERVAL), &mut sink, &options)
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::TimedOut);
        assert_eq!(
            failure.message(),
            "Timed out after 12s waiting for the copy job to finish"
        );
        assert_eq!(source.call_count(), 2);
        assert_eq!(sink.rendered(), "..\n");

        // Nothing keeps polling after the wait resolved
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels_in_flight_check() {
        let source = Arc::new(HangingSource::default());
        let watcher = JobWatcher::new(source.clone());
        let options = WaitOptions::new().with_timeout(Duration::from_secs(30));

        let failure = watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &options)
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::TimedOut);
        assert!(source.dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_token() {
        let source = ScriptedSource::new(vec![]);
        let watcher = JobWatcher::new(source.clone());
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(7)).await;
            canceller.cancel();
        });

        let failure = watcher
            .wait_with_cancel(
                &request(INTERVAL),
                &mut RecordingSink::new(),
                &WaitOptions::new(),
                token,
            )
            .await
            .unwrap_err();

        assert_eq!(failure.kind(), FailureKind::Cancelled);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_completion_predicate() {
        let ended = json!({
            "JobState": 4,
            "Logs": ["{\"Event\":\"JobEnd\"}"]
        });
        let source = ScriptedSource::new(vec![Ok(running()), Ok(ended)]);
        let watcher = JobWatcher::new(source.clone()).with_completion(Arc::new(JobEnded));

        watcher
            .wait(&request(INTERVAL), &mut RecordingSink::new(), &WaitOptions::new())
            .await
            .unwrap();

        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waits_are_independent() {
        let fast = ScriptedSource::new(vec![Ok(running()), Ok(finished())]);
        let slow = ScriptedSource::new(vec![
            Ok(running()),
            Ok(running()),
            Ok(failed(Some("Target exists"))),
        ]);
        let fast_watcher = JobWatcher::new(fast.clone());
        let slow_watcher = JobWatcher::new(slow.clone());
        let options = WaitOptions::new().with_progress(true);
        let mut fast_sink = RecordingSink::new();
        let mut slow_sink = RecordingSink::new();
        let fast_request = request(2);
        let slow_request = request(3);

        let (fast_outcome, slow_outcome) = tokio::join!(
            fast_watcher.wait(&fast_request, &mut fast_sink, &options),
            slow_watcher.wait(&slow_request, &mut slow_sink, &options),
        );

        assert!(fast_outcome.is_ok());
        assert_eq!(slow_outcome.unwrap_err().message(), "Target exists");
        assert_eq!(fast_sink.rendered(), ".\n");
        assert_eq!(slow_sink.rendered(), "..\n");
        assert_eq!(fast.call_count(), 2);
        assert_eq!(slow.call_count(), 3);
    }

    #[test]
    fn test_terminal_states() {
        assert!(WatchState::Succeeded.is_terminal());
        assert!(WatchState::Failed.is_terminal());
        assert!(!WatchState::Scheduled.is_terminal());
        assert!(!WatchState::Polling.is_terminal());
        assert!(!WatchState::Running.is_terminal());
    }
}

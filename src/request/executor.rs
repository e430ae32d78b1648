//! Request executor with per-attempt deadlines and retry/backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::{ApiResponse, RequestOptions, RetryPolicy, Transport};
use crate::error::FailureReason;

/// One attempt of a logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAttempt {
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// Attempts allowed for this call.
    pub max_attempts: u32,
    /// Time spent on this call so far, including earlier attempts and waits.
    pub elapsed_budget: Duration,
}

impl RequestAttempt {
    /// Returns true if no further attempt will follow a failure of this one.
    pub fn is_last(&self) -> bool {
        self.attempt_number >= self.max_attempts
    }
}

/// Receives progress of a call. Both hooks default to doing nothing.
pub trait AttemptObserver: Send + Sync {
    /// Called right before an attempt is issued.
    fn on_attempt(&self, _target: &str, _attempt: &RequestAttempt) {}

    /// Called when an attempt failed and a retry is scheduled after `delay`.
    fn on_retry(
        &self,
        _target: &str,
        _attempt: &RequestAttempt,
        _delay: Duration,
        _failure: &FailureReason,
    ) {
    }
}

/// Runs requests through a [`Transport`] with a deadline per attempt and
/// sequential retries.
///
/// The executor keeps no state between calls; it can be shared freely.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    observer: Option<Arc<dyn AttemptObserver>>,
}

impl RequestExecutor {
    /// Creates an executor with the default retry policy.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            observer: None,
        }
    }

    /// Sets the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets an observer for attempts and scheduled retries.
    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Executes a request.
    ///
    /// Each attempt gets a fresh `timeout`. A failed attempt is retried while
    /// `attempt_number < max_retries`, after waiting the policy's backoff
    /// delay. The first 2xx response is returned immediately; otherwise the
    /// failure of the last attempt is returned as is.
    ///
    /// A `max_retries` of zero is treated as one.
    pub async fn execute(
        &self,
        target: &str,
        options: &RequestOptions,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<ApiResponse, FailureReason> {
        let max_attempts = max_retries.max(1);
        let started = Instant::now();
        let mut attempt_number = 1;

        loop {
            let attempt = RequestAttempt {
                attempt_number,
                max_attempts,
                elapsed_budget: started.elapsed(),
            };
            debug!(
                target_url = target,
                method = %options.method,
                attempt = attempt_number,
                max_attempts,
                "Sending request"
            );
            if let Some(observer) = &self.observer {
                observer.on_attempt(target, &attempt);
            }

            let failure =
                match tokio::time::timeout(timeout, self.transport.send(target, options)).await {
                    Err(_) => FailureReason::timeout(timeout),
                    Ok(Err(failure)) => failure,
                    Ok(Ok(response)) if response.is_success() => {
                        debug!(
                            target_url = target,
                            status = response.status,
                            attempt = attempt_number,
                            "Request succeeded"
                        );
                        return Ok(response);
                    }
                    Ok(Ok(response)) => FailureReason::http(response.status, response.body),
                };

            if !self.policy.should_retry(attempt_number, max_attempts) {
                warn!(
                    target_url = target,
                    attempts = attempt_number,
                    error = %failure,
                    "Request failed, giving up"
                );
                return Err(failure);
            }

            let delay = self.policy.delay_for(attempt_number);
            warn!(
                target_url = target,
                attempt = attempt_number,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %failure,
                "Request failed, retrying"
            );
            if let Some(observer) = &self.observer {
                observer.on_retry(target, &attempt, delay, &failure);
            }

            tokio::time::sleep(delay).await;
            attempt_number += 1;
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("policy", &self.policy)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Transport that replays a fixed script of outcomes and records when
    /// each call happened.
    struct ScriptedTransport {
        script: Mutex<Vec<Result<ApiResponse, FailureReason>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(mut script: Vec<Result<ApiResponse, FailureReason>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn gaps(&self) -> Vec<Duration> {
            let calls = self.calls.lock().unwrap();
            calls.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            _target: &str,
            _options: &RequestOptions,
        ) -> Result<ApiResponse, FailureReason> {
            self.calls.lock().unwrap().push(Instant::now());
            let next = self.script.lock().unwrap().pop();
            next.unwrap_or_else(|| Err(FailureReason::network("script exhausted")))
        }
    }

    /// Transport that never answers.
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(
            &self,
            _target: &str,
            _options: &RequestOptions,
        ) -> Result<ApiResponse, FailureReason> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        retries: Mutex<Vec<(u32, Duration)>>,
    }

    impl AttemptObserver for RecordingObserver {
        fn on_retry(
            &self,
            _target: &str,
            attempt: &RequestAttempt,
            delay: Duration,
            _failure: &FailureReason,
        ) {
            self.retries
                .lock()
                .unwrap()
                .push((attempt.attempt_number, delay));
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test(start_paused = true)]
    async fn test_first_success_returns_immediately() {
        let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(200, "{}"))]);
        let executor = RequestExecutor::new(transport.clone());

        let response = executor
            .execute("http://x/dashboard", &RequestOptions::get(), TIMEOUT, 3)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_attempted_exactly_n_times() {
        let transport = ScriptedTransport::new(vec![
            Err(FailureReason::network("refused")),
            Err(FailureReason::network("refused")),
            Err(FailureReason::network("refused")),
            Err(FailureReason::network("refused")),
        ]);
        let executor = RequestExecutor::new(transport.clone()).with_policy(RetryPolicy::unbounded());

        let err = executor
            .execute("http://x/chat", &RequestOptions::get(), TIMEOUT, 4)
            .await
            .unwrap_err();

        assert!(matches!(err, FailureReason::Network { .. }));
        assert_eq!(transport.call_count(), 4);
        assert_eq!(
            transport.gaps(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_attempt_k_stops() {
        let transport = ScriptedTransport::new(vec![
            Err(FailureReason::network("reset")),
            Ok(ApiResponse::new(503, "busy")),
            Ok(ApiResponse::new(201, "{}")),
            Ok(ApiResponse::new(200, "{}")),
        ]);
        let executor = RequestExecutor::new(transport.clone());

        let response = executor
            .execute("http://x/clients", &RequestOptions::get(), TIMEOUT, 5)
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_failure_keeps_status() {
        let transport = ScriptedTransport::new(vec![
            Ok(ApiResponse::new(500, "a")),
            Ok(ApiResponse::new(404, "missing")),
        ]);
        let executor = RequestExecutor::new(transport);

        let err = executor
            .execute("http://x/prospects", &RequestOptions::get(), TIMEOUT, 2)
            .await
            .unwrap_err();

        assert_eq!(err, FailureReason::http(404, "missing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_becomes_timeout() {
        let executor = RequestExecutor::new(Arc::new(HangingTransport));

        let err = executor
            .execute(
                "http://x/dashboard",
                &RequestOptions::get(),
                Duration::from_millis(250),
                2,
            )
            .await
            .unwrap_err();

        assert_eq!(err, FailureReason::timeout(Duration::from_millis(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_one_attempt() {
        let transport = ScriptedTransport::new(vec![Err(FailureReason::network("down"))]);
        let executor = RequestExecutor::new(transport.clone());

        let _ = executor
            .execute("http://x/", &RequestOptions::get(), TIMEOUT, 0)
            .await;

        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_limits_wait() {
        let transport = ScriptedTransport::new(vec![
            Err(FailureReason::network("down")),
            Err(FailureReason::network("down")),
            Err(FailureReason::network("down")),
        ]);
        let policy = RetryPolicy::new(Duration::from_secs(1), Some(Duration::from_secs(3)));
        let executor = RequestExecutor::new(transport.clone()).with_policy(policy);

        let _ = executor
            .execute("http://x/", &RequestOptions::get(), TIMEOUT, 3)
            .await;

        assert_eq!(
            transport.gaps(),
            vec![Duration::from_secs(2), Duration::from_secs(3)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_scheduled_retries() {
        let transport = ScriptedTransport::new(vec![
            Err(FailureReason::network("down")),
            Err(FailureReason::network("down")),
            Ok(ApiResponse::new(200, "{}")),
        ]);
        let observer = Arc::new(RecordingObserver::default());
        let executor = RequestExecutor::new(transport).with_observer(observer.clone());

        executor
            .execute("http://x/", &RequestOptions::get(), TIMEOUT, 3)
            .await
            .unwrap();

        assert_eq!(
            *observer.retries.lock().unwrap(),
            vec![(1, Duration::from_secs(2)), (2, Duration::from_secs(4))]
        );
    }

    #[test]
    fn test_attempt_is_last() {
        let attempt = RequestAttempt {
            attempt_number: 3,
            max_attempts: 3,
            elapsed_budget: Duration::ZERO,
        };
        assert!(attempt.is_last());
    }
}

//! Batch matching — issues the single bulk scoring request for a criteria set.
//!
//! At most one analysis is in flight at a time. The in-flight flag is owned by an
//! `InFlightSlot` and clears when the slot is dropped. A `PendingAnalysis` holds
//! its slot until `run` returns, unless the caller takes it with `take_slot` to
//! release it on its own schedule (on cancellation, for instance).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::matching::criteria::to_analyze_form;
use crate::models::analysis::MatchRecord;
use crate::models::criteria::{AnalyzeForm, Criteria};
use crate::models::resume::Resume;
use crate::scoring_client::{ScoringError, ScoringService};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis request failed: {0}")]
    Transport(#[from] ScoringError),

    #[error("Analysis timed out after {after_secs}s")]
    Timeout { after_secs: u64 },
}

/// How a run ended when it did not fail.
#[derive(Debug)]
pub enum AnalyzeOutcome {
    /// Raw records, in the order the service returned them.
    Completed(Vec<MatchRecord>),
    /// The owning view went away; the result, if any, was discarded.
    Cancelled,
}

/// Cancellation flag tied to the lifetime of whatever consumes an analysis.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent `cancel` cannot be missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Claim on the matcher's single in-flight slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct InFlightSlot {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct BatchMatcher {
    service: Arc<dyn ScoringService>,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

impl BatchMatcher {
    pub fn new(service: Arc<dyn ScoringService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claims the in-flight slot and encodes the request without sending it.
    /// Returns `None` when an analysis is already pending.
    pub fn try_start(&self, criteria: &Criteria, resumes: &[Resume]) -> Option<PendingAnalysis> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        Some(PendingAnalysis {
            slot: Some(InFlightSlot {
                flag: Arc::clone(&self.in_flight),
            }),
            service: Arc::clone(&self.service),
            timeout: self.timeout,
            form: to_analyze_form(criteria),
            resume_count: resumes.len(),
        })
    }
}

/// An analysis that owns the in-flight slot but has not been sent yet.
pub struct PendingAnalysis {
    slot: Option<InFlightSlot>,
    service: Arc<dyn ScoringService>,
    timeout: Duration,
    form: AnalyzeForm,
    resume_count: usize,
}

impl PendingAnalysis {
    /// Hands the in-flight slot to the caller. The matcher stays busy until the
    /// returned slot is dropped, whether or not `run` has finished.
    pub fn take_slot(&mut self) -> Option<InFlightSlot> {
        self.slot.take()
    }

    /// Sends the single bulk request and waits for it, bounded by the timeout.
    pub async fn run(self, cancel: &CancellationToken) -> Result<AnalyzeOutcome, AnalysisError> {
        let PendingAnalysis {
            slot,
            service,
            timeout,
            form,
            resume_count,
        } = self;

        if cancel.is_cancelled() {
            return Ok(AnalyzeOutcome::Cancelled);
        }

        info!(
            "Submitting analysis for '{}' against {} resume(s)",
            form.job_title, resume_count
        );
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Analysis cancelled after {}ms", started.elapsed().as_millis());
                return Ok(AnalyzeOutcome::Cancelled);
            }
            result = tokio::time::timeout(timeout, service.analyze_all(&form)) => result,
        };
        drop(slot);

        let records = match result {
            Err(_) => {
                warn!("Analysis timed out after {}s", timeout.as_secs());
                return Err(AnalysisError::Timeout {
                    after_secs: timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                warn!("Analysis failed: {e}");
                return Err(AnalysisError::Transport(e));
            }
            Ok(Ok(records)) => records,
        };

        if cancel.is_cancelled() {
            return Ok(AnalyzeOutcome::Cancelled);
        }

        info!(
            "Analysis returned {} record(s) in {}ms",
            records.len(),
            started.elapsed().as_millis()
        );
        Ok(AnalyzeOutcome::Completed(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::testing::{AnalyzeReply, FakeScoringService};
    use crate::models::resume::ResumeId;

    fn criteria() -> Criteria {
        Criteria {
            job_title: "Platform Engineer".to_string(),
            job_description: "Own the platform".to_string(),
            skills: "rust".to_string(),
            ..Criteria::default()
        }
    }

    fn resumes() -> Vec<Resume> {
        vec![Resume {
            id: ResumeId::Int(1),
            name: "Alice".to_string(),
        }]
    }

    fn record(resume_id: i64, score: f64) -> MatchRecord {
        serde_json::from_value(serde_json::json!({
            "resume_id": resume_id,
            "overall_score": score
        }))
        .unwrap()
    }

    fn matcher(service: Arc<FakeScoringService>) -> BatchMatcher {
        BatchMatcher::new(service, Duration::from_secs(30))
    }

    async fn run_once(
        matcher: &BatchMatcher,
        cancel: &CancellationToken,
    ) -> Result<AnalyzeOutcome, AnalysisError> {
        matcher
            .try_start(&criteria(), &resumes())
            .expect("slot should be free")
            .run(cancel)
            .await
    }

    async fn wait_for_call(service: &FakeScoringService) {
        while service.analyze_calls() == 0 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_success_returns_records_in_service_order() {
        let service = Arc::new(FakeScoringService::new(
            resumes(),
            AnalyzeReply::Records(vec![record(2, 40.0), record(1, 90.0)]),
        ));
        let matcher = matcher(service.clone());

        let outcome = run_once(&matcher, &CancellationToken::new()).await.unwrap();

        match outcome {
            AnalyzeOutcome::Completed(records) => {
                assert_eq!(records[0].resume_id, ResumeId::Int(2));
                assert_eq!(records[1].resume_id, ResumeId::Int(1));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert_eq!(service.analyze_calls(), 1);
        assert!(!matcher.is_busy());
    }

    #[tokio::test]
    async fn test_request_carries_encoded_criteria() {
        let service = Arc::new(FakeScoringService::with_resumes(resumes()));
        run_once(&matcher(service.clone()), &CancellationToken::new())
            .await
            .unwrap();

        let form = service.last_form().unwrap();
        assert_eq!(form.job_title, "Platform Engineer");
        assert_eq!(form.required_skills, "rust");
        assert!(form.company.is_none());
    }

    #[tokio::test]
    async fn test_second_start_while_pending_is_refused() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            FakeScoringService::new(resumes(), AnalyzeReply::Records(vec![record(1, 85.0)]))
                .gated(gate.clone()),
        );
        let matcher = matcher(service.clone());

        let first = {
            let matcher = matcher.clone();
            tokio::spawn(async move { run_once(&matcher, &CancellationToken::new()).await })
        };

        wait_for_call(&service).await;
        assert!(matcher.is_busy());
        assert!(matcher.try_start(&criteria(), &resumes()).is_none());
        assert_eq!(service.analyze_calls(), 1);

        gate.notify_one();
        match first.await.unwrap().unwrap() {
            AnalyzeOutcome::Completed(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].overall_score, Some(85.0));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        assert!(!matcher.is_busy());
    }

    #[tokio::test]
    async fn test_failure_surfaces_error_and_clears_busy_flag() {
        let service = Arc::new(FakeScoringService::new(
            resumes(),
            AnalyzeReply::Fail {
                status: 500,
                message: "boom".to_string(),
            },
        ));
        let matcher = matcher(service);

        let err = run_once(&matcher, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::Transport(ScoringError::Api { status: 500, .. })
        ));
        assert!(!matcher.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_service_times_out() {
        let service = Arc::new(FakeScoringService::new(resumes(), AnalyzeReply::Hang));
        let matcher = BatchMatcher::new(service, Duration::from_secs(5));

        let err = run_once(&matcher, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Timeout { after_secs: 5 }));
        assert!(!matcher.is_busy());
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_result() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            FakeScoringService::new(resumes(), AnalyzeReply::Records(vec![record(1, 85.0)]))
                .gated(gate.clone()),
        );
        let matcher = matcher(service.clone());
        let cancel = CancellationToken::new();

        let pending = {
            let matcher = matcher.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { run_once(&matcher, &cancel).await })
        };

        wait_for_call(&service).await;
        cancel.cancel();

        let outcome = pending.await.unwrap().unwrap();
        assert!(matches!(outcome, AnalyzeOutcome::Cancelled));
        assert!(!matcher.is_busy());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_sends_nothing() {
        let service = Arc::new(FakeScoringService::with_resumes(resumes()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = run_once(&matcher(service.clone()), &cancel).await.unwrap();

        assert!(matches!(outcome, AnalyzeOutcome::Cancelled));
        assert_eq!(service.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_dropping_pending_analysis_releases_slot() {
        let service = Arc::new(FakeScoringService::with_resumes(resumes()));
        let matcher = matcher(service);

        let pending = matcher.try_start(&criteria(), &resumes()).unwrap();
        assert!(matcher.try_start(&criteria(), &resumes()).is_none());
        drop(pending);

        assert!(!matcher.is_busy());
        assert!(matcher.try_start(&criteria(), &resumes()).is_some());
    }

    #[tokio::test]
    async fn test_taken_slot_outlives_the_run() {
        let service = Arc::new(FakeScoringService::with_resumes(resumes()));
        let matcher = matcher(service);

        let mut pending = matcher.try_start(&criteria(), &resumes()).unwrap();
        let slot = pending.take_slot();
        let outcome = pending.run(&CancellationToken::new()).await.unwrap();

        assert!(matches!(outcome, AnalyzeOutcome::Completed(_)));
        assert!(matcher.is_busy());
        drop(slot);
        assert!(!matcher.is_busy());
    }

    #[tokio::test]
    async fn test_released_slot_frees_matcher_before_cancelled_run_wakes() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(FakeScoringService::with_resumes(resumes()).gated(gate));
        let matcher = matcher(service.clone());
        let cancel = CancellationToken::new();

        let mut pending = matcher.try_start(&criteria(), &resumes()).unwrap();
        let slot = pending.take_slot();
        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move { pending.run(&cancel).await })
        };
        wait_for_call(&service).await;

        cancel.cancel();
        drop(slot);
        assert!(!matcher.is_busy());
        assert!(matcher.try_start(&criteria(), &resumes()).is_some());

        assert!(matches!(
            task.await.unwrap().unwrap(),
            AnalyzeOutcome::Cancelled
        ));
    }
}

//! Axum route handlers for the match-report session.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::batch::{AnalysisError, AnalyzeOutcome, CancellationToken, PendingAnalysis};
use crate::matching::registry::ResumeRegistry;
use crate::matching::session::{Rejected, Session, SessionEvent};
use crate::models::criteria::CriteriaField;
use crate::models::resume::Resume;
use crate::state::{AppState, CurrentRun, LiveSession};

const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "txt"];

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub session: Session,
    pub submittable: bool,
    /// True while the bulk scoring request is outstanding.
    pub busy: bool,
}

impl SessionResponse {
    fn new(session: &Session, busy: bool) -> Self {
        Self {
            submittable: session.is_submittable(),
            session: session.clone(),
            busy,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CriteriaUpdateRequest {
    pub field: CriteriaField,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisAccepted {
    pub run_id: Uuid,
    pub status: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let live = state.live.lock().await;
    Json(SessionResponse::new(&live.session, state.matcher.is_busy()))
}

/// POST /api/v1/session
///
/// Page activation: tears down the previous session (discarding any pending
/// analysis) and performs this activation's single resume registry load.
/// A registry failure is reported in the snapshot, not as an HTTP error.
pub async fn handle_activate_session(State(state): State<AppState>) -> Json<SessionResponse> {
    let activation_id = {
        let mut live = state.live.lock().await;
        if let Some(run_id) = live.reactivate() {
            info!("Discarding pending analysis {run_id} on session reset");
        }
        live.activation_id
    };

    let loaded = ResumeRegistry::new(state.scoring.as_ref())
        .load()
        .await
        .map_err(|e| e.to_string());

    let mut live = state.live.lock().await;
    if live.activation_id == activation_id {
        if let Err(reason) = live.session.reduce(SessionEvent::RegistryLoaded(loaded)) {
            debug!("Registry load rejected: {reason:?}");
        }
    } else {
        debug!("Discarded registry load for superseded activation {activation_id}");
    }
    Json(SessionResponse::new(&live.session, state.matcher.is_busy()))
}

/// PATCH /api/v1/session/criteria
pub async fn handle_update_criteria(
    State(state): State<AppState>,
    Json(request): Json<CriteriaUpdateRequest>,
) -> Json<SessionResponse> {
    let mut live = state.live.lock().await;
    if let Err(reason) = live.session.reduce(SessionEvent::CriteriaUpdated {
        field: request.field,
        value: request.value,
    }) {
        debug!("Criteria update rejected: {reason:?}");
    }
    Json(SessionResponse::new(&live.session, state.matcher.is_busy()))
}

/// POST /api/v1/analysis
///
/// Starts the bulk analysis in the background and returns immediately.
/// A submit while a run is pending is rejected without contacting the service.
pub async fn handle_submit_analysis(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AnalysisAccepted>), AppError> {
    let mut live = state.live.lock().await;

    if live.session.loading_run().is_some() {
        return Err(rejection(Rejected::AlreadyRunning));
    }
    if !live.session.is_submittable() {
        return Err(rejection(Rejected::NotSubmittable));
    }

    let mut pending = state
        .matcher
        .try_start(live.session.criteria(), live.session.resumes())
        .ok_or_else(|| {
            warn!("Analysis already in progress; ignoring duplicate submit");
            rejection(Rejected::AlreadyRunning)
        })?;

    let run_id = Uuid::new_v4();
    live.session
        .reduce(SessionEvent::AnalysisStarted {
            run_id,
            at: Utc::now(),
        })
        .map_err(rejection)?;

    let cancel = CancellationToken::new();
    live.current_run = Some(CurrentRun {
        run_id,
        cancel: cancel.clone(),
        slot: pending.take_slot(),
    });
    drop(live);

    tokio::spawn(run_analysis(Arc::clone(&state.live), run_id, pending, cancel));

    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisAccepted {
            run_id,
            status: "loading",
        }),
    ))
}

/// DELETE /api/v1/analysis
///
/// Cancels the pending analysis; its eventual result is discarded.
pub async fn handle_cancel_analysis(State(state): State<AppState>) -> Json<SessionResponse> {
    let mut live = state.live.lock().await;
    if let Some(run_id) = live.cancel_current_run() {
        info!("Analysis {run_id} cancelled by client");
        if let Err(reason) = live.session.reduce(SessionEvent::AnalysisCancelled { run_id }) {
            debug!("Cancellation of analysis {run_id} not applied: {reason:?}");
        }
    }
    Json(SessionResponse::new(&live.session, state.matcher.is_busy()))
}

/// POST /api/v1/resumes/upload
///
/// Forwards a resume file to the scoring service. The new resume shows up in
/// the session at the next activation.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Resume>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("file field has no file name".to_string()))?;
        validate_extension(&file_name)?;

        let contents = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let resume = state
            .scoring
            .upload_resume(&file_name, contents.to_vec())
            .await?;
        info!("Uploaded resume '{}' as {}", resume.name, resume.id);
        return Ok(Json(resume));
    }

    Err(AppError::Validation("Missing 'file' field".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn run_analysis(
    live: Arc<Mutex<LiveSession>>,
    run_id: Uuid,
    pending: PendingAnalysis,
    cancel: CancellationToken,
) {
    let event = match pending.run(&cancel).await {
        Ok(AnalyzeOutcome::Completed(records)) => SessionEvent::AnalysisCompleted {
            run_id,
            records,
            at: Utc::now(),
        },
        Ok(AnalyzeOutcome::Cancelled) => SessionEvent::AnalysisCancelled { run_id },
        Err(e) => SessionEvent::AnalysisFailed {
            run_id,
            timed_out: matches!(e, AnalysisError::Timeout { .. }),
            error: e.to_string(),
        },
    };

    let mut live = live.lock().await;
    // Releases the matcher slot in the same critical section that settles the session.
    if matches!(&live.current_run, Some(current) if current.run_id == run_id) {
        live.current_run = None;
    }
    if live.session.reduce(event).is_err() {
        debug!("Discarded result of analysis {run_id}");
    }
}

fn rejection(reason: Rejected) -> AppError {
    match reason {
        Rejected::AlreadyRunning => AppError::Conflict("An analysis is already in progress".to_string()),
        Rejected::NotSubmittable => AppError::Validation(
            "Job title, job description and at least one resume are required".to_string(),
        ),
        Rejected::StaleRun => AppError::Conflict("Analysis run is no longer current".to_string()),
    }
}

fn validate_extension(file_name: &str) -> Result<(), AppError> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unsupported file format: {file_name}"
        )))
    }
}

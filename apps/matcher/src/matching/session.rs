#![allow(dead_code)]

//! Session state container for one activation of the match-report page.
//!
//! All mutation goes through `Session::reduce`, which performs no I/O. The
//! snapshot is serializable so the page can render it as-is.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::matching::correlator::{correlate, OrphanWarning};
use crate::matching::criteria::{is_submittable, CriteriaBuilder};
use crate::matching::presenter::{build_view_model, CategoryOrder, ResultViewModel};
use crate::models::analysis::MatchRecord;
use crate::models::criteria::{Criteria, CriteriaField};
use crate::models::resume::Resume;

/// Lifecycle of the analysis for this session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisState {
    #[default]
    Idle,
    Loading {
        run_id: Uuid,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        run_id: Uuid,
        completed_at: DateTime<Utc>,
    },
    Failed {
        run_id: Uuid,
        error: String,
        timed_out: bool,
    },
}

/// Results of the most recently completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub results: Vec<ResultViewModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphan_warning: Option<OrphanWarning>,
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The page was (re)opened: everything but the configured ordering resets.
    Activated,
    RegistryLoaded(Result<Vec<Resume>, String>),
    CriteriaUpdated { field: CriteriaField, value: String },
    AnalysisStarted { run_id: Uuid, at: DateTime<Utc> },
    AnalysisCompleted {
        run_id: Uuid,
        records: Vec<MatchRecord>,
        at: DateTime<Utc>,
    },
    AnalysisFailed {
        run_id: Uuid,
        error: String,
        timed_out: bool,
    },
    AnalysisCancelled { run_id: Uuid },
}

/// Why `reduce` refused an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    AlreadyRunning,
    NotSubmittable,
    /// The event belongs to a run that is no longer the current one.
    StaleRun,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    criteria: CriteriaBuilder,
    resumes: Vec<Resume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registry_error: Option<String>,
    analysis: AnalysisState,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<AnalysisReport>,
    #[serde(skip)]
    category_order: CategoryOrder,
}

impl Session {
    pub fn new(category_order: CategoryOrder) -> Self {
        Self {
            category_order,
            ..Self::default()
        }
    }

    pub fn criteria(&self) -> &Criteria {
        self.criteria.criteria()
    }

    pub fn resumes(&self) -> &[Resume] {
        &self.resumes
    }

    pub fn registry_error(&self) -> Option<&str> {
        self.registry_error.as_deref()
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    pub fn is_submittable(&self) -> bool {
        is_submittable(self.criteria.criteria(), self.resumes.len())
    }

    pub fn loading_run(&self) -> Option<Uuid> {
        match self.analysis {
            AnalysisState::Loading { run_id, .. } => Some(run_id),
            _ => None,
        }
    }

    pub fn reduce(&mut self, event: SessionEvent) -> Result<(), Rejected> {
        match event {
            SessionEvent::Activated => {
                *self = Session::new(self.category_order);
            }
            SessionEvent::RegistryLoaded(Ok(resumes)) => {
                self.resumes = resumes;
                self.registry_error = None;
            }
            SessionEvent::RegistryLoaded(Err(error)) => {
                self.resumes.clear();
                self.registry_error = Some(error);
            }
            SessionEvent::CriteriaUpdated { field, value } => {
                self.criteria.update(field, value);
            }
            SessionEvent::AnalysisStarted { run_id, at } => {
                if self.loading_run().is_some() {
                    return Err(Rejected::AlreadyRunning);
                }
                if !self.is_submittable() {
                    return Err(Rejected::NotSubmittable);
                }
                self.analysis = AnalysisState::Loading {
                    run_id,
                    started_at: at,
                };
            }
            SessionEvent::AnalysisCompleted {
                run_id,
                records,
                at,
            } => {
                self.expect_loading(run_id)?;
                let correlation = correlate(records, &self.resumes);
                let results = correlation
                    .results
                    .iter()
                    .map(|r| build_view_model(r, self.category_order))
                    .collect();
                // A completed run replaces the previous report wholesale.
                self.report = Some(AnalysisReport {
                    run_id,
                    results,
                    orphan_warning: correlation.warning(),
                });
                self.analysis = AnalysisState::Succeeded {
                    run_id,
                    completed_at: at,
                };
            }
            SessionEvent::AnalysisFailed {
                run_id,
                error,
                timed_out,
            } => {
                self.expect_loading(run_id)?;
                self.analysis = AnalysisState::Failed {
                    run_id,
                    error,
                    timed_out,
                };
            }
            SessionEvent::AnalysisCancelled { run_id } => {
                self.expect_loading(run_id)?;
                self.analysis = AnalysisState::Idle;
            }
        }
        Ok(())
    }

    fn expect_loading(&self, run_id: Uuid) -> Result<(), Rejected> {
        if self.loading_run() == Some(run_id) {
            Ok(())
        } else {
            debug!("Ignoring event for stale analysis run {run_id}");
            Err(Rejected::StaleRun)
        }
    }
}

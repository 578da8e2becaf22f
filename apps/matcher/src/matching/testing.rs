//! In-memory `ScoringService` double shared by the matching and route tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::models::analysis::MatchRecord;
use crate::models::criteria::AnalyzeForm;
use crate::models::resume::{Resume, ResumeId};
use crate::scoring_client::{ScoringError, ScoringService};

#[derive(Debug, Clone)]
pub enum AnalyzeReply {
    Records(Vec<MatchRecord>),
    Fail { status: u16, message: String },
    /// Never answers; used to exercise the bounded wait.
    Hang,
}

pub struct FakeScoringService {
    resumes: Option<Vec<Resume>>,
    reply: Mutex<AnalyzeReply>,
    /// When set, `analyze_all` waits for one notification before replying.
    gate: Option<Arc<Notify>>,
    list_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    last_form: Mutex<Option<AnalyzeForm>>,
}

impl FakeScoringService {
    pub fn new(resumes: Vec<Resume>, reply: AnalyzeReply) -> Self {
        Self {
            resumes: Some(resumes),
            reply: Mutex::new(reply),
            gate: None,
            list_calls: AtomicUsize::new(0),
            analyze_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            last_form: Mutex::new(None),
        }
    }

    pub fn with_resumes(resumes: Vec<Resume>) -> Self {
        Self::new(resumes, AnalyzeReply::Records(vec![]))
    }

    pub fn failing_registry() -> Self {
        Self {
            resumes: None,
            ..Self::with_resumes(vec![])
        }
    }

    /// Holds every analyze call until `gate.notify_one()` is called.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn set_reply(&self, reply: AnalyzeReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn last_form(&self) -> Option<AnalyzeForm> {
        self.last_form.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringService for FakeScoringService {
    async fn list_resumes(&self) -> Result<Vec<Resume>, ScoringError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.resumes.clone().ok_or_else(|| ScoringError::Api {
            status: 503,
            message: "resume store unavailable".to_string(),
        })
    }

    async fn analyze_all(&self, form: &AnalyzeForm) -> Result<Vec<MatchRecord>, ScoringError> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_form.lock().unwrap() = Some(form.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            AnalyzeReply::Records(records) => Ok(records),
            AnalyzeReply::Fail { status, message } => Err(ScoringError::Api { status, message }),
            AnalyzeReply::Hang => std::future::pending().await,
        }
    }

    async fn upload_resume(
        &self,
        file_name: &str,
        _contents: Vec<u8>,
    ) -> Result<Resume, ScoringError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Resume {
            id: ResumeId::from("uploaded"),
            name: file_name.to_string(),
        })
    }
}

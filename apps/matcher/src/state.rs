use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::matching::batch::{BatchMatcher, CancellationToken, InFlightSlot};
use crate::matching::presenter::CategoryOrder;
use crate::matching::session::{Session, SessionEvent};
use crate::scoring_client::ScoringService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// All scoring service traffic goes through this. HTTP in production, a double in tests.
    pub scoring: Arc<dyn ScoringService>,
    pub matcher: BatchMatcher,
    pub live: Arc<Mutex<LiveSession>>,
}

impl AppState {
    pub fn new(config: Config, scoring: Arc<dyn ScoringService>) -> Self {
        let matcher = BatchMatcher::new(Arc::clone(&scoring), config.analysis_timeout);
        let live = LiveSession::new(config.top_category_order);
        Self {
            config,
            scoring,
            matcher,
            live: Arc::new(Mutex::new(live)),
        }
    }
}

/// The analysis currently allowed to write into the session.
#[derive(Debug)]
pub struct CurrentRun {
    pub run_id: Uuid,
    pub cancel: CancellationToken,
    /// Keeps the matcher busy exactly as long as this run is current.
    pub slot: Option<InFlightSlot>,
}

/// The page session plus the handle of its pending run, if any.
#[derive(Debug)]
pub struct LiveSession {
    /// Changes on every page activation; late registry loads for an older one are dropped.
    pub activation_id: Uuid,
    pub session: Session,
    pub current_run: Option<CurrentRun>,
}

impl LiveSession {
    pub fn new(category_order: CategoryOrder) -> Self {
        Self {
            activation_id: Uuid::new_v4(),
            session: Session::new(category_order),
            current_run: None,
        }
    }

    /// Cancels the pending run so its result is discarded instead of applied,
    /// and frees the matcher's slot right away.
    pub fn cancel_current_run(&mut self) -> Option<Uuid> {
        let run = self.current_run.take()?;
        run.cancel.cancel();
        Some(run.run_id)
    }

    /// Starts a fresh page activation, discarding any pending run.
    pub fn reactivate(&mut self) -> Option<Uuid> {
        let discarded = self.cancel_current_run();
        self.activation_id = Uuid::new_v4();
        if let Err(reason) = self.session.reduce(SessionEvent::Activated) {
            debug!("Activation rejected: {reason:?}");
        }
        discarded
    }
}

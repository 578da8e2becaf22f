pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/session",
            get(handlers::handle_get_session).post(handlers::handle_activate_session),
        )
        .route(
            "/api/v1/session/criteria",
            patch(handlers::handle_update_criteria),
        )
        .route(
            "/api/v1/analysis",
            post(handlers::handle_submit_analysis).delete(handlers::handle_cancel_analysis),
        )
        .route(
            "/api/v1/resumes/upload",
            post(handlers::handle_upload_resume),
        )
        .with_state(state)
}

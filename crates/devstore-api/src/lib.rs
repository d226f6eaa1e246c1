//! devstore-api — HTTP front for Devstore.
//!
//! Deserializes command envelopes, hands them to the core
//! [`Dispatcher`](devstore_core::Dispatcher) and answers with the response
//! envelope, using its `httpStatusHint` as the HTTP status.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/worker` | Execute a command envelope |
//! | POST | `/api/server` | Same as `/worker` |
//! | GET | `/api/server` | Liveness message |
//! | GET | `/healthz` | Health + registered developer count |
//!
//! The developer key travels in the `Developer-Key` header, or in
//! `Authorization` (with or without a `Bearer ` prefix).

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use devstore_core::Dispatcher;
use devstore_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Dispatcher,
}

/// Build the complete API router.
pub fn build_router(store: StateStore) -> Router {
    let state = ApiState {
        dispatcher: Dispatcher::new(store),
    };

    Router::new()
        .route("/worker", post(handlers::execute))
        .route("/api/server", get(handlers::server_status).post(handlers::execute))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

//! HTTP routes for the broker

mod account;
mod auth;
mod claims;
mod session;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use claimgate_core::{CodeMailer, RegistryStore};

use crate::state::AppState;
use crate::store::SessionStore;

/// Create the router with all routes
pub fn create_router<R, M, T>(state: Arc<AppState<R, M, T>>) -> Router
where
    R: RegistryStore + 'static,
    M: CodeMailer + 'static,
    T: SessionStore + 'static,
{
    Router::new()
        .route("/api/session", get(session::session_context))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/claim", post(claims::claim))
        .route("/api/confirm", post(claims::confirm_email))
        .route("/api/create_account", post(account::create_account))
        .route("/api/addresses", get(claims::addresses))
        .layer(TraceLayer::new_for_http())
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

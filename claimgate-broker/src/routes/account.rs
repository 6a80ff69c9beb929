//! Account creation endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tower_cookies::Cookies;

use claimgate_core::{CodeMailer, RegistryStore};

use crate::error::BrokerError;
use crate::state::AppState;
use crate::store::SessionStore;

#[derive(Serialize)]
pub struct CreateAccountResponse {
    pub success: bool,
    pub account: u64,
}

/// POST /api/create_account
///
/// Allocate a new account for the session's identity. Requires a login
/// (401), an identity without an account (409), and eligibility (403).
pub async fn create_account<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
) -> Result<Json<CreateAccountResponse>, BrokerError>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let gate = state.gate(cookies);
    let account = gate.create_account()?;

    Ok(Json(CreateAccountResponse {
        success: true,
        account: account.0,
    }))
}

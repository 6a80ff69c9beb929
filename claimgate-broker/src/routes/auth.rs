//! Login and logout endpoints

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
pub struct LoginResponse {
    pub success: bool,
    pub loginid: Option<String>,
    pub account: Option<u64>,
    pub confirmation_required: bool,
    pub can_create_account: bool,
}

/// POST /api/login
///
/// Accepts a completed external authentication (resolved through the
/// injected case source) and switches the session to that identity. A
/// join that would merge two distinct accounts is rejected with 409 and
/// the session keeps its previous identity.
pub async fn login<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<LoginResponse>, BrokerError>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let case = state.cases.resolve(payload)?;
    let gate = state.gate(cookies);
    gate.login(&case)?;

    Ok(Json(LoginResponse {
        success: true,
        loginid: gate.loginid().map(|l| l.0),
        account: gate.account()?.map(|a| a.0),
        confirmation_required: gate.confirmation_required()?,
        can_create_account: gate.can_create_account()?,
    }))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// POST /api/logout
pub async fn logout<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
) -> Json<LogoutResponse>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let gate = state.gate(cookies);
    gate.logout();

    Json(LogoutResponse { success: true })
}

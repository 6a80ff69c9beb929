//! Session projection endpoint

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
pub struct SessionContext {
    pub authenticated: bool,
    pub loginid: Option<String>,
    pub account: Option<u64>,
    pub confirmation_required: bool,
    pub can_create_account: bool,
    pub must_join_account: bool,
}

/// GET /api/session
///
/// The caller's current identity and eligibility projection.
pub async fn session_context<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
) -> Result<Json<SessionContext>, BrokerError>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let gate = state.gate(cookies);

    let context = match gate.loginid() {
        Some(loginid) => {
            let view = gate.registry().login_view(&loginid)?;
            SessionContext {
                authenticated: true,
                loginid: Some(loginid.0.clone()),
                account: view.account().map(|a| a.0),
                confirmation_required: view.confirmation_required()?,
                can_create_account: view.can_create_account()?,
                must_join_account: view.must_join_account()?,
            }
        }
        None => SessionContext {
            authenticated: false,
            loginid: None,
            account: None,
            confirmation_required: false,
            can_create_account: false,
            must_join_account: false,
        },
    };

    Ok(Json(context))
}

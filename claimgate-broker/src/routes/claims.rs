//! Claim, confirmation, and address endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use claimgate_core::{CodeMailer, RegistryStore};

use crate::error::BrokerError;
use crate::state::AppState;
use crate::store::SessionStore;

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub address: String,
}

#[derive(Serialize)]
pub struct ClaimResponse {
    pub success: bool,
}

/// POST /api/claim
///
/// Mail a confirmation code for an address. Available while anonymous;
/// a logged-in identity also takes the address as its current claim.
pub async fn claim<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, BrokerError>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let gate = state.gate(cookies);
    gate.claim(&req.address)?;

    Ok(Json(ClaimResponse { success: true }))
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub address: String,
    pub account: Option<u64>,
}

/// POST /api/confirm
pub async fn confirm_email<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, BrokerError>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let gate = state.gate(cookies);
    let address = gate.confirm_email(&req.code)?;

    Ok(Json(ConfirmResponse {
        success: true,
        address,
        account: gate.account()?.map(|a| a.0),
    }))
}

#[derive(Serialize)]
pub struct AddressesResponse {
    pub addresses: Vec<String>,
    pub pending: Vec<String>,
    pub confirmed: Vec<String>,
}

/// GET /api/addresses
///
/// The distinct claimed addresses across the identities sharing the
/// current account, partitioned by confirmation status.
pub async fn addresses<R, M, T>(
    State(state): State<Arc<AppState<R, M, T>>>,
    cookies: Cookies,
) -> Result<Json<AddressesResponse>, BrokerError>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    let gate = state.gate(cookies);

    Ok(Json(AddressesResponse {
        addresses: gate.addresses()?,
        pending: gate.addresses_pending()?,
        confirmed: gate.addresses_confirmed()?,
    }))
}

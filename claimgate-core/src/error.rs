//! Error types for claimgate-core

use thiserror::Error;

/// Caller-actionable outcomes of gate and registry operations.
///
/// None of these signal systemic failure and none are retried internally;
/// each surfaces to the caller to drive a workflow decision. Collaborator
/// failures propagate uninterpreted through `Store`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Account already exists")]
    AccountAlreadyExists,

    #[error("Login would merge two distinct accounts")]
    AccountConflict,

    #[error("Invalid or expired confirmation code")]
    InvalidConfirmationCode,

    #[error("Address is owned by a different account")]
    AddressAccountConflict,

    #[error("Account can not be created")]
    AccountCreationDenied,

    #[error("Store error: {0}")]
    Store(String),
}

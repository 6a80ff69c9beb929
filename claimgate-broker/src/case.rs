//! Hand-off from the external OpenID layer

use claimgate_core::OpenIdCase;

use crate::error::BrokerError;

/// Turns a completed-authentication payload into a case.
///
/// The OpenID handshake and discovery happen upstream of the broker; the
/// strategy here decides how much of the posted result to trust. Injected
/// at construction, never a process-wide global, so tests and deployments
/// can swap it freely.
pub trait CaseSource: Send + Sync {
    fn resolve(&self, payload: serde_json::Value) -> Result<OpenIdCase, BrokerError>;
}

/// Accepts the posted payload verbatim. For deployments where a trusted
/// relying-party terminator forwards verified authentication results.
pub struct AssertedCaseSource;

impl CaseSource for AssertedCaseSource {
    fn resolve(&self, payload: serde_json::Value) -> Result<OpenIdCase, BrokerError> {
        serde_json::from_value(payload).map_err(|e| BrokerError::InvalidCase(e.to_string()))
    }
}

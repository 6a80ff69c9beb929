//! Per-caller session abstraction

use crate::models::LoginId;

/// Ephemeral per-caller state: at most one current login identity.
///
/// `update` is a flush hook, invoked after every state-affecting gate
/// operation so the owning layer can refresh whatever authorization
/// projection it caches against the session.
pub trait Session: Send + Sync {
    /// The currently active identity, if any
    fn loginid(&self) -> Option<LoginId>;

    /// Make `loginid` the active identity
    fn set_loginid(&self, loginid: &LoginId);

    /// Drop the active identity; no durable-state change
    fn clear(&self);

    /// Flush hook for cached per-session state
    fn update(&self);
}

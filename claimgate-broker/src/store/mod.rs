//! Storage for the broker's server-side sessions

pub mod memory;
pub mod sqlite;

pub use memory::MemorySessions;
pub use sqlite::SqliteRegistry;

use serde::{Deserialize, Serialize};

use claimgate_core::LoginId;

use crate::error::BrokerError;

/// Result type for session-store operations
pub type StoreResult<T> = Result<T, BrokerError>;

/// Unique session identifier (cookie value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Server-side session records, keyed by the cookie value.
///
/// A session exists from first use and may or may not carry a login
/// identity; logging out deletes the record.
pub trait SessionStore: Send + Sync {
    /// Create a new, anonymous session
    fn create(&self) -> StoreResult<SessionId>;

    /// The identity bound to a session, if the session exists and is
    /// logged in
    fn loginid(&self, id: &SessionId) -> StoreResult<Option<LoginId>>;

    /// Bind or unbind a session's identity
    fn set_loginid(&self, id: &SessionId, loginid: Option<&LoginId>) -> StoreResult<()>;

    /// Whether the session exists
    fn exists(&self, id: &SessionId) -> StoreResult<bool>;

    /// Delete a session
    fn delete(&self, id: &SessionId) -> StoreResult<()>;
}

//! Claimgate Broker
//!
//! A deployable HTTP front for the claimed-email login core: SQLite-backed
//! registry, cookie sessions, console or SMTP code delivery, and a JSON
//! command surface over the gate. The OpenID handshake itself is handled
//! upstream; the broker receives completed authentications as cases.

pub mod case;
pub mod config;
pub mod error;
pub mod mail;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

pub use case::{AssertedCaseSource, CaseSource};
pub use config::Config;
pub use error::BrokerError;
pub use mail::{ConsoleMailer, SmtpConfig, SmtpMailer};
pub use session::CookieSession;
pub use state::AppState;
pub use store::{MemorySessions, SessionId, SessionStore, SqliteRegistry};

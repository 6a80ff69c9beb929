//! Broker application state

use std::sync::Arc;

use tower_cookies::Cookies;

use claimgate_core::{AuthGate, CodeMailer, Registry, RegistryStore};

use crate::case::CaseSource;
use crate::session::CookieSession;
use crate::store::SessionStore;

/// Shared state behind every route: registry store, session store, mailer,
/// and the OpenID hand-off strategy, all injected at construction.
pub struct AppState<R, M, T>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    pub store: Arc<R>,
    pub mailer: Arc<M>,
    pub sessions: Arc<T>,
    pub cases: Arc<dyn CaseSource>,
    pub domain: String,
}

impl<R, M, T> AppState<R, M, T>
where
    R: RegistryStore,
    M: CodeMailer,
    T: SessionStore,
{
    pub fn new(
        domain: String,
        store: Arc<R>,
        sessions: Arc<T>,
        mailer: Arc<M>,
        cases: Arc<dyn CaseSource>,
    ) -> Self {
        Self {
            store,
            mailer,
            sessions,
            cases,
            domain,
        }
    }

    /// Build the gate for one request's cookie jar
    pub fn gate(&self, cookies: Cookies) -> AuthGate<Arc<R>, Arc<M>, CookieSession<T>> {
        AuthGate::new(
            Registry::new(self.store.clone(), self.mailer.clone()),
            CookieSession::new(cookies, self.sessions.clone()),
        )
    }
}

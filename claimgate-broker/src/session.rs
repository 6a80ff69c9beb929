//! Cookie-backed session adapter
//!
//! Binds one request's cookie jar to the server-side session records and
//! exposes them through the core `Session` contract.

use std::sync::{Arc, Mutex};

use tower_cookies::{Cookie, Cookies};

use claimgate_core::{LoginId, Session};

use crate::store::{SessionId, SessionStore};

pub const SESSION_COOKIE: &str = "claimgate_session";

/// Per-request session handle: cookie jar + session store.
///
/// The session record is created lazily on the first `set_loginid`, so
/// anonymous read-only requests never allocate one.
pub struct CookieSession<T: SessionStore> {
    cookies: Cookies,
    sessions: Arc<T>,
    sid: Mutex<Option<SessionId>>,
}

impl<T: SessionStore> CookieSession<T> {
    pub fn new(cookies: Cookies, sessions: Arc<T>) -> Self {
        let sid = cookies
            .get(SESSION_COOKIE)
            .map(|c| SessionId(c.value().to_string()))
            .filter(|id| sessions.exists(id).unwrap_or(false));
        Self {
            cookies,
            sessions,
            sid: Mutex::new(sid),
        }
    }

    fn ensure_session(&self) -> Option<SessionId> {
        let mut sid = self.sid.lock().unwrap();
        if sid.is_none() {
            match self.sessions.create() {
                Ok(id) => {
                    let cookie = Cookie::build((SESSION_COOKIE, id.0.clone()))
                        .path("/")
                        .http_only(true)
                        .build();
                    self.cookies.add(cookie);
                    *sid = Some(id);
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to create session");
                }
            }
        }
        sid.clone()
    }

    fn clear_cookie(&self) {
        let cookie = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .max_age(tower_cookies::cookie::time::Duration::ZERO)
            .build();
        self.cookies.add(cookie);
    }
}

impl<T: SessionStore> Session for CookieSession<T> {
    fn loginid(&self) -> Option<LoginId> {
        let sid = self.sid.lock().unwrap().clone()?;
        self.sessions.loginid(&sid).ok().flatten()
    }

    fn set_loginid(&self, loginid: &LoginId) {
        if let Some(sid) = self.ensure_session() {
            if let Err(err) = self.sessions.set_loginid(&sid, Some(loginid)) {
                tracing::error!(error = %err, "failed to persist session login");
            }
        }
    }

    fn clear(&self) {
        let sid = self.sid.lock().unwrap().take();
        if let Some(sid) = sid {
            if let Err(err) = self.sessions.delete(&sid) {
                tracing::error!(error = %err, "failed to delete session");
            }
        }
        self.clear_cookie();
    }

    fn update(&self) {
        // Session state lives server-side; nothing is cached per cookie
    }
}

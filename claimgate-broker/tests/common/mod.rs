//! Common test utilities for broker integration tests

use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use claimgate_broker::{routes, AppState, AssertedCaseSource, MemorySessions};
use claimgate_core::{CodeMailer, MemoryRegistry};
use serde_json::{json, Value};

pub const SESSION_COOKIE: &str = "claimgate_session";

/// Mock mailer that captures confirmation codes
#[derive(Default, Clone)]
pub struct MockMailer {
    /// Captured (code, address) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the last code sent to an address
    pub fn code_for(&self, address: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(_, a)| a == address)
            .map(|(c, _)| c.clone())
    }
}

impl CodeMailer for MockMailer {
    fn send_code(&self, code: &str, address: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((code.to_string(), address.to_string()));
        Ok(())
    }
}

/// Create a test server over in-memory stores and a capturing mailer
pub fn create_test_server() -> (TestServer, MockMailer, Arc<MemoryRegistry>) {
    let mailer = MockMailer::new();
    let store = Arc::new(MemoryRegistry::new());

    let state = Arc::new(AppState::new(
        "localhost:3000".to_string(),
        store.clone(),
        Arc::new(MemorySessions::new()),
        Arc::new(mailer.clone()),
        Arc::new(AssertedCaseSource),
    ));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, mailer, store)
}

/// A login payload in the style `https://example.<tld>/<name>`, credible
/// iff the tld is "com"
pub fn case(tld: &str, name: &str, email: Option<&str>) -> Value {
    let uri = format!("https://example.{tld}/{name}");
    json!({
        "claimed_id": uri,
        "display_id": uri,
        "email": email
            .map(str::to_string)
            .unwrap_or_else(|| format!("{name}@example.{tld}")),
        "credible": tld == "com",
    })
}

/// Log in and return the session cookie value
pub async fn login(server: &TestServer, payload: &Value) -> String {
    let response = server.post("/api/login").json(payload).await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

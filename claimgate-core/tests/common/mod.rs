//! Common test utilities for gate scenario tests

use std::sync::{Arc, Mutex};

use claimgate_core::{AuthGate, CodeMailer, MemoryRegistry, MemorySession, OpenIdCase, Registry};

/// Mailer that captures codes instead of sending them
#[derive(Default, Clone)]
pub struct MockMailer {
    /// Captured (code, address) pairs
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last code mailed to an address
    pub fn code_for(&self, address: &str) -> Option<String> {
        self.sent
            .lock()
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
            .lock()
            .unwrap()
            .push((code.to_string(), address.to_string()));
        Ok(())
    }
}

pub type TestGate = AuthGate<MemoryRegistry, MockMailer, MemorySession>;

/// A gate over fresh in-memory collaborators plus the capturing mailer
pub fn test_gate() -> (TestGate, MockMailer) {
    let mailer = MockMailer::new();
    let gate = AuthGate::new(
        Registry::new(MemoryRegistry::new(), mailer.clone()),
        MemorySession::new(),
    );
    (gate, mailer)
}

/// An authentication case in the style `https://example.<tld>/<name>`,
/// credible iff the tld is "com"
pub fn openid(tld: &str, name: &str, address: Option<&str>) -> OpenIdCase {
    let uri = format!("https://example.{tld}/{name}");
    OpenIdCase {
        claimed_id: uri.clone(),
        display_id: uri,
        email: Some(
            address
                .map(str::to_string)
                .unwrap_or_else(|| format!("{name}@example.{tld}")),
        ),
        credible: tld == "com",
    }
}

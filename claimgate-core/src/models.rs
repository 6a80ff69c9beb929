//! Data model for the claim registry

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How long a mailed confirmation code stays valid
pub fn code_ttl() -> Duration {
    Duration::hours(12)
}

/// Alphabet for confirmation codes (base32, no padding)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Length of a confirmation code in characters.
///
/// Eight base32 characters give 32^8 ≈ 1.1e12 possibilities, enough to make
/// guessing impractical within the 12-hour code lifetime.
const CODE_LEN: usize = 8;

/// Generate a random confirmation code
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Opaque stable identifier for one federated login identity
/// (the claimed identifier URI)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoginId(pub String);

impl LoginId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LoginId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque durable account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One successful external authentication, as handed over by the
/// OpenID relying-party layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdCase {
    /// The claimed identifier (stable key for the identity)
    pub claimed_id: String,
    /// Human-readable form of the identifier
    pub display_id: String,
    /// Email address asserted by the provider, if any
    pub email: Option<String>,
    /// Whether the provider's email assertion is trusted without proof
    pub credible: bool,
}

/// Snapshot of one login identity's registry state
#[derive(Debug, Clone)]
pub struct Login {
    pub id: LoginId,
    pub display_id: String,
    /// Linked account, if the identity has resolved to one
    pub account: Option<AccountId>,
    /// Current claimed address (normalized), at most one
    pub address: Option<String>,
    /// Proven by a mailed confirmation code
    pub confirmed: bool,
    /// Trusted at assertion time based on the provider
    pub credible: bool,
}

/// Normalize an email address: the domain part is case-insensitive and is
/// lower-cased, the local part is left untouched.
pub fn normalize_email(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => trimmed.to_string(),
    }
}

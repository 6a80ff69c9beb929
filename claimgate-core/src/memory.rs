//! In-memory reference implementations
//!
//! `MemoryRegistry` is the reference `RegistryStore` used by tests and by
//! deployments that do not need durability.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

use crate::error::AuthError;
use crate::models::{AccountId, Login, LoginId, OpenIdCase};
use crate::session::Session;
use crate::store::{RegistryStore, StoreResult};

#[derive(Debug, Clone)]
struct LoginRecord {
    display_id: String,
    account: Option<AccountId>,
    address: Option<String>,
    confirmed: bool,
    credible: bool,
}

#[derive(Debug, Clone)]
struct PendingCode {
    address: String,
    expires_at: DateTime<Utc>,
}

/// In-memory registry store
pub struct MemoryRegistry {
    logins: RwLock<HashMap<LoginId, LoginRecord>>,
    /// Known addresses and their assignment; a key with `None` is a known
    /// but free address
    assignments: RwLock<HashMap<String, Option<AccountId>>>,
    codes: RwLock<HashMap<String, PendingCode>>,
    next_account: AtomicU64,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            logins: RwLock::new(HashMap::new()),
            assignments: RwLock::new(HashMap::new()),
            codes: RwLock::new(HashMap::new()),
            next_account: AtomicU64::new(1),
        }
    }

    /// Pre-assign an address to an account (for seeding test fixtures)
    pub fn seed_assignment(&self, address: &str, account: AccountId) {
        self.assignments
            .write()
            .unwrap()
            .insert(address.to_string(), Some(account));
    }

    /// Overwrite a live code's expiration (for testing purposes)
    pub fn set_code_expiration(&self, code: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut codes = self.codes.write().unwrap();
        match codes.get_mut(code) {
            Some(pending) => {
                pending.expires_at = expires_at;
                Ok(())
            }
            None => Err(AuthError::Store(format!("unknown code {code}"))),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryStore for MemoryRegistry {
    fn note_openid(&self, case: &OpenIdCase) -> StoreResult<LoginId> {
        let id = LoginId(case.claimed_id.clone());
        let mut logins = self.logins.write().unwrap();
        logins.entry(id.clone()).or_insert_with(|| LoginRecord {
            display_id: case.display_id.clone(),
            account: None,
            address: None,
            confirmed: false,
            credible: false,
        });
        Ok(id)
    }

    fn get_login(&self, loginid: &LoginId) -> StoreResult<Login> {
        let logins = self.logins.read().unwrap();
        let rec = logins
            .get(loginid)
            .ok_or_else(|| AuthError::Store(format!("unknown login {loginid}")))?;
        Ok(Login {
            id: loginid.clone(),
            display_id: rec.display_id.clone(),
            account: rec.account,
            address: rec.address.clone(),
            confirmed: rec.confirmed,
            credible: rec.credible,
        })
    }

    fn loginids(&self, account: AccountId) -> StoreResult<Vec<LoginId>> {
        let logins = self.logins.read().unwrap();
        Ok(logins
            .iter()
            .filter(|(_, rec)| rec.account == Some(account))
            .map(|(id, _)| id.clone())
            .collect())
    }

    fn account(&self, loginid: &LoginId) -> StoreResult<Option<AccountId>> {
        let logins = self.logins.read().unwrap();
        Ok(logins.get(loginid).and_then(|rec| rec.account))
    }

    fn set_account(&self, loginid: &LoginId, account: AccountId) -> StoreResult<()> {
        let mut logins = self.logins.write().unwrap();
        match logins.get_mut(loginid) {
            Some(rec) => {
                rec.account = Some(account);
                Ok(())
            }
            None => Err(AuthError::Store(format!("unknown login {loginid}"))),
        }
    }

    fn create_account(&self, loginid: &LoginId) -> StoreResult<AccountId> {
        let account = AccountId(self.next_account.fetch_add(1, Ordering::SeqCst));
        self.set_account(loginid, account)?;
        Ok(account)
    }

    fn set_address(&self, loginid: &LoginId, address: &str, credible: bool) -> StoreResult<()> {
        let mut logins = self.logins.write().unwrap();
        match logins.get_mut(loginid) {
            Some(rec) => {
                if rec.address.as_deref() == Some(address) {
                    rec.credible |= credible;
                } else {
                    rec.address = Some(address.to_string());
                    rec.confirmed = false;
                    rec.credible = credible;
                }
                Ok(())
            }
            None => Err(AuthError::Store(format!("unknown login {loginid}"))),
        }
    }

    fn is_free_address(&self, address: &str) -> StoreResult<bool> {
        let assignments = self.assignments.read().unwrap();
        Ok(assignments.get(address).map_or(true, |a| a.is_none()))
    }

    fn assign(&self, address: &str, account: AccountId) -> StoreResult<bool> {
        let mut assignments = self.assignments.write().unwrap();
        let slot = assignments.entry(address.to_string()).or_insert(None);
        if slot.is_none() {
            *slot = Some(account);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn assigned_account(&self, address: &str) -> StoreResult<Option<AccountId>> {
        let assignments = self.assignments.read().unwrap();
        Ok(assignments.get(address).copied().flatten())
    }

    fn add_address(&self, account: AccountId, address: &str) -> StoreResult<bool> {
        let mut assignments = self.assignments.write().unwrap();
        let slot = assignments.entry(address.to_string()).or_insert(None);
        match slot {
            None => {
                *slot = Some(account);
                Ok(true)
            }
            Some(owner) => Ok(*owner == account),
        }
    }

    fn save_confirmation_code(&self, code: &str, address: &str, ttl: Duration) -> StoreResult<()> {
        let mut codes = self.codes.write().unwrap();
        if codes.contains_key(code) {
            return Err(AuthError::Store(format!("duplicate code {code}")));
        }
        codes.insert(
            code.to_string(),
            PendingCode {
                address: address.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    fn confirm_email(&self, loginid: &LoginId, code: &str) -> StoreResult<Option<String>> {
        // Lock codes for the whole validation so two concurrent confirms of
        // the same code cannot both succeed.
        let mut codes = self.codes.write().unwrap();
        let address = match codes.get(code).cloned() {
            Some(pending) if pending.expires_at > Utc::now() => pending.address,
            Some(_) => {
                codes.remove(code);
                return Ok(None);
            }
            None => return Ok(None),
        };

        let mut logins = self.logins.write().unwrap();
        let rec = logins
            .get_mut(loginid)
            .ok_or_else(|| AuthError::Store(format!("unknown login {loginid}")))?;
        if rec.address.as_deref() != Some(address.as_str()) {
            return Ok(None);
        }
        rec.confirmed = true;
        rec.credible = true;
        codes.remove(code);
        Ok(Some(address))
    }
}

/// In-memory per-caller session
pub struct MemorySession {
    loginid: RwLock<Option<LoginId>>,
    updates: AtomicU64,
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            loginid: RwLock::new(None),
            updates: AtomicU64::new(0),
        }
    }

    /// How many times the flush hook has fired
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MemorySession {
    fn loginid(&self) -> Option<LoginId> {
        self.loginid.read().unwrap().clone()
    }

    fn set_loginid(&self, loginid: &LoginId) {
        *self.loginid.write().unwrap() = Some(loginid.clone());
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self) {
        *self.loginid.write().unwrap() = None;
        self.updates.fetch_add(1, Ordering::SeqCst);
    }

    fn update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }
}

//! Registry storage abstraction

use chrono::Duration;

use crate::error::AuthError;
use crate::models::{AccountId, Login, LoginId, OpenIdCase};

/// Result type for store operations
pub type StoreResult<T> = Result<T, AuthError>;

/// Durable facts about login identities, address assignment, and
/// confirmation codes.
///
/// The store is the single source of truth. `assign` and `add_address` must
/// be implemented as compare-and-set operations: two identities may race to
/// claim the same free address, and exactly one may win. `confirm_email`
/// must consume a code at most once across concurrent validations.
pub trait RegistryStore: Send + Sync {
    /// Get or create the identity for a claimed identifier. Idempotent:
    /// repeated calls with the same `claimed_id` return the same id and do
    /// not duplicate any claim state.
    fn note_openid(&self, case: &OpenIdCase) -> StoreResult<LoginId>;

    /// Snapshot one identity's state
    fn get_login(&self, loginid: &LoginId) -> StoreResult<Login>;

    /// All identities linked to an account
    fn loginids(&self, account: AccountId) -> StoreResult<Vec<LoginId>>;

    /// The identity's linked account, if any
    fn account(&self, loginid: &LoginId) -> StoreResult<Option<AccountId>>;

    /// Link an identity to an existing account
    fn set_account(&self, loginid: &LoginId, account: AccountId) -> StoreResult<()>;

    /// Allocate a fresh account and link the identity to it. Never reuses
    /// an id; allocates exactly one account per call.
    fn create_account(&self, loginid: &LoginId) -> StoreResult<AccountId>;

    /// Record `address` (already normalized) as the identity's current
    /// claim, with the provider's credibility flag. Replacing a claim
    /// resets its confirmed state; re-asserting the current address never
    /// downgrades credibility.
    fn set_address(&self, loginid: &LoginId, address: &str, credible: bool) -> StoreResult<()>;

    /// True iff no account currently holds an assignment for the address
    fn is_free_address(&self, address: &str) -> StoreResult<bool>;

    /// Assign the address to the account iff it is currently free.
    /// Returns whether the assignment was made; an existing assignment is
    /// never overwritten.
    fn assign(&self, address: &str, account: AccountId) -> StoreResult<bool>;

    /// The account currently holding the address, if any
    fn assigned_account(&self, address: &str) -> StoreResult<Option<AccountId>>;

    /// Assign the address to the account iff it is free or already held by
    /// that same account. Returns whether the address now belongs to
    /// `account`.
    fn add_address(&self, account: AccountId, address: &str) -> StoreResult<bool>;

    /// Persist a confirmation code bound to an address, expiring after
    /// `ttl`. Code values are unique while live.
    fn save_confirmation_code(&self, code: &str, address: &str, ttl: Duration) -> StoreResult<()>;

    /// Validate a code against the identity's current claim. On success the
    /// claim is marked confirmed + credible, the code is consumed, and the
    /// bound address is returned. A missing or expired code, or a code
    /// bound to an address other than the identity's current claim, yields
    /// `None` and mutates nothing.
    fn confirm_email(&self, loginid: &LoginId, code: &str) -> StoreResult<Option<String>>;
}

/// Allow a shared store to be used wherever an owned one is expected
impl<S: RegistryStore + ?Sized> RegistryStore for std::sync::Arc<S> {
    fn note_openid(&self, case: &OpenIdCase) -> StoreResult<LoginId> {
        (**self).note_openid(case)
    }

    fn get_login(&self, loginid: &LoginId) -> StoreResult<Login> {
        (**self).get_login(loginid)
    }

    fn loginids(&self, account: AccountId) -> StoreResult<Vec<LoginId>> {
        (**self).loginids(account)
    }

    fn account(&self, loginid: &LoginId) -> StoreResult<Option<AccountId>> {
        (**self).account(loginid)
    }

    fn set_account(&self, loginid: &LoginId, account: AccountId) -> StoreResult<()> {
        (**self).set_account(loginid, account)
    }

    fn create_account(&self, loginid: &LoginId) -> StoreResult<AccountId> {
        (**self).create_account(loginid)
    }

    fn set_address(&self, loginid: &LoginId, address: &str, credible: bool) -> StoreResult<()> {
        (**self).set_address(loginid, address, credible)
    }

    fn is_free_address(&self, address: &str) -> StoreResult<bool> {
        (**self).is_free_address(address)
    }

    fn assign(&self, address: &str, account: AccountId) -> StoreResult<bool> {
        (**self).assign(address, account)
    }

    fn assigned_account(&self, address: &str) -> StoreResult<Option<AccountId>> {
        (**self).assigned_account(address)
    }

    fn add_address(&self, account: AccountId, address: &str) -> StoreResult<bool> {
        (**self).add_address(account, address)
    }

    fn save_confirmation_code(&self, code: &str, address: &str, ttl: Duration) -> StoreResult<()> {
        (**self).save_confirmation_code(code, address, ttl)
    }

    fn confirm_email(&self, loginid: &LoginId, code: &str) -> StoreResult<Option<String>> {
        (**self).confirm_email(loginid, code)
    }
}

//! Session-bound façade exposing the public command surface

use std::collections::BTreeSet;

use crate::error::AuthError;
use crate::mailer::CodeMailer;
use crate::models::{normalize_email, AccountId, LoginId, OpenIdCase};
use crate::registry::Registry;
use crate::session::Session;
use crate::store::RegistryStore;
use crate::Result;

/// Composes the registry with one caller's session.
///
/// All account-affecting commands flow through here; the session is only
/// updated once the underlying registry operation has succeeded.
pub struct AuthGate<S: RegistryStore, M: CodeMailer, N: Session> {
    registry: Registry<S, M>,
    session: N,
}

impl<S: RegistryStore, M: CodeMailer, N: Session> AuthGate<S, M, N> {
    pub fn new(registry: Registry<S, M>, session: N) -> Self {
        Self { registry, session }
    }

    pub fn registry(&self) -> &Registry<S, M> {
        &self.registry
    }

    /// The session's active identity, if any
    pub fn loginid(&self) -> Option<LoginId> {
        self.session.loginid()
    }

    /// The active identity's account, if any
    pub fn account(&self) -> Result<Option<AccountId>> {
        match self.session.loginid() {
            Some(loginid) => self.registry.store().account(&loginid),
            None => Ok(None),
        }
    }

    /// Switch the session to a newly authenticated identity, merging
    /// account state with the previous identity when unambiguous.
    ///
    /// On `AccountConflict` the session keeps its previous identity.
    pub fn login(&self, case: &OpenIdCase) -> Result<()> {
        let new = self.registry.handle_openid(case)?;
        let previous = self.session.loginid();
        self.registry.join_logins(previous.as_ref(), &new)?;
        self.registry.remind_pending_claim(&new)?;
        self.session.set_loginid(&new);
        Ok(())
    }

    /// Clear the session's identity; durable state is untouched
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Issue a confirmation code for an address. Works while anonymous;
    /// when an identity is active the address also becomes its current
    /// claim (unless the identity is already account-linked to a
    /// different address, whose claim is immutable).
    pub fn claim(&self, address: &str) -> Result<()> {
        let address = normalize_email(address);
        if let Some(loginid) = self.session.loginid() {
            let login = self.registry.store().get_login(&loginid)?;
            let replaces_linked_claim = login.account.is_some()
                && login.address.is_some()
                && login.address.as_deref() != Some(address.as_str());
            if !replaces_linked_claim {
                self.registry
                    .store()
                    .set_address(&loginid, &address, false)?;
            }
        }
        self.registry.issue_code(&address)
    }

    /// Whether proof of address ownership is mandatory before the active
    /// identity may proceed. False while anonymous.
    pub fn confirmation_required(&self) -> Result<bool> {
        match self.session.loginid() {
            Some(loginid) => self.registry.login_view(&loginid)?.confirmation_required(),
            None => Ok(false),
        }
    }

    /// Whether the active identity may originate a new account
    pub fn can_create_account(&self) -> Result<bool> {
        match self.session.loginid() {
            Some(loginid) => self.registry.login_view(&loginid)?.can_create_account(),
            None => Ok(false),
        }
    }

    /// Allocate a new account for the active identity
    pub fn create_account(&self) -> Result<AccountId> {
        let loginid = self.session.loginid().ok_or(AuthError::NotLoggedIn)?;
        let view = self.registry.login_view(&loginid)?;
        if view.account().is_some() {
            return Err(AuthError::AccountAlreadyExists);
        }
        if !view.can_create_account()? {
            return Err(AuthError::AccountCreationDenied);
        }
        let account = view.create_account()?;
        self.session.update();
        Ok(account)
    }

    /// Validate a mailed confirmation code for the active identity.
    /// Returns the confirmed address.
    pub fn confirm_email(&self, code: &str) -> Result<String> {
        let loginid = self.session.loginid().ok_or(AuthError::NotLoggedIn)?;
        let address = self.registry.confirm_email(code, &loginid)?;
        // An account may have just become linked
        self.session.update();
        Ok(address)
    }

    /// Distinct claimed addresses across the active identity's account
    /// equivalence class
    pub fn addresses(&self) -> Result<Vec<String>> {
        let (all, _) = self.class_claims()?;
        Ok(all.into_iter().collect())
    }

    /// Claimed addresses not yet confirmed by any identity in the class
    pub fn addresses_pending(&self) -> Result<Vec<String>> {
        let (all, confirmed) = self.class_claims()?;
        Ok(all.difference(&confirmed).cloned().collect())
    }

    /// Addresses confirmed by at least one identity in the class
    pub fn addresses_confirmed(&self) -> Result<Vec<String>> {
        let (_, confirmed) = self.class_claims()?;
        Ok(confirmed.into_iter().collect())
    }

    /// All identities reachable via the active identity's account, or just
    /// the identity itself when unlinked
    fn class_loginids(&self) -> Result<Vec<LoginId>> {
        let Some(loginid) = self.session.loginid() else {
            return Ok(Vec::new());
        };
        match self.registry.store().account(&loginid)? {
            Some(account) => self.registry.store().loginids(account),
            None => Ok(vec![loginid]),
        }
    }

    /// Claimed addresses across the class, with the subset confirmed by
    /// any class member. An address confirmed by one identity counts as
    /// confirmed for the whole class.
    fn class_claims(&self) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        let mut all = BTreeSet::new();
        let mut confirmed = BTreeSet::new();
        for loginid in self.class_loginids()? {
            let login = self.registry.store().get_login(&loginid)?;
            if let Some(address) = login.address {
                if login.confirmed {
                    confirmed.insert(address.clone());
                }
                all.insert(address);
            }
        }
        Ok((all, confirmed))
    }
}

//! Claim issuance, confirmation-code lifecycle, and account joining

use crate::error::AuthError;
use crate::mailer::CodeMailer;
use crate::models::{code_ttl, generate_code, normalize_email, LoginId, OpenIdCase};
use crate::store::RegistryStore;
use crate::view::LoginView;
use crate::Result;

/// The claim/confirmation protocol over an injected store and mailer.
pub struct Registry<S: RegistryStore, M: CodeMailer> {
    store: S,
    mailer: M,
}

impl<S: RegistryStore, M: CodeMailer> Registry<S, M> {
    pub fn new(store: S, mailer: M) -> Self {
        Self { store, mailer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build the decision view for one identity
    pub fn login_view(&self, loginid: &LoginId) -> Result<LoginView<'_, S>> {
        let login = self.store.get_login(loginid)?;
        Ok(LoginView::new(&self.store, login))
    }

    /// Record a successful external authentication: get-or-create the
    /// identity and note its asserted address. Idempotent per claimed id.
    ///
    /// An account-linked identity asserting an address different from its
    /// current claim keeps the existing claim; linked claims are immutable.
    pub fn handle_openid(&self, case: &OpenIdCase) -> Result<LoginId> {
        let loginid = self.store.note_openid(case)?;
        if let Some(raw) = case.email.as_deref() {
            let address = normalize_email(raw);
            let login = self.store.get_login(&loginid)?;
            let replaces_linked_claim = login.account.is_some()
                && login.address.is_some()
                && login.address.as_deref() != Some(address.as_str());
            if replaces_linked_claim {
                tracing::warn!(
                    login = %loginid,
                    "ignoring address asserted for an account-linked identity"
                );
            } else {
                self.store.set_address(&loginid, &address, case.credible)?;
            }
        }
        Ok(loginid)
    }

    /// Reconcile the session's prior identity with a newly authenticated
    /// one. Two identities holding distinct accounts are never merged;
    /// when exactly one side has an account the other is absorbed into it.
    pub fn join_logins(&self, previous: Option<&LoginId>, new: &LoginId) -> Result<()> {
        let Some(previous) = previous else {
            return Ok(());
        };
        if previous == new {
            return Ok(());
        }
        let prev_account = self.store.account(previous)?;
        let new_account = self.store.account(new)?;
        match (prev_account, new_account) {
            (Some(a), Some(b)) if a != b => Err(AuthError::AccountConflict),
            (Some(a), None) => self.store.set_account(new, a),
            (None, Some(b)) => self.store.set_account(previous, b),
            _ => Ok(()),
        }
    }

    /// Re-issue a confirmation code for the identity's unconfirmed claim.
    ///
    /// Skipped when the identity and its address already resolve to the
    /// same account (confirmation is redundant) or to two different
    /// accounts (a conflict confirmation alone cannot resolve).
    pub fn remind_pending_claim(&self, loginid: &LoginId) -> Result<()> {
        let login = self.store.get_login(loginid)?;
        if login.confirmed {
            return Ok(());
        }
        let Some(address) = login.address else {
            return Ok(());
        };
        let assigned = self.store.assigned_account(&address)?;
        match (login.account, assigned) {
            (Some(_), Some(_)) => Ok(()),
            _ => self.issue_code(&address),
        }
    }

    /// Generate, persist, and mail a confirmation code for an address
    /// (already normalized).
    ///
    /// The code is durably recorded before the send; a delivery failure
    /// only delays confirmation and never rolls the code back.
    pub fn issue_code(&self, address: &str) -> Result<()> {
        let code = generate_code();
        self.store.save_confirmation_code(&code, address, code_ttl())?;
        if let Err(err) = self.mailer.send_code(&code, address) {
            tracing::warn!(%address, error = %err, "confirmation code delivery failed");
        }
        Ok(())
    }

    /// Validate a mailed code for the identity and update account linkage
    /// with the now-proven address ownership. Returns the confirmed
    /// address.
    pub fn confirm_email(&self, code: &str, loginid: &LoginId) -> Result<String> {
        let address = self
            .store
            .confirm_email(loginid, code)?
            .ok_or(AuthError::InvalidConfirmationCode)?;
        match self.store.account(loginid)? {
            Some(account) => {
                if !self.store.add_address(account, &address)? {
                    return Err(AuthError::AddressAccountConflict);
                }
            }
            None => {
                // Ownership is proven now, so adopting the address's
                // account is safe
                if let Some(owner) = self.store.assigned_account(&address)? {
                    self.store.set_account(loginid, owner)?;
                }
            }
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;
    use crate::models::AccountId;
    use std::sync::Mutex;

    /// Mailer that captures codes instead of sending them
    #[derive(Default)]
    struct CapturingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl CapturingMailer {
        fn last_code(&self) -> Option<String> {
            self.sent.lock().unwrap().last().map(|(c, _)| c.clone())
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl CodeMailer for &CapturingMailer {
        fn send_code(&self, code: &str, address: &str) -> std::result::Result<(), String> {
            self.sent
                .lock()
                .unwrap()
                .push((code.to_string(), address.to_string()));
            Ok(())
        }
    }

    fn case(name: &str, email: &str) -> OpenIdCase {
        OpenIdCase {
            claimed_id: format!("https://example.com/{name}"),
            display_id: format!("https://example.com/{name}"),
            email: Some(email.to_string()),
            credible: true,
        }
    }

    fn registry(mailer: &CapturingMailer) -> Registry<MemoryRegistry, &CapturingMailer> {
        Registry::new(MemoryRegistry::new(), mailer)
    }

    #[test]
    fn test_handle_openid_normalizes_address() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry
            .handle_openid(&case("joe", "Joe@Example.COM"))
            .unwrap();
        let login = registry.store().get_login(&id).unwrap();
        assert_eq!(login.address.as_deref(), Some("Joe@example.com"));
        assert!(login.credible);
        assert!(!login.confirmed);
    }

    #[test]
    fn test_handle_openid_twice_is_idempotent() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let first = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        let second = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        assert_eq!(first, second);
        let login = registry.store().get_login(&second).unwrap();
        assert_eq!(login.address.as_deref(), Some("joe@example.com"));
    }

    #[test]
    fn test_linked_identity_keeps_existing_claim() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        registry.store().create_account(&id).unwrap();

        let again = registry.handle_openid(&case("joe", "new@example.com")).unwrap();
        assert_eq!(id, again);
        let login = registry.store().get_login(&id).unwrap();
        assert_eq!(login.address.as_deref(), Some("joe@example.com"));
    }

    #[test]
    fn test_join_logins_conflict_mutates_nothing() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let a = registry.handle_openid(&case("a", "a@example.com")).unwrap();
        let b = registry.handle_openid(&case("b", "b@example.com")).unwrap();
        let acct_a = registry.store().create_account(&a).unwrap();
        let acct_b = registry.store().create_account(&b).unwrap();

        let err = registry.join_logins(Some(&a), &b).unwrap_err();
        assert_eq!(err, AuthError::AccountConflict);
        assert_eq!(registry.store().account(&a).unwrap(), Some(acct_a));
        assert_eq!(registry.store().account(&b).unwrap(), Some(acct_b));
    }

    #[test]
    fn test_join_logins_absorbs_in_both_directions() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let a = registry.handle_openid(&case("a", "a@example.com")).unwrap();
        let b = registry.handle_openid(&case("b", "b@example.com")).unwrap();
        let acct = registry.store().create_account(&a).unwrap();

        registry.join_logins(Some(&a), &b).unwrap();
        assert_eq!(registry.store().account(&b).unwrap(), Some(acct));

        let c = registry.handle_openid(&case("c", "c@example.com")).unwrap();
        registry.join_logins(Some(&c), &a).unwrap();
        assert_eq!(registry.store().account(&c).unwrap(), Some(acct));
    }

    #[test]
    fn test_join_logins_without_accounts_is_noop() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let a = registry.handle_openid(&case("a", "a@example.com")).unwrap();
        let b = registry.handle_openid(&case("b", "b@example.com")).unwrap();
        registry.join_logins(Some(&a), &b).unwrap();
        assert_eq!(registry.store().account(&a).unwrap(), None);
        assert_eq!(registry.store().account(&b).unwrap(), None);
    }

    #[test]
    fn test_remind_issues_code_for_unconfirmed_claim() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        registry.remind_pending_claim(&id).unwrap();
        assert_eq!(mailer.sent_count(), 1);
    }

    #[test]
    fn test_remind_skips_when_identity_and_address_share_account() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        let acct = registry.store().create_account(&id).unwrap();
        registry.store().assign("joe@example.com", acct).unwrap();

        registry.remind_pending_claim(&id).unwrap();
        assert_eq!(mailer.sent_count(), 0);
    }

    #[test]
    fn test_remind_skips_on_cross_account_conflict() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        registry.store().create_account(&id).unwrap();
        registry
            .store()
            .seed_assignment("joe@example.com", AccountId(99));

        registry.remind_pending_claim(&id).unwrap();
        assert_eq!(mailer.sent_count(), 0);
    }

    #[test]
    fn test_remind_skips_confirmed_claim() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        registry.issue_code("joe@example.com").unwrap();
        let code = mailer.last_code().unwrap();
        registry.confirm_email(&code, &id).unwrap();

        registry.remind_pending_claim(&id).unwrap();
        assert_eq!(mailer.sent_count(), 1);
    }

    #[test]
    fn test_confirm_unknown_code_fails() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        let err = registry.confirm_email("NOSUCHCO", &id).unwrap_err();
        assert_eq!(err, AuthError::InvalidConfirmationCode);
        assert!(!registry.store().get_login(&id).unwrap().confirmed);
    }

    #[test]
    fn test_confirm_adopts_owning_account() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "admin@example.org")).unwrap();
        registry
            .store()
            .seed_assignment("admin@example.org", AccountId(1));
        registry.remind_pending_claim(&id).unwrap();
        let code = mailer.last_code().unwrap();

        registry.confirm_email(&code, &id).unwrap();
        assert_eq!(registry.store().account(&id).unwrap(), Some(AccountId(1)));
        let login = registry.store().get_login(&id).unwrap();
        assert!(login.confirmed);
        assert!(login.credible);
    }

    #[test]
    fn test_confirm_extends_own_account() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "joe@example.com")).unwrap();
        let acct = registry.store().create_account(&id).unwrap();
        registry.issue_code("joe@example.com").unwrap();
        let code = mailer.last_code().unwrap();

        registry.confirm_email(&code, &id).unwrap();
        assert_eq!(
            registry.store().assigned_account("joe@example.com").unwrap(),
            Some(acct)
        );
    }

    #[test]
    fn test_confirm_against_foreign_account_conflicts() {
        let mailer = CapturingMailer::default();
        let registry = registry(&mailer);

        let id = registry.handle_openid(&case("joe", "admin@example.org")).unwrap();
        registry.store().create_account(&id).unwrap();
        registry
            .store()
            .seed_assignment("admin@example.org", AccountId(50));
        registry.issue_code("admin@example.org").unwrap();
        let code = mailer.last_code().unwrap();

        let err = registry.confirm_email(&code, &id).unwrap_err();
        assert_eq!(err, AuthError::AddressAccountConflict);
        assert_eq!(
            registry.store().assigned_account("admin@example.org").unwrap(),
            Some(AccountId(50))
        );
    }
}

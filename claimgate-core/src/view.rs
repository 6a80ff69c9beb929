//! Read/decision view scoped to one login identity

use crate::models::{AccountId, Login};
use crate::store::RegistryStore;
use crate::Result;

/// Eligibility and claim state for a single identity.
///
/// Holds a snapshot of the identity plus a store handle for the address
/// ownership lookups the decisions depend on.
pub struct LoginView<'a, S: RegistryStore> {
    store: &'a S,
    login: Login,
}

impl<'a, S: RegistryStore> LoginView<'a, S> {
    pub fn new(store: &'a S, login: Login) -> Self {
        Self { store, login }
    }

    /// Current linked account, if any
    pub fn account(&self) -> Option<AccountId> {
        self.login.account
    }

    /// Current claimed address, if any
    pub fn address(&self) -> Option<&str> {
        self.login.address.as_deref()
    }

    /// Whether the claim is proven by a mailed code
    pub fn confirmed(&self) -> bool {
        self.login.confirmed
    }

    /// Whether the claim was trusted at assertion time
    pub fn credible(&self) -> bool {
        self.login.credible
    }

    /// True iff this identity cannot originate a new account: it has no
    /// account of its own and its claimed address already belongs to one,
    /// so it must be joined to the address's owner instead.
    pub fn must_join_account(&self) -> Result<bool> {
        if self.login.account.is_some() {
            return Ok(false);
        }
        match self.address() {
            Some(address) => Ok(self.store.assigned_account(address)?.is_some()),
            None => Ok(false),
        }
    }

    /// True iff the identity has a claimed, unconfirmed address that is
    /// already assigned to some account. Proof is mandatory before any
    /// account interaction proceeds: an unproven claim against an owned
    /// address could be an impersonation attempt.
    pub fn confirmation_required(&self) -> Result<bool> {
        if self.login.confirmed {
            return Ok(false);
        }
        match self.address() {
            Some(address) => Ok(self.store.assigned_account(address)?.is_some()),
            None => Ok(false),
        }
    }

    /// True iff the identity may originate a new account: it has none yet,
    /// its address (if any) is free, and no confirmation is outstanding.
    pub fn can_create_account(&self) -> Result<bool> {
        if self.login.account.is_some() {
            return Ok(false);
        }
        if let Some(address) = self.address() {
            if !self.store.is_free_address(address)? {
                return Ok(false);
            }
        }
        Ok(!self.confirmation_required()?)
    }

    /// Allocate a new account for this identity and assign its claimed
    /// address to the account if the address is still free.
    ///
    /// Eligibility is the caller's contract (`can_create_account`); a store
    /// that cannot allocate an id is a collaborator failure, not a user
    /// error.
    pub fn create_account(&self) -> Result<AccountId> {
        let account = self.store.create_account(&self.login.id)?;
        if let Some(address) = self.address() {
            if self.store.is_free_address(address)? {
                // CAS assign; losing the race leaves the address with its
                // new owner untouched
                self.store.assign(address, account)?;
            }
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;
    use crate::models::{LoginId, OpenIdCase};

    fn store_with_login(email: Option<&str>) -> (MemoryRegistry, LoginId) {
        let store = MemoryRegistry::new();
        let case = OpenIdCase {
            claimed_id: "https://example.com/joe".to_string(),
            display_id: "https://example.com/joe".to_string(),
            email: email.map(str::to_string),
            credible: true,
        };
        let id = store.note_openid(&case).unwrap();
        if let Some(address) = &case.email {
            store.set_address(&id, address, case.credible).unwrap();
        }
        (store, id)
    }

    fn view_of<'a>(store: &'a MemoryRegistry, id: &LoginId) -> LoginView<'a, MemoryRegistry> {
        LoginView::new(store, store.get_login(id).unwrap())
    }

    #[test]
    fn test_fresh_identity_with_free_address_can_create() {
        let (store, id) = store_with_login(Some("joe@example.com"));
        let view = view_of(&store, &id);

        assert!(view.can_create_account().unwrap());
        assert!(!view.must_join_account().unwrap());
        assert!(!view.confirmation_required().unwrap());
    }

    #[test]
    fn test_identity_without_address_can_create() {
        let (store, id) = store_with_login(None);
        let view = view_of(&store, &id);

        assert!(view.can_create_account().unwrap());
        assert!(!view.confirmation_required().unwrap());
    }

    #[test]
    fn test_owned_address_forces_join_and_confirmation() {
        let (store, id) = store_with_login(Some("admin@example.org"));
        store.seed_assignment("admin@example.org", AccountId(7));
        let view = view_of(&store, &id);

        assert!(view.must_join_account().unwrap());
        assert!(view.confirmation_required().unwrap());
        assert!(!view.can_create_account().unwrap());
    }

    #[test]
    fn test_linked_identity_cannot_create() {
        let (store, id) = store_with_login(Some("joe@example.com"));
        store.create_account(&id).unwrap();
        let view = view_of(&store, &id);

        assert!(view.account().is_some());
        assert!(!view.can_create_account().unwrap());
        assert!(!view.must_join_account().unwrap());
    }

    #[test]
    fn test_create_account_assigns_free_address() {
        let (store, id) = store_with_login(Some("joe@example.com"));
        let view = view_of(&store, &id);

        let account = view.create_account().unwrap();
        assert_eq!(store.account(&id).unwrap(), Some(account));
        assert_eq!(
            store.assigned_account("joe@example.com").unwrap(),
            Some(account)
        );
    }

    #[test]
    fn test_create_account_leaves_taken_address_alone() {
        let (store, id) = store_with_login(Some("joe@example.com"));
        store.seed_assignment("joe@example.com", AccountId(9));
        let view = view_of(&store, &id);

        let account = view.create_account().unwrap();
        assert_ne!(account, AccountId(9));
        assert_eq!(
            store.assigned_account("joe@example.com").unwrap(),
            Some(AccountId(9))
        );
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;

use crate::error::{AppError, AppResult};

use super::account::{Account, AccountId, Role};

/// In-memory account store. Owns every `Account` record; accounts are keyed
/// by id with a secondary email index for registration and login lookups.
/// The id counter lives under the same lock as the maps, so the duplicate
/// check, id allocation and insert of `register` form one atomic step.
#[derive(Clone, Default)]
pub struct AccountStore(Arc<Mutex<AccountsInner>>);

#[derive(Default)]
struct AccountsInner {
    by_id: HashMap<AccountId, Account>,
    email_index: HashMap<String, AccountId>,
    next_id: AccountId,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new account under `email`. The caller hashes the password;
    /// this method only rejects duplicates and allocates the id.
    pub fn insert(&self, email: &str, password_hash: String, role: Role) -> AppResult<Account> {
        let mut inner = self.0.lock();
        if inner.email_index.contains_key(email) {
            return Err(AppError::duplicate("email already registered"));
        }
        inner.next_id += 1;
        let account = Account {
            id: inner.next_id,
            email: email.to_string(),
            password_hash,
            role,
        };
        inner.email_index.insert(email.to_string(), account.id);
        inner.by_id.insert(account.id, account.clone());
        Ok(account)
    }

    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        let inner = self.0.lock();
        let id = inner.email_index.get(email)?;
        inner.by_id.get(id).cloned()
    }

    pub fn find_by_id(&self, id: AccountId) -> Option<Account> {
        self.0.lock().by_id.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

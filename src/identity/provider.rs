// Keep provider request/response plain Rust structs to avoid serde requirements on Session
use crate::error::{AppError, AppResult};
use crate::security;
use crate::tprintln;

use super::account::{Account, Role};
use super::session::{Session, SessionManager};
use super::store::AccountStore;

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub session: Session,
    pub account: Account,
}

pub trait AuthProvider: Send + Sync {
    fn register(&self, req: &RegisterRequest) -> AppResult<Account>;
    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;
}

/// Credential service over the in-process account store. Registration hashes
/// with Argon2 and defers the duplicate check to the store's atomic insert;
/// login verifies the stored PHC hash and issues a session on success.
pub struct LocalAuthProvider {
    pub accounts: AccountStore,
    pub sm: SessionManager,
}

impl LocalAuthProvider {
    pub fn new(accounts: AccountStore, sm: SessionManager) -> Self { Self { accounts, sm } }
}

impl AuthProvider for LocalAuthProvider {
    fn register(&self, req: &RegisterRequest) -> AppResult<Account> {
        if req.email.is_empty() || req.password.is_empty() {
            return Err(AppError::invalid_input("email and password are required"));
        }
        let Some(role) = Role::parse(&req.role) else {
            return Err(AppError::invalid_input("role must be teacher or student"));
        };
        // Hash outside the store lock; Argon2 dominates the cost of this path.
        let phc = security::hash_password(&req.password)?;
        let account = self.accounts.insert(&req.email, phc, role)?;
        tprintln!("auth.register account={} role={}", account.id, account.role);
        Ok(account)
    }

    fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        let Some(account) = self.accounts.find_by_email(&req.email) else {
            return Err(AppError::invalid_credentials());
        };
        if !security::verify_password(&account.password_hash, &req.password) {
            return Err(AppError::invalid_credentials());
        }
        let session = self.sm.issue(account.id);
        tprintln!("auth.login account={}", account.id);
        Ok(LoginResponse { session, account })
    }
}

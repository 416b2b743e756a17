use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::RwLock;
use base64::Engine;
use crate::tprintln;

use super::account::AccountId;

pub type SessionToken = String;

/// Resolution of a presented session token. A request context is either
/// anonymous or bound to exactly one verified account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(AccountId),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub account_id: AccountId,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

fn gen_token() -> String {
    // 256-bit random token base64url without padding
    let mut buf = [0u8; 32];
    let _ = getrandom::getrandom(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// Issues and validates session tokens. Holds only account ids, never the
/// account records themselves; the store is consulted at resolve time.
#[derive(Clone)]
pub struct SessionManager {
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn issue(&self, account_id: AccountId) -> Session {
        let now = Instant::now();
        let sess = Session {
            token: gen_token(),
            account_id,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions.write().insert(sess.token.clone(), sess.clone());
        tprintln!("session.issue account={} ttl_secs={}", account_id, self.ttl.as_secs());
        sess
    }

    /// Resolve a presented token. Expired entries are dropped on observation.
    pub fn resolve(&self, token: Option<&str>) -> SessionState {
        let Some(token) = token else { return SessionState::Anonymous; };
        let now = Instant::now();
        let mut drop_key: Option<String> = None;
        let out = {
            let map = self.sessions.read();
            match map.get(token) {
                Some(sess) if sess.expires_at > now => SessionState::Authenticated(sess.account_id),
                Some(_) => {
                    drop_key = Some(token.to_string());
                    SessionState::Anonymous
                }
                None => SessionState::Anonymous,
            }
        };
        if let Some(k) = drop_key {
            self.sessions.write().remove(&k);
        }
        out
    }

    pub fn logout(&self, token: &str) -> bool {
        let removed = self.sessions.write().remove(token).is_some();
        if removed {
            tprintln!("session.logout token_len={}", token.len());
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_resolve() {
        let sm = SessionManager::default();
        let sess = sm.issue(7);
        assert_eq!(sm.resolve(Some(&sess.token)), SessionState::Authenticated(7));
    }

    #[test]
    fn unknown_and_absent_tokens_are_anonymous() {
        let sm = SessionManager::default();
        assert_eq!(sm.resolve(None), SessionState::Anonymous);
        assert_eq!(sm.resolve(Some("no-such-token")), SessionState::Anonymous);
    }

    #[test]
    fn expired_token_stops_resolving() {
        let sm = SessionManager::new(Duration::ZERO);
        let sess = sm.issue(3);
        assert_eq!(sm.resolve(Some(&sess.token)), SessionState::Anonymous);
        // pruned on observation: a second resolve still sees nothing
        assert_eq!(sm.resolve(Some(&sess.token)), SessionState::Anonymous);
    }

    #[test]
    fn logout_invalidates_token() {
        let sm = SessionManager::default();
        let sess = sm.issue(5);
        assert!(sm.logout(&sess.token));
        assert!(!sm.logout(&sess.token));
        assert_eq!(sm.resolve(Some(&sess.token)), SessionState::Anonymous);
    }

    #[test]
    fn tokens_are_unique_and_opaque() {
        let sm = SessionManager::default();
        let a = sm.issue(1);
        let b = sm.issue(1);
        assert_ne!(a.token, b.token);
        // both sessions stay valid for the same account
        assert_eq!(sm.resolve(Some(&a.token)), SessionState::Authenticated(1));
        assert_eq!(sm.resolve(Some(&b.token)), SessionState::Authenticated(1));
    }
}

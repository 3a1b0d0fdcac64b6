//! Refresh-token revocation list. Tokens are short-lived and the set only
//! grows by one entry per rotation, so an in-memory set is enough; a restart
//! forgetting it just means an already-rotated token gets one more use window
//! bounded by its own expiry.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

static REVOKED: Lazy<RwLock<HashSet<String>>> = Lazy::new(|| RwLock::new(HashSet::new()));

pub fn revoke(jti: &str) {
    REVOKED
        .write()
        .expect("revocation set poisoned")
        .insert(jti.to_string());
}

pub fn is_revoked(jti: &str) -> bool {
    REVOKED
        .read()
        .expect("revocation set poisoned")
        .contains(jti)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoked_jti_is_remembered() {
        assert!(!is_revoked("jti-test-1"));
        revoke("jti-test-1");
        assert!(is_revoked("jti-test-1"));
    }
}

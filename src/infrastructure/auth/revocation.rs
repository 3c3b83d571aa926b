//! Token revocation state
//!
//! Logout blacklists individual token ids; logout-all sets a per-user
//! not-before watermark that invalidates every token issued strictly
//! before it. State is in-memory and scoped to the process lifetime.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory blacklist and per-user watermark store
#[derive(Debug, Default)]
pub struct RevocationStore {
    blacklist: Mutex<HashSet<String>>,
    not_before: Mutex<HashMap<Uuid, i64>>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blacklist a single token id.
    pub fn revoke_token(&self, jti: &str) {
        self.blacklist.lock().unwrap().insert(jti.to_string());
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.blacklist.lock().unwrap().contains(jti)
    }

    /// Invalidate every token for the user issued before `timestamp`.
    /// Later watermarks win; an earlier logout-all never un-revokes.
    pub fn revoke_all_before(&self, user_id: Uuid, timestamp: i64) {
        let mut map = self.not_before.lock().unwrap();
        let entry = map.entry(user_id).or_insert(timestamp);
        if *entry < timestamp {
            *entry = timestamp;
        }
    }

    /// True when a token issued at `issued_at` falls behind the user's
    /// watermark. Tokens issued at the watermark instant remain valid.
    pub fn is_before_watermark(&self, user_id: Uuid, issued_at: i64) -> bool {
        self.not_before
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|wm| issued_at < *wm)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_is_per_token() {
        let store = RevocationStore::new();
        store.revoke_token("a");
        assert!(store.is_revoked("a"));
        assert!(!store.is_revoked("b"));
    }

    #[test]
    fn watermark_rejects_strictly_older_tokens_only() {
        let store = RevocationStore::new();
        let user = Uuid::new_v4();
        store.revoke_all_before(user, 1000);

        assert!(store.is_before_watermark(user, 999));
        assert!(!store.is_before_watermark(user, 1000));
        assert!(!store.is_before_watermark(user, 1001));
    }

    #[test]
    fn watermark_is_per_user() {
        let store = RevocationStore::new();
        let u = Uuid::new_v4();
        let v = Uuid::new_v4();
        store.revoke_all_before(u, 1000);

        assert!(store.is_before_watermark(u, 500));
        assert!(!store.is_before_watermark(v, 500));
    }

    #[test]
    fn watermark_never_moves_backwards() {
        let store = RevocationStore::new();
        let user = Uuid::new_v4();
        store.revoke_all_before(user, 1000);
        store.revoke_all_before(user, 900);

        assert!(store.is_before_watermark(user, 950));
    }
}

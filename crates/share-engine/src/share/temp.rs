//! Temp shares: files shared outside the indexed tree, usually in response
//! to a single request (e.g. serving a crash dump to one peer). Not part of
//! `ShareTree`, not bloom-indexed, and scoped to the users allowed to fetch
//! them.
//!
//! Grounded on the original's `TempShareManager`: a flat multimap keyed by
//! TTH behind one lock, since temp shares are few and short-lived compared
//! to the main tree.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use share_core::{ProfileToken, TTHValue};

pub type TempShareToken = u64;

#[derive(Clone, Debug)]
pub struct TempShareInfo {
    pub token: TempShareToken,
    pub tth: TTHValue,
    pub name: String,
    pub path: PathBuf,
    pub size: i64,
    pub profile: ProfileToken,
    /// If set, only this CID may request the item; otherwise anyone who
    /// learns the TTH can fetch it.
    pub restrict_user: Option<share_core::CID>,
    created_at: Instant,
}

impl TempShareInfo {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }

    /// `TempShareInfo::hasAccess`: unrestricted, or restricted to exactly
    /// this user.
    pub fn has_access(&self, cid: &share_core::CID) -> bool {
        self.restrict_user.map(|restrict| &restrict == cid).unwrap_or(true)
    }
}

pub struct TempShareManager {
    inner: RwLock<Inner>,
    ttl: Duration,
}

struct Inner {
    shares: HashMap<TempShareToken, TempShareInfo>,
    next_token: TempShareToken,
}

impl TempShareManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                shares: HashMap::new(),
                next_token: 1,
            }),
            ttl,
        }
    }

    /// `addTempShare`: if an entry with the same `(tth, user)` already
    /// exists, return it unchanged with `inserted = false`. Otherwise
    /// insert a new one and return it with `inserted = true`.
    pub fn add(
        &self,
        tth: TTHValue,
        name: String,
        path: PathBuf,
        size: i64,
        profile: ProfileToken,
        restrict_user: Option<share_core::CID>,
    ) -> (TempShareInfo, bool) {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.shares.values().find(|info| info.tth == tth && info.restrict_user == restrict_user) {
            return (existing.clone(), false);
        }

        let token = inner.next_token;
        inner.next_token += 1;

        let info = TempShareInfo {
            token,
            tth,
            name,
            path,
            size,
            profile,
            restrict_user,
            created_at: Instant::now(),
        };
        inner.shares.insert(token, info.clone());
        (info, true)
    }

    pub fn remove(&self, token: TempShareToken) -> Option<TempShareInfo> {
        self.inner.write().shares.remove(&token)
    }

    /// Drop any entries whose TTL has elapsed; called on the same cadence
    /// as the bloom-rebuild / SUDP key-expiry sweep.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.write();
        let ttl = self.ttl;
        let before = inner.shares.len();
        inner.shares.retain(|_, info| !info.is_expired(ttl));
        before - inner.shares.len()
    }

    pub fn find_by_tth(&self, tth: &TTHValue) -> Vec<TempShareInfo> {
        self.inner
            .read()
            .shares
            .values()
            .filter(|info| &info.tth == tth)
            .cloned()
            .collect()
    }

    /// `isTempShared(user, tth) → id?`: the id of the first entry whose
    /// access rule admits `cid`.
    pub fn is_temp_shared(&self, cid: &share_core::CID, tth: &TTHValue) -> Option<TempShareToken> {
        self.inner
            .read()
            .shares
            .values()
            .find(|info| &info.tth == tth && info.has_access(cid))
            .map(|info| info.token)
    }

    pub fn len(&self) -> usize {
        self.inner.read().shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tth(byte: u8) -> TTHValue {
        TTHValue::new([byte; 24])
    }

    #[test]
    fn add_find_remove_round_trip() {
        let mgr = TempShareManager::new(Duration::from_secs(60));
        let (info, inserted) = mgr.add(tth(1), "crash.dmp".into(), "/tmp/crash.dmp".into(), 100, 1, None);
        assert!(inserted);

        let found = mgr.find_by_tth(&tth(1));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].token, info.token);

        mgr.remove(info.token);
        assert!(mgr.find_by_tth(&tth(1)).is_empty());
    }

    #[test]
    fn restrict_user_limits_access_to_that_cid() {
        let mgr = TempShareManager::new(Duration::from_secs(60));
        let allowed = share_core::CID([1u8; 24]);
        let other = share_core::CID([2u8; 24]);
        mgr.add(tth(2), "f".into(), "/tmp/f".into(), 1, 1, Some(allowed));

        assert!(mgr.is_temp_shared(&allowed, &tth(2)).is_some());
        assert!(mgr.is_temp_shared(&other, &tth(2)).is_none());
    }

    #[test]
    fn unrestricted_share_is_visible_to_any_user() {
        let mgr = TempShareManager::new(Duration::from_secs(60));
        let anyone = share_core::CID([9u8; 24]);
        mgr.add(tth(4), "f".into(), "/tmp/f".into(), 1, 1, None);

        assert!(mgr.is_temp_shared(&anyone, &tth(4)).is_some());
    }

    #[test]
    fn adding_same_tth_and_user_twice_returns_existing_entry() {
        let mgr = TempShareManager::new(Duration::from_secs(60));
        let user = share_core::CID([3u8; 24]);
        let (first, first_inserted) = mgr.add(tth(5), "f".into(), "/tmp/f".into(), 1, 1, Some(user));
        let (second, second_inserted) = mgr.add(tth(5), "f".into(), "/tmp/f".into(), 1, 1, Some(user));

        assert!(first_inserted);
        assert!(!second_inserted);
        assert_eq!(first.token, second.token);
        assert_eq!(mgr.find_by_tth(&tth(5)).len(), 1);
    }

    #[test]
    fn sweep_removes_expired_entries() {
        let mgr = TempShareManager::new(Duration::from_millis(1));
        mgr.add(tth(3), "f".into(), "/tmp/f".into(), 1, 1, None);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(mgr.sweep_expired(), 1);
        assert!(mgr.is_empty());
    }
}

//! Shared doubles for engine integration tests: an in-memory engagement
//! store with the same atomic toggle semantics as the Postgres adapter, and
//! cache doubles that fail in controlled ways.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use kudos::application::repos::{EngagementStore, RepoError};
use kudos::cache::{CacheError, CacheLookup, CountKey, CounterCache, StatusKey};
use kudos::domain::TargetRef;

/// In-memory engagement store. The flag is `Option<bool>` so tests can seed
/// rows written before the flag existed; those count as engaged.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<(String, TargetRef), Option<bool>>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row with no explicit flag.
    pub fn insert_legacy(&self, user_id: &str, target: &TargetRef) {
        let mut rows = self.rows.lock().unwrap();
        rows.insert((user_id.to_string(), target.clone()), None);
    }

    /// Flip the store into a failing state (and back).
    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    /// Number of read queries served so far (toggle excluded).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), RepoError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }

    fn engaged(flag: &Option<bool>) -> bool {
        *flag != Some(false)
    }
}

#[async_trait]
impl EngagementStore for MemoryStore {
    async fn toggle(&self, user_id: &str, target: &TargetRef) -> Result<bool, RepoError> {
        self.check_available()?;
        let mut rows = self.rows.lock().unwrap();
        let key = (user_id.to_string(), target.clone());
        let next = match rows.get(&key) {
            None => true,
            Some(flag) => !Self::engaged(flag),
        };
        rows.insert(key, Some(next));
        Ok(next)
    }

    async fn is_active(&self, user_id: &str, target: &TargetRef) -> Result<bool, RepoError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&(user_id.to_string(), target.clone()))
            .is_some_and(Self::engaged))
    }

    async fn count_active(&self, target: &TargetRef) -> Result<i64, RepoError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|((_, t), flag)| t == target && Self::engaged(flag))
            .count() as i64)
    }

    async fn batch_is_active(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, bool>, RepoError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        let mut engaged = HashMap::new();
        for target in targets {
            if rows
                .get(&(user_id.to_string(), target.clone()))
                .is_some_and(Self::engaged)
            {
                engaged.insert(target.clone(), true);
            }
        }
        Ok(engaged)
    }

    async fn batch_count_active(
        &self,
        targets: &[TargetRef],
    ) -> Result<HashMap<TargetRef, i64>, RepoError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().unwrap();
        let mut counts = HashMap::new();
        for target in targets {
            let count = rows
                .iter()
                .filter(|((_, t), flag)| t == target && Self::engaged(flag))
                .count() as i64;
            counts.insert(target.clone(), count);
        }
        Ok(counts)
    }
}

/// Cache whose every operation fails as unreachable.
#[derive(Default)]
pub struct UnavailableCache;

#[async_trait]
impl CounterCache for UnavailableCache {
    async fn status(&self, _key: &StatusKey) -> Result<Option<bool>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set_status(
        &self,
        _key: StatusKey,
        _value: bool,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn del_status(&self, _key: &StatusKey) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn count(&self, _key: &CountKey) -> Result<Option<i64>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set_count(
        &self,
        _key: CountKey,
        _value: i64,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn incr_count(&self, _key: &CountKey, _delta: i64) -> Result<bool, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn del_count(&self, _key: &CountKey) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn batch_status(
        &self,
        _user_id: &str,
        _targets: &[TargetRef],
    ) -> Result<CacheLookup<bool>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn batch_count(&self, _targets: &[TargetRef]) -> Result<CacheLookup<i64>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

/// Cache whose point reads report corrupt entries, recording which keys the
/// engine asks to delete afterwards. Writes succeed silently.
#[derive(Default)]
pub struct CorruptingCache {
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl CounterCache for CorruptingCache {
    async fn status(&self, key: &StatusKey) -> Result<Option<bool>, CacheError> {
        Err(CacheError::corrupt(key))
    }

    async fn set_status(
        &self,
        _key: StatusKey,
        _value: bool,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn del_status(&self, key: &StatusKey) -> Result<(), CacheError> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn count(&self, key: &CountKey) -> Result<Option<i64>, CacheError> {
        Err(CacheError::corrupt(key))
    }

    async fn set_count(
        &self,
        _key: CountKey,
        _value: i64,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn incr_count(&self, key: &CountKey, _delta: i64) -> Result<bool, CacheError> {
        Err(CacheError::corrupt(key))
    }

    async fn del_count(&self, key: &CountKey) -> Result<(), CacheError> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn batch_status(
        &self,
        user_id: &str,
        targets: &[TargetRef],
    ) -> Result<CacheLookup<bool>, CacheError> {
        let _ = user_id;
        Ok(CacheLookup::all_misses(targets))
    }

    async fn batch_count(&self, targets: &[TargetRef]) -> Result<CacheLookup<i64>, CacheError> {
        Ok(CacheLookup::all_misses(targets))
    }
}

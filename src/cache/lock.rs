//! Poisoned-lock recovery for the cache maps.
//!
//! A panic while holding a cache lock must not take the cache down with it:
//! entries are disposable, so the poisoned guard is reclaimed and the event
//! logged.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        note_poisoned(target, op, "read");
        poisoned.into_inner()
    })
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    target: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        note_poisoned(target, op, "write");
        poisoned.into_inner()
    })
}

fn note_poisoned(target: &'static str, op: &'static str, kind: &'static str) {
    warn!(
        target_module = target,
        op,
        lock_kind = kind,
        "reclaimed a poisoned cache lock; entries may lag until refreshed"
    );
}

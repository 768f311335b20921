//! Process-wide request bookkeeping.
//!
//! The ledger keeps a per-key mutation count and the most recent payload
//! written for that key. Each key lives in a `DashMap` shard, so an update
//! holds only that shard's write lock for the duration of one in-memory
//! mutation: concurrent updates to the same key serialize, updates to
//! different keys generally do not contend.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Bookkeeping for a single key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LedgerEntry {
    pub key: String,
    /// Successful mutating operations recorded via `increment`
    pub count: u64,
    /// Deletions recorded via `record_deletion`
    pub deletions: u64,
    /// Payload written by the most recent `increment`
    #[schema(value_type = Object)]
    pub last_payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            count: 0,
            deletions: 0,
            last_payload: serde_json::Value::Null,
            updated_at: Utc::now(),
        }
    }
}

/// Process totals across all keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LedgerStats {
    pub keys: usize,
    pub ingestions: u64,
    pub deletions: u64,
}

#[derive(Debug, Default)]
pub struct RequestLedger {
    entries: DashMap<String, LedgerEntry>,
    ingestions: AtomicU64,
    deletions: AtomicU64,
}

impl RequestLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one mutation for `key`, returning the new count.
    ///
    /// `count` and `last_payload` are updated together while the entry is
    /// locked, so a reader never sees one without the other.
    pub fn increment(&self, key: &str, payload: serde_json::Value) -> Result<u64, LedgerError> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| LedgerEntry::new(key));

        let count = entry
            .count
            .checked_add(1)
            .ok_or_else(|| LedgerError::CounterOverflow(key.to_string()))?;

        entry.count = count;
        entry.last_payload = payload;
        entry.updated_at = Utc::now();
        drop(entry);

        self.ingestions.fetch_add(1, Ordering::Relaxed);
        Ok(count)
    }

    /// Record a deletion for `key`, returning the new deletion count.
    /// Leaves `count` and `last_payload` untouched.
    pub fn record_deletion(&self, key: &str) -> Result<u64, LedgerError> {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| LedgerEntry::new(key));

        let deletions = entry
            .deletions
            .checked_add(1)
            .ok_or_else(|| LedgerError::CounterOverflow(key.to_string()))?;

        entry.deletions = deletions;
        entry.updated_at = Utc::now();
        drop(entry);

        self.deletions.fetch_add(1, Ordering::Relaxed);
        Ok(deletions)
    }

    /// Consistent copy of the entry for `key`, if it has ever been referenced
    pub fn snapshot(&self, key: &str) -> Option<LedgerEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Explicitly drop the entry for `key`
    pub fn forget(&self, key: &str) -> Option<LedgerEntry> {
        self.entries.remove(key).map(|(_, entry)| entry)
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            keys: self.entries.len(),
            ingestions: self.ingestions.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn seed(&self, entry: LedgerEntry) {
        self.entries.insert(entry.key.clone(), entry);
    }
}

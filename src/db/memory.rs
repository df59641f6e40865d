// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Used for local development (`STORAGE_BACKEND=memory`) and tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ProgressStore;
use crate::error::AppError;
use crate::models::{NewProgressRecord, ProgressRecord, User};

type DayKey = (u64, NaiveDate);

/// In-memory store.
///
/// Records are keyed by (user, date); inserting through the map entry
/// holds the shard lock, so two concurrent inserts for the same day
/// cannot both succeed.
#[derive(Debug)]
pub struct MemoryDb {
    records: DashMap<DayKey, ProgressRecord>,
    /// Record id -> day key
    ids: DashMap<u64, DayKey>,
    users: DashMap<u64, User>,
    next_id: AtomicU64,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            ids: DashMap::new(),
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored records across all users.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

#[async_trait]
impl ProgressStore for MemoryDb {
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_user_and_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<ProgressRecord>, AppError> {
        Ok(self
            .records
            .get(&(user_id, date))
            .map(|r| r.value().clone()))
    }

    async fn insert_unique(
        &self,
        record: NewProgressRecord,
    ) -> Result<Option<ProgressRecord>, AppError> {
        let key = (record.user_id, record.date);

        match self.records.entry(key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let record = record.into_record(id);
                slot.insert(record.clone());
                self.ids.insert(id, key);
                Ok(Some(record))
            }
        }
    }

    async fn find_by_id_and_user(
        &self,
        id: u64,
        user_id: u64,
    ) -> Result<Option<ProgressRecord>, AppError> {
        let key = match self.ids.get(&id) {
            Some(key) if key.0 == user_id => *key,
            _ => return Ok(None),
        };

        Ok(self.records.get(&key).map(|r| r.value().clone()))
    }

    async fn update(&self, record: &ProgressRecord) -> Result<(), AppError> {
        match self.records.get_mut(&(record.user_id, record.date)) {
            Some(mut stored) if stored.id == record.id => {
                *stored = record.clone();
                Ok(())
            }
            _ => Err(AppError::NotFound),
        }
    }

    async fn delete_by_id(&self, id: u64) -> Result<bool, AppError> {
        let Some((_, key)) = self.ids.remove(&id) else {
            return Ok(false);
        };

        Ok(self.records.remove(&key).is_some())
    }

    async fn list_by_user_ordered(&self, user_id: u64) -> Result<Vec<ProgressRecord>, AppError> {
        let mut records: Vec<ProgressRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.value().clone())
            .collect();

        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

//! Persistence layer.
//!
//! [`ProgressStore`] is the repository the record lifecycle talks to.
//! [`MemoryDb`] backs local development and tests; [`FirestoreDb`] is the
//! production backend.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::{NewProgressRecord, ProgressRecord, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Progress records, keyed by `{user_id}_{date}`
    pub const PROGRESS_RECORDS: &str = "progress_records";
    /// Record id reservations, keyed by the id
    pub const RECORD_IDS: &str = "progress_record_ids";
}

/// Storage operations needed by the progress record lifecycle.
///
/// Implementations must enforce the (user, date) uniqueness in
/// [`insert_unique`](ProgressStore::insert_unique) atomically.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Get a user profile by ID.
    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError>;

    /// Create or replace a user profile.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    async fn find_by_user_and_date(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<Option<ProgressRecord>, AppError>;

    /// Insert a record, assigning its id.
    ///
    /// Returns `None` without writing anything if the user already has a
    /// record for that date.
    async fn insert_unique(
        &self,
        record: NewProgressRecord,
    ) -> Result<Option<ProgressRecord>, AppError>;

    /// Look up a record by id, only if `user_id` owns it.
    async fn find_by_id_and_user(
        &self,
        id: u64,
        user_id: u64,
    ) -> Result<Option<ProgressRecord>, AppError>;

    /// Replace a stored record. Fails with `NotFound` if it no longer exists.
    async fn update(&self, record: &ProgressRecord) -> Result<(), AppError>;

    /// Permanently remove a record. Returns whether anything was deleted.
    async fn delete_by_id(&self, id: u64) -> Result<bool, AppError>;

    /// All records of a user, most recent date first.
    async fn list_by_user_ordered(&self, user_id: u64) -> Result<Vec<ProgressRecord>, AppError>;
}

//! Document store: schema-less documents grouped in named collections, each
//! carrying a `createdAt` instant the store can range-filter and sort on,
//! plus change subscriptions per collection.

mod feed;
mod sqlite;

pub use feed::{ChangeFeed, Subscription};
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::dates::DayInterval;

/// Collection holding one note per day
pub const NOTES: &str = "note";
/// Collection holding visit entries
pub const VISITS: &str = "info";
/// Collection holding the customer directory
pub const CUSTOMERS: &str = "Customers";

/// Document payload: field name to JSON value
pub type Fields = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("No document {id} in collection {collection}")]
    NotFound { collection: String, id: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Range filter on `createdAt` (both bounds inclusive) plus ordering.
/// Ties on `createdAt` are broken by document id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn within(interval: &DayInterval) -> Self {
        Self {
            created_from: Some(interval.start),
            created_to: Some(interval.end),
            ..Self::default()
        }
    }

    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            created_from: Some(start),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    /// Another process committed to the underlying database; which documents
    /// changed is unknown.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: String,
    pub id: Option<String>,
    pub kind: ChangeKind,
}

pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its generated id
    fn add(&self, collection: &str, created_at: DateTime<Utc>, fields: Fields) -> Result<String, StoreError>;

    /// Merge `fields` into an existing document and stamp `updated_at`
    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Register for change events on one collection. Dropping the returned
    /// subscription unregisters it.
    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError>;

    /// Check whether another writer touched the store since the last call and
    /// notify subscribers if so. Returns whether a change was seen.
    fn poll_external_changes(&self) -> Result<bool, StoreError>;
}

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, mpsc};
use visit_tracker::store::{Document, DocumentStore, Fields, Query, StoreError, Subscription};
use visit_tracker::SqliteStore;

pub fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// In-memory store whose writes and subscriptions can be made to fail
pub struct FlakyStore {
    inner: SqliteStore,
    fail_writes: AtomicBool,
    close_subscriptions: AtomicBool,
    failing_collection: Mutex<Option<String>>,
    pub write_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            fail_writes: AtomicBool::new(false),
            close_subscriptions: AtomicBool::new(false),
            failing_collection: Mutex::new(None),
            write_attempts: AtomicUsize::new(0),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail writes to one collection only
    pub fn fail_writes_to(&self, collection: &str) {
        *self.failing_collection.lock().unwrap() = Some(collection.to_string());
    }

    /// New subscriptions come back already disconnected
    pub fn close_subscriptions(&self, close: bool) {
        self.close_subscriptions.store(close, Ordering::SeqCst);
    }

    fn check_write(&self, collection: &str) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let collection_down = self.failing_collection.lock().unwrap().as_deref() == Some(collection);
        if collection_down || self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("network unreachable".into()));
        }
        Ok(())
    }
}

impl DocumentStore for FlakyStore {
    fn add(&self, collection: &str, created_at: DateTime<Utc>, fields: Fields) -> Result<String, StoreError> {
        self.check_write(collection)?;
        self.inner.add(collection, created_at, fields)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields, updated_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.check_write(collection)?;
        self.inner.update(collection, id, fields, updated_at)
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.inner.query(collection, query)
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        if self.close_subscriptions.load(Ordering::SeqCst) {
            let (_tx, rx) = mpsc::channel();
            return Ok(Subscription::from_receiver(collection, rx));
        }
        self.inner.subscribe(collection)
    }

    fn poll_external_changes(&self) -> Result<bool, StoreError> {
        self.inner.poll_external_changes()
    }
}

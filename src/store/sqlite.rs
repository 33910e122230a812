use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{
    ChangeEvent, ChangeFeed, ChangeKind, Document, DocumentStore, Fields, Query, SortOrder,
    StoreError, Subscription,
};

/// Document store on a single SQLite file. Payloads are JSON text; `createdAt`
/// lives in its own indexed column as epoch milliseconds.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    feed: ChangeFeed,
    data_version: AtomicI64,
}

impl SqliteStore {
    /// Open (or create) the database file and initialize the schema
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirectoryError(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened document store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY,
                collection  TEXT NOT NULL,
                created_at  INTEGER NOT NULL,
                updated_at  INTEGER,
                payload     TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_documents_collection_created
                ON documents(collection, created_at);",
        )?;
        let version = read_data_version(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            feed: ChangeFeed::new(),
            data_version: AtomicI64::new(version),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".into()))
    }
}

fn read_data_version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("PRAGMA data_version", [], |row| row.get(0))?)
}

fn to_instant(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Unavailable(format!("timestamp out of range: {}", millis)))
}

impl DocumentStore for SqliteStore {
    fn add(&self, collection: &str, created_at: DateTime<Utc>, fields: Fields) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let payload = serde_json::to_string(&fields)?;
        self.conn()?.execute(
            "INSERT INTO documents (id, collection, created_at, updated_at, payload)
             VALUES (?1, ?2, ?3, NULL, ?4)",
            params![id, collection, created_at.timestamp_millis(), payload],
        )?;
        tracing::info!(collection, id = %id, "document created");
        self.feed.publish(ChangeEvent {
            collection: collection.to_string(),
            id: Some(id.clone()),
            kind: ChangeKind::Created,
        });
        Ok(id)
    }

    fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        {
            let conn = self.conn()?;
            let current: Option<String> = conn
                .query_row(
                    "SELECT payload FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(current) = current else {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                });
            };
            let mut merged: Fields = serde_json::from_str(&current)?;
            merged.extend(fields);
            conn.execute(
                "UPDATE documents SET payload = ?1, updated_at = ?2 WHERE collection = ?3 AND id = ?4",
                params![
                    serde_json::to_string(&merged)?,
                    updated_at.timestamp_millis(),
                    collection,
                    id
                ],
            )?;
        }
        tracing::info!(collection, id, "document updated");
        self.feed.publish(ChangeEvent {
            collection: collection.to_string(),
            id: Some(id.to_string()),
            kind: ChangeKind::Updated,
        });
        Ok(())
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let direction = match query.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            "SELECT id, created_at, updated_at, payload FROM documents
             WHERE collection = ?1
               AND (?2 IS NULL OR created_at >= ?2)
               AND (?3 IS NULL OR created_at <= ?3)
             ORDER BY created_at {direction}, id {direction}
             LIMIT ?4"
        );
        // SQLite treats a negative LIMIT as unbounded
        let limit = query.limit.map(|l| l as i64).unwrap_or(-1);

        let rows: Vec<(String, i64, Option<i64>, String)> = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.query_map(
                params![
                    collection,
                    query.created_from.map(|t| t.timestamp_millis()),
                    query.created_to.map(|t| t.timestamp_millis()),
                    limit
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?
            .collect::<Result<Vec<_>, rusqlite::Error>>()?
        };

        let documents = rows
            .into_iter()
            .map(|(id, created_at, updated_at, payload)| {
                Ok(Document {
                    id,
                    created_at: to_instant(created_at)?,
                    updated_at: updated_at.map(to_instant).transpose()?,
                    fields: serde_json::from_str(&payload)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        tracing::debug!(collection, count = documents.len(), "query");
        Ok(documents)
    }

    fn subscribe(&self, collection: &str) -> Result<Subscription, StoreError> {
        self.feed.subscribe(collection)
    }

    fn poll_external_changes(&self) -> Result<bool, StoreError> {
        let version = read_data_version(&*self.conn()?)?;
        let previous = self.data_version.swap(version, Ordering::SeqCst);
        if previous == version {
            return Ok(false);
        }
        tracing::debug!(previous, version, "database changed by another connection");
        self.feed.publish_external();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DayInterval;
    use chrono::{Duration, NaiveDate, TimeZone};
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn add_and_query_in_created_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add("note", at(15, 0), fields(json!({"note": "late"}))).unwrap();
        store.add("note", at(9, 0), fields(json!({"note": "early"}))).unwrap();
        store.add("info", at(10, 0), fields(json!({"customerName": "ACME"}))).unwrap();

        let docs = store.query("note", &Query::all()).unwrap();
        let texts: Vec<_> = docs.iter().map(|d| d.fields["note"].as_str().unwrap()).collect();
        assert_eq!(texts, vec!["early", "late"]);
        assert_eq!(docs[0].created_at, at(9, 0));
        assert!(docs[0].updated_at.is_none());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let store = SqliteStore::open_in_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let interval = DayInterval::in_zone(day, &Utc);

        store.add("note", interval.start, fields(json!({"note": "first ms"}))).unwrap();
        store.add("note", interval.end, fields(json!({"note": "last ms"}))).unwrap();
        store
            .add("note", interval.end + Duration::milliseconds(1), fields(json!({"note": "next day"})))
            .unwrap();
        store
            .add("note", interval.start - Duration::milliseconds(1), fields(json!({"note": "prev day"})))
            .unwrap();

        let docs = store.query("note", &Query::within(&interval)).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn descending_order_and_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        for h in [8, 12, 16] {
            store.add("note", at(h, 0), Fields::new()).unwrap();
        }
        let query = Query {
            order: SortOrder::Descending,
            ..Query::all()
        }
        .limit(2);
        let docs = store.query("note", &query).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].created_at, at(16, 0));
    }

    #[test]
    fn update_merges_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .add("note", at(9, 0), fields(json!({"note": "draft", "pinned": true})))
            .unwrap();
        store.update("note", &id, fields(json!({"note": "final"})), at(10, 0)).unwrap();

        let doc = store.query("note", &Query::all()).unwrap().remove(0);
        assert_eq!(doc.fields["note"], "final");
        assert_eq!(doc.fields["pinned"], true);
        assert_eq!(doc.updated_at, Some(at(10, 0)));
        assert_eq!(doc.created_at, at(9, 0));
    }

    #[test]
    fn update_missing_document_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.update("note", "nope", Fields::new(), at(9, 0)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn writes_notify_subscribers() {
        let store = SqliteStore::open_in_memory().unwrap();
        let sub = store.subscribe("note").unwrap();
        let id = store.add("note", at(9, 0), Fields::new()).unwrap();
        store.update("note", &id, Fields::new(), at(9, 5)).unwrap();
        store.add("info", at(9, 0), Fields::new()).unwrap();
        assert_eq!(sub.drain().unwrap(), 2);
    }

    #[test]
    fn own_writes_are_not_external() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add("note", at(9, 0), Fields::new()).unwrap();
        assert!(!store.poll_external_changes().unwrap());
    }
}

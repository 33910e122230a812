use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use crate::dates::{DayInterval, day_key};
use crate::models::VisitEntry;
use crate::store::{self, DocumentStore, Query, StoreError};

#[derive(Debug, Error)]
pub enum VisitError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Visit entry {id} is malformed: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Access to the `info` collection of visit entries
pub struct VisitLog {
    store: Arc<dyn DocumentStore>,
}

impl VisitLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Entries recorded for `date`, oldest first
    pub fn for_day(&self, date: NaiveDate) -> Result<Vec<VisitEntry>, VisitError> {
        let docs = self
            .store
            .query(store::VISITS, &Query::within(&DayInterval::local(date)))?;
        tracing::debug!(day = %day_key(date), count = docs.len(), "loaded visit entries");
        docs.into_iter()
            .map(|doc| {
                let mut entry: VisitEntry =
                    serde_json::from_value(serde_json::Value::Object(doc.fields))
                        .map_err(|source| VisitError::Malformed { id: doc.id, source })?;
                entry.created_at = doc.created_at;
                Ok(entry)
            })
            .collect()
    }

    /// Persist a new entry and return its id
    pub fn record(&self, entry: &VisitEntry) -> Result<String, VisitError> {
        let fields = match serde_json::to_value(entry).map_err(StoreError::from)? {
            serde_json::Value::Object(fields) => fields,
            _ => return Err(StoreError::Unavailable("visit entry did not serialize to an object".into()).into()),
        };
        let id = self.store.add(store::VISITS, entry.created_at, fields)?;
        tracing::info!(id = %id, customer = %entry.customer_name, "visit recorded");
        Ok(id)
    }
}

/// Labelled display values for an entry; missing values read "N/A"
pub fn summary_rows(entry: &VisitEntry) -> Vec<(&'static str, String)> {
    fn or_na(s: String) -> String {
        if s.trim().is_empty() { "N/A".to_string() } else { s }
    }
    fn joined<T: std::fmt::Display>(items: &[T]) -> String {
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
    let remarks = entry
        .remarks
        .iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(key, text)| format!("{}: {}", key, text))
        .collect::<Vec<_>>()
        .join("; ");

    vec![
        ("Customer", or_na(entry.customer_name.clone())),
        ("Selected Purposes", or_na(joined(&entry.selected_purposes))),
        ("Buyer", or_na(entry.buyer.clone())),
        ("Sales Options", or_na(joined(&entry.sales_options))),
        ("Remarks", or_na(remarks)),
        ("Sample Collection Types", or_na(joined(&entry.sample_collection_types))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Purpose, SalesOption};
    use std::collections::BTreeMap;

    #[test]
    fn summary_fills_gaps_with_na() {
        let entry = VisitEntry {
            customer_name: "ACME".into(),
            selected_purposes: vec![Purpose::Sales, Purpose::Admin],
            sales_options: vec![SalesOption::Regular],
            remarks: BTreeMap::from([
                ("regular".to_string(), "weekly".to_string()),
                ("payment".to_string(), String::new()),
            ]),
            ..VisitEntry::default()
        };
        let rows = summary_rows(&entry);
        assert_eq!(rows[1], ("Selected Purposes", "Sales, Admin".to_string()));
        assert_eq!(rows[2], ("Buyer", "N/A".to_string()));
        assert_eq!(rows[4], ("Remarks", "regular: weekly".to_string()));
        assert_eq!(rows[5], ("Sample Collection Types", "N/A".to_string()));
    }
    use crate::store::SqliteStore;

    #[test]
    fn recorded_entries_come_back_for_their_day_only() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let log = VisitLog::new(store);
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let other = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        let entry = VisitEntry {
            customer_name: "ACME".into(),
            selected_purposes: vec![Purpose::Admin],
            created_at: DayInterval::local(day).start,
            ..VisitEntry::default()
        };
        log.record(&entry).unwrap();
        log.record(&VisitEntry {
            customer_name: "Globex".into(),
            created_at: DayInterval::local(other).start,
            ..VisitEntry::default()
        })
        .unwrap();

        let found = log.for_day(day).unwrap();
        assert_eq!(found, vec![entry]);
    }
}

use chrono::Utc;
use std::sync::Arc;

use crate::models::Customer;
use crate::store::{self, DocumentStore, Query, StoreError};

/// Customer name directory used for autocomplete
pub struct CustomerDirectory {
    store: Arc<dyn DocumentStore>,
}

impl CustomerDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Known names in insertion order. Documents without a usable name are skipped.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        let docs = self.store.query(store::CUSTOMERS, &Query::all())?;
        let names = docs
            .into_iter()
            .filter_map(|doc| {
                let customer: Customer =
                    serde_json::from_value(serde_json::Value::Object(doc.fields)).ok()?;
                let name = customer.name.trim().to_string();
                (!name.is_empty()).then_some(name)
            })
            .collect();
        Ok(names)
    }

    /// Add `name` unless it is blank or already in `known`. Returns whether a
    /// document was written.
    pub fn add_if_missing(&self, name: &str, known: &[String]) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() || known.iter().any(|k| k == name) {
            return Ok(false);
        }
        let customer = Customer {
            name: name.to_string(),
        };
        let serde_json::Value::Object(fields) = serde_json::to_value(&customer)? else {
            return Err(StoreError::Unavailable("customer did not serialize to an object".into()));
        };
        self.store.add(store::CUSTOMERS, Utc::now(), fields)?;
        Ok(true)
    }
}

/// Directory names that start with `prefix`, case-insensitively
pub fn suggestions<'a>(names: &'a [String], prefix: &str) -> Vec<&'a str> {
    let prefix = prefix.trim().to_lowercase();
    names
        .iter()
        .filter(|n| n.to_lowercase().starts_with(&prefix))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Fields, SqliteStore};

    #[test]
    fn add_skips_blank_and_known_names() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let directory = CustomerDirectory::new(store);

        assert!(directory.add_if_missing(" ACME ", &[]).unwrap());
        let names = directory.names().unwrap();
        assert_eq!(names, vec!["ACME".to_string()]);

        assert!(!directory.add_if_missing("ACME", &names).unwrap());
        assert!(!directory.add_if_missing("   ", &names).unwrap());
        assert_eq!(directory.names().unwrap().len(), 1);
    }

    #[test]
    fn nameless_documents_are_ignored() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.add(store::CUSTOMERS, Utc::now(), Fields::new()).unwrap();
        let directory = CustomerDirectory::new(store);
        assert!(directory.names().unwrap().is_empty());
    }

    #[test]
    fn suggestions_match_prefix() {
        let names = vec!["Acme".to_string(), "Globex".to_string(), "acorn".to_string()];
        assert_eq!(suggestions(&names, "ac"), vec!["Acme", "acorn"]);
        assert_eq!(suggestions(&names, "").len(), 3);
    }
}

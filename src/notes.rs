use chrono::{DateTime, Local, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::dates::{DayInterval, day_key, instant_on};
use crate::models::Note;
use crate::store::{self, Document, DocumentStore, Fields, Query, StoreError, Subscription};

#[derive(Debug, Error)]
pub enum NoteError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Note {id} has a non-text `note` field")]
    Malformed { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(String),
    Updated(String),
    /// Nothing to save: the text was empty after trimming
    Skipped,
}

#[derive(Debug, Clone)]
struct CachedNote {
    id: String,
    text: String,
}

/// Date-keyed access to the `note` collection.
///
/// Keeps a day key → note id cache for the session: a cached day is updated in
/// place, an uncached day gets a new note. The cache is never revalidated
/// against the store.
pub struct NoteStore {
    store: Arc<dyn DocumentStore>,
    by_day: HashMap<String, CachedNote>,
}

impl NoteStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            by_day: HashMap::new(),
        }
    }

    /// Text of the note for `date`, if one exists
    pub fn load_for_day(&mut self, date: NaiveDate) -> Result<Option<String>, NoteError> {
        let key = day_key(date);
        if let Some(cached) = self.by_day.get(&key) {
            return Ok(Some(cached.text.clone()));
        }
        let Some(note) = self.find_for_day(date)? else {
            return Ok(None);
        };
        self.by_day.insert(
            key,
            CachedNote {
                id: note.id,
                text: note.note.clone(),
            },
        );
        Ok(Some(note.note))
    }

    /// Query the store for the note of `date`, bypassing the cache.
    /// With several candidates the earliest one wins.
    pub fn find_for_day(&self, date: NaiveDate) -> Result<Option<Note>, NoteError> {
        let docs = self
            .store
            .query(store::NOTES, &Query::within(&DayInterval::local(date)))?;
        if docs.len() > 1 {
            tracing::warn!(day = %day_key(date), count = docs.len(), "several notes for one day; using the earliest");
        }
        docs.into_iter().next().map(note_from_document).transpose()
    }

    /// Create or update the note of `date`. Whitespace-only text is ignored.
    pub fn save_for_day(
        &mut self,
        date: NaiveDate,
        text: &str,
        now: DateTime<Local>,
    ) -> Result<SaveOutcome, NoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SaveOutcome::Skipped);
        }
        let key = day_key(date);
        let mut fields = Fields::new();
        fields.insert("note".into(), Value::String(text.to_string()));

        if let Some(cached) = self.by_day.get_mut(&key) {
            self.store
                .update(store::NOTES, &cached.id, fields, now.with_timezone(&Utc))?;
            cached.text = text.to_string();
            return Ok(SaveOutcome::Updated(cached.id.clone()));
        }

        let created_at = instant_on(date, now.time());
        let id = self.store.add(store::NOTES, created_at, fields)?;
        self.by_day.insert(
            key,
            CachedNote {
                id: id.clone(),
                text: text.to_string(),
            },
        );
        Ok(SaveOutcome::Created(id))
    }

    #[cfg(test)]
    pub fn cached_id(&self, date: NaiveDate) -> Option<&str> {
        self.by_day.get(&day_key(date)).map(|c| c.id.as_str())
    }

    /// Notes created at or after `since`, oldest first
    pub fn upcoming(&self, since: DateTime<Utc>) -> Result<Vec<Note>, NoteError> {
        self.store
            .query(store::NOTES, &Query::since(since))?
            .into_iter()
            .map(note_from_document)
            .collect()
    }

    pub fn subscribe(&self) -> Result<Subscription, StoreError> {
        self.store.subscribe(store::NOTES)
    }
}

fn note_from_document(doc: Document) -> Result<Note, NoteError> {
    let note = match doc.fields.get("note") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(NoteError::Malformed { id: doc.id }),
    };
    Ok(Note {
        id: doc.id,
        note,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

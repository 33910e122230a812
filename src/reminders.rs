use chrono::{DateTime, Utc};

use crate::models::Note;
use crate::notes::NoteStore;
use crate::store::Subscription;

pub const LOAD_FAILED: &str = "Failed to load notes. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderState {
    Loading,
    Ready(Vec<Note>),
    Failed(String),
}

/// Live list of notes created since a cutoff, oldest first.
///
/// Holds a subscription to the note collection; every change recomputes the
/// whole list. A failure is reported once and the feed stops until
/// [`ReminderFeed::restart`]. Dropping or cancelling the feed releases the
/// subscription.
pub struct ReminderFeed {
    since: DateTime<Utc>,
    subscription: Option<Subscription>,
    state: ReminderState,
}

impl ReminderFeed {
    pub fn start(notes: &NoteStore, since: DateTime<Utc>) -> Self {
        let mut feed = Self {
            since,
            subscription: None,
            state: ReminderState::Loading,
        };
        feed.connect(notes);
        feed
    }

    pub fn state(&self) -> &ReminderState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Apply pending change events. Returns whether the list was recomputed.
    pub fn poll(&mut self, notes: &NoteStore) -> bool {
        let Some(subscription) = &self.subscription else {
            return false;
        };
        match subscription.drain() {
            Ok(0) => false,
            Ok(_) => {
                self.refresh(notes);
                true
            }
            Err(e) => {
                self.fail(&e);
                true
            }
        }
    }

    pub fn cancel(&mut self) {
        if self.subscription.take().is_some() {
            tracing::debug!("reminder feed cancelled");
        }
    }

    /// Drop the current subscription and start over from `since`
    pub fn restart(&mut self, notes: &NoteStore, since: DateTime<Utc>) {
        self.cancel();
        self.since = since;
        self.state = ReminderState::Loading;
        self.connect(notes);
    }

    fn connect(&mut self, notes: &NoteStore) {
        match notes.subscribe() {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.refresh(notes);
            }
            Err(e) => self.fail(&e),
        }
    }

    fn refresh(&mut self, notes: &NoteStore) {
        match notes.upcoming(self.since) {
            Ok(list) => self.state = ReminderState::Ready(list),
            Err(e) => self.fail(&e),
        }
    }

    fn fail(&mut self, error: &dyn std::error::Error) {
        tracing::warn!(error = %error, "reminder feed stopped");
        self.subscription = None;
        self.state = ReminderState::Failed(LOAD_FAILED.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DayInterval;
    use crate::store::{SqliteStore, DocumentStore};
    use chrono::{Local, NaiveDate, TimeZone};
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn at_noon(date: NaiveDate) -> chrono::DateTime<Local> {
        Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
            .earliest()
            .unwrap()
    }

    fn texts(feed: &ReminderFeed) -> Vec<String> {
        match feed.state() {
            ReminderState::Ready(list) => list.iter().map(|n| n.note.clone()).collect(),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn recomputes_on_every_change() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut notes = NoteStore::new(store);
        let mut feed = ReminderFeed::start(&notes, DayInterval::local(day()).start);
        assert!(texts(&feed).is_empty());
        assert!(!feed.poll(&notes));

        let next = day().succ_opt().unwrap();
        notes.save_for_day(next, "later", at_noon(next)).unwrap();
        notes.save_for_day(day(), "first", at_noon(day())).unwrap();
        assert!(feed.poll(&notes));
        assert_eq!(texts(&feed), vec!["first", "later"]);

        notes.save_for_day(day(), "first, edited", at_noon(day())).unwrap();
        assert!(feed.poll(&notes));
        assert_eq!(texts(&feed), vec!["first, edited", "later"]);
    }

    #[test]
    fn cancel_releases_subscription() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut notes = NoteStore::new(store.clone());
        let mut feed = ReminderFeed::start(&notes, DayInterval::local(day()).start);
        assert!(feed.is_active());

        feed.cancel();
        assert!(!feed.is_active());
        notes.save_for_day(day(), "unseen", at_noon(day())).unwrap();
        assert!(!feed.poll(&notes));
        assert!(texts(&feed).is_empty());

        feed.restart(&notes, DayInterval::local(day()).start);
        assert!(feed.is_active());
        assert_eq!(texts(&feed), vec!["unseen"]);
    }

    #[test]
    fn dropping_feed_unregisters() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut notes = NoteStore::new(store.clone());
        let feed = ReminderFeed::start(&notes, DayInterval::local(day()).start);
        drop(feed);
        notes.save_for_day(day(), "x", at_noon(day())).unwrap();
        // publish after the drop pruned the dead subscriber; a new one still works
        let sub = store.subscribe(crate::store::NOTES).unwrap();
        notes.save_for_day(day(), "y", at_noon(day())).unwrap();
        assert_eq!(sub.drain().unwrap(), 1);
    }
}

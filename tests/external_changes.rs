use chrono::{Local, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use visit_tracker::dates::start_of_today;
use visit_tracker::notes::NoteStore;
use visit_tracker::reminders::{ReminderFeed, ReminderState};
use visit_tracker::store::{self, DocumentStore};
use visit_tracker::SqliteStore;

#[test]
fn writes_from_another_connection_reach_subscribers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.db");
    let ours = SqliteStore::open(&path).unwrap();
    let theirs = SqliteStore::open(&path).unwrap();

    let subscription = ours.subscribe(store::NOTES).unwrap();
    assert!(!ours.poll_external_changes().unwrap());

    theirs.add(store::NOTES, Utc::now(), serde_json::Map::new()).unwrap();
    assert_eq!(subscription.drain().unwrap(), 0);
    assert!(ours.poll_external_changes().unwrap());
    assert_eq!(subscription.drain().unwrap(), 1);
    assert!(!ours.poll_external_changes().unwrap());
}

#[test]
fn own_writes_are_not_reported_as_external() {
    let dir = TempDir::new().unwrap();
    let db = SqliteStore::open(&dir.path().join("own.db")).unwrap();
    let subscription = db.subscribe(store::VISITS).unwrap();
    db.add(store::VISITS, Utc::now(), serde_json::Map::new()).unwrap();
    assert_eq!(subscription.drain().unwrap(), 1);
    assert!(!db.poll_external_changes().unwrap());
}

#[test]
fn reminder_feed_picks_up_notes_written_elsewhere() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reminders.db");
    let ours: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let theirs: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&path).unwrap());

    let notes = NoteStore::new(ours.clone());
    let mut feed = ReminderFeed::start(&notes, start_of_today());
    assert_eq!(feed.state(), &ReminderState::Ready(Vec::new()));

    let mut other_session = NoteStore::new(theirs);
    let today = Local::now().date_naive();
    other_session.save_for_day(today, "Call Globex", Local::now()).unwrap();

    assert!(!feed.poll(&notes));
    ours.poll_external_changes().unwrap();
    assert!(feed.poll(&notes));
    match feed.state() {
        ReminderState::Ready(list) => {
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].note, "Call Globex");
        }
        other => panic!("unexpected state {other:?}"),
    }
}

mod common;

use chrono::Local;
use common::june_first;
use std::sync::Arc;
use tempfile::TempDir;
use visit_tracker::dates::DayInterval;
use visit_tracker::notes::{NoteStore, SaveOutcome};
use visit_tracker::store::{self, DocumentStore, Query};
use visit_tracker::tui::App;
use visit_tracker::{Config, Route, SqliteStore};

#[test]
fn note_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("visits.db");

    {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&path).unwrap());
        let mut notes = NoteStore::new(store);
        assert_eq!(notes.load_for_day(june_first()).unwrap(), None);
        let outcome = notes.save_for_day(june_first(), "Visit ACME at 10am", Local::now()).unwrap();
        assert!(matches!(outcome, SaveOutcome::Created(_)));
    }

    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let docs = store.query(store::NOTES, &Query::all()).unwrap();
    assert_eq!(docs.len(), 1);
    assert!(DayInterval::local(june_first()).contains(docs[0].created_at));

    let mut notes = NoteStore::new(store);
    assert_eq!(
        notes.load_for_day(june_first()).unwrap().as_deref(),
        Some("Visit ACME at 10am")
    );
}

#[test]
fn app_edits_update_the_same_note() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("visits.db")).unwrap());
    let mut app = App::new(Config::default(), store.clone(), Route::Home).unwrap();
    app.select_date(june_first());

    for c in "Visit ACME".chars() {
        app.note_panel.editor.insert_char(c);
    }
    app.request_save_note(false);
    app.tick();
    for c in " at 10am".chars() {
        app.note_panel.editor.insert_char(c);
    }
    app.request_save_note(false);
    app.tick();

    let docs = store.query(store::NOTES, &Query::all()).unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].fields["note"], "Visit ACME at 10am");
    assert!(docs[0].updated_at.is_some());
    assert!(app.alert.is_none());
}

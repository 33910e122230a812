mod common;

use common::june_first;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use std::sync::Arc;
use visit_tracker::tui::{App, Layout, Mode, render};
use visit_tracker::{Config, Route, SqliteStore};

fn draw(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
    terminal
        .draw(|f| {
            let layout = Layout::calculate(Rect::new(0, 0, width, height), app.config.reminder_width_percent, app.show_reminders);
            render(f, app, &layout);
        })
        .unwrap();
    let buffer = terminal.backend().buffer();
    let mut text = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            text.push_str(buffer[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn home_screen_shows_calendar_notes_and_reminders() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut app = App::new(Config::default(), store, Route::Home).unwrap();
    app.select_date(june_first());

    let screen = draw(&mut app, 120, 32);
    assert!(screen.contains("Visit Tracker"));
    assert!(screen.contains("Welcome to Visit Tracker"));
    assert!(screen.contains("June 2024"));
    assert!(screen.contains("Notes for June 01, 2024"));
    assert!(screen.contains("Write your notes here..."));
    assert!(screen.contains("Upcoming Notes"));
    assert!(screen.contains("No upcoming notes found."));
}

#[test]
fn day_page_and_form_render() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut app = App::new(Config::default(), store, Route::Day(june_first())).unwrap();
    let screen = draw(&mut app, 120, 32);
    assert!(screen.contains("Date: June 01, 2024"));

    app.open_visit_form();
    assert_eq!(app.mode, Mode::VisitForm);
    let screen = draw(&mut app, 120, 32);
    assert!(screen.contains("Add New Customer"));
    assert!(screen.contains("[ Add Customer ]"));
}

#[test]
fn invalid_route_renders_message() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut app = App::new(Config::default(), store, Route::parse("/31-02-2024")).unwrap();
    let screen = draw(&mut app, 100, 24);
    assert!(screen.contains("Invalid date: 31-02-2024"));
}

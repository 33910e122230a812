use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use std::time::Duration;

use crate::route::Route;
use crate::tui::app::{App, FormStatus, Mode, Screen};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::editor::Editor;
use crate::utils::{ParsedKeyBinding, has_primary_modifier, parse_key_binding};
use crate::visit_form::FormField;

/// Restores the terminal when dropped, including on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Refuse to start in a terminal too small to lay out, before leaving the normal screen
    let (width, height) = terminal_size()?;
    let (min_width, min_height) = (Layout::MIN_WIDTH + 2, Layout::MIN_HEIGHT + 2);
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    tracing::info!("tui started");

    loop {
        app.tick();

        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(area, app.config.reminder_width_percent, app.show_reminders);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        if event::poll(Duration::from_millis(16))? {
            // Only Press events; Windows also reports Release
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    app.reminders.cancel();
    guard.restore()?;
    tracing::info!("tui stopped");
    Ok(())
}

fn binding(key: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key).map_err(TuiError::KeyBindingError)
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    binding.requires_ctrl == has_primary_modifier(key_event.modifiers) && binding.key_code == key_event.code
}

fn is(app: &App, key_event: KeyEvent, select: fn(&crate::config::KeyBindings) -> &str) -> Result<bool, TuiError> {
    Ok(matches_key_event(key_event, &binding(select(&app.config.key_bindings))?))
}

/// Returns Ok(true) when the app should quit
pub(crate) fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    // A write failure alert blocks everything until acknowledged
    if app.alert.is_some() {
        if matches!(key_event.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.alert = None;
        }
        return Ok(false);
    }
    // Input waits for the deferred write to land on the next tick
    if app.pending.is_some() {
        return Ok(false);
    }

    match app.mode {
        Mode::Help => handle_help_mode(app, key_event),
        Mode::GoTo => handle_goto_mode(app, key_event),
        Mode::EditNote => handle_edit_note_mode(app, key_event),
        Mode::VisitForm => handle_visit_form_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc || is(app, key_event, |k| k.help.as_str())? {
        app.mode = Mode::View;
    }
    Ok(false)
}

fn handle_goto_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.mode = Mode::View,
        KeyCode::Enter => {
            let route = Route::parse(&app.goto.text());
            app.goto = Editor::single_line();
            app.navigate(route);
        }
        _ => {
            edit_text(&mut app.goto, key_event);
        }
    }
    Ok(false)
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if is(app, key_event, |k| k.quit.as_str())? {
        return Ok(true);
    }
    if is(app, key_event, |k| k.help.as_str())? {
        app.mode = Mode::Help;
        return Ok(false);
    }
    if is(app, key_event, |k| k.goto.as_str())? {
        app.goto = Editor::single_line();
        app.mode = Mode::GoTo;
        return Ok(false);
    }
    if is(app, key_event, |k| k.toggle_reminders.as_str())? {
        app.toggle_reminders();
        return Ok(false);
    }

    match app.screen {
        Screen::Home => handle_home_keys(app, key_event),
        Screen::Day(_) => handle_day_keys(app, key_event),
        Screen::InvalidRoute(_) => {
            if is(app, key_event, |k| k.back.as_str())? {
                app.go_home();
            }
            Ok(false)
        }
    }
}

fn handle_home_keys(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if is(app, key_event, |k| k.save.as_str())? {
        app.request_save_note(false);
        return Ok(false);
    }
    if is(app, key_event, |k| k.edit.as_str())? || key_event.code == KeyCode::Enter {
        app.mode = Mode::EditNote;
        return Ok(false);
    }
    if is(app, key_event, |k| k.open_day.as_str())? {
        app.request_save_note(true);
        return Ok(false);
    }
    if is(app, key_event, |k| k.today.as_str())? {
        let today = app.today;
        app.select_date(today);
        return Ok(false);
    }
    match key_event.code {
        KeyCode::Left => app.move_days(-1),
        KeyCode::Right => app.move_days(1),
        KeyCode::Up => app.move_days(-7),
        KeyCode::Down => app.move_days(7),
        KeyCode::PageUp => app.move_months(-1),
        KeyCode::PageDown => app.move_months(1),
        _ => {}
    }
    Ok(false)
}

fn handle_day_keys(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if is(app, key_event, |k| k.back.as_str())? {
        app.go_home();
        return Ok(false);
    }
    if is(app, key_event, |k| k.new_visit.as_str())? {
        app.open_visit_form();
        return Ok(false);
    }
    if let Screen::Day(page) = &mut app.screen {
        match key_event.code {
            KeyCode::Down | KeyCode::Char('j') => page.scroll = page.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => page.scroll = page.scroll.saturating_sub(1),
            KeyCode::Home => page.scroll = 0,
            _ => {}
        }
    }
    Ok(false)
}

fn handle_edit_note_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if is(app, key_event, |k| k.save.as_str())? {
        app.request_save_note(false);
        return Ok(false);
    }
    if key_event.code == KeyCode::Esc {
        app.mode = Mode::View;
        return Ok(false);
    }
    if app.note_panel.saving {
        return Ok(false);
    }
    if is(app, key_event, |k| k.undo.as_str())? {
        app.note_panel.editor.undo();
        return Ok(false);
    }
    let word_left = is(app, key_event, |k| k.word_left.as_str())?;
    let word_right = is(app, key_event, |k| k.word_right.as_str())?;
    let editor = &mut app.note_panel.editor;
    let extend = key_event.modifiers.contains(KeyModifiers::SHIFT);
    if word_left {
        editor.move_word_left(extend);
    } else if word_right {
        editor.move_word_right(extend);
    } else if has_primary_modifier(key_event.modifiers) {
        match key_event.code {
            KeyCode::Char('a') => editor.select_all(),
            KeyCode::Char('c') => {
                if let Some(text) = editor.selected_text() {
                    copy_to_clipboard(app, text);
                }
            }
            KeyCode::Char('x') => {
                if let Some(text) = editor.cut_selection() {
                    copy_to_clipboard(app, text);
                }
            }
            _ => {}
        }
    } else if key_event.code == KeyCode::Enter {
        editor.insert_newline();
    } else {
        edit_text(editor, key_event);
    }
    Ok(false)
}

fn copy_to_clipboard(app: &mut App, text: String) {
    match arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
        Ok(()) => app.set_status_message("Copied to clipboard"),
        Err(e) => {
            tracing::warn!(error = %e, "clipboard unavailable");
            app.set_status_message(format!("Clipboard unavailable: {}", e));
        }
    }
}

/// Plain editing keys shared by every text input. Returns whether the key was used.
fn edit_text(editor: &mut Editor, key_event: KeyEvent) -> bool {
    let extend = key_event.modifiers.contains(KeyModifiers::SHIFT);
    match key_event.code {
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => editor.insert_char(c),
        KeyCode::Backspace => editor.delete_back(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left => editor.move_left(extend),
        KeyCode::Right => editor.move_right(extend),
        KeyCode::Up => editor.move_up(extend),
        KeyCode::Down => editor.move_down(extend),
        KeyCode::Home => editor.move_home(extend),
        KeyCode::End => editor.move_end(extend),
        _ => return false,
    }
    true
}

fn handle_visit_form_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let submit = is(app, key_event, |k| k.save.as_str())?;
    let names = match &app.screen {
        Screen::Day(page) => page.customers.clone(),
        _ => Vec::new(),
    };
    let buyer_options = app.config.buyer_options.clone();
    let Some(state) = app.form.as_mut() else {
        app.mode = Mode::View;
        return Ok(false);
    };
    if state.status != FormStatus::Editing {
        return Ok(false);
    }
    if key_event.code == KeyCode::Esc {
        app.close_visit_form();
        return Ok(false);
    }
    if submit {
        app.request_submit();
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Tab => {
            state.accept_suggestion(&names);
            state.focus_next();
            return Ok(false);
        }
        KeyCode::BackTab => {
            state.focus_prev();
            return Ok(false);
        }
        _ => {}
    }

    match state.focused_field() {
        FormField::Customer => match key_event.code {
            KeyCode::Down => state.cycle_suggestion(&names, true),
            KeyCode::Up => state.cycle_suggestion(&names, false),
            KeyCode::Enter => {
                if !state.accept_suggestion(&names) {
                    state.focus_next();
                }
            }
            _ => {
                if edit_text(&mut state.customer, key_event) {
                    state.suggestion_index = None;
                    state.sync_text();
                }
            }
        },
        FormField::Purpose(_) | FormField::SalesOption(_) | FormField::SampleType(_) => match key_event.code {
            KeyCode::Char(' ') | KeyCode::Enter => state.toggle_focused(),
            KeyCode::Down => state.focus_next(),
            KeyCode::Up => state.focus_prev(),
            _ => {}
        },
        FormField::Buyer => match key_event.code {
            KeyCode::Right | KeyCode::Char(' ') => state.cycle_buyer(&buyer_options, true),
            KeyCode::Left => state.cycle_buyer(&buyer_options, false),
            KeyCode::Down | KeyCode::Enter => state.focus_next(),
            KeyCode::Up => state.focus_prev(),
            _ => {}
        },
        FormField::Remark(_) => match key_event.code {
            KeyCode::Down | KeyCode::Enter => state.focus_next(),
            KeyCode::Up => state.focus_prev(),
            _ => {
                if let Some(editor) = state.focused_editor() {
                    if edit_text(editor, key_event) {
                        state.sync_text();
                    }
                }
            }
        },
        FormField::Submit => match key_event.code {
            KeyCode::Enter => app.request_submit(),
            KeyCode::Up => state.focus_prev(),
            KeyCode::Down => state.focus_next(),
            _ => {}
        },
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::dates::DayInterval;
    use crate::models::{Purpose, SalesOption, SampleType};
    use crate::store::{self, DocumentStore, Query, SqliteStore};
    use crate::tui::app::{SAVE_FAILED, VISIT_SAVED};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn app_at(route: Route) -> (Arc<SqliteStore>, App) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut config = Config::default();
        config.form_close_delay_ms = 0;
        let app = App::new(config, store.clone(), route).unwrap();
        (store, app)
    }

    #[test]
    fn write_save_and_reload_note() {
        let (_store, mut app) = app_at(Route::Home);
        app.select_date(june_first());

        handle_key_event(&mut app, key(KeyCode::Char('e'))).unwrap();
        assert_eq!(app.mode, Mode::EditNote);
        type_text(&mut app, "Visit ACME at 10am");
        handle_key_event(&mut app, ctrl('s')).unwrap();
        assert!(app.note_panel.saving);
        app.tick();
        assert!(!app.note_panel.saving);

        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        assert!(app.note_panel.editor.is_blank());
        handle_key_event(&mut app, key(KeyCode::Left)).unwrap();
        assert_eq!(app.note_panel.editor.text(), "Visit ACME at 10am");
    }

    #[test]
    fn open_day_saves_first() {
        let (store, mut app) = app_at(Route::Home);
        app.select_date(june_first());
        handle_key_event(&mut app, key(KeyCode::Char('e'))).unwrap();
        type_text(&mut app, "call Globex");
        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Char('o'))).unwrap();
        app.tick();

        assert!(matches!(&app.screen, Screen::Day(page) if page.date == june_first()));
        let notes = store.query(store::NOTES, &Query::all()).unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn invalid_route_shows_error_screen() {
        let (_store, mut app) = app_at(Route::parse("/not-a-date"));
        assert!(matches!(&app.screen, Screen::InvalidRoute(raw) if raw == "not-a-date"));
        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert!(matches!(app.screen, Screen::Home));
    }

    #[test]
    fn goto_prompt_navigates() {
        let (_store, mut app) = app_at(Route::Home);
        handle_key_event(&mut app, key(KeyCode::Char('g'))).unwrap();
        type_text(&mut app, "/2024-06-01");
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(matches!(&app.screen, Screen::Day(page) if page.date == june_first()));
        assert_eq!(app.selected_date, june_first());
    }

    #[test]
    fn form_submission_records_visit_and_closes() {
        let (store, mut app) = app_at(Route::Day(june_first()));
        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.mode, Mode::VisitForm);

        type_text(&mut app, "ACME");
        // Customer -> Sales
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        {
            let form = &app.form.as_ref().unwrap().form;
            assert!(form.has_purpose(Purpose::Sales));
            assert!(form.is_visible(FormField::Buyer));
        }
        // Sales -> Admin -> Buyer
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        // Buyer -> regular -> new inquiry -> sample collection
        for _ in 0..3 {
            handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        }
        handle_key_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        // sample collection -> sample submission -> fabric
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        assert_eq!(
            app.form.as_ref().unwrap().focused_field(),
            FormField::SampleType(SampleType::Fabric)
        );
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();

        handle_key_event(&mut app, ctrl('s')).unwrap();
        assert_eq!(app.form.as_ref().unwrap().status, FormStatus::Submitting);
        app.tick();
        assert_eq!(app.status.message.as_deref(), Some(VISIT_SAVED));
        app.tick();
        assert!(app.form.is_none());
        assert_eq!(app.mode, Mode::View);

        let Screen::Day(page) = &app.screen else {
            panic!("expected day page");
        };
        assert_eq!(page.entries.len(), 1);
        let entry = &page.entries[0];
        assert_eq!(entry.customer_name, "ACME");
        assert_eq!(entry.buyer, "Buyer A");
        assert_eq!(entry.sales_options, vec![SalesOption::SampleCollection]);
        assert_eq!(entry.remarks.keys().collect::<Vec<_>>(), vec!["fabric"]);
        assert_eq!(entry.created_at, DayInterval::local(june_first()).start);
        assert!(page.customers.contains(&"ACME".to_string()));
        assert_eq!(store.query(store::CUSTOMERS, &Query::all()).unwrap().len(), 1);
    }

    #[test]
    fn empty_customer_blocks_submit() {
        let (store, mut app) = app_at(Route::Day(june_first()));
        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        handle_key_event(&mut app, ctrl('s')).unwrap();
        app.tick();
        assert_eq!(app.form.as_ref().unwrap().status, FormStatus::Editing);
        assert!(app.pending.is_none());
        assert!(store.query(store::VISITS, &Query::all()).unwrap().is_empty());
    }

    #[test]
    fn blank_customer_browses_the_whole_directory() {
        let (_store, mut app) = app_at(Route::Day(june_first()));
        let names: Vec<String> = ["ACME", "Globex", "Initech", "Hooli", "Umbrella", "Stark", "Wayne"]
            .iter()
            .map(|n| n.to_string())
            .collect();
        if let Screen::Day(page) = &mut app.screen {
            page.customers = names.clone();
        }
        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        assert!(app.form.as_ref().unwrap().visible_suggestions(&names).is_empty());

        handle_key_event(&mut app, key(KeyCode::Down)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Down)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.form.as_ref().unwrap().customer.text(), "Globex");

        // Up from a cleared field wraps to the last name, past the first five
        let state = app.form.as_mut().unwrap();
        state.customer.replace_all("");
        state.sync_text();
        handle_key_event(&mut app, key(KeyCode::Up)).unwrap();
        let visible = app.form.as_ref().unwrap().visible_suggestions(&names);
        assert_eq!(visible.len(), 5);
        assert_eq!(visible.last(), Some(&(6, "Wayne")));
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.form.as_ref().unwrap().customer.text(), "Wayne");
    }

    #[test]
    fn broken_binding_in_config_keeps_the_app_running() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let mut config = Config::default();
        config.key_bindings.goto = "Hyper+g".to_string();
        let mut app = App::new(config, store, Route::Home).unwrap();
        let start = app.selected_date;

        assert!(!handle_key_event(&mut app, key(KeyCode::Right)).unwrap());
        assert_eq!(app.selected_date, start.succ_opt().unwrap());
        handle_key_event(&mut app, key(KeyCode::Char('g'))).unwrap();
        assert_eq!(app.mode, Mode::GoTo);
    }

    #[test]
    fn alert_blocks_until_dismissed() {
        let (_store, mut app) = app_at(Route::Home);
        app.alert = Some(SAVE_FAILED.to_string());
        assert!(!handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
        assert!(app.alert.is_some());
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert!(app.alert.is_none());
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
    }

    #[test]
    fn reminder_panel_toggle_cancels_feed() {
        let (_store, mut app) = app_at(Route::Home);
        assert!(app.reminders.is_active());
        handle_key_event(&mut app, key(KeyCode::Char('r'))).unwrap();
        assert!(!app.reminders.is_active());
        handle_key_event(&mut app, key(KeyCode::Char('r'))).unwrap();
        assert!(app.reminders.is_active());
    }
}

use chrono::{Duration, Local, Months, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use crate::Config;
use crate::customers::{self, CustomerDirectory};
use crate::dates::{day_key, start_of_today};
use crate::models::{RemarkKey, VisitEntry};
use crate::notes::{NoteStore, SaveOutcome};
use crate::reminders::{ReminderFeed, ReminderState};
use crate::route::Route;
use crate::store::DocumentStore;
use crate::tui::error::TuiError;
use crate::tui::widgets::editor::Editor;
use crate::visit_form::{FormError, FormField, VisitForm};
use crate::visits::VisitLog;

pub const SAVE_FAILED: &str = "Failed to save. Please try again.";
pub const VISIT_SAVED: &str = "Customer added successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    EditNote,
    VisitForm,
    GoTo,
    Help,
}

#[derive(Debug)]
pub enum Screen {
    Home,
    Day(DayPage),
    InvalidRoute(String),
}

/// Store work deferred to the next tick so the busy state gets drawn first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    SaveNote { then_open_day: bool },
    SubmitVisit,
}

#[derive(Debug)]
pub struct NotePanel {
    pub date: NaiveDate,
    pub editor: Editor,
    pub load_error: Option<String>,
    pub saving: bool,
}

#[derive(Debug)]
pub struct DayPage {
    pub date: NaiveDate,
    pub entries: Vec<VisitEntry>,
    pub load_error: Option<String>,
    pub customers: Vec<String>,
    pub scroll: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStatus {
    Editing,
    Submitting,
    Saved { at: Instant },
}

/// Suggestion rows shown at once under the customer field
const SUGGESTION_ROWS: usize = 5;

#[derive(Debug)]
pub struct FormState {
    pub form: VisitForm,
    pub focus: usize,
    pub customer: Editor,
    pub remarks: BTreeMap<RemarkKey, Editor>,
    /// Index into the buyer options; None until one is picked
    pub buyer_index: Option<usize>,
    pub suggestion_index: Option<usize>,
    pub status: FormStatus,
}

impl FormState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            form: VisitForm::new(date),
            focus: 0,
            customer: Editor::single_line(),
            remarks: BTreeMap::new(),
            buyer_index: None,
            suggestion_index: None,
            status: FormStatus::Editing,
        }
    }

    pub fn focused_field(&self) -> FormField {
        let fields = self.form.visible_fields();
        fields
            .get(self.focus.min(fields.len().saturating_sub(1)))
            .copied()
            .unwrap_or(FormField::Submit)
    }

    pub fn focus_next(&mut self) {
        let count = self.form.visible_fields().len();
        self.focus = (self.focus + 1) % count.max(1);
    }

    pub fn focus_prev(&mut self) {
        let count = self.form.visible_fields().len().max(1);
        self.focus = (self.focus + count - 1) % count;
    }

    /// Keep focus on the same field after the visible set changed
    fn refocus(&mut self, field: FormField) {
        let fields = self.form.visible_fields();
        self.focus = fields
            .iter()
            .position(|f| *f == field)
            .unwrap_or_else(|| self.focus.min(fields.len().saturating_sub(1)));
    }

    /// Toggle the focused checkbox, if it is one
    pub fn toggle_focused(&mut self) {
        let field = self.focused_field();
        match field {
            FormField::Purpose(p) => self.form.toggle_purpose(p),
            FormField::SalesOption(o) => self.form.toggle_sales_option(o),
            FormField::SampleType(s) => self.form.toggle_sample_type(s),
            _ => return,
        }
        self.refocus(field);
    }

    pub fn cycle_buyer(&mut self, options: &[String], forward: bool) {
        if options.is_empty() {
            return;
        }
        let len = options.len();
        let next = match (self.buyer_index, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.buyer_index = Some(next);
        self.form.buyer = Some(options[next].clone());
    }

    /// Editor of the focused text field
    pub fn focused_editor(&mut self) -> Option<&mut Editor> {
        match self.focused_field() {
            FormField::Customer => Some(&mut self.customer),
            FormField::Remark(key) => Some(self.remarks.entry(key).or_insert_with(Editor::single_line)),
            _ => None,
        }
    }

    /// Copy editor contents into the form state
    pub fn sync_text(&mut self) {
        self.form.customer_name = self.customer.text();
        for (key, editor) in &self.remarks {
            self.form.set_remark(*key, editor.text());
        }
    }

    /// Directory names matching what was typed. A blank field matches every name.
    pub fn suggestions<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        let typed = self.customer.text();
        customers::suggestions(names, &typed)
            .into_iter()
            .filter(|n| *n != typed.trim())
            .collect()
    }

    /// Suggestions to draw under the customer field with their indexes.
    /// A blank field stays quiet until Up/Down starts browsing; the window
    /// follows the highlighted entry.
    pub fn visible_suggestions<'a>(&self, names: &'a [String]) -> Vec<(usize, &'a str)> {
        if self.customer.text().trim().is_empty() && self.suggestion_index.is_none() {
            return Vec::new();
        }
        let matches = self.suggestions(names);
        let start = match self.suggestion_index {
            Some(i) if i >= SUGGESTION_ROWS => i + 1 - SUGGESTION_ROWS,
            _ => 0,
        };
        matches.into_iter().enumerate().skip(start).take(SUGGESTION_ROWS).collect()
    }

    pub fn cycle_suggestion(&mut self, names: &[String], forward: bool) {
        let matches = self.suggestions(names);
        if matches.is_empty() {
            self.suggestion_index = None;
            return;
        }
        let len = matches.len();
        let next = match (self.suggestion_index, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        };
        self.suggestion_index = Some(next);
    }

    /// Replace the typed customer name with the highlighted suggestion
    pub fn accept_suggestion(&mut self, names: &[String]) -> bool {
        let Some(index) = self.suggestion_index else {
            return false;
        };
        let Some(name) = self.suggestions(names).get(index).map(|s| s.to_string()) else {
            return false;
        };
        self.customer.replace_all(&name);
        self.suggestion_index = None;
        self.sync_text();
        true
    }
}

#[derive(Debug, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub screen: Screen,
    pub mode: Mode,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
    pub note_panel: NotePanel,
    pub form: Option<FormState>,
    pub alert: Option<String>,
    pub goto: Editor,
    pub status: StatusState,
    pub show_reminders: bool,
    pub reminders: ReminderFeed,
    pub pending: Option<PendingAction>,
    store: Arc<dyn DocumentStore>,
    notes: NoteStore,
    visits: VisitLog,
    customers: CustomerDirectory,
    last_change_poll: Instant,
}

impl App {
    pub fn new(mut config: Config, store: Arc<dyn DocumentStore>, route: Route) -> Result<Self, TuiError> {
        for name in config.key_bindings.reset_invalid() {
            tracing::warn!(binding = name, "invalid key binding, using the default");
        }
        let notes = NoteStore::new(store.clone());
        let reminders = ReminderFeed::start(&notes, start_of_today());
        let today = Local::now().date_naive();

        let mut app = Self {
            config,
            screen: Screen::Home,
            mode: Mode::View,
            selected_date: today,
            today,
            note_panel: NotePanel {
                date: today,
                editor: Editor::new(),
                load_error: None,
                saving: false,
            },
            form: None,
            alert: None,
            goto: Editor::single_line(),
            status: StatusState::default(),
            show_reminders: true,
            reminders,
            pending: None,
            visits: VisitLog::new(store.clone()),
            customers: CustomerDirectory::new(store.clone()),
            store,
            notes,
            last_change_poll: Instant::now(),
        };
        app.load_note_panel();
        app.navigate(route);
        Ok(app)
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.message_time = Some(Instant::now());
    }

    pub fn check_status_message_timeout(&mut self) {
        let timeout = StdDuration::from_secs(self.config.status_message_secs);
        if self
            .status
            .message_time
            .is_some_and(|t| t.elapsed() >= timeout)
        {
            self.status.message = None;
            self.status.message_time = None;
        }
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(route = %route.path(), "navigate");
        self.form = None;
        self.mode = Mode::View;
        match route {
            Route::Home => self.go_home(),
            Route::Day(date) => {
                self.select_date(date);
                self.open_day_page(date);
            }
            Route::Invalid(raw) => self.screen = Screen::InvalidRoute(raw),
        }
    }

    pub fn go_home(&mut self) {
        self.screen = Screen::Home;
        self.mode = Mode::View;
        self.form = None;
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        if date == self.selected_date && self.note_panel.date == date {
            return;
        }
        self.selected_date = date;
        self.load_note_panel();
    }

    pub fn move_days(&mut self, days: i64) {
        if let Some(date) = self.selected_date.checked_add_signed(Duration::days(days)) {
            self.select_date(date);
        }
    }

    pub fn move_months(&mut self, months: i32) {
        let step = Months::new(months.unsigned_abs());
        let moved = if months >= 0 {
            self.selected_date.checked_add_months(step)
        } else {
            self.selected_date.checked_sub_months(step)
        };
        if let Some(date) = moved {
            self.select_date(date);
        }
    }

    /// Reload the note panel for the selected date. Unsaved edits are dropped.
    pub fn load_note_panel(&mut self) {
        let date = self.selected_date;
        self.note_panel.date = date;
        self.note_panel.load_error = None;
        self.note_panel.editor = match self.notes.load_for_day(date) {
            Ok(Some(text)) => Editor::from_text(&text),
            Ok(None) => Editor::new(),
            Err(e) => {
                tracing::warn!(day = %day_key(date), error = %e, "failed to load note");
                self.note_panel.load_error = Some("Failed to load note.".to_string());
                Editor::new()
            }
        };
    }

    pub fn request_save_note(&mut self, then_open_day: bool) {
        if self.pending.is_some() {
            return;
        }
        self.note_panel.saving = true;
        self.pending = Some(PendingAction::SaveNote { then_open_day });
    }

    fn save_note_now(&mut self, then_open_day: bool) {
        let date = self.note_panel.date;
        let text = self.note_panel.editor.text();
        let result = self.notes.save_for_day(date, &text, Local::now());
        self.note_panel.saving = false;
        match result {
            Ok(SaveOutcome::Created(_)) | Ok(SaveOutcome::Updated(_)) => {
                self.set_status_message(format!("Note saved for {}", day_key(date)));
            }
            Ok(SaveOutcome::Skipped) => {}
            Err(e) => {
                tracing::error!(day = %day_key(date), error = %e, "failed to save note");
                self.alert = Some(SAVE_FAILED.to_string());
                return;
            }
        }
        if then_open_day {
            self.mode = Mode::View;
            self.open_day_page(date);
        }
    }

    pub fn open_day_page(&mut self, date: NaiveDate) {
        let customers = match self.customers.names() {
            Ok(names) => {
                self.set_status_message(format!("Connected to the store and fetched {} customers.", names.len()));
                names
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load customer directory");
                self.set_status_message("Failed to connect to the store.");
                Vec::new()
            }
        };
        let (entries, load_error) = match self.visits.for_day(date) {
            Ok(entries) => (entries, None),
            Err(e) => {
                tracing::warn!(day = %day_key(date), error = %e, "failed to load visits");
                (Vec::new(), Some("Failed to load visits for this day.".to_string()))
            }
        };
        self.screen = Screen::Day(DayPage {
            date,
            entries,
            load_error,
            customers,
            scroll: 0,
        });
    }

    pub fn open_visit_form(&mut self) {
        if let Screen::Day(page) = &self.screen {
            self.form = Some(FormState::new(page.date));
            self.mode = Mode::VisitForm;
        }
    }

    pub fn close_visit_form(&mut self) {
        self.form = None;
        self.mode = Mode::View;
    }

    /// Validate the form and queue the write
    pub fn request_submit(&mut self) {
        let Some(state) = self.form.as_mut() else {
            return;
        };
        if state.status != FormStatus::Editing || self.pending.is_some() {
            return;
        }
        state.sync_text();
        if let Err(FormError::MissingCustomer) = state.form.validate() {
            self.set_status_message("Customer name is required");
            return;
        }
        state.status = FormStatus::Submitting;
        self.pending = Some(PendingAction::SubmitVisit);
    }

    fn submit_visit_now(&mut self) {
        let Some(state) = self.form.as_mut() else {
            return;
        };
        match state.form.submit(&self.visits) {
            Ok(entry) => {
                state.status = FormStatus::Saved { at: Instant::now() };
                if let Screen::Day(page) = &mut self.screen {
                    match self.customers.add_if_missing(&entry.customer_name, &page.customers) {
                        Ok(true) => page.customers.push(entry.customer_name.clone()),
                        Ok(false) => {}
                        Err(e) => tracing::warn!(error = %e, "failed to add customer to directory"),
                    }
                    if page.date == state.form.date() {
                        page.entries.push(entry);
                    }
                }
                self.set_status_message(VISIT_SAVED);
            }
            Err(e) => {
                tracing::error!(error = %e, "visit submission failed");
                state.status = FormStatus::Editing;
                self.alert = Some(SAVE_FAILED.to_string());
            }
        }
    }

    pub fn toggle_reminders(&mut self) {
        self.show_reminders = !self.show_reminders;
        if self.show_reminders {
            self.reminders.restart(&self.notes, start_of_today());
        } else {
            self.reminders.cancel();
        }
    }

    /// Days from today onward that have a note, for calendar markers
    pub fn days_with_notes(&self) -> HashSet<NaiveDate> {
        match self.reminders.state() {
            ReminderState::Ready(list) => list
                .iter()
                .map(|n| n.created_at.with_timezone(&Local).date_naive())
                .collect(),
            _ => HashSet::new(),
        }
    }

    /// Periodic work between frames: deferred store calls, form auto-close,
    /// change polling and day rollover
    pub fn tick(&mut self) {
        self.check_status_message_timeout();

        match self.pending.take() {
            Some(PendingAction::SaveNote { then_open_day }) => self.save_note_now(then_open_day),
            Some(PendingAction::SubmitVisit) => self.submit_visit_now(),
            None => {}
        }

        let close_after = StdDuration::from_millis(self.config.form_close_delay_ms);
        if let Some(FormState {
            status: FormStatus::Saved { at },
            ..
        }) = &self.form
        {
            if at.elapsed() >= close_after {
                self.close_visit_form();
            }
        }

        let today = Local::now().date_naive();
        if today != self.today {
            self.today = today;
            if self.show_reminders {
                self.reminders.restart(&self.notes, start_of_today());
            }
        }

        if self.last_change_poll.elapsed() >= StdDuration::from_millis(self.config.change_poll_ms) {
            self.last_change_poll = Instant::now();
            if let Err(e) = self.store.poll_external_changes() {
                tracing::warn!(error = %e, "change polling failed");
            }
        }
        self.reminders.poll(&self.notes);
    }
}

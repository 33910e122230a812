use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::dates::format_long;
use crate::tui::app::{App, Mode, Screen};
use crate::tui::layout::Layout;
use crate::tui::widgets::calendar::{CalendarView, calendar_width, render_calendar};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::day_view::render_day_view;
use crate::tui::widgets::help::render_help;
use crate::tui::widgets::modal::{render_alert, render_goto_prompt};
use crate::tui::widgets::note_panel::render_note_panel;
use crate::tui::widgets::reminder_list::render_reminder_list;
use crate::tui::widgets::status_bar::render_status_bar;
use crate::tui::widgets::visit_form::render_visit_form;
use crate::utils::format_key_binding_for_display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let theme = app.config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let bg = parse_color(&theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Visit Tracker")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg).bg(bg));
    f.render_widget(outer_block, f.area());

    let header = match &app.screen {
        Screen::Home => "Welcome to Visit Tracker".to_string(),
        Screen::Day(page) => format!("Date: {}", format_long(page.date)),
        Screen::InvalidRoute(_) => "Visit Tracker".to_string(),
    };
    f.render_widget(
        Paragraph::new(header)
            .alignment(Alignment::Center)
            .style(Style::default().fg(parse_color(&theme.accent)).add_modifier(Modifier::BOLD)),
        layout.header_area,
    );

    let mut cursor = None;
    let marked = app.days_with_notes();
    match &mut app.screen {
        Screen::Home => {
            let columns = RatLayout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(calendar_width()), Constraint::Min(1)])
                .split(layout.main_area);
            // Header row plus six weeks plus borders
            let calendar_area = Rect::new(columns[0].x, columns[0].y, columns[0].width, columns[0].height.min(9));
            let view = CalendarView {
                selected: app.selected_date,
                today: app.today,
                marked: &marked,
                focused: app.mode == Mode::View,
            };
            render_calendar(f, calendar_area, &view, &app.config);

            let editing = app.mode == Mode::EditNote;
            let text_area = render_note_panel(f, columns[1], &mut app.note_panel, editing, &app.config);
            if editing {
                cursor = app.note_panel.editor.cursor_screen_pos(text_area);
            }
        }
        Screen::Day(page) => render_day_view(f, layout.main_area, page, &app.config),
        Screen::InvalidRoute(raw) => {
            let text = format!(
                "Invalid date: {}\n\nRoutes are / or /YYYY-MM-DD. Press {} to go back.",
                raw,
                format_key_binding_for_display(&app.config.key_bindings.back)
            );
            f.render_widget(
                Paragraph::new(text)
                    .block(Block::default().borders(Borders::ALL).title("Not found"))
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true }),
                layout.main_area,
            );
        }
    }

    if app.show_reminders && layout.reminder_area.width > 0 {
        render_reminder_list(f, layout.reminder_area, app.reminders.state(), &app.config);
    }

    let hints = key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_deref(), &hints, &app.config);

    if let (Some(state), Screen::Day(page)) = (app.form.as_mut(), &app.screen) {
        cursor = render_visit_form(f, layout.inner_area, state, &page.customers, &app.config);
    }
    match app.mode {
        Mode::GoTo => cursor = render_goto_prompt(f, layout.inner_area, &mut app.goto, &app.config),
        Mode::Help => {
            cursor = None;
            render_help(f, layout.inner_area, &app.config);
        }
        _ => {}
    }
    if let Some(message) = &app.alert {
        cursor = None;
        render_alert(f, layout.inner_area, message, &app.config);
    }

    if let Some(position) = cursor {
        f.set_cursor_position(position);
    }
}

fn key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    let k = |binding: &str| format_key_binding_for_display(binding);
    match app.mode {
        Mode::EditNote => vec![
            format!("{}: Save", k(&keys.save)),
            "Esc: Done".to_string(),
            format!("{}: Undo", k(&keys.undo)),
        ],
        Mode::VisitForm => vec![
            "Tab: Next field".to_string(),
            "Space: Toggle".to_string(),
            format!("{}: Submit", k(&keys.save)),
            "Esc: Cancel".to_string(),
        ],
        Mode::GoTo => vec!["Enter: Go".to_string(), "Esc: Cancel".to_string()],
        Mode::Help => vec![format!("{}/Esc: Close help", k(&keys.help))],
        Mode::View => {
            let mut hints = match app.screen {
                Screen::Home => vec![
                    "Arrows: Move".to_string(),
                    format!("{}: Edit note", k(&keys.edit)),
                    format!("{}: Open day", k(&keys.open_day)),
                    format!("{}: Today", k(&keys.today)),
                ],
                Screen::Day(_) => vec![
                    format!("{}: New visit", k(&keys.new_visit)),
                    format!("{}: Back", k(&keys.back)),
                ],
                Screen::InvalidRoute(_) => vec![format!("{}: Back", k(&keys.back))],
            };
            hints.push(format!("{}: Go to", k(&keys.goto)));
            hints.push(format!("{}: Reminders", k(&keys.toggle_reminders)));
            hints.push(format!("{}: Help", k(&keys.help)));
            hints.push(format!("{}: Quit", k(&keys.quit)));
            hints
        }
    }
}

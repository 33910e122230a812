use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let theme = config.get_active_theme();
    let style = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));
    let popup = popup_area(area, 60, 80);
    f.render_widget(Clear, popup);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(style),
        )
        .style(style)
        .wrap(ratatui::widgets::Wrap { trim: false });
    f.render_widget(paragraph, popup);
}

fn describe(name: &str) -> &'static str {
    match name {
        "quit" => "Quit",
        "help" => "Show/hide help",
        "save" => "Save note / submit form",
        "edit" => "Edit the note",
        "open_day" => "Save note and open the day",
        "new_visit" => "Add a visit (day page)",
        "today" => "Jump to today",
        "goto" => "Go to a route",
        "back" => "Back to the calendar",
        "toggle_reminders" => "Show/hide upcoming notes",
        "undo" => "Undo (editor)",
        "word_left" => "Previous word (editor)",
        "word_right" => "Next word (editor)",
        _ => "",
    }
}

pub fn build_help_text(config: &Config) -> String {
    let mut text = String::from("Key Bindings:\n");
    for (name, binding) in config.key_bindings.entries() {
        text.push_str(&format!("  {}: {}\n", format_key_binding_for_display(binding), describe(name)));
    }
    text.push_str("\nCalendar:\n");
    text.push_str("  Arrow keys: Move by day/week\n");
    text.push_str("  PageUp/PageDown: Move by month\n");
    text.push_str("\nVisit form:\n");
    text.push_str("  Tab/Shift+Tab: Next/previous field\n");
    text.push_str("  Space: Toggle checkbox, next buyer\n");
    text.push_str("  Left/Right: Choose buyer\n");
    text.push_str("  Up/Down in customer: Pick a suggestion\n");
    text.push_str("  Esc: Close the form\n");
    text.push_str("\nEditor:\n");
    text.push_str("  Shift+Arrow: Extend selection\n");
    text.push_str("  Ctrl+a / Ctrl+c / Ctrl+x: Select all, copy, cut\n");
    text.push_str("  Esc: Stop editing\n");
    text
}

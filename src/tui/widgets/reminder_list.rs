use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::Config;
use crate::dates::format_reminder;
use crate::reminders::ReminderState;
use crate::tui::widgets::color::parse_color;

pub const EMPTY: &str = "No upcoming notes found.";

pub fn render_reminder_list(f: &mut Frame, area: Rect, state: &ReminderState, config: &Config) {
    if area.width < 2 || area.height < 2 {
        return;
    }
    let theme = config.get_active_theme();
    let base = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));
    let accent = parse_color(&theme.accent);

    let lines: Vec<Line> = match state {
        ReminderState::Loading => vec![Line::styled("Loading...", base.add_modifier(Modifier::DIM))],
        ReminderState::Failed(message) => vec![Line::styled(message.as_str(), Style::default().fg(Color::Red))],
        ReminderState::Ready(notes) if notes.is_empty() => vec![Line::styled(EMPTY, base)],
        ReminderState::Ready(notes) => notes
            .iter()
            .flat_map(|note| {
                [
                    Line::from(Span::styled(
                        format_reminder(note.created_at),
                        Style::default().fg(accent).add_modifier(Modifier::BOLD),
                    )),
                    Line::styled(note.note.clone(), base),
                    Line::default(),
                ]
            })
            .collect(),
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Upcoming Notes").style(base))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

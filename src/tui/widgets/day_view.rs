use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap};
use ratskin::RatSkin;
use std::cmp;
use termimad::minimad::Text as MinimadText;

use crate::Config;
use crate::models::VisitEntry;
use crate::tui::app::DayPage;
use crate::tui::widgets::color::parse_color;
use crate::visits::summary_rows;

/// Markdown for one entry card
pub fn entry_markdown(index: usize, entry: &VisitEntry) -> String {
    let mut content = format!("**Visit {}**\n", index + 1);
    for (label, value) in summary_rows(entry) {
        content.push_str(&format!("* **{}:** {}\n", label, escape_markdown(&value)));
    }
    content
}

/// Typed text renders literally: markup characters are backslash-escaped
/// and line breaks fold into spaces so a value stays inside its bullet.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '*' | '~' | '|' | '`' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page_markdown(page: &DayPage) -> String {
    if page.entries.is_empty() {
        return "No visits recorded for this day.\n".to_string();
    }
    page.entries
        .iter()
        .enumerate()
        .map(|(i, entry)| entry_markdown(i, entry))
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

/// Parse markdown with ratskin and convert to owned ratatui lines
fn markdown_lines(markdown: &str, width: u16) -> Vec<Line<'static>> {
    RatSkin::default()
        .parse(MinimadText::from(markdown), width)
        .into_iter()
        .map(|line| {
            let spans: Vec<Span> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.to_string(), span.style))
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// Entry cards for the Day Page with a scrollbar. Clamps `page.scroll`.
pub fn render_day_view(f: &mut Frame, area: Rect, page: &mut DayPage, config: &Config) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let horizontal = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let (content_area, scrollbar_area) = (horizontal[0], horizontal[1]);
    let viewport_height = content_area.height.saturating_sub(2) as usize;
    let text_width = content_area.width.saturating_sub(2);

    let mut lines = Vec::new();
    if let Some(error) = &page.load_error {
        lines.push(Line::styled(error.clone(), Style::default().fg(Color::Red)));
        lines.push(Line::default());
    }
    lines.extend(markdown_lines(&page_markdown(page), text_width));

    let total_lines = lines.len();
    let max_scroll = total_lines.saturating_sub(viewport_height);
    page.scroll = cmp::min(page.scroll, max_scroll);
    let end = cmp::min(page.scroll + viewport_height, total_lines);
    let visible = Text::from(lines[page.scroll..end].to_vec());

    let title = format!("Visits ({})", page.entries.len());
    let paragraph = Paragraph::new(visible)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(parse_color(&config.get_active_theme().fg)))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, content_area);

    if total_lines > viewport_height {
        let track = Rect::new(
            scrollbar_area.x,
            content_area.y + 1,
            scrollbar_area.width,
            content_area.height.saturating_sub(2),
        );
        let mut state = ScrollbarState::new(total_lines)
            .viewport_content_length(viewport_height)
            .position(page.scroll);
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, track, &mut state);
    }
}

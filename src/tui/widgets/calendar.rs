use chrono::{Datelike, NaiveDate};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::collections::HashSet;

use crate::Config;
use crate::tui::widgets::color::parse_color;

const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const CELL_WIDTH: usize = 4;

/// Weeks of a month, Sunday first. Cells outside the month are None.
pub fn month_grid(year: i32, month: u32) -> Vec<[Option<NaiveDate>; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut slot = first.weekday().num_days_from_sunday() as usize;
    for date in first.iter_days().take_while(|d| d.month() == month) {
        week[slot] = Some(date);
        slot += 1;
        if slot == 7 {
            weeks.push(week);
            week = [None; 7];
            slot = 0;
        }
    }
    if slot > 0 {
        weeks.push(week);
    }
    weeks
}

pub struct CalendarView<'a> {
    pub selected: NaiveDate,
    pub today: NaiveDate,
    pub marked: &'a HashSet<NaiveDate>,
    pub focused: bool,
}

pub fn render_calendar(f: &mut Frame, area: Rect, view: &CalendarView, config: &Config) {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let bg = parse_color(&theme.bg);
    let accent = parse_color(&theme.accent);
    let highlight = Style::default()
        .fg(parse_color(&theme.highlight_fg))
        .bg(parse_color(&theme.highlight_bg));
    let base = Style::default().fg(fg).bg(bg);

    let mut lines = vec![Line::from(
        WEEKDAYS
            .iter()
            .map(|d| Span::styled(format!("{:>width$}", d, width = CELL_WIDTH - 1) + " ", base.add_modifier(Modifier::BOLD)))
            .collect::<Vec<_>>(),
    )];

    for week in month_grid(view.selected.year(), view.selected.month()) {
        let spans = week
            .iter()
            .map(|cell| match cell {
                None => Span::styled(" ".repeat(CELL_WIDTH), base),
                Some(date) => {
                    // A trailing dot marks days that have a note
                    let marker = if view.marked.contains(date) { "•" } else { " " };
                    let text = format!("{:>width$}{}", date.day(), marker, width = CELL_WIDTH - 1);
                    let mut style = base;
                    if *date == view.today {
                        style = style.fg(accent).add_modifier(Modifier::BOLD);
                    }
                    if *date == view.selected {
                        style = highlight;
                    }
                    Span::styled(text, style)
                }
            })
            .collect::<Vec<_>>();
        lines.push(Line::from(spans));
    }

    let border_style = if view.focused { Style::default().fg(accent) } else { base };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(view.selected.format("%B %Y").to_string())
        .border_style(border_style)
        .style(base);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Width the calendar needs, borders included
pub const fn calendar_width() -> u16 {
    (CELL_WIDTH * 7 + 2) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn june_2024_starts_on_saturday() {
        let grid = month_grid(2024, 6);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0][6], NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!(grid[0][..6].iter().all(Option::is_none));
        assert_eq!(grid[5][0], NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn february_2026_fills_exactly_four_weeks() {
        let grid = month_grid(2026, 2);
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().flatten().all(Option::is_some));
    }

    #[test]
    fn every_day_appears_once() {
        let days: Vec<_> = month_grid(2024, 2).into_iter().flatten().flatten().collect();
        assert_eq!(days.len(), 29);
        assert_eq!(days.first().map(|d| d.day()), Some(1));
    }
}

use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub header_area: Rect,
    pub main_area: Rect,
    pub reminder_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions, excluding the outer border.
    /// Width fits the calendar grid (7 x 4 columns) plus panel borders;
    /// height fits header, a calendar month and the status line.
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 16;

    pub fn calculate(size: Rect, reminder_width_percent: u16, reminders_visible: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        // Reminder panel: at least 24 columns, at most half, and main keeps 34
        let reminder_width = if reminders_visible {
            let requested = (inner_area.width * reminder_width_percent) / 100;
            requested
                .max(24)
                .min(inner_area.width / 2)
                .min(inner_area.width.saturating_sub(34))
        } else {
            0
        };

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(reminder_width)])
            .split(vertical[1]);

        Self {
            inner_area,
            header_area: vertical[0],
            main_area: horizontal[0],
            reminder_area: horizontal[1],
            status_area: vertical[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_panel_takes_its_share() {
        let layout = Layout::calculate(Rect::new(0, 0, 102, 30), 30, true);
        assert_eq!(layout.inner_area.width, 100);
        assert_eq!(layout.reminder_area.width, 30);
        assert_eq!(layout.main_area.width, 70);
        assert_eq!(layout.header_area.height, 1);
        assert_eq!(layout.status_area.y, 28);
    }

    #[test]
    fn hidden_reminders_give_main_the_full_width() {
        let layout = Layout::calculate(Rect::new(0, 0, 102, 30), 30, false);
        assert_eq!(layout.reminder_area.width, 0);
        assert_eq!(layout.main_area.width, 100);
    }

    #[test]
    fn undersized_terminal_is_padded_to_minimum() {
        let layout = Layout::calculate(Rect::new(0, 0, 10, 5), 30, true);
        assert_eq!(layout.inner_area.width, Layout::MIN_WIDTH);
        assert_eq!(layout.inner_area.height, Layout::MIN_HEIGHT);
        assert!(layout.main_area.width >= 34);
    }
}

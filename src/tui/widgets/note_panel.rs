use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::Config;
use crate::dates::format_long;
use crate::tui::app::NotePanel;
use crate::tui::widgets::color::parse_color;

pub const PLACEHOLDER: &str = "Write your notes here...";

/// Draw the note panel. Returns the inner text area for cursor placement.
pub fn render_note_panel(f: &mut Frame, area: Rect, panel: &mut NotePanel, editing: bool, config: &Config) -> Rect {
    let theme = config.get_active_theme();
    let fg = parse_color(&theme.fg);
    let bg = parse_color(&theme.bg);
    let accent = parse_color(&theme.accent);

    let mut title = format!("Notes for {}", format_long(panel.date));
    if panel.saving {
        title.push_str(" (Saving...)");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(if editing { Style::default().fg(accent) } else { Style::default().fg(fg) })
        .style(Style::default().fg(fg).bg(bg));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut text_area = inner;
    if let Some(error) = &panel.load_error {
        f.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(ratatui::style::Color::Red)),
            Rect::new(inner.x, inner.y, inner.width, 1.min(inner.height)),
        );
        text_area = Rect::new(inner.x, inner.y + 1, inner.width, inner.height.saturating_sub(1));
    }

    let (height, width) = (text_area.height as usize, text_area.width as usize);
    panel.editor.update_scroll(height, width);
    let lines: Vec<Line> = if panel.editor.is_blank() && !editing {
        vec![Line::styled(PLACEHOLDER, Style::default().fg(fg).add_modifier(Modifier::DIM))]
    } else {
        panel
            .editor
            .visible_lines(height, width)
            .into_iter()
            .map(Line::from)
            .collect()
    };
    f.render_widget(Paragraph::new(lines).style(Style::default().fg(fg).bg(bg)), text_area);
    text_area
}

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::fixed_popup_area;

/// Blocking message box, dismissed with Enter or Esc
pub fn render_alert(f: &mut Frame, area: Rect, message: &str, config: &Config) {
    let theme = config.get_active_theme();
    let base = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));
    let width = (message.chars().count() as u16 + 6).max(30);
    let popup = fixed_popup_area(area, width, 6);
    f.render_widget(Clear, popup);

    let lines = vec![
        Line::styled(message, base.add_modifier(Modifier::BOLD)),
        Line::default(),
        Line::styled("[ OK ]", Style::default().fg(parse_color(&theme.highlight_fg)).bg(parse_color(&theme.highlight_bg))),
    ];
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .title_alignment(Alignment::Center)
                .border_style(Style::default().fg(Color::Red))
                .style(base),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup);
}

/// Route prompt. Returns the cursor position.
pub fn render_goto_prompt(f: &mut Frame, area: Rect, editor: &mut Editor, config: &Config) -> Option<(u16, u16)> {
    let theme = config.get_active_theme();
    let base = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));
    let popup = fixed_popup_area(area, 40, 3);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Go to (/ or /YYYY-MM-DD)")
        .style(base);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let (height, width) = (inner.height as usize, inner.width as usize);
    editor.update_scroll(height, width);
    let text = editor.visible_lines(1, width).into_iter().next().unwrap_or_default();
    f.render_widget(Paragraph::new(text).style(base), inner);
    editor.cursor_screen_pos(inner)
}

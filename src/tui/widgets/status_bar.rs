use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::Config;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

fn truncate(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Join as many hints as fit in `max_width`, ending with an ellipsis when some are left out
pub fn fit_hints(hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in hints.iter().enumerate() {
        let current = text.chars().count();
        let needed = if i == 0 { hint.chars().count() } else { current + SEPARATOR.chars().count() + hint.chars().count() };
        if needed > max_width {
            if i == 0 {
                return truncate(hint, max_width);
            }
            if current + ELLIPSIS.len() <= max_width {
                text.push_str(ELLIPSIS);
                return text;
            }
            return truncate(&text, max_width);
        }
        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}

pub fn render_status_bar(f: &mut Frame, area: Rect, message: Option<&str>, key_hints: &[String], config: &Config) {
    let theme = config.get_active_theme();
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(msg) => {
            let highlight_bg = parse_color(&theme.highlight_bg);
            (
                truncate(msg, max_width),
                Style::default()
                    .fg(get_contrast_text_color(highlight_bg))
                    .bg(highlight_bg)
                    .add_modifier(Modifier::BOLD),
            )
        }
        None => (
            fit_hints(key_hints, max_width),
            Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg)),
        ),
    };
    f.render_widget(Paragraph::new(content).style(style), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints() -> Vec<String> {
        vec!["q: Quit".into(), "F1: Help".into(), "e: Edit".into()]
    }

    #[test]
    fn all_hints_fit() {
        assert_eq!(fit_hints(&hints(), 80), "q: Quit • F1: Help • e: Edit");
    }

    #[test]
    fn overflow_ends_with_ellipsis() {
        assert_eq!(fit_hints(&hints(), 21), "q: Quit • F1: Help...");
        assert_eq!(fit_hints(&hints(), 4), "q...");
    }

    #[test]
    fn long_message_is_truncated() {
        assert_eq!(truncate("Connected to the store", 10), "Connect...");
    }
}

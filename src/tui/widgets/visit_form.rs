use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::Config;
use crate::dates::format_long;
use crate::tui::app::{FormState, FormStatus};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::popup_area;
use crate::visit_form::FormField;

const CUSTOMER_LABEL: &str = "Customer: ";

fn indent(field: FormField) -> usize {
    match field {
        FormField::SalesOption(_) => 2,
        FormField::SampleType(_) => 4,
        FormField::Remark(_) => 6,
        _ => 0,
    }
}

fn remark_label(field: FormField) -> Option<String> {
    match field {
        FormField::Remark(key) => Some(format!("{}Remarks ({}): ", " ".repeat(indent(field)), key)),
        _ => None,
    }
}

fn checkbox(checked: bool, label: &str, field: FormField) -> String {
    format!("{}[{}] {}", " ".repeat(indent(field)), if checked { "x" } else { " " }, label)
}

/// Single-line editor text fitted after a label of `label_width` columns
fn input_text(editor: &mut Editor, label_width: u16, width: u16, focused: bool) -> String {
    let avail = width.saturating_sub(label_width).max(1) as usize;
    if focused {
        editor.update_scroll(1, avail);
    }
    editor.visible_lines(1, avail).into_iter().next().unwrap_or_default()
}

/// Draw the "Add New Customer" popup. Returns the cursor position when a
/// text field has focus.
pub fn render_visit_form(
    f: &mut Frame,
    area: Rect,
    state: &mut FormState,
    customers: &[String],
    config: &Config,
) -> Option<(u16, u16)> {
    let theme = config.get_active_theme();
    let base = Style::default().fg(parse_color(&theme.fg)).bg(parse_color(&theme.bg));
    let highlight = Style::default()
        .fg(parse_color(&theme.highlight_fg))
        .bg(parse_color(&theme.highlight_bg));
    let accent = Style::default().fg(parse_color(&theme.accent));

    let popup = popup_area(area, 70, 85);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Add New Customer - {}", format_long(state.form.date())))
        .title_alignment(Alignment::Center)
        .style(base);
    let inner = block.inner(popup);
    f.render_widget(block, popup);
    if inner.width < 4 || inner.height < 2 {
        return None;
    }

    let focused = state.focused_field();
    let editing = state.status == FormStatus::Editing;
    let mut lines: Vec<Line> = Vec::new();
    let mut focus_line = 0usize;
    // Label width of the focused text field, for cursor placement
    let mut cursor_label: Option<u16> = None;

    for field in state.form.visible_fields() {
        let is_focused = editing && field == focused;
        if is_focused {
            focus_line = lines.len();
        }
        let style = if is_focused { highlight } else { base };
        match field {
            FormField::Customer => {
                let label_width = CUSTOMER_LABEL.len() as u16;
                let text = input_text(&mut state.customer, label_width, inner.width, is_focused);
                lines.push(Line::from(vec![
                    Span::styled(CUSTOMER_LABEL, style.add_modifier(Modifier::BOLD)),
                    Span::styled(text, base),
                ]));
                if is_focused {
                    cursor_label = Some(label_width);
                    for (i, name) in state.visible_suggestions(customers) {
                        let selected = state.suggestion_index == Some(i);
                        lines.push(Line::styled(
                            format!("  {} {}", if selected { ">" } else { " " }, name),
                            if selected { highlight } else { accent },
                        ));
                    }
                }
            }
            FormField::Purpose(purpose) => {
                lines.push(Line::styled(checkbox(state.form.has_purpose(purpose), purpose.label(), field), style));
            }
            FormField::SalesOption(option) => {
                lines.push(Line::styled(
                    checkbox(state.form.has_sales_option(option), option.label(), field),
                    style,
                ));
            }
            FormField::SampleType(sample) => {
                lines.push(Line::styled(
                    checkbox(state.form.has_sample_type(sample), sample.label(), field),
                    style,
                ));
            }
            FormField::Buyer => {
                let buyer = state.form.buyer.as_deref().unwrap_or("Select buyer");
                lines.push(Line::styled(format!("Buyer: < {} >", buyer), style));
            }
            FormField::Remark(key) => {
                let label = remark_label(field).unwrap_or_default();
                let label_width = label.chars().count() as u16;
                let text = match state.remarks.get_mut(&key) {
                    Some(editor) => input_text(editor, label_width, inner.width, is_focused),
                    None => String::new(),
                };
                lines.push(Line::from(vec![Span::styled(label, style), Span::styled(text, base)]));
                if is_focused {
                    cursor_label = Some(label_width);
                }
            }
            FormField::Submit => {
                lines.push(Line::default());
                if is_focused {
                    focus_line = lines.len();
                }
                let label = match state.status {
                    FormStatus::Editing => "[ Add Customer ]",
                    FormStatus::Submitting => "[ Submitting... ]",
                    FormStatus::Saved { .. } => "Customer added successfully!",
                };
                lines.push(Line::styled(label, style.add_modifier(Modifier::BOLD)));
            }
        }
    }

    let height = inner.height as usize;
    let offset = focus_line.saturating_sub(height.saturating_sub(1));
    let visible: Vec<Line> = lines.into_iter().skip(offset).take(height).collect();
    f.render_widget(Paragraph::new(visible).style(base), inner);

    let label_width = cursor_label?;
    let row = inner.y + (focus_line - offset) as u16;
    let field_area = Rect::new(inner.x + label_width, row, inner.width.saturating_sub(label_width), 1);
    let editor = match focused {
        FormField::Customer => &state.customer,
        FormField::Remark(key) => match state.remarks.get(&key) {
            Some(editor) => editor,
            None => return Some((field_area.x, row)),
        },
        _ => return None,
    };
    editor.cursor_screen_pos(field_area)
}

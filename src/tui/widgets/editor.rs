use ratatui::layout::Rect;

const MAX_HISTORY: usize = 100;

/// (line, column) with the column counted in chars
pub type Position = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    lines: Vec<String>,
    cursor: Position,
}

/// Text buffer behind every input box: the note panel (multi-line) and the
/// form's customer and remark fields (single-line).
#[derive(Debug, Clone)]
pub struct Editor {
    lines: Vec<String>,
    cursor: Position,
    anchor: Option<Position>,
    scroll_line: usize,
    scroll_col: usize,
    history: Vec<Snapshot>,
    single_line: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: (0, 0),
            anchor: None,
            scroll_line: 0,
            scroll_col: 0,
            history: Vec::new(),
            single_line: false,
        }
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single_line() -> Self {
        Self {
            single_line: true,
            ..Self::default()
        }
    }

    /// Editor holding `text`, cursor at the end
    pub fn from_text(text: &str) -> Self {
        let mut editor = Self::new();
        editor.replace_all(text);
        editor
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    /// Replace the content without recording undo history
    pub fn replace_all(&mut self, text: &str) {
        self.lines = if self.single_line {
            vec![text.replace('\n', " ")]
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        let last = self.lines.len() - 1;
        self.cursor = (last, char_len(&self.lines[last]));
        self.anchor = None;
        self.scroll_line = 0;
        self.scroll_col = 0;
        self.history.clear();
    }

    fn remember(&mut self) {
        if self.history.len() == MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(Snapshot {
            lines: self.lines.clone(),
            cursor: self.cursor,
        });
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.pop() else {
            return false;
        };
        self.lines = snapshot.lines;
        self.cursor = snapshot.cursor;
        self.anchor = None;
        true
    }

    pub fn insert_char(&mut self, ch: char) {
        self.remember();
        self.remove_selection();
        let (line, col) = self.cursor;
        let at = byte_index(&self.lines[line], col);
        self.lines[line].insert(at, ch);
        self.cursor.1 += 1;
    }

    pub fn insert_newline(&mut self) {
        if self.single_line {
            return;
        }
        self.remember();
        self.remove_selection();
        let (line, col) = self.cursor;
        let at = byte_index(&self.lines[line], col);
        let rest = self.lines[line].split_off(at);
        self.lines.insert(line + 1, rest);
        self.cursor = (line + 1, 0);
    }

    /// Backspace
    pub fn delete_back(&mut self) {
        if self.anchor.is_some_and(|a| a != self.cursor) {
            self.remember();
            self.remove_selection();
            return;
        }
        self.anchor = None;
        let (line, col) = self.cursor;
        if col > 0 {
            self.remember();
            let at = byte_index(&self.lines[line], col - 1);
            self.lines[line].remove(at);
            self.cursor.1 -= 1;
        } else if line > 0 {
            self.remember();
            let current = self.lines.remove(line);
            let prev_len = char_len(&self.lines[line - 1]);
            self.lines[line - 1].push_str(&current);
            self.cursor = (line - 1, prev_len);
        }
    }

    /// Delete key
    pub fn delete_forward(&mut self) {
        if self.anchor.is_some_and(|a| a != self.cursor) {
            self.remember();
            self.remove_selection();
            return;
        }
        self.anchor = None;
        let (line, col) = self.cursor;
        if col < char_len(&self.lines[line]) {
            self.remember();
            let at = byte_index(&self.lines[line], col);
            self.lines[line].remove(at);
        } else if line + 1 < self.lines.len() {
            self.remember();
            let next = self.lines.remove(line + 1);
            self.lines[line].push_str(&next);
        }
    }

    fn move_to(&mut self, target: Position, extend: bool) {
        if extend {
            self.anchor.get_or_insert(self.cursor);
        } else {
            self.anchor = None;
        }
        self.cursor = target;
    }

    pub fn move_left(&mut self, extend: bool) {
        let (line, col) = self.cursor;
        let target = match (line, col) {
            (_, c) if c > 0 => (line, c - 1),
            (l, _) if l > 0 => (l - 1, char_len(&self.lines[l - 1])),
            _ => (line, col),
        };
        self.move_to(target, extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        let (line, col) = self.cursor;
        let target = if col < char_len(&self.lines[line]) {
            (line, col + 1)
        } else if line + 1 < self.lines.len() {
            (line + 1, 0)
        } else {
            (line, col)
        };
        self.move_to(target, extend);
    }

    pub fn move_up(&mut self, extend: bool) {
        let (line, col) = self.cursor;
        let target = match line {
            0 => (0, 0),
            l => (l - 1, col.min(char_len(&self.lines[l - 1]))),
        };
        self.move_to(target, extend);
    }

    pub fn move_down(&mut self, extend: bool) {
        let (line, col) = self.cursor;
        let last = self.lines.len() - 1;
        let target = if line < last {
            (line + 1, col.min(char_len(&self.lines[line + 1])))
        } else {
            (last, char_len(&self.lines[last]))
        };
        self.move_to(target, extend);
    }

    pub fn move_home(&mut self, extend: bool) {
        self.move_to((self.cursor.0, 0), extend);
    }

    pub fn move_end(&mut self, extend: bool) {
        let line = self.cursor.0;
        self.move_to((line, char_len(&self.lines[line])), extend);
    }

    pub fn move_word_left(&mut self, extend: bool) {
        let (line, col) = self.cursor;
        if col == 0 {
            self.move_left(extend);
            return;
        }
        let chars: Vec<char> = self.lines[line].chars().collect();
        let mut c = col;
        while c > 0 && chars[c - 1].is_whitespace() {
            c -= 1;
        }
        while c > 0 && !chars[c - 1].is_whitespace() {
            c -= 1;
        }
        self.move_to((line, c), extend);
    }

    pub fn move_word_right(&mut self, extend: bool) {
        let (line, col) = self.cursor;
        let chars: Vec<char> = self.lines[line].chars().collect();
        if col >= chars.len() {
            self.move_right(extend);
            return;
        }
        let mut c = col;
        while c < chars.len() && !chars[c].is_whitespace() {
            c += 1;
        }
        while c < chars.len() && chars[c].is_whitespace() {
            c += 1;
        }
        self.move_to((line, c), extend);
    }

    pub fn select_all(&mut self) {
        let last = self.lines.len() - 1;
        self.anchor = Some((0, 0));
        self.cursor = (last, char_len(&self.lines[last]));
    }

    /// Ordered (start, end) of the selection, if any
    pub fn selection(&self) -> Option<(Position, Position)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some(if anchor < self.cursor {
            (anchor, self.cursor)
        } else {
            (self.cursor, anchor)
        })
    }

    pub fn selected_text(&self) -> Option<String> {
        let ((sl, sc), (el, ec)) = self.selection()?;
        if sl == el {
            return Some(char_slice(&self.lines[sl], sc, ec).to_string());
        }
        let mut parts = vec![char_slice(&self.lines[sl], sc, usize::MAX).to_string()];
        parts.extend(self.lines[sl + 1..el].iter().cloned());
        parts.push(char_slice(&self.lines[el], 0, ec).to_string());
        Some(parts.join("\n"))
    }

    /// Remove the selected text, recording undo history
    pub fn cut_selection(&mut self) -> Option<String> {
        let text = self.selected_text()?;
        self.remember();
        self.remove_selection();
        Some(text)
    }

    fn remove_selection(&mut self) {
        let Some(((sl, sc), (el, ec))) = self.selection() else {
            self.anchor = None;
            return;
        };
        let tail = char_slice(&self.lines[el], ec, usize::MAX).to_string();
        let head = char_slice(&self.lines[sl], 0, sc).to_string();
        self.lines.drain(sl + 1..=el);
        self.lines[sl] = head + &tail;
        self.cursor = (sl, sc);
        self.anchor = None;
    }

    /// Keep the cursor inside a `height` x `width` viewport
    pub fn update_scroll(&mut self, height: usize, width: usize) {
        let (line, col) = self.cursor;
        let height = height.max(1);
        let width = width.max(1);
        if line < self.scroll_line {
            self.scroll_line = line;
        } else if line >= self.scroll_line + height {
            self.scroll_line = line + 1 - height;
        }
        if col < self.scroll_col {
            self.scroll_col = col;
        } else if col >= self.scroll_col + width {
            self.scroll_col = col + 1 - width;
        }
    }

    /// Lines inside the viewport, horizontally shifted by the scroll offset
    pub fn visible_lines(&self, height: usize, width: usize) -> Vec<String> {
        self.lines
            .iter()
            .skip(self.scroll_line)
            .take(height)
            .map(|l| l.chars().skip(self.scroll_col).take(width).collect())
            .collect()
    }

    /// Terminal position of the cursor when the buffer is drawn into `area`
    pub fn cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let (line, col) = self.cursor;
        let row = line.checked_sub(self.scroll_line)?;
        let column = col.checked_sub(self.scroll_col)?;
        if row >= area.height as usize || column >= area.width as usize {
            return None;
        }
        Some((area.x + column as u16, area.y + row as u16))
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_index(s: &str, col: usize) -> usize {
    s.char_indices().nth(col).map(|(i, _)| i).unwrap_or(s.len())
}

fn char_slice(s: &str, from: usize, to: usize) -> &str {
    let start = byte_index(s, from);
    let end = if to == usize::MAX { s.len() } else { byte_index(s, to) };
    &s[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> Editor {
        let mut editor = Editor::new();
        for ch in text.chars() {
            if ch == '\n' {
                editor.insert_newline();
            } else {
                editor.insert_char(ch);
            }
        }
        editor
    }

    #[test]
    fn typing_and_backspace_across_lines() {
        let mut editor = typed("Visit ACME\nat 10am");
        assert_eq!(editor.text(), "Visit ACME\nat 10am");
        editor.move_home(false);
        editor.delete_back();
        assert_eq!(editor.text(), "Visit ACMEat 10am");
        assert_eq!(editor.cursor(), (0, 10));
    }

    #[test]
    fn multibyte_characters_are_counted_as_chars() {
        let mut editor = typed("café");
        editor.move_left(false);
        editor.insert_char('!');
        assert_eq!(editor.text(), "caf!é");
    }

    #[test]
    fn selection_replace_and_undo() {
        let mut editor = typed("hello world");
        editor.move_word_left(false);
        editor.move_end(true);
        assert_eq!(editor.selected_text().as_deref(), Some("world"));
        editor.insert_char('X');
        assert_eq!(editor.text(), "hello X");
        assert!(editor.undo());
        assert_eq!(editor.text(), "hello world");
    }

    #[test]
    fn cut_spanning_lines() {
        let mut editor = typed("one\ntwo\nthree");
        editor.move_to((0, 1), false);
        editor.move_to((2, 5), true);
        assert_eq!(editor.cut_selection().as_deref(), Some("ne\ntwo\nthree"));
        assert_eq!(editor.text(), "o");
        assert!(editor.undo());
        assert_eq!(editor.lines().len(), 3);
    }

    #[test]
    fn single_line_ignores_newlines() {
        let mut editor = Editor::single_line();
        editor.insert_char('a');
        editor.insert_newline();
        editor.insert_char('b');
        assert_eq!(editor.text(), "ab");
    }

    #[test]
    fn scroll_follows_cursor() {
        let mut editor = typed("1\n2\n3\n4\n5");
        editor.update_scroll(2, 10);
        assert_eq!(editor.visible_lines(2, 10), vec!["4", "5"]);
        let area = Rect::new(3, 7, 10, 2);
        assert_eq!(editor.cursor_screen_pos(area), Some((4, 8)));
    }
}

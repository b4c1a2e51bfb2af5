//! In-place text editing for editable panels.
//!
//! Keys that no binding claimed reach the focused panel; when it is
//! editable they insert, delete, and move the cursor through the logical
//! text while the cursor itself stays in view coordinates.

use super::panel::Panel;
use crate::actor::{Key, KeyCode};
use crate::buffer::Cell;
use unicode_segmentation::UnicodeSegmentation;

impl Panel {
    /// Apply an editing key. Returns `true` if the key was consumed.
    pub fn edit(&mut self, key: Key) -> bool {
        if let Some(c) = key.printable() {
            self.insert_char(c);
            return true;
        }
        if key.modifiers.control || key.modifiers.alt {
            return false;
        }

        match key.code {
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Home => {
                let row = self.cursor_row();
                self.set_position(0, row);
            }
            KeyCode::End => {
                let (line, _) = self.logical_position();
                let len = self.line_cells(line).map_or(0, <[Cell]>::len);
                self.locate(line, len);
            }
            _ => return false,
        }
        true
    }

    /// Insert text at the cursor; newlines split the line.
    pub fn insert_str(&mut self, text: &str) {
        for grapheme in text.graphemes(true) {
            match grapheme {
                "\n" | "\r\n" => self.insert_newline(),
                "\r" => {}
                grapheme => self.insert_grapheme(grapheme),
            }
        }
    }

    /// Insert a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        self.insert_grapheme(c.encode_utf8(&mut [0; 4]));
    }

    /// Insert a grapheme cluster at the cursor.
    ///
    /// Text that extends the cluster before the cursor (a combining mark,
    /// a ZWJ or the emoji after it) joins that cell instead of starting one.
    fn insert_grapheme(&mut self, grapheme: &str) {
        let (line, index) = self.logical_position();
        let lines = self.lines_mut();
        if lines.is_empty() {
            lines.push(Vec::new());
        }
        let cells = &mut lines[line];
        let index = index.min(cells.len());

        if let Some(prev) = index.checked_sub(1).map(|i| cells[i]) {
            let joined = format!("{}{grapheme}", prev.symbol());
            if joined.graphemes(true).nth(1).is_none() {
                cells[index - 1] = Cell::from_grapheme(&joined).with_style(prev.style());
                self.locate(line, index);
                return;
            }
        }
        cells.insert(index, Cell::from_grapheme(grapheme));
        self.locate(line, index + 1);
    }

    /// Split the current line at the cursor.
    fn insert_newline(&mut self) {
        let (line, index) = self.logical_position();
        let lines = self.lines_mut();
        if lines.is_empty() {
            lines.push(Vec::new());
        }
        let at = index.min(lines[line].len());
        let tail = lines[line].split_off(at);
        lines.insert(line + 1, tail);
        self.locate(line + 1, 0);
    }

    /// Delete the character before the cursor, joining lines at column 0.
    fn backspace(&mut self) {
        let (line, index) = self.logical_position();
        let lines = self.lines_mut();
        if lines.is_empty() {
            return;
        }
        if index > 0 {
            lines[line].remove(index - 1);
            self.locate(line, index - 1);
        } else if line > 0 {
            let tail = lines.remove(line);
            let joint = lines[line - 1].len();
            lines[line - 1].extend(tail);
            self.locate(line - 1, joint);
        }
    }

    /// Delete the character under the cursor, joining the next line at the end.
    fn delete(&mut self) {
        let (line, index) = self.logical_position();
        let lines = self.lines_mut();
        if lines.is_empty() {
            return;
        }
        if index < lines[line].len() {
            lines[line].remove(index);
        } else if line + 1 < lines.len() {
            let next = lines.remove(line + 1);
            lines[line].extend(next);
        }
        self.locate(line, index);
    }
}

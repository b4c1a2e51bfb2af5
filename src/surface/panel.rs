//! Panel: a rectangular region with a text buffer, cursor and scroll origin.
//!
//! Text is stored as logical lines of styled cells. When `wrap` is on, each
//! logical line is split into *view lines* no wider than the inner width;
//! the cursor and the origin are expressed in view coordinates, exactly as
//! they appear on screen.
//!
//! ```text
//!   origin.1 ──▶ ┌──────────────┐
//!                │ view line 4  │ ◀── cursor.1 = 0
//!                │ view line 5  │
//!                │ view line 6  │ ◀── cursor.1 = 2, cursor_row() = 6
//!                └──────────────┘
//! ```

use crate::buffer::{Buffer, Cell, Color, Modifiers, Style};
use crate::layout::Rect;
use crate::text::{cells_to_string, cells_width, decode_line};

/// A slice of one logical line as shown on one screen row.
#[derive(Debug, Clone, Copy)]
pub struct ViewLine<'a> {
    /// Index of the logical line.
    pub line: usize,
    /// Cell offset of this slice within the logical line.
    pub start: usize,
    /// The cells on this row.
    pub cells: &'a [Cell],
}

/// A rectangular text region managed by a [`Surface`](super::Surface).
#[derive(Debug, Clone)]
pub struct Panel {
    rect: Rect,
    /// Title drawn on the top border (framed panels only).
    pub title: String,
    /// Draw a border; content sits inside it.
    pub frame: bool,
    /// Soft-wrap long lines at the inner width.
    pub wrap: bool,
    /// Unbound printable keys edit the text.
    pub editable: bool,
    /// Paint the cursor row with `selected_style`.
    pub highlight: bool,
    /// Do not show the terminal cursor even when editable and focused.
    pub hide_cursor: bool,
    /// Display every character as this one.
    pub mask: Option<char>,
    /// Base style of the panel.
    pub style: Style,
    /// Style of the highlighted row.
    pub selected_style: Style,
    lines: Vec<Vec<Cell>>,
    cursor: (u16, u16),
    origin: (u16, u16),
}

impl Panel {
    pub(crate) fn new(rect: Rect) -> Self {
        Self {
            rect,
            title: String::new(),
            frame: false,
            wrap: false,
            editable: false,
            highlight: false,
            hide_cursor: false,
            mask: None,
            style: Style::DEFAULT,
            selected_style: Style::new().add(Modifiers::REVERSED),
            lines: Vec::new(),
            cursor: (0, 0),
            origin: (0, 0),
        }
    }

    /// Outer rectangle, border included.
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    pub(crate) const fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// Content rectangle, inside the border when framed.
    pub const fn inner(&self) -> Rect {
        if self.frame {
            self.rect.shrink(1)
        } else {
            self.rect
        }
    }

    /// Inner width and height.
    pub const fn size(&self) -> (u16, u16) {
        let inner = self.inner();
        (inner.width, inner.height)
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Append text at the end of the buffer.
    ///
    /// The first segment continues the last line; each `\n` starts a new one.
    /// SGR escape sequences become cell styles.
    pub fn write(&mut self, text: &str) {
        let mut segments = text.split('\n');
        if let Some(first) = segments.next() {
            let cells = decode_line(first);
            match self.lines.last_mut() {
                Some(last) => last.extend(cells),
                None => self.lines.push(cells),
            }
        }
        for segment in segments {
            self.lines.push(decode_line(segment));
        }
    }

    /// Append text followed by a newline.
    pub fn writeln(&mut self, text: &str) {
        self.write(text);
        self.write("\n");
    }

    /// Replace the whole buffer.
    pub fn set_text(&mut self, text: &str) {
        self.clear();
        self.write(text);
    }

    /// Remove all text. Cursor and origin are left alone.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Plain text of the buffer, one `\n` after each line.
    pub fn buffer(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&cells_to_string(line));
            out.push('\n');
        }
        out
    }

    /// Plain text of each logical line.
    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().map(|line| cells_to_string(line)).collect()
    }

    /// Number of logical lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Styled cells of one logical line.
    pub fn line_cells(&self, index: usize) -> Option<&[Cell]> {
        self.lines.get(index).map(Vec::as_slice)
    }

    /// Logical lines split into screen rows.
    ///
    /// Editable panels wrap one column early so the cursor can sit after the
    /// last character of a full row.
    pub fn view_lines(&self) -> Vec<ViewLine<'_>> {
        let mut width = usize::from(self.size().0);
        if self.editable && width > 1 {
            width -= 1;
        }
        let mut out = Vec::with_capacity(self.lines.len());

        for (line, cells) in self.lines.iter().enumerate() {
            if !self.wrap || width == 0 || cells_width(cells) <= width {
                out.push(ViewLine { line, start: 0, cells });
                continue;
            }
            let mut start = 0;
            let mut used = 0;
            for (idx, cell) in cells.iter().enumerate() {
                let w = usize::from(cell.width());
                if used + w > width && idx > start {
                    out.push(ViewLine { line, start, cells: &cells[start..idx] });
                    start = idx;
                    used = 0;
                }
                used += w;
            }
            out.push(ViewLine { line, start, cells: &cells[start..] });
        }
        out
    }

    /// Number of screen rows the content needs.
    pub fn view_line_count(&self) -> usize {
        self.view_lines().len()
    }

    // ------------------------------------------------------------------
    // Cursor & origin
    // ------------------------------------------------------------------

    /// Cursor position relative to the inner top-left corner.
    pub const fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    /// First visible column and view row.
    pub const fn origin(&self) -> (u16, u16) {
        self.origin
    }

    /// Set the cursor relative to the inner area, clamped to it.
    pub fn set_cursor(&mut self, x: u16, y: u16) {
        let (w, h) = self.size();
        self.cursor = (x.min(w.saturating_sub(1)), y.min(h.saturating_sub(1)));
    }

    /// Set the scroll origin.
    pub const fn set_origin(&mut self, x: u16, y: u16) {
        self.origin = (x, y);
    }

    /// Absolute view row under the cursor.
    pub fn cursor_row(&self) -> usize {
        usize::from(self.origin.1) + usize::from(self.cursor.1)
    }

    /// Absolute column under the cursor.
    pub fn cursor_col(&self) -> usize {
        usize::from(self.origin.0) + usize::from(self.cursor.0)
    }

    /// Largest origin row that still fills the viewport.
    pub fn max_origin_row(&self) -> usize {
        self.view_line_count()
            .saturating_sub(usize::from(self.size().1))
    }

    /// Put the cursor on an absolute (column, view row), scrolling the
    /// origin the least amount that keeps it visible.
    pub fn set_position(&mut self, col: usize, row: usize) {
        let (w, h) = self.size();
        let (w, h) = (usize::from(w.max(1)), usize::from(h.max(1)));

        let mut ox = usize::from(self.origin.0);
        let mut oy = usize::from(self.origin.1);
        if row < oy {
            oy = row;
        } else if row >= oy + h {
            oy = row + 1 - h;
        }
        if col < ox {
            ox = col;
        } else if col >= ox + w {
            ox = col + 1 - w;
        }

        self.origin = (clamp_u16(ox), clamp_u16(oy));
        self.cursor = (clamp_u16(col - ox), clamp_u16(row - oy));
    }

    /// Move the cursor by a delta, clamped to the content.
    ///
    /// Rows stay within the view lines; columns within the target row
    /// (one past its end is allowed, for appending).
    pub fn move_cursor(&mut self, dx: isize, dy: isize) {
        let rows = self.view_lines();
        if rows.is_empty() {
            self.origin = (0, 0);
            self.cursor = (0, 0);
            return;
        }
        let row = self
            .cursor_row()
            .saturating_add_signed(dy)
            .min(rows.len() - 1);
        let col = self
            .cursor_col()
            .saturating_add_signed(dx)
            .min(rows[row].cells.len());
        self.set_position(col, row);
    }

    /// Logical (line, cell index) under the cursor.
    pub(crate) fn logical_position(&self) -> (usize, usize) {
        let rows = self.view_lines();
        let Some(last) = rows.len().checked_sub(1) else {
            return (0, 0);
        };
        let row = rows[self.cursor_row().min(last)];
        (row.line, row.start + self.cursor_col().min(row.cells.len()))
    }

    /// Move the cursor onto a logical (line, cell index).
    pub(crate) fn locate(&mut self, line: usize, index: usize) {
        let rows = self.view_lines();
        let mut target = (0, 0);
        for (row, view) in rows.iter().enumerate() {
            if view.line != line || index < view.start {
                continue;
            }
            target = (index - view.start, row);
            if index < view.start + view.cells.len() {
                break;
            }
        }
        self.set_position(target.0, target.1);
    }

    pub(crate) fn lines_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.lines
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Draw the panel into a screen buffer.
    pub fn render(&self, buffer: &mut Buffer, focused: bool) {
        buffer.fill_rect(self.rect, Cell::EMPTY.with_style(self.style));
        if self.frame {
            self.render_frame(buffer, focused);
        }

        let inner = self.inner();
        if inner.is_empty() {
            return;
        }
        let rows = self.view_lines();
        let skip = usize::from(self.origin.0);

        for r in 0..inner.height {
            let y = inner.y + r;
            let highlighted = self.highlight && r == self.cursor.1;
            let row_style = if highlighted {
                self.selected_style.over(self.style)
            } else {
                self.style
            };
            if highlighted {
                buffer.fill_rect(Rect::new(inner.x, y, inner.width, 1), Cell::EMPTY.with_style(row_style));
            }

            let Some(view) = rows.get(usize::from(self.origin.1) + usize::from(r)) else {
                continue;
            };
            let mut x = inner.x;
            for cell in view.cells.iter().skip(skip) {
                let mut cell = cell.with_style(cell.style().over(row_style));
                if let Some(mask) = self.mask {
                    cell = cell.with_symbol(mask);
                }
                let w = u16::from(cell.width());
                if x + w > inner.right() {
                    break;
                }
                buffer.set(x, y, cell);
                x += w;
            }
        }
    }

    fn render_frame(&self, buffer: &mut Buffer, focused: bool) {
        let Rect { x, y, width, height } = self.rect;
        if width < 2 || height < 2 {
            return;
        }
        let mut style = self.style;
        if focused {
            style = style.fg(Color::GREEN);
        }
        let border = |c: char| Cell::new(c).with_style(style);

        let (right, bottom) = (x + width - 1, y + height - 1);
        for col in x + 1..right {
            buffer.set(col, y, border('─'));
            buffer.set(col, bottom, border('─'));
        }
        for row in y + 1..bottom {
            buffer.set(x, row, border('│'));
            buffer.set(right, row, border('│'));
        }
        buffer.set(x, y, border('┌'));
        buffer.set(right, y, border('┐'));
        buffer.set(x, bottom, border('└'));
        buffer.set(right, bottom, border('┘'));

        if !self.title.is_empty() && width > 2 {
            buffer.put_str(x + 1, y, &self.title, style, width - 2);
        }
    }

    /// Screen position of the terminal cursor when this panel has focus.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        if !self.editable || self.hide_cursor {
            return None;
        }
        let inner = self.inner();
        if inner.is_empty() {
            return None;
        }
        Some((inner.x + self.cursor.0, inner.y + self.cursor.1))
    }
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

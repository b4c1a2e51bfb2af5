//! Cursor and page navigation for scrollable panels.
//!
//! Each function has the shape `fn(&mut Panel)` so it can be bound to a key
//! directly. Rows are view rows: a wrapped logical line counts once per
//! screen row.

use crate::surface::Panel;

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// One row up.
pub fn cursor_up(panel: &mut Panel) {
    panel.move_cursor(0, -1);
}

/// One row down.
pub fn cursor_down(panel: &mut Panel) {
    panel.move_cursor(0, 1);
}

/// One column left.
pub fn cursor_left(panel: &mut Panel) {
    panel.move_cursor(-1, 0);
}

/// One column right.
pub fn cursor_right(panel: &mut Panel) {
    panel.move_cursor(1, 0);
}

/// Scroll forward one viewport and put the cursor on the last visible row.
///
/// The origin never passes the last full page.
pub fn page_down(panel: &mut Panel) {
    let height = usize::from(panel.size().1);
    let rows = panel.view_line_count();
    if height <= 1 || rows == 0 {
        return;
    }
    let (ox, oy) = panel.origin();
    let oy = (usize::from(oy) + height).min(panel.max_origin_row());
    let row = (oy + height - 1).min(rows - 1);
    panel.set_origin(ox, clamp_u16(oy));
    panel.set_cursor(panel.cursor().0, clamp_u16(row - oy));
}

/// Scroll back one viewport and put the cursor on the first visible row.
pub fn page_up(panel: &mut Panel) {
    let height = panel.size().1;
    if height <= 1 {
        return;
    }
    let (ox, oy) = panel.origin();
    panel.set_origin(ox, oy.saturating_sub(height));
    panel.set_cursor(panel.cursor().0, 0);
}

/// Cursor and origin to the top-left corner.
pub fn home(panel: &mut Panel) {
    panel.set_origin(0, 0);
    panel.set_cursor(0, 0);
}

/// Last full page, cursor on the last character of the last row.
pub fn end(panel: &mut Panel) {
    let rows = panel.view_lines();
    let Some(last) = rows.last() else {
        return home(panel);
    };
    let (last_row, col) = (rows.len() - 1, last.cells.len().saturating_sub(1));
    panel.set_origin(0, clamp_u16(panel.max_origin_row()));
    panel.set_position(col, last_row);
}

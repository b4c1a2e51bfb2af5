//! Diffing Engine: Generate minimal ANSI sequences from buffer changes.
//!
//! This module implements the anti-flicker logic:
//! 1. Compare Current and Next buffers
//! 2. Generate escape sequences only for changed cells
//! 3. Skip cursor movements when writing adjacent cells
//! 4. Track the active style to avoid redundant SGR sequences
//!
//! All output is accumulated in a single buffer and flushed with one syscall.

use super::{Buffer, Cell, Color, Modifiers, Style};
use std::io::Write;

/// State tracker for the diffing algorithm.
///
/// This tracks the terminal's cursor position and active style so that
/// consecutive writes can skip redundant escape sequences.
#[derive(Debug, Clone, Default)]
pub struct DiffState {
    /// Last known cursor position (0-indexed), `None` when unknown.
    cursor: Option<(u16, u16)>,
    /// Last emitted style, `None` when unknown.
    style: Option<Style>,
}

impl DiffState {
    /// Create a new diff state with unknown terminal state.
    pub const fn new() -> Self {
        Self {
            cursor: None,
            style: None,
        }
    }

    /// Forget everything (e.g., after a full screen clear).
    pub const fn reset(&mut self) {
        self.cursor = None;
        self.style = None;
    }
}

/// Render the difference between two buffers into an ANSI sequence buffer.
///
/// Returns the number of cells written.
pub fn render_diff(
    current: &Buffer,
    next: &Buffer,
    output: &mut Vec<u8>,
    state: &mut DiffState,
) -> usize {
    debug_assert_eq!(current.width(), next.width());
    debug_assert_eq!(current.height(), next.height());

    let width = next.width();
    let mut changed = 0;

    for (idx, (old, new)) in current.cells().iter().zip(next.cells()).enumerate() {
        if old == new || new.is_continuation() {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = ((idx % width as usize) as u16, (idx / width as usize) as u16);
        emit_cell(output, x, y, new, state);
        changed += 1;
    }

    if changed > 0 {
        output.extend_from_slice(b"\x1b[0m");
        state.style = None;
    }
    changed
}

/// Generate a full redraw sequence (no diffing).
///
/// This is used for the first frame, after a resize, or whenever the
/// terminal contents are unknown.
pub fn render_full(buffer: &Buffer, output: &mut Vec<u8>, state: &mut DiffState) {
    output.extend_from_slice(b"\x1b[0m\x1b[2J");
    state.reset();

    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            if let Some(cell) = buffer.get(x, y) {
                if !cell.is_continuation() {
                    emit_cell(output, x, y, cell, state);
                }
            }
        }
    }

    output.extend_from_slice(b"\x1b[0m");
    state.style = None;
}

/// Emit one cell, moving the cursor and switching style only when needed.
fn emit_cell(output: &mut Vec<u8>, x: u16, y: u16, cell: &Cell, state: &mut DiffState) {
    if state.cursor != Some((x, y)) {
        emit_cursor_move(output, x, y);
    }

    let style = cell.style();
    if state.style != Some(style) {
        emit_style(output, style);
        state.style = Some(style);
    }

    // A bare mark would not advance the cursor; give it a blank base
    if cell.is_zero_width() {
        output.push(b' ');
    }
    output.extend_from_slice(cell.symbol().as_bytes());
    state.cursor = Some((x + u16::from(cell.width().max(1)), y));
}

/// Emit a cursor move sequence.
///
/// Uses the most compact representation:
/// - `\x1b[H` for home (1,1)
/// - `\x1b[{row}H` for column 1
/// - `\x1b[{row};{col}H` otherwise
#[inline]
fn emit_cursor_move(output: &mut Vec<u8>, x: u16, y: u16) {
    // ANSI uses 1-indexed positions
    let row = y + 1;
    let col = x + 1;

    if row == 1 && col == 1 {
        output.extend_from_slice(b"\x1b[H");
    } else if col == 1 {
        let _ = write!(output, "\x1b[{row}H");
    } else {
        let _ = write!(output, "\x1b[{row};{col}H");
    }
}

/// Emit a complete SGR sequence for a style.
///
/// Always starts from a reset so removed modifiers cannot leak.
fn emit_style(output: &mut Vec<u8>, style: Style) {
    output.extend_from_slice(b"\x1b[0");
    for (flag, code) in [
        (Modifiers::BOLD, b";1"),
        (Modifiers::DIM, b";2"),
        (Modifiers::ITALIC, b";3"),
        (Modifiers::UNDERLINE, b";4"),
        (Modifiers::REVERSED, b";7"),
    ] {
        if style.modifiers.contains(flag) {
            output.extend_from_slice(code);
        }
    }
    emit_color(output, style.fg, 30);
    emit_color(output, style.bg, 40);
    output.push(b'm');
}

/// Emit the SGR parameters of one color; `base` is 30 for fg, 40 for bg.
fn emit_color(output: &mut Vec<u8>, color: Color, base: u8) {
    match color {
        Color::Reset => {}
        Color::Indexed(idx @ 0..=7) => {
            let _ = write!(output, ";{}", base + idx);
        }
        Color::Indexed(idx @ 8..=15) => {
            let _ = write!(output, ";{}", base + 60 + idx - 8);
        }
        Color::Indexed(idx) => {
            let _ = write!(output, ";{};5;{idx}", base + 8);
        }
        Color::Rgb(r, g, b) => {
            let _ = write!(output, ";{};2;{r};{g};{b}", base + 8);
        }
    }
}

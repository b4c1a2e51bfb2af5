//! Cell: The atomic unit of terminal display.
//!
//! # Memory Layout
//!
//! A cell holds one grapheme cluster plus its display width, two
//! palette-or-RGB colors, a modifier byte and storage flags. It stays `Copy`
//! and 16 bytes, so a full 200x60 screen fits in under 200 KiB and buffer
//! copies are plain memcpy.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Cell Layout (16 bytes)                                      │
//! ├──────────┬─────────────┬─────────┬─────────┬─────┬───────────┤
//! │ grapheme │ len + width │   fg    │   bg    │ mod │   flags   │
//! │ [u8; 4]  │   u8 + u8   │  Color  │  Color  │ u8  │    u8     │
//! │ 4 bytes  │   2 bytes   │ 4 bytes │ 4 bytes │ 1b  │    1b     │
//! └──────────┴─────────────┴─────────┴─────────┴─────┴───────────┘
//! ```

use bitflags::bitflags;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use unicode_width::UnicodeWidthStr;

/// A terminal color.
///
/// Panels mostly use the eight ANSI palette entries; `Rgb` covers true-color
/// SGR sequences found in decoded text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub enum Color {
    /// The terminal's default color.
    #[default]
    Reset,
    /// A 256-color palette index.
    Indexed(u8),
    /// A 24-bit color.
    Rgb(u8, u8, u8),
}

impl Color {
    /// ANSI black.
    pub const BLACK: Self = Self::Indexed(0);
    /// ANSI red.
    pub const RED: Self = Self::Indexed(1);
    /// ANSI green.
    pub const GREEN: Self = Self::Indexed(2);
    /// ANSI yellow.
    pub const YELLOW: Self = Self::Indexed(3);
    /// ANSI blue.
    pub const BLUE: Self = Self::Indexed(4);
    /// ANSI magenta.
    pub const MAGENTA: Self = Self::Indexed(5);
    /// ANSI cyan.
    pub const CYAN: Self = Self::Indexed(6);
    /// ANSI white.
    pub const WHITE: Self = Self::Indexed(7);

    /// Whether this is the terminal default.
    #[inline]
    pub const fn is_reset(self) -> bool {
        matches!(self, Self::Reset)
    }
}

impl From<vt100::Color> for Color {
    fn from(color: vt100::Color) -> Self {
        match color {
            vt100::Color::Default => Self::Reset,
            vt100::Color::Idx(idx) => Self::Indexed(idx),
            vt100::Color::Rgb(r, g, b) => Self::Rgb(r, g, b),
        }
    }
}

bitflags! {
    /// Text style modifiers.
    ///
    /// These can be combined using bitwise OR.
    ///
    /// # Example
    /// ```
    /// use treeline::Modifiers;
    /// let style = Modifiers::BOLD | Modifiers::REVERSED;
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dim/faint text
        const DIM = 0b0000_0010;
        /// Italic text
        const ITALIC = 0b0000_0100;
        /// Underlined text
        const UNDERLINE = 0b0000_1000;
        /// Reversed colors (fg/bg swapped)
        const REVERSED = 0b0001_0000;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Foreground, background and modifiers applied together.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Text modifiers.
    pub modifiers: Modifiers,
}

impl Style {
    /// The terminal default style.
    pub const DEFAULT: Self = Self::new();

    /// Create a default style.
    pub const fn new() -> Self {
        Self {
            fg: Color::Reset,
            bg: Color::Reset,
            modifiers: Modifiers::empty(),
        }
    }

    /// Set the foreground color.
    #[must_use]
    pub const fn fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[must_use]
    pub const fn bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Add modifiers.
    #[must_use]
    pub const fn add(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = self.modifiers.union(modifiers);
        self
    }

    /// Layer `self` over `base`: default colors fall through, modifiers merge.
    #[must_use]
    pub const fn over(self, base: Self) -> Self {
        Self {
            fg: if self.fg.is_reset() { base.fg } else { self.fg },
            bg: if self.bg.is_reset() { base.bg } else { self.bg },
            modifiers: self.modifiers.union(base.modifiers),
        }
    }
}

bitflags! {
    /// Cell-level flags for special states.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Grapheme overflows inline storage; the bytes hold an interned index
        const OVERFLOW = 0b0000_0001;
        /// Grapheme has no width of its own (lone combining mark, ZWSP)
        const ZERO_WIDTH = 0b0000_0010;
    }
}

impl std::fmt::Debug for CellFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Process-wide storage for clusters longer than the inline four bytes.
///
/// Strings are leaked once and never freed; the set of distinct long
/// clusters a UI ever shows (ZWJ emoji, flags, stacked marks) is small.
#[derive(Default)]
struct Overflow {
    index: HashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

fn overflow() -> MutexGuard<'static, Overflow> {
    static OVERFLOW: OnceLock<Mutex<Overflow>> = OnceLock::new();
    OVERFLOW
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn intern(grapheme: &str) -> u32 {
    let mut store = overflow();
    if let Some(&index) = store.index.get(grapheme) {
        return index;
    }
    let leaked: &'static str = Box::leak(grapheme.to_owned().into_boxed_str());
    let index = u32::try_from(store.strings.len()).unwrap_or(u32::MAX);
    store.strings.push(leaked);
    store.index.insert(leaked, index);
    index
}

fn resolve(index: u32) -> &'static str {
    overflow()
        .strings
        .get(index as usize)
        .copied()
        .unwrap_or("\u{FFFD}")
}

/// A single terminal cell.
///
/// Each cell holds one grapheme cluster: a base character together with any
/// combining marks, variation selectors or ZWJ joins that render with it.
/// Clusters of up to four UTF-8 bytes are stored inline; longer ones are
/// interned and the inline bytes carry the index, flagged with
/// [`CellFlags::OVERFLOW`]. Interned clusters compare equal by index since
/// equal strings always intern to the same slot.
///
/// Wide clusters (CJK, most emoji) occupy two columns: the first cell
/// carries the symbol with width 2, the second is a [`Cell::CONTINUATION`]
/// that the diff renderer skips.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    grapheme: [u8; 4],
    len: u8,
    width: u8,
    fg: Color,
    bg: Color,
    modifiers: Modifiers,
    flags: CellFlags,
}

// Compile-time assertion: Cell must stay 16 bytes
const _: () = assert!(
    std::mem::size_of::<Cell>() == 16,
    "Cell must be exactly 16 bytes"
);

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cell({:?}", self.symbol())?;
        if !self.fg.is_reset() {
            write!(f, " fg={:?}", self.fg)?;
        }
        if !self.bg.is_reset() {
            write!(f, " bg={:?}", self.bg)?;
        }
        if !self.modifiers.is_empty() {
            write!(f, " {:?}", self.modifiers)?;
        }
        write!(f, ")")
    }
}

impl Cell {
    /// A blank cell with default colors.
    pub const EMPTY: Self = Self {
        grapheme: [b' ', 0, 0, 0],
        len: 1,
        width: 1,
        fg: Color::Reset,
        bg: Color::Reset,
        modifiers: Modifiers::empty(),
        flags: CellFlags::empty(),
    };

    /// The placeholder occupying the second column of a wide character.
    pub const CONTINUATION: Self = Self {
        grapheme: [b' ', 0, 0, 0],
        len: 1,
        width: 0,
        fg: Color::Reset,
        bg: Color::Reset,
        modifiers: Modifiers::empty(),
        flags: CellFlags::empty(),
    };

    /// Create a cell for a single character with default colors.
    pub fn new(symbol: char) -> Self {
        Self::from_grapheme(symbol.encode_utf8(&mut [0; 4]))
    }

    /// Create a cell for a grapheme cluster with default colors.
    ///
    /// Empty input and clusters containing control characters become a
    /// blank. A cluster with no width of its own (a lone combining mark)
    /// is kept and given one column.
    pub fn from_grapheme(grapheme: &str) -> Self {
        if grapheme.is_empty() || grapheme.chars().any(char::is_control) {
            return Self::EMPTY;
        }
        let measured = grapheme.width();
        let width = u8::try_from(measured.clamp(1, 2)).unwrap_or(1);
        let mut flags = if measured == 0 {
            CellFlags::ZERO_WIDTH
        } else {
            CellFlags::empty()
        };

        let bytes = grapheme.as_bytes();
        let mut inline = [0u8; 4];
        let len = if bytes.len() <= inline.len() {
            inline[..bytes.len()].copy_from_slice(bytes);
            u8::try_from(bytes.len()).unwrap_or(0)
        } else {
            inline = intern(grapheme).to_le_bytes();
            flags |= CellFlags::OVERFLOW;
            0
        };

        Self {
            grapheme: inline,
            len,
            width,
            flags,
            ..Self::EMPTY
        }
    }

    /// The grapheme cluster displayed in this cell.
    #[inline]
    pub fn symbol(&self) -> &str {
        if self.flags.contains(CellFlags::OVERFLOW) {
            return resolve(u32::from_le_bytes(self.grapheme));
        }
        std::str::from_utf8(&self.grapheme[..usize::from(self.len)]).unwrap_or("\u{FFFD}")
    }

    /// Display width in columns (0 for continuations).
    #[inline]
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Whether this cell is the tail of a wide character.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Whether the symbol draws without advancing the terminal cursor, so
    /// the renderer has to supply a base column for it.
    #[inline]
    pub const fn is_zero_width(&self) -> bool {
        self.flags.contains(CellFlags::ZERO_WIDTH)
    }

    /// Storage flags.
    #[inline]
    pub const fn flags(&self) -> CellFlags {
        self.flags
    }

    /// Foreground color.
    #[inline]
    pub const fn fg(&self) -> Color {
        self.fg
    }

    /// Background color.
    #[inline]
    pub const fn bg(&self) -> Color {
        self.bg
    }

    /// Text modifiers.
    #[inline]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// The cell's colors and modifiers.
    #[inline]
    pub const fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            modifiers: self.modifiers,
        }
    }

    /// Builder: set the foreground color.
    #[must_use]
    pub const fn with_fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Builder: set the background color.
    #[must_use]
    pub const fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Builder: set the modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Builder: replace colors and modifiers with `style`.
    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.fg = style.fg;
        self.bg = style.bg;
        self.modifiers = style.modifiers;
        self
    }

    /// Replace the symbol, keeping the style.
    #[must_use]
    pub fn with_symbol(self, symbol: char) -> Self {
        Self::new(symbol).with_style(self.style())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_size() {
        assert_eq!(std::mem::size_of::<Cell>(), 16);
    }

    #[test]
    fn test_cell_ascii() {
        let cell = Cell::new('A');
        assert_eq!(cell.symbol(), "A");
        assert_eq!(cell.width(), 1);
        assert!(!cell.is_continuation());
        assert!(!cell.is_zero_width());
    }

    #[test]
    fn test_cell_wide() {
        let cell = Cell::new('中');
        assert_eq!(cell.symbol(), "中");
        assert_eq!(cell.width(), 2);
    }

    #[test]
    fn test_cell_control_becomes_blank() {
        assert_eq!(Cell::new('\u{7}'), Cell::EMPTY);
        assert_eq!(Cell::from_grapheme("\r\n"), Cell::EMPTY);
        assert_eq!(Cell::from_grapheme(""), Cell::EMPTY);
    }

    #[test]
    fn test_cell_keeps_lone_zero_width() {
        let cell = Cell::new('\u{301}');
        assert_eq!(cell.symbol(), "\u{301}");
        assert_eq!(cell.width(), 1);
        assert!(cell.is_zero_width());
    }

    #[test]
    fn test_cell_combining_cluster_inline() {
        let cell = Cell::from_grapheme("e\u{301}");
        assert_eq!(cell.symbol(), "e\u{301}");
        assert_eq!(cell.width(), 1);
        assert!(!cell.flags().contains(CellFlags::OVERFLOW));
    }

    #[test]
    fn test_cell_long_cluster_overflows() {
        let family = "👨\u{200D}👩\u{200D}👧";
        let cell = Cell::from_grapheme(family);
        assert!(cell.flags().contains(CellFlags::OVERFLOW));
        assert_eq!(cell.symbol(), family);
        assert_eq!(cell.width(), 2);

        // Equal clusters intern to the same slot and compare equal
        assert_eq!(Cell::from_grapheme(family), cell);
        assert_ne!(Cell::from_grapheme("👨\u{200D}👩"), cell);
    }

    #[test]
    fn test_cell_builders() {
        let cell = Cell::new('x')
            .with_fg(Color::GREEN)
            .with_bg(Color::BLACK)
            .with_modifiers(Modifiers::BOLD);
        assert_eq!(cell.fg(), Color::GREEN);
        assert_eq!(cell.bg(), Color::BLACK);
        assert!(cell.modifiers().contains(Modifiers::BOLD));

        let masked = Cell::from_grapheme("e\u{301}").with_style(cell.style()).with_symbol('*');
        assert_eq!(masked.symbol(), "*");
        assert_eq!(masked.style(), cell.style());
    }

    #[test]
    fn test_style_over_falls_through() {
        let base = Style::new().fg(Color::WHITE).bg(Color::BLUE);
        let top = Style::new().fg(Color::RED).add(Modifiers::BOLD);
        let merged = top.over(base);
        assert_eq!(merged.fg, Color::RED);
        assert_eq!(merged.bg, Color::BLUE);
        assert_eq!(merged.modifiers, Modifiers::BOLD);
    }

    #[test]
    fn test_color_from_vt100() {
        assert_eq!(Color::from(vt100::Color::Default), Color::Reset);
        assert_eq!(Color::from(vt100::Color::Idx(2)), Color::GREEN);
        assert_eq!(Color::from(vt100::Color::Rgb(1, 2, 3)), Color::Rgb(1, 2, 3));
    }
}

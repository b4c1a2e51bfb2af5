//! Styled text helpers.
//!
//! Panel text may carry SGR escape sequences (bold leaves, colored footer
//! keys, green/red status messages). Layout works on the *visible* text, so
//! this module strips escapes before measuring, and decodes styled lines into
//! [`Cell`]s through a one-row `vt100` screen.

use crate::buffer::{Cell, Color, Modifiers, Style};
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Tabs expand to this many columns.
const TAB_WIDTH: usize = 4;

/// CSI and OSC escape sequences.
fn ansi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\x1b(?:\[[0-9;?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\))")
            .expect("ANSI pattern is valid")
    })
}

/// Remove ANSI escape sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ansi_pattern().replace_all(text, "")
}

/// Display width of `text` once escape sequences are removed.
pub fn visible_width(text: &str) -> usize {
    strip_ansi(text).width()
}

/// Cut `text` to at most `max` grapheme clusters, ending with `ellipsis`.
///
/// Text that already fits is returned unchanged; otherwise the first
/// `max - ellipsis_len` clusters are kept.
pub fn truncate(text: &str, max: usize, ellipsis: &str) -> String {
    if text.graphemes(true).count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ellipsis.graphemes(true).count());
    let mut out: String = text.graphemes(true).take(keep).collect();
    out.push_str(ellipsis);
    out
}

/// Wrap `text` in the SGR sequence for `style`, followed by a reset.
pub fn paint(text: &str, style: Style) -> String {
    let mut params = String::new();
    for (flag, code) in [
        (Modifiers::BOLD, 1),
        (Modifiers::DIM, 2),
        (Modifiers::ITALIC, 3),
        (Modifiers::UNDERLINE, 4),
        (Modifiers::REVERSED, 7),
    ] {
        if style.modifiers.contains(flag) {
            let _ = write!(params, "{code};");
        }
    }
    push_color(&mut params, style.fg, 30);
    push_color(&mut params, style.bg, 40);

    if params.is_empty() {
        return text.to_string();
    }
    params.pop();
    format!("\x1b[{params}m{text}\x1b[0m")
}

fn push_color(params: &mut String, color: Color, base: u8) {
    let _ = match color {
        Color::Reset => Ok(()),
        Color::Indexed(idx @ 0..=7) => write!(params, "{};", base + idx),
        Color::Indexed(idx) => write!(params, "{};5;{idx};", base + 8),
        Color::Rgb(r, g, b) => write!(params, "{};2;{r};{g};{b};", base + 8),
    };
}

/// Decode one line of possibly SGR-styled text into cells.
///
/// Tabs expand to spaces and carriage returns are dropped. Each grapheme
/// cluster yields one cell, so combining marks and ZWJ sequences survive;
/// wide clusters yield a single cell of width 2.
pub fn decode_line(line: &str) -> Vec<Cell> {
    let line = line.replace('\t', &" ".repeat(TAB_WIDTH)).replace('\r', "");
    let visible = strip_ansi(&line);
    if visible.is_empty() {
        return Vec::new();
    }
    let advance = |text: &str| -> usize { text.chars().map(|c| c.width().unwrap_or(0)).sum() };

    // The screen only supplies styles; text comes from the clusters below.
    // Spare columns absorb width disagreements on exotic glyphs.
    let cols = u16::try_from(advance(&visible) + 8).unwrap_or(u16::MAX);
    let mut parser = vt100::Parser::new(1, cols, 0);
    parser.process(line.as_bytes());
    let screen = parser.screen();

    let mut cells = Vec::with_capacity(visible.len());
    let mut col = 0usize;
    for grapheme in visible.graphemes(true) {
        let style = u16::try_from(col)
            .ok()
            .and_then(|col| screen.cell(0, col))
            .map_or(Style::DEFAULT, style_of);
        cells.push(Cell::from_grapheme(grapheme).with_style(style));
        col += advance(grapheme);
    }
    cells
}

fn style_of(cell: &vt100::Cell) -> Style {
    let mut modifiers = Modifiers::empty();
    if cell.bold() {
        modifiers |= Modifiers::BOLD;
    }
    if cell.italic() {
        modifiers |= Modifiers::ITALIC;
    }
    if cell.underline() {
        modifiers |= Modifiers::UNDERLINE;
    }
    if cell.inverse() {
        modifiers |= Modifiers::REVERSED;
    }
    Style {
        fg: cell.fgcolor().into(),
        bg: cell.bgcolor().into(),
        modifiers,
    }
}

/// Plain text of a cell run.
pub fn cells_to_string(cells: &[Cell]) -> String {
    cells
        .iter()
        .filter(|cell| !cell.is_continuation())
        .map(Cell::symbol)
        .collect()
}

/// Total display width of a cell run.
pub fn cells_width(cells: &[Cell]) -> usize {
    cells.iter().map(|cell| usize::from(cell.width())).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1mbold\x1b[0m text"), "bold text");
        assert_eq!(strip_ansi("\x1b[38;2;1;2;3mrgb\x1b[0m"), "rgb");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_visible_width_ignores_escapes() {
        let painted = paint("TAB", Style::new().fg(Color::CYAN));
        assert!(painted.len() > 3);
        assert_eq!(visible_width(&painted), 3);
        assert_eq!(visible_width("中文"), 4);
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate("short", 10, "..."), "short");
        let long = "x".repeat(60);
        let cut = truncate(&long, 50, "...");
        assert_eq!(cut.len(), 50);
        assert!(cut.ends_with("..."));
        // Combining sequences are kept whole
        assert_eq!(truncate("e\u{301}e\u{301}e\u{301}", 2, ""), "e\u{301}e\u{301}");
    }

    #[test]
    fn test_paint_plain_style_is_identity() {
        assert_eq!(paint("abc", Style::DEFAULT), "abc");
        assert_eq!(
            paint("ok", Style::new().fg(Color::GREEN).add(Modifiers::BOLD)),
            "\x1b[1;32mok\x1b[0m"
        );
    }

    #[test]
    fn test_decode_plain_line() {
        let cells = decode_line("a\tb");
        assert_eq!(cells_to_string(&cells), "a    b");
    }

    #[test]
    fn test_decode_keeps_trailing_spaces() {
        assert_eq!(cells_to_string(&decode_line("ab  ")), "ab  ");
    }

    #[test]
    fn test_decode_styled_line() {
        let line = format!("├─{}", paint("leaf", Style::new().add(Modifiers::BOLD)));
        let cells = decode_line(&line);
        assert_eq!(cells_to_string(&cells), "├─leaf");
        assert!(!cells[0].modifiers().contains(Modifiers::BOLD));
        assert!(cells[2].modifiers().contains(Modifiers::BOLD));
    }

    #[test]
    fn test_decode_colors() {
        let cells = decode_line(&paint("err", Style::new().fg(Color::RED)));
        assert_eq!(cells[0].fg(), Color::RED);
    }

    #[test]
    fn test_decode_wide() {
        let cells = decode_line("中a");
        assert_eq!(cells.len(), 2);
        assert_eq!(cells_width(&cells), 3);
    }

    #[test]
    fn test_decode_keeps_grapheme_clusters() {
        let text = "cafe\u{301} 👨\u{200D}👩";
        let cells = decode_line(text);
        assert_eq!(cells_to_string(&cells), text);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[3].symbol(), "e\u{301}");
    }

    #[test]
    fn test_decode_styles_follow_clusters() {
        let line = format!("e\u{301}{}", paint("中x", Style::new().fg(Color::RED)));
        let cells = decode_line(&line);
        assert_eq!(cells_to_string(&cells), "e\u{301}中x");
        assert_eq!(cells[0].fg(), Color::Reset);
        assert_eq!(cells[1].fg(), Color::RED);
        assert_eq!(cells[2].fg(), Color::RED);
    }

    #[test]
    fn test_decode_leading_combining_mark() {
        let cells = decode_line("\u{301}a");
        assert_eq!(cells_to_string(&cells), "\u{301}a");
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_line("").is_empty());
        assert!(decode_line("\x1b[0m").is_empty());
    }
}

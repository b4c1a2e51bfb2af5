//! Scrollbar: a thumb derived from a content panel's scroll state.
//!
//! The geometry is a pure function of the content line count `L`, the
//! viewport height `H` and the scroll origin `O`. The thumb is a frameless,
//! two-column, reverse-video panel drawn over the content panel's right
//! border.

use crate::buffer::{Modifiers, Style};
use crate::error::Result;
use crate::layout::Rect;
use crate::surface::{PanelId, Surface};
use std::cell::Cell;
use std::rc::Rc;
use tracing::trace;

/// Width of the thumb panel, in columns.
const THUMB_WIDTH: u16 = 2;

/// Thumb height for `lines` of content in a `viewport` rows high.
///
/// The content is split into the fewest viewport-sized pages `m` that cover
/// it (`m * viewport >= lines`), and the thumb is one `m`-th of the
/// viewport, rounded up. A thumb that would fill the viewport means no
/// thumb (0); a one-row thumb is widened to 2.
pub fn thumb_height(lines: usize, viewport: usize) -> usize {
    if viewport == 0 || lines <= viewport {
        return 0;
    }
    let pages = lines.div_ceil(viewport);
    match viewport.div_ceil(pages) {
        h if h >= viewport => 0,
        1 => 2,
        h => h,
    }
}

/// Thumb offset from the top of the viewport for scroll origin `origin`.
///
/// `origin * viewport / (lines - viewport)`, i.e. 0 at the top and
/// `viewport` at the last full page. Callers clamp the result so the thumb
/// stays inside the viewport.
pub fn thumb_offset(origin: usize, lines: usize, viewport: usize) -> usize {
    if lines <= viewport {
        return 0;
    }
    origin * viewport / (lines - viewport)
}

/// Offset and height of the thumb, or `None` when no thumb is needed.
///
/// The offset is clamped so that `offset + height <= viewport`.
pub fn thumb_geometry(lines: usize, viewport: usize, origin: usize) -> Option<(usize, usize)> {
    let height = thumb_height(lines, viewport);
    if height == 0 {
        return None;
    }
    let offset = thumb_offset(origin, lines, viewport).min(viewport.saturating_sub(height));
    Some((offset, height))
}

/// Scrollbar attached to one content panel.
///
/// Clones share the thumb, so key handlers can hold a clone and redraw.
#[derive(Debug, Clone)]
pub struct Scrollbar {
    content: PanelId,
    thumb: Rc<Cell<Option<PanelId>>>,
}

impl Scrollbar {
    /// A scrollbar for `content`. Nothing is drawn until [`Scrollbar::redraw`].
    pub fn new(content: PanelId) -> Self {
        Self {
            content,
            thumb: Rc::new(Cell::new(None)),
        }
    }

    /// The content panel this scrollbar follows.
    pub const fn content(&self) -> PanelId {
        self.content
    }

    /// The thumb panel, when one is shown.
    pub fn thumb(&self) -> Option<PanelId> {
        self.thumb.get()
    }

    /// Re-derive the thumb from the content panel.
    ///
    /// Creates, moves or deletes the thumb panel as needed and keeps it
    /// above the content.
    pub fn redraw<C>(&self, surface: &mut Surface<C>) -> Result<()> {
        let panel = surface.panel(self.content)?;
        let lines = panel.view_line_count();
        let viewport = usize::from(panel.size().1);
        let origin = usize::from(panel.origin().1);
        let (outer, inner) = (panel.rect(), panel.inner());

        let Some((offset, height)) = thumb_geometry(lines, viewport, origin) else {
            self.remove(surface);
            return Ok(());
        };
        trace!(lines, viewport, origin, offset, height, "scrollbar");

        #[allow(clippy::cast_possible_truncation)]
        let rect = Rect::new(
            outer.right().saturating_sub(THUMB_WIDTH),
            inner.y + offset as u16,
            THUMB_WIDTH,
            height as u16,
        );

        let id = match self.thumb.get().filter(|id| surface.contains(*id)) {
            Some(id) => {
                surface.set_rect(id, rect)?;
                id
            }
            None => {
                let id = surface.create_panel(rect)?;
                surface.panel_mut(id)?.style = Style::new().add(Modifiers::REVERSED);
                self.thumb.set(Some(id));
                id
            }
        };
        surface.raise(id)
    }

    /// Delete the thumb panel.
    pub fn remove<C>(&self, surface: &mut Surface<C>) {
        if let Some(id) = self.thumb.take() {
            surface.delete_panel(id);
        }
    }
}

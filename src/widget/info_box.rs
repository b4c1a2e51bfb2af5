//! InfoBox: a transient centered message such as "Loading...".
//!
//! Showing and closing both go through the deferred queue, so a worker
//! thread can open a box before it starts and close it when it finishes.

use crate::error::Result;
use crate::layout::Rect;
use crate::surface::{PanelId, Updater};
use crate::text::truncate;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

/// Default box width, in columns.
pub const DEFAULT_WIDTH: u16 = 50;

const ELLIPSIS: &str = "...";

/// Cut `msg` to fit a box `width` columns wide.
///
/// Messages longer than `width` graphemes keep `width - 5` of them plus
/// `...`.
pub fn fit_message(msg: &str, width: u16) -> String {
    let width = usize::from(width);
    if msg.graphemes(true).count() <= width {
        return msg.to_string();
    }
    truncate(msg, width.saturating_sub(2), ELLIPSIS)
}

/// Handle to a shown (or about to be shown) info box.
pub struct InfoBox<C> {
    slot: Arc<Mutex<Option<PanelId>>>,
    updater: Updater<C>,
}

impl<C> Clone for InfoBox<C> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            updater: self.updater.clone(),
        }
    }
}

impl<C> std::fmt::Debug for InfoBox<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoBox")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<C: 'static> InfoBox<C> {
    /// Queue a framed "Info" box `width` columns wide, centered horizontally
    /// on the middle row.
    ///
    /// With a `timeout`, a background thread closes the box after the delay.
    pub fn show(
        updater: &Updater<C>,
        msg: &str,
        width: u16,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let info = Self {
            slot: Arc::new(Mutex::new(None)),
            updater: updater.clone(),
        };
        let msg = fit_message(msg, width);
        let slot = Arc::clone(&info.slot);

        info.updater.post(move |surface, _| {
            let (screen_width, screen_height) = surface.size();
            let rect = Rect::new(
                screen_width.saturating_sub(width) / 2,
                screen_height / 2,
                width,
                3,
            );
            let id = surface.create_panel(rect)?;
            let panel = surface.panel_mut(id)?;
            panel.frame = true;
            panel.title = "Info".to_string();
            panel.set_text(&msg);
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
            debug!(?id, "info box shown");
            Ok(())
        })?;

        if let Some(timeout) = timeout {
            let closer = info.clone();
            std::thread::Builder::new()
                .name("treeline-info".to_string())
                .spawn(move || {
                    std::thread::sleep(timeout);
                    if closer.close().is_err() {
                        trace!("info box timeout after shutdown");
                    }
                })?;
        }
        Ok(info)
    }

    /// Queue deletion of the box. Closing more than once is harmless.
    pub fn close(&self) -> Result<()> {
        let slot = Arc::clone(&self.slot);
        self.updater.post(move |surface, _| {
            let id = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(id) = id {
                surface.delete_panel(id);
            }
            Ok(())
        })
    }

    /// The box panel, once the show task ran and until it closes.
    pub fn panel(&self) -> Option<PanelId> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

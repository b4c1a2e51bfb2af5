//! StatusLine: a one-row message strip along the bottom of the screen.
//!
//! Updates go through the deferred queue, so any thread holding a clone can
//! report progress. `reset` restores the message given to `set_view`.

use crate::buffer::{Color, Style};
use crate::error::Result;
use crate::layout::Rect;
use crate::surface::{PanelId, Surface, Updater};
use crate::text::paint;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct State {
    panel: Option<PanelId>,
    default: String,
}

/// Bottom status line. Clones share the same panel.
pub struct StatusLine<C> {
    state: Arc<Mutex<State>>,
    updater: Updater<C>,
}

impl<C> Clone for StatusLine<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            updater: self.updater.clone(),
        }
    }
}

impl<C> std::fmt::Debug for StatusLine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusLine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<C> StatusLine<C> {
    /// A status line posting its updates through `updater`.
    pub fn new(updater: Updater<C>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            updater,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// The panel, once shown.
    pub fn panel(&self) -> Option<PanelId> {
        self.with_state(|state| state.panel)
    }

    /// The message [`StatusLine::reset`] restores.
    pub fn default_message(&self) -> String {
        self.with_state(|state| state.default.clone())
    }

    /// Create the panel on the last screen row, or move it there after a
    /// resize, and make `msg` the default message.
    pub fn set_view(&self, surface: &mut Surface<C>, msg: &str) -> Result<PanelId> {
        let (width, height) = surface.size();
        let rect = Rect::new(0, height.saturating_sub(1), width, 1);

        let existing = self.panel().filter(|id| surface.contains(*id));
        let id = match existing {
            Some(id) => {
                surface.set_rect(id, rect)?;
                id
            }
            None => {
                let id = surface.create_panel(rect)?;
                surface.panel_mut(id)?.set_text(msg);
                debug!(?id, "status line built");
                id
            }
        };
        surface.raise(id)?;

        self.with_state(|state| {
            state.panel = Some(id);
            state.default = msg.to_string();
        });
        Ok(id)
    }

    /// Show `msg` until the next update.
    pub fn update(&self, msg: impl Into<String>) -> Result<()> {
        let msg = msg.into();
        let state = Arc::clone(&self.state);
        self.updater.post(move |surface, _| {
            let panel = state.lock().unwrap_or_else(PoisonError::into_inner).panel;
            match panel.filter(|id| surface.contains(*id)) {
                Some(id) => surface.panel_mut(id)?.set_text(&msg),
                None => trace!("status update without a panel"),
            }
            Ok(())
        })
    }

    /// Show `msg` in green.
    pub fn update_success(&self, msg: &str) -> Result<()> {
        self.update(paint(msg, Style::new().fg(Color::GREEN)))
    }

    /// Show `msg` in red.
    pub fn update_error(&self, msg: &str) -> Result<()> {
        self.update(paint(msg, Style::new().fg(Color::RED)))
    }

    /// Restore the default message.
    pub fn reset(&self) -> Result<()> {
        self.update(self.default_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown() -> (Surface<()>, StatusLine<()>, PanelId) {
        let mut surface = Surface::new(80, 24);
        let status = StatusLine::new(surface.updater());
        let id = status.set_view(&mut surface, "ready").unwrap();
        (surface, status, id)
    }

    #[test]
    fn test_set_view_bottom_row() {
        let (surface, status, id) = shown();
        let panel = surface.panel(id).unwrap();
        assert_eq!(panel.rect(), Rect::new(0, 23, 80, 1));
        assert!(!panel.frame);
        assert_eq!(panel.lines(), vec!["ready"]);
        assert_eq!(status.default_message(), "ready");
    }

    #[test]
    fn test_updates_apply_on_ui_thread() {
        let (mut surface, status, id) = shown();
        status.update("working").unwrap();
        assert_eq!(surface.panel(id).unwrap().lines(), vec!["ready"]);

        surface.run_pending(&mut ()).unwrap();
        assert_eq!(surface.panel(id).unwrap().lines(), vec!["working"]);

        status.reset().unwrap();
        surface.run_pending(&mut ()).unwrap();
        assert_eq!(surface.panel(id).unwrap().lines(), vec!["ready"]);
    }

    #[test]
    fn test_colored_updates() {
        let (mut surface, status, id) = shown();
        status.update_error("failed").unwrap();
        surface.run_pending(&mut ()).unwrap();
        let cells = surface.panel(id).unwrap().line_cells(0).unwrap().to_vec();
        assert_eq!(cells[0].fg(), Color::RED);

        status.update_success("done").unwrap();
        surface.run_pending(&mut ()).unwrap();
        let cells = surface.panel(id).unwrap().line_cells(0).unwrap().to_vec();
        assert_eq!(cells[0].fg(), Color::GREEN);
        assert_eq!(surface.panel(id).unwrap().lines(), vec!["done"]);
    }

    #[test]
    fn test_update_from_worker_thread() {
        let (mut surface, status, id) = shown();
        let worker = status.clone();
        std::thread::spawn(move || worker.update("from worker"))
            .join()
            .unwrap()
            .unwrap();
        surface.run_pending(&mut ()).unwrap();
        assert_eq!(surface.panel(id).unwrap().lines(), vec!["from worker"]);
    }

    #[test]
    fn test_resize_moves_panel() {
        let (mut surface, status, id) = shown();
        surface.resize(100, 40);
        assert_eq!(status.set_view(&mut surface, "ready").unwrap(), id);
        assert_eq!(surface.panel(id).unwrap().rect(), Rect::new(0, 39, 100, 1));
    }

    #[test]
    fn test_update_before_set_view_is_ignored() {
        let mut surface: Surface<()> = Surface::new(80, 24);
        let status = StatusLine::new(surface.updater());
        status.update("early").unwrap();
        assert_eq!(surface.run_pending(&mut ()).unwrap(), 1);
    }
}

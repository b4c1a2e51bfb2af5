//! Surface: panels, focus, key bindings and the deferred update queue.
//!
//! The surface is the single owner of every panel. Widgets hold
//! [`PanelId`] handles and go through the surface for every mutation, so
//! a widget that outlives its panel sees [`Error::UnknownPanel`] instead of
//! touching freed state.
//!
//! # Dispatch
//!
//! ```text
//! Key ─▶ bindings of the focused panel ─▶ global bindings ─▶ editor
//!              (first match wins)                      (editable panels)
//! ```
//!
//! Handlers receive the surface, the application context `C` and the panel
//! the key was delivered to. Everything runs on the UI thread; other threads
//! post work through an [`Updater`].

mod editor;
mod panel;
mod queue;

pub use panel::{Panel, ViewLine};
pub use queue::{Task, Updater};

use crate::actor::Key;
use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::layout::Rect;
use crossbeam_channel::Receiver;
use slotmap::SlotMap;
use std::rc::Rc;
use tracing::{debug, trace};

slotmap::new_key_type! {
    /// Generational handle to a panel.
    ///
    /// Handles of deleted panels never alias newer panels.
    pub struct PanelId;
}

/// A key handler: surface, context, and the panel that had focus.
pub type Handler<C> = Rc<dyn Fn(&mut Surface<C>, &mut C, Option<PanelId>) -> Result<()>>;

struct Binding<C> {
    scope: Option<PanelId>,
    key: Key,
    handler: Handler<C>,
}

/// Default capacity of the deferred update queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// The panel compositor.
pub struct Surface<C> {
    panels: SlotMap<PanelId, Panel>,
    /// Draw order, bottom first.
    stack: Vec<PanelId>,
    focus: Option<PanelId>,
    bindings: Vec<Binding<C>>,
    width: u16,
    height: u16,
    updater: Updater<C>,
    tasks: Receiver<Task<C>>,
    /// Escape sequences to write between frames (clipboard).
    passthrough: Vec<u8>,
    running: bool,
    dirty: bool,
}

impl<C> std::fmt::Debug for Surface<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("size", &(self.width, self.height))
            .field("panels", &self.panels.len())
            .field("focus", &self.focus)
            .field("bindings", &self.bindings.len())
            .finish_non_exhaustive()
    }
}

impl<C> Surface<C> {
    /// Create a surface of the given size.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_queue_capacity(width, height, DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a surface with a specific update queue capacity.
    pub fn with_queue_capacity(width: u16, height: u16, capacity: usize) -> Self {
        let (updater, tasks) = queue::channel(capacity);
        Self {
            panels: SlotMap::with_key(),
            stack: Vec::new(),
            focus: None,
            bindings: Vec::new(),
            width,
            height,
            updater,
            tasks,
            passthrough: Vec::new(),
            running: true,
            dirty: true,
        }
    }

    // ------------------------------------------------------------------
    // Screen
    // ------------------------------------------------------------------

    /// Screen width and height.
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Record a new screen size. Widgets re-lay themselves out afterwards.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.dirty = true;
    }

    /// Whether the main loop should keep going.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the main loop to stop after the current event.
    pub const fn quit(&mut self) {
        self.running = false;
    }

    /// Return and clear the needs-redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    // ------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------

    /// Create a panel on top of the stack.
    pub fn create_panel(&mut self, rect: Rect) -> Result<PanelId> {
        if rect.is_empty() {
            return Err(Error::TooSmall(rect));
        }
        let id = self.panels.insert(Panel::new(rect));
        self.stack.push(id);
        self.dirty = true;
        debug!(?id, ?rect, "panel created");
        Ok(id)
    }

    /// Move or resize a panel.
    pub fn set_rect(&mut self, id: PanelId, rect: Rect) -> Result<()> {
        if rect.is_empty() {
            return Err(Error::TooSmall(rect));
        }
        self.panel_mut(id)?.set_rect(rect);
        Ok(())
    }

    /// Delete a panel and every binding scoped to it.
    ///
    /// Returns `false` if the panel was already gone.
    pub fn delete_panel(&mut self, id: PanelId) -> bool {
        if self.panels.remove(id).is_none() {
            return false;
        }
        self.stack.retain(|p| *p != id);
        self.bindings.retain(|b| b.scope != Some(id));
        if self.focus == Some(id) {
            self.focus = None;
        }
        self.dirty = true;
        debug!(?id, "panel deleted");
        true
    }

    /// Whether the handle refers to a live panel.
    pub fn contains(&self, id: PanelId) -> bool {
        self.panels.contains_key(id)
    }

    /// Number of live panels.
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    /// Borrow a panel.
    pub fn panel(&self, id: PanelId) -> Result<&Panel> {
        self.panels.get(id).ok_or(Error::UnknownPanel(id))
    }

    /// Borrow a panel mutably. Marks the surface for redraw.
    pub fn panel_mut(&mut self, id: PanelId) -> Result<&mut Panel> {
        self.dirty = true;
        self.panels.get_mut(id).ok_or(Error::UnknownPanel(id))
    }

    /// Draw a panel above all others.
    pub fn raise(&mut self, id: PanelId) -> Result<()> {
        if !self.contains(id) {
            return Err(Error::UnknownPanel(id));
        }
        self.stack.retain(|p| *p != id);
        self.stack.push(id);
        self.dirty = true;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Give a panel keyboard focus.
    pub fn set_focus(&mut self, id: PanelId) -> Result<()> {
        if !self.contains(id) {
            return Err(Error::UnknownPanel(id));
        }
        trace!(?id, "focus");
        self.focus = Some(id);
        self.dirty = true;
        Ok(())
    }

    /// The panel with focus, if any.
    pub const fn focused(&self) -> Option<PanelId> {
        self.focus
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Bind a key on a panel (`Some`) or globally (`None`).
    ///
    /// Later bindings do not replace earlier ones; the first registered
    /// match wins.
    pub fn bind<F>(&mut self, scope: Option<PanelId>, key: Key, handler: F) -> Result<()>
    where
        F: Fn(&mut Self, &mut C, Option<PanelId>) -> Result<()> + 'static,
    {
        if let Some(id) = scope {
            if !self.contains(id) {
                return Err(Error::UnknownPanel(id));
            }
        }
        self.bindings.push(Binding {
            scope,
            key,
            handler: Rc::new(handler),
        });
        Ok(())
    }

    /// Remove every binding with the given scope.
    pub fn clear_bindings(&mut self, scope: Option<PanelId>) {
        self.bindings.retain(|b| b.scope != scope);
    }

    /// Number of registered bindings.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    fn find_handler(&self, key: Key) -> Option<Handler<C>> {
        let scoped = self.focus.and_then(|focus| {
            self.bindings
                .iter()
                .find(|b| b.scope == Some(focus) && b.key == key)
        });
        scoped
            .or_else(|| self.bindings.iter().find(|b| b.scope.is_none() && b.key == key))
            .map(|b| Rc::clone(&b.handler))
    }

    /// Dispatch a key press.
    ///
    /// Returns `Ok(true)` if a binding or the editor consumed the key.
    pub fn handle_key(&mut self, ctx: &mut C, key: Key) -> Result<bool> {
        let focus = self.focus;
        if let Some(handler) = self.find_handler(key) {
            trace!(?key, ?focus, "binding");
            self.dirty = true;
            handler(self, ctx, focus)?;
            return Ok(true);
        }

        let Some(panel) = focus.and_then(|id| self.panels.get_mut(id)) else {
            return Ok(false);
        };
        if panel.editable && panel.edit(key) {
            self.dirty = true;
            return Ok(true);
        }
        Ok(false)
    }

    /// Insert pasted text into the focused panel if it is editable.
    pub fn paste(&mut self, text: &str) -> bool {
        let Some(panel) = self.focus.and_then(|id| self.panels.get_mut(id)) else {
            return false;
        };
        if !panel.editable {
            return false;
        }
        panel.insert_str(text);
        self.dirty = true;
        true
    }

    // ------------------------------------------------------------------
    // Deferred updates
    // ------------------------------------------------------------------

    /// A handle for posting work from other threads.
    pub fn updater(&self) -> Updater<C> {
        self.updater.clone()
    }

    /// The receiving end of the update queue, for `select!` loops.
    pub fn task_receiver(&self) -> Receiver<Task<C>> {
        self.tasks.clone()
    }

    /// Run one task received from [`Surface::task_receiver`].
    pub fn run_task(&mut self, ctx: &mut C, task: Task<C>) -> Result<()> {
        self.dirty = true;
        task(self, ctx)
    }

    /// Run every queued task, then any the UI thread deferred while the
    /// queue was full. Stops at the first failing task.
    pub fn run_pending(&mut self, ctx: &mut C) -> Result<usize> {
        let tasks = self.tasks.clone();
        let mut ran = 0;
        while let Ok(task) = tasks.try_recv() {
            self.run_task(ctx, task)?;
            ran += 1;
        }
        while let Some(task) = self.take_overflow() {
            self.run_task(ctx, task)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Whether UI-thread posts are waiting behind a full queue.
    pub(crate) fn has_overflow(&self) -> bool {
        self.updater.has_overflow()
    }

    /// Next task deferred by a UI-thread post to a full queue.
    pub(crate) fn take_overflow(&self) -> Option<Task<C>> {
        self.updater.take_overflow()
    }

    /// Queue raw bytes for the terminal, written before the next frame.
    pub fn write_passthrough(&mut self, bytes: &[u8]) {
        self.passthrough.extend_from_slice(bytes);
    }

    /// Take the bytes queued by [`Surface::write_passthrough`].
    pub fn take_passthrough(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.passthrough)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Compose every panel into `buffer`, bottom of the stack first.
    pub fn render(&self, buffer: &mut Buffer) {
        buffer.resize(self.width, self.height);
        buffer.clear();
        for id in &self.stack {
            if let Some(panel) = self.panels.get(*id) {
                panel.render(buffer, self.focus == Some(*id));
            }
        }
    }

    /// Where the terminal cursor should be shown, if anywhere.
    pub fn cursor_position(&self) -> Option<(u16, u16)> {
        self.focus
            .and_then(|id| self.panels.get(id))
            .and_then(Panel::screen_cursor)
    }
}

//! # Treeline
//!
//! Panel-based terminal widgets for browsing and running a tree of
//! operations.
//!
//! Treeline lays a small widget set over a panel surface: a navigation
//! tree on the left, a scrollable result pane beside it, a status line
//! along the bottom, and modal input forms on top.
//!
//! ## Core Concepts
//!
//! - **Surface**: owns every panel; widgets hold generational [`PanelId`]s
//! - **Bindings**: keys dispatch to the focused panel, then globally, then
//!   to the built-in line editor
//! - **Deferred updates**: worker threads post closures through an
//!   [`Updater`]; they run on the UI thread between key presses
//! - **Actor model**: isolated threads for input and rendering, with a
//!   diffing renderer underneath
//! - **Clipboard**: Ctrl+X copies the result pane through OSC 52, so it
//!   works over SSH without system clipboard libraries
//!
//! ## Example
//!
//! ```rust,ignore
//! use treeline::{Engine, MainView, StatusLine, TreeView};
//!
//! let mut engine = Engine::new()?;
//! let mut surface = engine.surface::<App>();
//!
//! let mut tree = TreeView::new(30);
//! tree.set_view(&mut surface, "Operations", roots)?;
//! let status = StatusLine::new(surface.updater());
//! status.set_view(&mut surface, "Enter: run | Tab: switch | Ctrl+C: quit")?;
//!
//! engine.run(&mut surface, &mut app, |surface, _| tree.layout(surface))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod layout;
pub mod logging;
pub mod surface;
pub mod text;
pub mod widget;

// Re-exports for convenience
pub use actor::{Engine, InputEvent, Key, KeyCode, KeyModifiers};
pub use buffer::{Buffer, Cell, Color, Modifiers, Style};
pub use config::{Config, EngineConfig, LayoutConfig, LoggingConfig};
pub use error::{Error, Result};
pub use layout::Rect;
pub use surface::{Panel, PanelId, Surface, Updater};
pub use widget::{
    Direction, Form, FormState, InfoBox, Input, MainView, Node, NodeRef, Scrollbar, Sink,
    StatusLine, TreeView, Values,
};

//! Actor Model: Message-passing concurrency for the TUI engine.
//!
//! This module implements a simple actor system using crossbeam channels:
//! - **Input Actor**: Polls terminal events, forwards to main loop
//! - **Render Actor**: Receives composed frames, diffs and flushes
//! - **Main Loop**: Owns the [`Surface`](crate::surface::Surface), runs key
//!   handlers and queued tasks
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     InputEvent      ┌──────────────┐
//! │ Input Thread │ ─────────────────▶  │              │
//! └──────────────┘                     │  Main Loop   │
//!                                      │              │
//! ┌──────────────┐    RenderCommand    │              │
//! │Render Thread │ ◀───────────────── │              │
//! └──────────────┘                     └──────────────┘
//!                                            ▲
//!                                            │ Task
//!                                      ┌──────────────┐
//!                                      │Worker threads│
//!                                      └──────────────┘
//! ```

mod messages;
mod input;
mod renderer;
mod engine;

pub use messages::{InputEvent, Key, KeyCode, KeyModifiers, RenderCommand};
pub use input::InputActor;
pub use renderer::RendererActor;
pub use engine::Engine;

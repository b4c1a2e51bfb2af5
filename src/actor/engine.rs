//! Engine: Main coordinator that ties actors together.
//!
//! The Engine owns the terminal, spawns the input and render actors and
//! runs the single-threaded main loop over a [`Surface`]. Everything that
//! touches panels or the application context happens on the thread that
//! called [`Engine::run`].

use super::messages::{InputEvent, RenderCommand};
use super::{InputActor, RendererActor};
use crate::buffer::Buffer;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::surface::Surface;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use crossterm::{
    cursor, execute,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;
use tracing::{debug, info, warn};

/// Log a recoverable error and carry on; return anything else.
fn settle(result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "recoverable error");
            Ok(())
        }
        other => other,
    }
}

/// The terminal engine.
///
/// Dropping it stops the actors and restores the terminal.
pub struct Engine {
    /// Configuration.
    config: EngineConfig,
    /// Input event receiver.
    input_rx: Receiver<InputEvent>,
    /// Render command sender.
    render_tx: Sender<RenderCommand>,
    /// Input actor handle.
    input_actor: Option<InputActor>,
    /// Renderer actor handle.
    renderer_actor: Option<RendererActor>,
    /// Scratch buffer frames are composed into.
    buffer: Buffer,
    /// Terminal width.
    width: u16,
    /// Terminal height.
    height: u16,
    /// Frames sent to the renderer.
    frame_count: u64,
}

impl Engine {
    /// Take over the terminal with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Take over the terminal: raw mode, optional alternate screen, hidden
    /// cursor, bracketed paste.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        let (width, height) = terminal::size()?;

        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        if config.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
        }
        execute!(stdout, cursor::Hide, EnableBracketedPaste)?;

        let (input_tx, input_rx) = bounded::<InputEvent>(64);
        let (render_tx, render_rx) = bounded::<RenderCommand>(16);

        let input_actor = InputActor::spawn(input_tx, config.input_poll_timeout())?;
        let renderer_actor = RendererActor::spawn(render_rx, width, height)?;
        info!(width, height, "terminal engine started");

        Ok(Self {
            config,
            input_rx,
            render_tx,
            input_actor: Some(input_actor),
            renderer_actor: Some(renderer_actor),
            buffer: Buffer::new(width, height),
            width,
            height,
            frame_count: 0,
        })
    }

    /// Get the terminal size.
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// The configuration the engine was started with.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A surface matching the terminal size and the configured queue
    /// capacity.
    pub fn surface<C>(&self) -> Surface<C> {
        Surface::with_queue_capacity(self.width, self.height, self.config.queue_capacity)
    }

    /// Get the current frame count.
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Run the main loop until [`Surface::quit`] is called or input ends.
    ///
    /// `layout` runs on every resize, after the surface has the new size,
    /// so widgets can re-fit their panels. Keys go to
    /// [`Surface::handle_key`]; queued tasks run as they arrive.
    /// Recoverable errors from either are logged and the loop continues;
    /// any other error stops it and is returned.
    pub fn run<C, L>(&mut self, surface: &mut Surface<C>, ctx: &mut C, mut layout: L) -> Result<()>
    where
        L: FnMut(&mut Surface<C>, &mut C) -> Result<()>,
    {
        let tasks = surface.task_receiver();
        let frame = self.config.frame_duration();

        if surface.size() != (self.width, self.height) {
            surface.resize(self.width, self.height);
            layout(surface, ctx)?;
        }
        self.present(surface)?;

        while surface.is_running() {
            select! {
                recv(self.input_rx) -> event => {
                    let Ok(event) = event else {
                        debug!("input channel closed");
                        break;
                    };
                    match event {
                        InputEvent::Key(key) => settle(surface.handle_key(ctx, key).map(drop))?,
                        InputEvent::Paste(text) => {
                            surface.paste(&text);
                        }
                        InputEvent::Resize { width, height } => {
                            self.width = width;
                            self.height = height;
                            surface.resize(width, height);
                            settle(layout(surface, ctx))?;
                            let _ = self.render_tx.send(RenderCommand::Resize { width, height });
                        }
                        InputEvent::Error(message) => warn!(%message, "input error"),
                        InputEvent::Shutdown => break,
                    }
                }
                recv(tasks) -> task => {
                    if let Ok(task) = task {
                        settle(surface.run_task(ctx, task))?;
                    }
                }
                default(frame) => {}
            }
            // Deferred UI-thread posts run after everything already queued
            if surface.has_overflow() {
                while let Ok(task) = tasks.try_recv() {
                    settle(surface.run_task(ctx, task))?;
                }
                while let Some(task) = surface.take_overflow() {
                    settle(surface.run_task(ctx, task))?;
                }
            }

            let passthrough = surface.take_passthrough();
            if !passthrough.is_empty() {
                let _ = self.render_tx.send(RenderCommand::Passthrough(passthrough));
            }

            if surface.take_dirty() {
                self.present(surface)?;
            }
        }

        info!(frames = self.frame_count, "main loop finished");
        Ok(())
    }

    /// Compose the surface and hand the frame to the renderer.
    fn present<C>(&mut self, surface: &Surface<C>) -> Result<()> {
        surface.render(&mut self.buffer);
        let command = RenderCommand::Frame {
            buffer: Box::new(self.buffer.clone()),
            cursor: surface.cursor_position(),
        };
        self.render_tx.send(command).map_err(|_| {
            Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "render thread stopped"))
        })?;
        self.frame_count += 1;
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Stop actors
        if let Some(actor) = self.input_actor.take() {
            actor.join();
        }

        let _ = self.render_tx.send(RenderCommand::Shutdown);
        if let Some(actor) = self.renderer_actor.take() {
            actor.join();
        }

        // Restore terminal state
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableBracketedPaste, cursor::Show);
        if self.config.alternate_screen {
            let _ = execute!(stdout, LeaveAlternateScreen);
        }
        let _ = terminal::disable_raw_mode();
    }
}

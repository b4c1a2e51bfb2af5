//! Renderer Actor: Dedicated thread for rendering to the terminal.
//!
//! This actor owns the output side of the terminal and the last presented
//! frame. It receives composed frames from the main loop, diffs them
//! against what is on screen and flushes the result in one write.

use super::messages::RenderCommand;
use crate::buffer::diff::{render_diff, render_full, DiffState};
use crate::buffer::Buffer;
use crossbeam_channel::Receiver;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, trace};

/// Renderer actor that handles terminal output.
pub struct RendererActor {
    /// Handle to the render thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
}

/// Render statistics for debugging/profiling.
#[derive(Debug, Clone, Default)]
pub struct RenderStats {
    /// Total frames rendered.
    pub frames: u64,
    /// Total cells changed across all frames.
    pub cells_changed: u64,
    /// Total bytes written to terminal.
    pub bytes_written: u64,
    /// Average render time in microseconds.
    pub avg_render_us: u64,
    /// Last render time in microseconds.
    pub last_render_us: u64,
}

/// Internal renderer state.
struct Renderer<W: Write> {
    /// What the terminal currently shows.
    current: Buffer,
    /// Diff state for cursor/color tracking.
    diff_state: DiffState,
    /// Pre-allocated output buffer.
    output: Vec<u8>,
    /// Terminal output.
    out: W,
    /// Render statistics.
    stats: RenderStats,
    /// Whether a full redraw is needed.
    needs_full_redraw: bool,
}

impl<W: Write> Renderer<W> {
    /// Create a new renderer with the given dimensions.
    fn new(out: W, width: u16, height: u16) -> Self {
        Self {
            current: Buffer::new(width, height),
            diff_state: DiffState::new(),
            output: Vec::with_capacity(65536),
            out,
            stats: RenderStats::default(),
            needs_full_redraw: true,
        }
    }

    /// Present one frame.
    fn present(&mut self, next: &Buffer, cursor: Option<(u16, u16)>) -> io::Result<()> {
        let start = Instant::now();
        self.output.clear();

        if next.width() != self.current.width() || next.height() != self.current.height() {
            self.resize(next.width(), next.height());
        }

        if self.needs_full_redraw {
            render_full(next, &mut self.output, &mut self.diff_state);
            self.stats.cells_changed += next.len() as u64;
            self.needs_full_redraw = false;
        } else {
            let changed = render_diff(&self.current, next, &mut self.output, &mut self.diff_state);
            self.stats.cells_changed += changed as u64;
        }

        match cursor {
            Some((x, y)) => {
                let _ = write!(&mut self.output, "\x1b[{};{}H\x1b[?25h", y + 1, x + 1);
                self.diff_state.reset();
            }
            None => self.output.extend_from_slice(b"\x1b[?25l"),
        }

        // Flush to terminal in a single write
        self.out.write_all(&self.output)?;
        self.out.flush()?;

        self.current.copy_from(next);

        let elapsed = start.elapsed();
        self.stats.frames += 1;
        self.stats.bytes_written += self.output.len() as u64;
        self.stats.last_render_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        // Smoothed average
        if self.stats.avg_render_us == 0 {
            self.stats.avg_render_us = self.stats.last_render_us;
        } else {
            self.stats.avg_render_us =
                (self.stats.avg_render_us * 15 + self.stats.last_render_us) / 16;
        }

        Ok(())
    }

    /// Write bytes that bypass the diff, such as OSC 52 clipboard sequences.
    fn passthrough(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        self.stats.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Resize the presented buffer; the next frame is a full redraw.
    fn resize(&mut self, width: u16, height: u16) {
        self.current.resize(width, height);
        self.needs_full_redraw = true;
        self.diff_state.reset();
    }
}

impl RendererActor {
    /// Spawn the renderer actor thread, writing to stdout.
    pub fn spawn(receiver: Receiver<RenderCommand>, width: u16, height: u16) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("treeline-render".to_string())
            .spawn(move || {
                let mut renderer = Renderer::new(io::stdout(), width, height);
                match Self::run_loop(&receiver, &shutdown_clone, &mut renderer) {
                    Ok(()) => trace!(stats = ?renderer.stats, "render thread done"),
                    Err(e) => error!(error = %e, "render thread failed"),
                }
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the render thread to shutdown.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the render thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main render loop.
    fn run_loop<W: Write>(
        receiver: &Receiver<RenderCommand>,
        shutdown: &AtomicBool,
        renderer: &mut Renderer<W>,
    ) -> io::Result<()> {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Wait with a timeout so shutdown is noticed
            let Ok(command) = receiver.recv_timeout(Duration::from_millis(16)) else {
                continue;
            };
            match command {
                RenderCommand::Frame { buffer, cursor } => renderer.present(&buffer, cursor)?,
                RenderCommand::Resize { width, height } => renderer.resize(width, height),
                RenderCommand::Passthrough(bytes) => renderer.passthrough(&bytes)?,
                RenderCommand::Shutdown => break,
            }
        }

        Ok(())
    }
}

//! Clipboard writes through the terminal (OSC 52).
//!
//! The sequence travels with the rest of the output, so copying works over
//! SSH and needs no system clipboard libraries. Inside tmux the sequence is
//! wrapped in a DCS passthrough so it reaches the outer terminal.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

const OSC52_PREFIX: &str = "\x1b]52;c;";
const OSC52_SUFFIX: &str = "\x07";

const TMUX_PREFIX: &str = "\x1bPtmux;\x1b\x1b]52;c;";
const TMUX_SUFFIX: &str = "\x07\x1b\\";

/// Largest text accepted in one copy. Many terminals cap OSC 52 payloads
/// well below what the protocol allows.
pub const MAX_BYTES: usize = 100 * 1024;

/// Where the sequence is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Target {
    /// Wrap the sequence for tmux.
    pub tmux: bool,
}

impl Target {
    /// Detect tmux from the environment.
    pub fn detect() -> Self {
        Self {
            tmux: std::env::var_os("TMUX").is_some(),
        }
    }
}

/// Build the escape sequence that places `text` on the system clipboard.
pub fn sequence(text: &str, target: Target) -> Result<String> {
    let bytes = text.len();
    if bytes > MAX_BYTES {
        return Err(Error::ClipboardTooLarge {
            bytes,
            limit: MAX_BYTES,
        });
    }

    let payload = STANDARD.encode(text);
    Ok(if target.tmux {
        format!("{TMUX_PREFIX}{payload}{TMUX_SUFFIX}")
    } else {
        format!("{OSC52_PREFIX}{payload}{OSC52_SUFFIX}")
    })
}

//! Error type shared by the surface, the widgets and the engine.
//!
//! Errors fall in two groups. Surface failures (unknown panel, degenerate
//! geometry, closed queue, I/O) abort the operation that hit them and are
//! propagated with `?`. Form failures (a blank required field, a rejected
//! submission) are recoverable: forms report them through their error
//! callback and stay open, and the engine logs them instead of stopping.

use crate::layout::Rect;
use crate::surface::PanelId;

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The panel handle does not refer to a live panel.
    #[error("unknown panel {0:?}")]
    UnknownPanel(PanelId),

    /// A panel was given a rectangle with no area.
    #[error("panel geometry {0:?} is too small")]
    TooSmall(Rect),

    /// A required form field was blank at submission.
    #[error("field `{field}` is required")]
    Required {
        /// Name of the blank field.
        field: String,
    },

    /// A submit handler refused the submitted values.
    #[error("{0}")]
    Rejected(String),

    /// An input was added to a form that has already closed.
    #[error("form `{0}` is closed")]
    FormClosed(String),

    /// A widget was used before its panel was created.
    #[error("{0} is not shown")]
    NotShown(&'static str),

    /// Text is over the size terminals accept in one clipboard sequence.
    #[error("text too large for the clipboard ({} KiB, limit {} KiB)", .bytes / 1024, .limit / 1024)]
    ClipboardTooLarge {
        /// Size of the text in bytes.
        bytes: usize,
        /// Largest accepted size in bytes.
        limit: usize,
    },

    /// The deferred update queue has no receiver any more.
    #[error("update queue is closed")]
    QueueClosed,

    /// Content could not be serialized for display.
    #[error("failed to serialize content: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Terminal or file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Rejected`] from a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Whether the error leaves the UI in a usable state.
    ///
    /// Recoverable errors are shown to the user; everything else stops the
    /// main loop.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Required { .. } | Self::Rejected(_) | Self::ClipboardTooLarge { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

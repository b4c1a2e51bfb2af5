//! Widgets: composite views built from surface panels.
//!
//! Every widget owns [`PanelId`](crate::surface::PanelId) handles rather than
//! panels, and does its work through the [`Surface`](crate::surface::Surface):
//!
//! - [`TreeView`]: a navigable forest of [`Node`]s
//! - [`Form`]: framed input fields with submit/cancel and validation
//! - [`MainView`]: a scrollable, saveable result pane
//! - [`Scrollbar`]: a thumb panel tracking another panel's origin
//! - [`StatusLine`]: one-row messages along the bottom edge
//! - [`InfoBox`]: transient centered notices
//!
//! [`movement`] holds the cursor and paging primitives views bind to keys.
//!
//! # Example
//!
//! ```rust,ignore
//! use treeline::widget::{Form, Input};
//!
//! let form = Form::new(&mut surface, "Params", 10, 5)?
//!     .on_submit(|surface, ctx, values| run(ctx, values));
//! form.input(&mut surface, Input::new("Name", 20).required(true).focused(true))?;
//! ```

mod form;
mod info_box;
mod main_view;
pub mod movement;
mod scrollbar;
mod status_line;
mod tree;

pub use form::{footer_hint, Form, FormState, Input, Sink, Values};
pub use info_box::{fit_message, InfoBox, DEFAULT_WIDTH};
pub use main_view::{render_result, CopyFn, MainView, SaveFn};
pub use scrollbar::{thumb_geometry, thumb_height, thumb_offset, Scrollbar};
pub use status_line::StatusLine;
pub use tree::{count_nodes, node_at, render_lines, selected_path, Direction, Node, NodeRef, TreeView};

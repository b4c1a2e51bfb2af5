//! TreeView: a forest of nodes rendered as a prefixed hierarchy.
//!
//! Every node takes exactly one row, in depth-first pre-order, so a cursor
//! row maps back to a node by walking the same order:
//!
//! ```text
//! ├─Accounts          row 0   path [0]
//! │ ├─list            row 1   path [0, 0]
//! │ └─get             row 2   path [0, 1]
//! └─Billing           row 3   path [1]
//!   └─invoice         row 4   path [1, 0]
//! ```
//!
//! Leaves are drawn bold.

use crate::buffer::{Color, Modifiers, Style};
use crate::error::Result;
use crate::layout::Rect;
use crate::surface::{PanelId, Surface};
use crate::text::paint;
use std::rc::Rc;
use tracing::debug;

const BRANCH: &str = "├─";
const LAST: &str = "└─";
const PIPE: &str = "│ ";
const BLANK: &str = "  ";

/// Anything that can appear in the tree.
pub trait Node {
    /// Text shown for the node.
    fn title(&self) -> &str;

    /// Child nodes, in display order. Leaves return an empty vector.
    fn children(&self) -> Vec<&dyn Node>;
}

/// Shared handle to a root node.
pub type NodeRef = Rc<dyn Node>;

/// Cursor direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One row up.
    Up,
    /// One row down.
    Down,
}

/// Render a forest into one line per node.
pub fn render_lines(nodes: &[&dyn Node]) -> Vec<String> {
    let mut lines = Vec::new();
    push_lines(nodes, "", &mut lines);
    lines
}

fn push_lines(nodes: &[&dyn Node], prefix: &str, out: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let children = node.children();

        let title = if children.is_empty() {
            paint(node.title(), Style::new().add(Modifiers::BOLD))
        } else {
            node.title().to_string()
        };
        out.push(format!("{prefix}{}{title}", if last { LAST } else { BRANCH }));

        if !children.is_empty() {
            let nested = format!("{prefix}{}", if last { BLANK } else { PIPE });
            push_lines(&children, &nested, out);
        }
    }
}

/// Sibling-index path, root first, of the node rendered on `row`.
///
/// Empty when `row` is past the last node.
pub fn selected_path(nodes: &[&dyn Node], row: usize) -> Vec<usize> {
    let mut remaining = row;
    let mut path = find_row(nodes, &mut remaining);
    path.reverse();
    path
}

/// Walk in pre-order; collects the path leaf-first while unwinding.
fn find_row(nodes: &[&dyn Node], remaining: &mut usize) -> Vec<usize> {
    for (i, node) in nodes.iter().enumerate() {
        if *remaining == 0 {
            return vec![i];
        }
        *remaining -= 1;

        let mut path = find_row(&node.children(), remaining);
        if !path.is_empty() {
            path.push(i);
            return path;
        }
    }
    Vec::new()
}

/// Follow a root-first path down the forest.
pub fn node_at<'a>(nodes: &[&'a dyn Node], path: &[usize]) -> Option<&'a dyn Node> {
    let (first, rest) = path.split_first()?;
    let node = *nodes.get(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at(&node.children(), rest)
    }
}

/// Total number of nodes in the forest.
pub fn count_nodes(nodes: &[&dyn Node]) -> usize {
    nodes
        .iter()
        .map(|node| 1 + count_nodes(&node.children()))
        .sum()
}

/// Navigation tree bound to a sidebar panel.
#[derive(Default)]
pub struct TreeView {
    nodes: Vec<NodeRef>,
    panel: Option<PanelId>,
    width: u16,
}

impl std::fmt::Debug for TreeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeView")
            .field("roots", &self.nodes.len())
            .field("panel", &self.panel)
            .field("width", &self.width)
            .finish()
    }
}

impl TreeView {
    /// A tree occupying the leftmost `width` columns.
    pub fn new(width: u16) -> Self {
        Self {
            nodes: Vec::new(),
            panel: None,
            width,
        }
    }

    /// The current panel, if the tree is shown.
    pub const fn panel(&self) -> Option<PanelId> {
        self.panel
    }

    /// The root nodes last passed to [`TreeView::set_view`].
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    fn roots(&self) -> Vec<&dyn Node> {
        self.nodes.iter().map(|node| &**node).collect()
    }

    /// (Re)build the tree panel for `nodes` and give it focus.
    ///
    /// Any previous panel is deleted first, so the returned id is always
    /// new and the cursor starts on the first row.
    pub fn set_view<C>(
        &mut self,
        surface: &mut Surface<C>,
        title: &str,
        nodes: Vec<NodeRef>,
    ) -> Result<PanelId> {
        self.close(surface);

        let (_, height) = surface.size();
        let rect = Rect::from_corners(0, 0, self.width.saturating_sub(1), height.saturating_sub(2));
        let id = surface.create_panel(rect)?;

        self.nodes = nodes;
        let lines = render_lines(&self.roots());

        let panel = surface.panel_mut(id)?;
        panel.title = title.to_string();
        panel.frame = true;
        panel.highlight = true;
        panel.hide_cursor = true;
        panel.selected_style = Style::new().fg(Color::BLACK).bg(Color::GREEN);
        if !lines.is_empty() {
            panel.write(&lines.join("\n"));
        }

        surface.set_focus(id)?;
        self.panel = Some(id);
        debug!(?id, rows = lines.len(), "tree view built");
        Ok(id)
    }

    /// Resize the panel to the current screen height, keeping its content.
    pub fn layout<C>(&self, surface: &mut Surface<C>) -> Result<()> {
        let Some(id) = self.panel else {
            return Ok(());
        };
        let (_, height) = surface.size();
        surface.set_rect(
            id,
            Rect::from_corners(0, 0, self.width.saturating_sub(1), height.saturating_sub(2)),
        )
    }

    /// Give the tree focus.
    pub fn set_current<C>(&self, surface: &mut Surface<C>) -> Result<()> {
        match self.panel {
            Some(id) => surface.set_focus(id),
            None => Ok(()),
        }
    }

    /// Delete the tree panel.
    pub fn close<C>(&mut self, surface: &mut Surface<C>) {
        if let Some(id) = self.panel.take() {
            surface.delete_panel(id);
        }
    }

    /// Path of the node under the cursor, root first.
    pub fn selected<C>(&self, surface: &Surface<C>) -> Vec<usize> {
        let Some(panel) = self.panel.and_then(|id| surface.panel(id).ok()) else {
            return Vec::new();
        };
        selected_path(&self.roots(), panel.cursor_row())
    }

    /// The node under the cursor.
    pub fn selected_node<C>(&self, surface: &Surface<C>) -> Option<&dyn Node> {
        node_at(&self.roots(), &self.selected(surface))
    }

    /// Move the cursor one row, wrapping between the first and last rows.
    pub fn move_cursor<C>(&self, surface: &mut Surface<C>, direction: Direction) -> Result<()> {
        let Some(id) = self.panel else {
            return Ok(());
        };
        let panel = surface.panel_mut(id)?;
        let rows = panel.line_count();
        if rows == 0 {
            return Ok(());
        }
        let row = panel.cursor_row().min(rows - 1);
        let next = match direction {
            Direction::Up if row == 0 => rows - 1,
            Direction::Up => row - 1,
            Direction::Down if row + 1 >= rows => 0,
            Direction::Down => row + 1,
        };
        panel.set_position(0, next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip_ansi;

    struct Item {
        name: String,
        children: Vec<Item>,
    }

    fn leaf(name: &str) -> Item {
        Item {
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    fn group(name: &str, children: Vec<Item>) -> Item {
        Item {
            name: name.to_string(),
            children,
        }
    }

    impl Node for Item {
        fn title(&self) -> &str {
            &self.name
        }

        fn children(&self) -> Vec<&dyn Node> {
            self.children.iter().map(|c| c as &dyn Node).collect()
        }
    }

    fn pre_order<'a>(nodes: &[&'a dyn Node], out: &mut Vec<&'a str>) {
        for node in nodes {
            out.push(node.title());
            pre_order(&node.children(), out);
        }
    }

    fn sample() -> Vec<Item> {
        vec![
            group("A", vec![leaf("x"), leaf("y")]),
            group("B", vec![]),
        ]
    }

    fn deep() -> Vec<Item> {
        vec![
            group(
                "root",
                vec![
                    group("a", vec![leaf("a1"), group("a2", vec![leaf("a2i")])]),
                    leaf("b"),
                ],
            ),
            leaf("solo"),
            group("last", vec![group("l1", vec![leaf("l1a"), leaf("l1b")])]),
        ]
    }

    fn refs(items: &[Item]) -> Vec<&dyn Node> {
        items.iter().map(|i| i as &dyn Node).collect()
    }

    #[test]
    fn test_two_groups_render_four_lines() {
        let items = sample();
        let lines: Vec<String> = render_lines(&refs(&items))
            .iter()
            .map(|l| strip_ansi(l).into_owned())
            .collect();
        assert_eq!(lines, vec!["├─A", "│ ├─x", "│ └─y", "└─B"]);
    }

    #[test]
    fn test_leaves_are_bold() {
        let items = sample();
        let lines = render_lines(&refs(&items));
        assert!(lines[1].contains("\x1b[1m"));
        assert!(!lines[0].contains("\x1b[1m"));
    }

    #[test]
    fn test_selected_path_scenario() {
        let items = sample();
        let roots = refs(&items);
        assert_eq!(selected_path(&roots, 0), vec![0]);
        assert_eq!(selected_path(&roots, 2), vec![0, 1]);
        assert_eq!(selected_path(&roots, 3), vec![1]);
        assert!(selected_path(&roots, 4).is_empty());
    }

    #[test]
    fn test_every_row_maps_to_its_pre_order_node() {
        let items = deep();
        let roots = refs(&items);
        let mut order = Vec::new();
        pre_order(&roots, &mut order);

        let n = count_nodes(&roots);
        assert_eq!(n, order.len());
        assert_eq!(render_lines(&roots).len(), n);
        for (row, title) in order.iter().enumerate() {
            let path = selected_path(&roots, row);
            let node = node_at(&roots, &path).expect("path resolves");
            assert_eq!(node.title(), *title, "row {row}");
        }
    }

    #[test]
    fn test_nested_prefixes() {
        let items = deep();
        let lines: Vec<String> = render_lines(&refs(&items))
            .iter()
            .map(|l| strip_ansi(l).into_owned())
            .collect();
        assert_eq!(lines[4], "│ │   └─a2i");
        assert_eq!(lines[9], "    ├─l1a");
    }

    #[test]
    fn test_set_view_focuses_and_replaces_panel() {
        let items: Vec<NodeRef> = vec![Rc::new(group("A", vec![leaf("x")]))];
        let mut surface: Surface<()> = Surface::new(80, 24);
        let mut tree = TreeView::new(30);

        let first = tree.set_view(&mut surface, "Groups", items.clone()).unwrap();
        assert_eq!(surface.focused(), Some(first));
        let panel = surface.panel(first).unwrap();
        assert_eq!(panel.rect(), Rect::new(0, 0, 30, 23));
        assert_eq!(panel.line_count(), 2);

        let second = tree.set_view(&mut surface, "Groups", items).unwrap();
        assert_ne!(first, second);
        assert!(!surface.contains(first));
        assert_eq!(surface.panel_count(), 1);
    }

    #[test]
    fn test_move_cursor_wraps() {
        let items: Vec<NodeRef> = sample().into_iter().map(|i| Rc::new(i) as NodeRef).collect();
        let mut surface: Surface<()> = Surface::new(80, 24);
        let mut tree = TreeView::new(30);
        let id = tree.set_view(&mut surface, "Groups", items).unwrap();
        let rows = surface.panel(id).unwrap().line_count();
        assert!(rows > 1);

        tree.move_cursor(&mut surface, Direction::Up).unwrap();
        assert_eq!(surface.panel(id).unwrap().cursor_row(), rows - 1);
        assert_eq!(tree.selected(&surface), vec![1]);

        // A full lap in either direction returns to the starting row
        for start in 0..rows {
            for direction in [Direction::Down, Direction::Up] {
                surface.panel_mut(id).unwrap().set_position(0, start);
                for _ in 0..rows {
                    tree.move_cursor(&mut surface, direction).unwrap();
                }
                assert_eq!(surface.panel(id).unwrap().cursor_row(), start);
            }
        }

        surface.panel_mut(id).unwrap().set_position(0, rows - 1);
        tree.move_cursor(&mut surface, Direction::Down).unwrap();
        assert_eq!(surface.panel(id).unwrap().cursor_row(), 0);
        tree.move_cursor(&mut surface, Direction::Down).unwrap();
        tree.move_cursor(&mut surface, Direction::Down).unwrap();
        assert_eq!(tree.selected_node(&surface).map(Node::title), Some("y"));
    }

    #[test]
    fn test_move_cursor_wraps_when_scrolled() {
        let items: Vec<NodeRef> = (0..30)
            .map(|i| Rc::new(leaf(&format!("op{i}"))) as NodeRef)
            .collect();
        let mut surface: Surface<()> = Surface::new(80, 10);
        let mut tree = TreeView::new(30);
        let id = tree.set_view(&mut surface, "Ops", items).unwrap();

        for start in [0, 7, 15, 29] {
            surface.panel_mut(id).unwrap().set_position(0, start);
            for _ in 0..30 {
                tree.move_cursor(&mut surface, Direction::Down).unwrap();
            }
            assert_eq!(surface.panel(id).unwrap().cursor_row(), start);
            assert_eq!(tree.selected(&surface), vec![start]);
        }
    }

    #[test]
    fn test_cursor_scrolls_in_short_panel() {
        let items: Vec<NodeRef> = (0..40)
            .map(|i| Rc::new(leaf(&format!("op{i}"))) as NodeRef)
            .collect();
        let mut surface: Surface<()> = Surface::new(80, 12);
        let mut tree = TreeView::new(30);
        let id = tree.set_view(&mut surface, "Ops", items).unwrap();

        tree.move_cursor(&mut surface, Direction::Up).unwrap();
        assert_eq!(tree.selected(&surface), vec![39]);
        let panel = surface.panel(id).unwrap();
        assert!(panel.origin().1 > 0);
        assert_eq!(panel.cursor_row(), 39);
    }

    #[test]
    fn test_empty_tree() {
        let mut surface: Surface<()> = Surface::new(80, 24);
        let mut tree = TreeView::new(30);
        let id = tree.set_view(&mut surface, "Empty", Vec::new()).unwrap();
        assert_eq!(surface.panel(id).unwrap().line_count(), 0);
        tree.move_cursor(&mut surface, Direction::Down).unwrap();
        assert!(tree.selected(&surface).is_empty());
        assert!(tree.selected_node(&surface).is_none());
    }
}

//! MainView: the scrollable "Response" panel and its scrollbar.
//!
//! Content is any `Result<T, E>` where `T: Serialize`: values are shown as
//! pretty-printed JSON, errors as their message. Every key that moves the
//! cursor also re-derives the scrollbar. Ctrl+S saves the content to a
//! file and Ctrl+X copies it to the system clipboard over OSC 52.

use crate::actor::{Key, KeyCode};
use crate::clipboard::{self, Target};
use crate::error::{Error, Result};
use crate::layout::Rect;
use crate::surface::{Panel, PanelId, Surface};
use crate::widget::form::{Form, Input};
use crate::widget::movement;
use crate::widget::scrollbar::Scrollbar;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

const TITLE: &str = "Response";
const FILE_NAME: &str = "File Name";

/// Receives the absolute path of a saved response, or the failure.
pub type SaveFn<C> = dyn Fn(&mut Surface<C>, &mut C, Result<PathBuf>) -> Result<()>;

/// Receives the number of bytes copied, or the failure.
pub type CopyFn<C> = dyn Fn(&mut Surface<C>, &mut C, Result<usize>) -> Result<()>;

/// Render a value as JSON indented by one space, or an error as its message.
///
/// A value that fails to serialize shows the serialization error instead.
pub fn render_result<T: Serialize, E: Display>(result: &std::result::Result<T, E>) -> String {
    match result {
        Ok(value) => to_pretty_json(value).unwrap_or_else(|err| Error::from(err).to_string()),
        Err(err) => err.to_string(),
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Write the plain text of a panel to `path`, creating or truncating it.
fn save_panel<C>(surface: &Surface<C>, id: PanelId, path: &Path) -> Result<()> {
    let text = surface.panel(id)?.buffer();
    std::fs::write(path, text)?;
    Ok(())
}

/// Queue the clipboard sequence for a panel's plain text.
fn copy_panel<C>(surface: &mut Surface<C>, id: PanelId, target: Target) -> Result<usize> {
    let text = surface.panel(id)?.buffer();
    let sequence = clipboard::sequence(&text, target)?;
    surface.write_passthrough(sequence.as_bytes());
    Ok(text.len())
}

fn restore_focus<C>(surface: &mut Surface<C>, previous: Option<PanelId>) -> Result<()> {
    match previous.filter(|id| surface.contains(*id)) {
        Some(id) => surface.set_focus(id),
        None => Ok(()),
    }
}

/// The content panel to the right of the sidebar.
#[derive(Debug, Default)]
pub struct MainView {
    panel: Option<PanelId>,
    scrollbar: Option<Scrollbar>,
    left: u16,
}

impl MainView {
    /// A view whose left border sits at column `left`.
    pub fn new(left: u16) -> Self {
        Self {
            panel: None,
            scrollbar: None,
            left,
        }
    }

    /// The content panel, once [`MainView::set_view`] ran.
    pub const fn panel(&self) -> Option<PanelId> {
        self.panel
    }

    /// The scrollbar following the content panel.
    pub const fn scrollbar(&self) -> Option<&Scrollbar> {
        self.scrollbar.as_ref()
    }

    fn bounds<C>(&self, surface: &Surface<C>) -> Rect {
        let (width, height) = surface.size();
        Rect::from_corners(self.left, 0, width.saturating_sub(1), height.saturating_sub(2))
    }

    fn content(&self) -> Result<(PanelId, &Scrollbar)> {
        match (self.panel, self.scrollbar.as_ref()) {
            (Some(id), Some(scrollbar)) => Ok((id, scrollbar)),
            _ => Err(Error::NotShown("main view")),
        }
    }

    /// Create the panel, or fit it to the current screen size.
    pub fn set_view<C>(&mut self, surface: &mut Surface<C>) -> Result<PanelId> {
        let rect = self.bounds(surface);
        if let (Some(id), Some(scrollbar)) = (self.panel, &self.scrollbar) {
            if surface.contains(id) {
                surface.set_rect(id, rect)?;
                scrollbar.redraw(surface)?;
                return Ok(id);
            }
        }

        let id = surface.create_panel(rect)?;
        let panel = surface.panel_mut(id)?;
        panel.frame = true;
        panel.wrap = true;
        panel.title = TITLE.to_string();
        self.panel = Some(id);
        self.scrollbar = Some(Scrollbar::new(id));
        debug!(?id, ?rect, "main view built");
        Ok(id)
    }

    /// Give the content panel focus.
    pub fn set_current<C>(&self, surface: &mut Surface<C>) -> Result<()> {
        let (id, _) = self.content()?;
        surface.set_focus(id)
    }

    /// Replace the content with the rendering of `result`.
    ///
    /// The title names the source, the cursor and origin return to the top
    /// and the scrollbar is re-derived.
    pub fn load_content<C, T, E>(
        &self,
        surface: &mut Surface<C>,
        name: &str,
        result: &std::result::Result<T, E>,
    ) -> Result<()>
    where
        T: Serialize,
        E: Display,
    {
        let (id, scrollbar) = self.content()?;
        let text = render_result(result);

        let panel = surface.panel_mut(id)?;
        panel.title = format!("{TITLE}({name})");
        panel.clear();
        panel.set_cursor(0, 0);
        panel.set_origin(0, 0);
        panel.write(&text);
        debug!(name, lines = panel.line_count(), ok = result.is_ok(), "content loaded");

        scrollbar.redraw(surface)
    }

    /// Queue the current content for the system clipboard.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_content<C>(&self, surface: &mut Surface<C>) -> Result<usize> {
        let (id, _) = self.content()?;
        copy_panel(surface, id, Target::detect())
    }

    /// Write the current content to `path`.
    pub fn save_content<C>(&self, surface: &Surface<C>, path: impl AsRef<Path>) -> Result<()> {
        let (id, _) = self.content()?;
        save_panel(surface, id, path.as_ref())
    }

    /// Bind navigation keys on the content panel and Ctrl+S globally.
    ///
    /// Ctrl+S opens a "Save Response" form; `on_save` receives the absolute
    /// path written, or the error. Focus returns to wherever it was when the
    /// form opened.
    pub fn set_keybindings<C, F>(&self, surface: &mut Surface<C>, on_save: F) -> Result<()>
    where
        C: 'static,
        F: Fn(&mut Surface<C>, &mut C, Result<PathBuf>) -> Result<()> + 'static,
    {
        let (id, scrollbar) = self.content()?;
        let moves: [(Key, fn(&mut Panel)); 8] = [
            (Key::new(KeyCode::Down), movement::cursor_down),
            (Key::new(KeyCode::Up), movement::cursor_up),
            (Key::new(KeyCode::Left), movement::cursor_left),
            (Key::new(KeyCode::Right), movement::cursor_right),
            (Key::new(KeyCode::PageDown), movement::page_down),
            (Key::new(KeyCode::PageUp), movement::page_up),
            (Key::ctrl('h'), movement::home),
            (Key::ctrl('e'), movement::end),
        ];
        for (key, step) in moves {
            let scrollbar = scrollbar.clone();
            surface.bind(Some(id), key, move |surface, _, _| {
                step(surface.panel_mut(id)?);
                scrollbar.redraw(surface)
            })?;
        }

        let on_save: Rc<SaveFn<C>> = Rc::new(on_save);
        surface.bind(None, Key::ctrl('s'), move |surface, _, from| {
            open_save_dialog(surface, id, from, Rc::clone(&on_save))
        })
    }

    /// Bind Ctrl+X globally to copy the content to the clipboard.
    ///
    /// `on_copy` receives the number of bytes copied, or the error (text
    /// over [`clipboard::MAX_BYTES`] is refused).
    pub fn set_copy_keybinding<C, F>(&self, surface: &mut Surface<C>, on_copy: F) -> Result<()>
    where
        C: 'static,
        F: Fn(&mut Surface<C>, &mut C, Result<usize>) -> Result<()> + 'static,
    {
        let (id, _) = self.content()?;
        let on_copy: Rc<CopyFn<C>> = Rc::new(on_copy);
        let target = Target::detect();
        surface.bind(None, Key::ctrl('x'), move |surface, ctx, _| {
            let copied = copy_panel(surface, id, target);
            if let Ok(bytes) = &copied {
                info!(bytes, "response copied");
            }
            on_copy(surface, ctx, copied)
        })
    }
}

fn open_save_dialog<C: 'static>(
    surface: &mut Surface<C>,
    content: PanelId,
    previous: Option<PanelId>,
    on_save: Rc<SaveFn<C>>,
) -> Result<()> {
    let (width, height) = surface.size();
    let form = Form::new(surface, "Save Response", (width / 2).saturating_sub(20), height / 2)?
        .on_submit(move |surface, ctx, values| {
            let name = values.get(FILE_NAME).map_or("", String::as_str);
            if !name.is_empty() {
                let saved = save_panel(surface, content, Path::new(name))
                    .and_then(|()| std::path::absolute(name).map_err(Error::from));
                if let Ok(path) = &saved {
                    info!(path = %path.display(), "response saved");
                }
                on_save(surface, ctx, saved)?;
            }
            restore_focus(surface, previous)
        })
        .on_cancel(move |surface, _| restore_focus(surface, previous));
    form.input(surface, Input::new(FILE_NAME, 40).focused(true))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Saved = Vec<std::result::Result<PathBuf, String>>;

    fn view(surface: &mut Surface<Saved>) -> MainView {
        let mut view = MainView::new(30);
        view.set_view(surface).unwrap();
        view
    }

    #[test]
    fn test_render_result() {
        let ok: std::result::Result<_, String> = Ok(json!({"a": 1, "b": [true]}));
        assert_eq!(render_result(&ok), "{\n \"a\": 1,\n \"b\": [\n  true\n ]\n}");
        let err: std::result::Result<(), _> = Err("not found");
        assert_eq!(render_result(&err), "not found");
    }

    #[test]
    fn test_set_view_geometry() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let panel = s.panel(view.panel().unwrap()).unwrap();
        assert_eq!(panel.rect(), Rect::new(30, 0, 50, 23));
        assert_eq!(panel.title, "Response");
        assert!(panel.wrap && panel.frame);
    }

    #[test]
    fn test_set_view_relayouts_on_resize() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let mut view = view(&mut s);
        let id = view.panel().unwrap();
        s.resize(100, 30);
        assert_eq!(view.set_view(&mut s).unwrap(), id);
        assert_eq!(s.panel(id).unwrap().rect(), Rect::new(30, 0, 70, 29));
    }

    #[test]
    fn test_load_content_resets_view() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let id = view.panel().unwrap();
        s.panel_mut(id).unwrap().set_position(0, 0);

        let ok: std::result::Result<_, String> = Ok(json!({"name": "x"}));
        view.load_content(&mut s, "get", &ok).unwrap();
        let panel = s.panel(id).unwrap();
        assert_eq!(panel.title, "Response(get)");
        assert_eq!(panel.lines(), vec!["{", " \"name\": \"x\"", "}"]);
        assert_eq!(panel.cursor(), (0, 0));
        assert_eq!(panel.origin(), (0, 0));

        let err: std::result::Result<(), _> = Err("permission denied");
        view.load_content(&mut s, "list", &err).unwrap();
        assert_eq!(s.panel(id).unwrap().lines(), vec!["permission denied"]);
    }

    #[test]
    fn test_long_content_shows_scrollbar() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let items: Vec<u32> = (0..200).collect();
        view.load_content(&mut s, "big", &Ok::<_, String>(items)).unwrap();
        assert!(view.scrollbar().unwrap().thumb().is_some());

        view.load_content(&mut s, "small", &Ok::<_, String>(1)).unwrap();
        assert!(view.scrollbar().unwrap().thumb().is_none());
    }

    #[test]
    fn test_save_content_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "stale stale stale stale").unwrap();

        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        view.load_content(&mut s, "get", &Ok::<_, String>(json!([1])))
            .unwrap();
        view.save_content(&s, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[\n 1\n]\n");
    }

    #[test]
    fn test_page_down_moves_thumb() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let id = view.panel().unwrap();
        view.set_keybindings(&mut s, |_, _, _| Ok(())).unwrap();
        let items: Vec<u32> = (0..200).collect();
        view.load_content(&mut s, "big", &Ok::<_, String>(items)).unwrap();
        s.set_focus(id).unwrap();

        let thumb = view.scrollbar().unwrap().thumb().unwrap();
        let before = s.panel(thumb).unwrap().rect().y;
        s.handle_key(&mut Vec::new(), Key::new(KeyCode::PageDown)).unwrap();
        s.handle_key(&mut Vec::new(), Key::new(KeyCode::PageDown)).unwrap();
        assert_eq!(s.panel(id).unwrap().origin().1, 42);
        assert!(s.panel(thumb).unwrap().rect().y > before);

        s.handle_key(&mut Vec::new(), Key::ctrl('h')).unwrap();
        assert_eq!(s.panel(thumb).unwrap().rect().y, before);
    }

    #[test]
    fn test_ctrl_s_saves_and_restores_focus() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");

        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let id = view.panel().unwrap();
        view.set_keybindings(&mut s, |_, saved: &mut Saved, result| {
            saved.push(result.map_err(|err| err.to_string()));
            Ok(())
        })
        .unwrap();
        view.load_content(&mut s, "get", &Ok::<_, String>(json!({"k": "v"})))
            .unwrap();
        s.set_focus(id).unwrap();
        let panels = s.panel_count();

        let mut saved = Saved::new();
        s.handle_key(&mut saved, Key::ctrl('s')).unwrap();
        assert_eq!(s.panel_count(), panels + 2);
        assert_ne!(s.focused(), Some(id));
        assert!(s.paste(&path.to_string_lossy()));

        s.handle_key(&mut saved, Key::new(KeyCode::Enter)).unwrap();
        assert_eq!(saved, vec![Ok(path.clone())]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\n \"k\": \"v\"\n}\n");
        assert_eq!(s.focused(), Some(id));
        assert_eq!(s.panel_count(), panels);
    }

    #[test]
    fn test_ctrl_x_copies_content() {
        let mut s: Surface<Vec<std::result::Result<usize, String>>> = Surface::new(80, 24);
        let mut view = MainView::new(30);
        view.set_view(&mut s).unwrap();
        view.set_copy_keybinding(&mut s, |_, copied: &mut Vec<_>, result| {
            copied.push(result.map_err(|err| err.to_string()));
            Ok(())
        })
        .unwrap();
        view.load_content(&mut s, "get", &Err::<(), _>("hi")).unwrap();

        let mut copied = Vec::new();
        assert!(s.handle_key(&mut copied, Key::ctrl('x')).unwrap());
        assert_eq!(copied, vec![Ok(3)]);

        let expected = clipboard::sequence("hi\n", Target::detect()).unwrap();
        assert_eq!(s.take_passthrough(), expected.into_bytes());
        assert!(s.take_passthrough().is_empty());
    }

    #[test]
    fn test_copy_refuses_oversized_content() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let big = "x".repeat(clipboard::MAX_BYTES + 1);
        view.load_content(&mut s, "big", &Err::<(), _>(big)).unwrap();

        let err = view.copy_content(&mut s).unwrap_err();
        assert!(matches!(err, Error::ClipboardTooLarge { .. }));
        assert!(err.is_recoverable());
        assert!(s.take_passthrough().is_empty());
    }

    #[test]
    fn test_copy_before_set_view_fails() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        assert!(matches!(
            MainView::new(30).copy_content(&mut s),
            Err(Error::NotShown(_))
        ));
    }

    #[test]
    fn test_ctrl_s_cancel_restores_focus() {
        let mut s: Surface<Saved> = Surface::new(80, 24);
        let view = view(&mut s);
        let id = view.panel().unwrap();
        view.set_keybindings(&mut s, |_, _, _| Ok(())).unwrap();
        s.set_focus(id).unwrap();

        let mut saved = Saved::new();
        s.handle_key(&mut saved, Key::ctrl('s')).unwrap();
        s.handle_key(&mut saved, Key::new(KeyCode::Esc)).unwrap();
        assert_eq!(s.focused(), Some(id));
        assert!(saved.is_empty());
    }
}

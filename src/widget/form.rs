//! Form: labeled input fields stacked inside an auto-sized container.
//!
//! ```text
//! (x0,y0) ┌Login──────────────────┐
//!         │ ┌User──────────────┐  │
//!         │ │alice             │  │
//!         │ └──────────────────┘  │
//!         │ ┌Password──────────┐  │
//!         │ │*****             │  │
//!         │ └──────────────────┘  │
//!         │TAB:Switch Input ENTER:│
//!         └───────────────────────┘ (x1,y1)
//! ```
//!
//! Each field is its own editable panel. Esc cancels, Tab moves to the next
//! field and Enter submits, whichever field has focus. A form is single-use:
//! once it closes, its panels and their key bindings are gone.

use crate::actor::{Key, KeyCode};
use crate::buffer::{Color, Style};
use crate::error::{Error, Result};
use crate::layout::Rect;
use crate::surface::{PanelId, Surface};
use crate::text::{paint, visible_width};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Submitted values by field name.
pub type Values = BTreeMap<String, String>;

type SubmitFn<C> = Box<dyn FnMut(&mut Surface<C>, &mut C, &Values) -> Result<()>>;
type CancelFn<C> = Box<dyn FnMut(&mut Surface<C>, &mut C) -> Result<()>>;
type ErrorFn<C> = Box<dyn FnMut(&mut Surface<C>, &mut C, &Error) -> Result<()>>;

/// Shared string a field writes its value into on submit.
#[derive(Debug, Clone, Default)]
pub struct Sink(Rc<RefCell<String>>);

impl Sink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last value written.
    pub fn get(&self) -> String {
        self.0.borrow().clone()
    }

    /// Overwrite the value.
    pub fn set(&self, value: impl Into<String>) {
        *self.0.borrow_mut() = value.into();
    }
}

/// Field descriptor.
#[derive(Debug, Clone)]
pub struct Input {
    name: String,
    cols: u16,
    rows: u16,
    required: bool,
    mask: Option<char>,
    focused: bool,
    sink: Option<Sink>,
}

impl Input {
    /// A single-row field `cols` wide.
    pub fn new(name: impl Into<String>, cols: u16) -> Self {
        Self {
            name: name.into(),
            cols,
            rows: 1,
            required: false,
            mask: None,
            focused: false,
            sink: None,
        }
    }

    /// Number of text rows; multi-row fields soft-wrap.
    #[must_use]
    pub fn rows(mut self, rows: u16) -> Self {
        self.rows = rows.max(1);
        self
    }

    /// Refuse submission while the field is blank.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Display every character as `mask`.
    #[must_use]
    pub const fn mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Give the field focus when it is added.
    #[must_use]
    pub const fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Write the trimmed value into `sink` on submit.
    #[must_use]
    pub fn bind(mut self, sink: &Sink) -> Self {
        self.sink = Some(sink.clone());
        self
    }

    /// Field name, also used as the panel title and the key in [`Values`].
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Lifecycle of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    /// No field added yet.
    Building,
    /// Accepting input.
    Active,
    /// Submit handler running.
    Submitted,
    /// Cancel handler running.
    Cancelled,
    /// Panels deleted; the form is spent.
    Closed,
}

struct Field {
    input: Input,
    panel: PanelId,
}

struct Inner<C> {
    title: String,
    x0: u16,
    y0: u16,
    x1: u16,
    y1: u16,
    container: PanelId,
    fields: Vec<Field>,
    state: FormState,
    on_submit: Option<SubmitFn<C>>,
    on_cancel: Option<CancelFn<C>>,
    on_error: Option<ErrorFn<C>>,
}

/// An input form. Clones share the same form.
pub struct Form<C> {
    inner: Rc<RefCell<Inner<C>>>,
}

impl<C> Clone for Form<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for Form<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Form")
            .field("title", &inner.title)
            .field("state", &inner.state)
            .field("fields", &inner.fields.len())
            .finish_non_exhaustive()
    }
}

/// Key hint shown on the last row of the container.
pub fn footer_hint(fields: usize) -> String {
    let key = |name: &str| paint(name, Style::new().fg(Color::CYAN));
    let mut hint = String::new();
    if fields > 1 {
        hint.push_str(&format!("{}:Switch Input ", key("TAB")));
    }
    hint.push_str(&format!("{}:Submit {}:Cancel", key("ENTER"), key("ESC")));
    hint
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

impl<C: 'static> Form<C> {
    /// Create the container panel with its top-left corner at `(x0, y0)`.
    pub fn new(surface: &mut Surface<C>, title: &str, x0: u16, y0: u16) -> Result<Self> {
        let x1 = x0.saturating_add(clamp_u16(visible_width(title))).saturating_add(2);
        let y1 = y0.saturating_add(1);
        let container = surface.create_panel(Rect::from_corners(x0, y0, x1, y1))?;
        let panel = surface.panel_mut(container)?;
        panel.frame = true;
        panel.title = title.to_string();

        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                title: title.to_string(),
                x0,
                y0,
                x1,
                y1,
                container,
                fields: Vec::new(),
                state: FormState::Building,
                on_submit: None,
                on_cancel: None,
                on_error: None,
            })),
        })
    }

    /// Called with the trimmed values once every required field is filled.
    ///
    /// Returning an error keeps the form open.
    #[must_use]
    pub fn on_submit<F>(self, callback: F) -> Self
    where
        F: FnMut(&mut Surface<C>, &mut C, &Values) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().on_submit = Some(Box::new(callback));
        self
    }

    /// Called after the form closed through Esc.
    #[must_use]
    pub fn on_cancel<F>(self, callback: F) -> Self
    where
        F: FnMut(&mut Surface<C>, &mut C) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().on_cancel = Some(Box::new(callback));
        self
    }

    /// Called for each validation failure and for recoverable submit errors.
    #[must_use]
    pub fn on_error<F>(self, callback: F) -> Self
    where
        F: FnMut(&mut Surface<C>, &mut C, &Error) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().on_error = Some(Box::new(callback));
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> FormState {
        self.inner.borrow().state
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.inner.borrow().fields.len()
    }

    /// Whether no field has been added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The container panel.
    pub fn container(&self) -> PanelId {
        self.inner.borrow().container
    }

    /// Panel of the field called `name`.
    pub fn field_panel(&self, name: &str) -> Option<PanelId> {
        self.inner
            .borrow()
            .fields
            .iter()
            .find(|field| field.input.name == name)
            .map(|field| field.panel)
    }

    fn is_open(&self) -> bool {
        matches!(self.state(), FormState::Building | FormState::Active)
    }

    /// Append a field below the previous one and grow the container.
    pub fn input(&self, surface: &mut Surface<C>, input: Input) -> Result<PanelId> {
        if !self.is_open() {
            return Err(Error::FormClosed(self.inner.borrow().title.clone()));
        }

        let (x0, y1) = {
            let inner = self.inner.borrow();
            (inner.x0, inner.y1)
        };
        let rect = Rect::from_corners(
            x0.saturating_add(2),
            y1,
            x0.saturating_add(2).saturating_add(input.cols),
            y1.saturating_add(input.rows).saturating_add(1),
        );
        let id = surface.create_panel(rect)?;
        let panel = surface.panel_mut(id)?;
        panel.title = input.name.clone();
        panel.frame = true;
        panel.wrap = true;
        panel.editable = true;
        panel.mask = input.mask;

        let form = self.clone();
        surface.bind(Some(id), Key::new(KeyCode::Esc), move |surface, ctx, _| {
            form.cancel(surface, ctx)
        })?;
        let form = self.clone();
        surface.bind(Some(id), Key::new(KeyCode::Tab), move |surface, _, from| {
            form.focus_next(surface, from)
        })?;
        let form = self.clone();
        surface.bind(Some(id), Key::new(KeyCode::Enter), move |surface, ctx, _| {
            form.submit(surface, ctx)
        })?;

        if input.focused {
            surface.set_focus(id)?;
        }

        let (container, bounds) = {
            let mut inner = self.inner.borrow_mut();
            inner.y1 = inner.y1.saturating_add(input.rows).saturating_add(3);
            if input.cols >= inner.x1 - inner.x0 {
                inner.x1 = inner.x0.saturating_add(input.cols).saturating_add(4);
            }
            debug!(form = %inner.title, field = %input.name, ?rect, "field added");
            inner.fields.push(Field { input, panel: id });
            inner.state = FormState::Active;
            (
                inner.container,
                Rect::from_corners(inner.x0, inner.y0, inner.x1, inner.y1),
            )
        };
        surface.set_rect(container, bounds)?;
        self.render_footer(surface)?;
        Ok(id)
    }

    fn render_footer(&self, surface: &mut Surface<C>) -> Result<()> {
        let (container, fields) = {
            let inner = self.inner.borrow();
            (inner.container, inner.fields.len())
        };
        let panel = surface.panel_mut(container)?;
        let (width, height) = panel.size();
        panel.clear();
        if height == 0 {
            return Ok(());
        }

        let hint = footer_hint(fields);
        let pad = usize::from(width).saturating_sub(visible_width(&hint)) / 2;
        let rows = "\n".repeat(usize::from(height) - 1);
        panel.write(&format!("{rows}{}{hint}", " ".repeat(pad)));
        Ok(())
    }

    /// Focus the field after `from`, wrapping to the first.
    ///
    /// Falls back to the surface focus, then to the first field, when
    /// `from` is not one of the form's fields.
    pub fn focus_next(&self, surface: &mut Surface<C>, from: Option<PanelId>) -> Result<()> {
        let next = {
            let inner = self.inner.borrow();
            if inner.fields.is_empty() {
                return Ok(());
            }
            let current = from
                .or_else(|| surface.focused())
                .and_then(|id| inner.fields.iter().position(|field| field.panel == id));
            let index = current.map_or(0, |i| (i + 1) % inner.fields.len());
            inner.fields[index].panel
        };
        surface.set_focus(next)
    }

    /// Validate, publish the values and close.
    ///
    /// Validation and recoverable submit failures go to `on_error` and leave
    /// the form open; without `on_error` they are returned.
    pub fn submit(&self, surface: &mut Surface<C>, ctx: &mut C) -> Result<()> {
        if self.state() != FormState::Active {
            return Ok(());
        }

        let mut values = Values::new();
        let mut missing = Vec::new();
        let mut sinks = Vec::new();
        for field in &self.inner.borrow().fields {
            let text = surface.panel(field.panel)?.buffer();
            let value = text.trim().to_string();
            if field.input.required && value.is_empty() {
                missing.push(Error::Required {
                    field: field.input.name.clone(),
                });
            }
            if let Some(sink) = &field.input.sink {
                sinks.push((sink.clone(), value.clone()));
            }
            values.insert(field.input.name.clone(), value);
        }

        if !missing.is_empty() {
            debug!(missing = missing.len(), "form has blank required fields");
            for err in missing {
                self.report(surface, ctx, err)?;
            }
            return Ok(());
        }

        for (sink, value) in sinks {
            sink.set(value);
        }

        self.inner.borrow_mut().state = FormState::Submitted;
        let callback = self.inner.borrow_mut().on_submit.take();
        if let Some(mut callback) = callback {
            let result = callback(surface, ctx, &values);
            let mut inner = self.inner.borrow_mut();
            if inner.on_submit.is_none() {
                inner.on_submit = Some(callback);
            }
            if let Err(err) = result {
                inner.state = FormState::Active;
                drop(inner);
                return self.report_if_recoverable(surface, ctx, err);
            }
        }

        self.close(surface);
        Ok(())
    }

    /// Close the form, then run `on_cancel`. No-op once closed.
    pub fn cancel(&self, surface: &mut Surface<C>, ctx: &mut C) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.inner.borrow_mut().state = FormState::Cancelled;
        let callback = self.inner.borrow_mut().on_cancel.take();
        self.delete_panels(surface);

        let result = match callback {
            Some(mut callback) => callback(surface, ctx),
            None => Ok(()),
        };
        self.close(surface);
        result
    }

    fn report_if_recoverable(&self, surface: &mut Surface<C>, ctx: &mut C, err: Error) -> Result<()> {
        if err.is_recoverable() {
            self.report(surface, ctx, err)
        } else {
            Err(err)
        }
    }

    fn report(&self, surface: &mut Surface<C>, ctx: &mut C, err: Error) -> Result<()> {
        let callback = self.inner.borrow_mut().on_error.take();
        let Some(mut callback) = callback else {
            return Err(err);
        };
        let result = callback(surface, ctx, &err);
        let mut inner = self.inner.borrow_mut();
        if inner.on_error.is_none() {
            inner.on_error = Some(callback);
        }
        result
    }

    fn close(&self, surface: &mut Surface<C>) {
        self.delete_panels(surface);
        let mut inner = self.inner.borrow_mut();
        inner.state = FormState::Closed;
        inner.on_submit = None;
        inner.on_cancel = None;
        inner.on_error = None;
    }

    fn delete_panels(&self, surface: &mut Surface<C>) {
        let mut inner = self.inner.borrow_mut();
        for field in inner.fields.drain(..) {
            surface.delete_panel(field.panel);
        }
        if surface.delete_panel(inner.container) {
            debug!(form = %inner.title, "form closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip_ansi;

    #[derive(Default)]
    struct Log {
        submitted: Vec<Values>,
        errors: Vec<String>,
        cancelled: usize,
    }

    fn surface() -> Surface<Log> {
        Surface::new(80, 24)
    }

    fn login(surface: &mut Surface<Log>) -> Form<Log> {
        let form = Form::new(surface, "Login", 10, 2)
            .unwrap()
            .on_submit(|_, log: &mut Log, values| {
                log.submitted.push(values.clone());
                Ok(())
            })
            .on_cancel(|_, log: &mut Log| {
                log.cancelled += 1;
                Ok(())
            });
        form.input(surface, Input::new("User", 20).required(true).focused(true))
            .unwrap();
        form.input(surface, Input::new("Password", 20).required(true).mask('*'))
            .unwrap();
        form
    }

    fn type_into(surface: &mut Surface<Log>, form: &Form<Log>, field: &str, text: &str) {
        let id = form.field_panel(field).unwrap();
        surface.panel_mut(id).unwrap().insert_str(text);
    }

    #[test]
    fn test_submit_with_required_fields_filled() {
        let mut s = surface();
        let form = login(&mut s);
        type_into(&mut s, &form, "User", "  alice ");
        type_into(&mut s, &form, "Password", "secret\t");

        let mut log = Log::default();
        assert!(s.handle_key(&mut log, Key::new(KeyCode::Enter)).unwrap());

        assert_eq!(log.submitted.len(), 1);
        assert_eq!(log.submitted[0]["User"], "alice");
        assert_eq!(log.submitted[0]["Password"], "secret");
        assert_eq!(form.state(), FormState::Closed);
        assert_eq!(s.panel_count(), 0);
        assert_eq!(s.binding_count(), 0);
    }

    #[test]
    fn test_blank_required_fields_report_each() {
        let mut s = surface();
        let form = login(&mut s).on_error(|_, log: &mut Log, err| {
            log.errors.push(err.to_string());
            Ok(())
        });

        let mut log = Log::default();
        s.handle_key(&mut log, Key::new(KeyCode::Enter)).unwrap();
        assert_eq!(log.errors.len(), 2);
        assert!(log.errors[0].contains("User"));
        assert!(log.submitted.is_empty());
        assert_eq!(form.state(), FormState::Active);
        assert_eq!(s.panel_count(), 3);
    }

    #[test]
    fn test_blank_required_without_handler_is_returned() {
        let mut s = surface();
        let form = login(&mut s);
        let err = form.submit(&mut s, &mut Log::default()).unwrap_err();
        assert!(matches!(err, Error::Required { ref field } if field == "User"));
        assert!(err.is_recoverable());
        assert_eq!(form.state(), FormState::Active);
    }

    #[test]
    fn test_rejected_submit_keeps_form_open() {
        let mut s = surface();
        let form = Form::new(&mut s, "Save", 0, 0)
            .unwrap()
            .on_submit(|_, _: &mut Log, _| Err(Error::rejected("disk full")))
            .on_error(|_, log: &mut Log, err| {
                log.errors.push(err.to_string());
                Ok(())
            });
        form.input(&mut s, Input::new("File", 30).focused(true)).unwrap();

        let mut log = Log::default();
        form.submit(&mut s, &mut log).unwrap();
        assert_eq!(log.errors, vec!["disk full"]);
        assert_eq!(form.state(), FormState::Active);

        form.submit(&mut s, &mut log).unwrap();
        assert_eq!(log.errors.len(), 2);
    }

    #[test]
    fn test_fatal_submit_error_is_returned() {
        let mut s = surface();
        let form = Form::new(&mut s, "Save", 0, 0)
            .unwrap()
            .on_submit(|_, _: &mut Log, _| Err(Error::QueueClosed));
        form.input(&mut s, Input::new("File", 30)).unwrap();
        assert!(matches!(
            form.submit(&mut s, &mut Log::default()),
            Err(Error::QueueClosed)
        ));
    }

    #[test]
    fn test_sinks_receive_values() {
        let mut s = surface();
        let sink = Sink::new();
        let form: Form<Log> = Form::new(&mut s, "Name", 0, 0).unwrap();
        let id = form.input(&mut s, Input::new("Name", 20).bind(&sink)).unwrap();
        s.panel_mut(id).unwrap().insert_str(" bob ");

        form.submit(&mut s, &mut Log::default()).unwrap();
        assert_eq!(sink.get(), "bob");
    }

    #[test]
    fn test_submit_keeps_combining_marks() {
        let mut s = surface();
        let form = Form::new(&mut s, "Search", 0, 0)
            .unwrap()
            .on_submit(|_, log: &mut Log, values| {
                log.submitted.push(values.clone());
                Ok(())
            });
        let id = form.input(&mut s, Input::new("Query", 20).focused(true)).unwrap();
        assert!(s.paste("cafe\u{301} 👨\u{200D}👩"));
        assert_eq!(s.panel(id).unwrap().lines(), vec!["cafe\u{301} 👨\u{200D}👩"]);

        let mut log = Log::default();
        form.submit(&mut s, &mut log).unwrap();
        assert_eq!(log.submitted[0]["Query"], "cafe\u{301} 👨\u{200D}👩");
    }

    #[test]
    fn test_cancel_twice_is_safe() {
        let mut s = surface();
        let form = login(&mut s);
        let mut log = Log::default();

        s.handle_key(&mut log, Key::new(KeyCode::Esc)).unwrap();
        form.cancel(&mut s, &mut log).unwrap();
        form.submit(&mut s, &mut log).unwrap();

        assert_eq!(log.cancelled, 1);
        assert!(log.submitted.is_empty());
        assert_eq!(s.panel_count(), 0);
        assert_eq!(s.binding_count(), 0);
    }

    #[test]
    fn test_tab_cycles_with_wraparound() {
        let mut s = surface();
        let form = login(&mut s);
        form.input(&mut s, Input::new("Token", 20)).unwrap();
        let user = form.field_panel("User").unwrap();
        let password = form.field_panel("Password").unwrap();
        let token = form.field_panel("Token").unwrap();

        let mut log = Log::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            s.handle_key(&mut log, Key::new(KeyCode::Tab)).unwrap();
            seen.push(s.focused().unwrap());
        }
        assert_eq!(seen, vec![password, token, user]);
    }

    #[test]
    fn test_input_on_closed_form_fails() {
        let mut s = surface();
        let form = login(&mut s);
        form.cancel(&mut s, &mut Log::default()).unwrap();
        assert!(matches!(
            form.input(&mut s, Input::new("Late", 10)),
            Err(Error::FormClosed(_))
        ));
    }

    #[test]
    fn test_geometry_grows_with_fields() {
        let mut s = surface();
        let form: Form<Log> = Form::new(&mut s, "New", 10, 5).unwrap();
        assert_eq!(s.panel(form.container()).unwrap().rect(), Rect::new(10, 5, 6, 2));

        let name = form.input(&mut s, Input::new("Name", 20)).unwrap();
        assert_eq!(s.panel(name).unwrap().rect(), Rect::new(12, 6, 21, 3));
        assert_eq!(s.panel(form.container()).unwrap().rect(), Rect::new(10, 5, 25, 6));

        let notes = form.input(&mut s, Input::new("Notes", 10).rows(3)).unwrap();
        assert_eq!(s.panel(notes).unwrap().rect(), Rect::new(12, 10, 11, 5));
        assert_eq!(s.panel(form.container()).unwrap().rect(), Rect::new(10, 5, 25, 12));
        assert!(s.panel(notes).unwrap().wrap);
    }

    #[test]
    fn test_geometry_saturates_at_screen_edge() {
        let mut s = surface();
        let x0 = u16::MAX - 3;
        let form: Form<Log> = Form::new(&mut s, "Edge", x0, 0).unwrap();

        let field = form.input(&mut s, Input::new("Wide", u16::MAX)).unwrap();
        let rect = s.panel(field).unwrap().rect();
        assert_eq!(rect.x, u16::MAX - 1);
        assert_eq!(rect.right(), u16::MAX);

        let container = s.panel(form.container()).unwrap().rect();
        assert_eq!(container.x, x0);
        assert_eq!(container.right(), u16::MAX);
    }

    #[test]
    fn test_footer_hint_text() {
        assert_eq!(strip_ansi(&footer_hint(1)), "ENTER:Submit ESC:Cancel");
        assert_eq!(
            strip_ansi(&footer_hint(2)),
            "TAB:Switch Input ENTER:Submit ESC:Cancel"
        );
        assert!(footer_hint(1).contains("\x1b[36m"));
    }

    #[test]
    fn test_footer_centered_on_last_row() {
        let mut s = surface();
        let form: Form<Log> = Form::new(&mut s, "Query", 0, 0).unwrap();
        form.input(&mut s, Input::new("Search", 40)).unwrap();

        let panel = s.panel(form.container()).unwrap();
        let (width, height) = panel.size();
        assert_eq!(width, 43);
        let lines = panel.lines();
        assert_eq!(lines.len(), usize::from(height));

        let last = lines.last().unwrap();
        assert_eq!(last.trim_start(), "ENTER:Submit ESC:Cancel");
        assert_eq!(last.len() - last.trim_start().len(), 10);
    }

    #[test]
    fn test_masked_field_keeps_plain_value() {
        let mut s = surface();
        let form = login(&mut s);
        type_into(&mut s, &form, "User", "alice");
        type_into(&mut s, &form, "Password", "pw");
        let password = form.field_panel("Password").unwrap();
        assert_eq!(s.panel(password).unwrap().mask, Some('*'));

        let mut log = Log::default();
        form.submit(&mut s, &mut log).unwrap();
        assert_eq!(log.submitted[0]["Password"], "pw");
    }
}

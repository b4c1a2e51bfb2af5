//! Operations Demo: browse and run a tree of fake API operations.
//!
//! Demonstrates:
//! - TreeView sidebar with groups of operations
//! - Parameter forms with required fields
//! - Background requests with an InfoBox and queued results
//! - MainView scrolling, Ctrl+S saving and Ctrl+X copying
//! - StatusLine updates from worker threads
//!
//! Keys: Up/Down select, Enter runs, Tab switches panes, Ctrl+C quits.

use serde_json::{json, Value};
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tracing::warn;
use treeline::widget::{Direction, Values};
use treeline::{
    logging, Config, Engine, Form, InfoBox, Input, Key, KeyCode, MainView, Node, NodeRef,
    StatusLine, Surface, TreeView, Updater,
};

const HELP: &str = "Enter: run | Tab: switch | Ctrl+S: save | Ctrl+X: copy | Ctrl+C: quit";

type Outcome = std::result::Result<Value, String>;

#[derive(Clone)]
struct Operation {
    name: String,
    params: Vec<String>,
    run: fn(&Values) -> Outcome,
}

struct Group {
    name: String,
    operations: Vec<Operation>,
}

impl Node for Operation {
    fn title(&self) -> &str {
        &self.name
    }

    fn children(&self) -> Vec<&dyn Node> {
        Vec::new()
    }
}

impl Node for Group {
    fn title(&self) -> &str {
        &self.name
    }

    fn children(&self) -> Vec<&dyn Node> {
        self.operations.iter().map(|op| op as &dyn Node).collect()
    }
}

fn list_products(_: &Values) -> Outcome {
    let products: Vec<Value> = (1..=40)
        .map(|i| json!({ "sku": format!("coins_{i}"), "price": i * 99, "status": "active" }))
        .collect();
    Ok(json!({ "products": products }))
}

fn get_product(params: &Values) -> Outcome {
    let sku = params.get("SKU").map_or("", String::as_str);
    if sku.starts_with("coins_") {
        Ok(json!({ "sku": sku, "price": 99, "status": "active" }))
    } else {
        Err(format!("product `{sku}` not found"))
    }
}

fn list_reviews(_: &Values) -> Outcome {
    Ok(json!({ "reviews": [
        { "author": "sam", "stars": 5, "text": "Great app" },
        { "author": "kit", "stars": 2, "text": "Crashes on start" },
    ]}))
}

fn reply_review(params: &Values) -> Outcome {
    Ok(json!({
        "review": params.get("Review Id"),
        "reply": params.get("Reply"),
        "sent": true,
    }))
}

fn groups() -> Vec<Rc<Group>> {
    let op = |name: &str, params: &[&str], run: fn(&Values) -> Outcome| Operation {
        name: name.to_string(),
        params: params.iter().map(ToString::to_string).collect(),
        run,
    };
    vec![
        Rc::new(Group {
            name: "Products".to_string(),
            operations: vec![op("List", &[], list_products), op("Get", &["SKU"], get_product)],
        }),
        Rc::new(Group {
            name: "Reviews".to_string(),
            operations: vec![
                op("List", &[], list_reviews),
                op("Reply", &["Review Id", "Reply"], reply_review),
            ],
        }),
    ]
}

struct App {
    groups: Vec<Rc<Group>>,
    tree: TreeView,
    main: MainView,
    status: StatusLine<App>,
    info_width: u16,
}

impl App {
    /// Fit every view to the current screen size.
    fn layout(&mut self, surface: &mut Surface<Self>) -> treeline::Result<()> {
        self.tree.layout(surface)?;
        self.main.set_view(surface)?;
        self.status.set_view(surface, HELP)?;
        Ok(())
    }
}

/// Run `operation` on a worker thread and post the result to the main view.
fn spawn_request(
    updater: &Updater<App>,
    app: &App,
    label: String,
    operation: Operation,
    values: Values,
) -> treeline::Result<()> {
    let info = InfoBox::show(updater, "Loading...", app.info_width, None)?;
    let status = app.status.clone();
    let updater = updater.clone();
    status.update(format!("Running {label}..."))?;

    thread::Builder::new()
        .name("demo-request".to_string())
        .spawn(move || {
            thread::sleep(Duration::from_millis(400));
            let result = (operation.run)(&values);
            let failed = result.is_err();

            let posted = info
                .close()
                .and_then(|()| {
                    updater.post(move |surface, app| {
                        app.main.load_content(surface, &label, &result)?;
                        app.tree.set_current(surface)
                    })
                })
                .and_then(|()| {
                    if failed {
                        status.update_error("request failed")
                    } else {
                        status.update_success("request done")
                    }
                });
            if let Err(err) = posted {
                warn!(error = %err, "request finished after shutdown");
            }
        })?;
    Ok(())
}

/// Enter on the tree: run the selected operation, asking for its
/// parameters first when it has any.
fn process_operation(surface: &mut Surface<App>, app: &mut App) -> treeline::Result<()> {
    let path = app.tree.selected(surface);
    let [group, op] = path[..] else {
        return Ok(());
    };
    let Some(group) = app.groups.get(group).map(Rc::clone) else {
        return Ok(());
    };
    let Some(operation) = group.operations.get(op).cloned() else {
        return Ok(());
    };
    let label = format!("{} {}", operation.name, group.name);
    let updater = surface.updater();

    if operation.params.is_empty() {
        return spawn_request(&updater, app, label, operation, Values::new());
    }

    let (width, height) = surface.size();
    let rows = u16::try_from(operation.params.len().saturating_sub(1) / 2).unwrap_or(0);
    let params = operation.params.clone();
    let form = Form::new(
        surface,
        "Parameters",
        (width / 2).saturating_sub(30),
        (height / 2).saturating_sub(rows),
    )?
    .on_submit(move |surface, app, values| {
        spawn_request(&updater, app, label.clone(), operation.clone(), values.clone())?;
        app.tree.set_current(surface)
    })
    .on_cancel(|surface, app| app.tree.set_current(surface))
    .on_error(|_, app, err| app.status.update_error(&err.to_string()));

    for (i, param) in params.iter().enumerate() {
        form.input(surface, Input::new(param.as_str(), 60).required(true).focused(i == 0))?;
    }
    Ok(())
}

fn keybindings(surface: &mut Surface<App>, app: &App) -> treeline::Result<()> {
    let (Some(side), Some(main)) = (app.tree.panel(), app.main.panel()) else {
        return Ok(());
    };

    surface.bind(Some(side), Key::new(KeyCode::Up), |surface, app, _| {
        app.tree.move_cursor(surface, Direction::Up)
    })?;
    surface.bind(Some(side), Key::new(KeyCode::Down), |surface, app, _| {
        app.tree.move_cursor(surface, Direction::Down)
    })?;
    surface.bind(Some(side), Key::new(KeyCode::Enter), |surface, app, _| {
        process_operation(surface, app)
    })?;
    surface.bind(Some(side), Key::new(KeyCode::Tab), |surface, app, _| {
        app.main.set_current(surface)
    })?;
    surface.bind(Some(main), Key::new(KeyCode::Tab), |surface, app, _| {
        app.tree.set_current(surface)
    })?;
    surface.bind(None, Key::ctrl('c'), |surface, _, _| {
        surface.quit();
        Ok(())
    })?;

    app.main.set_keybindings(surface, |_, app, saved| match saved {
        Ok(path) => app.status.update_success(&format!("saved {}", path.display())),
        Err(err) => app.status.update_error(&err.to_string()),
    })?;
    app.main.set_copy_keybinding(surface, |_, app, copied| match copied {
        Ok(bytes) => app.status.update_success(&format!("copied {bytes} bytes")),
        Err(err) => app.status.update_error(&err.to_string()),
    })
}

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let _guard = logging::init(&config.logging);

    let mut engine = Engine::with_config(config.engine.clone())?;
    let mut surface = engine.surface::<App>();

    let sidebar = config.layout.sidebar_width;
    let mut app = App {
        groups: groups(),
        tree: TreeView::new(sidebar),
        main: MainView::new(sidebar),
        status: StatusLine::new(surface.updater()),
        info_width: config.layout.info_width,
    };

    let roots: Vec<NodeRef> = app.groups.iter().map(|group| Rc::clone(group) as NodeRef).collect();
    app.tree.set_view(&mut surface, "Operations", roots)?;
    app.layout(&mut surface)?;
    keybindings(&mut surface, &app)?;

    engine.run(&mut surface, &mut app, |surface, app| app.layout(surface))?;
    Ok(())
}

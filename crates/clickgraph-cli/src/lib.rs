//! CLI logic for the clickgraph tool.
//!
//! The CLI renders a DOT file through a [`RenderController`] mounted on a
//! simulated container, writes the displayed SVG, and then replays the
//! requested clicks against it. With `--info` the clicks drive an
//! [`InfoGraph`] and the viewer content after each click is reported.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, ClickPoint};

use std::{cell::RefCell, fs, rc::Rc};

use futures::executor::LocalPool;
use log::{debug, info, warn};

use clickgraph::{
    BackgroundClickHandler, ClickGraphError, GraphView, HostCallbacks, NodeClickHandler,
    RenderController, StaticTheme,
    geometry::{ContainerSize, Point},
    info_graph::{INFO_PANEL_TITLE, InfoGraph},
    size_channel,
};

/// A host callback fired by a simulated click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    Node(String),
    Background,
}

/// What happened during a run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Callbacks fired, in order. Empty when an information table is used.
    pub effects: Vec<ClickEffect>,
    /// Viewer content after each click, when an information table is used.
    pub viewer: Vec<String>,
}

/// Run the clickgraph CLI application
///
/// This function renders the input file, writes the resulting SVG to the
/// output file and replays the requested clicks.
///
/// # Errors
///
/// Returns `ClickGraphError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Layout errors of the input graph
pub fn run(args: &Args) -> Result<Outcome, ClickGraphError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing graph"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let description = fs::read_to_string(&args.input)?;
    let info_file = args.info.as_ref().map(config::load_info).transpose()?;

    let mut pool = LocalPool::new();
    let view = GraphView::new(app_config);
    let controller = view.controller(Rc::new(StaticTheme::new()), Rc::new(pool.spawner()));

    let (reporter, feed) = size_channel();
    controller.mount(feed)?;
    reporter.report(ContainerSize::new(args.width, args.height));
    pool.run_until_stalled();

    let mut outcome = Outcome::default();
    match info_file {
        Some(info_file) => {
            let default_content = info_file.default_content().to_string();
            let graph = InfoGraph::new(
                info_file.into_nodes(),
                description.as_str(),
                default_content,
                controller,
            );
            pool.run_until_stalled();
            export(graph.controller(), &description, &args.output)?;

            for click in &args.clicks {
                graph.controller().click(Point::new(click.x, click.y));
                let content = graph.content();
                info!(click:%, panel = INFO_PANEL_TITLE, content; "Viewer updated");
                outcome.viewer.push(content);
            }
            graph.controller().unmount();
        }
        None => {
            let effects = Rc::new(RefCell::new(Vec::new()));
            controller.update(description.as_str(), recording_callbacks(&effects));
            pool.run_until_stalled();
            export(&controller, &description, &args.output)?;

            for click in &args.clicks {
                let before = effects.borrow().len();
                controller.click(Point::new(click.x, click.y));
                match effects.borrow().get(before) {
                    Some(ClickEffect::Node(id)) => info!(click:%, id; "Node clicked"),
                    Some(ClickEffect::Background) => info!(click:%; "Background clicked"),
                    None => info!(click:%; "Click fired no callback"),
                }
            }
            controller.unmount();
            outcome.effects = effects.take();
        }
    }

    Ok(outcome)
}

fn recording_callbacks(effects: &Rc<RefCell<Vec<ClickEffect>>>) -> HostCallbacks {
    let nodes = Rc::clone(effects);
    let background = Rc::clone(effects);
    HostCallbacks::new(
        NodeClickHandler::new(move |id| nodes.borrow_mut().push(ClickEffect::Node(id.to_string()))),
        BackgroundClickHandler::new(move || background.borrow_mut().push(ClickEffect::Background)),
    )
}

/// Writes the displayed scene, or reports the displayed layout error.
fn export(controller: &RenderController, description: &str, output: &str) -> Result<(), ClickGraphError> {
    if let Some(err) = controller.layout_error() {
        warn!(err:%; "Graph could not be laid out");
        return Err(ClickGraphError::new_layout_error(err, description));
    }
    let svg = controller
        .svg()
        .ok_or_else(|| ClickGraphError::Render(format!("{:?}", controller.state())))?;
    debug!(bytes = svg.len(); "Writing SVG");
    fs::write(output, svg)?;
    info!(output_file = output; "SVG exported successfully");
    Ok(())
}

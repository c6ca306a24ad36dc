//! Clickgraph - interactive Graphviz DOT diagrams.
//!
//! A [`RenderController`] lays out a DOT description for the size of its
//! container, restyles the resulting scene for the host theme and routes
//! clicks on nodes and on empty space to host callbacks. Overlapping
//! renders are resolved by generation: only the latest one ever reaches the
//! container.
//!
//! [`GraphView`] wraps the whole pipeline for one-shot rendering, and
//! [`InfoGraph`](info_graph::InfoGraph) composes a graph with a content
//! viewer driven by node clicks.

pub mod callbacks;
pub mod config;
pub mod container;
pub mod controller;
pub mod info_graph;
pub mod postprocess;
pub mod size;
pub mod theme;

mod error;

pub use clickgraph_core::{color, geometry, layout, scene};

pub use callbacks::{BackgroundClickHandler, HostCallbacks, NodeClickHandler};
pub use controller::{Generation, RenderController, RenderInputs, RenderState};
pub use error::ClickGraphError;
pub use size::{SizeFeed, SizeObserver, SizeReporter, size_channel};
pub use theme::{StaticTheme, ThemeProvider};

use std::rc::Rc;

use futures::{executor::LocalPool, task::LocalSpawn};
use log::{debug, info};

use clickgraph_core::geometry::ContainerSize;
use clickgraph_dot::DotEngine;

use config::AppConfig;

/// Entry point for rendering DOT descriptions with a given configuration.
///
/// # Examples
///
/// ```rust
/// use clickgraph::{GraphView, config::AppConfig, geometry::ContainerSize};
///
/// let view = GraphView::new(AppConfig::default());
/// let svg = view
///     .render_svg("digraph { A -> B }", ContainerSize::new(400.0, 300.0))
///     .expect("Failed to render");
/// assert!(svg.contains("viewBox=\"0 0 400 300\""));
/// ```
#[derive(Debug, Default)]
pub struct GraphView {
    config: AppConfig,
}

impl GraphView {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The DOT engine configured by the `[layout]` section.
    pub fn engine(&self) -> DotEngine {
        DotEngine::new(self.config.layout().to_options())
    }

    /// Creates an unmounted controller using this view's engine and theme settings.
    pub fn controller(&self, theme: Rc<dyn ThemeProvider>, spawner: Rc<dyn LocalSpawn>) -> RenderController {
        RenderController::new(
            Rc::new(self.engine()),
            theme,
            spawner,
            self.config.theme().clone(),
        )
    }

    /// Renders `description` into a container of `size` and returns the
    /// post-processed SVG.
    ///
    /// Runs a full controller cycle on a private executor, with no theme
    /// variables defined.
    ///
    /// # Errors
    ///
    /// Returns [`ClickGraphError::Render`] carrying the displayed message
    /// when layout fails.
    pub fn render_svg(&self, description: &str, size: ContainerSize) -> Result<String, ClickGraphError> {
        info!(size:%; "Rendering graph view");
        let mut pool = LocalPool::new();
        let controller = self.controller(Rc::new(StaticTheme::new()), Rc::new(pool.spawner()));

        let (reporter, feed) = size_channel();
        reporter.report(size);
        controller.mount(feed)?;
        pool.run_until_stalled();
        controller.update(description, HostCallbacks::noop());
        pool.run_until_stalled();

        let result = match controller.svg() {
            Some(svg) => Ok(svg),
            None => Err(ClickGraphError::Render(
                controller
                    .error_text()
                    .unwrap_or_else(|| "no output".to_string()),
            )),
        };
        controller.unmount();
        debug!(state:? = controller.state(); "Graph view rendered");
        result
    }
}

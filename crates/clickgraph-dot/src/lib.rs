//! DOT layout engine for clickgraph.
//!
//! [`DotEngine`] implements [`LayoutEngine`] for Graphviz DOT descriptions:
//! the description is parsed with `graphviz-rust`, nodes are placed in layers
//! with `rust-sugiyama`, and the result is assembled into a
//! [`Scene`](clickgraph_core::scene::Scene) shaped like Graphviz SVG output
//! (`g.graph`, `g.node`, `g.edge` and a background polygon).
//!
//! # Example
//!
//! ```
//! use clickgraph_core::geometry::ContainerSize;
//! use clickgraph_dot::{DotEngine, LayoutOptions};
//!
//! let engine = DotEngine::new(LayoutOptions::default());
//! let scene = engine
//!     .render("digraph { A -> B }", ContainerSize::new(400.0, 300.0))
//!     .unwrap();
//! assert!(scene.to_svg().contains("class=\"node\""));
//! ```

pub mod error;
pub mod model;
mod normalize;
mod parser;
mod placement;
mod render;

use futures::{FutureExt, future::LocalBoxFuture};
use log::info;

use clickgraph_core::{
    geometry::ContainerSize,
    layout::{LayoutEngine, LayoutError},
    scene::Scene,
    text::TextStyle,
};

pub use error::DotError;
pub use parser::parse;

/// Tuning knobs for DOT layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Font used for labels that do not set `fontname`/`fontsize`.
    pub text: TextStyle,
    /// Minimum gap between neighbouring nodes in a rank.
    pub node_spacing: f32,
    /// Gap between consecutive ranks.
    pub rank_spacing: f32,
    /// Space left around the drawing, in layout units.
    pub margin: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text: TextStyle::default(),
            node_spacing: 18.0,
            rank_spacing: 36.0,
            margin: 4.0,
        }
    }
}

/// Layout engine for Graphviz DOT descriptions.
#[derive(Debug, Clone, Default)]
pub struct DotEngine {
    options: LayoutOptions,
}

impl DotEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Parses and lays out `description` synchronously.
    ///
    /// # Errors
    ///
    /// Returns [`DotError::Parse`] for invalid DOT and [`DotError::Layout`]
    /// when placement fails.
    pub fn render(&self, description: &str, size: ContainerSize) -> Result<Scene, DotError> {
        info!(target_size:% = size; "Laying out DOT graph");
        let graph = parser::parse(description)?;
        render::build_scene(&graph, &self.options, size)
    }
}

impl LayoutEngine for DotEngine {
    /// Work happens when the returned future is first polled, not when it is created.
    fn layout(
        &self,
        description: &str,
        size: ContainerSize,
    ) -> LocalBoxFuture<'static, Result<Scene, LayoutError>> {
        let engine = self.clone();
        let description = description.to_string();
        async move { engine.render(&description, size).map_err(LayoutError::from) }.boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use clickgraph_core::scene::SceneGraph;

    #[test]
    fn test_layout_future_success() {
        let engine = DotEngine::default();
        let scene = block_on(engine.layout("digraph { A -> B }", ContainerSize::new(400.0, 300.0)))
            .unwrap();
        assert!(!scene.is_empty());
    }

    #[test]
    fn test_layout_future_reports_syntax_error() {
        let engine = DotEngine::default();
        let err = block_on(engine.layout("digraph { A -> ", ContainerSize::default())).unwrap_err();
        assert!(matches!(err, LayoutError::Syntax { .. }));
        assert!(err.to_string().starts_with("syntax error"));
    }

    #[test]
    fn test_empty_graph_renders_background_only() {
        let scene = DotEngine::default()
            .render("digraph {}", ContainerSize::default())
            .unwrap();
        assert!(scene.node_groups().is_empty());
        assert!(scene.background_shape().is_some());
    }
}

//! The declaration-graph composition.
//!
//! [`InfoGraph`] pairs a graph view with a content viewer. Clicking a node
//! shows the content registered for that node; clicking anywhere else brings
//! back the default content. The callbacks handed to the controller are
//! created once, so updating the node table never invalidates a render.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Deserialize;

use crate::{
    callbacks::{BackgroundClickHandler, HostCallbacks, NodeClickHandler},
    controller::{Generation, RenderController},
};

/// Title of the panel holding the graph.
pub const GRAPH_PANEL_TITLE: &str = "Declaration Graph";

/// Title of the panel holding the content viewer.
pub const INFO_PANEL_TITLE: &str = "Declaration Information";

/// Detail content registered for one graph node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeInfo {
    id: String,
    html: String,
}

impl NodeInfo {
    pub fn new(id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            html: html.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// Displays one piece of HTML content at a time.
#[derive(Debug, Default)]
pub struct ContentViewer {
    content: RefCell<String>,
}

impl ContentViewer {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: RefCell::new(content.into()),
        }
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    pub fn show(&self, content: impl Into<String>) {
        *self.content.borrow_mut() = content.into();
    }
}

type NodeTable = IndexMap<String, String>;

fn node_table(nodes: impl IntoIterator<Item = NodeInfo>) -> NodeTable {
    // Later entries replace earlier ones with the same id.
    nodes
        .into_iter()
        .map(|node| (node.id, node.html))
        .collect()
}

/// A graph view wired to a content viewer.
#[derive(Debug)]
pub struct InfoGraph {
    nodes: Rc<RefCell<NodeTable>>,
    default_content: Rc<RefCell<String>>,
    viewer: Rc<ContentViewer>,
    description: String,
    callbacks: HostCallbacks,
    controller: RenderController,
}

impl InfoGraph {
    /// Builds the composition and hands the graph to `controller`.
    pub fn new(
        nodes: impl IntoIterator<Item = NodeInfo>,
        description: impl Into<String>,
        default_content: impl Into<String>,
        controller: RenderController,
    ) -> Self {
        let nodes = Rc::new(RefCell::new(node_table(nodes)));
        let default_content = Rc::new(RefCell::new(default_content.into()));
        let viewer = Rc::new(ContentViewer::new(default_content.borrow().clone()));

        let on_node_click = {
            let nodes = Rc::clone(&nodes);
            let viewer = Rc::clone(&viewer);
            NodeClickHandler::new(move |id| match nodes.borrow().get(id) {
                Some(html) => {
                    debug!(id; "Showing node information");
                    viewer.show(html.as_str());
                }
                None => trace!(id; "No information for node"),
            })
        };
        let on_background_click = {
            let default_content = Rc::clone(&default_content);
            let viewer = Rc::clone(&viewer);
            BackgroundClickHandler::new(move || {
                debug!("Showing default information");
                viewer.show(default_content.borrow().as_str());
            })
        };

        let callbacks = HostCallbacks::new(on_node_click, on_background_click);
        let description = description.into();
        controller.update(description.clone(), callbacks.clone());

        Self {
            nodes,
            default_content,
            viewer,
            description,
            callbacks,
            controller,
        }
    }

    /// Replaces the node table. The displayed content is left as is.
    pub fn set_nodes(&self, nodes: impl IntoIterator<Item = NodeInfo>) {
        *self.nodes.borrow_mut() = node_table(nodes);
    }

    /// Replaces the graph, starting a render when it changed.
    pub fn set_description(&mut self, description: impl Into<String>) -> Option<Generation> {
        self.description = description.into();
        self.controller
            .update(self.description.clone(), self.callbacks.clone())
    }

    /// Replaces the content shown on background clicks.
    pub fn set_default_content(&self, content: impl Into<String>) {
        *self.default_content.borrow_mut() = content.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The content currently shown in the viewer.
    pub fn content(&self) -> String {
        self.viewer.content()
    }

    pub fn callbacks(&self) -> &HostCallbacks {
        &self.callbacks
    }

    pub fn controller(&self) -> &RenderController {
        &self.controller
    }

    /// The panel titles, graph first.
    pub fn panel_titles(&self) -> [&'static str; 2] {
        [GRAPH_PANEL_TITLE, INFO_PANEL_TITLE]
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::LocalPool;

    use clickgraph_dot::DotEngine;

    use super::*;
    use crate::{config::ThemeConfig, theme::StaticTheme};

    fn info_graph(pool: &LocalPool) -> InfoGraph {
        let controller = RenderController::new(
            Rc::new(DotEngine::default()),
            Rc::new(StaticTheme::new()),
            Rc::new(pool.spawner()),
            ThemeConfig::default(),
        );
        InfoGraph::new(
            vec![
                NodeInfo::new("A", "<p>first A</p>"),
                NodeInfo::new("B", "<p>B</p>"),
                NodeInfo::new("A", "<p>second A</p>"),
            ],
            "digraph { A -> B }",
            "<p>default</p>",
            controller,
        )
    }

    #[test]
    fn test_node_click_shows_content() {
        let pool = LocalPool::new();
        let graph = info_graph(&pool);
        assert_eq!(graph.content(), "<p>default</p>");

        graph.callbacks().on_node_click().call("B");
        assert_eq!(graph.content(), "<p>B</p>");
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let pool = LocalPool::new();
        let graph = info_graph(&pool);
        graph.callbacks().on_node_click().call("A");
        assert_eq!(graph.content(), "<p>second A</p>");
    }

    #[test]
    fn test_unknown_id_leaves_viewer_unchanged() {
        let pool = LocalPool::new();
        let graph = info_graph(&pool);
        graph.callbacks().on_node_click().call("B");
        graph.callbacks().on_node_click().call("missing");
        assert_eq!(graph.content(), "<p>B</p>");
    }

    #[test]
    fn test_background_click_resets() {
        let pool = LocalPool::new();
        let graph = info_graph(&pool);
        graph.callbacks().on_node_click().call("B");
        graph.set_default_content("<p>fresh default</p>");
        graph.callbacks().on_background_click().call();
        assert_eq!(graph.content(), "<p>fresh default</p>");
    }

    #[test]
    fn test_set_nodes_keeps_callback_identity() {
        let pool = LocalPool::new();
        let mut graph = info_graph(&pool);
        let before = graph.callbacks().clone();
        graph.set_nodes(vec![NodeInfo::new("C", "<p>C</p>")]);
        assert_eq!(graph.callbacks(), &before);
        assert_eq!(graph.set_description("digraph { A -> B }"), None);

        graph.callbacks().on_node_click().call("C");
        assert_eq!(graph.content(), "<p>C</p>");
        graph.callbacks().on_node_click().call("B");
        assert_eq!(graph.content(), "<p>C</p>");
    }

    #[test]
    fn test_panel_titles() {
        let pool = LocalPool::new();
        let graph = info_graph(&pool);
        assert_eq!(
            graph.panel_titles(),
            ["Declaration Graph", "Declaration Information"]
        );
    }
}

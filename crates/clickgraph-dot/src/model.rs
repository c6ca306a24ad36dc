//! The flattened graph model produced by the parser.
//!
//! DOT statements are resolved into a flat list of nodes and edges with their
//! effective attributes (scoped defaults already applied). Layout and scene
//! construction only ever look at this model.

use indexmap::IndexMap;
use log::debug;

/// Attribute name → value, in declaration order.
pub type Attributes = IndexMap<String, String>;

/// A parsed graph with every node and edge fully resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DotGraph {
    name: String,
    directed: bool,
    attributes: Attributes,
    nodes: IndexMap<String, DotNode>,
    edges: Vec<DotEdge>,
}

impl DotGraph {
    pub(crate) fn new(name: impl Into<String>, directed: bool) -> Self {
        Self {
            name: name.into(),
            directed,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &DotNode> {
        self.nodes.values()
    }

    pub fn node(&self, name: &str) -> Option<&DotNode> {
        self.nodes.get(name)
    }

    /// Position of a node in declaration order.
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.get_index_of(name)
    }

    pub fn edges(&self) -> &[DotEdge] {
        &self.edges
    }

    pub fn rank_dir(&self) -> RankDir {
        self.attribute("rankdir")
            .map(RankDir::parse)
            .unwrap_or_default()
    }

    pub(crate) fn set_attribute(&mut self, name: String, value: String) {
        self.attributes.insert(name, value);
    }

    /// Declares a node, creating it with `defaults` on first sight and merging
    /// `explicit` attributes either way.
    pub(crate) fn declare_node(&mut self, name: &str, defaults: &Attributes, explicit: &Attributes) {
        let node = self.nodes.entry(name.to_string()).or_insert_with(|| DotNode {
            name: name.to_string(),
            attributes: defaults.clone(),
        });
        for (key, value) in explicit {
            node.attributes.insert(key.clone(), value.clone());
        }
    }

    pub(crate) fn push_edge(&mut self, edge: DotEdge) {
        self.edges.push(edge);
    }

    /// Keeps only the first of each `(source, target)` pair, as `strict` graphs require.
    pub(crate) fn merge_parallel_edges(&mut self) {
        let mut seen = std::collections::HashSet::new();
        let directed = self.directed;
        self.edges.retain(|edge| {
            let key = if directed || edge.source <= edge.target {
                (edge.source.clone(), edge.target.clone())
            } else {
                (edge.target.clone(), edge.source.clone())
            };
            seen.insert(key)
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DotNode {
    name: String,
    attributes: Attributes,
}

impl DotNode {
    /// The node name as written in the description.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The identifier exposed on the rendered node element.
    ///
    /// An explicit `id` attribute wins over the node name; an explicitly empty
    /// `id` yields no identifier at all.
    pub fn element_id(&self) -> Option<&str> {
        match self.attribute("id") {
            Some("") => None,
            Some(id) => Some(id),
            None => Some(&self.name),
        }
    }

    /// The label text with `\N` expanded and escaped line breaks resolved.
    pub fn label(&self, graph_name: &str) -> String {
        let raw = self.attribute("label").unwrap_or("\\N");
        expand_label(raw, &self.name, graph_name)
    }

    pub fn shape(&self) -> NodeShape {
        self.attribute("shape").map(NodeShape::parse).unwrap_or_default()
    }

    pub fn styles(&self) -> Vec<&str> {
        split_styles(self.attribute("style"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DotEdge {
    pub(crate) source: String,
    pub(crate) target: String,
    pub(crate) attributes: Attributes,
}

impl DotEdge {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn label(&self, graph_name: &str) -> Option<String> {
        self.attribute("label")
            .filter(|label| !label.is_empty())
            .map(|label| expand_label(label, &format!("{}->{}", self.source, self.target), graph_name))
    }

    pub fn styles(&self) -> Vec<&str> {
        split_styles(self.attribute("style"))
    }

    /// Which ends carry an arrowhead: `(at_source, at_target)`.
    pub fn arrow_ends(&self, directed: bool) -> (bool, bool) {
        let (mut tail, mut head) = match self.attribute("dir") {
            Some("both") => (true, true),
            Some("back") => (true, false),
            Some("none") => (false, false),
            Some("forward") => (false, true),
            _ => (false, directed),
        };
        if self.attribute("arrowhead") == Some("none") {
            head = false;
        }
        if self.attribute("arrowtail") == Some("none") {
            tail = false;
        }
        (tail, head)
    }
}

/// Direction ranks advance in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankDir {
    #[default]
    TopBottom,
    LeftRight,
    BottomTop,
    RightLeft,
}

impl RankDir {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "TB" => Self::TopBottom,
            "LR" => Self::LeftRight,
            "BT" => Self::BottomTop,
            "RL" => Self::RightLeft,
            other => {
                debug!(rankdir = other; "Unknown rankdir, using TB");
                Self::TopBottom
            }
        }
    }

    /// Returns `true` when ranks advance horizontally.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }
}

/// Supported node outlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeShape {
    Box,
    #[default]
    Ellipse,
    Circle,
    DoubleCircle,
    Point,
    Diamond,
    Hexagon,
    PlainText,
}

impl NodeShape {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "box" | "rect" | "rectangle" | "square" => Self::Box,
            "ellipse" | "oval" => Self::Ellipse,
            "circle" => Self::Circle,
            "doublecircle" => Self::DoubleCircle,
            "point" => Self::Point,
            "diamond" => Self::Diamond,
            "hexagon" => Self::Hexagon,
            "plaintext" | "plain" | "none" => Self::PlainText,
            other => {
                debug!(shape = other; "Unsupported node shape, drawing an ellipse");
                Self::Ellipse
            }
        }
    }
}

fn split_styles(style: Option<&str>) -> Vec<&str> {
    style
        .map(|style| {
            style
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Expands `\N`/`\E`/`\G` and turns `\n`, `\l`, `\r` into line breaks.
fn expand_label(raw: &str, object_name: &str, graph_name: &str) -> String {
    let mut label = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            label.push(c);
            continue;
        }
        match chars.next() {
            Some('N') | Some('E') => label.push_str(object_name),
            Some('G') => label.push_str(graph_name),
            Some('n') | Some('l') | Some('r') => label.push('\n'),
            Some(other) => label.push(other),
            None => label.push('\\'),
        }
    }
    label.trim_end_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, attributes: &[(&str, &str)]) -> DotNode {
        DotNode {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_element_id_prefers_attribute() {
        assert_eq!(node("A", &[]).element_id(), Some("A"));
        assert_eq!(node("A", &[("id", "decl-7")]).element_id(), Some("decl-7"));
        assert_eq!(node("A", &[("id", "")]).element_id(), None);
    }

    #[test]
    fn test_label_defaults_to_name() {
        assert_eq!(node("parse_expr", &[]).label("G"), "parse_expr");
        assert_eq!(
            node("A", &[("label", "fn \\N\\nin \\G")]).label("G"),
            "fn A\nin G"
        );
        assert_eq!(node("A", &[("label", "left\\l")]).label("G"), "left");
    }

    #[test]
    fn test_shape_parsing() {
        assert_eq!(node("A", &[]).shape(), NodeShape::Ellipse);
        assert_eq!(node("A", &[("shape", "record")]).shape(), NodeShape::Ellipse);
        assert_eq!(node("A", &[("shape", "Rect")]).shape(), NodeShape::Box);
        assert_eq!(node("A", &[("shape", "none")]).shape(), NodeShape::PlainText);
    }

    #[test]
    fn test_arrow_ends() {
        let edge = |attrs: &[(&str, &str)]| DotEdge {
            source: "A".to_string(),
            target: "B".to_string(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        assert_eq!(edge(&[]).arrow_ends(true), (false, true));
        assert_eq!(edge(&[]).arrow_ends(false), (false, false));
        assert_eq!(edge(&[("dir", "both")]).arrow_ends(true), (true, true));
        assert_eq!(edge(&[("arrowhead", "none")]).arrow_ends(true), (false, false));
        assert_eq!(edge(&[("dir", "back")]).arrow_ends(false), (true, false));
    }

    #[test]
    fn test_merge_parallel_edges_undirected() {
        let mut graph = DotGraph::new("G", false);
        for (source, target) in [("a", "b"), ("b", "a"), ("a", "c")] {
            graph.push_edge(DotEdge {
                source: source.to_string(),
                target: target.to_string(),
                attributes: Attributes::new(),
            });
        }
        graph.merge_parallel_edges();
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn test_rank_dir() {
        let mut graph = DotGraph::new("G", true);
        assert_eq!(graph.rank_dir(), RankDir::TopBottom);
        graph.set_attribute("rankdir".to_string(), "lr".to_string());
        assert_eq!(graph.rank_dir(), RankDir::LeftRight);
        assert!(graph.rank_dir().is_horizontal());
    }
}

//! DOT parsing.
//!
//! The grammar itself is handled by `graphviz-rust`; this module walks the
//! resulting statement tree and resolves it into a [`DotGraph`]:
//!
//! - identifiers are unquoted (`"a b"` becomes `a b`, HTML ids lose their
//!   outer angle brackets)
//! - `node [...]` / `edge [...]` defaults apply to statements that follow
//!   them in the same subgraph and in nested subgraphs
//! - edge chains expand to consecutive pairs, and a subgraph endpoint stands
//!   for every node declared inside it (anonymous `{a b}` groups included,
//!   see [`crate::normalize`])
//! - ports (`a:n`) are ignored

use dot_structures::{
    Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id, Node, NodeId, Stmt, Subgraph, Vertex,
};
use log::{debug, trace};

use crate::{
    error::{DotError, Result},
    model::{Attributes, DotEdge, DotGraph},
    normalize::{SUBGRAPH_ENDPOINT, normalize_subgraphs},
};

/// Parses DOT source into a resolved graph.
///
/// # Errors
///
/// Returns [`DotError::Parse`] when the source is not valid DOT.
pub fn parse(source: &str) -> Result<DotGraph> {
    let source = normalize_subgraphs(source);
    let graph =
        graphviz_rust::parse(&source).map_err(|err| DotError::from_parser_message(&err))?;

    let (id, strict, directed, stmts) = match graph {
        Graph::Graph { id, strict, stmts } => (id, strict, false, stmts),
        Graph::DiGraph { id, strict, stmts } => (id, strict, true, stmts),
    };

    let mut builder = Builder {
        graph: DotGraph::new(unquote(&id), directed),
    };
    builder.statements(&stmts, &Scope::default(), true);
    if strict {
        builder.graph.merge_parallel_edges();
    }

    debug!(
        nodes = builder.graph.nodes().len(),
        edges = builder.graph.edges().len(),
        directed;
        "Parsed DOT graph"
    );
    Ok(builder.graph)
}

/// Default attributes in effect at a point of the statement list.
#[derive(Debug, Clone, Default)]
struct Scope {
    node_defaults: Attributes,
    edge_defaults: Attributes,
}

struct Builder {
    graph: DotGraph,
}

impl Builder {
    /// Processes a statement list and returns the names of the nodes it mentions.
    fn statements(&mut self, stmts: &[Stmt], parent: &Scope, top_level: bool) -> Vec<String> {
        let mut scope = parent.clone();
        let mut members = Vec::new();
        let mut previous_subgraph = Vec::new();

        for stmt in stmts {
            match stmt {
                Stmt::Node(node) => members.push(self.node(node, &scope)),
                Stmt::Edge(edge) => members.extend(self.edge(edge, &scope, &previous_subgraph)),
                Stmt::Subgraph(subgraph) => {
                    previous_subgraph = self.subgraph(subgraph, &scope);
                    members.extend(previous_subgraph.iter().cloned());
                }
                Stmt::Attribute(Attribute(key, value)) => {
                    if top_level {
                        self.graph.set_attribute(unquote(key), unquote(value));
                    }
                }
                Stmt::GAttribute(GraphAttributes::Graph(attributes)) => {
                    if top_level {
                        for (key, value) in resolve(attributes) {
                            self.graph.set_attribute(key, value);
                        }
                    }
                }
                Stmt::GAttribute(GraphAttributes::Node(attributes)) => {
                    scope.node_defaults.extend(resolve(attributes));
                }
                Stmt::GAttribute(GraphAttributes::Edge(attributes)) => {
                    scope.edge_defaults.extend(resolve(attributes));
                }
            }
        }

        members
    }

    fn node(&mut self, node: &Node, scope: &Scope) -> String {
        let name = node_name(&node.id);
        self.graph
            .declare_node(&name, &scope.node_defaults, &resolve(&node.attributes));
        name
    }

    fn subgraph(&mut self, subgraph: &Subgraph, scope: &Scope) -> Vec<String> {
        trace!(subgraph = unquote(&subgraph.id); "Entering subgraph");
        let mut members = self.statements(&subgraph.stmts, scope, false);
        let mut seen = std::collections::HashSet::new();
        members.retain(|name| seen.insert(name.clone()));
        members
    }

    /// Declares every endpoint and records one edge per consecutive pair.
    ///
    /// `previous_subgraph` holds the members of the subgraph statement just
    /// before this one, which a [`SUBGRAPH_ENDPOINT`] vertex refers to.
    fn edge(
        &mut self,
        edge: &Edge,
        scope: &Scope,
        previous_subgraph: &[String],
    ) -> Vec<String> {
        let vertices: Vec<&Vertex> = match &edge.ty {
            EdgeTy::Pair(source, target) => vec![source, target],
            EdgeTy::Chain(chain) => chain.iter().collect(),
        };

        let mut attributes = scope.edge_defaults.clone();
        attributes.extend(resolve(&edge.attributes));

        let groups: Vec<Vec<String>> = vertices
            .into_iter()
            .map(|vertex| self.vertex(vertex, scope, previous_subgraph))
            .collect();

        for pair in groups.windows(2) {
            for source in &pair[0] {
                for target in &pair[1] {
                    self.graph.push_edge(DotEdge {
                        source: source.clone(),
                        target: target.clone(),
                        attributes: attributes.clone(),
                    });
                }
            }
        }

        groups.into_iter().flatten().collect()
    }

    fn vertex(
        &mut self,
        vertex: &Vertex,
        scope: &Scope,
        previous_subgraph: &[String],
    ) -> Vec<String> {
        match vertex {
            Vertex::N(node_id) => {
                let name = node_name(node_id);
                if name == SUBGRAPH_ENDPOINT {
                    return previous_subgraph.to_vec();
                }
                self.graph
                    .declare_node(&name, &scope.node_defaults, &Attributes::new());
                vec![name]
            }
            Vertex::S(subgraph) => self.subgraph(subgraph, scope),
        }
    }
}

fn resolve(attributes: &[Attribute]) -> Attributes {
    attributes
        .iter()
        .map(|Attribute(key, value)| (unquote(key), unquote(value)))
        .collect()
}

fn node_name(node_id: &NodeId) -> String {
    let NodeId(id, _port) = node_id;
    unquote(id)
}

/// Returns the textual value of an identifier without DOT quoting.
fn unquote(id: &Id) -> String {
    match id {
        Id::Html(html) => {
            let inner = html.strip_prefix('<').unwrap_or(html);
            inner.strip_suffix('>').unwrap_or(inner).to_string()
        }
        Id::Escaped(escaped) => {
            let inner = escaped
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(escaped);
            // Quoted strings may be split with a trailing backslash-newline.
            inner.replace("\\\"", "\"").replace("\\\n", "")
        }
        Id::Plain(plain) => plain.clone(),
        Id::Anonymous(anonymous) => anonymous.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_digraph() {
        let graph = parse("digraph G { A -> B }").unwrap();
        assert!(graph.is_directed());
        assert_eq!(graph.name(), "G");
        let names: Vec<_> = graph.nodes().map(|node| node.name()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].source(), "A");
        assert_eq!(graph.edges()[0].target(), "B");
    }

    #[test]
    fn test_parse_quoted_ids() {
        let graph = parse(r#"digraph { "parse expr" -> "emit \"ir\"" [label="calls"] }"#).unwrap();
        assert!(graph.node("parse expr").is_some());
        assert!(graph.node("emit \"ir\"").is_some());
        assert_eq!(graph.edges()[0].attribute("label"), Some("calls"));
    }

    #[test]
    fn test_parse_chain_expands_pairs() {
        let graph = parse("digraph { a -> b -> c }").unwrap();
        let pairs: Vec<_> = graph
            .edges()
            .iter()
            .map(|edge| (edge.source(), edge.target()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn test_parse_subgraph_endpoint_expands() {
        let graph = parse("digraph { a -> { b c } }").unwrap();
        let targets: Vec<_> = graph.edges().iter().map(|edge| edge.target()).collect();
        assert_eq!(targets, vec!["b", "c"]);
    }

    #[test]
    fn test_parse_anonymous_group_target() {
        let graph = parse("digraph { a -> {b c} }").unwrap();
        let pairs: Vec<_> = graph
            .edges()
            .iter()
            .map(|edge| (edge.source(), edge.target()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("a", "c")]);
    }

    #[test]
    fn test_parse_subgraph_source() {
        let graph = parse("digraph { {a b} -> c [color=red] }").unwrap();
        let pairs: Vec<_> = graph
            .edges()
            .iter()
            .map(|edge| (edge.source(), edge.target()))
            .collect();
        assert_eq!(pairs, vec![("a", "c"), ("b", "c")]);
        assert_eq!(graph.edges()[0].attribute("color"), Some("red"));
        let names: Vec<_> = graph.nodes().map(|node| node.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_named_subgraph_source_keeps_defaults() {
        let graph = parse(
            "digraph {
                subgraph s { node [shape=box]; a } -> b -> { c d }
            }",
        )
        .unwrap();
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.node("a").unwrap().attribute("shape"), Some("box"));
        assert_eq!(graph.node("b").unwrap().attribute("shape"), None);
    }

    #[test]
    fn test_parse_error_line_survives_rewrite() {
        let err = parse("digraph {
  {a} -> b
  c -> ;
}").unwrap_err();
        assert!(matches!(err, DotError::Parse { line: Some(3), .. }));
    }

    #[test]
    fn test_parse_scoped_defaults() {
        let graph = parse(
            "digraph {
                node [shape=box];
                a;
                subgraph cluster_x { node [color=red]; b; }
                c;
                a [color=blue];
            }",
        )
        .unwrap();
        let a = graph.node("a").unwrap();
        assert_eq!(a.attribute("shape"), Some("box"));
        assert_eq!(a.attribute("color"), Some("blue"));
        let b = graph.node("b").unwrap();
        assert_eq!(b.attribute("shape"), Some("box"));
        assert_eq!(b.attribute("color"), Some("red"));
        assert_eq!(graph.node("c").unwrap().attribute("color"), None);
    }

    #[test]
    fn test_parse_graph_attributes() {
        let graph = parse("digraph { rankdir=LR; graph [label=\"Decls\"]; a }").unwrap();
        assert_eq!(graph.attribute("rankdir"), Some("LR"));
        assert_eq!(graph.attribute("label"), Some("Decls"));
    }

    #[test]
    fn test_parse_ports_ignored() {
        let graph = parse("digraph { a:n -> b:s }").unwrap();
        assert_eq!(graph.edges()[0].source(), "a");
        assert_eq!(graph.edges()[0].target(), "b");
    }

    #[test]
    fn test_parse_strict_merges_edges() {
        let graph = parse("strict digraph { a -> b; a -> b; b -> a }").unwrap();
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn test_parse_error() {
        let err = parse("digraph { a -> }").unwrap_err();
        assert!(matches!(err, DotError::Parse { .. }));
        assert!(err.to_string().starts_with("syntax error in line"));
    }
}

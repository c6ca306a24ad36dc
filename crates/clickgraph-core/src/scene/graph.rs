//! The abstract scene-graph interface used by post-processing.
//!
//! Post-processing (sizing, background neutralisation, theme recolouring and
//! node interactivity) is written against [`SceneGraph`] rather than against a
//! concrete tree, so it does not care how a layout engine built the scene.
//! Implementors provide element access and a document-order traversal; the
//! selection queries have default implementations that follow the Graphviz
//! SVG conventions (`g.node`, `g.edge`, the first `polygon` as background).

use super::{Element, ElementId, ElementKind};

pub trait SceneGraph {
    /// The root (`svg`) element.
    fn root(&self) -> ElementId;

    fn element(&self, id: ElementId) -> Option<&Element>;

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element>;

    /// `id` and all of its descendants in document (pre-)order.
    fn descendants(&self, id: ElementId) -> Vec<ElementId>;

    /// The shape painting the diagram background: the first polygon in document order.
    fn background_shape(&self) -> Option<ElementId> {
        self.first_of_kind(self.root(), ElementKind::Polygon)
    }

    /// Every text glyph run in the scene.
    fn text_elements(&self) -> Vec<ElementId> {
        self.select(&|element| element.kind() == ElementKind::Text)
    }

    /// Every edge group (`g.edge`).
    fn edge_groups(&self) -> Vec<ElementId> {
        self.select(&|element| element.kind() == ElementKind::Group && element.has_class("edge"))
    }

    /// Every node group (`g.node`).
    fn node_groups(&self) -> Vec<ElementId> {
        self.select(&|element| element.kind() == ElementKind::Group && element.has_class("node"))
    }

    /// The first element of `kind` strictly below `id`, in document order.
    fn first_of_kind(&self, id: ElementId, kind: ElementKind) -> Option<ElementId> {
        self.descendants(id)
            .into_iter()
            .skip(1)
            .find(|candidate| self.element(*candidate).is_some_and(|e| e.kind() == kind))
    }

    /// All elements matching `predicate`, in document order.
    fn select(&self, predicate: &dyn Fn(&Element) -> bool) -> Vec<ElementId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.element(*id).is_some_and(predicate))
            .collect()
    }
}

//! The rendered scene tree.
//!
//! A [`Scene`] is what a layout engine produces: an arena of [`Element`]s
//! rooted at a single `svg` element, following the shape of Graphviz SVG
//! output. Elements refer to each other through [`ElementId`]s, which keeps
//! the tree trivially cloneable and lets post-processing mutate elements in
//! place through the [`SceneGraph`] interface.
//!
//! Besides storage the scene answers two questions the interactive layer
//! needs: which element lies under a container point ([`Scene::hit_test`]),
//! and which elements an event bubbles through ([`Scene::ancestors`]).

mod element;
mod graph;
mod svg;

pub use element::{Element, ElementId, ElementKind, HitArea};
pub use graph::SceneGraph;

use log::warn;

use crate::geometry::{ContainerSize, Point, ViewBox};

/// An arena-backed element tree with a single `svg` root.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    elements: Vec<Element>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene holding only an empty `svg` root.
    pub fn new() -> Self {
        Self {
            elements: vec![Element::new(ElementKind::Svg)],
        }
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// A scene always has its root, so it is empty when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.elements[0].children.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0)
    }

    /// Appends `element` as the last child of `parent` and returns its id.
    ///
    /// An unknown parent attaches the element to the root instead.
    pub fn append(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let parent = if parent.0 < self.elements.len() {
            parent
        } else {
            warn!(parent = parent.0; "Unknown parent element, attaching to root");
            self.root()
        };

        let id = ElementId(self.elements.len());
        element.parent = Some(parent);
        element.children.clear();
        self.elements.push(element);
        self.elements[parent.0].children.push(id);
        id
    }

    /// Returns `id` and all of its descendants in document order.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut ordered = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(element) = self.get(current) else {
                continue;
            };
            ordered.push(current);
            stack.extend(element.children.iter().rev().copied());
        }
        ordered
    }

    /// Returns the bubbling path for an event targeted at `id`: the element
    /// itself followed by each ancestor up to the root.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut path = Vec::new();
        let mut current = self.get(id).map(|_| id);
        while let Some(current_id) = current {
            path.push(current_id);
            current = self.get(current_id).and_then(Element::parent);
        }
        path
    }

    /// Finds the topmost element whose hit area contains `point`.
    ///
    /// `point` is in container coordinates. When the root carries a `viewBox`
    /// the point is first mapped into user space for a viewport of
    /// `viewport` (`xMidYMid meet`); otherwise container and user space
    /// coincide. Later siblings paint over earlier ones, so children are
    /// searched last-to-first. Elements with `pointer-events="none"` and
    /// their subtrees are skipped.
    pub fn hit_test(&self, point: Point, viewport: ContainerSize) -> Option<ElementId> {
        let root = self.get(self.root())?;
        let user_point = match root.attribute("viewBox").map(str::parse::<ViewBox>) {
            Some(Ok(view_box)) => view_box.to_user_space(point, viewport)?,
            Some(Err(err)) => {
                warn!(err:%; "Ignoring malformed viewBox during hit testing");
                point
            }
            None => point,
        };
        self.hit_element(self.root(), user_point)
    }

    fn hit_element(&self, id: ElementId, point: Point) -> Option<ElementId> {
        let element = self.get(id)?;
        if element.attribute("pointer-events") == Some("none") {
            return None;
        }

        let local = match element.transform() {
            Some(transform) => transform.invert(point)?,
            None => point,
        };

        element
            .children
            .iter()
            .rev()
            .find_map(|child| self.hit_element(*child, local))
            .or_else(|| {
                element
                    .hit_area()
                    .is_some_and(|area| area.contains(local))
                    .then_some(id)
            })
    }
}

impl SceneGraph for Scene {
    fn root(&self) -> ElementId {
        Scene::root(self)
    }

    fn element(&self, id: ElementId) -> Option<&Element> {
        self.get(id)
    }

    fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.get_mut(id)
    }

    fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        Scene::descendants(self, id)
    }
}

//! Scene post-processing applied to every successful render.
//!
//! Each pass is written against [`SceneGraph`] so it runs on any scene a
//! layout engine produces. The passes run in the order they are declared
//! here; [`apply`] runs all of them.

use log::trace;

use clickgraph_core::{
    geometry::ContainerSize,
    scene::{ElementId, ElementKind, SceneGraph},
};

/// Makes the scene fill its container while keeping the aspect ratio of `size`.
///
/// An empty `size` (nothing measured yet) keeps the viewBox the engine chose,
/// so the drawing stays visible at its natural proportions.
pub fn normalize_size<G: SceneGraph + ?Sized>(scene: &mut G, size: ContainerSize) {
    let root = scene.root();
    let Some(element) = scene.element_mut(root) else {
        return;
    };
    element.set_attribute("width", "100%");
    element.set_attribute("height", "100%");
    element.set_attribute("preserveAspectRatio", "xMidYMid meet");
    if size.is_empty() {
        trace!("Keeping natural viewBox for an unmeasured container");
        return;
    }
    element.set_attribute("viewBox", size.view_box());
}

/// Lets the host background show through the diagram background.
pub fn neutralize_background<G: SceneGraph + ?Sized>(scene: &mut G) {
    let Some(background) = scene.background_shape() else {
        trace!("Scene has no background shape");
        return;
    };
    if let Some(element) = scene.element_mut(background) {
        element.set_style("fill", "transparent");
    }
}

/// Paints text and edges with the theme foreground.
///
/// Only the first path (the stroke) and the first polygon (the arrowhead)
/// of each edge are recoloured.
pub fn recolor<G: SceneGraph + ?Sized>(scene: &mut G, foreground: &str) {
    for text in scene.text_elements() {
        if let Some(element) = scene.element_mut(text) {
            element.set_style("fill", foreground);
        }
    }

    for edge in scene.edge_groups() {
        let path = scene.first_of_kind(edge, ElementKind::Path);
        if let Some(element) = path.and_then(|path| scene.element_mut(path)) {
            element.set_style("stroke", foreground);
        }
        let arrow = scene.first_of_kind(edge, ElementKind::Polygon);
        if let Some(element) = arrow.and_then(|arrow| scene.element_mut(arrow)) {
            element.set_style("stroke", foreground);
            element.set_style("fill", foreground);
        }
    }
}

/// Marks node groups as clickable and returns them with their identifiers.
///
/// A node without an `id` attribute, or with an empty one, is still marked;
/// its identifier is `None`.
pub fn mark_interactive<G: SceneGraph + ?Sized>(scene: &mut G) -> Vec<(ElementId, Option<String>)> {
    scene
        .node_groups()
        .into_iter()
        .filter_map(|node| {
            let element = scene.element_mut(node)?;
            element.set_attribute("pointer-events", "fill");
            element.set_style("cursor", "pointer");
            let id = element
                .attribute("id")
                .filter(|id| !id.is_empty())
                .map(str::to_string);
            Some((node, id))
        })
        .collect()
}

/// Runs every pass in order and returns the interactive nodes.
pub fn apply<G: SceneGraph + ?Sized>(
    scene: &mut G,
    size: ContainerSize,
    foreground: &str,
) -> Vec<(ElementId, Option<String>)> {
    normalize_size(scene, size);
    neutralize_background(scene);
    recolor(scene, foreground);
    mark_interactive(scene)
}

#[cfg(test)]
mod tests {
    use clickgraph_core::scene::{Element, Scene};

    use super::*;

    /// A hand-built scene in the Graphviz SVG shape.
    fn sample() -> Scene {
        let mut scene = Scene::new();
        let graph = scene.append(
            scene.root(),
            Element::new(ElementKind::Group).with_attribute("class", "graph"),
        );
        scene.append(
            graph,
            Element::new(ElementKind::Polygon).with_attribute("fill", "white"),
        );
        let edge = scene.append(
            graph,
            Element::new(ElementKind::Group).with_attribute("class", "edge"),
        );
        scene.append(edge, Element::new(ElementKind::Path));
        scene.append(edge, Element::new(ElementKind::Polygon));
        scene.append(edge, Element::new(ElementKind::Polygon));
        let a = scene.append(
            graph,
            Element::new(ElementKind::Group)
                .with_attribute("class", "node")
                .with_attribute("id", "A"),
        );
        scene.append(a, Element::new(ElementKind::Ellipse));
        scene.append(a, Element::new(ElementKind::Text).with_text("A"));
        scene.append(
            graph,
            Element::new(ElementKind::Group)
                .with_attribute("class", "node")
                .with_attribute("id", ""),
        );
        scene
    }

    fn find(scene: &Scene, kind: ElementKind) -> Vec<ElementId> {
        scene.select(&|element| element.kind() == kind)
    }

    #[test]
    fn test_normalize_size() {
        let mut scene = sample();
        normalize_size(&mut scene, ContainerSize::new(400.0, 300.0));
        let root = scene.get(scene.root()).unwrap();
        assert_eq!(root.attribute("width"), Some("100%"));
        assert_eq!(root.attribute("height"), Some("100%"));
        assert_eq!(root.attribute("preserveAspectRatio"), Some("xMidYMid meet"));
        assert_eq!(root.attribute("viewBox"), Some("0 0 400 300"));
    }

    #[test]
    fn test_normalize_size_keeps_natural_view_box_when_unmeasured() {
        let mut scene = sample();
        scene
            .get_mut(scene.root())
            .unwrap()
            .set_attribute("viewBox", "0 0 62 116");
        normalize_size(&mut scene, ContainerSize::default());
        let root = scene.get(scene.root()).unwrap();
        assert_eq!(root.attribute("width"), Some("100%"));
        assert_eq!(root.attribute("viewBox"), Some("0 0 62 116"));
    }

    #[test]
    fn test_neutralize_background_touches_first_polygon_only() {
        let mut scene = sample();
        neutralize_background(&mut scene);
        let polygons = find(&scene, ElementKind::Polygon);
        assert_eq!(scene.get(polygons[0]).unwrap().style("fill"), Some("transparent"));
        assert_eq!(scene.get(polygons[1]).unwrap().style("fill"), None);
    }

    #[test]
    fn test_recolor() {
        let mut scene = sample();
        recolor(&mut scene, "#fff");

        let text = find(&scene, ElementKind::Text)[0];
        assert_eq!(scene.get(text).unwrap().style("fill"), Some("#fff"));

        let path = find(&scene, ElementKind::Path)[0];
        assert_eq!(scene.get(path).unwrap().style("stroke"), Some("#fff"));

        let polygons = find(&scene, ElementKind::Polygon);
        // Background untouched, first arrow recoloured, second arrow left alone.
        assert_eq!(scene.get(polygons[0]).unwrap().style("fill"), None);
        assert_eq!(scene.get(polygons[1]).unwrap().style("fill"), Some("#fff"));
        assert_eq!(scene.get(polygons[1]).unwrap().style("stroke"), Some("#fff"));
        assert_eq!(scene.get(polygons[2]).unwrap().style("fill"), None);
    }

    #[test]
    fn test_mark_interactive() {
        let mut scene = sample();
        let nodes = mark_interactive(&mut scene);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].1.as_deref(), Some("A"));
        assert_eq!(nodes[1].1, None);
        for (node, _) in nodes {
            let element = scene.get(node).unwrap();
            assert_eq!(element.attribute("pointer-events"), Some("fill"));
            assert_eq!(element.style("cursor"), Some("pointer"));
        }
    }
}

//! SVG serialisation of a [`Scene`].

use svg::{Node, node::Text as SvgText, node::element as svg_element};

use super::{ElementId, ElementKind, Scene};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

impl Scene {
    /// Serialises the scene as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        self.build_node(self.root())
            .map(|node| node.to_string())
            .unwrap_or_default()
    }

    fn build_node(&self, id: ElementId) -> Option<svg_element::Element> {
        let element = self.get(id)?;
        let mut node = svg_element::Element::new(element.kind().tag());

        if element.kind() == ElementKind::Svg && element.attribute("xmlns").is_none() {
            node.assign("xmlns", SVG_NAMESPACE);
        }
        for (name, value) in element.attributes() {
            node.assign(name, value);
        }
        if let Some(transform) = element.transform() {
            node.assign("transform", transform.to_string());
        }
        if let Some(style) = element.style_declaration() {
            node.assign("style", style);
        }

        if let Some(text) = element.text() {
            node.append(SvgText::new(text));
        }
        for child in element.children() {
            if let Some(child_node) = self.build_node(*child) {
                node.append(child_node);
            }
        }
        Some(node)
    }
}

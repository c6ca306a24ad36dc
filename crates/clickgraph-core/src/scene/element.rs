//! Scene elements and their hit areas.

use indexmap::IndexMap;

use crate::geometry::{Bounds, Point, Transform};

/// Index of an element inside its [`Scene`](crate::scene::Scene).
///
/// Ids are only handed out by the scene that owns the element, so an id
/// always refers to an element of the scene that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Position of the element in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The kind of visual element, mapped one-to-one onto an SVG tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Svg,
    Group,
    Title,
    Text,
    Polygon,
    Ellipse,
    Path,
}

impl ElementKind {
    /// Returns the SVG tag name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Group => "g",
            Self::Title => "title",
            Self::Text => "text",
            Self::Polygon => "polygon",
            Self::Ellipse => "ellipse",
            Self::Path => "path",
        }
    }
}

/// The region of an element that receives pointer events, in the element's
/// own coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub enum HitArea {
    Rect(Bounds),
    Ellipse { center: Point, rx: f32, ry: f32 },
    Polygon(Vec<Point>),
    /// A polyline hit within `tolerance` of any of its segments.
    Stroke { points: Vec<Point>, tolerance: f32 },
}

impl HitArea {
    /// Returns `true` if the point falls inside the area.
    pub fn contains(&self, point: Point) -> bool {
        match self {
            Self::Rect(bounds) => bounds.contains(point),
            Self::Ellipse { center, rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return false;
                }
                let dx = (point.x() - center.x()) / rx;
                let dy = (point.y() - center.y()) / ry;
                dx * dx + dy * dy <= 1.0
            }
            Self::Polygon(points) => polygon_contains(points, point),
            Self::Stroke { points, tolerance } => points
                .windows(2)
                .any(|segment| point.distance_to_segment(segment[0], segment[1]) <= *tolerance),
        }
    }
}

/// Even-odd ray casting.
fn polygon_contains(points: &[Point], point: Point) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y() > point.y()) != (b.y() > point.y()) {
            let crossing_x = (b.x() - a.x()) * (point.y() - a.y()) / (b.y() - a.y()) + a.x();
            if point.x() < crossing_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// One node of the scene tree.
///
/// Attributes and inline style properties keep their insertion order so the
/// serialised SVG is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    text: Option<String>,
    transform: Option<Transform>,
    hit_area: Option<HitArea>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            style: IndexMap::new(),
            text: None,
            transform: None,
            hit_area: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets an attribute (builder style).
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Sets an inline style property (builder style).
    pub fn with_style(mut self, property: impl Into<String>, value: impl ToString) -> Self {
        self.set_style(property, value);
        self
    }

    /// Sets the text content (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the transform (builder style).
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sets the hit area (builder style).
    pub fn with_hit_area(mut self, hit_area: HitArea) -> Self {
        self.hit_area = Some(hit_area);
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl ToString) {
        self.attributes.insert(name.into(), value.to_string());
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, property: impl Into<String>, value: impl ToString) {
        self.style.insert(property.into(), value.to_string());
    }

    /// The inline style serialised as a `style` attribute value, or `None` when empty.
    pub fn style_declaration(&self) -> Option<String> {
        if self.style.is_empty() {
            return None;
        }
        Some(
            self.style
                .iter()
                .map(|(property, value)| format!("{property}: {value};"))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn hit_area(&self) -> Option<&HitArea> {
        self.hit_area.as_ref()
    }

    /// Returns `true` if the whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    #[test]
    fn test_has_class_splits_whitespace() {
        let element = Element::new(ElementKind::Group).with_attribute("class", "node  selected");
        assert!(element.has_class("node"));
        assert!(element.has_class("selected"));
        assert!(!element.has_class("edge"));
        assert!(!Element::new(ElementKind::Group).has_class("node"));
    }

    #[test]
    fn test_style_declaration_keeps_order() {
        let element = Element::new(ElementKind::Path)
            .with_style("stroke", "red")
            .with_style("fill", "none");
        assert_eq!(
            element.style_declaration().as_deref(),
            Some("stroke: red; fill: none;")
        );
        assert!(Element::new(ElementKind::Path).style_declaration().is_none());
    }

    #[test]
    fn test_set_style_overwrites_in_place() {
        let mut element = Element::new(ElementKind::Text)
            .with_style("fill", "black")
            .with_style("font-weight", "bold");
        element.set_style("fill", "white");
        assert_eq!(element.style("fill"), Some("white"));
        assert_eq!(
            element.style_declaration().as_deref(),
            Some("fill: white; font-weight: bold;")
        );
    }

    #[test]
    fn test_hit_area_ellipse() {
        let area = HitArea::Ellipse {
            center: Point::new(10.0, 10.0),
            rx: 5.0,
            ry: 2.0,
        };
        assert!(area.contains(Point::new(14.9, 10.0)));
        assert!(!area.contains(Point::new(14.0, 11.9)));
    }

    #[test]
    fn test_hit_area_polygon_diamond() {
        let area = HitArea::Polygon(vec![
            Point::new(0.0, -10.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(-10.0, 0.0),
        ]);
        assert!(area.contains(Point::new(0.0, 0.0)));
        assert!(area.contains(Point::new(4.0, 4.0)));
        assert!(!area.contains(Point::new(8.0, 8.0)));
    }

    #[test]
    fn test_hit_area_stroke_tolerance() {
        let area = HitArea::Stroke {
            points: vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)],
            tolerance: 2.0,
        };
        assert!(area.contains(Point::new(1.5, 50.0)));
        assert!(!area.contains(Point::new(3.0, 50.0)));
    }

    #[test]
    fn test_hit_area_rect() {
        let area = HitArea::Rect(Bounds::new_from_center(
            Point::new(0.0, 0.0),
            Size::new(2.0, 2.0),
        ));
        assert!(area.contains(Point::new(1.0, -1.0)));
        assert!(!area.contains(Point::new(1.1, 0.0)));
    }
}

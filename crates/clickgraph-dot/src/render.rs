//! Scene construction.
//!
//! The scene mirrors what Graphviz writes for `-Tsvg`:
//!
//! ```text
//! svg
//! └─ g#graph0.graph [transform]
//!    ├─ title
//!    ├─ polygon          (background)
//!    ├─ g#edgeN.edge     (title, path, arrowhead polygons, label text)
//!    ├─ g.node [id]      (title, outline, label text)
//!    └─ text             (graph label)
//! ```
//!
//! Edges are emitted before nodes so that nodes paint, and hit-test, on top.
//! Geometry is computed in layout space first; the `graph0` transform then
//! maps layout space onto the document, either at natural size or fitted and
//! centred inside the requested container.

use log::debug;

use clickgraph_core::{
    color::Color,
    geometry::{Bounds, ContainerSize, Insets, Point, Size, Transform, ViewBox},
    scene::{Element, ElementId, ElementKind, HitArea, Scene},
    text::TextStyle,
};

use crate::{
    LayoutOptions,
    error::Result,
    model::{DotEdge, DotGraph, DotNode, NodeShape, RankDir},
    placement::{self, Spacing},
};

const MIN_NODE_WIDTH: f32 = 54.0;
const MIN_NODE_HEIGHT: f32 = 36.0;
const LABEL_PAD_X: f32 = 16.0;
const LABEL_PAD_Y: f32 = 8.0;
const POINTS_PER_INCH: f32 = 72.0;
const POINT_NODE_SIZE: f32 = 7.2;
const DOUBLE_CIRCLE_GAP: f32 = 4.0;
const ARROW_LENGTH: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 3.5;
const LOOP_REACH: f32 = 24.0;
const LOOP_SAMPLES: usize = 12;
const EDGE_LABEL_GAP: f32 = 4.0;
const EDGE_HIT_TOLERANCE: f32 = 3.0;

/// Lays out `graph` and builds its scene for a container of `target` size.
pub fn build_scene(graph: &DotGraph, options: &LayoutOptions, target: ContainerSize) -> Result<Scene> {
    let rank_dir = graph.rank_dir();
    let mut nodes: Vec<PlacedNode> = graph
        .nodes()
        .map(|node| PlacedNode::measure(node, graph.name(), options))
        .collect();

    let index_edges: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .filter_map(|edge| Some((graph.node_index(edge.source())?, graph.node_index(edge.target())?)))
        .collect();

    // Placement always stacks ranks vertically; horizontal ranks swap axes around it.
    let frame_sizes: Vec<Size> = nodes
        .iter()
        .map(|node| {
            if rank_dir.is_horizontal() {
                node.size.transpose()
            } else {
                node.size
            }
        })
        .collect();
    let spacing = Spacing {
        node: options.node_spacing,
        rank: options.rank_spacing,
    };
    let centers = placement::place(&frame_sizes, &index_edges, spacing)?;
    for (node, center) in nodes.iter_mut().zip(centers) {
        node.center = orient(center, rank_dir);
    }

    let routes: Vec<RoutedEdge> = graph
        .edges()
        .iter()
        .filter_map(|edge| {
            let source = &nodes[graph.node_index(edge.source())?];
            let target = &nodes[graph.node_index(edge.target())?];
            Some(RoutedEdge::route(edge, source, target, graph, options))
        })
        .collect();

    let mut content = nodes
        .iter()
        .map(PlacedNode::bounds)
        .chain(routes.iter().filter_map(RoutedEdge::bounds))
        .reduce(|a, b| a.merge(&b))
        .unwrap_or_default();

    let graph_label = graph
        .attribute("label")
        .filter(|label| !label.is_empty())
        .map(|label| Label::new(label, options.text.clone(), None));
    let graph_label_center = graph_label.as_ref().map(|label| {
        let center = Point::new(
            content.center().x(),
            content.max_y() + EDGE_LABEL_GAP + label.size.height() / 2.0,
        );
        content = content.merge(&Bounds::new_from_center(center, label.size));
        center
    });

    let padded = content.add_padding(Insets::uniform(options.margin));
    let (transform, document) = fit(padded, target);

    let mut scene = Scene::new();
    let root = scene.root();
    if let Some(svg) = scene.get_mut(root) {
        svg.set_attribute("width", num(document.width()));
        svg.set_attribute("height", num(document.height()));
        svg.set_attribute(
            "viewBox",
            ViewBox::new(0.0, 0.0, document.width(), document.height()),
        );
    }

    let graph_group = scene.append(
        root,
        Element::new(ElementKind::Group)
            .with_attribute("id", "graph0")
            .with_attribute("class", "graph")
            .with_transform(transform),
    );
    if !graph.name().is_empty() {
        scene.append(
            graph_group,
            Element::new(ElementKind::Title).with_text(graph.name()),
        );
    }
    scene.append(
        graph_group,
        Element::new(ElementKind::Polygon)
            .with_attribute("fill", paint(graph.attribute("bgcolor"), "white"))
            .with_attribute("stroke", "none")
            .with_attribute("points", points_attr(&rectangle(padded))),
    );

    let connector = if graph.is_directed() { "->" } else { "--" };
    for (index, route) in routes.iter().enumerate() {
        route.emit(&mut scene, graph_group, index, connector);
    }
    for node in &nodes {
        node.emit(&mut scene, graph_group);
    }
    if let (Some(label), Some(center)) = (&graph_label, graph_label_center) {
        label.emit(&mut scene, graph_group, center);
    }

    debug!(
        nodes = nodes.len(),
        edges = routes.len(),
        width = document.width(),
        height = document.height(),
        scale = transform.scale();
        "Built DOT scene"
    );
    Ok(scene)
}

/// Maps a point from the vertical placement frame into the graph's rank direction.
fn orient(point: Point, rank_dir: RankDir) -> Point {
    match rank_dir {
        RankDir::TopBottom => point,
        RankDir::BottomTop => Point::new(point.x(), -point.y()),
        RankDir::LeftRight => point.transpose(),
        RankDir::RightLeft => Point::new(-point.y(), point.x()),
    }
}

/// Transform from layout space to the document, and the document size.
///
/// An empty target keeps the natural size; otherwise the content is scaled
/// uniformly to fit and centred.
fn fit(content: Bounds, target: ContainerSize) -> (Transform, Size) {
    let natural = content.to_size();
    if target.is_empty() || natural.width() <= 0.0 || natural.height() <= 0.0 {
        let offset = Point::new(-content.min_x(), -content.min_y());
        return (Transform::new(1.0, offset), natural);
    }

    let scale = (target.width() / natural.width()).min(target.height() / natural.height());
    let offset = Point::new(
        (target.width() - natural.width() * scale) / 2.0 - content.min_x() * scale,
        (target.height() - natural.height() * scale) / 2.0 - content.min_y() * scale,
    );
    (
        Transform::new(scale, offset),
        Size::new(target.width(), target.height()),
    )
}

/// A possibly multi-line text label with its measured size.
#[derive(Debug, Clone)]
struct Label {
    lines: Vec<String>,
    style: TextStyle,
    size: Size,
    color: Option<String>,
}

impl Label {
    fn new(text: &str, style: TextStyle, color: Option<String>) -> Self {
        let size = style.measure(text);
        Self {
            lines: text.lines().map(str::to_string).collect(),
            style,
            size,
            color,
        }
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn emit(&self, scene: &mut Scene, parent: ElementId, center: Point) {
        let line_height = self.style.line_height();
        let top = center.y() - line_height * self.lines.len() as f32 / 2.0;
        for (index, line) in self.lines.iter().enumerate() {
            let baseline = top + line_height * (index as f32 + 0.5) + self.style.font_size() * 0.3;
            let mut text = Element::new(ElementKind::Text)
                .with_attribute("text-anchor", "middle")
                .with_attribute("x", num(center.x()))
                .with_attribute("y", num(baseline))
                .with_attribute("font-family", self.style.font_family())
                .with_attribute("font-size", num(self.style.font_size()))
                .with_text(line.as_str());
            if let Some(color) = &self.color {
                text.set_attribute("fill", color);
            }
            scene.append(parent, text);
        }
    }
}

fn text_style(attribute: impl Fn(&str) -> Option<String>, options: &LayoutOptions) -> TextStyle {
    let family = attribute("fontname").unwrap_or_else(|| options.text.font_family().to_string());
    let size = attribute("fontsize")
        .and_then(|size| size.trim().parse::<f32>().ok())
        .filter(|size| *size > 0.0)
        .unwrap_or(options.text.font_size());
    TextStyle::new(family, size)
}

struct PlacedNode<'a> {
    node: &'a DotNode,
    shape: NodeShape,
    label: Label,
    size: Size,
    center: Point,
}

impl<'a> PlacedNode<'a> {
    fn measure(node: &'a DotNode, graph_name: &str, options: &LayoutOptions) -> Self {
        let shape = node.shape();
        let style = text_style(|name| node.attribute(name).map(str::to_string), options);
        let color = node
            .attribute("fontcolor")
            .and_then(valid_color);
        let label = Label::new(&node.label(graph_name), style, color);

        let padded = Size::new(
            label.size.width() + LABEL_PAD_X,
            label.size.height() + LABEL_PAD_Y,
        );
        let mut size = match shape {
            NodeShape::Box | NodeShape::PlainText => padded,
            NodeShape::Ellipse => Size::new(
                padded.width() * std::f32::consts::SQRT_2,
                padded.height() * std::f32::consts::SQRT_2,
            ),
            NodeShape::Circle | NodeShape::DoubleCircle => {
                let diameter = (padded.width().max(padded.height()) * std::f32::consts::SQRT_2)
                    .max(MIN_NODE_WIDTH);
                Size::new(diameter, diameter)
            }
            NodeShape::Diamond => Size::new(padded.width() * 2.0, padded.height() * 2.0),
            NodeShape::Hexagon => Size::new(padded.width() * 1.3, padded.height()),
            NodeShape::Point => Size::new(POINT_NODE_SIZE, POINT_NODE_SIZE),
        };

        if shape != NodeShape::Point {
            size = size.max(Size::new(MIN_NODE_WIDTH, MIN_NODE_HEIGHT));
            let inches = |name| {
                node.attribute(name)
                    .and_then(|value| value.trim().parse::<f32>().ok())
                    .map_or(0.0, |value| value * POINTS_PER_INCH)
            };
            size = size.max(Size::new(inches("width"), inches("height")));
            if matches!(shape, NodeShape::Circle | NodeShape::DoubleCircle) {
                let diameter = size.width().max(size.height());
                size = Size::new(diameter, diameter);
            }
        }
        if shape == NodeShape::DoubleCircle {
            size = Size::new(
                size.width() + 2.0 * DOUBLE_CIRCLE_GAP,
                size.height() + 2.0 * DOUBLE_CIRCLE_GAP,
            );
        }

        Self {
            node,
            shape,
            label,
            size,
            center: Point::default(),
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds::new_from_center(self.center, self.size)
    }

    fn is_invisible(&self) -> bool {
        self.node.styles().contains(&"invis")
    }

    fn is_elliptic(&self) -> bool {
        matches!(
            self.shape,
            NodeShape::Ellipse | NodeShape::Circle | NodeShape::DoubleCircle | NodeShape::Point
        )
    }

    /// Outline vertices for polygonal shapes, clockwise from the top right.
    fn outline(&self) -> Vec<Point> {
        let (cx, cy) = (self.center.x(), self.center.y());
        let (rx, ry) = (self.size.width() / 2.0, self.size.height() / 2.0);
        match self.shape {
            NodeShape::Diamond => vec![
                Point::new(cx, cy - ry),
                Point::new(cx + rx, cy),
                Point::new(cx, cy + ry),
                Point::new(cx - rx, cy),
            ],
            NodeShape::Hexagon => vec![
                Point::new(cx + rx / 2.0, cy - ry),
                Point::new(cx + rx, cy),
                Point::new(cx + rx / 2.0, cy + ry),
                Point::new(cx - rx / 2.0, cy + ry),
                Point::new(cx - rx, cy),
                Point::new(cx - rx / 2.0, cy - ry),
            ],
            _ => rectangle(self.bounds()),
        }
    }

    /// The point where the segment from the centre towards `toward` leaves the outline.
    fn boundary_toward(&self, toward: Point) -> Point {
        let delta = toward.sub_point(self.center);
        let (dx, dy) = (delta.x(), delta.y());
        if delta.hypot() < f32::EPSILON {
            return self.center;
        }
        let (rx, ry) = (self.size.width() / 2.0, self.size.height() / 2.0);

        let t = if self.is_elliptic() {
            1.0 / ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt()
        } else if self.shape == NodeShape::Diamond {
            1.0 / (dx.abs() / rx + dy.abs() / ry)
        } else {
            let tx = if dx == 0.0 { f32::INFINITY } else { rx / dx.abs() };
            let ty = if dy == 0.0 { f32::INFINITY } else { ry / dy.abs() };
            tx.min(ty)
        };
        self.center.add_point(delta.scale(t.min(1.0)))
    }

    fn emit(&self, scene: &mut Scene, parent: ElementId) {
        let mut group = Element::new(ElementKind::Group).with_attribute("class", "node");
        if let Some(id) = self.node.element_id() {
            group.set_attribute("id", id);
        }
        let group = scene.append(parent, group);
        scene.append(
            group,
            Element::new(ElementKind::Title).with_text(self.node.name()),
        );
        if self.is_invisible() {
            return;
        }

        let styles = self.node.styles();
        let stroke = paint(self.node.attribute("color"), "black");
        let fill = if self.shape == NodeShape::Point {
            paint(self.node.attribute("fillcolor").or(self.node.attribute("color")), "black")
        } else if styles.contains(&"filled") {
            paint(
                self.node.attribute("fillcolor").or(self.node.attribute("color")),
                "lightgrey",
            )
        } else {
            "none".to_string()
        };
        let (stroke, fill) = if self.shape == NodeShape::PlainText {
            ("transparent".to_string(), fill)
        } else {
            (stroke, fill)
        };

        let shape = if self.is_elliptic() {
            let (rx, ry) = (self.size.width() / 2.0, self.size.height() / 2.0);
            if self.shape == NodeShape::DoubleCircle {
                scene.append(
                    group,
                    ellipse(self.center, rx - DOUBLE_CIRCLE_GAP, ry - DOUBLE_CIRCLE_GAP)
                        .with_attribute("fill", &fill)
                        .with_attribute("stroke", &stroke),
                );
            }
            ellipse(self.center, rx, ry).with_hit_area(HitArea::Ellipse {
                center: self.center,
                rx,
                ry,
            })
        } else {
            let outline = self.outline();
            Element::new(ElementKind::Polygon)
                .with_attribute("points", points_attr(&outline))
                .with_hit_area(HitArea::Polygon(outline))
        };
        let mut shape = shape
            .with_attribute("fill", fill)
            .with_attribute("stroke", stroke);
        if let Some(dash) = dash_array(&styles) {
            shape.set_attribute("stroke-dasharray", dash);
        }
        scene.append(group, shape);

        if self.shape != NodeShape::Point && !self.label.is_empty() {
            self.label.emit(scene, group, self.center);
        }
    }
}

fn ellipse(center: Point, rx: f32, ry: f32) -> Element {
    Element::new(ElementKind::Ellipse)
        .with_attribute("cx", num(center.x()))
        .with_attribute("cy", num(center.y()))
        .with_attribute("rx", num(rx))
        .with_attribute("ry", num(ry))
}

struct RoutedEdge<'a> {
    edge: &'a DotEdge,
    path: String,
    stroke: Vec<Point>,
    arrows: Vec<[Point; 3]>,
    label: Option<(Label, Point)>,
}

impl<'a> RoutedEdge<'a> {
    fn route(
        edge: &'a DotEdge,
        source: &PlacedNode<'_>,
        target: &PlacedNode<'_>,
        graph: &DotGraph,
        options: &LayoutOptions,
    ) -> Self {
        let (tail, head) = edge.arrow_ends(graph.is_directed());
        let mut routed = if edge.source() == edge.target() {
            Self::self_loop(edge, source, head || tail)
        } else {
            Self::straight(edge, source, target, tail, head)
        };

        routed.label = edge.label(graph.name()).map(|text| {
            let style = text_style(|name| edge.attribute(name).map(str::to_string), options);
            let color = edge.attribute("fontcolor").and_then(valid_color);
            let label = Label::new(&text, style, color);
            let anchor = routed.label_anchor(source);
            let center = Point::new(
                anchor.x() + EDGE_LABEL_GAP + label.size.width() / 2.0,
                anchor.y(),
            );
            (label, center)
        });
        routed
    }

    fn straight(
        edge: &'a DotEdge,
        source: &PlacedNode<'_>,
        target: &PlacedNode<'_>,
        tail: bool,
        head: bool,
    ) -> Self {
        let start = source.boundary_toward(target.center);
        let end = target.boundary_toward(source.center);
        let delta = end.sub_point(start);
        let length = delta.hypot();
        if length < f32::EPSILON {
            return Self::empty(edge);
        }
        let direction = delta.scale(1.0 / length);

        let mut arrows = Vec::new();
        let (mut path_start, mut path_end) = (start, end);
        if head && length > ARROW_LENGTH {
            path_end = end.sub_point(direction.scale(ARROW_LENGTH));
            arrows.push(arrowhead(end, direction));
        }
        if tail && length > ARROW_LENGTH {
            path_start = start.add_point(direction.scale(ARROW_LENGTH));
            arrows.push(arrowhead(start, direction.scale(-1.0)));
        }

        Self {
            edge,
            path: format!(
                "M{},{}L{},{}",
                num(path_start.x()),
                num(path_start.y()),
                num(path_end.x()),
                num(path_end.y())
            ),
            stroke: vec![start, end],
            arrows,
            label: None,
        }
    }

    /// A loop bulging out of the right side of the node.
    fn self_loop(edge: &'a DotEdge, node: &PlacedNode<'_>, arrow: bool) -> Self {
        let center = node.center;
        let (rx, ry) = (node.size.width() / 2.0, node.size.height() / 2.0);
        let start = node.boundary_toward(center.add_point(Point::new(rx, -ry / 2.0)));
        let end = node.boundary_toward(center.add_point(Point::new(rx, ry / 2.0)));
        let control_out = Point::new(center.x() + rx + LOOP_REACH, center.y() - ry);
        let control_in = Point::new(center.x() + rx + LOOP_REACH, center.y() + ry);

        let stroke: Vec<Point> = (0..=LOOP_SAMPLES)
            .map(|step| cubic(start, control_out, control_in, end, step as f32 / LOOP_SAMPLES as f32))
            .collect();

        let mut arrows = Vec::new();
        let tangent = end.sub_point(control_in);
        if arrow && tangent.hypot() > f32::EPSILON {
            arrows.push(arrowhead(end, tangent.scale(1.0 / tangent.hypot())));
        }

        Self {
            edge,
            path: format!(
                "M{},{}C{},{} {},{} {},{}",
                num(start.x()),
                num(start.y()),
                num(control_out.x()),
                num(control_out.y()),
                num(control_in.x()),
                num(control_in.y()),
                num(end.x()),
                num(end.y())
            ),
            stroke,
            arrows,
            label: None,
        }
    }

    fn empty(edge: &'a DotEdge) -> Self {
        Self {
            edge,
            path: String::new(),
            stroke: Vec::new(),
            arrows: Vec::new(),
            label: None,
        }
    }

    /// Where an edge label attaches: the middle of a straight edge, the far
    /// side of a loop.
    fn label_anchor(&self, source: &PlacedNode<'_>) -> Point {
        if self.edge.source() == self.edge.target() {
            return self
                .stroke
                .iter()
                .copied()
                .max_by(|a, b| a.x().total_cmp(&b.x()))
                .unwrap_or(source.center);
        }
        match (self.stroke.first(), self.stroke.last()) {
            (Some(start), Some(end)) => start.midpoint(*end),
            _ => source.center,
        }
    }

    fn is_invisible(&self) -> bool {
        self.edge.styles().contains(&"invis")
    }

    fn bounds(&self) -> Option<Bounds> {
        let mut bounds = bounds_of(
            self.stroke
                .iter()
                .chain(self.arrows.iter().flatten())
                .copied(),
        );
        if let Some((label, center)) = &self.label {
            let label_bounds = Bounds::new_from_center(*center, label.size);
            bounds = Some(bounds.map_or(label_bounds, |b| b.merge(&label_bounds)));
        }
        bounds
    }

    fn emit(&self, scene: &mut Scene, parent: ElementId, index: usize, connector: &str) {
        let id = self
            .edge
            .attribute("id")
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("edge{}", index + 1), str::to_string);
        let group = scene.append(
            parent,
            Element::new(ElementKind::Group)
                .with_attribute("id", id)
                .with_attribute("class", "edge"),
        );
        scene.append(
            group,
            Element::new(ElementKind::Title).with_text(format!(
                "{}{connector}{}",
                self.edge.source(),
                self.edge.target()
            )),
        );
        if self.is_invisible() || self.path.is_empty() {
            return;
        }

        let color = paint(self.edge.attribute("color"), "black");
        let mut path = Element::new(ElementKind::Path)
            .with_attribute("fill", "none")
            .with_attribute("stroke", &color)
            .with_attribute("d", &self.path)
            .with_hit_area(HitArea::Stroke {
                points: self.stroke.clone(),
                tolerance: EDGE_HIT_TOLERANCE,
            });
        if let Some(dash) = dash_array(&self.edge.styles()) {
            path.set_attribute("stroke-dasharray", dash);
        }
        scene.append(group, path);

        for arrow in &self.arrows {
            scene.append(
                group,
                Element::new(ElementKind::Polygon)
                    .with_attribute("fill", &color)
                    .with_attribute("stroke", &color)
                    .with_attribute("points", points_attr(arrow))
                    .with_hit_area(HitArea::Polygon(arrow.to_vec())),
            );
        }

        if let Some((label, center)) = &self.label {
            label.emit(scene, group, *center);
        }
    }
}

fn arrowhead(tip: Point, direction: Point) -> [Point; 3] {
    let base = tip.sub_point(direction.scale(ARROW_LENGTH));
    let normal = Point::new(-direction.y(), direction.x()).scale(ARROW_HALF_WIDTH);
    [tip, base.add_point(normal), base.sub_point(normal)]
}

fn cubic(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    p0.scale(u * u * u)
        .add_point(p1.scale(3.0 * u * u * t))
        .add_point(p2.scale(3.0 * u * t * t))
        .add_point(p3.scale(t * t * t))
}

fn bounds_of(points: impl Iterator<Item = Point>) -> Option<Bounds> {
    points
        .map(|point| Bounds::new_from_center(point, Size::default()))
        .reduce(|a, b| a.merge(&b))
}

/// Corners of `bounds`, starting bottom left and going clockwise (Graphviz order).
fn rectangle(bounds: Bounds) -> Vec<Point> {
    vec![
        Point::new(bounds.min_x(), bounds.max_y()),
        Point::new(bounds.min_x(), bounds.min_y()),
        Point::new(bounds.max_x(), bounds.min_y()),
        Point::new(bounds.max_x(), bounds.max_y()),
    ]
}

/// `points` attribute value; the first vertex is repeated to close the outline.
fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .chain(points.first())
        .map(|point| format!("{},{}", num(point.x()), num(point.y())))
        .collect::<Vec<_>>()
        .join(" ")
}

fn dash_array(styles: &[&str]) -> Option<&'static str> {
    if styles.contains(&"dashed") {
        Some("5,2")
    } else if styles.contains(&"dotted") {
        Some("1,5")
    } else {
        None
    }
}

fn valid_color(value: &str) -> Option<String> {
    match Color::new(value) {
        Ok(_) => Some(value.trim().to_string()),
        Err(err) => {
            debug!(err:%; "Ignoring unsupported color");
            None
        }
    }
}

/// A validated paint value, or `default` when absent or unsupported.
fn paint(value: Option<&str>, default: &str) -> String {
    value
        .and_then(valid_color)
        .unwrap_or_else(|| default.to_string())
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
fn num(value: f32) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::parser::parse;
    use clickgraph_core::scene::SceneGraph;

    fn build(source: &str, target: ContainerSize) -> Scene {
        let graph = parse(source).unwrap();
        build_scene(&graph, &LayoutOptions::default(), target).unwrap()
    }

    fn node_group(scene: &Scene, id: &str) -> ElementId {
        scene
            .node_groups()
            .into_iter()
            .find(|group| scene.get(*group).and_then(|e| e.attribute("id")) == Some(id))
            .unwrap()
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(12.0), "12");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(3.14159), "3.14");
    }

    #[test]
    fn test_structure_follows_graphviz() {
        let scene = build("digraph G { A -> B }", ContainerSize::default());
        let root = scene.get(scene.root()).unwrap();
        let graph = root.children()[0];
        let graph_element = scene.get(graph).unwrap();
        assert!(graph_element.has_class("graph"));
        assert_eq!(graph_element.attribute("id"), Some("graph0"));

        let kinds: Vec<_> = graph_element
            .children()
            .iter()
            .map(|child| scene.get(*child).unwrap().kind())
            .collect();
        assert_eq!(kinds[0], ElementKind::Title);
        assert_eq!(kinds[1], ElementKind::Polygon);

        let edges = scene.edge_groups();
        let nodes = scene.node_groups();
        assert_eq!(edges.len(), 1);
        assert_eq!(nodes.len(), 2);
        assert!(edges[0] < nodes[0], "edges precede nodes");
        assert_eq!(scene.background_shape(), Some(graph_element.children()[1]));
    }

    #[test]
    fn test_node_ids() {
        let scene = build(
            r#"digraph { A; B [id="decl-b"]; C [id=""] }"#,
            ContainerSize::default(),
        );
        let ids: Vec<_> = scene
            .node_groups()
            .into_iter()
            .map(|group| scene.get(group).unwrap().attribute("id").map(str::to_string))
            .collect();
        assert_eq!(
            ids,
            vec![Some("A".to_string()), Some("decl-b".to_string()), None]
        );
    }

    #[test]
    fn test_edge_group_has_path_and_arrow() {
        let scene = build("digraph { A -> B [color=red] }", ContainerSize::default());
        let edge = scene.edge_groups()[0];
        let edge_element = scene.get(edge).unwrap();
        assert_eq!(edge_element.attribute("id"), Some("edge1"));
        let path = scene.first_of_kind(edge, ElementKind::Path).unwrap();
        assert_eq!(scene.get(path).unwrap().attribute("stroke"), Some("red"));
        assert!(scene.first_of_kind(edge, ElementKind::Polygon).is_some());
        let title = scene.first_of_kind(edge, ElementKind::Title).unwrap();
        assert_eq!(scene.get(title).unwrap().text(), Some("A->B"));
    }

    #[test]
    fn test_undirected_edge_has_no_arrow() {
        let scene = build("graph { A -- B }", ContainerSize::default());
        let edge = scene.edge_groups()[0];
        assert!(scene.first_of_kind(edge, ElementKind::Polygon).is_none());
        let title = scene.first_of_kind(edge, ElementKind::Title).unwrap();
        assert_eq!(scene.get(title).unwrap().text(), Some("A--B"));
    }

    #[test]
    fn test_invisible_edge_has_only_title() {
        let scene = build("digraph { A -> B [style=invis] }", ContainerSize::default());
        let edge = scene.edge_groups()[0];
        assert_eq!(scene.get(edge).unwrap().children().len(), 1);
    }

    #[test]
    fn test_minimum_node_size() {
        let graph = parse("digraph { a [shape=box] }").unwrap();
        let options = LayoutOptions::default();
        let node = PlacedNode::measure(graph.nodes().next().unwrap(), "", &options);
        assert!(node.size.width() >= MIN_NODE_WIDTH);
        assert!(node.size.height() >= MIN_NODE_HEIGHT);
    }

    #[test]
    fn test_natural_size_without_target() {
        let scene = build("digraph { A -> B }", ContainerSize::default());
        let root = scene.get(scene.root()).unwrap();
        let view_box: ViewBox = root.attribute("viewBox").unwrap().parse().unwrap();
        let graph = scene.get(root.children()[0]).unwrap();
        assert_approx_eq!(f32, graph.transform().unwrap().scale(), 1.0);
        // Two stacked default nodes plus the rank gap and margins.
        assert!(view_box.height() > 2.0 * MIN_NODE_HEIGHT);
    }

    #[test]
    fn test_fit_into_target() {
        let target = ContainerSize::new(400.0, 300.0);
        let scene = build("digraph { A -> B }", target);
        let root = scene.get(scene.root()).unwrap();
        assert_eq!(root.attribute("viewBox"), Some("0 0 400 300"));
        assert_eq!(root.attribute("width"), Some("400"));

        // Every node lies inside the target once the graph transform is applied.
        let transform = scene.get(root.children()[0]).unwrap().transform().unwrap();
        for group in scene.node_groups() {
            let shape = scene.first_of_kind(group, ElementKind::Ellipse).unwrap();
            let element = scene.get(shape).unwrap();
            let cx: f32 = element.attribute("cx").unwrap().parse().unwrap();
            let cy: f32 = element.attribute("cy").unwrap().parse().unwrap();
            let mapped = transform.apply(Point::new(cx, cy));
            assert!((0.0..=400.0).contains(&mapped.x()));
            assert!((0.0..=300.0).contains(&mapped.y()));
        }
    }

    #[test]
    fn test_fit_centres_content() {
        let content = Bounds::new_from_top_left(Point::new(-10.0, -10.0), Size::new(100.0, 50.0));
        let (transform, document) = fit(content, ContainerSize::new(400.0, 400.0));
        assert_approx_eq!(f32, transform.scale(), 4.0);
        assert_approx_eq!(f32, document.width(), 400.0);
        let top_left = transform.apply(Point::new(-10.0, -10.0));
        assert_approx_eq!(f32, top_left.x(), 0.0);
        assert_approx_eq!(f32, top_left.y(), 100.0);
    }

    #[test]
    fn test_click_target_is_node_shape() {
        let target = ContainerSize::new(400.0, 300.0);
        let scene = build("digraph { A -> B }", target);
        let a = node_group(&scene, "A");
        let shape = scene.first_of_kind(a, ElementKind::Ellipse).unwrap();
        let element = scene.get(shape).unwrap();
        let cx: f32 = element.attribute("cx").unwrap().parse().unwrap();
        let cy: f32 = element.attribute("cy").unwrap().parse().unwrap();
        let graph = scene.get(scene.root()).unwrap().children()[0];
        let transform = scene.get(graph).unwrap().transform().unwrap();
        let hit = scene.hit_test(transform.apply(Point::new(cx, cy)), target);
        assert_eq!(hit, Some(shape));
    }

    #[test]
    fn test_rank_dir_left_right() {
        let scene = build("digraph { rankdir=LR; A -> B }", ContainerSize::default());
        let centre = |id: &str| {
            let shape = scene
                .first_of_kind(node_group(&scene, id), ElementKind::Ellipse)
                .unwrap();
            let element = scene.get(shape).unwrap();
            let cx: f32 = element.attribute("cx").unwrap().parse().unwrap();
            let cy: f32 = element.attribute("cy").unwrap().parse().unwrap();
            Point::new(cx, cy)
        };
        let (a, b) = (centre("A"), centre("B"));
        assert!(a.x() < b.x());
        assert_approx_eq!(f32, a.y(), b.y());
    }

    #[test]
    fn test_self_loop_is_drawn() {
        let scene = build("digraph { A -> A }", ContainerSize::default());
        let edge = scene.edge_groups()[0];
        let path = scene.first_of_kind(edge, ElementKind::Path).unwrap();
        assert!(scene.get(path).unwrap().attribute("d").unwrap().contains('C'));
    }

    #[test]
    fn test_boundary_of_box() {
        let graph = parse("digraph { a [shape=box, width=1, height=1] }").unwrap();
        let mut node = PlacedNode::measure(graph.nodes().next().unwrap(), "", &LayoutOptions::default());
        node.center = Point::new(0.0, 0.0);
        let exit = node.boundary_toward(Point::new(100.0, 0.0));
        assert_approx_eq!(f32, exit.x(), 36.0);
        assert_approx_eq!(f32, exit.y(), 0.0);
    }
}

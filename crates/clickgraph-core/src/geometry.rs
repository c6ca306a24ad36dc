//! Geometric primitives for scene layout, viewports and hit-testing.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//! - [`Transform`] - A uniform scale followed by a translation, as written in SVG
//! - [`ContainerSize`] - The measured size of the host container
//! - [`ViewBox`] - An SVG `viewBox` and its `xMidYMid meet` viewport mapping
//!
//! # Coordinate System
//!
//! All coordinates follow SVG conventions:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A 2D point.
///
/// # Examples
///
/// ```
/// # use clickgraph_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the Euclidean distance from the origin
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Returns the point with its coordinates exchanged.
    ///
    /// Used to turn a top-to-bottom placement into a left-to-right one.
    pub fn transpose(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }

    /// Distance from this point to the segment `a`-`b`.
    pub fn distance_to_segment(self, a: Point, b: Point) -> f32 {
        let ab = b.sub_point(a);
        let len_sq = ab.x * ab.x + ab.y * ab.y;
        if len_sq == 0.0 {
            return self.sub_point(a).hypot();
        }
        let ap = self.sub_point(a);
        let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
        let projection = a.add_point(ab.scale(t));
        self.sub_point(projection).hypot()
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns a new Size with padding added to both width and height
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.horizontal_sum(),
            height: self.height + insets.vertical_sum(),
        }
    }

    /// Returns the size with width and height exchanged
    pub fn transpose(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Returns `true` if the point lies inside or on the edge of the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// # use clickgraph_core::geometry::{Bounds, Point, Size};
    /// let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 5.0));
    /// assert!(bounds.contains(Point::new(10.0, 5.0)));
    /// assert!(!bounds.contains(Point::new(10.5, 2.0)));
    /// ```
    pub fn contains(self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Merges two bounds into the smallest bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use clickgraph_core::geometry::{Bounds, Point, Size};
    /// let header = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let content = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = header.merge(&content);
    /// assert_eq!(combined.min_x(), 0.0);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Expands the bounds by adding insets on every side.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left(),
            min_y: self.min_y - insets.top(),
            max_x: self.max_x + insets.right(),
            max_y: self.max_y + insets.bottom(),
        }
    }
}

/// Represents spacing around an element with potentially different values for each side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates new insets with specified values for each side
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates uniform insets with the same value for all sides
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }

    /// Returns the sum of left and right insets
    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    /// Returns the sum of top and bottom insets
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

/// A uniform scale followed by a translation: `p' = p * scale + offset`.
///
/// Serialises as `translate(tx ty) scale(s)`, the form Graphviz writes on its
/// top-level graph group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f32,
    offset: Point,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(scale: f32, offset: Point) -> Self {
        Self { scale, offset }
    }

    pub fn identity() -> Self {
        Self::new(1.0, Point::default())
    }

    pub fn scale(self) -> f32 {
        self.scale
    }

    pub fn offset(self) -> Point {
        self.offset
    }

    /// Maps a point from the transformed element's space to its parent's space.
    pub fn apply(self, point: Point) -> Point {
        point.scale(self.scale).add_point(self.offset)
    }

    /// Maps a point from the parent's space into the transformed element's space.
    ///
    /// Returns `None` for a degenerate (zero) scale.
    pub fn invert(self, point: Point) -> Option<Point> {
        if self.scale == 0.0 {
            return None;
        }
        Some(point.sub_point(self.offset).scale(1.0 / self.scale))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate({} {}) scale({})",
            self.offset.x, self.offset.y, self.scale
        )
    }
}

/// The measured size of the host container.
///
/// Defaults to `0 x 0` until the first measurement arrives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    width: f32,
    height: f32,
}

impl ContainerSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns `true` while either dimension is zero (nothing measured yet or a collapsed panel).
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// The `viewBox` that maps this size one-to-one onto user space.
    pub fn view_box(self) -> ViewBox {
        ViewBox::new(0.0, 0.0, self.width, self.height)
    }
}

impl fmt::Display for ContainerSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An SVG `viewBox` (`min-x min-y width height`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewBox {
    min_x: f32,
    min_y: f32,
    width: f32,
    height: f32,
}

impl ViewBox {
    pub fn new(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Maps a point in viewport (container) coordinates into user space,
    /// following `preserveAspectRatio="xMidYMid meet"`.
    ///
    /// Returns `None` when either the viewBox or the viewport is degenerate.
    ///
    /// # Examples
    ///
    /// ```
    /// # use clickgraph_core::geometry::{ContainerSize, Point, ViewBox};
    /// let view_box = ViewBox::new(0.0, 0.0, 100.0, 100.0);
    /// // The viewport is twice as wide: content is centred horizontally.
    /// let viewport = ContainerSize::new(400.0, 200.0);
    /// let user = view_box.to_user_space(Point::new(200.0, 100.0), viewport).unwrap();
    /// assert_eq!(user, Point::new(50.0, 50.0));
    /// ```
    pub fn to_user_space(self, point: Point, viewport: ContainerSize) -> Option<Point> {
        if self.width <= 0.0 || self.height <= 0.0 || viewport.is_empty() {
            return None;
        }
        let scale = (viewport.width() / self.width).min(viewport.height() / self.height);
        let offset_x = (viewport.width() - self.width * scale) / 2.0;
        let offset_y = (viewport.height() - self.height * scale) / 2.0;
        Some(Point::new(
            (point.x - offset_x) / scale + self.min_x,
            (point.y - offset_y) / scale + self.min_y,
        ))
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

impl FromStr for ViewBox {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(|c: char| c.is_ascii_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<f32>()
                    .map_err(|err| format!("invalid viewBox component `{part}`: {err}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [min_x, min_y, width, height] => Ok(Self::new(*min_x, *min_y, *width, *height)),
            _ => Err(format!(
                "viewBox needs four components, found {}",
                values.len()
            )),
        }
    }
}

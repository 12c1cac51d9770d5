use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A copy of this point moved by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A numeric range such as a slider's output limits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn is_ordered(&self) -> bool {
        self.lower <= self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        let (low, high) = if self.is_ordered() {
            (self.lower, self.upper)
        } else {
            (self.upper, self.lower)
        };
        (low..=high).contains(&value)
    }
}

/// A rectangle given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Area {
    pub a: Point,
    pub b: Point,
}

impl Area {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin, origin.translate(size.width, size.height))
    }

    pub fn width(&self) -> f64 {
        (self.b.x - self.a.x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.b.y - self.a.y).abs()
    }

    fn left(&self) -> f64 {
        self.a.x.min(self.b.x)
    }

    fn top(&self) -> f64 {
        self.a.y.min(self.b.y)
    }

    /// True when the interiors of the two rectangles intersect. Touching
    /// edges do not count.
    pub fn overlaps(&self, other: &Area) -> bool {
        self.left() < other.left() + other.width()
            && other.left() < self.left() + self.width()
            && self.top() < other.top() + other.height()
            && other.top() < self.top() + self.height()
    }
}

/// Graph-on-parent settings of a canvas (`#X coords`).
///
/// `range` maps the canvas contents to a value range (x1 y1 x2 y2), `size`
/// is the on-parent box in pixels and `gop` is the graph-on-parent mode
/// (0 off, 1 on, 2 on with the name hidden).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub range: Area,
    pub size: Size,
    pub gop: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<Point>,
}

impl Coords {
    /// The coords Pd writes for a fresh array graph of `length` points.
    pub fn for_array(length: f64, size: Size) -> Self {
        Self {
            range: Area::new(Point::new(0.0, 1.0), Point::new(length, -1.0)),
            size,
            gop: 1.0,
            margin: Some(Point::default()),
        }
    }
}

// Plain point/rect arithmetic shared by the arranger, the registry and the
// SVG preview. Screen coordinates: y grows downward.

use serde::{Deserialize, Serialize};

/// Denominators smaller than this are treated as parallel.
const PARALLEL_EPS: f32 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Equality within `tolerance`. A tolerance of zero is exact comparison.
    pub fn approx_eq(self, other: Point, tolerance: f32) -> bool {
        if tolerance <= 0.0 {
            return self.x == other.x && self.y == other.y;
        }
        self.distance_sq(other) <= tolerance * tolerance
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min_x(&self) -> f32 {
        self.x
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn min_y(&self) -> f32 {
        self.y
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Smallest rect containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Grow the rect so it also covers `point`.
    pub fn include(&self, point: Point) -> Rect {
        let min_x = self.min_x().min(point.x);
        let min_y = self.min_y().min(point.y);
        let max_x = self.max_x().max(point.x);
        let max_y = self.max_y().max(point.y);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Parametric intersection of the lines through `a0→a1` and `b0→b1`.
///
/// Returns `(t, s)` such that `a0 + t·(a1 - a0) == b0 + s·(b1 - b0)`, or
/// `None` when the segments are parallel or degenerate.
pub fn intersect_params(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<(f32, f32)> {
    let (rx, ry) = (a1.x - a0.x, a1.y - a0.y);
    let (sx, sy) = (b1.x - b0.x, b1.y - b0.y);
    let denom = rx * sy - ry * sx;
    if !denom.is_finite() || denom.abs() <= PARALLEL_EPS {
        return None;
    }
    let (qx, qy) = (b0.x - a0.x, b0.y - a0.y);
    let t = (qx * sy - qy * sx) / denom;
    let s = (qx * ry - qy * rx) / denom;
    Some((t, s))
}

/// True when both segments cross within their bounds (endpoints included).
pub fn segments_cross(a0: Point, a1: Point, b0: Point, b1: Point) -> bool {
    match intersect_params(a0, a1, b0, b1) {
        Some((t, s)) => (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s),
        None => false,
    }
}

/// Point at parameter `t` along `a0→a1`.
pub fn lerp(a0: Point, a1: Point, t: f32) -> Point {
    Point::new(a0.x + (a1.x - a0.x) * t, a0.y + (a1.y - a0.y) * t)
}

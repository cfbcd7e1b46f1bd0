use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Aspect-ratio threshold for preferring horizontal vs vertical ports.
const DIRECTION_PREF_RATIO: f32 = 1.35;

/// One side of a rectangular group where connectors may dock.
///
/// Screen coordinates: `North` is the top side (`min_y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    #[serde(alias = "n", alias = "top")]
    North,
    #[serde(alias = "s", alias = "bottom")]
    South,
    #[serde(alias = "e", alias = "right")]
    East,
    #[serde(alias = "w", alias = "left")]
    West,
}

impl Port {
    pub const ALL: [Port; 4] = [Port::North, Port::South, Port::East, Port::West];

    pub fn opposite(self) -> Port {
        match self {
            Port::North => Port::South,
            Port::South => Port::North,
            Port::East => Port::West,
            Port::West => Port::East,
        }
    }

    /// North/South docks lie on a horizontal line.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Port::North | Port::South)
    }

    pub fn slot(self) -> usize {
        match self {
            Port::North => 0,
            Port::South => 1,
            Port::East => 2,
            Port::West => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Port::North => "north",
            Port::South => "south",
            Port::East => "east",
            Port::West => "west",
        }
    }

    /// Midpoint of this side of `rect`. Used as the terminus of a connector
    /// end whose far side has not been docked yet.
    pub fn side_center(self, rect: &Rect) -> Point {
        let c = rect.center();
        match self {
            Port::North => Point::new(c.x, rect.min_y()),
            Port::South => Point::new(c.x, rect.max_y()),
            Port::East => Point::new(rect.max_x(), c.y),
            Port::West => Point::new(rect.min_x(), c.y),
        }
    }

    /// Coordinate of the dock line, `buffer` outside the side.
    pub fn dock_line(self, rect: &Rect, buffer: f32) -> f32 {
        match self {
            Port::North => rect.min_y() - buffer,
            Port::South => rect.max_y() + buffer,
            Port::East => rect.max_x() + buffer,
            Port::West => rect.min_x() - buffer,
        }
    }

    /// `(min, max)` extent of the side along its own axis.
    pub fn side_extent(self, rect: &Rect) -> (f32, f32) {
        if self.is_horizontal() {
            (rect.min_x(), rect.max_x())
        } else {
            (rect.min_y(), rect.max_y())
        }
    }

    /// Coordinate of `point` along this side's axis.
    pub fn along(self, point: Point) -> f32 {
        if self.is_horizontal() { point.x } else { point.y }
    }

    /// Coordinate of `point` across this side's axis.
    pub fn across(self, point: Point) -> f32 {
        if self.is_horizontal() { point.y } else { point.x }
    }

    /// Build a point from an along-axis coordinate and the dock line.
    pub fn point_at(self, along: f32, line: f32) -> Point {
        if self.is_horizontal() {
            Point::new(along, line)
        } else {
            Point::new(line, along)
        }
    }

    /// Offset along the dock line separating the two lanes of a
    /// bidirectional connector. Each port turns the lane a quarter turn
    /// from its outward arrow direction.
    pub fn lane_offset(self, distance: f32) -> (f32, f32) {
        match self {
            Port::North => (distance, 0.0),
            Port::South => (-distance, 0.0),
            Port::East => (0.0, -distance),
            Port::West => (0.0, distance),
        }
    }
}

/// Pick the port on `from` and the port on `to` that face each other.
pub fn facing_ports(from: &Rect, to: &Rect) -> (Port, Port) {
    let fc = from.center();
    let tc = to.center();
    let dx = tc.x - fc.x;
    let dy = tc.y - fc.y;
    let x_overlap = from.min_x() < to.max_x() && to.min_x() < from.max_x();
    let y_overlap = from.min_y() < to.max_y() && to.min_y() < from.max_y();

    let ratio = dx.abs() / dy.abs().max(1e-3);
    let horiz_pref = ratio > DIRECTION_PREF_RATIO || (y_overlap && ratio > 0.9);
    let vert_pref = ratio < (1.0 / DIRECTION_PREF_RATIO) || (x_overlap && ratio < 1.1);
    let use_horizontal = if horiz_pref && !vert_pref {
        true
    } else if vert_pref && !horiz_pref {
        false
    } else {
        dx.abs() >= dy.abs()
    };

    if use_horizontal {
        if dx >= 0.0 {
            (Port::East, Port::West)
        } else {
            (Port::West, Port::East)
        }
    } else if dy >= 0.0 {
        (Port::South, Port::North)
    } else {
        (Port::North, Port::South)
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

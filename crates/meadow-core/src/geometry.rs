use std::fmt;

use serde::{Deserialize, Serialize};

/// A continuous world coordinate, in world units (pixels of the tile sheet).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point from its two coordinates.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns `true` if both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x as i64, self.y as i64)
    }
}

/// Size of one grid cell. Every tile occupies exactly one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSize {
    /// Cell width in world units.
    pub width: f32,
    /// Cell height in world units.
    pub height: f32,
}

impl Default for TileSize {
    fn default() -> Self {
        Self {
            width: 32.0,
            height: 32.0,
        }
    }
}

impl TileSize {
    /// Grid cell containing `point`.
    pub fn grid_key(self, point: Point) -> GridKey {
        GridKey {
            col: (point.x / self.width).floor() as i32,
            row: (point.y / self.height).floor() as i32,
        }
    }

    /// Snap a continuous point to the origin of its grid cell.
    pub fn snap(self, point: Point) -> Point {
        let key = self.grid_key(point);
        self.origin(key)
    }

    /// Top-left corner of a grid cell.
    pub fn origin(self, key: GridKey) -> Point {
        Point::new(key.col as f32 * self.width, key.row as f32 * self.height)
    }

    /// Bounding box of a tile whose top-left corner is `position`.
    pub fn tile_box(self, position: Point) -> Aabb {
        Aabb {
            min: position,
            max: Point::new(position.x + self.width, position.y + self.height),
        }
    }
}

/// Integer grid coordinate derived from a tile position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    /// Column index.
    pub col: i32,
    /// Row index.
    pub row: i32,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner.
    pub min: Point,
    /// Bottom-right corner.
    pub max: Point,
}

impl Aabb {
    /// Create a box from its corners.
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Strict overlap test: boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Centre of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Grow the box by `dx`/`dy` on every side.
    pub fn expand(&self, dx: f32, dy: f32) -> Aabb {
        Aabb {
            min: Point::new(self.min.x - dx, self.min.y - dy),
            max: Point::new(self.max.x + dx, self.max.y + dy),
        }
    }
}

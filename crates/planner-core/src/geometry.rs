//! Grid geometry and the rotation transform.
//!
//! Blueprints are authored unrotated. Everything that needs a machine's
//! on-grid shape (placement, routing, power) goes through the functions in
//! this module so that rotated ports line up the same way everywhere.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A cell on the 2D grid. `(0, 0)` is the top-left corner; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    pub fn manhattan_distance(&self, other: &GridPosition) -> u32 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).unsigned_abs();
        u32::try_from(dx + dy).unwrap_or(u32::MAX)
    }

    /// The neighbouring cell one step in `dir`. Saturates at the `i32` limits.
    pub fn step(&self, dir: Direction) -> GridPosition {
        let (dx, dy) = dir.offset();
        GridPosition::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Translate by another position (used to turn local offsets into world cells).
    pub fn offset_by(&self, delta: GridPosition) -> GridPosition {
        GridPosition::new(self.x.saturating_add(delta.x), self.y.saturating_add(delta.y))
    }
}

// ---------------------------------------------------------------------------
// Rotation / Direction
// ---------------------------------------------------------------------------

/// Clockwise rotation applied to a placed machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees clockwise.
    Cw90,
    /// 180 degrees.
    Cw180,
    /// 270 degrees clockwise (90 degrees counter-clockwise).
    Cw270,
}

impl Rotation {
    /// All four rotation values.
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::None,
            Rotation::Cw90,
            Rotation::Cw180,
            Rotation::Cw270,
        ]
    }

    /// Parse a rotation given in degrees. Only 0, 90, 180 and 270 are valid.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Cw90),
            180 => Some(Rotation::Cw180),
            270 => Some(Rotation::Cw270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        self.quarter_turns() as u32 * 90
    }

    /// Number of clockwise quarter turns (0..4).
    pub fn quarter_turns(self) -> usize {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Cw270 => 3,
        }
    }

    /// Rotate 90 degrees clockwise.
    pub fn rotate_cw(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw90,
            Rotation::Cw90 => Rotation::Cw180,
            Rotation::Cw180 => Rotation::Cw270,
            Rotation::Cw270 => Rotation::None,
        }
    }

    /// Rotate 90 degrees counter-clockwise.
    pub fn rotate_ccw(self) -> Self {
        match self {
            Rotation::None => Rotation::Cw270,
            Rotation::Cw90 => Rotation::None,
            Rotation::Cw180 => Rotation::Cw90,
            Rotation::Cw270 => Rotation::Cw180,
        }
    }
}

/// Cardinal directions, in clockwise order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions, clockwise from north.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Offset for this direction.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        Direction::all()[(self.index() + 2) % 4]
    }

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Rotation transform
// ---------------------------------------------------------------------------

/// Footprint dimensions after rotation. Width and height swap for 90/270.
pub fn effective_dimensions(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    match rotation {
        Rotation::None | Rotation::Cw180 => (width, height),
        Rotation::Cw90 | Rotation::Cw270 => (height, width),
    }
}

/// Facing of a port after rotating its machine.
pub fn rotated_direction(dir: Direction, rotation: Rotation) -> Direction {
    Direction::all()[(dir.index() + rotation.quarter_turns()) % 4]
}

/// Position of a port inside the rotated footprint.
///
/// `offset` is relative to the unrotated blueprint's top-left cell and
/// `width`/`height` are the unrotated dimensions. The result is relative to
/// the rotated footprint's top-left cell.
pub fn rotated_port_offset(
    offset: GridPosition,
    width: u32,
    height: u32,
    rotation: Rotation,
) -> GridPosition {
    let w = width as i32;
    let h = height as i32;
    match rotation {
        Rotation::None => offset,
        Rotation::Cw90 => GridPosition::new(h - 1 - offset.y, offset.x),
        Rotation::Cw180 => GridPosition::new(w - 1 - offset.x, h - 1 - offset.y),
        Rotation::Cw270 => GridPosition::new(offset.y, w - 1 - offset.x),
    }
}

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle of whole cells. `x + width` and `y + height`
/// are exclusive. Edges are computed in `i64` so a rectangle near the `i32`
/// limits keeps its true extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> GridPosition {
        GridPosition::new(self.x, self.y)
    }

    /// One past the rightmost column.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// One past the bottom row.
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Separating-axis overlap test. Rectangles that only share an edge do
    /// not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= i64::from(other.x)
            || other.right() <= i64::from(self.x)
            || self.bottom() <= i64::from(other.y)
            || other.bottom() <= i64::from(self.y))
    }

    /// True if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains(&self, pos: GridPosition) -> bool {
        pos.x >= self.x
            && pos.y >= self.y
            && i64::from(pos.x) < self.right()
            && i64::from(pos.y) < self.bottom()
    }

    /// Edge-to-edge Chebyshev distance in cells: the larger of the horizontal
    /// and vertical gaps, 0 when the rectangles touch or overlap.
    pub fn chebyshev_gap(&self, other: &Rect) -> u32 {
        let gap_x = (i64::from(other.x) - self.right())
            .max(i64::from(self.x) - other.right())
            .max(0);
        let gap_y = (i64::from(other.y) - self.bottom())
            .max(i64::from(self.y) - other.bottom())
            .max(0);
        u32::try_from(gap_x.max(gap_y)).unwrap_or(u32::MAX)
    }

    /// Iterate over every cell, row by row. Cells past the `i32` limits are
    /// not representable and are left out.
    pub fn cells(&self) -> impl Iterator<Item = GridPosition> {
        let (x0, y0) = (i64::from(self.x), i64::from(self.y));
        let (x_end, y_end) = (self.right(), self.bottom());
        (y0..y_end)
            .map_while(|y| i32::try_from(y).ok())
            .flat_map(move |y| {
                (x0..x_end)
                    .map_while(|x| i32::try_from(x).ok())
                    .map(move |x| GridPosition::new(x, y))
            })
    }
}

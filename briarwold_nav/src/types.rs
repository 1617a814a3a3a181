// Core spatial types shared across the navigation engine.
//
// Defines world-space positions and boxes (`WorldPos`, `WorldBox`), the
// compact integer identifiers used to address graph storage (`NodeId`,
// `GridId`, `GridCoord`), and the reserved sentinel position a drained
// path returns. All data types derive `Serialize`/`Deserialize` for
// diagnostics dumps and config embedding.
//
// The coordinate convention follows the world this engine navigates:
// X and Y span the ground plane, Z is up. Grids are lattices over X/Y
// with Z supplied by the terrain height field.
//
// **Critical constraint: determinism.** Identifiers are array indices
// assigned in construction order, never pointers or hashes. Two builds
// from identical inputs produce identical ids.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// World-space position
// ---------------------------------------------------------------------------

/// A position in world space. X/Y are the ground plane, Z is up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Reserved sentinel returned by a drained path. Callers compare against
/// this to detect "no position left" without an `Option` at the script
/// boundary.
pub const INVALID_POSITION: WorldPos = WorldPos {
    x: -1000.0,
    y: -1000.0,
    z: -1000.0,
};

impl WorldPos {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance(self, other: Self) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance — cheaper when only comparing.
    pub fn distance_sq(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Vertical offset helper: this position shifted by `dz` on the up axis.
    pub fn raised(self, dz: f32) -> Self {
        Self::new(self.x, self.y, self.z + dz)
    }

    /// Componentwise offset.
    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Axis-aligned world-space box
// ---------------------------------------------------------------------------

/// An axis-aligned volume in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldBox {
    pub min: WorldPos,
    pub max: WorldPos,
}

impl WorldBox {
    pub const fn new(min: WorldPos, max: WorldPos) -> Self {
        Self { min, max }
    }

    /// A box has to be ordered on all axes and have positive extent on the
    /// ground plane to bound a grid region; a flat Z extent is allowed.
    pub fn is_valid_region(&self) -> bool {
        self.min.x < self.max.x && self.min.y < self.max.y && self.min.z <= self.max.z
    }

    pub fn extent_x(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn extent_y(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> WorldPos {
        WorldPos::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Overlap test on all three axes (touching counts as overlap).
    pub fn overlaps(&self, other: &WorldBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Containment on the ground plane only — the "vertical ray through the
    /// point" test used to route a position to the grid zone it stands in,
    /// at whatever height.
    pub fn contains_xy(&self, pos: WorldPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// This box grown by `pad` on each side (Z padding applies up only).
    pub fn padded(&self, pad: [f32; 3]) -> WorldBox {
        WorldBox::new(
            self.min.offset(-pad[0], -pad[1], 0.0),
            self.max.offset(pad[0], pad[1], pad[2]),
        )
    }

    /// Smallest box enclosing all positions. `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = WorldPos>>(points: I) -> Option<WorldBox> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some(WorldBox::new(min, max))
    }
}

// ---------------------------------------------------------------------------
// Graph identifiers — array indices, not UUIDs, for compactness.
// ---------------------------------------------------------------------------

/// Index of a node within its owning grid's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a grid within its owning map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridId(pub u32);

impl GridId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lattice coordinates of a node within its grid, unique per grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: u16,
    pub y: u16,
}

impl GridCoord {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

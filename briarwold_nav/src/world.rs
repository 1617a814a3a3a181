// World collaborator contracts and the reference world.
//
// The engine never owns collision or terrain data; it consumes three
// narrow query traits (`CollisionQuery`, `TerrainHeight`, `MissionBounds`)
// that the embedding world implements. Grid construction, neighbour
// wiring, culling, and path smoothing all go through `cast_ray`; node
// placement goes through `sample_height`; map building reads the playable
// rectangle from `mission_area`.
//
// `BoxWorld` is the reference implementation used by this repository's
// tests and benches: an analytic height field (base + per-axis slope),
// axis-aligned solid obstacle boxes, and axis-aligned water volumes.
// Its raycast is a segment-vs-box slab test. It stands in for the real
// scene container; it is not a collision engine.
//
// See also: `grid.rs` which drives these queries hardest during
// construction, `map.rs` for mission-bounds consumption.

use crate::types::{WorldBox, WorldPos};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Collision mask
// ---------------------------------------------------------------------------

/// Bitmask selecting which world geometry a ray tests against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionMask(pub u32);

impl CollisionMask {
    /// Static blocking geometry: obstacles, structures, interiors.
    pub const STATIC: CollisionMask = CollisionMask(1 << 0);
    /// Liquid volumes — only the move-modifier probe asks about these.
    pub const WATER: CollisionMask = CollisionMask(1 << 1);

    pub fn contains(self, other: CollisionMask) -> bool {
        self.0 & other.0 != 0
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Line-of-sight query against world geometry.
pub trait CollisionQuery {
    /// `true` if the segment from `from` to `to` hits any geometry
    /// selected by `mask`.
    fn cast_ray(&self, from: WorldPos, to: WorldPos, mask: CollisionMask) -> bool;
}

/// Ground elevation query.
pub trait TerrainHeight {
    /// Height of the terrain surface under `(x, y)`, or `None` where the
    /// height field does not cover that point.
    fn sample_height(&self, x: f32, y: f32) -> Option<f32>;
}

/// The playable area the terrain grid is sized from.
pub trait MissionBounds {
    /// `None` when the mission has no declared area — map building fails.
    fn mission_area(&self) -> Option<WorldBox>;
}

// ---------------------------------------------------------------------------
// Reference world
// ---------------------------------------------------------------------------

/// Analytic test world: sloped ground plane, box obstacles, water volumes.
#[derive(Clone, Debug, Default)]
pub struct BoxWorld {
    mission: Option<WorldBox>,
    base_height: f32,
    slope_x: f32,
    slope_y: f32,
    obstacles: Vec<WorldBox>,
    water: Vec<WorldBox>,
}

impl BoxWorld {
    /// Flat world at height 0 over the given mission area.
    pub fn flat(mission: WorldBox) -> Self {
        Self {
            mission: Some(mission),
            ..Self::default()
        }
    }

    /// World whose ground height is `base + slope_x * x + slope_y * y`.
    pub fn sloped(mission: WorldBox, base: f32, slope_x: f32, slope_y: f32) -> Self {
        Self {
            mission: Some(mission),
            base_height: base,
            slope_x,
            slope_y,
            obstacles: Vec::new(),
            water: Vec::new(),
        }
    }

    /// World with no declared mission area (map building must fail).
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn add_obstacle(&mut self, obstacle: WorldBox) {
        self.obstacles.push(obstacle);
    }

    pub fn add_water(&mut self, volume: WorldBox) {
        self.water.push(volume);
    }
}

impl CollisionQuery for BoxWorld {
    fn cast_ray(&self, from: WorldPos, to: WorldPos, mask: CollisionMask) -> bool {
        if mask.contains(CollisionMask::STATIC)
            && self.obstacles.iter().any(|b| segment_hits_box(from, to, b))
        {
            return true;
        }
        if mask.contains(CollisionMask::WATER)
            && self.water.iter().any(|b| segment_hits_box(from, to, b))
        {
            return true;
        }
        false
    }
}

impl TerrainHeight for BoxWorld {
    fn sample_height(&self, x: f32, y: f32) -> Option<f32> {
        // The height field covers the mission area; outside it there is no
        // ground to sample.
        match &self.mission {
            Some(area) if !area.contains_xy(WorldPos::new(x, y, 0.0)) => None,
            None => None,
            Some(_) => Some(self.base_height + self.slope_x * x + self.slope_y * y),
        }
    }
}

impl MissionBounds for BoxWorld {
    fn mission_area(&self) -> Option<WorldBox> {
        self.mission
    }
}

/// Segment-vs-AABB intersection (slab method), `t` clamped to the segment.
///
/// An axis with no direction component rejects immediately when the origin
/// lies outside that slab.
fn segment_hits_box(from: WorldPos, to: WorldPos, b: &WorldBox) -> bool {
    let origin = [from.x, from.y, from.z];
    let dir = [to.x - from.x, to.y - from.y, to.z - from.z];
    let lo = [b.min.x, b.min.y, b.min.z];
    let hi = [b.max.x, b.max.y, b.max.z];

    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;

    for axis in 0..3 {
        if dir[axis].abs() < f32::EPSILON {
            if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                return false;
            }
            continue;
        }
        let inv = 1.0 / dir[axis];
        let mut t0 = (lo[axis] - origin[axis]) * inv;
        let mut t1 = (hi[axis] - origin[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return false;
        }
    }
    true
}

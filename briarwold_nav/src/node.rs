// A single candidate waypoint in the navigation graph.
//
// A `PathNode` is plain data in its grid's arena: world position, lattice
// coordinates, a traversal-cost modifier, and the neighbour list as
// `NodeId`s into the same arena. Up to 8 neighbours on a regular grid;
// fewer at boundaries or where geometry blocks a connection.
//
// Search bookkeeping (cost, parent, open/closed) deliberately does NOT
// live here — it is per-search state owned by the finder, so many
// independent searches can read the same shared graph (see
// `pathfinding.rs`).
//
// The geometry checks (`is_clear`, `is_neighbour_valid`, the shared
// clearance-ray helper) express an agent's standing/moving volume as ray
// casts against the collision collaborator.
//
// **Critical constraint: symmetry.** Neighbour edges are stored per node
// but must stay symmetric; only grid construction mutates them, and
// culling removes both directions together (see `grid.rs`).

use crate::config::NavConfig;
use crate::types::{GridCoord, NodeId, WorldPos};
use crate::world::{CollisionMask, CollisionQuery};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A node in the navigation graph — a position an agent can stand at.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathNode {
    /// Position in world space, on the terrain surface.
    pub position: WorldPos,
    /// Lattice coordinates within the owning grid.
    pub coord: GridCoord,
    /// Traversal difficulty at this node: 0 is easiest, large values are
    /// effectively impassable. Scales edge cost into the node as
    /// `distance * (1 + move_modifier)`.
    pub move_modifier: f32,
    /// Neighbouring nodes in the owning grid's arena.
    pub neighbours: SmallVec<[NodeId; 8]>,
}

impl PathNode {
    pub fn new(position: WorldPos, coord: GridCoord) -> Self {
        Self {
            position,
            coord,
            move_modifier: 0.0,
            neighbours: SmallVec::new(),
        }
    }

    pub fn has_neighbour(&self, id: NodeId) -> bool {
        self.neighbours.contains(&id)
    }

    /// Record `id` as a neighbour. Duplicate adds are ignored; a node
    /// never neighbours itself.
    pub(crate) fn add_neighbour(&mut self, own_id: NodeId, id: NodeId) {
        debug_assert!(own_id != id, "node must not neighbour itself");
        if own_id != id && !self.has_neighbour(id) {
            self.neighbours.push(id);
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn remove_neighbour(&mut self, id: NodeId) -> bool {
        if let Some(pos) = self.neighbours.iter().position(|n| *n == id) {
            self.neighbours.remove(pos);
            true
        } else {
            false
        }
    }

    /// Standalone clearance check: the vertical span an agent occupies at
    /// this node must be free of static geometry.
    pub fn is_clear<W: CollisionQuery>(&self, world: &W, config: &NavConfig) -> bool {
        let clearance_z = config.grid.node_clearance[2];
        !world.cast_ray(
            self.position,
            self.position.raised(clearance_z),
            CollisionMask::STATIC,
        )
    }

    /// Whether an agent can move from this node to `neighbour_position`:
    /// the vertical separation must be within the slope limit and the
    /// clearance-swept segment must be unobstructed.
    pub fn is_neighbour_valid<W: CollisionQuery>(
        &self,
        neighbour_position: WorldPos,
        world: &W,
        config: &NavConfig,
    ) -> bool {
        let dz = self.position.z - neighbour_position.z;
        if dz * dz > config.grid.max_slope_sq {
            return false;
        }
        clearance_path_valid(
            self.position,
            neighbour_position,
            config.grid.node_clearance,
            world,
        )
    }

    /// Re-derive the move modifier from world state: a vertical probe from
    /// high above down through the node detects standing water.
    pub fn update_move_modifier<W: CollisionQuery>(&mut self, world: &W, config: &NavConfig) {
        let from = self.position.raised(config.grid.water_probe_ceiling);
        let to = self.position.raised(-config.grid.node_clearance[2] * 0.5);
        self.move_modifier = if world.cast_ray(from, to, CollisionMask::WATER) {
            config.search.water_modifier
        } else {
            0.0
        };
    }
}

/// Clearance-swept segment test shared by neighbour wiring and path
/// smoothing: the centre ray plus 4 offset rays spanning the agent's
/// footprint and height must all be unobstructed.
pub(crate) fn clearance_path_valid<W: CollisionQuery>(
    from: WorldPos,
    to: WorldPos,
    clearance: [f32; 3],
    world: &W,
) -> bool {
    let half_x = clearance[0] * 0.5;
    let top = clearance[2];

    let offsets = [
        [0.0, 0.0, 0.0],
        [-half_x, 0.0, 0.0],
        [half_x, 0.0, 0.0],
        [0.0, 0.0, top],
        [half_x, 0.0, top],
    ];

    offsets.iter().all(|off| {
        !world.cast_ray(
            from.offset(off[0], off[1], off[2]),
            to.offset(off[0], off[1], off[2]),
            CollisionMask::STATIC,
        )
    })
}

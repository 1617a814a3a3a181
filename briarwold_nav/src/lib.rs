// briarwold_nav — navigation engine for autonomous agents in a 3-D world.
//
// This crate turns continuous world geometry into a sparse, validated
// graph of traversable points, finds least-cost routes through it with
// A*, simplifies them geometrically, and hands the result to agents as a
// pop-front traversal sequence. It has no rendering, scripting, or agent
// logic; the world's collision/terrain/bounds services are consumed
// through three narrow traits and never implemented here (a reference
// `BoxWorld` exists for tests and benches).
//
// Module overview:
// - `types.rs`:       WorldPos/WorldBox, compact graph ids, the sentinel position.
// - `config.rs`:      NavConfig — all tunable parameters, JSON-loadable.
// - `world.rs`:       Collaborator traits (collision, terrain height, mission bounds) + BoxWorld.
// - `node.rs`:        PathNode — one waypoint: position, move modifier, neighbour ids.
// - `grid.rs`:        Lattice construction, clearance wiring, culling, nearest-node scan.
// - `map.rs`:         Grid collection + zone routing; built once per world session.
// - `pathfinding.rs`: PathFinder — A* over a grid with per-search scratch; path smoothing.
// - `path.rs`:        Path — per-request facade with retry policy and traversal semantics.
//
// The priority queue driving the search lives in the companion crate
// `briarwold_heap`.
//
// **Critical constraint: single-writer graph.** The graph is built once
// and then only read; all search-local state lives in `PathFinder`
// scratch, so any number of finders can run sequential searches over the
// same shared graph without touching it.

pub mod config;
pub mod grid;
pub mod map;
pub mod node;
pub mod path;
pub mod pathfinding;
pub mod types;
pub mod world;

pub use config::NavConfig;
pub use grid::PathGrid;
pub use map::PathMap;
pub use node::PathNode;
pub use path::Path;
pub use pathfinding::{smooth_path, PathFinder};
pub use types::{GridCoord, GridId, NodeId, WorldBox, WorldPos, INVALID_POSITION};
pub use world::{BoxWorld, CollisionMask, CollisionQuery, MissionBounds, TerrainHeight};

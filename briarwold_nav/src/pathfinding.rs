// A* search over a grid's node graph, plus path smoothing.
//
// `PathFinder` is an explicit service value, not a global: it owns the
// per-search scratch tables (cost-from-start, parent, open/closed flags)
// that classic implementations keep on the shared nodes. Scratch is
// indexed by `NodeId` and generation-stamped, so starting a search
// invalidates the previous one's state lazily with no O(n) clear and no
// post-search reset pass over touched nodes. A `&mut self` search is the
// whole-graph exclusivity rule made explicit: one search at a time per
// finder, any number of finders over the same shared read-only graph.
//
// The open list is a `BoundedHeap` keyed on fitness (cost-from-start +
// Euclidean heuristic). Improving an open node re-pushes it; stale heap
// entries are skipped on pop via the closed flag. Capacity is the grid's
// directed edge count + 1, which bounds total pushes — every push is a
// strict cost improvement for some node, and a node improves at most
// once per incoming edge.
//
// The heuristic is plain Euclidean distance, admissible because edge
// weights are `distance * (1 + move_modifier)` with non-negative
// modifiers.
//
// Smoothing cuts interior nodes where the corner angle sits in a band
// around 90° and the direct segment passes the same clearance-ray test
// used for neighbour wiring — near-right-angle corners are lattice
// artefacts, while gentler bends are kept so routes still follow the
// terrain they crossed.
//
// See also: `grid.rs` for the graph being searched, `path.rs` for the
// retry policy wrapped around this search.

use crate::config::NavConfig;
use crate::grid::PathGrid;
use crate::node::clearance_path_valid;
use crate::types::{NodeId, WorldPos};
use crate::world::CollisionQuery;
use briarwold_heap::BoundedHeap;

const NO_PARENT: u32 = u32::MAX;

/// Per-node scratch for one search, valid only while `stamp` matches the
/// finder's current generation.
#[derive(Clone, Copy, Debug)]
struct Scratch {
    stamp: u32,
    cost_from_start: f32,
    parent: u32,
    open: bool,
    closed: bool,
}

impl Default for Scratch {
    fn default() -> Self {
        Self {
            stamp: 0,
            cost_from_start: 0.0,
            parent: NO_PARENT,
            open: false,
            closed: false,
        }
    }
}

/// An entry in the open list. Duplicates for the same node are expected;
/// the freshest one wins and the rest are skipped as stale.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    node: NodeId,
    fitness: f32,
}

/// A* search service. Reusable across any number of sequential searches;
/// scratch allocations persist between them.
#[derive(Debug, Default)]
pub struct PathFinder {
    scratch: Vec<Scratch>,
    generation: u32,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the least-cost node sequence from `start` to `goal` within
    /// `grid`, both endpoints inclusive. `None` when the goal is
    /// unreachable.
    ///
    /// With `smooth`, the raw path is simplified before being returned.
    pub fn find_path<W: CollisionQuery>(
        &mut self,
        grid: &PathGrid,
        start: NodeId,
        goal: NodeId,
        world: &W,
        config: &NavConfig,
        smooth: bool,
    ) -> Option<Vec<NodeId>> {
        debug_assert!(start.index() < grid.node_count());
        debug_assert!(goal.index() < grid.node_count());

        if start == goal {
            return Some(vec![start]);
        }

        self.begin_search(grid.node_count());
        let generation = self.generation;
        let goal_position = grid.node(goal).position;

        let mut open_list = BoundedHeap::with_capacity(
            grid.edge_count() + 1,
            |a: &OpenEntry, b: &OpenEntry| a.fitness.total_cmp(&b.fitness),
        );

        {
            let entry = &mut self.scratch[start.index()];
            *entry = Scratch {
                stamp: generation,
                cost_from_start: 0.0,
                parent: NO_PARENT,
                open: true,
                closed: false,
            };
        }
        let start_fitness = grid.node(start).position.distance(goal_position);
        if open_list
            .push(OpenEntry {
                node: start,
                fitness: start_fitness,
            })
            .is_err()
        {
            debug_assert!(false, "open list overflow on start push");
            return None;
        }

        while let Some(current) = open_list.pop() {
            let ci = current.node.index();
            // Stale entry for a node already expanded.
            if self.scratch[ci].stamp == generation && self.scratch[ci].closed {
                continue;
            }

            if current.node == goal {
                let mut path = self.reconstruct(start, goal);
                if smooth {
                    smooth_path(grid, &mut path, world, config);
                }
                return Some(path);
            }

            self.scratch[ci].open = false;
            self.scratch[ci].closed = true;
            let current_cost = self.scratch[ci].cost_from_start;
            let current_position = grid.node(current.node).position;

            for &neighbour in &grid.node(current.node).neighbours {
                let ni = neighbour.index();
                let visited = self.scratch[ni].stamp == generation;
                if visited && self.scratch[ni].closed {
                    continue;
                }

                let modifier = grid.node(neighbour).move_modifier;
                debug_assert!(modifier >= 0.0, "negative move modifier on {neighbour:?}");
                let step = current_position.distance(grid.node(neighbour).position);
                let tentative = current_cost + step * (1.0 + modifier);

                if visited && self.scratch[ni].open && tentative >= self.scratch[ni].cost_from_start
                {
                    continue;
                }

                self.scratch[ni] = Scratch {
                    stamp: generation,
                    cost_from_start: tentative,
                    parent: current.node.0,
                    open: true,
                    closed: false,
                };
                let fitness =
                    tentative + grid.node(neighbour).position.distance(goal_position);
                if open_list
                    .push(OpenEntry {
                        node: neighbour,
                        fitness,
                    })
                    .is_err()
                {
                    // Sized to the edge-count bound; overflow means the
                    // graph or the bound is broken.
                    debug_assert!(false, "open list overflow");
                    log::error!("search aborted: open list overflow");
                    return None;
                }
            }
        }

        None
    }

    /// Total traversal cost of a node sequence under the grid's edge
    /// weighting. Diagnostic companion to `find_path`.
    pub fn path_cost(grid: &PathGrid, path: &[NodeId]) -> f32 {
        path.windows(2)
            .map(|pair| {
                let step = grid
                    .node(pair[0])
                    .position
                    .distance(grid.node(pair[1]).position);
                step * (1.0 + grid.node(pair[1]).move_modifier)
            })
            .sum()
    }

    /// Invalidate all scratch and make room for `node_count` entries.
    fn begin_search(&mut self, node_count: usize) {
        if self.scratch.len() < node_count {
            self.scratch.resize(node_count, Scratch::default());
        }
        if self.generation == u32::MAX {
            // Stamp wrap: reset every entry so old stamps cannot collide.
            self.scratch.fill(Scratch::default());
            self.generation = 0;
        }
        self.generation += 1;
    }

    /// Walk parent references from the goal back to the start, then
    /// reverse into traversal order.
    fn reconstruct(&self, start: NodeId, goal: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = goal.0;
        while current != NO_PARENT {
            path.push(NodeId(current));
            current = self.scratch[current as usize].parent;
        }
        path.reverse();
        debug_assert_eq!(path.first(), Some(&start), "reconstruction missed start");
        path
    }
}

/// Simplify a path in place by cutting interior nodes at near-right-angle
/// corners whose direct shortcut is clear. Iterates until no more nodes
/// can be cut; never adds nodes and never leaves an unchecked segment.
pub fn smooth_path<W: CollisionQuery>(
    grid: &PathGrid,
    path: &mut Vec<NodeId>,
    world: &W,
    config: &NavConfig,
) {
    if !config.smoothing.enabled {
        return;
    }
    loop {
        let mut cut = false;
        let mut i = 1;
        while i + 1 < path.len() {
            let a = grid.node(path[i - 1]).position;
            let b = grid.node(path[i]).position;
            let c = grid.node(path[i + 1]).position;

            if corner_in_band(a, b, c, config.smoothing.angle_threshold_deg)
                && shortcut_valid(a, c, world, config)
            {
                path.remove(i);
                cut = true;
            } else {
                i += 1;
            }
        }
        if !cut {
            break;
        }
    }
}

/// Corner angle at `b` (between the segments to `a` and to `c`), tested
/// against the 90-degree band. Degenerate zero-length segments keep the
/// node.
fn corner_in_band(a: WorldPos, b: WorldPos, c: WorldPos, threshold_deg: f32) -> bool {
    let u = [a.x - b.x, a.y - b.y, a.z - b.z];
    let v = [c.x - b.x, c.y - b.y, c.z - b.z];
    let len_u = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt();
    let len_v = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len_u == 0.0 || len_v == 0.0 {
        return false;
    }
    let cos = ((u[0] * v[0] + u[1] * v[1] + u[2] * v[2]) / (len_u * len_v)).clamp(-1.0, 1.0);
    let angle_deg = cos.acos().to_degrees();
    (angle_deg - 90.0).abs() <= threshold_deg
}

/// A smoothed shortcut obeys the smoothing slope limit and the same
/// clearance-ray sweep as neighbour wiring.
fn shortcut_valid<W: CollisionQuery>(a: WorldPos, c: WorldPos, world: &W, config: &NavConfig) -> bool {
    let dz = a.z - c.z;
    if dz * dz > config.smoothing.max_slope_sq {
        return false;
    }
    clearance_path_valid(a, c, config.grid.node_clearance, world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WorldBox, WorldPos};
    use crate::world::BoxWorld;

    fn unit_config() -> NavConfig {
        let mut config = NavConfig::default();
        config.grid.grid_cell_size = 1.0;
        config
    }

    fn flat_world() -> BoxWorld {
        BoxWorld::flat(WorldBox::new(
            WorldPos::new(-10.0, -10.0, 0.0),
            WorldPos::new(20.0, 20.0, 50.0),
        ))
    }

    fn grid(extent: f32, world: &BoxWorld, config: &NavConfig) -> PathGrid {
        let region = WorldBox::new(
            WorldPos::new(0.0, 0.0, 0.0),
            WorldPos::new(extent, extent, 10.0),
        );
        PathGrid::build(region, &[], 1.0, world, config).unwrap()
    }

    fn node_at(grid: &PathGrid, x: f32, y: f32) -> NodeId {
        grid.closest_node(WorldPos::new(x, y, 0.0)).unwrap()
    }

    #[test]
    fn start_equals_goal_is_the_trivial_path() {
        let world = flat_world();
        let config = unit_config();
        let g = grid(3.0, &world, &config);
        let n = node_at(&g, 1.0, 1.0);
        let mut finder = PathFinder::new();
        let path = finder.find_path(&g, n, n, &world, &config, false).unwrap();
        assert_eq!(path, vec![n]);
        assert_eq!(PathFinder::path_cost(&g, &path), 0.0);
    }

    #[test]
    fn straight_diagonal_is_optimal_on_open_ground() {
        let world = flat_world();
        let config = unit_config();
        let g = grid(5.0, &world, &config);
        let start = node_at(&g, 0.0, 0.0);
        let goal = node_at(&g, 4.0, 4.0);

        let mut finder = PathFinder::new();
        let path = finder
            .find_path(&g, start, goal, &world, &config, false)
            .unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path.len(), 5);

        let expected = 4.0 * 2.0f32.sqrt();
        let cost = PathFinder::path_cost(&g, &path);
        assert!((cost - expected).abs() < 1e-4, "cost {cost} vs {expected}");
    }

    #[test]
    fn impassable_centre_is_routed_around() {
        let mut world = flat_world();
        // Water tight around the centre lattice point, with the modifier
        // raised to the impassable sentinel.
        world.add_water(WorldBox::new(
            WorldPos::new(1.8, 1.8, -1.0),
            WorldPos::new(2.2, 2.2, 0.5),
        ));
        let mut config = unit_config();
        config.search.water_modifier = config.search.impassable_modifier;

        let g = grid(5.0, &world, &config);
        let centre = node_at(&g, 2.0, 2.0);
        assert_eq!(g.node(centre).move_modifier, 100.0);

        let start = node_at(&g, 0.0, 0.0);
        let goal = node_at(&g, 4.0, 4.0);
        let mut finder = PathFinder::new();
        let path = finder
            .find_path(&g, start, goal, &world, &config, false)
            .unwrap();

        assert!(!path.contains(&centre), "path crossed the impassable node");
        let cost = PathFinder::path_cost(&g, &path);
        let unobstructed = 4.0 * 2.0f32.sqrt();
        assert!(cost > unobstructed);
        assert!(cost.is_finite());
    }

    #[test]
    fn water_cost_preferred_over_long_detour_when_cheaper() {
        // Mild modifier: crossing wet ground costs more per step but the
        // dry detour is longer still; A* weighs both.
        let mut world = flat_world();
        world.add_water(WorldBox::new(
            WorldPos::new(1.8, -1.0, -1.0),
            WorldPos::new(2.2, 20.0, 0.5),
        ));
        let mut config = unit_config();
        config.search.water_modifier = 0.1;

        let g = grid(5.0, &world, &config);
        let start = node_at(&g, 0.0, 2.0);
        let goal = node_at(&g, 4.0, 2.0);
        let mut finder = PathFinder::new();
        let path = finder
            .find_path(&g, start, goal, &world, &config, false)
            .unwrap();

        // The wet column at x=2 is crossed rather than walked around.
        assert_eq!(path.len(), 5);
        let cost = PathFinder::path_cost(&g, &path);
        assert!((cost - (4.0 + 0.1)).abs() < 1e-4);
    }

    #[test]
    fn unreachable_goal_fails() {
        let world = flat_world();
        let config = unit_config();
        // A wall of avoided nodes splits the grid into two components.
        let avoid = [WorldBox::new(
            WorldPos::new(1.6, -5.0, -5.0),
            WorldPos::new(2.4, 25.0, 25.0),
        )];
        let region = WorldBox::new(WorldPos::new(0.0, 0.0, 0.0), WorldPos::new(5.0, 5.0, 10.0));
        let g = PathGrid::build(region, &avoid, 1.0, &world, &config).unwrap();

        let start = node_at(&g, 0.0, 2.0);
        let goal = node_at(&g, 4.0, 2.0);
        assert!(g.node(start).position.x < 1.6);
        assert!(g.node(goal).position.x > 2.4);

        let mut finder = PathFinder::new();
        assert!(
            finder
                .find_path(&g, start, goal, &world, &config, false)
                .is_none()
        );
    }

    #[test]
    fn finder_is_reusable_across_searches() {
        let world = flat_world();
        let config = unit_config();
        let g = grid(5.0, &world, &config);
        let mut finder = PathFinder::new();

        let a = node_at(&g, 0.0, 0.0);
        let b = node_at(&g, 4.0, 4.0);
        let first = finder.find_path(&g, a, b, &world, &config, false).unwrap();
        let second = finder.find_path(&g, b, a, &world, &config, false).unwrap();
        assert_eq!(first.len(), second.len());

        // Reversed endpoints give the reversed cost.
        let c1 = PathFinder::path_cost(&g, &first);
        let c2 = PathFinder::path_cost(&g, &second);
        assert!((c1 - c2).abs() < 1e-4);

        // Repeating a search after unrelated ones still succeeds.
        let again = finder.find_path(&g, a, b, &world, &config, false).unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn right_angle_corner_is_cut_by_smoothing() {
        let world = flat_world();
        let config = unit_config();
        let g = grid(5.0, &world, &config);

        let mut path = vec![
            node_at(&g, 0.0, 0.0),
            node_at(&g, 1.0, 0.0),
            node_at(&g, 2.0, 0.0),
            node_at(&g, 2.0, 1.0),
            node_at(&g, 2.0, 2.0),
        ];
        let corner = node_at(&g, 2.0, 0.0);
        let before = path.len();
        smooth_path(&g, &mut path, &world, &config);

        assert!(path.len() < before);
        assert!(!path.contains(&corner), "the 90-degree corner survived");
        // Endpoints are never cut.
        assert_eq!(path.first(), Some(&node_at(&g, 0.0, 0.0)));
        assert_eq!(path.last(), Some(&node_at(&g, 2.0, 2.0)));
    }

    #[test]
    fn straight_runs_are_not_cut() {
        let world = flat_world();
        let config = unit_config();
        let g = grid(5.0, &world, &config);

        let mut path = vec![
            node_at(&g, 0.0, 2.0),
            node_at(&g, 1.0, 2.0),
            node_at(&g, 2.0, 2.0),
            node_at(&g, 3.0, 2.0),
        ];
        let before = path.clone();
        smooth_path(&g, &mut path, &world, &config);
        // 180-degree corners are far outside the 90-degree band.
        assert_eq!(path, before);
    }

    #[test]
    fn blocked_shortcut_keeps_the_corner() {
        let mut world = flat_world();
        // Obstacle across the diagonal the cut would take.
        world.add_obstacle(WorldBox::new(
            WorldPos::new(1.4, 0.3, 0.0),
            WorldPos::new(1.8, 0.7, 5.0),
        ));
        let config = unit_config();
        let g = grid(5.0, &world, &config);

        let corner = node_at(&g, 2.0, 0.0);
        let mut path = vec![
            node_at(&g, 1.0, 0.0),
            corner,
            node_at(&g, 2.0, 1.0),
        ];
        let before = path.clone();
        smooth_path(&g, &mut path, &world, &config);
        assert_eq!(path, before, "obstructed shortcut must not be taken");
    }

    #[test]
    fn smoothing_disabled_leaves_path_untouched() {
        let world = flat_world();
        let mut config = unit_config();
        config.smoothing.enabled = false;
        let g = grid(5.0, &world, &config);

        let mut path = vec![
            node_at(&g, 0.0, 0.0),
            node_at(&g, 1.0, 0.0),
            node_at(&g, 1.0, 1.0),
        ];
        let before = path.clone();
        smooth_path(&g, &mut path, &world, &config);
        assert_eq!(path, before);
    }

    #[test]
    fn smoothed_search_never_lengthens_the_path() {
        let world = flat_world();
        let config = unit_config();
        let g = grid(5.0, &world, &config);
        let start = node_at(&g, 0.0, 0.0);
        let goal = node_at(&g, 4.0, 2.0);

        let mut finder = PathFinder::new();
        let raw = finder
            .find_path(&g, start, goal, &world, &config, false)
            .unwrap();
        let smoothed = finder
            .find_path(&g, start, goal, &world, &config, true)
            .unwrap();
        assert!(smoothed.len() <= raw.len());
        assert_eq!(smoothed.first(), Some(&start));
        assert_eq!(smoothed.last(), Some(&goal));
    }
}

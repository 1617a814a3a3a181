// The per-request path handle agents traverse.
//
// A `Path` connects two world positions: it resolves each to the nearest
// graph node through the map, runs the finder (with the configured retry
// budget), and stores the resulting node sequence. Agents then drain it
// one position at a time with `next_position`.
//
// Traversal semantics: the first call returns the front node without
// consuming it (the agent is walking *to* that node); each later call
// drops the node the agent just left and returns the new front; handing
// out the final node clears the sequence entirely and resets the
// last-node marker, so an exhausted path is indistinguishable from a
// fresh empty one. A drained path answers with the reserved
// `INVALID_POSITION` sentinel.
//
// The path stores ids, not references — it never borrows the graph. Ids
// from before a map rebuild resolve softly to the sentinel instead of
// dangling.
//
// Grids are never wired to each other, so endpoints that resolve into
// two different grids cannot be connected and the request fails after
// the retry budget like any other unreachable goal.
//
// See also: `map.rs` for endpoint resolution, `pathfinding.rs` for the
// search this wraps.

use crate::config::NavConfig;
use crate::map::PathMap;
use crate::pathfinding::PathFinder;
use crate::types::{GridId, NodeId, WorldBox, WorldPos, INVALID_POSITION};
use crate::world::CollisionQuery;
use std::collections::VecDeque;

/// An ordered route through the navigation graph, drained front-first.
#[derive(Debug, Default, Clone)]
pub struct Path {
    /// Remaining route; every node lives in the same grid.
    nodes: VecDeque<(GridId, NodeId)>,
    /// The node most recently handed out and dequeued — consumers use it
    /// to interpolate the segment currently being walked.
    last_node: Option<(GridId, NodeId)>,
    traversing: bool,
    /// Volume enclosing the route, recomputed when a route is stored.
    bounds: Option<WorldBox>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `start` to `goal` through the map's graph. Returns whether
    /// a route was stored; on failure the path is left empty.
    ///
    /// A search failure is retried up to `config.search.retry_count`
    /// additional times with identical inputs before giving up. Endpoint
    /// resolution failure (unbuilt or empty map) is not retried.
    pub fn create_path<W: CollisionQuery>(
        &mut self,
        map: &PathMap,
        finder: &mut PathFinder,
        world: &W,
        start: WorldPos,
        goal: WorldPos,
        smooth: bool,
        config: &NavConfig,
    ) -> bool {
        self.nodes.clear();
        self.last_node = None;
        self.traversing = false;
        self.bounds = None;

        let Some(start_ref) = map.closest_node(start) else {
            log::warn!("no graph node near start {start}");
            return false;
        };
        let Some(goal_ref) = map.closest_node(goal) else {
            log::warn!("no graph node near goal {goal}");
            return false;
        };

        // Both endpoints resolved to the same node: the trivial
        // single-node path.
        if start_ref == goal_ref {
            self.nodes.push_back(goal_ref);
            self.update_bounds(map);
            return true;
        }

        let (start_grid, start_node) = start_ref;
        let (goal_grid, goal_node) = goal_ref;

        let mut found: Option<Vec<NodeId>> = None;
        if start_grid == goal_grid {
            let grid = map.grid(start_grid);
            let mut attempts = 0;
            while found.is_none() && attempts <= config.search.retry_count {
                found = finder.find_path(grid, start_node, goal_node, world, config, smooth);
                attempts += 1;
            }
        }

        match found {
            Some(route) => {
                self.nodes = route.into_iter().map(|n| (start_grid, n)).collect();
                self.update_bounds(map);
                true
            }
            None => {
                log::warn!("unable to find a valid path from {start} to {goal}");
                false
            }
        }
    }

    /// The next position to walk toward.
    ///
    /// First call: the front node, not consumed. Later calls: consume the
    /// node just reached, return the new front. Handing out the final
    /// node clears the path. Empty path: the `INVALID_POSITION` sentinel.
    pub fn next_position(&mut self, map: &PathMap) -> WorldPos {
        if self.traversing {
            if self.nodes.len() > 1 {
                self.last_node = self.nodes.pop_front();
            }
        } else {
            self.traversing = true;
        }

        let Some(&(grid, node)) = self.nodes.front() else {
            return INVALID_POSITION;
        };

        if self.nodes.len() == 1 {
            self.nodes.clear();
            self.last_node = None;
        }

        map.try_node(grid, node)
            .map(|n| n.position)
            .unwrap_or(INVALID_POSITION)
    }

    /// Position of the node the agent most recently left, while mid-route.
    pub fn last_position(&self, map: &PathMap) -> Option<WorldPos> {
        let (grid, node) = self.last_node?;
        map.try_node(grid, node).map(|n| n.position)
    }

    pub fn has_next_node(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Nodes remaining in the route.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Volume enclosing the stored route, if any.
    pub fn bounds(&self) -> Option<WorldBox> {
        self.bounds
    }

    fn update_bounds(&mut self, map: &PathMap) {
        self.bounds = WorldBox::from_points(
            self.nodes
                .iter()
                .filter_map(|&(g, n)| map.try_node(g, n))
                .map(|n| n.position),
        );
    }
}

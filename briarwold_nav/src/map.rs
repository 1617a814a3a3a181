// The path map — every grid for one world session.
//
// A map owns one terrain-wide grid plus zero or more finer zone grids
// (building interiors and similar), each with its own node density. Zone
// grids are added first; `build` then generates the terrain grid over the
// mission bounds while avoiding the zone footprints, so regions never
// overlap and a position belongs to exactly one grid.
//
// Query routing: `closest_node` tests the position against the registered
// zone volumes (ground-plane containment — the vertical-ray test) and
// delegates to the matching zone grid, falling back to the terrain grid.
// Callers never know which grid answered.
//
// Building is idempotent — a second `build` on a compiled map is a no-op.
// `clear` tears everything down for a world unload; the map can then be
// rebuilt. A running node total across all grids is kept for diagnostics.
//
// Ownership: the map exclusively owns its grids, each grid its nodes.
// Paths refer into the graph by id only and resolve softly, so a stale
// path against a rebuilt map degrades to "no position" instead of
// dangling.
//
// See also: `grid.rs` for construction, `path.rs` for the consumer side.

use crate::config::NavConfig;
use crate::grid::PathGrid;
use crate::node::PathNode;
use crate::types::{GridId, NodeId, WorldBox, WorldPos};
use crate::world::{CollisionQuery, MissionBounds, TerrainHeight};

/// All navigation grids for the current world.
#[derive(Debug, Default)]
pub struct PathMap {
    grids: Vec<PathGrid>,
    /// Routing volume per grid; `None` for the terrain grid, which is the
    /// fallback rather than a zone.
    zones: Vec<Option<WorldBox>>,
    terrain_grid: Option<GridId>,
    compiled: bool,
    node_count: usize,
}

impl PathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `build` has completed successfully.
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    /// Total live nodes across all grids — diagnostic only.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    pub fn grid(&self, id: GridId) -> &PathGrid {
        &self.grids[id.index()]
    }

    pub fn node(&self, grid: GridId, node: NodeId) -> &PathNode {
        self.grids[grid.index()].node(node)
    }

    /// Soft node lookup — `None` for ids from a previous build.
    pub fn try_node(&self, grid: GridId, node: NodeId) -> Option<&PathNode> {
        self.grids.get(grid.index())?.try_node(node)
    }

    /// Add a finer-grained grid over `region` before `build`. Its buffered
    /// footprint is registered as a routing zone and excluded from the
    /// terrain grid.
    pub fn add_zone_grid<W>(
        &mut self,
        region: WorldBox,
        world: &W,
        config: &NavConfig,
    ) -> Result<GridId, String>
    where
        W: CollisionQuery + TerrainHeight,
    {
        if self.compiled {
            return Err("map already built; clear it before adding zone grids".to_string());
        }
        let avoid: Vec<WorldBox> = self.grids.iter().map(|g| g.bounds()).collect();
        let grid = PathGrid::build(region, &avoid, config.grid.zone_density, world, config)?;
        let zone = grid.bounds().padded(config.grid.zone_buffer);

        let id = GridId(self.grids.len() as u32);
        self.grids.push(grid);
        self.zones.push(Some(zone));
        Ok(id)
    }

    /// Build the terrain grid over the mission bounds, avoiding every
    /// zone grid's footprint. Idempotent: a compiled map returns
    /// immediately.
    pub fn build<W>(&mut self, world: &W, config: &NavConfig) -> Result<(), String>
    where
        W: CollisionQuery + TerrainHeight + MissionBounds,
    {
        if self.compiled {
            return Ok(());
        }
        log::info!("building path map");

        let area = world
            .mission_area()
            .ok_or_else(|| "mission bounds unavailable; map not built".to_string())?;

        let avoid: Vec<WorldBox> = self.grids.iter().map(|g| g.bounds()).collect();
        let terrain = PathGrid::build(area, &avoid, config.grid.terrain_density, world, config)?;

        let id = GridId(self.grids.len() as u32);
        self.grids.push(terrain);
        self.zones.push(None);
        self.terrain_grid = Some(id);
        self.compiled = true;
        self.node_count = self.grids.iter().map(|g| g.node_count()).sum();

        log::info!(
            "path map built: {} grids, {} nodes",
            self.grids.len(),
            self.node_count
        );
        Ok(())
    }

    /// Tear the map down for a world unload. A later `build` starts over.
    pub fn clear(&mut self) {
        self.grids.clear();
        self.zones.clear();
        self.terrain_grid = None;
        self.compiled = false;
        self.node_count = 0;
    }

    /// Nearest graph node to `pos`, routed through zone containment: a
    /// position standing in a registered zone volume is answered by that
    /// zone's grid (at its own density), anything else by the terrain
    /// grid. `None` until the map is built.
    pub fn closest_node(&self, pos: WorldPos) -> Option<(GridId, NodeId)> {
        if !self.compiled {
            return None;
        }
        for (i, zone) in self.zones.iter().enumerate() {
            if let Some(volume) = zone {
                if volume.contains_xy(pos) {
                    let grid_id = GridId(i as u32);
                    if let Some(node) = self.grids[i].closest_node(pos) {
                        return Some((grid_id, node));
                    }
                }
            }
        }
        let terrain = self.terrain_grid?;
        self.grids[terrain.index()]
            .closest_node(pos)
            .map(|node| (terrain, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BoxWorld;

    fn unit_config() -> NavConfig {
        let mut config = NavConfig::default();
        config.grid.grid_cell_size = 1.0;
        config.grid.terrain_density = 1.0;
        config.grid.zone_density = 4.0;
        config.grid.zone_buffer = [0.5, 0.5, 0.0];
        config
    }

    fn world() -> BoxWorld {
        BoxWorld::flat(WorldBox::new(
            WorldPos::new(0.0, 0.0, 0.0),
            WorldPos::new(20.0, 20.0, 10.0),
        ))
    }

    #[test]
    fn build_creates_terrain_grid_and_counts_nodes() {
        let mut map = PathMap::new();
        map.build(&world(), &unit_config()).unwrap();
        assert!(map.is_compiled());
        assert_eq!(map.grid_count(), 1);
        assert_eq!(map.node_count(), 20 * 20);
    }

    #[test]
    fn build_is_idempotent() {
        let mut map = PathMap::new();
        let config = unit_config();
        map.build(&world(), &config).unwrap();
        let count = map.node_count();
        map.build(&world(), &config).unwrap();
        assert_eq!(map.grid_count(), 1);
        assert_eq!(map.node_count(), count);
    }

    #[test]
    fn missing_mission_bounds_fails_and_leaves_map_unbuilt() {
        let mut map = PathMap::new();
        let result = map.build(&BoxWorld::unbounded(), &unit_config());
        assert!(result.is_err());
        assert!(!map.is_compiled());
        assert!(map.closest_node(WorldPos::new(1.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn closest_node_on_unbuilt_map_is_none() {
        let map = PathMap::new();
        assert!(map.closest_node(WorldPos::new(5.0, 5.0, 0.0)).is_none());
    }

    #[test]
    fn zone_grid_answers_queries_inside_its_volume() {
        let mut map = PathMap::new();
        let config = unit_config();
        let w = world();
        let zone_region =
            WorldBox::new(WorldPos::new(4.0, 4.0, 0.0), WorldPos::new(8.0, 8.0, 5.0));
        let zone_id = map.add_zone_grid(zone_region, &w, &config).unwrap();
        map.build(&w, &config).unwrap();
        assert_eq!(map.grid_count(), 2);

        // Inside the zone: answered by the zone grid.
        let (gid, _) = map.closest_node(WorldPos::new(6.0, 6.0, 0.0)).unwrap();
        assert_eq!(gid, zone_id);

        // Far outside: answered by the terrain grid.
        let (gid, _) = map.closest_node(WorldPos::new(15.0, 15.0, 0.0)).unwrap();
        assert_ne!(gid, zone_id);
    }

    #[test]
    fn zone_density_is_finer_than_terrain() {
        let mut map = PathMap::new();
        let config = unit_config();
        let w = world();
        let zone_region =
            WorldBox::new(WorldPos::new(4.0, 4.0, 0.0), WorldPos::new(8.0, 8.0, 5.0));
        let zone_id = map.add_zone_grid(zone_region, &w, &config).unwrap();
        map.build(&w, &config).unwrap();

        // zone_density 4 over a 4x4 region → step 0.5 → 8x8 lattice.
        assert_eq!(map.grid(zone_id).lattice_counts(), (8, 8));
    }

    #[test]
    fn terrain_grid_avoids_zone_footprints() {
        let mut map = PathMap::new();
        let config = unit_config();
        let w = world();
        let zone_region =
            WorldBox::new(WorldPos::new(4.0, 4.0, 0.0), WorldPos::new(8.0, 8.0, 5.0));
        let zone_id = map.add_zone_grid(zone_region, &w, &config).unwrap();
        map.build(&w, &config).unwrap();

        let zone_bounds = map.grid(zone_id).bounds();
        let terrain_id = GridId(1);
        assert_ne!(terrain_id, zone_id);
        for (_, node) in map.grid(terrain_id).nodes() {
            assert!(
                !zone_bounds.contains_xy(node.position),
                "terrain node {} inside zone footprint",
                node.position
            );
        }
    }

    #[test]
    fn adding_zone_after_build_is_rejected() {
        let mut map = PathMap::new();
        let config = unit_config();
        let w = world();
        map.build(&w, &config).unwrap();
        let zone_region =
            WorldBox::new(WorldPos::new(4.0, 4.0, 0.0), WorldPos::new(8.0, 8.0, 5.0));
        assert!(map.add_zone_grid(zone_region, &w, &config).is_err());
    }

    #[test]
    fn clear_then_rebuild() {
        let mut map = PathMap::new();
        let config = unit_config();
        let w = world();
        map.build(&w, &config).unwrap();
        let count = map.node_count();

        map.clear();
        assert!(!map.is_compiled());
        assert_eq!(map.node_count(), 0);
        assert!(map.closest_node(WorldPos::new(5.0, 5.0, 0.0)).is_none());

        map.build(&w, &config).unwrap();
        assert_eq!(map.node_count(), count);
    }

    #[test]
    fn stale_ids_resolve_softly_after_rebuild() {
        let mut map = PathMap::new();
        let config = unit_config();
        let w = world();
        map.build(&w, &config).unwrap();
        let (gid, nid) = map.closest_node(WorldPos::new(5.0, 5.0, 0.0)).unwrap();

        map.clear();
        assert!(map.try_node(gid, nid).is_none());
    }
}

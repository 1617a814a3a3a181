// Shared fixtures for the end-to-end traversal tests.
//
// Builds the small worlds the integration tests route through: an open
// meadow, a courtyard world with one building interior (zone grid), and a
// canyon world whose wall splits the terrain in two.

use briarwold_nav::{BoxWorld, NavConfig, PathMap, WorldBox, WorldPos};

/// Config tuned for small test worlds: one terrain node per world unit,
/// finer zone grids.
pub fn test_config() -> NavConfig {
    let mut config = NavConfig::default();
    config.grid.grid_cell_size = 1.0;
    config.grid.terrain_density = 1.0;
    config.grid.zone_density = 4.0;
    config.grid.zone_buffer = [0.5, 0.5, 0.0];
    config
}

/// Flat, obstacle-free 32x32 world.
pub fn open_meadow() -> BoxWorld {
    BoxWorld::flat(WorldBox::new(
        WorldPos::new(0.0, 0.0, 0.0),
        WorldPos::new(32.0, 32.0, 16.0),
    ))
}

/// A world with a walled block in the middle and water along one edge.
pub fn courtyard_world() -> BoxWorld {
    let mut world = open_meadow();
    world.add_obstacle(WorldBox::new(
        WorldPos::new(14.0, 14.0, 0.0),
        WorldPos::new(18.0, 18.0, 6.0),
    ));
    world.add_water(WorldBox::new(
        WorldPos::new(-1.0, 26.0, -2.0),
        WorldPos::new(33.0, 33.0, 0.4),
    ));
    world
}

/// A wall from edge to edge with no gap — two disconnected halves.
pub fn canyon_world() -> BoxWorld {
    let mut world = open_meadow();
    world.add_obstacle(WorldBox::new(
        WorldPos::new(15.4, -1.0, 0.0),
        WorldPos::new(16.6, 33.0, 8.0),
    ));
    world
}

/// Build a map over `world` with the test config, panicking on failure.
pub fn built_map(world: &BoxWorld) -> PathMap {
    let mut map = PathMap::new();
    map.build(world, &test_config()).expect("map build failed");
    map
}

use briarwold_nav::{
    BoxWorld, NavConfig, Path, PathFinder, PathGrid, PathMap, WorldBox, WorldPos,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// One node per world unit over a 64x64 area.
fn bench_config() -> NavConfig {
    let mut config = NavConfig::default();
    config.grid.grid_cell_size = 1.0;
    config.grid.terrain_density = 1.0;
    config
}

fn bench_world() -> BoxWorld {
    let mut world = BoxWorld::flat(WorldBox::new(
        WorldPos::new(0.0, 0.0, 0.0),
        WorldPos::new(64.0, 64.0, 16.0),
    ));
    // Scatter a few blocks so culling and detours do real work.
    for i in 0..6 {
        let x = 8.0 + i as f32 * 9.0;
        world.add_obstacle(WorldBox::new(
            WorldPos::new(x, 20.0, 0.0),
            WorldPos::new(x + 3.0, 44.0, 5.0),
        ));
    }
    world
}

fn bench_pathfinding(c: &mut Criterion) {
    let world = bench_world();
    let config = bench_config();

    let mut group = c.benchmark_group("briarwold_nav");

    group.bench_function("map_build_64x64", |b| {
        b.iter(|| {
            let mut map = PathMap::new();
            map.build(&world, &config).unwrap();
            black_box(map.node_count());
        })
    });

    let mut map = PathMap::new();
    map.build(&world, &config).unwrap();
    let terrain = map
        .closest_node(WorldPos::new(1.0, 1.0, 0.0))
        .map(|(grid, _)| grid)
        .unwrap();
    let grid: &PathGrid = map.grid(terrain);

    group.bench_function("closest_node_scan", |b| {
        b.iter(|| {
            black_box(grid.closest_node(WorldPos::new(33.3, 47.1, 0.0)));
        })
    });

    let start = grid.closest_node(WorldPos::new(1.0, 1.0, 0.0)).unwrap();
    let goal_near = grid.closest_node(WorldPos::new(12.0, 12.0, 0.0)).unwrap();
    let goal_far = grid.closest_node(WorldPos::new(62.0, 62.0, 0.0)).unwrap();
    let mut finder = PathFinder::new();

    group.bench_function("astar_short_route", |b| {
        b.iter(|| {
            let path = finder
                .find_path(grid, start, goal_near, &world, &config, false)
                .unwrap();
            black_box(path.len());
        })
    });

    group.bench_function("astar_cross_map_route", |b| {
        b.iter(|| {
            let path = finder
                .find_path(grid, start, goal_far, &world, &config, false)
                .unwrap();
            black_box(path.len());
        })
    });

    group.bench_function("astar_with_smoothing", |b| {
        b.iter(|| {
            let path = finder
                .find_path(grid, start, goal_far, &world, &config, true)
                .unwrap();
            black_box(path.len());
        })
    });

    group.bench_function("create_and_drain_path", |b| {
        b.iter(|| {
            let mut path = Path::new();
            path.create_path(
                &map,
                &mut finder,
                &world,
                WorldPos::new(1.0, 1.0, 0.0),
                WorldPos::new(62.0, 62.0, 0.0),
                true,
                &config,
            );
            let mut steps = 0usize;
            while path.has_next_node() {
                black_box(path.next_position(&map));
                steps += 1;
            }
            black_box(steps);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pathfinding);
criterion_main!(benches);

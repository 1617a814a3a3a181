// Grid construction — a regularly-spaced lattice of nodes over a region.
//
// Build order matters and is fixed:
//   1. Lattice positions from region extent and density, projected onto
//      the terrain height field.
//   2. One node per lattice point, move modifier probed from world state.
//   3. Neighbour wiring, 8-connected: each unordered pair is validated
//      once (slope limit + clearance-swept rays) and both directions are
//      added together, so edges are symmetric by construction.
//   4. Culling, only after the full wiring pass: nodes failing the
//      standalone clearance check, nodes inside an avoid region, and
//      nodes left with no surviving neighbour (iterated to a fixpoint so
//      chains of isolated nodes collapse).
//   5. Compaction: survivors are re-indexed and every neighbour list is
//      remapped, which removes a culled node from both ends of each of
//      its edges in one step.
//
// The grid is "compiled" iff at least one node survives; an uncompiled
// build is an error to the caller and the map does not keep it.
//
// `closest_node` is a linear scan over live nodes. For large terrain
// grids this is the dominant query cost; a spatial index (kd-tree) could
// replace it without changing the contract.
//
// See also: `node.rs` for the per-node geometry checks, `map.rs` which
// owns the built grids and routes queries to them.

use crate::config::NavConfig;
use crate::node::PathNode;
use crate::types::{GridCoord, NodeId, WorldBox, WorldPos};
use crate::world::{CollisionQuery, TerrainHeight};
use smallvec::SmallVec;

/// A lattice of path nodes covering a bounded region at a given density.
#[derive(Clone, Debug)]
pub struct PathGrid {
    /// Node arena; `NodeId` indexes into this.
    nodes: Vec<PathNode>,
    /// The region the grid was requested over.
    region: WorldBox,
    /// Tight bounds around the surviving nodes.
    bounds: WorldBox,
    /// Effective density (nodes per unit area) after cell-size conversion.
    density: f32,
    count_x: u16,
    count_y: u16,
    compiled: bool,
}

impl PathGrid {
    /// Build a grid over `region`, excluding `avoid` volumes, at `density`
    /// nodes per grid cell.
    pub fn build<W>(
        region: WorldBox,
        avoid: &[WorldBox],
        density: f32,
        world: &W,
        config: &NavConfig,
    ) -> Result<PathGrid, String>
    where
        W: CollisionQuery + TerrainHeight,
    {
        assert!(density > 0.0, "grid density must be positive");

        if !region.is_valid_region() {
            return Err(format!(
                "grid region degenerate: min {} max {}",
                region.min, region.max
            ));
        }

        // Density is declared per grid cell; convert to per unit area,
        // then take the square root since it applies over both axes.
        let per_unit = density / config.grid.grid_cell_size;
        let per_axis = per_unit.sqrt();
        let step = 1.0 / per_axis;

        let raw_x = (region.extent_x() * per_axis) as u32;
        let raw_y = (region.extent_y() * per_axis) as u32;
        if raw_x == 0 || raw_y == 0 {
            return Err(format!(
                "grid region {}x{} too small for density {}",
                region.extent_x(),
                region.extent_y(),
                density
            ));
        }
        if raw_x > u16::MAX as u32 || raw_y > u16::MAX as u32 {
            return Err(format!(
                "grid region {}x{} exceeds the lattice coordinate range at density {}",
                region.extent_x(),
                region.extent_y(),
                density
            ));
        }
        let count_x = raw_x as u16;
        let count_y = raw_y as u16;

        // Lattice layout is x-major: index = x * count_y + y.
        let mut nodes = Vec::with_capacity(count_x as usize * count_y as usize);
        for ix in 0..count_x {
            for iy in 0..count_y {
                let x = region.min.x + step * ix as f32;
                let y = region.min.y + step * iy as f32;
                // Project onto the terrain; points the height field does
                // not cover keep the region's base elevation.
                let z = world.sample_height(x, y).unwrap_or(region.min.z);
                let mut node = PathNode::new(WorldPos::new(x, y, z), GridCoord::new(ix, iy));
                node.update_move_modifier(world, config);
                nodes.push(node);
            }
        }
        let lattice_total = nodes.len();

        // Wire neighbours. Each unordered pair is validated once; the
        // collision query is direction-independent, so one check covers
        // both edge directions.
        let forward_dirs: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];
        for ix in 0..count_x as i32 {
            for iy in 0..count_y as i32 {
                let a = (ix * count_y as i32 + iy) as usize;
                for (dx, dy) in forward_dirs {
                    let nx = ix + dx;
                    let ny = iy + dy;
                    if nx < 0 || ny < 0 || nx >= count_x as i32 || ny >= count_y as i32 {
                        continue;
                    }
                    let b = (nx * count_y as i32 + ny) as usize;
                    if nodes[a].is_neighbour_valid(nodes[b].position, world, config) {
                        let (id_a, id_b) = (NodeId(a as u32), NodeId(b as u32));
                        nodes[a].add_neighbour(id_a, id_b);
                        nodes[b].add_neighbour(id_b, id_a);
                    }
                }
            }
        }

        // Cull after wiring. Clearance and avoid-region failures first,
        // then isolation to a fixpoint — removing one node can strand the
        // next in a chain.
        let mut keep = vec![true; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if !node.is_clear(world, config) || in_avoid_list(node, avoid, config) {
                keep[i] = false;
            }
        }
        loop {
            let mut changed = false;
            for (i, node) in nodes.iter().enumerate() {
                if keep[i] && !node.neighbours.iter().any(|n| keep[n.index()]) {
                    keep[i] = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Compact survivors, remapping neighbour ids. Dropping a culled
        // node's id from every list removes both directions of its edges
        // atomically.
        let mut remap = vec![u32::MAX; nodes.len()];
        let mut next = 0u32;
        for (i, kept) in keep.iter().enumerate() {
            if *kept {
                remap[i] = next;
                next += 1;
            }
        }
        let surviving: Vec<PathNode> = nodes
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .map(|(_, mut node)| {
                node.neighbours = node
                    .neighbours
                    .iter()
                    .filter(|n| keep[n.index()])
                    .map(|n| NodeId(remap[n.index()]))
                    .collect::<SmallVec<[NodeId; 8]>>();
                node
            })
            .collect();

        log::debug!(
            "grid build over {}x{}: {} lattice nodes, {} culled, {} surviving",
            count_x,
            count_y,
            lattice_total,
            lattice_total - surviving.len(),
            surviving.len(),
        );

        let Some(bounds) = WorldBox::from_points(surviving.iter().map(|n| n.position)) else {
            return Err("grid build left no surviving nodes".to_string());
        };

        let grid = PathGrid {
            nodes: surviving,
            region,
            bounds,
            density: per_unit,
            count_x,
            count_y,
            compiled: true,
        };
        debug_assert!(grid.neighbours_symmetric(), "neighbour graph asymmetric");
        Ok(grid)
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &PathNode {
        &self.nodes[id.index()]
    }

    pub fn try_node(&self, id: NodeId) -> Option<&PathNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PathNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// The region the grid was built over.
    pub fn region(&self) -> WorldBox {
        self.region
    }

    /// Tight bounds around the surviving nodes.
    pub fn bounds(&self) -> WorldBox {
        self.bounds
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn lattice_counts(&self) -> (u16, u16) {
        (self.count_x, self.count_y)
    }

    /// Total directed edge count — the finder sizes its open list from
    /// this.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbours.len()).sum()
    }

    /// Nearest live node to `pos` by Euclidean distance. Linear scan.
    pub fn closest_node(&self, pos: WorldPos) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_sq(pos)
                    .total_cmp(&b.position.distance_sq(pos))
            })
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Every edge must be present from both ends and no node may
    /// neighbour itself.
    fn neighbours_symmetric(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, node)| {
            node.neighbours.iter().all(|n| {
                n.index() != i
                    && n.index() < self.nodes.len()
                    && self.nodes[n.index()].has_neighbour(NodeId(i as u32))
            })
        })
    }
}

/// A node is avoided when its clearance box overlaps any avoid volume.
fn in_avoid_list(node: &PathNode, avoid: &[WorldBox], config: &NavConfig) -> bool {
    let c = config.grid.node_clearance;
    let node_box = WorldBox::new(
        node.position.offset(-c[0] * 0.5, -c[1] * 0.5, -c[2] * 0.5),
        node.position.offset(c[0] * 0.5, c[1] * 0.5, c[2] * 0.5),
    );
    avoid.iter().any(|a| a.overlaps(&node_box))
}

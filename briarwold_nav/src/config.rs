// Data-driven navigation configuration.
//
// All tunable parameters live here in `NavConfig`, loadable from JSON.
// The engine never uses magic numbers — grid construction, search, and
// smoothing all read from the config, so a world can be re-tuned without
// recompilation. Parameters are grouped into nested structs by the stage
// that consumes them: `GridParams` (construction/culling), `SearchParams`
// (A* and retry policy), `SmoothingParams` (post-search simplification).
//
// Defaults reproduce the constants the engine shipped with; worlds with
// different agent sizes override `node_clearance` and `max_slope_sq`.
//
// See also: `grid.rs` which consumes `GridParams` during construction,
// `pathfinding.rs` for `SearchParams`/`SmoothingParams`, `map.rs` which
// threads the config through map building.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Grid construction and culling parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridParams {
    /// Node density of the terrain-wide grid, in nodes per grid cell.
    pub terrain_density: f32,
    /// Node density of finer zone grids (building interiors and the like).
    pub zone_density: f32,
    /// World units per density cell. Densities above are divided by this
    /// before the per-axis node step is derived.
    pub grid_cell_size: f32,
    /// Maximum squared vertical separation between two nodes for a
    /// neighbour connection to be accepted.
    pub max_slope_sq: f32,
    /// Clearance volume around a node in X, Y, Z — the space an agent
    /// needs to stand at and move between nodes.
    pub node_clearance: [f32; 3],
    /// Padding applied around a zone grid's footprint when registering it
    /// for routing and when excluding it from the terrain grid.
    pub zone_buffer: [f32; 3],
    /// Height above a node the water probe starts from.
    pub water_probe_ceiling: f32,
}

/// A* search and retry parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchParams {
    /// Number of additional identical attempts after a failed search.
    ///
    /// Retries rerun the same start/goal unchanged, so against a static
    /// world a failed search fails the same way every time; the knob only
    /// matters when collision state can shift between attempts.
    pub retry_count: u32,
    /// Move modifier at or above which a node is considered impassable.
    pub impassable_modifier: f32,
    /// Move modifier assigned to nodes standing in water.
    pub water_modifier: f32,
}

/// Path smoothing parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmoothingParams {
    /// Master switch: a disabled config ignores smoothing requests.
    pub enabled: bool,
    /// Half-width in degrees of the corner-angle band around 90° within
    /// which an interior path node may be cut.
    pub angle_threshold_deg: f32,
    /// Maximum squared vertical separation across a smoothed shortcut.
    pub max_slope_sq: f32,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Complete navigation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavConfig {
    pub grid: GridParams,
    pub search: SearchParams,
    pub smoothing: SmoothingParams,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            grid: GridParams {
                terrain_density: 0.4,
                zone_density: 2.0,
                grid_cell_size: 10.0,
                max_slope_sq: 100.0,
                node_clearance: [1.0, 1.0, 2.3],
                zone_buffer: [10.0, 10.0, 0.0],
                water_probe_ceiling: 1000.0,
            },
            search: SearchParams {
                retry_count: 2,
                impassable_modifier: 100.0,
                water_modifier: 70.0,
            },
            smoothing: SmoothingParams {
                enabled: true,
                angle_threshold_deg: 15.0,
                max_slope_sq: 50.0,
            },
        }
    }
}

impl NavConfig {
    /// Check the config for values that would break grid construction or
    /// search. Call after loading from external data; constructors that
    /// receive a config assume it already validated.
    pub fn validate(&self) -> Result<(), String> {
        if self.grid.terrain_density <= 0.0 || self.grid.zone_density <= 0.0 {
            return Err("grid densities must be positive".to_string());
        }
        if self.grid.grid_cell_size <= 0.0 {
            return Err("grid_cell_size must be positive".to_string());
        }
        if self.grid.max_slope_sq < 0.0 || self.smoothing.max_slope_sq < 0.0 {
            return Err("slope limits must be non-negative".to_string());
        }
        if self.grid.node_clearance.iter().any(|c| *c <= 0.0) {
            return Err("node_clearance must be positive on all axes".to_string());
        }
        if self.search.impassable_modifier < 0.0 || self.search.water_modifier < 0.0 {
            return Err("move modifiers must be non-negative".to_string());
        }
        if self.smoothing.angle_threshold_deg < 0.0 || self.smoothing.angle_threshold_deg > 90.0 {
            return Err("angle_threshold_deg must be within [0, 90]".to_string());
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: NavConfig = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(NavConfig::default().validate().is_ok());
    }

    #[test]
    fn json_roundtrip() {
        let config = NavConfig::default();
        let json = config.to_json().unwrap();
        let restored = NavConfig::from_json(&json).unwrap();
        assert_eq!(restored.grid.terrain_density, config.grid.terrain_density);
        assert_eq!(restored.search.retry_count, config.search.retry_count);
        assert_eq!(
            restored.smoothing.angle_threshold_deg,
            config.smoothing.angle_threshold_deg
        );
    }

    #[test]
    fn negative_modifier_rejected() {
        let mut config = NavConfig::default();
        config.search.water_modifier = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_density_rejected() {
        let mut config = NavConfig::default();
        config.grid.terrain_density = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_json_rejects_invalid_values() {
        let mut config = NavConfig::default();
        config.grid.grid_cell_size = -5.0;
        let json = config.to_json().unwrap();
        assert!(NavConfig::from_json(&json).is_err());
    }

    #[test]
    fn overridden_values_survive_roundtrip() {
        let mut config = NavConfig::default();
        config.grid.node_clearance = [2.0, 2.0, 4.0];
        config.search.retry_count = 0;
        let restored = NavConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored.grid.node_clearance, [2.0, 2.0, 4.0]);
        assert_eq!(restored.search.retry_count, 0);
    }
}

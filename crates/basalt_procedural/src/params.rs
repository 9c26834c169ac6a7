//! # Generation Parameters
//!
//! Everything tunable about a generation run, gathered in one
//! serde-friendly record. Parameters are immutable for the duration of a
//! run and shared by reference across every chunk generated in that run;
//! changing any field invalidates all resident chunks.
//!
//! Validation happens once, at configuration time - the pipeline itself is
//! infallible given valid parameters.

use basalt_registry::{BlockKind, BlockRegistry};
use serde::{Deserialize, Serialize};

use crate::error::{WorldError, WorldResult};

/// Chunk extents in blocks. `width` applies to both horizontal axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDims {
    /// Horizontal extent (x and z).
    pub width: usize,
    /// Vertical extent (y).
    pub height: usize,
}

impl ChunkDims {
    /// Creates chunk extents.
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total cells per chunk.
    #[must_use]
    pub const fn volume(self) -> usize {
        self.width * self.height * self.width
    }

    /// Flat arena index for a local coordinate.
    ///
    /// Layout is `x + z*width + y*width*width`: one horizontal slab per y
    /// level, rows along x.
    #[inline]
    #[must_use]
    pub const fn index(self, x: usize, y: usize, z: usize) -> usize {
        x + z * self.width + y * self.width * self.width
    }

    /// Returns true if the local coordinate is inside the chunk.
    #[inline]
    #[must_use]
    pub const fn contains(self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.width
    }

    /// Signed-coordinate variant of [`ChunkDims::contains`], for neighbor
    /// probes that step off the chunk edge.
    #[inline]
    #[must_use]
    pub const fn contains_signed(self, x: isize, y: isize, z: isize) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.width
            && (y as usize) < self.height
            && (z as usize) < self.width
    }
}

/// An inclusive integer range, e.g. trunk heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeParam {
    /// Smallest allowed value.
    pub min: usize,
    /// Largest allowed value.
    pub max: usize,
}

/// Terrain height-field tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    /// Horizontal noise scale; larger values give gentler hills.
    pub scale: f64,
    /// Noise contribution to the height fraction, `[0, 1]`.
    pub magnitude: f64,
    /// Base height fraction, `[0, 1]`.
    pub offset: f64,
    /// Y level at and below which surface cells become sand.
    pub water_height: usize,
}

/// Tree placement and shape tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Placement threshold on normalized 2D noise, `[0, 1]`. Higher means
    /// more trees.
    pub frequency: f64,
    /// Trunk height range in blocks.
    pub trunk_height: RangeParam,
    /// Canopy radius range in blocks.
    pub canopy_radius: RangeParam,
    /// Per-cell fill chance inside the canopy sphere, `[0, 1]`.
    pub canopy_density: f64,
}

/// Cloud layer tunables.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudParams {
    /// Coverage threshold on normalized 2D noise, `[0, 1]`.
    pub density: f64,
    /// Horizontal noise scale.
    pub scale: f64,
}

/// Per-resource placement tunables, initialized from the registry defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceParams {
    /// The resource kind being placed.
    pub kind: BlockKind,
    /// Noise scale per axis (x, y, z).
    pub scale: [f64; 3],
    /// Placement threshold in `[-1, 1]`. Higher means rarer.
    pub scarcity: f64,
}

/// Immutable-per-run generation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// World seed. Every deterministic stream derives from it.
    pub seed: u64,
    /// Chunk extents.
    pub dims: ChunkDims,
    /// Terrain height field.
    pub terrain: TerrainParams,
    /// Trees.
    pub trees: TreeParams,
    /// Clouds.
    pub clouds: CloudParams,
    /// Resources, in registry-declared order.
    pub resources: Vec<ResourceParams>,
}

impl GenerationParams {
    /// Builds the standard parameter set, pulling resource defaults from
    /// the registry in declared order.
    #[must_use]
    pub fn standard(registry: &BlockRegistry) -> Self {
        let resources = registry
            .resources()
            .filter_map(|def| {
                def.resource.map(|res| ResourceParams {
                    kind: def.kind,
                    scale: res.scale,
                    scarcity: res.scarcity,
                })
            })
            .collect();

        Self {
            seed: 0,
            dims: ChunkDims::new(16, 32),
            terrain: TerrainParams {
                scale: 30.0,
                magnitude: 0.5,
                offset: 0.2,
                water_height: 4,
            },
            trees: TreeParams {
                frequency: 0.02,
                trunk_height: RangeParam { min: 4, max: 7 },
                canopy_radius: RangeParam { min: 1, max: 3 },
                canopy_density: 0.7,
            },
            clouds: CloudParams {
                density: 0.3,
                scale: 30.0,
            },
            resources,
        }
    }

    /// Checks every field against its sane range.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidParams`] naming the first offending
    /// field.
    pub fn validate(&self) -> WorldResult<()> {
        if self.dims.width == 0 || self.dims.height == 0 {
            return Err(WorldError::InvalidParams(format!(
                "chunk dims must be positive, got {}x{}",
                self.dims.width, self.dims.height
            )));
        }
        if self.terrain.scale <= 0.0 {
            return Err(WorldError::InvalidParams(format!(
                "terrain scale must be positive, got {}",
                self.terrain.scale
            )));
        }
        if !(0.0..=1.0).contains(&self.terrain.magnitude) {
            return Err(WorldError::InvalidParams(format!(
                "terrain magnitude must be in [0, 1], got {}",
                self.terrain.magnitude
            )));
        }
        if !(0.0..=1.0).contains(&self.terrain.offset) {
            return Err(WorldError::InvalidParams(format!(
                "terrain offset must be in [0, 1], got {}",
                self.terrain.offset
            )));
        }
        if self.terrain.water_height >= self.dims.height {
            return Err(WorldError::InvalidParams(format!(
                "water height {} outside chunk height {}",
                self.terrain.water_height, self.dims.height
            )));
        }
        if !(0.0..=1.0).contains(&self.trees.frequency) {
            return Err(WorldError::InvalidParams(format!(
                "tree frequency must be in [0, 1], got {}",
                self.trees.frequency
            )));
        }
        if self.trees.trunk_height.min == 0 || self.trees.trunk_height.min > self.trees.trunk_height.max
        {
            return Err(WorldError::InvalidParams(format!(
                "trunk height range [{}, {}] invalid",
                self.trees.trunk_height.min, self.trees.trunk_height.max
            )));
        }
        if self.trees.canopy_radius.min > self.trees.canopy_radius.max {
            return Err(WorldError::InvalidParams(format!(
                "canopy radius range [{}, {}] invalid",
                self.trees.canopy_radius.min, self.trees.canopy_radius.max
            )));
        }
        if !(0.0..=1.0).contains(&self.trees.canopy_density) {
            return Err(WorldError::InvalidParams(format!(
                "canopy density must be in [0, 1], got {}",
                self.trees.canopy_density
            )));
        }
        if !(0.0..=1.0).contains(&self.clouds.density) {
            return Err(WorldError::InvalidParams(format!(
                "cloud density must be in [0, 1], got {}",
                self.clouds.density
            )));
        }
        if self.clouds.scale <= 0.0 {
            return Err(WorldError::InvalidParams(format!(
                "cloud scale must be positive, got {}",
                self.clouds.scale
            )));
        }
        for res in &self.resources {
            if res.kind.is_empty() {
                return Err(WorldError::InvalidParams(
                    "resource entry cannot target the empty kind".into(),
                ));
            }
            if res.scale.iter().any(|&s| s <= 0.0) {
                return Err(WorldError::InvalidParams(format!(
                    "resource {:?} scale must be positive, got {:?}",
                    res.kind, res.scale
                )));
            }
            if !(-1.0..=1.0).contains(&res.scarcity) {
                return Err(WorldError::InvalidParams(format!(
                    "resource {:?} scarcity must be in [-1, 1], got {}",
                    res.kind, res.scarcity
                )));
            }
        }
        Ok(())
    }

    /// Looks up the tunables for one resource kind.
    #[must_use]
    pub fn resource(&self, kind: BlockKind) -> Option<&ResourceParams> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Serializes to the JSON save-blob form.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedParamsBlob`] if encoding fails.
    pub fn to_json(&self) -> WorldResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| WorldError::MalformedParamsBlob(e.to_string()))
    }

    /// Deserializes from the JSON save-blob form and validates.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedParamsBlob`] on decode failure, or
    /// [`WorldError::InvalidParams`] if the decoded record is out of range.
    pub fn from_json(blob: &[u8]) -> WorldResult<Self> {
        let params: Self = serde_json::from_slice(blob)
            .map_err(|e| WorldError::MalformedParamsBlob(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Serializes to a TOML parameter file.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedParamsBlob`] if encoding fails.
    pub fn to_toml_string(&self) -> WorldResult<String> {
        toml::to_string_pretty(self).map_err(|e| WorldError::MalformedParamsBlob(e.to_string()))
    }

    /// Parses a TOML parameter file and validates.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MalformedParamsBlob`] on parse failure, or
    /// [`WorldError::InvalidParams`] if the parsed record is out of range.
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        let params: Self =
            toml::from_str(text).map_err(|e| WorldError::MalformedParamsBlob(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::standard(&BlockRegistry::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_params_validate() {
        GenerationParams::default().validate().unwrap();
    }

    #[test]
    fn standard_resources_follow_registry_order() {
        let params = GenerationParams::default();
        let kinds: Vec<BlockKind> = params.resources.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Stone, BlockKind::CoalOre, BlockKind::IronOre]
        );
    }

    #[test]
    fn negative_scale_rejected() {
        let mut params = GenerationParams::default();
        params.terrain.scale = -3.0;
        assert!(matches!(
            params.validate(),
            Err(WorldError::InvalidParams(_))
        ));
    }

    #[test]
    fn water_above_chunk_rejected() {
        let mut params = GenerationParams::default();
        params.terrain.water_height = params.dims.height;
        assert!(params.validate().is_err());
    }

    #[test]
    fn zero_dims_rejected() {
        let mut params = GenerationParams::default();
        params.dims.width = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let params = GenerationParams::default();
        let blob = params.to_json().unwrap();
        let restored = GenerationParams::from_json(&blob).unwrap();
        assert_eq!(params, restored);
    }

    #[test]
    fn toml_round_trip() {
        let params = GenerationParams::default();
        let text = params.to_toml_string().unwrap();
        let restored = GenerationParams::from_toml_str(&text).unwrap();
        assert_eq!(params, restored);
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            GenerationParams::from_json(b"not json"),
            Err(WorldError::MalformedParamsBlob(_))
        ));
    }

    #[test]
    fn index_layout() {
        let dims = ChunkDims::new(4, 8);
        assert_eq!(dims.index(0, 0, 0), 0);
        assert_eq!(dims.index(1, 0, 0), 1);
        assert_eq!(dims.index(0, 0, 1), 4);
        assert_eq!(dims.index(0, 1, 0), 16);
        assert_eq!(dims.volume(), 4 * 8 * 4);
    }
}

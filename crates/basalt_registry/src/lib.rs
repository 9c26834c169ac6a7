//! # Basalt Block Registry
//!
//! Static catalog of every block kind the voxel world can contain.
//!
//! The registry is built once at startup and never mutated; per-run tuning
//! of resource placement happens in the generation parameters, which are
//! *initialized* from the defaults recorded here.
//!
//! ## Resource ordering
//!
//! `BlockRegistry::resources` yields resource kinds in declared order, and
//! the generation pipeline samples them in that order. Later resources
//! overwrite earlier ones at the same cell - this layering is part of the
//! world's deterministic output, so the order must stay stable.

#![deny(missing_docs)]
#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

/// The material occupying a single voxel cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockKind {
    /// No solid material.
    #[default]
    Empty = 0,
    /// Surface grass.
    Grass = 1,
    /// Subsurface dirt.
    Dirt = 2,
    /// Sand, placed at and below the water line.
    Sand = 3,
    /// Stone, the most common underground resource.
    Stone = 4,
    /// Coal ore.
    CoalOre = 5,
    /// Iron ore.
    IronOre = 6,
    /// Tree trunk.
    Trunk = 7,
    /// Tree canopy leaves.
    Leaves = 8,
    /// Cloud, placed at the top layer of a chunk.
    Cloud = 9,
}

impl BlockKind {
    /// All kinds, in id order.
    pub const ALL: [Self; 10] = [
        Self::Empty,
        Self::Grass,
        Self::Dirt,
        Self::Sand,
        Self::Stone,
        Self::CoalOre,
        Self::IronOre,
        Self::Trunk,
        Self::Leaves,
        Self::Cloud,
    ];

    /// Returns the numeric id of this kind.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns true if this kind means "no solid material".
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts from a numeric id.
    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Empty),
            1 => Some(Self::Grass),
            2 => Some(Self::Dirt),
            3 => Some(Self::Sand),
            4 => Some(Self::Stone),
            5 => Some(Self::CoalOre),
            6 => Some(Self::IronOre),
            7 => Some(Self::Trunk),
            8 => Some(Self::Leaves),
            9 => Some(Self::Cloud),
            _ => None,
        }
    }
}

/// Generation defaults for a resource kind.
///
/// Resources are placed by sampling 3D noise at the world position divided
/// by `scale`; cells whose sample exceeds `scarcity` get the resource.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResourceDef {
    /// Noise scale per axis (x, y, z). Larger values produce larger veins.
    pub scale: [f64; 3],
    /// Placement threshold in `[-1, 1]`. Higher means rarer.
    pub scarcity: f64,
}

/// Catalog entry for one block kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockDef {
    /// The kind this entry describes.
    pub kind: BlockKind,
    /// Human-readable name.
    pub name: &'static str,
    /// Generation defaults, present only for resource kinds.
    pub resource: Option<ResourceDef>,
}

/// Immutable catalog of block kinds.
///
/// Entries are stored in id order, so lookup by kind is an index.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    defs: Vec<BlockDef>,
}

impl BlockRegistry {
    /// Builds the standard catalog.
    #[must_use]
    pub fn standard() -> Self {
        let defs = vec![
            BlockDef {
                kind: BlockKind::Empty,
                name: "Empty",
                resource: None,
            },
            BlockDef {
                kind: BlockKind::Grass,
                name: "Grass",
                resource: None,
            },
            BlockDef {
                kind: BlockKind::Dirt,
                name: "Dirt",
                resource: None,
            },
            BlockDef {
                kind: BlockKind::Sand,
                name: "Sand",
                resource: None,
            },
            BlockDef {
                kind: BlockKind::Stone,
                name: "Stone",
                resource: Some(ResourceDef {
                    scale: [30.0, 30.0, 30.0],
                    scarcity: 0.5,
                }),
            },
            BlockDef {
                kind: BlockKind::CoalOre,
                name: "Coal Ore",
                resource: Some(ResourceDef {
                    scale: [20.0, 20.0, 20.0],
                    scarcity: 0.8,
                }),
            },
            BlockDef {
                kind: BlockKind::IronOre,
                name: "Iron Ore",
                resource: Some(ResourceDef {
                    scale: [60.0, 60.0, 60.0],
                    scarcity: 0.9,
                }),
            },
            BlockDef {
                kind: BlockKind::Trunk,
                name: "Tree Trunk",
                resource: None,
            },
            BlockDef {
                kind: BlockKind::Leaves,
                name: "Leaves",
                resource: None,
            },
            BlockDef {
                kind: BlockKind::Cloud,
                name: "Cloud",
                resource: None,
            },
        ];
        Self { defs }
    }

    /// Looks up the catalog entry for a kind.
    #[must_use]
    pub fn get(&self, kind: BlockKind) -> &BlockDef {
        &self.defs[kind.id() as usize]
    }

    /// Iterates all entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter()
    }

    /// Iterates resource entries in declared order.
    ///
    /// The generation pipeline depends on this order being stable.
    pub fn resources(&self) -> impl Iterator<Item = &BlockDef> {
        self.defs.iter().filter(|d| d.resource.is_some())
    }

    /// Number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns true if the catalog is empty. It never is for `standard()`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(BlockKind::from_id(200), None);
    }

    #[test]
    fn entries_indexed_by_id() {
        let registry = BlockRegistry::standard();
        for kind in BlockKind::ALL {
            assert_eq!(registry.get(kind).kind, kind);
        }
    }

    #[test]
    fn resource_order_is_stable() {
        let registry = BlockRegistry::standard();
        let order: Vec<BlockKind> = registry.resources().map(|d| d.kind).collect();
        assert_eq!(
            order,
            vec![BlockKind::Stone, BlockKind::CoalOre, BlockKind::IronOre]
        );
    }

    #[test]
    fn resource_defaults() {
        let registry = BlockRegistry::standard();
        let stone = registry.get(BlockKind::Stone).resource.unwrap();
        assert_eq!(stone.scale, [30.0, 30.0, 30.0]);
        assert!((stone.scarcity - 0.5).abs() < f64::EPSILON);
        assert!(registry.get(BlockKind::Grass).resource.is_none());
    }

    #[test]
    fn only_empty_is_empty() {
        assert!(BlockKind::Empty.is_empty());
        for kind in BlockKind::ALL.into_iter().skip(1) {
            assert!(!kind.is_empty());
        }
    }
}

//! The immutable block catalog: one entry per block kind, O(1) lookup by id.

use super::block::{BlockId, Opacity};

/// Material properties of one block kind. The catalog owns the only copy;
/// chunks store ids.
#[derive(Debug, Clone)]
pub struct BlockDef {
    pub name: &'static str,
    pub opacity: Opacity,
    pub is_fluid: bool,
    /// Emitted light level, 0-15.
    pub emitted_light: u8,
    /// Whether ships, projectiles, and raycasts collide with it.
    pub is_solid: bool,
    pub tint: [f32; 3],
    pub hardness: f32,
}

/// Well-known block ids, matching the order of [`BlockCatalog::builtin`].
pub mod blocks {
    use super::BlockId;

    pub const AIR: BlockId = BlockId(0);
    pub const BEDROCK: BlockId = BlockId(1);
    pub const STONE: BlockId = BlockId(2);
    pub const DIRT: BlockId = BlockId(3);
    pub const GRASS: BlockId = BlockId(4);
    pub const SAND: BlockId = BlockId(5);
    pub const GRAVEL: BlockId = BlockId(6);
    pub const SANDSTONE: BlockId = BlockId(7);
    pub const SNOW: BlockId = BlockId(8);
    pub const WATER: BlockId = BlockId(9);
    pub const ICE: BlockId = BlockId(10);
    pub const CLAY: BlockId = BlockId(11);
    pub const BASALT: BlockId = BlockId(12);
    pub const VOLCANIC_ASH: BlockId = BlockId(13);
    pub const MAGMA: BlockId = BlockId(14);
    pub const WOOD: BlockId = BlockId(15);
    pub const LEAVES: BlockId = BlockId(16);
    pub const PALM_WOOD: BlockId = BlockId(17);
    pub const PALM_LEAVES: BlockId = BlockId(18);
    pub const BRAIN_CORAL: BlockId = BlockId(19);
    pub const FAN_CORAL: BlockId = BlockId(20);
    pub const KELP: BlockId = BlockId(21);
    pub const COAL_ORE: BlockId = BlockId(22);
    pub const IRON_ORE: BlockId = BlockId(23);
    pub const GOLD_ORE: BlockId = BlockId(24);
}

pub struct BlockCatalog {
    defs: Vec<BlockDef>,
}

impl BlockCatalog {
    /// The built-in block set. Id 0 is always air.
    pub fn builtin() -> Self {
        let solid = |name, tint, hardness| BlockDef {
            name,
            opacity: Opacity::Opaque,
            is_fluid: false,
            emitted_light: 0,
            is_solid: true,
            tint,
            hardness,
        };

        let defs = vec![
            BlockDef {
                name: "air",
                opacity: Opacity::Air,
                is_fluid: false,
                emitted_light: 0,
                is_solid: false,
                tint: [1.0, 1.0, 1.0],
                hardness: 0.0,
            },
            BlockDef {
                name: "bedrock",
                hardness: f32::INFINITY,
                ..solid("bedrock", [0.22, 0.22, 0.24], 0.0)
            },
            solid("stone", [0.55, 0.55, 0.57], 1.5),
            solid("dirt", [0.47, 0.33, 0.21], 0.5),
            solid("grass", [0.33, 0.62, 0.25], 0.6),
            solid("sand", [0.87, 0.81, 0.58], 0.5),
            solid("gravel", [0.52, 0.50, 0.48], 0.6),
            solid("sandstone", [0.83, 0.76, 0.54], 0.8),
            solid("snow", [0.95, 0.96, 0.98], 0.2),
            BlockDef {
                name: "water",
                opacity: Opacity::Transparent,
                is_fluid: true,
                emitted_light: 0,
                is_solid: false,
                tint: [0.18, 0.38, 0.60],
                hardness: 0.0,
            },
            BlockDef {
                name: "ice",
                opacity: Opacity::Transparent,
                ..solid("ice", [0.68, 0.82, 0.95], 0.5)
            },
            solid("clay", [0.62, 0.64, 0.69], 0.6),
            solid("basalt", [0.27, 0.26, 0.28], 1.8),
            solid("volcanic_ash", [0.38, 0.35, 0.34], 0.4),
            BlockDef {
                name: "magma",
                emitted_light: 12,
                ..solid("magma", [0.90, 0.35, 0.10], 1.2)
            },
            solid("wood", [0.44, 0.31, 0.17], 1.0),
            BlockDef {
                name: "leaves",
                opacity: Opacity::Transparent,
                ..solid("leaves", [0.25, 0.48, 0.18], 0.2)
            },
            solid("palm_wood", [0.55, 0.42, 0.26], 1.0),
            BlockDef {
                name: "palm_leaves",
                opacity: Opacity::Transparent,
                ..solid("palm_leaves", [0.35, 0.58, 0.22], 0.2)
            },
            BlockDef {
                name: "brain_coral",
                is_solid: false,
                ..solid("brain_coral", [0.89, 0.47, 0.62], 0.3)
            },
            BlockDef {
                name: "fan_coral",
                opacity: Opacity::Transparent,
                is_solid: false,
                ..solid("fan_coral", [0.93, 0.60, 0.30], 0.3)
            },
            BlockDef {
                name: "kelp",
                opacity: Opacity::Transparent,
                is_solid: false,
                ..solid("kelp", [0.18, 0.42, 0.20], 0.1)
            },
            solid("coal_ore", [0.35, 0.35, 0.36], 1.6),
            solid("iron_ore", [0.63, 0.52, 0.45], 1.8),
            solid("gold_ore", [0.73, 0.64, 0.33], 1.8),
        ];

        Self { defs }
    }

    pub fn def(&self, id: BlockId) -> &BlockDef {
        &self.defs[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn opacity(&self, id: BlockId) -> Opacity {
        self.def(id).opacity
    }

    pub fn is_fluid(&self, id: BlockId) -> bool {
        self.def(id).is_fluid
    }

    pub fn emitted_light(&self, id: BlockId) -> u8 {
        self.def(id).emitted_light
    }

    pub fn is_solid_collider(&self, id: BlockId) -> bool {
        self.def(id).is_solid
    }

    pub fn tint(&self, id: BlockId) -> [f32; 3] {
        self.def(id).tint
    }

    pub fn hardness(&self, id: BlockId) -> f32 {
        self.def(id).hardness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_air_is_id_zero() {
        let catalog = BlockCatalog::builtin();
        assert_eq!(catalog.def(BlockId::AIR).name, "air");
        assert_eq!(catalog.opacity(BlockId::AIR), Opacity::Air);
        assert!(!catalog.is_solid_collider(BlockId::AIR));
    }

    #[test]
    fn test_fluid_and_light_flags() {
        let catalog = BlockCatalog::builtin();
        assert!(catalog.is_fluid(blocks::WATER));
        assert!(!catalog.is_solid_collider(blocks::WATER));
        assert_eq!(catalog.emitted_light(blocks::MAGMA), 12);
        assert!(catalog.is_solid_collider(blocks::STONE));
    }

    #[test]
    fn test_named_ids_match_table_order() {
        let catalog = BlockCatalog::builtin();
        assert_eq!(catalog.def(blocks::WATER).name, "water");
        assert_eq!(catalog.def(blocks::GOLD_ORE).name, "gold_ore");
        assert_eq!(catalog.def(blocks::PALM_LEAVES).name, "palm_leaves");
    }
}

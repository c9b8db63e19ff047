//! Biome classification table.
//!
//! Classification is discrete: every column gets exactly one biome from
//! temperature/humidity plus the height band it falls in. The heightmap is
//! continuous independently of biome, so coastlines and relief never step;
//! visual blending between neighboring biomes is the renderer's business
//! (tints give it enough to work with).

use crate::world::catalog::blocks;
use crate::world::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Biome {
    Ocean,
    DeepOcean,
    ShallowWater,
    Beach,
    TropicalForest,
    Jungle,
    TropicalGrassland,
    Forest,
    Grassland,
    Hills,
    Desert,
    Savanna,
    Mountain,
    VolcanicPeak,
    VolcanicSlopes,
    VolcanicPlains,
    SwampPlain,
    SwampHills,
    Plains,
    Tundra,
}

/// Per-biome generation and gameplay parameters.
#[derive(Debug, Clone, Copy)]
pub struct BiomeProfile {
    /// Expected trees per chunk.
    pub tree_density: f32,
    /// Ground cover / kelp per chunk.
    pub vegetation_density: f32,
    /// Scales ore vein attempts.
    pub resource_richness: f32,
    /// Sailing hazard multiplier consumed by navigation gameplay.
    pub navigation_difficulty: f32,
    /// Expected coral clusters per chunk.
    pub coral_chance: f32,
    /// Block exposed at the surface.
    pub surface: BlockId,
    /// Blocks in the few meters under the surface.
    pub filler: BlockId,
}

impl Biome {
    pub fn profile(self) -> &'static BiomeProfile {
        use Biome::*;
        match self {
            DeepOcean => &BiomeProfile {
                tree_density: 0.0,
                vegetation_density: 0.4,
                resource_richness: 0.3,
                navigation_difficulty: 0.6,
                coral_chance: 0.0,
                surface: blocks::GRAVEL,
                filler: blocks::CLAY,
            },
            Ocean => &BiomeProfile {
                tree_density: 0.0,
                vegetation_density: 1.2,
                resource_richness: 0.5,
                navigation_difficulty: 0.4,
                coral_chance: 0.3,
                surface: blocks::SAND,
                filler: blocks::SAND,
            },
            ShallowWater => &BiomeProfile {
                tree_density: 0.0,
                vegetation_density: 1.6,
                resource_richness: 0.6,
                navigation_difficulty: 1.6,
                coral_chance: 1.8,
                surface: blocks::SAND,
                filler: blocks::SAND,
            },
            Beach => &BiomeProfile {
                tree_density: 0.4,
                vegetation_density: 0.3,
                resource_richness: 0.2,
                navigation_difficulty: 1.2,
                coral_chance: 0.0,
                surface: blocks::SAND,
                filler: blocks::SAND,
            },
            TropicalForest => &BiomeProfile {
                tree_density: 3.5,
                vegetation_density: 2.4,
                resource_richness: 0.9,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Jungle => &BiomeProfile {
                tree_density: 6.0,
                vegetation_density: 3.5,
                resource_richness: 1.1,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            TropicalGrassland => &BiomeProfile {
                tree_density: 0.7,
                vegetation_density: 1.8,
                resource_richness: 0.7,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Forest => &BiomeProfile {
                tree_density: 4.0,
                vegetation_density: 1.8,
                resource_richness: 1.0,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Grassland => &BiomeProfile {
                tree_density: 0.5,
                vegetation_density: 2.0,
                resource_richness: 0.8,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Hills => &BiomeProfile {
                tree_density: 1.8,
                vegetation_density: 1.2,
                resource_richness: 1.5,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Desert => &BiomeProfile {
                tree_density: 0.05,
                vegetation_density: 0.2,
                resource_richness: 0.9,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::SAND,
                filler: blocks::SANDSTONE,
            },
            Savanna => &BiomeProfile {
                tree_density: 0.6,
                vegetation_density: 1.4,
                resource_richness: 0.8,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Mountain => &BiomeProfile {
                tree_density: 0.3,
                vegetation_density: 0.4,
                resource_richness: 2.2,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::STONE,
                filler: blocks::STONE,
            },
            VolcanicPeak => &BiomeProfile {
                tree_density: 0.0,
                vegetation_density: 0.0,
                resource_richness: 3.0,
                navigation_difficulty: 2.4,
                coral_chance: 0.0,
                surface: blocks::MAGMA,
                filler: blocks::BASALT,
            },
            VolcanicSlopes => &BiomeProfile {
                tree_density: 0.0,
                vegetation_density: 0.1,
                resource_richness: 2.4,
                navigation_difficulty: 2.0,
                coral_chance: 0.0,
                surface: blocks::BASALT,
                filler: blocks::BASALT,
            },
            VolcanicPlains => &BiomeProfile {
                tree_density: 0.2,
                vegetation_density: 0.5,
                resource_richness: 1.8,
                navigation_difficulty: 1.6,
                coral_chance: 0.0,
                surface: blocks::VOLCANIC_ASH,
                filler: blocks::BASALT,
            },
            SwampPlain => &BiomeProfile {
                tree_density: 1.6,
                vegetation_density: 2.8,
                resource_richness: 0.6,
                navigation_difficulty: 1.8,
                coral_chance: 0.0,
                surface: blocks::DIRT,
                filler: blocks::CLAY,
            },
            SwampHills => &BiomeProfile {
                tree_density: 2.2,
                vegetation_density: 2.4,
                resource_richness: 0.7,
                navigation_difficulty: 1.8,
                coral_chance: 0.0,
                surface: blocks::DIRT,
                filler: blocks::CLAY,
            },
            Plains => &BiomeProfile {
                tree_density: 0.3,
                vegetation_density: 1.6,
                resource_richness: 0.8,
                navigation_difficulty: 1.0,
                coral_chance: 0.0,
                surface: blocks::GRASS,
                filler: blocks::DIRT,
            },
            Tundra => &BiomeProfile {
                tree_density: 0.2,
                vegetation_density: 0.4,
                resource_richness: 1.2,
                navigation_difficulty: 1.3,
                coral_chance: 0.0,
                surface: blocks::SNOW,
                filler: blocks::DIRT,
            },
        }
    }

    pub fn is_water(self) -> bool {
        matches!(self, Biome::Ocean | Biome::DeepOcean | Biome::ShallowWater)
    }

    pub fn is_volcanic(self) -> bool {
        matches!(
            self,
            Biome::VolcanicPeak | Biome::VolcanicSlopes | Biome::VolcanicPlains
        )
    }
}

/// Map climate and terrain shape onto a biome. `height` is the column's
/// terrain height, `relief` the mid-frequency terrain noise in [-1, 1];
/// `temperature` and `humidity` are low-frequency fractals in [-1, 1].
pub fn classify(
    temperature: f64,
    humidity: f64,
    height: i32,
    sea_level: i32,
    relief: f64,
    volcanic: bool,
) -> Biome {
    let above_sea = height - sea_level;

    if volcanic && above_sea > -6 {
        return if above_sea > 42 {
            Biome::VolcanicPeak
        } else if above_sea > 14 {
            Biome::VolcanicSlopes
        } else {
            Biome::VolcanicPlains
        };
    }

    if above_sea < -24 {
        return Biome::DeepOcean;
    }
    if above_sea < -6 {
        return Biome::Ocean;
    }
    if above_sea < -1 {
        return Biome::ShallowWater;
    }
    if above_sea <= 2 {
        return Biome::Beach;
    }
    if above_sea > 38 {
        return Biome::Mountain;
    }
    if above_sea > 26 {
        return Biome::Hills;
    }

    if temperature > 0.45 {
        if humidity > 0.5 {
            Biome::Jungle
        } else if humidity > 0.1 {
            Biome::TropicalForest
        } else if humidity < -0.3 {
            Biome::Desert
        } else {
            Biome::TropicalGrassland
        }
    } else if temperature > 0.05 {
        if humidity > 0.55 {
            if relief > 0.25 {
                Biome::SwampHills
            } else {
                Biome::SwampPlain
            }
        } else if humidity > 0.0 {
            Biome::Forest
        } else if humidity > -0.4 {
            Biome::Savanna
        } else {
            Biome::Desert
        }
    } else if temperature > -0.45 {
        if humidity > 0.3 {
            Biome::Forest
        } else if humidity > -0.2 {
            Biome::Grassland
        } else {
            Biome::Plains
        }
    } else {
        Biome::Tundra
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_bands_override_climate() {
        assert_eq!(classify(0.9, 0.9, 30, 64, 0.0, false), Biome::DeepOcean);
        assert_eq!(classify(0.9, 0.9, 56, 64, 0.0, false), Biome::Ocean);
        assert_eq!(classify(0.9, 0.9, 61, 64, 0.0, false), Biome::ShallowWater);
        assert_eq!(classify(0.9, 0.9, 65, 64, 0.0, false), Biome::Beach);
        assert_eq!(classify(0.0, 0.0, 64 + 40, 64, 0.0, false), Biome::Mountain);
    }

    #[test]
    fn test_climate_quadrants() {
        assert_eq!(classify(0.8, 0.8, 74, 64, 0.0, false), Biome::Jungle);
        assert_eq!(classify(0.8, -0.6, 74, 64, 0.0, false), Biome::Desert);
        assert_eq!(classify(-0.8, 0.0, 74, 64, 0.0, false), Biome::Tundra);
        assert_eq!(classify(0.2, 0.7, 74, 64, 0.5, false), Biome::SwampHills);
        assert_eq!(classify(0.2, 0.7, 74, 64, 0.0, false), Biome::SwampPlain);
    }

    #[test]
    fn test_volcanic_bands() {
        assert_eq!(classify(0.0, 0.0, 64 + 50, 64, 0.0, true), Biome::VolcanicPeak);
        assert_eq!(classify(0.0, 0.0, 64 + 20, 64, 0.0, true), Biome::VolcanicSlopes);
        assert_eq!(classify(0.0, 0.0, 64 + 2, 64, 0.0, true), Biome::VolcanicPlains);
        // Deep water suppresses the volcanic override.
        assert_eq!(classify(0.0, 0.0, 30, 64, 0.0, true), Biome::DeepOcean);
    }

    #[test]
    fn test_every_biome_has_a_profile() {
        use Biome::*;
        for biome in [
            Ocean, DeepOcean, ShallowWater, Beach, TropicalForest, Jungle, TropicalGrassland,
            Forest, Grassland, Hills, Desert, Savanna, Mountain, VolcanicPeak, VolcanicSlopes,
            VolcanicPlains, SwampPlain, SwampHills, Plains, Tundra,
        ] {
            let profile = biome.profile();
            assert!(profile.tree_density >= 0.0);
            assert!(profile.navigation_difficulty > 0.0);
        }
    }
}

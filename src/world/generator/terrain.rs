//! Seed-deterministic terrain synthesis: heightmap, column fill, cave and
//! ore passes. Identical seed and chunk coordinate produce bitwise-identical
//! chunks no matter which worker runs the job or in what order neighbors
//! arrive, so nothing here reads mutable shared state.

use super::biome::{classify, Biome};
use crate::noisefield::{
    NoiseField, CHANNEL_CAVES, CHANNEL_CONTINENT, CHANNEL_HEIGHT, CHANNEL_HUMIDITY,
    CHANNEL_TEMPERATURE, CHANNEL_VOLCANIC,
};
use crate::world::catalog::blocks;
use crate::world::{BlockCatalog, BlockId, Chunk, ChunkCoord, CHUNK_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::sync::Arc;

const CONTINENT_SCALE: f64 = 0.0009;
const RELIEF_SCALE: f64 = 0.004;
const RIDGE_SCALE: f64 = 0.0016;
const CLIMATE_SCALE: f64 = 0.0011;
const VOLCANIC_SCALE: f64 = 0.0005;
const VOLCANIC_THRESHOLD: f64 = 0.58;

const CAVE_SCALE_XZ: f64 = 0.015;
const CAVE_SCALE_Y: f64 = 0.03;
const CAVE_THRESHOLD: f64 = 0.82;

/// Mix a chunk-scoped value into the world seed. The multipliers are the
/// usual large odd constants; only decorrelation matters here.
pub fn chunk_seed(world_seed: u64, coord: ChunkCoord, salt: u64) -> u64 {
    world_seed
        .wrapping_add((coord.x as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((coord.z as i64 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F))
        .wrapping_add(salt.wrapping_mul(0x1656_67B1_9E37_79F9))
}

fn slice_seed(world_seed: u64, coord: ChunkCoord, y: i32) -> u64 {
    chunk_seed(world_seed, coord, 0x0BE5).wrapping_add((y as u64).wrapping_mul(0xFF51_AFD7_ED55_8CCD))
}

pub struct TerrainGenerator {
    seed: u64,
    sea_level: i32,
    catalog: Arc<BlockCatalog>,
    height_noise: NoiseField,
    continent_noise: NoiseField,
    temperature_noise: NoiseField,
    humidity_noise: NoiseField,
    cave_noise: NoiseField,
    volcanic_noise: NoiseField,
}

impl TerrainGenerator {
    pub fn new(seed: u64, sea_level: i32, catalog: Arc<BlockCatalog>) -> Self {
        Self {
            seed,
            sea_level,
            catalog,
            height_noise: NoiseField::channel(seed, CHANNEL_HEIGHT),
            continent_noise: NoiseField::channel(seed, CHANNEL_CONTINENT),
            temperature_noise: NoiseField::channel(seed, CHANNEL_TEMPERATURE),
            humidity_noise: NoiseField::channel(seed, CHANNEL_HUMIDITY),
            cave_noise: NoiseField::channel(seed, CHANNEL_CAVES),
            volcanic_noise: NoiseField::channel(seed, CHANNEL_VOLCANIC),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sea_level(&self) -> i32 {
        self.sea_level
    }

    pub fn catalog(&self) -> &Arc<BlockCatalog> {
        &self.catalog
    }

    fn shape_at(&self, x: i32, z: i32) -> (i32, f64) {
        let fx = x as f64;
        let fz = z as f64;

        let continent =
            self.continent_noise
                .fractal2(fx * CONTINENT_SCALE, fz * CONTINENT_SCALE, 3, 0.5, 2.0);
        let relief = self
            .height_noise
            .fractal2(fx * RELIEF_SCALE, fz * RELIEF_SCALE, 5, 0.5, 2.0);
        let ridge = self
            .height_noise
            .ridged2(fx * RIDGE_SCALE, fz * RIDGE_SCALE, 4, 0.55, 2.1);

        let mut height = self.sea_level as f64
            + continent * 26.0
            + relief * 14.0
            + ridge * ridge * 22.0 * continent.max(0.0);

        let volcanic = self.volcanic_mask(x, z);
        if volcanic > VOLCANIC_THRESHOLD {
            height += (volcanic - VOLCANIC_THRESHOLD) * 180.0;
        }

        (height.clamp(1.0, 200.0) as i32, relief)
    }

    fn volcanic_mask(&self, x: i32, z: i32) -> f64 {
        self.volcanic_noise.fractal2(
            x as f64 * VOLCANIC_SCALE,
            z as f64 * VOLCANIC_SCALE,
            2,
            0.5,
            2.0,
        )
    }

    /// Terrain height of the column, before decoration.
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.shape_at(x, z).0
    }

    fn climate(&self, x: i32, z: i32) -> (f64, f64) {
        let fx = x as f64 * CLIMATE_SCALE;
        let fz = z as f64 * CLIMATE_SCALE;
        (
            self.temperature_noise.fractal2(fx, fz, 3, 0.5, 2.0),
            self.humidity_noise.fractal2(fx, fz, 3, 0.5, 2.0),
        )
    }

    pub fn biome_at(&self, x: i32, z: i32) -> Biome {
        let (height, relief) = self.shape_at(x, z);
        let (temperature, humidity) = self.climate(x, z);
        classify(
            temperature,
            humidity,
            height,
            self.sea_level,
            relief,
            self.volcanic_mask(x, z) > VOLCANIC_THRESHOLD,
        )
    }

    /// Fill an Empty chunk's block array: bedrock, stone body, biome surface
    /// layers, water to sea level, then the cave and ore passes.
    pub fn generate_terrain(&self, chunk: &mut Chunk) {
        let coord = chunk.coord();
        let (base_x, base_z) = coord.base();

        for lz in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                let wx = base_x + lx as i32;
                let wz = base_z + lz as i32;
                let (height, relief) = self.shape_at(wx, wz);
                let (temperature, humidity) = self.climate(wx, wz);
                let biome = classify(
                    temperature,
                    humidity,
                    height,
                    self.sea_level,
                    relief,
                    self.volcanic_mask(wx, wz) > VOLCANIC_THRESHOLD,
                );
                let profile = biome.profile();

                self.fill_column(chunk, lx, lz, wx, wz, height, profile.surface, profile.filler);
            }
        }

        self.ore_pass(chunk);
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_column(
        &self,
        chunk: &mut Chunk,
        lx: u32,
        lz: u32,
        wx: i32,
        wz: i32,
        height: i32,
        surface: BlockId,
        filler: BlockId,
    ) {
        chunk.set(lx, 0, lz, blocks::BEDROCK);

        for y in 1..=height.min(255) {
            let id = if y == height {
                surface
            } else if y > height - 3 {
                filler
            } else {
                blocks::STONE
            };

            // Carve caves through the rock body, keeping a roof under the
            // surface layers.
            if id == blocks::STONE && y >= 2 && y < height - 4 && self.is_cave(wx, y, wz) {
                continue;
            }
            chunk.set(lx, y as u32, lz, id);
        }

        if height < self.sea_level {
            for y in (height + 1)..=self.sea_level {
                chunk.set(lx, y as u32, lz, blocks::WATER);
            }
        }
    }

    fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        self.cave_noise.ridged3(
            x as f64 * CAVE_SCALE_XZ,
            y as f64 * CAVE_SCALE_Y,
            z as f64 * CAVE_SCALE_XZ,
            3,
            0.6,
            2.0,
        ) > CAVE_THRESHOLD
    }

    /// Ore veins per y-slice, seeded from (chunk coord, y) so the pass is
    /// order-independent.
    fn ore_pass(&self, chunk: &mut Chunk) {
        let coord = chunk.coord();
        let richness = {
            let (base_x, base_z) = coord.base();
            self.biome_at(base_x + 8, base_z + 8).profile().resource_richness
        };

        for y in 2..56i32 {
            let mut rng = ChaCha12Rng::seed_from_u64(slice_seed(self.seed, coord, y));
            let attempts = (richness * 1.5) as u32 + u32::from(rng.gen_ratio(1, 3));
            for _ in 0..attempts {
                let lx = rng.gen_range(0..CHUNK_SIZE);
                let lz = rng.gen_range(0..CHUNK_SIZE);
                let ore = Self::ore_for_depth(y, &mut rng);
                if chunk.block_id(lx, y as u32, lz) == blocks::STONE {
                    chunk.set(lx, y as u32, lz, ore);
                }
            }
        }
    }

    fn ore_for_depth(y: i32, rng: &mut ChaCha12Rng) -> BlockId {
        // Deeper slices favor the richer ores.
        let roll: f32 = rng.gen();
        if y < 18 {
            if roll < 0.20 {
                blocks::GOLD_ORE
            } else if roll < 0.55 {
                blocks::IRON_ORE
            } else {
                blocks::COAL_ORE
            }
        } else if y < 36 {
            if roll < 0.40 {
                blocks::IRON_ORE
            } else {
                blocks::COAL_ORE
            }
        } else {
            blocks::COAL_ORE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> TerrainGenerator {
        TerrainGenerator::new(0xC0FFEE, 64, Arc::new(BlockCatalog::builtin()))
    }

    fn generate(coord: ChunkCoord) -> Chunk {
        let generator = generator();
        let mut chunk = Chunk::new(coord);
        generator.generate_terrain(&mut chunk);
        chunk
    }

    #[test]
    fn test_origin_height_stays_in_expected_band() {
        let generator = generator();
        let h = generator.surface_height(0, 0);
        assert!((0..=128).contains(&h), "height at origin: {h}");
    }

    #[test]
    fn test_terrain_is_deterministic_across_threads() {
        // Generate the same chunk on two threads started in opposite order.
        let a = std::thread::spawn(|| generate(ChunkCoord::new(0, 0)));
        let b = std::thread::spawn(|| generate(ChunkCoord::new(0, 0)));
        let chunk_b = b.join().unwrap();
        let chunk_a = a.join().unwrap();
        assert!(chunk_a.content_eq(&chunk_b));
    }

    #[test]
    fn test_bedrock_floors_every_column() {
        let chunk = generate(ChunkCoord::new(3, -2));
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                assert_eq!(chunk.block_id(x, 0, z), blocks::BEDROCK);
            }
        }
    }

    #[test]
    fn test_coastal_columns_fill_with_water_to_sea_level() {
        let generator = generator();

        // Search outward for a submerged column; the seeded world has ocean
        // within a few hundred chunks of anywhere.
        let mut found = None;
        'search: for cz in 0..256 {
            for cx in 0..256 {
                let coord = ChunkCoord::new(cx * 3, cz * 3);
                let (bx, bz) = coord.base();
                if generator.surface_height(bx + 8, bz + 8) < 60 {
                    found = Some(coord);
                    break 'search;
                }
            }
        }
        let coord = found.expect("no ocean found in the sample region");
        let mut chunk = Chunk::new(coord);
        generator.generate_terrain(&mut chunk);

        let h = {
            let (bx, bz) = coord.base();
            generator.surface_height(bx + 8, bz + 8)
        };
        // Water sits on the terrain up to sea level, terrain below is solid.
        assert_eq!(chunk.block_id(8, (h + 1) as u32, 8), blocks::WATER);
        assert_eq!(chunk.block_id(8, 64, 8), blocks::WATER);
        let floor = chunk.block_id(8, h as u32, 8);
        assert!(
            generator.catalog().is_solid_collider(floor),
            "sea floor should be solid, got {floor}"
        );
    }

    #[test]
    fn test_water_never_above_sea_level() {
        let chunk = generate(ChunkCoord::new(-5, 11));
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for y in 65..90u32 {
                    assert_ne!(chunk.block_id(x, y, z), blocks::WATER);
                }
            }
        }
    }

    #[test]
    fn test_biome_is_stable_per_column() {
        let generator = generator();
        for (x, z) in [(0, 0), (1000, -250), (-4096, 4096)] {
            assert_eq!(generator.biome_at(x, z), generator.biome_at(x, z));
        }
    }

    #[test]
    fn test_ore_only_replaces_stone() {
        let chunk = generate(ChunkCoord::new(7, 7));
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for y in 0..2u32 {
                    let id = chunk.block_id(x, y, z);
                    assert!(
                        id != blocks::COAL_ORE && id != blocks::IRON_ORE && id != blocks::GOLD_ORE
                            || y >= 2,
                        "ore in the bedrock band"
                    );
                }
            }
        }
    }
}

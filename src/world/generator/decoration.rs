//! Feature decoration: trees, palms, coral, kelp.
//!
//! Decorations are computed purely from (seed, chunk coord) plus the
//! already-deterministic terrain, so every chunk decorates identically no
//! matter the worker interleaving. Edits that land outside the source chunk
//! are returned as deferred edits; they only ever write leaf-type blocks
//! into air, which keeps cross-chunk application commutative.

use super::biome::Biome;
use super::terrain::{chunk_seed, TerrainGenerator};
use crate::world::catalog::blocks;
use crate::world::{BlockId, Chunk, ChunkCoord, CHUNK_HEIGHT, CHUNK_SIZE};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

/// A single pending block write in world coordinates.
#[derive(Debug, Clone, Copy)]
pub struct BlockEdit {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub id: BlockId,
}

/// Decoration output: edits inside the source chunk and edits spilling into
/// neighbors, grouped by target chunk.
#[derive(Debug, Default)]
pub struct DecorationSet {
    pub local: Vec<BlockEdit>,
    pub deferred: Vec<(ChunkCoord, BlockEdit)>,
}

impl DecorationSet {
    fn push(&mut self, source: ChunkCoord, edit: BlockEdit) {
        let target = ChunkCoord::from_block(edit.x, edit.z);
        if target == source {
            self.local.push(edit);
        } else {
            self.deferred.push((target, edit));
        }
    }
}

const DECORATION_SALT: u64 = 0xDEC0;

impl TerrainGenerator {
    /// Compute the decoration set for a terrain-complete chunk.
    pub fn decorations_for(&self, chunk: &Chunk) -> DecorationSet {
        let coord = chunk.coord();
        let (base_x, base_z) = coord.base();
        let mut rng = ChaCha12Rng::seed_from_u64(chunk_seed(self.seed(), coord, DECORATION_SALT));
        let mut out = DecorationSet::default();

        let biome = self.biome_at(base_x + 8, base_z + 8);
        let profile = biome.profile();

        let tree_count = density_to_count(profile.tree_density, &mut rng);
        for _ in 0..tree_count {
            let lx = rng.gen_range(1..CHUNK_SIZE - 1);
            let lz = rng.gen_range(1..CHUNK_SIZE - 1);
            self.place_tree(chunk, biome, lx, lz, &mut rng, &mut out);
        }

        let coral_count = density_to_count(profile.coral_chance, &mut rng);
        for _ in 0..coral_count {
            let lx = rng.gen_range(0..CHUNK_SIZE);
            let lz = rng.gen_range(0..CHUNK_SIZE);
            self.place_coral(chunk, lx, lz, &mut rng, &mut out);
        }

        if biome.is_water() {
            let kelp_count = density_to_count(profile.vegetation_density, &mut rng);
            for _ in 0..kelp_count {
                let lx = rng.gen_range(0..CHUNK_SIZE);
                let lz = rng.gen_range(0..CHUNK_SIZE);
                self.place_kelp(chunk, lx, lz, &mut rng, &mut out);
            }
        }

        out
    }

    fn place_tree(
        &self,
        chunk: &Chunk,
        biome: Biome,
        lx: u32,
        lz: u32,
        rng: &mut ChaCha12Rng,
        out: &mut DecorationSet,
    ) {
        let coord = chunk.coord();
        let (base_x, base_z) = coord.base();
        let Some(ground) = top_terrain_block(chunk, lx, lz) else {
            return;
        };
        let surface = chunk.block_id(lx, ground as u32, lz);

        // Palms take root in sand, ordinary trees in grass or dirt.
        let (trunk, leaves, palm) = if surface == blocks::SAND && biome == Biome::Beach {
            (blocks::PALM_WOOD, blocks::PALM_LEAVES, true)
        } else if surface == blocks::GRASS || surface == blocks::DIRT {
            (blocks::WOOD, blocks::LEAVES, false)
        } else {
            return;
        };

        let wx = base_x + lx as i32;
        let wz = base_z + lz as i32;
        let height = if palm {
            rng.gen_range(5..8)
        } else {
            rng.gen_range(4..7)
        };
        if ground + height + 2 >= CHUNK_HEIGHT as i32 {
            return;
        }

        // Trunk stays in the source chunk by construction (lx, lz interior).
        for dy in 1..=height {
            out.local.push(BlockEdit {
                x: wx,
                y: ground + dy,
                z: wz,
                id: trunk,
            });
        }

        let top = ground + height;
        if palm {
            // Fronds reach outward from the crown in the four cardinal runs.
            for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                for reach in 1..=2 {
                    out.push(
                        coord,
                        BlockEdit {
                            x: wx + dx * reach,
                            y: top + 1 - reach / 2,
                            z: wz + dz * reach,
                            id: leaves,
                        },
                    );
                }
            }
            out.push(
                coord,
                BlockEdit {
                    x: wx,
                    y: top + 1,
                    z: wz,
                    id: leaves,
                },
            );
        } else {
            // Roughly spherical canopy centered one block under the top.
            for dx in -2i32..=2 {
                for dz in -2i32..=2 {
                    for dy in -1i32..=1 {
                        if dx * dx + dz * dz + dy * dy > 5 || (dx == 0 && dz == 0 && dy <= 0) {
                            continue;
                        }
                        out.push(
                            coord,
                            BlockEdit {
                                x: wx + dx,
                                y: top + dy,
                                z: wz + dz,
                                id: leaves,
                            },
                        );
                    }
                }
            }
        }
    }

    fn place_coral(
        &self,
        chunk: &Chunk,
        lx: u32,
        lz: u32,
        rng: &mut ChaCha12Rng,
        out: &mut DecorationSet,
    ) {
        let (base_x, base_z) = chunk.coord().base();
        let Some(floor) = top_terrain_block(chunk, lx, lz) else {
            return;
        };
        // Coral grows on a submerged floor in the photic band.
        if floor + 1 > self.sea_level() || chunk.block_id(lx, (floor + 1) as u32, lz) != blocks::WATER
        {
            return;
        }
        if self.sea_level() - floor > 14 {
            return;
        }

        let id = if rng.gen_bool(0.5) {
            blocks::BRAIN_CORAL
        } else {
            blocks::FAN_CORAL
        };
        out.local.push(BlockEdit {
            x: base_x + lx as i32,
            y: floor + 1,
            z: base_z + lz as i32,
            id,
        });
    }

    fn place_kelp(
        &self,
        chunk: &Chunk,
        lx: u32,
        lz: u32,
        rng: &mut ChaCha12Rng,
        out: &mut DecorationSet,
    ) {
        let (base_x, base_z) = chunk.coord().base();
        let Some(floor) = top_terrain_block(chunk, lx, lz) else {
            return;
        };
        let depth = self.sea_level() - floor;
        if depth < 4 {
            return;
        }

        let strand = rng.gen_range(1..=4i32.min(depth - 2));
        for dy in 1..=strand {
            if chunk.block_id(lx, (floor + dy) as u32, lz) != blocks::WATER {
                break;
            }
            out.local.push(BlockEdit {
                x: base_x + lx as i32,
                y: floor + dy,
                z: base_z + lz as i32,
                id: blocks::KELP,
            });
        }
    }
}

/// Topmost non-air, non-fluid block of a column.
fn top_terrain_block(chunk: &Chunk, lx: u32, lz: u32) -> Option<i32> {
    for y in (0..CHUNK_HEIGHT).rev() {
        let id = chunk.block_id(lx, y, lz);
        if !id.is_air() && id != blocks::WATER {
            return Some(y as i32);
        }
    }
    None
}

fn density_to_count(density: f32, rng: &mut ChaCha12Rng) -> u32 {
    let base = density.floor() as u32;
    let fractional = density.fract();
    base + u32::from(fractional > 0.0 && rng.gen::<f32>() < fractional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BlockCatalog;
    use std::sync::Arc;

    fn generator() -> TerrainGenerator {
        TerrainGenerator::new(0xC0FFEE, 64, Arc::new(BlockCatalog::builtin()))
    }

    fn decorated(coord: ChunkCoord) -> (Chunk, DecorationSet) {
        let generator = generator();
        let mut chunk = Chunk::new(coord);
        generator.generate_terrain(&mut chunk);
        let set = generator.decorations_for(&chunk);
        (chunk, set)
    }

    #[test]
    fn test_decorations_are_deterministic() {
        let (_, a) = decorated(ChunkCoord::new(2, 2));
        let (_, b) = decorated(ChunkCoord::new(2, 2));
        assert_eq!(a.local.len(), b.local.len());
        assert_eq!(a.deferred.len(), b.deferred.len());
        for (ea, eb) in a.local.iter().zip(&b.local) {
            assert_eq!((ea.x, ea.y, ea.z, ea.id), (eb.x, eb.y, eb.z, eb.id));
        }
    }

    #[test]
    fn test_local_edits_stay_in_chunk() {
        for cx in -3..3 {
            let coord = ChunkCoord::new(cx * 17, cx * 5);
            let (_, set) = decorated(coord);
            for edit in &set.local {
                assert_eq!(ChunkCoord::from_block(edit.x, edit.z), coord);
            }
            for (target, edit) in &set.deferred {
                assert_ne!(*target, coord);
                assert_eq!(ChunkCoord::from_block(edit.x, edit.z), *target);
            }
        }
    }

    #[test]
    fn test_deferred_edits_are_foliage_only() {
        // Cross-chunk writes must be commutative, which holds because only
        // canopy blocks ever spill.
        for cx in 0..16 {
            for cz in 0..16 {
                let (_, set) = decorated(ChunkCoord::new(cx, cz));
                for (_, edit) in &set.deferred {
                    assert!(
                        edit.id == blocks::LEAVES || edit.id == blocks::PALM_LEAVES,
                        "unexpected deferred block {}",
                        edit.id
                    );
                }
            }
        }
    }
}

//! Per-column approximate lighting.
//!
//! Sky light is seeded top-down per column: full above the first occluder,
//! attenuated through transparent and fluid voxels, zero under opaque rock.
//! Emitted light is written at the emitting voxel only. There is no
//! flood-fill; lateral bleed is left to the renderer's filtering.

use super::catalog::BlockCatalog;
use super::chunk::{Chunk, DirtyFlags, CHUNK_HEIGHT, CHUNK_SIZE};
use super::Opacity;

/// Light drop per transparent voxel the sky column passes through.
const TRANSPARENT_FALLOFF: u8 = 1;
/// Light drop per fluid voxel; deep water goes dark.
const FLUID_FALLOFF: u8 = 2;

pub fn relight_chunk(chunk: &mut Chunk, catalog: &BlockCatalog) {
    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            relight_column(chunk, catalog, x, z);
        }
    }
    chunk.clear_dirty(DirtyFlags::LIGHT);
}

fn relight_column(chunk: &mut Chunk, catalog: &BlockCatalog, x: u32, z: u32) {
    let mut sky = 15u8;
    for y in (0..CHUNK_HEIGHT).rev() {
        let id = chunk.block_id(x, y, z);
        let def = catalog.def(id);

        match def.opacity {
            Opacity::Air => {}
            Opacity::Transparent => {
                let falloff = if def.is_fluid {
                    FLUID_FALLOFF
                } else {
                    TRANSPARENT_FALLOFF
                };
                sky = sky.saturating_sub(falloff);
            }
            Opacity::Opaque => sky = 0,
        }
        chunk.set_light(x, y, z, sky, def.emitted_light);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::catalog::blocks;
    use crate::world::ChunkCoord;

    fn lit_chunk(build: impl FnOnce(&mut Chunk)) -> (Chunk, BlockCatalog) {
        let catalog = BlockCatalog::builtin();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        build(&mut chunk);
        relight_chunk(&mut chunk, &catalog);
        (chunk, catalog)
    }

    #[test]
    fn test_open_sky_is_full_bright() {
        let (chunk, _) = lit_chunk(|_| {});
        assert_eq!(chunk.get(4, 200, 4).sky_light(), 15);
        assert_eq!(chunk.get(4, 0, 4).sky_light(), 15);
    }

    #[test]
    fn test_opaque_block_shadows_column() {
        let (chunk, _) = lit_chunk(|c| {
            c.set(4, 100, 4, blocks::STONE);
        });
        assert_eq!(chunk.get(4, 101, 4).sky_light(), 15);
        assert_eq!(chunk.get(4, 100, 4).sky_light(), 0);
        assert_eq!(chunk.get(4, 50, 4).sky_light(), 0);
        // The next column over is untouched.
        assert_eq!(chunk.get(5, 50, 4).sky_light(), 15);
    }

    #[test]
    fn test_water_attenuates_gradually() {
        let (chunk, _) = lit_chunk(|c| {
            for y in 90..=100 {
                c.set(4, y, 4, blocks::WATER);
            }
        });
        assert_eq!(chunk.get(4, 100, 4).sky_light(), 13);
        assert_eq!(chunk.get(4, 96, 4).sky_light(), 5);
        assert_eq!(chunk.get(4, 93, 4).sky_light(), 0);
    }

    #[test]
    fn test_emitted_light_written_at_source() {
        let (chunk, catalog) = lit_chunk(|c| {
            c.set(4, 80, 4, blocks::MAGMA);
        });
        assert_eq!(
            chunk.get(4, 80, 4).block_light(),
            catalog.emitted_light(blocks::MAGMA)
        );
        assert_eq!(chunk.get(4, 81, 4).block_light(), 0);
    }

    #[test]
    fn test_relight_clears_dirty_flag() {
        let catalog = BlockCatalog::builtin();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(0, 10, 0, blocks::STONE);
        assert!(chunk.dirty().contains(DirtyFlags::LIGHT));
        relight_chunk(&mut chunk, &catalog);
        assert!(!chunk.dirty().contains(DirtyFlags::LIGHT));
    }
}

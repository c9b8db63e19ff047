//! Face-culled mesh extraction.
//!
//! Each chunk produces three vertex streams so the renderer can draw
//! opaque → fluid → transparent. Vertices are position/normal/uv/color at a
//! 44-byte stride, faces wound CCW from outside. Light and per-vertex
//! ambient occlusion are folded into the color channel at build time; the
//! renderer applies no further voxel shading.

use crate::world::{Block, BlockCatalog, Chunk, Opacity, CHUNK_HEIGHT, CHUNK_SIZE};
use bytemuck::{Pod, Zeroable};
use glam::IVec3;

/// Renderer-feed vertex. `#[repr(C)]` and `Pod` so the host can upload the
/// stream without repacking.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct MeshStream {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshStream {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn add_quad(&mut self, corners: [MeshVertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
}

/// The three streams committed per chunk.
#[derive(Debug, Clone, Default)]
pub struct ChunkMeshes {
    pub solid: MeshStream,
    pub transparent: MeshStream,
    pub fluid: MeshStream,
}

impl ChunkMeshes {
    pub fn is_empty(&self) -> bool {
        self.solid.is_empty() && self.transparent.is_empty() && self.fluid.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.solid.vertices.len() + self.transparent.vertices.len() + self.fluid.vertices.len()
    }
}

struct FaceDef {
    normal: IVec3,
    /// Corner offsets from the voxel min corner, CCW from outside.
    corners: [[f32; 3]; 4],
}

const FACES: [FaceDef; 6] = [
    // +X
    FaceDef {
        normal: IVec3::new(1, 0, 0),
        corners: [
            [1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
        ],
    },
    // -X
    FaceDef {
        normal: IVec3::new(-1, 0, 0),
        corners: [
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [0.0, 1.0, 0.0],
        ],
    },
    // +Y
    FaceDef {
        normal: IVec3::new(0, 1, 0),
        corners: [
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
    },
    // -Y
    FaceDef {
        normal: IVec3::new(0, -1, 0),
        corners: [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
        ],
    },
    // +Z
    FaceDef {
        normal: IVec3::new(0, 0, 1),
        corners: [
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ],
    },
    // -Z
    FaceDef {
        normal: IVec3::new(0, 0, -1),
        corners: [
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ],
    },
];

const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Fluid columns render their top surface slightly below the voxel ceiling.
const FLUID_SURFACE_HEIGHT: f32 = 14.0 / 16.0;

/// Which stream a face belongs to.
#[derive(Clone, Copy, PartialEq)]
enum StreamKind {
    Solid,
    Transparent,
    Fluid,
}

/// Whether `this` emits a face against `neighbor`.
fn face_visible(catalog: &BlockCatalog, this: Block, neighbor: Block) -> bool {
    let this_def = catalog.def(this.id);
    let other_def = catalog.def(neighbor.id);

    match other_def.opacity {
        Opacity::Air => true,
        Opacity::Opaque => false,
        Opacity::Transparent => {
            if this_def.is_fluid {
                // Fluid against a transparent non-fluid still shows a surface.
                !other_def.is_fluid
            } else if this_def.opacity == Opacity::Transparent {
                // Identical transparents merge visually; suppress the face.
                this.id != neighbor.id
            } else {
                true
            }
        }
    }
}

/// Builds the mesh streams for one chunk. Out-of-chunk voxels are resolved
/// through `neighbor_lookup`, which receives world-space block coordinates;
/// unloaded neighbors read as air.
pub struct MeshBuilder<'a> {
    catalog: &'a BlockCatalog,
    ambient_occlusion: bool,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(catalog: &'a BlockCatalog) -> Self {
        Self {
            catalog,
            ambient_occlusion: true,
        }
    }

    pub fn with_ambient_occlusion(mut self, enabled: bool) -> Self {
        self.ambient_occlusion = enabled;
        self
    }

    pub fn build<F>(&self, chunk: &Chunk, neighbor_lookup: F) -> ChunkMeshes
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        let (base_x, base_z) = chunk.coord().base();
        let mut meshes = ChunkMeshes::default();

        let sample = |x: i32, y: i32, z: i32| -> Block {
            if y < 0 || y >= CHUNK_HEIGHT as i32 {
                return Block::AIR;
            }
            if (0..CHUNK_SIZE as i32).contains(&x) && (0..CHUNK_SIZE as i32).contains(&z) {
                chunk.get(x as u32, y as u32, z as u32)
            } else {
                neighbor_lookup(base_x + x, y, base_z + z)
            }
        };

        for y in 0..CHUNK_HEIGHT as i32 {
            for z in 0..CHUNK_SIZE as i32 {
                for x in 0..CHUNK_SIZE as i32 {
                    let this = chunk.get(x as u32, y as u32, z as u32);
                    if this.id.is_air() {
                        continue;
                    }
                    let def = self.catalog.def(this.id);
                    let kind = if def.is_fluid {
                        StreamKind::Fluid
                    } else if def.opacity == Opacity::Transparent {
                        StreamKind::Transparent
                    } else {
                        StreamKind::Solid
                    };

                    for face in &FACES {
                        let n = face.normal;
                        let neighbor = sample(x + n.x, y + n.y, z + n.z);
                        if !face_visible(self.catalog, this, neighbor) {
                            continue;
                        }
                        self.emit_face(
                            &mut meshes, kind, face, this, neighbor, x, y, z, base_x, base_z,
                            &sample,
                        );
                    }
                }
            }
        }

        meshes
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_face<F>(
        &self,
        meshes: &mut ChunkMeshes,
        kind: StreamKind,
        face: &FaceDef,
        this: Block,
        neighbor: Block,
        x: i32,
        y: i32,
        z: i32,
        base_x: i32,
        base_z: i32,
        sample: &F,
    ) where
        F: Fn(i32, i32, i32) -> Block,
    {
        let def = self.catalog.def(this.id);
        // Shade from the cell the face is exposed to, so a face against a lit
        // cell reads that cell's light.
        let light = neighbor.sky_light().max(neighbor.block_light());
        let brightness = 0.25 + 0.75 * light as f32 / 15.0;

        // A fluid cell with air above drops its top face to surface height.
        let surfaced = kind == StreamKind::Fluid && face.normal.y == 1 && neighbor.id.is_air();

        let mut corners = [MeshVertex::zeroed(); 4];
        for (i, offset) in face.corners.iter().enumerate() {
            let mut oy = offset[1];
            if surfaced {
                oy *= FLUID_SURFACE_HEIGHT;
            }
            let position = [
                (base_x + x) as f32 + offset[0],
                y as f32 + oy,
                (base_z + z) as f32 + offset[2],
            ];

            let ao = if self.ambient_occlusion && kind == StreamKind::Solid {
                self.corner_occlusion(face, *offset, x, y, z, sample)
            } else {
                1.0
            };

            let shade = brightness * ao;
            corners[i] = MeshVertex {
                position,
                normal: face.normal.as_vec3().to_array(),
                uv: FACE_UVS[i],
                color: [def.tint[0] * shade, def.tint[1] * shade, def.tint[2] * shade],
            };
        }

        let stream = match kind {
            StreamKind::Solid => &mut meshes.solid,
            StreamKind::Transparent => &mut meshes.transparent,
            StreamKind::Fluid => &mut meshes.fluid,
        };
        stream.add_quad(corners);
    }

    /// Classic three-sample corner occlusion: the two edge voxels and the
    /// diagonal voxel touching the vertex, all in the face's neighbor layer.
    fn corner_occlusion<F>(
        &self,
        face: &FaceDef,
        offset: [f32; 3],
        x: i32,
        y: i32,
        z: i32,
        sample: &F,
    ) -> f32
    where
        F: Fn(i32, i32, i32) -> Block,
    {
        let n = face.normal;
        // Signs pointing from the voxel center toward this corner, per axis.
        let sx = if offset[0] > 0.5 { 1 } else { -1 };
        let sy = if offset[1] > 0.5 { 1 } else { -1 };
        let sz = if offset[2] > 0.5 { 1 } else { -1 };

        // Tangent directions of the face plane.
        let (ta, tb) = if n.x != 0 {
            (IVec3::new(0, sy, 0), IVec3::new(0, 0, sz))
        } else if n.y != 0 {
            (IVec3::new(sx, 0, 0), IVec3::new(0, 0, sz))
        } else {
            (IVec3::new(sx, 0, 0), IVec3::new(0, sy, 0))
        };

        let layer = IVec3::new(x, y, z) + n;
        let occludes = |p: IVec3| -> bool {
            self.catalog.opacity(sample(p.x, p.y, p.z).id) == Opacity::Opaque
        };

        let side_a = occludes(layer + ta);
        let side_b = occludes(layer + tb);
        let corner = occludes(layer + ta + tb);

        let occluders = if side_a && side_b {
            3
        } else {
            side_a as u32 + side_b as u32 + corner as u32
        };
        1.0 - 0.25 * occluders as f32 * 0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{blocks, ChunkCoord};

    fn catalog() -> BlockCatalog {
        BlockCatalog::builtin()
    }

    fn lone_block_chunk(id: crate::world::BlockId) -> Chunk {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(8, 100, 8, id);
        chunk
    }

    fn air_lookup(_: i32, _: i32, _: i32) -> Block {
        Block::AIR
    }

    #[test]
    fn test_vertex_stride_matches_contract() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 44);
    }

    #[test]
    fn test_lone_cube_emits_six_faces() {
        let catalog = catalog();
        let chunk = lone_block_chunk(blocks::STONE);
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        assert_eq!(meshes.solid.vertices.len(), 24);
        assert_eq!(meshes.solid.indices.len(), 36);
        assert!(meshes.transparent.is_empty());
        assert!(meshes.fluid.is_empty());
    }

    #[test]
    fn test_buried_faces_are_culled() {
        let catalog = catalog();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        for x in 4..7 {
            for y in 4..7 {
                for z in 4..7 {
                    chunk.set(x, y, z, blocks::STONE);
                }
            }
        }
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        // A 3x3x3 cube exposes 9 faces per side.
        assert_eq!(meshes.solid.indices.len() / 6, 54);
    }

    #[test]
    fn test_solid_face_emitted_against_fluid() {
        let catalog = catalog();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(8, 100, 8, blocks::STONE);
        chunk.set(9, 100, 8, blocks::WATER);
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        // The stone cube still emits all six faces, one of them against water.
        assert_eq!(meshes.solid.indices.len() / 6, 6);
    }

    #[test]
    fn test_fluid_fluid_interfaces_suppressed() {
        let catalog = catalog();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(8, 100, 8, blocks::WATER);
        chunk.set(9, 100, 8, blocks::WATER);
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        // Two merged fluid cells: 10 outer faces, none between them, and the
        // shared wall emits nothing.
        assert_eq!(meshes.fluid.indices.len() / 6, 10);
    }

    #[test]
    fn test_identical_transparent_neighbors_merge() {
        let catalog = catalog();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(8, 100, 8, blocks::LEAVES);
        chunk.set(9, 100, 8, blocks::LEAVES);
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        assert_eq!(meshes.transparent.indices.len() / 6, 10);
    }

    #[test]
    fn test_fluid_surface_drops_below_ceiling() {
        let catalog = catalog();
        let chunk = lone_block_chunk(blocks::WATER);
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        let top_face_ys: Vec<f32> = meshes
            .fluid
            .vertices
            .iter()
            .filter(|v| v.normal[1] == 1.0)
            .map(|v| v.position[1])
            .collect();
        assert!(!top_face_ys.is_empty());
        for y in top_face_ys {
            assert!((y - (100.0 + 14.0 / 16.0)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_winding_is_ccw_from_outside() {
        let catalog = catalog();
        let chunk = lone_block_chunk(blocks::STONE);
        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);

        // For every triangle, the geometric normal must agree with the
        // vertex normal.
        let stream = &meshes.solid;
        for tri in stream.indices.chunks(3) {
            let a = glam::Vec3::from_array(stream.vertices[tri[0] as usize].position);
            let b = glam::Vec3::from_array(stream.vertices[tri[1] as usize].position);
            let c = glam::Vec3::from_array(stream.vertices[tri[2] as usize].position);
            let n = glam::Vec3::from_array(stream.vertices[tri[0] as usize].normal);
            let geometric = (b - a).cross(c - a);
            assert!(geometric.dot(n) > 0.0, "clockwise triangle found");
        }
    }

    #[test]
    fn test_cross_chunk_neighbor_culls_border_face() {
        let catalog = catalog();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(15, 100, 8, blocks::STONE);

        // Neighbor chunk reports stone directly across the border.
        let lookup = |x: i32, y: i32, _z: i32| -> Block {
            if x == 16 && y == 100 {
                Block {
                    id: blocks::STONE,
                    light: 0,
                }
            } else {
                Block::AIR
            }
        };
        let meshes = MeshBuilder::new(&catalog).build(&chunk, lookup);
        assert_eq!(meshes.solid.indices.len() / 6, 5);
    }

    #[test]
    fn test_occluded_corner_darkens_vertex() {
        let catalog = catalog();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        chunk.set(8, 100, 8, blocks::STONE);
        // A block diagonally above one top corner.
        chunk.set(9, 101, 9, blocks::STONE);

        let meshes = MeshBuilder::new(&catalog).build(&chunk, air_lookup);
        let top: Vec<&MeshVertex> = meshes
            .solid
            .vertices
            .iter()
            .filter(|v| v.normal[1] == 1.0 && v.position[1] == 101.0)
            .collect();
        let brightest = top
            .iter()
            .map(|v| v.color[0])
            .fold(f32::MIN, f32::max);
        let darkest = top.iter().map(|v| v.color[0]).fold(f32::MAX, f32::min);
        assert!(darkest < brightest, "corner next to a block should be darker");
    }
}

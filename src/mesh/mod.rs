//! Part meshes: one shared vertex buffer, one shared index buffer, and
//! sections describing contiguous runs of the index buffer that share a
//! (color, primitive type) pair.

pub mod builder;
pub mod merge;

pub use builder::MeshBuilder;
pub use merge::{merge_meshes, MergeSource};

use crate::core::types::Vec3;
use crate::math::Aabb;

/// Primitive topology of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Triangles,
    Lines,
}

/// One contiguous run of the index buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshSection {
    /// LDraw color code
    pub color: u32,
    pub primitive: PrimitiveType,
    /// First index of the run, counted in indices (not bytes)
    pub index_offset: usize,
    pub index_count: usize,
    pub bounds: Aabb,
}

impl MeshSection {
    /// Offset of the run in bytes for an index buffer with the given element size.
    pub fn byte_offset(&self, index_size: usize) -> usize {
        self.index_offset * index_size
    }
}

/// Index storage, 16-bit while every vertex is addressable with it.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Zero-filled buffer of `len` indices wide enough for `vertex_count` vertices.
    pub fn with_len(len: usize, vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize {
            IndexBuffer::U16(vec![0; len])
        } else {
            IndexBuffer::U32(vec![0; len])
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of one index in bytes
    pub fn index_size(&self) -> usize {
        match self {
            IndexBuffer::U16(_) => 2,
            IndexBuffer::U32(_) => 4,
        }
    }

    pub fn get(&self, i: usize) -> u32 {
        match self {
            IndexBuffer::U16(v) => v[i] as u32,
            IndexBuffer::U32(v) => v[i],
        }
    }

    /// Store an index, growing the buffer when writing past its end.
    pub fn set(&mut self, i: usize, value: u32) {
        match self {
            IndexBuffer::U16(v) => {
                if i >= v.len() {
                    v.resize(i + 1, 0);
                }
                v[i] = value as u16;
            }
            IndexBuffer::U32(v) => {
                if i >= v.len() {
                    v.resize(i + 1, 0);
                }
                v[i] = value;
            }
        }
    }

    /// Indices `[offset, offset + count)` widened to u32.
    pub fn range(&self, offset: usize, count: usize) -> impl Iterator<Item = u32> + '_ {
        (offset..offset + count).map(move |i| self.get(i))
    }

    /// Raw bytes for upload to a renderer.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexBuffer::U16(v) => bytemuck::cast_slice(v),
            IndexBuffer::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Geometry of a part. Write-once after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    /// xyz triples
    vertices: Vec<f32>,
    indices: IndexBuffer,
    sections: Vec<MeshSection>,
}

impl Mesh {
    /// Assemble a mesh from raw buffers.
    pub fn new(vertices: Vec<f32>, indices: IndexBuffer, sections: Vec<MeshSection>) -> Self {
        Self { vertices, indices, sections }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn vertex(&self, i: usize) -> Vec3 {
        Vec3::new(self.vertices[i * 3], self.vertices[i * 3 + 1], self.vertices[i * 3 + 2])
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.chunks_exact(3).map(|v| Vec3::new(v[0], v[1], v[2]))
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    pub fn sections(&self) -> &[MeshSection] {
        &self.sections
    }

    /// Union of all section boxes
    pub fn bounds(&self) -> Aabb {
        self.sections
            .iter()
            .fold(Aabb::EMPTY, |acc, s| acc.merged(&s.bounds))
    }

    /// Box with one triangle section and one edge-line section, both in `color`.
    pub fn box_mesh(min: Vec3, max: Vec3, color: u32) -> Mesh {
        let corners: Vec<Vec3> = (0..8u8)
            .map(|i| {
                Vec3::new(
                    if i & 1 != 0 { max.x } else { min.x },
                    if i & 2 != 0 { max.y } else { min.y },
                    if i & 4 != 0 { max.z } else { min.z },
                )
            })
            .collect();

        const FACES: [[u32; 4]; 6] = [
            [0, 2, 3, 1],
            [4, 5, 7, 6],
            [0, 1, 5, 4],
            [2, 6, 7, 3],
            [0, 4, 6, 2],
            [1, 3, 7, 5],
        ];
        const EDGES: [u32; 24] = [
            0, 1, 1, 3, 3, 2, 2, 0,
            4, 5, 5, 7, 7, 6, 6, 4,
            0, 4, 1, 5, 2, 6, 3, 7,
        ];

        let mut builder = MeshBuilder::new(8, 36 + EDGES.len());
        for c in &corners {
            builder.add_vertex(*c);
        }

        let bounds = Aabb::new(min, max);

        let tris = builder.start_section(PrimitiveType::Triangles, color);
        let triangles: Vec<u32> = FACES
            .iter()
            .flat_map(|f| [f[0], f[1], f[2], f[0], f[2], f[3]])
            .collect();
        builder.add_indices(triangles, 0);
        builder.end_section(0);
        builder.section_mut(tris).bounds = bounds;

        let lines = builder.start_section(PrimitiveType::Lines, color);
        builder.add_indices(EDGES, 0);
        builder.end_section(0);
        builder.section_mut(lines).bounds = bounds;

        builder.finish()
    }
}

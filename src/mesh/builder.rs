//! Incremental mesh writer with section bookkeeping.

use crate::core::types::Vec3;
use crate::math::Aabb;

use super::{IndexBuffer, Mesh, MeshSection, PrimitiveType};

/// Writes vertices and indices into preallocated buffers.
///
/// Sections are opened with [`start_section`](Self::start_section), filled
/// with [`add_indices`](Self::add_indices) and closed with
/// [`end_section`](Self::end_section). Closing may reserve room after the
/// section so a later [`set_current_section`](Self::set_current_section)
/// can append to it without breaking contiguity.
pub struct MeshBuilder {
    vertices: Vec<f32>,
    indices: IndexBuffer,
    sections: Vec<MeshSection>,
    cur_index: usize,
    last_index: usize,
    cur_section: Option<usize>,
}

impl MeshBuilder {
    /// Create a builder sized for `vertex_count` vertices and `index_count` indices.
    pub fn new(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count * 3),
            indices: IndexBuffer::with_len(index_count, vertex_count),
            sections: Vec::new(),
            cur_index: 0,
            last_index: 0,
            cur_section: None,
        }
    }

    /// Open a new section after everything written or reserved so far.
    /// Returns the section's index.
    pub fn start_section(&mut self, primitive: PrimitiveType, color: u32) -> usize {
        self.cur_index = self.last_index;
        self.sections.push(MeshSection {
            color,
            primitive,
            index_offset: self.cur_index,
            index_count: 0,
            bounds: Aabb::EMPTY,
        });
        let id = self.sections.len() - 1;
        self.cur_section = Some(id);
        id
    }

    /// Reopen a section and continue writing at its end.
    pub fn set_current_section(&mut self, section: usize) {
        let s = &self.sections[section];
        self.cur_index = s.index_offset + s.index_count;
        self.cur_section = Some(section);
    }

    /// Append indices to the open section, each shifted by `base`.
    pub fn add_indices(&mut self, indices: impl IntoIterator<Item = u32>, base: u32) {
        for index in indices {
            self.indices.set(self.cur_index, index + base);
            self.cur_index += 1;
        }
    }

    /// Close the open section, leaving `reserve` free indices after it.
    pub fn end_section(&mut self, reserve: usize) {
        if let Some(id) = self.cur_section.take() {
            let section = &mut self.sections[id];
            section.index_count = self.cur_index - section.index_offset;
        }
        self.cur_index += reserve;
        self.last_index = self.last_index.max(self.cur_index);
    }

    pub fn add_vertex(&mut self, v: Vec3) {
        self.vertices.extend_from_slice(&[v.x, v.y, v.z]);
    }

    /// Number of vertices written so far
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn section_mut(&mut self, section: usize) -> &mut MeshSection {
        &mut self.sections[section]
    }

    pub fn finish(self) -> Mesh {
        Mesh::new(self.vertices, self.indices, self.sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_section_stays_contiguous() {
        let mut builder = MeshBuilder::new(4, 6);

        let a = builder.start_section(PrimitiveType::Triangles, 1);
        builder.add_indices([0, 1, 2], 0);
        builder.end_section(3);

        let b = builder.start_section(PrimitiveType::Lines, 2);
        assert_eq!(b, 1);
        builder.add_indices([0, 1], 0);
        builder.end_section(0);

        builder.set_current_section(a);
        builder.add_indices([0, 1, 2], 1);
        builder.end_section(0);

        let mesh = builder.finish();
        let sections = mesh.sections();
        assert_eq!(sections[0].index_offset, 0);
        assert_eq!(sections[0].index_count, 6);
        assert_eq!(sections[1].index_offset, 6);
        assert_eq!(sections[1].index_count, 2);

        let indices: Vec<u32> = mesh.indices().range(0, 8).collect();
        assert_eq!(indices, vec![0, 1, 2, 1, 2, 3, 0, 1]);
    }
}

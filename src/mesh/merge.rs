//! Flatten many placed meshes into one mesh partitioned by (color, primitive).

use std::collections::HashMap;

use crate::core::types::{Mat4, COLOR_CURRENT};

use super::{Mesh, MeshBuilder, PrimitiveType};

/// One placed mesh to merge.
#[derive(Clone, Copy, Debug)]
pub struct MergeSource<'a> {
    pub mesh: &'a Mesh,
    /// Placement of the mesh in the merged mesh's space
    pub transform: Mat4,
    /// Color substituted for sections drawn in the current color
    pub color: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct SectionKey {
    color: u32,
    primitive: PrimitiveType,
}

impl SectionKey {
    fn resolve(color: u32, primitive: PrimitiveType, placed_color: u32) -> Self {
        let color = if color == COLOR_CURRENT { placed_color } else { color };
        Self { color, primitive }
    }
}

/// Merge `sources` into one mesh.
///
/// Every (color, primitive) pair ends up as exactly one contiguous section,
/// ordered by first appearance. Indices are rebased onto the merged vertex
/// buffer and vertices are transformed by their source's placement.
pub fn merge_meshes(sources: &[MergeSource<'_>]) -> Mesh {
    // First pass: index count per section key and total vertex count.
    let mut remaining: HashMap<SectionKey, usize> = HashMap::new();
    let mut vertex_count = 0;

    for source in sources {
        vertex_count += source.mesh.vertex_count();
        for section in source.mesh.sections() {
            let key = SectionKey::resolve(section.color, section.primitive, source.color);
            *remaining.entry(key).or_default() += section.index_count;
        }
    }

    let index_count: usize = remaining.values().sum();
    let mut builder = MeshBuilder::new(vertex_count, index_count);
    let mut dst_sections: HashMap<SectionKey, usize> = HashMap::new();

    // Second pass: copy indices into their key's run, then append vertices.
    for source in sources {
        let base = builder.vertex_count() as u32;
        let indices = source.mesh.indices();

        for section in source.mesh.sections() {
            let key = SectionKey::resolve(section.color, section.primitive, source.color);
            let left = remaining.entry(key).or_default();
            *left -= section.index_count;
            let reserve = *left;

            let bounds = section.bounds.transformed(&source.transform);
            match dst_sections.get(&key) {
                Some(&dst) => {
                    builder.set_current_section(dst);
                    let merged = builder.section_mut(dst).bounds.merged(&bounds);
                    builder.section_mut(dst).bounds = merged;
                }
                None => {
                    let dst = builder.start_section(key.primitive, key.color);
                    builder.section_mut(dst).bounds = bounds;
                    dst_sections.insert(key, dst);
                }
            }

            builder.add_indices(indices.range(section.index_offset, section.index_count), base);
            builder.end_section(reserve);
        }

        for v in source.mesh.vertices() {
            builder.add_vertex(source.transform.transform_point3(v));
        }
    }

    let mesh = builder.finish();
    log::debug!(
        "Merged {} meshes: {} vertices, {} indices, {} sections",
        sources.len(),
        mesh.vertex_count(),
        mesh.indices().len(),
        mesh.sections().len()
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::math::Aabb;

    #[test]
    fn test_merge_empty() {
        let mesh = merge_meshes(&[]);
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.sections().is_empty());
        assert!(mesh.indices().is_empty());
    }

    #[test]
    fn test_merge_groups_sections_by_color_and_primitive() {
        let red = Mesh::box_mesh(Vec3::ZERO, Vec3::ONE, 4);
        let blue = Mesh::box_mesh(Vec3::ZERO, Vec3::ONE, 1);

        let sources = [
            MergeSource { mesh: &red, transform: Mat4::IDENTITY, color: 16 },
            MergeSource { mesh: &blue, transform: Mat4::IDENTITY, color: 16 },
            MergeSource {
                mesh: &red,
                transform: Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)),
                color: 16,
            },
        ];
        let mesh = merge_meshes(&sources);

        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices().len(), 3 * 60);
        assert_eq!(mesh.sections().len(), 4);

        let red_tris = &mesh.sections()[0];
        assert_eq!((red_tris.color, red_tris.primitive), (4, PrimitiveType::Triangles));
        assert_eq!(red_tris.index_offset, 0);
        assert_eq!(red_tris.index_count, 72);

        let red_lines = &mesh.sections()[1];
        assert_eq!((red_lines.color, red_lines.primitive), (4, PrimitiveType::Lines));
        assert_eq!(red_lines.index_offset, 72);
        assert_eq!(red_lines.index_count, 48);

        let blue_tris = &mesh.sections()[2];
        assert_eq!(blue_tris.index_offset, 120);
        assert_eq!(blue_tris.index_count, 36);

        // Sections never overlap and cover the whole buffer.
        let covered: usize = mesh.sections().iter().map(|s| s.index_count).sum();
        assert_eq!(covered, mesh.indices().len());

        // Second red copy is rebased past the blue vertices and moved.
        assert_eq!(mesh.indices().get(36), 16);
        assert_eq!(red_tris.bounds, Aabb::new(Vec3::ZERO, Vec3::new(11.0, 1.0, 1.0)));
        assert_eq!(mesh.vertex(16), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_current_color_resolves_to_placement_color() {
        let part = Mesh::box_mesh(Vec3::ZERO, Vec3::ONE, COLOR_CURRENT);
        let sources = [
            MergeSource { mesh: &part, transform: Mat4::IDENTITY, color: 14 },
            MergeSource { mesh: &part, transform: Mat4::IDENTITY, color: 2 },
        ];
        let mesh = merge_meshes(&sources);

        let colors: Vec<u32> = mesh.sections().iter().map(|s| s.color).collect();
        assert_eq!(colors, vec![14, 14, 2, 2]);
    }

    #[test]
    fn test_every_index_addresses_a_vertex() {
        let part = Mesh::box_mesh(Vec3::ZERO, Vec3::ONE, 7);
        let sources: Vec<MergeSource> = (0..5)
            .map(|i| MergeSource {
                mesh: &part,
                transform: Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0)),
                color: 16,
            })
            .collect();
        let mesh = merge_meshes(&sources);

        let count = mesh.vertex_count() as u32;
        assert!(mesh.indices().range(0, mesh.indices().len()).all(|i| i < count));
    }
}

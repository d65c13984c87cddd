//! Shared part definitions.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use crate::core::types::Vec3;
use crate::math::Aabb;
use crate::mesh::Mesh;

/// What a part definition stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartKind {
    /// A library brick with its own geometry
    Brick,
    /// A library primitive; placements of these are kept as foreign lines
    Primitive,
    /// A sub-assembly backed by another model document
    Model,
    /// Stand-in for a part the library does not know
    Placeholder,
}

/// A part definition shared by every piece that places it.
///
/// Model parts have their mesh, bounds and child list regenerated by the
/// owning document while other documents hold the `Arc`.
#[derive(Debug)]
pub struct PartInfo {
    name: String,
    description: String,
    kind: PartKind,
    mesh: RwLock<Option<Arc<Mesh>>>,
    bounds: RwLock<Aabb>,
    children: RwLock<Vec<Arc<PartInfo>>>,
}

impl PartInfo {
    /// Create an empty definition of the given kind.
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: PartKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            mesh: RwLock::new(None),
            bounds: RwLock::new(Aabb::EMPTY),
            children: RwLock::new(Vec::new()),
        }
    }

    /// A library brick with geometry.
    pub fn brick(name: impl Into<String>, description: impl Into<String>, mesh: Mesh) -> Self {
        let info = Self::new(name, description, PartKind::Brick);
        info.set_mesh(Some(Arc::new(mesh)));
        info
    }

    /// A library primitive.
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name, "", PartKind::Primitive)
    }

    /// A sub-assembly definition; contents are filled in by its document.
    pub fn model(name: impl Into<String>) -> Self {
        Self::new(name, "", PartKind::Model)
    }

    /// A box-shaped stand-in for an unknown part.
    pub fn placeholder(name: impl Into<String>) -> Self {
        let name = name.into();
        let info = Self::new(name.clone(), name, PartKind::Placeholder);
        info.set_mesh(Some(Arc::new(Mesh::box_mesh(
            Vec3::new(-10.0, -10.0, -24.0),
            Vec3::new(10.0, 10.0, 0.0),
            crate::core::types::COLOR_CURRENT,
        ))));
        info
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn is_model(&self) -> bool {
        self.kind == PartKind::Model
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == PartKind::Primitive
    }

    pub fn mesh(&self) -> Option<Arc<Mesh>> {
        self.mesh.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bounding box in part space
    pub fn bounds(&self) -> Aabb {
        *self.bounds.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Part definitions placed directly by this sub-assembly.
    pub fn children(&self) -> Vec<Arc<PartInfo>> {
        self.children.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the mesh; bounds follow the mesh.
    pub fn set_mesh(&self, mesh: Option<Arc<Mesh>>) {
        let bounds = mesh.as_ref().map(|m| m.bounds()).unwrap_or(Aabb::EMPTY);
        *self.mesh.write().unwrap_or_else(|e| e.into_inner()) = mesh;
        *self.bounds.write().unwrap_or_else(|e| e.into_inner()) = bounds;
    }

    /// Replace the list of directly placed parts.
    pub(crate) fn set_children(&self, children: Vec<Arc<PartInfo>>) {
        *self.children.write().unwrap_or_else(|e| e.into_inner()) = children;
    }

    /// True if this part places `other`, directly or through nested sub-assemblies.
    /// A part also "references" itself.
    pub fn references(&self, other: &PartInfo) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        let mut visited: HashSet<*const PartInfo> = HashSet::new();
        let mut stack = self.children();
        while let Some(part) = stack.pop() {
            if std::ptr::eq(Arc::as_ptr(&part), other) {
                return true;
            }
            if visited.insert(Arc::as_ptr(&part)) {
                stack.extend(part.children());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brick_bounds_follow_mesh() {
        let part = PartInfo::brick("3001.dat", "Brick 2 x 4", Mesh::box_mesh(Vec3::ZERO, Vec3::ONE, 16));
        assert_eq!(part.kind(), PartKind::Brick);
        assert_eq!(part.bounds(), Aabb::new(Vec3::ZERO, Vec3::ONE));
        assert!(part.mesh().is_some());
    }

    #[test]
    fn test_placeholder_has_geometry() {
        let part = PartInfo::placeholder("unknown.dat");
        assert_eq!(part.kind(), PartKind::Placeholder);
        assert!(!part.bounds().is_empty());
    }

    #[test]
    fn test_references_is_transitive() {
        let brick = Arc::new(PartInfo::placeholder("3001.dat"));
        let inner = Arc::new(PartInfo::model("inner"));
        let outer = Arc::new(PartInfo::model("outer"));

        inner.set_children(vec![brick.clone()]);
        outer.set_children(vec![inner.clone()]);

        assert!(outer.references(&inner));
        assert!(outer.references(&brick));
        assert!(outer.references(&outer));
        assert!(!inner.references(&outer));
        assert!(!brick.references(&inner));
    }
}

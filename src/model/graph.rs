//! Object graph: pieces, cameras, lights, document merging and the
//! aggregate mesh of a sub-model.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::Error;
use crate::core::types::{Mat4, Result};
use crate::mesh::{merge_meshes, MergeSource, Mesh};
use crate::part::PartInfo;

use super::object::{CameraId, GroupId, LightId, ObjectRef, PieceId, StepRange};
use super::{Camera, Light, Model, ModelEvent, Piece};

impl Model {
    /// Resolve a part name for placement in this document.
    ///
    /// Unknown names get a placeholder from the library. Returns `None` for
    /// names the library cannot resolve at all and for primitives, whose
    /// placements are kept verbatim. Parts that place this document,
    /// directly or not, are refused.
    pub(crate) fn resolve_part(&self, name: &str) -> Result<Option<Arc<PartInfo>>> {
        let Some(part) = self.library.find_part(name, true) else {
            return Ok(None);
        };
        if part.is_primitive() {
            return Ok(None);
        }
        if part.references(&self.part) {
            return Err(Error::CyclicReference(part.name().to_string()));
        }
        Ok(Some(part))
    }

    /// Place `part`, keeping pieces ordered by show step.
    pub fn add_piece(&mut self, part: Arc<PartInfo>, color: u32, transform: Mat4, steps: StepRange) -> Result<PieceId> {
        if part.references(&self.part) {
            return Err(Error::CyclicReference(part.name().to_string()));
        }

        let id = PieceId(self.alloc_id());
        self.insert_piece(Piece::new(id, part, color, transform, steps));
        self.update_part_children();
        Ok(id)
    }

    /// Place a part looked up by name. Unknown names are not found.
    pub fn add_piece_by_name(&mut self, name: &str, color: u32, transform: Mat4, steps: StepRange) -> Result<PieceId> {
        let part = self
            .library
            .find_part(name, false)
            .ok_or_else(|| Error::PartNotFound(name.to_string()))?;
        self.add_piece(part, color, transform, steps)
    }

    /// Insert after every piece shown no later than this one.
    pub(crate) fn insert_piece(&mut self, piece: Piece) {
        let index = self
            .pieces
            .iter()
            .position(|p| p.steps.show > piece.steps.show)
            .unwrap_or(self.pieces.len());
        self.pieces.insert(index, piece);
    }

    pub fn remove_piece(&mut self, id: PieceId) -> Result<Piece> {
        let index = self.piece_index(id).ok_or(Error::ObjectNotFound)?;
        let piece = self.pieces.remove(index);
        if self.focus.is_some_and(|f| f.object == ObjectRef::Piece(id)) {
            self.focus = None;
        }
        self.update_part_children();
        Ok(piece)
    }

    fn unique_camera_name(&self, base: &str) -> String {
        let base = base.trim();
        if !base.is_empty() && self.get_camera_by_name(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("Camera {n}"))
            .find(|candidate| self.get_camera_by_name(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Append a camera. Empty or taken names are replaced by a free one.
    pub fn add_camera(&mut self, mut camera: Camera) -> CameraId {
        camera.id = CameraId(self.alloc_id());
        camera.name = self.unique_camera_name(&camera.name);
        camera.update();
        let id = camera.id;
        self.cameras.push(camera);
        id
    }

    pub fn get_camera(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    pub fn get_camera_by_name(&self, name: &str) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.name == name)
    }

    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.id == id)
    }

    /// Mutable camera access. Call [`Model::save_checkpoint`] to commit.
    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.iter_mut().find(|c| c.id == id)
    }

    pub fn remove_camera(&mut self, id: CameraId) -> Result<Camera> {
        let index = self
            .cameras
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::ObjectNotFound)?;
        let camera = self.cameras.remove(index);
        if self.focus.is_some_and(|f| f.object == ObjectRef::Camera(id)) {
            self.focus = None;
        }
        self.notify(ModelEvent::CameraRemoved(camera.name.clone()));
        Ok(camera)
    }

    /// Replace every camera with the default views.
    pub fn reset_cameras(&mut self) {
        let removed: Vec<String> = self.cameras.drain(..).map(|c| c.name).collect();
        if matches!(self.focus, Some(f) if matches!(f.object, ObjectRef::Camera(_))) {
            self.focus = None;
        }
        for name in removed {
            self.notify(ModelEvent::CameraRemoved(name));
        }
        for camera in Camera::default_views() {
            self.add_camera(camera);
        }
    }

    pub fn add_light(&mut self, mut light: Light) -> LightId {
        light.id = LightId(self.alloc_id());
        light.update();
        let id = light.id;
        self.lights.push(light);
        id
    }

    /// Mutable light access. Call [`Model::save_checkpoint`] to commit.
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| l.id == id)
    }

    pub fn remove_light(&mut self, id: LightId) -> Result<Light> {
        let index = self
            .lights
            .iter()
            .position(|l| l.id == id)
            .ok_or(Error::ObjectNotFound)?;
        if self.focus.is_some_and(|f| f.object == ObjectRef::Light(id)) {
            self.focus = None;
        }
        Ok(self.lights.remove(index))
    }

    /// Move every object of `other` into this document and commit a
    /// checkpoint. Groups and user cameras are renamed on collision.
    /// Simple cameras of `other` are dropped with it.
    pub fn merge(&mut self, other: Model) -> Result<()> {
        self.splice(other, false)?;
        self.remove_empty_groups();
        self.calculate_step();
        self.save_checkpoint("Merging");
        Ok(())
    }

    /// Move the content of `other` in. With `select`, the new pieces are
    /// selected. Nothing changes if a piece would place this document.
    pub(crate) fn splice(&mut self, other: Model, select: bool) -> Result<Vec<PieceId>> {
        if let Some(piece) = other.pieces.iter().find(|p| p.part.references(&self.part)) {
            return Err(Error::CyclicReference(piece.part.name().to_string()));
        }

        let mut group_map: HashMap<GroupId, GroupId> = HashMap::new();
        let mut new_groups = Vec::with_capacity(other.groups.len());
        for mut group in other.groups {
            let id = GroupId(self.alloc_id());
            group_map.insert(group.id, id);
            group.id = id;
            group.name = self.unique_group_name(&group.name);
            self.groups.push(group);
            new_groups.push(id);
        }
        for id in new_groups {
            if let Some(group) = self.groups.iter_mut().find(|g| g.id == id) {
                group.parent = group.parent.and_then(|p| group_map.get(&p).copied());
            }
        }

        // Lines of `other` are placed after every line of this document.
        let line_base = self
            .foreign_lines
            .iter()
            .map(|l| l.line + 1)
            .chain(self.pieces.iter().filter_map(|p| p.source_line.map(|l| l + 1)))
            .max()
            .unwrap_or(0);

        let mut added = Vec::with_capacity(other.pieces.len());
        for mut piece in other.pieces {
            piece.id = PieceId(self.alloc_id());
            piece.source_line = piece.source_line.map(|l| l + line_base);
            piece.group = piece.group.and_then(|g| group_map.get(&g).copied());
            piece.selected = select;
            added.push(piece.id);
            self.insert_piece(piece);
        }

        let camera_count = self.cameras.len();
        for mut camera in other.cameras.into_iter().filter(|c| !c.is_simple()) {
            camera.selected.clear();
            self.add_camera(camera);
        }

        let light_count = other.lights.len();
        for mut light in other.lights {
            light.selected.clear();
            self.add_light(light);
        }

        for mut line in other.foreign_lines {
            line.line += line_base;
            self.foreign_lines.push(line);
        }

        self.update_part_children();
        log::info!(
            "Merged {} pieces, {} cameras, {} lights into '{}'",
            added.len(),
            self.cameras.len() - camera_count,
            light_count,
            self.name()
        );
        Ok(added)
    }

    /// True if `part` is placed by this document, directly or through
    /// nested sub-models.
    pub fn is_sub_model(&self, part: &PartInfo) -> bool {
        self.pieces
            .iter()
            .any(|p| p.part.is_model() && p.part.references(part))
    }

    /// Mark this document as the edited one or as a referenced sub-model.
    /// Deactivating regenerates the aggregate mesh.
    pub fn set_active(&mut self, active: bool) {
        if self.active && !active {
            self.update_mesh();
        }
        self.active = active;
    }

    /// Merge the meshes of every piece still visible once the model is
    /// built into this document's part.
    pub fn update_mesh(&mut self) {
        let placed: Vec<(Arc<Mesh>, Mat4, u32)> = self
            .pieces
            .iter()
            .filter(|p| p.steps.is_visible_at_end())
            .filter_map(|p| p.part.mesh().map(|mesh| (mesh, p.transform, p.color)))
            .collect();

        let sources: Vec<MergeSource<'_>> = placed
            .iter()
            .map(|(mesh, transform, color)| MergeSource {
                mesh: mesh.as_ref(),
                transform: *transform,
                color: *color,
            })
            .collect();

        let mesh = merge_meshes(&sources);
        log::debug!(
            "Rebuilt mesh of '{}': {} vertices, {} sections",
            self.name(),
            mesh.vertex_count(),
            mesh.sections().len()
        );
        self.part.set_mesh(Some(Arc::new(mesh)));
        self.update_part_children();
    }
}

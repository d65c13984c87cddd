//! Edits applied to the selection. Each one commits a checkpoint.

use crate::core::error::Error;
use crate::core::types::{Mat4, Quat, Result, Vec3, STEP_MAX};
use crate::format::text;

use super::object::{GroupId, ObjectRef, PieceId, StepRange};
use super::{Model, ModelEvent};

impl Model {
    /// Translate selected pieces and the selected parts of cameras and
    /// lights. Returns `false` if nothing was selected.
    pub fn move_selected(&mut self, offset: Vec3) -> bool {
        if !self.any_objects_selected() || offset == Vec3::ZERO {
            return false;
        }

        let translation = Mat4::from_translation(offset);
        for piece in self.pieces.iter_mut().filter(|p| p.selected) {
            piece.set_transform(translation * piece.transform);
        }
        for camera in &mut self.cameras {
            if camera.selected.position {
                camera.position += offset;
            }
            if camera.selected.target {
                camera.target += offset;
            }
            camera.update();
        }
        for light in &mut self.lights {
            if light.selected.position {
                light.position += offset;
            }
            if light.selected.target {
                light.target += offset;
            }
            light.update();
        }

        self.save_checkpoint("Moving");
        true
    }

    /// Rotate selected pieces about the center of the selection.
    pub fn rotate_selected(&mut self, rotation: Quat) -> bool {
        let Some(center) = self.selection_center() else {
            return false;
        };
        if !self.pieces.iter().any(|p| p.selected) {
            return false;
        }

        let pivot = Mat4::from_translation(center)
            * Mat4::from_quat(rotation)
            * Mat4::from_translation(-center);
        for piece in self.pieces.iter_mut().filter(|p| p.selected) {
            piece.set_transform(pivot * piece.transform);
        }

        self.save_checkpoint("Rotating");
        true
    }

    pub fn set_selected_color(&mut self, color: u32) -> bool {
        let mut changed = false;
        for piece in self.pieces.iter_mut().filter(|p| p.selected && p.color != color) {
            piece.color = color;
            changed = true;
        }

        if changed {
            self.save_checkpoint("Painting");
        }
        changed
    }

    /// Put the selected pieces, or the top groups they belong to, into a
    /// new group. Needs at least two members to group.
    pub fn group_selection(&mut self, name: &str) -> Result<GroupId> {
        let selected: Vec<PieceId> = self.selected_pieces().collect();
        let mut tops: Vec<GroupId> = selected.iter().filter_map(|&id| self.top_group(id)).collect();
        tops.sort();
        tops.dedup();
        let loose: Vec<PieceId> = selected
            .iter()
            .copied()
            .filter(|&id| self.top_group(id).is_none())
            .collect();
        if tops.len() + loose.len() < 2 {
            return Err(Error::ObjectNotFound);
        }

        let center = self.selection_center().unwrap_or(Vec3::ZERO);
        let group = self.add_group(name, None);
        for g in self.groups.iter_mut() {
            if g.id == group {
                g.center = center;
            } else if tops.contains(&g.id) {
                g.parent = Some(group);
            }
        }
        for id in loose {
            if let Some(index) = self.piece_index(id) {
                self.pieces[index].group = Some(group);
            }
        }

        self.remove_empty_groups();
        self.save_checkpoint("Grouping");
        Ok(group)
    }

    /// Dissolve the top groups of the selected pieces.
    pub fn ungroup_selection(&mut self) -> bool {
        let mut tops: Vec<GroupId> = self
            .selected_pieces()
            .filter_map(|id| self.top_group(id))
            .collect();
        tops.sort();
        tops.dedup();
        if tops.is_empty() {
            return false;
        }

        for top in tops {
            if let Err(err) = self.remove_group(top) {
                log::warn!("Ungroup skipped group {:?}: {}", top, err);
            }
        }
        self.remove_empty_groups();
        self.save_checkpoint("Ungrouping");
        true
    }

    fn hide_pieces(&mut self, hide_selected: bool) -> bool {
        let mut changed = false;
        for piece in &mut self.pieces {
            if piece.selected == hide_selected && !piece.steps.is_hidden() {
                piece.steps.show = STEP_MAX;
                piece.selected = false;
                changed = true;
            }
        }

        if changed {
            if self.focus.is_some_and(|f| matches!(f.object, ObjectRef::Piece(_))) {
                self.focus = None;
            }
            self.sort_pieces();
            self.save_checkpoint("Hide");
            self.notify(ModelEvent::SelectionChanged);
        }
        changed
    }

    /// Hide the selected pieces for the whole timeline.
    pub fn hide_selected(&mut self) -> bool {
        self.hide_pieces(true)
    }

    pub fn hide_unselected(&mut self) -> bool {
        self.hide_pieces(false)
    }

    /// Show hidden pieces again, starting at the current step.
    pub fn unhide_all(&mut self) -> bool {
        let step = self.current_step;
        let mut changed = false;
        for piece in self.pieces.iter_mut().filter(|p| p.steps.is_hidden()) {
            let hide = if piece.steps.hide > step { piece.steps.hide } else { STEP_MAX };
            piece.steps = StepRange::with_hide(step, hide);
            changed = true;
        }

        if changed {
            self.sort_pieces();
            self.save_checkpoint("Unhide");
        }
        changed
    }

    /// Delete selected pieces, user cameras and lights.
    pub fn delete_selected(&mut self) -> bool {
        let pieces_before = self.pieces.len();
        self.pieces.retain(|p| !p.selected);
        let mut deleted = self.pieces.len() != pieces_before;

        let removed_cameras: Vec<String> = self
            .cameras
            .iter()
            .filter(|c| !c.is_simple() && c.selected.any())
            .map(|c| c.name.clone())
            .collect();
        self.cameras.retain(|c| c.is_simple() || !c.selected.any());

        let lights_before = self.lights.len();
        self.lights.retain(|l| !l.selected.any());
        deleted |= !removed_cameras.is_empty() || self.lights.len() != lights_before;

        if !deleted {
            return false;
        }

        if let Some(focus) = self.focus {
            let exists = match focus.object {
                ObjectRef::Piece(id) => self.piece(id).is_some(),
                ObjectRef::Camera(id) => self.camera(id).is_some(),
                ObjectRef::Light(id) => self.light(id).is_some(),
            };
            if !exists {
                self.focus = None;
            }
        }

        for name in removed_cameras {
            self.notify(ModelEvent::CameraRemoved(name));
        }
        self.remove_empty_groups();
        self.update_part_children();
        self.save_checkpoint("Deleting");
        self.notify(ModelEvent::SelectionChanged);
        true
    }

    /// Selected pieces, with their groups, in the text format.
    pub fn copy_selected(&self) -> Vec<u8> {
        text::write_selected(self).into_bytes()
    }

    /// Add the pieces of a copied buffer at the current step and select
    /// them. Returns the number of pieces added.
    pub fn paste(&mut self, data: &[u8]) -> Result<usize> {
        let mut scratch = self.blank();
        text::read(&mut scratch, &String::from_utf8_lossy(data))?;

        let step = self.current_step;
        for piece in &mut scratch.pieces {
            piece.steps = StepRange::new(step);
            piece.source_line = None;
        }
        scratch.foreign_lines.clear();

        self.deselect_all_pieces();
        let added = self.splice(scratch, true)?;
        self.calculate_step();
        self.save_checkpoint("Pasting");
        self.notify(ModelEvent::SelectionChanged);
        Ok(added.len())
    }

    fn deselect_all_pieces(&mut self) {
        for piece in &mut self.pieces {
            piece.selected = false;
        }
        if self.focus.is_some_and(|f| matches!(f.object, ObjectRef::Piece(_))) {
            self.focus = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::model::tests::{add_brick, test_model};
    use crate::model::{Camera, FocusSection};

    fn select(model: &mut Model, pieces: &[PieceId]) {
        let objects: Vec<ObjectRef> = pieces.iter().map(|&id| ObjectRef::Piece(id)).collect();
        model.add_to_selection(&objects);
    }

    #[test]
    fn test_move_selected() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let b = add_brick(&mut model, 100.0, 1);
        assert!(!model.move_selected(Vec3::X));

        select(&mut model, &[a]);
        assert!(model.move_selected(Vec3::new(0.0, 0.0, 24.0)));
        assert_eq!(model.piece(a).unwrap().position(), Vec3::new(0.0, 0.0, 24.0));
        assert_eq!(model.piece(b).unwrap().position(), Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(model.undo_description(), Some("Moving"));
    }

    #[test]
    fn test_move_camera_target_only() {
        let mut model = test_model();
        let camera = model.add_camera(Camera::new("Camera 1", Vec3::new(0.0, -100.0, 0.0), Vec3::ZERO, Vec3::Z));
        model.clear_selection_and_set_focus(Some(ObjectRef::Camera(camera)), FocusSection::Target);

        model.move_selected(Vec3::new(10.0, 0.0, 0.0));
        let camera = model.camera(camera).unwrap();
        assert_eq!(camera.position, Vec3::new(0.0, -100.0, 0.0));
        assert_eq!(camera.target, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotate_about_selection_center() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        select(&mut model, &[a]);

        let before = model.piece(a).unwrap().world_bounds().center();
        assert!(model.rotate_selected(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)));
        let after = model.piece(a).unwrap().world_bounds();

        assert!((after.center() - before).length() < 1e-3);
        // The 80 x 40 footprint turns into 40 x 80.
        assert!((after.size().x - 40.0).abs() < 1e-3);
        assert!((after.size().y - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_set_selected_color() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        select(&mut model, &[a]);

        assert!(model.set_selected_color(1));
        assert_eq!(model.piece(a).unwrap().color(), 1);
        assert!(!model.set_selected_color(1));
    }

    #[test]
    fn test_group_and_ungroup() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let b = add_brick(&mut model, 100.0, 1);
        select(&mut model, &[a, b]);

        let group = model.group_selection("Pair").unwrap();
        assert_eq!(model.group(group).unwrap().name(), "Pair");
        assert_eq!(model.top_group(a), Some(group));
        assert_eq!(model.group(group).unwrap().center, Vec3::new(50.0, 0.0, -12.0));

        // Grouping a grouped selection nests the existing top group.
        let c = add_brick(&mut model, 200.0, 1);
        select(&mut model, &[c]);
        let outer = model.group_selection("").unwrap();
        assert_eq!(model.group(group).unwrap().parent(), Some(outer));
        assert_eq!(model.top_group(a), Some(outer));

        assert!(model.ungroup_selection());
        assert_eq!(model.top_group(a), Some(group));
        assert_eq!(model.piece(c).unwrap().group(), None);
    }

    #[test]
    fn test_group_needs_two_members() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        assert!(matches!(model.group_selection("G"), Err(Error::ObjectNotFound)));

        select(&mut model, &[a]);
        assert!(matches!(model.group_selection("G"), Err(Error::ObjectNotFound)));
        assert!(model.groups().is_empty());
    }

    #[test]
    fn test_hide_and_unhide() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let b = add_brick(&mut model, 100.0, 1);
        select(&mut model, &[a]);

        assert!(model.hide_selected());
        assert!(model.piece(a).unwrap().steps().is_hidden());
        assert!(!model.piece(a).unwrap().is_selected());
        assert_eq!(model.pieces().last().unwrap().id(), a);
        assert_eq!(model.last_step(), 1);

        assert!(model.hide_unselected());
        assert!(model.piece(b).unwrap().steps().is_hidden());

        model.set_current_step(3);
        assert!(model.unhide_all());
        assert_eq!(model.piece(a).unwrap().steps(), StepRange::new(3));
        assert_eq!(model.piece(b).unwrap().steps(), StepRange::new(3));
    }

    #[test]
    fn test_hidden_piece_keeps_hide_step_across_step_edits() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let index = model.piece_index(a).unwrap();
        model.pieces[index].steps = StepRange::with_hide(1, 5);
        select(&mut model, &[a]);

        assert!(model.hide_selected());
        model.insert_step(1);
        assert_eq!(model.piece(a).unwrap().steps(), StepRange { show: STEP_MAX, hide: 6 });
        model.remove_step(1);
        assert_eq!(model.piece(a).unwrap().steps(), StepRange { show: STEP_MAX, hide: 5 });

        model.set_current_step(1);
        assert!(model.unhide_all());
        assert_eq!(model.piece(a).unwrap().steps(), StepRange::with_hide(1, 5));
    }

    #[test]
    fn test_paste_ignores_source_lines() {
        let mut source = test_model().blank();
        crate::format::text::read(
            &mut source,
            "0 // header\n1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n",
        )
        .unwrap();
        assert_eq!(source.pieces()[0].source_line(), Some(1));

        let mut model = test_model();
        add_brick(&mut model, 0.0, 1);
        let copied = source.to_text();
        assert_eq!(model.paste(copied.as_bytes()).unwrap(), 1);
        assert!(model.foreign_lines().is_empty());
        assert!(model.pieces().iter().all(|p| p.source_line().is_none()));
    }

    #[test]
    fn test_delete_selected() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let b = add_brick(&mut model, 100.0, 1);
        let camera = model.add_camera(Camera::new("Camera 1", Vec3::new(0.0, -100.0, 0.0), Vec3::ZERO, Vec3::Z));
        let front = model.cameras()[0].id();
        select(&mut model, &[a]);
        model.add_to_selection(&[ObjectRef::Camera(camera), ObjectRef::Camera(front)]);

        assert!(model.delete_selected());
        assert!(model.piece(a).is_none());
        assert!(model.piece(b).is_some());
        assert!(model.camera(camera).is_none());
        // Default views are never deleted.
        assert!(model.camera(front).is_some());
        assert!(!model.delete_selected());
    }

    #[test]
    fn test_copy_paste() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let b = add_brick(&mut model, 100.0, 1);
        add_brick(&mut model, 200.0, 1);
        select(&mut model, &[a, b]);
        model.group_selection("Pair").unwrap();

        let data = model.copy_selected();
        model.set_current_step(2);
        assert_eq!(model.paste(&data).unwrap(), 2);

        assert_eq!(model.pieces().len(), 5);
        let pasted: Vec<&crate::model::Piece> = model.pieces().iter().filter(|p| p.is_selected()).collect();
        assert_eq!(pasted.len(), 2);
        assert!(pasted.iter().all(|p| p.steps() == StepRange::new(2)));
        assert!(model.group_by_name("Pair #1").is_some());
        assert_eq!(model.undo_description(), Some("Pasting"));
    }
}

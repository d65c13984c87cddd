//! Selection and focus.
//!
//! Selecting a grouped piece always selects every visible piece of its top
//! group. Deselecting does not propagate.

use crate::core::types::Vec3;
use crate::math::Aabb;

use super::object::{Focus, FocusSection, GroupId, ObjectRef, PieceId, SectionSelection};
use super::{Model, ModelEvent};

impl Model {
    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    pub fn is_object_selected(&self, object: ObjectRef) -> bool {
        match object {
            ObjectRef::Piece(id) => self.piece(id).is_some_and(|p| p.selected),
            ObjectRef::Camera(id) => self.cameras.iter().any(|c| c.id == id && c.selected.any()),
            ObjectRef::Light(id) => self.lights.iter().any(|l| l.id == id && l.selected.any()),
        }
    }

    pub fn any_objects_selected(&self) -> bool {
        self.pieces.iter().any(|p| p.selected)
            || self.cameras.iter().any(|c| c.selected.any())
            || self.lights.iter().any(|l| l.selected.any())
    }

    /// True if a piece visible at the current step is selected.
    pub fn any_pieces_selected(&self) -> bool {
        self.pieces
            .iter()
            .any(|p| p.selected && p.steps.is_visible(self.current_step))
    }

    pub fn selected_pieces(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.pieces.iter().filter(|p| p.selected).map(|p| p.id)
    }

    /// Set the selection of every visible piece whose top group is `top`.
    pub fn select_group(&mut self, top: GroupId, select: bool) {
        let step = self.current_step;
        let members: Vec<usize> = (0..self.pieces.len())
            .filter(|&i| {
                let piece = &self.pieces[i];
                piece.steps.is_visible(step)
                    && piece.group.is_some_and(|g| self.top_group_of(g) == top)
            })
            .collect();

        for index in members {
            self.pieces[index].selected = select;
        }
    }

    fn deselect_all(&mut self) {
        for piece in &mut self.pieces {
            piece.selected = false;
        }
        for camera in &mut self.cameras {
            camera.selected.clear();
        }
        for light in &mut self.lights {
            light.selected.clear();
        }
        self.focus = None;
    }

    pub fn clear_selection(&mut self) {
        self.deselect_all();
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Select one object, propagating to the group of a piece. Returns
    /// `false` if the object does not exist.
    fn select_object(&mut self, object: ObjectRef, section: FocusSection) -> bool {
        match object {
            ObjectRef::Piece(id) => {
                let Some(index) = self.piece_index(id) else {
                    return false;
                };
                let newly_selected = !self.pieces[index].selected;
                self.pieces[index].selected = true;
                if newly_selected {
                    if let Some(top) = self.top_group(id) {
                        self.select_group(top, true);
                    }
                }
                true
            }
            ObjectRef::Camera(id) => match self.cameras.iter_mut().find(|c| c.id == id) {
                Some(camera) => {
                    camera.selected.set(section, true);
                    true
                }
                None => false,
            },
            ObjectRef::Light(id) => match self.lights.iter_mut().find(|l| l.id == id) {
                Some(light) => {
                    light.selected.set(section, true);
                    true
                }
                None => false,
            },
        }
    }

    /// Deselect everything, then focus and select `object`. `None` only
    /// clears the selection.
    pub fn clear_selection_and_set_focus(&mut self, object: Option<ObjectRef>, section: FocusSection) {
        self.deselect_all();
        if let Some(object) = object {
            if self.select_object(object, section) {
                self.focus = Some(Focus { object, section });
            }
        }
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Add objects to the selection. Cameras and lights are selected whole.
    pub fn add_to_selection(&mut self, objects: &[ObjectRef]) {
        for &object in objects {
            match object {
                ObjectRef::Piece(_) => {
                    self.select_object(object, FocusSection::Position);
                }
                ObjectRef::Camera(id) => {
                    if let Some(camera) = self.cameras.iter_mut().find(|c| c.id == id) {
                        camera.selected = SectionSelection::ALL;
                    }
                }
                ObjectRef::Light(id) => {
                    if let Some(light) = self.lights.iter_mut().find(|l| l.id == id) {
                        light.selected = SectionSelection::ALL;
                    }
                }
            }
        }
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Deselect objects. Other members of their groups stay selected.
    pub fn remove_from_selection(&mut self, objects: &[ObjectRef]) {
        for &object in objects {
            match object {
                ObjectRef::Piece(id) => {
                    if let Some(index) = self.piece_index(id) {
                        self.pieces[index].selected = false;
                    }
                }
                ObjectRef::Camera(id) => {
                    if let Some(camera) = self.cameras.iter_mut().find(|c| c.id == id) {
                        camera.selected.clear();
                    }
                }
                ObjectRef::Light(id) => {
                    if let Some(light) = self.lights.iter_mut().find(|l| l.id == id) {
                        light.selected.clear();
                    }
                }
            }
            if self.focus.is_some_and(|f| f.object == object) {
                self.focus = None;
            }
        }
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Select or deselect every piece visible at the current step.
    pub fn select_all_pieces(&mut self, select: bool) {
        let step = self.current_step;
        for piece in &mut self.pieces {
            if piece.steps.is_visible(step) {
                piece.selected = select;
            }
        }
        if !select {
            self.focus = None;
        }
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Flip the selection of every visible piece.
    pub fn invert_selection(&mut self) {
        let step = self.current_step;
        for piece in &mut self.pieces {
            if piece.steps.is_visible(step) {
                piece.selected = !piece.selected;
            }
        }
        if let Some(focus) = self.focus {
            if !self.is_object_selected(focus.object) {
                self.focus = None;
            }
        }
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Box around selected pieces and selected camera and light points.
    pub fn selection_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for piece in self.pieces.iter().filter(|p| p.selected) {
            bounds = bounds.merged(&piece.world_bounds());
        }
        for camera in &self.cameras {
            if camera.selected.position {
                bounds.expand(camera.position);
            }
            if camera.selected.target {
                bounds.expand(camera.target);
            }
        }
        for light in &self.lights {
            if light.selected.position {
                bounds.expand(light.position);
            }
            if light.selected.target {
                bounds.expand(light.target);
            }
        }
        bounds
    }

    /// Center of the selection box, `None` when nothing is selected.
    pub fn selection_center(&self) -> Option<Vec3> {
        let bounds = self.selection_bounds();
        (!bounds.is_empty()).then(|| bounds.center())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{add_brick, test_model};
    use crate::model::Camera;

    fn grouped_model() -> (Model, Vec<PieceId>) {
        // H contains G and a loose piece; G holds two pieces.
        let mut model = test_model();
        let h = model.add_group("H", None);
        let g = model.add_group("G", Some(h));
        let pieces: Vec<PieceId> = (0..4).map(|i| add_brick(&mut model, i as f32 * 100.0, 1)).collect();
        for (piece, group) in [(pieces[0], g), (pieces[1], g), (pieces[2], h)] {
            let index = model.piece_index(piece).unwrap();
            model.pieces[index].group = Some(group);
        }
        (model, pieces)
    }

    #[test]
    fn test_focus_selects_top_group() {
        let (mut model, pieces) = grouped_model();
        model.clear_selection_and_set_focus(Some(ObjectRef::Piece(pieces[0])), FocusSection::Position);

        assert!(model.piece(pieces[0]).unwrap().is_selected());
        assert!(model.piece(pieces[1]).unwrap().is_selected());
        assert!(model.piece(pieces[2]).unwrap().is_selected());
        assert!(!model.piece(pieces[3]).unwrap().is_selected());
        assert_eq!(model.focus().unwrap().object, ObjectRef::Piece(pieces[0]));
    }

    #[test]
    fn test_deselect_does_not_propagate() {
        let (mut model, pieces) = grouped_model();
        model.add_to_selection(&[ObjectRef::Piece(pieces[1])]);
        model.remove_from_selection(&[ObjectRef::Piece(pieces[1])]);

        assert!(!model.piece(pieces[1]).unwrap().is_selected());
        assert!(model.piece(pieces[0]).unwrap().is_selected());
        assert!(model.piece(pieces[2]).unwrap().is_selected());
    }

    #[test]
    fn test_select_group_skips_invisible() {
        let (mut model, pieces) = grouped_model();
        let index = model.piece_index(pieces[2]).unwrap();
        model.pieces[index].steps = crate::model::StepRange::new(5);

        let top = model.top_group(pieces[0]).unwrap();
        model.select_group(top, true);
        assert!(model.piece(pieces[0]).unwrap().is_selected());
        assert!(!model.piece(pieces[2]).unwrap().is_selected());
    }

    #[test]
    fn test_any_selected_queries() {
        let mut model = test_model();
        assert!(!model.any_objects_selected());

        let camera = model.add_camera(Camera::new("Camera 1", Vec3::new(0.0, -100.0, 0.0), Vec3::ZERO, Vec3::Z));
        model.clear_selection_and_set_focus(Some(ObjectRef::Camera(camera)), FocusSection::Target);
        assert!(model.any_objects_selected());
        assert!(!model.any_pieces_selected());
        assert_eq!(model.focus().unwrap().section, FocusSection::Target);
    }

    #[test]
    fn test_selection_bounds_and_center() {
        let mut model = test_model();
        assert!(model.selection_center().is_none());

        let piece = add_brick(&mut model, 100.0, 1);
        model.add_to_selection(&[ObjectRef::Piece(piece)]);
        let bounds = model.selection_bounds();
        assert_eq!(bounds.min, Vec3::new(60.0, -20.0, -24.0));
        assert_eq!(bounds.max, Vec3::new(140.0, 20.0, 0.0));
        assert_eq!(model.selection_center(), Some(Vec3::new(100.0, 0.0, -12.0)));
    }

    #[test]
    fn test_missing_object_gets_no_focus() {
        let mut model = test_model();
        model.clear_selection_and_set_focus(Some(ObjectRef::Piece(PieceId(999))), FocusSection::Position);
        assert!(model.focus().is_none());
    }
}

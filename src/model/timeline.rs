//! Build-step cursor and step shifting.

use std::collections::HashSet;

use crate::core::types::{Step, STEP_MAX};

use super::{GroupId, Model, ModelEvent};

impl Model {
    pub fn current_step(&self) -> Step {
        self.current_step
    }

    /// Highest show step of any piece, ignoring hidden pieces. 1 when empty.
    pub fn last_step(&self) -> Step {
        self.pieces
            .iter()
            .map(|p| p.steps.show)
            .filter(|&show| show != STEP_MAX)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    /// Move the step cursor and update visibility.
    pub fn set_current_step(&mut self, step: Step) {
        self.current_step = step.clamp(1, STEP_MAX - 1);
        self.calculate_step();
        self.notify(ModelEvent::StepChanged(self.current_step));
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Go to step 1. Returns `false` if already there.
    pub fn first_step(&mut self) -> bool {
        if self.current_step == 1 {
            return false;
        }
        self.set_current_step(1);
        true
    }

    pub fn previous_step(&mut self) -> bool {
        if self.current_step <= 1 {
            return false;
        }
        self.set_current_step(self.current_step - 1);
        true
    }

    pub fn next_step(&mut self) -> bool {
        if self.current_step >= STEP_MAX - 1 {
            return false;
        }
        self.set_current_step(self.current_step + 1);
        true
    }

    /// Go to the last step. Returns `false` if already there.
    pub fn last_step_nav(&mut self) -> bool {
        let last = self.last_step();
        if self.current_step == last {
            return false;
        }
        self.set_current_step(last);
        true
    }

    /// Update derived state for the current step.
    ///
    /// Selected pieces that are no longer visible are deselected, and the
    /// top groups of the remaining selected pieces are selected whole.
    pub(crate) fn calculate_step(&mut self) {
        let step = self.current_step;
        let mut selected_groups: HashSet<GroupId> = HashSet::new();

        for index in 0..self.pieces.len() {
            self.pieces[index].update_bounds();
            if !self.pieces[index].selected {
                continue;
            }
            if !self.pieces[index].steps.is_visible(step) {
                self.pieces[index].selected = false;
            } else if let Some(group) = self.pieces[index].group {
                selected_groups.insert(self.top_group_of(group));
            }
        }

        for group in selected_groups {
            self.select_group(group, true);
        }

        if let Some(focus) = self.focus {
            if !self.is_object_selected(focus.object) {
                self.focus = None;
            }
        }

        for camera in &mut self.cameras {
            camera.update();
        }
        for light in &mut self.lights {
            light.update();
        }
    }

    /// Open an empty step before `step`, shifting everything shown or hidden
    /// at or after it. Commits a checkpoint.
    pub fn insert_step(&mut self, step: Step) {
        let step = step.max(1);
        for piece in &mut self.pieces {
            piece.steps.insert_step(step);
        }
        for camera in &mut self.cameras {
            camera.steps.insert_step(step);
        }
        for light in &mut self.lights {
            light.steps.insert_step(step);
        }
        for line in &mut self.foreign_lines {
            if line.step >= step {
                line.step = line.step.saturating_add(1).min(STEP_MAX - 1);
            }
        }

        self.sort_pieces();
        self.calculate_step();
        self.save_checkpoint("Inserting Step");
        self.notify(ModelEvent::SelectionChanged);
    }

    /// Remove `step`, pulling everything after it one step earlier.
    /// Commits a checkpoint.
    pub fn remove_step(&mut self, step: Step) {
        let step = step.max(1);
        for piece in &mut self.pieces {
            piece.steps.remove_step(step);
        }
        for camera in &mut self.cameras {
            camera.steps.remove_step(step);
        }
        for light in &mut self.lights {
            light.steps.remove_step(step);
        }
        for line in &mut self.foreign_lines {
            if line.step >= step {
                line.step = line.step.saturating_sub(1).max(1);
            }
        }

        self.sort_pieces();
        self.calculate_step();
        self.save_checkpoint("Removing Step");
        self.notify(ModelEvent::SelectionChanged);
    }
}

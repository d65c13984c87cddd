//! Handles, step ranges and selection flags shared by every document object.

use crate::core::types::{Step, STEP_MAX};

/// Handle of a piece within its document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u64);

/// Handle of a camera within its document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(pub u64);

/// Handle of a light within its document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub u64);

/// Handle of a group within its document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

/// Any selectable object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    Piece(PieceId),
    Camera(CameraId),
    Light(LightId),
}

/// The part of an object that receives focus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusSection {
    #[default]
    Position,
    Target,
    UpVector,
}

/// The single focused object of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Focus {
    pub object: ObjectRef,
    pub section: FocusSection,
}

/// Per-section selection of cameras and lights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SectionSelection {
    pub position: bool,
    pub target: bool,
    pub up_vector: bool,
}

impl SectionSelection {
    /// Every section selected
    pub const ALL: SectionSelection = SectionSelection {
        position: true,
        target: true,
        up_vector: true,
    };

    pub fn any(&self) -> bool {
        self.position || self.target || self.up_vector
    }

    pub fn set(&mut self, section: FocusSection, selected: bool) {
        match section {
            FocusSection::Position => self.position = selected,
            FocusSection::Target => self.target = selected,
            FocusSection::UpVector => self.up_vector = selected,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Visibility interval `[show, hide)` on the step timeline.
///
/// A hidden range (`show == STEP_MAX`) keeps its hide step so unhiding can
/// restore it; that hide step moves with inserted and removed steps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepRange {
    pub show: Step,
    pub hide: Step,
}

impl Default for StepRange {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Shift one step forward, never producing the sentinel.
fn step_up(step: Step) -> Step {
    step.saturating_add(1).min(STEP_MAX - 1)
}

impl StepRange {
    /// Shown from `show` on, never hidden.
    pub fn new(show: Step) -> Self {
        Self {
            show: show.clamp(1, STEP_MAX),
            hide: STEP_MAX,
        }
    }

    /// Shown from `show` until (excluding) `hide`. `hide` is raised to `show`.
    pub fn with_hide(show: Step, hide: Step) -> Self {
        let show = show.clamp(1, STEP_MAX);
        Self { show, hide: hide.max(show) }
    }

    pub fn is_visible(&self, step: Step) -> bool {
        self.show != STEP_MAX && step >= self.show && (self.hide == STEP_MAX || step < self.hide)
    }

    /// Hidden for the whole timeline.
    pub fn is_hidden(&self) -> bool {
        self.show == STEP_MAX
    }

    /// Visible once the whole model is built.
    pub fn is_visible_at_end(&self) -> bool {
        self.show != STEP_MAX && self.hide == STEP_MAX
    }

    /// Make room for a new step before `step`.
    pub fn insert_step(&mut self, step: Step) {
        if self.show != STEP_MAX && self.show >= step {
            self.show = step_up(self.show);
        }
        if self.hide != STEP_MAX && self.hide >= step {
            self.hide = step_up(self.hide);
        }
    }

    /// Close the gap left by removing `step`.
    pub fn remove_step(&mut self, step: Step) {
        if self.show != STEP_MAX && self.show >= step {
            self.show = self.show.saturating_sub(1).max(1);
        }
        if self.hide != STEP_MAX && self.hide >= step {
            let floor = if self.is_hidden() { 1 } else { self.show };
            self.hide = self.hide.saturating_sub(1).max(floor);
        }
    }
}

/// A line this engine does not model, kept for round-trip fidelity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignLine {
    /// Step the line appeared in
    pub step: Step,
    /// Position of the line in the file it was read from
    pub line: usize,
    pub text: String,
}

//! Document cameras

use crate::core::types::{Mat4, Vec3};

use super::object::{CameraId, SectionSelection, StepRange};

/// Whether a camera belongs to the document or only to a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraKind {
    /// View preset; never saved nor checkpointed
    Simple,
    /// Named camera saved with the document
    User,
}

/// Camera with eye, target and up vector
#[derive(Clone, Debug)]
pub struct Camera {
    pub(crate) id: CameraId,
    pub name: String,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub(crate) kind: CameraKind,
    pub(crate) steps: StepRange,
    pub(crate) selected: SectionSelection,
    view: Mat4,
}

/// Names and eye directions of the view presets.
const DEFAULT_VIEWS: [(&str, Vec3, Vec3); 7] = [
    ("Front", Vec3::new(0.0, -1250.0, 0.0), Vec3::Z),
    ("Back", Vec3::new(0.0, 1250.0, 0.0), Vec3::Z),
    ("Top", Vec3::new(0.0, 0.0, 1250.0), Vec3::Y),
    ("Bottom", Vec3::new(0.0, 0.0, -1250.0), Vec3::NEG_Y),
    ("Left", Vec3::new(-1250.0, 0.0, 0.0), Vec3::Z),
    ("Right", Vec3::new(1250.0, 0.0, 0.0), Vec3::Z),
    ("Main", Vec3::new(-500.0, -1000.0, 750.0), Vec3::Z),
];

impl Camera {
    /// Create a user camera looking at `target`
    pub fn new(name: impl Into<String>, position: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut camera = Self {
            id: CameraId(0),
            name: name.into(),
            position,
            target,
            up,
            fov: 30.0,
            near: 25.0,
            far: 50000.0,
            kind: CameraKind::User,
            steps: StepRange::default(),
            selected: SectionSelection::default(),
            view: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// The seven view presets (front, back, top, bottom, left, right, main).
    pub fn default_views() -> Vec<Camera> {
        DEFAULT_VIEWS
            .iter()
            .map(|(name, eye, up)| {
                let mut camera = Camera::new(*name, *eye, Vec3::ZERO, *up);
                camera.kind = CameraKind::Simple;
                camera
            })
            .collect()
    }

    pub fn id(&self) -> CameraId {
        self.id
    }

    pub fn kind(&self) -> CameraKind {
        self.kind
    }

    pub fn is_simple(&self) -> bool {
        self.kind == CameraKind::Simple
    }

    pub fn steps(&self) -> StepRange {
        self.steps
    }

    pub fn selection(&self) -> SectionSelection {
        self.selected
    }

    pub fn is_selected(&self) -> bool {
        self.selected.any()
    }

    /// World to camera transform, as of the last update
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Recompute the view transform from eye, target and up.
    pub(crate) fn update(&mut self) {
        let forward = self.target - self.position;
        if forward.length_squared() > f32::EPSILON && forward.cross(self.up).length_squared() > f32::EPSILON {
            self.view = Mat4::look_at_rh(self.position, self.target, self.up);
        }
    }
}

//! Document lights

use crate::core::types::Vec3;

use super::object::{LightId, SectionSelection, StepRange};

/// Point or spot light
#[derive(Clone, Debug)]
pub struct Light {
    pub(crate) id: LightId,
    pub name: String,
    pub position: Vec3,
    pub target: Vec3,
    /// Constant, linear and quadratic attenuation
    pub attenuation: Vec3,
    pub(crate) steps: StepRange,
    pub(crate) selected: SectionSelection,
    direction: Vec3,
}

impl Light {
    pub fn new(name: impl Into<String>, position: Vec3, target: Vec3) -> Self {
        let mut light = Self {
            id: LightId(0),
            name: name.into(),
            position,
            target,
            attenuation: Vec3::new(1.0, 0.0, 0.0),
            steps: StepRange::default(),
            selected: SectionSelection::default(),
            direction: Vec3::ZERO,
        };
        light.update();
        light
    }

    pub fn id(&self) -> LightId {
        self.id
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

    /// Unit vector from position to target, zero when they coincide
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub(crate) fn update(&mut self) {
        self.direction = (self.target - self.position).normalize_or_zero();
    }
}

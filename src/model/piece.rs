//! Placed parts.

use std::sync::Arc;

use crate::core::types::{Mat4, Vec3};
use crate::math::Aabb;
use crate::part::PartInfo;

use super::object::{GroupId, PieceId, StepRange};

/// One placement of a part in a document.
#[derive(Clone, Debug)]
pub struct Piece {
    pub(crate) id: PieceId,
    pub(crate) part: Arc<PartInfo>,
    pub(crate) color: u32,
    pub(crate) transform: Mat4,
    pub(crate) group: Option<GroupId>,
    pub(crate) steps: StepRange,
    pub(crate) selected: bool,
    /// Line index in the file this piece was read from
    pub(crate) source_line: Option<usize>,
    world_bounds: Aabb,
}

impl Piece {
    pub(crate) fn new(id: PieceId, part: Arc<PartInfo>, color: u32, transform: Mat4, steps: StepRange) -> Self {
        let mut piece = Self {
            id,
            part,
            color,
            transform,
            group: None,
            steps,
            selected: false,
            source_line: None,
            world_bounds: Aabb::EMPTY,
        };
        piece.update_bounds();
        piece
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn part(&self) -> &Arc<PartInfo> {
        &self.part
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    /// Part-to-model transform
    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub fn steps(&self) -> StepRange {
        self.steps
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn source_line(&self) -> Option<usize> {
        self.source_line
    }

    /// Part bounds in model space, as of the last update
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Recompute derived model-space data from the transform.
    pub(crate) fn update_bounds(&mut self) {
        self.world_bounds = self.part.bounds().transformed(&self.transform);
    }

    pub(crate) fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
        self.update_bounds();
    }
}

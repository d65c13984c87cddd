//! Model documents
//!
//! A [`Model`] owns the pieces, cameras, lights and groups of one document,
//! its build-step cursor and its undo history. Operations are split into
//! impl blocks by concern:
//!
//! - `graph`: adding and removing objects, merging documents, sub-model mesh
//! - `group`: the group forest
//! - `timeline`: step cursor, step insertion and removal
//! - `selection`: selection and focus
//! - `commands`: checkpointed edits of the selection
//! - `history`: checkpoints, undo and redo
//! - `persistence`: loading and saving

pub mod camera;
pub mod group;
pub mod history;
pub mod light;
pub mod listener;
pub mod object;
pub mod piece;

mod commands;
mod graph;
mod persistence;
mod selection;
mod timeline;

use std::sync::Arc;

pub use camera::{Camera, CameraKind};
pub use group::Group;
pub use history::{Checkpoint, History};
pub use light::Light;
pub use listener::{ModelEvent, ModelListener};
pub use object::{
    CameraId, Focus, FocusSection, ForeignLine, GroupId, LightId, ObjectRef, PieceId,
    SectionSelection, StepRange,
};
pub use piece::Piece;

use crate::core::config::ModelConfig;
use crate::core::types::{Step, Vec3};
use crate::part::{PartInfo, PartLibrary};

/// Document-level settings carried through save and load.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelProperties {
    pub author: String,
    pub description: String,
    pub comments: String,
    pub background_color: Vec3,
    /// Top and bottom colors of a gradient background
    pub background_gradient: Option<(Vec3, Vec3)>,
    pub background_image: String,
    pub fog_color: Vec3,
    pub fog_density: f32,
    pub ambient_color: Vec3,
    pub header: String,
    pub footer: String,
}

impl Default for ModelProperties {
    fn default() -> Self {
        Self {
            author: String::new(),
            description: String::new(),
            comments: String::new(),
            background_color: Vec3::ONE,
            background_gradient: None,
            background_image: String::new(),
            fog_color: Vec3::ONE,
            fog_density: 0.1,
            ambient_color: Vec3::splat(0.2),
            header: String::new(),
            footer: String::new(),
        }
    }
}

/// One model document.
pub struct Model {
    /// Part definition other documents place to use this one as a sub-model
    pub(crate) part: Arc<PartInfo>,
    pub(crate) library: Arc<dyn PartLibrary>,
    pub(crate) config: ModelConfig,
    pub(crate) properties: ModelProperties,
    /// Sorted by show step; equal steps keep insertion order
    pub(crate) pieces: Vec<Piece>,
    pub(crate) cameras: Vec<Camera>,
    pub(crate) lights: Vec<Light>,
    pub(crate) groups: Vec<Group>,
    pub(crate) foreign_lines: Vec<ForeignLine>,
    pub(crate) focus: Option<Focus>,
    pub(crate) current_step: Step,
    pub(crate) active: bool,
    pub(crate) history: History,
    listeners: Vec<Box<dyn ModelListener>>,
    next_id: u64,
}

impl Model {
    /// Create an empty document with the default view cameras.
    pub fn new(name: impl Into<String>, library: Arc<dyn PartLibrary>, config: ModelConfig) -> Self {
        let part = Arc::new(PartInfo::model(name));
        let mut model = Self::with_part(part, library, config);
        model.reset_cameras();
        model.reset_history("New Model");
        log::debug!("Created model '{}'", model.name());
        model
    }

    fn with_part(part: Arc<PartInfo>, library: Arc<dyn PartLibrary>, config: ModelConfig) -> Self {
        let history = History::new(config.undo_depth, config.compress_checkpoints);
        Self {
            part,
            library,
            config,
            properties: ModelProperties::default(),
            pieces: Vec::new(),
            cameras: Vec::new(),
            lights: Vec::new(),
            groups: Vec::new(),
            foreign_lines: Vec::new(),
            focus: None,
            current_step: 1,
            active: true,
            history,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Empty scratch document sharing this document's part, library and
    /// config. Loads fill one of these before swapping its content in.
    pub(crate) fn blank(&self) -> Self {
        let mut scratch = Self::with_part(self.part.clone(), self.library.clone(), self.config.clone());
        // Handles stay unique once the scratch content is adopted.
        scratch.next_id = self.next_id;
        scratch
    }

    pub fn name(&self) -> &str {
        self.part.name()
    }

    /// Part definition standing for this document when placed elsewhere.
    pub fn part(&self) -> &Arc<PartInfo> {
        &self.part
    }

    pub fn library(&self) -> &Arc<dyn PartLibrary> {
        &self.library
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn properties(&self) -> &ModelProperties {
        &self.properties
    }

    /// Replace the document properties and commit a checkpoint.
    pub fn set_properties(&mut self, properties: ModelProperties) {
        if self.properties != properties {
            self.properties = properties;
            self.save_checkpoint("Changing Properties");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn add_listener(&mut self, listener: Box<dyn ModelListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn notify(&mut self, event: ModelEvent) {
        for listener in &mut self.listeners {
            listener.on_event(&event);
        }
    }

    pub(crate) fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub(crate) fn piece_index(&self, id: PieceId) -> Option<usize> {
        self.pieces.iter().position(|p| p.id == id)
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.iter().find(|l| l.id == id)
    }

    /// Lines read from a file that this engine does not model.
    pub fn foreign_lines(&self) -> &[ForeignLine] {
        &self.foreign_lines
    }

    /// Keep pieces ordered by show step.
    pub(crate) fn sort_pieces(&mut self) {
        self.pieces.sort_by_key(|p| p.steps.show);
    }

    /// Refresh the list of parts this document places.
    pub(crate) fn update_part_children(&self) {
        let mut children: Vec<Arc<PartInfo>> = Vec::new();
        for piece in &self.pieces {
            if !children.iter().any(|c| Arc::ptr_eq(c, &piece.part)) {
                children.push(piece.part.clone());
            }
        }
        self.part.set_children(children);
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("pieces", &self.pieces.len())
            .field("cameras", &self.cameras.len())
            .field("lights", &self.lights.len())
            .field("groups", &self.groups.len())
            .field("current_step", &self.current_step)
            .field("active", &self.active)
            .finish()
    }
}

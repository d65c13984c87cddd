//! Studcad - document engine for brick-based 3D models
//!
//! Owns the model document: placed parts, cameras, lights and groups, the
//! build-step timeline, snapshot undo and redo, and the text and binary
//! file formats. Sub-models are flattened into one mesh for drawing.

pub mod core;
pub mod math;
pub mod mesh;
pub mod part;
pub mod model;
pub mod format;

//! Loading and saving documents.

use std::io::Write;
use std::path::Path;

use crate::core::types::{Result, STEP_MAX};
use crate::format::{binary, text, FileFormat};

use super::{Model, ModelEvent};

impl Model {
    /// Take over the content of a freshly read scratch document. Simple
    /// cameras of this document are kept.
    pub(crate) fn adopt(&mut self, scratch: Model) {
        self.properties = scratch.properties;
        self.pieces = scratch.pieces;
        self.groups = scratch.groups;
        self.lights = scratch.lights;
        self.foreign_lines = scratch.foreign_lines;
        self.cameras.retain(|c| c.is_simple());
        self.cameras.extend(scratch.cameras.into_iter().filter(|c| !c.is_simple()));
        self.current_step = scratch.current_step;
        self.next_id = self.next_id.max(scratch.next_id);
        self.focus = None;

        self.update_part_children();
        if !self.active {
            self.update_mesh();
        }
    }

    /// Load a document in either format, detected from its first bytes.
    ///
    /// On failure the current content and history are left untouched.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let format = FileFormat::detect(data);
        let mut scratch = self.blank();
        match format {
            FileFormat::Text => text::read(&mut scratch, &String::from_utf8_lossy(data))?,
            FileFormat::Binary => binary::read(&mut scratch, data)?,
        }

        self.adopt(scratch);
        self.current_step = self.current_step.clamp(1, self.last_step().min(STEP_MAX - 1));
        self.calculate_step();
        self.reset_history("Loading");

        log::info!(
            "Loaded '{}' ({:?}): {} pieces, {} groups, {} cameras, {} lights",
            self.name(),
            format,
            self.pieces.len(),
            self.groups.len(),
            self.cameras.iter().filter(|c| !c.is_simple()).count(),
            self.lights.len()
        );
        self.notify(ModelEvent::Modified);
        self.notify(ModelEvent::StepChanged(self.current_step));
        self.notify(ModelEvent::SelectionChanged);
        Ok(())
    }

    /// Serialize to the text format.
    pub fn to_text(&self) -> String {
        text::write(self)
    }

    pub fn save_text(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(text::write(self).as_bytes())?;
        Ok(())
    }

    /// Serialize to the newest binary format.
    pub fn save_binary(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&binary::write(self))?;
        Ok(())
    }

    /// Load from disk; the format is detected from the content.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let data = std::fs::read(path)?;
        self.load(&data)
    }

    /// Save to disk in the format the file extension asks for.
    pub fn save_file(&self, path: &Path) -> Result<()> {
        let data = match FileFormat::from_path(path) {
            FileFormat::Text => text::write(self).into_bytes(),
            FileFormat::Binary => binary::write(self),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, data)?;
        log::info!("Saved '{}' to {}", self.name(), path.display());
        Ok(())
    }
}

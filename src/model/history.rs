//! Snapshot undo/redo.
//!
//! Every committed edit serializes the whole document to the text format
//! and pushes it onto the undo stack. The front of the undo stack is always
//! the current state, so undo needs at least two entries.

use std::collections::VecDeque;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::format::text;

use super::{Model, ModelEvent};

/// An immutable document snapshot with the description of the edit that
/// produced it.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    description: String,
    data: Vec<u8>,
    compressed: bool,
}

impl Checkpoint {
    fn new(description: &str, contents: &[u8], compress: bool) -> Self {
        let data = if compress {
            lz4_flex::compress_prepend_size(contents)
        } else {
            contents.to_vec()
        };
        Self {
            description: description.to_string(),
            data,
            compressed: compress,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Stored size in bytes
    pub fn stored_size(&self) -> usize {
        self.data.len()
    }

    /// Serialized document text.
    pub fn contents(&self) -> Result<String> {
        let bytes = if self.compressed {
            lz4_flex::decompress_size_prepended(&self.data)
                .map_err(|e| Error::CorruptCheckpoint(e.to_string()))?
        } else {
            self.data.clone()
        };
        String::from_utf8(bytes).map_err(|e| Error::CorruptCheckpoint(e.to_string()))
    }
}

/// Bounded undo and redo stacks. Index 0 of each is the most recent entry.
#[derive(Debug)]
pub struct History {
    undo: VecDeque<Checkpoint>,
    redo: VecDeque<Checkpoint>,
    max_entries: usize,
    compress: bool,
}

impl History {
    pub fn new(max_entries: usize, compress: bool) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            max_entries: max_entries.max(1),
            compress,
        }
    }

    /// Push a new current state. Clears the redo stack and evicts the
    /// oldest entries beyond the depth limit.
    pub fn push(&mut self, description: &str, contents: &[u8]) {
        self.redo.clear();
        self.undo.push_front(Checkpoint::new(description, contents, self.compress));

        while self.undo.len() > self.max_entries {
            if let Some(evicted) = self.undo.pop_back() {
                log::debug!("Evicted checkpoint '{}'", evicted.description);
            }
        }
    }

    /// Drop everything and start over from `contents`.
    pub fn reset(&mut self, description: &str, contents: &[u8]) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push_front(Checkpoint::new(description, contents, self.compress));
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Description of the edit undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        if self.can_undo() {
            self.undo.front().map(|c| c.description())
        } else {
            None
        }
    }

    /// Description of the edit redo would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo.front().map(|c| c.description())
    }

    /// Move the current state to the redo stack and return the new current
    /// state, or `None` if there is nothing to undo.
    pub fn undo(&mut self) -> Option<&Checkpoint> {
        if !self.can_undo() {
            return None;
        }
        let entry = self.undo.pop_front()?;
        self.redo.push_front(entry);
        self.undo.front()
    }

    /// Move the most recently undone state back and return it.
    pub fn redo(&mut self) -> Option<&Checkpoint> {
        let entry = self.redo.pop_front()?;
        self.undo.push_front(entry);
        self.undo.front()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Current state
    pub fn current(&self) -> Option<&Checkpoint> {
        self.undo.front()
    }
}

impl Model {
    /// Commit the current state as an undo entry.
    ///
    /// An empty description records nothing; it marks intermediate states
    /// of an edit that is still in progress. An inactive document
    /// regenerates its sub-model mesh either way.
    pub fn save_checkpoint(&mut self, description: &str) {
        if !self.active {
            self.update_mesh();
        }

        if description.is_empty() {
            return;
        }

        let contents = text::write(self);
        self.history.push(description, contents.as_bytes());
        log::debug!("Checkpoint '{}' ({} undo entries)", description, self.history.undo_len());

        self.notify(ModelEvent::Modified);
        self.notify_history();
    }

    /// Start a fresh history whose only entry is the current state.
    pub(crate) fn reset_history(&mut self, description: &str) {
        let contents = text::write(self);
        self.history.reset(description, contents.as_bytes());
        self.notify_history();
    }

    pub(crate) fn notify_history(&mut self) {
        let undo = self.history.undo_description().map(str::to_string);
        let redo = self.history.redo_description().map(str::to_string);
        self.notify(ModelEvent::HistoryChanged { undo, redo });
    }

    /// Revert the last committed edit. Returns `false` if there is nothing
    /// to undo.
    pub fn undo(&mut self) -> Result<bool> {
        let contents = match self.history.undo() {
            Some(checkpoint) => checkpoint.contents(),
            None => return Ok(false),
        };
        log::debug!("Undo ({} entries left)", self.history.undo_len());
        self.load_checkpoint(contents)?;
        Ok(true)
    }

    /// Reapply the last undone edit. Returns `false` if there is nothing
    /// to redo.
    pub fn redo(&mut self) -> Result<bool> {
        let contents = match self.history.redo() {
            Some(checkpoint) => checkpoint.contents(),
            None => return Ok(false),
        };
        log::debug!("Redo ({} entries left)", self.history.redo_len());
        self.load_checkpoint(contents)?;
        Ok(true)
    }

    /// Replace the document content with a checkpoint.
    ///
    /// The checkpoint is parsed into a scratch document first. If that fails
    /// the live content is untouched and the whole history is dropped and
    /// restarted from the live content.
    fn load_checkpoint(&mut self, contents: Result<String>) -> Result<()> {
        let loaded = contents.and_then(|text_data| {
            let mut scratch = self.blank();
            text::read(&mut scratch, &text_data)?;
            Ok(scratch)
        });

        match loaded {
            Ok(scratch) => {
                let step = self.current_step;
                self.adopt(scratch);
                self.current_step = step.min(self.last_step());
                self.calculate_step();
                self.notify(ModelEvent::Modified);
                self.notify(ModelEvent::SelectionChanged);
                self.notify_history();
                Ok(())
            }
            Err(err) => {
                log::warn!("Checkpoint failed to load, discarding history: {}", err);
                self.reset_history("Recovered");
                Err(Error::CorruptCheckpoint(err.to_string()))
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{add_brick, test_catalog, test_model};
    use crate::core::config::ModelConfig;

    #[test]
    fn test_history_stack_semantics() {
        let mut history = History::new(8, false);
        history.reset("New", b"0");
        assert!(!history.can_undo());
        assert!(history.undo().is_none());

        history.push("A", b"1");
        history.push("B", b"2");
        assert_eq!(history.undo_description(), Some("B"));

        let current = history.undo().unwrap();
        assert_eq!(current.contents().unwrap(), "1");
        assert_eq!(history.redo_description(), Some("B"));

        // A fresh edit abandons the undone future.
        history.push("C", b"3");
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn test_depth_evicts_oldest() {
        let mut history = History::new(3, false);
        history.reset("New", b"0");
        for i in 1..=5 {
            history.push(&format!("Edit {i}"), format!("{i}").as_bytes());
        }
        assert_eq!(history.undo_len(), 3);
        assert_eq!(history.current().unwrap().description(), "Edit 5");

        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(history.current().unwrap().contents().unwrap(), "3");
    }

    #[test]
    fn test_compressed_checkpoint() {
        let text = "1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\r\n".repeat(64);
        let checkpoint = Checkpoint::new("Add", text.as_bytes(), true);
        assert!(checkpoint.stored_size() < text.len());
        assert_eq!(checkpoint.contents().unwrap(), text);
    }

    #[test]
    fn test_corrupt_compressed_checkpoint() {
        let checkpoint = Checkpoint {
            description: "Broken".to_string(),
            data: vec![10, 0, 0, 0, 0xF0],
            compressed: true,
        };
        assert!(matches!(checkpoint.contents(), Err(Error::CorruptCheckpoint(_))));
    }

    #[test]
    fn test_empty_description_records_nothing() {
        let mut model = test_model();
        add_brick(&mut model, 0.0, 1);
        model.save_checkpoint("");
        assert!(!model.can_undo());
    }

    #[test]
    fn test_undo_redo_model() {
        let mut model = test_model();
        add_brick(&mut model, 0.0, 1);
        model.save_checkpoint("Add");
        add_brick(&mut model, 10.0, 1);
        model.save_checkpoint("Add");
        assert_eq!(model.pieces().len(), 2);

        assert!(model.undo().unwrap());
        assert_eq!(model.pieces().len(), 1);
        assert!(model.undo().unwrap());
        assert_eq!(model.pieces().len(), 0);
        assert!(!model.undo().unwrap());

        assert!(model.redo().unwrap());
        assert!(model.redo().unwrap());
        assert_eq!(model.pieces().len(), 2);
        assert!(!model.redo().unwrap());
    }

    #[test]
    fn test_simple_cameras_survive_undo() {
        let mut model = test_model();
        add_brick(&mut model, 0.0, 1);
        model.save_checkpoint("Add");
        model.undo().unwrap();
        assert_eq!(model.cameras().iter().filter(|c| c.is_simple()).count(), 7);
    }

    #[test]
    fn test_compressed_history_round_trip() {
        let config = ModelConfig {
            compress_checkpoints: true,
            ..ModelConfig::default()
        };
        let mut model = Model::new("test.ldr", test_catalog(), config);
        add_brick(&mut model, 0.0, 1);
        model.save_checkpoint("Add");
        add_brick(&mut model, 20.0, 2);
        model.save_checkpoint("Add");

        model.undo().unwrap();
        assert_eq!(model.pieces().len(), 1);
        model.redo().unwrap();
        assert_eq!(model.pieces().len(), 2);
    }

    #[test]
    fn test_history_events() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();

        let mut model = test_model();
        model.add_listener(Box::new(move |event: &ModelEvent| sink.borrow_mut().push(event.clone())));
        add_brick(&mut model, 0.0, 1);
        model.save_checkpoint("Add");

        let events = events.borrow();
        assert!(events.contains(&ModelEvent::Modified));
        assert!(events.contains(&ModelEvent::HistoryChanged {
            undo: Some("Add".to_string()),
            redo: None,
        }));
    }
}

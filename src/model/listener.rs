//! Observer hooks for the layers built on top of a document.

use crate::core::types::Step;

/// Something about a document changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelEvent {
    SelectionChanged,
    StepChanged(Step),
    /// Descriptions of the actions undo and redo would revert or reapply
    HistoryChanged {
        undo: Option<String>,
        redo: Option<String>,
    },
    /// A camera was deleted; views holding it must fall back to another one
    CameraRemoved(String),
    /// A checkpoint was committed or the document was reloaded
    Modified,
}

/// Receives document events.
pub trait ModelListener {
    fn on_event(&mut self, event: &ModelEvent);
}

impl<F: FnMut(&ModelEvent)> ModelListener for F {
    fn on_event(&mut self, event: &ModelEvent) {
        self(event)
    }
}

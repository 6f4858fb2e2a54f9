//! Snapshot-based undo/redo stacks.
//!
//! Each record keeps a full copy of the document before and after one
//! successful edit. Records are only pushed once an edit has committed, so a
//! rejected edit never leaves a trace on either stack.

use crate::error::{Error, Result};

/// One reversible edit: the document state on either side of it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord<T> {
    pub label: &'static str,
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone)]
pub struct History<T> {
    undo: Vec<EditRecord<T>>,
    redo: Vec<EditRecord<T>>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }
}

impl<T: Clone> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed edit. Any pending redo records are discarded.
    pub fn record(&mut self, label: &'static str, before: T, after: T) {
        self.undo.push(EditRecord {
            label,
            before,
            after,
        });
        self.redo.clear();
    }

    /// Moves the newest record to the redo stack and returns the state to restore.
    pub fn undo(&mut self) -> Result<T> {
        let record = self.undo.pop().ok_or(Error::HistoryEmpty("undo"))?;
        let state = record.before.clone();
        self.redo.push(record);
        Ok(state)
    }

    /// Moves the newest undone record back and returns the state to restore.
    pub fn redo(&mut self) -> Result<T> {
        let record = self.redo.pop().ok_or(Error::HistoryEmpty("redo"))?;
        let state = record.after.clone();
        self.undo.push(record);
        Ok(state)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// The record `redo` would replay next.
    pub fn peek_redo(&self) -> Option<&EditRecord<T>> {
        self.redo.last()
    }

    pub fn peek_undo(&self) -> Option<&EditRecord<T>> {
        self.undo.last()
    }
}

use crate::cursor::CursorSet;
use crate::enums::ViewMode;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Nothing to undo")]
    EmptyHistory,

    #[error("Unknown view mode slot {0}")]
    UnknownMode(usize),
}

/// Immutable snapshot of every cursor slot plus the active mode.
///
/// Cursors are plain values, so a snapshot is a copy and cannot be changed
/// by later navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationMemento {
    cursors: CursorSet,
    mode: ViewMode,
}

impl NavigationMemento {
    pub fn new(cursors: CursorSet, mode: ViewMode) -> Self {
        Self { cursors, mode }
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn into_parts(self) -> (CursorSet, ViewMode) {
        (self.cursors, self.mode)
    }
}

/// LIFO store of snapshots. Never looks inside what it holds.
#[derive(Debug, Clone, Default)]
pub struct NavigationHistory {
    changes: Vec<NavigationMemento>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, memento: NavigationMemento) {
        self.changes.push(memento);
    }

    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyHistory`] when nothing was pushed.
    pub fn pop(&mut self) -> Result<NavigationMemento, NavigationError> {
        self.changes.pop().ok_or(NavigationError::EmptyHistory)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{Cursor, SingleCursor};

    fn memento(position: usize, mode: ViewMode) -> NavigationMemento {
        let mut cursors = CursorSet::default();
        cursors.replace(ViewMode::Single, Cursor::Single(SingleCursor::new(position)));
        NavigationMemento::new(cursors, mode)
    }

    #[test]
    fn test_history_is_lifo() {
        let a = memento(1, ViewMode::Single);
        let b = memento(2, ViewMode::Quad);
        let mut history = NavigationHistory::new();
        history.push(a.clone());
        history.push(b.clone());

        assert_eq!(history.len(), 2);
        assert_eq!(history.pop(), Ok(b));
        assert_eq!(history.pop(), Ok(a));
        assert!(history.is_empty());
    }

    #[test]
    fn test_empty_pop_is_an_error() {
        let mut history = NavigationHistory::new();
        assert_eq!(history.pop(), Err(NavigationError::EmptyHistory));
    }

    #[test]
    fn test_push_accepts_duplicates() {
        let mut history = NavigationHistory::new();
        history.push(memento(0, ViewMode::Single));
        history.push(memento(0, ViewMode::Single));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_equality_is_per_slot() {
        assert_eq!(memento(3, ViewMode::Sagittal), memento(3, ViewMode::Sagittal));
        assert_ne!(memento(3, ViewMode::Sagittal), memento(4, ViewMode::Sagittal));
        assert_ne!(memento(3, ViewMode::Sagittal), memento(3, ViewMode::Coronal));
    }
}

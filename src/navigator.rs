use crate::cursor::{Cursor, CursorSet, Frames, StudyCursor};
use crate::enums::ViewMode;
use crate::memento::{NavigationError, NavigationHistory, NavigationMemento};
use crate::overlay::Crosshair;
use crate::persistence::StudyRecord;
use crate::reconstruction::ReconstructionResult;
use crate::study::Study;

use tracing::debug;

/// Owns the active cursor set and view mode for one open study, plus the
/// undo history.
///
/// Mode switches and cursor replacements are checkpointed automatically.
/// Stepping with [`next`](Self::next) / [`prev`](Self::prev) is not; call
/// [`checkpoint`](Self::checkpoint) first when a step should be undoable.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    cursors: CursorSet,
    mode: ViewMode,
    history: NavigationHistory,
}

impl Navigator {
    pub fn new(cursors: CursorSet, mode: ViewMode) -> Self {
        Self {
            cursors,
            mode,
            history: NavigationHistory::new(),
        }
    }

    pub fn from_record(record: StudyRecord) -> Self {
        let (cursors, mode) = record.into_parts();
        Self::new(cursors, mode)
    }

    pub fn record(&self) -> StudyRecord {
        StudyRecord::new(self.cursors, self.mode)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn cursors(&self) -> &CursorSet {
        &self.cursors
    }

    /// The cursor of the active mode.
    pub fn cursor(&self) -> &Cursor {
        self.cursors.get(self.mode)
    }

    pub fn snapshot(&self) -> NavigationMemento {
        NavigationMemento::new(self.cursors, self.mode)
    }

    pub fn checkpoint(&mut self) {
        self.history.push(self.snapshot());
        debug!(depth = self.history.len(), mode = ?self.mode, "Checkpointed navigation");
    }

    /// Replace the cursor set and mode wholesale.
    pub fn restore(&mut self, memento: NavigationMemento) {
        let (cursors, mode) = memento.into_parts();
        self.cursors = cursors;
        self.mode = mode;
    }

    /// Roll back to the most recent checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::EmptyHistory`] if there is nothing to undo;
    /// the current state is left untouched.
    pub fn undo(&mut self) -> Result<ViewMode, NavigationError> {
        let memento = self.history.pop()?;
        self.restore(memento);
        debug!(depth = self.history.len(), mode = ?self.mode, "Undid navigation");
        Ok(self.mode)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        self.checkpoint();
        self.mode = mode;
    }

    /// Like [`set_mode`](Self::set_mode), addressed by slot index.
    pub fn set_mode_index(&mut self, index: usize) -> Result<(), NavigationError> {
        let mode = ViewMode::from_index(index).ok_or(NavigationError::UnknownMode(index))?;
        self.set_mode(mode);
        Ok(())
    }

    /// Put a fresh cursor in `mode`'s slot, e.g. a windowed cursor with new
    /// bounds.
    pub fn replace_cursor(&mut self, mode: ViewMode, cursor: impl Into<Cursor>) {
        self.checkpoint();
        self.cursors.replace(mode, cursor.into());
    }

    pub fn next(&mut self, study: &Study) -> bool {
        let moved = self.cursors.get_mut(self.mode).advance(study);
        debug!(mode = ?self.mode, moved, position = self.cursor().position(), "Next");
        moved
    }

    pub fn prev(&mut self) -> bool {
        let moved = self.cursors.get_mut(self.mode).retreat();
        debug!(mode = ?self.mode, moved, position = self.cursor().position(), "Prev");
        moved
    }

    /// Materialize the active view. The reconstruction view additionally
    /// marks where the sagittal and coronal sections cut the slice.
    pub fn render(&self, study: &Study) -> ReconstructionResult<Frames> {
        let mut frames = self.cursor().materialize(study)?;
        if self.mode == ViewMode::Reconstruction {
            let crosshair = Crosshair::new(
                self.cursors.get(ViewMode::Sagittal).position(),
                self.cursors.get(ViewMode::Coronal).position(),
            );
            frames
                .iter_mut()
                .flatten()
                .for_each(|image| crosshair.draw(image));
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{QuadGroupCursor, WindowedCursor};
    use crate::slice::{Slice, pack_grey};

    fn study() -> Study {
        let slices = (0..8)
            .map(|z| Slice::filled(z.to_string(), 5, 4, pack_grey(z as u8)))
            .collect();
        Study::from_slices("nav", slices).expect("should build study")
    }

    #[test]
    fn test_next_moves_active_cursor_only() {
        let study = study();
        let mut navigator = Navigator::default();

        assert!(navigator.next(&study));
        assert!(navigator.next(&study));
        assert_eq!(navigator.cursor().position(), 2);
        assert_eq!(navigator.cursors().get(ViewMode::Reconstruction).position(), 0);
        assert!(!navigator.can_undo());
    }

    #[test]
    fn test_mode_switch_is_undoable() {
        let mut navigator = Navigator::default();
        navigator.set_mode(ViewMode::Quad);
        navigator.set_mode(ViewMode::Quad);
        assert_eq!(navigator.history_len(), 1);

        assert_eq!(navigator.undo(), Ok(ViewMode::Single));
        assert_eq!(navigator.mode(), ViewMode::Single);
        assert_eq!(navigator.undo(), Err(NavigationError::EmptyHistory));
    }

    #[test]
    fn test_undo_restores_positions_captured_at_checkpoint() {
        let study = study();
        let mut navigator = Navigator::default();
        navigator.set_mode(ViewMode::Quad);
        navigator.checkpoint();
        assert!(navigator.next(&study));
        assert_eq!(navigator.cursor().position(), 4);

        navigator.undo().expect("checkpoint exists");
        assert_eq!(navigator.mode(), ViewMode::Quad);
        assert_eq!(navigator.cursor().position(), 0);
    }

    #[test]
    fn test_replace_cursor_checkpoints_first() {
        let mut navigator = Navigator::default();
        let window = WindowedCursor::new(2, 20, 40).expect("valid window");
        navigator.replace_cursor(ViewMode::Windowed, window);

        assert_eq!(navigator.cursors().get(ViewMode::Windowed), &Cursor::Windowed(window));
        navigator.undo().expect("checkpoint exists");
        assert_eq!(
            navigator.cursors().get(ViewMode::Windowed),
            &Cursor::Windowed(WindowedCursor::default())
        );
    }

    #[test]
    fn test_set_mode_index_rejects_unknown_slot() {
        let mut navigator = Navigator::default();
        assert_eq!(navigator.set_mode_index(6), Err(NavigationError::UnknownMode(6)));
        assert_eq!(navigator.set_mode_index(5), Ok(()));
        assert_eq!(navigator.mode(), ViewMode::Coronal);
    }

    #[test]
    fn test_record_roundtrips_state() {
        let mut navigator = Navigator::default();
        navigator.replace_cursor(ViewMode::Quad, QuadGroupCursor::new(5));
        navigator.set_mode(ViewMode::Quad);

        let restored = Navigator::from_record(navigator.record());
        assert_eq!(restored.snapshot(), navigator.snapshot());
        assert!(!restored.can_undo());
    }

    #[test]
    fn test_reconstruction_view_draws_crosshair() {
        let study = study();
        let mut navigator = Navigator::default();
        navigator.set_mode(ViewMode::Sagittal);
        navigator.next(&study);
        navigator.set_mode(ViewMode::Coronal);
        navigator.next(&study);
        navigator.next(&study);
        navigator.set_mode(ViewMode::Reconstruction);

        let frames = navigator.render(&study).expect("should render");
        let image = frames[0].as_ref().expect("image");
        assert_eq!(image.get_pixel(1, 0).0, Crosshair::SAGITTAL_COLOR.0);
        assert_eq!(image.get_pixel(0, 2).0, Crosshair::CORONAL_COLOR.0);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }
}

//! Undo/redo engine over the persisted document.

use std::convert::Infallible;
use std::fmt;

use theme_support::ThemeName;

use crate::error::HistoryError;
use crate::store::StateStore;
use crate::undo::{HistorySliceEntry, HistoryStats, UndoHistory};

/// Entries shown by the default history tail view.
pub const DEFAULT_TAIL_COUNT: usize = 10;

/// Branch-truncating undo/redo over the theme history embedded in the
/// persisted document.
///
/// The engine holds no state of its own: every operation reads the
/// document, mutates the embedded [`UndoHistory`], and writes the
/// document back, leaving the store the single source of truth. Apply
/// callbacks run strictly after the move has been persisted, so a
/// failing callback can never roll back or corrupt the stack.
#[derive(Debug)]
pub struct HistoryEngine<'s> {
    store: &'s StateStore,
}

impl<'s> HistoryEngine<'s> {
    pub fn new(store: &'s StateStore) -> Self {
        Self { store }
    }

    /// Records `theme` as the newest history entry and makes it
    /// current. Empty names are ignored.
    pub fn record(&self, theme: &str) {
        let Ok(theme) = ThemeName::try_new(theme.to_string()) else {
            return;
        };
        let mut state = self.store.read();
        state.undo_history.record(theme);
        self.store.write(&state);
    }

    /// Steps back one entry and returns it, or `None` with a
    /// notification when nothing older exists.
    pub fn undo(&self) -> Option<ThemeName> {
        self.undo_with(no_apply)
    }

    /// Like [`Self::undo`], invoking `apply` with the theme once the
    /// move has been persisted. A failing callback is reported as a
    /// warning; the persisted move stands.
    pub fn undo_with<E: fmt::Display>(
        &self,
        apply: impl FnOnce(&ThemeName) -> Result<(), E>,
    ) -> Option<ThemeName> {
        let mut state = self.store.read();
        let Some(theme) = state.undo_history.step_back().cloned() else {
            self.store.notifier().info("no more history to undo");
            return None;
        };
        self.store.write(&state);
        self.apply_after_persist(&theme, apply);
        Some(theme)
    }

    /// Steps forward one entry and returns it, or `None` with a
    /// notification when nothing newer exists.
    pub fn redo(&self) -> Option<ThemeName> {
        self.redo_with(no_apply)
    }

    /// Mirror of [`Self::undo_with`].
    pub fn redo_with<E: fmt::Display>(
        &self,
        apply: impl FnOnce(&ThemeName) -> Result<(), E>,
    ) -> Option<ThemeName> {
        let mut state = self.store.read();
        let Some(theme) = state.undo_history.step_forward().cloned() else {
            self.store.notifier().info("no more history to redo");
            return None;
        };
        self.store.write(&state);
        self.apply_after_persist(&theme, apply);
        Some(theme)
    }

    /// Moves the cursor straight to `position` (1-based) and returns
    /// the theme there. Out-of-range positions are rejected with an
    /// error notification and no mutation.
    pub fn jump(&self, position: usize) -> Result<ThemeName, HistoryError> {
        self.jump_with(position, no_apply)
    }

    /// Like [`Self::jump`], invoking `apply` after persisting the move.
    pub fn jump_with<E: fmt::Display>(
        &self,
        position: usize,
        apply: impl FnOnce(&ThemeName) -> Result<(), E>,
    ) -> Result<ThemeName, HistoryError> {
        let mut state = self.store.read();
        let theme = match state.undo_history.seek(position) {
            Ok(theme) => theme.clone(),
            Err(err) => {
                self.store.notifier().error(&err.to_string());
                return Err(err);
            }
        };
        self.store.write(&state);
        self.store.notifier().info(&format!("jumped to '{theme}'"));
        self.apply_after_persist(&theme, apply);
        Ok(theme)
    }

    /// Theme currently active from history's viewpoint.
    pub fn current(&self) -> Option<ThemeName> {
        self.store.read().undo_history.current().cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.store.read().undo_history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.read().undo_history.can_redo()
    }

    pub fn stats(&self) -> HistoryStats {
        self.store.read().undo_history.stats()
    }

    /// Last [`DEFAULT_TAIL_COUNT`] entries, oldest first.
    pub fn tail(&self) -> Vec<HistorySliceEntry> {
        self.slice(DEFAULT_TAIL_COUNT)
    }

    /// Last `count` entries, oldest first.
    pub fn slice(&self, count: usize) -> Vec<HistorySliceEntry> {
        self.store.read().undo_history.tail_slice(count)
    }

    /// Clears the history, keeping its cap, and persists.
    pub fn reset(&self) {
        let mut state = self.store.read();
        state.undo_history.reset();
        self.store.write(&state);
    }

    /// Plain `{stack, index, maxSize}` copy for session handoff.
    pub fn snapshot(&self) -> UndoHistory {
        self.store.read().undo_history
    }

    /// Replaces the stored history with `data`, clamping an
    /// out-of-range cursor instead of rejecting it.
    pub fn restore(&self, data: UndoHistory) {
        let mut state = self.store.read();
        state.undo_history = data.sanitized();
        self.store.write(&state);
    }

    fn apply_after_persist<E: fmt::Display>(
        &self,
        theme: &ThemeName,
        apply: impl FnOnce(&ThemeName) -> Result<(), E>,
    ) {
        if let Err(err) = apply(theme) {
            self.store
                .notifier()
                .warn(&format!("failed to apply theme '{theme}': {err}"));
        }
    }
}

fn no_apply(_theme: &ThemeName) -> Result<(), Infallible> {
    Ok(())
}

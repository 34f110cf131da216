//! Colorscheme manager core: a JSON-backed state store plus a bounded,
//! branch-truncating undo/redo history over theme names.
//!
//! The [`StateStore`] owns the single persisted document (current and
//! saved theme, bookmarks, usage counts, sort mode, undo history) and
//! keeps every read total: missing or damaged files degrade to the
//! default document instead of failing. The [`HistoryEngine`] layers
//! undo/redo/jump on top of the store, re-reading and rewriting the
//! document on every operation so the store stays the single source of
//! truth. Applying a theme inside the editor is the host's job,
//! supplied as a callback to the `*_with` operations.

pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod notify;
pub mod store;
pub mod undo;

pub use config::{
    DEFAULT_BOOKMARKS_MAX, DEFAULT_HISTORY_MAX_SIZE, DEFAULT_RECENTS_MAX, ManagerConfig,
};
pub use document::{BookmarkToggle, PersistedState, SortMode};
pub use error::{HistoryError, StoreError};
pub use history::{DEFAULT_TAIL_COUNT, HistoryEngine};
pub use notify::{Notifier, NullNotifier, RecordingNotifier, Severity};
pub use store::{FsStateBackend, MemoryStateBackend, StateBackend, StateStore};
pub use theme_support::{EmptyStringError, GroupKey, NonEmptyString, ThemeName};
pub use undo::{HistorySliceEntry, HistoryStats, UndoHistory};

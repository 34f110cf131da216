/// Cap on the undo history stack when no persisted value exists yet.
pub const DEFAULT_HISTORY_MAX_SIZE: usize = 50;
/// Cap on the bookmark list.
pub const DEFAULT_BOOKMARKS_MAX: usize = 30;
/// Cap on the usage-recency list.
pub const DEFAULT_RECENTS_MAX: usize = 20;

/// Caps consumed when the store materializes or repairs state.
///
/// `history_max_size` seeds newly created undo histories only; a
/// `maxSize` already embedded in the persisted document wins on load, so
/// changing configuration affects existing documents only after a
/// `reset` or `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    pub history_max_size: usize,
    pub bookmarks_max: usize,
    pub recents_max: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            history_max_size: DEFAULT_HISTORY_MAX_SIZE,
            bookmarks_max: DEFAULT_BOOKMARKS_MAX,
            recents_max: DEFAULT_RECENTS_MAX,
        }
    }
}

impl ManagerConfig {
    /// History cap with the zero value floored away; an undo history of
    /// capacity zero could never hold the entry just applied.
    pub(crate) fn history_cap(&self) -> usize {
        self.history_max_size.max(1)
    }
}

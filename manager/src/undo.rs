//! Bounded, branch-truncating undo history over theme names.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use theme_support::ThemeName;

use crate::error::HistoryError;

/// Linear undo history with a 1-based cursor.
///
/// `index` points at the entry currently considered active, with `0`
/// meaning "nothing recorded yet" (or, after a restore, "stepped back
/// past the oldest entry"). Mutating operations maintain three
/// invariants: entries are pairwise distinct, `len() <= max_size()`,
/// and `index() <= len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoHistory {
    stack: Vec<ThemeName>,
    index: usize,
    max_size: usize,
}

impl UndoHistory {
    /// Empty history holding at most `max_size` entries. A zero cap is
    /// floored to one; a history that cannot hold the entry just
    /// recorded would be useless.
    pub fn new(max_size: usize) -> Self {
        Self {
            stack: Vec::new(),
            index: 0,
            max_size: max_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 1-based cursor position; `0` when nothing is active.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Entries oldest first.
    pub fn entries(&self) -> &[ThemeName] {
        &self.stack
    }

    /// Entry at the cursor, if the cursor points at one.
    pub fn current(&self) -> Option<&ThemeName> {
        if self.index == 0 {
            None
        } else {
            self.stack.get(self.index - 1)
        }
    }

    /// Whether a step back is possible. Position 1 is the oldest
    /// reachable state, so the cursor must sit strictly above it.
    pub fn can_undo(&self) -> bool {
        self.index > 1
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.stack.len()
    }

    /// Records `theme` as the newest entry and makes it current.
    ///
    /// Entries after the cursor are discarded first (recording after an
    /// undo loses the redo branch), then any occurrence of `theme`
    /// already on the stack is removed so entries stay distinct, then
    /// `theme` is appended and the oldest entries are evicted until the
    /// stack fits `max_size` again.
    pub fn record(&mut self, theme: ThemeName) {
        self.stack.truncate(self.index);
        let mut pos = self.stack.len();
        while pos > 0 {
            pos -= 1;
            if self.stack.get(pos) == Some(&theme) {
                self.stack.remove(pos);
                if pos < self.index {
                    self.index -= 1;
                }
            }
        }
        self.stack.push(theme);
        self.index = self.stack.len();
        self.evict_overflow();
    }

    /// Moves the cursor one entry back and returns the entry it lands
    /// on, or `None` when already at the oldest entry (or empty).
    pub fn step_back(&mut self) -> Option<&ThemeName> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        self.stack.get(self.index - 1)
    }

    /// Moves the cursor one entry forward and returns the entry it
    /// lands on, or `None` when already at the newest entry.
    pub fn step_forward(&mut self) -> Option<&ThemeName> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        self.stack.get(self.index - 1)
    }

    /// Moves the cursor directly to `position` (1-based). Out-of-range
    /// positions are rejected without touching the cursor.
    pub fn seek(&mut self, position: usize) -> Result<&ThemeName, HistoryError> {
        let len = self.stack.len();
        if !(1..=len).contains(&position) {
            return Err(HistoryError::OutOfRange { position, len });
        }
        self.index = position;
        self.current()
            .ok_or(HistoryError::OutOfRange { position, len })
    }

    /// Clears every entry while keeping the configured cap.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.index = 0;
    }

    /// Aggregate view over the stack. The most frequent theme breaks
    /// ties by earliest position in the stack, which keeps the result
    /// deterministic.
    pub fn stats(&self) -> HistoryStats {
        let mut counts: HashMap<&ThemeName, usize> = HashMap::new();
        for theme in &self.stack {
            *counts.entry(theme).or_insert(0) += 1;
        }
        let mut most_frequent: Option<(ThemeName, usize)> = None;
        for theme in &self.stack {
            let count = counts.get(theme).copied().unwrap_or(0);
            let replace = most_frequent
                .as_ref()
                .is_none_or(|(_, best)| count > *best);
            if replace {
                most_frequent = Some((theme.clone(), count));
            }
        }
        HistoryStats {
            entries: self.stack.len(),
            position: self.index,
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            distinct_themes: counts.len(),
            most_frequent,
            latest: self.stack.last().cloned(),
        }
    }

    /// Last `count` entries, oldest first, with their absolute 1-based
    /// positions and a marker on the entry at the cursor.
    pub fn tail_slice(&self, count: usize) -> Vec<HistorySliceEntry> {
        let start = self.stack.len().saturating_sub(count);
        self.stack
            .iter()
            .enumerate()
            .skip(start)
            .map(|(offset, theme)| HistorySliceEntry {
                position: offset + 1,
                theme: theme.clone(),
                is_current: offset + 1 == self.index,
            })
            .collect()
    }

    /// Repairs a history restored from an untrusted snapshot: floors a
    /// zero cap, evicts overflow, and clamps the cursor into
    /// `0..=len()`. Entries are kept as-is, duplicates included, so a
    /// snapshot round trip stays lossless for well-formed input.
    pub(crate) fn sanitized(mut self) -> Self {
        if self.max_size == 0 {
            self.max_size = 1;
        }
        self.evict_overflow();
        self.index = self.index.min(self.stack.len());
        self
    }

    /// Repairs a history decoded from the persisted document: on top of
    /// what [`Self::sanitized`] does, duplicate entries are removed
    /// keeping the newest occurrence, with the cursor shifted so it
    /// stays on the same entry where possible.
    pub(crate) fn normalize(&mut self) {
        if self.max_size == 0 {
            self.max_size = 1;
        }
        let mut seen: HashSet<ThemeName> = HashSet::new();
        let mut pos = self.stack.len();
        while pos > 0 {
            pos -= 1;
            let duplicate = self
                .stack
                .get(pos)
                .is_some_and(|theme| !seen.insert(theme.clone()));
            if duplicate {
                self.stack.remove(pos);
                if pos < self.index {
                    self.index -= 1;
                }
            }
        }
        self.evict_overflow();
        self.index = self.index.min(self.stack.len());
    }

    /// Tolerant decode of the `undoHistory` field of the persisted
    /// document. Anything that is not an object becomes a fresh
    /// history; within an object, unusable entries are dropped, a
    /// missing cursor defaults to the newest entry, and a missing cap
    /// falls back to `default_max`.
    pub(crate) fn from_value(value: Option<&Value>, default_max: usize) -> Self {
        let Some(Value::Object(fields)) = value else {
            return Self::new(default_max);
        };
        let max_size = fields
            .get("maxSize")
            .and_then(Value::as_u64)
            .and_then(|raw| usize::try_from(raw).ok())
            .unwrap_or(default_max);
        let stack: Vec<ThemeName> = fields
            .get("stack")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|raw| ThemeName::try_new(raw.to_string()).ok())
                    .collect()
            })
            .unwrap_or_default();
        let index = fields
            .get("index")
            .and_then(Value::as_u64)
            .and_then(|raw| usize::try_from(raw).ok())
            .unwrap_or(stack.len());
        let mut history = Self {
            stack,
            index,
            max_size,
        };
        history.normalize();
        history
    }

    fn evict_overflow(&mut self) {
        let excess = self.stack.len().saturating_sub(self.max_size);
        if excess > 0 {
            self.stack.drain(..excess);
            self.index = self.index.saturating_sub(excess);
        }
    }
}

/// Aggregate numbers for the history picker footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    pub entries: usize,
    /// 1-based cursor position, `0` when the stack is empty.
    pub position: usize,
    pub can_undo: bool,
    pub can_redo: bool,
    pub distinct_themes: usize,
    /// Most frequent theme with its occurrence count.
    pub most_frequent: Option<(ThemeName, usize)>,
    /// Newest entry on the stack.
    pub latest: Option<ThemeName>,
}

/// One row of the history tail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySliceEntry {
    /// Absolute 1-based position on the stack.
    pub position: usize,
    pub theme: ThemeName,
    pub is_current: bool,
}

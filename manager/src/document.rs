//! The persisted manager document and its normalization rules.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use theme_support::{GroupKey, ThemeName};

use crate::config::ManagerConfig;
use crate::undo::UndoHistory;

/// Ordering applied to theme lists shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Alpha,
    Recent,
    Usage,
}

impl SortMode {
    /// Canonical spelling used in the persisted document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Recent => "recent",
            Self::Usage => "usage",
        }
    }

    /// Accepts the canonical spellings plus the legacy `alphabetical`
    /// value written by earlier releases.
    pub(crate) fn from_persisted(raw: &str) -> Option<Self> {
        match raw {
            "alpha" | "alphabetical" => Some(Self::Alpha),
            "recent" => Some(Self::Recent),
            "usage" => Some(Self::Usage),
            _ => None,
        }
    }
}

/// Outcome of flipping a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkToggle {
    Added,
    Removed,
    /// The theme was not bookmarked and the bookmark list is full; the
    /// list is left untouched.
    CapReached,
}

/// Everything the manager persists, as one JSON document.
///
/// Every field tolerates absent or malformed input when decoded: a
/// fresh document, a hand-edited file, and output of older releases all
/// normalize into the same well-formed shape. Containers are never
/// `null` in the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Last applied theme, previews and auto-apply included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<ThemeName>,
    /// Last theme applied through an explicit, persistent action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<ThemeName>,
    /// Value of `current` immediately before the last apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ThemeName>,
    pub auto_apply: bool,
    /// Ordered and unique, newest bookmark last.
    pub bookmarks: Vec<ThemeName>,
    pub usage: BTreeMap<ThemeName, u64>,
    /// Most recently applied themes, newest first and unique.
    pub recent: Vec<ThemeName>,
    pub sort_mode: SortMode,
    pub collapsed: BTreeMap<GroupKey, bool>,
    pub undo_history: UndoHistory,
}

impl PersistedState {
    /// Default document for a fresh profile.
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            current: None,
            saved: None,
            previous: None,
            auto_apply: false,
            bookmarks: Vec::new(),
            usage: BTreeMap::new(),
            recent: Vec::new(),
            sort_mode: SortMode::default(),
            collapsed: BTreeMap::new(),
            undo_history: UndoHistory::new(config.history_cap()),
        }
    }

    /// Decodes a document field by field, replacing anything absent or
    /// malformed with its default. Unknown fields are dropped. The
    /// result is already normalized.
    pub(crate) fn from_value(value: &Value, config: &ManagerConfig) -> Self {
        let Value::Object(fields) = value else {
            return Self::new(config);
        };
        let mut state = Self {
            current: theme_field(fields, "current"),
            saved: theme_field(fields, "saved"),
            previous: theme_field(fields, "previous"),
            auto_apply: fields
                .get("autoApply")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            bookmarks: theme_list(fields, "bookmarks"),
            usage: usage_map(fields),
            recent: theme_list(fields, "recent"),
            sort_mode: fields
                .get("sortMode")
                .and_then(Value::as_str)
                .and_then(SortMode::from_persisted)
                .unwrap_or_default(),
            collapsed: collapsed_map(fields),
            undo_history: UndoHistory::from_value(
                fields.get("undoHistory"),
                config.history_cap(),
            ),
        };
        state.normalize(config);
        state
    }

    /// Repairs list invariants in place: bookmarks and recents are
    /// deduplicated keeping the first occurrence and truncated to their
    /// caps, and the undo history is coerced into a well-formed triple.
    pub(crate) fn normalize(&mut self, config: &ManagerConfig) {
        dedup_keep_first(&mut self.bookmarks);
        self.bookmarks.truncate(config.bookmarks_max);
        dedup_keep_first(&mut self.recent);
        self.recent.truncate(config.recents_max);
        self.undo_history.normalize();
    }

    /// Makes `theme` the current one, shifting the old value into
    /// `previous`.
    pub fn apply_current(&mut self, theme: ThemeName) {
        self.previous = self.current.take();
        self.current = Some(theme);
    }

    /// Adds `theme` to the bookmarks, or removes it if already present.
    /// A full bookmark list refuses new additions rather than evicting
    /// an old one.
    pub fn toggle_bookmark(&mut self, theme: &ThemeName, cap: usize) -> BookmarkToggle {
        if let Some(found) = self.bookmarks.iter().position(|bookmark| bookmark == theme) {
            self.bookmarks.remove(found);
            BookmarkToggle::Removed
        } else if self.bookmarks.len() >= cap {
            BookmarkToggle::CapReached
        } else {
            self.bookmarks.push(theme.clone());
            BookmarkToggle::Added
        }
    }

    /// Moves `theme` to the front of the recency list.
    pub fn record_recent(&mut self, theme: &ThemeName, cap: usize) {
        self.recent.retain(|entry| entry != theme);
        self.recent.insert(0, theme.clone());
        self.recent.truncate(cap);
    }

    pub fn increment_usage(&mut self, theme: &ThemeName) {
        *self.usage.entry(theme.clone()).or_insert(0) += 1;
    }

    pub fn usage_count(&self, theme: &ThemeName) -> u64 {
        self.usage.get(theme).copied().unwrap_or(0)
    }

    pub fn set_collapsed(&mut self, group: GroupKey, collapsed: bool) {
        self.collapsed.insert(group, collapsed);
    }

    pub fn is_collapsed(&self, group: &GroupKey) -> bool {
        self.collapsed.get(group).copied().unwrap_or(false)
    }

    /// Orders a theme list according to the persisted sort mode.
    ///
    /// `Recent` puts themes in recency-list order with unlisted themes
    /// after all listed ones; `Usage` orders by descending usage count.
    /// Both fall back to case-insensitive name order within ties, which
    /// is also the whole rule for `Alpha`.
    pub fn sort_themes(&self, names: &mut [ThemeName]) {
        match self.sort_mode {
            SortMode::Alpha => names.sort_by(alpha_cmp),
            SortMode::Recent => names.sort_by(|a, b| {
                self.recency_rank(a)
                    .cmp(&self.recency_rank(b))
                    .then_with(|| alpha_cmp(a, b))
            }),
            SortMode::Usage => names.sort_by(|a, b| {
                self.usage_count(b)
                    .cmp(&self.usage_count(a))
                    .then_with(|| alpha_cmp(a, b))
            }),
        }
    }

    fn recency_rank(&self, theme: &ThemeName) -> usize {
        self.recent
            .iter()
            .position(|entry| entry == theme)
            .unwrap_or(usize::MAX)
    }
}

fn alpha_cmp(a: &ThemeName, b: &ThemeName) -> Ordering {
    a.as_str()
        .to_lowercase()
        .cmp(&b.as_str().to_lowercase())
        .then_with(|| a.as_str().cmp(b.as_str()))
}

fn dedup_keep_first(list: &mut Vec<ThemeName>) {
    let mut seen: HashSet<ThemeName> = HashSet::new();
    list.retain(|theme| seen.insert(theme.clone()));
}

fn theme_field(fields: &Map<String, Value>, key: &str) -> Option<ThemeName> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .and_then(|raw| ThemeName::try_new(raw.to_string()).ok())
}

fn theme_list(fields: &Map<String, Value>, key: &str) -> Vec<ThemeName> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .filter_map(|raw| ThemeName::try_new(raw.to_string()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn usage_map(fields: &Map<String, Value>) -> BTreeMap<ThemeName, u64> {
    fields
        .get("usage")
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(key, count)| {
                    let theme = ThemeName::try_new(key.clone()).ok()?;
                    Some((theme, count.as_u64()?))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn collapsed_map(fields: &Map<String, Value>) -> BTreeMap<GroupKey, bool> {
    fields
        .get("collapsed")
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|(key, flag)| {
                    let group = GroupKey::try_new(key.clone()).ok()?;
                    Some((group, flag.as_bool()?))
                })
                .collect()
        })
        .unwrap_or_default()
}

//! File-backed persistence for the manager document.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use theme_support::{GroupKey, ThemeName};

use crate::config::ManagerConfig;
use crate::document::{BookmarkToggle, PersistedState, SortMode};
use crate::error::StoreError;
use crate::notify::{Notifier, NullNotifier};

/// Raw document storage. `load` returns `None` when no document exists
/// yet; `save` replaces the whole document.
pub trait StateBackend {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, contents: &str) -> Result<(), StoreError>;
}

/// Backend storing the document at a fixed filesystem path, creating
/// the parent directory on first save.
#[derive(Debug, Clone)]
pub struct FsStateBackend {
    path: PathBuf,
}

impl FsStateBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateBackend for FsStateBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::ReadFile {
                path: self.path.clone(),
                message: err.to_string(),
            }),
        }
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                message: err.to_string(),
            })?;
        }
        fs::write(&self.path, contents).map_err(|err| StoreError::WriteFile {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }
}

/// In-memory backend for tests and for hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStateBackend {
    contents: Mutex<Option<String>>,
}

impl MemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }
}

impl StateBackend for MemoryStateBackend {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let guard = match self.contents.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(guard.clone())
    }

    fn save(&self, contents: &str) -> Result<(), StoreError> {
        let mut guard = match self.contents.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(contents.to_string());
        Ok(())
    }
}

/// Durable storage for the one [`PersistedState`] document.
///
/// Every read is total: absent, blank, or unparseable content degrades
/// to the default document, with a warning through the notification
/// sink when content existed but could not be parsed. Every write
/// normalizes and rewrites the whole document synchronously, so within
/// one process a read always observes the preceding write.
pub struct StateStore {
    backend: Box<dyn StateBackend>,
    notifier: Arc<dyn Notifier>,
    config: ManagerConfig,
}

impl StateStore {
    /// Store over [`FsStateBackend`] with notifications dropped.
    pub fn open(path: impl Into<PathBuf>, config: ManagerConfig) -> Self {
        Self::new(FsStateBackend::new(path), config, Arc::new(NullNotifier))
    }

    pub fn new(
        backend: impl StateBackend + 'static,
        config: ManagerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend: Box::new(backend),
            notifier,
            config,
        }
    }

    /// Loads and normalizes the document. Never fails: any storage or
    /// decode problem resolves to the default document.
    pub fn read(&self) -> PersistedState {
        let contents = match self.backend.load() {
            Ok(contents) => contents,
            Err(err) => {
                self.notifier.warn(&err.to_string());
                return PersistedState::new(&self.config);
            }
        };
        let Some(contents) = contents else {
            return PersistedState::new(&self.config);
        };
        if contents.trim().is_empty() {
            return PersistedState::new(&self.config);
        }
        match serde_json::from_str::<Value>(&contents) {
            Ok(value) => PersistedState::from_value(&value, &self.config),
            Err(err) => {
                let err = StoreError::Parse {
                    message: err.to_string(),
                };
                self.notifier.warn(&err.to_string());
                PersistedState::new(&self.config)
            }
        }
    }

    /// Normalizes and persists the document. Failures are reported
    /// through the notification sink and leave the stored document
    /// unchanged; the return value says whether the write landed.
    pub fn write(&self, state: &PersistedState) -> bool {
        let mut normalized = state.clone();
        normalized.normalize(&self.config);
        let contents = match serde_json::to_string_pretty(&normalized) {
            Ok(contents) => contents,
            Err(err) => {
                let err = StoreError::Encode {
                    message: err.to_string(),
                };
                self.notifier.error(&err.to_string());
                return false;
            }
        };
        if let Err(err) = self.backend.save(&contents) {
            self.notifier.error(&err.to_string());
            return false;
        }
        true
    }

    /// Replaces the stored document with the default one.
    pub fn clear(&self) -> bool {
        self.write(&PersistedState::new(&self.config))
    }

    pub fn current(&self) -> Option<ThemeName> {
        self.read().current
    }

    /// Makes `theme` the current one, shifting the old value into
    /// `previous`.
    pub fn set_current(&self, theme: ThemeName) {
        self.update(|state| state.apply_current(theme));
    }

    pub fn saved(&self) -> Option<ThemeName> {
        self.read().saved
    }

    pub fn set_saved(&self, theme: ThemeName) {
        self.update(|state| state.saved = Some(theme));
    }

    pub fn previous(&self) -> Option<ThemeName> {
        self.read().previous
    }

    /// Flips the bookmark for `theme` and returns whether it is
    /// bookmarked afterwards. A full bookmark list refuses the addition
    /// and warns instead of evicting an existing bookmark.
    pub fn toggle_bookmark(&self, theme: &ThemeName) -> bool {
        let cap = self.config.bookmarks_max;
        match self.update(|state| state.toggle_bookmark(theme, cap)) {
            BookmarkToggle::Added => true,
            BookmarkToggle::Removed => false,
            BookmarkToggle::CapReached => {
                self.notifier.warn(&format!(
                    "bookmark list is full ({cap} entries); remove one first"
                ));
                false
            }
        }
    }

    /// Records `theme` at the front of the usage-recency list. This is
    /// unrelated to the undo history.
    pub fn add_to_history(&self, theme: &ThemeName) {
        let cap = self.config.recents_max;
        self.update(|state| state.record_recent(theme, cap));
    }

    pub fn increment_usage(&self, theme: &ThemeName) {
        self.update(|state| state.increment_usage(theme));
    }

    pub fn usage_count(&self, theme: &ThemeName) -> u64 {
        self.read().usage_count(theme)
    }

    pub fn sort_mode(&self) -> SortMode {
        self.read().sort_mode
    }

    pub fn set_sort_mode(&self, mode: SortMode) {
        self.update(|state| state.sort_mode = mode);
    }

    pub fn auto_apply(&self) -> bool {
        self.read().auto_apply
    }

    pub fn set_auto_apply(&self, enabled: bool) {
        self.update(|state| state.auto_apply = enabled);
    }

    pub fn is_collapsed(&self, group: &GroupKey) -> bool {
        self.read().is_collapsed(group)
    }

    pub fn set_collapsed(&self, group: GroupKey, collapsed: bool) {
        self.update(|state| state.set_collapsed(group, collapsed));
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    fn update<T>(&self, mutate: impl FnOnce(&mut PersistedState) -> T) -> T {
        let mut state = self.read();
        let result = mutate(&mut state);
        self.write(&state);
        result
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::notify::{RecordingNotifier, Severity};

    fn theme(name: &str) -> Result<ThemeName, &'static str> {
        ThemeName::try_new(name.to_string()).map_err(|_| "theme names in tests must be non-empty")
    }

    fn group(name: &str) -> Result<GroupKey, &'static str> {
        GroupKey::try_new(name.to_string()).map_err(|_| "group keys in tests must be non-empty")
    }

    fn memory_store(
        contents: Option<&str>,
        config: ManagerConfig,
    ) -> (StateStore, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let backend = match contents {
            Some(contents) => MemoryStateBackend::with_contents(contents),
            None => MemoryStateBackend::new(),
        };
        let store = StateStore::new(backend, config, notifier.clone());
        (store, notifier)
    }

    struct FailingBackend;

    impl StateBackend for FailingBackend {
        fn load(&self) -> Result<Option<String>, StoreError> {
            Err(StoreError::ReadFile {
                path: PathBuf::from("/failing"),
                message: "disk offline".to_string(),
            })
        }

        fn save(&self, _contents: &str) -> Result<(), StoreError> {
            Err(StoreError::WriteFile {
                path: PathBuf::from("/failing"),
                message: "disk offline".to_string(),
            })
        }
    }

    /// Unique directory under the system temp dir, removed on drop.
    struct TestTempDir {
        path: PathBuf,
    }

    impl TestTempDir {
        fn new(label: &str) -> Result<Self, &'static str> {
            static COUNTER: AtomicU64 = AtomicU64::new(0);
            let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "theme-manager-{label}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).map_err(|_| "temp dir should be creatable")?;
            Ok(Self { path })
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TestTempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn read_defaults_when_no_document_exists() {
        let (store, notifier) = memory_store(None, ManagerConfig::default());
        assert_eq!(store.read(), PersistedState::new(&ManagerConfig::default()));
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn read_defaults_on_blank_document_without_warning() {
        let (store, notifier) = memory_store(Some("  \n"), ManagerConfig::default());
        assert_eq!(store.read(), PersistedState::new(&ManagerConfig::default()));
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn read_warns_and_defaults_on_unparseable_document() {
        let (store, notifier) = memory_store(Some("{ not json"), ManagerConfig::default());
        assert_eq!(store.read(), PersistedState::new(&ManagerConfig::default()));
        let warnings = notifier.messages_with(Severity::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("failed to parse state file"));
    }

    #[test]
    fn read_warns_and_defaults_on_load_failure() {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = StateStore::new(
            FailingBackend,
            ManagerConfig::default(),
            notifier.clone(),
        );
        assert_eq!(store.read(), PersistedState::new(&ManagerConfig::default()));
        let warnings = notifier.messages_with(Severity::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("disk offline"));
    }

    #[test]
    fn write_reports_save_failure_and_returns_false() {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = StateStore::new(
            FailingBackend,
            ManagerConfig::default(),
            notifier.clone(),
        );
        let landed = store.write(&PersistedState::new(&ManagerConfig::default()));
        assert!(!landed);
        let errors = notifier.messages_with(Severity::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("failed to write state file"));
    }

    #[test]
    fn set_current_shifts_previous_across_writes() -> Result<(), &'static str> {
        let (store, _) = memory_store(None, ManagerConfig::default());
        store.set_current(theme("nord")?);
        store.set_current(theme("gruvbox")?);
        assert_eq!(store.current(), Some(theme("gruvbox")?));
        assert_eq!(store.previous(), Some(theme("nord")?));
        assert_eq!(store.saved(), None);

        store.set_saved(theme("gruvbox")?);
        assert_eq!(store.saved(), Some(theme("gruvbox")?));
        Ok(())
    }

    #[test]
    fn toggle_bookmark_round_trips_and_warns_at_cap() -> Result<(), &'static str> {
        let config = ManagerConfig {
            bookmarks_max: 1,
            ..ManagerConfig::default()
        };
        let (store, notifier) = memory_store(None, config);
        assert!(store.toggle_bookmark(&theme("nord")?));
        assert!(!store.toggle_bookmark(&theme("gruvbox")?));
        let warnings = notifier.messages_with(Severity::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("bookmark list is full"));

        assert!(!store.toggle_bookmark(&theme("nord")?));
        assert!(store.toggle_bookmark(&theme("gruvbox")?));
        Ok(())
    }

    #[test]
    fn add_to_history_keeps_most_recent_first() -> Result<(), &'static str> {
        let config = ManagerConfig {
            recents_max: 2,
            ..ManagerConfig::default()
        };
        let (store, _) = memory_store(None, config);
        store.add_to_history(&theme("a")?);
        store.add_to_history(&theme("b")?);
        store.add_to_history(&theme("c")?);
        let recent: Vec<String> = store
            .read()
            .recent
            .into_iter()
            .map(ThemeName::into_string)
            .collect();
        assert_eq!(recent, vec!["c".to_string(), "b".to_string()]);
        Ok(())
    }

    #[test]
    fn usage_and_flags_round_trip() -> Result<(), &'static str> {
        let (store, _) = memory_store(None, ManagerConfig::default());
        store.increment_usage(&theme("nord")?);
        store.increment_usage(&theme("nord")?);
        assert_eq!(store.usage_count(&theme("nord")?), 2);
        assert_eq!(store.usage_count(&theme("gruvbox")?), 0);

        store.set_sort_mode(SortMode::Usage);
        assert_eq!(store.sort_mode(), SortMode::Usage);

        store.set_auto_apply(true);
        assert!(store.auto_apply());

        store.set_collapsed(group("dark")?, true);
        assert!(store.is_collapsed(&group("dark")?));
        assert!(!store.is_collapsed(&group("light")?));
        Ok(())
    }

    #[test]
    fn clear_restores_defaults() -> Result<(), &'static str> {
        let (store, _) = memory_store(None, ManagerConfig::default());
        store.set_current(theme("nord")?);
        store.set_auto_apply(true);
        assert!(store.clear());
        assert_eq!(store.read(), PersistedState::new(&ManagerConfig::default()));
        Ok(())
    }

    #[test]
    fn legacy_sort_mode_normalizes_through_store() {
        let (store, _) = memory_store(
            Some(r#"{"sortMode": "alphabetical"}"#),
            ManagerConfig::default(),
        );
        assert_eq!(store.sort_mode(), SortMode::Alpha);
    }

    #[test]
    fn persisted_history_cap_wins_over_configuration() {
        let config = ManagerConfig {
            history_max_size: 99,
            ..ManagerConfig::default()
        };
        let contents = r#"{"undoHistory": {"stack": ["a"], "index": 1, "maxSize": 5}}"#;
        let (store, _) = memory_store(Some(contents), config);
        assert_eq!(store.read().undo_history.max_size(), 5);
    }

    #[test]
    fn fs_store_round_trips_through_nested_directory() -> Result<(), &'static str> {
        let dir = TestTempDir::new("fs-round-trip")?;
        let path = dir.path().join("state").join("theme.json");
        let config = ManagerConfig::default();

        let writer = StateStore::open(path.clone(), config);
        writer.set_current(theme("nord")?);

        let reader = StateStore::open(path, config);
        assert_eq!(reader.current(), Some(theme("nord")?));
        Ok(())
    }

    #[test]
    fn fs_backend_reports_missing_file_as_none() -> Result<(), &'static str> {
        let dir = TestTempDir::new("fs-missing")?;
        let backend = FsStateBackend::new(dir.path().join("absent.json"));
        let loaded = backend
            .load()
            .map_err(|_| "missing file should not be an error")?;
        assert_eq!(loaded, None);
        Ok(())
    }
}

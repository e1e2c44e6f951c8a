use crate::daemon::EventBus;
use crate::favourites::{Favourite, FavouritesStore};
use crate::prefs::{PreferenceUpdate, Preferences, KEY_FAVOURITES, PREFERENCE_KEYS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// On-disk shape: one flat JSON object. Unknown keys survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub favourites: Vec<Favourite>,
    #[serde(flatten)]
    pub preferences: Preferences,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

struct StoreInner {
    path: Option<PathBuf>,
    doc: StoreDocument,
}

/// Shared handle to the persisted key-value document.
#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<Mutex<StoreInner>>,
    events: Arc<EventBus>,
}

impl JsonStore {
    pub fn open(path: PathBuf, events: Arc<EventBus>) -> Result<Self> {
        let doc = load_document(&path)?;
        log::info!("Loaded store from {}", path.display());
        Ok(Self::with_document(Some(path), doc, events))
    }

    pub fn in_memory(doc: StoreDocument, events: Arc<EventBus>) -> Self {
        Self::with_document(None, doc, events)
    }

    fn with_document(path: Option<PathBuf>, doc: StoreDocument, events: Arc<EventBus>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner { path, doc })),
            events,
        }
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn preferences(&self) -> Preferences {
        self.lock().doc.preferences.clone()
    }

    pub fn favourites(&self) -> Vec<Favourite> {
        self.lock().doc.favourites.clone()
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(&self.lock().doc).unwrap_or_default()
    }

    pub fn set_favourites(&self, favourites: &[Favourite]) -> Result<bool> {
        self.update(KEY_FAVOURITES, |doc| {
            if doc.favourites == favourites {
                return false;
            }
            doc.favourites = favourites.to_vec();
            true
        })
    }

    /// Returns `false` when the value was already current; nothing is written then.
    pub fn apply(&self, update: PreferenceUpdate) -> Result<bool> {
        self.update(update.key(), |doc| update.apply_to(&mut doc.preferences))
    }

    fn update(&self, key: &str, change: impl FnOnce(&mut StoreDocument) -> bool) -> Result<bool> {
        {
            let mut inner = self.lock();
            let mut next = inner.doc.clone();
            if !change(&mut next) {
                return Ok(false);
            }
            if let Some(path) = &inner.path {
                write_document(path, &next)?;
            }
            inner.doc = next;
        }

        let told = self.events.store_changed(key);
        log::debug!("Store key changed: {} ({} listener(s))", key, told);
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FavouritesStore for JsonStore {
    fn load_favourites(&self) -> Vec<Favourite> {
        self.favourites()
    }

    fn save_favourites(&mut self, favourites: &[Favourite]) -> Result<()> {
        self.set_favourites(favourites)?;
        Ok(())
    }
}

/// Reads what it can. A bad value costs only that key; a file that is not a JSON object
/// is moved aside so the next write cannot overwrite it.
fn load_document(path: &Path) -> Result<StoreDocument> {
    if !path.exists() {
        return Ok(StoreDocument::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match serde_json::from_str::<Map<String, Value>>(&content) {
        Ok(map) => Ok(document_from_map(map)),
        Err(e) => {
            let aside = path.with_extension("json.unreadable");
            log::warn!(
                "Store at {} is unreadable ({}), moving it to {} and starting from defaults",
                path.display(),
                e,
                aside.display()
            );
            std::fs::rename(path, &aside)
                .with_context(|| format!("Failed to move {} aside", path.display()))?;
            Ok(StoreDocument::default())
        }
    }
}

fn document_from_map(mut map: Map<String, Value>) -> StoreDocument {
    let favourites = match map.remove(KEY_FAVOURITES) {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Favourite>(entry) {
                Ok(favourite) => Some(favourite),
                Err(e) => {
                    log::warn!("Skipping malformed favourite: {}", e);
                    None
                }
            })
            .collect(),
        Some(other) => {
            log::warn!("Ignoring {} of unexpected shape: {}", KEY_FAVOURITES, other);
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut preferences = Preferences::default();
    for key in PREFERENCE_KEYS {
        let Some(value) = map.remove(*key) else {
            continue;
        };
        match PreferenceUpdate::parse(key, value) {
            Ok(update) => {
                update.apply_to(&mut preferences);
            }
            Err(e) => log::warn!("{:#}, using the default", e),
        }
    }

    StoreDocument {
        favourites,
        preferences,
        extra: map,
    }
}

fn write_document(path: &Path, doc: &StoreDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");
    let mut file = std::fs::File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    drop(file);
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favourites::FavouriteKind;
    use crate::prefs::{ActionMode, IconSize, SortMode};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_env() -> (JsonStore, TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.json");
        let store = JsonStore::open(path.clone(), Arc::new(EventBus::new())).unwrap();
        (store, temp, path)
    }

    fn favourite(path: &str) -> Favourite {
        Favourite {
            path: path.into(),
            name: path.trim_start_matches('/').into(),
            kind: FavouriteKind::File,
        }
    }

    #[test]
    fn open_returns_defaults_when_file_missing() {
        // Arrange
        let (store, _temp, path) = setup_test_env();

        // Act
        let prefs = store.preferences();

        // Assert
        assert_eq!(prefs, Preferences::default());
        assert!(store.favourites().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn open_parses_complete_document() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let data = json!({
            "favourites": [{"name": "Safari", "path": "/Applications/Safari.app", "type": "app"}],
            "pref_icon_size": "big",
            "pref_sort": "name",
            "pref_action": "finder",
            "pref_open_at_login": true,
            "flag_first_launch": false,
            "window_bounds": {"x": 1}
        });
        fs::write(&path, data.to_string()).unwrap();

        // Act
        let store = JsonStore::open(path, Arc::new(EventBus::new())).unwrap();

        // Assert
        let prefs = store.preferences();
        assert_eq!(prefs.icon_size, IconSize::Big);
        assert_eq!(prefs.sort, SortMode::Name);
        assert_eq!(prefs.action, ActionMode::RevealOnClick);
        assert!(prefs.open_at_login);
        assert!(!prefs.first_launch);
        assert_eq!(store.favourites()[0].kind, FavouriteKind::App);
        assert_eq!(store.snapshot()["window_bounds"], json!({"x": 1}));
    }

    #[test]
    fn unreadable_document_is_moved_aside_before_any_rewrite() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        // Act
        let store = JsonStore::open(path.clone(), Arc::new(EventBus::new())).unwrap();
        store.apply(PreferenceUpdate::Sort(SortMode::Name)).unwrap();

        // Assert
        assert_eq!(store.favourites(), Vec::<Favourite>::new());
        assert_eq!(
            fs::read_to_string(path.with_extension("json.unreadable")).unwrap(),
            "{ not json"
        );
        assert!(path.exists());
    }

    #[test]
    fn bad_values_cost_only_their_own_key() {
        // Arrange
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let data = json!({
            "favourites": [
                {"name": "a", "path": "/a", "type": "file"},
                {"name": "broken", "type": "file"},
                {"name": "b", "path": "/b", "type": "spaceship"},
                {"name": "c", "path": "/c", "type": "dir"}
            ],
            "pref_sort": "date",
            "pref_icon_size": "big",
            "pref_open_at_login": "yes",
            "window_bounds": {"x": 1}
        });
        fs::write(&path, data.to_string()).unwrap();

        // Act
        let store = JsonStore::open(path.clone(), Arc::new(EventBus::new())).unwrap();
        store.apply(PreferenceUpdate::Action(ActionMode::OpenOnClick)).unwrap();

        // Assert
        let kept: Vec<PathBuf> = store.favourites().into_iter().map(|f| f.path).collect();
        assert_eq!(kept, vec![PathBuf::from("/a"), PathBuf::from("/c")]);
        let prefs = store.preferences();
        assert_eq!(prefs.sort, SortMode::Type);
        assert_eq!(prefs.icon_size, IconSize::Big);
        assert!(!prefs.open_at_login);

        let reopened = JsonStore::open(path, Arc::new(EventBus::new())).unwrap();
        assert_eq!(reopened.favourites().len(), 2);
        assert_eq!(reopened.preferences().icon_size, IconSize::Big);
        assert_eq!(reopened.snapshot()["window_bounds"], json!({"x": 1}));
    }

    #[test]
    fn non_object_documents_are_moved_aside() {
        let cases = ["[]", "42", "\"favourites\"", ""];

        for content in cases {
            let temp = TempDir::new().unwrap();
            let path = temp.path().join("config.json");
            fs::write(&path, content).unwrap();

            let store = JsonStore::open(path.clone(), Arc::new(EventBus::new())).unwrap();

            assert_eq!(store.preferences(), Preferences::default(), "content: {:?}", content);
            assert!(!path.exists(), "content: {:?}", content);
            assert!(path.with_extension("json.unreadable").exists(), "content: {:?}", content);
        }
    }

    #[test]
    fn set_favourites_persists_and_survives_reopen() {
        // Arrange
        let (store, _temp, path) = setup_test_env();

        // Act
        store.set_favourites(&[favourite("/a"), favourite("/b")]).unwrap();

        // Assert
        let reopened = JsonStore::open(path.clone(), Arc::new(EventBus::new())).unwrap();
        assert_eq!(reopened.favourites(), vec![favourite("/a"), favourite("/b")]);
        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["pref_sort"], "type");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn apply_writes_only_on_change() {
        let (store, _temp, path) = setup_test_env();

        assert!(!store.apply(PreferenceUpdate::Sort(SortMode::Type)).unwrap());
        assert!(!path.exists());

        assert!(store.apply(PreferenceUpdate::Sort(SortMode::Name)).unwrap());
        assert!(path.exists());
        assert_eq!(store.preferences().sort, SortMode::Name);
    }

    #[test]
    fn changes_are_announced_per_key() {
        // Arrange
        let (store, _temp, _path) = setup_test_env();
        let mut rx = store.events().subscribe();

        // Act
        store.apply(PreferenceUpdate::IconSize(IconSize::Big)).unwrap();
        store.apply(PreferenceUpdate::IconSize(IconSize::Big)).unwrap();
        store.set_favourites(&[favourite("/a")]).unwrap();

        // Assert
        let keys: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| match e {
                crate::daemon::DaemonEvent::StoreChanged { key } => key,
            })
            .collect();
        assert_eq!(keys, vec!["pref_icon_size", "favourites"]);
    }

    #[test]
    fn in_memory_store_never_touches_disk() {
        let store = JsonStore::in_memory(StoreDocument::default(), Arc::new(EventBus::new()));

        assert!(store.set_favourites(&[favourite("/a")]).unwrap());
        assert_eq!(store.favourites().len(), 1);
    }
}

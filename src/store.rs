//! JSON-file key-value store with dotted keys.
//!
//! `common.mode` addresses `{"common": {"mode": ...}}`. Every `set` rewrites
//! the whole file through a temp file and a rename while holding the data
//! lock, so the file always reflects the latest in-memory state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct KvStore {
    path: PathBuf,
    data: Mutex<Value>,
}

impl KvStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = load(&path);
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        lookup(&self.lock(), key).cloned()
    }

    /// Value at `key`, or `default` when the key is absent. A stored `null` is returned as is.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }

    /// Typed read. A value of the wrong shape reads as `default`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get(key) {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                debug!(key, error = %e, "Stored value has unexpected shape");
                default
            }),
            None => default,
        }
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut data = self.lock();
        insert(&mut data, key, value);
        save(&self.path, &data)
    }

    /// Like [`KvStore::set`] but only logs a failed write.
    pub fn set_logged(&self, key: &str, value: Value) {
        if let Err(e) = self.set(key, value) {
            warn!(key, path = %self.path.display(), error = %e, "Failed to persist store value");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Value>(&content) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => {
                warn!(path = %path.display(), "Store file is not a JSON object, starting empty");
                Value::Object(Map::new())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse store file");
                Value::Object(Map::new())
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read store file");
            Value::Object(Map::new())
        }
    }
}

fn save(path: &Path, data: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(data)?;
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp_path = path.with_extension(format!("json.{}-{seq}.tmp", std::process::id()));
    fs::write(&tmp_path, content)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        // Windows cannot overwrite an existing file via rename.
        let _ = fs::remove_file(path);
        if let Err(e2) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            warn!(path = %path.display(), first = %e, "Rename retry failed");
            return Err(e2.into());
        }
    }
    Ok(())
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(root, |node, part| node.get(part))
}

fn insert(root: &mut Value, key: &str, value: Value) {
    let mut parts = key.split('.').peekable();
    let mut node = root;
    while let Some(part) = parts.next() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        if parts.peek().is_none() {
            map.insert(part.to_string(), value);
            return;
        }
        node = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scratch() -> (tempfile::TempDir, KvStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path().join("settings.json"));
        (dir, store)
    }

    #[test]
    fn set_then_get_with_default() {
        let (_dir, store) = scratch();
        store.set("common.mode", json!("trigger")).expect("set");
        assert_eq!(store.get_or("common.mode", json!("resident")), json!("trigger"));
        assert_eq!(store.get_or("common.other", json!(false)), json!(false));
    }

    #[test]
    fn dotted_keys_nest_objects() {
        let (_dir, store) = scratch();
        store.set("common.alwaysOnTop", json!(false)).expect("set");
        store.set("common.mode", json!("resident")).expect("set");
        store.set("shortcuts.bossKey", json!("Alt+Z")).expect("set");

        assert_eq!(
            store.get("common").expect("common section"),
            json!({ "alwaysOnTop": false, "mode": "resident" })
        );
    }

    #[test]
    fn values_survive_reopen() {
        let (dir, store) = scratch();
        store.set("winSize", json!([400, 300])).expect("set");
        drop(store);

        let reopened = KvStore::open(dir.path().join("settings.json"));
        assert_eq!(reopened.get_as::<(u32, u32)>("winSize", (0, 0)), (400, 300));
    }

    #[test]
    fn corrupted_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("user-data.json");
        fs::write(&path, "{ not json").expect("write");

        let store = KvStore::open(&path);
        assert_eq!(store.get("lastPage"), None);
        assert_eq!(store.get_as("winPosition", (1, 2)), (1, 2));
    }

    #[test]
    fn scalar_parent_is_replaced_by_object() {
        let (_dir, store) = scratch();
        store.set("common", json!(3)).expect("set");
        store.set("common.mode", json!("trigger")).expect("set");
        assert_eq!(store.get("common.mode"), Some(json!("trigger")));
    }

    #[test]
    fn stored_null_is_not_replaced_by_default() {
        let (_dir, store) = scratch();
        store.set("lastPage", Value::Null).expect("set");
        assert_eq!(store.get_or("lastPage", json!("browser")), Value::Null);
        assert_eq!(store.get_or("missing", json!("browser")), json!("browser"));
    }

    #[test]
    fn concurrent_sets_all_reach_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("user-data.json");

        for round in 0..20 {
            let store = KvStore::open(&path);
            std::thread::scope(|scope| {
                for i in 0..8 {
                    let store = &store;
                    scope.spawn(move || {
                        store
                            .set(&format!("round{round}.k{i}"), json!(i))
                            .expect("concurrent set");
                    });
                }
            });
            drop(store);

            let reopened = KvStore::open(&path);
            for i in 0..8 {
                assert_eq!(reopened.get(&format!("round{round}.k{i}")), Some(json!(i)));
            }
        }

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn wrong_shape_reads_default() {
        let (_dir, store) = scratch();
        store.set("winPosition", json!("left")).expect("set");
        assert_eq!(store.get_as::<Option<(i32, i32)>>("winPosition", None), None);
    }
}

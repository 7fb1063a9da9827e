//! Local answer cache: a durable per-student key/value store.
//!
//! Holds in-progress answers, question-structure snapshots and titles until
//! the final submission moves the authoritative copy server-side. Backed by a
//! single JSON file, write-through on every mutation, so values survive a
//! process restart without any network access.
//!
//! Failure mode is deliberate: every read/write error is logged and treated
//! as "value absent". An editing session degrades to empty answers, it never
//! crashes on cache I/O. Single writer per cache path assumed; two sessions
//! on the same path are out of scope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

pub struct LocalCache {
  path: PathBuf,
  map: Mutex<HashMap<String, String>>,
}

impl LocalCache {
  /// Open (or create) the cache at `path`. An unreadable or corrupt file is
  /// logged and replaced by an empty cache on the next write.
  pub fn open(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref().to_path_buf();
    let map = match std::fs::read_to_string(&path) {
      Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
        Ok(m) => m,
        Err(e) => {
          warn!(target: "sync", path = %path.display(), error = %e, "Cache file corrupt; starting empty");
          HashMap::new()
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
      Err(e) => {
        warn!(target: "sync", path = %path.display(), error = %e, "Cache file unreadable; starting empty");
        HashMap::new()
      }
    };
    debug!(target: "sync", path = %path.display(), entries = map.len(), "Local cache opened");
    LocalCache { path, map: Mutex::new(map) }
  }

  pub fn put(&self, key: &str, value: &str) {
    let mut map = self.map.lock().expect("cache lock");
    map.insert(key.to_string(), value.to_string());
    self.persist(&map);
  }

  pub fn get(&self, key: &str) -> Option<String> {
    self.map.lock().expect("cache lock").get(key).cloned()
  }

  pub fn remove(&self, key: &str) {
    let mut map = self.map.lock().expect("cache lock");
    map.remove(key);
    self.persist(&map);
  }

  /// Snapshot of all entries. Iteration order is unspecified; callers that
  /// need determinism must sort or group by key themselves.
  pub fn entries(&self) -> Vec<(String, String)> {
    self
      .map
      .lock()
      .expect("cache lock")
      .iter()
      .map(|(k, v)| (k.clone(), v.clone()))
      .collect()
  }

  pub fn clear(&self) {
    let mut map = self.map.lock().expect("cache lock");
    map.clear();
    self.persist(&map);
  }

  fn persist(&self, map: &HashMap<String, String>) {
    let raw = match serde_json::to_string(map) {
      Ok(r) => r,
      Err(e) => {
        warn!(target: "sync", error = %e, "Cache serialize failed; keeping in-memory state");
        return;
      }
    };
    if let Err(e) = std::fs::write(&self.path, raw) {
      warn!(target: "sync", path = %self.path.display(), error = %e, "Cache write failed; keeping in-memory state");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn values_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cache.json");
    {
      let cache = LocalCache::open(&path);
      cache.put("answer::a1::s1::q1", "<p>Hello</p>");
      cache.put("title::a1::s1", "Modul 1");
    }
    let cache = LocalCache::open(&path);
    assert_eq!(cache.get("answer::a1::s1::q1").as_deref(), Some("<p>Hello</p>"));
    assert_eq!(cache.entries().len(), 2);
  }

  #[test]
  fn remove_and_clear() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = LocalCache::open(dir.path().join("cache.json"));
    cache.put("k", "v");
    cache.remove("k");
    assert_eq!(cache.get("k"), None);
    cache.put("a", "1");
    cache.clear();
    assert!(cache.entries().is_empty());
  }

  #[test]
  fn corrupt_file_degrades_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "not json at all").expect("write");
    let cache = LocalCache::open(&path);
    assert_eq!(cache.get("anything"), None);
    // still writable afterwards
    cache.put("k", "v");
    assert_eq!(cache.get("k").as_deref(), Some("v"));
  }
}

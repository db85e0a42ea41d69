/// Score store: persists the high score across runs.
///
/// ## File format:
///   Key-value lines, one entry per line: `highScore=120`.
///   Values are textual integers. Unknown keys are kept on rewrite.
///
/// The file lives in the data directory (see `data_dir`). When that
/// cannot be used the game falls back to `MemoryScoreStore` and the
/// high score simply resets on the next run.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

pub const HIGH_SCORE_KEY: &str = "highScore";
const SCORE_FILE: &str = "scores.dat";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("stored value for `{key}` is not a number: {value:?}")]
    Parse { key: String, value: String },
}

/// Scoped key-value store of non-negative integers.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Result<Option<u32>, StoreError>;
    fn set(&mut self, key: &str, value: u32) -> Result<(), StoreError>;
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Directory for the score file and the log.
pub fn data_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs like /usr/games/ won't be)
            let test_path = parent.join(".write_test_snakemania");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/snakemania) for system installs
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/snakemania");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// File-backed store
// ══════════════════════════════════════════════════════════════

pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileScoreStore { path: path.into() }
    }

    /// Store at `<data_dir>/scores.dat`. Fails when the directory cannot be created.
    pub fn open_default() -> Result<Self, StoreError> {
        let dir = data_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(FileScoreStore::new(dir.join(SCORE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(parse_entries(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }
}

impl ScoreStore for FileScoreStore {
    fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        let entries = self.read_entries()?;
        match entries.into_iter().find(|(k, _)| k == key) {
            Some((_, value)) => match value.parse() {
                Ok(n) => Ok(Some(n)),
                Err(_) => Err(StoreError::Parse { key: key.to_string(), value }),
            },
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        // A corrupt or unreadable file is replaced rather than blocking the write.
        let mut entries = self.read_entries().unwrap_or_default();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        // Replace atomically: write beside the target, then rename over it.
        let tmp = self.path.with_extension("dat.tmp");
        std::fs::write(&tmp, serialize(&entries))?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("wrote {}={} to {}", key, value, self.path.display());
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// In-memory store (degraded mode)
// ══════════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryScoreStore {
    entries: HashMap<String, u32>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        MemoryScoreStore::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self, key: &str) -> Result<Option<u32>, StoreError> {
        Ok(self.entries.get(key).copied())
    }

    fn set(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// High score helpers
// ══════════════════════════════════════════════════════════════

/// Read the high score once at startup. Absent or unreadable → 0.
pub fn load_high_score(store: &dyn ScoreStore) -> u32 {
    match store.get(HIGH_SCORE_KEY) {
        Ok(Some(n)) => n,
        Ok(None) => 0,
        Err(e) => {
            warn!("high score unavailable, starting from 0: {e}");
            0
        }
    }
}

/// Write a new high score. Failures are logged and reported, never fatal.
pub fn persist_high_score(store: &mut dyn ScoreStore, score: u32) -> bool {
    match store.set(HIGH_SCORE_KEY, score) {
        Ok(()) => true,
        Err(e) => {
            warn!("could not persist high score {score}: {e}");
            false
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Serialization
// ══════════════════════════════════════════════════════════════

fn parse_entries(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let (k, v) = line.split_once('=')?;
            let k = k.trim();
            if k.is_empty() { return None; }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

fn serialize(entries: &[(String, String)]) -> String {
    let mut out = String::with_capacity(64);
    for (k, v) in entries {
        out.push_str(&format!("{}={}\n", k, v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snakemania-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_file_means_zero() {
        let store = FileScoreStore::new(temp_path("missing.dat"));
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap(), None);
        assert_eq!(load_high_score(&store), 0);
    }

    #[test]
    fn set_then_get() {
        let path = temp_path("roundtrip.dat");
        let mut store = FileScoreStore::new(&path);
        assert!(persist_high_score(&mut store, 120));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "highScore=120\n");

        let reopened = FileScoreStore::new(&path);
        assert_eq!(load_high_score(&reopened), 120);
    }

    #[test]
    fn overwrite_keeps_other_keys() {
        let path = temp_path("other_keys.dat");
        std::fs::write(&path, "theme=dark\nhighScore=40\n").unwrap();
        let mut store = FileScoreStore::new(&path);
        store.set(HIGH_SCORE_KEY, 70).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "theme=dark\nhighScore=70\n");
    }

    #[test]
    fn garbage_value_is_treated_as_absent() {
        let path = temp_path("garbage.dat");
        std::fs::write(&path, "highScore=lots\n").unwrap();
        let store = FileScoreStore::new(&path);
        assert!(matches!(store.get(HIGH_SCORE_KEY), Err(StoreError::Parse { .. })));
        assert_eq!(load_high_score(&store), 0);
    }

    #[test]
    fn negative_value_is_rejected() {
        let path = temp_path("negative.dat");
        std::fs::write(&path, "highScore=-5\n").unwrap();
        assert_eq!(load_high_score(&FileScoreStore::new(&path)), 0);
    }

    #[test]
    fn unwritable_location_degrades() {
        let dir = temp_path("not_a_dir");
        std::fs::write(&dir, "").unwrap();
        // Parent of the score file is a regular file, so the write fails.
        let mut store = FileScoreStore::new(dir.join("scores.dat"));
        assert!(!persist_high_score(&mut store, 10));
        assert_eq!(load_high_score(&store), 0);
    }

    #[test]
    fn rewrite_leaves_no_temp_file() {
        let path = temp_path("atomic.dat");
        let mut store = FileScoreStore::new(&path);
        store.set(HIGH_SCORE_KEY, 10).unwrap();
        store.set(HIGH_SCORE_KEY, 20).unwrap();
        assert!(!path.with_extension("dat.tmp").exists());
        assert_eq!(load_high_score(&store), 20);
    }

    #[test]
    fn stale_temp_file_does_not_shadow_scores() {
        let path = temp_path("stale.dat");
        std::fs::write(&path, "highScore=50\n").unwrap();
        std::fs::write(path.with_extension("dat.tmp"), "highScore=9\n").unwrap();
        let mut store = FileScoreStore::new(&path);
        assert_eq!(load_high_score(&store), 50);
        store.set(HIGH_SCORE_KEY, 60).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "highScore=60\n");
    }

    #[test]
    fn io_error_names_its_cause() {
        let err = StoreError::from(io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"));
        assert_eq!(err.to_string(), "read-only volume");
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryScoreStore::new();
        assert_eq!(load_high_score(&store), 0);
        assert!(persist_high_score(&mut store, 30));
        assert_eq!(load_high_score(&store), 30);
    }
}

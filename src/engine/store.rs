//! Key-value persistence for game snapshots.
//!
//! Engines never touch storage themselves; callers save the state returned by a
//! transition under the game's key and load it back on the next run.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::error::EngineError;
use crate::engine::history::{unix_now, GameHistory};
use crate::engine::models::GameKind;
use crate::engine::plugin::GamePlugin;
use crate::engine::stats::PlayerStats;
use crate::games::GameRegistry;

pub const STATS_KEY: &str = "scoreboard-hub-stats";
pub const HISTORY_KEY: &str = "scoreboard-game-history";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("snapshot under {key} could not be (de)serialized: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot under {key} is not a valid game: {source}")]
    Invalid {
        key: String,
        #[source]
        source: EngineError,
    },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait KeyValueStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>>;
    fn save(&mut self, key: &str, snapshot: &str) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
    fn keys(&self) -> StoreResult<Vec<String>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, snapshot: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), snapshot.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// One `<key>.json` file per key inside `dir`. The directory is created on the
/// first save.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!(key, bytes = content.len(), "loaded snapshot");
                Ok(Some(content))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, snapshot: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(&path, snapshot).map_err(io_err)?;
        tracing::debug!(key, bytes = snapshot.len(), path = %path.display(), "saved snapshot");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => {
                return Err(StoreError::Io {
                    key: self.dir.display().to_string(),
                    source,
                })
            }
        };
        let mut keys: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let path = e.path();
                if path.extension().map(|ext| ext == "json").unwrap_or(false) {
                    path.file_stem().and_then(|s| s.to_str()).map(String::from)
                } else {
                    None
                }
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// Typed snapshot access on top of any [`KeyValueStore`].
pub struct SnapshotStore<'a, K: KeyValueStore + ?Sized> {
    inner: &'a mut K,
}

impl<'a, K: KeyValueStore + ?Sized> SnapshotStore<'a, K> {
    pub fn new(inner: &'a mut K) -> Self {
        Self { inner }
    }

    pub fn load_state<S: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<S>> {
        match self.inner.load(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Serde {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Load a game snapshot through its plugin, so a state that fails the
    /// plugin's checks never reaches a transition.
    pub fn load_game<P: GamePlugin>(&self, plugin: &P, key: &str) -> StoreResult<Option<P::State>> {
        let Some(snapshot) = self.load_state::<serde_json::Value>(key)? else {
            return Ok(None);
        };
        plugin
            .decode_state(&snapshot)
            .map(Some)
            .map_err(|source| StoreError::Invalid {
                key: key.to_string(),
                source,
            })
    }

    pub fn save_state<S: Serialize>(&mut self, key: &str, state: &S) -> StoreResult<()> {
        let raw = serde_json::to_string(state).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.inner.save(key, &raw)
    }

    /// Reset a game to its empty, not-yet-configured state.
    pub fn clear(&mut self, key: &str) -> StoreResult<()> {
        self.inner.remove(key)
    }

    /// Stats never fail to load: a corrupt blob is logged and replaced.
    pub fn load_stats(&self) -> PlayerStats {
        match self.load_state::<PlayerStats>(STATS_KEY) {
            Ok(Some(stats)) => stats,
            Ok(None) => PlayerStats::default(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable player stats");
                PlayerStats::default()
            }
        }
    }

    pub fn save_stats(&mut self, stats: &PlayerStats) -> StoreResult<()> {
        self.save_state(STATS_KEY, stats)
    }

    /// Same recovery rule as [`load_stats`](Self::load_stats).
    pub fn load_history(&self) -> GameHistory {
        match self.load_state::<GameHistory>(HISTORY_KEY) {
            Ok(Some(history)) => history,
            Ok(None) => GameHistory::default(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable game history");
                GameHistory::default()
            }
        }
    }

    pub fn save_history(&mut self, history: &GameHistory) -> StoreResult<()> {
        self.save_state(HISTORY_KEY, history)
    }
}

/// Everything a store holds, in portable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(default)]
    pub games: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub stats: Option<PlayerStats>,
    #[serde(default)]
    pub history: Option<GameHistory>,
    #[serde(default)]
    pub exported_at: u64,
}

pub fn export_all<K: KeyValueStore + ?Sized>(store: &mut K) -> StoreResult<String> {
    let mut games = BTreeMap::new();
    for kind in GameKind::ALL {
        let key = kind.storage_key();
        if let Some(raw) = store.load(key)? {
            let value = serde_json::from_str(&raw).map_err(|source| StoreError::Serde {
                key: key.to_string(),
                source,
            })?;
            games.insert(key.to_string(), value);
        }
    }
    let snapshots = SnapshotStore::new(store);
    let stats = snapshots.load_state::<PlayerStats>(STATS_KEY)?;
    let history = snapshots.load_state::<GameHistory>(HISTORY_KEY)?;
    let bundle = ExportBundle {
        games,
        stats,
        history,
        exported_at: unix_now(),
    };
    serde_json::to_string_pretty(&bundle).map_err(|source| StoreError::Serde {
        key: "export".into(),
        source,
    })
}

/// Write every game, the stats blob and the history from an export. The bundle
/// is parsed in full and each game snapshot is checked by its plugin before
/// anything is written. Returns how many game snapshots were restored.
pub fn import_all<K: KeyValueStore + ?Sized>(
    store: &mut K,
    registry: &GameRegistry,
    json: &str,
) -> StoreResult<usize> {
    let bundle: ExportBundle = serde_json::from_str(json).map_err(|source| StoreError::Serde {
        key: "import".into(),
        source,
    })?;
    for (key, snapshot) in &bundle.games {
        let game = GameKind::ALL
            .into_iter()
            .find(|k| k.storage_key() == key.as_str())
            .and_then(|k| registry.get(k.game_id()))
            .ok_or_else(|| StoreError::InvalidKey(key.clone()))?;
        game.check_snapshot(snapshot).map_err(|source| StoreError::Invalid {
            key: key.clone(),
            source,
        })?;
    }
    let mut snapshots = SnapshotStore::new(store);
    for (key, value) in &bundle.games {
        snapshots.save_state(key, value)?;
    }
    if let Some(stats) = &bundle.stats {
        snapshots.save_stats(stats)?;
    }
    if let Some(history) = &bundle.history {
        snapshots.save_history(history)?;
    }
    tracing::info!(games = bundle.games.len(), "imported snapshots");
    Ok(bundle.games.len())
}

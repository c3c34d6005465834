//! Saved game states and the stores that hold them.
//!
//! A [`SavedState`] is the seed of a world: terrain plus a list of entity
//! specs the [`EntityFactory`](crate::collaborators::EntityFactory) turns
//! into game objects. Two [`PersistenceStore`] implementations are provided:
//!
//! - [`MemoryStore`] keeps saves in a map, for tests and tools.
//! - [`JsonFileStore`] writes one `<key>.json` per save into a directory,
//!   together with a BLAKE3 digest of the state that is verified on load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collaborators::PersistenceStore;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Saved state
// ---------------------------------------------------------------------------

/// Tile grid of the map, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    pub width: u32,
    pub height: u32,
    /// One tile code per cell; `width * height` entries.
    pub tiles: Vec<u8>,
}

impl Terrain {
    /// A terrain where every tile has the same code.
    pub fn flat(width: u32, height: u32, tile: u8) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width as usize * height as usize],
        }
    }

    /// Tile code at `(x, y)`.
    pub fn tile(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Map position in tile units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One entity to create at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Entity kind, e.g. `"city"`.
    pub kind: String,
    pub position: Position,
    /// Kind-specific data interpreted by the factory.
    #[serde(default)]
    pub details: serde_json::Value,
}

/// A named game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub terrain: Terrain,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory [`PersistenceStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saves: HashMap<String, SavedState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, state: SavedState) -> Self {
        self.saves.insert(key.to_owned(), state);
        self
    }

    /// Number of saves.
    pub fn len(&self) -> usize {
        self.saves.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }
}

impl PersistenceStore for MemoryStore {
    fn has(&self, key: &str) -> bool {
        self.saves.contains_key(key)
    }

    fn load(&self, key: &str) -> Result<SavedState, EngineError> {
        self.saves
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::MissingResource {
                key: key.to_owned(),
                details: "no save with this name in memory store".to_owned(),
            })
    }

    fn save(&mut self, key: &str, state: &SavedState) -> Result<(), EngineError> {
        self.saves.insert(key.to_owned(), state.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// On-disk layout of a save file.
#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    /// BLAKE3 hex digest of the JSON-serialized `state`.
    hash: String,
    state: SavedState,
}

/// Compute the BLAKE3 hex digest of a saved state.
///
/// Load recomputes the digest from the parsed state, so parsing must
/// reproduce every `f64` bit for bit (serde_json's `float_roundtrip`).
fn compute_hash(state: &SavedState) -> Result<String, EngineError> {
    let json_bytes = serde_json::to_vec(state)?;
    Ok(blake3::hash(&json_bytes).to_hex().to_string())
}

/// Directory-backed [`PersistenceStore`], one JSON file per save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a save directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The save directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path of a save. Keys are restricted to ASCII letters, digits,
    /// `-` and `_` so they cannot escape the directory.
    fn path_for(&self, key: &str) -> Result<PathBuf, EngineError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(EngineError::Configuration(format!(
                "invalid save key {key:?}: use letters, digits, '-' or '_'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl PersistenceStore for JsonFileStore {
    fn has(&self, key: &str) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn load(&self, key: &str) -> Result<SavedState, EngineError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(EngineError::MissingResource {
                key: key.to_owned(),
                details: format!("{} does not exist", path.display()),
            });
        }

        let bytes = std::fs::read(&path)?;
        let file: SaveFile = serde_json::from_slice(&bytes)?;
        let actual = compute_hash(&file.state)?;
        if actual != file.hash {
            return Err(EngineError::CorruptSave {
                key: key.to_owned(),
                expected: file.hash,
                actual,
            });
        }

        tracing::debug!(key, path = %path.display(), entities = file.state.entities.len(), "save loaded");
        Ok(file.state)
    }

    fn save(&mut self, key: &str, state: &SavedState) -> Result<(), EngineError> {
        let path = self.path_for(key)?;
        let file = SaveFile {
            hash: compute_hash(state)?,
            state: state.clone(),
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&file)?)?;
        tracing::debug!(key, path = %path.display(), "save written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scratch_dir(label: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "tradewind-{label}-{}-{n}",
            std::process::id()
        ))
    }

    fn sample_state() -> SavedState {
        SavedState {
            terrain: Terrain::flat(4, 3, 1),
            entities: vec![
                EntitySpec {
                    kind: "city".to_owned(),
                    position: Position { x: 1.0, y: 2.0 },
                    details: serde_json::json!({"name": "Lisbon", "population": 1200}),
                },
                EntitySpec {
                    kind: "merchant".to_owned(),
                    position: Position { x: 3.0, y: 0.0 },
                    details: serde_json::Value::Null,
                },
            ],
        }
    }

    // -- terrain ------------------------------------------------------------

    #[test]
    fn terrain_tile_lookup() {
        let mut terrain = Terrain::flat(3, 2, 0);
        terrain.tiles[4] = 7;
        assert_eq!(terrain.tile(1, 1), Some(7));
        assert_eq!(terrain.tile(3, 0), None);
        assert_eq!(terrain.tile(0, 2), None);
    }

    // -- memory store -------------------------------------------------------

    #[test]
    fn memory_store_missing_key_is_reported() {
        let store = MemoryStore::new();
        assert!(!store.has("debug"));
        let err = store.load("debug").unwrap_err();
        assert!(err.is_missing_resource());
    }

    #[test]
    fn memory_store_save_then_load() {
        let mut store = MemoryStore::new();
        store.save("autosave", &sample_state()).unwrap();
        assert!(store.has("autosave"));
        assert_eq!(store.load("autosave").unwrap(), sample_state());
    }

    // -- json file store ----------------------------------------------------

    #[test]
    fn json_store_persists_across_instances() {
        let dir = scratch_dir("persist");
        let mut store = JsonFileStore::open(&dir).unwrap();
        store.save("campaign-1", &sample_state()).unwrap();

        let reopened = JsonFileStore::open(&dir).unwrap();
        assert!(reopened.has("campaign-1"));
        assert_eq!(reopened.load("campaign-1").unwrap(), sample_state());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn json_store_detects_tampering() {
        let dir = scratch_dir("tamper");
        let mut store = JsonFileStore::open(&dir).unwrap();
        store.save("debug", &sample_state()).unwrap();

        let path = dir.join("debug.json");
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("Lisbon", "Porto")).unwrap();

        let err = store.load("debug").unwrap_err();
        assert!(matches!(err, EngineError::CorruptSave { ref key, .. } if key == "debug"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn json_store_missing_and_invalid_keys() {
        let dir = scratch_dir("keys");
        let store = JsonFileStore::open(&dir).unwrap();

        assert!(!store.has("nothing"));
        assert!(store.load("nothing").unwrap_err().is_missing_resource());

        assert!(!store.has("../escape"));
        assert!(store.load("../escape").unwrap_err().is_configuration());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn json_store_reloads_inexact_floats() {
        let dir = scratch_dir("floats");
        let mut store = JsonFileStore::open(&dir).unwrap();

        let entities = (0..500)
            .map(|i| {
                let x = 0.1 + 0.37 * f64::from(i);
                EntitySpec {
                    kind: "merchant".to_owned(),
                    position: Position { x, y: x / 7.0 },
                    details: serde_json::json!({ "price": x * 1.03 }),
                }
            })
            .collect();
        let state = SavedState {
            terrain: Terrain::flat(2, 2, 0),
            entities,
        };
        store.save("voyage", &state).unwrap();

        let loaded = store.load("voyage").unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.entities[0].position.y, 0.1 / 7.0);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn hash_is_stable_for_equal_states() {
        let a = compute_hash(&sample_state()).unwrap();
        let b = compute_hash(&sample_state()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}

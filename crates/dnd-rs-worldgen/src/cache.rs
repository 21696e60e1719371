//! Persistent world cache keyed by `(seed, width, height)`.
//!
//! Worlds are stored as [`codec`](crate::codec) blobs. [`LevelDbCache`] keeps
//! them in a LevelDB database under a caller-chosen directory so they survive
//! restarts; [`MemoryCache`] keeps them in a map for tests and tools.
//! Entries never expire: they go away only through [`WorldCache::remove`] or
//! by deleting the database.

use std::collections::HashMap;
use std::path::Path;

use rusty_leveldb::DB;

use crate::codec::{decode_world, encode_world};
use crate::error::CacheError;
use crate::world::World;

/// LevelDB key tag for a cached world blob.
const TAG_WORLD: u8 = 0x57;

/// Identifies one cached world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub seed: i64,
    pub width: usize,
    pub height: usize,
}

impl CacheKey {
    pub fn new(seed: i64, width: usize, height: usize) -> Self {
        Self {
            seed,
            width,
            height,
        }
    }

    pub fn for_world(world: &World) -> Self {
        Self::new(world.seed, world.width, world.height)
    }

    /// Storage key: `[seed:i64_le][width:u32_le][height:u32_le][tag]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(17);
        key.extend_from_slice(&self.seed.to_le_bytes());
        key.extend_from_slice(&(self.width as u32).to_le_bytes());
        key.extend_from_slice(&(self.height as u32).to_le_bytes());
        key.push(TAG_WORLD);
        key
    }
}

/// Storage for generated worlds.
///
/// Single-process, synchronous use only. `get` returns `Ok(None)` on a miss
/// and an error when an entry exists but cannot be read back.
pub trait WorldCache {
    fn get(&mut self, key: &CacheKey) -> Result<Option<World>, CacheError>;

    /// Store a world, replacing any existing entry for the key.
    fn put(&mut self, key: &CacheKey, world: &World) -> Result<(), CacheError>;

    fn remove(&mut self, key: &CacheKey) -> Result<(), CacheError>;
}

// ─── LevelDB ────────────────────────────────────────────────────────────────

/// Wraps a `rusty_leveldb::DB` for world persistence.
pub struct LevelDbCache {
    db: DB,
}

impl LevelDbCache {
    /// Open or create a LevelDB database at the given path.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let opts = rusty_leveldb::Options {
            create_if_missing: true,
            ..rusty_leveldb::Options::default()
        };

        let db = DB::open(path, opts).map_err(|e| CacheError::Db(format!("open: {e}")))?;
        Ok(Self { db })
    }

    /// Flush pending writes to disk.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::Db(format!("flush: {e}")))
    }
}

impl WorldCache for LevelDbCache {
    fn get(&mut self, key: &CacheKey) -> Result<Option<World>, CacheError> {
        match self.db.get(&key.to_bytes()) {
            Some(data) => Ok(Some(decode_world(&data)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, key: &CacheKey, world: &World) -> Result<(), CacheError> {
        // Encode fully before touching the database.
        let data = encode_world(world)?;
        self.db
            .put(&key.to_bytes(), &data)
            .map_err(|e| CacheError::Db(format!("put world: {e}")))?;
        self.flush()
    }

    fn remove(&mut self, key: &CacheKey) -> Result<(), CacheError> {
        self.db
            .delete(&key.to_bytes())
            .map_err(|e| CacheError::Db(format!("delete world: {e}")))?;
        self.flush()
    }
}

// ─── In-memory ──────────────────────────────────────────────────────────────

/// Non-persistent cache. Stores encoded blobs so it behaves like the
/// on-disk cache, including decode failures.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<CacheKey, Vec<u8>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store raw bytes under a key, bypassing encoding.
    pub fn put_raw(&mut self, key: CacheKey, data: Vec<u8>) {
        self.entries.insert(key, data);
    }
}

impl WorldCache for MemoryCache {
    fn get(&mut self, key: &CacheKey) -> Result<Option<World>, CacheError> {
        match self.entries.get(key) {
            Some(data) => Ok(Some(decode_world(data)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, key: &CacheKey, world: &World) -> Result<(), CacheError> {
        let data = encode_world(world)?;
        self.entries.insert(*key, data);
        Ok(())
    }

    fn remove(&mut self, key: &CacheKey) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A cache that stores nothing; every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl WorldCache for NoCache {
    fn get(&mut self, _key: &CacheKey) -> Result<Option<World>, CacheError> {
        Ok(None)
    }

    fn put(&mut self, _key: &CacheKey, _world: &World) -> Result<(), CacheError> {
        Ok(())
    }

    fn remove(&mut self, _key: &CacheKey) -> Result<(), CacheError> {
        Ok(())
    }
}

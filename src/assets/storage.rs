//! Asset cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;

/// Bytes fetched from the network for a single asset URL.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

/// A cached (request URL, response bytes) pair within one generation.
#[derive(Debug, Clone)]
pub struct CachedAsset {
  pub url: String,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
  pub fetched_at: DateTime<Utc>,
}

/// Per-generation bookkeeping, surfaced in the cache status view.
#[derive(Debug, Clone)]
pub struct GenerationInfo {
  pub name: String,
  pub entry_count: u64,
  pub total_bytes: u64,
  pub installed_at: DateTime<Utc>,
  pub activated: bool,
}

/// Trait for asset cache storage backends.
pub trait AssetStore: Send + Sync {
  /// Store a complete generation. The write is transactional: the
  /// generation appears with every asset or not at all.
  fn install_generation(&self, generation: &str, assets: &[(String, FetchedAsset)])
    -> Result<()>;

  fn generation_exists(&self, generation: &str) -> Result<bool>;

  /// Exact-URL lookup within a generation.
  fn get(&self, generation: &str, url: &str) -> Result<Option<CachedAsset>>;

  fn list_generations(&self) -> Result<Vec<GenerationInfo>>;

  fn delete_generation(&self, generation: &str) -> Result<()>;

  fn mark_activated(&self, generation: &str) -> Result<()>;
}

/// SQLite-backed asset store.
pub struct SqliteAssetStore {
  conn: Mutex<Connection>,
}

impl SqliteAssetStore {
  /// Open or create the store at the default location.
  pub fn open_default() -> Result<Self> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open asset cache at {}: {}", path.display(), e))?;

    Self::from_connection(conn)
  }

  /// Open or create the store at an explicit path.
  #[allow(dead_code)]
  pub fn open(path: &Path) -> Result<Self> {
    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open asset cache at {}: {}", path.display(), e))?;
    Self::from_connection(conn)
  }

  /// In-memory store, used by tests.
  pub fn in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  fn default_path() -> Result<std::path::PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("wayfarer").join("assets.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(ASSET_SCHEMA)
      .map_err(|e| eyre!("Failed to run asset cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for the asset cache tables.
const ASSET_SCHEMA: &str = r#"
-- One row per cache generation
CREATE TABLE IF NOT EXISTS asset_generations (
    name TEXT PRIMARY KEY,
    installed_at TEXT NOT NULL DEFAULT (datetime('now')),
    activated_at TEXT
);

-- Cached assets, keyed by generation and hashed URL
CREATE TABLE IF NOT EXISTS asset_cache (
    generation TEXT NOT NULL,
    url_hash TEXT NOT NULL,
    url TEXT NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    fetched_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, url_hash)
);

CREATE INDEX IF NOT EXISTS idx_asset_cache_generation ON asset_cache(generation);
"#;

/// SHA256 hash for stable, fixed-length URL keys.
fn url_hash(url: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(url.as_bytes());
  hex::encode(hasher.finalize())
}

impl AssetStore for SqliteAssetStore {
  fn install_generation(
    &self,
    generation: &str,
    assets: &[(String, FetchedAsset)],
  ) -> Result<()> {
    let mut conn = self.lock()?;

    // A dropped transaction rolls back, so a failed insert leaves no
    // trace of the generation
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "INSERT INTO asset_generations (name) VALUES (?)",
      params![generation],
    )
    .map_err(|e| eyre!("Failed to record generation {}: {}", generation, e))?;

    for (url, asset) in assets {
      tx.execute(
        "INSERT OR REPLACE INTO asset_cache (generation, url_hash, url, content_type, body)
         VALUES (?, ?, ?, ?, ?)",
        params![
          generation,
          url_hash(url),
          url,
          asset.content_type,
          asset.body
        ],
      )
      .map_err(|e| eyre!("Failed to store asset {}: {}", url, e))?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit generation {}: {}", generation, e))?;

    Ok(())
  }

  fn generation_exists(&self, generation: &str) -> Result<bool> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT 1 FROM asset_generations WHERE name = ?")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let exists = stmt
      .exists(params![generation])
      .map_err(|e| eyre!("Failed to query generation: {}", e))?;

    Ok(exists)
  }

  fn get(&self, generation: &str, url: &str) -> Result<Option<CachedAsset>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare(
        "SELECT url, content_type, body, fetched_at FROM asset_cache
         WHERE generation = ? AND url_hash = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let row: Option<(String, Option<String>, Vec<u8>, String)> = stmt
      .query_row(params![generation, url_hash(url)], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
      })
      .ok();

    match row {
      Some((url, content_type, body, fetched_at_str)) => {
        let fetched_at = parse_datetime(&fetched_at_str)?;
        Ok(Some(CachedAsset {
          url,
          content_type,
          body,
          fetched_at,
        }))
      }
      None => Ok(None),
    }
  }

  fn list_generations(&self) -> Result<Vec<GenerationInfo>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare(
        "SELECT g.name, g.installed_at, g.activated_at,
                COUNT(a.url_hash), COALESCE(SUM(LENGTH(a.body)), 0)
         FROM asset_generations g
         LEFT JOIN asset_cache a ON a.generation = g.name
         GROUP BY g.name
         ORDER BY g.installed_at",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let rows: Vec<(String, String, Option<String>, u64, u64)> = stmt
      .query_map([], |row| {
        Ok((
          row.get(0)?,
          row.get(1)?,
          row.get(2)?,
          row.get(3)?,
          row.get(4)?,
        ))
      })
      .map_err(|e| eyre!("Failed to query generations: {}", e))?
      .filter_map(|r| r.ok())
      .collect();

    let mut generations = Vec::with_capacity(rows.len());
    for (name, installed_at_str, activated_at, entry_count, total_bytes) in rows {
      generations.push(GenerationInfo {
        name,
        entry_count,
        total_bytes,
        installed_at: parse_datetime(&installed_at_str)?,
        activated: activated_at.is_some(),
      });
    }

    Ok(generations)
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    let mut conn = self.lock()?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "DELETE FROM asset_cache WHERE generation = ?",
      params![generation],
    )
    .map_err(|e| eyre!("Failed to delete assets of {}: {}", generation, e))?;

    tx.execute(
      "DELETE FROM asset_generations WHERE name = ?",
      params![generation],
    )
    .map_err(|e| eyre!("Failed to delete generation {}: {}", generation, e))?;

    tx.commit()
      .map_err(|e| eyre!("Failed to commit purge of {}: {}", generation, e))?;

    Ok(())
  }

  fn mark_activated(&self, generation: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "UPDATE asset_generations SET activated_at = datetime('now') WHERE name = ?",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to mark {} active: {}", generation, e))?;

    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

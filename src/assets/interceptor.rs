//! Cache orchestration: install, activate, serve.

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::storage::{AssetStore, CachedAsset, FetchedAsset, GenerationInfo};

/// Prefix of every cache generation name; the configured version string
/// is appended to form the full, version-qualified name.
const GENERATION_PREFIX: &str = "wayfarer-assets";

/// Result of an install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
  /// A new generation was populated with this many assets
  Installed { assets: usize },
  /// The generation for this version already exists; nothing was
  /// fetched. Manifest changes without a version bump land here.
  AlreadyInstalled,
}

/// Where a served asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
  Cache,
  Network,
}

/// An asset handed back to the caller by `serve`.
#[derive(Debug, Clone)]
pub struct ServedAsset {
  pub source: ServeSource,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

/// Snapshot for the cache status view.
#[derive(Debug, Clone)]
pub struct CacheStatus {
  pub current_generation: String,
  pub generations: Vec<GenerationInfo>,
}

/// The asset fetch chokepoint.
///
/// Every remote asset the client needs goes through `serve`, which
/// answers from the current cache generation when it can and from the
/// network otherwise. Only `install` ever writes assets; a miss in
/// `serve` is never back-filled, so storage stays bounded by the
/// manifest.
pub struct AssetInterceptor<S: AssetStore> {
  store: Arc<S>,
  generation: String,
  manifest: Vec<String>,
  skip_waiting: bool,
}

impl<S: AssetStore> AssetInterceptor<S> {
  pub fn new(store: Arc<S>, version: &str, manifest: Vec<String>, skip_waiting: bool) -> Self {
    Self {
      store,
      generation: format!("{}-{}", GENERATION_PREFIX, version),
      manifest,
      skip_waiting,
    }
  }

  /// The version-qualified name of the generation this interceptor serves.
  pub fn generation(&self) -> &str {
    &self.generation
  }

  /// Populate this interceptor's generation from the manifest.
  ///
  /// All manifest URLs are fetched together and stored in a single
  /// transaction: if any fetch fails, the whole population aborts and
  /// no generation appears. An existing generation is left untouched,
  /// which also means manifest edits alone never repopulate an install.
  ///
  /// With `skip_waiting`, a fresh install activates immediately instead
  /// of waiting for the next start.
  pub async fn install<F, Fut>(&self, fetch: F) -> Result<InstallOutcome>
  where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<FetchedAsset>>,
  {
    if self.store.generation_exists(&self.generation)? {
      return Ok(InstallOutcome::AlreadyInstalled);
    }

    let fetches = self.manifest.iter().cloned().map(|url| {
      let fut = fetch(url.clone());
      async move { fut.await.map(|asset| (url, asset)) }
    });

    let assets = futures::future::try_join_all(fetches).await?;
    self.store.install_generation(&self.generation, &assets)?;

    if self.skip_waiting {
      self.activate()?;
    }

    Ok(InstallOutcome::Installed {
      assets: assets.len(),
    })
  }

  /// Make this interceptor's generation the only one.
  ///
  /// Deletes every generation whose name differs from the current one
  /// and marks the current one active. Returns how many were purged.
  pub fn activate(&self) -> Result<u32> {
    let mut purged = 0;
    for info in self.store.list_generations()? {
      if info.name != self.generation {
        self.store.delete_generation(&info.name)?;
        purged += 1;
      }
    }

    self.store.mark_activated(&self.generation)?;
    Ok(purged)
  }

  /// Exact-URL lookup in the current generation.
  pub fn lookup(&self, url: &str) -> Result<Option<CachedAsset>> {
    self.store.get(&self.generation, url)
  }

  /// Serve an asset: cache hit if the URL is in the current generation
  /// (no revalidation), live fetch otherwise. The network result is not
  /// cached. A network failure propagates for the caller to log.
  pub async fn serve<F, Fut>(&self, url: &str, fetch: F) -> Result<ServedAsset>
  where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<FetchedAsset>>,
  {
    if let Some(cached) = self.lookup(url)? {
      debug!(url = %cached.url, fetched_at = %cached.fetched_at, "asset served from cache");
      return Ok(ServedAsset {
        source: ServeSource::Cache,
        content_type: cached.content_type,
        body: cached.body,
      });
    }

    let fetched = fetch(url.to_string()).await?;
    Ok(ServedAsset {
      source: ServeSource::Network,
      content_type: fetched.content_type,
      body: fetched.body,
    })
  }

  /// Snapshot of every stored generation for the status view.
  pub fn status(&self) -> Result<CacheStatus> {
    Ok(CacheStatus {
      current_generation: self.generation.clone(),
      generations: self.store.list_generations()?,
    })
  }
}

impl<S: AssetStore> Clone for AssetInterceptor<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      generation: self.generation.clone(),
      manifest: self.manifest.clone(),
      skip_waiting: self.skip_waiting,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::assets::storage::SqliteAssetStore;
  use color_eyre::eyre::eyre;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn shell_manifest() -> Vec<String> {
    vec![
      "/".to_string(),
      "/index.html".to_string(),
      "/static/js/bundle.js".to_string(),
    ]
  }

  fn store() -> Arc<SqliteAssetStore> {
    Arc::new(SqliteAssetStore::in_memory().unwrap())
  }

  async fn ok_fetch(url: String) -> Result<FetchedAsset> {
    Ok(FetchedAsset {
      content_type: Some("text/html".to_string()),
      body: format!("asset:{}", url).into_bytes(),
    })
  }

  async fn offline_fetch(_url: String) -> Result<FetchedAsset> {
    Err(eyre!("network unreachable"))
  }

  #[tokio::test]
  async fn test_install_populates_manifest() {
    let interceptor = AssetInterceptor::new(store(), "v1", shell_manifest(), false);

    let outcome = interceptor.install(ok_fetch).await.unwrap();
    assert_eq!(outcome, InstallOutcome::Installed { assets: 3 });

    let cached = interceptor.lookup("/index.html").unwrap().unwrap();
    assert_eq!(cached.body, b"asset:/index.html");
    assert_eq!(cached.content_type.as_deref(), Some("text/html"));
  }

  #[tokio::test]
  async fn test_install_is_all_or_nothing() {
    let interceptor = AssetInterceptor::new(store(), "v1", shell_manifest(), false);

    // One unreachable manifest URL aborts the whole population
    let result = interceptor
      .install(|url: String| async move {
        if url == "/static/js/bundle.js" {
          Err(eyre!("bundle unreachable"))
        } else {
          ok_fetch(url).await
        }
      })
      .await;

    assert!(result.is_err());
    assert!(interceptor.lookup("/").unwrap().is_none());
    assert!(interceptor.lookup("/index.html").unwrap().is_none());
  }

  #[tokio::test]
  async fn test_install_skips_existing_generation() {
    let store = store();
    let interceptor = AssetInterceptor::new(store.clone(), "v1", shell_manifest(), false);
    interceptor.install(ok_fetch).await.unwrap();

    // Same version, edited manifest: nothing is fetched again
    let edited = AssetInterceptor::new(
      store,
      "v1",
      vec!["/".to_string(), "/new-page.html".to_string()],
      false,
    );
    let fetch_count = AtomicUsize::new(0);
    let outcome = edited
      .install(|url: String| {
        fetch_count.fetch_add(1, Ordering::SeqCst);
        async move { ok_fetch(url).await }
      })
      .await
      .unwrap();

    assert_eq!(outcome, InstallOutcome::AlreadyInstalled);
    assert_eq!(fetch_count.load(Ordering::SeqCst), 0);
    assert!(edited.lookup("/new-page.html").unwrap().is_none());
  }

  #[tokio::test]
  async fn test_serve_cached_while_offline() {
    let interceptor = AssetInterceptor::new(store(), "v1", shell_manifest(), false);
    interceptor.install(ok_fetch).await.unwrap();

    let served = interceptor
      .serve("/index.html", offline_fetch)
      .await
      .unwrap();

    assert_eq!(served.source, ServeSource::Cache);
    assert_eq!(served.body, b"asset:/index.html");
  }

  #[tokio::test]
  async fn test_serve_miss_uses_network_without_caching() {
    let interceptor = AssetInterceptor::new(store(), "v1", shell_manifest(), false);
    interceptor.install(ok_fetch).await.unwrap();

    let served = interceptor
      .serve("/photos/lisbon.jpg", ok_fetch)
      .await
      .unwrap();
    assert_eq!(served.source, ServeSource::Network);

    // Still a miss: non-manifest assets are never cached
    assert!(interceptor.lookup("/photos/lisbon.jpg").unwrap().is_none());
    assert!(interceptor
      .serve("/photos/lisbon.jpg", offline_fetch)
      .await
      .is_err());
  }

  #[tokio::test]
  async fn test_serve_miss_offline_propagates_error() {
    let interceptor = AssetInterceptor::new(store(), "v1", shell_manifest(), false);

    let result = interceptor.serve("/index.html", offline_fetch).await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_activate_purges_other_generations() {
    let store = store();

    let v1 = AssetInterceptor::new(store.clone(), "v1", shell_manifest(), false);
    v1.install(ok_fetch).await.unwrap();
    v1.activate().unwrap();

    let v2 = AssetInterceptor::new(store.clone(), "v2", shell_manifest(), false);
    v2.install(ok_fetch).await.unwrap();

    // Both generations exist while v2 is waiting
    assert!(v1.lookup("/").unwrap().is_some());
    let before = v2.lookup("/").unwrap().unwrap();

    let purged = v2.activate().unwrap();
    assert_eq!(purged, 1);

    // v1 resources are gone; v2 lookups are unchanged by the purge
    assert!(v1.lookup("/").unwrap().is_none());
    let after = v2.lookup("/").unwrap().unwrap();
    assert_eq!(before.body, after.body);

    let status = v2.status().unwrap();
    assert_eq!(status.generations.len(), 1);
    assert_eq!(status.generations[0].name, v2.generation());
    assert!(status.generations[0].activated);
  }

  #[tokio::test]
  async fn test_skip_waiting_activates_on_install() {
    let store = store();

    let v1 = AssetInterceptor::new(store.clone(), "v1", shell_manifest(), false);
    v1.install(ok_fetch).await.unwrap();
    v1.activate().unwrap();

    let v2 = AssetInterceptor::new(store, "v2", shell_manifest(), true);
    v2.install(ok_fetch).await.unwrap();

    // v2 claimed immediately; v1 is already gone
    assert!(v1.lookup("/").unwrap().is_none());
    assert!(v2.lookup("/").unwrap().is_some());
  }
}

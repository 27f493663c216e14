//! Versioned offline cache for the community service's static assets.
//!
//! This module is the single chokepoint for asset fetches:
//! - Install populates one version-qualified generation from a fixed
//!   manifest, all-or-nothing
//! - Activate deletes every other generation, leaving one live
//! - Serve answers from the live generation by exact URL, falling back
//!   to the network without ever caching on miss

mod interceptor;
mod storage;

pub use interceptor::{AssetInterceptor, CacheStatus, InstallOutcome, ServeSource, ServedAsset};
pub use storage::{AssetStore, CachedAsset, FetchedAsset, GenerationInfo, SqliteAssetStore};

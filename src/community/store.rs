//! The document/file-store seam the feed interactions run against.

use async_trait::async_trait;
use color_eyre::Result;

use super::types::TravelResponse;

/// Async boundary over the community document and file store.
///
/// `CommunityClient` is the production implementation; tests drive the
/// interaction machinery with in-memory fakes. Like/unlike return the
/// authoritative updated document so callers never compute liker lists
/// themselves.
#[async_trait]
pub trait ResponseStore: Send + Sync {
  /// Fetch every shared response.
  async fn fetch_all(&self) -> Result<Vec<TravelResponse>>;

  /// Record a like by `user_id` and return the updated document.
  async fn like(&self, response_id: &str, user_id: &str) -> Result<TravelResponse>;

  /// Remove a like by `user_id` and return the updated document.
  async fn unlike(&self, response_id: &str, user_id: &str) -> Result<TravelResponse>;

  /// Delete a response document.
  async fn delete_response(&self, response_id: &str) -> Result<()>;

  /// Delete a stored file (response attachment).
  async fn delete_file(&self, file_id: &str) -> Result<()>;
}

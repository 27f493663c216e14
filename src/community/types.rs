use serde::{Deserialize, Serialize};

/// A community member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
}

/// An authenticated session: bearer token plus the account it belongs to
#[derive(Debug, Clone)]
pub struct Session {
  pub token: String,
  pub user: User,
}

/// A shared travel experience.
///
/// `likes` has set semantics: a user id appears at most once, and its
/// presence means that user has liked the response. Conversions from the
/// wire keep that invariant (see `api_types`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelResponse {
  pub id: String,
  pub user_id: String,
  pub user_name: String,
  /// Name of the place travelled to
  pub place: String,
  /// Free-form location detail (region, country)
  pub location: String,
  /// The experience writeup itself
  pub content: String,
  /// Ids of attached files (images) in the file store
  pub images: Vec<String>,
  /// Ids of users who liked this response
  pub likes: Vec<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl TravelResponse {
  /// Whether the given user has liked this response.
  pub fn is_liked_by(&self, user_id: &str) -> bool {
    self.likes.iter().any(|id| id == user_id)
  }

  pub fn like_count(&self) -> usize {
    self.likes.len()
  }

  /// Whether the given user wrote this response (and may delete it).
  pub fn is_authored_by(&self, user_id: &str) -> bool {
    self.user_id == user_id
  }
}

/// Fields the share form submits when creating a response
#[derive(Debug, Clone, Serialize)]
pub struct ResponseDraft {
  pub place: String,
  pub location: String,
  pub content: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn response_with_likes(likes: &[&str]) -> TravelResponse {
    TravelResponse {
      id: "r1".to_string(),
      user_id: "author".to_string(),
      user_name: "Ada".to_string(),
      place: "Kyoto".to_string(),
      location: "Japan".to_string(),
      content: "Temples and tea".to_string(),
      images: vec![],
      likes: likes.iter().map(|s| s.to_string()).collect(),
      created_at: "2025-01-01T00:00:00Z".to_string(),
      updated_at: "2025-01-01T00:00:00Z".to_string(),
    }
  }

  #[test]
  fn test_is_liked_by() {
    let response = response_with_likes(&["u1", "u2"]);
    assert!(response.is_liked_by("u1"));
    assert!(!response.is_liked_by("u3"));
    assert_eq!(response.like_count(), 2);
  }

  #[test]
  fn test_is_authored_by() {
    let response = response_with_likes(&[]);
    assert!(response.is_authored_by("author"));
    assert!(!response.is_authored_by("u1"));
  }
}

//! Serde-deserializable types matching the community service API.
//!
//! These types are separate from domain types to allow clean
//! deserialization while keeping domain types focused on application
//! needs. Conversion is the single place wire quirks are absorbed; in
//! particular the liker list is deduplicated here so the domain type can
//! rely on set semantics.

use serde::Deserialize;

use super::types::{Session, TravelResponse, User};

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
}

impl From<ApiUser> for User {
  fn from(api: ApiUser) -> Self {
    User {
      id: api.id,
      name: api.name,
      email: api.email,
    }
  }
}

/// Session created by the account endpoint
#[derive(Debug, Deserialize)]
pub struct ApiSession {
  pub token: String,
  pub user: ApiUser,
}

impl From<ApiSession> for Session {
  fn from(api: ApiSession) -> Self {
    Session {
      token: api.token,
      user: api.user.into(),
    }
  }
}

/// A response document as the service returns it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseDocument {
  pub id: String,
  pub user_id: String,
  #[serde(default)]
  pub user_name: String,
  #[serde(default)]
  pub place: String,
  #[serde(default)]
  pub location: String,
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default)]
  pub likes: Vec<String>,
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub updated_at: String,
}

impl ApiResponseDocument {
  pub fn into_domain(self) -> TravelResponse {
    TravelResponse {
      id: self.id,
      user_id: self.user_id,
      user_name: self.user_name,
      place: self.place,
      location: self.location,
      content: self.content,
      images: self.images,
      likes: dedup_preserving_order(self.likes),
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

/// Listing envelope for document collections
#[derive(Debug, Deserialize)]
pub struct ApiDocumentList {
  #[serde(default)]
  pub total: u64,
  #[serde(default)]
  pub documents: Vec<ApiResponseDocument>,
}

/// Drop repeated liker ids while keeping first-seen order.
fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
  let mut seen = std::collections::HashSet::new();
  ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_document_deserializes_and_dedups_likes() {
    let json = r#"{
      "id": "r42",
      "userId": "u7",
      "userName": "Marco",
      "place": "Lisbon",
      "location": "Portugal",
      "content": "Trams and pastries",
      "images": ["f1", "f2"],
      "likes": ["u1", "u2", "u1"],
      "createdAt": "2025-03-01T10:00:00Z",
      "updatedAt": "2025-03-02T09:30:00Z"
    }"#;

    let doc: ApiResponseDocument = serde_json::from_str(json).unwrap();
    let response = doc.into_domain();

    assert_eq!(response.id, "r42");
    assert_eq!(response.user_id, "u7");
    assert_eq!(response.images, vec!["f1", "f2"]);
    assert_eq!(response.likes, vec!["u1", "u2"]);
  }

  #[test]
  fn test_missing_optional_fields_default() {
    let json = r#"{"id": "r1", "userId": "u1"}"#;
    let doc: ApiResponseDocument = serde_json::from_str(json).unwrap();
    let response = doc.into_domain();

    assert!(response.likes.is_empty());
    assert!(response.images.is_empty());
    assert_eq!(response.place, "");
  }

  #[test]
  fn test_document_list_envelope() {
    let json = r#"{"total": 1, "documents": [{"id": "r1", "userId": "u1"}]}"#;
    let list: ApiDocumentList = serde_json::from_str(json).unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.documents.len(), 1);
  }

  #[test]
  fn test_session_deserializes() {
    let json = r#"{"token": "tok", "user": {"id": "u1", "name": "Ada", "email": "a@b.c"}}"#;
    let session: Session = serde_json::from_str::<ApiSession>(json).unwrap().into();
    assert_eq!(session.token, "tok");
    assert_eq!(session.user.name, "Ada");
  }
}

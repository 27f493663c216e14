//! The authoritative, client-local copy of the community feed.
//!
//! `FeedStore` is owned by the feed view and mutated only through
//! `apply`, so there is a single writer and an explicit set of state
//! transitions. Settled likes replace the whole document with what the
//! store returned; the UI never mutates a liker list speculatively. The
//! only "optimistic" rendering is driven by the pending toggle set.

use super::interactions::{DeleteOutcome, ToggleOutcome};
use super::types::TravelResponse;

/// State transitions of the feed.
#[derive(Debug)]
pub enum FeedAction {
  /// A full fetch finished
  Loaded(Vec<TravelResponse>),
  /// A full fetch failed
  LoadFailed(String),
  /// A like/unlike round trip settled
  LikeSettled(ToggleOutcome),
  /// A deletion settled
  DeleteSettled(DeleteOutcome),
}

#[derive(Default)]
pub struct FeedStore {
  responses: Vec<TravelResponse>,
  loaded: bool,
  last_error: Option<String>,
}

impl FeedStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn responses(&self) -> &[TravelResponse] {
    &self.responses
  }

  pub fn len(&self) -> usize {
    self.responses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.responses.is_empty()
  }

  /// Whether at least one fetch has completed.
  pub fn is_loaded(&self) -> bool {
    self.loaded
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  pub fn get(&self, response_id: &str) -> Option<&TravelResponse> {
    self.responses.iter().find(|r| r.id == response_id)
  }

  /// Apply a state transition. The only mutation path into the feed.
  pub fn apply(&mut self, action: FeedAction) {
    match action {
      FeedAction::Loaded(responses) => {
        self.responses = responses;
        self.loaded = true;
        self.last_error = None;
      }
      FeedAction::LoadFailed(error) => {
        self.last_error = Some(error);
      }
      FeedAction::LikeSettled(outcome) => {
        // On failure the document is untouched; the control simply
        // returns to idle once the pending id is released
        if let Ok(document) = outcome.result {
          self.replace(document);
        }
      }
      FeedAction::DeleteSettled(outcome) => {
        if outcome.result.is_ok() {
          self.responses.retain(|r| r.id != outcome.response_id);
        }
      }
    }
  }

  fn replace(&mut self, document: TravelResponse) {
    if let Some(slot) = self.responses.iter_mut().find(|r| r.id == document.id) {
      *slot = document;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::community::interactions::LikeDirection;

  fn response(id: &str, likes: &[&str]) -> TravelResponse {
    TravelResponse {
      id: id.to_string(),
      user_id: "author".to_string(),
      user_name: "Ada".to_string(),
      place: "Kyoto".to_string(),
      location: "Japan".to_string(),
      content: String::new(),
      images: vec![],
      likes: likes.iter().map(|s| s.to_string()).collect(),
      created_at: String::new(),
      updated_at: String::new(),
    }
  }

  fn settled_like(id: &str, direction: LikeDirection, likes: &[&str]) -> FeedAction {
    FeedAction::LikeSettled(ToggleOutcome {
      response_id: id.to_string(),
      direction,
      result: Ok(response(id, likes)),
    })
  }

  #[test]
  fn test_loaded_replaces_feed() {
    let mut feed = FeedStore::new();
    assert!(!feed.is_loaded());

    feed.apply(FeedAction::Loaded(vec![response("r1", &[]), response("r2", &[])]));
    assert!(feed.is_loaded());
    assert_eq!(feed.len(), 2);
    assert!(feed.get("r1").is_some());
  }

  #[test]
  fn test_like_then_unlike_restores_liker_set() {
    let mut feed = FeedStore::new();
    feed.apply(FeedAction::Loaded(vec![response("r1", &["u9"])]));

    let before: Vec<String> = feed.get("r1").unwrap().likes.clone();

    feed.apply(settled_like("r1", LikeDirection::Like, &["u9", "u1"]));
    assert!(feed.get("r1").unwrap().is_liked_by("u1"));
    assert_eq!(feed.get("r1").unwrap().like_count(), 2);

    feed.apply(settled_like("r1", LikeDirection::Unlike, &["u9"]));
    let after = &feed.get("r1").unwrap().likes;
    assert_eq!(*after, before);
    assert_eq!(feed.get("r1").unwrap().like_count(), 1);
  }

  #[test]
  fn test_failed_like_leaves_document_untouched() {
    let mut feed = FeedStore::new();
    feed.apply(FeedAction::Loaded(vec![response("r1", &["u9"])]));

    feed.apply(FeedAction::LikeSettled(ToggleOutcome {
      response_id: "r1".to_string(),
      direction: LikeDirection::Like,
      result: Err("store unavailable".to_string()),
    }));

    assert_eq!(feed.get("r1").unwrap().likes, vec!["u9"]);
  }

  #[test]
  fn test_delete_settled_removes_response() {
    let mut feed = FeedStore::new();
    feed.apply(FeedAction::Loaded(vec![response("r1", &[]), response("r2", &[])]));

    feed.apply(FeedAction::DeleteSettled(DeleteOutcome {
      response_id: "r1".to_string(),
      result: Ok(()),
    }));
    assert_eq!(feed.len(), 1);
    assert!(feed.get("r1").is_none());

    // A failed deletion leaves the response in place
    feed.apply(FeedAction::DeleteSettled(DeleteOutcome {
      response_id: "r2".to_string(),
      result: Err("file store unavailable".to_string()),
    }));
    assert!(feed.get("r2").is_some());
  }

  #[test]
  fn test_load_failure_keeps_previous_data() {
    let mut feed = FeedStore::new();
    feed.apply(FeedAction::Loaded(vec![response("r1", &[])]));
    feed.apply(FeedAction::LoadFailed("timeout".to_string()));

    assert_eq!(feed.len(), 1);
    assert_eq!(feed.last_error(), Some("timeout"));
  }
}

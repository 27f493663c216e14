//! Feed interactions: like/unlike toggles and response deletion.
//!
//! A toggle is a full round trip to the document store. While one is in
//! flight for a response, its id sits in a pending set; a second toggle
//! on the same id is a no-op (not queued), which is the only mutual
//! exclusion needed since ids are checked and inserted before any await
//! point. Toggles on different ids run concurrently.
//!
//! The spawned round trip has a single exit path: it sends its outcome
//! (success or failure) over a channel, and `drain()` releases the
//! pending id exactly once per outcome. A failed request therefore can
//! never leave a response permanently stuck in the pending state.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::error;

use super::store::ResponseStore;
use super::types::{TravelResponse, User};

/// Which way a toggle goes, decided from the authoritative liker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeDirection {
  Like,
  Unlike,
}

/// What `toggle` decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleStart {
  /// A round trip was dispatched in the given direction
  Dispatched(LikeDirection),
  /// Nobody is signed in; nothing was dispatched
  NotSignedIn,
  /// A round trip for this response is already in flight
  AlreadyPending,
}

/// Settled outcome of one like/unlike round trip.
#[derive(Debug)]
pub struct ToggleOutcome {
  pub response_id: String,
  pub direction: LikeDirection,
  /// The authoritative updated document, or the error message
  pub result: Result<TravelResponse, String>,
}

/// Tracks in-flight like toggles per response id.
pub struct LikeToggler {
  store: Arc<dyn ResponseStore>,
  pending: HashSet<String>,
  tx: mpsc::UnboundedSender<ToggleOutcome>,
  rx: mpsc::UnboundedReceiver<ToggleOutcome>,
}

impl LikeToggler {
  pub fn new(store: Arc<dyn ResponseStore>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      store,
      pending: HashSet::new(),
      tx,
      rx,
    }
  }

  /// Whether a toggle for this response is currently in flight.
  pub fn is_pending(&self, response_id: &str) -> bool {
    self.pending.contains(response_id)
  }

  #[allow(dead_code)]
  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  /// Start a like/unlike round trip for `response`.
  ///
  /// Requires a signed-in user; the direction comes from whether that
  /// user is already in the response's liker set. Repeated calls while
  /// the response is pending are no-ops.
  pub fn toggle(&mut self, response: &TravelResponse, user: Option<&User>) -> ToggleStart {
    let user = match user {
      Some(user) => user,
      None => return ToggleStart::NotSignedIn,
    };

    if self.pending.contains(&response.id) {
      return ToggleStart::AlreadyPending;
    }

    let direction = if response.is_liked_by(&user.id) {
      LikeDirection::Unlike
    } else {
      LikeDirection::Like
    };

    self.pending.insert(response.id.clone());

    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    let response_id = response.id.clone();
    let user_id = user.id.clone();

    tokio::spawn(async move {
      let result = match direction {
        LikeDirection::Like => store.like(&response_id, &user_id).await,
        LikeDirection::Unlike => store.unlike(&response_id, &user_id).await,
      }
      .map_err(|e| e.to_string());

      // Sole exit path; drain() releases the pending id from this
      let _ = tx.send(ToggleOutcome {
        response_id,
        direction,
        result,
      });
    });

    ToggleStart::Dispatched(direction)
  }

  /// Collect settled toggles, releasing each pending id exactly once.
  ///
  /// Failures are reported to the log and otherwise only visible as the
  /// control returning to its idle state; there is no retry.
  pub fn drain(&mut self) -> Vec<ToggleOutcome> {
    let mut settled = Vec::new();
    while let Ok(outcome) = self.rx.try_recv() {
      self.pending.remove(&outcome.response_id);
      if let Err(e) = &outcome.result {
        error!(response = %outcome.response_id, "like toggle failed: {}", e);
      }
      settled.push(outcome);
    }
    settled
  }
}

/// Settled outcome of a response deletion.
#[derive(Debug)]
pub struct DeleteOutcome {
  pub response_id: String,
  pub result: Result<(), String>,
}

/// Deletes responses together with their attached files.
///
/// All file deletions are issued concurrently; the record deletion is
/// attempted only if every file deletion succeeded. There is no
/// compensation for partial failure: a rejected file deletion leaves
/// the record (and any already-deleted files' references) behind. Known
/// limitation carried over from the original behavior.
pub struct ResponseDeleter {
  store: Arc<dyn ResponseStore>,
  in_flight: HashSet<String>,
  tx: mpsc::UnboundedSender<DeleteOutcome>,
  rx: mpsc::UnboundedReceiver<DeleteOutcome>,
}

impl ResponseDeleter {
  pub fn new(store: Arc<dyn ResponseStore>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      store,
      in_flight: HashSet::new(),
      tx,
      rx,
    }
  }

  pub fn is_deleting(&self, response_id: &str) -> bool {
    self.in_flight.contains(response_id)
  }

  /// Start deleting `response`. The caller has already confirmed with
  /// the user. Returns false if a deletion for this id is in flight.
  pub fn delete(&mut self, response: &TravelResponse) -> bool {
    if self.in_flight.contains(&response.id) {
      return false;
    }
    self.in_flight.insert(response.id.clone());

    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    let response_id = response.id.clone();
    let files = response.images.clone();

    tokio::spawn(async move {
      let file_deletes = files.iter().map(|file_id| store.delete_file(file_id));

      let result = match futures::future::try_join_all(file_deletes).await {
        Ok(_) => store.delete_response(&response_id).await,
        Err(e) => Err(e),
      }
      .map_err(|e| e.to_string());

      let _ = tx.send(DeleteOutcome {
        response_id,
        result,
      });
    });

    true
  }

  /// Collect settled deletions, releasing each in-flight id.
  pub fn drain(&mut self) -> Vec<DeleteOutcome> {
    let mut settled = Vec::new();
    while let Ok(outcome) = self.rx.try_recv() {
      self.in_flight.remove(&outcome.response_id);
      if let Err(e) = &outcome.result {
        error!(response = %outcome.response_id, "response deletion failed: {}", e);
      }
      settled.push(outcome);
    }
    settled
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use color_eyre::eyre::eyre;
  use color_eyre::Result;
  use std::sync::Mutex;
  use std::time::Duration;

  #[derive(Default)]
  struct MockStore {
    like_calls: Mutex<Vec<(String, String)>>,
    unlike_calls: Mutex<Vec<(String, String)>>,
    deleted_files: Mutex<Vec<String>>,
    deleted_responses: Mutex<Vec<String>>,
    fail_toggles: bool,
    failing_files: Vec<String>,
    delay: Option<Duration>,
  }

  impl MockStore {
    fn failing() -> Self {
      Self {
        fail_toggles: true,
        ..Self::default()
      }
    }

    fn slow() -> Self {
      Self {
        delay: Some(Duration::from_millis(50)),
        ..Self::default()
      }
    }

    async fn maybe_delay(&self) {
      if let Some(delay) = self.delay {
        tokio::time::sleep(delay).await;
      }
    }

    fn document(&self, response_id: &str, likes: Vec<String>) -> TravelResponse {
      TravelResponse {
        id: response_id.to_string(),
        user_id: "author".to_string(),
        user_name: "Ada".to_string(),
        place: "Kyoto".to_string(),
        location: "Japan".to_string(),
        content: String::new(),
        images: vec![],
        likes,
        created_at: String::new(),
        updated_at: String::new(),
      }
    }
  }

  #[async_trait]
  impl ResponseStore for MockStore {
    async fn fetch_all(&self) -> Result<Vec<TravelResponse>> {
      Ok(vec![])
    }

    async fn like(&self, response_id: &str, user_id: &str) -> Result<TravelResponse> {
      self.maybe_delay().await;
      self
        .like_calls
        .lock()
        .unwrap()
        .push((response_id.to_string(), user_id.to_string()));
      if self.fail_toggles {
        return Err(eyre!("store unavailable"));
      }
      Ok(self.document(response_id, vec![user_id.to_string()]))
    }

    async fn unlike(&self, response_id: &str, user_id: &str) -> Result<TravelResponse> {
      self.maybe_delay().await;
      self
        .unlike_calls
        .lock()
        .unwrap()
        .push((response_id.to_string(), user_id.to_string()));
      if self.fail_toggles {
        return Err(eyre!("store unavailable"));
      }
      Ok(self.document(response_id, vec![]))
    }

    async fn delete_response(&self, response_id: &str) -> Result<()> {
      self
        .deleted_responses
        .lock()
        .unwrap()
        .push(response_id.to_string());
      Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
      if self.failing_files.iter().any(|f| f == file_id) {
        return Err(eyre!("file {} is gone", file_id));
      }
      self.deleted_files.lock().unwrap().push(file_id.to_string());
      Ok(())
    }
  }

  fn user(id: &str) -> User {
    User {
      id: id.to_string(),
      name: "Ada".to_string(),
      email: "ada@example.com".to_string(),
    }
  }

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

  async fn drain_one(toggler: &mut LikeToggler) -> ToggleOutcome {
    for _ in 0..50 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      let mut settled = toggler.drain();
      if let Some(outcome) = settled.pop() {
        return outcome;
      }
    }
    panic!("toggle never settled");
  }

  #[tokio::test]
  async fn test_toggle_dispatches_like_and_releases_pending() {
    let store = Arc::new(MockStore::default());
    let mut toggler = LikeToggler::new(store.clone());

    let start = toggler.toggle(&response("r1", &[]), Some(&user("u1")));
    assert_eq!(start, ToggleStart::Dispatched(LikeDirection::Like));
    assert!(toggler.is_pending("r1"));

    let outcome = drain_one(&mut toggler).await;
    assert_eq!(outcome.response_id, "r1");
    assert!(outcome.result.unwrap().is_liked_by("u1"));
    assert!(!toggler.is_pending("r1"));
    assert_eq!(store.like_calls.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_failed_toggle_still_releases_pending() {
    let store = Arc::new(MockStore::failing());
    let mut toggler = LikeToggler::new(store);

    toggler.toggle(&response("r1", &[]), Some(&user("u1")));
    assert!(toggler.is_pending("r1"));

    let outcome = drain_one(&mut toggler).await;
    assert!(outcome.result.is_err());
    assert!(!toggler.is_pending("r1"));
    assert_eq!(toggler.pending_count(), 0);
  }

  #[tokio::test]
  async fn test_toggle_while_pending_is_noop() {
    let store = Arc::new(MockStore::slow());
    let mut toggler = LikeToggler::new(store.clone());

    let first = toggler.toggle(&response("r1", &[]), Some(&user("u1")));
    let second = toggler.toggle(&response("r1", &[]), Some(&user("u1")));
    assert_eq!(first, ToggleStart::Dispatched(LikeDirection::Like));
    assert_eq!(second, ToggleStart::AlreadyPending);

    drain_one(&mut toggler).await;
    // Only one request ever went out
    assert_eq!(store.like_calls.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_toggles_on_distinct_responses_run_concurrently() {
    let store = Arc::new(MockStore::slow());
    let mut toggler = LikeToggler::new(store.clone());

    let first = toggler.toggle(&response("r1", &[]), Some(&user("u1")));
    let second = toggler.toggle(&response("r2", &[]), Some(&user("u1")));
    assert_eq!(first, ToggleStart::Dispatched(LikeDirection::Like));
    assert_eq!(second, ToggleStart::Dispatched(LikeDirection::Like));
    assert_eq!(toggler.pending_count(), 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = toggler.drain();
    assert_eq!(settled.len(), 2);
    assert_eq!(toggler.pending_count(), 0);
  }

  #[tokio::test]
  async fn test_signed_out_toggle_dispatches_nothing() {
    let store = Arc::new(MockStore::default());
    let mut toggler = LikeToggler::new(store.clone());

    let start = toggler.toggle(&response("r1", &[]), None);
    assert_eq!(start, ToggleStart::NotSignedIn);
    assert_eq!(toggler.pending_count(), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(toggler.drain().is_empty());
    assert!(store.like_calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_direction_follows_authoritative_liker_set() {
    let store = Arc::new(MockStore::default());
    let mut toggler = LikeToggler::new(store.clone());

    let start = toggler.toggle(&response("r1", &["u1"]), Some(&user("u1")));
    assert_eq!(start, ToggleStart::Dispatched(LikeDirection::Unlike));

    let outcome = drain_one(&mut toggler).await;
    assert_eq!(outcome.direction, LikeDirection::Unlike);
    assert_eq!(store.unlike_calls.lock().unwrap().len(), 1);
    assert!(store.like_calls.lock().unwrap().is_empty());
  }

  async fn drain_one_delete(deleter: &mut ResponseDeleter) -> DeleteOutcome {
    for _ in 0..50 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      let mut settled = deleter.drain();
      if let Some(outcome) = settled.pop() {
        return outcome;
      }
    }
    panic!("delete never settled");
  }

  fn response_with_files(id: &str, files: &[&str]) -> TravelResponse {
    let mut response = response(id, &[]);
    response.images = files.iter().map(|s| s.to_string()).collect();
    response
  }

  #[tokio::test]
  async fn test_delete_removes_files_then_record() {
    let store = Arc::new(MockStore::default());
    let mut deleter = ResponseDeleter::new(store.clone());

    assert!(deleter.delete(&response_with_files("r1", &["f1", "f2"])));
    assert!(deleter.is_deleting("r1"));

    let outcome = drain_one_delete(&mut deleter).await;
    assert!(outcome.result.is_ok());
    assert!(!deleter.is_deleting("r1"));

    let mut files = store.deleted_files.lock().unwrap().clone();
    files.sort();
    assert_eq!(files, vec!["f1", "f2"]);
    assert_eq!(*store.deleted_responses.lock().unwrap(), vec!["r1"]);
  }

  #[tokio::test]
  async fn test_failed_file_deletion_skips_record() {
    let store = Arc::new(MockStore {
      failing_files: vec!["f2".to_string()],
      ..MockStore::default()
    });
    let mut deleter = ResponseDeleter::new(store.clone());

    deleter.delete(&response_with_files("r1", &["f1", "f2"]));
    let outcome = drain_one_delete(&mut deleter).await;

    // Record deletion was never attempted; the response survives with
    // its file references even though f1 may already be gone
    assert!(outcome.result.is_err());
    assert!(store.deleted_responses.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_delete_while_in_flight_is_noop() {
    let store = Arc::new(MockStore::slow());
    let mut deleter = ResponseDeleter::new(store);

    assert!(deleter.delete(&response_with_files("r1", &[])));
    assert!(!deleter.delete(&response_with_files("r1", &[])));
  }
}

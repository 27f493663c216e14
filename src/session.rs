//! Shared handle to the signed-in session, plus token persistence.
//!
//! The handle is cloned into views and clients for reads; writes happen
//! only through `sign_in`/`sign_out`, called from the login flow and the
//! logout command. The browser original keeps the session in a cookie;
//! here the token lives in a file under the user data dir and is
//! validated against the account endpoint on startup.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::community::types::{Session, User};

/// Cloneable read handle over the current session.
#[derive(Clone, Default)]
pub struct SessionHandle {
  inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
  pub fn new() -> Self {
    Self::default()
  }

  /// The signed-in user, if any.
  pub fn user(&self) -> Option<User> {
    self.read().as_ref().map(|s| s.user.clone())
  }

  /// The bearer token for authenticated requests, if any.
  pub fn token(&self) -> Option<String> {
    self.read().as_ref().map(|s| s.token.clone())
  }

  pub fn is_signed_in(&self) -> bool {
    self.read().is_some()
  }

  /// Replace the session after a successful login or token validation.
  pub fn sign_in(&self, session: Session) {
    *self.write() = Some(session);
  }

  /// Drop the session on logout or when the saved token turns out stale.
  pub fn sign_out(&self) {
    *self.write() = None;
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
    self.inner.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
    self.inner.write().unwrap_or_else(|e| e.into_inner())
  }
}

/// Path of the persisted session token.
fn token_path() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("wayfarer").join("session.token"))
}

/// Load a previously saved token, if one exists.
pub fn load_saved_token() -> Option<String> {
  let path = token_path().ok()?;
  let token = std::fs::read_to_string(path).ok()?;
  let token = token.trim();
  if token.is_empty() {
    None
  } else {
    Some(token.to_string())
  }
}

/// Persist the token so the next start can restore the session.
pub fn save_token(token: &str) -> Result<()> {
  let path = token_path()?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
  }

  std::fs::write(&path, token)
    .map_err(|e| eyre!("Failed to write session token to {}: {}", path.display(), e))?;

  // Token is a credential; keep it private to the user
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
      .map_err(|e| eyre!("Failed to restrict token permissions: {}", e))?;
  }

  Ok(())
}

/// Remove the persisted token.
pub fn forget_token() -> Result<()> {
  let path = token_path()?;
  if path.exists() {
    std::fs::remove_file(&path)
      .map_err(|e| eyre!("Failed to remove session token: {}", e))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session() -> Session {
    Session {
      token: "tok-1".to_string(),
      user: User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
      },
    }
  }

  #[test]
  fn test_sign_in_and_out() {
    let handle = SessionHandle::new();
    assert!(!handle.is_signed_in());
    assert!(handle.user().is_none());

    handle.sign_in(session());
    assert!(handle.is_signed_in());
    assert_eq!(handle.user().map(|u| u.id), Some("u1".to_string()));
    assert_eq!(handle.token().as_deref(), Some("tok-1"));

    handle.sign_out();
    assert!(!handle.is_signed_in());
    assert!(handle.token().is_none());
  }

  #[test]
  fn test_clones_share_state() {
    let handle = SessionHandle::new();
    let clone = handle.clone();

    handle.sign_in(session());
    assert!(clone.is_signed_in());

    clone.sign_out();
    assert!(!handle.is_signed_in());
  }
}

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::assets::FetchedAsset;
use crate::config::Config;
use crate::session::SessionHandle;

use super::api_types::{ApiDocumentList, ApiResponseDocument, ApiSession, ApiUser};
use super::store::ResponseStore;
use super::types::{ResponseDraft, Session, TravelResponse, User};

/// REST client for the Travelers Community service.
///
/// Covers the document store (responses), the file store (attachments),
/// the account/session endpoints, and raw asset fetches for the offline
/// cache. Authenticated calls pick up the current bearer token from the
/// shared session handle at request time.
#[derive(Clone)]
pub struct CommunityClient {
  http: reqwest::Client,
  base: Url,
  project: String,
  api_key: String,
  session: SessionHandle,
}

impl CommunityClient {
  pub fn new(config: &Config, session: SessionHandle) -> Result<Self> {
    let api_key = Config::get_api_key()?;

    let mut base = Url::parse(&config.community.url)
      .map_err(|e| eyre!("Invalid community URL {}: {}", config.community.url, e))?;
    // Url::join treats a base without a trailing slash as a file
    if !base.path().ends_with('/') {
      base.set_path(&format!("{}/", base.path()));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base,
      project: config.community.project.clone(),
      api_key,
      session,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint path {}: {}", path, e))
  }

  /// Attach project/key headers and the session token if signed in.
  fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    let request = request
      .header("X-Community-Project", &self.project)
      .header("X-Community-Key", &self.api_key);

    match self.session.token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  /// Send a request, converting transport errors and non-success
  /// statuses into errors with the given context.
  async fn send(
    &self,
    request: reqwest::RequestBuilder,
    context: &str,
  ) -> Result<reqwest::Response> {
    let response = request
      .send()
      .await
      .map_err(|e| eyre!("Failed to {}: {}", context, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Failed to {}: status {}", context, status));
    }

    Ok(response)
  }

  /// List all shared responses.
  pub async fn fetch_responses(&self) -> Result<Vec<TravelResponse>> {
    let url = self.endpoint("v1/responses")?;
    let response = self
      .send(self.authed(self.http.get(url)), "fetch responses")
      .await?;

    let list: ApiDocumentList = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response list: {}", e))?;

    Ok(list.documents.into_iter().map(|d| d.into_domain()).collect())
  }

  /// Record a like and return the authoritative updated document.
  pub async fn like_response(&self, response_id: &str, user_id: &str) -> Result<TravelResponse> {
    let url = self.endpoint(&format!("v1/responses/{}/likes", response_id))?;
    let body = serde_json::json!({ "userId": user_id });
    let response = self
      .send(
        self.authed(self.http.post(url)).json(&body),
        &format!("like response {}", response_id),
      )
      .await?;

    self.parse_document(response).await
  }

  /// Remove a like and return the authoritative updated document.
  pub async fn unlike_response(&self, response_id: &str, user_id: &str) -> Result<TravelResponse> {
    let url = self.endpoint(&format!("v1/responses/{}/likes/{}", response_id, user_id))?;
    let response = self
      .send(
        self.authed(self.http.delete(url)),
        &format!("unlike response {}", response_id),
      )
      .await?;

    self.parse_document(response).await
  }

  /// Delete a response document.
  pub async fn delete_response(&self, response_id: &str) -> Result<()> {
    let url = self.endpoint(&format!("v1/responses/{}", response_id))?;
    self
      .send(
        self.authed(self.http.delete(url)),
        &format!("delete response {}", response_id),
      )
      .await?;
    Ok(())
  }

  /// Delete a stored attachment file.
  pub async fn delete_file(&self, file_id: &str) -> Result<()> {
    let url = self.endpoint(&format!("v1/files/{}", file_id))?;
    self
      .send(
        self.authed(self.http.delete(url)),
        &format!("delete file {}", file_id),
      )
      .await?;
    Ok(())
  }

  /// Create a new response from the share form.
  pub async fn create_response(&self, draft: &ResponseDraft) -> Result<TravelResponse> {
    let url = self.endpoint("v1/responses")?;
    let response = self
      .send(
        self.authed(self.http.post(url)).json(draft),
        "create response",
      )
      .await?;

    self.parse_document(response).await
  }

  /// Create a session from credentials.
  pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
    let url = self.endpoint("v1/account/sessions")?;
    let body = serde_json::json!({ "email": email, "password": password });
    let response = self
      .send(self.authed(self.http.post(url)).json(&body), "sign in")
      .await?;

    let session: ApiSession = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse session: {}", e))?;

    Ok(session.into())
  }

  /// End the current session on the server.
  pub async fn logout(&self) -> Result<()> {
    let url = self.endpoint("v1/account/sessions/current")?;
    self
      .send(self.authed(self.http.delete(url)), "sign out")
      .await?;
    Ok(())
  }

  /// Fetch the account a specific token belongs to, without consulting
  /// the shared session. Validates a persisted token at startup.
  pub async fn current_user(&self, token: &str) -> Result<User> {
    let url = self.endpoint("v1/account")?;
    let request = self
      .http
      .get(url)
      .header("X-Community-Project", &self.project)
      .header("X-Community-Key", &self.api_key)
      .bearer_auth(token);
    let response = self.send(request, "fetch account").await?;

    let user: ApiUser = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse account: {}", e))?;

    Ok(user.into())
  }

  /// Raw GET of a service asset, used as the network leg of the offline
  /// cache. `path` is resolved against the community base URL.
  pub async fn fetch_asset(&self, path: &str) -> Result<FetchedAsset> {
    let url = self.endpoint(path.trim_start_matches('/'))?;
    let response = self
      .send(self.authed(self.http.get(url)), &format!("fetch asset {}", path))
      .await?;

    let content_type = response
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read asset {}: {}", path, e))?;

    Ok(FetchedAsset {
      content_type,
      body: body.to_vec(),
    })
  }

  async fn parse_document(&self, response: reqwest::Response) -> Result<TravelResponse> {
    let doc: ApiResponseDocument = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse response document: {}", e))?;
    Ok(doc.into_domain())
  }
}

#[async_trait]
impl ResponseStore for CommunityClient {
  async fn fetch_all(&self) -> Result<Vec<TravelResponse>> {
    self.fetch_responses().await
  }

  async fn like(&self, response_id: &str, user_id: &str) -> Result<TravelResponse> {
    self.like_response(response_id, user_id).await
  }

  async fn unlike(&self, response_id: &str, user_id: &str) -> Result<TravelResponse> {
    self.unlike_response(response_id, user_id).await
  }

  async fn delete_response(&self, response_id: &str) -> Result<()> {
    CommunityClient::delete_response(self, response_id).await
  }

  async fn delete_file(&self, file_id: &str) -> Result<()> {
    CommunityClient::delete_file(self, file_id).await
  }
}

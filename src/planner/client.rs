use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use url::Url;

use crate::config::Config;

/// Text shown when the endpoint answers without usable plan text.
pub const FALLBACK_PLAN: &str = "Failed to generate plan. Please try again.";

/// Client for the generative-language endpoint.
///
/// One-shot: a single POST per plan request, no streaming, no retry and
/// no rate-limit handling. Non-success statuses become errors here and
/// are turned into a fixed user-facing message at the call site.
#[derive(Clone)]
pub struct PlannerClient {
  http: reqwest::Client,
  endpoint: Url,
}

impl PlannerClient {
  pub fn new(config: &Config) -> Result<Self> {
    let endpoint = Url::parse(&config.planner.url)
      .map_err(|e| eyre!("Invalid planner URL {}: {}", config.planner.url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, endpoint })
  }

  /// Request a plan for the given prompt and return its text, or the
  /// named fallback when the response carries no text.
  ///
  /// The API key is resolved per call so a missing key surfaces as a
  /// failed generation, not a failed start.
  pub async fn generate(&self, prompt: &str) -> Result<String> {
    let key = Config::get_planner_key()?;
    let mut endpoint = self.endpoint.clone();
    endpoint.query_pairs_mut().append_pair("key", &key);

    let body = serde_json::json!({
      "contents": [{
        "parts": [{
          "text": prompt
        }]
      }]
    });

    let response = self
      .http
      .post(endpoint)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach generation endpoint: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Generation request failed with status: {}", status));
    }

    let parsed: GenerateResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse generation response: {}", e))?;

    Ok(first_candidate_text(parsed).unwrap_or_else(|| FALLBACK_PLAN.to_string()))
  }
}

// Every nesting level of the response is optional; extraction walks the
// options explicitly instead of trusting the shape.

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
  text: Option<String>,
}

/// `candidates[0].content.parts[0].text`, if every level is present.
fn first_candidate_text(response: GenerateResponse) -> Option<String> {
  response
    .candidates
    .into_iter()
    .next()?
    .content?
    .parts
    .into_iter()
    .next()?
    .text
}

#[cfg(test)]
mod tests {
  use super::*;

  fn extract(json: &str) -> Option<String> {
    let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
    first_candidate_text(parsed)
  }

  #[test]
  fn test_extracts_first_candidate_text() {
    let json = r#"{
      "candidates": [{
        "content": {
          "parts": [{"text": "Day 1: Arrive in Lisbon"}, {"text": "ignored"}]
        }
      }]
    }"#;
    assert_eq!(extract(json), Some("Day 1: Arrive in Lisbon".to_string()));
  }

  #[test]
  fn test_missing_candidates_yields_none() {
    assert_eq!(extract(r#"{}"#), None);
    assert_eq!(extract(r#"{"candidates": []}"#), None);
  }

  #[test]
  fn test_missing_nested_fields_yield_none() {
    assert_eq!(extract(r#"{"candidates": [{}]}"#), None);
    assert_eq!(extract(r#"{"candidates": [{"content": {}}]}"#), None);
    assert_eq!(
      extract(r#"{"candidates": [{"content": {"parts": [{}]}}]}"#),
      None
    );
  }
}

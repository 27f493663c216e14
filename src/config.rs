use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub community: CommunityConfig,
  #[serde(default)]
  pub planner: PlannerConfig,
  #[serde(default)]
  pub assets: AssetsConfig,
  /// Custom title for the header (defaults to the community domain if not set)
  pub title: Option<String>,
  /// Directory attachments are saved into (defaults to the user download dir)
  pub downloads: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommunityConfig {
  /// Base URL of the Travelers Community service
  pub url: String,
  /// Project identifier sent with every request
  pub project: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
  /// Generation endpoint, called once per plan request
  #[serde(default = "default_planner_url")]
  pub url: String,
}

impl Default for PlannerConfig {
  fn default() -> Self {
    Self {
      url: default_planner_url(),
    }
  }
}

fn default_planner_url() -> String {
  "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
    .to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetsConfig {
  /// Cache generation version. Bumping this is the only supported way to
  /// pick up manifest changes on existing installs.
  #[serde(default = "default_assets_version")]
  pub version: String,
  /// Service paths pinned into the offline cache at install time
  #[serde(default = "default_manifest")]
  pub manifest: Vec<String>,
  /// Activate a freshly installed generation immediately instead of
  /// leaving it waiting for the next start
  #[serde(default = "default_true")]
  pub skip_waiting: bool,
}

impl Default for AssetsConfig {
  fn default() -> Self {
    Self {
      version: default_assets_version(),
      manifest: default_manifest(),
      skip_waiting: true,
    }
  }
}

fn default_assets_version() -> String {
  "v1".to_string()
}

fn default_manifest() -> Vec<String> {
  vec![
    "/".to_string(),
    "/index.html".to_string(),
    "/static/js/bundle.js".to_string(),
  ]
}

fn default_true() -> bool {
  true
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./wayfarer.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/wayfarer/config.yaml
  /// 4. ~/.config/wayfarer/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/wayfarer/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("wayfarer.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("wayfarer").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the community service API key from environment variables.
  ///
  /// Checks WAYFARER_API_KEY first, then TRAVELERS_API_KEY as fallback.
  pub fn get_api_key() -> Result<String> {
    std::env::var("WAYFARER_API_KEY")
      .or_else(|_| std::env::var("TRAVELERS_API_KEY"))
      .map_err(|_| {
        eyre!(
          "Community API key not found. Set WAYFARER_API_KEY or TRAVELERS_API_KEY environment variable."
        )
      })
  }

  /// Get the plan-generation API key from environment variables.
  ///
  /// Checks WAYFARER_PLANNER_KEY first, then GEMINI_API_KEY as fallback.
  pub fn get_planner_key() -> Result<String> {
    std::env::var("WAYFARER_PLANNER_KEY")
      .or_else(|_| std::env::var("GEMINI_API_KEY"))
      .map_err(|_| {
        eyre!(
          "Planner API key not found. Set WAYFARER_PLANNER_KEY or GEMINI_API_KEY environment variable."
        )
      })
  }

  /// Directory saved attachments land in.
  pub fn downloads_dir(&self) -> PathBuf {
    if let Some(dir) = &self.downloads {
      return dir.clone();
    }
    dirs::download_dir()
      .or_else(dirs::home_dir)
      .unwrap_or_else(|| PathBuf::from("."))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_fills_defaults() {
    let yaml = r#"
community:
  url: https://community.example.com
  project: travelers
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.assets.version, "v1");
    assert_eq!(
      config.assets.manifest,
      vec!["/", "/index.html", "/static/js/bundle.js"]
    );
    assert!(config.assets.skip_waiting);
    assert!(config.planner.url.contains("generateContent"));
    assert!(config.title.is_none());
  }

  #[test]
  fn test_assets_section_overrides() {
    let yaml = r#"
community:
  url: https://community.example.com
  project: travelers
assets:
  version: v7
  skip_waiting: false
  manifest:
    - /
    - /offline.html
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.assets.version, "v7");
    assert!(!config.assets.skip_waiting);
    assert_eq!(config.assets.manifest.len(), 2);
  }
}

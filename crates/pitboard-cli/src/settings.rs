//! Layered configuration: defaults, then `pitboard.toml`, then the
//! environment.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use pitboard_client::{ApiConfig, client::DEFAULT_LISTING_URL};
use serde::Deserialize;

/// Everything the `pitboard` binary reads from its config sources.
///
/// Environment variables use the `PITBOARD_` prefix with `__` between
/// nested keys, e.g. `PITBOARD_STORE_PATH` or `PITBOARD_API__API_KEY`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database file; a leading `~/` is expanded.
  pub store_path:  PathBuf,
  /// Public page the event listing is scraped from.
  pub listing_url: String,
  pub api:         ApiConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:  PathBuf::from("pitboard.db"),
      listing_url: DEFAULT_LISTING_URL.to_owned(),
      api:         ApiConfig::default(),
    }
  }
}

impl Settings {
  /// Read `path` if it exists, with the environment layered on top.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("PITBOARD")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let path = std::env::temp_dir().join(format!("{}.toml", uuid::Uuid::new_v4()));
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.listing_url, DEFAULT_LISTING_URL);
    assert_eq!(settings.api.timeout_secs, 30);
  }

  #[test]
  fn file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!("{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      "store_path = \"/tmp/results.db\"\n\n[api]\napi_key = \"k\"\nmax_retries = 1\n",
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(settings.store_path, PathBuf::from("/tmp/results.db"));
    assert_eq!(settings.api.api_key, "k");
    assert_eq!(settings.api.max_retries, 1);
    // Unset nested keys keep their defaults.
    assert_eq!(settings.api.timeout_secs, 30);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/pitboard.db")),
      PathBuf::from(home).join("pitboard.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}

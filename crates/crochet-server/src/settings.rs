//! Runtime configuration: defaults, then `crochet.toml`, then `CROCHET_*`
//! environment variables, then command-line overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  /// `host:port` the HTTP server binds to.
  pub listen_address: String,
  /// Directory of static web UI files served for every path outside the
  /// API. Nothing is served when unset.
  #[serde(default)]
  pub assets_dir:     Option<PathBuf>,
}

/// Layer every configuration source into a [`ServerConfig`].
///
/// A missing file is not an error.
pub fn load(
  path: &Path,
  listen_address: Option<String>,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .set_default("listen_address", DEFAULT_LISTEN_ADDRESS)?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("CROCHET"))
    .set_override_option("listen_address", listen_address)?
    .build()?
    .try_deserialize()
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reconcile::MergePolicy;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pubs.toml";

/// Everything a command needs to know, resolved once from the config file and
/// command-line overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Google Scholar profile id used for a fresh snapshot's `profile` block.
    pub scholar_id: String,
    /// The snapshot to read and rewrite.
    pub output: PathBuf,
    pub policy: MergePolicy,
    pub recompute_metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scholar_id: String::new(),
            output: PathBuf::from("data/publications.json"),
            policy: MergePolicy::default(),
            recompute_metrics: true,
        }
    }
}

impl Config {
    /// Read `path` if given (it must exist), otherwise `pubs.toml` if present,
    /// otherwise use defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Config::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Config::from_toml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

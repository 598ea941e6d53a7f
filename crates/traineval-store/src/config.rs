//! Store configuration and factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use traineval_core::RecordStore;

use crate::dataset::Dataset;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::rest::{RestStore, DEFAULT_TIMEOUT_SECS};

/// Which backend holds the records.
///
/// The `Debug` impl masks the API key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory {
        /// Seed with the sample cohort instead of starting empty.
        #[serde(default)]
        sample: bool,
    },
    File {
        #[serde(default = "default_data_path")]
        path: PathBuf,
    },
    Rest {
        base_url: String,
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        upsert_scores: bool,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory { sample } => {
                f.debug_struct("Memory").field("sample", sample).finish()
            }
            StoreConfig::File { path } => f.debug_struct("File").field("path", path).finish(),
            StoreConfig::Rest {
                base_url,
                api_key: _,
                upsert_scores,
                timeout_secs,
            } => f
                .debug_struct("Rest")
                .field("base_url", base_url)
                .field("api_key", &"***")
                .field("upsert_scores", upsert_scores)
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/traineval.json")
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level traineval configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainevalConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

/// Replace `${VAR_NAME}` references with the variable's value (empty if unset).
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_store_config(config: StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::File { path } => StoreConfig::File {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        StoreConfig::Rest {
            base_url,
            api_key,
            upsert_scores,
            timeout_secs,
        } => StoreConfig::Rest {
            base_url: resolve_env_vars(&base_url),
            api_key: resolve_env_vars(&api_key),
            upsert_scores,
            timeout_secs,
        },
        memory => memory,
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `traineval.toml` in the current directory
/// 2. `~/.config/traineval/config.toml`
///
/// `TRAINEVAL_REST_KEY` overrides the API key of a REST store.
pub fn load_config_from(path: Option<&Path>) -> Result<TrainevalConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => default_config_path(),
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<TrainevalConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TrainevalConfig::default(),
    };

    if let Ok(key) = std::env::var("TRAINEVAL_REST_KEY") {
        if let StoreConfig::Rest { api_key, .. } = &mut config.store {
            *api_key = key;
        }
    }

    config.store = resolve_store_config(config.store);
    debug!(path = ?config_path, store = ?config.store, "configuration loaded");
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("traineval.toml");
    if local.exists() {
        return Some(local);
    }
    let global = std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("traineval").join("config.toml"))?;
    global.exists().then_some(global)
}

/// Open the configured backend.
pub async fn create_store(config: &StoreConfig) -> Result<Box<dyn RecordStore>> {
    match config {
        StoreConfig::Memory { sample } => {
            let data = if *sample {
                Dataset::sample(chrono::Utc::now().date_naive())
            } else {
                Dataset::default()
            };
            Ok(Box::new(MemoryStore::new(data)))
        }
        StoreConfig::File { path } => {
            let store = FileStore::open(path).await.with_context(|| {
                format!(
                    "failed to open data file {} (run `traineval init` to create one)",
                    path.display()
                )
            })?;
            Ok(Box::new(store))
        }
        StoreConfig::Rest {
            base_url,
            api_key,
            upsert_scores,
            timeout_secs,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("REST store needs an api_key (or TRAINEVAL_REST_KEY)");
            }
            let store =
                RestStore::new(base_url, api_key, *timeout_secs)?.with_upsert_scores(*upsert_scores);
            Ok(Box::new(store))
        }
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub embeddings: EmbeddingsConfig,
    pub search: SearchConfig,
}

/// Site and artifact paths
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Directory containing the HTML pages to graph. Every `.html`/`.htm`
    /// file below it becomes one page, keyed by its file name.
    pub root: PathBuf,
    /// Where the node-link graph JSON is written/read.
    pub graph_path: PathBuf,
    /// Where the retrieval index JSON is written/read.
    pub index_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    pub provider: String,
    pub model: String,
    pub api_key_env: String,
    pub batch_size: usize,
    /// Expected vector dimension; enforced on index build, load and query.
    pub dimensions: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_cache_capacity() -> usize {
    1000
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub default_k: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in SITEGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("SITEGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Existence of `site.root` is checked by the build command, not here,
    /// so that query-only usage works off a persisted index alone.
    fn validate(&self) -> Result<()> {
        if self.search.default_k == 0 {
            anyhow::bail!("search.default_k must be greater than 0");
        }

        if self.embeddings.dimensions == 0 {
            anyhow::bail!("embeddings.dimensions must be greater than 0");
        }

        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }

        Ok(())
    }

    /// Get the site root directory
    pub fn site_root(&self) -> &Path {
        &self.site.root
    }

    /// Get the graph JSON path
    pub fn graph_path(&self) -> &Path {
        &self.site.graph_path
    }

    /// Get the retrieval index JSON path
    pub fn index_path(&self) -> &Path {
        &self.site.index_path
    }
}

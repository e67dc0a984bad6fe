use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Directory uploaded images are written to and served from
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Built front end, served for every path the API doesn't claim
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Entries taken from each feed before merging
    #[serde(default = "default_items_per_feed")]
    pub items_per_feed: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    /// Only ever taken from the environment, see [`Config::apply_env`]
    #[serde(skip)]
    pub admin_secret: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_database_url() -> String {
    "sqlite:articles.db?mode=rwc".to_string()
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("public/uploads")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_items_per_feed() -> usize {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: String,
    /// Source label used when the feed itself carries no title
    #[serde(default)]
    pub name: Option<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Pull `ADMIN_PASSWORD` and `DATABASE_URL` from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secret) = lookup("ADMIN_PASSWORD") {
            self.admin_secret = Some(secret);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        self
    }
}

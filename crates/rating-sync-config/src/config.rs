use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reserved contributor choice that switches the form to free-text entry.
pub const OTHERS_SENTINEL: &str = "OTHERS";

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub local: Option<LocalConfig>,
    /// The fixed contributor set offered by the submission form. The
    /// OTHERS escape is always offered in addition to these.
    #[serde(default = "default_contributors")]
    pub contributors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Remote,
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base REST URL, e.g. https://xyz.supabase.co/rest/v1
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    /// Change-feed fingerprint poll interval.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Path of the persisted collection. Defaults to the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_table() -> String {
    "movies".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_contributors() -> Vec<String> {
    ["Dad", "Mom", "Kuya", "Ate", "Bunso"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            remote: None,
            local: None,
            contributors: default_contributors(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        match self.backend {
            StoreBackend::Remote => {
                let remote = self
                    .remote
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("backend is 'remote' but [remote] is not configured"))?;
                if remote.url.trim().is_empty() {
                    return Err(anyhow::anyhow!("remote.url must not be empty"));
                }
                if remote.api_key.trim().is_empty() {
                    return Err(anyhow::anyhow!("remote.api_key must not be empty"));
                }
                if remote.poll_interval_secs == 0 {
                    return Err(anyhow::anyhow!("remote.poll_interval_secs must be at least 1"));
                }
            }
            StoreBackend::Local => {}
        }

        if self.contributors.iter().any(|c| c.trim().is_empty()) {
            return Err(anyhow::anyhow!("contributors must not contain empty names"));
        }
        if self
            .contributors
            .iter()
            .any(|c| c.eq_ignore_ascii_case(OTHERS_SENTINEL))
        {
            return Err(anyhow::anyhow!(
                "'{}' is reserved for free-text entry and cannot be a configured contributor",
                OTHERS_SENTINEL
            ));
        }

        Ok(())
    }
}

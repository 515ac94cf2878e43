use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("kinolog");

        Ok(Self {
            config_dir: base_dir.clone(),
            data_dir: base_dir.join("data"),
            log_dir: base_dir.join("logs"),
        })
    }

    /// Override the base directory, e.g. for tests or a portable install.
    pub fn with_base_dir(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// The local backend's persisted collection.
    pub fn ratings_file(&self) -> PathBuf {
        self.data_dir.join("ratings.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("kinolog.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // Environment override first (portable installs, tests), then the
        // platform config directory, e.g. ~/.config/kinolog on Linux.
        if let Ok(base) = std::env::var("KINOLOG_BASE_PATH") {
            return Self::with_base_dir(PathBuf::from(base));
        }
        Self::new().unwrap_or_else(|_| Self::with_base_dir(PathBuf::from(".kinolog")))
    }
}

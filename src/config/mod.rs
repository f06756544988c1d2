use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::notice::DEFAULT_NOTICE_DURATION;
use crate::store::NoteOrder;

pub mod accent;

pub use accent::AccentColor;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Notedown";
const APP_NAME: &str = "notedown";

pub const CONFIG_ENV: &str = "NOTEDOWN_CONFIG";
pub const DATA_ENV: &str = "NOTEDOWN_DATA";

const MIN_TICK_MS: u64 = 16;

/// Explicit locations that win over the environment and the XDG defaults.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl PathOverrides {
    /// Fills unset entries from `NOTEDOWN_CONFIG` / `NOTEDOWN_DATA`.
    pub fn or_env(mut self) -> Self {
        if self.config.is_none() {
            self.config = env::var_os(CONFIG_ENV).map(PathBuf::from);
        }
        if self.data_dir.is_none() {
            self.data_dir = env::var_os(DATA_ENV).map(PathBuf::from);
        }
        self
    }
}

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover(overrides: PathOverrides) -> Result<Self> {
        let paths = ConfigPaths::discover(&overrides.or_env())?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths)?;
            self.write_default_config(&default_cfg)?;
            tracing::info!(path = %self.paths.config_file.display(), "wrote default config");
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub json_path: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover(overrides: &PathOverrides) -> Result<Self> {
        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME);
        let require_dirs = || {
            project_dirs
                .as_ref()
                .context("resolving XDG project directories")
        };

        let (config_dir, config_file) = match overrides.config.clone() {
            Some(path) if path.is_dir() => (path.clone(), path.join("config.toml")),
            Some(path) => {
                let dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (dir, path)
            }
            None => {
                let dir = require_dirs()?.config_dir().to_path_buf();
                let file = dir.join("config.toml");
                (dir, file)
            }
        };

        let data_dir = match overrides.data_dir.clone() {
            Some(path) => path,
            None => require_dirs()?.data_dir().to_path_buf(),
        };

        let log_dir = match project_dirs.as_ref().and_then(ProjectDirs::state_dir) {
            Some(state) if overrides.data_dir.is_none() => state.join("logs"),
            _ => data_dir.join("logs"),
        };

        Ok(Self::from_parts(config_dir, config_file, data_dir, log_dir))
    }

    /// Everything under one directory; used by tests and portable installs.
    pub fn rooted(root: &Path) -> Self {
        let config_dir = root.join("config");
        let config_file = config_dir.join("config.toml");
        let data_dir = root.join("data");
        let log_dir = data_dir.join("logs");
        Self::from_parts(config_dir, config_file, data_dir, log_dir)
    }

    fn from_parts(
        config_dir: PathBuf,
        config_file: PathBuf,
        data_dir: PathBuf,
        log_dir: PathBuf,
    ) -> Self {
        Self {
            database_path: data_dir.join("notes.db"),
            json_path: data_dir.join("notes.json"),
            config_dir,
            config_file,
            data_dir,
            log_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub accent: AccentColor,
    /// How long transient notices stay visible.
    pub notice_ms: u64,
    /// Event loop poll interval.
    pub tick_ms: u64,
    pub list_order: NoteOrder,
    pub storage: StorageOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            accent: AccentColor::default(),
            notice_ms: DEFAULT_NOTICE_DURATION.as_millis() as u64,
            tick_ms: 100,
            list_order: NoteOrder::Alphabetical,
            storage: StorageOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.storage.backend = self.backend;
        self.storage
            .resolve(paths)
            .context("resolving storage paths")?;
        if self.tick_ms < MIN_TICK_MS {
            tracing::warn!(tick_ms = self.tick_ms, "tick_ms too small, clamping");
            self.tick_ms = MIN_TICK_MS;
        }
        if self.notice_ms == 0 {
            tracing::warn!("notice_ms of 0 would hide every notice, using default");
            self.notice_ms = DEFAULT_NOTICE_DURATION.as_millis() as u64;
        }
        Ok(())
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub backend: BackendKind,
    #[serde(skip)]
    pub database_path: PathBuf,
    #[serde(skip)]
    pub json_path: PathBuf,
    pub wal_autocheckpoint: u32,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            database_path: PathBuf::new(),
            json_path: PathBuf::new(),
            wal_autocheckpoint: 1000,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
        if self.json_path.as_os_str().is_empty() {
            self.json_path = paths.json_path.clone();
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::exercise::{Difficulty, Subject};
use crate::session::SessionSettings;
use crate::summary::GradeBands;

pub const DEFAULT_DURATIONS_SECS: [u64; 4] = [300, 600, 900, 1800];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub subject: Subject,
    pub session_durations_secs: Vec<u64>,
    pub timed_difficulty: Difficulty,
    pub grade_bands: GradeBands,
    pub tick_rate_ms: u64,
    pub persist: bool,
    pub bank_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subject: Subject::Arithmetic,
            session_durations_secs: DEFAULT_DURATIONS_SECS.to_vec(),
            timed_difficulty: Difficulty::Medium,
            grade_bands: GradeBands::default(),
            tick_rate_ms: 100,
            persist: true,
            bank_path: None,
        }
    }
}

impl Config {
    /// Duration menu with zero and repeated entries dropped, in configured order.
    /// Falls back to the default menu when nothing usable is left.
    pub fn durations(&self) -> Vec<u64> {
        let mut seen = Vec::new();
        for &secs in &self.session_durations_secs {
            if secs > 0 && !seen.contains(&secs) {
                seen.push(secs);
            }
        }
        if seen.is_empty() {
            DEFAULT_DURATIONS_SECS.to_vec()
        } else {
            seen
        }
    }

    pub fn tick_rate_ms(&self) -> u64 {
        self.tick_rate_ms.clamp(10, 1000)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            durations: self.durations(),
            timed_difficulty: self.timed_difficulty,
            grade_bands: self.grade_bands,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("mathdrill_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

use crate::persistence::PersistenceResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_PATH_ENV: &str = "TIMETABLER_DB_PATH";
pub const BUSY_TIMEOUT_ENV: &str = "TIMETABLER_BUSY_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub sqlite_path: PathBuf,
    /// How long a writer waits for another event's transaction to release
    /// the database before giving up.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("timetabler.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Defaults overridden by `TIMETABLER_DB_PATH` and
    /// `TIMETABLER_BUSY_TIMEOUT_MS`. Unparseable timeouts are ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            self.sqlite_path = PathBuf::from(path);
        }
        if let Some(timeout) = lookup(BUSY_TIMEOUT_ENV).and_then(|t| t.trim().parse().ok()) {
            self.busy_timeout_ms = timeout;
        }
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

//! Platform-specific application data directory.
//!
//! - **Windows**: `%LOCALAPPDATA%\jtimer`
//! - **macOS**: `~/Library/Application Support/jtimer`
//! - **Linux**: `~/.local/share/jtimer`
//!
//! `JTIMER_HOME` overrides the location entirely.

use anyhow::Result;
use std::env::consts::OS;
use std::env::var;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "jtimer";
pub const HOME_ENV: &str = "JTIMER_HOME";

#[derive(Clone, Debug)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStorage {
    pub fn new() -> Self {
        if let Ok(home) = var(HOME_ENV) {
            return Self { base_path: PathBuf::from(home) };
        }
        let base_path = match OS {
            "windows" => var("LOCALAPPDATA").unwrap_or_else(|_| ".".into()),
            "macos" => var("HOME").unwrap_or_else(|_| ".".into()) + "/Library/Application Support",
            _ => var("HOME").unwrap_or_else(|_| ".".into()) + "/.local/share",
        };
        Self {
            base_path: Path::new(&base_path).join(APP_NAME),
        }
    }

    /// Resolves `file_name` inside the data directory, creating the directory on first use.
    pub fn get_path(&self, file_name: &str) -> Result<PathBuf> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path)?;
        }
        Ok(self.base_path.join(file_name))
    }
}

//! Persistent configuration and state.
//!
//! Everything jtimer keeps between runs lives in one JSON document,
//! `config.json` in the data directory, split into independent slots:
//!
//! | slot                    | contents                          |
//! |-------------------------|-----------------------------------|
//! | `jira`                  | host and sealed credentials       |
//! | `activeTimer`           | the running or paused timer       |
//! | `failedWorklogs`        | the offline queue                 |
//! | `defaultWorklogMessage` | prefilled worklog description     |
//!
//! Slots are read and written one at a time. Each write replaces the whole
//! file through a temporary file and a rename, so a crash leaves either the
//! old or the new document and at most one slot stale.

use super::data_storage::DataStorage;
use crate::api::jira::JiraConfig;
use crate::libs::queue::FailedWorklog;
use crate::libs::timer::TimerState;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const JIRA_KEY: &str = "jira";
pub const ACTIVE_TIMER_KEY: &str = "activeTimer";
pub const FAILED_WORKLOGS_KEY: &str = "failedWorklogs";
pub const DEFAULT_MESSAGE_KEY: &str = "defaultWorklogMessage";

/// Slot-based key/value persistence with typed accessors.
///
/// Implementors provide the three raw operations; the typed accessors are
/// derived from them.
pub trait ConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;

    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value).with_context(|| format!("malformed `{}` entry", key))?)),
            None => Ok(None),
        }
    }

    fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }

    fn jira(&self) -> Result<Option<JiraConfig>> {
        self.get_typed(JIRA_KEY)
    }

    fn set_jira(&self, config: &JiraConfig) -> Result<()> {
        self.set_typed(JIRA_KEY, config)
    }

    fn delete_jira(&self) -> Result<()> {
        self.delete(JIRA_KEY)
    }

    fn active_timer(&self) -> Result<Option<TimerState>> {
        self.get_typed(ACTIVE_TIMER_KEY)
    }

    fn set_active_timer(&self, timer: &TimerState) -> Result<()> {
        self.set_typed(ACTIVE_TIMER_KEY, timer)
    }

    fn delete_active_timer(&self) -> Result<()> {
        self.delete(ACTIVE_TIMER_KEY)
    }

    /// The queue slot as stored; validation is the queue's job.
    fn failed_worklogs_raw(&self) -> Result<Option<Value>> {
        self.get(FAILED_WORKLOGS_KEY)
    }

    fn set_failed_worklogs(&self, entries: &[FailedWorklog]) -> Result<()> {
        self.set_typed(FAILED_WORKLOGS_KEY, &entries)
    }

    fn delete_failed_worklogs(&self) -> Result<()> {
        self.delete(FAILED_WORKLOGS_KEY)
    }

    fn default_message(&self) -> Result<Option<String>> {
        Ok(self.get_typed::<String>(DEFAULT_MESSAGE_KEY)?.filter(|message| !message.trim().is_empty()))
    }

    fn set_default_message(&self, message: &str) -> Result<()> {
        self.set_typed(DEFAULT_MESSAGE_KEY, &message)
    }

    fn delete_default_message(&self) -> Result<()> {
        self.delete(DEFAULT_MESSAGE_KEY)
    }
}

impl<T: ConfigStore + ?Sized> ConfigStore for &T {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// [`ConfigStore`] over a JSON file.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// The store in the platform data directory.
    pub fn new() -> Result<Self> {
        Ok(Self::at(DataStorage::new().get_path(CONFIG_FILE_NAME)?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path).with_context(|| format!("failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content).with_context(|| format!("failed to parse {}", self.path.display()))? {
            Value::Object(document) => Ok(document),
            _ => anyhow::bail!("{} does not hold a JSON object", self.path.display()),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(document)?)?;
        fs::rename(&tmp_path, &self.path).with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl ConfigStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_document()?.remove(key).filter(|value| !value.is_null()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value);
        self.write_document(&document)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut document = self.read_document()?;
        if document.remove(key).is_some() {
            self.write_document(&document)?;
        }
        Ok(())
    }
}

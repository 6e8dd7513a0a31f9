#![allow(dead_code)]

use chrono::{DateTime, Utc};
use jtimer::api::{ApiError, AuthProvider, CurrentUser, Issue, IssueService, JiraConfig, WorklogResult};
use jtimer::libs::clock::Clock;
use jtimer::libs::config::{ConfigStore, FileStore};
use jtimer::libs::poster::Reauthenticate;
use std::cell::{Cell, RefCell};
use serde_json::Value;
use std::collections::VecDeque;
use tempfile::TempDir;

/// 2024-01-15T09:00:00Z
pub const T0: i64 = 1_705_309_200_000;

/// Clock that only moves when told to.
pub struct ManualClock(Cell<i64>);

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self(Cell::new(now))
    }

    pub fn advance_secs(&self, seconds: i64) {
        self.0.set(self.0.get() + seconds * 1000);
    }

    pub fn set(&self, now: i64) {
        self.0.set(now);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

/// A `config.json` in its own temporary directory.
pub fn temp_store() -> (TempDir, FileStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::at(dir.path().join("config.json"));
    (dir, store)
}

/// A [`FileStore`] whose listed slots reject every write.
pub struct FailingStore {
    pub inner: FileStore,
    pub read_only: Vec<&'static str>,
}

impl FailingStore {
    pub fn new(inner: FileStore, read_only: &[&'static str]) -> Self {
        Self {
            inner,
            read_only: read_only.to_vec(),
        }
    }
}

impl ConfigStore for FailingStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        if self.read_only.contains(&key) {
            anyhow::bail!("no space left on device");
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.inner.delete(key)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostCall {
    pub issue_key: String,
    pub seconds: i64,
    pub comment: String,
    pub started: DateTime<Utc>,
}

/// Issue service answering from scripts. Posts succeed unless a scripted
/// result says otherwise.
#[derive(Default)]
pub struct MockService {
    pub issues: Vec<Issue>,
    pub post_results: RefCell<VecDeque<Result<(), ApiError>>>,
    pub posts: RefCell<Vec<PostCall>>,
    pub expiring: Cell<bool>,
    pub refresh_result: Option<ApiError>,
    pub refreshes: Cell<usize>,
    pub reauth_result: Option<ApiError>,
    pub reauths: Cell<usize>,
    pub config: Option<JiraConfig>,
    pub offline: bool,
}

impl MockService {
    pub fn with_post_results(results: Vec<Result<(), ApiError>>) -> Self {
        Self {
            post_results: RefCell::new(results.into()),
            ..Self::default()
        }
    }

    pub fn posted_seconds(&self) -> Vec<i64> {
        self.posts.borrow().iter().map(|call| call.seconds).collect()
    }
}

impl IssueService for MockService {
    async fn get_issue(&self, key: &str) -> Result<Issue, ApiError> {
        self.issues
            .iter()
            .find(|issue| issue.key == key)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(key.to_string()))
    }

    async fn search_assigned(&self) -> Result<Vec<Issue>, ApiError> {
        Ok(self.issues.clone())
    }

    async fn post_worklog(&self, key: &str, seconds: i64, comment: &str, started: DateTime<Utc>) -> Result<WorklogResult, ApiError> {
        self.posts.borrow_mut().push(PostCall {
            issue_key: key.to_string(),
            seconds,
            comment: comment.to_string(),
            started,
        });
        let outcome = self.post_results.borrow_mut().pop_front().unwrap_or(Ok(()));
        outcome.map(|()| WorklogResult {
            id: format!("{}", self.posts.borrow().len()),
            issue_key: key.to_string(),
            time_spent_seconds: seconds,
            started: started.to_rfc3339(),
            comment: comment.to_string(),
        })
    }

    async fn test_connection(&self) -> bool {
        !self.offline
    }

    async fn get_current_user(&self) -> Result<CurrentUser, ApiError> {
        Ok(CurrentUser {
            display_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        })
    }
}

impl AuthProvider for MockService {
    fn needs_refresh(&self, _now_ms: i64) -> bool {
        self.expiring.get()
    }

    async fn refresh(&mut self) -> Result<(), ApiError> {
        self.refreshes.set(self.refreshes.get() + 1);
        match &self.refresh_result {
            Some(error) => Err(error.clone()),
            None => {
                self.expiring.set(false);
                Ok(())
            }
        }
    }

    async fn reauthenticate(&mut self) -> Result<(), ApiError> {
        self.reauths.set(self.reauths.get() + 1);
        match &self.reauth_result {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn credentials(&self) -> Option<&JiraConfig> {
        self.config.as_ref()
    }
}

/// Answers re-authentication prompts from a script; `false` once it runs out.
#[derive(Default)]
pub struct ScriptedReauth {
    pub answers: VecDeque<bool>,
    pub prompts: usize,
}

impl ScriptedReauth {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: answers.into(),
            prompts: 0,
        }
    }
}

impl<S> Reauthenticate<S> for ScriptedReauth {
    async fn reauthenticate(&mut self, _service: &mut S) -> bool {
        self.prompts += 1;
        self.answers.pop_front().unwrap_or(false)
    }
}

impl<S> Reauthenticate<S> for &mut ScriptedReauth {
    async fn reauthenticate(&mut self, service: &mut S) -> bool {
        <ScriptedReauth as Reauthenticate<S>>::reauthenticate(&mut **self, service).await
    }
}

pub fn issue(key: &str, summary: &str) -> Issue {
    Issue {
        key: key.to_string(),
        summary: summary.to_string(),
        status: "In Progress".to_string(),
    }
}

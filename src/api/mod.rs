//! Remote issue tracker integration.
//!
//! The worklog pipeline talks to Jira only through two traits:
//!
//! - [`IssueService`]: issue lookup, assigned-issue search, worklog creation
//!   and identity checks, with failures classified into [`ApiError`]
//! - [`AuthProvider`]: whether the stored credential is about to expire, and
//!   how to refresh or replace it
//!
//! [`jira::Jira`] implements both over the Jira Cloud REST API. Tests provide
//! scripted implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod auth;
pub mod jira;

pub use auth::Auth;
pub use jira::{Jira, JiraConfig};

/// Failure classes of a remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The issue key is unknown to the server (issue lookup only).
    #[error("issue {0} was not found")]
    NotFound(String),
    /// The credential is missing, expired or invalid (HTTP 401).
    #[error("authentication failed")]
    AuthenticationFailed,
    /// Authenticated, but not allowed to perform this write (HTTP 403).
    #[error("permission denied")]
    PermissionDenied,
    /// Network, parsing or any other unclassified failure.
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::AuthenticationFailed)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Unknown(error.to_string())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub status: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub display_name: String,
    pub email: String,
}

/// A worklog the server accepted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorklogResult {
    pub id: String,
    pub issue_key: String,
    pub time_spent_seconds: i64,
    pub started: String,
    pub comment: String,
}

#[allow(async_fn_in_trait)]
pub trait IssueService {
    async fn get_issue(&self, key: &str) -> Result<Issue, ApiError>;

    /// Open issues assigned to the current user.
    async fn search_assigned(&self) -> Result<Vec<Issue>, ApiError>;

    /// Creates a worklog. `seconds` is sent as given; the minimum is enforced
    /// by the caller.
    async fn post_worklog(
        &self,
        key: &str,
        seconds: i64,
        comment: &str,
        started: DateTime<Utc>,
    ) -> Result<WorklogResult, ApiError>;

    async fn test_connection(&self) -> bool;

    async fn get_current_user(&self) -> Result<CurrentUser, ApiError>;
}

#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    /// Whether the credential should be refreshed before the next call.
    fn needs_refresh(&self, now_ms: i64) -> bool;

    /// Renews an expiring credential without user interaction.
    async fn refresh(&mut self) -> Result<(), ApiError>;

    /// Replaces a rejected credential, prompting the user if needed.
    async fn reauthenticate(&mut self) -> Result<(), ApiError>;

    /// Current connection settings, to be persisted after a change.
    fn credentials(&self) -> Option<&JiraConfig>;
}

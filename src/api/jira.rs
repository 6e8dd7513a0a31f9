use super::{ApiError, Auth, AuthProvider, CurrentUser, Issue, IssueService, WorklogResult};
use crate::libs::formatter::JIRA_DATETIME_FORMAT;
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::msg_print;
use anyhow::Result;
use chrono::{DateTime, Utc};
use dialoguer::{theme::ColorfulTheme, Input};
use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const API_PATH: &str = "rest/api/3";
const ASSIGNED_JQL: &str = "assignee = currentUser() AND statusCategory != Done ORDER BY updated DESC";
const SEARCH_FIELDS: &str = "summary,status";
const SEARCH_LIMIT: &str = "50";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize, Debug)]
struct JiraIssue {
    key: String,
    fields: JiraIssueFields,
}

#[derive(Deserialize, Debug)]
struct JiraIssueFields {
    summary: String,
    status: JiraStatus,
}

#[derive(Deserialize, Debug)]
struct JiraStatus {
    name: String,
}

#[derive(Deserialize, Debug)]
struct JiraSearchResults {
    issues: Vec<JiraIssue>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JiraUser {
    display_name: String,
    #[serde(default)]
    email_address: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JiraWorklog {
    id: String,
    #[serde(default)]
    started: Option<String>,
    #[serde(default)]
    time_spent_seconds: Option<i64>,
}

impl From<JiraIssue> for Issue {
    fn from(issue: JiraIssue) -> Self {
        Issue {
            key: issue.key,
            summary: issue.fields.summary,
            status: issue.fields.status.name,
        }
    }
}

/// Jira Cloud REST client.
pub struct Jira {
    client: Client,
    config: JiraConfig,
    secret: Secret,
}

impl fmt::Debug for Jira {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Jira").field("host", &self.config.host).finish_non_exhaustive()
    }
}

impl Jira {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            config: config.clone(),
            secret: Secret::new(&Message::PromptJiraToken.to_string()),
        })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = format!("{}/{}/{}", self.config.auth.base_url(&self.config.host), API_PATH, path);
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, self.config.auth.header_value(&self.secret)?)
            .header(ACCEPT, "application/json"))
    }

    async fn fetch_user(&self) -> Result<CurrentUser, ApiError> {
        let res = self.request(Method::GET, "myself")?.send().await?;
        let res = check(res, None).await?;
        let user = res.json::<JiraUser>().await?;
        Ok(CurrentUser {
            display_name: user.display_name,
            email: user.email_address.unwrap_or_default(),
        })
    }
}

/// Maps a non-success response to an [`ApiError`].
///
/// `issue_key` enables the not-found classification; worklog posts leave it
/// out and treat 404 as an ordinary failure.
async fn check(res: Response, issue_key: Option<&str>) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    match (status, issue_key) {
        (StatusCode::UNAUTHORIZED, _) => Err(ApiError::AuthenticationFailed),
        (StatusCode::FORBIDDEN, _) => Err(ApiError::PermissionDenied),
        (StatusCode::NOT_FOUND, Some(key)) => Err(ApiError::NotFound(key.to_string())),
        _ => {
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::Unknown(format!("HTTP {}: {}", status, error_text(&body))))
        }
    }
}

/// Pulls `errorMessages`/`errors` out of a Jira error body, falling back to the raw text.
fn error_text(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    let mut messages: Vec<String> = value["errorMessages"]
        .as_array()
        .map(|items| items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    if let Some(errors) = value["errors"].as_object() {
        messages.extend(errors.iter().map(|(field, error)| format!("{}: {}", field, error.as_str().unwrap_or_default())));
    }
    if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    }
}

/// Worklog comment as an Atlassian Document Format paragraph.
fn adf_comment(text: &str) -> serde_json::Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        }]
    })
}

impl IssueService for Jira {
    async fn get_issue(&self, key: &str) -> Result<Issue, ApiError> {
        let res = self
            .request(Method::GET, &format!("issue/{}", key))?
            .query(&[("fields", SEARCH_FIELDS)])
            .send()
            .await?;
        let issue = check(res, Some(key)).await?.json::<JiraIssue>().await?;
        Ok(issue.into())
    }

    async fn search_assigned(&self) -> Result<Vec<Issue>, ApiError> {
        let res = self
            .request(Method::GET, "search/jql")?
            .query(&[("jql", ASSIGNED_JQL), ("fields", SEARCH_FIELDS), ("maxResults", SEARCH_LIMIT)])
            .send()
            .await?;
        let results = check(res, None).await?.json::<JiraSearchResults>().await?;
        Ok(results.issues.into_iter().map(Issue::from).collect())
    }

    async fn post_worklog(&self, key: &str, seconds: i64, comment: &str, started: DateTime<Utc>) -> Result<WorklogResult, ApiError> {
        let started = started.format(JIRA_DATETIME_FORMAT).to_string();
        let mut body = json!({
            "timeSpentSeconds": seconds,
            "started": started,
        });
        if !comment.trim().is_empty() {
            body["comment"] = adf_comment(comment);
        }

        debug!(issue_key = key, seconds, %started, "posting worklog");
        let res = self
            .request(Method::POST, &format!("issue/{}/worklog", key))?
            .json(&body)
            .send()
            .await?;
        let worklog = check(res, None).await?.json::<JiraWorklog>().await?;
        Ok(WorklogResult {
            id: worklog.id,
            issue_key: key.to_string(),
            time_spent_seconds: worklog.time_spent_seconds.unwrap_or(seconds),
            started: worklog.started.unwrap_or(started),
            comment: comment.to_string(),
        })
    }

    async fn test_connection(&self) -> bool {
        self.fetch_user().await.is_ok()
    }

    async fn get_current_user(&self) -> Result<CurrentUser, ApiError> {
        self.fetch_user().await
    }
}

impl AuthProvider for Jira {
    fn needs_refresh(&self, now_ms: i64) -> bool {
        self.config.auth.needs_refresh(now_ms)
    }

    async fn refresh(&mut self) -> Result<(), ApiError> {
        let now_ms = Utc::now().timestamp_millis();
        self.config.auth = self.config.auth.refreshed(&self.client, &self.secret, now_ms).await?;
        Ok(())
    }

    async fn reauthenticate(&mut self) -> Result<(), ApiError> {
        match &self.config.auth {
            Auth::ApiToken { email, .. } => {
                let token = self.secret.prompt().map_err(|e| ApiError::Unknown(e.to_string()))?;
                self.config.auth = Auth::ApiToken { email: email.clone(), token };
            }
            Auth::OAuth { .. } => self.refresh().await?,
        }
        self.fetch_user().await.map(|_| ())
    }

    fn credentials(&self) -> Option<&JiraConfig> {
        Some(&self.config)
    }
}

/// Connection settings stored under the `jira` slot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JiraConfig {
    pub host: String,
    pub auth: Auth,
}

impl JiraConfig {
    /// Interactive setup for API-token authentication.
    ///
    /// Existing values are offered as defaults; the token is always asked for
    /// again and stored sealed.
    pub fn init(config: &Option<Self>) -> Result<Self> {
        let (host, email) = match config {
            Some(JiraConfig {
                host,
                auth: Auth::ApiToken { email, .. },
            }) => (host.clone(), email.clone()),
            Some(JiraConfig { host, .. }) => (host.clone(), String::new()),
            None => (String::new(), String::new()),
        };
        msg_print!(Message::ConfigModuleJira);
        let host: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptJiraHost.to_string())
            .default(host)
            .interact_text()?;
        let email: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptJiraEmail.to_string())
            .default(email)
            .interact_text()?;
        let token = Secret::new(&Message::PromptJiraToken.to_string()).prompt()?;

        Ok(Self {
            host: normalize_host(&host),
            auth: Auth::ApiToken { email, token },
        })
    }
}

/// Adds `https://` when missing and drops trailing slashes.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

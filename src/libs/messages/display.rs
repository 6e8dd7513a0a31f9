//! Display implementation for jtimer application messages.
//!
//! All user-facing text is defined here, in one match, so the wording stays
//! consistent across commands. Messages reporting a failure always say what
//! happened to the unlogged time.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TIMER MESSAGES ===
            Message::TimerStarted { issue_key, summary } => format!("Timer started for {}: {}", issue_key, summary),
            Message::TimerReattached(key) => format!("Resumed tracking session for {}", key),
            Message::TimerPaused(elapsed) => format!("Timer paused at {}", elapsed),
            Message::TimerResumed(elapsed) => format!("Timer resumed at {}", elapsed),
            Message::TimerStatus { issue_key, elapsed, state } => format!("{}  {}  [{}]", issue_key, elapsed, state),
            Message::TimerStateRunning => "running".to_string(),
            Message::TimerStatePaused => "paused".to_string(),
            Message::ActiveTimerExists(key) => {
                format!("A timer for {} is already active. Use `jtimer resume` to continue it.", key)
            }
            Message::NoActiveTimer => "No active timer. Start one with `jtimer start <ISSUE>`.".to_string(),
            Message::TimerDetached(key) => {
                format!("Timer for {} keeps running. Use `jtimer resume` to come back to it.", key)
            }
            Message::TimerDiscarded(key) => format!("Timer for {} discarded without logging.", key),
            Message::ConfirmDiscard(elapsed) => format!("You have tracked {}. Discard it without logging?", elapsed),
            Message::TimerStopped { issue_key, elapsed } => format!("Stopped {} after {}", issue_key, elapsed),

            // === WORKLOG MESSAGES ===
            Message::WorklogLogged { issue_key, time } => format!("Logged {} to {}", time, issue_key),
            Message::WorklogsLogged { succeeded, total, issue_key } => {
                format!("Logged {} of {} worklog(s) to {}", succeeded, total, issue_key)
            }
            Message::WorklogsPartiallyLogged { succeeded, total, error } => {
                format!("Only {} of {} worklog(s) were logged: {}", succeeded, total, error)
            }
            Message::WorklogsFailed { total, error } => format!("None of {} worklog(s) could be logged: {}", total, error),
            Message::UnloggedTimeQueued(count) => format!(
                "{} unlogged entr{} saved to the offline queue. Run `jtimer queue retry` or start a new timer to retry.",
                count,
                if *count == 1 { "y was" } else { "ies were" }
            ),
            Message::WorklogNotQueued { issue_key, time, started } => format!(
                "Could not save the unlogged {} for {} (started {}) to the offline queue. Log it in Jira by hand.",
                time, issue_key, started
            ),
            Message::RoundedEntriesNotice(count) => {
                format!("{} entr{} shorter than 1m will be rounded up to 1m by Jira.", count, if *count == 1 { "y" } else { "ies" })
            }
            Message::SubmissionPreview(count) => format!("About to log {} worklog(s):", count),

            // === OFFLINE QUEUE MESSAGES ===
            Message::QueueRetrying(count) => format!("Retrying {} queued worklog(s)...", count),
            Message::QueueRetryResult { total, succeeded, failed } => {
                format!("Queued worklogs: {} total, {} logged, {} still queued", total, succeeded, failed)
            }
            Message::QueueEmpty => "The offline queue is empty.".to_string(),
            Message::QueueHeader(count) => format!("{} worklog(s) waiting in the offline queue", count),
            Message::QueueCleared(count) => format!("Removed {} worklog(s) from the offline queue.", count),
            Message::QueueEntryRemoved(index) => format!("Removed queued worklog #{}.", index),
            Message::QueueIndexOutOfRange { index, len } => {
                format!("No queued worklog #{} (the queue holds {} entr{}).", index, len, if *len == 1 { "y" } else { "ies" })
            }
            Message::QueueMalformed => "Stored offline queue is malformed, treating it as empty.".to_string(),
            Message::ConfirmQueueClear(count) => {
                format!("Discard {} queued worklog(s)? Their time will not be logged.", count)
            }

            // === AUTHENTICATION MESSAGES ===
            Message::NotConfigured => "Jira is not configured. Run `jtimer init` first.".to_string(),
            Message::AuthRefreshFailed(error) => {
                format!("Could not refresh Jira credentials: {}. Run `jtimer init` to sign in again.", error)
            }
            Message::ConfirmReauthenticate => "Jira rejected the credentials. Re-authenticate now?".to_string(),
            Message::ReauthSucceeded => "Re-authenticated with Jira.".to_string(),
            Message::ReauthFailed(error) => format!("Re-authentication failed: {}", error),
            Message::CredentialsRemoved => "Stored Jira credentials removed.".to_string(),
            Message::OAuthReauthUnsupported => {
                "OAuth sign-in has to be repeated outside jtimer; the stored refresh token was rejected.".to_string()
            }

            // === API MESSAGES ===
            Message::IssueNotFound(key) => format!("Issue {} was not found", key),
            Message::AuthenticationFailed => "Jira authentication failed".to_string(),
            Message::PermissionDenied => "You do not have permission to log work on this issue".to_string(),
            Message::ApiRequestFailed(error) => format!("Jira request failed: {}", error),
            Message::ConnectionOk { display_name, email } => format!("Connected to Jira as {} <{}>", display_name, email),
            Message::ConnectionFailed => "Could not connect to Jira with these settings".to_string(),
            Message::NoAssignedIssues => "No open issues are assigned to you.".to_string(),
            Message::IssueFetchFailed(error) => format!("Could not load the issue: {}", error),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleJira => "Jira settings".to_string(),
            Message::DefaultMessage(text) => format!("Default worklog message: {}", text),
            Message::DefaultMessageNotSet => "No default worklog message set.".to_string(),
            Message::DefaultMessageSaved => "Default worklog message saved.".to_string(),
            Message::DefaultMessageCleared => "Default worklog message cleared.".to_string(),
            Message::DefaultMessageUnreadable(error) => format!("Ignoring the stored default worklog message: {}", error),
            Message::DefaultMessageSaveFailed(error) => format!("Could not save the default worklog message: {}", error),

            // === MENU ITEMS ===
            Message::MenuPause => "Pause".to_string(),
            Message::MenuResume => "Resume".to_string(),
            Message::MenuStop => "Stop and log work".to_string(),
            Message::MenuRefresh => "Refresh".to_string(),
            Message::MenuDetach => "Exit, keep the timer running".to_string(),
            Message::MenuDiscard => "Discard timer".to_string(),
            Message::ModeSplit(count) => format!("Split into {} worklogs, one per work period", count),
            Message::ModeSingle => "Single worklog with the total time".to_string(),
            Message::FetchChoiceRetry => "Retry".to_string(),
            Message::FetchChoiceReauthenticate => "Re-authenticate".to_string(),
            Message::FetchChoiceQuit => "Quit".to_string(),

            // === PROMPTS ===
            Message::PromptJiraHost => "Enter your Jira host (e.g. https://acme.atlassian.net)".to_string(),
            Message::PromptJiraEmail => "Enter your Jira account email".to_string(),
            Message::PromptJiraToken => "Enter your Jira API token".to_string(),
            Message::PromptIssueKey => "Issue key".to_string(),
            Message::PromptSelectIssue => "Select an issue".to_string(),
            Message::PromptTrackingAction => "Action".to_string(),
            Message::PromptDescription => "Worklog description".to_string(),
            Message::PromptSaveDefault => "Save this as the default worklog message?".to_string(),
            Message::PromptSelectMode => "How should the time be logged?".to_string(),
            Message::PromptConfirmSubmit => "Submit to Jira?".to_string(),
            Message::PromptFetchFailed => "What now?".to_string(),
        };
        write!(f, "{}", text)
    }
}

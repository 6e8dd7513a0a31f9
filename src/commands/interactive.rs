//! Terminal front end for a tracking [`Session`].
//!
//! The session core has no clock tick of its own; this loop re-renders the
//! timer every time the user picks a menu item, including "Refresh".

use crate::{
    api::{ApiError, Auth, AuthProvider, Issue, Jira},
    libs::{
        clock::SystemClock,
        config::{ConfigStore, FileStore},
        formatter::{format_time, format_time_human_readable},
        messages::Message,
        poster::{BatchReport, Reauthenticate},
        segmenter::{count_rounded, WorklogMode},
        session::{Intent, Outcome, Phase, Session, Snapshot, Step},
        timer::TimerStatus,
        view::View,
    },
    msg_bail_anyhow, msg_error, msg_error_anyhow, msg_info, msg_print, msg_success, msg_warning,
};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

pub type JiraSession = Session<Jira, FileStore, SystemClock, InteractiveReauth>;

/// Asks before replacing a credential Jira rejected in the middle of a batch.
#[derive(Debug, Default)]
pub struct InteractiveReauth;

impl<S: AuthProvider> Reauthenticate<S> for InteractiveReauth {
    async fn reauthenticate(&mut self, service: &mut S) -> bool {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmReauthenticate.to_string())
            .default(true)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            return false;
        }
        match service.reauthenticate().await {
            Ok(()) => {
                msg_success!(Message::ReauthSucceeded);
                true
            }
            Err(e) => {
                msg_error!(reauth_failure(service.credentials().map(|config| &config.auth), &e));
                false
            }
        }
    }
}

/// The error a failed re-authentication ends the command with.
pub fn reauth_failure(auth: Option<&Auth>, error: &ApiError) -> anyhow::Error {
    if matches!(auth, Some(Auth::OAuth { .. })) && error.is_authentication() {
        msg_error_anyhow!(Message::OAuthReauthUnsupported)
    } else {
        msg_error_anyhow!(Message::ReauthFailed(error.to_string()))
    }
}

/// Opens a session against the configured Jira site.
pub fn open_session() -> Result<JiraSession> {
    let store = FileStore::new()?;
    let Some(config) = store.jira()? else {
        msg_bail_anyhow!(Message::NotConfigured);
    };
    let jira = Jira::new(&config)?;
    Ok(Session::new(jira, store, SystemClock, InteractiveReauth))
}

/// Replays the offline queue and reports the tally.
pub async fn drain_queue(session: &mut JiraSession) -> Result<()> {
    let pending = session.queue().len();
    if pending == 0 {
        return Ok(());
    }
    msg_info!(Message::QueueRetrying(pending));
    if let Some(report) = session.retry_failed_worklogs().await? {
        msg_print!(Message::QueueRetryResult {
            total: report.total,
            succeeded: report.succeeded,
            failed: report.failed,
        });
    }
    Ok(())
}

pub fn api_error_message(error: &ApiError) -> Message {
    match error {
        ApiError::NotFound(key) => Message::IssueNotFound(key.clone()),
        ApiError::AuthenticationFailed => Message::AuthenticationFailed,
        ApiError::PermissionDenied => Message::PermissionDenied,
        ApiError::Unknown(reason) => Message::ApiRequestFailed(reason.clone()),
    }
}

enum FetchChoice {
    Retry,
    Quit,
}

/// Shows a failed lookup and asks how to go on. Authentication failures also
/// offer re-authentication, which is followed by a retry. A failed
/// re-authentication ends the command; nothing persisted is touched.
async fn fetch_failed(session: &mut JiraSession, error: &anyhow::Error) -> Result<FetchChoice> {
    let api_error = error.downcast_ref::<ApiError>();
    match api_error {
        Some(api_error) => msg_error!(Message::IssueFetchFailed(api_error_message(api_error).to_string())),
        None => msg_error!(Message::IssueFetchFailed(error.to_string())),
    }

    let can_reauth = api_error.is_some_and(ApiError::is_authentication);
    let mut choices = vec![Message::FetchChoiceRetry];
    if can_reauth {
        choices.push(Message::FetchChoiceReauthenticate);
    }
    choices.push(Message::FetchChoiceQuit);
    let items: Vec<String> = choices.iter().map(ToString::to_string).collect();

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptFetchFailed.to_string())
        .items(&items)
        .default(0)
        .interact()?;

    match choices[selection] {
        Message::FetchChoiceReauthenticate => {
            if let Err(e) = session.reauthenticate().await {
                return Err(reauth_failure(session.service().credentials().map(|config| &config.auth), &e));
            }
            msg_success!(Message::ReauthSucceeded);
            Ok(FetchChoice::Retry)
        }
        Message::FetchChoiceQuit => Ok(FetchChoice::Quit),
        _ => Ok(FetchChoice::Retry),
    }
}

/// Fetches `key`, looping on retry/re-authenticate until it succeeds or the
/// user quits.
pub async fn fetch_issue(session: &mut JiraSession, key: &str) -> Result<Option<Issue>> {
    loop {
        let error = match session.fetch_issue(key).await {
            Ok(issue) => return Ok(Some(issue)),
            Err(e) => e,
        };
        if let FetchChoice::Quit = fetch_failed(session, &error).await? {
            return Ok(None);
        }
    }
}

/// Lets the user pick one of the assigned issues, or type a key when there
/// are none.
pub async fn select_issue(session: &mut JiraSession) -> Result<Option<String>> {
    let issues = loop {
        let error = match session.assigned_issues().await {
            Ok(issues) => break issues,
            Err(e) => e,
        };
        if let FetchChoice::Quit = fetch_failed(session, &error).await? {
            return Ok(None);
        }
    };

    if issues.is_empty() {
        msg_info!(Message::NoAssignedIssues);
        let key: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptIssueKey.to_string())
            .interact_text()?;
        return Ok(Some(normalize_issue_key(&key)));
    }

    let items: Vec<String> = issues
        .iter()
        .map(|issue| format!("{}  {}  [{}]", issue.key, issue.summary, issue.status))
        .collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptSelectIssue.to_string())
        .items(&items)
        .default(0)
        .interact()?;
    Ok(Some(issues[selection].key.clone()))
}

pub fn normalize_issue_key(key: &str) -> String {
    key.trim().to_uppercase()
}

/// Runs the session until it finishes.
pub async fn track(session: &mut JiraSession) -> Result<()> {
    loop {
        let snapshot = session.snapshot()?;
        let step = match snapshot.phase {
            Phase::Tracking if snapshot.timer.is_none() => {
                msg_info!(Message::NoActiveTimer);
                return Ok(());
            }
            Phase::Tracking => {
                let Some(intent) = tracking_intent(&snapshot)? else {
                    continue;
                };
                let step = session.handle(intent.clone()).await?;
                if step == Step::Continue {
                    report_transition(&intent, &session.snapshot()?);
                }
                step
            }
            Phase::Describing => {
                let intent = describe(session.default_message())?;
                session.handle(intent).await?
            }
            Phase::ChoosingMode => {
                let intent = choose_mode(&snapshot)?;
                session.handle(intent).await?
            }
            Phase::Confirming => {
                let intent = confirm_submission(&snapshot)?;
                session.handle(intent).await?
            }
            Phase::Idle | Phase::Finished => return Ok(()),
        };

        match step {
            Step::Continue | Step::Ignored => {}
            Step::ConfirmQuit { elapsed_seconds } => {
                let discard = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::ConfirmDiscard(format_time_human_readable(elapsed_seconds)).to_string())
                    .default(false)
                    .interact()?;
                if discard {
                    if let Step::Finished(outcome) = session.handle(Intent::Quit { confirmed: true }).await? {
                        report_outcome(outcome);
                        return Ok(());
                    }
                }
            }
            Step::Finished(outcome) => {
                report_outcome(outcome);
                return Ok(());
            }
        }
    }
}

fn tracking_intent(snapshot: &Snapshot) -> Result<Option<Intent>> {
    let Some(timer) = &snapshot.timer else {
        return Ok(None);
    };
    let paused = timer.status() == TimerStatus::Paused;
    let state = if paused { Message::TimerStatePaused } else { Message::TimerStateRunning };
    msg_print!(Message::TimerStatus {
        issue_key: timer.issue_key.clone(),
        elapsed: format_time(snapshot.elapsed_seconds),
        state: state.to_string(),
    });

    let toggle = if paused { Message::MenuResume } else { Message::MenuPause };
    let items = [toggle, Message::MenuStop, Message::MenuRefresh, Message::MenuDetach, Message::MenuDiscard]
        .map(|item| item.to_string());
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptTrackingAction.to_string())
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match selection {
        0 if paused => Some(Intent::Resume),
        0 => Some(Intent::Pause),
        1 => Some(Intent::RequestStop),
        3 => Some(Intent::Detach),
        4 => Some(Intent::Quit { confirmed: false }),
        _ => None,
    })
}

fn report_transition(intent: &Intent, snapshot: &Snapshot) {
    let elapsed = format_time(snapshot.elapsed_seconds);
    match (intent, &snapshot.timer) {
        (Intent::Pause, _) => msg_info!(Message::TimerPaused(elapsed)),
        (Intent::Resume, _) => msg_info!(Message::TimerResumed(elapsed)),
        (Intent::RequestStop, Some(timer)) => msg_print!(
            Message::TimerStopped {
                issue_key: timer.issue_key.clone(),
                elapsed: format_time_human_readable(snapshot.elapsed_seconds),
            },
            true
        ),
        _ => {}
    }
}

fn describe(default_message: Option<String>) -> Result<Intent> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme)
        .with_prompt(Message::PromptDescription.to_string())
        .allow_empty(true);
    if let Some(default_message) = &default_message {
        input = input.default(default_message.clone());
    }
    let text = input.interact_text()?;

    let is_new = !text.trim().is_empty() && default_message.as_deref() != Some(text.trim());
    let save_as_default = is_new
        && Confirm::with_theme(&theme)
            .with_prompt(Message::PromptSaveDefault.to_string())
            .default(false)
            .interact()?;
    Ok(Intent::SubmitDescription { text, save_as_default })
}

fn choose_mode(snapshot: &Snapshot) -> Result<Intent> {
    let items = [Message::ModeSplit(snapshot.entries.len()), Message::ModeSingle].map(|item| item.to_string());
    let default = match snapshot.mode {
        Some(WorklogMode::Single) => 1,
        _ => 0,
    };
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptSelectMode.to_string())
        .items(&items)
        .default(default)
        .interact()?;
    Ok(Intent::ChooseMode(if selection == 0 {
        WorklogMode::Split
    } else {
        WorklogMode::Single
    }))
}

fn confirm_submission(snapshot: &Snapshot) -> Result<Intent> {
    msg_print!(Message::SubmissionPreview(snapshot.entries.len()));
    View::entries(&snapshot.entries)?;
    let rounded = count_rounded(&snapshot.entries);
    if rounded > 0 {
        msg_warning!(Message::RoundedEntriesNotice(rounded));
    }

    let submit = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::PromptConfirmSubmit.to_string())
        .default(true)
        .interact()?;
    Ok(if submit {
        Intent::ConfirmSubmit
    } else {
        Intent::Quit { confirmed: false }
    })
}

pub fn report_batch(report: &BatchReport) {
    let issue_key = report.results.first().map(|result| result.issue_key.clone()).unwrap_or_default();
    let error = report.first_error.clone().unwrap_or_default();
    match (report.succeeded_entries, report.failed_entries) {
        (_, 0) if report.results.len() == 1 => msg_success!(Message::WorklogLogged {
            issue_key,
            time: format_time_human_readable(report.results[0].time_spent_seconds),
        }),
        (succeeded, 0) => msg_success!(Message::WorklogsLogged {
            succeeded,
            total: report.total,
            issue_key,
        }),
        (0, _) => msg_error!(Message::WorklogsFailed { total: report.total, error }),
        (succeeded, _) => msg_warning!(Message::WorklogsPartiallyLogged {
            succeeded,
            total: report.total,
            error,
        }),
    }
    let queued = report.failed_entries - report.unqueued.len();
    if queued > 0 {
        msg_info!(Message::UnloggedTimeQueued(queued));
    }
    for entry in &report.unqueued {
        msg_error!(Message::WorklogNotQueued {
            issue_key: entry.issue_key.clone(),
            time: format_time_human_readable(entry.time_spent_seconds),
            started: entry.started.clone(),
        });
    }
}

fn report_outcome(outcome: Outcome) {
    match outcome {
        Outcome::Logged(report) => report_batch(&report),
        Outcome::Discarded(timer) => msg_info!(Message::TimerDiscarded(timer.issue_key)),
        Outcome::Detached(timer) => msg_info!(Message::TimerDetached(timer.issue_key)),
    }
}

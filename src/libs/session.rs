//! Tracking session orchestration.
//!
//! A [`Session`] owns one tracking run from issue selection to the final
//! worklog submission. It holds no timers of its own: the presentation layer
//! polls [`Session::snapshot`] on its own tick and feeds user actions in as
//! [`Intent`]s. Every intent is answered with a [`Step`] telling the caller
//! whether to keep going, ask for confirmation, or wrap up.
//!
//! ```text
//! Tracking --RequestStop--> Describing --SubmitDescription--> ChoosingMode --ChooseMode--> Confirming
//!    |                                        |                                               |
//!    |                                        +------------(no split possible)--------------->|
//!    +--Detach/Quit--> Finished <---------------------------- ConfirmSubmit / Quit -----------+
//! ```
//!
//! The stop instant is captured once. Elapsed time and segments stay frozen
//! while the user writes the description and picks a mode.

use crate::api::{ApiError, AuthProvider, Issue, IssueService};
use crate::libs::clock::Clock;
use crate::libs::config::ConfigStore;
use crate::libs::messages::Message;
use crate::libs::poster::{BatchReport, Reauthenticate, WorklogPoster};
use crate::libs::queue::{OfflineQueue, RetryReport};
use crate::libs::segmenter::{WorklogEntry, WorklogMode, WorklogPlan};
use crate::libs::timer::{TimerMachine, TimerState};
use crate::{msg_bail_anyhow, msg_error, msg_error_anyhow, msg_warning};
use anyhow::Result;
use tracing::{debug, warn};

/// Quitting with at least this much tracked time needs an explicit confirmation.
pub const QUIT_CONFIRM_THRESHOLD_SECONDS: i64 = 300;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Pause,
    Resume,
    RequestStop,
    SubmitDescription { text: String, save_as_default: bool },
    ChooseMode(WorklogMode),
    ConfirmSubmit,
    Quit { confirmed: bool },
    Detach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Tracking,
    Describing,
    ChoosingMode,
    Confirming,
    Finished,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Logged(BatchReport),
    Discarded(TimerState),
    /// The timer is still persisted and running (or paused).
    Detached(TimerState),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The intent does not apply in the current phase; nothing changed.
    Ignored,
    /// Quitting would throw away this much time; resend with `confirmed`.
    ConfirmQuit { elapsed_seconds: i64 },
    Finished(Outcome),
}

/// What the presentation layer renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub timer: Option<TimerState>,
    pub elapsed_seconds: i64,
    pub phase: Phase,
    pub can_split: bool,
    pub mode: Option<WorklogMode>,
    pub entries: Vec<WorklogEntry>,
}

#[derive(Clone, Debug)]
struct Stopped {
    timer: TimerState,
    elapsed_seconds: i64,
    plan: WorklogPlan,
    mode: WorklogMode,
}

pub struct Session<S, St, C, R> {
    poster: WorklogPoster<S, C>,
    timers: TimerMachine<St, C>,
    queue: OfflineQueue<St>,
    store: St,
    clock: C,
    reauth: R,
    phase: Phase,
    stopped: Option<Stopped>,
}

impl<S, St, C, R> Session<S, St, C, R>
where
    S: IssueService + AuthProvider,
    St: ConfigStore + Clone,
    C: Clock + Clone,
    R: Reauthenticate<S>,
{
    pub fn new(service: S, store: St, clock: C, reauth: R) -> Self {
        Self {
            poster: WorklogPoster::new(service, clock.clone()),
            timers: TimerMachine::new(store.clone(), clock.clone()),
            queue: OfflineQueue::new(store.clone()),
            store,
            clock,
            reauth,
            phase: Phase::Idle,
            stopped: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn service(&self) -> &S {
        self.poster.service()
    }

    pub fn queue(&self) -> &OfflineQueue<St> {
        &self.queue
    }

    /// The persisted timer if it is still running or paused.
    pub fn active_timer(&self) -> Result<Option<TimerState>> {
        Ok(self.timers.active_timer()?.filter(|timer| timer.is_running))
    }

    /// The stored default worklog message. An unreadable slot reads as unset.
    pub fn default_message(&self) -> Option<String> {
        self.store.default_message().unwrap_or_else(|e| {
            msg_warning!(Message::DefaultMessageUnreadable(e.to_string()));
            None
        })
    }

    /// Refreshes an expiring credential and persists the result.
    ///
    /// A failed refresh aborts the current operation; the timer and the queue
    /// are left alone.
    pub async fn ensure_auth(&mut self) -> Result<()> {
        self.refresh_if_expiring()
            .await
            .map_err(|e| msg_error_anyhow!(Message::AuthRefreshFailed(e.to_string())))
    }

    async fn refresh_if_expiring(&mut self) -> Result<(), ApiError> {
        if !self.poster.service().needs_refresh(self.clock.now_ms()) {
            return Ok(());
        }
        debug!("credential expiring, refreshing");
        self.poster.service_mut().refresh().await?;
        self.persist_credentials().map_err(|e| ApiError::Unknown(e.to_string()))
    }

    fn persist_credentials(&self) -> Result<()> {
        if let Some(config) = self.poster.service().credentials() {
            self.store.set_jira(config)?;
        }
        Ok(())
    }

    /// Replays the offline queue once; `None` when it was empty.
    pub async fn retry_failed_worklogs(&mut self) -> Result<Option<RetryReport>> {
        if self.queue.is_empty() {
            return Ok(None);
        }
        self.ensure_auth().await?;
        let report = self.queue.retry_all(&self.poster).await?;
        debug!(total = report.total, succeeded = report.succeeded, failed = report.failed, "offline queue replayed");
        Ok(Some(report))
    }

    /// Looks up an issue. Service failures keep their [`ApiError`] for
    /// `downcast_ref`.
    pub async fn fetch_issue(&mut self, key: &str) -> Result<Issue> {
        self.ensure_auth().await?;
        Ok(self.poster.service().get_issue(key).await?)
    }

    pub async fn assigned_issues(&mut self) -> Result<Vec<Issue>> {
        self.ensure_auth().await?;
        Ok(self.poster.service().search_assigned().await?)
    }

    /// Replaces a rejected credential and persists it. Nothing is written on
    /// failure.
    pub async fn reauthenticate(&mut self) -> Result<(), ApiError> {
        self.poster.service_mut().reauthenticate().await?;
        self.persist_credentials().map_err(|e| ApiError::Unknown(e.to_string()))
    }

    /// Starts tracking a new timer.
    pub fn begin(&mut self, issue_key: &str, description: &str) -> Result<TimerState> {
        if let Some(existing) = self.active_timer()? {
            msg_bail_anyhow!(Message::ActiveTimerExists(existing.issue_key));
        }
        let timer = self.timers.create_timer(issue_key, description)?;
        self.enter_tracking();
        Ok(timer)
    }

    /// Picks up the persisted timer.
    pub fn attach(&mut self) -> Result<TimerState> {
        let Some(timer) = self.active_timer()? else {
            msg_bail_anyhow!(Message::NoActiveTimer);
        };
        self.enter_tracking();
        Ok(timer)
    }

    fn enter_tracking(&mut self) {
        self.stopped = None;
        self.phase = Phase::Tracking;
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        if let Some(stopped) = &self.stopped {
            return Ok(Snapshot {
                timer: Some(stopped.timer.clone()),
                elapsed_seconds: stopped.elapsed_seconds,
                phase: self.phase,
                can_split: stopped.plan.can_split(),
                mode: Some(stopped.mode),
                entries: stopped.plan.entries(stopped.mode),
            });
        }

        let timer = match self.phase {
            Phase::Tracking => self.timers.active_timer()?,
            _ => None,
        };
        Ok(Snapshot {
            elapsed_seconds: timer.as_ref().map_or(0, |timer| self.timers.get_elapsed_seconds(timer)),
            timer,
            phase: self.phase,
            can_split: false,
            mode: None,
            entries: Vec::new(),
        })
    }

    pub async fn handle(&mut self, intent: Intent) -> Result<Step> {
        debug!(?intent, phase = ?self.phase, "session intent");
        match (self.phase, intent) {
            (Phase::Tracking, Intent::Pause) => Ok(continue_if(self.timers.pause_timer()?.is_some())),
            (Phase::Tracking, Intent::Resume) => Ok(continue_if(self.timers.resume_timer()?.is_some())),
            (Phase::Tracking, Intent::RequestStop) => self.stop(),
            (Phase::Tracking, Intent::Detach) => match self.timers.active_timer()? {
                Some(timer) => Ok(self.finish(Outcome::Detached(timer))),
                None => Ok(Step::Ignored),
            },
            (Phase::Tracking, Intent::Quit { confirmed }) => {
                let Some(timer) = self.timers.active_timer()? else {
                    return Ok(Step::Ignored);
                };
                let elapsed_seconds = self.timers.get_elapsed_seconds(&timer);
                if needs_quit_confirmation(elapsed_seconds, confirmed) {
                    return Ok(Step::ConfirmQuit { elapsed_seconds });
                }
                self.store.delete_active_timer()?;
                debug!(issue_key = %timer.issue_key, elapsed_seconds, "timer discarded");
                Ok(self.finish(Outcome::Discarded(timer)))
            }
            (Phase::Describing, Intent::SubmitDescription { text, save_as_default }) => {
                self.describe(&text, save_as_default)
            }
            (Phase::ChoosingMode, Intent::ChooseMode(mode)) => match self.stopped.as_mut() {
                Some(stopped) => {
                    stopped.mode = mode;
                    self.phase = Phase::Confirming;
                    Ok(Step::Continue)
                }
                None => Ok(Step::Ignored),
            },
            (Phase::Confirming, Intent::ConfirmSubmit) => self.submit().await,
            (Phase::Describing | Phase::ChoosingMode | Phase::Confirming, Intent::Quit { confirmed }) => {
                let Some(stopped) = &self.stopped else {
                    return Ok(Step::Ignored);
                };
                if needs_quit_confirmation(stopped.elapsed_seconds, confirmed) {
                    return Ok(Step::ConfirmQuit {
                        elapsed_seconds: stopped.elapsed_seconds,
                    });
                }
                let timer = stopped.timer.clone();
                debug!(issue_key = %timer.issue_key, "stopped timer discarded");
                Ok(self.finish(Outcome::Discarded(timer)))
            }
            _ => Ok(Step::Ignored),
        }
    }

    fn stop(&mut self) -> Result<Step> {
        let Some(timer) = self.timers.stop_timer()? else {
            return Ok(Step::Ignored);
        };
        let elapsed_seconds = self.timers.get_elapsed_seconds(&timer);
        let plan = WorklogPlan::from_timer(&timer, elapsed_seconds);
        let mode = plan.default_mode();
        debug!(issue_key = %timer.issue_key, elapsed_seconds, segments = plan.segments.len(), "timer stopped for submission");
        self.stopped = Some(Stopped {
            timer,
            elapsed_seconds,
            plan,
            mode,
        });
        self.phase = Phase::Describing;
        Ok(Step::Continue)
    }

    /// Store failures here only cost the default message; the stopped timer
    /// lives in memory and must reach the submit step.
    fn describe(&mut self, text: &str, save_as_default: bool) -> Result<Step> {
        let text = text.trim();
        let description = if text.is_empty() {
            self.default_message().unwrap_or_default()
        } else {
            if save_as_default {
                if let Err(e) = self.store.set_default_message(text) {
                    msg_warning!(Message::DefaultMessageSaveFailed(e.to_string()));
                }
            }
            text.to_string()
        };

        let Some(stopped) = self.stopped.as_mut() else {
            return Ok(Step::Ignored);
        };
        stopped.timer.description = description;
        self.phase = if stopped.plan.can_split() {
            Phase::ChoosingMode
        } else {
            Phase::Confirming
        };
        Ok(Step::Continue)
    }

    async fn submit(&mut self) -> Result<Step> {
        let Some(stopped) = self.stopped.clone() else {
            return Ok(Step::Ignored);
        };
        let entries = stopped.plan.entries(stopped.mode);
        let issue_key = &stopped.timer.issue_key;
        let comment = &stopped.timer.description;

        // The timer slot is already gone, so every entry ends up posted or queued.
        let report = match self.refresh_if_expiring().await {
            Ok(()) => {
                self.poster
                    .post_batch(&entries, issue_key, comment, &self.queue, &mut self.reauth)
                    .await
            }
            Err(e) => {
                msg_error!(Message::AuthRefreshFailed(e.to_string()));
                let error = format!("credential refresh failed: {}", e);
                self.poster.defer_batch(&entries, issue_key, comment, &self.queue, &error)
            }
        };
        if let Err(e) = self.persist_credentials() {
            warn!(error = %e, "could not persist credentials after submit");
        }
        Ok(self.finish(Outcome::Logged(report)))
    }

    fn finish(&mut self, outcome: Outcome) -> Step {
        self.phase = Phase::Finished;
        self.stopped = None;
        Step::Finished(outcome)
    }
}

fn continue_if(applied: bool) -> Step {
    if applied {
        Step::Continue
    } else {
        Step::Ignored
    }
}

pub fn needs_quit_confirmation(elapsed_seconds: i64, confirmed: bool) -> bool {
    elapsed_seconds >= QUIT_CONFIRM_THRESHOLD_SECONDS && !confirmed
}

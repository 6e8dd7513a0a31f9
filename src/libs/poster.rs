//! Posting worklogs to the issue service.
//!
//! [`WorklogPoster::post`] is the single-entry primitive shared by the live
//! flow and the offline queue. [`WorklogPoster::post_batch`] posts the entries
//! of one stopped timer in order, gives authentication failures one
//! re-authentication and one retry, and queues whatever still fails.
//! [`WorklogPoster::defer_batch`] queues a whole batch without posting it.

use crate::api::{ApiError, IssueService, WorklogResult};
use crate::libs::clock::Clock;
use crate::libs::config::ConfigStore;
use crate::libs::formatter;
use crate::libs::queue::{FailedWorklog, OfflineQueue};
use crate::libs::segmenter::{WorklogEntry, MIN_BILLABLE_SECONDS};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Hook used when the service rejects the credential mid-batch.
///
/// Returns `true` when a new credential is in place and the entry should be
/// tried again.
#[allow(async_fn_in_trait)]
pub trait Reauthenticate<S> {
    async fn reauthenticate(&mut self, service: &mut S) -> bool;
}

/// Never re-authenticates; auth failures go straight to the queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoReauth;

impl<S> Reauthenticate<S> for NoReauth {
    async fn reauthenticate(&mut self, _service: &mut S) -> bool {
        false
    }
}

/// Outcome of one [`WorklogPoster::post_batch`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded_entries: usize,
    pub failed_entries: usize,
    pub first_error: Option<String>,
    pub results: Vec<WorklogResult>,
    /// Failed entries that could not be written to the queue either.
    pub unqueued: Vec<FailedWorklog>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed_entries == 0
    }
}

#[derive(Debug)]
pub struct WorklogPoster<S, C> {
    service: S,
    clock: C,
}

impl<S: IssueService, C: Clock> WorklogPoster<S, C> {
    pub fn new(service: S, clock: C) -> Self {
        Self { service, clock }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Posts one worklog, raising `seconds` to the billable minimum.
    pub async fn post(&self, issue_key: &str, seconds: i64, comment: &str, started: DateTime<Utc>) -> Result<WorklogResult, ApiError> {
        let billable = seconds.max(MIN_BILLABLE_SECONDS);
        let mut result = self.service.post_worklog(issue_key, billable, comment, started).await?;
        result.time_spent_seconds = billable;
        Ok(result)
    }

    /// Posts `entries` sequentially; failures end up in `queue`.
    ///
    /// A queue write failure does not stop the batch: the entry is kept in
    /// [`BatchReport::unqueued`] and the remaining entries are still posted.
    pub async fn post_batch<St, R>(
        &mut self,
        entries: &[WorklogEntry],
        issue_key: &str,
        comment: &str,
        queue: &OfflineQueue<St>,
        reauth: &mut R,
    ) -> BatchReport
    where
        St: ConfigStore,
        R: Reauthenticate<S>,
    {
        let mut report = BatchReport {
            total: entries.len(),
            ..BatchReport::default()
        };
        let mut reauth_available = true;

        for entry in entries {
            let outcome = match formatter::to_datetime(entry.started_at) {
                Some(started) => {
                    let mut outcome = self.post(issue_key, entry.duration_seconds, comment, started).await;
                    if matches!(&outcome, Err(e) if e.is_authentication()) && reauth_available {
                        if reauth.reauthenticate(&mut self.service).await {
                            outcome = self.post(issue_key, entry.duration_seconds, comment, started).await;
                        } else {
                            reauth_available = false;
                        }
                    }
                    outcome
                }
                None => Err(ApiError::Unknown(format!("invalid start timestamp {}", entry.started_at))),
            };

            match outcome {
                Ok(result) => {
                    debug!(issue_key, id = %result.id, seconds = result.time_spent_seconds, "worklog posted");
                    report.succeeded_entries += 1;
                    report.results.push(result);
                }
                Err(e) => {
                    warn!(issue_key, error = %e, "worklog post failed, queueing");
                    self.record_failure(&mut report, queue, entry, issue_key, comment, &e.to_string());
                }
            }
        }

        report
    }

    /// Queues every entry without posting, all failed with `error`.
    pub fn defer_batch<St: ConfigStore>(
        &self,
        entries: &[WorklogEntry],
        issue_key: &str,
        comment: &str,
        queue: &OfflineQueue<St>,
        error: &str,
    ) -> BatchReport {
        let mut report = BatchReport {
            total: entries.len(),
            ..BatchReport::default()
        };
        for entry in entries {
            self.record_failure(&mut report, queue, entry, issue_key, comment, error);
        }
        report
    }

    fn record_failure<St: ConfigStore>(
        &self,
        report: &mut BatchReport,
        queue: &OfflineQueue<St>,
        entry: &WorklogEntry,
        issue_key: &str,
        comment: &str,
        error: &str,
    ) {
        report.failed_entries += 1;
        report.first_error.get_or_insert_with(|| error.to_string());
        let failed = FailedWorklog {
            issue_key: issue_key.to_string(),
            time_spent_seconds: entry.duration_seconds,
            comment: comment.to_string(),
            started: formatter::to_iso(entry.started_at).unwrap_or_default(),
            failed_at: self.clock.now_ms(),
            error: error.to_string(),
        };
        if let Err(e) = queue.enqueue(failed.clone()) {
            warn!(issue_key, error = %e, "could not queue failed worklog");
            report.unqueued.push(failed);
        }
    }
}

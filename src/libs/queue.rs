//! Offline queue of worklogs Jira did not accept.
//!
//! Entries live in the `failedWorklogs` slot and are replayed on the next
//! `start`/`resume` or with `jtimer queue retry`. Removal is positional, so a
//! replay walks the snapshot from the highest index down: removing entry `i`
//! never shifts the entries still to be visited.

use crate::api::IssueService;
use crate::libs::clock::Clock;
use crate::libs::config::ConfigStore;
use crate::libs::formatter;
use crate::libs::messages::Message;
use crate::libs::poster::WorklogPoster;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A worklog waiting to be posted again.
///
/// `time_spent_seconds` is the measured duration; the minimum is applied
/// again when it is posted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FailedWorklog {
    pub issue_key: String,
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub comment: String,
    /// ISO-8601 start of the work period.
    pub started: String,
    /// When the post failed, epoch milliseconds.
    pub failed_at: i64,
    pub error: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Clone, Debug)]
pub struct OfflineQueue<St> {
    store: St,
}

impl<St: ConfigStore> OfflineQueue<St> {
    pub fn new(store: St) -> Self {
        Self { store }
    }

    pub fn enqueue(&self, entry: FailedWorklog) -> Result<()> {
        let mut entries = self.list();
        debug!(issue_key = %entry.issue_key, seconds = entry.time_spent_seconds, error = %entry.error, "queueing failed worklog");
        entries.push(entry);
        self.store.set_failed_worklogs(&entries)
    }

    /// All queued entries in insertion order.
    ///
    /// An unreadable or malformed slot reads as an empty queue.
    pub fn list(&self) -> Vec<FailedWorklog> {
        match self.store.failed_worklogs_raw() {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!("{} ({})", Message::QueueMalformed, e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("failed to read offline queue: {}", e);
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list().is_empty()
    }

    pub fn remove_at(&self, index: usize) -> Result<Option<FailedWorklog>> {
        let mut entries = self.list();
        if index >= entries.len() {
            return Ok(None);
        }
        let removed = entries.remove(index);
        self.store.set_failed_worklogs(&entries)?;
        Ok(Some(removed))
    }

    /// Empties the queue and returns how many entries were dropped.
    pub fn clear(&self) -> Result<usize> {
        let count = self.len();
        self.store.delete_failed_worklogs()?;
        Ok(count)
    }

    /// Replays every queued entry once.
    ///
    /// Successful entries are removed as soon as they are posted; failures stay
    /// where they are, untouched.
    pub async fn retry_all<S, C>(&self, poster: &WorklogPoster<S, C>) -> Result<RetryReport>
    where
        S: IssueService,
        C: Clock,
    {
        let snapshot = self.list();
        let mut report = RetryReport {
            total: snapshot.len(),
            ..RetryReport::default()
        };

        for (index, entry) in snapshot.iter().enumerate().rev() {
            let Some(started) = formatter::parse_started(&entry.started) else {
                warn!(index, started = %entry.started, "queued worklog has an invalid start time");
                report.failed += 1;
                continue;
            };
            match poster.post(&entry.issue_key, entry.time_spent_seconds, &entry.comment, started).await {
                Ok(_) => {
                    self.remove_at(index)?;
                    report.succeeded += 1;
                }
                Err(e) => {
                    debug!(index, issue_key = %entry.issue_key, error = %e, "queued worklog still failing");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

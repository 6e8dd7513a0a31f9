//! Turns a stopped timer into worklog entries.
//!
//! A session with pauses can be logged either as one worklog holding the net
//! elapsed time, or split into one worklog per work period. Splitting is only
//! offered when there are at least two periods and a full billable minute in
//! total; below that every split entry would be rounded up on its own.

use crate::libs::clock::{self, WorklogSegment};
use crate::libs::timer::TimerState;
use serde::{Deserialize, Serialize};

/// Smallest duration Jira accepts for a worklog.
pub const MIN_BILLABLE_SECONDS: i64 = 60;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorklogMode {
    Single,
    Split,
}

/// One worklog to post: when it started and how long it ran.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorklogEntry {
    pub started_at: i64,
    pub duration_seconds: i64,
}

pub fn can_split(segments: &[WorklogSegment], elapsed_seconds: i64) -> bool {
    segments.len() > 1 && elapsed_seconds >= MIN_BILLABLE_SECONDS
}

pub fn default_mode(segments: &[WorklogSegment], elapsed_seconds: i64) -> WorklogMode {
    if can_split(segments, elapsed_seconds) {
        WorklogMode::Split
    } else {
        WorklogMode::Single
    }
}

/// Builds the entries to post.
///
/// A split request that is not allowed quietly becomes a single entry, so the
/// presentation layer can toggle modes freely.
pub fn build_entries(
    mode: WorklogMode,
    segments: &[WorklogSegment],
    elapsed_seconds: i64,
    fallback_started_at: i64,
) -> Vec<WorklogEntry> {
    if mode == WorklogMode::Split && can_split(segments, elapsed_seconds) {
        return segments
            .iter()
            .map(|segment| WorklogEntry {
                started_at: segment.started_at,
                duration_seconds: segment.duration_seconds,
            })
            .collect();
    }

    vec![WorklogEntry {
        started_at: segments.first().map_or(fallback_started_at, |segment| segment.started_at),
        duration_seconds: elapsed_seconds,
    }]
}

/// Number of entries Jira will round up to a minute.
pub fn count_rounded(entries: &[WorklogEntry]) -> usize {
    entries.iter().filter(|entry| entry.duration_seconds < MIN_BILLABLE_SECONDS).count()
}

/// The segmentation of one stopped timer, computed once at stop time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorklogPlan {
    pub segments: Vec<WorklogSegment>,
    pub elapsed_seconds: i64,
    pub fallback_started_at: i64,
}

impl WorklogPlan {
    pub fn from_timer(timer: &TimerState, elapsed_seconds: i64) -> Self {
        Self {
            segments: clock::to_segments(timer),
            elapsed_seconds,
            fallback_started_at: timer.started_at,
        }
    }

    pub fn can_split(&self) -> bool {
        can_split(&self.segments, self.elapsed_seconds)
    }

    pub fn default_mode(&self) -> WorklogMode {
        default_mode(&self.segments, self.elapsed_seconds)
    }

    pub fn entries(&self, mode: WorklogMode) -> Vec<WorklogEntry> {
        build_entries(mode, &self.segments, self.elapsed_seconds, self.fallback_started_at)
    }
}

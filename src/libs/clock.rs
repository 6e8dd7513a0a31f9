//! Interval clock: elapsed-time arithmetic over timer snapshots.
//!
//! Everything here is pure except [`SystemClock`]. Timestamps are wall-clock
//! milliseconds since the Unix epoch; durations handed to users are whole
//! seconds, always floored.

use crate::libs::timer::TimerState;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Source of "now" for the timer and the worklog pipeline.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A closed interval expressed in seconds; the unit of a split worklog.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorklogSegment {
    pub started_at: i64,
    pub ended_at: i64,
    pub duration_seconds: i64,
}

/// Milliseconds spent in the pause that is still in progress, if any.
pub fn current_pause_ms(timer: &TimerState, now: i64) -> i64 {
    match (timer.is_paused, timer.paused_at) {
        (true, Some(paused_at)) => now - paused_at,
        _ => 0,
    }
}

/// Net running time in whole seconds.
///
/// Not clamped: a negative result means the stored timer is inconsistent and
/// is reported as-is.
pub fn elapsed_seconds(timer: &TimerState, now: i64) -> i64 {
    let running_ms = now - timer.started_at - timer.total_paused_time - current_pause_ms(timer, now);
    running_ms.div_euclid(1000)
}

/// Closed intervals as segments, dropping those shorter than one second.
///
/// Timers persisted before interval history existed get one synthesized
/// interval `[startedAt, pausedAt]` when paused; a running legacy timer has
/// nothing closeable yet.
pub fn to_segments(timer: &TimerState) -> Vec<WorklogSegment> {
    if timer.intervals.is_empty() {
        return match (timer.is_paused, timer.paused_at) {
            (true, Some(paused_at)) => segment(timer.started_at, paused_at).into_iter().collect(),
            _ => Vec::new(),
        };
    }

    timer
        .intervals
        .iter()
        .filter_map(|interval| interval.ended_at.and_then(|ended_at| segment(interval.started_at, ended_at)))
        .collect()
}

fn segment(started_at: i64, ended_at: i64) -> Option<WorklogSegment> {
    let duration_seconds = (ended_at - started_at).div_euclid(1000);
    (duration_seconds > 0).then_some(WorklogSegment {
        started_at,
        ended_at,
        duration_seconds,
    })
}

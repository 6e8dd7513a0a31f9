//! The single active timer and its state machine.
//!
//! ```text
//! NONE --create--> RUNNING --pause--> PAUSED
//!                     ^                 |
//!                     +-----resume------+
//! RUNNING | PAUSED --stop--> STOPPED (returned to the caller, never persisted)
//! ```
//!
//! Every transition loads the timer from the [`ConfigStore`], mutates it and
//! writes it back before returning. Transitions that do not apply to the
//! current state return `Ok(None)` and touch nothing.

use crate::libs::clock::{self, Clock};
use crate::libs::config::ConfigStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use crate::libs::formatter::{format_time, format_time_human_readable};

/// A contiguous span of running time. `ended_at` is `None` while open.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub started_at: i64,
    #[serde(default)]
    pub ended_at: Option<i64>,
}

impl Interval {
    pub fn open(started_at: i64) -> Self {
        Self { started_at, ended_at: None }
    }

    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerStatus {
    Running,
    Paused,
    Stopped,
}

/// Persisted shape of the active timer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub issue_key: String,
    #[serde(default)]
    pub description: String,
    pub started_at: i64,
    #[serde(default)]
    pub paused_at: Option<i64>,
    /// Sum of all finished pauses, in milliseconds.
    #[serde(default)]
    pub total_paused_time: i64,
    /// Running spans in chronological order; only the last may be open.
    #[serde(default)]
    pub intervals: Vec<Interval>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default = "running_by_default")]
    pub is_running: bool,
}

fn running_by_default() -> bool {
    true
}

impl TimerState {
    pub fn new(issue_key: &str, description: &str, now: i64) -> Self {
        Self {
            issue_key: issue_key.to_string(),
            description: description.to_string(),
            started_at: now,
            paused_at: None,
            total_paused_time: 0,
            intervals: vec![Interval::open(now)],
            is_paused: false,
            is_running: true,
        }
    }

    pub fn status(&self) -> TimerStatus {
        match (self.is_running, self.is_paused) {
            (false, _) => TimerStatus::Stopped,
            (true, true) => TimerStatus::Paused,
            (true, false) => TimerStatus::Running,
        }
    }

    /// Gives a timer stored without interval history one interval to work with.
    fn migrate_legacy(&mut self) {
        if !self.intervals.is_empty() {
            return;
        }
        let interval = match (self.is_paused, self.paused_at) {
            (true, Some(paused_at)) => Interval {
                started_at: self.started_at,
                ended_at: Some(paused_at),
            },
            _ => Interval::open(self.started_at),
        };
        self.intervals.push(interval);
    }

    fn close_open_interval(&mut self, at: i64) {
        if let Some(last) = self.intervals.last_mut().filter(|interval| interval.is_open()) {
            last.ended_at = Some(at);
        }
    }

    fn open_interval(&mut self, at: i64) {
        self.intervals.push(Interval::open(at));
    }
}

/// Owner of the active-timer slot.
#[derive(Clone, Debug)]
pub struct TimerMachine<St, C> {
    store: St,
    clock: C,
}

impl<St: ConfigStore, C: Clock> TimerMachine<St, C> {
    pub fn new(store: St, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// The persisted timer, running or not.
    pub fn active_timer(&self) -> Result<Option<TimerState>> {
        self.store.active_timer()
    }

    pub fn has_active_timer(&self) -> Result<bool> {
        Ok(self.active_timer()?.is_some_and(|timer| timer.is_running))
    }

    /// Starts a new running timer.
    ///
    /// The caller checks [`has_active_timer`](Self::has_active_timer) first;
    /// an existing timer is overwritten.
    pub fn create_timer(&self, issue_key: &str, description: &str) -> Result<TimerState> {
        let timer = TimerState::new(issue_key, description, self.clock.now_ms());
        self.store.set_active_timer(&timer)?;
        debug!(issue_key, started_at = timer.started_at, "timer created");
        Ok(timer)
    }

    pub fn pause_timer(&self) -> Result<Option<TimerState>> {
        let Some(mut timer) = self.active_timer()? else {
            return Ok(None);
        };
        if !timer.is_running || timer.is_paused {
            return Ok(None);
        }

        let now = self.clock.now_ms();
        timer.migrate_legacy();
        timer.close_open_interval(now);
        timer.paused_at = Some(now);
        timer.is_paused = true;
        self.store.set_active_timer(&timer)?;
        debug!(issue_key = %timer.issue_key, paused_at = now, "timer paused");
        Ok(Some(timer))
    }

    pub fn resume_timer(&self) -> Result<Option<TimerState>> {
        let Some(mut timer) = self.active_timer()? else {
            return Ok(None);
        };
        let paused_at = match (timer.is_running, timer.is_paused, timer.paused_at) {
            (true, true, Some(paused_at)) => paused_at,
            _ => return Ok(None),
        };

        let now = self.clock.now_ms();
        timer.migrate_legacy();
        timer.total_paused_time += now - paused_at;
        timer.paused_at = None;
        timer.is_paused = false;
        timer.open_interval(now);
        self.store.set_active_timer(&timer)?;
        debug!(issue_key = %timer.issue_key, total_paused_time = timer.total_paused_time, "timer resumed");
        Ok(Some(timer))
    }

    /// Finalizes the timer and frees the slot.
    ///
    /// The returned state is the only copy left; it carries everything the
    /// worklog pipeline needs.
    pub fn stop_timer(&self) -> Result<Option<TimerState>> {
        let Some(mut timer) = self.active_timer()? else {
            return Ok(None);
        };
        if !timer.is_running {
            return Ok(None);
        }

        let now = self.clock.now_ms();
        timer.migrate_legacy();
        match (timer.is_paused, timer.paused_at) {
            (true, Some(paused_at)) => {
                // The interval was already closed when the pause began.
                timer.total_paused_time += now - paused_at;
                timer.paused_at = None;
                timer.is_paused = false;
            }
            _ => timer.close_open_interval(now),
        }
        timer.is_running = false;
        self.store.delete_active_timer()?;
        debug!(issue_key = %timer.issue_key, stopped_at = now, "timer stopped");
        Ok(Some(timer))
    }

    pub fn get_elapsed_seconds(&self, timer: &TimerState) -> i64 {
        clock::elapsed_seconds(timer, self.clock.now_ms())
    }
}

//! Soft Real-Time Poll Scheduling
//!
//! Decides when the next sampling pass is due. The next pass is scheduled a
//! fixed interval after the previous one *completes*, so the effective
//! period is pass duration plus interval. Time is passed in by the caller;
//! the scheduler never reads the clock or sleeps itself.
//!
//! There is only ever one pending deadline. Passes missed while idle are
//! never replayed: activation always yields exactly one immediate pass.

use std::time::{Duration, Instant};

/// Default delay between the end of one pass and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(15);

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Observer inactive, no passes scheduled
    Idle,
    /// Observer active, passes recur
    Running,
}

/// Poll scheduler state machine
#[derive(Debug, Clone)]
pub struct PollScheduler {
    state: SchedulerState,
    interval: Duration,
    /// `None` while running means the next pass is due immediately.
    next_due: Option<Instant>,
    in_pass: bool,
    passes: u64,
}

impl PollScheduler {
    /// Create an idle scheduler with the given interval
    pub fn new(interval: Duration) -> Self {
        PollScheduler {
            state: SchedulerState::Idle,
            interval,
            next_due: None,
            in_pass: false,
            passes: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Whether passes are being scheduled
    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Delay between passes
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total passes started since creation
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Deadline of the next pass, if one is scheduled
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Idle -> Running. The first pass becomes due immediately.
    ///
    /// Returns `false` if already running.
    pub fn activate(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = SchedulerState::Running;
        self.next_due = None;
        true
    }

    /// Running -> Idle. Drops the pending deadline.
    ///
    /// Returns `false` if already idle.
    pub fn deactivate(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = SchedulerState::Idle;
        self.next_due = None;
        true
    }

    /// Whether a pass should start at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        self.is_running() && !self.in_pass && self.next_due.map_or(true, |due| now >= due)
    }

    /// Time left until the next pass, zero if overdue, `None` when idle
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }
        Some(
            self.next_due
                .map_or(Duration::ZERO, |due| due.saturating_duration_since(now)),
        )
    }

    /// Claim the due pass. Returns `false` if none is due or one is in
    /// progress.
    pub fn begin_pass(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.in_pass = true;
        self.next_due = None;
        self.passes += 1;
        true
    }

    /// Finish the current pass and, if still running, schedule the next one
    /// `interval` after `completed_at`.
    pub fn complete_pass(&mut self, completed_at: Instant) {
        self.in_pass = false;
        self.next_due = self
            .is_running()
            .then(|| completed_at + self.interval);
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

//! Pure state machine of one watch session.

use std::time::Duration;

use tokio::time::Instant;

use super::source::MutationBatch;

/// Lifecycle of a watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Created, not yet started
    Idle,
    /// Observing mutations
    Watching,
    /// Completion detected, callback delivered
    Fired,
    /// Stopped by the caller
    Stopped,
}

impl WatchState {
    /// `Fired` and `Stopped` are final
    pub fn is_terminal(self) -> bool {
        matches!(self, WatchState::Fired | WatchState::Stopped)
    }
}

/// Copy-button baseline, state and pending debounce deadline.
///
/// Time is passed in by the caller, so every transition is deterministic.
#[derive(Debug, Clone)]
pub struct WatchSession {
    debounce: Duration,
    initial_count: usize,
    state: WatchState,
    deadline: Option<Instant>,
}

impl WatchSession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            initial_count: 0,
            state: WatchState::Idle,
            deadline: None,
        }
    }

    /// Record the baseline and start watching. Only valid from `Idle`.
    pub fn start(&mut self, initial_count: usize) -> bool {
        if self.state != WatchState::Idle {
            return false;
        }
        self.initial_count = initial_count;
        self.state = WatchState::Watching;
        true
    }

    /// A mutation batch arrived. Batches that add nodes re-arm the debounce.
    pub fn on_mutation(&mut self, batch: &MutationBatch, now: Instant) -> bool {
        if self.state != WatchState::Watching || batch.added == 0 {
            return false;
        }
        self.deadline = Some(now + self.debounce);
        true
    }

    /// The debounce deadline elapsed and `count` copy buttons are present.
    /// Returns true exactly once: on the transition to `Fired`.
    pub fn on_deadline(&mut self, count: usize, now: Instant) -> bool {
        if self.state != WatchState::Watching {
            return false;
        }
        match self.deadline {
            Some(deadline) if deadline <= now => self.deadline = None,
            _ => return false,
        }

        if count > self.initial_count {
            self.state = WatchState::Fired;
            true
        } else {
            false
        }
    }

    /// Stop watching and cancel any pending debounce.
    pub fn stop(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = WatchState::Stopped;
        self.deadline = None;
        true
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    /// Pending debounce deadline
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

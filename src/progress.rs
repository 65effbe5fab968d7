//! Progress reporting for extraction runs.
//!
//! The pipeline writes into a [`ProgressEstimator`]; observers pull copies of
//! the current [`ProgressSnapshot`] through a `tokio::sync::watch` receiver,
//! so a slow observer never blocks a fetch.
//!
//! # Example
//!
//! ```rust
//! use chatgrep::progress::ProgressEstimator;
//!
//! let progress = ProgressEstimator::new();
//! let mut rx = progress.subscribe();
//!
//! progress.start(2, 100);
//! progress.record_batch(0, 50, 50, 3);
//! progress.complete_group(1);
//!
//! let snapshot = *rx.borrow_and_update();
//! assert_eq!(snapshot.groups_completed, 1);
//! assert_eq!(snapshot.matches_found, 3);
//! assert!((snapshot.percentage() - 75.0).abs() < 1e-9);
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::DEFAULT_MESSAGE_CAP;

/// Partial progress of an unfinished group stays below this.
const MAX_PARTIAL: f64 = 0.99;

/// Point-in-time view of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSnapshot {
    pub groups_completed: usize,
    pub groups_total: usize,
    pub messages_processed: usize,
    pub matches_found: usize,
    /// Completion in `[0, 1]`, never decreasing
    pub fraction: f64,
    /// Time since [`ProgressEstimator::start`]
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Completion as a percentage (0.0 - 100.0).
    pub fn percentage(&self) -> f64 {
        self.fraction * 100.0
    }

    /// `elapsed * (1 / fraction - 1)`, unknown until some progress was made.
    ///
    /// ```rust
    /// use chatgrep::progress::ProgressSnapshot;
    /// use std::time::Duration;
    ///
    /// let snapshot = ProgressSnapshot {
    ///     fraction: 0.25,
    ///     elapsed: Duration::from_secs(30),
    ///     ..ProgressSnapshot::default()
    /// };
    /// assert_eq!(snapshot.estimated_remaining(), Some(Duration::from_secs(90)));
    /// assert_eq!(ProgressSnapshot::default().estimated_remaining(), None);
    /// ```
    pub fn estimated_remaining(&self) -> Option<Duration> {
        if self.fraction <= 0.0 {
            return None;
        }
        let factor = (1.0 / self.fraction - 1.0).max(0.0);
        Some(self.elapsed.mul_f64(factor))
    }

    pub fn is_complete(&self) -> bool {
        self.groups_total > 0 && self.groups_completed >= self.groups_total
    }
}

#[derive(Debug)]
struct GroupsState {
    started: Instant,
    per_group_estimate: usize,
    partials: Vec<f64>,
}

/// Tracks completion across all groups of a run.
///
/// Shared by reference between the session tasks of one run. Locks are held
/// only for the duration of an update, never across an await.
#[derive(Debug)]
pub struct ProgressEstimator {
    tx: watch::Sender<ProgressSnapshot>,
    state: Mutex<GroupsState>,
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressEstimator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self {
            tx,
            state: Mutex::new(GroupsState {
                started: Instant::now(),
                per_group_estimate: DEFAULT_MESSAGE_CAP,
                partials: Vec::new(),
            }),
        }
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot with a fresh `elapsed`.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let started = self.lock().started;
        let mut snapshot = *self.tx.borrow();
        snapshot.elapsed = started.elapsed();
        snapshot
    }

    /// Resets the estimator for a run over `groups_total` groups.
    ///
    /// `message_cap` is the per-group cap; 0 (unbounded) estimates
    /// [`DEFAULT_MESSAGE_CAP`] messages per group.
    pub fn start(&self, groups_total: usize, message_cap: usize) {
        let mut state = self.lock();
        state.started = Instant::now();
        state.per_group_estimate = if message_cap == 0 {
            DEFAULT_MESSAGE_CAP
        } else {
            message_cap
        };
        state.partials = vec![0.0; groups_total];

        self.tx.send_replace(ProgressSnapshot {
            groups_total,
            ..ProgressSnapshot::default()
        });
    }

    /// Records one fetched batch of group `group`.
    ///
    /// `processed_in_group` is the group's running message count,
    /// `batch_len` and `matches` are this batch's contribution.
    pub fn record_batch(&self, group: usize, processed_in_group: usize, batch_len: usize, matches: usize) {
        let mut state = self.lock();
        let estimate = state.per_group_estimate.max(1) as f64;
        if let Some(partial) = state.partials.get_mut(group) {
            let next = (processed_in_group as f64 / estimate).min(MAX_PARTIAL);
            *partial = partial.max(next);
        }
        let fraction = fraction_of(&state.partials);
        let elapsed = state.started.elapsed();
        drop(state);

        self.tx.send_modify(|snapshot| {
            snapshot.messages_processed += batch_len;
            snapshot.matches_found += matches;
            snapshot.fraction = snapshot.fraction.max(fraction);
            snapshot.elapsed = elapsed;
        });
    }

    /// Marks group `group` as finished, whether it succeeded or failed.
    pub fn complete_group(&self, group: usize) {
        let mut state = self.lock();
        let newly_done = match state.partials.get_mut(group) {
            Some(partial) if *partial < 1.0 => {
                *partial = 1.0;
                true
            }
            _ => false,
        };
        let fraction = fraction_of(&state.partials);
        let elapsed = state.started.elapsed();
        drop(state);

        self.tx.send_modify(|snapshot| {
            if newly_done {
                snapshot.groups_completed += 1;
            }
            snapshot.fraction = snapshot.fraction.max(fraction);
            snapshot.elapsed = elapsed;
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GroupsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn fraction_of(partials: &[f64]) -> f64 {
    if partials.is_empty() {
        return 0.0;
    }
    (partials.iter().sum::<f64>() / partials.len() as f64).clamp(0.0, 1.0)
}

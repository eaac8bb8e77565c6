//! Live progress for the in-flight task.
//!
//! The worker thread writes, any thread reads. All fields sit behind one
//! lock so a [`ProgressSnapshot`] is always internally consistent.
//!
//! Remaining time is an exponential moving average of the per-unit
//! duration multiplied by the units left. Workers that cannot size their
//! workload up front may skip [`Progress::start`]; both fields then stay
//! `None` unless the worker reports them directly.

use parking_lot::RwLock;
use serde::Serialize;
use std::time::Instant;

/// Default EMA smoothing factor (weight of the newest sample).
pub const DEFAULT_SMOOTHING: f64 = 0.25;

/// Point-in-time copy of the tracker's public fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    /// 0-100, `None` until the worker reports a first measurement.
    pub percent: Option<f64>,
    pub remaining_seconds: Option<f64>,
}

#[derive(Debug, Default)]
struct State {
    total: Option<u64>,
    done: u64,
    percent: Option<f64>,
    remaining_seconds: Option<f64>,
    /// Smoothed seconds per unit.
    per_unit: Option<f64>,
    last_tick: Option<Instant>,
}

impl State {
    /// Raise percent, never lower it.
    fn raise(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0);
        self.percent = Some(self.percent.map_or(percent, |p| p.max(percent)));
    }
}

/// Thread-safe completion estimator owned by one task.
#[derive(Debug)]
pub struct Progress {
    state: RwLock<State>,
    smoothing: f64,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

impl Progress {
    /// Create a tracker; `smoothing` is clamped to (0, 1].
    #[must_use]
    pub fn new(smoothing: f64) -> Self {
        let smoothing = if smoothing.is_finite() && smoothing > 0.0 {
            smoothing.min(1.0)
        } else {
            DEFAULT_SMOOTHING
        };

        Self {
            state: RwLock::new(State::default()),
            smoothing,
        }
    }

    /// Declare the workload size. Percent becomes 0 (or 100 for an empty workload).
    pub fn start(&self, total: u64) {
        self.start_at(total, Instant::now());
    }

    pub(crate) fn start_at(&self, total: u64, now: Instant) {
        let mut state = self.state.write();
        state.total = Some(total);
        state.done = state.done.min(total);
        state.last_tick = Some(now);
        state.raise(if total == 0 { 100.0 } else { 0.0 });
    }

    /// Record `units` completed work units.
    pub fn step(&self, units: u64) {
        self.step_at(units, Instant::now());
    }

    pub(crate) fn step_at(&self, units: u64, now: Instant) {
        if units == 0 {
            return;
        }

        let mut state = self.state.write();
        let Some(total) = state.total else {
            // Unsized workload: nothing to estimate against.
            return;
        };

        state.done = state.done.saturating_add(units).min(total);

        if let Some(last) = state.last_tick {
            let sample = now.saturating_duration_since(last).as_secs_f64() / units as f64;
            let per_unit = match state.per_unit {
                Some(avg) => self.smoothing * sample + (1.0 - self.smoothing) * avg,
                None => sample,
            };
            state.per_unit = Some(per_unit);
            state.remaining_seconds = Some(per_unit * (total - state.done) as f64);
        }
        state.last_tick = Some(now);

        if total > 0 {
            let percent = state.done as f64 * 100.0 / total as f64;
            state.raise(percent);
        }
    }

    /// Report percent directly. Lower values than already reported are ignored.
    pub fn set_percent(&self, percent: f64) {
        if percent.is_nan() {
            return;
        }
        self.state.write().raise(percent);
    }

    /// Report a remaining-time estimate from the worker's own estimator.
    pub fn set_remaining(&self, seconds: f64) {
        if seconds.is_nan() {
            return;
        }
        self.state.write().remaining_seconds = Some(seconds.max(0.0));
    }

    /// Mark the workload complete. No-op for trackers that never measured.
    pub fn finish(&self) {
        let mut state = self.state.write();
        if let Some(total) = state.total {
            state.done = total;
        }
        if state.percent.is_some() {
            state.raise(100.0);
            state.remaining_seconds = Some(0.0);
        }
    }

    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.state.read().percent
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> Option<f64> {
        self.state.read().remaining_seconds
    }

    /// Read both public fields under one lock.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state.read();
        ProgressSnapshot {
            percent: state.percent,
            remaining_seconds: state.remaining_seconds,
        }
    }
}

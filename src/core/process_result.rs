//! Counters for one drain run.

use serde::{Deserialize, Serialize};

/// Counter addressed by [`ProcessResult::modify_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    /// Items delivered and deleted.
    Success,
    /// Items that failed and were released.
    Fail,
    /// Items deliberately not processed.
    Skipped,
}

/// Outcome of a single [`NamedQueue::process`](crate::core::NamedQueue::process) call.
///
/// Counters are signed: `modify_value` may push them below zero and nothing
/// guards against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    success: i64,
    fail: i64,
    skipped: i64,
    exceptions: Vec<String>,
}

impl ProcessResult {
    /// Empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one delivered item.
    pub fn add_success(&mut self) {
        self.success += 1;
    }

    /// Count one failed item.
    pub fn add_fail(&mut self) {
        self.fail += 1;
    }

    /// Count one skipped item.
    pub fn add_skip(&mut self) {
        self.skipped += 1;
    }

    /// Adjust a counter by an arbitrary, possibly negative, amount.
    pub fn modify_value(&mut self, counter: Counter, delta: i64) {
        match counter {
            Counter::Success => self.success += delta,
            Counter::Fail => self.fail += delta,
            Counter::Skipped => self.skipped += delta,
        }
    }

    /// Record a failure message; order is preserved.
    pub fn add_exception(&mut self, message: impl Into<String>) {
        self.exceptions.push(message.into());
    }

    /// Fold another run's counts and messages into this one.
    pub fn merge(&mut self, other: Self) {
        self.success += other.success;
        self.fail += other.fail;
        self.skipped += other.skipped;
        self.exceptions.extend(other.exceptions);
    }

    /// Delivered items.
    pub const fn success(&self) -> i64 {
        self.success
    }

    /// Failed items.
    pub const fn fail(&self) -> i64 {
        self.fail
    }

    /// Skipped items.
    pub const fn skipped(&self) -> i64 {
        self.skipped
    }

    /// Sum of all counters.
    pub const fn total(&self) -> i64 {
        self.success + self.fail + self.skipped
    }

    /// Recorded failure messages.
    pub fn exceptions(&self) -> &[String] {
        &self.exceptions
    }
}

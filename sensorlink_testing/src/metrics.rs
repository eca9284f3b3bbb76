//! Thread-local metric capture.

use std::{cell::RefCell, collections::HashMap};

use metrics::LocalRecorderGuard;
use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};

/// Installs a [`DebuggingRecorder`] for the current thread.
///
/// Only metrics recorded on the installing thread are captured, so async
/// tests should run on a current-thread runtime.
///
/// Taking a snapshot drains the recorder's counters. Every query folds the
/// drained values into running totals, so counters read the same however
/// often, and in whatever order, they are queried.
pub struct MetricsCapture {
    snapshotter: Snapshotter,
    totals: RefCell<HashMap<CompositeKey, u64>>,
    _guard: LocalRecorderGuard<'static>,
}

impl MetricsCapture {
    /// Start capturing metrics on this thread.
    #[must_use]
    pub fn install() -> Self {
        let recorder: &'static DebuggingRecorder = Box::leak(Box::new(DebuggingRecorder::new()));
        let snapshotter = recorder.snapshotter();
        let guard = metrics::set_default_local_recorder(recorder);
        Self {
            snapshotter,
            totals: RefCell::new(HashMap::new()),
            _guard: guard,
        }
    }

    /// Total of the counter `name` across all label sets.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 { self.sum(name, None) }

    /// Value of the counter `name` carrying label `key=value`.
    #[must_use]
    pub fn labelled_counter(&self, name: &str, key: &str, value: &str) -> u64 {
        self.sum(name, Some((key, value)))
    }

    fn sum(&self, name: &str, label: Option<(&str, &str)>) -> u64 {
        let mut totals = self.totals.borrow_mut();
        for (key, value) in drain_counters(&self.snapshotter) {
            *totals.entry(key).or_default() += value;
        }
        totals
            .iter()
            .filter(|(key, _)| matches_counter(key, name, label))
            .map(|(_, value)| *value)
            .sum()
    }
}

/// Sum counters named `name` in a single snapshot, optionally restricted to
/// one label.
///
/// The snapshot drains the counters it reads; take one snapshot per test or
/// use [`MetricsCapture`], which keeps running totals.
#[must_use]
pub fn counter_value(snapshotter: &Snapshotter, name: &str, label: Option<(&str, &str)>) -> u64 {
    drain_counters(snapshotter)
        .filter(|(key, _)| matches_counter(key, name, label))
        .map(|(_, value)| value)
        .sum()
}

fn drain_counters(snapshotter: &Snapshotter) -> impl Iterator<Item = (CompositeKey, u64)> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((key, count)),
            _ => None,
        })
}

fn matches_counter(key: &CompositeKey, name: &str, label: Option<(&str, &str)>) -> bool {
    key.key().name() == name
        && label.is_none_or(|(k, v)| {
            key.key()
                .labels()
                .any(|label| label.key() == k && label.value() == v)
        })
}

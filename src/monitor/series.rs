use std::collections::{BTreeMap, VecDeque};
use std::num::NonZeroUsize;

use dashmap::DashMap;
use serde::Serialize;

use crate::collector::Sample;

/// A sample together with the wall-clock second it was taken at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    /// Timestamp (in UNIX epoch seconds)
    pub timestamp: u64,
    pub sample: Sample,
}

/// Samples per collector, in arrival order.
///
/// Written by the sampling thread and readable from any thread while it runs.
/// Timestamps follow the system clock and are therefore not guaranteed to be
/// increasing; two ticks within the same second both keep their entry.
///
/// Without a retention limit the series grows for as long as the monitor runs.
#[derive(Debug, Default)]
pub struct TimeSeries {
    series: DashMap<String, VecDeque<Entry>>,
    retention: Option<NonZeroUsize>,
}

impl TimeSeries {
    /// Creates an empty series keeping at most `retention` entries per collector.
    pub fn new(retention: Option<NonZeroUsize>) -> Self {
        Self {
            series: DashMap::new(),
            retention,
        }
    }

    /// Creates an empty entry list for `name` if none exists yet.
    pub fn register(&self, name: &str) {
        self.series.entry(name.to_string()).or_default();
    }

    /// Appends a sample, evicting the oldest entries beyond the retention limit.
    pub fn record(&self, name: &str, timestamp: u64, sample: Sample) {
        let mut entries = self.series.entry(name.to_string()).or_default();
        entries.push_back(Entry { timestamp, sample });
        if let Some(max) = self.retention {
            while entries.len() > max.get() {
                entries.pop_front();
            }
        }
    }

    /// Copies all entries of `name`, oldest first. Unknown names yield nothing.
    pub fn samples(&self, name: &str) -> Vec<Entry> {
        self.series
            .get(name)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest(&self, name: &str) -> Option<Sample> {
        self.series
            .get(name)
            .and_then(|entries| entries.back().map(|e| e.sample.clone()))
    }

    pub fn len(&self, name: &str) -> usize {
        self.series.get(name).map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|entries| entries.is_empty())
    }

    /// Registered collector names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.series.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Consistent-per-collector copy of the whole series.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<Entry>> {
        self.series
            .iter()
            .map(|entries| {
                (
                    entries.key().clone(),
                    entries.value().iter().cloned().collect(),
                )
            })
            .collect()
    }
}

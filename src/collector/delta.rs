use std::collections::{BTreeMap, HashMap};

/// Raw cumulative counters of one sub-resource, keyed by field name.
pub type Counters = BTreeMap<&'static str, u64>;

/// Per-field differences between two readings of one sub-resource.
pub type Deltas = BTreeMap<&'static str, i64>;

/// Turns cumulative counters into per-tick differences.
///
/// The baseline always holds the most recent raw reading. Each call to
/// [`advance`](Self::advance) emits `current - baseline` per sub-resource and
/// per field, then rolls the baseline forward to `current`.
///
/// A sub-resource or field missing from the baseline is diffed against zero,
/// so an interface appearing after priming reports its full counter on the
/// first tick. Sub-resources absent from the current reading are not emitted.
/// A counter that went backwards (reset or wrap) produces a negative delta.
#[derive(Debug, Default)]
pub struct CounterDelta {
    baseline: HashMap<String, Counters>,
}

impl CounterDelta {
    /// Replaces the baseline without emitting anything.
    pub fn prime(&mut self, reading: HashMap<String, Counters>) {
        self.baseline = reading;
    }

    pub fn advance(&mut self, reading: HashMap<String, Counters>) -> BTreeMap<String, Deltas> {
        let deltas = reading
            .iter()
            .map(|(resource, counters)| {
                let previous = self.baseline.get(resource);
                let fields = counters
                    .iter()
                    .map(|(&field, &current)| {
                        let last = previous.and_then(|p| p.get(field)).copied().unwrap_or(0);
                        (field, current.wrapping_sub(last) as i64)
                    })
                    .collect();
                (resource.clone(), fields)
            })
            .collect();

        self.baseline = reading;
        deltas
    }

    pub fn baseline(&self) -> &HashMap<String, Counters> {
        &self.baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(entries: &[(&str, &[(&'static str, u64)])]) -> HashMap<String, Counters> {
        entries
            .iter()
            .map(|(name, fields)| (name.to_string(), fields.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn test_deltas_roll_forward() {
        let mut delta = CounterDelta::default();
        delta.prime(reading(&[("eth0", &[("rx", 100), ("tx", 10)])]));

        let first = delta.advance(reading(&[("eth0", &[("rx", 150), ("tx", 12)])]));
        assert_eq!(first["eth0"]["rx"], 50);
        assert_eq!(first["eth0"]["tx"], 2);

        let second = delta.advance(reading(&[("eth0", &[("rx", 151), ("tx", 20)])]));
        assert_eq!(second["eth0"]["rx"], 1);
        assert_eq!(second["eth0"]["tx"], 8);
        assert_eq!(delta.baseline()["eth0"]["rx"], 151);
    }

    #[test]
    fn test_counter_reset_gives_negative_delta() {
        let mut delta = CounterDelta::default();
        delta.prime(reading(&[("eth0", &[("rx", 1_000)])]));
        let out = delta.advance(reading(&[("eth0", &[("rx", 40)])]));
        assert_eq!(out["eth0"]["rx"], -960);
    }

    #[test]
    fn test_new_resource_and_field_use_zero_baseline() {
        let mut delta = CounterDelta::default();
        delta.prime(reading(&[("eth0", &[("rx", 5)])]));
        let out = delta.advance(reading(&[
            ("eth0", &[("rx", 7), ("tx", 3)]),
            ("wlan0", &[("rx", 42)]),
        ]));
        assert_eq!(out["eth0"]["rx"], 2);
        assert_eq!(out["eth0"]["tx"], 3);
        assert_eq!(out["wlan0"]["rx"], 42);
    }

    #[test]
    fn test_vanished_resource_is_dropped() {
        let mut delta = CounterDelta::default();
        delta.prime(reading(&[("eth0", &[("rx", 5)]), ("tun0", &[("rx", 9)])]));
        let out = delta.advance(reading(&[("eth0", &[("rx", 6)])]));
        assert_eq!(out.len(), 1);
        assert!(!delta.baseline().contains_key("tun0"));
    }

    #[test]
    fn test_unprimed_advance_reports_raw_values() {
        let mut delta = CounterDelta::default();
        let out = delta.advance(reading(&[("lo", &[("rx", 77)])]));
        assert_eq!(out["lo"]["rx"], 77);
    }
}

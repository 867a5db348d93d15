use std::collections::HashMap;
use std::sync::Arc;

use super::{Collector, CounterDelta, Counters, Sample};
use crate::source::{MetricSource, SourceError};

/// Per-interface network I/O since the previous sample.
///
/// [`setup`](Collector::setup) captures the baseline; every sample then
/// reports the difference to the reading taken by the sample before it.
pub struct NetIo {
    source: Arc<dyn MetricSource>,
    delta: CounterDelta,
}

impl NetIo {
    pub const NAME: &'static str = "net_io";

    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self {
            source,
            delta: CounterDelta::default(),
        }
    }

    fn read(&self) -> Result<HashMap<String, Counters>, SourceError> {
        Ok(self
            .source
            .net_io_counters()?
            .into_iter()
            .map(|(iface, counters)| (iface, counters.counters()))
            .collect())
    }
}

impl Collector for NetIo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn setup(&mut self) -> Result<(), SourceError> {
        let baseline = self.read()?;
        self.delta.prime(baseline);
        Ok(())
    }

    fn sample(&mut self) -> Result<Sample, SourceError> {
        let reading = self.read()?;
        Ok(Sample::NetIo(self.delta.advance(reading)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{ScriptedSource, iface};

    fn net(entries: &[(&str, u64, u64)]) -> HashMap<String, crate::source::NetIoCounters> {
        entries
            .iter()
            .map(|&(name, rx, tx)| (name.to_string(), iface(rx, tx)))
            .collect()
    }

    fn deltas(sample: Sample) -> std::collections::BTreeMap<String, crate::collector::Deltas> {
        match sample {
            Sample::NetIo(d) => d,
            other => panic!("expected net_io sample, got {other:?}"),
        }
    }

    #[test]
    fn test_each_sample_is_delta_to_previous_reading() {
        let r0 = net(&[("eth0", 1_000, 500)]);
        let r1 = net(&[("eth0", 1_600, 400)]);
        let r2 = net(&[("eth0", 1_700, 900)]);
        let source = Arc::new(ScriptedSource::with_net(vec![r0, r1, r2]));
        let mut collector = NetIo::new(source);

        collector.setup().unwrap();
        let d1 = deltas(collector.sample().unwrap());
        let d2 = deltas(collector.sample().unwrap());

        assert_eq!(d1["eth0"]["bytes_recv"], 600);
        assert_eq!(d1["eth0"]["bytes_sent"], -100);
        assert_eq!(d1["eth0"]["packets_recv"], 0);
        assert_eq!(d2["eth0"]["bytes_recv"], 100);
        assert_eq!(d2["eth0"]["bytes_sent"], 500);
        assert_eq!(d2["eth0"].len(), 8);
    }

    #[test]
    fn test_interface_appearing_after_setup() {
        let source = Arc::new(ScriptedSource::with_net(vec![
            net(&[("eth0", 10, 10)]),
            net(&[("eth0", 20, 10), ("wg0", 300, 7)]),
        ]));
        let mut collector = NetIo::new(source);

        collector.setup().unwrap();
        let d1 = deltas(collector.sample().unwrap());
        assert_eq!(d1["eth0"]["bytes_recv"], 10);
        assert_eq!(d1["wg0"]["bytes_recv"], 300);
        assert_eq!(d1["wg0"]["bytes_sent"], 7);
    }

    #[test]
    fn test_repeated_reading_gives_zero_deltas() {
        let source = Arc::new(ScriptedSource::with_net(vec![net(&[("lo", 5, 5)])]));
        let mut collector = NetIo::new(source);

        collector.setup().unwrap();
        let d1 = deltas(collector.sample().unwrap());
        assert!(d1["lo"].values().all(|&v| v == 0));
    }
}

use std::sync::Arc;

use super::{Collector, Sample};
use crate::source::{MetricSource, SourceError};

/// Per logical CPU percent of time spent in each state.
pub struct CpuTime {
    source: Arc<dyn MetricSource>,
}

impl CpuTime {
    pub const NAME: &'static str = "cpus";

    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

impl Collector for CpuTime {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn sample(&mut self) -> Result<Sample, SourceError> {
        self.source.cpu_times_percent().map(Sample::Cpus)
    }
}

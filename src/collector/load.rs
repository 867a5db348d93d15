use std::sync::Arc;

use super::{Collector, Sample};
use crate::source::{MetricSource, SourceError};

/// System load averages over 1, 5 and 15 minutes.
pub struct LoadAvg {
    source: Arc<dyn MetricSource>,
}

impl LoadAvg {
    pub const NAME: &'static str = "loadavg";

    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

impl Collector for LoadAvg {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn sample(&mut self) -> Result<Sample, SourceError> {
        self.source.load_average().map(Sample::LoadAvg)
    }
}

use std::sync::Arc;

use super::{Collector, Sample};
use crate::source::{MetricSource, SourceError};

/// Instantaneous virtual memory statistics.
pub struct Mem {
    source: Arc<dyn MetricSource>,
}

impl Mem {
    pub const NAME: &'static str = "mem";

    pub fn new(source: Arc<dyn MetricSource>) -> Self {
        Self { source }
    }
}

impl Collector for Mem {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn sample(&mut self) -> Result<Sample, SourceError> {
        self.source.virtual_memory().map(Sample::Mem)
    }
}

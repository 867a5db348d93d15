//! Static mapping from collector name to constructor.
//!
//! The map is built once on first access and never mutated afterwards.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use super::{Collector, CpuTime, LoadAvg, Mem, NetIo};
use crate::error::{Error, Result};
use crate::source::MetricSource;

/// Builds a collector reading from the given source.
pub type Constructor = fn(Arc<dyn MetricSource>) -> Box<dyn Collector>;

static REGISTRY: LazyLock<BTreeMap<&'static str, Constructor>> = LazyLock::new(|| {
    let mut m: BTreeMap<&'static str, Constructor> = BTreeMap::new();

    m.insert(CpuTime::NAME, |s| Box::new(CpuTime::new(s)));
    m.insert(LoadAvg::NAME, |s| Box::new(LoadAvg::new(s)));
    m.insert(Mem::NAME, |s| Box::new(Mem::new(s)));
    m.insert(NetIo::NAME, |s| Box::new(NetIo::new(s)));

    m
});

/// Resolves a collector name to its constructor.
///
/// # Errors
///
/// Returns [`Error::UnknownCollector`] if no collector is registered under `name`.
pub fn lookup(name: &str) -> Result<Constructor> {
    REGISTRY
        .get(name)
        .copied()
        .ok_or_else(|| Error::UnknownCollector(name.to_string()))
}

/// All registered names, in sorted order.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

//! Virtual memory statistics from `/proc/meminfo`.
//!
//! The raw file is parsed into [`MemInfo`] (values in kB, exactly as the kernel
//! reports them) and then folded into [`VirtualMemory`], which carries bytes and
//! the derived `used`/`available`/`percent` figures.
//!
//! # Example
//!
//! ```rust
//! use hostmon::source::{KeyValueStat, MemInfo, VirtualMemory};
//!
//! let data = "MemTotal: 1000 kB\nMemFree: 200 kB\nMemAvailable: 600 kB\n";
//! let info = MemInfo::from_reader(&mut data.as_bytes()).unwrap();
//! let mem = VirtualMemory::from(info);
//! assert_eq!(mem.total, 1000 * 1024);
//! assert_eq!(mem.percent, 40.0);
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use super::KeyValueStat;

/// The subset of `/proc/meminfo` needed for [`VirtualMemory`], in kB.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    /// Absent on kernels older than 3.14.
    pub mem_available: Option<u64>,
    pub buffers: u64,
    pub cached: u64,
    pub shmem: u64,
    pub active: u64,
    pub inactive: u64,
    pub slab: u64,
    pub s_reclaimable: u64,
}

type Setter = fn(&mut MemInfo, u64);

static SETTERS: LazyLock<HashMap<&'static str, Setter>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, Setter> = HashMap::with_capacity(10);

    m.insert("MemTotal", |s, v| s.mem_total = v);
    m.insert("MemFree", |s, v| s.mem_free = v);
    m.insert("MemAvailable", |s, v| s.mem_available = Some(v));
    m.insert("Buffers", |s, v| s.buffers = v);
    m.insert("Cached", |s, v| s.cached = v);
    m.insert("Shmem", |s, v| s.shmem = v);
    m.insert("Active", |s, v| s.active = v);
    m.insert("Inactive", |s, v| s.inactive = v);
    m.insert("Slab", |s, v| s.slab = v);
    m.insert("SReclaimable", |s, v| s.s_reclaimable = v);

    m
});

impl KeyValueStat for MemInfo {
    const SKIP_LINES: usize = 0;
    const ALLOW_DUPLICATE_KEYS: bool = false;

    fn field_handlers() -> &'static HashMap<&'static str, fn(&mut Self, u64)> {
        &SETTERS
    }
}

/// System-wide memory usage, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VirtualMemory {
    pub total: u64,
    pub available: u64,
    /// Share of `total` not available, in percent with one decimal.
    pub percent: f64,
    pub used: u64,
    pub free: u64,
    pub active: u64,
    pub inactive: u64,
    pub buffers: u64,
    /// Page cache including reclaimable slab.
    pub cached: u64,
    pub shared: u64,
    pub slab: u64,
}

const KIB: u64 = 1024;

impl From<MemInfo> for VirtualMemory {
    fn from(info: MemInfo) -> Self {
        let total = info.mem_total * KIB;
        let free = info.mem_free * KIB;
        let buffers = info.buffers * KIB;
        let cached = (info.cached + info.s_reclaimable) * KIB;
        let available = info
            .mem_available
            .map(|kb| kb * KIB)
            .unwrap_or(free + cached)
            .min(total);

        let used = total
            .checked_sub(free + cached + buffers)
            .unwrap_or_else(|| total.saturating_sub(free));

        let percent = if total == 0 {
            0.0
        } else {
            let pct = (total - available) as f64 / total as f64 * 100.0;
            (pct * 10.0).round() / 10.0
        };

        Self {
            total,
            available,
            percent,
            used,
            free,
            active: info.active * KIB,
            inactive: info.inactive * KIB,
            buffers,
            cached,
            shared: info.shmem * KIB,
            slab: info.slab * KIB,
        }
    }
}

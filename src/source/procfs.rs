use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{
    CpuTimes, CpuTimesPercent, KeyValueStat, LoadAverage, MemInfo, MetricSource, NetIoCounters,
    Result, SourceError, StatParseError, VirtualMemory,
};

/// [`MetricSource`] backed by the Linux procfs.
///
/// All files are resolved below `rootfs`, so a host root mounted into a
/// container (e.g. at `/rootfs`) can be observed as well as `/` itself.
#[derive(Debug)]
pub struct ProcSource {
    proc_dir: PathBuf,
    /// Previous `/proc/stat` reading keyed by CPU number, the baseline for CPU percentages.
    last_cpu_times: Mutex<BTreeMap<usize, CpuTimes>>,
}

impl ProcSource {
    pub fn new(rootfs: impl AsRef<Path>) -> Self {
        Self {
            proc_dir: rootfs.as_ref().join("proc"),
            last_cpu_times: Mutex::new(BTreeMap::new()),
        }
    }

    fn read<T>(
        &self,
        relative: &str,
        parse: impl FnOnce(&mut BufReader<File>) -> std::result::Result<T, StatParseError>,
    ) -> Result<T> {
        let path = self.proc_dir.join(relative);
        let file = File::open(&path).map_err(|source| SourceError::FileOpen {
            path: path.clone(),
            source,
        })?;
        parse(&mut BufReader::new(file)).map_err(|source| SourceError::Parse { path, source })
    }
}

impl Default for ProcSource {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MetricSource for ProcSource {
    fn cpu_times_percent(&self) -> Result<Vec<CpuTimesPercent>> {
        let current = self.read("stat", CpuTimes::per_cpu_from_reader)?;
        let mut last = self
            .last_cpu_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // CPUs without a previous reading (first call, hotplug) are measured since boot.
        let percent = current
            .iter()
            .map(|(n, cpu)| cpu.percent_since(last.get(n).unwrap_or(&CpuTimes::default())))
            .collect();
        *last = current;
        Ok(percent)
    }

    fn load_average(&self) -> Result<LoadAverage> {
        self.read("loadavg", LoadAverage::from_reader)
    }

    fn virtual_memory(&self) -> Result<VirtualMemory> {
        self.read("meminfo", MemInfo::from_reader)
            .map(VirtualMemory::from)
    }

    fn net_io_counters(&self) -> Result<std::collections::HashMap<String, NetIoCounters>> {
        self.read("net/dev", NetIoCounters::per_interface_from_reader)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join("proc").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_reads_fixture_tree() {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        write(root.path(), "loadavg", "1.50 0.75 0.25 3/400 1234\n");
        write(
            root.path(),
            "meminfo",
            "MemTotal: 2000 kB\nMemFree: 500 kB\nMemAvailable: 1000 kB\n",
        );
        write(
            root.path(),
            "net/dev",
            "header\nheader\n  eth0: 1 2 0 0 0 0 0 0 3 4 0 0 0 0 0 0\n",
        );

        let source = ProcSource::new(root.path());
        assert_eq!(source.load_average().unwrap().one, 1.5);
        assert_eq!(source.virtual_memory().unwrap().percent, 50.0);
        let net = source.net_io_counters().unwrap();
        assert_eq!(net["eth0"].bytes_recv, 1);
        assert_eq!(net["eth0"].bytes_sent, 3);
    }

    #[test]
    fn test_cpu_percent_uses_previous_reading() {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        write(root.path(), "stat", "cpu 10 0 0 10\ncpu0 10 0 0 10\n");
        let source = ProcSource::new(root.path());

        let first = source.cpu_times_percent().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].user, 50.0);

        write(root.path(), "stat", "cpu 40 0 0 20\ncpu0 40 0 0 20\n");
        let second = source.cpu_times_percent().unwrap();
        assert_eq!(second[0].user, 75.0);
        assert_eq!(second[0].idle, 25.0);
    }

    #[test]
    fn test_cpu_baseline_follows_cpu_number_when_one_goes_offline() {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        write(
            root.path(),
            "stat",
            "cpu 0 0 0 0\ncpu0 10 0 0 90\ncpu1 500 0 0 500\ncpu2 40 0 0 60\n",
        );
        let source = ProcSource::new(root.path());
        source.cpu_times_percent().unwrap();

        // cpu1 went offline; cpu2 must still be diffed against its own ticks.
        write(root.path(), "stat", "cpu 0 0 0 0\ncpu0 20 0 0 180\ncpu2 140 0 0 60\n");
        let percent = source.cpu_times_percent().unwrap();
        assert_eq!(percent.len(), 2);
        assert_eq!(percent[0].user, 10.0);
        assert_eq!(percent[1].user, 100.0);
        assert_eq!(percent[1].idle, 0.0);
    }

    #[test]
    fn test_missing_file_is_reported_with_path() {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let source = ProcSource::new(root.path());
        match source.load_average().unwrap_err() {
            SourceError::FileOpen { path, source } => {
                assert_eq!(path, root.path().join("proc/loadavg"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected FileOpen, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_failure_is_reported_with_path() {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        write(root.path(), "loadavg", "not numbers at all\n");
        let source = ProcSource::new(root.path());
        assert!(matches!(
            source.load_average().unwrap_err(),
            SourceError::Parse { .. }
        ));
    }
}

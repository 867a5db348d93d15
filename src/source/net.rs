use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;

use super::StatParseError;

/// Cumulative I/O counters for a single network interface, as reported in `/proc/net/dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetIoCounters {
    /// Bytes transmitted.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_recv: u64,
    /// Packets transmitted.
    pub packets_sent: u64,
    /// Packets received.
    pub packets_recv: u64,
    /// Receive errors.
    pub errin: u64,
    /// Transmit errors.
    pub errout: u64,
    /// Packets dropped while receiving.
    pub dropin: u64,
    /// Packets dropped while transmitting.
    pub dropout: u64,
}

impl NetIoCounters {
    /// Returns the counters keyed by field name, the shape consumed by
    /// [`CounterDelta`](crate::collector::CounterDelta).
    pub fn counters(&self) -> BTreeMap<&'static str, u64> {
        BTreeMap::from([
            ("bytes_sent", self.bytes_sent),
            ("bytes_recv", self.bytes_recv),
            ("packets_sent", self.packets_sent),
            ("packets_recv", self.packets_recv),
            ("errin", self.errin),
            ("errout", self.errout),
            ("dropin", self.dropin),
            ("dropout", self.dropout),
        ])
    }

    /// Reads every interface from a `/proc/net/dev` formatted reader.
    ///
    /// The two header lines are skipped. Lines with fewer than 16 counters are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StatParseError::Io`] if reading from `buf` fails, or
    /// [`StatParseError::InvalidKeyValue`] if a counter is not an unsigned integer.
    pub fn per_interface_from_reader<R: BufRead>(
        buf: &mut R,
    ) -> Result<HashMap<String, Self>, StatParseError> {
        let mut interfaces = HashMap::new();
        let mut line = String::new();

        for _ in 0..2 {
            buf.read_line(&mut line)?;
            line.clear();
        }

        // Line numbers count the skipped header.
        let mut lineno = 2;
        while buf.read_line(&mut line)? != 0 {
            lineno += 1;
            if let Some((iface, fields)) = parse_interface_line(&line) {
                if let Some(counters) = counters_from_fields(iface, fields, lineno)? {
                    interfaces.insert(iface.to_string(), counters);
                }
            }
            line.clear();
        }

        Ok(interfaces)
    }
}

/// Splits `  eth0: 1 2 3 ...` into the interface name and its counter columns.
fn parse_interface_line(line: &str) -> Option<(&str, impl Iterator<Item = &str>)> {
    let (iface, data) = line.trim().split_once(':')?;
    Some((iface.trim(), data.split_whitespace()))
}

/// Maps the 16 `/proc/net/dev` columns onto [`NetIoCounters`].
///
/// Receive columns are `bytes packets errs drop fifo frame compressed multicast`,
/// followed by transmit `bytes packets errs drop fifo colls carrier compressed`.
/// Returns `None` for lines with too few columns.
fn counters_from_fields<'a>(
    iface: &str,
    fields: impl Iterator<Item = &'a str>,
    lineno: usize,
) -> Result<Option<NetIoCounters>, StatParseError> {
    let mut columns = [0u64; 16];
    let mut seen = 0;
    for (slot, raw) in columns.iter_mut().zip(fields) {
        *slot = raw
            .parse()
            .map_err(|source| StatParseError::InvalidKeyValue {
                key: iface.to_string(),
                value: raw.to_string(),
                line: lineno,
                source,
            })?;
        seen += 1;
    }
    if seen < columns.len() {
        return Ok(None);
    }

    Ok(Some(NetIoCounters {
        bytes_recv: columns[0],
        packets_recv: columns[1],
        errin: columns[2],
        dropin: columns[3],
        bytes_sent: columns[8],
        packets_sent: columns[9],
        errout: columns[10],
        dropout: columns[11],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

    fn parse(body: &str) -> HashMap<String, NetIoCounters> {
        let data = format!("{HEADER}{body}");
        NetIoCounters::per_interface_from_reader(&mut data.as_bytes()).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let stats = NetIoCounters::per_interface_from_reader(&mut &b""[..]).unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn test_only_headers() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_interfaces_including_loopback() {
        let stats = parse(
            "    lo: 422198341   75815    0    0    0     0          0         0 422198341   75815    0    0    0     0       0          0
  eth0: 10240    100     1    2    0     0          0         0  20480   200     3    4    0     0       0          0
",
        );
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["lo"].bytes_recv, 422_198_341);

        let eth0 = stats["eth0"];
        assert_eq!(eth0.bytes_recv, 10240);
        assert_eq!(eth0.packets_recv, 100);
        assert_eq!(eth0.errin, 1);
        assert_eq!(eth0.dropin, 2);
        assert_eq!(eth0.bytes_sent, 20480);
        assert_eq!(eth0.packets_sent, 200);
        assert_eq!(eth0.errout, 3);
        assert_eq!(eth0.dropout, 4);
    }

    #[test]
    fn test_malformed_line_too_few_fields() {
        assert!(parse(" badif: 123 456\n").is_empty());
    }

    #[test]
    fn test_unparsable_counter_is_an_error() {
        let data = format!(
            "{HEADER}    lo: 1 1 0 0 0 0 0 0 1 1 0 0 0 0 0 0\n  eth0: 1000 xyz 0 0 0 0 0 0 20480 200 0 0 0 0 0 0\n"
        );
        match NetIoCounters::per_interface_from_reader(&mut data.as_bytes()) {
            Err(StatParseError::InvalidKeyValue {
                key, value, line, ..
            }) => {
                assert_eq!(key, "eth0");
                assert_eq!(value, "xyz");
                assert_eq!(line, 4);
            }
            other => panic!("expected InvalidKeyValue, got {other:?}"),
        }
    }

    #[test]
    fn test_counters_cover_every_field() {
        let counters = NetIoCounters {
            bytes_sent: 1,
            dropout: 8,
            ..Default::default()
        }
        .counters();
        assert_eq!(counters.len(), 8);
        assert_eq!(counters["bytes_sent"], 1);
        assert_eq!(counters["dropout"], 8);
    }
}

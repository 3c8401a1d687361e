use collector::{CollectResult, Collector, Host};
use delta::DeltaEngine;

/// Column names of `/proc/net/dev`, in order.
pub const COLUMNS: [&str; 16] = [
    "recv_bytes",
    "recv_packets",
    "recv_errs",
    "recv_drop",
    "recv_fifo",
    "recv_frame",
    "recv_compressed",
    "recv_multicast",
    "trans_bytes",
    "trans_packets",
    "trans_errs",
    "trans_drop",
    "trans_fifo",
    "trans_colls",
    "trans_carrier",
    "trans_compressed",
];

/// Parse `/proc/net/dev`, skipping its two header lines.
///
/// Returns `None` if any interface line is malformed. A counter that fails
/// to parse reads as zero.
pub fn parse_net_dev(content: &str) -> Option<Vec<(String, Vec<i64>)>> {
    let mut res = Vec::new();
    for line in content.lines().skip(2) {
        let mut halves = line.splitn(2, ':');
        let (iface, counters) = match (halves.next(), halves.next()) {
            (Some(i), Some(c)) => (i.trim(), c),
            _ => return None,
        };
        let vals: Vec<i64> = counters
            .split_whitespace()
            .map(|v| v.parse().unwrap_or(0))
            .collect();
        if vals.len() < COLUMNS.len() {
            return None;
        }
        res.push((iface.to_string(), vals));
    }
    Some(res)
}

/// Per-interface network counters, differenced.
pub struct Network {
    host: Host,
}

impl Network {
    /// Create a `Network` collector for `host`.
    pub fn new(host: Host) -> Network {
        Network { host: host }
    }
}

impl Collector for Network {
    fn name(&self) -> &'static str {
        "network"
    }

    fn collect(&self, engine: &DeltaEngine) -> CollectResult {
        let content = self.host.read_proc("net/dev")?;
        let ifaces = match parse_net_dev(&content) {
            Some(ifaces) => ifaces,
            None => {
                warn!("malformed /proc/net/dev, skipping this cycle");
                return Ok(Vec::new());
            }
        };

        let mut points = Vec::new();
        for (iface, vals) in ifaces {
            let mut point = self.host
                .point("network")
                .overlay_tag("iface", iface.as_str());
            for (name, val) in COLUMNS.iter().zip(vals) {
                point = point.field(*name, val);
            }
            if let Some(point) = engine.compute_delta(point) {
                points.push(Some(point));
            }
        }
        Ok(points)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use collector::test_util::FakeProc;
    use metric::FieldValue;

    const HEADER: &str = "Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
";

    fn net_dev(lo_bytes: i64, eth_bytes: i64) -> String {
        format!(
            "{}    lo: {} 10 0 0 0 0 0 0 {} 10 0 0 0 0 0 0\n  eth0: {} 20 1 0 0 0 0 3 500 7 0 0 0 0 0 0\n",
            HEADER, lo_bytes, lo_bytes, eth_bytes
        )
    }

    #[test]
    fn parse_interfaces() {
        let parsed = parse_net_dev(&net_dev(100, 2000)).unwrap();
        assert_eq!(2, parsed.len());
        assert_eq!("lo", parsed[0].0);
        assert_eq!("eth0", parsed[1].0);
        assert_eq!(2000, parsed[1].1[0]);
        assert_eq!(3, parsed[1].1[7]);
    }

    #[test]
    fn unparseable_counter_reads_zero() {
        let content = format!("{}  eth0: x 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15\n", HEADER);
        let parsed = parse_net_dev(&content).unwrap();
        assert_eq!(0, parsed[0].1[0]);
        assert_eq!(15, parsed[0].1[15]);
    }

    #[test]
    fn line_without_colon_is_malformed() {
        let content = format!("{}garbage line\n", HEADER);
        assert!(parse_net_dev(&content).is_none());
    }

    #[test]
    fn malformed_file_is_a_zero_point_result() {
        let proc_fs = FakeProc::new();
        proc_fs.write("net/dev", &format!("{}garbage line\n", HEADER));
        let res = Network::new(proc_fs.host.clone())
            .collect(&DeltaEngine::default())
            .unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn interfaces_are_differenced() {
        let proc_fs = FakeProc::new();
        let engine = DeltaEngine::default();
        let network = Network::new(proc_fs.host.clone());

        proc_fs.write("net/dev", &net_dev(100, 2000));
        assert!(network.collect(&engine).unwrap().is_empty());

        proc_fs.write("net/dev", &net_dev(150, 2600));
        let points = network.collect(&engine).unwrap();
        assert_eq!(2, points.len());
        let eth0 = points[1].clone().unwrap();
        assert_eq!(
            Some(&"eth0".to_string()),
            eth0.tags.get(&"iface".to_string())
        );
        assert_eq!(Some(&FieldValue::I64(600)), eth0.fields.get("recv_bytes"));
        assert_eq!(Some(&FieldValue::I64(0)), eth0.fields.get("trans_bytes"));
        assert_eq!(16, eth0.fields.len());
    }
}

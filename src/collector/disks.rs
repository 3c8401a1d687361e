use collector::{CollectResult, Collector, Host};
use delta::DeltaEngine;

/// Column names of `/proc/diskstats` following major, minor and device name.
pub const COLUMNS: [&str; 11] = [
    "read_ios",
    "read_merges",
    "read_sectors",
    "read_ticks",
    "write_ios",
    "write_merges",
    "write_sectors",
    "write_ticks",
    "in_flight",
    "io_ticks",
    "time_in_queue",
];

/// Parse `/proc/diskstats`.
///
/// Returns `None` if any line has fewer than the 14 classic columns. Newer
/// kernels append discard and flush counters; those are ignored. A counter
/// that fails to parse reads as zero.
pub fn parse_diskstats(content: &str) -> Option<Vec<(String, Vec<i64>)>> {
    let mut res = Vec::new();
    for line in content.lines() {
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.len() < 3 + COLUMNS.len() {
            return None;
        }
        let vals: Vec<i64> = cols[3..3 + COLUMNS.len()]
            .iter()
            .map(|v| v.parse().unwrap_or(0))
            .collect();
        res.push((cols[2].to_string(), vals));
    }
    Some(res)
}

/// Per-device block I/O counters, differenced.
pub struct Disks {
    host: Host,
}

impl Disks {
    /// Create a `Disks` collector for `host`.
    pub fn new(host: Host) -> Disks {
        Disks { host: host }
    }
}

impl Collector for Disks {
    fn name(&self) -> &'static str {
        "disks"
    }

    fn collect(&self, engine: &DeltaEngine) -> CollectResult {
        let content = self.host.read_proc("diskstats")?;
        let devices = match parse_diskstats(&content) {
            Some(devices) => devices,
            None => {
                warn!("malformed /proc/diskstats, skipping this cycle");
                return Ok(Vec::new());
            }
        };

        let mut points = Vec::new();
        for (device, vals) in devices {
            let mut point = self.host
                .point("disks")
                .overlay_tag("device", device.as_str());
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

use collector::{CollectResult, Collector, Error, Host};
use delta::DeltaEngine;
use metric::Point;

/// Cumulative CPU time, in jiffies, from one `cpu` line of `/proc/stat`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub sys: u64,
    pub idle: u64,
    pub wait: u64,
    pub irq: u64,
    pub soft_irq: u64,
    pub stolen: u64,
}

impl CpuTimes {
    /// Sum of every accounted state.
    pub fn total(&self) -> u64 {
        self.user
            .wrapping_add(self.nice)
            .wrapping_add(self.sys)
            .wrapping_add(self.idle)
            .wrapping_add(self.wait)
            .wrapping_add(self.irq)
            .wrapping_add(self.soft_irq)
            .wrapping_add(self.stolen)
    }

    fn into_point(self, host: &Host, name: &str, cpuid: &str) -> Point {
        host.point(name)
            .overlay_tag("cpuid", cpuid)
            .field("user", self.user)
            .field("nice", self.nice)
            .field("sys", self.sys)
            .field("idle", self.idle)
            .field("wait", self.wait)
            .field("total", self.total())
    }
}

/// Parse every `cpu*` line of `/proc/stat`.
///
/// The label is returned with its `cpu` prefix stripped: the aggregate line
/// yields an empty label, per-CPU lines yield their index. Columns missing on
/// older kernels read as zero.
pub fn parse_stat(content: &str) -> Result<Vec<(String, CpuTimes)>, Error> {
    let mut res = Vec::new();
    for line in content.lines() {
        let mut cols = line.split_whitespace();
        let label = match cols.next() {
            Some(l) if l.starts_with("cpu") => l[3..].to_string(),
            _ => continue,
        };
        let mut vals = [0u64; 8];
        for (slot, col) in vals.iter_mut().zip(cols) {
            *slot = col
                .parse()
                .map_err(|e| Error::Parse(format!("/proc/stat cpu{}: {}", label, e)))?;
        }
        res.push((
            label,
            CpuTimes {
                user: vals[0],
                nice: vals[1],
                sys: vals[2],
                idle: vals[3],
                wait: vals[4],
                irq: vals[5],
                soft_irq: vals[6],
                stolen: vals[7],
            },
        ));
    }
    Ok(res)
}

/// Aggregate CPU time across every core.
pub struct Cpu {
    host: Host,
}

impl Cpu {
    /// Create a `Cpu` collector for `host`.
    pub fn new(host: Host) -> Cpu {
        Cpu { host: host }
    }
}

impl Collector for Cpu {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn collect(&self, engine: &DeltaEngine) -> CollectResult {
        let stat = self.host.read_proc("stat")?;
        let times = parse_stat(&stat)?
            .into_iter()
            .find(|&(ref label, _)| label.is_empty())
            .map(|(_, times)| times)
            .ok_or_else(|| Error::Parse("/proc/stat has no aggregate cpu line".into()))?;
        let point = times.into_point(&self.host, "cpu", "all");
        Ok(vec![engine.compute_delta(point)])
    }
}

/// CPU time of each core.
pub struct Cpus {
    host: Host,
}

impl Cpus {
    /// Create a `Cpus` collector for `host`.
    pub fn new(host: Host) -> Cpus {
        Cpus { host: host }
    }
}

impl Collector for Cpus {
    fn name(&self) -> &'static str {
        "cpus"
    }

    // Cores seen for the first time are left out rather than reported as
    // pending, so a hot-plugged core does not hold back the whole cycle.
    fn collect(&self, engine: &DeltaEngine) -> CollectResult {
        let stat = self.host.read_proc("stat")?;
        let mut points = Vec::new();
        for (label, times) in parse_stat(&stat)? {
            if label.is_empty() {
                continue;
            }
            let point = times.into_point(&self.host, "cpus", &label);
            if let Some(point) = engine.compute_delta(point) {
                points.push(Some(point));
            }
        }
        Ok(points)
    }
}

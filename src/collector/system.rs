use collector::{CollectResult, Collector, Error, Host};
use delta::DeltaEngine;

fn parse_floats(content: &str, what: &str, count: usize) -> Result<Vec<f64>, Error> {
    let vals = content
        .split_whitespace()
        .take(count)
        .map(|v| v.parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| Error::Parse(format!("{}: {}", what, e)))?;
    if vals.len() < count {
        return Err(Error::Parse(format!(
            "{}: expected {} values, found {}",
            what,
            count,
            vals.len()
        )));
    }
    Ok(vals)
}

/// Seconds since boot, from `/proc/uptime`.
pub struct Uptime {
    host: Host,
}

impl Uptime {
    /// Create a `Uptime` collector for `host`.
    pub fn new(host: Host) -> Uptime {
        Uptime { host: host }
    }
}

impl Collector for Uptime {
    fn name(&self) -> &'static str {
        "uptime"
    }

    fn collect(&self, _engine: &DeltaEngine) -> CollectResult {
        let vals = parse_floats(&self.host.read_proc("uptime")?, "/proc/uptime", 1)?;
        Ok(vec![Some(self.host.point("uptime").field("length", vals[0]))])
    }
}

/// Load averages, from `/proc/loadavg`.
pub struct Load {
    host: Host,
}

impl Load {
    /// Create a `Load` collector for `host`.
    pub fn new(host: Host) -> Load {
        Load { host: host }
    }
}

impl Collector for Load {
    fn name(&self) -> &'static str {
        "load"
    }

    fn collect(&self, _engine: &DeltaEngine) -> CollectResult {
        let vals = parse_floats(&self.host.read_proc("loadavg")?, "/proc/loadavg", 3)?;
        let point = self.host
            .point("load")
            .field("one", vals[0])
            .field("five", vals[1])
            .field("fifteen", vals[2]);
        Ok(vec![Some(point)])
    }
}

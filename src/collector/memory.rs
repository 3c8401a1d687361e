use collector::{CollectResult, Collector, Error, Host};
use delta::DeltaEngine;
use std::collections::HashMap;

/// Parse `/proc/meminfo` into a map of byte counts.
///
/// Values reported in kB are converted to bytes; unit-less values (page
/// counts) are kept as-is. Lines that do not parse are skipped.
pub fn parse_meminfo(content: &str) -> HashMap<String, u64> {
    let mut res = HashMap::new();
    for line in content.lines() {
        let mut halves = line.splitn(2, ':');
        let (key, rest) = match (halves.next(), halves.next()) {
            (Some(k), Some(r)) => (k.trim(), r),
            _ => continue,
        };
        let mut cols = rest.split_whitespace();
        let val = match cols.next().map(|v| v.parse::<u64>()) {
            Some(Ok(v)) => v,
            _ => continue,
        };
        let val = match cols.next() {
            Some("kB") => val.saturating_mul(1024),
            _ => val,
        };
        res.insert(key.to_string(), val);
    }
    res
}

fn lookup(info: &HashMap<String, u64>, key: &str) -> Result<u64, Error> {
    info.get(key)
        .cloned()
        .ok_or_else(|| Error::Parse(format!("/proc/meminfo has no {}", key)))
}

/// Physical memory usage, in bytes. Reported raw, not differenced.
pub struct Mem {
    host: Host,
}

impl Mem {
    /// Create a `Mem` collector for `host`.
    pub fn new(host: Host) -> Mem {
        Mem { host: host }
    }
}

impl Collector for Mem {
    fn name(&self) -> &'static str {
        "mem"
    }

    fn collect(&self, _engine: &DeltaEngine) -> CollectResult {
        let info = parse_meminfo(&self.host.read_proc("meminfo")?);
        let total = lookup(&info, "MemTotal")?;
        let free = lookup(&info, "MemFree")?;
        let kernel = info.get("Buffers").cloned().unwrap_or(0)
            + info.get("Cached").cloned().unwrap_or(0);
        let used = total.saturating_sub(free);

        let point = self.host
            .point("mem")
            .field("free", free)
            .field("used", used)
            .field("actualfree", free.saturating_add(kernel))
            .field("actualused", used.saturating_sub(kernel))
            .field("total", total);
        Ok(vec![Some(point)])
    }
}

/// Swap usage, in bytes. Reported raw, not differenced.
pub struct Swap {
    host: Host,
}

impl Swap {
    /// Create a `Swap` collector for `host`.
    pub fn new(host: Host) -> Swap {
        Swap { host: host }
    }
}

impl Collector for Swap {
    fn name(&self) -> &'static str {
        "swap"
    }

    fn collect(&self, _engine: &DeltaEngine) -> CollectResult {
        let info = parse_meminfo(&self.host.read_proc("meminfo")?);
        let total = lookup(&info, "SwapTotal")?;
        let free = lookup(&info, "SwapFree")?;

        let point = self.host
            .point("swap")
            .field("free", free)
            .field("used", total.saturating_sub(free))
            .field("total", total);
        Ok(vec![Some(point)])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use collector::test_util::FakeProc;
    use metric::FieldValue;

    const MEMINFO: &str = "MemTotal:       16000 kB
MemFree:         4000 kB
MemAvailable:    9000 kB
Buffers:         1000 kB
Cached:          3000 kB
SwapCached:         0 kB
SwapTotal:       2048 kB
SwapFree:        1024 kB
HugePages_Total:    0
";

    #[test]
    fn meminfo_units() {
        let info = parse_meminfo(MEMINFO);
        assert_eq!(Some(&(16000 * 1024)), info.get("MemTotal"));
        assert_eq!(Some(&0), info.get("HugePages_Total"));
    }

    #[test]
    fn mem_is_reported_raw() {
        let proc_fs = FakeProc::new();
        proc_fs.write("meminfo", MEMINFO);
        let engine = DeltaEngine::default();
        let res = Mem::new(proc_fs.host.clone()).collect(&engine).unwrap();
        assert_eq!(1, res.len());
        let point = res[0].clone().unwrap();
        assert_eq!("mem", point.name);
        assert_eq!(Some(&FieldValue::U64(4000 * 1024)), point.fields.get("free"));
        assert_eq!(Some(&FieldValue::U64(12000 * 1024)), point.fields.get("used"));
        assert_eq!(Some(&FieldValue::U64(8000 * 1024)), point.fields.get("actualfree"));
        assert_eq!(Some(&FieldValue::U64(8000 * 1024)), point.fields.get("actualused"));
        assert_eq!(0, engine.series_count());
    }

    #[test]
    fn swap_is_reported_raw() {
        let proc_fs = FakeProc::new();
        proc_fs.write("meminfo", MEMINFO);
        let res = Swap::new(proc_fs.host.clone())
            .collect(&DeltaEngine::default())
            .unwrap();
        let point = res[0].clone().unwrap();
        assert_eq!(Some(&FieldValue::U64(1024 * 1024)), point.fields.get("used"));
        assert_eq!(Some(&FieldValue::U64(2048 * 1024)), point.fields.get("total"));
    }

    #[test]
    fn missing_key_is_a_single_error() {
        let proc_fs = FakeProc::new();
        proc_fs.write("meminfo", "MemFree: 10 kB\n");
        match Mem::new(proc_fs.host.clone()).collect(&DeltaEngine::default()) {
            Err(Error::Parse(_)) => {}
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}

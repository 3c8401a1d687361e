//! Counter differencing.
//!
//! Most of what the kernel exposes are counters that only ever grow. The
//! `DeltaEngine` remembers the last raw value of every (series, field) pair
//! it has seen and turns each new observation into the change since the
//! previous one, scaled to a nominal reference duration.

use metric::{FieldValue, Point};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

type SeriesCache = HashMap<String, FieldValue>;

/// Stateful counter-to-delta converter, shared by every collector.
///
/// The cache grows with the number of distinct series observed and is never
/// evicted. It is not persisted: after a restart every series is
/// bootstrapped again.
#[derive(Debug)]
pub struct DeltaEngine {
    consistency_factor: f64,
    last: Mutex<HashMap<String, SeriesCache>>,
}

impl Default for DeltaEngine {
    fn default() -> DeltaEngine {
        DeltaEngine::new(1.0)
    }
}

/// Compute the ratio used to scale deltas to the consistency duration.
///
/// A zero consistency duration disables scaling. Elapsed wall-clock time is
/// deliberately not involved: a delta is scaled as if exactly `interval`
/// passed between two samples, retries included.
pub fn consistency_factor(interval: Duration, consistency: Duration) -> f64 {
    let interval = duration_secs(interval);
    let consistency = duration_secs(consistency);
    if consistency > 0.0 && interval > 0.0 {
        consistency / interval
    } else {
        1.0
    }
}

fn duration_secs(d: Duration) -> f64 {
    d.as_secs() as f64 + f64::from(d.subsec_nanos()) / 1_000_000_000.0
}

impl DeltaEngine {
    /// Create an engine with an empty cache.
    pub fn new(consistency_factor: f64) -> DeltaEngine {
        DeltaEngine {
            consistency_factor: consistency_factor,
            last: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct series in the cache.
    pub fn series_count(&self) -> usize {
        match self.last.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Replace every field of `point` with its delta since the previous
    /// observation of the same series.
    ///
    /// Returns `None` if any field had no previous observation (or changed
    /// numeric kind). The cache is advanced to the raw values of `point` in
    /// every case, so the next call for this series can succeed. A point is
    /// either fully differenced or not returned at all: raw counters and
    /// deltas are never mixed in one point.
    pub fn compute_delta(&self, mut point: Point) -> Option<Point> {
        let key = point.series_key();
        let factor = self.consistency_factor;
        let mut complete = true;

        // One lock for the whole point keeps its fields consistent with one
        // another when collectors race on the same series.
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let series = last.entry(key).or_insert_with(HashMap::new);

        for (name, value) in &mut point.fields {
            let raw = *value;
            match series.insert(name.clone(), raw) {
                None => {
                    trace!("bootstrapped {}.{}", point.name, name);
                    complete = false;
                }
                Some(previous) => match raw.delta(&previous, factor) {
                    Ok(delta) => *value = delta,
                    Err(e) => {
                        warn!("re-bootstrapping {}.{}: {}", point.name, name, e);
                        complete = false;
                    }
                },
            }
        }

        if complete {
            Some(point)
        } else {
            None
        }
    }
}

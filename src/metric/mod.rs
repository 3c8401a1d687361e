//! `Point` is the unit of telemetry this crate produces: a series name, a set
//! of tags, a set of numeric fields and the instant the observation was
//! made. Collectors build raw points, the `delta` engine turns counters into
//! per-interval deltas and sinks ship the result.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::error;
use std::fmt;

mod tagmap;
mod value;

pub use self::value::{FieldValue, KindMismatch};

/// Tags of a `Point`, sorted by key.
pub type TagMap = self::tagmap::TagMap<String, String>;
/// Fields of a `Point`, sorted by name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A single timestamped observation.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    /// The metric family, for instance "cpu" or "disks".
    pub name: String,
    /// Tags distinguishing this series from others of the same name.
    pub tags: TagMap,
    /// The numeric measurements.
    pub fields: FieldMap,
    /// Creation instant. Forwarded as-is, never consulted when differencing.
    pub timestamp: DateTime<Utc>,
}

/// Reasons a `Point` cannot be written to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointError {
    /// The series name is empty.
    EmptyName,
    /// The point has no fields.
    NoFields,
}

impl fmt::Display for PointError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PointError::EmptyName => write!(f, "point has an empty series name"),
            PointError::NoFields => write!(f, "point has no fields"),
        }
    }
}

impl error::Error for PointError {
    fn description(&self) -> &str {
        match *self {
            PointError::EmptyName => "empty series name",
            PointError::NoFields => "no fields",
        }
    }
}

impl Point {
    /// Create a new, field-less `Point` stamped with the current time.
    pub fn new<S>(name: S) -> Point
    where
        S: Into<String>,
    {
        Point {
            name: name.into(),
            tags: TagMap::default(),
            fields: FieldMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Set a tag, replacing any previous value under the same key.
    pub fn overlay_tag<S>(mut self, key: S, val: S) -> Point
    where
        S: Into<String>,
    {
        self.tags.insert(key.into(), val.into());
        self
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn field<S, V>(mut self, name: S, value: V) -> Point
    where
        S: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Override the creation instant.
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Point {
        self.timestamp = ts;
        self
    }

    /// The canonical identity of this point's series.
    ///
    /// Built from the name and the tags in ascending key order, for
    /// instance `cpu#cpuid:all|fqdn:host1|`. Fields play no part: the same
    /// series may be observed with different field sets.
    pub fn series_key(&self) -> String {
        let mut key = String::with_capacity(self.name.len() + 16 * self.tags.len() + 1);
        key.push_str(&self.name);
        key.push('#');
        for &(ref k, ref v) in self.tags.iter() {
            key.push_str(k);
            key.push(':');
            key.push_str(v);
            key.push('|');
        }
        key
    }

    /// Nanoseconds since the Unix epoch.
    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp
            .timestamp()
            .saturating_mul(1_000_000_000)
            .saturating_add(i64::from(self.timestamp.timestamp_subsec_nanos()))
    }

    /// Check that a store would accept this point.
    pub fn validate(&self) -> Result<(), PointError> {
        if self.name.is_empty() {
            Err(PointError::EmptyName)
        } else if self.fields.is_empty() {
            Err(PointError::NoFields)
        } else {
            Ok(())
        }
    }
}

#[inline]
fn escape(s: &str, specials: &[char], out: &mut fmt::Formatter) -> fmt::Result {
    for c in s.chars() {
        if specials.contains(&c) {
            out.write_str("\\")?;
        }
        write!(out, "{}", c)?;
    }
    Ok(())
}

const MEASUREMENT_SPECIALS: &[char] = &[',', ' '];
const KEY_SPECIALS: &[char] = &[',', '=', ' '];

/// InfluxDB line protocol, one point per line without the trailing newline.
impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        escape(&self.name, MEASUREMENT_SPECIALS, f)?;
        for &(ref k, ref v) in self.tags.iter() {
            f.write_str(",")?;
            escape(k, KEY_SPECIALS, f)?;
            f.write_str("=")?;
            escape(v, KEY_SPECIALS, f)?;
        }
        let mut sep = " ";
        for (k, v) in &self.fields {
            f.write_str(sep)?;
            escape(k, KEY_SPECIALS, f)?;
            write!(f, "={}", v)?;
            sep = ",";
        }
        write!(f, " {}", self.timestamp_ns())
    }
}

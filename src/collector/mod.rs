//! Collectors read operating system state and turn it into `Point`s.
//!
//! Each collector is independent. The `sampler` runs every configured
//! collector once per cycle, in parallel, and each delivers exactly one
//! result: a list of points, or an error. Collectors reading monotonic
//! counters pass their points through the shared `DeltaEngine`; a `None`
//! in the result list means the engine could not produce a delta yet.

use delta::DeltaEngine;
use metric::Point;
use std::error;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

mod cpu;
mod disks;
mod memory;
mod mounts;
mod network;
mod system;

pub use self::cpu::{Cpu, Cpus};
pub use self::disks::Disks;
pub use self::memory::{Mem, Swap};
pub use self::mounts::Mounts;
pub use self::network::Network;
pub use self::system::{Load, Uptime};

/// What a collector delivers for one cycle.
pub type CollectResult = Result<Vec<Option<Point>>, Error>;

/// A source of points, run once per sampling cycle.
pub trait Collector: Send + Sync {
    /// Short name, as used in the `collect` configuration list.
    fn name(&self) -> &'static str;

    /// Read the current state and build points from it.
    ///
    /// An empty list asks the sampler to try again: the collector had
    /// nothing usable to report this time around.
    fn collect(&self, engine: &DeltaEngine) -> CollectResult;
}

/// Collector faults. These are contained to the cycle they happen in.
#[derive(Debug)]
pub enum Error {
    /// Reading from the system failed.
    Io(io::Error),
    /// The system reported something we could not make sense of.
    Parse(String),
    /// The collector panicked. Carries the panic message.
    Panicked(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref e) => write!(f, "i/o error: {}", e),
            Error::Parse(ref s) => write!(f, "parse error: {}", s),
            Error::Panicked(ref s) => write!(f, "collector panicked: {}", s),
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::Io(ref e) => error::Error::description(e),
            Error::Parse(ref s) | Error::Panicked(ref s) => s.as_str(),
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            Error::Io(ref e) => Some(e),
            Error::Parse(_) | Error::Panicked(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

/// Everything a collector needs to know about the machine it runs on.
#[derive(Debug, Clone)]
pub struct Host {
    /// Host identity, attached to every point as the `fqdn` tag.
    pub fqdn: String,
    /// Where procfs is mounted. Only ever changed by tests.
    pub proc_root: PathBuf,
}

impl Host {
    /// Create a `Host` reading from `/proc`.
    pub fn new<S>(fqdn: S) -> Host
    where
        S: Into<String>,
    {
        Host {
            fqdn: fqdn.into(),
            proc_root: Path::new("/proc").to_path_buf(),
        }
    }

    /// Start a point for this host.
    pub fn point(&self, name: &str) -> Point {
        Point::new(name).overlay_tag("fqdn", self.fqdn.as_str())
    }

    /// Read a procfs file, relative to `proc_root`, to a string.
    pub fn read_proc(&self, relative: &str) -> Result<String, Error> {
        let mut fp = File::open(self.proc_root.join(relative))?;
        let mut buffer = String::new();
        fp.read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

/// The collectors available for selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Aggregate CPU time, differenced.
    Cpu,
    /// Per-CPU time, differenced.
    Cpus,
    /// Physical memory usage.
    Mem,
    /// Swap usage.
    Swap,
    /// Seconds since boot.
    Uptime,
    /// Load averages.
    Load,
    /// Per-interface network counters, differenced.
    Network,
    /// Per-device block I/O counters, differenced.
    Disks,
    /// Per-filesystem space, differenced.
    Mounts,
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Kind, String> {
        match s.trim() {
            "cpu" => Ok(Kind::Cpu),
            "cpus" => Ok(Kind::Cpus),
            "mem" => Ok(Kind::Mem),
            "swap" => Ok(Kind::Swap),
            "uptime" => Ok(Kind::Uptime),
            "load" => Ok(Kind::Load),
            "network" => Ok(Kind::Network),
            "disks" => Ok(Kind::Disks),
            "mounts" => Ok(Kind::Mounts),
            other => Err(format!("unknown collect option `{}'", other)),
        }
    }
}

/// Parse a comma separated collector selection, for instance
/// `cpu,mem,network`. Order is preserved.
pub fn parse_list(list: &str) -> Result<Vec<Kind>, String> {
    list.split(',').map(Kind::from_str).collect()
}

/// Instantiate the selected collectors, in selection order.
pub fn build(kinds: &[Kind], host: &Host) -> Vec<Arc<Collector>> {
    kinds
        .iter()
        .map(|kind| -> Arc<Collector> {
            let host = host.clone();
            match *kind {
                Kind::Cpu => Arc::new(Cpu::new(host)),
                Kind::Cpus => Arc::new(Cpus::new(host)),
                Kind::Mem => Arc::new(Mem::new(host)),
                Kind::Swap => Arc::new(Swap::new(host)),
                Kind::Uptime => Arc::new(Uptime::new(host)),
                Kind::Load => Arc::new(Load::new(host)),
                Kind::Network => Arc::new(Network::new(host)),
                Kind::Disks => Arc::new(Disks::new(host)),
                Kind::Mounts => Arc::new(Mounts::new(host)),
            }
        })
        .collect()
}

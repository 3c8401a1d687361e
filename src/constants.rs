//! Library level constants

/// Program version, from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collectors run when none are chosen explicitly.
pub const DEFAULT_COLLECT: &str = "cpu,cpus,mem,swap,uptime,load,network,disks,mounts";

/// `User-Agent` sent with every InfluxDB request.
pub const USER_AGENT: &str = concat!("sysinfo-influxdb/", env!("CARGO_PKG_VERSION"));

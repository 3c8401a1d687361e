//! sysinfo-influxdb samples operating system counters from procfs and
//! `statvfs(2)`, turns monotonic counters into per-interval deltas and ships
//! the result to InfluxDB as line protocol, or prints it to stdout.
//!
//! The moving parts:
//!
//!  * `collector`: one reader per kind of system information.
//!  * `delta`: the differencing engine shared by every collector.
//!  * `sampler`: the loop running collectors in parallel, once per cycle.
//!  * `sink`: where complete batches end up.
#![allow(unknown_lints)]
#![deny(trivial_numeric_casts, missing_docs, unstable_features, unused_import_braces)]
extern crate chrono;
extern crate clap;
extern crate hyper;
#[cfg(feature = "tls")]
extern crate hyper_native_tls;
extern crate libc;
extern crate toml;
extern crate url;

#[macro_use]
extern crate log;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
extern crate tempdir;
#[cfg(test)]
extern crate tiny_http;

pub mod collector;
pub mod config;
pub mod constants;
pub mod delta;
pub mod metric;
pub mod sampler;
pub mod sink;
pub mod util;

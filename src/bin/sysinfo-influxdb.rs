#![allow(unknown_lints)]

extern crate chrono;
extern crate fern;
#[macro_use]
extern crate log;
extern crate sysinfo_influxdb;

use chrono::Utc;
use std::process;
use std::sync::Arc;
use sysinfo_influxdb::collector::{self, Host};
use sysinfo_influxdb::config;
use sysinfo_influxdb::delta::{self, DeltaEngine};
use sysinfo_influxdb::sampler::Sampler;
use sysinfo_influxdb::sink::{Console, InfluxDB, Sink};
use sysinfo_influxdb::util;

fn main() {
    let args = match config::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("sysinfo-influxdb: {}", e);
            process::exit(2);
        }
    };

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let logging = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}][{}] {}",
                record.module_path().unwrap_or("?"),
                record.line().unwrap_or(0),
                Utc::now().to_rfc3339(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
    if let Err(e) = logging {
        eprintln!("sysinfo-influxdb: could not set up logging: {}", e);
        process::exit(1);
    }

    info!("sysinfo-influxdb - {}", args.version);

    if let Some(ref path) = args.pid_file {
        if let Err(e) = util::write_pid_file(path) {
            error!("unable to write pid file {}: {}", path.display(), e);
            process::exit(1);
        }
    }

    let host = Host::new(util::fqdn());
    info!("reporting as {}", host.fqdn);
    let collectors = collector::build(&args.collect, &host);

    let mut sinks: Vec<Box<Sink>> = Vec::new();
    if args.console() {
        sinks.push(Box::new(Console::new()));
    }
    if let Some(ref cfg) = args.influxdb {
        let influxdb = match InfluxDB::new(cfg.clone()) {
            Ok(influxdb) => influxdb,
            Err(e) => {
                error!("invalid InfluxDB configuration: {}", e);
                process::exit(1);
            }
        };
        match influxdb.ping() {
            Ok((rtt, version)) => info!(
                "connected to InfluxDB {} at {} in {:?}",
                version,
                influxdb.url(),
                rtt
            ),
            Err(e) => {
                error!("unable to reach InfluxDB at {}: {}", influxdb.url(), e);
                process::exit(1);
            }
        }
        sinks.push(Box::new(influxdb));
    }

    let factor = delta::consistency_factor(args.interval, args.consistency);
    debug!("consistency factor {}", factor);
    let engine = Arc::new(DeltaEngine::new(factor));

    Sampler::new(collectors, engine, sinks, args.interval, args.daemon).run();
}

//! Provides the CLI option parser
//!
//! Used to parse argv and an optional TOML config file into a struct the
//! binary can consume. Command line flags win over file values, file values
//! win over the built-in defaults.

use clap::{App, Arg, ArgMatches};
use collector::{self, Kind};
use constants;
use sink::InfluxDBConfig;
use std::error;
use std::fmt;
use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml;

/// Configuration faults. All of them are fatal at startup.
#[derive(Debug)]
pub enum ConfigError {
    /// A file named in the configuration could not be read.
    Io(PathBuf, io::Error),
    /// The config file is not valid TOML.
    Toml(toml::de::Error),
    /// A setting has an unusable value.
    Value(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::Io(ref path, ref e) => {
                write!(f, "could not read {}: {}", path.display(), e)
            }
            ConfigError::Toml(ref e) => write!(f, "could not parse config file: {}", e),
            ConfigError::Value(ref key, ref reason) => {
                write!(f, "invalid value for {}: {}", key, reason)
            }
        }
    }
}

impl error::Error for ConfigError {
    fn description(&self) -> &str {
        match *self {
            ConfigError::Io(_, ref e) => error::Error::description(e),
            ConfigError::Toml(ref e) => error::Error::description(e),
            ConfigError::Value(_, ref reason) => reason.as_str(),
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            ConfigError::Io(_, ref e) => Some(e),
            ConfigError::Toml(ref e) => Some(e),
            ConfigError::Value(..) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> ConfigError {
        ConfigError::Toml(e)
    }
}

fn invalid<K, R>(key: K, reason: R) -> ConfigError
where
    K: Into<String>,
    R: Into<String>,
{
    ConfigError::Value(key.into(), reason.into())
}

/// Parse a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0`
/// is accepted; any other number needs a unit.
pub fn parse_duration(text: &str) -> Result<Duration, String> {
    let text = text.trim();
    if text == "0" {
        return Ok(Duration::from_secs(0));
    }
    if text.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut nanos: f64 = 0.0;
    let mut rest = text;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or_else(|| rest.len());
        if num_end == 0 {
            return Err(format!("invalid duration `{}'", text));
        }
        let value: f64 = rest[..num_end]
            .parse()
            .map_err(|_| format!("invalid duration `{}'", text))?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or_else(|| rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" => 1_000_000_000.0,
            "m" => 60.0 * 1_000_000_000.0,
            "h" => 3600.0 * 1_000_000_000.0,
            "" => return Err(format!("missing unit in duration `{}'", text)),
            unit => return Err(format!("unknown unit `{}' in duration `{}'", unit, text)),
        };
        nanos += value * scale;
        rest = &rest[unit_end..];
    }

    let secs = (nanos / 1_000_000_000.0).trunc();
    let subsec = nanos - secs * 1_000_000_000.0;
    Ok(Duration::new(secs as u64, subsec as u32))
}

/// Read the first line of `path`, stripped of its line ending.
pub fn read_secret<P: AsRef<Path>>(path: P) -> Result<String, ConfigError> {
    let path = path.as_ref();
    let fp = File::open(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    let mut line = String::new();
    BufReader::new(fp)
        .read_line(&mut line)
        .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    Ok(line.trim_end_matches(|c| c == '\n' || c == '\r').to_string())
}

/// Configuration for the `sysinfo-influxdb` executable.
///
/// Built by `parse_args` or `parse_config_file`; not intended to be created
/// by hand outside of tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The higher the value the more chatty the program gets.
    pub verbose: u64,
    /// Keep sampling forever rather than stopping after the first complete
    /// batch.
    pub daemon: bool,
    /// Time between two sampling cycles.
    pub interval: Duration,
    /// Reference duration deltas are scaled to. Zero disables scaling.
    pub consistency: Duration,
    /// The collectors to run, in order.
    pub collect: Vec<Kind>,
    /// Where to write our pid, if anywhere.
    pub pid_file: Option<PathBuf>,
    /// InfluxDB settings. `None` when no database is configured.
    pub influxdb: Option<InfluxDBConfig>,
    /// Program version string. This is set automatically.
    pub version: String,
}

impl Args {
    /// Whether batches are also printed to stdout.
    pub fn console(&self) -> bool {
        self.influxdb.is_none() || self.verbose > 0
    }
}

// Everything collected from the file and the command line before the
// secret file is read and the store configuration settled.
struct Settings {
    verbose: u64,
    daemon: bool,
    interval: Duration,
    consistency: Duration,
    collect: Vec<Kind>,
    pid_file: Option<PathBuf>,
    store: InfluxDBConfig,
    secret: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            verbose: 0,
            daemon: false,
            interval: Duration::from_secs(1),
            consistency: Duration::from_secs(1),
            collect: collector::parse_list(constants::DEFAULT_COLLECT).unwrap_or_default(),
            pid_file: None,
            store: InfluxDBConfig::default(),
            secret: None,
        }
    }
}

impl Settings {
    fn finish(mut self) -> Result<Args, ConfigError> {
        if self.interval == Duration::from_secs(0) {
            return Err(invalid("interval", "must be greater than zero"));
        }
        if self.collect.is_empty() {
            return Err(invalid("collect", "at least one collector is required"));
        }
        if let Some(ref path) = self.secret {
            self.store.password = read_secret(path)?;
        }
        let influxdb = if self.store.database.is_empty() {
            None
        } else {
            Some(self.store)
        };
        Ok(Args {
            verbose: self.verbose,
            daemon: self.daemon,
            interval: self.interval,
            consistency: self.consistency,
            collect: self.collect,
            pid_file: self.pid_file,
            influxdb: influxdb,
            version: constants::VERSION.to_string(),
        })
    }
}

fn duration_value(key: &str, value: &toml::Value) -> Result<Duration, ConfigError> {
    match *value {
        toml::Value::String(ref s) => parse_duration(s).map_err(|e| invalid(key, e)),
        toml::Value::Integer(secs) if secs >= 0 => Ok(Duration::from_secs(secs as u64)),
        _ => Err(invalid(key, "must be a duration string such as \"10s\"")),
    }
}

fn str_value<'a>(key: &str, value: &'a toml::Value) -> Result<&'a str, ConfigError> {
    value
        .as_str()
        .ok_or_else(|| invalid(key, "must be a string"))
}

fn bool_value(key: &str, value: &toml::Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(key, "must be a boolean"))
}

fn collect_value(value: &toml::Value) -> Result<Vec<Kind>, ConfigError> {
    match *value {
        toml::Value::String(ref s) => collector::parse_list(s).map_err(|e| invalid("collect", e)),
        toml::Value::Array(ref arr) => arr.iter()
            .map(|v| {
                str_value("collect", v)?
                    .parse::<Kind>()
                    .map_err(|e| invalid("collect", e))
            })
            .collect(),
        _ => Err(invalid("collect", "must be a list of collector names")),
    }
}

fn apply_file(mut settings: Settings, buffer: &str) -> Result<Settings, ConfigError> {
    let value: toml::Value = toml::from_str(buffer)?;

    if let Some(v) = value.get("daemon") {
        settings.daemon = bool_value("daemon", v)?;
    }
    if let Some(v) = value.get("interval") {
        settings.interval = duration_value("interval", v)?;
    }
    if let Some(v) = value.get("consistency") {
        settings.consistency = duration_value("consistency", v)?;
    }
    if let Some(v) = value.get("collect") {
        settings.collect = collect_value(v)?;
    }
    if let Some(v) = value.get("pidfile") {
        settings.pid_file = Some(Path::new(str_value("pidfile", v)?).to_path_buf());
    }

    if let Some(tbl) = value.get("influxdb") {
        let tbl = tbl.as_table()
            .ok_or_else(|| invalid("influxdb", "must be a table"))?;
        let store = &mut settings.store;
        for (key, v) in tbl.iter() {
            let key = format!("influxdb.{}", key);
            match key.as_str() {
                "influxdb.host" => store.host = str_value(&key, v)?.to_string(),
                "influxdb.ssl" => store.secure = bool_value(&key, v)?,
                "influxdb.username" => store.username = str_value(&key, v)?.to_string(),
                "influxdb.password" => store.password = str_value(&key, v)?.to_string(),
                "influxdb.database" => store.database = str_value(&key, v)?.to_string(),
                "influxdb.retention-policy" => {
                    store.retention_policy = str_value(&key, v)?.to_string()
                }
                "influxdb.secret" => {
                    settings.secret = Some(Path::new(str_value(&key, v)?).to_path_buf())
                }
                _ => warn!("ignoring unknown config key {}", key),
            }
        }
    }

    Ok(settings)
}

fn apply_matches(mut settings: Settings, args: &ArgMatches) -> Result<Settings, ConfigError> {
    settings.verbose = args.occurrences_of("verbose");
    if args.is_present("daemon") {
        settings.daemon = true;
    }
    if let Some(v) = args.value_of("interval") {
        settings.interval = parse_duration(v).map_err(|e| invalid("interval", e))?;
    }
    if let Some(v) = args.value_of("consistency") {
        settings.consistency = parse_duration(v).map_err(|e| invalid("consistency", e))?;
    }
    if let Some(v) = args.value_of("collect") {
        settings.collect = collector::parse_list(v).map_err(|e| invalid("collect", e))?;
    }
    if let Some(v) = args.value_of("pidfile") {
        settings.pid_file = Some(Path::new(v).to_path_buf());
    }
    if args.is_present("ssl") {
        settings.store.secure = true;
    }
    if let Some(v) = args.value_of("host") {
        settings.store.host = v.to_string();
    }
    if let Some(v) = args.value_of("username") {
        settings.store.username = v.to_string();
    }
    if let Some(v) = args.value_of("password") {
        settings.store.password = v.to_string();
    }
    if let Some(v) = args.value_of("secret") {
        settings.secret = Some(Path::new(v).to_path_buf());
    }
    if let Some(v) = args.value_of("database") {
        settings.store.database = v.to_string();
    }
    if let Some(v) = args.value_of("retentionpolicy") {
        settings.store.retention_policy = v.to_string();
    }
    Ok(settings)
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("sysinfo-influxdb")
        .version(constants::VERSION)
        .author("Beate Ottenwälder")
        .about("collect system counters and ship them to InfluxDB")
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .multiple(true)
                .help("Turn on verbose output. Repeat for more."),
        )
        .arg(
            Arg::with_name("daemon")
                .long("daemon")
                .short("D")
                .help("Keep sampling forever."),
        )
        .arg(
            Arg::with_name("interval")
                .long("interval")
                .short("i")
                .value_name("duration")
                .takes_value(true)
                .help("Time between two samples. [default: 1s]"),
        )
        .arg(
            Arg::with_name("consistency")
                .long("consistency")
                .short("C")
                .value_name("duration")
                .takes_value(true)
                .help("Duration deltas are scaled to, 0s to disable. [default: 1s]"),
        )
        .arg(
            Arg::with_name("collect")
                .long("collect")
                .short("c")
                .value_name("list")
                .takes_value(true)
                .help(
                    "Comma separated collectors to run. \
                     [default: cpu,cpus,mem,swap,uptime,load,network,disks,mounts]",
                ),
        )
        .arg(
            Arg::with_name("pidfile")
                .long("pidfile")
                .value_name("path")
                .takes_value(true)
                .help("Write our pid to this file."),
        )
        .arg(
            Arg::with_name("ssl")
                .long("ssl")
                .short("S")
                .help("Speak HTTPS to InfluxDB."),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .short("h")
                .value_name("host:port")
                .takes_value(true)
                .help("InfluxDB HTTP API address. [default: localhost:8086]"),
        )
        .arg(
            Arg::with_name("username")
                .long("username")
                .short("u")
                .takes_value(true)
                .help("InfluxDB user. [default: root]"),
        )
        .arg(
            Arg::with_name("password")
                .long("password")
                .short("p")
                .takes_value(true)
                .help("InfluxDB password. [default: root]"),
        )
        .arg(
            Arg::with_name("secret")
                .long("secret")
                .short("s")
                .value_name("path")
                .takes_value(true)
                .help("Read the InfluxDB password from the first line of this file."),
        )
        .arg(
            Arg::with_name("database")
                .long("database")
                .short("d")
                .takes_value(true)
                .help("InfluxDB database. Without one, batches are printed instead."),
        )
        .arg(
            Arg::with_name("retentionpolicy")
                .long("retentionpolicy")
                .short("r")
                .takes_value(true)
                .help("InfluxDB retention policy."),
        )
        .arg(
            Arg::with_name("config-file")
                .long("config")
                .value_name("config")
                .takes_value(true)
                .help("TOML config file. Flags given on the command line win."),
        )
}

/// Parse the process arguments, and the config file they name, into an
/// `Args`.
pub fn parse_args() -> Result<Args, ConfigError> {
    parse_matches(&app().get_matches())
}

fn parse_matches(args: &ArgMatches) -> Result<Args, ConfigError> {
    let mut settings = Settings::default();
    if let Some(filename) = args.value_of("config-file") {
        let path = Path::new(filename);
        let mut fp = File::open(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let mut buffer = String::new();
        fp.read_to_string(&mut buffer)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        settings = apply_file(settings, &buffer)?;
    }
    apply_matches(settings, args)?.finish()
}

/// Parse a config file.
///
/// Top level keys are `daemon`, `interval`, `consistency`, `collect` and
/// `pidfile`. InfluxDB settings live in an `[influxdb]` table with the keys
/// `host`, `ssl`, `username`, `password`, `secret`, `database` and
/// `retention-policy`.
pub fn parse_config_file(buffer: &str, verbosity: u64) -> Result<Args, ConfigError> {
    let mut settings = apply_file(Settings::default(), buffer)?;
    settings.verbose = verbosity;
    settings.finish()
}

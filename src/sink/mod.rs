//! Sinks are where finished batches go.
//!
//! A batch is handed to each sink exactly once. There is no buffering and no
//! retry: a batch a sink fails to deliver is lost.

use hyper;
use metric::Point;
use std::error;
use std::fmt;
use std::io;

mod console;
mod influxdb;

pub use self::console::Console;
pub use self::influxdb::{InfluxDB, InfluxDBConfig};

/// A destination for complete batches of points.
pub trait Sink {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Deliver a batch. All or nothing: on error the batch is considered
    /// unsent.
    fn deliver(&mut self, batch: &[Point]) -> Result<(), Error>;
}

/// Sink faults.
#[derive(Debug)]
pub enum Error {
    /// The HTTP exchange failed.
    Http(hyper::Error),
    /// Local I/O failed.
    Io(io::Error),
    /// The store answered with an unexpected status.
    Status(u16, String),
    /// A TLS connection was requested but cannot be set up.
    Tls(String),
    /// The store URL could not be built.
    Url(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Http(ref e) => write!(f, "http error: {}", e),
            Error::Io(ref e) => write!(f, "i/o error: {}", e),
            Error::Status(code, ref body) => {
                write!(f, "unexpected status {}: {}", code, body.trim())
            }
            Error::Tls(ref s) => write!(f, "tls error: {}", s),
            Error::Url(ref s) => write!(f, "bad url: {}", s),
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::Http(ref e) => error::Error::description(e),
            Error::Io(ref e) => error::Error::description(e),
            Error::Status(..) => "unexpected status",
            Error::Tls(ref s) | Error::Url(ref s) => s.as_str(),
        }
    }

    fn cause(&self) -> Option<&error::Error> {
        match *self {
            Error::Http(ref e) => Some(e),
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<hyper::Error> for Error {
    fn from(e: hyper::Error) -> Error {
        Error::Http(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

/// Render a batch as InfluxDB line protocol, one point per line.
pub fn encode(batch: &[Point]) -> String {
    let mut body = String::with_capacity(batch.len() * 128);
    for point in batch {
        body.push_str(&point.to_string());
        body.push('\n');
    }
    body
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn status_error_has_no_cause() {
        let err = Error::Status(400, "partial write".into());
        assert!(error::Error::cause(&err).is_none());
        assert_eq!("unexpected status", error::Error::description(&err));
        let err = Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert!(error::Error::cause(&err).is_some());
    }

    #[test]
    fn encode_one_line_per_point() {
        let ts = Utc.timestamp(10, 0);
        let batch = vec![
            Point::new("load").field("one", 0.5).timestamp(ts),
            Point::new("uptime").field("length", 12.0).timestamp(ts),
        ];
        assert_eq!(
            "load one=0.5 10000000000\nuptime length=12 10000000000\n",
            encode(&batch)
        );
    }

    #[test]
    fn encode_empty_batch() {
        assert_eq!("", encode(&[]));
    }
}

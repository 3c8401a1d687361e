//! InfluxDB 1.x HTTP line-protocol writer.

use constants;
use hyper::client::Client;
use hyper::header::{Authorization, Basic, UserAgent};
use hyper::status::StatusCode;
use metric::Point;
use sink::{encode, Error, Sink};
use std::io::Read;
use std::time::{Duration, Instant};
use url::Url;

#[cfg(feature = "tls")]
use hyper::net::HttpsConnector;
#[cfg(feature = "tls")]
use hyper_native_tls::NativeTlsClient;

/// Configuration for the `InfluxDB` sink.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluxDBConfig {
    /// `host:port` of the InfluxDB HTTP API.
    pub host: String,
    /// Whether to speak HTTPS rather than HTTP.
    pub secure: bool,
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Database points are written into.
    pub database: String,
    /// Retention policy points are written under. Empty means the database
    /// default.
    pub retention_policy: String,
}

impl Default for InfluxDBConfig {
    fn default() -> InfluxDBConfig {
        InfluxDBConfig {
            host: "localhost:8086".to_string(),
            secure: false,
            username: "root".to_string(),
            password: "root".to_string(),
            database: String::new(),
            retention_policy: String::new(),
        }
    }
}

/// The InfluxDB sink. Each `deliver` is one synchronous `/write` request.
pub struct InfluxDB {
    client: Client,
    base: Url,
    write_url: Url,
    username: String,
    password: String,
}

#[cfg(feature = "tls")]
fn http_client(secure: bool) -> Result<Client, Error> {
    if secure {
        let ssl = NativeTlsClient::new().map_err(|e| Error::Tls(e.to_string()))?;
        Ok(Client::with_connector(HttpsConnector::new(ssl)))
    } else {
        Ok(Client::new())
    }
}

#[cfg(not(feature = "tls"))]
fn http_client(secure: bool) -> Result<Client, Error> {
    if secure {
        Err(Error::Tls(
            "compiled without the `tls` feature, cannot use ssl".to_string(),
        ))
    } else {
        Ok(Client::new())
    }
}

/// Build the `/write` endpoint for `config`.
pub fn write_url(base: &Url, config: &InfluxDBConfig) -> Result<Url, Error> {
    let mut url = base.join("write").map_err(|e| Error::Url(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("db", &config.database);
        if !config.retention_policy.is_empty() {
            query.append_pair("rp", &config.retention_policy);
        }
        query.append_pair("precision", "ns");
    }
    Ok(url)
}

impl InfluxDB {
    /// Create a new InfluxDB sink. No connection is made until `ping` or
    /// `deliver` is called.
    pub fn new(config: InfluxDBConfig) -> Result<InfluxDB, Error> {
        let proto = if config.secure { "https" } else { "http" };
        let base = Url::parse(&format!("{}://{}/", proto, config.host))
            .map_err(|e| Error::Url(format!("{}: {}", config.host, e)))?;
        let write_url = write_url(&base, &config)?;
        Ok(InfluxDB {
            client: http_client(config.secure)?,
            base: base,
            write_url: write_url,
            username: config.username,
            password: config.password,
        })
    }

    /// The base URL requests are made against.
    pub fn url(&self) -> &Url {
        &self.base
    }

    /// Check the server is reachable, returning the round trip time and the
    /// server's version string.
    pub fn ping(&self) -> Result<(Duration, String), Error> {
        let url = self.base.join("ping").map_err(|e| Error::Url(e.to_string()))?;
        let start = Instant::now();
        let mut res = self.client
            .get(url)
            .header(UserAgent(constants::USER_AGENT.to_string()))
            .send()?;
        let elapsed = start.elapsed();
        if res.status != StatusCode::NoContent {
            let mut body = String::new();
            let _ = res.read_to_string(&mut body);
            return Err(Error::Status(res.status.to_u16(), body));
        }
        let version = res.headers
            .get_raw("X-Influxdb-Version")
            .and_then(|vals| vals.first())
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        Ok((elapsed, version))
    }
}

impl Sink for InfluxDB {
    fn name(&self) -> &'static str {
        "influxdb"
    }

    fn deliver(&mut self, batch: &[Point]) -> Result<(), Error> {
        let body = encode(batch);
        let mut res = self.client
            .post(self.write_url.clone())
            .header(Authorization(Basic {
                username: self.username.clone(),
                password: Some(self.password.clone()),
            }))
            .header(UserAgent(constants::USER_AGENT.to_string()))
            .body(body.as_str())
            .send()?;
        if res.status == StatusCode::NoContent {
            debug!("wrote {} points to {}", batch.len(), self.base);
            Ok(())
        } else {
            let mut msg = String::new();
            let _ = res.read_to_string(&mut msg);
            Err(Error::Status(res.status.to_u16(), msg))
        }
    }
}

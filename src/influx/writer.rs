//! Buffered InfluxDB write API.
//!
//! Points are buffered in arrival order and sent on `flush` as line protocol to
//! `POST /api/v2/write`. InfluxDB 1.8 serves the same endpoint, taking
//! `username:password` as token and `database/retention-policy` as bucket.

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;
use tracing::{debug, warn};

use super::MetricPoint;
use super::line_protocol::encode_point;
use crate::config::InfluxSettings;

/// Maximum number of lines sent in one write request.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("invalid write url: {0}")]
    InvalidUrl(String),

    #[error("influxdb request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("influxdb rejected write ({status}): {body}")]
    Server { status: u16, body: String },
}

/// Sink for metric points.
pub trait PointWriter {
    /// Buffers a point. Never blocks on the network.
    fn write_point(&mut self, point: MetricPoint);

    /// Sends every buffered point and empties the buffer.
    fn flush(&mut self) -> Result<(), WriteError>;
}

/// In-memory writer, mostly for tests: points stay in the vector.
impl PointWriter for Vec<MetricPoint> {
    fn write_point(&mut self, point: MetricPoint) {
        self.push(point);
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        Ok(())
    }
}

/// Write API scoped to one organisation and bucket.
#[derive(Debug)]
pub struct WriteApi {
    client: Client,
    url: Url,
    token: Option<String>,
    buffer: Vec<MetricPoint>,
    batch_size: usize,
}

impl WriteApi {
    /// Creates a write API with a default HTTP client.
    pub fn new(settings: &InfluxSettings) -> Result<Self, WriteError> {
        let client = Client::builder()
            .user_agent(concat!("cephfs-xattr-influx/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(settings, client)
    }

    /// Creates a write API using the given HTTP client.
    pub fn with_client(settings: &InfluxSettings, client: Client) -> Result<Self, WriteError> {
        Ok(Self {
            client,
            url: write_url(settings)?,
            token: settings.token.clone(),
            buffer: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Sets the maximum number of lines per request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Number of buffered points not yet flushed.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Flushes and closes the writer.
    pub fn close(mut self) -> Result<(), WriteError> {
        self.flush()
    }

    fn send(&self, body: String) -> Result<(), WriteError> {
        let mut request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Token {token}"));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(WriteError::Server {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl PointWriter for WriteApi {
    fn write_point(&mut self, point: MetricPoint) {
        self.buffer.push(point);
    }

    fn flush(&mut self) -> Result<(), WriteError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let points = std::mem::take(&mut self.buffer);
        let mut lines = Vec::with_capacity(points.len());
        for point in &points {
            let mut line = String::new();
            match encode_point(point, &mut line) {
                Ok(()) => lines.push(line),
                Err(e) => warn!(
                    path = point.tags().get("path").map(String::as_str).unwrap_or(""),
                    error = %e,
                    "skipping point"
                ),
            }
        }

        for batch in lines.chunks(self.batch_size) {
            self.send(batch.join("\n"))?;
            debug!(lines = batch.len(), "write batch sent");
        }
        Ok(())
    }
}

impl Drop for WriteApi {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(points = self.buffer.len(), "dropping unflushed points");
        }
    }
}

fn write_url(settings: &InfluxSettings) -> Result<Url, WriteError> {
    let mut url = settings.addr.clone();
    url.path_segments_mut()
        .map_err(|()| WriteError::InvalidUrl(settings.addr.to_string()))?
        .pop_if_empty()
        .extend(["api", "v2", "write"]);
    url.query_pairs_mut()
        .clear()
        .append_pair("org", &settings.org)
        .append_pair("bucket", &settings.bucket)
        .append_pair("precision", "ns");
    Ok(url)
}

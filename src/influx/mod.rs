//! InfluxDB output.
//!
//! `MetricPoint` is the unit handed to a `PointWriter`. `WriteApi` is the
//! HTTP implementation; it encodes points with `line_protocol` on flush.

pub mod line_protocol;
mod point;
mod writer;

pub use line_protocol::EncodeError;
pub use point::{MEASUREMENT, MetricPoint};
pub use writer::{DEFAULT_BATCH_SIZE, PointWriter, WriteApi, WriteError};

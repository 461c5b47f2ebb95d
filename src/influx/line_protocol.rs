//! InfluxDB line protocol encoding.
//!
//! ```text
//! cephfs_xattr,org=root,path=/,user=root ceph.quota.max_bytes=1000000 1600000000000000000
//! ```
//!
//! Tags are written in key order. Tags with an empty value are left out since
//! the server rejects them. Fields are always floats (no `i` suffix).
//! Backslashes are doubled so a name ending in `\` cannot swallow the
//! separator after it. Line breaks cannot be represented at all, so points
//! carrying them are rejected.

use std::fmt::Write;

use thiserror::Error;

use super::MetricPoint;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("point has no fields")]
    NoFields,

    #[error("timestamp out of range for nanosecond precision")]
    TimestampOutOfRange,

    #[error("line break in {0:?}")]
    LineBreak(String),
}

/// Appends `point` as one line (without trailing newline) to `out`.
///
/// Nothing is written when an error is returned.
pub fn encode_point(point: &MetricPoint, out: &mut String) -> Result<(), EncodeError> {
    if point.fields().is_empty() {
        return Err(EncodeError::NoFields);
    }
    let nanos = point
        .timestamp()
        .timestamp_nanos_opt()
        .ok_or(EncodeError::TimestampOutOfRange)?;

    let names = std::iter::once(point.measurement())
        .chain(point.tags().iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
        .chain(point.fields().keys().map(String::as_str));
    for name in names {
        if name.contains(['\n', '\r']) {
            return Err(EncodeError::LineBreak(name.to_string()));
        }
    }

    escape_into(out, point.measurement(), &[',', ' ']);

    for (key, value) in point.tags() {
        if value.is_empty() {
            continue;
        }
        out.push(',');
        escape_into(out, key, &[',', '=', ' ']);
        out.push('=');
        escape_into(out, value, &[',', '=', ' ']);
    }

    for (i, (key, value)) in point.fields().iter().enumerate() {
        out.push(if i == 0 { ' ' } else { ',' });
        escape_into(out, key, &[',', '=', ' ']);
        // Writing to a String never fails.
        let _ = write!(out, "={value}");
    }

    let _ = write!(out, " {nanos}");
    Ok(())
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        match c {
            c if c == '\\' || special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

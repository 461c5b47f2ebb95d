//! Raw xattr value to numeric field conversion.
//!
//! CephFS virtual xattrs are ASCII decimals, e.g. `ceph.dir.rbytes` is
//! `"1073741824"` and `ceph.dir.rctime` is `"1600000000.090000000"`.

use super::ConvertError;

/// Parses a raw attribute value as a finite `f64`.
///
/// Surrounding whitespace and trailing NUL bytes are ignored.
pub fn parse_value(raw: &[u8]) -> Result<f64, ConvertError> {
    let text = std::str::from_utf8(raw).map_err(|_| ConvertError::NotUtf8)?;
    let text = text.trim_end_matches('\0').trim();

    let value: f64 = text
        .parse()
        .map_err(|_| ConvertError::NotNumeric(text.to_string()))?;

    if !value.is_finite() {
        return Err(ConvertError::NotFinite(text.to_string()));
    }
    Ok(value)
}

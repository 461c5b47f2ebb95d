//! Plain-text config file parser.
//!
//! One `flag value` pair per line. The flag is the long flag name, with or
//! without leading dashes. Blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! # InfluxDB
//! influx.addr   http://influx.example.org:8086
//! influx.bucket cephfs
//! --ceph.mons   mon1,mon2,mon3
//! ```

use std::path::Path;

use super::ConfigError;

/// A single `flag value` line of a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// 1-based line number, for error messages.
    pub line: usize,
    pub key: String,
    pub value: String,
}

/// Reads and parses a config file.
pub fn read_config_file(path: &Path) -> Result<Vec<ConfigEntry>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_config(&text))
}

/// Parses config file contents. Lines without a value yield an empty value.
pub fn parse_config(text: &str) -> Vec<ConfigEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }

            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };

            Some(ConfigEntry {
                line: idx + 1,
                key: key.trim_start_matches('-').to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_comments() {
        let entries = parse_config(
            "# comment\n\
             \n\
             influx.addr http://db:8086\n\
             --ceph.mons\tmon1,mon2\n\
             \x20\x20influx.token   user:pass with spaces  \n",
        );

        assert_eq!(
            entries,
            vec![
                ConfigEntry {
                    line: 3,
                    key: "influx.addr".into(),
                    value: "http://db:8086".into(),
                },
                ConfigEntry {
                    line: 4,
                    key: "ceph.mons".into(),
                    value: "mon1,mon2".into(),
                },
                ConfigEntry {
                    line: 5,
                    key: "influx.token".into(),
                    value: "user:pass with spaces".into(),
                },
            ]
        );
    }

    #[test]
    fn key_without_value_is_empty() {
        let entries = parse_config("ceph.keyring\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "ceph.keyring");
        assert_eq!(entries[0].value, "");
    }

    #[test]
    fn value_may_contain_hash() {
        let entries = parse_config("influx.token abc#def\n");
        assert_eq!(entries[0].value, "abc#def");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config_file(&dir.path().join("missing.conf")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

//! Paths file loading.
//!
//! The paths file is a JSON array of objects naming the CephFS path to poll
//! together with the organisation and user it is accounted to:
//!
//! ```json
//! [
//!     { "Organisation": "root", "User": "root", "Path": "/" },
//!     { "Organisation": "org1", "User": "user2", "Path": "/org1/user2" }
//! ]
//! ```
//!
//! Keys match regardless of ASCII case and unknown keys are ignored. A missing
//! or `null` key leaves that field empty; any other non-string value is an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Error returned when the paths file cannot be loaded.
#[derive(Debug, Error)]
pub enum PathsError {
    #[error("unable to read paths file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to decode paths file {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A CephFS path whose xattrs are collected, with its accounting metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct PathEntry {
    pub organisation: String,
    pub user: String,
    pub path: String,
}

impl TryFrom<Map<String, Value>> for PathEntry {
    type Error = String;

    fn try_from(object: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut entry = PathEntry::default();
        for (key, value) in object {
            let field = if key.eq_ignore_ascii_case("organisation") {
                &mut entry.organisation
            } else if key.eq_ignore_ascii_case("user") {
                &mut entry.user
            } else if key.eq_ignore_ascii_case("path") {
                &mut entry.path
            } else {
                continue;
            };

            match value {
                Value::Null => {}
                Value::String(s) => *field = s,
                other => return Err(format!("\"{key}\": expected a string, found {other}")),
            }
        }
        Ok(entry)
    }
}

impl PathEntry {
    /// Tag set attached to every point produced for this path.
    pub fn tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("org".to_string(), self.organisation.clone()),
            ("user".to_string(), self.user.clone()),
            ("path".to_string(), self.path.clone()),
        ])
    }
}

/// Reads and decodes the paths file.
pub fn load_paths(path: &Path) -> Result<Vec<PathEntry>, PathsError> {
    let data = std::fs::read(path).map_err(|source| PathsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_paths(&data).map_err(|source| PathsError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_paths(data: &[u8]) -> Result<Vec<PathEntry>, serde_json::Error> {
    serde_json::from_slice(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_entries_in_file_order() {
        let file = write_temp(
            r#"[
                {"Organisation": "root", "User": "root", "Path": "/"},
                {"Organisation": "org1", "User": "user2", "Path": "/org1/user2"},
                {"Organisation": "org1", "User": "user2", "Path": "/org1/user2"}
            ]"#,
        );

        let entries = load_paths(file.path()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            PathEntry {
                organisation: "root".into(),
                user: "root".into(),
                path: "/".into(),
            }
        );
        assert_eq!(entries[1].organisation, "org1");
        assert_eq!(entries[1].user, "user2");
        assert_eq!(entries[1].path, "/org1/user2");
        // Duplicates are kept as-is.
        assert_eq!(entries[1], entries[2]);
    }

    #[test]
    fn empty_array_yields_no_entries() {
        let file = write_temp("[]");
        assert!(load_paths(file.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_paths(&dir.path().join("paths.json")).unwrap_err();
        assert!(matches!(err, PathsError::Read { .. }));
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let file = write_temp("[{\"Organisation\": ");
        let err = load_paths(file.path()).unwrap_err();
        assert!(matches!(err, PathsError::Decode { .. }));
    }

    #[test]
    fn wrong_shape_is_decode_error() {
        assert!(parse_paths(br#"{"Path": "/"}"#).is_err());
        assert!(parse_paths(br#"["/"]"#).is_err());
        assert!(parse_paths(br#"[{"Organisation": 1, "User": "b", "Path": "/"}]"#).is_err());
        assert!(parse_paths(br#"[{"Organisation": "a", "Path": ["/"]}]"#).is_err());
    }

    #[test]
    fn keys_match_any_case() {
        let entries =
            parse_paths(br#"[{"organisation": "a", "USER": "b", "pAtH": "/c"}]"#).unwrap();
        assert_eq!(
            entries,
            vec![PathEntry {
                organisation: "a".into(),
                user: "b".into(),
                path: "/c".into(),
            }]
        );
    }

    #[test]
    fn missing_and_null_keys_stay_empty() {
        let entries = parse_paths(
            br#"[
                {"Organisation": "a", "User": "b"},
                {"Organisation": null, "User": "b", "Path": "/", "Quota": 10}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries[0].organisation, "a");
        assert_eq!(entries[0].path, "");
        assert_eq!(entries[1].organisation, "");
        assert_eq!(entries[1].path, "/");
    }

    #[test]
    fn tags_map_entry_fields() {
        let entry = PathEntry {
            organisation: "org1".into(),
            user: "user2".into(),
            path: "/org1/user2".into(),
        };
        let tags = entry.tags();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags["org"], "org1");
        assert_eq!(tags["user"], "user2");
        assert_eq!(tags["path"], "/org1/user2");
    }
}

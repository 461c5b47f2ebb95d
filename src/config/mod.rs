//! Command line, environment and config file settings.
//!
//! Every flag can also be set through an environment variable with the
//! `CEPHFS_XATTR_INFLUX_` prefix, or through a plain-text config file given
//! with `--config`. Precedence is command line, then environment, then the
//! config file, then the built-in default.

mod file;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::parser::ValueSource;
use clap::{ArgMatches, Command, CommandFactory, FromArgMatches, Parser};
use reqwest::Url;
use thiserror::Error;

pub use file::{ConfigEntry, parse_config, read_config_file};

/// Error returned when settings cannot be built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command line parsing failed, or help/version was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("unable to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file line {line}: unknown flag '{key}'")]
    UnknownKey { line: usize, key: String },

    #[error("config file line {line}: flag '{key}' cannot be set from a config file")]
    UnsupportedKey { line: usize, key: String },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid influx.addr '{addr}': {reason}")]
    InvalidAddr { addr: String, reason: String },
}

/// Reads xattrs of CephFS paths and writes them to InfluxDB.
#[derive(Parser, Debug)]
#[command(name = "cephfs-xattr-influx", version)]
pub struct Args {
    /// InfluxDB server address.
    #[arg(
        long = "influx.addr",
        env = "CEPHFS_XATTR_INFLUX_INFLUX_ADDR",
        default_value = "http://localhost:8086"
    )]
    pub influx_addr: String,

    /// InfluxDB authentication token. (For InfluxDB 1.8 use 'username:password')
    #[arg(
        long = "influx.token",
        env = "CEPHFS_XATTR_INFLUX_INFLUX_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    pub influx_token: String,

    /// InfluxDB organisation. (For InfluxDB 1.8 leave this empty)
    #[arg(
        long = "influx.org",
        env = "CEPHFS_XATTR_INFLUX_INFLUX_ORG",
        default_value = ""
    )]
    pub influx_org: String,

    /// InfluxDB bucket. (For InfluxDB 1.8 use database/retention-policy,
    /// skip the retention policy if the default is used)
    #[arg(
        long = "influx.bucket",
        env = "CEPHFS_XATTR_INFLUX_INFLUX_BUCKET",
        default_value = ""
    )]
    pub influx_bucket: String,

    /// Ceph client name.
    #[arg(
        long = "ceph.client",
        env = "CEPHFS_XATTR_INFLUX_CEPH_CLIENT",
        default_value = "admin"
    )]
    pub ceph_client: String,

    /// Ceph client authentication key.
    #[arg(
        long = "ceph.keyring",
        env = "CEPHFS_XATTR_INFLUX_CEPH_KEYRING",
        default_value = "",
        hide_env_values = true
    )]
    pub ceph_keyring: String,

    /// Comma separated list of Ceph monitors (e.g. mon1,mon2).
    /// When empty the default Ceph configuration file is read.
    #[arg(
        long = "ceph.mons",
        env = "CEPHFS_XATTR_INFLUX_CEPH_MONS",
        default_value = ""
    )]
    pub ceph_mons: String,

    /// JSON file with the paths to monitor.
    #[arg(
        long = "paths",
        env = "CEPHFS_XATTR_INFLUX_PATHS",
        default_value = "paths.json"
    )]
    pub paths: PathBuf,

    /// Plain-text config file with one 'flag value' pair per line.
    #[arg(long, env = "CEPHFS_XATTR_INFLUX_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// InfluxDB write target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfluxSettings {
    pub addr: Url,
    pub token: Option<String>,
    pub org: String,
    pub bucket: String,
}

/// Ceph cluster connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CephSettings {
    /// Client name without the `client.` prefix. `None` uses the library default.
    pub client: Option<String>,
    pub key: Option<String>,
    /// Monitor hosts. Empty means read the default Ceph configuration file.
    pub monitors: Vec<String>,
}

/// Immutable settings for one run, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub influx: InfluxSettings,
    pub ceph: CephSettings,
    pub paths_file: PathBuf,
    pub verbose: u8,
    pub quiet: bool,
}

impl Settings {
    /// Builds settings from the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args_os())
    }

    /// Builds settings from the given arguments (first one is the program name).
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut argv: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let command = Args::command();
        let mut matches = command.clone().try_get_matches_from(argv.iter())?;

        if let Some(path) = matches.get_one::<PathBuf>("config").cloned() {
            let entries = read_config_file(&path)?;
            let overrides = config_overrides(&command, &matches, entries)?;
            if !overrides.is_empty() {
                argv.extend(overrides);
                matches = command.try_get_matches_from(argv.iter())?;
            }
        }

        let args = Args::from_arg_matches(&matches)?;
        Self::try_from(args)
    }

    pub fn paths_file(&self) -> &Path {
        &self.paths_file
    }
}

/// Turns config file entries into extra `--flag=value` arguments for every
/// flag not already given on the command line or in the environment.
/// A flag repeated in the file keeps its last value.
fn config_overrides(
    command: &Command,
    matches: &ArgMatches,
    entries: Vec<ConfigEntry>,
) -> Result<Vec<OsString>, ConfigError> {
    let mut values: BTreeMap<String, String> = BTreeMap::new();

    for entry in entries {
        let Some(arg) = command
            .get_arguments()
            .find(|arg| arg.get_long() == Some(entry.key.as_str()))
        else {
            return Err(ConfigError::UnknownKey {
                line: entry.line,
                key: entry.key,
            });
        };

        let id = arg.get_id().as_str();
        if id == "config" || !arg.get_action().takes_values() {
            return Err(ConfigError::UnsupportedKey {
                line: entry.line,
                key: entry.key,
            });
        }

        match matches.value_source(id) {
            Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable) => {}
            _ => {
                values.insert(entry.key, entry.value);
            }
        }
    }

    Ok(values
        .into_iter()
        .map(|(key, value)| OsString::from(format!("--{key}={value}")))
        .collect())
}

impl TryFrom<Args> for Settings {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let addr = parse_addr(&args.influx_addr)?;

        let bucket = args.influx_bucket.trim().to_string();
        if bucket.is_empty() {
            return Err(ConfigError::Missing("influx.bucket"));
        }

        let monitors = args
            .ceph_mons
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();

        Ok(Settings {
            influx: InfluxSettings {
                addr,
                token: non_empty(args.influx_token),
                org: args.influx_org,
                bucket,
            },
            ceph: CephSettings {
                client: non_empty(args.ceph_client.trim().to_string()),
                key: non_empty(args.ceph_keyring),
                monitors,
            },
            paths_file: args.paths,
            verbose: args.verbose,
            quiet: args.quiet,
        })
    }
}

fn parse_addr(addr: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(addr).map_err(|e| ConfigError::InvalidAddr {
        addr: addr.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidAddr {
            addr: addr.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

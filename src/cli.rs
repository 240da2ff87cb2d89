//! Command-line options.

use clap::Parser;
use std::path::PathBuf;

/// Generate cluster/server test data and optionally publish it to Route53.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "cluster-testdata")]
#[command(version, about, long_about = None)]
pub struct Options {
    /// Enable debugging.
    #[arg(short, long, conflicts_with = "silent")]
    pub debug: bool,

    /// Don't log.
    #[arg(short, long)]
    pub silent: bool,

    /// File to read the project configuration from (YAML).
    #[arg(short, long = "config", default_value = "heroku.yml")]
    pub config: PathBuf,

    /// Create Route53 entries.
    #[arg(short, long)]
    pub aws: bool,

    /// Word list used for server names, one name per line.
    #[arg(short, long, default_value = "names.txt")]
    pub names: PathBuf,
}

impl Options {
    /// Parse options from an argument iterator (first item is the program name).
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

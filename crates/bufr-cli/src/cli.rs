//! CLI argument definitions for the BUFR bundler.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bufr-bundle",
    version,
    about = "Bundle selected BUFR data subsets into a single message",
    long_about = "Read a stream of BUFR messages, keep the data subsets that pass the\n\
                  header and descriptor/value filters, and write them as one message.\n\n\
                  Only subsets sharing the template of the first accepted message are kept.",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge matching subsets of the input messages into one message.
    Bundle(BundleArgs),

    /// List the schema tables that would be used.
    Tables(TableArgs),
}

/// Where schema tables come from.
#[derive(Args, Clone, Default)]
pub struct TableArgs {
    /// Directory of external table sets (overrides BUFR_TABLES).
    #[arg(long = "tables-dir", value_name = "DIR")]
    pub tables_dir: Option<PathBuf>,

    /// Local Table B file applied on top of every table version.
    #[arg(long = "local-table-b", value_name = "PATH")]
    pub local_table_b: Option<PathBuf>,

    /// Local Table D file applied on top of every table version.
    #[arg(long = "local-table-d", value_name = "PATH")]
    pub local_table_d: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
pub struct BundleArgs {
    /// Input file of concatenated messages (default: stdin).
    #[arg(long = "input", short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file for the bundle (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub tables: TableArgs,

    /// Compress the data section when the bundle holds several subsets.
    #[arg(long = "compress")]
    pub compress: bool,

    /// Keep only messages of this data category.
    #[arg(long = "category", value_name = "N")]
    pub category: Option<u8>,

    /// Keep only messages from this originating centre.
    #[arg(long = "orig-centre", value_name = "N")]
    pub orig_centre: Option<u16>,

    /// Keep only messages declaring this master table version.
    #[arg(long = "master-table-version", value_name = "N")]
    pub master_table_version: Option<u8>,

    /// Descriptor and value a subset must contain, e.g. `001002 10,20`.
    ///
    /// Repeat to require an ordered sequence of descriptor/value pairs.
    /// Numeric values may list alternatives separated by commas.
    #[arg(
        long = "search-key",
        num_args = 2,
        value_names = ["DESCRIPTOR", "VALUE"],
        action = clap::ArgAction::Append
    )]
    pub search_key: Vec<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

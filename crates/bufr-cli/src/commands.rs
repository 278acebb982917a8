use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use thiserror::Error;
use tracing::{info, info_span};

use bufr_bundle::{BundleConfig, BundleSummary, HeaderFilter, SearchKey, StreamingBundler};
use bufr_codec::{MessageReader, MessageWriter};
use bufr_model::Descriptor;
use bufr_tables::{SchemaTableCollection, TableSources, TablesError, load_collection};

use crate::cli::{BundleArgs, TableArgs};

/// Exit status for a successful run, including an empty bundle.
pub const EXIT_OK: i32 = 0;
/// Exit status for any fatal failure not covered below.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when an input, output or table file cannot be opened.
pub const EXIT_OPEN: i32 = 3;
/// Exit status for a malformed invocation.
pub const EXIT_USAGE: i32 = 5;

/// Failures that select a specific exit status.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("can't open \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            CliError::Open { .. } => EXIT_OPEN,
        }
    }
}

/// Exit status for a fatal error, looking through its causes.
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(cli_error) = cause.downcast_ref::<CliError>() {
            return cli_error.exit_code();
        }
        if let Some(TablesError::Io { .. }) = cause.downcast_ref::<TablesError>() {
            return EXIT_OPEN;
        }
    }
    EXIT_FAILURE
}

pub fn run_bundle(args: &BundleArgs) -> Result<BundleSummary> {
    let span = info_span!("bundle");
    let _guard = span.enter();

    let config = bundle_config(args)?;
    let tables = load_tables(&args.tables)?;

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(open_input(path)?),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(io::stdout().lock()),
    };

    let mut reader = MessageReader::new(input);
    let mut writer = MessageWriter::new(output);
    let summary = StreamingBundler::new(&tables, &config)
        .run(&mut reader, &mut writer)
        .context("bundle records")?;
    info!(
        input = %display_path(args.input.as_deref(), "<stdin>"),
        output = %display_path(args.output.as_deref(), "<stdout>"),
        "done"
    );
    Ok(summary)
}

pub fn run_tables(args: &TableArgs) -> Result<()> {
    let tables = load_tables(args)?;
    let mut table = Table::new();
    table.set_header(vec!["Version", "Table B", "Table D", "Local", "Origin"]);
    apply_table_style(&mut table);
    for schema in tables.tables() {
        table.add_row(vec![
            schema.master_version().to_string(),
            schema.element_count().to_string(),
            schema.sequence_count().to_string(),
            if schema.has_local_overrides() { "yes" } else { "no" }.to_string(),
            schema.origin().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Translate bundle arguments into the run configuration.
pub fn bundle_config(args: &BundleArgs) -> Result<BundleConfig, CliError> {
    let mut header_filter = HeaderFilter::default();
    if let Some(category) = args.category {
        header_filter = header_filter.with_data_category(category);
    }
    if let Some(centre) = args.orig_centre {
        header_filter = header_filter.with_orig_centre(centre);
    }
    if let Some(version) = args.master_table_version {
        header_filter = header_filter.with_master_table_version(version);
    }

    Ok(BundleConfig::new()
        .with_search_keys(parse_search_keys(&args.search_key)?)
        .with_header_filter(header_filter)
        .with_compress(args.compress))
}

/// Pair up `--search-key DESCRIPTOR VALUE` arguments.
pub fn parse_search_keys(raw: &[String]) -> Result<Vec<SearchKey>, CliError> {
    if !raw.len().is_multiple_of(2) {
        return Err(CliError::Usage(
            "--search-key expects a descriptor and a value".to_string(),
        ));
    }
    raw.chunks_exact(2)
        .map(|pair| {
            let descriptor: Descriptor = pair[0].parse().map_err(|err| {
                CliError::Usage(format!("invalid search key descriptor: {err}"))
            })?;
            Ok(SearchKey::new(descriptor, pair[1].as_str()))
        })
        .collect()
}

fn load_tables(args: &TableArgs) -> Result<SchemaTableCollection> {
    let sources = TableSources {
        tables_dir: args.tables_dir.clone(),
        local_table_b: args.local_table_b.clone(),
        local_table_d: args.local_table_d.clone(),
    };
    load_collection(&sources).context("load schema tables")
}

fn open_input(path: &Path) -> Result<File, CliError> {
    File::open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn create_output(path: &Path) -> Result<File, CliError> {
    File::create(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn display_path(path: Option<&Path>, fallback: &str) -> String {
    path.map_or_else(|| fallback.to_string(), |path| path.display().to_string())
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn search_keys_pair_up_in_order() {
        let keys = parse_search_keys(&strings(&["001002", "10,20", "12101", "273.15"])).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].descriptor, Descriptor::from_code(1002).unwrap());
        assert_eq!(keys[0].value, "10,20");
        assert_eq!(keys[1].descriptor, Descriptor::from_code(12101).unwrap());
    }

    #[test]
    fn malformed_descriptor_is_a_usage_error() {
        let err = parse_search_keys(&strings(&["station", "10"])).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn header_fields_default_to_unconstrained() {
        let config = bundle_config(&BundleArgs::default()).unwrap();
        assert!(config.header_filter.is_unconstrained());
        assert!(config.search_keys.is_empty());
        assert!(!config.compress);

        let args = BundleArgs {
            category: Some(2),
            ..BundleArgs::default()
        };
        let config = bundle_config(&args).unwrap();
        assert_eq!(config.header_filter.data_category, Some(2));
        assert_eq!(config.header_filter.orig_centre, None);
    }

    #[test]
    fn exit_codes_follow_the_cause() {
        let open = anyhow::Error::new(CliError::Open {
            path: PathBuf::from("missing.bufr"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        });
        assert_eq!(exit_code_for(&open), EXIT_OPEN);

        let local = anyhow::Error::new(TablesError::Io {
            path: PathBuf::from("local_b.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        })
        .context("load schema tables");
        assert_eq!(exit_code_for(&local), EXIT_OPEN);

        assert_eq!(exit_code_for(&anyhow::anyhow!("write failed")), EXIT_FAILURE);
    }
}

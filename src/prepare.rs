//! Implementation of the `prepare` sub command.
//!
//! Fetches the ClinVar VCF and its VEP-annotated counterpart, builds the
//! labelled lookup from the former, joins the latter against it and uploads
//! the resulting CSV table.

use std::{
    collections::HashSet,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;

use crate::{
    annotated::{join_and_write, JoinStats},
    clinvar::{build_lookup, LookupStats, Records},
    common::{io::open_read_maybe_gz, io::open_write_maybe_gz, key_file_name, trace_rss_now},
    conf::Settings,
    header::read_header,
    output::RowWriter,
    storage::{self, Storage},
};

/// Name of the output file in the scratch directory.
pub const OUTPUT_FILE_NAME: &str = "clinvar_conflicting.csv";

/// Command line arguments for `prepare` sub command.
#[derive(Parser, Debug, Clone)]
#[command(about = "Build the labelled ClinVar/VEP table", long_about = None)]
pub struct Args {
    /// Bucket holding both input files.
    #[arg(long)]
    pub input_bucket: String,
    /// Key of the ClinVar VCF.
    #[arg(long)]
    pub clinvar_input_key: String,
    /// Key of the VEP-annotated ClinVar VCF.
    #[arg(long)]
    pub clinvar_annotated_input_key: String,
    /// Bucket to upload the table to.
    #[arg(long)]
    pub output_bucket: String,
    /// Key to upload the table to.
    #[arg(long)]
    pub output_key: String,
    /// Optional TOML file overriding the labelling settings.
    #[arg(long)]
    pub path_settings: Option<PathBuf>,
    /// Directory holding the buckets when not running against S3.
    #[arg(long, default_value = ".")]
    pub local_root: PathBuf,
}

/// Counters of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub lookup: LookupStats,
    pub join: JoinStats,
}

/// Build the output table from local files.
pub fn build_table<P, Q, O>(
    path_clinvar: P,
    path_annotated: Q,
    path_output: O,
    settings: &Settings,
) -> Result<Summary, anyhow::Error>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    O: AsRef<Path>,
{
    tracing::info!("Loading ClinVar records from {:?}...", path_clinvar.as_ref());
    let mut reader = open_read_maybe_gz(path_clinvar.as_ref())?;
    let header = read_header(&mut reader)?;
    tracing::debug!("ClinVar declares {} INFO fields", header.meta.info.len());

    let mut undeclared = HashSet::new();
    let records = Records::new(reader, header.lines_read).inspect(|record| {
        if let Ok(record) = record {
            for key in record.info.keys() {
                if !header.meta.info.contains_key(key) && undeclared.insert(key.clone()) {
                    tracing::debug!("INFO key {:?} is not declared in the header", key);
                }
            }
        }
    });
    let (lookup, lookup_stats) = build_lookup(records, settings)?;
    tracing::info!("... done loading ClinVar records");
    trace_rss_now();

    tracing::info!(
        "Joining {:?} into {:?}...",
        path_annotated.as_ref(),
        path_output.as_ref()
    );
    let mut writer = RowWriter::new(open_write_maybe_gz(path_output.as_ref())?)?;
    let join_stats = join_and_write(
        open_read_maybe_gz(path_annotated.as_ref())?,
        &lookup,
        &settings.removed_keys(),
        &mut writer,
    )?;
    tracing::info!("... done joining, {} rows in table", writer.written());
    writer.into_inner()?.flush()?;

    Ok(Summary {
        lookup: lookup_stats,
        join: join_stats,
    })
}

/// Run the pipeline, moving files through `storage`.
pub fn run_with_storage(
    storage: &dyn Storage,
    args: &Args,
    settings: &Settings,
) -> Result<Summary, anyhow::Error> {
    let tmp_dir = tempfile::TempDir::new()
        .map_err(|e| anyhow::anyhow!("could not create temporary directory: {}", e))?;
    // Prefixes keep the two downloads apart when the keys share a file name.
    let path_clinvar = tmp_dir.path().join(format!(
        "clinvar-{}",
        key_file_name(&args.clinvar_input_key)
    ));
    let path_annotated = tmp_dir.path().join(format!(
        "annotated-{}",
        key_file_name(&args.clinvar_annotated_input_key)
    ));
    let path_output = tmp_dir.path().join(OUTPUT_FILE_NAME);

    tracing::info!("Downloading inputs from bucket {:?}...", &args.input_bucket);
    storage.download(&args.input_bucket, &args.clinvar_input_key, &path_clinvar)?;
    storage.download(
        &args.input_bucket,
        &args.clinvar_annotated_input_key,
        &path_annotated,
    )?;

    let summary = build_table(&path_clinvar, &path_annotated, &path_output, settings)?;

    tracing::info!(
        "Uploading {:?} to bucket {:?} key {:?}",
        OUTPUT_FILE_NAME,
        &args.output_bucket,
        &args.output_key
    );
    storage.upload(&path_output, &args.output_bucket, &args.output_key)?;

    Ok(summary)
}

/// Main entry point for the `prepare` sub command.
pub fn run(common_args: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("Starting `prepare`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let settings = Settings::load(args.path_settings.as_ref())?;
    tracing::debug!("  settings = {:?}", &settings);

    let storage = storage::from_env(&args.local_root)?;
    let summary = run_with_storage(storage.as_ref(), args, &settings)?;
    tracing::info!("  summary = {:?}", &summary);

    Ok(())
}

//! Implementation of the `info-columns` sub command.
//!
//! Writes the INFO vocabulary declared in a VCF header as a TSV file.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use clap::Parser;

use crate::{
    common::{
        io::{open_read_maybe_gz, open_write_maybe_gz},
        key_file_name,
    },
    header::read_header,
    storage::{self, Storage},
};

/// Command line arguments for `info-columns` sub command.
#[derive(Parser, Debug, Clone)]
#[command(about = "Dump the INFO column descriptions of a VCF", long_about = None)]
pub struct Args {
    /// Bucket holding the input file.
    #[arg(long)]
    pub input_bucket: String,
    /// Key of the VCF file.
    #[arg(long)]
    pub input_key: String,
    /// Path to the output TSV file.
    #[arg(long)]
    pub path_output: PathBuf,
    /// Directory holding the buckets when not running against S3.
    #[arg(long, default_value = ".")]
    pub local_root: PathBuf,
}

/// Write one TSV line per `##INFO` declaration of `reader` to `writer`.
pub fn write_info_columns<R, W>(mut reader: R, writer: W) -> Result<usize, anyhow::Error>
where
    R: BufRead,
    W: Write,
{
    let header = read_header(&mut reader)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for info in header.meta.info.values() {
        writer.serialize(info)?;
    }
    writer.flush()?;

    Ok(header.meta.info.len())
}

/// Fetch the VCF through `storage` and write its INFO columns.
pub fn run_with_storage(storage: &dyn Storage, args: &Args) -> Result<usize, anyhow::Error> {
    let tmp_dir = tempfile::TempDir::new()
        .map_err(|e| anyhow::anyhow!("could not create temporary directory: {}", e))?;
    let path_input = tmp_dir.path().join(key_file_name(&args.input_key));
    storage.download(&args.input_bucket, &args.input_key, &path_input)?;

    write_info_columns(
        open_read_maybe_gz(&path_input)?,
        open_write_maybe_gz(&args.path_output)?,
    )
}

/// Main entry point for the `info-columns` sub command.
pub fn run(common_args: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("Starting `info-columns`");
    tracing::info!("  common_args = {:?}", &common_args);
    tracing::info!("  args = {:?}", &args);

    let storage = storage::from_env(&args.local_root)?;
    let count = run_with_storage(storage.as_ref(), args)?;
    tracing::info!("wrote {} INFO columns to {:?}", count, &args.path_output);

    Ok(())
}

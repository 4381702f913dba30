//! ClinVar conflicting-interpretation table builder main executable

pub mod annotated;
pub mod clinvar;
pub mod common;
pub mod conf;
pub mod err;
pub mod fields;
pub mod header;
pub mod info_columns;
pub mod output;
pub mod prepare;
pub mod storage;

use clap::{Parser, Subcommand};
use console::{Emoji, Term};

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "ClinVar conflicting interpretation table builder",
    long_about = "Joins a ClinVar VCF with its VEP annotation into a labelled CSV table"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the labelled table and upload it.
    Prepare(prepare::Args),
    /// Write the INFO column descriptions of a VCF header.
    InfoColumns(info_columns::Args),
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();

    // Install collector and go into sub commands.
    let term = Term::stderr();
    tracing::subscriber::with_default(collector, || {
        match &cli.command {
            Commands::Prepare(args) => prepare::run(&cli.common, args)?,
            Commands::InfoColumns(args) => info_columns::run(&cli.common, args)?,
        }

        Ok::<(), anyhow::Error>(())
    })?;
    term.write_line(&format!("All done. Have a nice day!{}", Emoji(" 😃", "")))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn parse_prepare() {
        let cli = Cli::try_parse_from([
            "clinvar-conflicting",
            "-v",
            "prepare",
            "--input-bucket",
            "staging",
            "--clinvar-input-key",
            "clinvar.vcf.gz",
            "--clinvar-annotated-input-key",
            "clinvar_vep.vcf.gz",
            "--output-bucket",
            "results",
            "--output-key",
            "clinvar_conflicting.csv",
        ])
        .expect("valid command line");

        match cli.command {
            Commands::Prepare(args) => {
                assert_eq!(args.input_bucket, "staging");
                assert_eq!(args.clinvar_annotated_input_key, "clinvar_vep.vcf.gz");
                assert_eq!(args.path_settings, None);
                assert_eq!(args.local_root, std::path::PathBuf::from("."));
            }
            _ => panic!("expected prepare"),
        }
    }

    #[test]
    fn prepare_requires_all_locations() {
        let result = Cli::try_parse_from([
            "clinvar-conflicting",
            "prepare",
            "--input-bucket",
            "staging",
            "--clinvar-input-key",
            "clinvar.vcf.gz",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

//! Common functionality.

use byte_unit::{Byte, UnitType};
use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

pub mod io;
pub mod s3;

/// Commonly used command line arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// Helper to print the current memory resident set size via `tracing`.
///
/// Silently does nothing where `/proc` is not available.
pub fn trace_rss_now() {
    let rss = procfs::process::Process::myself()
        .and_then(|me| me.stat())
        .map(|stat| stat.rss * procfs::page_size());
    if let Ok(rss) = rss {
        tracing::debug!(
            "RSS now: {:.2}",
            Byte::from_u64(rss).get_appropriate_unit(UnitType::Binary)
        );
    }
}

/// Return the file name component of an object key.
///
/// Keys such as `clinvar/2020-01/clinvar.vcf.gz` map to `clinvar.vcf.gz`.
pub fn key_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod test {
    #[rstest::rstest]
    #[case("clinvar.vcf.gz", "clinvar.vcf.gz")]
    #[case("staging/clinvar.vcf.gz", "clinvar.vcf.gz")]
    #[case("a/b/c/clinvar_vep.vcf.gz", "clinvar_vep.vcf.gz")]
    fn key_file_name(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(super::key_file_name(key), expected);
    }

    #[test]
    fn trace_rss_now_does_not_panic() {
        super::trace_rss_now();
    }
}

//! Errors raised on structural anomalies in the input files.

/// Structural problems in a VCF-like input file.
///
/// All of these abort the run; the inputs are trusted snapshots and any
/// deviation from the expected layout means the snapshot is broken.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("INFO token {token:?} is not a single KEY=VALUE pair")]
    MalformedInfoToken { token: String },
    #[error("line {line_no}: expected {expected} tab-separated columns, found {found}")]
    ColumnCount {
        line_no: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line_no}: invalid variant identifier {value:?}")]
    InvalidId { line_no: usize, value: String },
    #[error("line {line_no}: duplicate variant identifier {id}")]
    DuplicateId { line_no: usize, id: u64 },
    #[error("line {line_no}: CSQ value found but the header declares no CSQ format")]
    MissingCsqFormat { line_no: usize },
    #[error("line {line_no}: CSQ format declared more than once")]
    DuplicateCsqFormat { line_no: usize },
    #[error("line {line_no}: CSQ format declared after the first data line")]
    LateCsqFormat { line_no: usize },
    #[error("line {line_no}: no #CHROM column header line before the first data line")]
    MissingColumnHeader { line_no: usize },
    #[error("line {line_no}: malformed ##INFO header line {line:?}")]
    MalformedInfoHeader { line_no: usize, line: String },
}

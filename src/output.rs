//! Code for writing the output table.

use std::io::Write;

use indexmap::IndexMap;

/// Name of the derived label column.
pub const CLASS: &str = "CLASS";

/// Columns of the output table, in output order.
pub const FIELDNAMES: &[&str] = &[
    // positional fields of the annotated VCF
    "CHROM",
    "POS",
    "REF",
    "ALT",
    // ClinVar attributes
    "AF_ESP",
    "AF_EXAC",
    "AF_TGP",
    "CLNDISDB",
    "CLNDISDBINCL",
    "CLNDN",
    "CLNDNINCL",
    "CLNHGVS",
    "CLNSIGINCL",
    "CLNVC",
    "CLNVI",
    "MC",
    "ORIGIN",
    "SSR",
    CLASS,
    // VEP consequence fields
    "Allele",
    "Consequence",
    "IMPACT",
    "SYMBOL",
    "Feature_type",
    "Feature",
    "BIOTYPE",
    "EXON",
    "INTRON",
    "cDNA_position",
    "CDS_position",
    "Protein_position",
    "Amino_acids",
    "Codons",
    "DISTANCE",
    "STRAND",
    "BAM_EDIT",
    "SIFT",
    "PolyPhen",
    "MOTIF_NAME",
    "MOTIF_POS",
    "HIGH_INF_POS",
    "MOTIF_SCORE_CHANGE",
    "LoFtool",
    "CADD_PHRED",
    "CADD_RAW",
    "BLOSUM62",
];

/// Whether `name` is a column of the output table.
pub fn is_output_field(name: &str) -> bool {
    FIELDNAMES.contains(&name)
}

/// One merged row; names outside of `FIELDNAMES` are ignored on writing.
pub type Row = IndexMap<String, String>;

/// Writes rows to CSV in `FIELDNAMES` order, header first.
pub struct RowWriter<W: Write> {
    writer: csv::Writer<W>,
    written: usize,
}

impl<W: Write> RowWriter<W> {
    /// Wrap `inner` and write the header line.
    pub fn new(inner: W) -> Result<Self, anyhow::Error> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b',')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        writer.write_record(FIELDNAMES)?;
        Ok(Self { writer, written: 0 })
    }

    /// Write `row`; missing columns are left empty.
    pub fn write_row(&mut self, row: &Row) -> Result<(), anyhow::Error> {
        self.writer.write_record(
            FIELDNAMES
                .iter()
                .map(|name| row.get(*name).map(String::as_str).unwrap_or_default()),
        )?;
        self.written += 1;
        Ok(())
    }

    /// Number of rows written so far, not counting the header.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the wrapped writer.
    pub fn into_inner(self) -> Result<W, anyhow::Error> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("could not flush CSV output: {}", e.error()))
    }
}

//! Streaming join of the VEP-annotated VCF against the ClinVar lookup.

use std::{collections::HashSet, io::BufRead, io::Write, time::Instant};

use thousands::Separable;

use crate::{
    clinvar::{Attributes, ClinvarLookup},
    err::ParseError,
    fields::{split_info, zip_fields},
    header::{read_header, trim_line_end, InfoDescription, VcfMeta, CSQ_KEY},
    output::{Row, RowWriter},
};

/// One body line of the annotated VCF, borrowing from the line buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedRecord<'a> {
    pub chrom: &'a str,
    pub pos: &'a str,
    pub id: u64,
    pub reference: &'a str,
    pub alternative: &'a str,
    pub qual: &'a str,
    pub filter: &'a str,
    /// INFO tokens in file order
    pub info: Vec<(&'a str, &'a str)>,
}

impl<'a> AnnotatedRecord<'a> {
    /// Parse a body line that must have exactly the eight site columns.
    pub fn parse(line_no: usize, line: &'a str) -> Result<Self, ParseError> {
        let columns = line.split('\t').collect::<Vec<_>>();
        let [chrom, pos, id, reference, alternative, qual, filter, info] = columns[..] else {
            return Err(ParseError::ColumnCount {
                line_no,
                expected: 8,
                found: columns.len(),
            });
        };
        let id = id.parse::<u64>().map_err(|_| ParseError::InvalidId {
            line_no,
            value: id.to_string(),
        })?;

        Ok(Self {
            chrom,
            pos,
            id,
            reference,
            alternative,
            qual,
            filter,
            info: split_info(info)?,
        })
    }

    /// Build the merged output row for this record.
    ///
    /// Precedence, lowest first: empty CSQ fields, ClinVar attributes,
    /// positional columns, INFO tokens of this record.  The `CSQ` token is
    /// expanded against `csq_fields`, all other tokens are copied by key.
    /// Tokens named in `removed` are never copied.
    pub fn merge(
        &self,
        attributes: &Attributes,
        csq_fields: &[String],
        removed: &HashSet<&str>,
    ) -> Row {
        let mut row = Row::new();
        for name in csq_fields {
            row.insert(name.clone(), String::new());
        }
        for (key, value) in attributes {
            row.insert(key.clone(), value.clone());
        }
        for (key, value) in [
            ("CHROM", self.chrom),
            ("POS", self.pos),
            ("REF", self.reference),
            ("ALT", self.alternative),
        ] {
            row.insert(key.to_string(), value.to_string());
        }
        for (key, value) in &self.info {
            if *key == CSQ_KEY {
                for (name, csq_value) in zip_fields(csq_fields, value, '|') {
                    if !removed.contains(name) {
                        row.insert(name.to_string(), csq_value.to_string());
                    }
                }
            } else if !removed.contains(key) {
                row.insert(key.to_string(), value.to_string());
            }
        }
        row
    }
}

/// Counters collected during the join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// data lines read
    pub records: usize,
    /// rows written
    pub written: usize,
    /// records whose ID is not in the lookup
    pub skipped: usize,
    /// repeated occurrences of an already written ID
    pub duplicates: usize,
}

/// Reject CSQ declarations found after the column header.
fn check_body_header_line(meta: &VcfMeta, line_no: usize, line: &str) -> Result<(), ParseError> {
    if let Some(info) = InfoDescription::parse(line_no, line)? {
        if info.id == CSQ_KEY {
            return Err(if meta.csq_fields.is_some() {
                ParseError::DuplicateCsqFormat { line_no }
            } else {
                ParseError::LateCsqFormat { line_no }
            });
        }
    }
    Ok(())
}

/// Stream `reader` and write one row per record whose ID is in `lookup`.
///
/// Only the first occurrence of an ID is written.  INFO tokens named in
/// `removed` are not taken over from `reader`.
pub fn join_and_write<R, W>(
    mut reader: R,
    lookup: &ClinvarLookup,
    removed: &HashSet<&str>,
    writer: &mut RowWriter<W>,
) -> Result<JoinStats, anyhow::Error>
where
    R: BufRead,
    W: Write,
{
    let header = read_header(&mut reader)?;
    let meta = header.meta;
    if meta.csq_fields.is_none() {
        tracing::warn!("annotated file declares no CSQ format");
    }

    let mut stats = JoinStats::default();
    let mut seen = HashSet::new();
    let mut line_no = header.lines_read;
    let mut buf = String::new();
    let start = Instant::now();
    let mut prev = Instant::now();

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = trim_line_end(&buf);
        if line.starts_with('#') {
            check_body_header_line(&meta, line_no, line)?;
            continue;
        }

        let record = AnnotatedRecord::parse(line_no, line)?;
        stats.records += 1;

        let attributes = match lookup.get(&record.id) {
            Some(attributes) => attributes,
            None => {
                tracing::trace!("no ClinVar record for ID {}", record.id);
                stats.skipped += 1;
                continue;
            }
        };
        if !seen.insert(record.id) {
            tracing::debug!("line {}: ID {} already written", line_no, record.id);
            stats.duplicates += 1;
            continue;
        }

        let csq_fields = meta.csq_fields(line_no)?;
        writer.write_row(&record.merge(attributes, csq_fields, removed))?;
        stats.written += 1;

        if prev.elapsed().as_secs() >= 60 {
            tracing::info!(
                "at {}:{} ({} rows written)",
                record.chrom,
                record.pos,
                stats.written.separate_with_commas()
            );
            prev = Instant::now();
        }
    }

    tracing::info!(
        "wrote {} of {} annotated records in {:?} ({} without ClinVar match, {} duplicates)",
        stats.written.separate_with_commas(),
        stats.records.separate_with_commas(),
        start.elapsed(),
        stats.skipped.separate_with_commas(),
        stats.duplicates.separate_with_commas()
    );

    Ok(stats)
}

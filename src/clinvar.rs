//! Reading of the ClinVar VCF and construction of the labelled lookup.

use std::{
    collections::{hash_map::Entry, HashMap},
    io::BufRead,
};

use indexmap::IndexMap;
use thousands::Separable;

use crate::{
    conf::Settings,
    err::ParseError,
    fields::split_info,
    header::trim_line_end,
    output::{is_output_field, CLASS},
};

/// Retained ClinVar attributes of one variant, restricted to output columns.
pub type Attributes = IndexMap<String, String>;

/// Mapping from ClinVar variation ID to its retained attributes.
pub type ClinvarLookup = HashMap<u64, Attributes>;

/// One body line of the ClinVar VCF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinvarRecord {
    /// 1-based line number in the file
    pub line_no: usize,
    /// chromosome name
    pub chrom: String,
    /// 1-based position
    pub pos: String,
    /// ClinVar variation ID
    pub id: u64,
    /// reference allele
    pub reference: String,
    /// alternative allele
    pub alternative: String,
    /// expanded INFO column
    pub info: IndexMap<String, String>,
}

impl ClinvarRecord {
    /// Parse a tab-separated body line; QUAL and FILTER are not used.
    pub fn parse(line_no: usize, line: &str) -> Result<Self, ParseError> {
        let columns = line.split('\t').collect::<Vec<_>>();
        if columns.len() < 8 {
            return Err(ParseError::ColumnCount {
                line_no,
                expected: 8,
                found: columns.len(),
            });
        }
        let id = columns[2].parse::<u64>().map_err(|_| ParseError::InvalidId {
            line_no,
            value: columns[2].to_string(),
        })?;
        let info = split_info(columns[7])?
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        Ok(Self {
            line_no,
            chrom: columns[0].to_string(),
            pos: columns[1].to_string(),
            id,
            reference: columns[3].to_string(),
            alternative: columns[4].to_string(),
            info,
        })
    }
}

/// Iterator over the body records of a ClinVar VCF.
///
/// Lines starting with `#` are skipped, so the iterator may be used both
/// before and after the header has been consumed.
pub struct Records<R: BufRead> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> Records<R> {
    /// Iterate `reader`; `lines_read` is the number of lines already consumed.
    pub fn new(reader: R, lines_read: usize) -> Self {
        Self {
            reader,
            line_no: lines_read,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<ClinvarRecord, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => (),
                Err(e) => return Some(Err(e.into())),
            }
            self.line_no += 1;

            let line = trim_line_end(&self.buf);
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            return Some(ClinvarRecord::parse(self.line_no, line).map_err(Into::into));
        }
    }
}

/// Compute the label and prune one record.
///
/// Returns `None` when the review status is not accepted.  The label is
/// computed before any attribute is dropped; the label attribute itself
/// never survives.
pub fn label_and_prune(record: ClinvarRecord, settings: &Settings) -> Option<Attributes> {
    let ClinvarRecord { mut info, .. } = record;

    let class = if info.contains_key(&settings.label_key) {
        "1"
    } else {
        "0"
    };

    for key in &settings.zero_fill_keys {
        info.entry(key.clone()).or_insert_with(|| String::from("0"));
    }

    let accepted = info
        .get(&settings.review_status_key)
        .map(|status| settings.accepted_review_statuses.contains(status))
        .unwrap_or(false);
    if !accepted {
        return None;
    }

    info.shift_remove(&settings.label_key);
    for key in &settings.dropped_keys {
        info.shift_remove(key);
    }
    info.insert(String::from(CLASS), String::from(class));
    info.retain(|key, _| is_output_field(key));

    Some(info)
}

/// Counters collected while building the lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// records read from the file
    pub read: usize,
    /// records kept after review status filtering
    pub kept: usize,
    /// kept records with label 1
    pub positive: usize,
}

/// Build the labelled, filtered lookup from `records`.
///
/// Duplicate variation IDs among the kept records are a fatal error.
pub fn build_lookup<I>(
    records: I,
    settings: &Settings,
) -> Result<(ClinvarLookup, LookupStats), anyhow::Error>
where
    I: IntoIterator<Item = Result<ClinvarRecord, anyhow::Error>>,
{
    let mut lookup = ClinvarLookup::new();
    let mut stats = LookupStats::default();

    for record in records {
        let record = record?;
        stats.read += 1;
        let (line_no, id) = (record.line_no, record.id);

        let attributes = match label_and_prune(record, settings) {
            Some(attributes) => attributes,
            None => continue,
        };
        if attributes.get(CLASS).map(String::as_str) == Some("1") {
            stats.positive += 1;
        }
        match lookup.entry(id) {
            Entry::Occupied(_) => anyhow::bail!(ParseError::DuplicateId { line_no, id }),
            Entry::Vacant(entry) => {
                entry.insert(attributes);
            }
        }
        stats.kept += 1;
    }

    tracing::info!(
        "kept {} of {} ClinVar records ({} labeled as conflicting)",
        stats.kept.separate_with_commas(),
        stats.read.separate_with_commas(),
        stats.positive.separate_with_commas()
    );

    Ok((lookup, stats))
}

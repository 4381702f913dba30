//! Typed view of the VCF meta information header.
//!
//! Both input files declare their INFO vocabulary in `##INFO=<...>` lines.
//! The VEP-annotated file additionally declares the layout of the nested
//! `CSQ` value inside the description of its `##INFO=<ID=CSQ,...>` line, as
//! in `Description="Consequence annotations from Ensembl VEP. Format: Allele|Consequence|..."`.
//! The header is parsed once into a [`VcfMeta`] before any body line is read.

use std::io::BufRead;

use indexmap::IndexMap;

use crate::err::ParseError;

/// INFO key holding the nested VEP consequence record.
pub const CSQ_KEY: &str = "CSQ";

lazy_static::lazy_static! {
    static ref RE_INFO_LINE: regex::Regex =
        regex::Regex::new(r"^##INFO=<(.*)>\s*$").expect("invalid regex in source code");
    static ref RE_DESCRIPTION: regex::Regex =
        regex::Regex::new(r#"Description="(.*)""#).expect("invalid regex in source code");
    static ref RE_ID: regex::Regex =
        regex::Regex::new(r"(?:^|,)ID=(\w+)").expect("invalid regex in source code");
    static ref RE_NUMBER: regex::Regex =
        regex::Regex::new(r"(?:^|,)Number=([^,]+)").expect("invalid regex in source code");
    static ref RE_TYPE: regex::Regex =
        regex::Regex::new(r"(?:^|,)Type=([^,]+)").expect("invalid regex in source code");
    static ref RE_CSQ_FORMAT: regex::Regex =
        regex::Regex::new(r"Format: (.*)$").expect("invalid regex in source code");
}

/// Description of one INFO field as declared in the header.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InfoDescription {
    /// INFO key
    pub id: String,
    /// declared cardinality, e.g. `1` or `.`
    pub number: Option<String>,
    /// declared value type, e.g. `Float`
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// free text description
    pub description: String,
}

impl InfoDescription {
    /// Parse a `##INFO=<...>` line; other lines yield `Ok(None)`.
    pub fn parse(line_no: usize, line: &str) -> Result<Option<Self>, ParseError> {
        let body = if let Some(captures) = RE_INFO_LINE.captures(line) {
            captures.get(1).map(|m| m.as_str()).unwrap_or_default()
        } else {
            return Ok(None);
        };
        let malformed = || ParseError::MalformedInfoHeader {
            line_no,
            line: line.to_string(),
        };

        let description = RE_DESCRIPTION.captures(body).ok_or_else(malformed)?;
        let description_match = description.get(0).ok_or_else(malformed)?;
        // ID, Number and Type precede the description in well-formed headers.
        let head = &body[..description_match.start()];
        let capture = |re: &regex::Regex| {
            re.captures(head)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        Ok(Some(Self {
            id: capture(&RE_ID).ok_or_else(malformed)?,
            number: capture(&RE_NUMBER),
            ty: capture(&RE_TYPE),
            description: description
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }))
    }
}

/// Split the `Format: a|b|c` declaration in a CSQ description into field names.
pub fn parse_csq_format(description: &str) -> Option<Vec<String>> {
    RE_CSQ_FORMAT.captures(description).and_then(|c| c.get(1)).map(|m| {
        m.as_str()
            .trim()
            .split('|')
            .map(|s| s.to_string())
            .collect()
    })
}

/// Schema information recovered from the meta information lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfMeta {
    /// Declared INFO fields in header order.
    pub info: IndexMap<String, InfoDescription>,
    /// Field names of the nested `CSQ` value, if declared.
    pub csq_fields: Option<Vec<String>>,
}

impl VcfMeta {
    /// Register one `##` meta line; only `##INFO` lines are interpreted.
    pub fn push_meta_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let info = match InfoDescription::parse(line_no, line)? {
            Some(info) => info,
            None => return Ok(()),
        };

        if info.id == CSQ_KEY {
            if self.csq_fields.is_some() {
                return Err(ParseError::DuplicateCsqFormat { line_no });
            }
            let fields =
                parse_csq_format(&info.description).ok_or(ParseError::MalformedInfoHeader {
                    line_no,
                    line: line.to_string(),
                })?;
            tracing::debug!("CSQ format declares {} fields", fields.len());
            self.csq_fields = Some(fields);
        }

        self.info.insert(info.id.clone(), info);
        Ok(())
    }

    /// Return the declared CSQ field names or fail for a CSQ value at `line_no`.
    pub fn csq_fields(&self, line_no: usize) -> Result<&[String], ParseError> {
        self.csq_fields
            .as_deref()
            .ok_or(ParseError::MissingCsqFormat { line_no })
    }
}

/// Result of reading the header section of a VCF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub meta: VcfMeta,
    /// Number of lines consumed, including the `#CHROM` line.
    pub lines_read: usize,
}

/// Strip the line terminator from a line read with `read_line`.
pub fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Read meta lines and the `#CHROM` line from `reader`.
///
/// The reader is left positioned at the first body line.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<Header, anyhow::Error> {
    let mut meta = VcfMeta::default();
    let mut buf = String::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            anyhow::bail!(ParseError::MissingColumnHeader {
                line_no: line_no + 1
            });
        }
        line_no += 1;

        let line = trim_line_end(&buf);
        if line.starts_with("##") {
            meta.push_meta_line(line_no, line)?;
        } else if line.starts_with('#') {
            tracing::debug!(
                "read {} INFO declarations from {} header lines",
                meta.info.len(),
                line_no
            );
            return Ok(Header {
                meta,
                lines_read: line_no,
            });
        } else {
            anyhow::bail!(ParseError::MissingColumnHeader { line_no });
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::err::ParseError;

    use super::{InfoDescription, VcfMeta};

    const CSQ_LINE: &str = "##INFO=<ID=CSQ,Number=.,Type=String,Description=\"Consequence \
        annotations from Ensembl VEP. Format: Allele|Consequence|IMPACT|SYMBOL\">";

    #[test]
    fn parse_info_line() -> Result<(), anyhow::Error> {
        let info = InfoDescription::parse(
            1,
            "##INFO=<ID=AF_ESP,Number=1,Type=Float,Description=\"allele frequencies from GO-ESP\">",
        )?;
        assert_eq!(
            info,
            Some(InfoDescription {
                id: String::from("AF_ESP"),
                number: Some(String::from("1")),
                ty: Some(String::from("Float")),
                description: String::from("allele frequencies from GO-ESP"),
            })
        );
        Ok(())
    }

    #[test]
    fn parse_info_line_description_with_commas() -> Result<(), anyhow::Error> {
        let info = InfoDescription::parse(
            3,
            "##INFO=<ID=CLNREVSTAT,Number=.,Type=String,Description=\"ClinVar review status, \
             e.g. ID=1, for the Variation ID\">",
        )?
        .expect("is an INFO line");
        assert_eq!(info.id, "CLNREVSTAT");
        assert_eq!(
            info.description,
            "ClinVar review status, e.g. ID=1, for the Variation ID"
        );
        Ok(())
    }

    #[rstest::rstest]
    #[case("##fileformat=VCFv4.1")]
    #[case("##FILTER=<ID=PASS,Description=\"All filters passed\">")]
    #[case("##contig=<ID=1>")]
    fn parse_non_info_line(#[case] line: &str) -> Result<(), anyhow::Error> {
        assert_eq!(InfoDescription::parse(1, line)?, None);
        Ok(())
    }

    #[test]
    fn parse_info_line_without_description() {
        let line = "##INFO=<ID=AF_ESP,Number=1,Type=Float>";
        assert_eq!(
            InfoDescription::parse(5, line),
            Err(ParseError::MalformedInfoHeader {
                line_no: 5,
                line: line.to_string()
            })
        );
    }

    #[test]
    fn csq_format() {
        assert_eq!(
            super::parse_csq_format("Consequence annotations. Format: Allele|Consequence|IMPACT"),
            Some(vec![
                String::from("Allele"),
                String::from("Consequence"),
                String::from("IMPACT")
            ])
        );
        assert_eq!(super::parse_csq_format("no declaration here"), None);
    }

    #[test]
    fn meta_captures_csq_once() -> Result<(), anyhow::Error> {
        let mut meta = VcfMeta::default();
        meta.push_meta_line(1, CSQ_LINE)?;
        assert_eq!(
            meta.csq_fields(10)?,
            &["Allele", "Consequence", "IMPACT", "SYMBOL"]
        );
        assert!(meta.info.contains_key("CSQ"));

        assert_eq!(
            meta.push_meta_line(2, CSQ_LINE),
            Err(ParseError::DuplicateCsqFormat { line_no: 2 })
        );
        Ok(())
    }

    #[test]
    fn meta_without_csq() {
        let meta = VcfMeta::default();
        assert_eq!(
            meta.csq_fields(42),
            Err(ParseError::MissingCsqFormat { line_no: 42 })
        );
    }

    #[test]
    fn read_header_stops_at_chrom_line() -> Result<(), anyhow::Error> {
        let text = format!(
            "##fileformat=VCFv4.1\n\
             ##INFO=<ID=AF_ESP,Number=1,Type=Float,Description=\"allele frequencies from GO-ESP\">\n\
             {}\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             1\t100\t12345\tG\tA\t.\t.\tAF_ESP=0.1\n",
            CSQ_LINE
        );
        let mut reader = std::io::Cursor::new(text.into_bytes());
        let header = super::read_header(&mut reader)?;

        assert_eq!(header.lines_read, 4);
        assert_eq!(
            header.meta.info.keys().collect::<Vec<_>>(),
            vec!["AF_ESP", "CSQ"]
        );

        let mut rest = String::new();
        std::io::Read::read_to_string(&mut reader, &mut rest)?;
        assert_eq!(rest, "1\t100\t12345\tG\tA\t.\t.\tAF_ESP=0.1\n");

        Ok(())
    }

    #[rstest::rstest]
    #[case("##fileformat=VCFv4.1\n")]
    #[case("##fileformat=VCFv4.1\n1\t100\t1\tG\tA\t.\t.\t.\n")]
    fn read_header_requires_chrom_line(#[case] text: &str) {
        let mut reader = std::io::Cursor::new(text.as_bytes().to_vec());
        assert!(super::read_header(&mut reader).is_err());
    }
}

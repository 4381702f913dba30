//! Common, IO-related code.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder, Compression};

/// Leading bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether the buffered data of `reader` starts with the gzip magic bytes.
fn starts_with_gzip_magic<R: BufRead>(reader: &mut R) -> std::io::Result<bool> {
    Ok(reader.fill_buf()?.starts_with(&GZIP_MAGIC))
}

/// Open a file for reading, decompressing it if its content is gzip.
///
/// The decision is made on the leading bytes, not on the file name, so
/// `.bgz` files or objects stored without extension are handled as well.
pub fn open_read_maybe_gz<P>(path: P) -> Result<Box<dyn BufRead>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())
        .map_err(|e| anyhow::anyhow!("could not open {:?} for reading: {}", path.as_ref(), e))?;
    let mut reader = BufReader::new(file);
    let is_gzip = starts_with_gzip_magic(&mut reader)
        .map_err(|e| anyhow::anyhow!("could not read from {:?}: {}", path.as_ref(), e))?;
    if is_gzip {
        tracing::trace!("Reading {:?} as gzip", path.as_ref());
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        tracing::trace!("Reading {:?} as plain text", path.as_ref());
        Ok(Box::new(reader))
    }
}

/// Open a file for writing, compressing when the name ends in `.gz`.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())
        .map_err(|e| anyhow::anyhow!("could not open {:?} for writing: {}", path.as_ref(), e))?;
    if path.as_ref().extension().map(|s| s.to_str()) == Some(Some("gz")) {
        tracing::trace!("Opening {:?} as gzip for writing", path.as_ref());
        let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        Ok(Box::new(encoder))
    } else {
        tracing::trace!("Opening {:?} as plain text for writing", path.as_ref());
        Ok(Box::new(BufWriter::new(file)))
    }
}

#[cfg(test)]
mod test {
    use std::io::{BufRead, Write};

    use flate2::{write::GzEncoder, Compression};
    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case("test.txt")]
    #[case("test.txt.gz")]
    fn write_then_read_maybe_gz(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();

        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join(filename))?;
            f.write_all(b"##fileformat=VCFv4.1\nline two\n")?;
            f.flush()?;
        }

        let lines = super::open_read_maybe_gz(tmp_dir.join(filename))?
            .lines()
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(lines, vec!["##fileformat=VCFv4.1", "line two"]);

        Ok(())
    }

    #[test]
    fn gz_output_has_gzip_magic() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        {
            let mut f = super::open_write_maybe_gz(tmp_dir.join("x.gz"))?;
            f.write_all(b"x")?;
        }
        let buf = std::fs::read(tmp_dir.join("x.gz"))?;
        assert_eq!(&buf[..2], &[0x1f, 0x8b]);

        Ok(())
    }

    #[rstest::rstest]
    #[case("clinvar.vcf.bgz")]
    #[case("clinvar")]
    #[case("clinvar.vcf")]
    fn gzip_detected_by_content(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"##fileformat=VCFv4.1\n")?;
        std::fs::write(tmp_dir.join(filename), encoder.finish()?)?;

        let lines = super::open_read_maybe_gz(tmp_dir.join(filename))?
            .lines()
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(lines, vec!["##fileformat=VCFv4.1"]);

        Ok(())
    }

    #[test]
    fn plain_text_with_gz_name_is_read_plain() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        std::fs::write(tmp_dir.join("plain.vcf.gz"), "#CHROM\n")?;

        let lines = super::open_read_maybe_gz(tmp_dir.join("plain.vcf.gz"))?
            .lines()
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(lines, vec!["#CHROM"]);

        Ok(())
    }

    #[test]
    fn empty_file_is_read_plain() -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        std::fs::write(tmp_dir.join("empty"), "")?;

        let lines = super::open_read_maybe_gz(tmp_dir.join("empty"))?
            .lines()
            .collect::<Result<Vec<_>, _>>()?;

        assert!(lines.is_empty());

        Ok(())
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(super::open_read_maybe_gz("tests/does-not-exist.vcf.gz").is_err());
    }
}

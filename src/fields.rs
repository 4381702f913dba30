//! Splitting of delimited `KEY=VALUE` lists and positional name/value zipping.

use crate::err::ParseError;

/// Split a single INFO token into key and value.
///
/// The token must contain exactly one `=`.  Flags without a value and values
/// that contain a second `=` cannot be represented in the output table and
/// are rejected.
pub fn split_key_value(token: &str) -> Result<(&str, &str), ParseError> {
    match token.split_once('=') {
        Some((key, value)) if !value.contains('=') => Ok((key, value)),
        _ => Err(ParseError::MalformedInfoToken {
            token: token.to_string(),
        }),
    }
}

/// Split a `;`-separated INFO column into `(key, value)` pairs in file order.
///
/// The VCF missing value `.` yields no pairs.
pub fn split_info(column: &str) -> Result<Vec<(&str, &str)>, ParseError> {
    if column.is_empty() || column == "." {
        return Ok(Vec::new());
    }
    column.split(';').map(split_key_value).collect()
}

/// Pair declared `names` with `delimiter`-separated `values` by position.
///
/// Surplus names or values on either side are ignored.
pub fn zip_fields<'a, 'b, S>(
    names: &'a [S],
    values: &'b str,
    delimiter: char,
) -> impl Iterator<Item = (&'a str, &'b str)>
where
    S: AsRef<str>,
{
    names
        .iter()
        .map(|name| name.as_ref())
        .zip(values.split(delimiter))
}

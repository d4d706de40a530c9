use crate::error::TravelSheetError;
use crate::helpers::text;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use csv::ErrorKind;
use csv::ReaderBuilder;
use encoding_rs::Encoding;

/// Parses a headerless comma-separated template.
///
/// # Arguments
/// * `name` - Template name used in error messages
/// * `bytes` - Raw file content
/// * `fallback` - Encoding used when the content carries no byte order mark
///
/// # Returns
/// The template as a rectangular sheet; rows of unequal width are malformed
pub(crate) fn read_csv_template(name: &str, bytes: &[u8], fallback: &'static Encoding) -> Result<Sheet, TravelSheetError> {
    let content = text::decode(bytes, fallback).map_err(|error| SpreadsheetError::TemplateMalformed {
        name: name.to_owned(),
        reason: error.to_string(),
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(content.as_bytes());
    let mut rows = Vec::<Vec<String>>::new();
    for result in reader.records() {
        let record = result.map_err(|error| {
            let reason = match error.kind() {
                ErrorKind::UnequalLengths { pos, expected_len, len } => format!(
                    "row {} has {} columns, expected {}",
                    pos.as_ref().map(|pos| pos.record() + 1).unwrap_or(rows.len() as u64 + 1),
                    len,
                    expected_len
                ),
                _ => error.to_string(),
            };
            SpreadsheetError::TemplateMalformed { name: name.to_owned(), reason }
        })?;
        rows.push(record.iter().map(str::to_owned).collect());
    }
    Ok(Sheet::new(name, rows)?)
}

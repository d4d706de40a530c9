use crate::export::ExportError;
use crate::export::ExportFormat;
use crate::helpers::text::TextEncoding;
use crate::spreadsheet::Sheet;
use csv::QuoteStyle;
use csv::Terminator;
use csv::WriterBuilder;

/// Serializes a sheet as headerless comma-separated text.
///
/// Values are quoted only when they contain a delimiter, quote or line break;
/// records end with `\n`. The text is then transcoded to `encoding`.
pub(crate) fn encode_csv(sheet: &Sheet, encoding: TextEncoding) -> Result<Vec<u8>, ExportError> {
    let failure = |message: String| ExportError::EncodingFailure {
        format: ExportFormat::Csv,
        message,
    };
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in sheet.rows() {
        writer.write_record(row).map_err(|error| failure(error.to_string()))?;
    }
    let bytes = writer.into_inner().map_err(|error| failure(error.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|error| failure(error.to_string()))?;
    encoding.encode(&text).map_err(|error| failure(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::text::UTF8_BOM;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();
        Sheet::new("out.csv", rows).unwrap()
    }

    #[test]
    fn default_encoding_starts_with_bom() {
        let bytes = encode_csv(&sheet(&[&["国内移動届", ""]]), TextEncoding::default()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(&bytes[UTF8_BOM.len()..], "国内移動届,\n".as_bytes());
    }

    #[test]
    fn quotes_only_when_needed() {
        let bytes = encode_csv(
            &sheet(&[&["plain", "a,b", "say \"hi\"", "two\nlines"]]),
            TextEncoding::Utf8,
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "plain,\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"\n"
        );
    }

    #[test]
    fn cjk_survives_round_trip() {
        let original = sheet(&[&["日付", "出発地（県）"], &["2024-05-01", "長野県"]]);
        let bytes = encode_csv(&original, TextEncoding::Utf8Bom).unwrap();
        let decoded = crate::spreadsheet::csv::read_csv_template("out.csv", &bytes, encoding_rs::UTF_8).unwrap();
        assert_eq!(decoded.rows(), original.rows());
    }

    #[test]
    fn legacy_code_page() {
        let bytes = encode_csv(&sheet(&[&["氏名"]]), TextEncoding::CodePage(932)).unwrap();
        let (expected, _, _) = encoding_rs::SHIFT_JIS.encode("氏名\n");
        assert_eq!(bytes, expected.into_owned());

        let error = encode_csv(&sheet(&[&["Jambo 🌍"]]), TextEncoding::CodePage(932)).unwrap_err();
        assert!(matches!(error, ExportError::EncodingFailure { format: ExportFormat::Csv, .. }));
    }
}

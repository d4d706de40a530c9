use crate::export::ExportError;
use crate::export::ExportFormat;
use crate::spreadsheet::Sheet;
use rust_xlsxwriter::Workbook;

/// Characters Excel does not allow in sheet names
const ILLEGAL_SHEET_NAME_CHARACTERS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Maximum sheet name length in characters
const SHEET_NAME_MAX_LENGTH: usize = 31;

/// Makes a name acceptable as an Excel sheet name.
pub(crate) fn sanitize_sheet_name(name: &str) -> String {
    let name = name.replace(ILLEGAL_SHEET_NAME_CHARACTERS, "_");
    let name = name.trim().trim_matches('\'');
    if name.is_empty() {
        return "Sheet1".to_owned();
    }
    name.chars().take(SHEET_NAME_MAX_LENGTH).collect()
}

/// Serializes a sheet as a single-worksheet workbook.
///
/// Every non-empty cell is written as a string, so values keep their literal
/// form; empty cells stay blank.
pub(crate) fn encode_xlsx(sheet: &Sheet, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let failure = |message: String| ExportError::EncodingFailure {
        format: ExportFormat::Xlsx,
        message,
    };
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sanitize_sheet_name(sheet_name))
        .map_err(|error| failure(error.to_string()))?;
    for (row, cells) in sheet.rows().iter().enumerate() {
        let row = u32::try_from(row).map_err(|_| failure(format!("row {row} exceeds the worksheet limit")))?;
        for (col, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = u16::try_from(col).map_err(|_| failure(format!("column {col} exceeds the worksheet limit")))?;
            worksheet
                .write_string(row, col, value)
                .map_err(|error| failure(error.to_string()))?;
        }
    }
    workbook.save_to_buffer().map_err(|error| failure(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::TemplateLoader;
    use crate::spreadsheet::TemplateSource;

    #[test]
    fn sheet_names_follow_excel_rules() {
        assert_eq!(sanitize_sheet_name("国内移動届"), "国内移動届");
        assert_eq!(sanitize_sheet_name("a/b:c*d?"), "a_b_c_d_");
        assert_eq!(sanitize_sheet_name("  "), "Sheet1");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).chars().count(), 31);
    }

    #[test]
    fn workbook_reads_back_as_the_same_cells() {
        let rows = vec![
            vec!["国内移動届".to_owned(), String::new(), "007".to_owned()],
            vec![String::new(), String::new(), String::new()],
            vec!["2024-05-01".to_owned(), "=SUM(A1)".to_owned(), String::new()],
        ];
        let original = Sheet::new("out.xlsx", rows).unwrap();
        let bytes = encode_xlsx(&original, "国内移動届").unwrap();

        let source = TemplateSource::Memory {
            name: "out.xlsx".to_owned(),
            bytes,
        };
        let read_back = TemplateLoader::new("templates").load(&source).unwrap();
        for (row, cells) in original.rows().iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                assert_eq!(read_back.get(row, col).unwrap_or_default(), value, "cell ({row}, {col})");
            }
        }
    }
}

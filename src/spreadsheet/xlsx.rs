//! Reader for single-sheet XLSX templates.
//!
//! Only what a template needs is decoded: cell positions and their literal
//! text. Styles, merged ranges and formulas (beyond their cached value) are
//! not read.
use crate::error::ResultMessage;
use crate::error::TravelSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::PartReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::WORKBOOK_PART;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::name::QName;
use tracing::debug;
use zip::ZipArchive;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

const SHARED_STRING: QName = QName(b"si");
const PHONETIC_RUN: QName = QName(b"rPh");
const TEXT: QName = QName(b"t");
const WORKSHEET_ENTRY: QName = QName(b"sheet");
const ROW: QName = QName(b"row");
const CELL: QName = QName(b"c");
const INLINE_STRING: QName = QName(b"is");
const VALUE: QName = QName(b"v");
const DIMENSION: QName = QName(b"dimension");

/// Worksheet listed in the workbook, resolved to its archive part
struct WorksheetEntry {
    name: String,
    part: String,
}

pub(crate) struct XlsxTemplate {
    pub(crate) name: String,
    zip: ZipArchive<UnifiedReader>,
    /// In workbook order; never empty
    worksheets: Vec<WorksheetEntry>,
}

impl XlsxTemplate {
    /// Opens the container and resolves its worksheet list.
    ///
    /// # Arguments
    /// * `name` - Template name used in error messages
    /// * `reader` - Reader over the container bytes
    pub(crate) fn open(name: &str, reader: UnifiedReader) -> Result<XlsxTemplate, TravelSheetError> {
        let mut zip = excel::open(name, reader)?;
        let worksheets = list_worksheets(&mut zip).with_prefix(WORKBOOK_PART)?;
        if worksheets.is_empty() {
            Err(SpreadsheetError::TemplateMalformed {
                name: name.to_owned(),
                reason: "workbook has no worksheets".to_owned(),
            })?
        }
        Ok(XlsxTemplate {
            name: name.to_owned(),
            zip,
            worksheets,
        })
    }

    /// Reads the first worksheet into a dense sheet. Later worksheets are
    /// ignored.
    pub(crate) fn read_first_sheet(&mut self) -> Result<Sheet, TravelSheetError> {
        let shared_strings = self.shared_strings().with_prefix(SHARED_STRINGS_PART)?;
        let first = &self.worksheets[0];
        let (sheet_name, part) = (first.name.clone(), first.part.clone());
        if self.worksheets.len() > 1 {
            debug!(template = %self.name, sheet = %sheet_name, ignored = self.worksheets.len() - 1, "reading first worksheet only");
        }
        let cursor = self.walk_worksheet(&part).with_prefix(&part)?;
        Ok(Sheet::from_cells(&self.name, &cursor.cells, &shared_strings, cursor.extent)?)
    }

    /// Shared string table; a workbook without one has only inline text
    fn shared_strings(&mut self) -> Result<Vec<String>, TravelSheetError> {
        let mut table = Vec::new();
        let Some(mut reader) = self.zip.xml_reader(SHARED_STRINGS_PART)? else {
            return Ok(table);
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == SHARED_STRING => {
                table.push(read_text(&mut reader, SHARED_STRING, TextScope::RunsOnly)?);
            }
        });
        Ok(table)
    }

    fn walk_worksheet(&mut self, part: &str) -> Result<WorksheetCursor, TravelSheetError> {
        let mut reader = self
            .zip
            .xml_reader(part)?
            .ok_or_else(|| SpreadsheetError::ContainerPartError(part.to_owned()))?;
        let mut cursor = WorksheetCursor::default();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == DIMENSION => cursor.declare_dimension(&event)?,
            Event::Start(event) if event.name() == ROW => cursor.enter_row(&event)?,
            Event::End(event) if event.name() == ROW => cursor.leave_row(),
            Event::Start(event) if event.name() == CELL => cursor.enter_cell(&event)?,
            Event::Start(event) if event.name() == INLINE_STRING => {
                cursor.value = read_text(&mut reader, INLINE_STRING, TextScope::RunsOnly)?;
            }
            Event::Start(event) if event.name() == VALUE => {
                cursor.value = read_text(&mut reader, VALUE, TextScope::Whole)?;
            }
            Event::End(event) if event.name() == CELL => cursor.leave_cell(),
        });
        Ok(cursor)
    }
}

/// Position tracking while walking `<sheetData>`.
///
/// Rows and cells may omit their `r` attribute, in which case they follow
/// the previous one. Blank cells are not kept but still widen `extent`, so
/// styled empty rows and columns at the edge of a form survive.
#[derive(Default)]
struct WorksheetCursor {
    cells: Vec<Cell>,
    /// (rows, columns) covered by `<dimension>`, rows and cells, blank ones included
    extent: (usize, usize),
    /// Rows seen so far, counting gaps left by explicit row numbers
    rows_seen: usize,
    /// Zero-based index of the open `<row>`, when it carries one
    row_index: Option<usize>,
    /// Column following the last cell of the open row
    next_col: usize,
    row: usize,
    col: usize,
    kind: CellType,
    value: String,
}

impl WorksheetCursor {
    /// `<dimension ref="A1:Q49"/>`; the bottom-right corner bounds the used range
    fn declare_dimension(&mut self, dimension: &BytesStart) -> Result<(), TravelSheetError> {
        let corner = dimension
            .get_attribute_value("ref")?
            .and_then(|range| range.rsplit(':').next().and_then(reference_to_index));
        if let Some((row, col)) = corner {
            self.widen(row, col);
        }
        Ok(())
    }

    fn widen(&mut self, row: usize, col: usize) {
        self.extent.0 = self.extent.0.max(row.saturating_add(1));
        self.extent.1 = self.extent.1.max(col.saturating_add(1));
    }

    fn enter_row(&mut self, row: &BytesStart) -> Result<(), TravelSheetError> {
        self.row_index = row
            .get_attribute_value("r")?
            .and_then(|number| number.parse::<usize>().ok())
            .and_then(|number| number.checked_sub(1));
        self.next_col = 0;
        Ok(())
    }

    fn leave_row(&mut self) {
        self.rows_seen = match self.row_index.take() {
            Some(index) => index.saturating_add(1),
            None => self.rows_seen.saturating_add(1),
        };
        self.extent.0 = self.extent.0.max(self.rows_seen);
    }

    fn enter_cell(&mut self, cell: &BytesStart) -> Result<(), TravelSheetError> {
        let fallback = (self.row_index.unwrap_or(self.rows_seen), self.next_col);
        (self.row, self.col) = cell
            .get_attribute_value("r")?
            .and_then(|reference| reference_to_index(&reference))
            .unwrap_or(fallback);
        self.next_col = self.col.saturating_add(1);
        self.widen(self.row, self.col);
        self.kind = CellType::from_attribute(cell.get_attribute_value("t")?.as_deref());
        self.value.clear();
        Ok(())
    }

    /// Keeps the cell only when it holds text
    fn leave_cell(&mut self) {
        let kind = std::mem::take(&mut self.kind);
        if self.value.is_empty() {
            return;
        }
        self.cells.push(Cell {
            row: self.row,
            col: self.col,
            kind,
            value: std::mem::take(&mut self.value),
        });
    }
}

/// Resolves `<sheet name=".." r:id=".."/>` entries through the workbook
/// relationships. Entries whose id has no worksheet target are skipped.
fn list_worksheets(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<WorksheetEntry>, TravelSheetError> {
    let targets = excel::load_relationships(zip)?;
    let mut reader = zip
        .xml_reader(WORKBOOK_PART)?
        .ok_or_else(|| SpreadsheetError::ContainerPartError(WORKBOOK_PART.to_owned()))?;
    let mut worksheets = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == WORKSHEET_ENTRY => {
            let (mut name, mut id) = (None, None);
            for attribute in event.attributes() {
                let attribute = attribute?;
                match attribute.key.local_name().as_ref() {
                    b"name" => name = Some(attribute.get_value()?.into_owned()),
                    b"id" => id = Some(attribute.get_value()?.into_owned()),
                    _ => {}
                }
            }
            let part = id.and_then(|id| targets.get(&id).cloned());
            if let (Some(name), Some(part)) = (name, part) {
                worksheets.push(WorksheetEntry { name, part });
            }
        }
    });
    Ok(worksheets)
}

/// Which character data inside an element counts as cell text
#[derive(Clone, Copy, PartialEq, Eq)]
enum TextScope {
    /// Only `<t>` runs (`<si>`, `<is>`); phonetic runs are skipped
    RunsOnly,
    /// Everything up to the end tag (`<v>`)
    Whole,
}

/// Collects the text of the element just opened, up to `end`.
fn read_text(reader: &mut PartReader<'_, UnifiedReader>, end: QName, scope: TextScope) -> Result<String, TravelSheetError> {
    let mut in_phonetic_run = false;
    let mut capturing = scope == TextScope::Whole;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end => break,
        Event::Start(event) if event.name() == PHONETIC_RUN => in_phonetic_run = true,
        Event::End(event) if event.name() == PHONETIC_RUN => in_phonetic_run = false,
        Event::Start(event) if event.name() == TEXT && !in_phonetic_run => capturing = true,
        Event::End(event) if event.name() == TEXT && capturing => capturing = scope == TextScope::Whole,
        Event::Text(event) if capturing => text.push_str(&event.xml_content()?),
        Event::CData(event) if capturing => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if capturing => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::TemplateLoader;
    use crate::spreadsheet::TemplateSource;
    use rust_xlsxwriter::Format;
    use rust_xlsxwriter::FormatBorder;
    use rust_xlsxwriter::Workbook;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn open_bytes(bytes: Vec<u8>) -> Result<Sheet, TravelSheetError> {
        XlsxTemplate::open("template.xlsx", UnifiedReader::memory(bytes))?.read_first_sheet()
    }

    #[test]
    fn reads_workbook_written_by_xlsxwriter() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("申請様式").unwrap();
        worksheet.write_string(0, 0, "国内移動届").unwrap();
        worksheet.write_string(2, 3, "Name").unwrap();
        worksheet.write_number(3, 1, 42).unwrap();
        worksheet.write_boolean(4, 4, true).unwrap();
        let second = workbook.add_worksheet();
        second.write_string(9, 9, "ignored").unwrap();
        let sheet = open_bytes(workbook.save_to_buffer().unwrap()).unwrap();

        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.column_count(), 5);
        assert_eq!(sheet.get(0, 0), Some("国内移動届"));
        assert_eq!(sheet.get(2, 3), Some("Name"));
        assert_eq!(sheet.get(3, 1), Some("42"));
        assert_eq!(sheet.get(4, 4), Some("TRUE"));
        assert_eq!(sheet.get(1, 1), Some(""));
    }

    fn container(sheet_xml: &str, shared_strings: Option<&str>) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("xl/workbook.xml", options).unwrap();
        writer.write_all(br#"<workbook xmlns:r="r"><sheets><sheet name="S" sheetId="1" r:id="rId1"/></sheets></workbook>"#).unwrap();
        writer.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        writer.write_all(br#"<Relationships><Relationship Id="rId1" Type="http://x/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#).unwrap();
        writer.start_file("xl/worksheets/sheet1.xml", options).unwrap();
        writer.write_all(sheet_xml.as_bytes()).unwrap();
        if let Some(shared_strings) = shared_strings {
            writer.start_file("xl/sharedStrings.xml", options).unwrap();
            writer.write_all(shared_strings.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn skips_phonetic_runs_and_reads_inline_strings() {
        let sheet_xml = r#"<worksheet><sheetData>
            <row r="2"><c r="B2" t="s"><v>0</v></c><c r="C2" t="inlineStr"><is><t>a&amp;b</t></is></c></row>
            <row r="4"><c r="A4" t="str"><f>B2</f><v>cached</v></c><c r="D4"/></row>
        </sheetData></worksheet>"#;
        let shared = r#"<sst><si><r><t>移動</t></r><r><t>届</t></r><rPh><t>いどう</t></rPh></si></sst>"#;
        let sheet = open_bytes(container(sheet_xml, Some(shared))).unwrap();

        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.column_count(), 4);
        assert_eq!(sheet.get(3, 3), Some(""));
        assert_eq!(sheet.get(1, 1), Some("移動届"));
        assert_eq!(sheet.get(1, 2), Some("a&b"));
        assert_eq!(sheet.get(3, 0), Some("cached"));
    }

    #[test]
    fn cells_without_reference_follow_row_order() {
        let sheet_xml = r#"<worksheet><sheetData>
            <row><c t="inlineStr"><is><t>a</t></is></c><c t="inlineStr"><is><t>b</t></is></c></row>
            <row><c><v>1</v></c></row>
        </sheetData></worksheet>"#;
        let sheet = open_bytes(container(sheet_xml, None)).unwrap();
        assert_eq!(sheet.rows(), [vec!["a".to_owned(), "b".to_owned()], vec!["1".to_owned(), String::new()]].as_slice());
    }

    #[test]
    fn blank_styled_cells_define_extent() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "様式").unwrap();
        worksheet.write_blank(48, 16, &Format::new().set_border(FormatBorder::Thin)).unwrap();
        let source = TemplateSource::Memory {
            name: "form.xlsx".to_owned(),
            bytes: workbook.save_to_buffer().unwrap(),
        };
        let sheet = TemplateLoader::new("templates").load(&source).unwrap();
        assert_eq!((sheet.row_count(), sheet.column_count()), (49, 17));
        assert_eq!(sheet.get(0, 0), Some("様式"));
        assert_eq!(sheet.get(48, 16), Some(""));
    }

    #[test]
    fn extent_without_dimension_comes_from_blank_cells_and_rows() {
        let sheet_xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>様式</t></is></c><c r="Q1" s="1"/></row>
            <row r="49" s="2" customFormat="1"/>
        </sheetData></worksheet>"#;
        let sheet = open_bytes(container(sheet_xml, None)).unwrap();
        assert_eq!((sheet.row_count(), sheet.column_count()), (49, 17));
    }

    #[test]
    fn dimension_larger_than_cells_is_kept() {
        let sheet_xml = r#"<worksheet><dimension ref="A1:C5"/><sheetData>
            <row r="1"><c r="A1"><v>1</v></c></row>
        </sheetData></worksheet>"#;
        let sheet = open_bytes(container(sheet_xml, None)).unwrap();
        assert_eq!((sheet.row_count(), sheet.column_count()), (5, 3));
    }

    #[test]
    fn out_of_grid_template_is_malformed() {
        for sheet_xml in [
            r#"<worksheet><sheetData><row r="1"><c r="XFD1048576"><v>1</v></c></row></sheetData></worksheet>"#,
            r#"<worksheet><sheetData><row r="4000000000"><c><v>1</v></c></row></sheetData></worksheet>"#,
        ] {
            let source = TemplateSource::Memory {
                name: "huge.xlsx".to_owned(),
                bytes: container(sheet_xml, None),
            };
            let error = TemplateLoader::new("templates").load(&source).unwrap_err();
            assert!(
                matches!(error, TravelSheetError::SpreadsheetError(SpreadsheetError::TemplateMalformed { .. })),
                "{error}"
            );
        }
    }

    #[test]
    fn missing_worksheet_part_is_an_error() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/workbook.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<workbook/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(open_bytes(bytes).is_err());
    }
}

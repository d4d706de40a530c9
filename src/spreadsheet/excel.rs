//! Container-level handling of XLSX templates: signature check and the
//! workbook relationship table.
use crate::error::TravelSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use zip::ZipArchive;

pub(super) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(super) const WORKBOOK_RELATIONSHIPS_PART: &str = "xl/_rels/workbook.xml.rels";

const WORKSHEET_RELATIONSHIP_SUFFIX: &str = "/worksheet";

/// OLE compound file magic; encrypted workbooks and legacy `.xls` files start with it
const CFB_SIGNATURE: [u8; 8] = *b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Opens the zip container of an XLSX template.
///
/// Compound files are refused up front with a readable reason instead of
/// the zip crate's "invalid archive" message.
pub(super) fn open(name: &str, mut reader: UnifiedReader) -> Result<ZipArchive<UnifiedReader>, TravelSheetError> {
    if starts_with_cfb_signature(&mut reader)? {
        Err(SpreadsheetError::TemplateMalformed {
            name: name.to_owned(),
            reason: "password protected or legacy binary workbook".to_owned(),
        })?;
    }
    Ok(ZipArchive::new(reader)?)
}

/// Reads the workbook relationship part.
///
/// # Returns
/// Relationship id to archive path, for worksheet targets only. Entries
/// without a `Type` are kept since some producers omit it.
pub(super) fn load_relationships(zip: &mut ZipArchive<UnifiedReader>) -> Result<HashMap<String, String>, TravelSheetError> {
    let mut reader = zip
        .xml_reader(WORKBOOK_RELATIONSHIPS_PART)?
        .ok_or_else(|| SpreadsheetError::ContainerPartError(WORKBOOK_RELATIONSHIPS_PART.to_owned()))?;
    let mut targets = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == b"Relationship" => {
            let is_worksheet = event
                .get_attribute_value("Type")?
                .is_none_or(|kind| kind.ends_with(WORKSHEET_RELATIONSHIP_SUFFIX));
            let id = event.get_attribute_value("Id")?;
            let target = event.get_attribute_value("Target")?;
            if let (true, Some(id), Some(target)) = (is_worksheet, id, target) {
                targets.insert(id.into_owned(), to_zip_path(&target));
            }
        }
    });
    Ok(targets)
}

/// Turns a relationship target into an archive path.
///
/// Targets are relative to `xl/` unless they start with `/`, which anchors
/// them at the archive root.
pub(crate) fn to_zip_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_owned(),
        None if target.starts_with("xl/") => target.to_owned(),
        None => format!("xl/{target}"),
    }
}

fn starts_with_cfb_signature(reader: &mut UnifiedReader) -> Result<bool, TravelSheetError> {
    let mut head = [0u8; CFB_SIGNATURE.len()];
    reader.seek(SeekFrom::Start(0))?;
    let filled = reader.read(&mut head)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(filled == head.len() && head == CFB_SIGNATURE)
}

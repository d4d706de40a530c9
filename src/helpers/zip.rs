//! Part lookup inside the XLSX container.
//!
//! Producers disagree on the case of part names and some write Windows
//! separators, so lookups compare normalized names instead of going
//! straight to `ZipArchive::by_name`.

use crate::error::TravelSheetError;
use crate::helpers::xml::XmlReader;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use zip::read::ZipFile;
use zip::result::ZipError;
use zip::ZipArchive;

/// Event reader over a single archive part
pub(crate) type PartReader<'a, RS> = XmlReader<BufReader<ZipFile<'a, RS>>>;

pub(crate) trait ZipHelper<RS: Read + Seek> {
    /// Opens the part whose normalized name equals `name`, `None` when absent
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, TravelSheetError>;

    /// Same lookup as [`ZipHelper::file`], wrapped in an XML event reader
    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<PartReader<'_, RS>>, TravelSheetError>;
}

fn same_part(left: &str, right: &str) -> bool {
    left.len() == right.len()
        && left
            .bytes()
            .zip(right.bytes())
            .all(|(a, b)| normalize(a) == normalize(b))
}

fn normalize(byte: u8) -> u8 {
    match byte {
        b'\\' => b'/',
        other => other.to_ascii_lowercase(),
    }
}

impl<RS: Read + Seek> ZipHelper<RS> for ZipArchive<RS> {
    fn file(&'_ mut self, name: &str) -> Result<Option<ZipFile<'_, RS>>, TravelSheetError> {
        let Some(stored_name) = self.file_names().find(|stored| same_part(stored, name)).map(str::to_owned) else {
            return Ok(None);
        };
        match self.by_name(&stored_name) {
            Ok(part) => Ok(Some(part)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(error) => Err(error)?,
        }
    }

    fn xml_reader(&'_ mut self, name: &str) -> Result<Option<PartReader<'_, RS>>, TravelSheetError> {
        Ok(self.file(name)?.map(|part| XmlReader::new(BufReader::new(part))))
    }
}

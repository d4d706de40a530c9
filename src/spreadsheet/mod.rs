//! # Template Loading
//!
//! This module reads the fixed-layout templates that documents are merged into.
//! Two formats are served: headerless delimited text (`.csv`, `.txt`) and
//! single-sheet Excel workbooks (`.xlsx`, `.xlsm`). Every cell is read as its
//! literal text; nothing is type-converted, so a template cell written as
//! `007` stays `007` in every generated document.
mod cell;
pub(crate) mod csv;
mod excel;
pub mod reference;
mod sheet;
mod xlsx;

pub use sheet::Sheet;

use crate::error::TravelSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::text;
use crate::helpers::text::CODE_PAGE_UTF8;
use crate::spreadsheet::xlsx::XlsxTemplate;
use encoding_rs::Encoding;
use glob::Pattern;
use serde::Deserialize;
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Name of the template compiled into the crate
pub const EMBEDDED_TEMPLATE_NAME: &str = "travel_form.csv";

/// Prefix that selects a compiled-in template instead of a file
pub const EMBEDDED_PREFIX: &str = "embedded:";

/// The default travel notification layout
const EMBEDDED_TEMPLATE: &[u8] = include_bytes!("../../templates/travel_form.csv");

/// File name patterns that count as templates when listing a directory
const TEMPLATE_PATTERNS: [&str; 4] = ["*.csv", "*.txt", "*.xlsx", "*.xlsm"];

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Template '{name}' not found, available templates: {}", display_list(.available))]
    TemplateNotFound { name: String, available: Vec<String> },

    #[error("Template '{name}' is malformed: {reason}")]
    TemplateMalformed { name: String, reason: String },

    #[error("Invalid cell value at '{reference}': {message}")]
    CellValueError { reference: String, message: String },

    #[error("Missing container part '{0}'")]
    ContainerPartError(String),
}

fn display_list(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_owned()
    } else {
        names.join(", ")
    }
}

/// Storage format of a template
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    /// Headerless comma-separated text
    Csv,
    /// Office Open XML workbook, first worksheet
    Xlsx,
}

impl TemplateFormat {
    /// Detects the format from a file name's extension.
    pub fn detect(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension().and_then(OsStr::to_str)?;
        match extension.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Where a template's bytes come from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TemplateSource {
    /// The layout compiled into the crate
    #[default]
    Embedded,
    /// A file on the local file system
    Path(PathBuf),
    /// Bytes supplied by the caller under a file-like name
    Memory { name: String, bytes: Vec<u8> },
}

impl TemplateSource {
    /// Resolves a template identifier.
    ///
    /// # Arguments
    /// * `identifier` - `embedded:<name>`, a `file://` URL, or a path
    /// * `template_dir` - Directory that relative paths are resolved against
    ///
    /// # Returns
    /// The template source; an embedded name that does not exist is not found
    pub fn parse(identifier: &str, template_dir: &Path) -> Result<Self, TravelSheetError> {
        let identifier = identifier.trim();
        if let Some(name) = identifier.strip_prefix(EMBEDDED_PREFIX) {
            if name.is_empty() || name == EMBEDDED_TEMPLATE_NAME {
                return Ok(Self::Embedded);
            }
            Err(SpreadsheetError::TemplateNotFound {
                name: identifier.to_owned(),
                available: vec![format!("{EMBEDDED_PREFIX}{EMBEDDED_TEMPLATE_NAME}")],
            })?
        }
        if UnifiedReader::is_url(identifier) {
            return Ok(Self::Path(UnifiedReader::url_to_path(identifier)?));
        }
        let path = PathBuf::from(identifier);
        if path.is_absolute() {
            Ok(Self::Path(path))
        } else {
            Ok(Self::Path(template_dir.join(path)))
        }
    }

    /// Returns the file-like name of the template
    pub fn name(&self) -> String {
        match self {
            Self::Embedded => EMBEDDED_TEMPLATE_NAME.to_owned(),
            Self::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
            Self::Memory { name, .. } => name.to_owned(),
        }
    }
}

impl Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "{EMBEDDED_PREFIX}{EMBEDDED_TEMPLATE_NAME}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Memory { name, .. } => write!(f, "{name}"),
        }
    }
}

/// Reads templates into sheets.
///
/// The loader never writes: every call reads a fresh snapshot, so a template
/// edited between two merges is picked up by the second one.
#[derive(Clone, Debug)]
pub struct TemplateLoader {
    /// Directory listed when a template is not found
    template_dir: PathBuf,
    /// Code page for delimited text without a byte order mark
    code_page: u16,
    /// Format forced by configuration instead of extension detection
    format: Option<TemplateFormat>,
}

impl TemplateLoader {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            code_page: CODE_PAGE_UTF8,
            format: None,
        }
    }

    /// Sets the code page used to decode delimited text without a byte order mark
    pub fn with_code_page(mut self, code_page: u16) -> Self {
        self.code_page = code_page;
        self
    }

    /// Forces the template format instead of detecting it by extension
    pub fn with_format(mut self, format: Option<TemplateFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Loads a template.
    ///
    /// # Arguments
    /// * `source` - The template to read
    ///
    /// # Returns
    /// The template as a rectangular sheet. A missing file is `TemplateNotFound`
    /// (listing the templates that do exist); every other failure to produce a
    /// non-empty rectangle is `TemplateMalformed`.
    pub fn load(&self, source: &TemplateSource) -> Result<Sheet, TravelSheetError> {
        let name = source.name();
        let (reader, format) = match source {
            TemplateSource::Embedded => (UnifiedReader::memory(EMBEDDED_TEMPLATE.to_vec()), Some(TemplateFormat::Csv)),
            TemplateSource::Path(path) => {
                if !path.is_file() {
                    let directory = path.parent().filter(|parent| parent.is_dir()).unwrap_or(self.template_dir.as_path());
                    Err(SpreadsheetError::TemplateNotFound {
                        name: source.to_string(),
                        available: available_templates(directory)?,
                    })?
                }
                let reader = UnifiedReader::open(path).map_err(|error| into_malformed(&name, error.into()))?;
                (reader, self.format.or_else(|| TemplateFormat::detect(&name)))
            }
            TemplateSource::Memory { bytes, .. } => {
                (UnifiedReader::memory(bytes.to_owned()), self.format.or_else(|| TemplateFormat::detect(&name)))
            }
        };
        let format = format.ok_or_else(|| SpreadsheetError::TemplateMalformed {
            name: name.to_owned(),
            reason: "unknown template format, expected .csv or .xlsx".to_owned(),
        })?;
        debug!(template = %source, ?format, "loading template");
        // An unknown code page is a configuration error, not a property of the template
        let fallback = text::encoding_for_code_page(self.code_page)?;

        let sheet = self
            .read(&name, reader, format, fallback)
            .map_err(|error| into_malformed(&name, error))?;
        if sheet.is_empty() || sheet.column_count() == 0 {
            Err(SpreadsheetError::TemplateMalformed {
                name: name.to_owned(),
                reason: "template is empty".to_owned(),
            })?
        }
        info!(template = %source, rows = sheet.row_count(), columns = sheet.column_count(), "template loaded");
        Ok(sheet)
    }

    /// Lists the templates in the template directory
    pub fn available_templates(&self) -> Result<Vec<String>, TravelSheetError> {
        available_templates(&self.template_dir)
    }

    fn read(
        &self,
        name: &str,
        mut reader: UnifiedReader,
        format: TemplateFormat,
        fallback: &'static Encoding,
    ) -> Result<Sheet, TravelSheetError> {
        match format {
            TemplateFormat::Csv => csv::read_csv_template(name, &reader.read_all()?, fallback),
            TemplateFormat::Xlsx => XlsxTemplate::open(name, reader)?.read_first_sheet(),
        }
    }
}

/// Lists template file names in a directory, sorted; a missing directory has none.
fn available_templates(directory: &Path) -> Result<Vec<String>, TravelSheetError> {
    if !directory.is_dir() {
        return Ok(vec![]);
    }
    let patterns = TEMPLATE_PATTERNS
        .iter()
        .map(|pattern| Pattern::new(pattern))
        .collect::<Result<Vec<_>, _>>()?;
    let mut names = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if patterns.iter().any(|pattern| pattern.matches(&name.to_ascii_lowercase())) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Reports any failure to open or read an existing template as malformed content
fn into_malformed(name: &str, error: TravelSheetError) -> TravelSheetError {
    match error {
        TravelSheetError::SpreadsheetError(error @ SpreadsheetError::TemplateMalformed { .. }) => error.into(),
        error => SpreadsheetError::TemplateMalformed {
            name: name.to_owned(),
            reason: error.to_string(),
        }
        .into(),
    }
}

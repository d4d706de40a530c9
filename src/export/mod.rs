//! # Document Export
//!
//! Encodes a merged form into the bytes handed back to the host: delimited
//! text (UTF-8 with byte order mark unless configured otherwise) or a
//! single-sheet workbook. Output is built in memory only; writing it anywhere
//! is the host's business.
mod csv;
mod xlsx;

use crate::error::TravelSheetError;
use crate::helpers::text::TextEncoding;
use crate::merge::MergeResult;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;
use tracing::info;

/// Default form name, used for file names and the worksheet name
pub const DEFAULT_FORM_NAME: &str = "国内移動届";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to encode {format} document: {message}")]
    EncodingFailure { format: ExportFormat, message: String },
}

/// Output document format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated text
    #[default]
    Csv,
    /// Excel workbook
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// An encoded document ready for download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub bytes: Vec<u8>,
    /// Suggested file name, `<form-name>_<YYYYMMDD>.<ext>`
    pub file_name: String,
    pub mime_type: &'static str,
}

/// Builds the suggested file name of a document.
pub fn suggested_file_name(form_name: &str, generated_on: NaiveDate, format: ExportFormat) -> String {
    let form_name = form_name
        .trim()
        .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
    format!(
        "{}_{}.{}",
        form_name,
        generated_on.format("%Y%m%d"),
        format.extension()
    )
}

/// Encodes merge results into documents
#[derive(Clone, Debug)]
pub struct Exporter {
    format: ExportFormat,
    text_encoding: TextEncoding,
    form_name: String,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportFormat::default())
    }
}

impl Exporter {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            text_encoding: TextEncoding::default(),
            form_name: DEFAULT_FORM_NAME.to_owned(),
        }
    }

    /// Sets the encoding of text output; ignored for workbooks
    pub fn with_text_encoding(mut self, text_encoding: TextEncoding) -> Self {
        self.text_encoding = text_encoding;
        self
    }

    pub fn with_form_name(mut self, form_name: impl Into<String>) -> Self {
        self.form_name = form_name.into();
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Encodes a merge result.
    ///
    /// # Arguments
    /// * `result` - The merged table, written without header row or row index
    /// * `generated_on` - Date used in the suggested file name
    ///
    /// # Returns
    /// The complete document; an encoding failure yields no bytes at all
    pub fn export(&self, result: &MergeResult, generated_on: NaiveDate) -> Result<Document, TravelSheetError> {
        let bytes = match self.format {
            ExportFormat::Csv => csv::encode_csv(result.sheet(), self.text_encoding)?,
            ExportFormat::Xlsx => xlsx::encode_xlsx(result.sheet(), &self.form_name)?,
        };
        let file_name = suggested_file_name(&self.form_name, generated_on, self.format);
        info!(file_name = %file_name, bytes = bytes.len(), "document encoded");
        Ok(Document {
            bytes,
            file_name,
            mime_type: self.format.mime_type(),
        })
    }
}

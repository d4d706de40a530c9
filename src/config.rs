//! Configuration types and loading
use crate::error::TravelSheetError;
use crate::export::ExportFormat;
use crate::export::Exporter;
use crate::export::DEFAULT_FORM_NAME;
use crate::helpers::text;
use crate::helpers::text::TextEncoding;
use crate::helpers::text::CODE_PAGE_UTF8;
use crate::merge::MergeEngine;
use crate::merge::TimeFormat;
use crate::session::Session;
use crate::spreadsheet::TemplateFormat;
use crate::spreadsheet::TemplateLoader;
use crate::spreadsheet::TemplateSource;
use crate::spreadsheet::EMBEDDED_PREFIX;
use crate::spreadsheet::EMBEDDED_TEMPLATE_NAME;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "travel-sheet.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError { path: PathBuf, source: std::io::Error },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError { path: PathBuf, source: serde_yaml::Error },

    #[error("Invalid value for '{key}' in config file '{path}': {message}")]
    InvalidValue { path: PathBuf, key: &'static str, message: String },
}

/// Engine configuration; every field has a default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template identifier: `embedded:<name>`, a `file://` URL, or a path
    pub template: String,

    /// Directory relative template paths resolve against
    pub template_dir: PathBuf,

    /// Template format; detected from the extension when absent
    pub template_format: Option<TemplateFormat>,

    /// Code page of delimited-text templates without byte order mark
    pub template_codepage: u16,

    pub output_format: ExportFormat,

    /// Encoding of delimited-text output
    pub text_encoding: TextEncoding,

    pub time_format: TimeFormat,

    /// Form name used in file names and as the worksheet name
    pub form_name: String,

    /// Accepted form titles
    pub form_titles: Vec<String>,

    /// Log level filter, e.g. "info" or "travel_sheet=debug"
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: format!("{EMBEDDED_PREFIX}{EMBEDDED_TEMPLATE_NAME}"),
            template_dir: PathBuf::from("templates"),
            template_format: None,
            template_codepage: CODE_PAGE_UTF8,
            output_format: ExportFormat::default(),
            text_encoding: TextEncoding::default(),
            time_format: TimeFormat::default(),
            form_name: DEFAULT_FORM_NAME.to_owned(),
            form_titles: vec![DEFAULT_FORM_NAME.to_owned()],
            log_level: None,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, `travel-sheet.yml` in the
    /// working directory is used when present, defaults otherwise.
    pub fn load(config_path: Option<&Path>) -> Result<Self, TravelSheetError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }
        let local_config = Path::new(DEFAULT_CONFIG_FILE);
        if local_config.is_file() {
            return Self::load_from_file(local_config);
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, TravelSheetError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_owned(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_owned(),
            source,
        })?;
        text::encoding_for_code_page(config.template_codepage).map_err(|error| ConfigError::InvalidValue {
            path: path.to_owned(),
            key: "template_codepage",
            message: error.to_string(),
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn template_loader(&self) -> TemplateLoader {
        TemplateLoader::new(&self.template_dir)
            .with_code_page(self.template_codepage)
            .with_format(self.template_format)
    }

    /// Resolves a template identifier, the configured one when `None`
    pub fn template_source(&self, identifier: Option<&str>) -> Result<TemplateSource, TravelSheetError> {
        TemplateSource::parse(identifier.unwrap_or(self.template.as_str()), &self.template_dir)
    }

    pub fn merge_engine(&self) -> Result<MergeEngine, TravelSheetError> {
        Ok(MergeEngine::new(self.template_loader(), self.template_source(None)?).with_time_format(self.time_format))
    }

    /// Builds the exporter, optionally overriding the configured output format
    pub fn exporter(&self, format: Option<ExportFormat>) -> Exporter {
        Exporter::new(format.unwrap_or(self.output_format))
            .with_text_encoding(self.text_encoding)
            .with_form_name(&self.form_name)
    }

    pub fn session(&self) -> Session {
        Session::new(self.form_titles.clone())
    }
}

//! # Template Merge
//!
//! Produces a finished form from a template: header values are written into
//! their bound cells, then the reserved itinerary rows are replaced by one row
//! per leg. The merge is a pure function of its inputs; [`MergeEngine`] only
//! adds loading and layout validation of the template.
mod header;
mod result;
mod splice;

pub use header::merge_header;
pub use result::MergeResult;
pub use splice::splice_itinerary;

use crate::error::TravelSheetError;
use crate::form::FieldRecord;
use crate::form::FormLayout;
use crate::form::ItineraryRecord;
use crate::spreadsheet::Sheet;
use crate::spreadsheet::TemplateLoader;
use crate::spreadsheet::TemplateSource;
use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Rendering of every date written into a form
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Missing required field '{field}'")]
    MissingRequiredField { field: &'static str },

    #[error("Itinerary entry {} is missing '{field}'", .index + 1)]
    IncompleteItineraryRecord { index: usize, field: &'static str },
}

/// Rendering of departure and arrival times
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeFormat {
    /// `HH:MM`
    #[default]
    #[serde(rename = "hh:mm")]
    HourMinute,
    /// `HH:MM:SS`
    #[serde(rename = "hh:mm:ss")]
    HourMinuteSecond,
}

impl TimeFormat {
    pub fn format(&self, time: &NaiveTime) -> String {
        match self {
            Self::HourMinute => time.format("%H:%M").to_string(),
            Self::HourMinuteSecond => time.format("%H:%M:%S").to_string(),
        }
    }
}

/// Merges header values and itinerary legs into a template.
///
/// # Arguments
/// * `template` - The unmodified template
/// * `layout` - Header bindings and itinerary region, validated against `template` first
/// * `fields` - Applicant values
/// * `records` - Legs in output order
/// * `generated_on` - Date written into the generation date cell
/// * `time_format` - Rendering of times
///
/// # Returns
/// The finished table, or the first error; no partial result is ever returned
pub fn merge_template(
    template: &Sheet,
    layout: &FormLayout,
    fields: &FieldRecord,
    records: &[ItineraryRecord],
    generated_on: NaiveDate,
    time_format: TimeFormat,
) -> Result<MergeResult, TravelSheetError> {
    layout.validate(template)?;
    let sheet = merge_header(template, &layout.header, fields, generated_on)?;
    let result = splice_itinerary(sheet, &layout.region, records, time_format)?;
    info!(
        template = template.name(),
        header = result.header_rows(),
        itinerary = result.itinerary_rows(),
        footer = result.footer_rows(),
        "template merged"
    );
    Ok(result)
}

/// Loads a template and merges input records into it, once per call.
#[derive(Clone, Debug)]
pub struct MergeEngine {
    loader: TemplateLoader,
    source: TemplateSource,
    layout: FormLayout,
    time_format: TimeFormat,
}

impl MergeEngine {
    pub fn new(loader: TemplateLoader, source: TemplateSource) -> Self {
        Self {
            loader,
            source,
            layout: FormLayout::STANDARD,
            time_format: TimeFormat::default(),
        }
    }

    pub fn with_layout(mut self, layout: FormLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn loader(&self) -> &TemplateLoader {
        &self.loader
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Loads the template and checks the layout against it
    pub fn load_template(&self) -> Result<Sheet, TravelSheetError> {
        let template = self.loader.load(&self.source)?;
        self.layout.validate(&template)?;
        Ok(template)
    }

    /// Merges records into a freshly loaded template
    pub fn merge(
        &self,
        fields: &FieldRecord,
        records: &[ItineraryRecord],
        generated_on: NaiveDate,
    ) -> Result<MergeResult, TravelSheetError> {
        let template = self.loader.load(&self.source)?;
        merge_template(&template, &self.layout, fields, records, generated_on, self.time_format)
    }
}

//! # Session
//!
//! Host-owned state between user actions: the applicant values, the leg
//! currently being edited, and the legs added so far. A successful generate
//! hands out one document and starts a fresh itinerary; a failed one keeps
//! everything so the user can correct the input and retry.
use crate::error::TravelSheetError;
use crate::export::Document;
use crate::export::Exporter;
use crate::form::record::present;
use crate::form::FieldRecord;
use crate::form::ItineraryRecord;
use crate::merge::MergeEngine;
use crate::merge::DATE_FORMAT;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No itinerary entries added, add at least one leg before generating")]
    NoItineraryEntries,

    #[error("Invalid value for '{field}': {message}")]
    InvalidFieldValue { field: &'static str, message: String },

    #[error("Itinerary entry {} does not exist ({count} recorded)", .index + 1)]
    EntryNotFound { index: usize, count: usize },
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    /// Accepted form titles; empty accepts any title
    form_titles: Vec<String>,
    fields: FieldRecord,
    draft: ItineraryRecord,
    itinerary: Vec<ItineraryRecord>,
}

impl Session {
    pub fn new(form_titles: Vec<String>) -> Self {
        Self {
            form_titles,
            ..Default::default()
        }
    }

    pub fn fields(&self) -> &FieldRecord {
        &self.fields
    }

    /// Replaces the applicant values.
    ///
    /// Values that are present must be valid: the form title must be one of
    /// the accepted titles and the trip may not end before it starts. Missing
    /// values are accepted here and reported when generating.
    pub fn set_fields(&mut self, mut fields: FieldRecord) -> Result<(), TravelSheetError> {
        // The title is matched and written without surrounding whitespace
        fields.form_title = fields.form_title.map(|title| title.trim().to_owned());
        if let Some(title) = present(&fields.form_title) {
            if !self.form_titles.is_empty() && !self.form_titles.iter().any(|it| it == title) {
                Err(SessionError::InvalidFieldValue {
                    field: "form_title",
                    message: format!("'{}' is not one of: {}", title, self.form_titles.join(", ")),
                })?
            }
        }
        if let (Some(start), Some(end)) = (fields.start_date, fields.end_date) {
            if end < start {
                Err(SessionError::InvalidFieldValue {
                    field: "end_date",
                    message: format!(
                        "{} is before the start date {}",
                        end.format(DATE_FORMAT),
                        start.format(DATE_FORMAT)
                    ),
                })?
            }
        }
        self.fields = fields;
        Ok(())
    }

    /// The leg being edited
    pub fn draft(&self) -> &ItineraryRecord {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ItineraryRecord {
        &mut self.draft
    }

    /// Exchanges departure and arrival of the draft; the itinerary is untouched
    pub fn swap_draft_endpoints(&mut self) {
        self.draft.swap_endpoints();
    }

    /// Appends a copy of the draft to the itinerary, returning the new entry count
    pub fn add_draft(&mut self) -> usize {
        self.add_entry(self.draft.clone())
    }

    /// Appends a leg to the itinerary, returning the new entry count
    pub fn add_entry(&mut self, record: ItineraryRecord) -> usize {
        self.itinerary.push(record);
        self.itinerary.len()
    }

    /// Removes a leg by position
    pub fn remove_entry(&mut self, index: usize) -> Result<ItineraryRecord, SessionError> {
        if index >= self.itinerary.len() {
            return Err(SessionError::EntryNotFound {
                index,
                count: self.itinerary.len(),
            });
        }
        Ok(self.itinerary.remove(index))
    }

    /// Legs added so far, in output order
    pub fn entries(&self) -> &[ItineraryRecord] {
        &self.itinerary
    }

    /// Merges and encodes the current input.
    ///
    /// # Arguments
    /// * `engine` - Template merge engine
    /// * `exporter` - Document encoder
    /// * `generated_on` - Generation date written into the form and file name
    ///
    /// # Returns
    /// The finished document. The itinerary is cleared only on success.
    pub fn generate(
        &mut self,
        engine: &MergeEngine,
        exporter: &Exporter,
        generated_on: NaiveDate,
    ) -> Result<Document, TravelSheetError> {
        if self.itinerary.is_empty() {
            warn!("generate requested without itinerary entries");
            Err(SessionError::NoItineraryEntries)?
        }
        let result = engine.merge(&self.fields, &self.itinerary, generated_on)?;
        let document = exporter.export(&result, generated_on)?;
        info!(entries = self.itinerary.len(), file_name = %document.file_name, "document generated");
        self.itinerary.clear();
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::sample_fields;
    use crate::merge::tests::sample_leg;
    use crate::spreadsheet::TemplateLoader;
    use crate::spreadsheet::TemplateSource;

    fn engine() -> MergeEngine {
        MergeEngine::new(TemplateLoader::new("templates"), TemplateSource::Embedded)
    }

    fn session() -> Session {
        let mut session = Session::new(vec!["国内移動届".to_owned()]);
        session.set_fields(sample_fields()).unwrap();
        session
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
    }

    #[test]
    fn empty_itinerary_is_a_correctable_warning() {
        let mut session = session();
        let error = session.generate(&engine(), &Exporter::default(), today()).unwrap_err();
        assert!(matches!(error, TravelSheetError::SessionError(SessionError::NoItineraryEntries)));
        assert!(error.is_user_correctable());
    }

    #[test]
    fn successful_generate_clears_itinerary() {
        let mut session = session();
        assert_eq!(session.add_entry(sample_leg(0)), 1);
        assert_eq!(session.add_entry(sample_leg(1)), 2);
        let document = session.generate(&engine(), &Exporter::default(), today()).unwrap();
        assert_eq!(document.file_name, "国内移動届_20240430.csv");
        assert!(session.entries().is_empty());
        assert_eq!(session.fields(), &sample_fields());
    }

    #[test]
    fn failed_generate_keeps_itinerary() {
        let mut session = session();
        let mut incomplete = sample_leg(1);
        incomplete.arrival_time = None;
        session.add_entry(sample_leg(0));
        session.add_entry(incomplete);

        let error = session.generate(&engine(), &Exporter::default(), today()).unwrap_err();
        assert!(error.is_user_correctable());
        assert!(error.to_string().contains("entry 2"));
        assert_eq!(session.entries().len(), 2);
    }

    #[test]
    fn swapped_draft_is_added_as_swapped() {
        let mut session = session();
        *session.draft_mut() = sample_leg(0);
        session.add_draft();
        session.swap_draft_endpoints();
        session.add_draft();

        let entries = session.entries();
        assert_eq!(entries[0].departure_county.as_deref(), Some("Nairobi"));
        assert_eq!(entries[1].departure_county.as_deref(), Some("Nyeri"));
        assert_eq!(entries[1].arrival_town.as_deref(), Some("Westlands"));
        assert_eq!(session.draft().departure_town.as_deref(), Some("Karatina"));

        let document = session.generate(&engine(), &Exporter::default(), today()).unwrap();
        let text = String::from_utf8_lossy(&document.bytes);
        assert!(text.contains("2024-05-01,Nyeri,Karatina,Nairobi,Westlands,"));
    }

    #[test]
    fn invalid_field_values_are_rejected() {
        let mut session = session();
        let mut fields = sample_fields();
        fields.form_title = Some("海外渡航届".to_owned());
        let error = session.set_fields(fields).unwrap_err();
        assert!(error.is_user_correctable());
        assert!(error.to_string().contains("form_title"));

        let mut fields = sample_fields();
        fields.end_date = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(session.set_fields(fields).is_err());
        assert_eq!(session.fields(), &sample_fields());
    }

    #[test]
    fn padded_form_title_is_written_trimmed() {
        let mut session = session();
        let mut fields = sample_fields();
        fields.form_title = Some(" 国内移動届\u{3000}".to_owned());
        session.set_fields(fields).unwrap();
        assert_eq!(session.fields().form_title.as_deref(), Some("国内移動届"));

        let result = engine().merge(session.fields(), &[sample_leg(0)], today()).unwrap();
        assert_eq!(result.sheet().get(6, 4), Some("国内移動届"));
    }

    #[test]
    fn remove_entry_by_position() {
        let mut session = session();
        session.add_entry(sample_leg(0));
        session.add_entry(sample_leg(1));
        let removed = session.remove_entry(0).unwrap();
        assert_eq!(removed, sample_leg(0));
        assert_eq!(session.entries(), &[sample_leg(1)]);
        assert!(matches!(
            session.remove_entry(5),
            Err(SessionError::EntryNotFound { index: 5, count: 1 })
        ));
    }
}

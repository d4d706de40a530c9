use thiserror::Error;

/// Main error type for the travel sheet engine.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum TravelSheetError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    TextHelperError(#[from] crate::helpers::text::TextError),

    #[error("{0}")]
    UnifiedReaderError(#[from] crate::helpers::reader::UnifiedReaderError),

    // Domain module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    LayoutError(#[from] crate::form::LayoutError),

    #[error("{0}")]
    MergeError(#[from] crate::merge::MergeError),

    #[error("{0}")]
    ExportError(#[from] crate::export::ExportError),

    #[error("{0}")]
    SessionError(#[from] crate::session::SessionError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl TravelSheetError {
    /// Whether the host should present this error as a correctable warning
    /// (bad or missing input) rather than a failure of the template or encoder.
    pub fn is_user_correctable(&self) -> bool {
        use crate::merge::MergeError;
        use crate::session::SessionError;
        matches!(
            self,
            Self::MergeError(MergeError::MissingRequiredField { .. })
                | Self::MergeError(MergeError::IncompleteItineraryRecord { .. })
                | Self::SessionError(SessionError::NoItineraryEntries)
                | Self::SessionError(SessionError::InvalidFieldValue { .. })
        )
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, TravelSheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| TravelSheetError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeError;
    use crate::session::SessionError;
    use crate::spreadsheet::SpreadsheetError;

    #[test]
    fn user_correctable_classification() {
        assert!(TravelSheetError::from(SessionError::NoItineraryEntries).is_user_correctable());
        assert!(TravelSheetError::from(MergeError::MissingRequiredField { field: "applicant_name" })
            .is_user_correctable());
        assert!(!TravelSheetError::from(SpreadsheetError::TemplateNotFound {
            name: "missing.csv".to_owned(),
            available: vec![],
        })
        .is_user_correctable());
    }

    #[test]
    fn with_prefix_keeps_message() {
        let result: Result<(), TravelSheetError> =
            Err(SessionError::NoItineraryEntries.into());
        let message = result.with_prefix("generate").unwrap_err().to_string();
        assert!(message.starts_with("generate: "));
        assert!(message.contains("itinerary"));
    }
}

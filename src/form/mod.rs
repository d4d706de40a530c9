//! # Form Layout
//!
//! The travel notification form is a fixed layout: header values live at
//! hard-coded cells and the itinerary occupies a reserved block of rows.
//! This module names those coordinates and checks them against a loaded
//! template before anything is written into it.
pub mod record;

pub use record::FieldRecord;
pub use record::ItineraryRecord;

use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::Sheet;
use std::fmt::Display;
use thiserror::Error;

/// Number of cells an itinerary row occupies before padding
pub const ITINERARY_ROW_WIDTH: usize = 13;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Field '{field}' at {reference} is outside the {rows}x{columns} template")]
    BindingOutOfBounds {
        field: HeaderField,
        reference: String,
        rows: usize,
        columns: usize,
    },

    #[error("Field '{field}' at {reference} must lie above the itinerary region starting at row {start}")]
    BindingInsideRegion {
        field: HeaderField,
        reference: String,
        start: usize,
    },

    #[error("Itinerary region rows {start}..{end} overrun the template of {rows} rows")]
    RegionOutOfBounds { start: usize, end: usize, rows: usize },

    #[error("Template has {columns} columns, an itinerary row needs {required}")]
    TemplateTooNarrow { columns: usize, required: usize },
}

/// Semantic fields written into the form header
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeaderField {
    FormTitle,
    GenerationDate,
    ApplicantName,
    TripPurpose,
    MainDestination,
    StartDate,
    EndDate,
    EmergencyContact,
}

impl HeaderField {
    /// Field name as used in trip files and error messages
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FormTitle => "form_title",
            Self::GenerationDate => "generation_date",
            Self::ApplicantName => "applicant_name",
            Self::TripPurpose => "trip_purpose",
            Self::MainDestination => "main_destination",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::EmergencyContact => "emergency_contact",
        }
    }
}

impl Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A header field bound to a zero-indexed cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldBinding {
    pub field: HeaderField,
    pub row: usize,
    pub col: usize,
}

impl FieldBinding {
    pub const fn new(field: HeaderField, row: usize, col: usize) -> Self {
        Self { field, row, col }
    }

    /// Returns the Excel-style reference of the bound cell
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }
}

/// Coordinates of every header field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderFieldMap {
    bindings: &'static [FieldBinding],
}

impl HeaderFieldMap {
    /// Cell positions of the travel notification form (国内移動届)
    pub const STANDARD: Self = Self::new(&[
        FieldBinding::new(HeaderField::FormTitle, 6, 4),
        FieldBinding::new(HeaderField::GenerationDate, 8, 13),
        FieldBinding::new(HeaderField::ApplicantName, 11, 13),
        FieldBinding::new(HeaderField::TripPurpose, 24, 2),
        FieldBinding::new(HeaderField::MainDestination, 25, 2),
        FieldBinding::new(HeaderField::StartDate, 26, 2),
        FieldBinding::new(HeaderField::EndDate, 26, 4),
        FieldBinding::new(HeaderField::EmergencyContact, 32, 7),
    ]);

    pub const fn new(bindings: &'static [FieldBinding]) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &'static [FieldBinding] {
        self.bindings
    }

    /// Finds the binding of a field
    pub fn get(&self, field: HeaderField) -> Option<&'static FieldBinding> {
        self.bindings.iter().find(|binding| binding.field == field)
    }
}

/// Rows reserved for itinerary entries in the unmodified template
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItineraryRegion {
    /// First reserved row (zero-indexed)
    pub start: usize,
    /// Number of reserved rows
    pub count: usize,
}

impl ItineraryRegion {
    pub const STANDARD: Self = Self { start: 37, count: 6 };

    /// Row index just after the region
    pub const fn end(&self) -> usize {
        self.start + self.count
    }
}

/// Complete layout of a form: header bindings and itinerary region
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormLayout {
    pub header: HeaderFieldMap,
    pub region: ItineraryRegion,
}

impl Default for FormLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl FormLayout {
    pub const STANDARD: Self = Self {
        header: HeaderFieldMap::STANDARD,
        region: ItineraryRegion::STANDARD,
    };

    /// Checks the layout against a loaded template.
    ///
    /// Header cells must exist and lie above the itinerary region, so that
    /// header writes never touch rows that are replaced or carried as footer.
    /// The region must fit inside the template, and rows must be wide enough
    /// for an itinerary entry.
    pub fn validate(&self, template: &Sheet) -> Result<(), LayoutError> {
        let rows = template.row_count();
        let columns = template.column_count();
        for binding in self.header.bindings() {
            if !template.contains(binding.row, binding.col) {
                Err(LayoutError::BindingOutOfBounds {
                    field: binding.field,
                    reference: binding.reference(),
                    rows,
                    columns,
                })?
            }
            if binding.row >= self.region.start {
                Err(LayoutError::BindingInsideRegion {
                    field: binding.field,
                    reference: binding.reference(),
                    start: self.region.start,
                })?
            }
        }
        if self.region.end() > rows {
            Err(LayoutError::RegionOutOfBounds {
                start: self.region.start,
                end: self.region.end(),
                rows,
            })?
        }
        if columns < ITINERARY_ROW_WIDTH {
            Err(LayoutError::TemplateTooNarrow {
                columns,
                required: ITINERARY_ROW_WIDTH,
            })?
        }
        Ok(())
    }
}

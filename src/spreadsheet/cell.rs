use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;

/// Types of stored cell values in XLSX worksheets.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as "0"/"1"
    Boolean,
    /// Numeric values, kept in their stored textual form
    Number,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values and cached formula strings
    InlineString,
    /// Shared string table references
    SharedString,
    /// Cached error values ("#N/A", "#REF!", ...)
    Error,
}

impl CellType {
    /// Maps the `t` attribute of a `<c>` element to a cell type.
    pub(crate) fn from_attribute(kind: Option<&str>) -> Self {
        match kind {
            Some("inlineStr") | Some("str") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("d") => Self::IsoDateTime,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }
}

/// Represents a single cell in a spreadsheet with position, type, and value.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data type
    pub(crate) kind: CellType,
    /// Cell value as stored
    pub(crate) value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the literal text of the cell.
    ///
    /// Values are opaque: numbers keep their stored digits and dates are not
    /// reformatted. Only indirections (shared strings) and booleans are rendered.
    pub(crate) fn to_text(&self, shared_strings: &[String]) -> Result<String, SpreadsheetError> {
        match self.kind {
            CellType::SharedString => {
                let index = self.value.trim().parse::<usize>().ok();
                index
                    .and_then(|index| shared_strings.get(index))
                    .cloned()
                    .ok_or_else(|| SpreadsheetError::CellValueError {
                        reference: self.reference(),
                        message: format!("shared string '{}' does not exist", self.value),
                    })
            }
            CellType::Boolean => Ok(if self.value == "1" { "TRUE" } else { "FALSE" }.to_owned()),
            CellType::Empty => Ok(String::new()),
            _ => Ok(self.value.to_owned()),
        }
    }
}

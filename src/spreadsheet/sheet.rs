use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;

/// Rows of the largest worksheet Excel writes
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Columns of the largest worksheet Excel writes (`XFD`)
pub(crate) const MAX_COLUMNS: usize = 16_384;

/// Cells a template rectangle may span once densified
pub(crate) const MAX_TEMPLATE_CELLS: usize = 1 << 20;

/// Rejects a rectangle that lies outside Excel's grid or is too large to densify
fn check_size(name: &str, row_count: usize, column_count: usize) -> Result<(), SpreadsheetError> {
    let reason = if row_count > MAX_ROWS || column_count > MAX_COLUMNS {
        format!("template extends to row {row_count}, column {column_count}, beyond the worksheet grid")
    } else if row_count.saturating_mul(column_count) > MAX_TEMPLATE_CELLS {
        format!("template spans {row_count} x {column_count} cells, more than {MAX_TEMPLATE_CELLS}")
    } else {
        return Ok(());
    };
    Err(SpreadsheetError::TemplateMalformed {
        name: name.to_owned(),
        reason,
    })
}

/// A headerless, rectangular table of string cells.
///
/// Every row holds exactly `column_count` cells. Templates, merged tables and
/// export input all share this shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sheet {
    /// Name of the source (file name or resource name)
    pub(crate) name: String,
    /// Cells in row-major order
    pub(crate) rows: Vec<Vec<String>>,
    /// Width shared by every row
    pub(crate) column_count: usize,
}

impl Sheet {
    /// Creates a sheet from rows, rejecting ragged input.
    pub fn new(name: &str, rows: Vec<Vec<String>>) -> Result<Self, SpreadsheetError> {
        let column_count = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != column_count) {
            Err(SpreadsheetError::TemplateMalformed {
                name: name.to_owned(),
                reason: format!(
                    "row {} has {} columns, expected {}",
                    index + 1,
                    row.len(),
                    column_count
                ),
            })?
        }
        Ok(Self {
            name: name.to_owned(),
            rows,
            column_count,
        })
    }

    /// Builds a dense sheet from sparse cells.
    ///
    /// The rectangle always starts at A1 so that cell coordinates stay
    /// absolute; missing cells become empty strings. `extent` is the
    /// (rows, columns) the worksheet declares, blank cells included; the
    /// sheet is never smaller than it or than the cells themselves.
    pub(crate) fn from_cells(
        name: &str,
        cells: &[Cell],
        shared_strings: &[String],
        extent: (usize, usize),
    ) -> Result<Self, SpreadsheetError> {
        let row_count = cells.iter().map(|cell| cell.row.saturating_add(1)).fold(extent.0, usize::max);
        let column_count = cells.iter().map(|cell| cell.col.saturating_add(1)).fold(extent.1, usize::max);
        check_size(name, row_count, column_count)?;
        let mut rows = vec![vec![String::new(); column_count]; row_count];
        for cell in cells {
            rows[cell.row][cell.col] = cell.to_text(shared_strings)?;
        }
        Ok(Self {
            name: name.to_owned(),
            rows,
            column_count,
        })
    }

    /// Returns the name of the source
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns shared by all rows
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Returns true if the sheet has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns all rows
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Consumes the sheet, returning its rows
    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Gets the cell text at the specified position, None when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|record| record.get(col)).map(String::as_str)
    }

    /// Checks if (row, col) addresses a cell of this sheet.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows.len() && col < self.column_count
    }

    /// Overwrites the cell at (row, col). Returns false when out of bounds.
    pub(crate) fn set(&mut self, row: usize, col: usize, value: String) -> bool {
        match self.rows.get_mut(row).and_then(|record| record.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }
}

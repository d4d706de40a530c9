use crate::spreadsheet::Sheet;

/// A merged document: header rows, itinerary rows and footer rows in one sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeResult {
    sheet: Sheet,
    header_rows: usize,
    itinerary_rows: usize,
    footer_rows: usize,
}

impl MergeResult {
    pub(crate) fn new(sheet: Sheet, header_rows: usize, itinerary_rows: usize, footer_rows: usize) -> Self {
        debug_assert_eq!(sheet.row_count(), header_rows + itinerary_rows + footer_rows);
        Self {
            sheet,
            header_rows,
            itinerary_rows,
            footer_rows,
        }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn into_sheet(self) -> Sheet {
        self.sheet
    }

    pub fn rows(&self) -> &[Vec<String>] {
        self.sheet.rows()
    }

    pub fn row_count(&self) -> usize {
        self.sheet.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.sheet.column_count()
    }

    pub fn header_rows(&self) -> usize {
        self.header_rows
    }

    pub fn itinerary_rows(&self) -> usize {
        self.itinerary_rows
    }

    pub fn footer_rows(&self) -> usize {
        self.footer_rows
    }

    /// Rows above the itinerary block
    pub fn header(&self) -> &[Vec<String>] {
        &self.rows()[..self.header_rows]
    }

    /// Injected itinerary rows
    pub fn itinerary(&self) -> &[Vec<String>] {
        &self.rows()[self.header_rows..self.header_rows + self.itinerary_rows]
    }

    /// Rows carried over from below the template's reserved region
    pub fn footer(&self) -> &[Vec<String>] {
        &self.rows()[self.header_rows + self.itinerary_rows..]
    }
}

//! Conversions between zero-based (row, column) indexes and Excel-style references ("A1").

use regex::Regex;
use std::sync::LazyLock;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Z]{1,3})\$?([0-9]{1,7})$").expect("Hardcode regex pattern"));

/// Converts column letters ("A", "AB") to a zero-based column index.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |index, letter| {
        letter
            .is_ascii_uppercase()
            .then(|| index * 26 + (letter as usize - 'A' as usize + 1))
    }).map(|index| index - 1)
}

/// Converts a one-based row number ("1") to a zero-based row index.
pub(crate) fn row_to_index(digits: &str) -> Option<usize> {
    digits.parse::<usize>().ok().and_then(|row| row.checked_sub(1))
}

/// Converts an Excel-style reference ("N12", "$N$12") to zero-based (row, column) indexes.
pub fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.trim().to_ascii_uppercase();
    let captures = REFERENCE_PATTERN.captures(&reference)?;
    let col = col_to_index(captures.get(1)?.as_str())?;
    let row = row_to_index(captures.get(2)?.as_str())?;
    Some((row, col))
}

/// Converts zero-based (row, column) indexes to an Excel-style reference.
pub fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::<char>::new();
    let mut column = col + 1;
    while column > 0 {
        column -= 1;
        letters.push((b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_round_trip_for_form_coordinates() {
        assert_eq!(index_to_reference(6, 4), "E7");
        assert_eq!(index_to_reference(11, 13), "N12");
        assert_eq!(index_to_reference(0, 26), "AA1");
        assert_eq!(reference_to_index("E7"), Some((6, 4)));
        assert_eq!(reference_to_index("$n$12"), Some((11, 13)));
        assert_eq!(reference_to_index("AA1"), Some((0, 26)));
    }

    #[test]
    fn invalid_references() {
        assert_eq!(reference_to_index(""), None);
        assert_eq!(reference_to_index("A0"), None);
        assert_eq!(reference_to_index("12"), None);
        assert_eq!(reference_to_index("A1:B2"), None);
        assert_eq!(col_to_index(""), None);
        assert_eq!(row_to_index("0"), None);
    }
}

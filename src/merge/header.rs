use crate::error::TravelSheetError;
use crate::form::record::present;
use crate::form::FieldRecord;
use crate::form::HeaderField;
use crate::form::HeaderFieldMap;
use crate::form::LayoutError;
use crate::merge::MergeError;
use crate::merge::DATE_FORMAT;
use crate::spreadsheet::Sheet;
use chrono::NaiveDate;

/// Writes header values into a copy of the template.
///
/// # Arguments
/// * `template` - The unmodified template; never mutated
/// * `map` - Cell bindings of the header fields
/// * `fields` - Applicant values
/// * `generated_on` - Date written into the generation date cell
///
/// # Returns
/// A new sheet in which exactly the bound cells differ from the template.
/// All values are resolved before the first write, so a missing field leaves
/// nothing half-written.
pub fn merge_header(
    template: &Sheet,
    map: &HeaderFieldMap,
    fields: &FieldRecord,
    generated_on: NaiveDate,
) -> Result<Sheet, TravelSheetError> {
    let values = map
        .bindings()
        .iter()
        .map(|binding| Ok((binding, field_value(fields, binding.field, generated_on)?)))
        .collect::<Result<Vec<_>, MergeError>>()?;

    let mut sheet = template.clone();
    for (binding, value) in values {
        if !sheet.set(binding.row, binding.col, value) {
            Err(LayoutError::BindingOutOfBounds {
                field: binding.field,
                reference: binding.reference(),
                rows: template.row_count(),
                columns: template.column_count(),
            })?
        }
    }
    Ok(sheet)
}

/// Renders the value of a header field
fn field_value(fields: &FieldRecord, field: HeaderField, generated_on: NaiveDate) -> Result<String, MergeError> {
    let missing = || MergeError::MissingRequiredField { field: field.name() };
    let text = |value: &Option<String>| present(value).map(str::to_owned).ok_or_else(missing);
    let date = |value: Option<NaiveDate>| {
        value
            .map(|date| date.format(DATE_FORMAT).to_string())
            .ok_or_else(missing)
    };
    match field {
        HeaderField::FormTitle => text(&fields.form_title),
        HeaderField::GenerationDate => Ok(generated_on.format(DATE_FORMAT).to_string()),
        HeaderField::ApplicantName => text(&fields.applicant_name),
        HeaderField::TripPurpose => text(&fields.trip_purpose),
        HeaderField::MainDestination => text(&fields.main_destination),
        HeaderField::StartDate => date(fields.start_date),
        HeaderField::EndDate => date(fields.end_date),
        HeaderField::EmergencyContact => text(&fields.emergency_contact),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::sample_fields;
    use crate::merge::tests::standard_template;

    #[test]
    fn writes_bound_cells_only() {
        let template = standard_template();
        let generated_on = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let sheet = merge_header(&template, &HeaderFieldMap::STANDARD, &sample_fields(), generated_on).unwrap();

        assert_eq!(sheet.get(6, 4), Some("国内移動届"));
        assert_eq!(sheet.get(8, 13), Some("2024-04-30"));
        assert_eq!(sheet.get(11, 13), Some("山田 太郎"));
        assert_eq!(sheet.get(24, 2), Some("Field survey"));
        assert_eq!(sheet.get(25, 2), Some("Nyeri"));
        assert_eq!(sheet.get(26, 2), Some("2024-05-01"));
        assert_eq!(sheet.get(26, 4), Some("2024-05-03"));
        assert_eq!(sheet.get(32, 7), Some("+254 700 000 000"));

        let bound = |row: usize, col: usize| {
            HeaderFieldMap::STANDARD
                .bindings()
                .iter()
                .any(|binding| binding.row == row && binding.col == col)
        };
        for (row, (merged, original)) in sheet.rows().iter().zip(template.rows()).enumerate() {
            for (col, (merged, original)) in merged.iter().zip(original).enumerate() {
                if !bound(row, col) {
                    assert_eq!(merged, original, "cell ({row}, {col}) changed");
                }
            }
        }
    }

    #[test]
    fn merge_is_idempotent_apart_from_generation_date() {
        let template = standard_template();
        let first = merge_header(
            &template,
            &HeaderFieldMap::STANDARD,
            &sample_fields(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        )
        .unwrap();
        let second = merge_header(
            &template,
            &HeaderFieldMap::STANDARD,
            &sample_fields(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        )
        .unwrap();
        let differences = (0..template.row_count())
            .flat_map(|row| (0..template.column_count()).map(move |col| (row, col)))
            .filter(|&(row, col)| first.get(row, col) != second.get(row, col))
            .collect::<Vec<_>>();
        assert_eq!(differences, vec![(8, 13)]);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let template = standard_template();
        let mut fields = sample_fields();
        fields.emergency_contact = Some("   ".to_owned());
        let error = merge_header(
            &template,
            &HeaderFieldMap::STANDARD,
            &fields,
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(
            error,
            TravelSheetError::MergeError(MergeError::MissingRequiredField { field: "emergency_contact" })
        ));

        fields = sample_fields();
        fields.start_date = None;
        let error = merge_header(
            &template,
            &HeaderFieldMap::STANDARD,
            &fields,
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        )
        .unwrap_err();
        assert!(error.to_string().contains("start_date"));
    }
}

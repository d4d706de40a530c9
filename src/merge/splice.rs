use crate::error::TravelSheetError;
use crate::form::record::present;
use crate::form::ItineraryRecord;
use crate::form::ItineraryRegion;
use crate::form::LayoutError;
use crate::form::ITINERARY_ROW_WIDTH;
use crate::merge::result::MergeResult;
use crate::merge::MergeError;
use crate::merge::TimeFormat;
use crate::merge::DATE_FORMAT;
use crate::spreadsheet::Sheet;

/// Replaces the template's reserved itinerary rows with one row per record.
///
/// # Arguments
/// * `sheet` - The header-merged template
/// * `region` - Rows reserved in the unmodified template
/// * `records` - Legs in output order; any count, including zero
/// * `time_format` - Rendering of departure and arrival times
///
/// # Returns
/// The rows above the region, the injected rows, and the template rows after
/// the region, in that order. Every injected row is padded to the template
/// width. An incomplete record aborts the splice before any row is built.
pub fn splice_itinerary(
    sheet: Sheet,
    region: &ItineraryRegion,
    records: &[ItineraryRecord],
    time_format: TimeFormat,
) -> Result<MergeResult, TravelSheetError> {
    let total = sheet.row_count();
    let width = sheet.column_count();
    if region.end() > total {
        Err(LayoutError::RegionOutOfBounds {
            start: region.start,
            end: region.end(),
            rows: total,
        })?
    }
    if width < ITINERARY_ROW_WIDTH {
        Err(LayoutError::TemplateTooNarrow {
            columns: width,
            required: ITINERARY_ROW_WIDTH,
        })?
    }

    let injected = records
        .iter()
        .enumerate()
        .map(|(index, record)| itinerary_row(index, record, width, time_format))
        .collect::<Result<Vec<_>, MergeError>>()?;

    let name = sheet.name().to_owned();
    let mut rows = sheet.into_rows();
    let footer = rows.split_off(region.end());
    rows.truncate(region.start);

    let (header_rows, itinerary_rows, footer_rows) = (rows.len(), injected.len(), footer.len());
    rows.extend(injected);
    rows.extend(footer);
    Ok(MergeResult::new(
        Sheet::new(&name, rows)?,
        header_rows,
        itinerary_rows,
        footer_rows,
    ))
}

/// Builds the cells of one leg, padded with empty cells to `width`.
///
/// Column order: date, departure county, departure town, arrival county,
/// arrival town, destination detail, transport, flight number (unused),
/// departure time, arrival time, hotel name and phone, spacer, hotel map link.
fn itinerary_row(
    index: usize,
    record: &ItineraryRecord,
    width: usize,
    time_format: TimeFormat,
) -> Result<Vec<String>, MergeError> {
    let missing = |field: &'static str| MergeError::IncompleteItineraryRecord { index, field };
    let text = |value: &Option<String>, field: &'static str| {
        present(value).map(str::to_owned).ok_or_else(|| missing(field))
    };
    let optional = |value: &Option<String>| present(value).unwrap_or_default().to_owned();

    let date = record
        .date
        .map(|date| date.format(DATE_FORMAT).to_string())
        .ok_or_else(|| missing("date"))?;
    let departure_time = record
        .departure_time
        .map(|time| time_format.format(&time))
        .ok_or_else(|| missing("departure_time"))?;
    let arrival_time = record
        .arrival_time
        .map(|time| time_format.format(&time))
        .ok_or_else(|| missing("arrival_time"))?;

    let mut row = vec![
        date,
        text(&record.departure_county, "departure_county")?,
        text(&record.departure_town, "departure_town")?,
        text(&record.arrival_county, "arrival_county")?,
        text(&record.arrival_town, "arrival_town")?,
        text(&record.destination_detail, "destination_detail")?,
        text(&record.transport, "transport")?,
        String::new(),
        departure_time,
        arrival_time,
        optional(&record.hotel_name_tel),
        String::new(),
        optional(&record.hotel_map_link),
    ];
    row.resize(width.max(ITINERARY_ROW_WIDTH), String::new());
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::tests::sample_leg;
    use crate::merge::tests::standard_template;

    #[test]
    fn row_count_law_and_width_invariant() {
        let template = standard_template();
        let region = ItineraryRegion::STANDARD;
        for count in [0, 1, region.count, region.count + 5] {
            let records = (0..count).map(sample_leg).collect::<Vec<_>>();
            let result = splice_itinerary(template.clone(), &region, &records, TimeFormat::HourMinute).unwrap();

            assert_eq!(result.header_rows(), region.start);
            assert_eq!(result.itinerary_rows(), count);
            assert_eq!(result.footer_rows(), template.row_count() - region.end());
            assert_eq!(result.row_count(), result.header_rows() + count + result.footer_rows());
            assert_eq!(
                result.header_rows() + region.count + result.footer_rows(),
                template.row_count()
            );
            assert!(result.rows().iter().all(|row| row.len() == template.column_count()));
            assert_eq!(result.header(), &template.rows()[..region.start]);
            assert_eq!(result.footer(), &template.rows()[region.end()..]);
            assert_eq!(result.rows()[region.start + count..], template.rows()[region.end()..]);
        }
    }

    #[test]
    fn footer_is_preserved_byte_for_byte() {
        let template = standard_template();
        let region = ItineraryRegion::STANDARD;
        let records = (0..3).map(sample_leg).collect::<Vec<_>>();
        let result = splice_itinerary(template.clone(), &region, &records, TimeFormat::HourMinute).unwrap();
        assert_eq!(result.footer(), &template.rows()[region.end()..]);
        assert_eq!(result.header(), &template.rows()[..region.start]);
    }

    #[test]
    fn itinerary_row_layout() {
        let mut record = sample_leg(0);
        record.hotel_map_link = None;
        let row = itinerary_row(0, &record, 17, TimeFormat::HourMinute).unwrap();
        assert_eq!(row.len(), 17);
        assert_eq!(
            row[..13],
            [
                "2024-05-01",
                "Nairobi",
                "Westlands",
                "Nyeri",
                "Karatina",
                "Field office",
                "Matatu",
                "",
                "08:15",
                "11:40",
                "Kiama River Hotel +254725200665",
                "",
                "",
            ]
        );
        assert!(row[13..].iter().all(String::is_empty));

        let row = itinerary_row(0, &record, 17, TimeFormat::HourMinuteSecond).unwrap();
        assert_eq!(row[8], "08:15:00");
    }

    #[test]
    fn incomplete_record_aborts_whole_splice() {
        let mut records = (0..3).map(sample_leg).collect::<Vec<_>>();
        records[2].transport = Some(String::new());
        let error = splice_itinerary(
            standard_template(),
            &ItineraryRegion::STANDARD,
            &records,
            TimeFormat::HourMinute,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            TravelSheetError::MergeError(MergeError::IncompleteItineraryRecord { index: 2, field: "transport" })
        ));
    }

    #[test]
    fn region_must_fit_template() {
        let template = Sheet::new("short.csv", vec![vec![String::new(); 17]; 40]).unwrap();
        let error = splice_itinerary(template, &ItineraryRegion::STANDARD, &[], TimeFormat::HourMinute).unwrap_err();
        assert!(matches!(error, TravelSheetError::LayoutError(LayoutError::RegionOutOfBounds { .. })));
    }
}

use chrono::NaiveDate;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use std::mem;

/// Applicant values for the form header.
///
/// Fields the host failed to collect are `None`; whitespace-only text counts
/// as missing as well.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRecord {
    /// One of the configured form titles
    pub form_title: Option<String>,
    pub trip_purpose: Option<String>,
    pub main_destination: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub applicant_name: Option<String>,
    /// Phone number, free text
    pub emergency_contact: Option<String>,
}

/// One leg of the trip.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItineraryRecord {
    pub date: Option<NaiveDate>,
    pub departure_county: Option<String>,
    pub departure_town: Option<String>,
    pub arrival_county: Option<String>,
    pub arrival_town: Option<String>,
    pub destination_detail: Option<String>,
    pub transport: Option<String>,
    #[serde(with = "time_of_day")]
    pub departure_time: Option<NaiveTime>,
    #[serde(with = "time_of_day")]
    pub arrival_time: Option<NaiveTime>,
    /// Optional: a leg without an overnight stay has no hotel
    pub hotel_name_tel: Option<String>,
    /// Optional
    pub hotel_map_link: Option<String>,
}

impl ItineraryRecord {
    /// Exchanges departure and arrival locations (county and town).
    pub fn swap_endpoints(&mut self) {
        mem::swap(&mut self.departure_county, &mut self.arrival_county);
        mem::swap(&mut self.departure_town, &mut self.arrival_town);
    }
}

/// Returns the text if it holds anything but whitespace
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

/// Times of day accepted as `HH:MM` or `HH:MM:SS`.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::de::Error;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    const FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

    pub(super) fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M:%S").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid time '{text}', expected HH:MM or HH:MM:SS")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_endpoints_exchanges_locations_only() {
        let mut record = ItineraryRecord {
            departure_county: Some("Nairobi".to_owned()),
            departure_town: Some("Westlands".to_owned()),
            arrival_county: Some("Nyeri".to_owned()),
            arrival_town: Some("Karatina".to_owned()),
            transport: Some("Matatu".to_owned()),
            ..Default::default()
        };
        record.swap_endpoints();
        assert_eq!(record.departure_county.as_deref(), Some("Nyeri"));
        assert_eq!(record.departure_town.as_deref(), Some("Karatina"));
        assert_eq!(record.arrival_county.as_deref(), Some("Nairobi"));
        assert_eq!(record.arrival_town.as_deref(), Some("Westlands"));
        assert_eq!(record.transport.as_deref(), Some("Matatu"));
    }

    #[test]
    fn whitespace_counts_as_missing() {
        assert_eq!(present(&Some("  ".to_owned())), None);
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some(" x ".to_owned())), Some(" x "));
    }

    #[test]
    fn deserialize_itinerary_record() {
        let record: ItineraryRecord = serde_yaml::from_str(
            "date: 2024-05-01\n\
             departure_county: Nairobi\n\
             departure_time: '08:15'\n\
             arrival_time: '11:40:30'\n",
        )
        .unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(record.departure_time, NaiveTime::from_hms_opt(8, 15, 0));
        assert_eq!(record.arrival_time, NaiveTime::from_hms_opt(11, 40, 30));
        assert_eq!(record.hotel_name_tel, None);
    }

    #[test]
    fn invalid_time_is_rejected() {
        let result = serde_yaml::from_str::<ItineraryRecord>("departure_time: '25:00'\n");
        assert!(result.unwrap_err().to_string().contains("expected HH:MM"));
    }
}

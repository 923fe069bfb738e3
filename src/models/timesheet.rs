use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, ServiceError};

use super::{generate_id, now, round2};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Montag",
    "Dienstag",
    "Mittwoch",
    "Donnerstag",
    "Freitag",
    "Samstag",
    "Sonntag",
];

/// One worked day inside a timesheet. Two start/end pairs tolerate a lunch
/// break; an interval ending before it starts is read as crossing midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    #[serde(rename = "datum")]
    pub date: NaiveDate,
    #[serde(rename = "bearbeiter")]
    pub operator: String,
    #[serde(rename = "startzeit_1", default)]
    pub start_1: Option<NaiveTime>,
    #[serde(rename = "endzeit_1", default)]
    pub end_1: Option<NaiveTime>,
    #[serde(rename = "startzeit_2", default)]
    pub start_2: Option<NaiveTime>,
    #[serde(rename = "endzeit_2", default)]
    pub end_2: Option<NaiveTime>,
    #[serde(rename = "taetigkeitsbeschreibung", default)]
    pub activity: String,
}

/// Minutes covered by one interval, wrapping across midnight when the end
/// lies before the start. Seconds are ignored like in the stored format.
fn interval_minutes(start: NaiveTime, end: NaiveTime) -> u32 {
    let start_min = start.hour() * 60 + start.minute();
    let end_min = end.hour() * 60 + end.minute();
    if end_min >= start_min {
        end_min - start_min
    } else {
        24 * 60 - start_min + end_min
    }
}

impl TimeEntry {
    pub fn new(date: NaiveDate, operator: impl Into<String>) -> Self {
        Self {
            id: generate_id("ZE"),
            date,
            operator: operator.into(),
            start_1: None,
            end_1: None,
            start_2: None,
            end_2: None,
            activity: String::new(),
        }
    }

    /// Total of both intervals in decimal hours, rounded to 2 places.
    pub fn total_hours(&self) -> f64 {
        let mut minutes = 0;
        if let (Some(start), Some(end)) = (self.start_1, self.end_1) {
            minutes += interval_minutes(start, end);
        }
        if let (Some(start), Some(end)) = (self.start_2, self.end_2) {
            minutes += interval_minutes(start, end);
        }
        round2(f64::from(minutes) / 60.0)
    }

    /// German weekday name for the entry's date.
    pub fn weekday_name(&self) -> &'static str {
        WEEKDAY_NAMES[self.date.weekday().num_days_from_monday() as usize]
    }
}

/// A per-position timesheet: at most one exists per order position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timesheet {
    pub id: String,
    #[serde(rename = "auftrag_id")]
    pub order_id: String,
    #[serde(rename = "position_id")]
    pub position_id: String,
    #[serde(rename = "projekt", default)]
    pub project: String,
    #[serde(rename = "kunde_id", default)]
    pub customer_id: String,
    #[serde(rename = "auftragsnummer", default)]
    pub order_number: String,
    #[serde(rename = "bearbeiter", default)]
    pub operator: String,
    #[serde(rename = "reisestrecke_km", default)]
    pub travel_distance_km: f64,
    #[serde(rename = "anzahl_fahrten", default)]
    pub trip_count: u32,
    #[serde(rename = "ort", default)]
    pub location: String,
    #[serde(rename = "datum", default = "today")]
    pub date: NaiveDate,
    #[serde(rename = "unterschrift_kunde", default)]
    pub customer_signature: String,
    #[serde(rename = "unterschrift_bearbeiter", default)]
    pub operator_signature: String,
    #[serde(rename = "erstellt_am", default = "now")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "zeiteintraege", default)]
    pub entries: Vec<TimeEntry>,
}

impl Timesheet {
    pub fn new(order_id: impl Into<String>, position_id: impl Into<String>) -> Self {
        Self {
            id: generate_id("SN"),
            order_id: order_id.into(),
            position_id: position_id.into(),
            project: String::new(),
            customer_id: String::new(),
            order_number: String::new(),
            operator: String::new(),
            travel_distance_km: 0.0,
            trip_count: 0,
            location: String::new(),
            date: today(),
            customer_signature: String::new(),
            operator_signature: String::new(),
            created_at: now(),
            entries: Vec::new(),
        }
    }

    /// Round-trip distance times number of trips.
    pub fn total_distance_km(&self) -> f64 {
        self.travel_distance_km * f64::from(self.trip_count)
    }

    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(TimeEntry::total_hours).sum()
    }

    pub fn add_entry(&mut self, entry: TimeEntry) {
        self.entries.push(entry);
    }

    pub fn remove_entry(&mut self, entry_id: &str) {
        self.entries.retain(|e| e.id != entry_id);
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ServiceError::malformed("timesheet", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn entry_with(
        start_1: &str,
        end_1: &str,
        second: Option<(&str, &str)>,
    ) -> TimeEntry {
        let parse = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        let mut entry = TimeEntry::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), "Meier");
        entry.start_1 = Some(parse(start_1));
        entry.end_1 = Some(parse(end_1));
        if let Some((start, end)) = second {
            entry.start_2 = Some(parse(start));
            entry.end_2 = Some(parse(end));
        }
        entry
    }

    #[test]
    fn workday_with_lunch_break_sums_both_intervals() {
        let entry = entry_with("08:00", "12:00", Some(("13:00", "16:30")));
        assert_eq!(entry.total_hours(), 7.5);
    }

    #[test_case("22:00", "02:00", 4.0 ; "night shift wraps midnight")]
    #[test_case("08:15", "08:15", 0.0 ; "zero length interval")]
    #[test_case("23:30", "00:15", 0.75 ; "short wrap")]
    fn single_interval_totals(start: &str, end: &str, expected: f64) {
        let entry = entry_with(start, end, None);
        assert_eq!(entry.total_hours(), expected);
    }

    #[test]
    fn incomplete_interval_contributes_nothing() {
        let mut entry = entry_with("08:00", "12:00", None);
        entry.start_2 = Some(NaiveTime::parse_from_str("13:00", "%H:%M").unwrap());
        assert_eq!(entry.total_hours(), 4.0);
    }

    #[test]
    fn weekday_name_is_german() {
        // 2025-03-10 is a Monday.
        let entry = entry_with("08:00", "09:00", None);
        assert_eq!(entry.weekday_name(), "Montag");
    }

    #[test]
    fn total_distance_is_product() {
        let mut sheet = Timesheet::new("A1", "POS1");
        sheet.travel_distance_km = 23.5;
        sheet.trip_count = 4;
        assert_eq!(sheet.total_distance_km(), 94.0);
    }

    #[test]
    fn missing_position_reference_is_malformed() {
        let err = Timesheet::from_value(json!({ "id": "SN1", "auftrag_id": "A1" })).unwrap_err();
        assert!(matches!(
            err,
            crate::errors::ServiceError::MalformedRecord { kind: "timesheet", .. }
        ));
    }

    #[test]
    fn round_trips_entries() {
        let mut sheet = Timesheet::new("A1", "POS1");
        sheet.add_entry(entry_with("07:30", "12:00", Some(("12:30", "16:00"))));
        let back = Timesheet::from_value(sheet.to_value().unwrap()).unwrap();
        assert_eq!(back, sheet);
        assert_eq!(back.total_hours(), 8.0);
    }
}

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::scheduling::{BookingId, BookingStatus, CleanerId, CrewMember, TimeSlot, VehicleId};

/// Payload for creating a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
    pub cleaner_count: i64,
}

/// Payload for moving a booking; duration and cleaner count are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanerView {
    pub cleaner_id: CleanerId,
    pub name: String,
}

impl From<&CrewMember> for CleanerView {
    fn from(member: &CrewMember) -> Self {
        Self {
            cleaner_id: member.cleaner_id,
            name: member.cleaner_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub booking_id: BookingId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
    pub vehicle_id: VehicleId,
    pub vehicle_name: String,
    pub cleaners: Vec<CleanerView>,
}

/// Cleaners of one vehicle free for a requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleAvailabilityView {
    pub vehicle_id: VehicleId,
    pub vehicle_name: String,
    pub cleaners: Vec<CleanerView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanerDailyAvailabilityView {
    pub cleaner_id: CleanerId,
    pub name: String,
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDailyAvailabilityView {
    pub vehicle_id: VehicleId,
    pub vehicle_name: String,
    pub cleaners: Vec<CleanerDailyAvailabilityView>,
}

/// Query string of `GET /availability/date`.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyAvailabilityQuery {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
}

/// Query string of `GET /availability/cleaners`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowAvailabilityQuery {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_time")]
    pub start_time: NaiveTime,
    pub duration_minutes: i64,
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_time(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booking_request_reads_camel_case_and_short_times() {
        let request: BookingRequest = serde_json::from_value(json!({
            "date": "2026-01-20",
            "startTime": "10:00",
            "durationMinutes": 120,
            "cleanerCount": 2
        }))
        .expect("payload parses");

        assert_eq!(
            request.start_time,
            NaiveTime::from_hms_opt(10, 0, 0).expect("valid")
        );
        assert_eq!(request.cleaner_count, 2);
    }

    #[test]
    fn reschedule_request_accepts_seconds() {
        let request: RescheduleRequest = serde_json::from_value(json!({
            "date": "2026-01-21",
            "startTime": "12:00:00"
        }))
        .expect("payload parses");
        assert_eq!(
            request.start_time,
            NaiveTime::from_hms_opt(12, 0, 0).expect("valid")
        );
    }

    #[test]
    fn malformed_times_are_rejected() {
        let result: Result<RescheduleRequest, _> = serde_json::from_value(json!({
            "date": "2026-01-21",
            "startTime": "noon"
        }));
        assert!(result.is_err());
    }
}

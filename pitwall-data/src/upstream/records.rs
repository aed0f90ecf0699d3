//! Typed wire records for each upstream resource.
//!
//! Field names follow the upstream JSON. Keys the pipeline cannot work
//! without are plain fields, so a record lacking one fails to decode and is
//! quarantined by [`decode_records`]; everything else is optional.

use chrono::{DateTime, Utc};
use log::warn;
use pitwall_core::{DriverNumber, MeetingId, SessionId};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use super::Resource;

/// Upstream `meetings` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeetingRecord {
    /// Meeting key.
    pub meeting_key: MeetingId,
    /// Display name.
    pub meeting_name: String,
    /// Circuit key.
    #[serde(default)]
    pub circuit_key: Option<u32>,
    /// Short circuit name.
    #[serde(default)]
    pub circuit_short_name: Option<String>,
    /// Host town or city.
    #[serde(default)]
    pub location: Option<String>,
    /// Host country.
    #[serde(default)]
    pub country_name: Option<String>,
    /// Host country code.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Championship year.
    pub year: i32,
    /// Start of the meeting.
    pub date_start: DateTime<Utc>,
}

/// Upstream `sessions` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionRecord {
    /// Session key.
    pub session_key: SessionId,
    /// Owning meeting key.
    pub meeting_key: MeetingId,
    /// Display name.
    pub session_name: String,
    /// Session category.
    pub session_type: String,
    /// Start of the session.
    pub date_start: DateTime<Utc>,
    /// End of the session, absent while it is scheduled or running.
    #[serde(default)]
    pub date_end: Option<DateTime<Utc>>,
}

/// Upstream `drivers` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverRecord {
    /// Car number.
    pub driver_number: DriverNumber,
    /// Full display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Name as shown on broadcast graphics.
    #[serde(default)]
    pub broadcast_name: Option<String>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Timing acronym.
    #[serde(default)]
    pub name_acronym: Option<String>,
    /// Nationality code.
    #[serde(default)]
    pub country_code: Option<String>,
    /// Team name.
    #[serde(default)]
    pub team_name: Option<String>,
    /// Team colour hex.
    #[serde(default)]
    pub team_colour: Option<String>,
    /// Portrait URL.
    #[serde(default)]
    pub headshot_url: Option<String>,
}

/// Upstream `laps` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LapRecord {
    /// Session key.
    pub session_key: SessionId,
    /// Car number.
    pub driver_number: DriverNumber,
    /// Lap number.
    pub lap_number: u32,
    /// Lap time in seconds.
    #[serde(default)]
    pub lap_duration: Option<f64>,
    /// Whether the lap started in the pit lane.
    #[serde(default)]
    pub is_pit_out_lap: Option<bool>,
    /// Track position, when published.
    #[serde(default)]
    pub position: Option<u32>,
}

/// Upstream `pit` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PitRecord {
    /// Session key.
    pub session_key: SessionId,
    /// Car number.
    pub driver_number: DriverNumber,
    /// Lap of pit entry.
    pub lap_number: u32,
    /// Time spent in the pit lane.
    #[serde(default)]
    pub pit_duration: Option<f64>,
}

/// Upstream `session_result` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionResultRecord {
    /// Session key.
    pub session_key: SessionId,
    /// Car number.
    pub driver_number: DriverNumber,
    /// Reported position.
    #[serde(default)]
    pub position: Option<u32>,
    /// Laps completed.
    #[serde(default)]
    pub number_of_laps: Option<u32>,
    /// Did not finish.
    #[serde(default)]
    pub dnf: Option<bool>,
    /// Did not start.
    #[serde(default)]
    pub dns: Option<bool>,
    /// Disqualified.
    #[serde(default)]
    pub dsq: Option<bool>,
}

/// Upstream `stints` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StintRecord {
    /// Session key.
    pub session_key: SessionId,
    /// Car number.
    pub driver_number: DriverNumber,
    /// 1-based stint number.
    pub stint_number: u32,
    /// First lap of the stint.
    #[serde(default)]
    pub lap_start: Option<u32>,
    /// Last lap of the stint.
    #[serde(default)]
    pub lap_end: Option<u32>,
    /// Tyre compound.
    #[serde(default)]
    pub compound: Option<String>,
}

/// Records that decoded, plus a count of those that did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    /// Successfully decoded records in upstream order.
    pub records: Vec<T>,
    /// Number of elements skipped because they did not match the schema.
    pub quarantined: usize,
}

/// Decode raw upstream elements into typed records.
///
/// Elements that fail to decode are skipped, counted and logged at `warn`;
/// they never reach the store as partial data.
///
/// # Examples
///
/// ```
/// use pitwall_data::upstream::{PitRecord, Resource, decode_records};
/// use serde_json::json;
///
/// let raw = vec![
///     json!({"session_key": 9158, "driver_number": 1, "lap_number": 20, "pit_duration": 22.4}),
///     json!({"session_key": 9158, "driver_number": 1}),
/// ];
/// let decoded = decode_records::<PitRecord>(Resource::Pit, raw);
/// assert_eq!(decoded.records.len(), 1);
/// assert_eq!(decoded.quarantined, 1);
/// ```
#[must_use]
pub fn decode_records<T: DeserializeOwned>(resource: Resource, raw: Vec<Value>) -> Decoded<T> {
    let mut records = Vec::with_capacity(raw.len());
    let mut quarantined = 0;
    for (index, element) in raw.into_iter().enumerate() {
        match serde_json::from_value::<T>(element) {
            Ok(record) => records.push(record),
            Err(err) => {
                quarantined += 1;
                warn!("quarantined {resource} record #{index}: {err}");
            }
        }
    }
    Decoded {
        records,
        quarantined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn decodes_upstream_session_shape() {
        let raw = vec![json!({
            "location": "Monza",
            "country_key": 13,
            "country_code": "ITA",
            "country_name": "Italy",
            "circuit_key": 39,
            "circuit_short_name": "Monza",
            "session_type": "Race",
            "session_name": "Race",
            "date_start": "2023-09-03T13:00:00+00:00",
            "date_end": "2023-09-03T15:00:00+00:00",
            "gmt_offset": "02:00:00",
            "session_key": 9165,
            "meeting_key": 1219,
            "year": 2023
        })];

        let decoded = decode_records::<SessionRecord>(Resource::Sessions, raw);

        assert_eq!(decoded.quarantined, 0);
        let session = decoded.records.first().expect("one record");
        assert_eq!(session.session_key, SessionId::new(9165));
        assert_eq!(
            session.date_end,
            Utc.with_ymd_and_hms(2023, 9, 3, 15, 0, 0).single()
        );
    }

    #[rstest]
    fn null_end_time_is_absent_not_quarantined() {
        let raw = vec![json!({
            "session_key": 9999,
            "meeting_key": 1250,
            "session_name": "Race",
            "session_type": "Race",
            "date_start": "2024-12-08T13:00:00+00:00",
            "date_end": null
        })];

        let decoded = decode_records::<SessionRecord>(Resource::Sessions, raw);

        assert_eq!(decoded.quarantined, 0);
        assert_eq!(decoded.records.first().and_then(|s| s.date_end), None);
    }

    #[rstest]
    #[case(json!({"driver_number": 1, "lap_number": 3}))]
    #[case(json!({"session_key": 9165, "driver_number": "one", "lap_number": 3}))]
    #[case(json!({"session_key": 9165, "driver_number": 1, "lap_number": null}))]
    #[case(json!("not an object"))]
    fn laps_missing_required_keys_are_quarantined(#[case] element: Value) {
        let raw = vec![
            json!({"session_key": 9165, "driver_number": 1, "lap_number": 1, "lap_duration": 90.1}),
            element,
        ];

        let decoded = decode_records::<LapRecord>(Resource::Laps, raw);

        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.quarantined, 1);
    }

    #[rstest]
    fn null_lap_duration_decodes_as_untimed() {
        let raw = vec![json!({
            "session_key": 9165,
            "driver_number": 16,
            "lap_number": 1,
            "lap_duration": null,
            "is_pit_out_lap": false
        })];

        let decoded = decode_records::<LapRecord>(Resource::Laps, raw);

        let lap = decoded.records.first().expect("one record");
        assert_eq!(lap.lap_duration, None);
        assert_eq!(lap.is_pit_out_lap, Some(false));
    }

    #[rstest]
    fn drivers_only_require_a_number() {
        let raw = vec![json!({"driver_number": 81, "team_name": null})];

        let decoded = decode_records::<DriverRecord>(Resource::Drivers, raw);

        assert_eq!(decoded.quarantined, 0);
        assert_eq!(
            decoded.records.first().map(|d| d.driver_number),
            Some(DriverNumber::new(81))
        );
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EventType {
    CheckIn,
    CheckOut,
}

/// An admitted attendance event. Created once, never mutated by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "timestamp_utc": "2026-01-05T13:02:11.412Z",
    "employee_id": "alice",
    "event_type": "check-in",
    "zone_name": "Store A",
    "latitude": 6.1491,
    "longitude": -75.6191
}))]
pub struct AttendanceRecord {
    #[schema(value_type = String, format = "date-time")]
    pub timestamp_utc: DateTime<Utc>,
    pub employee_id: String,
    pub event_type: EventType,
    pub zone_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn event_type_uses_kebab_case() {
        assert_eq!(EventType::CheckIn.to_string(), "check-in");
        assert_eq!(EventType::from_str("check-out").unwrap(), EventType::CheckOut);
        assert!(EventType::from_str("lunch").is_err());

        let json = serde_json::to_string(&EventType::CheckOut).unwrap();
        assert_eq!(json, "\"check-out\"");
    }

    #[test]
    fn timestamp_is_iso8601_utc() {
        let record = AttendanceRecord {
            timestamp_utc: Utc.with_ymd_and_hms(2026, 1, 5, 13, 2, 11).unwrap(),
            employee_id: "alice".into(),
            event_type: EventType::CheckIn,
            zone_name: "Store A".into(),
            latitude: 6.1491,
            longitude: -75.6191,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp_utc"], "2026-01-05T13:02:11Z");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Wire forms a stored timestamp can take.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Rfc3339(DateTime<Utc>),
    Exported {
        #[serde(rename = "_seconds")]
        seconds: i64,
        #[serde(rename = "_nanoseconds", default)]
        nanos: u32,
    },
    Proto {
        seconds: i64,
        #[serde(default)]
        nanos: u32,
    },
}

impl TimestampRepr {
    fn into_datetime(self) -> Option<DateTime<Utc>> {
        match self {
            TimestampRepr::Rfc3339(dt) => Some(dt),
            TimestampRepr::Exported { seconds, nanos } | TimestampRepr::Proto { seconds, nanos } => {
                DateTime::from_timestamp(seconds, nanos)
            }
        }
    }
}

/// `deserialize_with` helper for optional timestamp fields.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<TimestampRepr>::deserialize(deserializer)?;
    match repr {
        None => Ok(None),
        Some(repr) => repr
            .into_datetime()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "deserialize_opt")]
        at: Option<DateTime<Utc>>,
    }

    fn parse(value: serde_json::Value) -> Option<DateTime<Utc>> {
        serde_json::from_value::<Probe>(value).unwrap().at
    }

    #[test]
    fn accepts_all_wire_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse(json!({"at": "2024-01-01T00:00:00Z"})), Some(expected));
        assert_eq!(
            parse(json!({"at": "2024-01-01T07:00:00+07:00"})),
            Some(expected)
        );
        assert_eq!(
            parse(json!({"at": {"_seconds": 1704067200, "_nanoseconds": 0}})),
            Some(expected)
        );
        assert_eq!(parse(json!({"at": {"seconds": 1704067200}})), Some(expected));
    }

    #[test]
    fn missing_and_null_are_none() {
        assert_eq!(parse(json!({})), None);
        assert_eq!(parse(json!({"at": null})), None);
    }
}

//! Calendar-date helpers. Log dates travel as `YYYY-MM-DD` strings on the
//! wire and as `time::Date` everywhere else.

use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

pub const YMD: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_ymd(raw: &str) -> Result<Date, time::error::Parse> {
    Date::parse(raw, YMD)
}

pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// serde adapter for `#[serde(with = "crate::dates::ymd")]` fields.
pub mod ymd {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let out = date.format(super::YMD).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&out)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_ymd(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    #[test]
    fn parses_and_formats_ymd() {
        assert_eq!(parse_ymd("2026-08-26").unwrap(), date!(2026 - 08 - 26));
        assert!(parse_ymd("26/08/2026").is_err());
        assert!(parse_ymd("2026-13-01").is_err());
    }

    #[test]
    fn serde_adapter_round_trips() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper {
            #[serde(with = "super::ymd")]
            day: time::Date,
        }

        let json = serde_json::to_string(&Wrapper {
            day: date!(2026 - 08 - 26),
        })
        .unwrap();
        assert_eq!(json, r#"{"day":"2026-08-26"}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.day, date!(2026 - 08 - 26));
    }
}

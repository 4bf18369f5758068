//! Date and wall-clock helpers for provider timestamps.
//!
//! Provider timestamps are plain text such as `2021-06-05`,
//! `2021-06-05 03:15:00` or `2021-06-05T03:15:00+02:00`. The wall clock is
//! taken as written; offsets are not normalised to UTC.

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, Month,
    OffsetDateTime, PrimitiveDateTime, Time,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised timestamp '{0}'")]
pub struct InvalidTimestamp(pub String);

/// Parse a provider timestamp into its local date and time-of-day.
pub fn wall_clock(s: &str) -> Result<PrimitiveDateTime, InvalidTimestamp> {
    let s = s.trim();

    if let Ok(dt) = PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
    ) {
        return Ok(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    ) {
        return Ok(dt);
    }
    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(PrimitiveDateTime::new(odt.date(), odt.time()));
    }
    if let Ok(date) = parse_date(s) {
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT));
    }

    Err(InvalidTimestamp(s.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<Date, InvalidTimestamp> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| InvalidTimestamp(s.to_string()))
}

/// Format a date as `YYYY-MM-DD`, the form the provider expects in URLs.
pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Whether the timestamp falls on the first of January.
pub fn is_new_year(s: &str) -> Result<bool, InvalidTimestamp> {
    let dt = wall_clock(s)?;
    Ok(dt.month() == Month::January && dt.day() == 1)
}

/// Same calendar day one year earlier; 29 February maps to 28 February.
pub fn one_year_before(date: Date) -> Date {
    let year = date.year() - 1;
    Date::from_calendar_date(year, date.month(), date.day())
        .or_else(|_| Date::from_calendar_date(year, date.month(), date.day() - 1))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn parses_space_and_t_separated_timestamps() {
        assert_eq!(wall_clock("2021-06-05 03:15:00"), Ok(datetime!(2021-06-05 03:15:00)));
        assert_eq!(wall_clock("2021-06-05T03:15:00"), Ok(datetime!(2021-06-05 03:15:00)));
    }

    #[test]
    fn keeps_wall_clock_of_offset_timestamps() {
        assert_eq!(
            wall_clock("2021-06-05T23:30:00+02:00"),
            Ok(datetime!(2021-06-05 23:30:00))
        );
    }

    #[test]
    fn date_only_means_midnight() {
        assert_eq!(wall_clock("2021-01-01"), Ok(datetime!(2021-01-01 00:00:00)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(wall_clock("yesterday").is_err());
    }

    #[test]
    fn new_year_detection_uses_date_component() {
        assert_eq!(is_new_year("2020-01-01 00:00:00"), Ok(true));
        assert_eq!(is_new_year("2020-02-01"), Ok(false));
    }

    #[test]
    fn one_year_before_clamps_leap_day() {
        assert_eq!(one_year_before(date!(2024-02-29)), date!(2023-02-28));
        assert_eq!(one_year_before(date!(2026-10-19)), date!(2025-10-19));
    }

    #[test]
    fn formats_dates_for_urls() {
        assert_eq!(format_date(date!(2021-06-05)), "2021-06-05");
    }
}

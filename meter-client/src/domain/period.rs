use std::{fmt, str::FromStr};

use super::raw_sample::TimestampField;

/// Sampling interval offered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Day,
    QuarterHour,
    Month,
}

impl Granularity {
    /// Path segment of the provider's datapoint endpoint.
    pub fn path_segment(self) -> &'static str {
        match self {
            Granularity::QuarterHour => "datapoints",
            Granularity::Day => "datapoint/days",
            Granularity::Month => "datapoint/months",
        }
    }

    pub fn timestamp_field(self) -> TimestampField {
        match self {
            Granularity::QuarterHour => TimestampField::DateTime,
            Granularity::Day | Granularity::Month => TimestampField::Date,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "DAY",
            Granularity::QuarterHour => "QUARTER_OF_AN_HOUR",
            Granularity::Month => "MONTH",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting period requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Day,
    QuarterHour,
    Month,
    Year,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("period must be one of DAY, QUARTER_OF_AN_HOUR, MONTH or YEAR, got '{0}'")]
pub struct InvalidPeriod(pub String);

impl Period {
    /// Granularity used both to fetch and to classify this period.
    ///
    /// Years are fetched per month and filtered afterwards.
    pub fn granularity(self) -> Granularity {
        match self {
            Period::Day => Granularity::Day,
            Period::QuarterHour => Granularity::QuarterHour,
            Period::Month | Period::Year => Granularity::Month,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "DAY",
            Period::QuarterHour => "QUARTER_OF_AN_HOUR",
            Period::Month => "MONTH",
            Period::Year => "YEAR",
        }
    }
}

impl FromStr for Period {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAY" => Ok(Period::Day),
            "QUARTER_OF_AN_HOUR" | "QUARTER_HOUR" => Ok(Period::QuarterHour),
            "MONTH" => Ok(Period::Month),
            "YEAR" => Ok(Period::Year),
            _ => Err(InvalidPeriod(s.to_string())),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_period_names() {
        assert_eq!("DAY".parse::<Period>(), Ok(Period::Day));
        assert_eq!("quarter_of_an_hour".parse::<Period>(), Ok(Period::QuarterHour));
        assert_eq!("QUARTER_HOUR".parse::<Period>(), Ok(Period::QuarterHour));
        assert_eq!("Year".parse::<Period>(), Ok(Period::Year));
    }

    #[test]
    fn rejects_unknown_period() {
        let err = "WEEK".parse::<Period>().unwrap_err();
        assert_eq!(err, InvalidPeriod("WEEK".to_string()));
        assert!(err.to_string().contains("WEEK"));
    }

    #[test]
    fn year_is_fetched_monthly() {
        assert_eq!(Period::Year.granularity(), Granularity::Month);
        assert_eq!(Granularity::QuarterHour.timestamp_field(), TimestampField::DateTime);
        assert_eq!(Granularity::Month.path_segment(), "datapoint/months");
    }
}

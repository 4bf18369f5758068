use serde::{Deserialize, Serialize};

/// One rate-keyed reading as delivered by the provider.
///
/// `quantity` stays textual until it is merged so no precision is lost to a
/// float round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: String,
    pub rate: u16,
    pub quantity: String,
}

impl RawSample {
    pub fn new(timestamp: impl Into<String>, rate: u16, quantity: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            rate,
            quantity: quantity.into(),
        }
    }
}

/// Which provider field carries the timestamp of a datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    /// `date`, used by day and month datapoints.
    Date,
    /// `datetime`, used by quarter-hour datapoints.
    DateTime,
}

impl TimestampField {
    pub fn as_str(self) -> &'static str {
        match self {
            TimestampField::Date => "date",
            TimestampField::DateTime => "datetime",
        }
    }
}

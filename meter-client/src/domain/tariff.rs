use serde::Deserialize;

/// Daily peak window plus the weekend override.
///
/// Off-peak covers everything up to and including `peak_start_hour:00:00`
/// and everything strictly after `off_peak_start_hour:00:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TariffWindow {
    pub peak_start_hour: u8,
    pub off_peak_start_hour: u8,
    pub weekend_is_off_peak: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} must be an hour in 0..=23, got {value}")]
pub struct InvalidTariffWindow {
    pub field: &'static str,
    pub value: u8,
}

impl Default for TariffWindow {
    fn default() -> Self {
        Self {
            peak_start_hour: 7,
            off_peak_start_hour: 23,
            weekend_is_off_peak: true,
        }
    }
}

impl TariffWindow {
    pub fn validate(&self) -> Result<(), InvalidTariffWindow> {
        if self.peak_start_hour > 23 {
            return Err(InvalidTariffWindow {
                field: "peak_start_hour",
                value: self.peak_start_hour,
            });
        }
        if self.off_peak_start_hour > 23 {
            return Err(InvalidTariffWindow {
                field: "off_peak_start_hour",
                value: self.off_peak_start_hour,
            });
        }
        Ok(())
    }
}

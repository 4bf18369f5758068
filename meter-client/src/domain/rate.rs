use std::fmt;

/// Rate codes reported by the metering provider.
///
/// The hundreds digit selects the direction (1 = consumption, 2 = production),
/// the last digit the register (0 = total, 1 = off-peak, 2 = peak).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RateCode {
    ConsumptionTotal,
    ConsumptionOffPeak,
    ConsumptionPeak,
    ProductionTotal,
    ProductionOffPeak,
    ProductionPeak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Consumption,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Total,
    OffPeak,
    Peak,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown rate code {0}")]
pub struct UnknownRateCode(pub u16);

impl RateCode {
    pub const ALL: [RateCode; 6] = [
        RateCode::ConsumptionTotal,
        RateCode::ConsumptionOffPeak,
        RateCode::ConsumptionPeak,
        RateCode::ProductionTotal,
        RateCode::ProductionOffPeak,
        RateCode::ProductionPeak,
    ];

    pub fn code(self) -> u16 {
        match self {
            RateCode::ConsumptionTotal => 180,
            RateCode::ConsumptionOffPeak => 181,
            RateCode::ConsumptionPeak => 182,
            RateCode::ProductionTotal => 280,
            RateCode::ProductionOffPeak => 281,
            RateCode::ProductionPeak => 282,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            RateCode::ConsumptionTotal | RateCode::ConsumptionOffPeak | RateCode::ConsumptionPeak => {
                Direction::Consumption
            }
            RateCode::ProductionTotal | RateCode::ProductionOffPeak | RateCode::ProductionPeak => {
                Direction::Production
            }
        }
    }

    pub fn register(self) -> Register {
        match self {
            RateCode::ConsumptionTotal | RateCode::ProductionTotal => Register::Total,
            RateCode::ConsumptionOffPeak | RateCode::ProductionOffPeak => Register::OffPeak,
            RateCode::ConsumptionPeak | RateCode::ProductionPeak => Register::Peak,
        }
    }
}

impl TryFrom<u16> for RateCode {
    type Error = UnknownRateCode;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            180 => Ok(RateCode::ConsumptionTotal),
            181 => Ok(RateCode::ConsumptionOffPeak),
            182 => Ok(RateCode::ConsumptionPeak),
            280 => Ok(RateCode::ProductionTotal),
            281 => Ok(RateCode::ProductionOffPeak),
            282 => Ok(RateCode::ProductionPeak),
            other => Err(UnknownRateCode(other)),
        }
    }
}

impl fmt::Display for RateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_convert_both_ways() {
        for rate in RateCode::ALL {
            assert_eq!(RateCode::try_from(rate.code()), Ok(rate));
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(RateCode::try_from(183u16), Err(UnknownRateCode(183)));
    }

    #[test]
    fn direction_and_register_follow_code_digits() {
        assert_eq!(RateCode::ProductionPeak.direction(), Direction::Production);
        assert_eq!(RateCode::ProductionPeak.register(), Register::Peak);
        assert_eq!(RateCode::ConsumptionTotal.register(), Register::Total);
    }
}

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::rate::{Direction, RateCode, Register};

/// Total / off-peak / peak registers for one direction, in Wh-equivalent units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TariffRegisters {
    pub total: Option<i64>,
    pub off_peak: Option<i64>,
    pub peak: Option<i64>,
}

impl TariffRegisters {
    pub fn get(&self, register: Register) -> Option<i64> {
        match register {
            Register::Total => self.total,
            Register::OffPeak => self.off_peak,
            Register::Peak => self.peak,
        }
    }

    pub fn set(&mut self, register: Register, value: i64) {
        match register {
            Register::Total => self.total = Some(value),
            Register::OffPeak => self.off_peak = Some(value),
            Register::Peak => self.peak = Some(value),
        }
    }
}

/// All registers reported for a single timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub timestamp: String,
    pub consumption: TariffRegisters,
    pub production: TariffRegisters,
}

impl MergedRecord {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            consumption: TariffRegisters::default(),
            production: TariffRegisters::default(),
        }
    }

    pub fn registers(&self, direction: Direction) -> &TariffRegisters {
        match direction {
            Direction::Consumption => &self.consumption,
            Direction::Production => &self.production,
        }
    }

    pub fn registers_mut(&mut self, direction: Direction) -> &mut TariffRegisters {
        match direction {
            Direction::Consumption => &mut self.consumption,
            Direction::Production => &mut self.production,
        }
    }

    pub fn get(&self, rate: RateCode) -> Option<i64> {
        self.registers(rate.direction()).get(rate.register())
    }

    pub fn set(&mut self, rate: RateCode, value: i64) {
        self.registers_mut(rate.direction()).set(rate.register(), value);
    }

    /// Present registers in rate-code order.
    pub fn fields(&self) -> impl Iterator<Item = (RateCode, i64)> + '_ {
        RateCode::ALL
            .into_iter()
            .filter_map(move |rate| self.get(rate).map(|v| (rate, v)))
    }
}

/// Serialized as `{"datetime": ..., "180": ..., "181": ...}` with only the
/// registers that are present.
impl Serialize for MergedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("datetime", &self.timestamp)?;
        for (rate, value) in self.fields() {
            map.serialize_entry(&rate.code().to_string(), &value)?;
        }
        map.end()
    }
}

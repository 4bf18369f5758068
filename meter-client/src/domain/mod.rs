mod measuring_point;
mod period;
mod rate;
mod raw_sample;
mod record;
mod tariff;
pub mod timestamp;

pub use measuring_point::{MeasuringPoint, UnitType};
pub use period::{Granularity, InvalidPeriod, Period};
pub use rate::{Direction, RateCode, Register, UnknownRateCode};
pub use raw_sample::{RawSample, TimestampField};
pub use record::{MergedRecord, TariffRegisters};
pub use tariff::{InvalidTariffWindow, TariffWindow};

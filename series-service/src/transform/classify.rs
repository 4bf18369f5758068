use meter_client::domain::{
    timestamp::{wall_clock, InvalidTimestamp},
    Granularity, MergedRecord, TariffRegisters, TariffWindow,
};
use time::{PrimitiveDateTime, Time, Weekday};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("cannot classify an empty series")]
    EmptyInput,
    #[error("record at {timestamp} has no cumulative consumption total (rate 180)")]
    MissingCumulativeTotal { timestamp: String },
    #[error("register arithmetic overflowed at {timestamp}")]
    Overflow { timestamp: String },
    #[error(transparent)]
    InvalidTimestamp(#[from] InvalidTimestamp),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tariff {
    OffPeak,
    Peak,
}

fn on_the_hour(hour: u8) -> Time {
    Time::from_hms(hour.min(23), 0, 0).unwrap_or(Time::MIDNIGHT)
}

/// Tariff bucket for a wall-clock moment.
///
/// `peak_start_hour:00:00` itself is still off-peak, `off_peak_start_hour:00:00`
/// itself is still peak.
pub fn tariff_at(window: &TariffWindow, at: PrimitiveDateTime) -> Tariff {
    let weekend = matches!(at.weekday(), Weekday::Saturday | Weekday::Sunday);
    let time = at.time();

    if (window.weekend_is_off_peak && weekend)
        || time <= on_the_hour(window.peak_start_hour)
        || time > on_the_hour(window.off_peak_start_hour)
    {
        Tariff::OffPeak
    } else {
        Tariff::Peak
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Split {
    off_peak: i64,
    peak: i64,
}

impl Split {
    fn of(registers: &TariffRegisters) -> Self {
        Self {
            off_peak: registers.off_peak.unwrap_or(0),
            peak: registers.peak.unwrap_or(0),
        }
    }

    fn add(self, tariff: Tariff, delta: i64) -> Option<Self> {
        Some(match tariff {
            Tariff::OffPeak => Self {
                off_peak: self.off_peak.checked_add(delta)?,
                ..self
            },
            Tariff::Peak => Self {
                peak: self.peak.checked_add(delta)?,
                ..self
            },
        })
    }

    fn total(self) -> Option<i64> {
        self.off_peak.checked_add(self.peak)
    }

    fn write_to(self, registers: &mut TariffRegisters) {
        registers.off_peak = Some(self.off_peak);
        registers.peak = Some(self.peak);
    }
}

/// State threaded through the quarter-hour scan: the previous cumulative
/// totals and the buckets classified so far.
#[derive(Debug, Clone, Copy)]
struct Carry {
    consumption_total: i64,
    production_total: i64,
    consumption: Split,
    production: Split,
}

fn overflow(record: &MergedRecord) -> ClassifyError {
    ClassifyError::Overflow {
        timestamp: record.timestamp.clone(),
    }
}

fn cumulative_total(record: &MergedRecord) -> Result<i64, ClassifyError> {
    record
        .consumption
        .total
        .ok_or_else(|| ClassifyError::MissingCumulativeTotal {
            timestamp: record.timestamp.clone(),
        })
}

/// Fill in total / off-peak / peak registers for an ascending series.
pub fn classify(
    records: Vec<MergedRecord>,
    granularity: Granularity,
    window: &TariffWindow,
) -> Result<Vec<MergedRecord>, ClassifyError> {
    if records.is_empty() {
        return Err(ClassifyError::EmptyInput);
    }

    match granularity {
        Granularity::QuarterHour => classify_cumulative(records, window),
        Granularity::Day | Granularity::Month => records.into_iter().map(total_buckets).collect(),
    }
}

/// Day and month datapoints arrive already split by tariff; only the totals
/// are derived.
fn total_buckets(mut record: MergedRecord) -> Result<MergedRecord, ClassifyError> {
    for registers in [&mut record.consumption, &mut record.production] {
        let split = Split::of(registers);
        let total = split.total().ok_or_else(|| ClassifyError::Overflow {
            timestamp: record.timestamp.clone(),
        })?;
        split.write_to(registers);
        registers.total = Some(total);
    }
    Ok(record)
}

/// Quarter-hour datapoints only carry cumulative totals. Each interval's
/// increase is attributed to the tariff of its timestamp and added onto the
/// buckets carried from the previous record, so buckets stay cumulative.
fn classify_cumulative(
    records: Vec<MergedRecord>,
    window: &TariffWindow,
) -> Result<Vec<MergedRecord>, ClassifyError> {
    let first = &records[0];
    let seed = Carry {
        consumption_total: cumulative_total(first)?,
        production_total: first.production.total.unwrap_or(0),
        consumption: Split::of(&first.consumption),
        production: Split::of(&first.production),
    };

    let mut classified = Vec::with_capacity(records.len());
    records.into_iter().try_fold(seed, |carry, mut record| {
        let consumption_total = cumulative_total(&record)?;
        let production_total = record.production.total.unwrap_or(0);
        let tariff = tariff_at(window, wall_clock(&record.timestamp)?);

        let step = |split: Split, now: i64, before: i64| split.add(tariff, now.checked_sub(before)?);
        let next = Carry {
            consumption_total,
            production_total,
            consumption: step(carry.consumption, consumption_total, carry.consumption_total)
                .ok_or_else(|| overflow(&record))?,
            production: step(carry.production, production_total, carry.production_total)
                .ok_or_else(|| overflow(&record))?,
        };

        record.production.total = Some(production_total);
        next.consumption.write_to(&mut record.consumption);
        next.production.write_to(&mut record.production);
        classified.push(record);

        Ok::<_, ClassifyError>(next)
    })?;

    tracing::debug!(records = classified.len(), "classified quarter-hour series");
    Ok(classified)
}

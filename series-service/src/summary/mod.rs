use std::collections::BTreeMap;

use meter_client::{
    domain::{timestamp, Granularity, RateCode, RawSample},
    FetchError,
};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use time::Date;

use crate::{pipeline::MeterDataSource, transform::parse_quantity};

/// Number of rate codes the provider reports per daily reading.
const READINGS_PER_DAY: usize = 4;

#[derive(thiserror::Error, Debug)]
pub enum SummaryError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("no daily readings between {from} and {to}")]
    NoReadings { from: String, to: String },
    #[error("malformed quantity '{quantity}' for rate {rate}")]
    MalformedQuantity { rate: u16, quantity: String },
    #[error("end reading for rate {0} has no matching start reading")]
    MissingStartReading(RateCode),
}

/// Meter readings at both ends of a twelve month window and their difference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearConsumption {
    pub start: BTreeMap<RateCode, Decimal>,
    pub end: BTreeMap<RateCode, Decimal>,
    pub consumption: BTreeMap<RateCode, Decimal>,
}

impl YearConsumption {
    /// `start_<rate>`, `end_<rate>` and `consumption_<rate>` entries.
    pub fn to_flat_map(&self) -> BTreeMap<String, Decimal> {
        let sections = [
            ("start", &self.start),
            ("end", &self.end),
            ("consumption", &self.consumption),
        ];

        sections
            .into_iter()
            .flat_map(|(prefix, values)| {
                values
                    .iter()
                    .map(move |(rate, v)| (format!("{prefix}_{}", rate.code()), *v))
            })
            .collect()
    }

    fn add_totals(&mut self) {
        let pairs = [
            (RateCode::ConsumptionTotal, RateCode::ConsumptionOffPeak, RateCode::ConsumptionPeak),
            (RateCode::ProductionTotal, RateCode::ProductionOffPeak, RateCode::ProductionPeak),
        ];
        for (total, off_peak, peak) in pairs {
            if let (Some(o), Some(p)) = (self.consumption.get(&off_peak), self.consumption.get(&peak)) {
                let sum = *o + *p;
                self.consumption.insert(total, sum);
            }
        }
    }
}

impl Serialize for YearConsumption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let flat = self.to_flat_map();
        let mut map = serializer.serialize_map(Some(flat.len()))?;
        for (k, v) in &flat {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

fn reading(sample: &RawSample) -> Result<Option<(RateCode, Decimal)>, SummaryError> {
    let rate = match RateCode::try_from(sample.rate) {
        Ok(rate) => rate,
        Err(e) => {
            tracing::warn!(timestamp = %sample.timestamp, error = %e, "skipping reading");
            return Ok(None);
        }
    };
    let quantity = parse_quantity(&sample.quantity).ok_or_else(|| SummaryError::MalformedQuantity {
        rate: sample.rate,
        quantity: sample.quantity.clone(),
    })?;
    Ok(Some((rate, quantity)))
}

/// Consumption over the year ending `today`, from the first and last daily
/// readings.
///
/// Start and end readings are paired by rate code as they come, assuming the
/// provider reports the same rate codes in the same order on every day. Up to
/// four readings are taken from each end of the window.
pub async fn year_consumption<S>(
    source: &S,
    measuring_point: u64,
    today: Date,
) -> Result<YearConsumption, SummaryError>
where
    S: MeterDataSource + ?Sized,
{
    let from = timestamp::one_year_before(today);
    let samples = source
        .fetch_samples(measuring_point, Granularity::Day, from, today)
        .await?;

    if samples.is_empty() {
        return Err(SummaryError::NoReadings {
            from: timestamp::format_date(from),
            to: timestamp::format_date(today),
        });
    }

    let start_readings = &samples[..samples.len().min(READINGS_PER_DAY)];
    let end_from = samples
        .len()
        .saturating_sub(READINGS_PER_DAY)
        .max(1)
        .min(samples.len());
    let end_readings = &samples[end_from..];

    let mut summary = YearConsumption::default();
    for sample in start_readings {
        if let Some((rate, quantity)) = reading(sample)? {
            summary.start.insert(rate, quantity);
        }
    }
    for sample in end_readings {
        if let Some((rate, quantity)) = reading(sample)? {
            let start = summary
                .start
                .get(&rate)
                .copied()
                .ok_or(SummaryError::MissingStartReading(rate))?;
            summary.end.insert(rate, quantity);
            summary.consumption.insert(rate, quantity - start);
        }
    }
    summary.add_totals();

    tracing::info!(
        measuring_point,
        readings = samples.len(),
        consumption = ?summary.consumption.get(&RateCode::ConsumptionTotal),
        production = ?summary.consumption.get(&RateCode::ProductionTotal),
        "year consumption computed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::FakeSource;
    use time::macros::date;

    fn day(ts: &str, quantity: &str) -> Vec<RawSample> {
        [181, 182, 281, 282]
            .into_iter()
            .map(|rate| RawSample::new(ts, rate, quantity))
            .collect()
    }

    #[tokio::test]
    async fn consumption_is_end_minus_start_per_rate() {
        let mut readings = day("2025-10-19 00:00:00", "100");
        readings.extend(day("2026-04-01 00:00:00", "120"));
        readings.extend(day("2026-10-19 00:00:00", "150"));
        let source = FakeSource {
            day: readings,
            ..Default::default()
        };

        let summary = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap();

        assert_eq!(
            source.calls(),
            vec![(5, Granularity::Day, date!(2025-10-19), date!(2026-10-19))]
        );
        for rate in [181u16, 182, 281, 282] {
            let rate = RateCode::try_from(rate).unwrap();
            assert_eq!(summary.start[&rate], Decimal::from(100));
            assert_eq!(summary.end[&rate], Decimal::from(150));
            assert_eq!(summary.consumption[&rate], Decimal::from(50));
        }
        assert_eq!(
            summary.consumption[&RateCode::ConsumptionTotal],
            summary.consumption[&RateCode::ConsumptionOffPeak] + summary.consumption[&RateCode::ConsumptionPeak]
        );
        assert_eq!(summary.consumption[&RateCode::ProductionTotal], Decimal::from(100));
    }

    #[tokio::test]
    async fn serializes_flat_rate_suffixed_keys() {
        let mut readings = day("2025-10-19 00:00:00", "100.5");
        readings.extend(day("2026-10-19 00:00:00", "150.75"));
        let source = FakeSource {
            day: readings,
            ..Default::default()
        };

        let summary = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["start_181"], "100.5");
        assert_eq!(json["end_282"], "150.75");
        assert_eq!(json["consumption_181"], "50.25");
        assert_eq!(json["consumption_180"], "100.50");
        assert!(json.get("start_180").is_none());
    }

    #[tokio::test]
    async fn short_windows_skip_the_first_reading_at_the_end() {
        let source = FakeSource {
            day: day("2026-10-19 00:00:00", "100"),
            ..Default::default()
        };

        let summary = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap();

        assert_eq!(summary.start.len(), 4);
        assert!(!summary.end.contains_key(&RateCode::ConsumptionOffPeak));
        assert_eq!(summary.consumption[&RateCode::ConsumptionPeak], Decimal::ZERO);
        assert!(!summary.consumption.contains_key(&RateCode::ConsumptionTotal));
        assert!(summary.consumption.contains_key(&RateCode::ProductionTotal));
    }

    #[tokio::test]
    async fn empty_window_is_an_error() {
        let source = FakeSource::default();

        let err = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap_err();

        assert!(matches!(err, SummaryError::NoReadings { .. }));
    }

    #[tokio::test]
    async fn end_rate_without_start_is_an_error() {
        let mut readings = day("2025-10-19 00:00:00", "100");
        readings.push(RawSample::new("2026-10-19 00:00:00", 180, "150"));
        let source = FakeSource {
            day: readings,
            ..Default::default()
        };

        let err = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap_err();

        assert!(matches!(
            err,
            SummaryError::MissingStartReading(RateCode::ConsumptionTotal)
        ));
    }

    #[tokio::test]
    async fn scientific_notation_reads_like_the_merger() {
        let mut readings = day("2025-10-19 00:00:00", "1e2");
        readings.extend(day("2026-10-19 00:00:00", "1.5E2"));
        let source = FakeSource {
            day: readings,
            ..Default::default()
        };

        let summary = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap();

        assert_eq!(summary.consumption[&RateCode::ConsumptionOffPeak], Decimal::from(50));
        assert_eq!(crate::transform::scale_quantity("1e2"), Some(100_000));
    }

    #[tokio::test]
    async fn malformed_quantity_is_an_error() {
        let source = FakeSource {
            day: vec![RawSample::new("2025-10-19 00:00:00", 181, "-")],
            ..Default::default()
        };

        let err = year_consumption(&source, 5, date!(2026-10-19)).await.unwrap_err();

        assert!(matches!(err, SummaryError::MalformedQuantity { rate: 181, .. }));
    }
}

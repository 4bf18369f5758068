use std::collections::HashSet;

use meter_client::{
    domain::{
        timestamp::{self, InvalidTimestamp},
        Granularity, InvalidPeriod, MeasuringPoint, MergedRecord, Period, RawSample,
        TariffWindow, UnitType,
    },
    FetchError,
};
use time::Date;

use crate::transform::{self, ClassifyError, MergeError, RateMerger};

#[derive(thiserror::Error, Debug)]
pub enum SeriesError {
    #[error(transparent)]
    InvalidPeriod(#[from] InvalidPeriod),
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
    #[error("classify error: {0}")]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    InvalidTimestamp(#[from] InvalidTimestamp),
}

/// Where raw meter samples come from.
#[async_trait::async_trait]
pub trait MeterDataSource: Send + Sync {
    async fn fetch_samples(
        &self,
        measuring_point: u64,
        granularity: Granularity,
        from: Date,
        to: Date,
    ) -> Result<Vec<RawSample>, FetchError>;

    async fn list_measuring_points(&self) -> Result<Vec<MeasuringPoint>, FetchError>;

    async fn electricity_measuring_points(&self) -> Result<Vec<MeasuringPoint>, FetchError> {
        let all = self.list_measuring_points().await?;
        Ok(all
            .into_iter()
            .filter(|mp| mp.unit_type == UnitType::Electricity)
            .collect())
    }

    async fn gas_measuring_points(&self) -> Result<Vec<MeasuringPoint>, FetchError> {
        let all = self.list_measuring_points().await?;
        Ok(all.into_iter().filter(|mp| mp.unit_type == UnitType::Gas).collect())
    }
}

#[async_trait::async_trait]
impl<T: MeterDataSource + ?Sized> MeterDataSource for std::sync::Arc<T> {
    async fn fetch_samples(
        &self,
        measuring_point: u64,
        granularity: Granularity,
        from: Date,
        to: Date,
    ) -> Result<Vec<RawSample>, FetchError> {
        (**self).fetch_samples(measuring_point, granularity, from, to).await
    }

    async fn list_measuring_points(&self) -> Result<Vec<MeasuringPoint>, FetchError> {
        (**self).list_measuring_points().await
    }
}

/// Fetch → merge → sort → classify.
pub struct SeriesPipeline<S> {
    pub source: S,
    pub window: TariffWindow,
}

impl<S> SeriesPipeline<S>
where
    S: MeterDataSource,
{
    pub fn new(source: S, window: TariffWindow) -> Self {
        Self { source, window }
    }

    /// Like [`build_series`](Self::build_series) with the period given by name.
    /// An unknown period fails before anything is fetched.
    pub async fn build_series_for(
        &self,
        measuring_point: u64,
        from: Date,
        to: Date,
        period: &str,
    ) -> Result<Vec<MergedRecord>, SeriesError> {
        let period: Period = period.parse()?;
        self.build_series(measuring_point, from, to, period).await
    }

    /// Classified series for `[from, to]`, ascending by timestamp.
    ///
    /// Quarter-hour requests always cover `[from, from + 1 day]` and are
    /// seeded with the daily readings of that range. Daily readings no
    /// quarter-hour sample lands on are dropped. Year requests keep only
    /// the monthly readings taken on January 1st.
    pub async fn build_series(
        &self,
        measuring_point: u64,
        from: Date,
        to: Date,
        period: Period,
    ) -> Result<Vec<MergedRecord>, SeriesError> {
        let granularity = period.granularity();
        let to = match period {
            Period::QuarterHour => from.next_day().unwrap_or(from),
            _ => to,
        };

        tracing::info!(
            measuring_point,
            %period,
            %granularity,
            from = %timestamp::format_date(from),
            to = %timestamp::format_date(to),
            "building series"
        );
        metrics::counter!("series_builds_total", "period" => period.as_str()).increment(1);

        let mut samples = self
            .source
            .fetch_samples(measuring_point, granularity, from, to)
            .await?;

        let mut merger = if period == Period::QuarterHour {
            let baseline = self
                .source
                .fetch_samples(measuring_point, Granularity::Day, from, to)
                .await?;
            let mut merger = RateMerger::new();
            merger.extend(&baseline)?;
            merger
        } else {
            RateMerger::new()
        };

        if period == Period::Year {
            samples = retain_new_year(samples)?;
        }

        merger.extend(&samples)?;
        let mut records = merger.into_records();
        if period == Period::QuarterHour {
            records = retain_sampled(records, &samples);
        }
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let records = transform::classify(records, granularity, &self.window)?;

        metrics::counter!("series_records_total").increment(records.len() as u64);
        tracing::info!(measuring_point, records = records.len(), "series built");

        Ok(records)
    }
}

fn retain_sampled(records: Vec<MergedRecord>, samples: &[RawSample]) -> Vec<MergedRecord> {
    let sampled: HashSet<&str> = samples.iter().map(|s| s.timestamp.as_str()).collect();
    records
        .into_iter()
        .filter(|r| {
            let keep = sampled.contains(r.timestamp.as_str());
            if !keep {
                tracing::debug!(timestamp = %r.timestamp, "dropping daily reading without quarter-hour samples");
            }
            keep
        })
        .collect()
}

fn retain_new_year(samples: Vec<RawSample>) -> Result<Vec<RawSample>, InvalidTimestamp> {
    let mut kept = Vec::new();
    for sample in samples {
        if timestamp::is_new_year(&sample.timestamp)? {
            kept.push(sample);
        }
    }
    Ok(kept)
}

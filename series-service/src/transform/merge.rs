use std::{collections::HashMap, str::FromStr};

use meter_client::domain::{MergedRecord, RateCode, RawSample};
use rust_decimal::{prelude::ToPrimitive, Decimal};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("malformed quantity '{quantity}' for rate {rate} at {timestamp}")]
    MalformedQuantity {
        timestamp: String,
        rate: u16,
        quantity: String,
    },
}

/// Parse a provider quantity, plain or in scientific notation.
pub fn parse_quantity(quantity: &str) -> Option<Decimal> {
    let trimmed = quantity.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Parse a decimal quantity and scale it to thousandths, rounding half up.
///
/// `"1.000"` becomes `1000`, `"0.0005"` becomes `1`.
pub fn scale_quantity(quantity: &str) -> Option<i64> {
    parse_quantity(quantity)?
        .checked_mul(Decimal::ONE_THOUSAND)?
        .checked_add(Decimal::new(5, 1))?
        .floor()
        .to_i64()
}

/// Collects rate-keyed samples into one record per timestamp.
///
/// Records keep first-seen order; sorting is up to the caller.
#[derive(Debug, Default)]
pub struct RateMerger {
    records: Vec<MergedRecord>,
    index: HashMap<String, usize>,
}

impl RateMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from already merged records, e.g. a daily baseline.
    pub fn from_records(records: Vec<MergedRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            index.entry(r.timestamp.clone()).or_insert(i);
        }
        Self { records, index }
    }

    /// Set the sample's register on the record for its timestamp, creating the
    /// record if needed. A repeated (timestamp, rate) pair overwrites.
    pub fn push(&mut self, sample: &RawSample) -> Result<(), MergeError> {
        let rate = match RateCode::try_from(sample.rate) {
            Ok(rate) => rate,
            Err(e) => {
                tracing::warn!(timestamp = %sample.timestamp, error = %e, "skipping sample");
                metrics::counter!("merge_unknown_rate_total").increment(1);
                return Ok(());
            }
        };

        let value = scale_quantity(&sample.quantity).ok_or_else(|| MergeError::MalformedQuantity {
            timestamp: sample.timestamp.clone(),
            rate: sample.rate,
            quantity: sample.quantity.clone(),
        })?;

        let idx = match self.index.get(&sample.timestamp) {
            Some(&idx) => idx,
            None => {
                self.records.push(MergedRecord::new(sample.timestamp.clone()));
                let idx = self.records.len() - 1;
                self.index.insert(sample.timestamp.clone(), idx);
                idx
            }
        };
        self.records[idx].set(rate, value);

        Ok(())
    }

    pub fn extend<'a, I>(&mut self, samples: I) -> Result<(), MergeError>
    where
        I: IntoIterator<Item = &'a RawSample>,
    {
        for sample in samples {
            self.push(sample)?;
        }
        Ok(())
    }

    pub fn into_records(self) -> Vec<MergedRecord> {
        self.records
    }
}

/// Merge `samples` into `existing`, returning one record per distinct timestamp.
pub fn merge(existing: Vec<MergedRecord>, samples: &[RawSample]) -> Result<Vec<MergedRecord>, MergeError> {
    let mut merger = RateMerger::from_records(existing);
    merger.extend(samples)?;
    Ok(merger.into_records())
}

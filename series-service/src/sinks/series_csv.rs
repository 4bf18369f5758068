use std::io::Write;

use meter_client::domain::{MergedRecord, RateCode};

#[derive(thiserror::Error, Debug)]
pub enum CsvSinkError {
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const HEADER: [&str; 7] = ["datetime", "180", "181", "182", "280", "281", "282"];

/// Writes classified records as CSV, one row per timestamp and one column per
/// rate code. Absent registers are left empty.
pub struct CsvSeriesSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvSeriesSink<W> {
    pub fn new(inner: W) -> Result<Self, CsvSinkError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write(&mut self, record: &MergedRecord) -> Result<(), CsvSinkError> {
        let mut row = Vec::with_capacity(HEADER.len());
        row.push(record.timestamp.clone());
        for rate in RateCode::ALL {
            row.push(record.get(rate).map(|v| v.to_string()).unwrap_or_default());
        }
        self.writer.write_record(&row)?;
        self.rows += 1;
        Ok(())
    }

    pub fn write_all<'a, I>(&mut self, records: I) -> Result<(), CsvSinkError>
    where
        I: IntoIterator<Item = &'a MergedRecord>,
    {
        for r in records {
            self.write(r)?;
        }
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> Result<W, CsvSinkError> {
        metrics::counter!("csv_rows_written_total").increment(self.rows as u64);
        self.writer
            .into_inner()
            .map_err(|e| CsvSinkError::Io(e.into_error()))
    }
}
